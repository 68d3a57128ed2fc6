#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Event system for otadex
//!
//! Library crates never print or log directly. Everything observable goes
//! through events, which the CLI turns into structured tracing records.
//! Each event travels in an [`EventMessage`] whose [`EventMeta`] is derived
//! from the event itself: level, domain and, for per-package events, the
//! package name used to correlate them.

pub mod meta;
pub use meta::{EventDomain, EventLevel, EventMeta};

pub mod events;
pub use events::{AppEvent, FailureContext, PackageEvent, RelocationEvent, SessionEvent, SkipReason};

use tokio::sync::mpsc::UnboundedSender;

/// Event paired with its metadata
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct EventMessage {
    pub meta: EventMeta,
    pub event: AppEvent,
}

impl EventMessage {
    #[must_use]
    pub fn from_event(event: AppEvent) -> Self {
        let meta = EventMeta::new(
            event.level(),
            event.domain(),
            event.package().map(str::to_string),
        );
        Self { meta, event }
    }
}

/// Type alias for the event sender
pub type EventSender = UnboundedSender<EventMessage>;

/// Type alias for the event receiver
pub type EventReceiver = tokio::sync::mpsc::UnboundedReceiver<EventMessage>;

/// Create a new event channel
#[must_use]
pub fn channel() -> (EventSender, EventReceiver) {
    tokio::sync::mpsc::unbounded_channel()
}

/// Emission API shared by every component holding an optional sender
pub trait EventEmitter {
    fn event_sender(&self) -> Option<&EventSender>;

    fn emit(&self, event: AppEvent) {
        if let Some(sender) = self.event_sender() {
            // Ignore send errors - if receiver is dropped, we just continue
            let _ = sender.send(EventMessage::from_event(event));
        }
    }

    fn emit_package_skipped(&self, package: &str, reason: SkipReason) {
        self.emit(AppEvent::Package(PackageEvent::Skipped {
            package: package.to_string(),
            reason,
        }));
    }
}

impl EventEmitter for EventSender {
    fn event_sender(&self) -> Option<&EventSender> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn package_events_are_correlated() {
        let (tx, mut rx) = channel();
        tx.emit_package_skipped(
            "com.example",
            SkipReason::LowSpace {
                usable_bytes: 1,
                threshold_bytes: 2,
            },
        );

        let message = rx.recv().await.unwrap();
        assert_eq!(message.meta.package.as_deref(), Some("com.example"));
        assert_eq!(message.meta.domain, EventDomain::Package);
        assert_eq!(message.meta.level, EventLevel::Warn);
        assert!(message.meta.level.is_user_visible());
    }

    #[tokio::test]
    async fn session_events_have_no_package() {
        let (tx, mut rx) = channel();
        tx.emit(AppEvent::Session(SessionEvent::Prepared { total_packages: 3 }));

        let message = rx.recv().await.unwrap();
        assert!(message.meta.package.is_none());
        assert_eq!(message.meta.level, EventLevel::Info);
        assert!(!message.meta.level.is_user_visible());
    }

    #[test]
    fn closed_receiver_is_ignored() {
        let (tx, rx) = channel();
        drop(rx);
        tx.emit(AppEvent::Session(SessionEvent::CleanedUp));
    }
}
