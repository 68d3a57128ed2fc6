use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Envelope data stamped on every emitted event
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EventMeta {
    pub event_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub level: EventLevel,
    pub domain: EventDomain,
    /// Package the event concerns; set for every per-package event
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
}

impl EventMeta {
    #[must_use]
    pub fn new(level: EventLevel, domain: EventDomain, package: Option<String>) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            level,
            domain,
            package,
        }
    }
}

/// Severity, ordered from least to most severe
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum EventLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl EventLevel {
    /// Whether the terminal should show the event, not only the log
    #[must_use]
    pub fn is_user_visible(self) -> bool {
        self >= Self::Warn
    }
}

/// Part of the coordinator an event comes from
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventDomain {
    Session,
    Package,
    Relocation,
}

impl EventDomain {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Session => "session",
            Self::Package => "package",
            Self::Relocation => "relocation",
        }
    }
}
