use serde::{Deserialize, Serialize};

use crate::{EventDomain, EventLevel};
use otadex_errors::UserFacingError;

/// Structured failure information shared across domains.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureContext {
    /// Optional stable error code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Short user-facing message.
    pub message: String,
    /// Optional remediation hint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Whether retrying the operation might succeed.
    pub retryable: bool,
}

impl FailureContext {
    /// Construct a new failure context.
    #[must_use]
    pub fn new(
        code: Option<impl Into<String>>,
        message: impl Into<String>,
        hint: Option<impl Into<String>>,
        retryable: bool,
    ) -> Self {
        Self {
            code: code.map(Into::into),
            message: message.into(),
            hint: hint.map(Into::into),
            retryable,
        }
    }

    /// Build failure context from a `UserFacingError` implementation.
    #[must_use]
    pub fn from_error<E: UserFacingError + ?Sized>(error: &E) -> Self {
        Self::new(
            error.user_code(),
            error.user_message().into_owned(),
            error.user_hint(),
            error.is_retryable(),
        )
    }
}

pub mod package;
pub mod relocation;
pub mod session;

pub use package::*;
pub use relocation::*;
pub use session::*;

/// Every event the coordinator emits, grouped by domain
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "domain", content = "event", rename_all = "snake_case")]
pub enum AppEvent {
    /// Session lifecycle (prepare, cleanup, completion)
    Session(SessionEvent),

    /// Per-package dexopt progress
    Package(PackageEvent),

    /// Startup artifact relocation
    Relocation(RelocationEvent),
}

impl AppEvent {
    #[must_use]
    pub fn domain(&self) -> EventDomain {
        match self {
            Self::Session(_) => EventDomain::Session,
            Self::Package(_) => EventDomain::Package,
            Self::Relocation(_) => EventDomain::Relocation,
        }
    }

    #[must_use]
    pub fn level(&self) -> EventLevel {
        match self {
            Self::Session(SessionEvent::InvariantViolated { .. })
            | Self::Package(PackageEvent::Failed { .. }) => EventLevel::Error,

            Self::Package(PackageEvent::Skipped { .. })
            | Self::Relocation(
                RelocationEvent::PackageSkipped { .. } | RelocationEvent::ArtifactMoveFailed { .. },
            ) => EventLevel::Warn,

            Self::Session(SessionEvent::CleanedUp)
            | Self::Package(PackageEvent::Processing { .. } | PackageEvent::CommandsGenerated { .. })
            | Self::Relocation(
                RelocationEvent::Started { .. } | RelocationEvent::ArtifactMoved { .. },
            ) => EventLevel::Debug,

            _ => EventLevel::Info,
        }
    }

    /// Name of the package the event concerns, if any
    #[must_use]
    pub fn package(&self) -> Option<&str> {
        match self {
            Self::Session(SessionEvent::InvariantViolated { package })
            | Self::Package(
                PackageEvent::Processing { package, .. }
                | PackageEvent::CommandsGenerated { package, .. }
                | PackageEvent::Compiled { package }
                | PackageEvent::Skipped { package, .. }
                | PackageEvent::Failed { package, .. },
            )
            | Self::Relocation(
                RelocationEvent::PackageSkipped { package, .. }
                | RelocationEvent::ArtifactMoved { package, .. }
                | RelocationEvent::ArtifactMoveFailed { package, .. },
            ) => Some(package),
            _ => None,
        }
    }
}
