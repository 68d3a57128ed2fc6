//! Dexopt session lifecycle error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum SessionError {
    #[error("{operation} called before prepare()")]
    NotPrepared { operation: String },

    #[error("already called prepare()")]
    AlreadyPrepared,

    #[error("command queue left empty for {package}")]
    InvariantViolation { package: String },

    #[error("cannot relocate artifacts while a dexopt session is active")]
    RelocationDuringSession,

    #[error("missing component: {component}")]
    MissingComponent { component: String },
}

impl UserFacingError for SessionError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::NotPrepared { .. } => Some("Call prepare before iterating the session."),
            Self::AlreadyPrepared => Some("Call cleanup before preparing a new session."),
            Self::InvariantViolation { .. } => {
                Some("The session was reset. Please report this issue.")
            }
            Self::RelocationDuringSession => Some("Clean up the current session first."),
            Self::MissingComponent { .. } => None,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::NotPrepared { .. } => "session.not_prepared",
            Self::AlreadyPrepared => "session.already_prepared",
            Self::InvariantViolation { .. } => "session.invariant_violation",
            Self::RelocationDuringSession => "session.relocation_during_session",
            Self::MissingComponent { .. } => "session.missing_component",
        };
        Some(code)
    }
}
