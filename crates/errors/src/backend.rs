//! Dexopt execution backend error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum BackendError {
    #[error("operation not supported by {backend} backend: {operation}")]
    UnsupportedOperation { backend: String, operation: String },

    #[error("command failed with status {status}: {command}")]
    CommandFailed { command: String, status: i32 },

    #[error("backend connection failed: {message}")]
    ConnectionFailed { message: String },
}

impl UserFacingError for BackendError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::UnsupportedOperation { .. } => Some("Please report this issue."),
            Self::ConnectionFailed { .. } => Some("Check that the execution backend is running."),
            Self::CommandFailed { .. } => None,
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(self, Self::ConnectionFailed { .. })
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::UnsupportedOperation { .. } => "backend.unsupported_operation",
            Self::CommandFailed { .. } => "backend.command_failed",
            Self::ConnectionFailed { .. } => "backend.connection_failed",
        };
        Some(code)
    }
}
