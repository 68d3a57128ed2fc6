//! Execution backends the command generator runs against

mod direct;
mod recording;

pub use direct::{DirectBackend, InstallLock};
pub use recording::RecordingBackend;

use otadex_errors::BackendError;

fn unsupported(backend: &str, operation: &str) -> BackendError {
    BackendError::UnsupportedOperation {
        backend: backend.to_string(),
        operation: operation.to_string(),
    }
}
