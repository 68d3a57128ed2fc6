//! Linux platform implementation

pub mod artifacts;
pub mod process;
pub mod storage;

pub use artifacts::FsArtifactMover;
pub use process::ProcessBackend;
pub use storage::StatvfsStorage;

use std::sync::Arc;

/// Linux platform implementation
pub struct LinuxPlatform;

impl LinuxPlatform {
    /// Assemble a platform from the Linux implementations
    #[allow(clippy::new_ret_no_self)]
    pub fn new(
        storage: StatvfsStorage,
        artifacts: FsArtifactMover,
        backend: ProcessBackend,
    ) -> crate::core::Platform {
        crate::core::Platform::new(Arc::new(storage), Arc::new(artifacts), Arc::new(backend))
    }
}
