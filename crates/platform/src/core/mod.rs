//! Core platform abstraction

use std::sync::Arc;

use crate::artifacts::ArtifactOperations;
use crate::backend::DexoptBackend;
use crate::storage::StorageQuery;

/// Bundle of host operations the coordinator runs against
#[derive(Clone)]
pub struct Platform {
    storage: Arc<dyn StorageQuery>,
    artifacts: Arc<dyn ArtifactOperations>,
    backend: Arc<dyn DexoptBackend>,
}

impl Platform {
    /// Create a new platform instance with the specified implementations
    pub fn new(
        storage: Arc<dyn StorageQuery>,
        artifacts: Arc<dyn ArtifactOperations>,
        backend: Arc<dyn DexoptBackend>,
    ) -> Self {
        Self {
            storage,
            artifacts,
            backend,
        }
    }

    /// Access storage queries
    #[must_use]
    pub fn storage(&self) -> Arc<dyn StorageQuery> {
        Arc::clone(&self.storage)
    }

    /// Access artifact operations
    #[must_use]
    pub fn artifacts(&self) -> Arc<dyn ArtifactOperations> {
        Arc::clone(&self.artifacts)
    }

    /// Access the real execution backend
    #[must_use]
    pub fn backend(&self) -> Arc<dyn DexoptBackend> {
        Arc::clone(&self.backend)
    }
}

impl std::fmt::Debug for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Platform").finish_non_exhaustive()
    }
}
