//! Pre-flight disk space check

use otadex_errors::{ConfigError, Error, StorageError};
use otadex_platform::StorageQuery;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Verdict of a disk space check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpaceCheck {
    /// Enough room to produce artifacts
    Sufficient {
        usable_bytes: u64,
        threshold_bytes: u64,
    },
    /// Below the low-space threshold; the package should be skipped
    Low {
        usable_bytes: u64,
        threshold_bytes: u64,
    },
}

impl SpaceCheck {
    #[must_use]
    pub fn is_sufficient(&self) -> bool {
        matches!(self, Self::Sufficient { .. })
    }
}

/// Rejects work while the data volume is below its low-space threshold
#[derive(Clone)]
pub struct DiskSpaceGuard {
    storage: Arc<dyn StorageQuery>,
    data_dir: PathBuf,
}

impl DiskSpaceGuard {
    pub fn new(storage: Arc<dyn StorageQuery>, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            storage,
            data_dir: data_dir.into(),
        }
    }

    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Compare usable space on the data volume with its threshold
    ///
    /// A failed usable-space query counts as zero usable bytes.
    ///
    /// # Errors
    ///
    /// Returns `InvalidThreshold` if the threshold is zero, or a storage
    /// error if the threshold cannot be queried.
    pub fn check(&self) -> Result<SpaceCheck, Error> {
        let threshold_bytes = self
            .storage
            .low_space_threshold(&self.data_dir)
            .map_err(|e| StorageError::VolumeQueryFailed {
                path: self.data_dir.display().to_string(),
                message: e.to_string(),
            })?;
        if threshold_bytes == 0 {
            return Err(ConfigError::InvalidThreshold {
                volume: self.data_dir.display().to_string(),
            }
            .into());
        }

        let usable_bytes = self.storage.usable_space(&self.data_dir).unwrap_or(0);
        if usable_bytes < threshold_bytes {
            Ok(SpaceCheck::Low {
                usable_bytes,
                threshold_bytes,
            })
        } else {
            Ok(SpaceCheck::Sufficient {
                usable_bytes,
                threshold_bytes,
            })
        }
    }
}

impl std::fmt::Debug for DiskSpaceGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiskSpaceGuard")
            .field("data_dir", &self.data_dir)
            .finish_non_exhaustive()
    }
}
