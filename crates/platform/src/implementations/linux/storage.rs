//! statvfs-backed storage queries

use otadex_errors::PlatformError;
use std::ffi::CString;
use std::mem::MaybeUninit;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use crate::storage::{low_space_bytes, StorageQuery};

/// Storage queries answered by `statvfs(3)`
#[derive(Debug, Clone)]
pub struct StatvfsStorage {
    percent: u8,
    max_bytes: u64,
    fixed_threshold: Option<u64>,
}

/// Sizes of a mounted volume in bytes
#[derive(Debug, Clone, Copy)]
struct VolumeStats {
    total: u64,
    available: u64,
}

impl StatvfsStorage {
    /// Threshold is `percent` of the volume capped at `max_bytes`
    #[must_use]
    pub fn new(percent: u8, max_bytes: u64) -> Self {
        Self {
            percent,
            max_bytes,
            fixed_threshold: None,
        }
    }

    /// Use a fixed threshold instead of the computed one
    #[must_use]
    pub fn with_fixed_threshold(mut self, bytes: Option<u64>) -> Self {
        self.fixed_threshold = bytes;
        self
    }

    fn stat(volume: &Path) -> Result<VolumeStats, PlatformError> {
        let c_path = CString::new(volume.as_os_str().as_bytes()).map_err(|e| {
            PlatformError::FilesystemOperationFailed {
                operation: "statvfs".to_string(),
                message: format!("{}: {e}", volume.display()),
            }
        })?;

        let mut stats = MaybeUninit::<libc::statvfs>::uninit();
        // SAFETY: c_path is NUL-terminated and stats points to writable storage.
        let rc = unsafe { libc::statvfs(c_path.as_ptr(), stats.as_mut_ptr()) };
        if rc != 0 {
            let err = std::io::Error::last_os_error();
            return Err(PlatformError::FilesystemOperationFailed {
                operation: "statvfs".to_string(),
                message: format!("{}: {err}", volume.display()),
            });
        }
        // SAFETY: statvfs returned 0, so the struct is initialized.
        let stats = unsafe { stats.assume_init() };

        #[allow(clippy::useless_conversion)]
        let fragment = u64::from(stats.f_frsize);
        #[allow(clippy::useless_conversion)]
        let (blocks, available) = (u64::from(stats.f_blocks), u64::from(stats.f_bavail));

        Ok(VolumeStats {
            total: blocks.saturating_mul(fragment),
            available: available.saturating_mul(fragment),
        })
    }
}

impl StorageQuery for StatvfsStorage {
    fn low_space_threshold(&self, volume: &Path) -> Result<u64, PlatformError> {
        if let Some(bytes) = self.fixed_threshold {
            return Ok(bytes);
        }
        let stats = Self::stat(volume)?;
        Ok(low_space_bytes(stats.total, self.percent, self.max_bytes))
    }

    fn usable_space(&self, volume: &Path) -> Result<u64, PlatformError> {
        Ok(Self::stat(volume)?.available)
    }
}
