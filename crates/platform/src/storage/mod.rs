//! Volume space queries

use otadex_errors::PlatformError;
use std::path::Path;

/// Trait for querying free space on a storage volume
pub trait StorageQuery: Send + Sync {
    /// Bytes below which the volume counts as low on space
    ///
    /// # Errors
    ///
    /// Returns an error if the volume cannot be inspected.
    fn low_space_threshold(&self, volume: &Path) -> Result<u64, PlatformError>;

    /// Bytes currently available to unprivileged writers on the volume
    ///
    /// # Errors
    ///
    /// Returns an error if the volume cannot be inspected.
    fn usable_space(&self, volume: &Path) -> Result<u64, PlatformError>;
}

/// Compute the low-space threshold for a volume of `total_bytes`
///
/// The threshold is `percent` of the volume, capped at `max_bytes`.
#[must_use]
pub fn low_space_bytes(total_bytes: u64, percent: u8, max_bytes: u64) -> u64 {
    let scaled = u128::from(total_bytes) * u128::from(percent) / 100;
    u64::try_from(scaled).unwrap_or(u64::MAX).min(max_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_is_percent_of_volume() {
        assert_eq!(low_space_bytes(1_000, 10, u64::MAX), 100);
        assert_eq!(low_space_bytes(0, 10, u64::MAX), 0);
    }

    #[test]
    fn threshold_is_capped() {
        let gib = 1024 * 1024 * 1024;
        assert_eq!(low_space_bytes(64 * gib, 10, 500 * 1024 * 1024), 500 * 1024 * 1024);
    }

    #[test]
    fn threshold_does_not_overflow() {
        assert_eq!(low_space_bytes(u64::MAX, 100, u64::MAX), u64::MAX);
    }
}
