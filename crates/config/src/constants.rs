//! Centralized, non-configurable filesystem paths for otadex
//!
//! These mirror the layout of the device being updated. Only the data
//! directory, staging directory and partition list can be overridden.

pub const DATA_DIR: &str = "/data";

/// Where artifacts compiled for the inactive slot are staged
pub const OTA_STAGING_DIR: &str = "/data/ota";

/// Read-only partitions whose artifacts are never relocated
pub const IMMUTABLE_PARTITIONS: &[&str] = &["/system", "/vendor"];

pub const LOGS_DIR: &str = "/data/misc/otadex/logs";

/// Host storage manager defaults for the low-space threshold
pub const DEFAULT_LOW_SPACE_PERCENT: u8 = 10;
pub const DEFAULT_LOW_SPACE_MAX_BYTES: u64 = 500 * 1024 * 1024;

/// Helper executed for each compilation request in direct mode
pub const DEFAULT_BACKEND_PROGRAM: &str = "otadex-installd";
