//! Report type definitions for session operations

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a dexopt session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    /// No session: before `prepare` or after `cleanup`
    Uninitialized,
    /// Packages or commands remain
    Active,
    /// Both queues drained
    Exhausted,
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "uninitialized"),
            Self::Active => write!(f, "active"),
            Self::Exhausted => write!(f, "exhausted"),
        }
    }
}

/// How commands produced for a package are consumed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DexoptMode {
    /// Commands are recorded and handed out one at a time
    Export,
    /// Commands are executed immediately
    Direct,
}

impl fmt::Display for DexoptMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Export => write!(f, "export"),
            Self::Direct => write!(f, "direct"),
        }
    }
}

/// Point-in-time view of a session
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionStatus {
    pub lifecycle: Lifecycle,
    /// Packages captured at prepare time
    pub total_packages: usize,
    /// Packages not yet expanded into commands
    pub remaining_packages: usize,
    /// Commands still queued for the current package
    pub pending_commands: usize,
    /// Fraction of packages fully completed
    pub progress: f32,
}

/// Outcome counters of one artifact relocation pass
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelocationReport {
    /// Packages inspected
    pub packages_scanned: usize,
    /// Packages with code that were not eligible for relocation
    pub packages_skipped: usize,
    /// Move requests issued
    pub attempted: usize,
    /// Artifacts moved into place
    pub moved: usize,
    /// Requests with nothing staged
    pub not_staged: usize,
    /// Requests that failed
    pub failed: usize,
}

/// Summary of a full export or direct run
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunReport {
    pub mode: DexoptMode,
    pub total_packages: usize,
    /// Commands handed out (export mode only)
    pub commands: usize,
    pub duration_ms: u64,
}
