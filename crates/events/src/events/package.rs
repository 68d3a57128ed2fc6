use otadex_types::DexoptMode;
use serde::{Deserialize, Serialize};

use super::FailureContext;

/// Why a package produced no work
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    /// Free space on the data volume is below the low-space threshold
    LowSpace {
        usable_bytes: u64,
        threshold_bytes: u64,
    },
    /// The optimization policy reported failure
    PolicyFailed { message: String },
}

/// Per-package dexopt events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PackageEvent {
    /// Package popped off the pending queue
    Processing {
        package: String,
        mode: DexoptMode,
        remaining: usize,
    },

    /// Commands recorded for export
    CommandsGenerated { package: String, commands: usize },

    /// Package compiled through the direct backend
    Compiled { package: String },

    /// Package produced no work
    Skipped { package: String, reason: SkipReason },

    /// An invocation failed while compiling directly
    Failed {
        package: String,
        failure: FailureContext,
    },
}
