use otadex_types::{InstructionSet, RelocationReport};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Startup artifact relocation events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RelocationEvent {
    /// Relocation pass started
    Started { packages: usize },

    /// Package has code but nowhere to relocate into
    PackageSkipped { package: String, reason: String },

    /// Staged artifact moved into the package's artifact directory
    ArtifactMoved {
        package: String,
        code_path: PathBuf,
        instruction_set: InstructionSet,
    },

    /// Move request failed; relocation carries on
    ArtifactMoveFailed {
        package: String,
        code_path: PathBuf,
        instruction_set: InstructionSet,
        message: String,
    },

    /// Relocation pass finished
    Completed { report: RelocationReport },
}
