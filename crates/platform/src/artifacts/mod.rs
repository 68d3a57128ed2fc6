//! Compiled artifact placement

use otadex_errors::PlatformError;
use otadex_types::InstructionSet;
use std::path::{Component, Path, PathBuf};

/// Result of asking for a staged artifact to be moved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The staged artifact was moved into the artifact directory
    Moved,
    /// Nothing was staged for this code path and instruction set
    NotStaged,
}

/// Trait for moving OTA-staged artifacts into their final location
pub trait ArtifactOperations: Send + Sync {
    /// Move the artifact compiled for `code_path` and `isa` into `artifact_dir`
    ///
    /// # Errors
    ///
    /// Returns an error if a staged artifact exists but could not be moved.
    fn move_artifact(
        &self,
        code_path: &Path,
        isa: InstructionSet,
        artifact_dir: &Path,
    ) -> Result<MoveOutcome, PlatformError>;
}

/// Extensions an artifact set may carry; only the first is mandatory
pub const ARTIFACT_EXTENSIONS: [&str; 3] = ["odex", "vdex", "art"];

/// File name of an artifact for a code path, e.g. `base.apk` -> `base.odex`
#[must_use]
pub fn artifact_file_name(code_path: &Path, extension: &str) -> Option<PathBuf> {
    let stem = code_path.file_stem()?;
    let mut name = PathBuf::from(stem);
    name.set_extension(extension);
    Some(name)
}

/// Where an artifact directory is mirrored under a staging root
///
/// `/data/app/foo/oat` staged under `/data/ota` lives at `/data/ota/data/app/foo/oat`.
#[must_use]
pub fn staged_dir(staging_root: &Path, artifact_dir: &Path) -> PathBuf {
    let relative: PathBuf = artifact_dir
        .components()
        .filter(|component| matches!(component, Component::Normal(_)))
        .collect();
    staging_root.join(relative)
}
