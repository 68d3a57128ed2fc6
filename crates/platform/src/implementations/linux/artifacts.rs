//! Filesystem artifact mover

use otadex_errors::PlatformError;
use otadex_types::InstructionSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::artifacts::{
    artifact_file_name, staged_dir, ArtifactOperations, MoveOutcome, ARTIFACT_EXTENSIONS,
};

/// Moves artifacts out of an OTA staging tree with `rename(2)`
///
/// Artifacts for `<artifact_dir>/<isa>/<stem>.odex` are expected at
/// `<staging_root>/<artifact_dir>/<isa>/<stem>.odex`. Companion `.vdex` and
/// `.art` files move along when present.
#[derive(Debug, Clone)]
pub struct FsArtifactMover {
    staging_root: PathBuf,
}

impl FsArtifactMover {
    /// Create a mover reading from `staging_root`
    pub fn new(staging_root: impl Into<PathBuf>) -> Self {
        Self {
            staging_root: staging_root.into(),
        }
    }
}

fn move_failed(from: &Path, to: &Path, err: &std::io::Error) -> PlatformError {
    let operation = format!("rename {} -> {}", from.display(), to.display());
    if err.kind() == ErrorKind::PermissionDenied {
        PlatformError::PermissionDenied {
            operation,
            message: err.to_string(),
        }
    } else {
        PlatformError::FilesystemOperationFailed {
            operation,
            message: err.to_string(),
        }
    }
}

impl ArtifactOperations for FsArtifactMover {
    fn move_artifact(
        &self,
        code_path: &Path,
        isa: InstructionSet,
        artifact_dir: &Path,
    ) -> Result<MoveOutcome, PlatformError> {
        let source_dir = staged_dir(&self.staging_root, artifact_dir).join(isa.as_str());
        let target_dir = artifact_dir.join(isa.as_str());

        let mut moved = false;
        for (index, extension) in ARTIFACT_EXTENSIONS.iter().enumerate() {
            let Some(name) = artifact_file_name(code_path, extension) else {
                return Ok(MoveOutcome::NotStaged);
            };
            let from = source_dir.join(&name);
            if !from.is_file() {
                if index == 0 {
                    return Ok(MoveOutcome::NotStaged);
                }
                continue;
            }

            let to = target_dir.join(&name);
            fs::create_dir_all(&target_dir).map_err(|e| move_failed(&from, &to, &e))?;
            fs::rename(&from, &to).map_err(|e| move_failed(&from, &to, &e))?;
            moved = true;
        }

        Ok(if moved {
            MoveOutcome::Moved
        } else {
            MoveOutcome::NotStaged
        })
    }
}
