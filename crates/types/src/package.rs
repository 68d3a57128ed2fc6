//! Package snapshot type definitions

use crate::InstructionSet;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Directory under a package's install directory holding compiled artifacts
pub const ARTIFACT_DIR_NAME: &str = "oat";

/// Read-only snapshot of one installed package
///
/// Owned by the package registry; a dexopt session only ever reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    /// Unique package name
    pub name: String,
    /// Root directory the package was installed into, when known
    #[serde(default)]
    pub install_dir: Option<PathBuf>,
    /// Code locations, base first then splits
    #[serde(default)]
    pub code_paths: Vec<PathBuf>,
    /// Native instruction sets the package runs on
    #[serde(default)]
    pub instruction_sets: Vec<InstructionSet>,
    /// Libraries the package compiles against
    #[serde(default)]
    pub shared_libraries: Vec<PathBuf>,
    /// Whether the package ships code at all
    #[serde(default = "default_has_code")]
    pub has_code: bool,
    /// Core packages are optimized before everything else
    #[serde(default)]
    pub core_app: bool,
    /// Owning user id passed through to the compiler
    #[serde(default)]
    pub uid: u32,
}

fn default_has_code() -> bool {
    true
}

impl Package {
    /// Create a package with a single code path and no other metadata
    pub fn new(name: impl Into<String>, code_path: impl Into<PathBuf>) -> Self {
        let code_path = code_path.into();
        Self {
            name: name.into(),
            install_dir: code_path.parent().map(Path::to_path_buf),
            code_paths: vec![code_path],
            instruction_sets: Vec::new(),
            shared_libraries: Vec::new(),
            has_code: true,
            core_app: false,
            uid: 0,
        }
    }

    /// Derive a missing install directory from the base code path's parent
    #[must_use]
    pub fn with_default_install_dir(mut self) -> Self {
        if self.install_dir.is_none() {
            self.install_dir = self
                .code_paths
                .first()
                .and_then(|path| path.parent())
                .map(Path::to_path_buf);
        }
        self
    }

    /// Add a native instruction set
    #[must_use]
    pub fn with_instruction_set(mut self, isa: InstructionSet) -> Self {
        self.instruction_sets.push(isa);
        self
    }

    /// Add a split code path
    #[must_use]
    pub fn with_code_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.code_paths.push(path.into());
        self
    }

    /// Add a shared library dependency
    #[must_use]
    pub fn with_shared_library(mut self, path: impl Into<PathBuf>) -> Self {
        self.shared_libraries.push(path.into());
        self
    }

    /// Whether this package can be optimized at all
    #[must_use]
    pub fn can_optimize(&self) -> bool {
        self.has_code && !self.code_paths.is_empty()
    }

    /// Declared instruction sets, or just `fallback` when none are declared
    #[must_use]
    pub fn instruction_sets_or<'a>(
        &'a self,
        fallback: &'a InstructionSet,
    ) -> &'a [InstructionSet] {
        if self.instruction_sets.is_empty() {
            std::slice::from_ref(fallback)
        } else {
            &self.instruction_sets
        }
    }

    /// Directory compiled artifacts for this package live in
    #[must_use]
    pub fn artifact_dir(&self) -> Option<PathBuf> {
        self.install_dir
            .as_ref()
            .map(|dir| dir.join(ARTIFACT_DIR_NAME))
    }

    /// Whether the package lives under any of the given partition roots
    #[must_use]
    pub fn is_under_any(&self, roots: &[PathBuf]) -> bool {
        self.install_dir
            .as_ref()
            .is_some_and(|dir| roots.iter().any(|root| dir.starts_with(root)))
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
