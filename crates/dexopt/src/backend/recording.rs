use otadex_errors::BackendError;
use otadex_platform::DexoptBackend;
use otadex_types::{DexoptCommand, DexoptInvocation};
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use super::unsupported;

const NAME: &str = "recording";

/// Backend that turns every invocation into its wire command and keeps it
///
/// Nothing is executed. One instance lives for one package's generation.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    commands: Mutex<Vec<DexoptCommand>>,
}

impl RecordingBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of commands recorded so far
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Recorded commands in the order they were issued
    #[must_use]
    pub fn into_commands(self) -> Vec<DexoptCommand> {
        self.commands
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl DexoptBackend for RecordingBackend {
    fn execute(&self, invocation: &DexoptInvocation) -> Result<(), BackendError> {
        self.commands
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(invocation.to_command());
        Ok(())
    }

    fn wait_for_connection(&self) -> Result<(), BackendError> {
        Err(unsupported(NAME, "wait_for_connection"))
    }

    fn disconnect(&self) -> Result<(), BackendError> {
        Err(unsupported(NAME, "disconnect"))
    }

    fn merge_profiles(&self, _uid: u32, _package: &str) -> Result<bool, BackendError> {
        Err(unsupported(NAME, "merge_profiles"))
    }

    fn dump_profiles(
        &self,
        _gid: u32,
        _package: &str,
        _code_paths: &[PathBuf],
    ) -> Result<bool, BackendError> {
        Err(unsupported(NAME, "dump_profiles"))
    }
}
