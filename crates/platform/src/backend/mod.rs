//! Dexopt execution backends

use otadex_errors::BackendError;
use otadex_types::DexoptInvocation;
use std::path::PathBuf;

/// Connection to whatever executes compilation requests
///
/// The real implementation talks to the installer daemon. The coordinator
/// also installs recording and lock-holding wrappers over this trait.
pub trait DexoptBackend: Send + Sync {
    /// Execute one compilation request
    ///
    /// # Errors
    ///
    /// Returns an error if the request could not be delivered or failed.
    fn execute(&self, invocation: &DexoptInvocation) -> Result<(), BackendError>;

    /// Block until the backend is reachable
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached or the operation
    /// makes no sense for this backend.
    fn wait_for_connection(&self) -> Result<(), BackendError>;

    /// Drop the connection to the backend
    ///
    /// # Errors
    ///
    /// Returns an error if the operation makes no sense for this backend.
    fn disconnect(&self) -> Result<(), BackendError>;

    /// Merge the profiles of a package, returning whether they changed
    ///
    /// # Errors
    ///
    /// Returns an error if the operation fails or is unsupported.
    fn merge_profiles(&self, uid: u32, package: &str) -> Result<bool, BackendError>;

    /// Dump the profiles of a package
    ///
    /// # Errors
    ///
    /// Returns an error if the operation fails or is unsupported.
    fn dump_profiles(
        &self,
        gid: u32,
        package: &str,
        code_paths: &[PathBuf],
    ) -> Result<bool, BackendError>;
}
