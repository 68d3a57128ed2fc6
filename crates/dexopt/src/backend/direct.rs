use otadex_errors::BackendError;
use otadex_platform::DexoptBackend;
use otadex_types::DexoptInvocation;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Coarse lock shared with the host's install path
///
/// Held while a package is compiled directly so installs and compilation
/// never touch the same package at once.
#[derive(Debug, Default)]
pub struct InstallLock(Mutex<()>);

impl InstallLock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until the lock is available
    pub fn acquire(&self) -> MutexGuard<'_, ()> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether someone currently holds the lock
    #[must_use]
    pub fn is_held(&self) -> bool {
        self.0.try_lock().is_err()
    }
}

/// Backend that executes invocations through the real backend right away
#[derive(Clone)]
pub struct DirectBackend {
    inner: Arc<dyn DexoptBackend>,
    install_lock: Arc<InstallLock>,
}

impl DirectBackend {
    pub fn new(inner: Arc<dyn DexoptBackend>, install_lock: Arc<InstallLock>) -> Self {
        Self {
            inner,
            install_lock,
        }
    }

    #[must_use]
    pub fn install_lock(&self) -> &Arc<InstallLock> {
        &self.install_lock
    }

    /// Run `f` with a backend that is only usable while the install lock is held
    pub fn with_lock<T>(&self, f: impl FnOnce(&dyn DexoptBackend) -> T) -> T {
        let _guard = self.install_lock.acquire();
        let locked = Locked {
            inner: self.inner.as_ref(),
        };
        f(&locked)
    }
}

impl std::fmt::Debug for DirectBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectBackend")
            .field("install_lock", &self.install_lock)
            .finish_non_exhaustive()
    }
}

struct Locked<'a> {
    inner: &'a dyn DexoptBackend,
}

impl DexoptBackend for Locked<'_> {
    fn execute(&self, invocation: &DexoptInvocation) -> Result<(), BackendError> {
        self.inner.execute(invocation)
    }

    fn wait_for_connection(&self) -> Result<(), BackendError> {
        self.inner.wait_for_connection()
    }

    fn disconnect(&self) -> Result<(), BackendError> {
        self.inner.disconnect()
    }

    fn merge_profiles(&self, uid: u32, package: &str) -> Result<bool, BackendError> {
        self.inner.merge_profiles(uid, package)
    }

    fn dump_profiles(
        &self,
        gid: u32,
        package: &str,
        code_paths: &[PathBuf],
    ) -> Result<bool, BackendError> {
        self.inner.dump_profiles(gid, package, code_paths)
    }
}
