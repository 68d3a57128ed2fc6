//! OTA dexopt service
//!
//! Every entry point takes the session mutex; direct compilation also takes
//! the install lock for the duration of one package.

use otadex_config::{constants, Config};
use otadex_errors::{Error, SessionError};
use otadex_events::{
    AppEvent, EventEmitter, EventSender, FailureContext, PackageEvent, SessionEvent, SkipReason,
};
use otadex_platform::{ArtifactOperations, DexoptBackend, Platform, StorageQuery};
use otadex_types::{
    DexoptCommand, DexoptMode, InstructionSet, Lifecycle, NextCommand, Package, RelocationReport,
    SessionStatus,
};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::backend::{DirectBackend, InstallLock};
use crate::generator::{CommandGenerator, GenerationOutcome};
use crate::guard::DiskSpaceGuard;
use crate::policy::{DexoptPolicy, InstalldPolicy};
use crate::registry::PackageRegistry;
use crate::relocator::ArtifactRelocator;
use crate::session::Session;

/// Coordinates A/B OTA dexopt for the packages of a registry
pub struct OtaDexoptService {
    session: Mutex<Session>,
    registry: Arc<dyn PackageRegistry>,
    generator: CommandGenerator,
    direct: DirectBackend,
    relocator: ArtifactRelocator,
    relocation: RelocationReport,
    tx: Option<EventSender>,
}

impl EventEmitter for OtaDexoptService {
    fn event_sender(&self) -> Option<&EventSender> {
        self.tx.as_ref()
    }
}

impl OtaDexoptService {
    // No public constructor - use OtaDexoptServiceBuilder instead

    fn session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot the packages needing optimization
    ///
    /// # Errors
    ///
    /// Returns `AlreadyPrepared` if a session is already active.
    pub fn prepare(&self) -> Result<(), Error> {
        let mut session = self.session();
        let total_packages = session.prepare(|| self.registry.packages_for_dexopt())?;
        self.emit(AppEvent::Session(SessionEvent::Prepared { total_packages }));
        Ok(())
    }

    /// Reset to uninitialized; never fails
    pub fn cleanup(&self) {
        self.session().cleanup();
        self.emit(AppEvent::Session(SessionEvent::CleanedUp));
    }

    /// # Errors
    ///
    /// Returns `NotPrepared` before `prepare`.
    pub fn is_done(&self) -> Result<bool, Error> {
        self.session().is_done()
    }

    /// # Errors
    ///
    /// Returns `NotPrepared` before `prepare`.
    pub fn progress(&self) -> Result<f32, Error> {
        self.session().progress()
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.session().status()
    }

    /// Report of the relocation pass run when the service was built
    #[must_use]
    pub fn relocation_report(&self) -> &RelocationReport {
        &self.relocation
    }

    /// Next command to execute, or [`NextCommand::NothingToDo`] once exhausted
    ///
    /// # Errors
    ///
    /// Returns `NotPrepared` before `prepare`, `InvalidThreshold` if the data
    /// volume reports a zero threshold, or `InvariantViolation` after which
    /// the session has been reset.
    pub fn next_dexopt_command(&self) -> Result<NextCommand, Error> {
        let mut session = self.session();
        let was_active = session.lifecycle() == Lifecycle::Active;

        let result =
            session.next_command(|package, remaining| self.record_package(package, remaining));

        match &result {
            Err(Error::Session(SessionError::InvariantViolation { package })) => {
                self.emit(AppEvent::Session(SessionEvent::InvariantViolated {
                    package: package.clone(),
                }));
            }
            Ok(_) if was_active && session.lifecycle() == Lifecycle::Exhausted => {
                self.emit_exhausted(&session);
            }
            _ => {}
        }
        result
    }

    /// Compile the next package in place
    ///
    /// Does nothing once every package has been taken. Disk space is checked
    /// before the install lock is taken; a low-space package is skipped and
    /// reported. An invocation failure is reported and the package counts
    /// as processed.
    ///
    /// # Errors
    ///
    /// Returns `NotPrepared` before `prepare` or `InvalidThreshold` if the
    /// data volume reports a zero threshold.
    pub fn dexopt_next_package(&self) -> Result<(), Error> {
        let mut session = self.session();
        let Some(package) = session.pop_package("dexopt_next_package")? else {
            return Ok(());
        };

        self.emit_processing(&package, DexoptMode::Direct, session.remaining_packages());
        let outcome = match self.generator.check_space()? {
            Some(skipped) => skipped,
            None => self
                .direct
                .with_lock(|backend| self.generator.run_policy(&package, backend)),
        };

        match outcome {
            GenerationOutcome::Generated => {
                self.emit(AppEvent::Package(PackageEvent::Compiled {
                    package: package.name.clone(),
                }));
            }
            GenerationOutcome::SkippedLowSpace {
                usable_bytes,
                threshold_bytes,
            } => self.emit_low_space(&package, usable_bytes, threshold_bytes),
            GenerationOutcome::PolicyFailed(e) => {
                self.emit(AppEvent::Package(PackageEvent::Failed {
                    package: package.name.clone(),
                    failure: FailureContext::from_error(&e),
                }));
            }
        }

        if session.lifecycle() == Lifecycle::Exhausted {
            self.emit_exhausted(&session);
        }
        Ok(())
    }

    /// Run artifact relocation again over every registry package
    ///
    /// # Errors
    ///
    /// Returns `RelocationDuringSession` unless the session is uninitialized.
    pub fn relocate_artifacts(&self) -> Result<RelocationReport, Error> {
        let session = self.session();
        if session.lifecycle() != Lifecycle::Uninitialized {
            return Err(SessionError::RelocationDuringSession.into());
        }
        Ok(self.relocator.relocate(&self.registry.all_packages()))
    }

    fn record_package(
        &self,
        package: &Package,
        remaining: usize,
    ) -> Result<Vec<DexoptCommand>, Error> {
        self.emit_processing(package, DexoptMode::Export, remaining);
        let (outcome, commands) = self.generator.record(package)?;

        match outcome {
            GenerationOutcome::Generated => {
                self.emit(AppEvent::Package(PackageEvent::CommandsGenerated {
                    package: package.name.clone(),
                    commands: commands.len(),
                }));
            }
            GenerationOutcome::SkippedLowSpace {
                usable_bytes,
                threshold_bytes,
            } => self.emit_low_space(package, usable_bytes, threshold_bytes),
            GenerationOutcome::PolicyFailed(e) => self.emit_package_skipped(
                &package.name,
                SkipReason::PolicyFailed {
                    message: e.to_string(),
                },
            ),
        }
        Ok(commands)
    }

    fn emit_processing(&self, package: &Package, mode: DexoptMode, remaining: usize) {
        self.emit(AppEvent::Package(PackageEvent::Processing {
            package: package.name.clone(),
            mode,
            remaining,
        }));
    }

    fn emit_low_space(&self, package: &Package, usable_bytes: u64, threshold_bytes: u64) {
        self.emit_package_skipped(
            &package.name,
            SkipReason::LowSpace {
                usable_bytes,
                threshold_bytes,
            },
        );
    }

    fn emit_exhausted(&self, session: &Session) {
        self.emit(AppEvent::Session(SessionEvent::Exhausted {
            total_packages: session.status().total_packages,
        }));
    }
}

impl std::fmt::Debug for OtaDexoptService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OtaDexoptService")
            .field("relocation", &self.relocation)
            .finish_non_exhaustive()
    }
}

/// Builder for [`OtaDexoptService`]
///
/// `build` runs artifact relocation before the service is handed out.
#[derive(Default)]
pub struct OtaDexoptServiceBuilder {
    registry: Option<Arc<dyn PackageRegistry>>,
    policy: Option<Arc<dyn DexoptPolicy>>,
    storage: Option<Arc<dyn StorageQuery>>,
    artifacts: Option<Arc<dyn ArtifactOperations>>,
    backend: Option<Arc<dyn DexoptBackend>>,
    install_lock: Option<Arc<InstallLock>>,
    data_dir: Option<PathBuf>,
    immutable_partitions: Option<Vec<PathBuf>>,
    isa_table: BTreeMap<InstructionSet, InstructionSet>,
    tx: Option<EventSender>,
}

impl OtaDexoptServiceBuilder {
    /// Create new service builder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set package registry
    #[must_use]
    pub fn with_registry(mut self, registry: Arc<dyn PackageRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Set optimization policy
    #[must_use]
    pub fn with_policy(mut self, policy: Arc<dyn DexoptPolicy>) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Set storage queries
    #[must_use]
    pub fn with_storage(mut self, storage: Arc<dyn StorageQuery>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Set artifact operations
    #[must_use]
    pub fn with_artifacts(mut self, artifacts: Arc<dyn ArtifactOperations>) -> Self {
        self.artifacts = Some(artifacts);
        self
    }

    /// Set the real execution backend used in direct mode
    #[must_use]
    pub fn with_backend(mut self, backend: Arc<dyn DexoptBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Take storage, artifact operations and backend from a platform
    #[must_use]
    pub fn with_platform(self, platform: &Platform) -> Self {
        self.with_storage(platform.storage())
            .with_artifacts(platform.artifacts())
            .with_backend(platform.backend())
    }

    /// Share the host's install lock
    #[must_use]
    pub fn with_install_lock(mut self, install_lock: Arc<InstallLock>) -> Self {
        self.install_lock = Some(install_lock);
        self
    }

    /// Set the volume checked for free space
    #[must_use]
    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(data_dir.into());
        self
    }

    /// Set the partitions relocation never touches
    #[must_use]
    pub fn with_immutable_partitions(mut self, partitions: Vec<PathBuf>) -> Self {
        self.immutable_partitions = Some(partitions);
        self
    }

    /// Set the dex-code instruction set translation table
    #[must_use]
    pub fn with_isa_table(mut self, isa_table: BTreeMap<InstructionSet, InstructionSet>) -> Self {
        self.isa_table = isa_table;
        self
    }

    /// Set event sender
    #[must_use]
    pub fn with_event_sender(mut self, tx: EventSender) -> Self {
        self.tx = Some(tx);
        self
    }

    /// Apply paths, translation table and the default policy from configuration
    ///
    /// A policy set earlier is kept.
    ///
    /// # Errors
    ///
    /// Returns an error if the translation table names unknown instruction sets.
    pub fn with_config(mut self, config: &Config) -> Result<Self, Error> {
        self.isa_table = config.dex_code_isa_table()?;
        self.data_dir = Some(config.data_dir().to_path_buf());
        self.immutable_partitions = Some(config.immutable_partitions());
        if self.policy.is_none() {
            self.policy = Some(Arc::new(InstalldPolicy::new(
                config.dexopt.compiler_filter,
                self.isa_table.clone(),
            )));
        }
        Ok(self)
    }

    /// Build the service and relocate staged artifacts
    ///
    /// # Errors
    ///
    /// Returns an error if the registry, storage, artifact operations or
    /// backend is missing.
    pub fn build(self) -> Result<OtaDexoptService, Error> {
        let registry = self.registry.ok_or_else(|| missing("registry"))?;
        let storage = self.storage.ok_or_else(|| missing("storage"))?;
        let artifacts = self.artifacts.ok_or_else(|| missing("artifacts"))?;
        let backend = self.backend.ok_or_else(|| missing("backend"))?;

        let policy = self
            .policy
            .unwrap_or_else(|| Arc::new(InstalldPolicy::new(None, self.isa_table.clone())));
        let data_dir = self
            .data_dir
            .unwrap_or_else(|| PathBuf::from(constants::DATA_DIR));
        let immutable_partitions = self.immutable_partitions.unwrap_or_else(|| {
            constants::IMMUTABLE_PARTITIONS
                .iter()
                .map(PathBuf::from)
                .collect()
        });
        let install_lock = self.install_lock.unwrap_or_default();

        let generator = CommandGenerator::new(policy, DiskSpaceGuard::new(storage, data_dir));
        let relocator = ArtifactRelocator::new(artifacts, immutable_partitions)
            .with_isa_table(self.isa_table)
            .with_event_sender(self.tx.clone());

        // No session exists yet, so relocation cannot overlap one
        let relocation = relocator.relocate(&registry.all_packages());

        Ok(OtaDexoptService {
            session: Mutex::new(Session::new()),
            registry,
            generator,
            direct: DirectBackend::new(backend, install_lock),
            relocator,
            relocation,
            tx: self.tx,
        })
    }
}

fn missing(component: &str) -> Error {
    SessionError::MissingComponent {
        component: component.to_string(),
    }
    .into()
}
