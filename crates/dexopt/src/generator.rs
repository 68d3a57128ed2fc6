//! Per-package command generation

use otadex_errors::Error;
use otadex_platform::DexoptBackend;
use otadex_types::{DexoptCommand, DexoptFlags, DexoptReason, Package};
use std::sync::Arc;

use crate::backend::RecordingBackend;
use crate::guard::{DiskSpaceGuard, SpaceCheck};
use crate::policy::{DexoptOptions, DexoptPolicy, DexoptResult};

/// What happened when a package was generated
#[derive(Debug, Clone)]
pub enum GenerationOutcome {
    /// The policy ran to completion
    Generated,
    /// The data volume was below its threshold; the policy never ran
    SkippedLowSpace {
        usable_bytes: u64,
        threshold_bytes: u64,
    },
    /// The policy gave up on the package
    PolicyFailed(Error),
}

/// Runs the optimization policy for one package at a time
#[derive(Clone)]
pub struct CommandGenerator {
    policy: Arc<dyn DexoptPolicy>,
    guard: DiskSpaceGuard,
}

impl CommandGenerator {
    pub fn new(policy: Arc<dyn DexoptPolicy>, guard: DiskSpaceGuard) -> Self {
        Self { policy, guard }
    }

    /// Options every A/B OTA invocation is generated with
    #[must_use]
    pub fn ota_options(&self) -> DexoptOptions {
        let reason = DexoptReason::AbOta;
        DexoptOptions {
            reason,
            compiler_filter: self.policy.compiler_filter_for_reason(reason),
            extra_flags: DexoptFlags::OTA,
        }
    }

    /// Low-space outcome if the data volume is below its threshold
    ///
    /// # Errors
    ///
    /// Only configuration errors from the disk space check propagate.
    pub fn check_space(&self) -> Result<Option<GenerationOutcome>, Error> {
        match self.guard.check()? {
            SpaceCheck::Low {
                usable_bytes,
                threshold_bytes,
            } => Ok(Some(GenerationOutcome::SkippedLowSpace {
                usable_bytes,
                threshold_bytes,
            })),
            SpaceCheck::Sufficient { .. } => Ok(None),
        }
    }

    /// Run the policy for `package` against `backend` without a space check
    pub fn run_policy(&self, package: &Package, backend: &dyn DexoptBackend) -> GenerationOutcome {
        match self
            .policy
            .perform_dexopt(package, &self.ota_options(), backend)
        {
            DexoptResult::Performed | DexoptResult::Skipped => GenerationOutcome::Generated,
            DexoptResult::Failed(e) => GenerationOutcome::PolicyFailed(e),
        }
    }

    /// Check disk space, then run the policy for `package` against `backend`
    ///
    /// # Errors
    ///
    /// Only configuration errors from the disk space check propagate.
    pub fn generate(
        &self,
        package: &Package,
        backend: &dyn DexoptBackend,
    ) -> Result<GenerationOutcome, Error> {
        if let Some(skipped) = self.check_space()? {
            return Ok(skipped);
        }
        Ok(self.run_policy(package, backend))
    }

    /// Generate `package` into a fresh recording backend
    ///
    /// Anything other than [`GenerationOutcome::Generated`] yields no commands.
    ///
    /// # Errors
    ///
    /// Only configuration errors from the disk space check propagate.
    pub fn record(
        &self,
        package: &Package,
    ) -> Result<(GenerationOutcome, Vec<DexoptCommand>), Error> {
        let recording = RecordingBackend::new();
        let outcome = self.generate(package, &recording)?;
        let commands = match outcome {
            GenerationOutcome::Generated => recording.into_commands(),
            _ => Vec::new(),
        };
        Ok((outcome, commands))
    }
}

impl std::fmt::Debug for CommandGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandGenerator")
            .field("guard", &self.guard)
            .finish_non_exhaustive()
    }
}
