//! Optimization policy
//!
//! Decides which compiler invocations a package needs and hands each one to
//! a backend. Whether the backend records or executes them is not the
//! policy's concern.

use otadex_errors::Error;
use otadex_platform::DexoptBackend;
use otadex_types::{
    dex_code_instruction_sets, CompilerFilter, DexoptFlags, DexoptInvocation, DexoptReason,
    InstructionSet, Package,
};
use std::collections::BTreeMap;

/// Parameters of one package optimization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DexoptOptions {
    pub reason: DexoptReason,
    pub compiler_filter: CompilerFilter,
    /// Flags ORed into every invocation
    pub extra_flags: DexoptFlags,
}

/// What the policy did with a package
#[derive(Debug, Clone)]
pub enum DexoptResult {
    /// Every invocation was handed to the backend
    Performed,
    /// The package needs no compilation
    Skipped,
    /// An invocation was rejected; later invocations were not attempted
    Failed(Error),
}

pub trait DexoptPolicy: Send + Sync {
    /// Compiler filter the host uses for `reason`
    fn compiler_filter_for_reason(&self, reason: DexoptReason) -> CompilerFilter;

    /// Issue every invocation `package` needs against `backend`
    fn perform_dexopt(
        &self,
        package: &Package,
        options: &DexoptOptions,
        backend: &dyn DexoptBackend,
    ) -> DexoptResult;
}

/// Policy issuing one `dexopt` invocation per dex-code ISA and code path
#[derive(Debug, Clone)]
pub struct InstalldPolicy {
    ota_filter: Option<CompilerFilter>,
    isa_table: BTreeMap<InstructionSet, InstructionSet>,
    default_isa: InstructionSet,
}

impl Default for InstalldPolicy {
    fn default() -> Self {
        Self::new(None, BTreeMap::new())
    }
}

impl InstalldPolicy {
    /// Create a policy; `ota_filter` overrides the A/B OTA filter
    #[must_use]
    pub fn new(
        ota_filter: Option<CompilerFilter>,
        isa_table: BTreeMap<InstructionSet, InstructionSet>,
    ) -> Self {
        Self {
            ota_filter,
            isa_table,
            default_isa: InstructionSet::host(),
        }
    }

    /// Instruction set used for packages that declare none
    #[must_use]
    pub fn with_default_instruction_set(mut self, isa: InstructionSet) -> Self {
        self.default_isa = isa;
        self
    }

    fn instruction_sets(&self, package: &Package) -> Vec<InstructionSet> {
        let native = package.instruction_sets_or(&self.default_isa);
        dex_code_instruction_sets(native, &self.isa_table)
    }
}

impl DexoptPolicy for InstalldPolicy {
    fn compiler_filter_for_reason(&self, reason: DexoptReason) -> CompilerFilter {
        match (reason, self.ota_filter) {
            (DexoptReason::AbOta, Some(filter)) => filter,
            _ => reason.default_filter(),
        }
    }

    fn perform_dexopt(
        &self,
        package: &Package,
        options: &DexoptOptions,
        backend: &dyn DexoptBackend,
    ) -> DexoptResult {
        if !package.can_optimize() {
            return DexoptResult::Skipped;
        }

        let mut flags = DexoptFlags::PUBLIC | options.extra_flags;
        if options.compiler_filter.is_profile_guided() {
            flags |= DexoptFlags::PROFILE_GUIDED;
        }

        for isa in self.instruction_sets(package) {
            for code_path in &package.code_paths {
                let invocation = DexoptInvocation {
                    code_path: code_path.clone(),
                    uid: package.uid,
                    package_name: package.name.clone(),
                    instruction_set: isa,
                    output_dir: package.artifact_dir(),
                    flags,
                    compiler_filter: options.compiler_filter,
                    shared_libraries: package.shared_libraries.clone(),
                };
                if let Err(e) = backend.execute(&invocation) {
                    return DexoptResult::Failed(e.into());
                }
            }
        }

        DexoptResult::Performed
    }
}
