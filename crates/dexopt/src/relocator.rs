//! Startup relocation of OTA-staged artifacts

use otadex_events::{AppEvent, EventEmitter, EventSender, RelocationEvent};
use otadex_platform::{ArtifactOperations, MoveOutcome};
use otadex_types::{dex_code_instruction_sets, InstructionSet, Package, RelocationReport};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Moves artifacts compiled during an update into each package's artifact directory
pub struct ArtifactRelocator {
    mover: Arc<dyn ArtifactOperations>,
    immutable_partitions: Vec<PathBuf>,
    isa_table: BTreeMap<InstructionSet, InstructionSet>,
    default_isa: InstructionSet,
    tx: Option<EventSender>,
}

impl EventEmitter for ArtifactRelocator {
    fn event_sender(&self) -> Option<&EventSender> {
        self.tx.as_ref()
    }
}

impl ArtifactRelocator {
    pub fn new(mover: Arc<dyn ArtifactOperations>, immutable_partitions: Vec<PathBuf>) -> Self {
        Self {
            mover,
            immutable_partitions,
            isa_table: BTreeMap::new(),
            default_isa: InstructionSet::host(),
            tx: None,
        }
    }

    #[must_use]
    pub fn with_isa_table(mut self, isa_table: BTreeMap<InstructionSet, InstructionSet>) -> Self {
        self.isa_table = isa_table;
        self
    }

    /// Instruction set assumed for packages that declare none
    #[must_use]
    pub fn with_default_instruction_set(mut self, isa: InstructionSet) -> Self {
        self.default_isa = isa;
        self
    }

    #[must_use]
    pub fn with_event_sender(mut self, tx: Option<EventSender>) -> Self {
        self.tx = tx;
        self
    }

    /// Relocate artifacts for every eligible package
    ///
    /// Packages installed under an immutable partition had their artifacts
    /// placed during the update itself and are left alone. Per-artifact
    /// failures are counted, never returned.
    pub fn relocate(&self, packages: &[Package]) -> RelocationReport {
        self.emit(AppEvent::Relocation(RelocationEvent::Started {
            packages: packages.len(),
        }));

        let mut report = RelocationReport::default();
        for package in packages {
            report.packages_scanned += 1;
            if !package.can_optimize() {
                continue;
            }

            let Some(artifact_dir) = package.artifact_dir() else {
                report.packages_skipped += 1;
                self.emit(AppEvent::Relocation(RelocationEvent::PackageSkipped {
                    package: package.name.clone(),
                    reason: "package has code but no install directory".to_string(),
                }));
                continue;
            };

            if package.is_under_any(&self.immutable_partitions) {
                report.packages_skipped += 1;
                continue;
            }

            let native = package.instruction_sets_or(&self.default_isa);
            for isa in dex_code_instruction_sets(native, &self.isa_table) {
                for code_path in &package.code_paths {
                    report.attempted += 1;
                    match self.mover.move_artifact(code_path, isa, &artifact_dir) {
                        Ok(MoveOutcome::Moved) => {
                            report.moved += 1;
                            self.emit(AppEvent::Relocation(RelocationEvent::ArtifactMoved {
                                package: package.name.clone(),
                                code_path: code_path.clone(),
                                instruction_set: isa,
                            }));
                        }
                        Ok(MoveOutcome::NotStaged) => report.not_staged += 1,
                        Err(e) => {
                            report.failed += 1;
                            self.emit(AppEvent::Relocation(
                                RelocationEvent::ArtifactMoveFailed {
                                    package: package.name.clone(),
                                    code_path: code_path.clone(),
                                    instruction_set: isa,
                                    message: e.to_string(),
                                },
                            ));
                        }
                    }
                }
            }
        }

        self.emit(AppEvent::Relocation(RelocationEvent::Completed {
            report: report.clone(),
        }));
        report
    }
}

impl std::fmt::Debug for ArtifactRelocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactRelocator")
            .field("immutable_partitions", &self.immutable_partitions)
            .field("isa_table", &self.isa_table)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use otadex_errors::PlatformError;
    use std::path::Path;
    use std::sync::Mutex;

    #[derive(Default)]
    struct ScriptedMover {
        calls: Mutex<Vec<(PathBuf, InstructionSet, PathBuf)>>,
    }

    impl ArtifactOperations for ScriptedMover {
        fn move_artifact(
            &self,
            code_path: &Path,
            isa: InstructionSet,
            artifact_dir: &Path,
        ) -> Result<MoveOutcome, PlatformError> {
            self.calls.lock().unwrap().push((
                code_path.to_path_buf(),
                isa,
                artifact_dir.to_path_buf(),
            ));
            if code_path.ends_with("broken.apk") {
                Err(PlatformError::FilesystemOperationFailed {
                    operation: "rename".to_string(),
                    message: "read-only".to_string(),
                })
            } else if isa == InstructionSet::Arm {
                Ok(MoveOutcome::NotStaged)
            } else {
                Ok(MoveOutcome::Moved)
            }
        }
    }

    fn relocator(mover: Arc<ScriptedMover>) -> ArtifactRelocator {
        ArtifactRelocator::new(
            mover,
            vec![PathBuf::from("/system"), PathBuf::from("/vendor")],
        )
    }

    #[test]
    fn moves_every_isa_and_code_path() {
        let mover = Arc::new(ScriptedMover::default());
        let package = Package::new("mail", "/data/app/mail-1/base.apk")
            .with_code_path("/data/app/mail-1/broken.apk")
            .with_instruction_set(InstructionSet::Arm64)
            .with_instruction_set(InstructionSet::Arm);

        let report = relocator(mover.clone()).relocate(&[package]);
        assert_eq!(
            report,
            RelocationReport {
                packages_scanned: 1,
                packages_skipped: 0,
                attempted: 4,
                moved: 1,
                not_staged: 1,
                failed: 2,
            }
        );

        let calls = mover.calls.lock().unwrap();
        assert_eq!(
            calls[0],
            (
                PathBuf::from("/data/app/mail-1/base.apk"),
                InstructionSet::Arm64,
                PathBuf::from("/data/app/mail-1/oat")
            )
        );
    }

    #[test]
    fn immutable_partitions_are_never_touched() {
        let mover = Arc::new(ScriptedMover::default());
        let packages = [
            Package::new("core", "/system/framework/core.jar")
                .with_instruction_set(InstructionSet::Arm64),
            Package::new("camera", "/vendor/app/camera/camera.apk")
                .with_instruction_set(InstructionSet::Arm64),
            Package::new("sideload", "/systemx/app/s/base.apk")
                .with_instruction_set(InstructionSet::Arm64),
        ];

        let report = relocator(mover.clone()).relocate(&packages);
        assert_eq!(report.packages_skipped, 2);
        assert_eq!(report.attempted, 1);

        let calls = mover.calls.lock().unwrap();
        assert!(calls
            .iter()
            .all(|(code_path, _, _)| !code_path.starts_with("/system")));
        assert_eq!(calls[0].0, PathBuf::from("/systemx/app/s/base.apk"));
    }

    #[test]
    fn packages_without_code_or_install_dir_are_passed_over() {
        let mover = Arc::new(ScriptedMover::default());
        let mut codeless = Package::new("fonts", "/data/app/fonts/base.apk");
        codeless.has_code = false;
        let mut homeless = Package::new("orphan", "/data/app/orphan/base.apk")
            .with_instruction_set(InstructionSet::Arm64);
        homeless.install_dir = None;

        let (tx, mut rx) = otadex_events::channel();
        let report = relocator(mover.clone())
            .with_event_sender(Some(tx))
            .relocate(&[codeless, homeless]);

        assert_eq!(report.packages_scanned, 2);
        assert_eq!(report.packages_skipped, 1);
        assert_eq!(report.attempted, 0);
        assert!(mover.calls.lock().unwrap().is_empty());

        let mut skipped = Vec::new();
        while let Ok(message) = rx.try_recv() {
            if let AppEvent::Relocation(RelocationEvent::PackageSkipped { package, .. }) =
                message.event
            {
                skipped.push(package);
            }
        }
        assert_eq!(skipped, vec!["orphan"]);
    }

    #[test]
    fn translated_isas_are_used() {
        let mover = Arc::new(ScriptedMover::default());
        let package = Package::new("game", "/data/app/game/base.apk")
            .with_instruction_set(InstructionSet::Arm)
            .with_instruction_set(InstructionSet::Arm64);

        relocator(mover.clone())
            .with_isa_table(BTreeMap::from([(InstructionSet::Arm, InstructionSet::Arm64)]))
            .relocate(&[package]);

        let calls = mover.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1, InstructionSet::Arm64);
    }
}
