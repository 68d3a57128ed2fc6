//! Package registry

use otadex_errors::{ConfigError, Error};
use otadex_types::Package;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

/// Source of installed package snapshots
pub trait PackageRegistry: Send + Sync {
    /// Packages to optimize, in the order they should be processed
    fn packages_for_dexopt(&self) -> Vec<Package>;

    /// Every known package
    fn all_packages(&self) -> Vec<Package>;
}

#[derive(Debug, Deserialize)]
struct Manifest {
    #[serde(default, rename = "package")]
    packages: Vec<Package>,
}

/// Registry backed by a TOML manifest of `[[package]]` tables
///
/// ```toml
/// [[package]]
/// name = "com.example.app"
/// install_dir = "/data/app/com.example.app-1"
/// code_paths = ["/data/app/com.example.app-1/base.apk"]
/// instruction_sets = ["arm64"]
/// core_app = false
/// ```
#[derive(Debug, Clone, Default)]
pub struct ManifestRegistry {
    packages: Vec<Package>,
}

impl ManifestRegistry {
    /// Build a registry from packages in manifest order
    ///
    /// Packages without an install directory get the parent of their base code path.
    ///
    /// # Errors
    ///
    /// Returns an error if two packages share a name.
    pub fn new(packages: Vec<Package>) -> Result<Self, Error> {
        let mut seen = HashSet::new();
        for package in &packages {
            if !seen.insert(package.name.as_str()) {
                return Err(ConfigError::Invalid {
                    message: format!("duplicate package {}", package.name),
                }
                .into());
            }
        }
        let packages = packages
            .into_iter()
            .map(Package::with_default_install_dir)
            .collect();
        Ok(Self { packages })
    }

    /// Parse a manifest
    ///
    /// # Errors
    ///
    /// Returns an error if the manifest is not valid TOML, does not describe
    /// packages, or names a package twice.
    pub fn from_toml_str(contents: &str) -> Result<Self, Error> {
        let manifest: Manifest = toml::from_str(contents).map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })?;
        Self::new(manifest.packages)
    }

    /// Load a manifest from disk
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub async fn load(path: &Path) -> Result<Self, Error> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| Error::io_with_path(&e, path))?;
        Self::from_toml_str(&contents)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

impl PackageRegistry for ManifestRegistry {
    fn packages_for_dexopt(&self) -> Vec<Package> {
        let (core, others): (Vec<&Package>, Vec<&Package>) = self
            .packages
            .iter()
            .filter(|package| package.can_optimize())
            .partition(|package| package.core_app);
        core.into_iter().chain(others).cloned().collect()
    }

    fn all_packages(&self) -> Vec<Package> {
        self.packages.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use otadex_types::InstructionSet;
    use std::path::PathBuf;

    const MANIFEST: &str = r#"
[[package]]
name = "com.example.maps"
code_paths = ["/data/app/com.example.maps-1/base.apk"]
instruction_sets = ["arm64", "arm"]

[[package]]
name = "com.example.fonts"
code_paths = ["/data/app/com.example.fonts-1/base.apk"]
has_code = false

[[package]]
name = "android.core"
install_dir = "/system/framework/core"
code_paths = ["/system/framework/core/core.jar"]
core_app = true

[[package]]
name = "com.example.mail"
install_dir = "/data/app/com.example.mail-2"
code_paths = [
    "/data/app/com.example.mail-2/base.apk",
    "/data/app/com.example.mail-2/split_config.arm64.apk",
]
shared_libraries = ["/system/framework/org.apache.http.legacy.jar"]
uid = 10042
"#;

    #[test]
    fn parses_manifest_tables() {
        let registry = ManifestRegistry::from_toml_str(MANIFEST).unwrap();
        assert_eq!(registry.len(), 4);

        let all = registry.all_packages();
        assert_eq!(
            all[0].instruction_sets,
            vec![InstructionSet::Arm64, InstructionSet::Arm]
        );
        assert_eq!(
            all[0].install_dir,
            Some(PathBuf::from("/data/app/com.example.maps-1"))
        );
        assert_eq!(
            all[0].artifact_dir(),
            Some(PathBuf::from("/data/app/com.example.maps-1/oat"))
        );
        assert!(!all[1].has_code);
        assert_eq!(all[3].uid, 10_042);
        assert_eq!(all[3].code_paths.len(), 2);
        assert_eq!(
            all[3].artifact_dir(),
            Some(PathBuf::from("/data/app/com.example.mail-2/oat"))
        );
    }

    #[test]
    fn core_apps_come_first_and_codeless_packages_are_dropped() {
        let registry = ManifestRegistry::from_toml_str(MANIFEST).unwrap();
        let names: Vec<String> = registry
            .packages_for_dexopt()
            .into_iter()
            .map(|package| package.name)
            .collect();
        assert_eq!(
            names,
            vec!["android.core", "com.example.maps", "com.example.mail"]
        );
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let err = ManifestRegistry::new(vec![
            Package::new("a", "/data/app/a/base.apk"),
            Package::new("a", "/data/app/a-2/base.apk"),
        ])
        .unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::Invalid { .. })));
    }

    #[test]
    fn malformed_manifest_is_a_parse_error() {
        let err = ManifestRegistry::from_toml_str("[[package]]\ncode_paths = 3\n").unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::ParseError { .. })));
    }

    #[tokio::test]
    async fn loads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("packages.toml");
        std::fs::write(&path, MANIFEST).unwrap();

        let registry = ManifestRegistry::load(&path).await.unwrap();
        assert_eq!(registry.packages_for_dexopt().len(), 3);

        let missing = ManifestRegistry::load(&dir.path().join("absent.toml"))
            .await
            .unwrap_err();
        assert!(matches!(missing, Error::Io { .. }));
    }
}
