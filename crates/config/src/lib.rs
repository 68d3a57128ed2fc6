#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for otadex
//!
//! This crate handles loading and merging configuration from:
//! - Default values (hard-coded)
//! - Configuration file (~/.config/otadex/config.toml)
//! - Environment variables
//! - CLI flags

pub mod constants;

use otadex_errors::{ConfigError, Error};
use otadex_types::{ColorChoice, CompilerFilter, DexoptReason, InstructionSet, OutputFormat};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub dexopt: DexoptConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub paths: PathConfig,
}

/// General configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_output_format")]
    pub default_output: OutputFormat,
    #[serde(default = "default_color_choice")]
    pub color: ColorChoice,
}

/// Compilation configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DexoptConfig {
    /// Overrides the filter the A/B OTA reason maps to
    #[serde(default)]
    pub compiler_filter: Option<CompilerFilter>,
    /// Native instruction set -> instruction set dex code is compiled for
    #[serde(default)]
    pub dex_code_isa: BTreeMap<String, String>,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_low_space_percent")]
    pub low_space_percent: u8,
    #[serde(default = "default_low_space_max_bytes")]
    pub low_space_max_bytes: u64,
    /// Explicit threshold; takes precedence over the computed one
    #[serde(default)]
    pub low_space_bytes: Option<u64>,
}

/// Path configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PathConfig {
    pub staging_dir: Option<PathBuf>,
    pub immutable_partitions: Option<Vec<PathBuf>>,
    pub manifest: Option<PathBuf>,
    pub backend_program: Option<PathBuf>,
}

// Default implementations

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            default_output: OutputFormat::Tty,
            color: ColorChoice::Auto,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            low_space_percent: constants::DEFAULT_LOW_SPACE_PERCENT,
            low_space_max_bytes: constants::DEFAULT_LOW_SPACE_MAX_BYTES,
            low_space_bytes: None,
        }
    }
}

// Default value functions for serde
fn default_output_format() -> OutputFormat {
    OutputFormat::Tty
}

fn default_color_choice() -> ColorChoice {
    ColorChoice::Auto
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(constants::DATA_DIR)
}

fn default_low_space_percent() -> u8 {
    constants::DEFAULT_LOW_SPACE_PERCENT
}

fn default_low_space_max_bytes() -> u64 {
    constants::DEFAULT_LOW_SPACE_MAX_BYTES
}

impl Config {
    /// Get the default config file path
    ///
    /// # Errors
    ///
    /// Returns an error if the system config directory cannot be determined.
    pub fn default_path() -> Result<PathBuf, Error> {
        let config_dir = dirs::config_dir().ok_or_else(|| ConfigError::NotFound {
            path: "config directory".to_string(),
        })?;
        Ok(config_dir.join("otadex").join("config.toml"))
    }

    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, if the file contents
    /// contain invalid TOML syntax, or if a value is out of range.
    pub async fn load_from_file(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)
            .await
            .map_err(|_| ConfigError::NotFound {
                path: path.display().to_string(),
            })?;

        let config: Self = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check values whose range the types do not capture
    ///
    /// # Errors
    ///
    /// Returns `InvalidValue` if `storage.low_space_percent` exceeds 100.
    pub fn validate(&self) -> Result<(), Error> {
        if self.storage.low_space_percent > 100 {
            return Err(ConfigError::InvalidValue {
                field: "storage.low_space_percent".to_string(),
                value: self.storage.low_space_percent.to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// Load configuration with fallback to defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read
    /// or contains invalid TOML syntax.
    pub async fn load() -> Result<Self, Error> {
        let config_path = Self::default_path()?;

        if config_path.exists() {
            Self::load_from_file(&config_path).await
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from an optional path or use default
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            Some(config_path) => Self::load_from_file(config_path).await,
            None => Self::load().await,
        }
    }

    /// Merge with environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables contain invalid values
    /// that cannot be parsed into the expected types.
    pub fn merge_env(&mut self) -> Result<(), Error> {
        // OTADEX_OUTPUT
        if let Ok(output) = std::env::var("OTADEX_OUTPUT") {
            self.general.default_output = match output.as_str() {
                "plain" => OutputFormat::Plain,
                "tty" => OutputFormat::Tty,
                "json" => OutputFormat::Json,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        field: "OTADEX_OUTPUT".to_string(),
                        value: output,
                    }
                    .into())
                }
            };
        }

        // OTADEX_DATA_DIR
        if let Ok(data_dir) = std::env::var("OTADEX_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(data_dir);
        }

        // OTADEX_LOW_SPACE_BYTES
        if let Ok(bytes) = std::env::var("OTADEX_LOW_SPACE_BYTES") {
            self.storage.low_space_bytes =
                Some(bytes.parse().map_err(|_| ConfigError::InvalidValue {
                    field: "OTADEX_LOW_SPACE_BYTES".to_string(),
                    value: bytes,
                })?);
        }

        // OTADEX_COMPILER_FILTER
        if let Ok(filter) = std::env::var("OTADEX_COMPILER_FILTER") {
            let parsed = filter.parse::<CompilerFilter>().map_err(|_| {
                ConfigError::InvalidValue {
                    field: "OTADEX_COMPILER_FILTER".to_string(),
                    value: filter,
                }
            })?;
            self.dexopt.compiler_filter = Some(parsed);
        }

        Ok(())
    }

    /// Compiler filter used for A/B OTA compilation
    #[must_use]
    pub fn ota_compiler_filter(&self) -> CompilerFilter {
        self.dexopt
            .compiler_filter
            .unwrap_or_else(|| DexoptReason::AbOta.default_filter())
    }

    /// Parsed dex-code instruction set translation table
    ///
    /// # Errors
    ///
    /// Returns an error if either side of an entry is not a known instruction set.
    pub fn dex_code_isa_table(&self) -> Result<BTreeMap<InstructionSet, InstructionSet>, Error> {
        let mut table = BTreeMap::new();
        for (native, dex) in &self.dexopt.dex_code_isa {
            table.insert(
                native.parse::<InstructionSet>()?,
                dex.parse::<InstructionSet>()?,
            );
        }
        Ok(table)
    }

    /// Get the data volume path
    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.storage.data_dir
    }

    /// Get the staging path (with default)
    #[must_use]
    pub fn staging_dir(&self) -> PathBuf {
        self.paths
            .staging_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(constants::OTA_STAGING_DIR))
    }

    /// Get the immutable partition roots (with default)
    #[must_use]
    pub fn immutable_partitions(&self) -> Vec<PathBuf> {
        self.paths.immutable_partitions.clone().unwrap_or_else(|| {
            constants::IMMUTABLE_PARTITIONS
                .iter()
                .map(PathBuf::from)
                .collect()
        })
    }

    /// Get the execution backend program (with default)
    #[must_use]
    pub fn backend_program(&self) -> PathBuf {
        self.paths
            .backend_program
            .clone()
            .unwrap_or_else(|| PathBuf::from(constants::DEFAULT_BACKEND_PROGRAM))
    }

    /// Get the package manifest path
    ///
    /// # Errors
    ///
    /// Returns an error if no manifest is configured.
    pub fn manifest_path(&self) -> Result<&Path, Error> {
        self.paths.manifest.as_deref().ok_or_else(|| {
            ConfigError::MissingField {
                field: "manifest".to_string(),
            }
            .into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_host_layout() {
        let config = Config::default();
        assert_eq!(config.data_dir(), Path::new("/data"));
        assert_eq!(config.staging_dir(), PathBuf::from("/data/ota"));
        assert_eq!(
            config.immutable_partitions(),
            vec![PathBuf::from("/system"), PathBuf::from("/vendor")]
        );
        assert_eq!(config.storage.low_space_percent, 10);
        assert_eq!(config.storage.low_space_max_bytes, 500 * 1024 * 1024);
        assert_eq!(config.ota_compiler_filter(), CompilerFilter::SpeedProfile);
        assert_eq!(config.backend_program(), PathBuf::from("otadex-installd"));
    }

    #[test]
    fn isa_table_rejects_unknown_sets() {
        let mut config = Config::default();
        config
            .dexopt
            .dex_code_isa
            .insert("arm".to_string(), "arm64".to_string());
        let table = config.dex_code_isa_table().unwrap();
        assert_eq!(
            table.get(&InstructionSet::Arm),
            Some(&InstructionSet::Arm64)
        );

        config
            .dexopt
            .dex_code_isa
            .insert("riscv".to_string(), "arm".to_string());
        assert!(config.dex_code_isa_table().is_err());
    }

    #[test]
    fn missing_manifest_is_reported() {
        let config = Config::default();
        assert!(config.manifest_path().is_err());
    }
}
