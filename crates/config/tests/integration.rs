//! Integration tests for config

#[cfg(test)]
mod tests {
    use otadex_config::*;
    use otadex_types::{ColorChoice, CompilerFilter, InstructionSet, OutputFormat};
    use std::io::Write;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    // Mutex to ensure env var tests don't run concurrently
    static ENV_TEST_MUTEX: Mutex<()> = Mutex::new(());

    fn clear_env() {
        std::env::remove_var("OTADEX_OUTPUT");
        std::env::remove_var("OTADEX_DATA_DIR");
        std::env::remove_var("OTADEX_LOW_SPACE_BYTES");
        std::env::remove_var("OTADEX_COMPILER_FILTER");
    }

    #[tokio::test]
    async fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[general]
default_output = "plain"
color = "never"

[dexopt]
compiler_filter = "speed"

[dexopt.dex_code_isa]
arm = "arm64"

[storage]
data_dir = "/mnt/data"
low_space_percent = 5

[paths]
staging_dir = "/mnt/data/ota"
immutable_partitions = ["/system", "/vendor", "/product"]
manifest = "/etc/otadex/packages.toml"
        "#
        )
        .unwrap();

        let config = Config::load_from_file(temp_file.path()).await.unwrap();
        assert_eq!(config.general.default_output, OutputFormat::Plain);
        assert_eq!(config.general.color, ColorChoice::Never);
        assert_eq!(config.ota_compiler_filter(), CompilerFilter::Speed);
        assert_eq!(config.data_dir(), Path::new("/mnt/data"));
        assert_eq!(config.storage.low_space_percent, 5);
        assert_eq!(
            config.storage.low_space_max_bytes,
            constants::DEFAULT_LOW_SPACE_MAX_BYTES
        );
        assert_eq!(config.staging_dir(), PathBuf::from("/mnt/data/ota"));
        assert_eq!(config.immutable_partitions().len(), 3);
        assert_eq!(
            config.manifest_path().unwrap(),
            Path::new("/etc/otadex/packages.toml")
        );

        let table = config.dex_code_isa_table().unwrap();
        assert_eq!(table.get(&InstructionSet::Arm), Some(&InstructionSet::Arm64));
    }

    #[tokio::test]
    async fn test_invalid_toml_is_a_parse_error() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "[storage\nlow_space_percent = ").unwrap();

        let err = Config::load_from_file(temp_file.path()).await.unwrap_err();
        assert!(matches!(
            err,
            otadex_errors::Error::Config(otadex_errors::ConfigError::ParseError { .. })
        ));
    }

    #[tokio::test]
    async fn test_low_space_percent_above_100_is_rejected() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "[storage]\nlow_space_percent = 150").unwrap();

        let err = Config::load_from_file(temp_file.path()).await.unwrap_err();
        assert!(matches!(
            err,
            otadex_errors::Error::Config(otadex_errors::ConfigError::InvalidValue { ref field, ref value })
                if field == "storage.low_space_percent" && value == "150"
        ));

        let mut config = Config::default();
        config.storage.low_space_percent = 100;
        assert!(config.validate().is_ok());
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let err = Config::load_or_default(Some(Path::new("/nonexistent/otadex.toml")))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            otadex_errors::Error::Config(otadex_errors::ConfigError::NotFound { .. })
        ));
    }

    #[test]
    fn test_merge_env() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();
        clear_env();

        std::env::set_var("OTADEX_OUTPUT", "json");
        std::env::set_var("OTADEX_DATA_DIR", "/tmp/data");
        std::env::set_var("OTADEX_LOW_SPACE_BYTES", "4096");
        std::env::set_var("OTADEX_COMPILER_FILTER", "interpret-only");

        let mut config = Config::default();
        config.merge_env().unwrap();

        assert_eq!(config.general.default_output, OutputFormat::Json);
        assert_eq!(config.data_dir(), Path::new("/tmp/data"));
        assert_eq!(config.storage.low_space_bytes, Some(4096));
        assert_eq!(config.ota_compiler_filter(), CompilerFilter::InterpretOnly);

        clear_env();
    }

    #[test]
    fn test_invalid_env_value() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();
        clear_env();

        std::env::set_var("OTADEX_LOW_SPACE_BYTES", "lots");

        let mut config = Config::default();
        let result = config.merge_env();
        assert!(result.is_err());

        clear_env();
    }
}
