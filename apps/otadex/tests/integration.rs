//! Integration tests for otadex CLI

use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

fn write_fixture(dir: &Path, output: &str) -> std::path::PathBuf {
    let manifest = dir.join("packages.toml");
    fs::write(
        &manifest,
        r#"
[[package]]
name = "com.example.maps"
install_dir = "/data/app/com.example.maps-1"
code_paths = ["/data/app/com.example.maps-1/base.apk", "/data/app/com.example.maps-1/split.apk"]
instruction_sets = ["arm64"]

[[package]]
name = "android.core"
install_dir = "/system/framework/core"
code_paths = ["/system/framework/core/core.jar"]
instruction_sets = ["arm64"]
core_app = true

[[package]]
name = "com.example.fonts"
code_paths = ["/data/app/com.example.fonts-1/base.apk"]
has_code = false
"#,
    )
    .unwrap();

    let staging = dir.join("ota");
    fs::create_dir_all(&staging).unwrap();

    let config = dir.join("config.toml");
    fs::write(
        &config,
        format!(
            r#"
[general]
default_output = "{output}"
color = "never"

[storage]
data_dir = "{data}"
low_space_bytes = 1

[paths]
staging_dir = "{staging}"
manifest = "{manifest}"
"#,
            data = dir.display(),
            staging = staging.display(),
            manifest = manifest.display(),
        ),
    )
    .unwrap();
    config
}

fn otadex() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_otadex"));
    command
        .env_remove("OTADEX_OUTPUT")
        .env_remove("OTADEX_DATA_DIR")
        .env_remove("OTADEX_LOW_SPACE_BYTES")
        .env_remove("OTADEX_COMPILER_FILTER")
        .env_remove("OTADEX_MANIFEST")
        .env_remove("RUST_LOG");
    command
}

#[test]
fn test_cli_version() {
    let output = otadex()
        .arg("--version")
        .output()
        .expect("Failed to execute otadex");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("otadex"));
}

#[test]
fn test_cli_help() {
    let output = otadex()
        .arg("--help")
        .output()
        .expect("Failed to execute otadex");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("A/B OTA dexopt coordinator"));
    assert!(stdout.contains("export"));
    assert!(stdout.contains("run"));
    assert!(stdout.contains("relocate"));
}

#[test]
fn test_cli_invalid_command() {
    let output = otadex()
        .arg("invalid-command")
        .output()
        .expect("Failed to execute otadex");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unrecognized subcommand"));
}

#[test]
fn test_export_prints_core_packages_first() {
    let dir = TempDir::new().unwrap();
    let config = write_fixture(dir.path(), "plain");

    let output = otadex()
        .arg("--config")
        .arg(&config)
        .arg("export")
        .output()
        .expect("Failed to execute otadex");

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("dexopt /system/framework/core/core.jar 0 android.core arm64"));
    assert!(lines[1].starts_with("dexopt /data/app/com.example.maps-1/base.apk"));
    assert!(lines[2].starts_with("dexopt /data/app/com.example.maps-1/split.apk"));
    assert!(lines.iter().all(|line| line.contains(" speed-profile ")));
}

#[test]
fn test_export_limit_and_json() {
    let dir = TempDir::new().unwrap();
    let config = write_fixture(dir.path(), "plain");

    let output = otadex()
        .arg("--json")
        .arg("--config")
        .arg(&config)
        .args(["export", "--limit", "1"])
        .output()
        .expect("Failed to execute otadex");

    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["kind"], "export");
    assert_eq!(value["commands"].as_array().unwrap().len(), 1);
    assert_eq!(value["report"]["total_packages"], 2);
}

#[test]
fn test_relocate_reports_counters() {
    let dir = TempDir::new().unwrap();
    let config = write_fixture(dir.path(), "plain");

    let output = otadex()
        .arg("--config")
        .arg(&config)
        .arg("relocate")
        .output()
        .expect("Failed to execute otadex");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    // core.jar lives on /system; the maps package has two code paths, nothing staged
    assert_eq!(
        stdout.trim(),
        "scanned=3 skipped=1 attempted=2 moved=0 not_staged=2 failed=0"
    );
}

#[test]
fn test_missing_manifest_fails() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.toml");
    fs::write(&config, "[general]\ncolor = \"never\"\n").unwrap();

    let output = otadex()
        .arg("--config")
        .arg(&config)
        .arg("export")
        .output()
        .expect("Failed to execute otadex");

    assert!(!output.status.success());
}
