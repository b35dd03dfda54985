//! Tests for launch configuration files
//!
//! These tests verify:
//! - Save/load round trips through real files
//! - Partial configs fall back to stock defaults
//! - Validation mirrors the `validate` subcommand behavior

use dra_launcher::config_file::{EnvVarSpec, LaunchConfig};
use dra_launcher::types::InstallMode;
use std::path::PathBuf;

#[test]
fn test_save_load_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("launch.json");

    let mut config = LaunchConfig::default();
    config.python = Some(PathBuf::from("/usr/bin/python3.11"));
    config.install = InstallMode::Always;
    config.probe_modules.push("httpx".to_string());

    config.save_to_file(&path).unwrap();
    let loaded = LaunchConfig::load_from_file(&path).unwrap();

    assert_eq!(loaded, config);
}

#[test]
fn test_load_partial_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("launch.json");
    std::fs::write(
        &path,
        r#"{
  "app_root": "/opt/deep-research-agent",
  "install": "never"
}"#,
    )
    .unwrap();

    let config = LaunchConfig::load_from_file(&path).unwrap();
    assert_eq!(config.app_root, Some(PathBuf::from("/opt/deep-research-agent")));
    assert_eq!(config.install, InstallMode::Never);
    // Everything else keeps the stock defaults
    assert_eq!(config.entry_point, PathBuf::from("api/run_api.py"));
    assert_eq!(config.requirements, PathBuf::from("requirements.txt"));
    assert_eq!(config.required_env[0].name, "OPENAI_API_KEY");
    assert!(config.validate().is_ok());
}

#[test]
fn test_load_rejects_malformed_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("launch.json");
    std::fs::write(&path, "{ not json").unwrap();

    assert!(LaunchConfig::load_from_file(&path).is_err());
}

#[test]
fn test_load_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    assert!(LaunchConfig::load_from_file(dir.path().join("absent.json")).is_err());
}

#[test]
fn test_validate_rejects_injection_shaped_module() {
    let mut config = LaunchConfig::default();
    config.probe_modules = vec!["os; import shutil".to_string()];
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_round_trip_of_invalid_config() {
    // A config can be written and read back even when it fails validation;
    // validation is a separate, explicit step
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("launch.json");

    let mut config = LaunchConfig::default();
    config.required_env = vec![EnvVarSpec::new("BAD NAME", "contains a space")];
    config.save_to_file(&path).unwrap();

    let loaded = LaunchConfig::load_from_file(&path).unwrap();
    assert!(loaded.validate().is_err());
}
