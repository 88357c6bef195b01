//! CLI integration tests for `index-migrate` using `assert_cmd`.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const CREDENTIAL_VARS: [&str; 4] = [
    "SOURCE_ALGOLIA_APP_ID",
    "SOURCE_ALGOLIA_API_KEY",
    "TARGET_ALGOLIA_APP_ID",
    "TARGET_ALGOLIA_API_KEY",
];

/// Get the CLI binary command with no credentials in the environment.
#[allow(deprecated)]
fn index_migrate_cmd() -> Command {
    let mut cmd = Command::cargo_bin("index-migrate").unwrap();
    for var in CREDENTIAL_VARS {
        cmd.env_remove(var);
    }
    cmd.env_remove("RUST_LOG");
    cmd
}

fn write_config(dir: &Path, binary: &str) -> std::path::PathBuf {
    let path = dir.join("config.yaml");
    let yaml = format!(
        "artifacts:\n  root: \"{}\"\nclient:\n  binary: \"{}\"\nprogress: false\n",
        dir.join("runs").display(),
        binary
    );
    fs::write(&path, yaml).unwrap();
    path
}

// =============================================================================
// Help & Version Tests
// =============================================================================

#[test]
fn test_help_lists_commands() {
    index_migrate_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("migrate"))
        .stdout(predicate::str::contains("validate"))
        .stdout(predicate::str::contains("plan"));
}

#[test]
fn test_version_displays_version() {
    index_migrate_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("index-migrate"));
}

#[test]
fn test_invalid_command_shows_error() {
    index_migrate_cmd()
        .arg("invalid_command_xyz")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

// =============================================================================
// Init Tests
// =============================================================================

#[test]
fn test_init_writes_example_config() {
    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("index-migrate.yaml");

    index_migrate_cmd()
        .args(["init", "--output"])
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("Generated configuration"));

    let content = fs::read_to_string(&output).unwrap();
    assert!(content.contains("source_algolia_profile"));
    assert!(content.contains("SOURCE_ALGOLIA_APP_ID"));
}

#[test]
fn test_init_refuses_to_overwrite_without_force() {
    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("existing.yaml");
    fs::write(&output, "keep me").unwrap();

    index_migrate_cmd()
        .args(["init", "--output"])
        .arg(&output)
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
    assert_eq!(fs::read_to_string(&output).unwrap(), "keep me");

    index_migrate_cmd()
        .args(["init", "--force", "--output"])
        .arg(&output)
        .assert()
        .success();
    assert_ne!(fs::read_to_string(&output).unwrap(), "keep me");
}

// =============================================================================
// Precondition Tests
// =============================================================================

#[test]
fn test_unavailable_client_fails_before_anything_else() {
    let temp_dir = TempDir::new().unwrap();
    let config = write_config(temp_dir.path(), "/nonexistent/algolia-xyz");

    index_migrate_cmd()
        .arg("--config")
        .arg(&config)
        .arg("plan")
        .assert()
        .failure()
        .stderr(predicate::str::contains("is not available"));
}

#[cfg(unix)]
#[test]
fn test_missing_credentials_fail_with_variable_names() {
    let temp_dir = TempDir::new().unwrap();
    // `true --help` succeeds, so the availability check passes.
    let config = write_config(temp_dir.path(), "true");

    index_migrate_cmd()
        .arg("--config")
        .arg(&config)
        .env("SOURCE_ALGOLIA_APP_ID", "SRC")
        .arg("validate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Required profile data missing"))
        .stderr(predicate::str::contains("SOURCE_ALGOLIA_API_KEY"))
        .stderr(predicate::str::contains("TARGET_ALGOLIA_APP_ID"));

    let runs = temp_dir.path().join("runs").join("validate");
    assert!(runs.is_dir());
}

#[test]
fn test_config_with_shared_profile_name_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let config = temp_dir.path().join("config.yaml");
    fs::write(
        &config,
        "source:\n  profile: same\ntarget:\n  profile: same\n",
    )
    .unwrap();

    index_migrate_cmd()
        .arg("--config")
        .arg(&config)
        .arg("plan")
        .assert()
        .failure()
        .stderr(predicate::str::contains("must differ"));
}
