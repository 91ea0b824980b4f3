//! CLI integration tests for the Homebase command-line interface.
//!
//! These tests verify:
//! - Help text is displayed correctly
//! - Argument parsing works as expected
//! - Invalid inputs are rejected with appropriate messages
//! - Service failures surface as status strings and error mappings
//!
//! Tests that need a working service use the `mock-service` binary from
//! homebase-mcp and skip when it has not been built.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get a command for the homebase binary, isolated from the user's config.
fn homebase(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("homebase").unwrap();
    cmd.current_dir(home.path())
        .env("HOMEBASE_CONFIG_DIR", home.path().join("config"))
        .env_remove("HOMEBASE_CONFIG")
        .env_remove("RUST_LOG");
    cmd
}

fn mock_service_path() -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.pop(); // crates
    path.pop(); // workspace root
    path.push("target");
    path.push(if cfg!(debug_assertions) {
        "debug"
    } else {
        "release"
    });
    path.push("mock-service");
    path
}

/// Write a config with only the finance service enabled, launched by `command`.
fn finance_only_config(dir: &Path, command: &Path) -> PathBuf {
    let path = dir.join("finance-only.toml");
    let toml = format!(
        r#"
[services.finance]
command = {:?}
args = ["--service", "finance"]

[services.catalog]
enabled = false

[services.location]
enabled = false
"#,
        command.to_string_lossy()
    );
    std::fs::write(&path, toml).unwrap();
    path
}

// ─────────────────────────────────────────────────────────────────────────────
// Help and Version Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_help_displays() {
    let home = TempDir::new().unwrap();
    homebase(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Homebase"))
        .stdout(predicate::str::contains("tool services"));
}

#[test]
fn test_version_displays() {
    let home = TempDir::new().unwrap();
    homebase(&home)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("homebase"));
}

#[test]
fn test_help_lists_subcommands() {
    let home = TempDir::new().unwrap();
    homebase(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("tools"))
        .stdout(predicate::str::contains("budget"))
        .stdout(predicate::str::contains("loan"))
        .stdout(predicate::str::contains("home"))
        .stdout(predicate::str::contains("prices"))
        .stdout(predicate::str::contains("transit"))
        .stdout(predicate::str::contains("programs"))
        .stdout(predicate::str::contains("properties"))
        .stdout(predicate::str::contains("call"))
        .stdout(predicate::str::contains("config"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Argument Parsing Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_global_flags_accepted() {
    let home = TempDir::new().unwrap();
    homebase(&home)
        .args(["--verbose", "--json", "--help"])
        .assert()
        .success();
}

#[test]
fn test_budget_requires_income() {
    let home = TempDir::new().unwrap();
    homebase(&home)
        .arg("budget")
        .assert()
        .failure()
        .stderr(predicate::str::contains("required"));
}

#[test]
fn test_loan_rejects_non_numeric_score() {
    let home = TempDir::new().unwrap();
    homebase(&home)
        .args(["loan", "100000", "excellent"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn test_prices_requires_units() {
    let home = TempDir::new().unwrap();
    homebase(&home)
        .args(["prices", "11215"])
        .assert()
        .failure();
}

#[test]
fn test_programs_requires_embedding() {
    let home = TempDir::new().unwrap();
    homebase(&home)
        .arg("programs")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--embedding"));
}

#[test]
fn test_call_rejects_bad_json() {
    let home = TempDir::new().unwrap();
    homebase(&home)
        .args(["call", "finance", "calculate_budget", "--args", "{not json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--args must be valid JSON"));
}

#[test]
fn test_missing_config_file_is_an_error() {
    let home = TempDir::new().unwrap();
    homebase(&home)
        .args(["--config", "does-not-exist.toml", "status"])
        .assert()
        .failure();
}

// ─────────────────────────────────────────────────────────────────────────────
// Config Command Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_config_path_honours_env() {
    let home = TempDir::new().unwrap();
    homebase(&home)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"))
        .stdout(predicate::str::contains(
            home.path().join("config").to_string_lossy().to_string(),
        ));
}

#[test]
fn test_config_init_local_then_which() {
    let home = TempDir::new().unwrap();
    homebase(&home)
        .args(["config", "init", "--local"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created config file"));
    assert!(home.path().join("homebase.toml").is_file());

    homebase(&home)
        .args(["config", "which"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 config file(s) loaded"));
}

#[test]
fn test_config_show_lists_builtin_services() {
    let home = TempDir::new().unwrap();
    homebase(&home)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[services.finance]"))
        .stdout(predicate::str::contains("[services.catalog]"))
        .stdout(predicate::str::contains("[services.location]"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Service Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_status_reports_failed_service() {
    let home = TempDir::new().unwrap();
    let config = finance_only_config(home.path(), Path::new("/nonexistent/homebase-finance"));
    homebase(&home)
        .args(["--json", "status", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"finance\": \"failed: "))
        .stdout(predicate::str::contains("catalog").not());
}

#[test]
fn test_budget_on_unreachable_service_maps_error() {
    let home = TempDir::new().unwrap();
    let config = finance_only_config(home.path(), Path::new("/nonexistent/homebase-finance"));
    homebase(&home)
        .args(["--json", "budget", "75000", "--config"])
        .arg(&config)
        .assert()
        .failure()
        .stdout(predicate::str::contains("\"error\""))
        .stderr(predicate::str::contains("not connected"));
}

#[test]
fn test_budget_end_to_end() {
    if !mock_service_path().exists() {
        eprintln!("Skipping test: mock-service not built");
        return;
    }

    let home = TempDir::new().unwrap();
    let config = finance_only_config(home.path(), &mock_service_path());
    homebase(&home)
        .args(["--json", "budget", "75000", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"monthly_budget\": 1875.0"))
        .stdout(predicate::str::contains("\"yearly_budget\": 22500.0"));
}

#[test]
fn test_call_end_to_end() {
    if !mock_service_path().exists() {
        eprintln!("Skipping test: mock-service not built");
        return;
    }

    let home = TempDir::new().unwrap();
    let config = finance_only_config(home.path(), &mock_service_path());
    homebase(&home)
        .args([
            "call",
            "finance",
            "calculate_budget",
            "--args",
            r#"{"income": 75000}"#,
            "--config",
        ])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("22500.0"));
}

#[test]
fn test_tools_end_to_end() {
    if !mock_service_path().exists() {
        eprintln!("Skipping test: mock-service not built");
        return;
    }

    let home = TempDir::new().unwrap();
    let config = finance_only_config(home.path(), &mock_service_path());
    homebase(&home)
        .args(["--json", "tools", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("calculate_budget"))
        .stdout(predicate::str::contains("loan_qualification"));
}
