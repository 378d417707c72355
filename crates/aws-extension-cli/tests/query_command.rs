// aws-extension-cli/tests/query_command.rs
// ============================================================================
// Module: CLI Query Command Tests
// Description: Integration tests that run the aws-extension binary.
// Purpose: Ensure query output and error reporting work end to end.
// Dependencies: aws-extension-cli binary
// ============================================================================

//! ## Overview
//! Runs the compiled binary with a config file that disables credential
//! lookup and routes events nowhere, so results do not depend on the host.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;
use std::process::Output;

use tempfile::TempDir;
use tempfile::tempdir;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn aws_extension_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_aws-extension"))
}

fn offline_config() -> (TempDir, PathBuf) {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("aws-extension.toml");
    let config = r#"
[credentials]
resolver = "none"

[logging]
sink = "none"

[extensions]
require_httpfs = false
"#;
    fs::write(&path, config.trim()).expect("write config");
    (dir, path)
}

fn gated_config() -> (TempDir, PathBuf) {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("aws-extension.toml");
    let config = r#"
[credentials]
resolver = "none"

[logging]
sink = "none"
"#;
    fs::write(&path, config.trim()).expect("write config");
    (dir, path)
}

fn run(args: &[&str], config: &Path) -> Output {
    Command::new(aws_extension_bin())
        .args(args)
        .arg("--config")
        .arg(config)
        .output()
        .expect("run aws-extension")
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn query_prints_rows_as_json() {
    let (_dir, config) = offline_config();
    let output = run(&["query", "SELECT aws('Sam') as value;"], &config);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8(output.stdout).expect("utf-8 stdout");
    assert_eq!(stdout.trim(), r#"["Aws Sam 🐥"]"#);
}

#[test]
fn query_without_credentials_returns_null() {
    let (_dir, config) = offline_config();
    let output = run(&["query", "SELECT load_aws_credentials(), 1", "--show-settings"], &config);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8(output.stdout).expect("utf-8 stdout");
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines, vec!["[null,1]", "{}"]);
}

#[test]
fn httpfs_gate_applies_unless_skipped() {
    let (_dir, config) = gated_config();
    let output = run(&["query", "SELECT load_aws_credentials()"], &config);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("httpfs extension is required"), "unexpected stderr: {stderr}");

    let output =
        run(&["query", "SELECT load_aws_credentials()", "--skip-httpfs-check"], &config);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8(output.stdout).expect("utf-8 stdout");
    assert_eq!(stdout.trim(), "[null]");
}

#[test]
fn sql_errors_fail_with_message() {
    let (_dir, config) = offline_config();
    let output = run(&["query", "SELECT aws()"], &config);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("aws"), "unexpected stderr: {stderr}");
}

#[test]
fn version_reports_extension_name() {
    let output = Command::new(aws_extension_bin()).arg("version").output().expect("run version");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("aws "), "unexpected stdout: {stdout}");
    assert!(stdout.contains("sqlite"));
}
