//! Config defaults, validation, and loading tests for aws-extension-config.
// aws-extension-config/tests/config_validation.rs
// =============================================================================
// Module: Config Validation Tests
// Description: Validate defaults, section invariants, and file loading.
// Purpose: Ensure minimal config is valid and invalid settings fail closed.
// =============================================================================

use std::fs;
use std::path::PathBuf;

use aws_extension_config::AwsExtensionConfig;
use aws_extension_config::ConfigError;
use aws_extension_config::CredentialResolverKind;
use aws_extension_config::LogSinkKind;
use aws_extension_config::config_toml_example;
use tempfile::tempdir;

mod common;

type TestResult = Result<(), String>;

#[test]
fn default_config_validates() -> TestResult {
    let config = common::minimal_config().map_err(|err| err.to_string())?;
    config.validate().map_err(|err| err.to_string())?;
    if config.session.path.is_some() {
        return Err("session.path should default to in-memory".to_string());
    }
    if config.credentials.resolver != CredentialResolverKind::AwsSdk {
        return Err("credentials.resolver should default to aws_sdk".to_string());
    }
    if config.logging.sink != LogSinkKind::Stderr {
        return Err("logging.sink should default to stderr".to_string());
    }
    if !config.extensions.require_httpfs {
        return Err("extensions.require_httpfs should default to true".to_string());
    }
    Ok(())
}

#[test]
fn example_config_parses_and_validates() -> TestResult {
    let config =
        AwsExtensionConfig::from_toml_str(&config_toml_example()).map_err(|err| err.to_string())?;
    let chain = config
        .credentials
        .parsed_default_chain()
        .map_err(|err| err.to_string())?
        .ok_or_else(|| "example should set default_chain".to_string())?;
    if chain.to_string() != "env;config" {
        return Err(format!("unexpected chain {chain}"));
    }
    if !config_toml_example().contains("Set to false for sessions that never load one.") {
        return Err("example should explain how to lift the httpfs requirement".to_string());
    }
    Ok(())
}

#[test]
fn unknown_chain_provider_is_rejected() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.credentials.default_chain = Some("env;vault".to_string());
    common::assert_invalid(
        config.validate(),
        "Unknown provider found while parsing AWS credential chain string: 'vault'",
    )
}

#[test]
fn credential_timeout_bounds_are_enforced() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.credentials.timeout_ms = 10;
    common::assert_invalid(config.validate(), "credentials.timeout_ms")?;
    config.credentials.timeout_ms = 120_000;
    common::assert_invalid(config.validate(), "credentials.timeout_ms")
}

#[test]
fn blank_default_profile_is_rejected() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.credentials.default_profile = Some("   ".to_string());
    common::assert_invalid(config.validate(), "credentials.default_profile must not be empty")
}

#[test]
fn file_sink_requires_path() -> TestResult {
    let config = common::config_from_toml("[logging]\nsink = \"file\"\n")
        .map_err(|err| err.to_string())?;
    common::assert_invalid(config.validate(), "logging.sink=file requires logging.path")
}

#[test]
fn path_without_file_sink_is_rejected() -> TestResult {
    let config = common::config_from_toml("[logging]\npath = \"events.jsonl\"\n")
        .map_err(|err| err.to_string())?;
    common::assert_invalid(config.validate(), "logging.path is only valid")
}

#[test]
fn unknown_fields_are_rejected() -> TestResult {
    match AwsExtensionConfig::from_toml_str("[session]\nmode = \"wal\"\n") {
        Err(ConfigError::Parse(_)) => Ok(()),
        other => Err(format!("expected parse error, got {other:?}")),
    }
}

#[test]
fn overlong_path_component_is_rejected() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.session.path = Some(PathBuf::from("a".repeat(300)));
    common::assert_invalid(config.validate(), "path component too long")
}

#[test]
fn load_reads_file_from_explicit_path() -> TestResult {
    let dir = tempdir().map_err(|err| err.to_string())?;
    let path = dir.path().join("aws-extension.toml");
    fs::write(&path, "[extensions]\nrequire_httpfs = false\n").map_err(|err| err.to_string())?;
    let config = AwsExtensionConfig::load(Some(&path)).map_err(|err| err.to_string())?;
    if config.extensions.require_httpfs {
        return Err("require_httpfs should be false".to_string());
    }
    Ok(())
}

#[test]
fn load_rejects_oversized_file() -> TestResult {
    let dir = tempdir().map_err(|err| err.to_string())?;
    let path = dir.path().join("big.toml");
    let padding = format!("# {}\n", "x".repeat(1024 * 1024));
    fs::write(&path, padding).map_err(|err| err.to_string())?;
    common::assert_invalid(
        AwsExtensionConfig::load(Some(&path)).map(|_| ()),
        "config file exceeds size limit",
    )
}

#[test]
fn load_reports_missing_file_as_io_error() -> TestResult {
    let dir = tempdir().map_err(|err| err.to_string())?;
    match AwsExtensionConfig::load(Some(&dir.path().join("missing.toml"))) {
        Err(ConfigError::Io(_)) => Ok(()),
        other => Err(format!("expected io error, got {other:?}")),
    }
}
