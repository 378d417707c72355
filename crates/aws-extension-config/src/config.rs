// aws-extension-config/src/config.rs
// ============================================================================
// Module: AWS Extension Configuration
// Description: Configuration loading and validation for aws-extension.toml.
// Purpose: Provide strict, fail-closed config parsing with safe defaults.
// Dependencies: aws-extension-core, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is read from a TOML file whose path comes from the caller,
//! the `AWS_EXTENSION_CONFIG` environment variable, or the default filename,
//! in that order. Every section has defaults, so an empty file is valid and
//! describes an in-memory session with SDK credential resolution and stderr
//! events.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use aws_extension_core::CredentialChain;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
pub const DEFAULT_CONFIG_NAME: &str = "aws-extension.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "AWS_EXTENSION_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Default `SQLite` busy timeout (ms).
pub(crate) const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum `SQLite` busy timeout (ms).
pub(crate) const MAX_BUSY_TIMEOUT_MS: u64 = 600_000;
/// Default credential lookup timeout (ms).
pub(crate) const DEFAULT_CREDENTIAL_TIMEOUT_MS: u64 = 5_000;
/// Minimum credential lookup timeout (ms).
pub(crate) const MIN_CREDENTIAL_TIMEOUT_MS: u64 = 100;
/// Maximum credential lookup timeout (ms).
pub(crate) const MAX_CREDENTIAL_TIMEOUT_MS: u64 = 60_000;
/// Maximum length of an AWS profile name.
pub(crate) const MAX_PROFILE_NAME_LENGTH: usize = 128;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// AWS extension configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AwsExtensionConfig {
    /// Database session configuration.
    #[serde(default)]
    pub session: SessionConfig,
    /// Credential resolution configuration.
    #[serde(default)]
    pub credentials: CredentialsConfig,
    /// Structured event logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Host extension requirements.
    #[serde(default)]
    pub extensions: ExtensionsConfig,
}

impl AwsExtensionConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml_str(content)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.session.validate()?;
        self.credentials.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Database session configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    /// Database file path; in-memory when absent.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            path: None,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }
}

impl SessionConfig {
    /// Returns the busy timeout as a [`Duration`].
    #[must_use]
    pub const fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    /// Validates session settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.busy_timeout_ms > MAX_BUSY_TIMEOUT_MS {
            return Err(ConfigError::Invalid(format!(
                "session.busy_timeout_ms must be at most {MAX_BUSY_TIMEOUT_MS}"
            )));
        }
        if let Some(path) = &self.path {
            validate_path(path)?;
            if path.as_os_str().is_empty() {
                return Err(ConfigError::Invalid("session.path must not be empty".to_string()));
            }
        }
        Ok(())
    }
}

/// Credential resolver selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialResolverKind {
    /// Resolve through the AWS SDK provider chains.
    #[default]
    AwsSdk,
    /// Never resolve credentials (offline sessions).
    None,
}

/// Credential resolution configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CredentialsConfig {
    /// Resolver used for credential lookups.
    #[serde(default)]
    pub resolver: CredentialResolverKind,
    /// Chain used by `load_aws_credentials` when no profile is given.
    #[serde(default)]
    pub default_chain: Option<String>,
    /// Profile used when a call names none.
    #[serde(default)]
    pub default_profile: Option<String>,
    /// Upper bound for one credential and region resolution, in milliseconds.
    #[serde(default = "default_credential_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            resolver: CredentialResolverKind::AwsSdk,
            default_chain: None,
            default_profile: None,
            timeout_ms: DEFAULT_CREDENTIAL_TIMEOUT_MS,
        }
    }
}

impl CredentialsConfig {
    /// Returns the lookup timeout as a [`Duration`].
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Returns the parsed default chain, if configured.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the chain string is invalid.
    pub fn parsed_default_chain(&self) -> Result<Option<CredentialChain>, ConfigError> {
        self.default_chain
            .as_deref()
            .map(CredentialChain::parse)
            .transpose()
            .map_err(|err| ConfigError::Invalid(format!("credentials.default_chain: {err}")))
    }

    /// Validates credential settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_CREDENTIAL_TIMEOUT_MS..=MAX_CREDENTIAL_TIMEOUT_MS).contains(&self.timeout_ms) {
            return Err(ConfigError::Invalid(format!(
                "credentials.timeout_ms must be between {MIN_CREDENTIAL_TIMEOUT_MS} and \
                 {MAX_CREDENTIAL_TIMEOUT_MS}"
            )));
        }
        self.parsed_default_chain()?;
        if let Some(profile) = &self.default_profile {
            if profile.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "credentials.default_profile must not be empty".to_string(),
                ));
            }
            if profile.len() > MAX_PROFILE_NAME_LENGTH {
                return Err(ConfigError::Invalid(
                    "credentials.default_profile exceeds max length".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Event sink selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogSinkKind {
    /// JSON lines on stderr.
    #[default]
    Stderr,
    /// JSON lines appended to a file.
    File,
    /// Discard events.
    None,
}

/// Structured event logging configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Event sink.
    #[serde(default)]
    pub sink: LogSinkKind,
    /// Log file path (required for `file`).
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl LoggingConfig {
    /// Validates logging settings.
    fn validate(&self) -> Result<(), ConfigError> {
        match (self.sink, &self.path) {
            (LogSinkKind::File, None) => {
                Err(ConfigError::Invalid("logging.sink=file requires logging.path".to_string()))
            }
            (LogSinkKind::File, Some(path)) => validate_path(path),
            (LogSinkKind::Stderr | LogSinkKind::None, Some(_)) => Err(ConfigError::Invalid(
                "logging.path is only valid with logging.sink=file".to_string(),
            )),
            (LogSinkKind::Stderr | LogSinkKind::None, None) => Ok(()),
        }
    }
}

/// Host extension requirements.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExtensionsConfig {
    /// Require the `httpfs` extension before loading credentials.
    #[serde(default = "default_require_httpfs")]
    pub require_httpfs: bool,
}

impl Default for ExtensionsConfig {
    fn default() -> Self {
        Self {
            require_httpfs: true,
        }
    }
}

/// Returns the default busy timeout.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

/// Returns the default credential lookup timeout.
const fn default_credential_timeout_ms() -> u64 {
    DEFAULT_CREDENTIAL_TIMEOUT_MS
}

/// Returns the default httpfs requirement.
const fn default_require_httpfs() -> bool {
    true
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from caller or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates a path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("path component too long".to_string()));
        }
    }
    Ok(())
}
