// aws-extension-sqlite/src/error.rs
// ============================================================================
// Module: Session and Extension Errors
// Description: Error types for the session host and the AWS extension.
// Purpose: Keep engine, credential, and secret failures distinguishable.
// Dependencies: aws-extension-core, aws-extension-credentials, thiserror
// ============================================================================

//! Error types for sessions and extensions.

use aws_extension_config::ConfigError;
use aws_extension_core::SecretError;
use aws_extension_credentials::CredentialError;
use thiserror::Error;

use crate::secrets::SecretStoreError;

/// Session host errors.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Session I/O error.
    #[error("session io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("session db error: {0}")]
    Db(String),
    /// Invalid session input.
    #[error("session invalid: {0}")]
    Invalid(String),
    /// Extension failed to load.
    #[error("session extension error: {0}")]
    Extension(#[from] ExtensionError),
}

impl From<rusqlite::Error> for SessionError {
    fn from(error: rusqlite::Error) -> Self {
        Self::Db(error.to_string())
    }
}

/// AWS extension errors.
#[derive(Debug, Error)]
pub enum ExtensionError {
    /// A host extension the function depends on is not loaded.
    #[error("{extension} extension is required for {function}")]
    MissingExtension {
        /// Required extension name.
        extension: &'static str,
        /// Calling SQL function.
        function: &'static str,
    },
    /// Invalid SQL function argument.
    #[error("{function}: {message}")]
    InvalidArgument {
        /// SQL function name.
        function: &'static str,
        /// Failure detail.
        message: String,
    },
    /// Credential resolution failed.
    #[error(transparent)]
    Credentials(#[from] CredentialError),
    /// Secret construction failed.
    #[error(transparent)]
    Secret(#[from] SecretError),
    /// Secret storage failed.
    #[error(transparent)]
    SecretStore(#[from] SecretStoreError),
    /// Configuration could not be applied.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Function registration failed.
    #[error("extension registration error: {0}")]
    Registration(String),
    /// Event sink could not be opened.
    #[error("extension io error: {0}")]
    Io(String),
    /// Shared state was unusable.
    #[error("extension state unavailable: {0}")]
    Unavailable(String),
}

impl ExtensionError {
    /// Wraps the error for return from a SQL function callback.
    pub(crate) fn into_sql(self) -> rusqlite::Error {
        rusqlite::Error::UserFunctionError(Box::new(self))
    }
}
