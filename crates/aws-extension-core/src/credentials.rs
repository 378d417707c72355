// aws-extension-core/src/credentials.rs
// ============================================================================
// Module: AWS Credential Model
// Description: Credential values, credential chain parsing, and requests.
// Purpose: Describe what to resolve without depending on the AWS SDK.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! [`CredentialChain`] is parsed from the `;`-separated chain strings accepted
//! by `CHAIN` secret parameters (for example `"env;config"`). A
//! [`CredentialRequest`] pairs an optional chain with an optional profile and
//! is handed to a resolver, which answers with a [`ResolvedAwsConfig`].
//! Secret key material is never printed by `Debug`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::time::SystemTime;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Credentials
// ============================================================================

/// Static AWS credentials returned by a provider.
#[derive(Clone, PartialEq, Eq)]
pub struct AwsCredentials {
    /// Access key identifier.
    pub access_key_id: String,
    /// Secret access key.
    pub secret_access_key: String,
    /// Session token for temporary credentials.
    pub session_token: Option<String>,
    /// Expiry for temporary credentials.
    pub expires_at: Option<SystemTime>,
}

impl AwsCredentials {
    /// Builds long-lived credentials without a session token.
    #[must_use]
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: None,
            expires_at: None,
        }
    }

    /// Attaches a session token.
    #[must_use]
    pub fn with_session_token(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(token.into());
        self
    }

    /// Attaches an expiry.
    #[must_use]
    pub const fn with_expiry(mut self, expires_at: SystemTime) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Returns true when the credentials are unusable at `now`.
    #[must_use]
    pub fn is_expired_or_empty(&self, now: SystemTime) -> bool {
        if self.access_key_id.is_empty() {
            return true;
        }
        self.expires_at.is_some_and(|expiry| expiry <= now)
    }
}

impl fmt::Debug for AwsCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"** redacted **")
            .field("session_token", &self.session_token.as_ref().map(|_| "** redacted **"))
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Credentials and region discovered by a resolver.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedAwsConfig {
    /// Credentials, when any provider in the chain produced them.
    pub credentials: Option<AwsCredentials>,
    /// Region from the profile or environment.
    pub region: Option<String>,
}

impl ResolvedAwsConfig {
    /// Returns credentials only when they are usable at `now`.
    #[must_use]
    pub fn usable_credentials(&self, now: SystemTime) -> Option<&AwsCredentials> {
        self.credentials.as_ref().filter(|credentials| !credentials.is_expired_or_empty(now))
    }
}

// ============================================================================
// SECTION: Credential Chain
// ============================================================================

/// One provider entry in a credential chain string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainProvider {
    /// STS web identity token provider.
    Sts,
    /// SSO provider backed by a profile.
    Sso,
    /// Environment variable provider.
    Env,
    /// EC2 instance metadata provider.
    Instance,
    /// External credential process provider.
    Process,
    /// Shared config/credentials file provider.
    Config,
}

impl ChainProvider {
    /// Returns the chain string label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Sts => "sts",
            Self::Sso => "sso",
            Self::Env => "env",
            Self::Instance => "instance",
            Self::Process => "process",
            Self::Config => "config",
        }
    }

    /// Parses a single chain item.
    fn from_label(label: &str) -> Option<Self> {
        match label {
            "sts" => Some(Self::Sts),
            "sso" => Some(Self::Sso),
            "env" => Some(Self::Env),
            "instance" => Some(Self::Instance),
            "process" => Some(Self::Process),
            "config" => Some(Self::Config),
            _ => None,
        }
    }
}

impl fmt::Display for ChainProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Credential chain parse errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainParseError {
    /// Chain string was empty.
    #[error("credential chain must not be empty")]
    Empty,
    /// Chain contained an empty item (for example `"env;;config"`).
    #[error("credential chain contains an empty provider entry")]
    EmptyItem,
    /// Chain contained an unknown provider label.
    #[error("Unknown provider found while parsing AWS credential chain string: '{0}'")]
    UnknownProvider(String),
}

/// Ordered list of providers tried until one yields credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialChain {
    /// Providers in evaluation order.
    providers: Vec<ChainProvider>,
}

impl CredentialChain {
    /// Parses a `;`-separated chain string.
    ///
    /// # Errors
    ///
    /// Returns [`ChainParseError`] for empty chains, empty entries, or
    /// unknown provider labels.
    pub fn parse(text: &str) -> Result<Self, ChainParseError> {
        if text.is_empty() {
            return Err(ChainParseError::Empty);
        }
        let providers = text
            .split(';')
            .map(|item| {
                if item.is_empty() {
                    return Err(ChainParseError::EmptyItem);
                }
                ChainProvider::from_label(item)
                    .ok_or_else(|| ChainParseError::UnknownProvider(item.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            providers,
        })
    }

    /// Returns the providers in evaluation order.
    #[must_use]
    pub fn providers(&self) -> &[ChainProvider] {
        &self.providers
    }
}

impl fmt::Display for CredentialChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, provider) in self.providers.iter().enumerate() {
            if index > 0 {
                f.write_str(";")?;
            }
            f.write_str(provider.label())?;
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Requests
// ============================================================================

/// Inputs for a credential resolution.
///
/// With neither field set the resolver uses the SDK default chain. A profile
/// without a chain selects the profile-file provider for that profile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialRequest {
    /// Explicit provider chain.
    pub chain: Option<CredentialChain>,
    /// Named profile from the shared config files.
    pub profile: Option<String>,
}

impl CredentialRequest {
    /// Request for the default provider chain.
    #[must_use]
    pub fn default_chain() -> Self {
        Self::default()
    }

    /// Request scoped to a named profile.
    #[must_use]
    pub fn for_profile(profile: impl Into<String>) -> Self {
        Self {
            chain: None,
            profile: Some(profile.into()),
        }
    }
}
