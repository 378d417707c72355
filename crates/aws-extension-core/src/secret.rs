// aws-extension-core/src/secret.rs
// ============================================================================
// Module: Credential Chain Secrets
// Description: Key/value secrets for S3-compatible storage.
// Purpose: Build scoped, redacted secrets from resolved AWS configuration.
// Dependencies: crate::credentials, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! A [`KeyValueSecret`] carries connection parameters for an S3-compatible
//! object store (`s3`, `r2`, `gcs`), the path prefixes it applies to, and the
//! set of keys that must be redacted when rendered.
//! [`build_credential_chain_secret`] combines a [`CreateSecretInput`] with the
//! output of a credential resolver: resolved values come first, explicit
//! named parameters override them, and endpoint/url-style defaults fill in
//! whatever is still missing.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fmt;
use std::time::SystemTime;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::credentials::ChainParseError;
use crate::credentials::CredentialChain;
use crate::credentials::CredentialRequest;
use crate::credentials::ResolvedAwsConfig;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Provider name for secrets populated from a credential chain.
pub const CREDENTIAL_CHAIN_PROVIDER: &str = "credential_chain";
/// Keys redacted when a secret is rendered.
const REDACTED_KEYS: [&str; 2] = ["secret", "session_token"];
/// Placeholder rendered in place of redacted values.
const REDACTED_PLACEHOLDER: &str = "redacted";
/// User overrides copied onto the secret after resolution.
const OVERRIDE_KEYS: [&str; 8] = [
    "key_id",
    "secret",
    "region",
    "endpoint",
    "session_token",
    "url_style",
    "use_ssl",
    "url_compatibility_mode",
];
/// Named parameters holding text for every secret type.
const TEXT_PARAMETERS: [&str; 8] =
    ["key_id", "secret", "region", "session_token", "endpoint", "url_style", "chain", "profile"];
/// Named parameters holding booleans for every secret type.
const BOOL_PARAMETERS: [&str; 2] = ["use_ssl", "url_compatibility_mode"];
/// Default S3 endpoint.
const S3_DEFAULT_ENDPOINT: &str = "s3.amazonaws.com";
/// Default GCS endpoint.
const GCS_DEFAULT_ENDPOINT: &str = "storage.googleapis.com";
/// R2 endpoint suffix appended to the account id.
const R2_ENDPOINT_SUFFIX: &str = ".r2.cloudflarestorage.com";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Secret construction errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SecretError {
    /// Secret type is not one of `s3`, `r2`, `gcs`.
    #[error("secret invalid type: '{0}'")]
    InvalidType(String),
    /// Provider is not supported by this extension.
    #[error("secret unsupported provider: '{0}'")]
    UnsupportedProvider(String),
    /// Named parameter is not accepted for this secret type.
    #[error("secret unknown parameter '{name}' for type {secret_type}")]
    UnknownParameter {
        /// Parameter name.
        name: String,
        /// Secret type label.
        secret_type: &'static str,
    },
    /// Named parameter has the wrong value type.
    #[error("secret parameter '{name}' must be {expected}")]
    InvalidParameter {
        /// Parameter name.
        name: String,
        /// Expected value kind.
        expected: &'static str,
    },
    /// Options payload was malformed.
    #[error("secret invalid options: {0}")]
    InvalidOptions(String),
    /// Credential chain parameter failed to parse.
    #[error(transparent)]
    Chain(#[from] ChainParseError),
}

// ============================================================================
// SECTION: Secret Types
// ============================================================================

/// Object-store flavors supported by credential chain secrets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SecretType {
    /// Amazon S3.
    S3,
    /// Cloudflare R2.
    R2,
    /// Google Cloud Storage (S3 interoperability API).
    Gcs,
}

impl SecretType {
    /// All supported types.
    pub const ALL: [Self; 3] = [Self::S3, Self::R2, Self::Gcs];

    /// Returns the type label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::S3 => "s3",
            Self::R2 => "r2",
            Self::Gcs => "gcs",
        }
    }

    /// Parses a type label case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns [`SecretError::InvalidType`] for unknown labels.
    pub fn parse(label: &str) -> Result<Self, SecretError> {
        Self::ALL
            .into_iter()
            .find(|candidate| candidate.label().eq_ignore_ascii_case(label))
            .ok_or_else(|| SecretError::InvalidType(label.to_string()))
    }

    /// Path prefixes covered when no explicit scope is given.
    #[must_use]
    pub const fn default_scope(self) -> &'static [&'static str] {
        match self {
            Self::S3 => &["s3://", "s3n://", "s3a://"],
            Self::R2 => &["r2://"],
            Self::Gcs => &["gcs://", "gs://"],
        }
    }

    /// Returns the expected kind of a named parameter, if accepted.
    fn parameter_kind(self, name: &str) -> Option<ParameterKind> {
        if TEXT_PARAMETERS.contains(&name) || (self == Self::R2 && name == "account_id") {
            return Some(ParameterKind::Text);
        }
        if BOOL_PARAMETERS.contains(&name) {
            return Some(ParameterKind::Bool);
        }
        None
    }
}

impl fmt::Display for SecretType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Value kinds for named parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParameterKind {
    /// Text value.
    Text,
    /// Boolean value.
    Bool,
}

/// A single secret parameter value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SecretValue {
    /// Text value.
    Text(String),
    /// Boolean value.
    Bool(bool),
}

impl SecretValue {
    /// Returns the text payload, if any.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            Self::Bool(_) => None,
        }
    }

    /// Returns true for empty text values.
    fn is_empty_text(&self) -> bool {
        matches!(self, Self::Text(value) if value.is_empty())
    }
}

impl fmt::Display for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(value) => f.write_str(value),
            Self::Bool(value) => write!(f, "{value}"),
        }
    }
}

impl From<&str> for SecretValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for SecretValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for SecretValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Behavior when a secret with the same name already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OnConflict {
    /// Reject the new secret.
    #[default]
    Error,
    /// Replace the existing secret.
    Replace,
    /// Keep the existing secret and discard the new one.
    Ignore,
}

// ============================================================================
// SECTION: Create Input
// ============================================================================

/// Parameters of a secret creation request.
#[derive(Clone, PartialEq, Eq)]
pub struct CreateSecretInput {
    /// Secret name; `None` selects `__default_<type>`.
    pub name: Option<String>,
    /// Object-store flavor.
    pub secret_type: SecretType,
    /// Provider name.
    pub provider: String,
    /// Explicit scope; empty selects the type defaults.
    pub scope: Vec<String>,
    /// Named parameters.
    pub options: BTreeMap<String, SecretValue>,
    /// Conflict policy for existing names.
    pub on_conflict: OnConflict,
}

impl fmt::Debug for CreateSecretInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let options = mask_values(&self.options, |key| REDACTED_KEYS.contains(&key));
        f.debug_struct("CreateSecretInput")
            .field("name", &self.name)
            .field("secret_type", &self.secret_type)
            .field("provider", &self.provider)
            .field("scope", &self.scope)
            .field("options", &options)
            .field("on_conflict", &self.on_conflict)
            .finish()
    }
}

impl CreateSecretInput {
    /// Builds an unnamed `credential_chain` request for `secret_type`.
    #[must_use]
    pub fn credential_chain(secret_type: SecretType) -> Self {
        Self {
            name: None,
            secret_type,
            provider: CREDENTIAL_CHAIN_PROVIDER.to_string(),
            scope: Vec::new(),
            options: BTreeMap::new(),
            on_conflict: OnConflict::Error,
        }
    }

    /// Sets the secret name.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Adds a named parameter.
    #[must_use]
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<SecretValue>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Returns the effective, lowercased secret name.
    #[must_use]
    pub fn resolved_name(&self) -> String {
        self.name.as_ref().map_or_else(
            || format!("__default_{}", self.secret_type.label()),
            |name| name.to_lowercase(),
        )
    }

    /// Returns a text parameter, if present.
    #[must_use]
    pub fn text_option(&self, key: &str) -> Option<&str> {
        self.options.get(key).and_then(SecretValue::as_text)
    }

    /// Validates every named parameter against the type's parameter table.
    ///
    /// # Errors
    ///
    /// Returns [`SecretError`] for unknown or mistyped parameters.
    pub fn validate(&self) -> Result<(), SecretError> {
        if self.provider != CREDENTIAL_CHAIN_PROVIDER {
            return Err(SecretError::UnsupportedProvider(self.provider.clone()));
        }
        for (name, value) in &self.options {
            check_parameter(self.secret_type, name, value)?;
        }
        Ok(())
    }

    /// Derives the credential request from `chain` and `profile` parameters.
    ///
    /// # Errors
    ///
    /// Returns [`SecretError::Chain`] when the chain string is invalid.
    pub fn credential_request(&self) -> Result<CredentialRequest, SecretError> {
        let chain = self.text_option("chain").map(CredentialChain::parse).transpose()?;
        let profile =
            self.text_option("profile").filter(|profile| !profile.is_empty()).map(str::to_string);
        Ok(CredentialRequest {
            chain,
            profile,
        })
    }
}

/// Checks a single named parameter.
fn check_parameter(
    secret_type: SecretType,
    name: &str,
    value: &SecretValue,
) -> Result<(), SecretError> {
    let kind = secret_type.parameter_kind(name).ok_or_else(|| SecretError::UnknownParameter {
        name: name.to_string(),
        secret_type: secret_type.label(),
    })?;
    match (kind, value) {
        (ParameterKind::Text, SecretValue::Text(_)) | (ParameterKind::Bool, SecretValue::Bool(_)) => {
            Ok(())
        }
        (ParameterKind::Text, SecretValue::Bool(_)) => Err(SecretError::InvalidParameter {
            name: name.to_string(),
            expected: "text",
        }),
        (ParameterKind::Bool, SecretValue::Text(_)) => Err(SecretError::InvalidParameter {
            name: name.to_string(),
            expected: "a boolean",
        }),
    }
}

/// Parses named parameters from a JSON object.
///
/// Keys are matched case-insensitively. Booleans also accept the strings
/// `"true"` and `"false"`.
///
/// # Errors
///
/// Returns [`SecretError`] when the payload is not an object or contains
/// unknown or mistyped parameters.
pub fn parse_secret_options(
    secret_type: SecretType,
    payload: &Value,
) -> Result<BTreeMap<String, SecretValue>, SecretError> {
    let Value::Object(entries) = payload else {
        return Err(SecretError::InvalidOptions("options must be a JSON object".to_string()));
    };
    let mut options = BTreeMap::new();
    for (raw_name, raw_value) in entries {
        let name = raw_name.to_lowercase();
        let kind = secret_type.parameter_kind(&name).ok_or_else(|| {
            SecretError::UnknownParameter {
                name: name.clone(),
                secret_type: secret_type.label(),
            }
        })?;
        let value = match (kind, raw_value) {
            (ParameterKind::Text, Value::String(text)) => SecretValue::Text(text.clone()),
            (ParameterKind::Bool, Value::Bool(flag)) => SecretValue::Bool(*flag),
            (ParameterKind::Bool, Value::String(text)) if text.eq_ignore_ascii_case("true") => {
                SecretValue::Bool(true)
            }
            (ParameterKind::Bool, Value::String(text)) if text.eq_ignore_ascii_case("false") => {
                SecretValue::Bool(false)
            }
            (ParameterKind::Text, _) => {
                return Err(SecretError::InvalidParameter {
                    name,
                    expected: "text",
                });
            }
            (ParameterKind::Bool, _) => {
                return Err(SecretError::InvalidParameter {
                    name,
                    expected: "a boolean",
                });
            }
        };
        if options.insert(name.clone(), value).is_some() {
            return Err(SecretError::InvalidOptions(format!("duplicate parameter '{name}'")));
        }
    }
    Ok(options)
}

// ============================================================================
// SECTION: Key/Value Secret
// ============================================================================

/// Scoped key/value secret for an object store.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyValueSecret {
    /// Lowercased secret name.
    pub name: String,
    /// Object-store flavor.
    pub secret_type: SecretType,
    /// Provider that produced the secret.
    pub provider: String,
    /// Path prefixes the secret applies to.
    pub scope: Vec<String>,
    /// Secret parameters.
    pub secret_map: BTreeMap<String, SecretValue>,
    /// Keys rendered as `redacted`.
    pub redact_keys: BTreeSet<String>,
}

impl fmt::Debug for KeyValueSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyValueSecret")
            .field("name", &self.name)
            .field("secret_type", &self.secret_type)
            .field("provider", &self.provider)
            .field("scope", &self.scope)
            .field("secret_map", &self.redacted_map())
            .field("redact_keys", &self.redact_keys)
            .finish()
    }
}

impl KeyValueSecret {
    /// Creates an empty secret with default redaction keys.
    #[must_use]
    pub fn new(name: String, secret_type: SecretType, provider: String, scope: Vec<String>) -> Self {
        Self {
            name,
            secret_type,
            provider,
            scope,
            secret_map: BTreeMap::new(),
            redact_keys: REDACTED_KEYS.iter().map(|key| (*key).to_string()).collect(),
        }
    }

    /// Returns a parameter value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&SecretValue> {
        self.secret_map.get(key)
    }

    /// Returns a text parameter value.
    #[must_use]
    pub fn get_text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(SecretValue::as_text)
    }

    /// Returns true when `key` is never rendered in clear text.
    #[must_use]
    pub fn is_redacted(&self, key: &str) -> bool {
        self.redact_keys.contains(key)
    }

    /// Returns the length of the longest scope prefix matching `path`.
    #[must_use]
    pub fn match_score(&self, path: &str) -> Option<usize> {
        self.scope.iter().filter(|prefix| path.starts_with(prefix.as_str())).map(String::len).max()
    }

    /// Returns parameter values with redacted keys masked.
    #[must_use]
    pub fn redacted_map(&self) -> BTreeMap<String, String> {
        mask_values(&self.secret_map, |key| self.is_redacted(key))
    }

    /// Renders the secret as `key=value` pairs with redaction applied.
    #[must_use]
    pub fn to_redacted_string(&self) -> String {
        let mut out = format!(
            "name={};type={};provider={};serializable=true;scope={}",
            self.name,
            self.secret_type,
            self.provider,
            self.scope.join(",")
        );
        for (key, value) in self.redacted_map() {
            out.push(';');
            out.push_str(&key);
            out.push('=');
            out.push_str(&value);
        }
        out
    }
}

/// Renders parameter values as text, masking keys selected by `redacted`.
fn mask_values(
    values: &BTreeMap<String, SecretValue>,
    redacted: impl Fn(&str) -> bool,
) -> BTreeMap<String, String> {
    values
        .iter()
        .map(|(key, value)| {
            let rendered =
                if redacted(key) { REDACTED_PLACEHOLDER.to_string() } else { value.to_string() };
            (key.clone(), rendered)
        })
        .collect()
}

// ============================================================================
// SECTION: Construction
// ============================================================================

/// Builds a `credential_chain` secret from request parameters and resolved
/// AWS configuration.
///
/// # Errors
///
/// Returns [`SecretError`] when the input fails validation.
pub fn build_credential_chain_secret(
    input: &CreateSecretInput,
    resolved: &ResolvedAwsConfig,
    now: SystemTime,
) -> Result<KeyValueSecret, SecretError> {
    input.validate()?;
    let secret_type = input.secret_type;
    let scope = if input.scope.is_empty() {
        secret_type.default_scope().iter().map(|prefix| (*prefix).to_string()).collect()
    } else {
        input.scope.clone()
    };
    let mut secret =
        KeyValueSecret::new(input.resolved_name(), secret_type, input.provider.clone(), scope);

    if let Some(region) = resolved.region.as_ref().filter(|region| !region.is_empty()) {
        secret.secret_map.insert("region".to_string(), SecretValue::Text(region.clone()));
    }
    if let Some(credentials) = resolved.usable_credentials(now) {
        secret
            .secret_map
            .insert("key_id".to_string(), SecretValue::Text(credentials.access_key_id.clone()));
        secret
            .secret_map
            .insert("secret".to_string(), SecretValue::Text(credentials.secret_access_key.clone()));
        secret.secret_map.insert(
            "session_token".to_string(),
            SecretValue::Text(credentials.session_token.clone().unwrap_or_default()),
        );
    }

    for key in OVERRIDE_KEYS {
        if let Some(value) = input.options.get(key) {
            secret.secret_map.insert(key.to_string(), value.clone());
        }
    }

    if secret.get("endpoint").is_none_or(SecretValue::is_empty_text) {
        let endpoint = match secret_type {
            SecretType::S3 => Some(S3_DEFAULT_ENDPOINT.to_string()),
            SecretType::R2 => input
                .text_option("account_id")
                .map(|account_id| format!("{account_id}{R2_ENDPOINT_SUFFIX}")),
            SecretType::Gcs => Some(GCS_DEFAULT_ENDPOINT.to_string()),
        };
        if let Some(endpoint) = endpoint {
            secret.secret_map.insert("endpoint".to_string(), SecretValue::Text(endpoint));
        }
    }

    if secret.get("url_style").is_none_or(SecretValue::is_empty_text)
        && matches!(secret_type, SecretType::Gcs | SecretType::R2)
    {
        secret.secret_map.insert("url_style".to_string(), SecretValue::Text("path".to_string()));
    }

    Ok(secret)
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use serde_json::json;

    use super::CreateSecretInput;
    use super::SecretError;
    use super::SecretType;
    use super::SecretValue;
    use super::build_credential_chain_secret;
    use super::parse_secret_options;
    use crate::credentials::ChainProvider;
    use crate::credentials::ResolvedAwsConfig;

    #[test]
    fn secret_type_parse_is_case_insensitive() {
        assert_eq!(SecretType::parse("S3"), Ok(SecretType::S3));
        assert_eq!(SecretType::parse("gcs"), Ok(SecretType::Gcs));
        assert_eq!(SecretType::parse("azure"), Err(SecretError::InvalidType("azure".to_string())));
    }

    #[test]
    fn account_id_is_r2_only() {
        let options = json!({"account_id": "abc"});
        assert!(parse_secret_options(SecretType::R2, &options).is_ok());
        assert!(matches!(
            parse_secret_options(SecretType::S3, &options),
            Err(SecretError::UnknownParameter { .. })
        ));
    }

    #[test]
    fn boolean_parameters_accept_string_literals() {
        let options = parse_secret_options(SecretType::S3, &json!({"USE_SSL": "false"}));
        assert_eq!(options.map(|map| map.get("use_ssl").cloned()), Ok(Some(SecretValue::Bool(false))));
    }

    #[test]
    fn mistyped_parameters_are_rejected() {
        let result = parse_secret_options(SecretType::S3, &json!({"region": true}));
        assert!(matches!(result, Err(SecretError::InvalidParameter { .. })));
    }

    #[test]
    fn credential_request_reads_chain_and_profile() {
        let input = CreateSecretInput::credential_chain(SecretType::S3)
            .with_option("chain", "env;sso")
            .with_option("profile", "dev");
        let request = input.credential_request();
        let chain = request.as_ref().ok().and_then(|request| request.chain.clone());
        assert_eq!(
            chain.map(|chain| chain.providers().to_vec()),
            Some(vec![ChainProvider::Env, ChainProvider::Sso])
        );
        assert_eq!(request.ok().and_then(|request| request.profile), Some("dev".to_string()));
    }

    #[test]
    fn gcs_defaults_endpoint_and_url_style() {
        let input = CreateSecretInput::credential_chain(SecretType::Gcs);
        let secret =
            build_credential_chain_secret(&input, &ResolvedAwsConfig::default(), SystemTime::now());
        let secret = secret.ok();
        assert_eq!(
            secret.as_ref().and_then(|secret| secret.get_text("endpoint")),
            Some("storage.googleapis.com")
        );
        assert_eq!(secret.as_ref().and_then(|secret| secret.get_text("url_style")), Some("path"));
        assert_eq!(
            secret.map(|secret| secret.scope),
            Some(vec!["gcs://".to_string(), "gs://".to_string()])
        );
    }
}
