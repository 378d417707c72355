// aws-extension-credentials/src/resolver.rs
// ============================================================================
// Module: Credential Resolver Interface
// Description: Trait and static implementation for credential resolution.
// Purpose: Decouple SQL callbacks from the credential source.
// Dependencies: aws-extension-core, thiserror
// ============================================================================

//! ## Overview
//! Resolvers answer a [`CredentialRequest`] with whatever credentials and
//! region they can find. "Nothing found" is a successful, empty answer;
//! errors are reserved for resolver infrastructure failures.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Mutex;

use aws_extension_core::CredentialRequest;
use aws_extension_core::ResolvedAwsConfig;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Credential resolver errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    /// Runtime setup or shutdown failure.
    #[error("credential resolver runtime error: {0}")]
    Runtime(String),
    /// Resolver state was poisoned or otherwise unusable.
    #[error("credential resolver unavailable: {0}")]
    Unavailable(String),
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Source of AWS credentials and region.
pub trait CredentialResolver: Send + Sync {
    /// Resolves credentials for `request`.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError`] when the resolver itself fails. Providers
    /// that find no credentials yield an empty [`ResolvedAwsConfig`].
    fn resolve(&self, request: &CredentialRequest) -> Result<ResolvedAwsConfig, CredentialError>;
}

// ============================================================================
// SECTION: Static Resolver
// ============================================================================

/// Resolver returning a fixed answer.
#[derive(Debug, Default)]
pub struct StaticCredentialResolver {
    /// Answer returned for every request.
    resolved: ResolvedAwsConfig,
    /// Requests received, in order.
    requests: Mutex<Vec<CredentialRequest>>,
}

impl StaticCredentialResolver {
    /// Creates a resolver that always returns `resolved`.
    #[must_use]
    pub fn new(resolved: ResolvedAwsConfig) -> Self {
        Self {
            resolved,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Creates a resolver that never finds credentials.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns the requests received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<CredentialRequest> {
        self.requests.lock().map(|requests| requests.clone()).unwrap_or_default()
    }
}

impl CredentialResolver for StaticCredentialResolver {
    fn resolve(&self, request: &CredentialRequest) -> Result<ResolvedAwsConfig, CredentialError> {
        self.requests
            .lock()
            .map_err(|_| CredentialError::Unavailable("mutex poisoned".to_string()))?
            .push(request.clone());
        Ok(self.resolved.clone())
    }
}

#[cfg(test)]
mod tests {
    use aws_extension_core::AwsCredentials;
    use aws_extension_core::CredentialRequest;
    use aws_extension_core::ResolvedAwsConfig;

    use super::CredentialResolver;
    use super::StaticCredentialResolver;

    #[test]
    fn static_resolver_records_requests() {
        let resolved = ResolvedAwsConfig {
            credentials: Some(AwsCredentials::new("AKID", "secret")),
            region: Some("us-west-2".to_string()),
        };
        let resolver = StaticCredentialResolver::new(resolved.clone());
        let answer = resolver.resolve(&CredentialRequest::for_profile("dev"));
        assert_eq!(answer, Ok(resolved));
        assert_eq!(resolver.requests(), vec![CredentialRequest::for_profile("dev")]);
    }
}
