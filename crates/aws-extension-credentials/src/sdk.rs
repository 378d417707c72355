// aws-extension-credentials/src/sdk.rs
// ============================================================================
// Module: AWS SDK Credential Resolver
// Description: Resolver backed by aws-config provider chains.
// Purpose: Load credentials and region the way AWS tooling does.
// Dependencies: aws-config, aws-credential-types, aws-extension-core, tokio
// ============================================================================

//! ## Overview
//! Provider mapping for explicit chains:
//! - `sts`: web identity token provider
//! - `env`: environment variable provider
//! - `instance`: EC2 instance metadata provider
//! - `sso`, `process`, `config`: profile-file provider (the shared config
//!   file carries SSO sessions and `credential_process` entries)
//!
//! Without a chain, the SDK default chain is used, or the profile-file
//! provider when only a profile is named. One resolution (credentials and
//! region together) is bounded by [`AwsSdkResolverConfig::timeout`]; failures
//! and timeouts count as "no credentials found".

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use aws_config::default_provider::credentials::DefaultCredentialsChain;
use aws_config::default_provider::region::DefaultRegionChain;
use aws_config::environment::EnvironmentVariableCredentialsProvider;
use aws_config::imds::credentials::ImdsCredentialsProvider;
use aws_config::meta::credentials::CredentialsProviderChain;
use aws_config::profile::ProfileFileCredentialsProvider;
use aws_config::web_identity_token::WebIdentityTokenCredentialsProvider;
use aws_credential_types::Credentials;
use aws_credential_types::provider::ProvideCredentials;
use aws_credential_types::provider::SharedCredentialsProvider;
use aws_extension_core::AwsCredentials;
use aws_extension_core::ChainProvider;
use aws_extension_core::CredentialRequest;
use aws_extension_core::ResolvedAwsConfig;
use tokio::runtime::Handle;
use tokio::runtime::Runtime;
use tokio::runtime::RuntimeFlavor;

use crate::resolver::CredentialError;
use crate::resolver::CredentialResolver;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default upper bound for a single credential or region lookup.
pub const DEFAULT_RESOLVE_TIMEOUT: Duration = Duration::from_secs(5);

// ============================================================================
// SECTION: Runtime Helpers
// ============================================================================

/// Blocks on a resolver future using a compatible runtime.
fn block_on_with_runtime<F, T>(runtime: &Runtime, future: F) -> Result<T, CredentialError>
where
    F: Future<Output = Result<T, CredentialError>> + Send + 'static,
    T: Send + 'static,
{
    if let Ok(handle) = Handle::try_current() {
        if matches!(handle.runtime_flavor(), RuntimeFlavor::MultiThread) {
            return tokio::task::block_in_place(|| handle.block_on(future));
        }
        let (tx, rx) = std::sync::mpsc::sync_channel(1);
        std::thread::spawn(move || {
            let result = Runtime::new()
                .map_err(|err| CredentialError::Runtime(err.to_string()))
                .and_then(|runtime| runtime.block_on(future));
            let _ = tx.send(result);
        });
        return rx.recv().unwrap_or_else(|_| {
            Err(CredentialError::Runtime("credential resolver thread join failed".to_string()))
        });
    }

    runtime.block_on(future)
}

// ============================================================================
// SECTION: Config
// ============================================================================

/// Settings for the SDK-backed resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AwsSdkResolverConfig {
    /// Upper bound for each credential and region lookup.
    pub timeout: Duration,
}

impl Default for AwsSdkResolverConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_RESOLVE_TIMEOUT,
        }
    }
}

// ============================================================================
// SECTION: Resolver
// ============================================================================

/// Credential resolver backed by the AWS SDK provider chains.
pub struct AwsSdkCredentialResolver {
    /// Resolver settings.
    config: AwsSdkResolverConfig,
    /// Tokio runtime for blocking SDK calls.
    runtime: Option<Arc<Runtime>>,
}

impl Drop for AwsSdkCredentialResolver {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            let _ = std::thread::spawn(move || drop(runtime));
        }
    }
}

impl AwsSdkCredentialResolver {
    /// Builds a resolver with its own tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::Runtime`] when the runtime cannot start.
    pub fn new(config: AwsSdkResolverConfig) -> Result<Self, CredentialError> {
        let runtime = Runtime::new().map_err(|err| CredentialError::Runtime(err.to_string()))?;
        Ok(Self {
            config,
            runtime: Some(Arc::new(runtime)),
        })
    }

    /// Returns the runtime or an error if shut down.
    fn runtime(&self) -> Result<&Runtime, CredentialError> {
        self.runtime
            .as_ref()
            .map(AsRef::as_ref)
            .ok_or_else(|| CredentialError::Runtime("credential resolver runtime closed".to_string()))
    }
}

impl CredentialResolver for AwsSdkCredentialResolver {
    fn resolve(&self, request: &CredentialRequest) -> Result<ResolvedAwsConfig, CredentialError> {
        let request = request.clone();
        let timeout = self.config.timeout;
        block_on_with_runtime(self.runtime()?, async move {
            Ok(within_budget(
                timeout,
                fetch_credentials(&request),
                resolve_region(request.profile.as_deref()),
            )
            .await)
        })
    }
}

/// Runs the credential and region lookups against one shared time budget.
///
/// The region lookup gets whatever the credential lookup left over, so a
/// resolution never outlasts `budget`.
async fn within_budget(
    budget: Duration,
    credentials: impl Future<Output = Option<AwsCredentials>>,
    region: impl Future<Output = Option<String>>,
) -> ResolvedAwsConfig {
    let started = Instant::now();
    let credentials = tokio::time::timeout(budget, credentials).await.ok().flatten();
    let remaining = budget.saturating_sub(started.elapsed());
    let region = tokio::time::timeout(remaining, region).await.ok().flatten();
    ResolvedAwsConfig {
        credentials,
        region,
    }
}

// ============================================================================
// SECTION: Provider Helpers
// ============================================================================

/// Runs the provider chain selected by `request`.
async fn fetch_credentials(request: &CredentialRequest) -> Option<AwsCredentials> {
    let provider = build_provider(request).await;
    provider.provide_credentials().await.ok().map(|credentials| convert(&credentials))
}

/// Builds the provider selected by `request`.
async fn build_provider(request: &CredentialRequest) -> SharedCredentialsProvider {
    let profile = request.profile.as_deref();
    let Some((first, rest)) = request.chain.as_ref().and_then(|chain| chain.providers().split_first())
    else {
        if let Some(profile) = profile {
            return SharedCredentialsProvider::new(profile_provider(Some(profile)));
        }
        return SharedCredentialsProvider::new(DefaultCredentialsChain::builder().build().await);
    };
    let mut chain = CredentialsProviderChain::first_try(first.label(), chain_member(*first, profile));
    for provider in rest {
        chain = chain.or_else(provider.label(), chain_member(*provider, profile));
    }
    SharedCredentialsProvider::new(chain)
}

/// Maps a chain entry onto an SDK provider.
fn chain_member(provider: ChainProvider, profile: Option<&str>) -> SharedCredentialsProvider {
    match provider {
        ChainProvider::Sts => {
            SharedCredentialsProvider::new(WebIdentityTokenCredentialsProvider::builder().build())
        }
        ChainProvider::Env => {
            SharedCredentialsProvider::new(EnvironmentVariableCredentialsProvider::new())
        }
        ChainProvider::Instance => {
            SharedCredentialsProvider::new(ImdsCredentialsProvider::builder().build())
        }
        ChainProvider::Sso | ChainProvider::Process | ChainProvider::Config => {
            SharedCredentialsProvider::new(profile_provider(profile))
        }
    }
}

/// Builds a profile-file provider for an optional named profile.
fn profile_provider(profile: Option<&str>) -> ProfileFileCredentialsProvider {
    let builder = ProfileFileCredentialsProvider::builder();
    match profile {
        Some(profile) => builder.profile_name(profile).build(),
        None => builder.build(),
    }
}

/// Resolves the region for an optional named profile.
async fn resolve_region(profile: Option<&str>) -> Option<String> {
    let mut builder = DefaultRegionChain::builder();
    if let Some(profile) = profile {
        builder = builder.profile_name(profile);
    }
    builder.build().region().await.map(|region| region.to_string())
}

/// Converts SDK credentials into the extension model.
fn convert(credentials: &Credentials) -> AwsCredentials {
    AwsCredentials {
        access_key_id: credentials.access_key_id().to_string(),
        secret_access_key: credentials.secret_access_key().to_string(),
        session_token: credentials.session_token().map(str::to_string),
        expires_at: credentials.expiry(),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;
    use std::time::SystemTime;

    use aws_credential_types::Credentials;

    use std::future::pending;
    use std::time::Instant;

    use aws_extension_core::AwsCredentials;

    use super::AwsSdkResolverConfig;
    use super::DEFAULT_RESOLVE_TIMEOUT;
    use super::convert;
    use super::within_budget;

    #[test]
    fn default_config_uses_default_timeout() {
        assert_eq!(AwsSdkResolverConfig::default().timeout, DEFAULT_RESOLVE_TIMEOUT);
    }

    #[test]
    fn convert_keeps_token_and_expiry() {
        let expiry = SystemTime::UNIX_EPOCH + Duration::from_secs(1_900_000_000);
        let credentials =
            Credentials::new("AKID", "secret", Some("token".to_string()), Some(expiry), "test");
        let converted = convert(&credentials);
        assert_eq!(converted.access_key_id, "AKID");
        assert_eq!(converted.secret_access_key, "secret");
        assert_eq!(converted.session_token.as_deref(), Some("token"));
        assert_eq!(converted.expires_at, Some(expiry));
    }

    #[tokio::test]
    async fn stalled_lookups_share_one_budget() {
        let budget = Duration::from_millis(200);
        let started = Instant::now();
        let resolved = within_budget(
            budget,
            pending::<Option<AwsCredentials>>(),
            pending::<Option<String>>(),
        )
        .await;
        let elapsed = started.elapsed();
        assert_eq!(resolved.credentials, None);
        assert_eq!(resolved.region, None);
        assert!(
            elapsed < Duration::from_millis(350),
            "resolution took {} ms",
            elapsed.as_millis()
        );
    }

    #[tokio::test]
    async fn credentials_survive_a_stalled_region_lookup() {
        let resolved = within_budget(
            Duration::from_millis(100),
            async { Some(AwsCredentials::new("AKID", "secret")) },
            pending::<Option<String>>(),
        )
        .await;
        let key_id = resolved.credentials.map(|credentials| credentials.access_key_id);
        assert_eq!(key_id.as_deref(), Some("AKID"));
        assert_eq!(resolved.region, None);
    }
}
