// aws-extension-credentials/src/lib.rs
// ============================================================================
// Module: AWS Extension Credentials Library
// Description: Credential resolvers for the AWS extension.
// Purpose: Resolve credentials and region through the AWS SDK provider chains.
// Dependencies: aws-config, aws-credential-types, aws-extension-core, tokio
// ============================================================================

//! ## Overview
//! The [`CredentialResolver`] trait is the seam between SQL functions and the
//! AWS SDK. [`AwsSdkCredentialResolver`] walks the SDK provider chains on a
//! private tokio runtime so synchronous SQL callbacks can block on it.
//! [`StaticCredentialResolver`] answers with a fixed result and records every
//! request, which keeps tests and offline sessions independent of the
//! environment.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod resolver;
pub mod sdk;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use resolver::CredentialError;
pub use resolver::CredentialResolver;
pub use resolver::StaticCredentialResolver;
pub use sdk::AwsSdkCredentialResolver;
pub use sdk::AwsSdkResolverConfig;
pub use sdk::DEFAULT_RESOLVE_TIMEOUT;
