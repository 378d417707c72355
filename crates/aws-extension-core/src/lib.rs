// aws-extension-core/src/lib.rs
// ============================================================================
// Module: AWS Extension Core Library
// Description: Public API surface for the AWS extension core model.
// Purpose: Expose greeting, credential chain, settings, and secret types.
// Dependencies: crate::{greeting, credentials, settings, secret}
// ============================================================================

//! ## Overview
//! The AWS extension core holds everything that does not depend on a SQL
//! engine or on the AWS SDK: the `aws` greeting, credential and credential
//! chain types, the host setting names written by credential loading, and
//! the construction rules for `credential_chain` secrets. Engine bindings
//! live in `aws-extension-sqlite`; SDK resolution lives in
//! `aws-extension-credentials`.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod credentials;
pub mod greeting;
pub mod secret;
pub mod settings;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use credentials::AwsCredentials;
pub use credentials::ChainParseError;
pub use credentials::ChainProvider;
pub use credentials::CredentialChain;
pub use credentials::CredentialRequest;
pub use credentials::ResolvedAwsConfig;
pub use greeting::aws_greeting;
pub use secret::CREDENTIAL_CHAIN_PROVIDER;
pub use secret::CreateSecretInput;
pub use secret::KeyValueSecret;
pub use secret::OnConflict;
pub use secret::SecretError;
pub use secret::SecretType;
pub use secret::SecretValue;
pub use secret::build_credential_chain_secret;
pub use secret::parse_secret_options;
