// aws-extension-core/src/settings.rs
// ============================================================================
// Module: Host Setting Names
// Description: Setting keys written when credentials are loaded.
// Purpose: Share setting names between the loader and its consumers.
// Dependencies: none
// ============================================================================

//! Host setting names populated by `load_aws_credentials`.

/// Access key id consumed by S3 readers.
pub const S3_ACCESS_KEY_ID: &str = "s3_access_key_id";
/// Secret access key consumed by S3 readers.
pub const S3_SECRET_ACCESS_KEY: &str = "s3_secret_access_key";
/// Session token consumed by S3 readers.
pub const S3_SESSION_TOKEN: &str = "s3_session_token";
/// Region consumed by S3 readers.
pub const S3_REGION: &str = "s3_region";

/// Settings whose values must never be echoed in logs.
pub const SENSITIVE_SETTINGS: [&str; 2] = [S3_SECRET_ACCESS_KEY, S3_SESSION_TOKEN];

/// Returns true when the setting holds secret material.
#[must_use]
pub fn is_sensitive_setting(name: &str) -> bool {
    SENSITIVE_SETTINGS.iter().any(|setting| setting.eq_ignore_ascii_case(name))
}
