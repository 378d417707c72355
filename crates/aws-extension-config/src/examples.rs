// aws-extension-config/src/examples.rs
// ============================================================================
// Module: Config Examples
// Description: Canonical example configuration payload.
// Purpose: Deterministic example for docs and tooling.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Canonical example for `aws-extension.toml`. The output is deterministic
//! and is parsed by the test suite to keep it in sync with the model.

/// Returns a canonical example `aws-extension.toml` configuration.
#[must_use]
pub fn config_toml_example() -> String {
    String::from(
        r#"[session]
# path = "analytics.db"
busy_timeout_ms = 5000

[credentials]
resolver = "aws_sdk"
default_chain = "env;config"
# default_profile = "analytics"
timeout_ms = 5000

[logging]
sink = "file"
path = "aws-extension-events.jsonl"

[extensions]
# load_aws_credentials fails until the host registers an httpfs extension.
# Set to false for sessions that never load one.
require_httpfs = true
"#,
    )
}
