// aws-extension-core/src/greeting.rs
// ============================================================================
// Module: AWS Greeting
// Description: Formatting for the `aws` scalar function.
// Purpose: Keep the scalar output format in one place for every engine binding.
// Dependencies: none
// ============================================================================

//! Output formatting for the `aws` scalar function.

/// Prefix placed before the caller-supplied name.
const GREETING_PREFIX: &str = "Aws ";
/// Suffix placed after the caller-supplied name.
const GREETING_SUFFIX: &str = " 🐥";

/// Formats the `aws` scalar result for `name`.
///
/// The name is embedded verbatim; no trimming or case folding is applied.
#[must_use]
pub fn aws_greeting(name: &str) -> String {
    let mut out = String::with_capacity(GREETING_PREFIX.len() + name.len() + GREETING_SUFFIX.len());
    out.push_str(GREETING_PREFIX);
    out.push_str(name);
    out.push_str(GREETING_SUFFIX);
    out
}
