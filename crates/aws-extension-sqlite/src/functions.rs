// aws-extension-sqlite/src/functions.rs
// ============================================================================
// Module: AWS SQL Functions
// Description: Scalar function registrations for the AWS extension.
// Purpose: Translate SQL arguments into core operations and back.
// Dependencies: aws-extension-core, aws-extension-credentials, rusqlite
// ============================================================================

//! ## Overview
//! Each SQL function is a thin adapter: it decodes arguments from
//! [`ValueRef`]s, calls into [`FunctionContext`], and maps failures through
//! [`ExtensionError::into_sql`]. The context holds the session state and the
//! extension's collaborators so every closure shares one view of settings
//! and secrets.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::SystemTime;

use aws_extension_core::CREDENTIAL_CHAIN_PROVIDER;
use aws_extension_core::CreateSecretInput;
use aws_extension_core::CredentialRequest;
use aws_extension_core::OnConflict;
use aws_extension_core::SecretType;
use aws_extension_core::aws_greeting;
use aws_extension_core::build_credential_chain_secret;
use aws_extension_core::parse_secret_options;
use aws_extension_core::settings::S3_ACCESS_KEY_ID;
use aws_extension_core::settings::S3_REGION;
use aws_extension_core::settings::S3_SECRET_ACCESS_KEY;
use aws_extension_core::settings::S3_SESSION_TOKEN;
use aws_extension_credentials::CredentialResolver;
use rusqlite::Connection;
use rusqlite::functions::Context;
use rusqlite::functions::FunctionFlags;
use rusqlite::types::ValueRef;
use serde_json::Value as JsonValue;

use crate::error::ExtensionError;
use crate::events::EventOutcome;
use crate::events::ExtensionEvent;
use crate::events::ExtensionEventParams;
use crate::events::ExtensionEventSink;
use crate::extension::AwsExtension;
use crate::extension::AwsExtensionOptions;
use crate::secrets::SecretStoreError;
use crate::session::SessionState;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Host extension that consumes the `s3_*` settings.
pub(crate) const HTTPFS_EXTENSION: &str = "httpfs";
/// Name of the greeting function.
const AWS_FUNCTION: &str = "aws";
/// Name of the credential loading function.
const LOAD_CREDENTIALS_FUNCTION: &str = "load_aws_credentials";
/// Name of the secret creation function.
const CREATE_SECRET_FUNCTION: &str = "create_aws_secret";
/// Name of the secret removal function.
const DROP_SECRET_FUNCTION: &str = "drop_aws_secret";
/// Name of the secret lookup function.
const WHICH_SECRET_FUNCTION: &str = "which_aws_secret";
/// Name of the secret display function.
const SECRET_STRING_FUNCTION: &str = "aws_secret_string";
/// Options key holding the secret scope.
const SCOPE_OPTION: &str = "scope";
/// Significant digits `SQLite` keeps when rendering a REAL as text.
const REAL_TEXT_DIGITS: usize = 15;

// ============================================================================
// SECTION: Context
// ============================================================================

/// State and collaborators shared by the registered closures.
#[derive(Clone)]
pub(crate) struct FunctionContext {
    /// Session host state.
    pub(crate) state: Arc<SessionState>,
    /// Credential source.
    pub(crate) resolver: Arc<dyn CredentialResolver>,
    /// Event destination.
    pub(crate) events: Arc<dyn ExtensionEventSink>,
    /// Extension options.
    pub(crate) options: Arc<AwsExtensionOptions>,
}

impl FunctionContext {
    /// Emits an event tagged with the extension name.
    fn record(&self, event: &'static str, outcome: EventOutcome, params: ExtensionEventParams) {
        self.events.record(&ExtensionEvent::new(event, AwsExtension::NAME, outcome, params));
    }

    /// Resolves credentials and writes them to the `s3_*` settings.
    fn load_credentials(&self, profile: Option<String>) -> Result<Option<String>, ExtensionError> {
        if self.options.require_httpfs && !self.state.is_extension_loaded(HTTPFS_EXTENSION) {
            let err = ExtensionError::MissingExtension {
                extension: HTTPFS_EXTENSION,
                function: LOAD_CREDENTIALS_FUNCTION,
            };
            self.record(
                "credentials_loaded",
                EventOutcome::Error,
                ExtensionEventParams {
                    function: Some(LOAD_CREDENTIALS_FUNCTION),
                    message: Some(err.to_string()),
                    ..ExtensionEventParams::default()
                },
            );
            return Err(err);
        }

        let request = match profile.filter(|profile| !profile.is_empty()) {
            Some(profile) => CredentialRequest::for_profile(profile),
            None => CredentialRequest {
                chain: self.options.default_chain.clone(),
                profile: self.options.default_profile.clone(),
            },
        };
        let resolved = self.resolver.resolve(&request)?;
        let Some(credentials) = resolved.usable_credentials(SystemTime::now()) else {
            self.record(
                "credentials_loaded",
                EventOutcome::NotFound,
                ExtensionEventParams {
                    function: Some(LOAD_CREDENTIALS_FUNCTION),
                    ..ExtensionEventParams::default()
                },
            );
            return Ok(None);
        };

        self.state.set_setting(S3_ACCESS_KEY_ID, credentials.access_key_id.clone())?;
        self.state.set_setting(S3_SECRET_ACCESS_KEY, credentials.secret_access_key.clone())?;
        self.state
            .set_setting(S3_SESSION_TOKEN, credentials.session_token.clone().unwrap_or_default())?;
        let mut settings_written = vec![S3_ACCESS_KEY_ID, S3_SECRET_ACCESS_KEY, S3_SESSION_TOKEN];
        if let Some(region) = resolved.region.as_ref().filter(|region| !region.is_empty()) {
            self.state.set_setting(S3_REGION, region.clone())?;
            settings_written.push(S3_REGION);
        }
        self.record(
            "credentials_loaded",
            EventOutcome::Ok,
            ExtensionEventParams {
                function: Some(LOAD_CREDENTIALS_FUNCTION),
                settings_written,
                ..ExtensionEventParams::default()
            },
        );
        Ok(Some(credentials.access_key_id.clone()))
    }

    /// Builds, stores, and renders a `credential_chain` secret.
    fn create_secret(
        &self,
        name: Option<String>,
        type_label: &str,
        options_json: Option<String>,
        on_conflict: OnConflict,
    ) -> Result<String, ExtensionError> {
        let secret_type = SecretType::parse(type_label)?;
        let mut payload: JsonValue = match options_json {
            Some(text) => serde_json::from_str(&text).map_err(|err| {
                ExtensionError::InvalidArgument {
                    function: CREATE_SECRET_FUNCTION,
                    message: format!("options must be valid JSON: {err}"),
                }
            })?,
            None => JsonValue::Object(serde_json::Map::new()),
        };
        let scope = take_scope(&mut payload)?;
        let input = CreateSecretInput {
            name,
            secret_type,
            provider: CREDENTIAL_CHAIN_PROVIDER.to_string(),
            scope,
            options: parse_secret_options(secret_type, &payload)?,
            on_conflict,
        };
        input.validate()?;

        let secrets = self.state.secrets();
        let resolved_name = input.resolved_name();
        match on_conflict {
            OnConflict::Error if secrets.contains(&resolved_name)? => {
                return Err(SecretStoreError::AlreadyExists(resolved_name).into());
            }
            OnConflict::Ignore => {
                if let Some(existing) = secrets.get(&resolved_name)? {
                    return Ok(existing.to_redacted_string());
                }
            }
            OnConflict::Error | OnConflict::Replace => {}
        }

        let resolved = self.resolver.resolve(&input.credential_request()?)?;
        let secret = build_credential_chain_secret(&input, &resolved, SystemTime::now())?;
        let stored = secrets.create(secret, on_conflict)?;
        self.record(
            "secret_created",
            EventOutcome::Ok,
            ExtensionEventParams {
                function: Some(CREATE_SECRET_FUNCTION),
                secret_name: Some(stored.name.clone()),
                secret_type: Some(stored.secret_type.label()),
                provider: Some(stored.provider.clone()),
                scope: stored.scope.clone(),
                ..ExtensionEventParams::default()
            },
        );
        Ok(stored.to_redacted_string())
    }

    /// Decodes `create_aws_secret` arguments and creates the secret.
    fn create_secret_from_args(
        &self,
        ctx: &Context<'_>,
        with_conflict: bool,
    ) -> Result<String, ExtensionError> {
        let name = text_arg(ctx, 0, CREATE_SECRET_FUNCTION)?;
        let type_label = required_text_arg(ctx, 1, CREATE_SECRET_FUNCTION)?;
        let options = text_arg(ctx, 2, CREATE_SECRET_FUNCTION)?;
        let on_conflict = if with_conflict {
            parse_on_conflict(&required_text_arg(ctx, 3, CREATE_SECRET_FUNCTION)?)?
        } else {
            OnConflict::default()
        };
        self.create_secret(name, &type_label, options, on_conflict)
    }

    /// Returns the name of the secret that applies to a path.
    fn which_secret(&self, ctx: &Context<'_>) -> Result<Option<String>, ExtensionError> {
        let path = required_text_arg(ctx, 0, WHICH_SECRET_FUNCTION)?;
        let secret_type = SecretType::parse(&required_text_arg(ctx, 1, WHICH_SECRET_FUNCTION)?)?;
        let found = self.state.secrets().lookup(&path, secret_type)?;
        Ok(found.map(|secret| secret.name))
    }

    /// Renders a stored secret with redaction applied.
    fn secret_string(&self, ctx: &Context<'_>) -> Result<Option<String>, ExtensionError> {
        let name = required_text_arg(ctx, 0, SECRET_STRING_FUNCTION)?;
        let found = self.state.secrets().get(&name)?;
        Ok(found.map(|secret| secret.to_redacted_string()))
    }

    /// Removes a secret by name.
    fn drop_secret(&self, name: &str) -> Result<bool, ExtensionError> {
        let removed = self.state.secrets().drop_secret(name)?;
        let outcome = if removed { EventOutcome::Ok } else { EventOutcome::NotFound };
        self.record(
            "secret_dropped",
            outcome,
            ExtensionEventParams {
                function: Some(DROP_SECRET_FUNCTION),
                secret_name: Some(name.to_lowercase()),
                ..ExtensionEventParams::default()
            },
        );
        Ok(removed)
    }
}

// ============================================================================
// SECTION: Registration
// ============================================================================

/// Registers every AWS SQL function on `connection`.
pub(crate) fn register(connection: &Connection, context: &FunctionContext) -> rusqlite::Result<()> {
    connection.create_scalar_function(
        AWS_FUNCTION,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let name = text_arg(ctx, 0, AWS_FUNCTION).map_err(ExtensionError::into_sql)?;
            Ok(name.map(|name| aws_greeting(&name)))
        },
    )?;

    for arity in [0, 1] {
        let context = context.clone();
        connection.create_scalar_function(
            LOAD_CREDENTIALS_FUNCTION,
            arity,
            FunctionFlags::SQLITE_UTF8,
            move |ctx| {
                let profile = if arity == 0 {
                    None
                } else {
                    text_arg(ctx, 0, LOAD_CREDENTIALS_FUNCTION).map_err(ExtensionError::into_sql)?
                };
                context.load_credentials(profile).map_err(ExtensionError::into_sql)
            },
        )?;
    }

    for arity in [3, 4] {
        let context = context.clone();
        connection.create_scalar_function(
            CREATE_SECRET_FUNCTION,
            arity,
            FunctionFlags::SQLITE_UTF8,
            move |ctx| {
                context.create_secret_from_args(ctx, arity == 4).map_err(ExtensionError::into_sql)
            },
        )?;
    }

    let drop_context = context.clone();
    connection.create_scalar_function(
        DROP_SECRET_FUNCTION,
        1,
        FunctionFlags::SQLITE_UTF8,
        move |ctx| {
            required_text_arg(ctx, 0, DROP_SECRET_FUNCTION)
                .and_then(|name| drop_context.drop_secret(&name))
                .map_err(ExtensionError::into_sql)
        },
    )?;

    let which_context = context.clone();
    connection.create_scalar_function(
        WHICH_SECRET_FUNCTION,
        2,
        FunctionFlags::SQLITE_UTF8,
        move |ctx| which_context.which_secret(ctx).map_err(ExtensionError::into_sql),
    )?;

    let string_context = context.clone();
    connection.create_scalar_function(
        SECRET_STRING_FUNCTION,
        1,
        FunctionFlags::SQLITE_UTF8,
        move |ctx| string_context.secret_string(ctx).map_err(ExtensionError::into_sql),
    )?;
    Ok(())
}

// ============================================================================
// SECTION: Argument Helpers
// ============================================================================

/// Reads argument `index` as text; NULL yields `None`, numbers are rendered.
fn text_arg(
    ctx: &Context<'_>,
    index: usize,
    function: &'static str,
) -> Result<Option<String>, ExtensionError> {
    match ctx.get_raw(index) {
        ValueRef::Null => Ok(None),
        ValueRef::Integer(value) => Ok(Some(value.to_string())),
        ValueRef::Real(value) => Ok(Some(real_to_text(value))),
        ValueRef::Text(bytes) => std::str::from_utf8(bytes)
            .map(|text| Some(text.to_string()))
            .map_err(|_| ExtensionError::InvalidArgument {
                function,
                message: format!("argument {} is not valid UTF-8", index + 1),
            }),
        ValueRef::Blob(_) => Err(ExtensionError::InvalidArgument {
            function,
            message: format!("argument {} must be text, not a blob", index + 1),
        }),
    }
}

/// Renders a REAL the way `SQLite` casts it to text (`%!.15g`).
///
/// Fifteen significant digits, trailing zeros trimmed but at least one
/// fractional digit kept, and exponent form outside `1e-4 <= |x| < 1e15`.
fn real_to_text(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        let label = if value < 0.0 { "-Inf" } else { "Inf" };
        return label.to_string();
    }
    if value == 0.0 {
        return "0.0".to_string();
    }
    let scientific = format!("{:.*e}", REAL_TEXT_DIGITS - 1, value.abs());
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return value.to_string();
    };
    let Ok(exponent) = exponent.parse::<i32>() else {
        return value.to_string();
    };
    let digits: String = mantissa.chars().filter(char::is_ascii_digit).collect();
    let sign = if value < 0.0 { "-" } else { "" };
    let body = if !(-4..=14).contains(&exponent) {
        let (lead, rest) = digits.split_at(1);
        let exponent_sign = if exponent < 0 { '-' } else { '+' };
        format!("{lead}.{}e{exponent_sign}{:02}", fraction_digits(rest), exponent.unsigned_abs())
    } else if let Ok(whole) = usize::try_from(exponent) {
        let (integer, rest) = digits.split_at(whole + 1);
        format!("{integer}.{}", fraction_digits(rest))
    } else {
        let zeros = "0".repeat(usize::try_from(-exponent - 1).unwrap_or_default());
        format!("0.{zeros}{}", fraction_digits(&digits))
    };
    format!("{sign}{body}")
}

/// Trims trailing zeros from fractional digits, keeping at least one digit.
fn fraction_digits(digits: &str) -> &str {
    let trimmed = digits.trim_end_matches('0');
    if trimmed.is_empty() { "0" } else { trimmed }
}

/// Reads argument `index` as text, rejecting NULL.
fn required_text_arg(
    ctx: &Context<'_>,
    index: usize,
    function: &'static str,
) -> Result<String, ExtensionError> {
    text_arg(ctx, index, function)?.ok_or_else(|| ExtensionError::InvalidArgument {
        function,
        message: format!("argument {} must not be NULL", index + 1),
    })
}

/// Parses an `on_conflict` argument.
fn parse_on_conflict(label: &str) -> Result<OnConflict, ExtensionError> {
    match label.to_ascii_lowercase().as_str() {
        "error" => Ok(OnConflict::Error),
        "replace" => Ok(OnConflict::Replace),
        "ignore" => Ok(OnConflict::Ignore),
        other => Err(ExtensionError::InvalidArgument {
            function: CREATE_SECRET_FUNCTION,
            message: format!("unknown on_conflict '{other}', expected error, replace, or ignore"),
        }),
    }
}

/// Removes the `scope` key from an options object.
fn take_scope(payload: &mut JsonValue) -> Result<Vec<String>, ExtensionError> {
    let Some(object) = payload.as_object_mut() else {
        return Ok(Vec::new());
    };
    let Some(scope) = object.remove(SCOPE_OPTION) else {
        return Ok(Vec::new());
    };
    let invalid = || ExtensionError::InvalidArgument {
        function: CREATE_SECRET_FUNCTION,
        message: "scope must be a string or an array of strings".to_string(),
    };
    match scope {
        JsonValue::String(prefix) => Ok(vec![prefix]),
        JsonValue::Array(items) => items
            .into_iter()
            .map(|item| match item {
                JsonValue::String(prefix) => Ok(prefix),
                _ => Err(invalid()),
            })
            .collect(),
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::OnConflict;
    use super::parse_on_conflict;
    use super::real_to_text;
    use super::take_scope;

    #[test]
    fn scope_accepts_string_or_array() {
        let mut single = json!({"scope": "s3://bucket", "region": "eu-west-1"});
        assert_eq!(take_scope(&mut single).ok(), Some(vec!["s3://bucket".to_string()]));
        assert!(single.get("scope").is_none());
        assert_eq!(single["region"], "eu-west-1");

        let mut many = json!({"scope": ["s3://a", "s3://b"]});
        assert_eq!(
            take_scope(&mut many).ok(),
            Some(vec!["s3://a".to_string(), "s3://b".to_string()])
        );

        let mut absent = json!({});
        assert_eq!(take_scope(&mut absent).ok(), Some(Vec::new()));
    }

    #[test]
    fn scope_rejects_non_strings() {
        let mut payload = json!({"scope": ["s3://a", 7]});
        assert!(take_scope(&mut payload).is_err());
        let mut payload = json!({"scope": true});
        assert!(take_scope(&mut payload).is_err());
    }

    #[test]
    fn on_conflict_labels_are_case_insensitive() {
        assert_eq!(parse_on_conflict("REPLACE").ok(), Some(OnConflict::Replace));
        assert_eq!(parse_on_conflict("ignore").ok(), Some(OnConflict::Ignore));
        assert_eq!(parse_on_conflict("error").ok(), Some(OnConflict::Error));
        assert!(parse_on_conflict("overwrite").is_err());
    }

    #[test]
    fn reals_render_like_sqlite_text_casts() {
        assert_eq!(real_to_text(1.0), "1.0");
        assert_eq!(real_to_text(-2.5), "-2.5");
        assert_eq!(real_to_text(0.1), "0.1");
        assert_eq!(real_to_text(0.0001), "0.0001");
        assert_eq!(real_to_text(0.000_015), "1.5e-05");
        assert_eq!(real_to_text(123_456.789), "123456.789");
        assert_eq!(real_to_text(1e14), "100000000000000.0");
        assert_eq!(real_to_text(1e15), "1.0e+15");
        assert_eq!(real_to_text(1.5e300), "1.5e+300");
        assert_eq!(real_to_text(1.0 / 3.0), "0.333333333333333");
        assert_eq!(real_to_text(-0.0), "0.0");
        assert_eq!(real_to_text(f64::INFINITY), "Inf");
    }
}
