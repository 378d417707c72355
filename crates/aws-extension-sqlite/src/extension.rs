// aws-extension-sqlite/src/extension.rs
// ============================================================================
// Module: AWS Extension
// Description: Loadable extension bundling the AWS SQL functions.
// Purpose: Wire resolver, event sink, and options into a session.
// Dependencies: aws-extension-config, aws-extension-credentials, rusqlite
// ============================================================================

//! ## Overview
//! [`AwsExtension`] carries the collaborators its SQL functions need: a
//! [`CredentialResolver`], an [`ExtensionEventSink`], and
//! [`AwsExtensionOptions`]. Loading it registers the functions on the
//! session connection; the session records it as loaded so a second load is
//! a no-op.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use aws_extension_config::AwsExtensionConfig;
use aws_extension_config::CredentialResolverKind;
use aws_extension_core::CredentialChain;
use aws_extension_credentials::AwsSdkCredentialResolver;
use aws_extension_credentials::AwsSdkResolverConfig;
use aws_extension_credentials::CredentialResolver;
use aws_extension_credentials::StaticCredentialResolver;

use crate::error::ExtensionError;
use crate::error::SessionError;
use crate::events::EventOutcome;
use crate::events::ExtensionEvent;
use crate::events::ExtensionEventParams;
use crate::events::ExtensionEventSink;
use crate::events::sink_from_config;
use crate::functions;
use crate::functions::FunctionContext;
use crate::session::Extension;
use crate::session::Session;

// ============================================================================
// SECTION: Options
// ============================================================================

/// Behavior switches for the AWS extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AwsExtensionOptions {
    /// Require `httpfs` to be loaded before credentials are loaded.
    pub require_httpfs: bool,
    /// Chain used by `load_aws_credentials()` when no profile is given.
    pub default_chain: Option<CredentialChain>,
    /// Profile used by `load_aws_credentials()` when no profile is given.
    pub default_profile: Option<String>,
}

impl Default for AwsExtensionOptions {
    fn default() -> Self {
        Self {
            require_httpfs: true,
            default_chain: None,
            default_profile: None,
        }
    }
}

impl AwsExtensionOptions {
    /// Derives options from the extension configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ExtensionError::Config`] when the default chain is invalid.
    pub fn from_config(config: &AwsExtensionConfig) -> Result<Self, ExtensionError> {
        Ok(Self {
            require_httpfs: config.extensions.require_httpfs,
            default_chain: config.credentials.parsed_default_chain()?,
            default_profile: config.credentials.default_profile.clone(),
        })
    }
}

// ============================================================================
// SECTION: Extension
// ============================================================================

/// The `aws` extension.
pub struct AwsExtension {
    /// Credential source for SQL functions.
    resolver: Arc<dyn CredentialResolver>,
    /// Destination for structured events.
    events: Arc<dyn ExtensionEventSink>,
    /// Behavior switches.
    options: AwsExtensionOptions,
}

impl AwsExtension {
    /// Extension name used for load tracking and events.
    pub const NAME: &'static str = "aws";

    /// Creates the extension with default options.
    #[must_use]
    pub fn new(
        resolver: Arc<dyn CredentialResolver>,
        events: Arc<dyn ExtensionEventSink>,
    ) -> Self {
        Self {
            resolver,
            events,
            options: AwsExtensionOptions::default(),
        }
    }

    /// Replaces the extension options.
    #[must_use]
    pub fn with_options(mut self, options: AwsExtensionOptions) -> Self {
        self.options = options;
        self
    }

    /// Builds the extension from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ExtensionError`] when the resolver runtime or event sink
    /// cannot be created, or the configuration is invalid.
    pub fn from_config(config: &AwsExtensionConfig) -> Result<Self, ExtensionError> {
        let resolver: Arc<dyn CredentialResolver> = match config.credentials.resolver {
            CredentialResolverKind::AwsSdk => {
                Arc::new(AwsSdkCredentialResolver::new(AwsSdkResolverConfig {
                    timeout: config.credentials.timeout(),
                })?)
            }
            CredentialResolverKind::None => Arc::new(StaticCredentialResolver::empty()),
        };
        let events = sink_from_config(&config.logging)?;
        Ok(Self::new(resolver, events).with_options(AwsExtensionOptions::from_config(config)?))
    }

    /// Returns the extension options.
    #[must_use]
    pub const fn options(&self) -> &AwsExtensionOptions {
        &self.options
    }

    /// Returns the extension version, which tracks the linked `SQLite`
    /// library.
    #[must_use]
    pub fn library_version() -> &'static str {
        rusqlite::version()
    }
}

impl Extension for AwsExtension {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn load(&self, session: &Session) -> Result<(), ExtensionError> {
        let context = FunctionContext {
            state: Arc::clone(session.state()),
            resolver: Arc::clone(&self.resolver),
            events: Arc::clone(&self.events),
            options: Arc::new(self.options.clone()),
        };
        functions::register(session.connection(), &context)
            .map_err(|err| ExtensionError::Registration(err.to_string()))?;
        self.events.record(&ExtensionEvent::new(
            "extension_loaded",
            Self::NAME,
            EventOutcome::Ok,
            ExtensionEventParams::default(),
        ));
        Ok(())
    }
}

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// Loads the `aws` extension into `session` with default configuration.
///
/// The default configuration requires `httpfs`: load an extension named
/// `httpfs` into the session before calling `load_aws_credentials`, or build
/// the extension through [`AwsExtension::from_config`] with
/// `extensions.require_httpfs = false`.
///
/// # Errors
///
/// Returns [`SessionError`] when the extension cannot be built or loaded.
pub fn aws_init(session: &Session) -> Result<(), SessionError> {
    let extension = AwsExtension::from_config(&AwsExtensionConfig::default())?;
    session.load_extension(&extension)?;
    Ok(())
}
