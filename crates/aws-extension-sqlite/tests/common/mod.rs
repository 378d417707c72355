// aws-extension-sqlite/tests/common/mod.rs
// =============================================================================
// Module: SQLite Extension Test Helpers
// Description: Shared sessions, stub extensions, and a recording event sink.
// Purpose: Reduce duplication across integration tests for aws-extension-sqlite.
// =============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]

use std::sync::Arc;
use std::sync::Mutex;

use aws_extension_core::AwsCredentials;
use aws_extension_core::ResolvedAwsConfig;
use aws_extension_credentials::StaticCredentialResolver;
use aws_extension_sqlite::AwsExtension;
use aws_extension_sqlite::AwsExtensionOptions;
use aws_extension_sqlite::Extension;
use aws_extension_sqlite::ExtensionError;
use aws_extension_sqlite::ExtensionEvent;
use aws_extension_sqlite::ExtensionEventSink;
use aws_extension_sqlite::Session;

/// Stand-in for the host `httpfs` extension; registers nothing.
pub struct HttpfsStub;

impl Extension for HttpfsStub {
    fn name(&self) -> &'static str {
        "httpfs"
    }

    fn load(&self, _session: &Session) -> Result<(), ExtensionError> {
        Ok(())
    }
}

/// Sink that keeps every event in memory.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<ExtensionEvent>>,
}

impl RecordingSink {
    /// Returns the recorded event names in order.
    pub fn names(&self) -> Vec<&'static str> {
        self.events().iter().map(|event| event.event).collect()
    }

    /// Returns a copy of the recorded events.
    pub fn events(&self) -> Vec<ExtensionEvent> {
        self.events.lock().map(|events| events.clone()).unwrap_or_default()
    }
}

impl ExtensionEventSink for RecordingSink {
    fn record(&self, event: &ExtensionEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

/// Credentials returned by [`static_resolved`].
pub fn sample_credentials() -> AwsCredentials {
    AwsCredentials::new("AKIDEXAMPLE", "wJalrXUtnFEMI/K7MDENG").with_session_token("FwoGZXIvYXdz")
}

/// Resolved configuration with sample credentials and a region.
pub fn static_resolved() -> ResolvedAwsConfig {
    ResolvedAwsConfig {
        credentials: Some(sample_credentials()),
        region: Some("eu-west-1".to_string()),
    }
}

/// Opens an in-memory session with the AWS extension backed by `resolver`.
pub fn session_with(
    resolver: Arc<StaticCredentialResolver>,
    sink: Arc<RecordingSink>,
    options: AwsExtensionOptions,
) -> Result<Session, String> {
    let session = Session::open_in_memory().map_err(|err| err.to_string())?;
    let extension = AwsExtension::new(resolver, sink).with_options(options);
    session.load_extension(&extension).map_err(|err| err.to_string())?;
    Ok(session)
}

/// Opens a session with static credentials, a recording sink, and `httpfs`
/// loaded.
pub fn loaded_session() -> Result<(Session, Arc<StaticCredentialResolver>, Arc<RecordingSink>), String>
{
    let resolver = Arc::new(StaticCredentialResolver::new(static_resolved()));
    let sink = Arc::new(RecordingSink::default());
    let session =
        session_with(Arc::clone(&resolver), Arc::clone(&sink), AwsExtensionOptions::default())?;
    session.load_extension(&HttpfsStub).map_err(|err| err.to_string())?;
    Ok((session, resolver, sink))
}
