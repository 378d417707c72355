// aws-extension-sqlite/src/events.rs
// ============================================================================
// Module: Extension Event Logging
// Description: Structured events for extension loading, credentials, secrets.
// Purpose: Emit redacted JSON-line events without hard dependencies.
// Dependencies: aws-extension-config, serde, serde_json
// ============================================================================

//! ## Overview
//! Events are serialized as one JSON object per line. They name what
//! happened (`extension_loaded`, `credentials_loaded`, `secret_created`,
//! `secret_dropped`) and never carry secret values: credential events list
//! the setting names that were written, and secret events list the name,
//! type, provider, and scope only.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use aws_extension_config::LogSinkKind;
use aws_extension_config::LoggingConfig;
use serde::Serialize;

use crate::error::ExtensionError;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Outcome label attached to every event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventOutcome {
    /// Operation completed and produced a result.
    Ok,
    /// Operation completed without finding anything.
    NotFound,
    /// Operation failed.
    Error,
}

/// Extension event payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtensionEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Extension name.
    pub extension: &'static str,
    /// Event outcome.
    pub outcome: EventOutcome,
    /// SQL function that produced the event.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function: Option<&'static str>,
    /// Secret name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_name: Option<String>,
    /// Secret type label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_type: Option<&'static str>,
    /// Secret provider.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    /// Secret scope.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub scope: Vec<String>,
    /// Names of host settings written.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub settings_written: Vec<&'static str>,
    /// Failure message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Inputs required to construct an extension event.
#[derive(Debug, Clone, Default)]
pub struct ExtensionEventParams {
    /// SQL function that produced the event.
    pub function: Option<&'static str>,
    /// Secret name.
    pub secret_name: Option<String>,
    /// Secret type label.
    pub secret_type: Option<&'static str>,
    /// Secret provider.
    pub provider: Option<String>,
    /// Secret scope.
    pub scope: Vec<String>,
    /// Names of host settings written.
    pub settings_written: Vec<&'static str>,
    /// Failure message.
    pub message: Option<String>,
}

impl ExtensionEvent {
    /// Creates a new event with a consistent timestamp.
    #[must_use]
    pub fn new(
        event: &'static str,
        extension: &'static str,
        outcome: EventOutcome,
        params: ExtensionEventParams,
    ) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Self {
            event,
            timestamp_ms,
            extension,
            outcome,
            function: params.function,
            secret_name: params.secret_name,
            secret_type: params.secret_type,
            provider: params.provider,
            scope: params.scope,
            settings_written: params.settings_written,
            message: params.message,
        }
    }
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Sink for extension events.
pub trait ExtensionEventSink: Send + Sync {
    /// Record an event.
    fn record(&self, event: &ExtensionEvent);
}

/// Sink that logs JSON lines to stderr.
pub struct StderrEventSink;

impl ExtensionEventSink for StderrEventSink {
    fn record(&self, event: &ExtensionEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Sink that logs JSON lines to a file.
pub struct FileEventSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileEventSink {
    /// Opens the event log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl ExtensionEventSink for FileEventSink {
    fn record(&self, event: &ExtensionEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// Sink that discards events.
pub struct NoopEventSink;

impl ExtensionEventSink for NoopEventSink {
    fn record(&self, _event: &ExtensionEvent) {}
}

/// Builds the sink selected by the logging configuration.
///
/// # Errors
///
/// Returns [`ExtensionError`] when a file sink cannot be opened.
pub fn sink_from_config(
    config: &LoggingConfig,
) -> Result<Arc<dyn ExtensionEventSink>, ExtensionError> {
    match (config.sink, &config.path) {
        (LogSinkKind::Stderr, _) => Ok(Arc::new(StderrEventSink)),
        (LogSinkKind::None, _) => Ok(Arc::new(NoopEventSink)),
        (LogSinkKind::File, Some(path)) => {
            let sink = FileEventSink::new(path).map_err(|err| ExtensionError::Io(err.to_string()))?;
            Ok(Arc::new(sink))
        }
        (LogSinkKind::File, None) => {
            Err(ExtensionError::Io("logging.sink=file requires logging.path".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::EventOutcome;
    use super::ExtensionEvent;
    use super::ExtensionEventParams;

    #[test]
    fn optional_fields_are_omitted() {
        let event = ExtensionEvent::new(
            "extension_loaded",
            "aws",
            EventOutcome::Ok,
            ExtensionEventParams::default(),
        );
        let payload = serde_json::to_value(&event).unwrap_or_default();
        assert_eq!(payload["event"], "extension_loaded");
        assert_eq!(payload["outcome"], "ok");
        assert!(payload.get("secret_name").is_none());
        assert!(payload.get("scope").is_none());
    }
}
