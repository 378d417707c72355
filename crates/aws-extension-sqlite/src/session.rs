// aws-extension-sqlite/src/session.rs
// ============================================================================
// Module: SQL Session Host
// Description: In-process SQLite connection with extension host facilities.
// Purpose: Give extensions a place to register functions and keep state.
// Dependencies: aws-extension-config, aws-extension-core, rusqlite
// ============================================================================

//! ## Overview
//! A [`Session`] owns one `SQLite` connection (in-memory or file-backed) and
//! an [`Arc`]-shared [`SessionState`]. SQL function closures capture the
//! state, so settings and secrets written from SQL are visible to Rust
//! callers and vice versa. The host registers `current_setting(name)` on
//! open; everything else comes from loaded [`Extension`]s.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;

use aws_extension_config::SessionConfig;
use aws_extension_core::settings::is_sensitive_setting;
use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::functions::FunctionFlags;
use rusqlite::types::Value;

use crate::error::ExtensionError;
use crate::error::SessionError;
use crate::secrets::SecretManager;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Placeholder returned for sensitive settings in redacted snapshots.
const REDACTED_SETTING: &str = "redacted";

// ============================================================================
// SECTION: Extension Trait
// ============================================================================

/// A loadable bundle of SQL functions.
pub trait Extension: Send + Sync {
    /// Returns the extension name used for load tracking.
    fn name(&self) -> &'static str;

    /// Registers the extension on `session`.
    ///
    /// # Errors
    ///
    /// Returns [`ExtensionError`] when registration fails.
    fn load(&self, session: &Session) -> Result<(), ExtensionError>;
}

// ============================================================================
// SECTION: Session State
// ============================================================================

/// Host state shared between a session and its SQL functions.
#[derive(Default)]
pub struct SessionState {
    /// Settings keyed by lowercased name.
    settings: Mutex<BTreeMap<String, String>>,
    /// Names of loaded extensions.
    extensions: Mutex<BTreeSet<String>>,
    /// Temporary secrets.
    secrets: SecretManager,
}

impl fmt::Debug for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let extensions =
            self.extensions.lock().map(|extensions| extensions.clone()).unwrap_or_default();
        f.debug_struct("SessionState")
            .field("settings", &self.redacted_settings())
            .field("extensions", &extensions)
            .field("secrets", &self.secrets)
            .finish()
    }
}

impl SessionState {
    /// Returns a setting value.
    #[must_use]
    pub fn setting(&self, name: &str) -> Option<String> {
        self.settings.lock().ok().and_then(|settings| settings.get(&name.to_lowercase()).cloned())
    }

    /// Writes a setting value.
    ///
    /// # Errors
    ///
    /// Returns [`ExtensionError::Unavailable`] when the lock is poisoned.
    pub fn set_setting(&self, name: &str, value: impl Into<String>) -> Result<(), ExtensionError> {
        self.settings
            .lock()
            .map_err(|_| ExtensionError::Unavailable("settings mutex poisoned".to_string()))?
            .insert(name.to_lowercase(), value.into());
        Ok(())
    }

    /// Returns all settings with sensitive values masked.
    #[must_use]
    pub fn redacted_settings(&self) -> BTreeMap<String, String> {
        let Ok(settings) = self.settings.lock() else {
            return BTreeMap::new();
        };
        settings
            .iter()
            .map(|(name, value)| {
                let shown =
                    if is_sensitive_setting(name) { REDACTED_SETTING.to_string() } else { value.clone() };
                (name.clone(), shown)
            })
            .collect()
    }

    /// Returns true when the named extension is loaded.
    #[must_use]
    pub fn is_extension_loaded(&self, name: &str) -> bool {
        self.extensions
            .lock()
            .is_ok_and(|extensions| extensions.contains(&name.to_lowercase()))
    }

    /// Records an extension as loaded; returns false if it already was.
    fn mark_extension_loaded(&self, name: &str) -> Result<bool, ExtensionError> {
        Ok(self
            .extensions
            .lock()
            .map_err(|_| ExtensionError::Unavailable("extension mutex poisoned".to_string()))?
            .insert(name.to_lowercase()))
    }

    /// Returns the session's secret manager.
    #[must_use]
    pub const fn secrets(&self) -> &SecretManager {
        &self.secrets
    }
}

// ============================================================================
// SECTION: Session
// ============================================================================

/// In-process SQL session with extension support.
pub struct Session {
    /// Underlying `SQLite` connection.
    connection: Connection,
    /// Shared host state.
    state: Arc<SessionState>,
}

impl Session {
    /// Opens a session described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] when the database cannot be opened.
    pub fn open(config: &SessionConfig) -> Result<Self, SessionError> {
        let connection = match &config.path {
            None => Connection::open_in_memory()?,
            Some(path) => {
                validate_session_path(path)?;
                ensure_parent_dir(path)?;
                let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
                    | OpenFlags::SQLITE_OPEN_CREATE
                    | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
                Connection::open_with_flags(path, flags)?
            }
        };
        connection.busy_timeout(config.busy_timeout())?;
        let state = Arc::new(SessionState::default());
        register_host_functions(&connection, &state)?;
        Ok(Self {
            connection,
            state,
        })
    }

    /// Opens an in-memory session with default settings.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] when the database cannot be opened.
    pub fn open_in_memory() -> Result<Self, SessionError> {
        Self::open(&SessionConfig::default())
    }

    /// Returns the underlying connection.
    #[must_use]
    pub const fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Returns the shared host state.
    #[must_use]
    pub const fn state(&self) -> &Arc<SessionState> {
        &self.state
    }

    /// Loads an extension; returns false when it was already loaded.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Extension`] when the extension fails to load.
    pub fn load_extension(&self, extension: &dyn Extension) -> Result<bool, SessionError> {
        if self.state.is_extension_loaded(extension.name()) {
            return Ok(false);
        }
        extension.load(self)?;
        Ok(self.state.mark_extension_loaded(extension.name())?)
    }

    /// Returns true when the named extension is loaded.
    #[must_use]
    pub fn is_extension_loaded(&self, name: &str) -> bool {
        self.state.is_extension_loaded(name)
    }

    /// Returns a setting value.
    #[must_use]
    pub fn setting(&self, name: &str) -> Option<String> {
        self.state.setting(name)
    }

    /// Writes a setting value.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Extension`] when the settings lock is poisoned.
    pub fn set_setting(&self, name: &str, value: impl Into<String>) -> Result<(), SessionError> {
        Ok(self.state.set_setting(name, value)?)
    }

    /// Returns the session's secret manager.
    #[must_use]
    pub fn secrets(&self) -> &SecretManager {
        self.state.secrets()
    }

    /// Executes `sql` and fetches every row as owned column values.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Db`] when preparation or execution fails.
    pub fn query_rows(&self, sql: &str) -> Result<Vec<Vec<Value>>, SessionError> {
        let mut statement = self.connection.prepare(sql)?;
        let column_count = statement.column_count();
        let rows = statement
            .query_map([], |row| {
                (0..column_count).map(|index| row.get::<_, Value>(index)).collect()
            })?
            .collect::<Result<Vec<Vec<Value>>, _>>()?;
        Ok(rows)
    }

    /// Executes `sql` and returns the first column of the first row.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Invalid`] when the query returns no rows or
    /// columns, or [`SessionError::Db`] when execution fails.
    pub fn query_scalar(&self, sql: &str) -> Result<Value, SessionError> {
        self.query_rows(sql)?
            .into_iter()
            .next()
            .and_then(|row| row.into_iter().next())
            .ok_or_else(|| SessionError::Invalid("query returned no value".to_string()))
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Registers functions provided by the host itself.
fn register_host_functions(
    connection: &Connection,
    state: &Arc<SessionState>,
) -> Result<(), SessionError> {
    let state = Arc::clone(state);
    connection.create_scalar_function(
        "current_setting",
        1,
        FunctionFlags::SQLITE_UTF8,
        move |ctx| {
            let name: Option<String> = ctx.get(0)?;
            Ok(name.and_then(|name| state.setting(&name)))
        },
    )?;
    Ok(())
}

/// Ensures the parent directory for the database exists.
fn ensure_parent_dir(path: &Path) -> Result<(), SessionError> {
    let Some(parent) = path.parent() else {
        return Err(SessionError::Io("session path missing parent directory".to_string()));
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(parent).map_err(|err| SessionError::Io(err.to_string()))
}

/// Validates database paths for safety limits.
fn validate_session_path(path: &Path) -> Result<(), SessionError> {
    let path_string = path.display().to_string();
    if path_string.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SessionError::Invalid("session path exceeds length limit".to_string()));
    }
    for component in path.components() {
        let name = component.as_os_str().to_string_lossy();
        if name.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SessionError::Invalid(
                "session path contains an overlong component".to_string(),
            ));
        }
    }
    if path.exists() && path.is_dir() {
        return Err(SessionError::Invalid(
            "session path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}
