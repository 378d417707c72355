// aws-extension-sqlite/src/lib.rs
// ============================================================================
// Module: AWS Extension for SQLite
// Description: In-process SQL session host and the `aws` extension.
// Purpose: Register the AWS extension's SQL functions on a SQLite connection.
// Dependencies: aws-extension-core, aws-extension-credentials, rusqlite
// ============================================================================

//! ## Overview
//! A [`Session`] wraps an in-process `SQLite` connection together with the
//! host facilities extensions rely on: a settings map, the set of loaded
//! extensions, and a [`SecretManager`]. [`AwsExtension`] registers the SQL
//! surface on a session:
//!
//! - `aws(name)`
//! - `load_aws_credentials([profile])`
//! - `create_aws_secret(name, type, options [, on_conflict])`
//! - `drop_aws_secret(name)`
//! - `which_aws_secret(path, type)`
//! - `aws_secret_string(name)`
//!
//! ```no_run
//! use aws_extension_sqlite::Session;
//! use aws_extension_sqlite::aws_init;
//!
//! # fn main() -> Result<(), aws_extension_sqlite::SessionError> {
//! let session = Session::open_in_memory()?;
//! aws_init(&session)?;
//! let rows = session.query_rows("SELECT aws('Sam') as value;")?;
//! # let _ = rows;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod error;
pub mod events;
pub mod extension;
mod functions;
pub mod secrets;
pub mod session;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use error::ExtensionError;
pub use error::SessionError;
pub use events::EventOutcome;
pub use events::ExtensionEvent;
pub use events::ExtensionEventParams;
pub use events::ExtensionEventSink;
pub use events::FileEventSink;
pub use events::NoopEventSink;
pub use events::StderrEventSink;
pub use events::sink_from_config;
pub use extension::AwsExtension;
pub use extension::AwsExtensionOptions;
pub use extension::aws_init;
pub use secrets::SecretManager;
pub use secrets::SecretStoreError;
pub use session::Extension;
pub use session::Session;
pub use session::SessionState;
