// aws-extension-cli/src/main.rs
// ============================================================================
// Module: AWS Extension CLI Entry Point
// Description: Command dispatcher for running SQL against an extension session.
// Purpose: Exercise the extension from a shell without embedding it.
// Dependencies: aws-extension-config, aws-extension-sqlite, clap, serde_json
// ============================================================================

//! ## Overview
//! `aws-extension query <SQL>` opens a session from configuration, loads the
//! `aws` extension, executes the statement, and prints each row as a JSON
//! array on stdout. `aws-extension version` prints the extension, crate, and
//! `SQLite` versions. Errors go to stderr and produce a failing exit code.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use aws_extension_config::AwsExtensionConfig;
use aws_extension_config::CONFIG_ENV_VAR;
use aws_extension_config::DEFAULT_CONFIG_NAME;
use aws_extension_sqlite::AwsExtension;
use aws_extension_sqlite::Session;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use rusqlite::types::Value;
use serde_json::Value as JsonValue;
use thiserror::Error;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "aws-extension", disable_help_subcommand = true)]
struct Cli {
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a SQL statement with the extension loaded.
    Query(QueryCommand),
    /// Print version information.
    Version,
}

/// Arguments for the `query` command.
#[derive(Args, Debug)]
struct QueryCommand {
    /// SQL statement to execute.
    sql: String,
    /// Path to the configuration file.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Print the session settings (sensitive values redacted) after the rows.
    #[arg(long)]
    show_settings: bool,
    /// Allow `load_aws_credentials` without an `httpfs` extension.
    ///
    /// The CLI session never registers `httpfs`, so credential loading fails
    /// unless this flag is set or the config has
    /// `[extensions] require_httpfs = false`.
    #[arg(long)]
    skip_httpfs_check: bool,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
fn run(cli: Cli) -> CliResult<ExitCode> {
    match cli.command {
        Commands::Query(command) => command_query(&command),
        Commands::Version => command_version(),
    }
}

// ============================================================================
// SECTION: Commands
// ============================================================================

/// Executes the `query` command.
fn command_query(command: &QueryCommand) -> CliResult<ExitCode> {
    let mut config = load_config(command.config.as_deref())?;
    if command.skip_httpfs_check {
        config.extensions.require_httpfs = false;
    }
    let session = Session::open(&config.session)
        .map_err(|err| CliError::new(format!("failed to open session: {err}")))?;
    let extension = AwsExtension::from_config(&config)
        .map_err(|err| CliError::new(format!("failed to build extension: {err}")))?;
    session
        .load_extension(&extension)
        .map_err(|err| CliError::new(format!("failed to load extension: {err}")))?;

    let rows = session.query_rows(&command.sql).map_err(|err| CliError::new(err.to_string()))?;
    for row in rows {
        let line = JsonValue::Array(row.into_iter().map(value_to_json).collect());
        write_stdout_line(&line.to_string())
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    }
    if command.show_settings {
        let settings = serde_json::to_string(&session.state().redacted_settings())
            .map_err(|err| CliError::new(format!("failed to render settings: {err}")))?;
        write_stdout_line(&settings).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    }
    Ok(ExitCode::SUCCESS)
}

/// Executes the `version` command.
fn command_version() -> CliResult<ExitCode> {
    let line = format!(
        "{} {} (sqlite {})",
        AwsExtension::NAME,
        env!("CARGO_PKG_VERSION"),
        AwsExtension::library_version()
    );
    write_stdout_line(&line).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Loads configuration, falling back to defaults when no file is present.
fn load_config(path: Option<&Path>) -> CliResult<AwsExtensionConfig> {
    let explicit = path.is_some() || std::env::var_os(CONFIG_ENV_VAR).is_some();
    if !explicit && !Path::new(DEFAULT_CONFIG_NAME).exists() {
        return Ok(AwsExtensionConfig::default());
    }
    AwsExtensionConfig::load(path).map_err(|err| CliError::new(err.to_string()))
}

/// Converts a SQL value into JSON for row output.
fn value_to_json(value: Value) -> JsonValue {
    match value {
        Value::Null => JsonValue::Null,
        Value::Integer(number) => JsonValue::from(number),
        Value::Real(number) => {
            serde_json::Number::from_f64(number).map_or(JsonValue::Null, JsonValue::Number)
        }
        Value::Text(text) => JsonValue::String(text),
        Value::Blob(bytes) => JsonValue::String(hex_literal(&bytes)),
    }
}

/// Renders bytes as a SQL blob literal.
fn hex_literal(bytes: &[u8]) -> String {
    let digits: String = bytes.iter().map(|byte| format!("{byte:02x}")).collect();
    format!("x'{digits}'")
}

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("failed to write to {stream}: {error}")
}

/// Emits an error message and returns a failing exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
