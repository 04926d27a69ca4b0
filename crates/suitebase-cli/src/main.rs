// crates/suitebase-cli/src/main.rs
// ============================================================================
// Module: Suitebase CLI Entry Point
// Description: Command dispatcher for store inspection and descriptor tools.
// Purpose: Provide a small, scriptable front end over the configured store.
// Dependencies: clap, serde, serde_json, suitebase-config, suitebase-core, thiserror, tracing
// ============================================================================

//! ## Overview
//! The `suitebase` binary opens the database described by `suitebase.toml`
//! and lists, shows, or expands its items. Registry commands (`descriptor`,
//! `classes`) work without a config file. Results go to stdout; diagnostics
//! and errors go to stderr.

// ============================================================================
// SECTION: Modules
// ============================================================================

#[cfg(test)]
mod main_tests;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use serde::Serialize;
use suitebase_cli::commands;
use suitebase_cli::logging::init_logging;
use suitebase_config::SuitebaseConfig;
use suitebase_core::ExtensionRegistry;
use suitebase_db::Database;
use suitebase_db::ItemKind;
use thiserror::Error;
use tracing::debug;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "suitebase", version, disable_help_subcommand = true)]
struct Cli {
    /// Config file path (overrides `SUITEBASE_CONFIG`).
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// List item ids in a directory.
    Ls(LsCommand),
    /// Print a test, resource, or suite as JSON.
    Show(ShowCommand),
    /// Expand ids into the tests and suites they cover.
    Expand(ExpandCommand),
    /// Parse and validate a descriptor, printing its element as JSON.
    Descriptor(DescriptorCommand),
    /// List registered extension classes and their fields.
    Classes(ClassesCommand),
}

/// Arguments for `ls`.
#[derive(Args, Debug)]
struct LsCommand {
    /// Item kind to list; all kinds when omitted.
    #[arg(long, value_enum)]
    kind: Option<KindArg>,
    /// Directory to list; the root when omitted.
    #[arg(value_name = "DIR", default_value = "")]
    directory: String,
    /// Include items in subdirectories.
    #[arg(long)]
    recursive: bool,
}

/// Arguments for `show`.
#[derive(Args, Debug)]
struct ShowCommand {
    /// Item id.
    #[arg(value_name = "ID")]
    id: String,
}

/// Arguments for `expand`.
#[derive(Args, Debug)]
struct ExpandCommand {
    /// Test and suite ids.
    #[arg(value_name = "ID", required = true)]
    ids: Vec<String>,
}

/// Arguments for `descriptor`.
#[derive(Args, Debug)]
struct DescriptorCommand {
    /// Descriptor text, e.g. `command.ExecTest(program="/bin/true")`.
    #[arg(value_name = "TEXT")]
    text: String,
}

/// Arguments for `classes`.
#[derive(Args, Debug)]
struct ClassesCommand {
    /// Extension kind to list (`test`, `resource`, ...).
    #[arg(long, value_name = "KIND")]
    kind: Option<String>,
}

/// Item kinds accepted by `ls --kind`.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum KindArg {
    /// Tests.
    Test,
    /// Resources.
    Resource,
    /// Suites.
    Suite,
}

impl From<KindArg> for ItemKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Test => Self::Test,
            KindArg::Resource => Self::Resource,
            KindArg::Suite => Self::Suite,
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for user-facing messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`] from a message.
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
    init_logging();
    match run(Cli::parse()) {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
fn run(cli: Cli) -> CliResult<ExitCode> {
    match cli.command {
        Commands::Ls(command) => command_ls(cli.config, &command),
        Commands::Show(command) => command_show(cli.config, &command),
        Commands::Expand(command) => command_expand(cli.config, &command),
        Commands::Descriptor(command) => command_descriptor(&command),
        Commands::Classes(command) => command_classes(&command),
    }
}

// ============================================================================
// SECTION: Store Commands
// ============================================================================

/// Executes the `ls` command.
fn command_ls(config: Option<PathBuf>, command: &LsCommand) -> CliResult<ExitCode> {
    let database = open_database(config)?;
    match command.kind {
        Some(kind) => {
            let ids = commands::list_ids(
                database.as_ref(),
                kind.into(),
                &command.directory,
                command.recursive,
            )
            .map_err(command_error)?;
            for id in ids {
                write_stdout_line(&id)?;
            }
        }
        None => {
            for kind in ItemKind::ALL {
                let ids = commands::list_ids(
                    database.as_ref(),
                    kind,
                    &command.directory,
                    command.recursive,
                )
                .map_err(command_error)?;
                for id in ids {
                    write_stdout_line(&format!("{kind}\t{id}"))?;
                }
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Executes the `show` command.
fn command_show(config: Option<PathBuf>, command: &ShowCommand) -> CliResult<ExitCode> {
    let database = open_database(config)?;
    let view = commands::show_item(database.as_ref(), &command.id).map_err(command_error)?;
    write_json(&view)?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `expand` command.
fn command_expand(config: Option<PathBuf>, command: &ExpandCommand) -> CliResult<ExitCode> {
    let database = open_database(config)?;
    let expanded = commands::expand(database.as_ref(), &command.ids).map_err(command_error)?;
    write_json(&expanded)?;
    Ok(ExitCode::SUCCESS)
}

/// Loads the config and opens its database.
fn open_database(config: Option<PathBuf>) -> CliResult<Arc<dyn Database>> {
    let config = SuitebaseConfig::load(config.as_deref())
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;
    debug!(
        label_class = config.database.label_class.as_str(),
        mounts = config.mounts.len(),
        parameters = config.parameters.len(),
        "opening database"
    );
    config
        .open_database()
        .map_err(|err| CliError::new(format!("failed to open database: {err}")))
}

// ============================================================================
// SECTION: Registry Commands
// ============================================================================

/// Executes the `descriptor` command.
fn command_descriptor(command: &DescriptorCommand) -> CliResult<ExitCode> {
    let registry = builtin_registry()?;
    let element = commands::resolve_element(&registry, &command.text).map_err(command_error)?;
    write_json(&element)?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `classes` command.
fn command_classes(command: &ClassesCommand) -> CliResult<ExitCode> {
    let kind = command
        .kind
        .as_deref()
        .map(commands::parse_extension_kind)
        .transpose()
        .map_err(command_error)?;
    let registry = builtin_registry()?;
    let classes = commands::list_classes(&registry, kind).map_err(command_error)?;
    write_json(&classes)?;
    Ok(ExitCode::SUCCESS)
}

/// Creates a registry holding the built-in classes.
fn builtin_registry() -> CliResult<ExtensionRegistry> {
    ExtensionRegistry::with_builtins()
        .map_err(|err| CliError::new(format!("failed to load built-in classes: {err}")))
}

// ============================================================================
// SECTION: Output
// ============================================================================

/// Converts a command failure into a CLI error.
fn command_error(err: commands::CommandError) -> CliError {
    CliError::new(err.to_string())
}

/// Writes `value` to stdout as pretty-printed JSON.
fn write_json<T: Serialize>(value: &T) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::new(format!("failed to render json: {err}")))?;
    write_stdout_line(&text)
}

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> CliResult<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
        .map_err(|err| CliError::new(format!("failed to write to stdout: {err}")))
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
