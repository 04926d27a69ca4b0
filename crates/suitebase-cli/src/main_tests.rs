// crates/suitebase-cli/src/main_tests.rs
// ============================================================================
// Module: CLI Main Tests
// Description: Unit tests for argument parsing in the CLI entry point.
// Purpose: Ensure the command surface parses as documented.
// Dependencies: clap
// ============================================================================

//! ## Overview
//! Parses representative command lines and checks the resulting commands.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;

use clap::CommandFactory;
use clap::Parser;
use suitebase_db::ItemKind;

use super::Cli;
use super::Commands;
use super::KindArg;

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn command_definition_is_consistent() {
    Cli::command().debug_assert();
}

#[test]
fn ls_defaults_to_root_of_all_kinds() {
    let cli = Cli::try_parse_from(["suitebase", "ls"]).unwrap();
    let Commands::Ls(command) = cli.command else {
        panic!("expected ls");
    };
    assert_eq!(command.kind, None);
    assert_eq!(command.directory, "");
    assert!(!command.recursive);
}

#[test]
fn ls_accepts_kind_directory_and_recursion() {
    let cli = Cli::try_parse_from(["suitebase", "--config", "s.toml", "ls", "--kind", "suite", "unit", "--recursive"])
        .unwrap();
    assert_eq!(cli.config.as_deref(), Some(Path::new("s.toml")));
    let Commands::Ls(command) = cli.command else {
        panic!("expected ls");
    };
    assert_eq!(command.kind.map(ItemKind::from), Some(ItemKind::Suite));
    assert_eq!(command.directory, "unit");
    assert!(command.recursive);
}

#[test]
fn config_flag_is_global() {
    let cli = Cli::try_parse_from(["suitebase", "show", "unit.parse", "--config", "other.toml"]).unwrap();
    assert_eq!(cli.config.as_deref(), Some(Path::new("other.toml")));
}

#[test]
fn expand_requires_ids() {
    assert!(Cli::try_parse_from(["suitebase", "expand"]).is_err());
    let cli = Cli::try_parse_from(["suitebase", "expand", "a", "b.c"]).unwrap();
    let Commands::Expand(command) = cli.command else {
        panic!("expected expand");
    };
    assert_eq!(command.ids, vec!["a", "b.c"]);
}

#[test]
fn unknown_ls_kind_is_rejected() {
    assert!(Cli::try_parse_from(["suitebase", "ls", "--kind", "widget"]).is_err());
    assert_eq!(ItemKind::from(KindArg::Resource), ItemKind::Resource);
}
