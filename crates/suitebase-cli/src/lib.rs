// crates/suitebase-cli/src/lib.rs
// ============================================================================
// Module: Suitebase CLI Library
// Description: Shared helpers for the Suitebase command-line interface.
// Purpose: Keep command logic testable outside the binary entry point.
// Dependencies: suitebase-core, suitebase-db, serde, tracing-subscriber
// ============================================================================

//! ## Overview
//! This library houses the command implementations behind the `suitebase`
//! binary. Each command takes an opened database or registry and returns
//! plain data; the binary only parses arguments and writes output.
//!
//! Security posture: CLI inputs are untrusted and must be validated.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod commands;
pub mod logging;
