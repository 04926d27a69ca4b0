// crates/suitebase-config/src/lib.rs
// ============================================================================
// Module: Suitebase Config Library
// Description: Canonical config model, validation, and database wiring.
// Purpose: Single source of truth for suitebase.toml semantics.
// Dependencies: serde, suitebase-core, suitebase-db, toml
// ============================================================================

//! ## Overview
//! `suitebase-config` defines the configuration model for Suitebase tools.
//! It loads `suitebase.toml` with strict, fail-closed guards and opens the
//! configured database stack: a manifest store or a mount federation,
//! optionally wrapped by static parameters.
//!
//! Security posture: config inputs are untrusted.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod examples;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use examples::config_toml_example;
