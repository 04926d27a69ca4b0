// crates/suitebase-db/src/observer.rs
// ============================================================================
// Module: Database Observer
// Description: Observability hooks for item lookups.
// Purpose: Report lookup outcomes without tying databases to a metrics stack.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Databases report every item lookup to a [`DatabaseObserver`]. The trait
//! is dependency-light so front ends can count lookups or feed a metrics
//! backend; [`NoopObserver`] discards events.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;

use crate::error::DatabaseError;
use crate::item::ItemKind;

// ============================================================================
// SECTION: Event Labels
// ============================================================================

/// Lookup outcome classification.
///
/// # Invariants
/// - Variants are stable for telemetry labeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LookupOutcome {
    /// The item was found.
    Found,
    /// The item does not exist.
    NotFound,
    /// The lookup failed for another reason.
    Error,
}

impl LookupOutcome {
    /// Returns a stable label for the outcome.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Found => "found",
            Self::NotFound => "not_found",
            Self::Error => "error",
        }
    }

    /// Classifies a lookup result.
    #[must_use]
    pub const fn of<T>(result: &Result<T, DatabaseError>) -> Self {
        match result {
            Ok(_) => Self::Found,
            Err(err) if err.is_not_found() => Self::NotFound,
            Err(_) => Self::Error,
        }
    }
}

/// Lookup event payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LookupEvent {
    /// Stable name of the reporting database type.
    pub database: &'static str,
    /// Kind of item requested.
    pub kind: ItemKind,
    /// Requested id, relative to the reporting database.
    pub id: String,
    /// Lookup outcome.
    pub outcome: LookupOutcome,
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Sink for database lookup events.
pub trait DatabaseObserver: Send + Sync {
    /// Records one lookup.
    fn record_lookup(&self, event: LookupEvent);
}

/// No-op observer.
///
/// # Invariants
/// - Events are intentionally discarded.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl DatabaseObserver for NoopObserver {
    fn record_lookup(&self, _event: LookupEvent) {}
}

/// Reports the outcome of a lookup to `observer` and returns the result.
pub(crate) fn observe<T>(
    observer: &dyn DatabaseObserver,
    database: &'static str,
    kind: ItemKind,
    id: &str,
    result: Result<T, DatabaseError>,
) -> Result<T, DatabaseError> {
    observer.record_lookup(LookupEvent {
        database,
        kind,
        id: id.to_string(),
        outcome: LookupOutcome::of(&result),
    });
    result
}
