// crates/suitebase-db/src/error.rs
// ============================================================================
// Module: Database Errors
// Description: Error taxonomy shared by every database implementation.
// Purpose: Report lookup, label, and federation failures with structured data.
// Dependencies: suitebase-core, thiserror
// ============================================================================

//! ## Overview
//! Every backend reports failures through [`DatabaseError`]. Not-found
//! failures carry the item kind and the offending id so that federating
//! databases can rewrite the id before re-raising.

// ============================================================================
// SECTION: Imports
// ============================================================================

use suitebase_core::ArgumentError;
use suitebase_core::ElementError;
use suitebase_core::LabelClass;
use suitebase_core::LabelError;
use suitebase_core::SchemaError;
use thiserror::Error;

use crate::item::ItemKind;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors produced by database operations.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - `NoSuchItem` ids are relative to the database that returned the error.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// No item of `kind` exists under `id`.
    #[error("no such {kind}: `{id}`")]
    NoSuchItem {
        /// Kind of the missing item.
        kind: ItemKind,
        /// Offending id.
        id: String,
    },
    /// An id is not a valid label.
    #[error(transparent)]
    InvalidLabel(#[from] LabelError),
    /// Suite expansion met an id that is neither a test nor a suite.
    #[error("`{id}` is neither a test nor a suite")]
    InvalidId {
        /// Offending id.
        id: String,
    },
    /// A mounted database uses a different label class.
    #[error("database mounted at `{mount_point}` uses {found} labels, expected {expected}")]
    LabelClassMismatch {
        /// Mount point of the offending database.
        mount_point: String,
        /// Label class of the federation.
        expected: LabelClass,
        /// Label class of the mounted database.
        found: LabelClass,
    },
    /// A mount point is not a single valid label component.
    #[error("invalid mount point: `{mount_point}`")]
    InvalidMountPoint {
        /// Offending mount point.
        mount_point: String,
    },
    /// A mount point was given twice.
    #[error("duplicate mount point: `{mount_point}`")]
    DuplicateMountPoint {
        /// Offending mount point.
        mount_point: String,
    },
    /// A write was attempted on a read-only database.
    #[error("database is not modifiable")]
    NotModifiable,
    /// An extension class could not be resolved.
    #[error(transparent)]
    Schema(#[from] SchemaError),
    /// Stored or supplied arguments were rejected.
    #[error(transparent)]
    Argument(#[from] ArgumentError),
    /// A stored element could not be decoded.
    #[error(transparent)]
    Element(#[from] ElementError),
    /// The storage backend failed.
    #[error("storage backend failure: {0}")]
    Backend(String),
}

impl DatabaseError {
    /// Builds a not-found error for `kind` and `id`.
    #[must_use]
    pub fn no_such(kind: ItemKind, id: impl Into<String>) -> Self {
        Self::NoSuchItem {
            kind,
            id: id.into(),
        }
    }

    /// Returns true for not-found errors.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NoSuchItem { .. })
    }

    /// Returns the error with its not-found id rewritten by `rewrite`.
    ///
    /// Other variants are returned unchanged.
    #[must_use]
    pub fn map_missing_id(self, rewrite: impl FnOnce(&str) -> String) -> Self {
        match self {
            Self::NoSuchItem {
                kind,
                id,
            } => Self::NoSuchItem {
                kind,
                id: rewrite(&id),
            },
            other => other,
        }
    }
}
