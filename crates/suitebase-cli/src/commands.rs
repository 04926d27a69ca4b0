// crates/suitebase-cli/src/commands.rs
// ============================================================================
// Module: CLI Commands
// Description: Store inspection, expansion, descriptor, and class commands.
// Purpose: Produce command results as data for the binary to render.
// Dependencies: serde, serde_json, suitebase-core, suitebase-db, thiserror
// ============================================================================

//! ## Overview
//! Every command is a function from an opened [`Database`] or
//! [`ExtensionRegistry`] to a serializable view:
//! - [`list_ids`] lists item ids in a directory;
//! - [`show_item`] resolves an id to an element or suite view;
//! - [`expand`] expands ids into tests and suites;
//! - [`resolve_element`] validates a descriptor string;
//! - [`list_classes`] describes registered classes and their fields.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;
use suitebase_core::Arguments;
use suitebase_core::ElementError;
use suitebase_core::ExtensionElement;
use suitebase_core::ExtensionKind;
use suitebase_core::ExtensionRegistry;
use suitebase_core::ResolveError;
use suitebase_core::SchemaError;
use suitebase_core::resolve_descriptor;
use suitebase_db::Database;
use suitebase_db::DatabaseError;
use suitebase_db::ExpandedIds;
use suitebase_db::Item;
use suitebase_db::ItemKind;
use suitebase_db::Suite;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Command failures.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Database lookup failed.
    #[error(transparent)]
    Database(#[from] DatabaseError),
    /// Descriptor resolution failed.
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    /// Class lookup failed.
    #[error(transparent)]
    Schema(#[from] SchemaError),
    /// Element encoding failed.
    #[error(transparent)]
    Element(#[from] ElementError),
    /// The id names no test, resource, or suite.
    #[error("no test, resource, or suite named `{id}`")]
    NotFound {
        /// Requested id.
        id: String,
    },
}

// ============================================================================
// SECTION: Views
// ============================================================================

/// Output of the `show` command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ItemView {
    /// A test and its structured element.
    Test {
        /// Test id.
        id: String,
        /// Structured element.
        element: ExtensionElement,
    },
    /// A resource and its structured element.
    Resource {
        /// Resource id.
        id: String,
        /// Structured element.
        element: ExtensionElement,
    },
    /// A suite and its direct members.
    Suite(Suite),
}

/// Field summary in a class listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSummary {
    /// Field name.
    pub name: String,
    /// Accepted values in prose.
    pub accepts: String,
    /// True when the field is filled from context.
    pub computed: bool,
}

/// Class summary in a class listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassSummary {
    /// Qualified class name.
    pub name: String,
    /// Extension kind name.
    pub kind: String,
    /// Class description.
    pub description: String,
    /// Merged fields in schema order.
    pub fields: Vec<FieldSummary>,
}

// ============================================================================
// SECTION: Commands
// ============================================================================

/// Lists the ids of `kind` in `directory`.
///
/// # Errors
///
/// Returns [`CommandError::Database`] when the directory is not a label or
/// the store fails.
pub fn list_ids(
    database: &dyn Database,
    kind: ItemKind,
    directory: &str,
    recursive: bool,
) -> Result<Vec<String>, CommandError> {
    Ok(database
        .get_ids(kind, directory, recursive)?
        .iter()
        .map(|id| id.as_str().to_string())
        .collect())
}

/// Resolves `id` to a test, resource, or suite view.
///
/// # Errors
///
/// Returns [`CommandError::NotFound`] when no item has the id and
/// [`CommandError::Database`] when lookup or encoding fails.
pub fn show_item(database: &dyn Database, id: &str) -> Result<ItemView, CommandError> {
    let item = database.get_extension(id)?.ok_or_else(|| CommandError::NotFound {
        id: id.to_string(),
    })?;
    Ok(match item {
        Item::Test(test) => ItemView::Test {
            id: test.id().as_str().to_string(),
            element: test.element()?,
        },
        Item::Resource(resource) => ItemView::Resource {
            id: resource.id().as_str().to_string(),
            element: resource.element()?,
        },
        Item::Suite(suite) => ItemView::Suite(suite),
    })
}

/// Expands `ids` into tests and suites.
///
/// # Errors
///
/// See [`Database::expand_ids`].
pub fn expand(database: &dyn Database, ids: &[String]) -> Result<ExpandedIds, CommandError> {
    let ids: Vec<&str> = ids.iter().map(String::as_str).collect();
    Ok(database.expand_ids(&ids)?)
}

/// Parses and validates a descriptor, returning its structured element.
///
/// # Errors
///
/// Returns [`CommandError::Resolve`] for malformed descriptors, unknown
/// classes, or invalid arguments.
pub fn resolve_element(
    registry: &ExtensionRegistry,
    descriptor: &str,
) -> Result<ExtensionElement, CommandError> {
    let resolved = resolve_descriptor(registry, descriptor, None)?;
    let extension = resolved
        .instantiate(&Arguments::new())
        .map_err(ResolveError::from)?;
    Ok(ExtensionElement::from_extension(&extension)?)
}

/// Describes registered classes, optionally of one kind.
///
/// # Errors
///
/// Returns [`CommandError::Schema`] when a class schema cannot be computed.
pub fn list_classes(
    registry: &ExtensionRegistry,
    kind: Option<ExtensionKind>,
) -> Result<Vec<ClassSummary>, CommandError> {
    let mut summaries = Vec::new();
    for name in registry.class_names(kind) {
        let class = registry.class(&name)?;
        let schema = registry.class_arguments(&name)?;
        summaries.push(ClassSummary {
            kind: class.kind().as_str().to_string(),
            description: class.description().to_string(),
            fields: schema
                .fields()
                .iter()
                .map(|field| FieldSummary {
                    name: field.name().to_string(),
                    accepts: field.describe(),
                    computed: field.is_computed(),
                })
                .collect(),
            name,
        });
    }
    Ok(summaries)
}

/// Parses an extension kind name.
///
/// # Errors
///
/// Returns [`CommandError::Schema`] for unknown kind names.
pub fn parse_extension_kind(name: &str) -> Result<ExtensionKind, CommandError> {
    Ok(name.parse()?)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
