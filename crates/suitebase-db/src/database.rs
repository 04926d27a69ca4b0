// crates/suitebase-db/src/database.rs
// ============================================================================
// Module: Database Contract
// Description: The database trait, label helpers, and suite expansion.
// Purpose: Define how tests, resources, and suites are looked up and expanded.
// Dependencies: suitebase-core, tracing
// ============================================================================

//! ## Overview
//! [`Database`] is the contract every store implements. Implementors supply
//! item lookup and id listing; the trait supplies label helpers, presence
//! checks, generic retrieval, and suite expansion on top of them.
//!
//! Suite expansion walks suites breadth-first. An implicit suite only
//! descends into implicit sub-suites: explicit sub-suites are listed as
//! members but their contents are not pulled in.
//!
//! Invariants:
//! - Every operation is safe to call concurrently on a shared database.
//! - Expansion output lists each id at most once, in discovery order.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use suitebase_core::Extension;
use suitebase_core::ExtensionRegistry;
use suitebase_core::Label;
use suitebase_core::LabelClass;
use tracing::debug;

use crate::error::DatabaseError;
use crate::item::Item;
use crate::item::ItemKind;
use crate::item::ResourceDescriptor;
use crate::item::Suite;
use crate::item::TestDescriptor;

// ============================================================================
// SECTION: Expanded Ids
// ============================================================================

/// Test and suite ids reachable from a set of ids.
///
/// # Invariants
/// - Each list holds an id at most once when produced by
///   [`Database::expand_ids`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExpandedIds {
    /// Reachable test ids.
    pub test_ids: Vec<Label>,
    /// Reachable suite ids.
    pub suite_ids: Vec<Label>,
}

// ============================================================================
// SECTION: Database Trait
// ============================================================================

/// Store of tests, resources, and suites addressed by labels.
pub trait Database: Send + Sync {
    /// Returns the root path of the store.
    fn path(&self) -> &Path;

    /// Returns the label class used for ids.
    fn label_class(&self) -> LabelClass;

    /// Returns true when the store accepts writes.
    fn is_modifiable(&self) -> bool {
        false
    }

    /// Returns the registry resolving extension classes.
    fn registry(&self) -> &Arc<ExtensionRegistry>;

    /// Looks up a test.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::NoSuchItem`] when no test has `id`.
    fn get_test(&self, id: &str) -> Result<TestDescriptor, DatabaseError>;

    /// Looks up a resource.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::NoSuchItem`] when no resource has `id`.
    fn get_resource(&self, id: &str) -> Result<ResourceDescriptor, DatabaseError>;

    /// Looks up a suite, explicit or implicit.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::NoSuchItem`] when no suite has `id`.
    fn get_suite(&self, id: &str) -> Result<Suite, DatabaseError>;

    /// Lists ids of `kind` located in `directory`, descending into
    /// subdirectories when `recursive` is set.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError`] when `directory` is not a valid label or
    /// the backend fails.
    fn get_ids(
        &self,
        kind: ItemKind,
        directory: &str,
        recursive: bool,
    ) -> Result<Vec<Label>, DatabaseError>;

    /// Lists the immediate subdirectories of `directory` as basenames.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError`] when `directory` is not a valid label or
    /// the backend fails.
    fn get_subdirectories(&self, directory: &str) -> Result<Vec<Label>, DatabaseError>;

    // ------------------------------------------------------------------------
    // Label helpers
    // ------------------------------------------------------------------------

    /// Returns true when `label` is valid for this database.
    fn is_valid_label(&self, label: &str, is_component: bool) -> bool {
        self.label_class().is_valid(label, is_component)
    }

    /// Parses `id` into a label of this database; the empty id is the root.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::InvalidLabel`] for malformed ids.
    fn parse_label(&self, id: &str) -> Result<Label, DatabaseError> {
        Ok(self.label_class().parse(id)?)
    }

    /// Joins `parts` with the label separator, skipping empty parts.
    fn join_labels(&self, parts: &[&str]) -> Label {
        self.label_class().root().join(parts)
    }

    /// Splits `id` into `(directory, basename)`.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::InvalidLabel`] for malformed ids.
    fn split_label(&self, id: &str) -> Result<(Label, Label), DatabaseError> {
        Ok(self.parse_label(id)?.split())
    }

    /// Splits `id` into `(first_component, rest)`.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::InvalidLabel`] for malformed ids.
    fn split_label_left(&self, id: &str) -> Result<(Label, Label), DatabaseError> {
        Ok(self.parse_label(id)?.split_left())
    }

    /// Returns the components of `id` in root-to-leaf order.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::InvalidLabel`] for malformed ids.
    fn get_label_components(&self, id: &str) -> Result<Vec<Label>, DatabaseError> {
        Ok(self.parse_label(id)?.components())
    }

    // ------------------------------------------------------------------------
    // Presence checks
    // ------------------------------------------------------------------------

    /// Returns true when a test has `id`.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError`] for failures other than a missing item.
    fn has_test(&self, id: &str) -> Result<bool, DatabaseError> {
        presence(self.get_test(id))
    }

    /// Returns true when a resource has `id`.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError`] for failures other than a missing item.
    fn has_resource(&self, id: &str) -> Result<bool, DatabaseError> {
        presence(self.get_resource(id))
    }

    /// Returns true when a suite has `id`.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError`] for failures other than a missing item.
    fn has_suite(&self, id: &str) -> Result<bool, DatabaseError> {
        presence(self.get_suite(id))
    }

    // ------------------------------------------------------------------------
    // Id listings
    // ------------------------------------------------------------------------

    /// Lists test ids in `directory`.
    ///
    /// # Errors
    ///
    /// See [`Database::get_ids`].
    fn get_test_ids(&self, directory: &str, recursive: bool) -> Result<Vec<Label>, DatabaseError> {
        self.get_ids(ItemKind::Test, directory, recursive)
    }

    /// Lists resource ids in `directory`.
    ///
    /// # Errors
    ///
    /// See [`Database::get_ids`].
    fn get_resource_ids(
        &self,
        directory: &str,
        recursive: bool,
    ) -> Result<Vec<Label>, DatabaseError> {
        self.get_ids(ItemKind::Resource, directory, recursive)
    }

    /// Lists suite ids in `directory`.
    ///
    /// # Errors
    ///
    /// See [`Database::get_ids`].
    fn get_suite_ids(&self, directory: &str, recursive: bool) -> Result<Vec<Label>, DatabaseError> {
        self.get_ids(ItemKind::Suite, directory, recursive)
    }

    // ------------------------------------------------------------------------
    // Generic retrieval
    // ------------------------------------------------------------------------

    /// Looks up an item of a known kind.
    ///
    /// # Errors
    ///
    /// Returns the error of the kind-specific lookup.
    fn get_item(&self, kind: ItemKind, id: &str) -> Result<Item, DatabaseError> {
        match kind {
            ItemKind::Test => self.get_test(id).map(Item::Test),
            ItemKind::Resource => self.get_resource(id).map(Item::Resource),
            ItemKind::Suite => self.get_suite(id).map(Item::Suite),
        }
    }

    /// Looks up `id` as a test, then a resource, then a suite.
    ///
    /// Returns `Ok(None)` when no item of any kind has `id`.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError`] for failures other than a missing item.
    fn get_extension(&self, id: &str) -> Result<Option<Item>, DatabaseError> {
        for kind in ItemKind::ALL {
            match self.get_item(kind, id) {
                Ok(item) => return Ok(Some(item)),
                Err(err) if err.is_not_found() => {}
                Err(err) => return Err(err),
            }
        }
        Ok(None)
    }

    // ------------------------------------------------------------------------
    // Suite expansion
    // ------------------------------------------------------------------------

    /// Returns every test and suite id reachable from `suite`, excluding
    /// the suite itself.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError`] when a listed sub-suite cannot be loaded.
    fn all_test_and_suite_ids(&self, suite: &Suite) -> Result<ExpandedIds, DatabaseError> {
        collect_suite_members(self, suite)
    }

    /// Expands a mixed list of test and suite ids into every reachable test
    /// id and suite id.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::InvalidId`] for an id that is neither a
    /// suite nor a test, and lookup errors from the suites expanded.
    fn expand_ids(&self, ids: &[&str]) -> Result<ExpandedIds, DatabaseError> {
        let mut expanded = ExpandedIds::default();
        let mut tests_seen = BTreeSet::new();
        let mut suites_seen = BTreeSet::new();
        for id in ids {
            if tests_seen.contains(*id) || suites_seen.contains(*id) {
                continue;
            }
            if self.has_suite(id)? {
                let suite = self.get_suite(id)?;
                suites_seen.insert((*id).to_string());
                expanded.suite_ids.push(suite.id.clone());
                let members = self.all_test_and_suite_ids(&suite)?;
                for test_id in members.test_ids {
                    if tests_seen.insert(test_id.as_str().to_string()) {
                        expanded.test_ids.push(test_id);
                    }
                }
                for suite_id in members.suite_ids {
                    if suites_seen.insert(suite_id.as_str().to_string()) {
                        expanded.suite_ids.push(suite_id);
                    }
                }
            } else if self.has_test(id)? {
                tests_seen.insert((*id).to_string());
                expanded.test_ids.push(self.parse_label(id)?);
            } else {
                return Err(DatabaseError::InvalidId {
                    id: (*id).to_string(),
                });
            }
        }
        debug!(
            requested = ids.len(),
            tests = expanded.test_ids.len(),
            suites = expanded.suite_ids.len(),
            "expanded ids"
        );
        Ok(expanded)
    }

    // ------------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------------

    /// Stores a test or resource instance under `id`.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::NotModifiable`] unless overridden.
    fn write_extension(&self, _id: &str, _extension: &Extension) -> Result<(), DatabaseError> {
        Err(DatabaseError::NotModifiable)
    }

    /// Stores an explicit suite.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::NotModifiable`] unless overridden.
    fn write_suite(&self, _suite: &Suite) -> Result<(), DatabaseError> {
        Err(DatabaseError::NotModifiable)
    }

    /// Removes the item of `kind` stored under `id`.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::NotModifiable`] unless overridden.
    fn remove_extension(&self, _kind: ItemKind, _id: &str) -> Result<(), DatabaseError> {
        Err(DatabaseError::NotModifiable)
    }
}

// ============================================================================
// SECTION: Expansion Helpers
// ============================================================================

/// Collects the transitive members of `suite` using a breadth-first worklist.
///
/// Direct test and suite ids of every visited suite are appended in order.
/// Sub-suites of an implicit suite are only visited when they are implicit
/// themselves; every sub-suite of an explicit suite is visited. A suite is
/// visited at most once, so cyclic suite references terminate.
///
/// # Errors
///
/// Returns [`DatabaseError`] when a listed sub-suite cannot be loaded.
pub fn collect_suite_members<D: Database + ?Sized>(
    database: &D,
    suite: &Suite,
) -> Result<ExpandedIds, DatabaseError> {
    let mut members = ExpandedIds::default();
    let mut visited = BTreeSet::from([suite.id.clone()]);
    let mut work_list = VecDeque::from([suite.clone()]);
    while let Some(current) = work_list.pop_front() {
        members.test_ids.extend(current.test_ids.iter().cloned());
        members.suite_ids.extend(current.suite_ids.iter().cloned());
        for sub_suite_id in &current.suite_ids {
            if visited.contains(sub_suite_id) {
                continue;
            }
            let sub_suite = database.get_suite(sub_suite_id.as_str())?;
            if current.implicit && !sub_suite.implicit {
                continue;
            }
            visited.insert(sub_suite_id.clone());
            work_list.push_back(sub_suite);
        }
    }
    Ok(members)
}

/// Converts a lookup result into a presence flag.
fn presence<T>(result: Result<T, DatabaseError>) -> Result<bool, DatabaseError> {
    match result {
        Ok(_) => Ok(true),
        Err(DatabaseError::NoSuchItem { .. } | DatabaseError::InvalidLabel(_)) => Ok(false),
        Err(err) => Err(err),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests;
