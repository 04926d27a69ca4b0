// crates/suitebase-db/src/database/tests.rs
// ============================================================================
// Module: Database Contract Tests
// Description: Unit tests for the default database methods.
// Purpose: Pin suite expansion order, suppression, and presence checks.
// Dependencies: suitebase-core, suitebase-db
// ============================================================================

//! ## Overview
//! Uses a table-driven database holding suites and test ids only.

// ============================================================================
// SECTION: Lint Configuration
// ============================================================================

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    reason = "Test-only assertions use unwrap/expect for clarity."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use suitebase_core::Arguments;
use suitebase_core::ExtensionRegistry;
use suitebase_core::Label;
use suitebase_core::LabelClass;
use suitebase_core::builtins::SHELL_COMMAND_TEST_CLASS;

use super::Database;
use crate::error::DatabaseError;
use crate::item::Item;
use crate::item::ItemDescriptor;
use crate::item::ItemKind;
use crate::item::ResourceDescriptor;
use crate::item::Suite;
use crate::item::TestDescriptor;

// ============================================================================
// SECTION: Fixture
// ============================================================================

/// Database answering from fixed tables.
struct TableDatabase {
    /// Registry for test descriptors.
    registry: Arc<ExtensionRegistry>,
    /// Known test ids.
    tests: BTreeSet<String>,
    /// Suites keyed by id.
    suites: BTreeMap<String, Suite>,
}

impl TableDatabase {
    /// Creates an empty table.
    fn new() -> Self {
        Self {
            registry: Arc::new(ExtensionRegistry::with_builtins().unwrap()),
            tests: BTreeSet::new(),
            suites: BTreeMap::new(),
        }
    }

    /// Adds test ids.
    fn with_tests(mut self, ids: &[&str]) -> Self {
        self.tests.extend(ids.iter().map(|id| (*id).to_string()));
        self
    }

    /// Adds a suite.
    fn with_suite(mut self, id: &str, implicit: bool, tests: &[&str], suites: &[&str]) -> Self {
        let suite = Suite {
            id: label(id),
            implicit,
            test_ids: tests.iter().map(|id| label(id)).collect(),
            suite_ids: suites.iter().map(|id| label(id)).collect(),
        };
        self.suites.insert(id.to_string(), suite);
        self
    }
}

impl Database for TableDatabase {
    fn path(&self) -> &Path {
        Path::new("")
    }

    fn label_class(&self) -> LabelClass {
        LabelClass::Dotted
    }

    fn registry(&self) -> &Arc<ExtensionRegistry> {
        &self.registry
    }

    fn get_test(&self, id: &str) -> Result<TestDescriptor, DatabaseError> {
        if !self.tests.contains(id) {
            return Err(DatabaseError::no_such(ItemKind::Test, id));
        }
        Ok(TestDescriptor::new(ItemDescriptor::new(
            ItemKind::Test,
            self.parse_label(id)?,
            SHELL_COMMAND_TEST_CLASS,
            Arguments::new(),
            Arc::clone(&self.registry),
        )))
    }

    fn get_resource(&self, id: &str) -> Result<ResourceDescriptor, DatabaseError> {
        Err(DatabaseError::no_such(ItemKind::Resource, id))
    }

    fn get_suite(&self, id: &str) -> Result<Suite, DatabaseError> {
        self.suites.get(id).cloned().ok_or_else(|| DatabaseError::no_such(ItemKind::Suite, id))
    }

    fn get_ids(
        &self,
        kind: ItemKind,
        _directory: &str,
        _recursive: bool,
    ) -> Result<Vec<Label>, DatabaseError> {
        Ok(match kind {
            ItemKind::Test => self.tests.iter().map(|id| label(id)).collect(),
            ItemKind::Suite => self.suites.keys().map(|id| label(id)).collect(),
            ItemKind::Resource => Vec::new(),
        })
    }

    fn get_subdirectories(&self, _directory: &str) -> Result<Vec<Label>, DatabaseError> {
        Ok(Vec::new())
    }
}

/// Parses a dotted label.
fn label(id: &str) -> Label {
    LabelClass::Dotted.parse(id).unwrap()
}

/// Renders labels as strings.
fn names(labels: &[Label]) -> Vec<&str> {
    labels.iter().map(Label::as_str).collect()
}

/// Implicit suite `i` holding test `a`, implicit `i.sub`, and explicit `e`.
fn layered() -> TableDatabase {
    TableDatabase::new()
        .with_tests(&["a", "b", "t1", "t2"])
        .with_suite("i", true, &["a"], &["i.sub", "e"])
        .with_suite("i.sub", true, &["b"], &[])
        .with_suite("e", false, &["t1"], &["e.inner"])
        .with_suite("e.inner", true, &["t2"], &[])
}

// ============================================================================
// SECTION: Suite Expansion
// ============================================================================

#[test]
fn implicit_suite_lists_but_does_not_descend_into_explicit_sub_suite() {
    let db = layered();
    let expanded = db.expand_ids(&["i"]).unwrap();
    assert_eq!(names(&expanded.test_ids), vec!["a", "b"]);
    assert_eq!(names(&expanded.suite_ids), vec!["i", "i.sub", "e"]);
}

#[test]
fn explicit_suite_descends_into_every_sub_suite() {
    let db = layered();
    let expanded = db.expand_ids(&["e"]).unwrap();
    assert_eq!(names(&expanded.test_ids), vec!["t1", "t2"]);
    assert_eq!(names(&expanded.suite_ids), vec!["e", "e.inner"]);
}

#[test]
fn expansion_is_idempotent_and_duplicate_free() {
    let db = layered();
    let once = db.expand_ids(&["i"]).unwrap();
    let twice = db.expand_ids(&["i", "i", "a", "i.sub"]).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn mixed_ids_keep_discovery_order() {
    let db = layered();
    let expanded = db.expand_ids(&["t1", "e", "a"]).unwrap();
    assert_eq!(names(&expanded.test_ids), vec!["t1", "t2", "a"]);
    assert_eq!(names(&expanded.suite_ids), vec!["e", "e.inner"]);
}

#[test]
fn unknown_id_is_invalid() {
    let db = layered();
    let err = db.expand_ids(&["a", "nope"]).unwrap_err();
    assert!(matches!(err, DatabaseError::InvalidId { ref id } if id == "nope"));
    let err = db.expand_ids(&["Bad..Label"]).unwrap_err();
    assert!(matches!(err, DatabaseError::InvalidId { .. }));
}

#[test]
fn cyclic_explicit_suites_terminate() {
    let db = TableDatabase::new()
        .with_tests(&["x"])
        .with_suite("p", false, &["x"], &["q"])
        .with_suite("q", false, &[], &["p"]);
    let expanded = db.expand_ids(&["p"]).unwrap();
    assert_eq!(names(&expanded.test_ids), vec!["x"]);
    assert_eq!(names(&expanded.suite_ids), vec!["p", "q"]);
}

#[test]
fn missing_sub_suite_is_reported() {
    let db = TableDatabase::new().with_suite("s", false, &[], &["gone"]);
    let err = db.expand_ids(&["s"]).unwrap_err();
    assert!(matches!(err, DatabaseError::NoSuchItem { kind: ItemKind::Suite, .. }));
}

// ============================================================================
// SECTION: Presence and Retrieval
// ============================================================================

#[test]
fn presence_checks_treat_invalid_labels_as_absent() {
    let db = layered();
    assert!(db.has_test("a").unwrap());
    assert!(!db.has_test("A").unwrap());
    assert!(db.has_suite("e").unwrap());
    assert!(!db.has_resource("a").unwrap());
}

#[test]
fn get_extension_tries_test_then_resource_then_suite() {
    let db = layered().with_tests(&["e"]);
    assert!(matches!(db.get_extension("e").unwrap(), Some(Item::Test(_))));
    assert!(matches!(db.get_extension("i").unwrap(), Some(Item::Suite(_))));
    assert!(db.get_extension("zzz").unwrap().is_none());
}

#[test]
fn label_helpers_delegate_to_label_class() {
    let db = layered();
    assert_eq!(db.join_labels(&["a", "", "b"]).as_str(), "a.b");
    let (dir, base) = db.split_label("a.b.c").unwrap();
    assert_eq!((dir.as_str(), base.as_str()), ("a.b", "c"));
    let (first, rest) = db.split_label_left("a.b.c").unwrap();
    assert_eq!((first.as_str(), rest.as_str()), ("a", "b.c"));
    assert_eq!(names(&db.get_label_components("a.b.c").unwrap()), vec!["a", "b", "c"]);
    assert!(db.is_valid_label("a", true));
    assert!(matches!(db.parse_label("a..b"), Err(DatabaseError::InvalidLabel(_))));
}

#[test]
fn writes_are_rejected_by_default() {
    let db = layered();
    let suite = db.get_suite("e").unwrap();
    assert!(matches!(db.write_suite(&suite), Err(DatabaseError::NotModifiable)));
    assert!(matches!(db.remove_extension(ItemKind::Test, "a"), Err(DatabaseError::NotModifiable)));
    assert!(!db.is_modifiable());
}
