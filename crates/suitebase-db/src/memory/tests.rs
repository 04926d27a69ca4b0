// crates/suitebase-db/src/memory/tests.rs
// ============================================================================
// Module: Memory Store Tests
// Description: Unit tests for the in-memory store and manifests.
// Purpose: Pin directory suites, listings, writes, and manifest parsing.
// Dependencies: suitebase-core, suitebase-db, tempfile
// ============================================================================

//! ## Overview
//! Builds a small manifest-backed store and queries it through the
//! database contract.

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

use std::fs;
use std::sync::Arc;

use suitebase_core::Arguments;
use suitebase_core::ExtensionRegistry;
use suitebase_core::FieldValue;
use suitebase_core::Label;
use suitebase_core::LabelClass;
use suitebase_core::builtins::EXEC_TEST_CLASS;
use suitebase_core::builtins::TEMP_DIRECTORY_RESOURCE_CLASS;

use super::Manifest;
use super::MemoryDatabase;
use super::MemoryStore;
use crate::database::Database;
use crate::error::DatabaseError;
use crate::item::ItemKind;
use crate::item::Suite;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Manifest with tests in two directories, a resource, and one suite.
const MANIFEST: &str = r#"{
  "tests": {
    "unit.parse": {
      "kind": "test",
      "class": "command.ExecTest",
      "arguments": [
        { "name": "program", "value": { "text": "/bin/parse" } },
        { "name": "resources", "value": { "set": [ { "text": "fixtures.tmp" } ] } }
      ]
    },
    "unit.deep.lex": { "kind": "test", "class": "command.ExecTest" },
    "smoke": { "kind": "test", "class": "command.ShellCommandTest" }
  },
  "resources": {
    "fixtures.tmp": { "kind": "resource", "class": "temporary.TempDirectoryResource" }
  },
  "suites": {
    "unit.quick": { "test_ids": ["unit.parse", "smoke"] }
  }
}"#;

/// Opens the sample manifest.
fn database() -> MemoryDatabase {
    let registry = Arc::new(ExtensionRegistry::with_builtins().unwrap());
    let manifest = Manifest::from_json(MANIFEST).unwrap();
    MemoryDatabase::from_manifest("mem", LabelClass::Dotted, registry, &manifest).unwrap()
}

/// Renders labels as strings.
fn names(labels: &[Label]) -> Vec<&str> {
    labels.iter().map(Label::as_str).collect()
}

// ============================================================================
// SECTION: Lookups
// ============================================================================

#[test]
fn tests_decode_through_registry() {
    let db = database();
    let test = db.get_test("unit.parse").unwrap();
    assert_eq!(test.class_name(), EXEC_TEST_CLASS);
    assert_eq!(test.arguments().get("program"), Some(&FieldValue::text("/bin/parse")));
    assert_eq!(test.resources(), vec!["fixtures.tmp"]);
    let resource = db.get_resource("fixtures.tmp").unwrap();
    assert_eq!(resource.class_name(), TEMP_DIRECTORY_RESOURCE_CLASS);
}

#[test]
fn missing_items_report_kind_and_id() {
    let db = database();
    let err = db.get_test("unit.nope").unwrap_err();
    assert!(matches!(err, DatabaseError::NoSuchItem { kind: ItemKind::Test, ref id } if id == "unit.nope"));
    assert!(matches!(db.get_test("fixtures.tmp"), Err(DatabaseError::NoSuchItem { .. })));
    assert!(matches!(db.get_test(""), Err(DatabaseError::NoSuchItem { .. })));
}

#[test]
fn root_and_directories_are_implicit_suites() {
    let db = database();
    let root = db.get_suite("").unwrap();
    assert!(root.implicit);
    assert_eq!(names(&root.test_ids), vec!["smoke"]);
    assert_eq!(names(&root.suite_ids), vec!["fixtures", "unit"]);
    let unit = db.get_suite("unit").unwrap();
    assert!(unit.implicit);
    assert_eq!(names(&unit.test_ids), vec!["unit.parse"]);
    assert_eq!(names(&unit.suite_ids), vec!["unit.deep", "unit.quick"]);
    assert!(!db.has_suite("nowhere").unwrap());
}

#[test]
fn explicit_suite_is_loaded_verbatim() {
    let db = database();
    let quick = db.get_suite("unit.quick").unwrap();
    assert!(!quick.implicit);
    assert_eq!(names(&quick.test_ids), vec!["unit.parse", "smoke"]);
}

#[test]
fn listings_honor_recursion() {
    let db = database();
    assert_eq!(names(&db.get_test_ids("unit", false).unwrap()), vec!["unit.parse"]);
    assert_eq!(names(&db.get_test_ids("unit", true).unwrap()), vec!["unit.deep.lex", "unit.parse"]);
    assert_eq!(names(&db.get_suite_ids("", true).unwrap()), vec!["fixtures", "unit", "unit.deep", "unit.quick"]);
    assert_eq!(names(&db.get_subdirectories("").unwrap()), vec!["fixtures", "unit"]);
    assert_eq!(names(&db.get_subdirectories("unit").unwrap()), vec!["deep"]);
}

#[test]
fn expanding_root_skips_explicit_suite_contents() {
    let db = database();
    let expanded = db.expand_ids(&[""]).unwrap();
    assert_eq!(names(&expanded.test_ids), vec!["smoke", "unit.parse", "unit.deep.lex"]);
    assert!(expanded.suite_ids.iter().any(|id| id.as_str() == "unit.quick"));
}

// ============================================================================
// SECTION: Writes
// ============================================================================

#[test]
fn writes_round_trip_through_store() {
    let db = database();
    let mut explicit = Arguments::new();
    explicit.insert("program".to_string(), FieldValue::text("/bin/new"));
    let extension = db.registry().instantiate(EXEC_TEST_CLASS, &explicit, &Arguments::new()).unwrap();
    db.write_extension("unit.fresh", &extension).unwrap();
    let stored = db.get_test("unit.fresh").unwrap();
    assert_eq!(stored.arguments().get("program"), Some(&FieldValue::text("/bin/new")));
    db.remove_extension(ItemKind::Test, "unit.fresh").unwrap();
    assert!(!db.has_test("unit.fresh").unwrap());
    assert!(matches!(
        db.remove_extension(ItemKind::Test, "unit.fresh"),
        Err(DatabaseError::NoSuchItem { .. })
    ));
}

#[test]
fn implicit_suites_and_read_only_stores_reject_writes() {
    let db = database();
    let unit = db.get_suite("unit").unwrap();
    assert!(matches!(db.write_suite(&unit), Err(DatabaseError::NotModifiable)));
    let suite = Suite::explicit(
        LabelClass::Dotted.parse("all").unwrap(),
        vec![LabelClass::Dotted.parse("smoke").unwrap()],
        Vec::new(),
    );
    db.write_suite(&suite).unwrap();
    assert_eq!(db.get_suite("all").unwrap(), suite);
    let read_only = database().read_only();
    assert!(matches!(read_only.write_suite(&suite), Err(DatabaseError::NotModifiable)));
}

// ============================================================================
// SECTION: Manifests
// ============================================================================

#[test]
fn manifest_rejects_invalid_ids_and_unknown_sections() {
    let bad_id = r#"{ "tests": { "Bad": { "kind": "test", "class": "command.ExecTest" } } }"#;
    let manifest = Manifest::from_json(bad_id).unwrap();
    assert!(matches!(
        MemoryStore::from_manifest(LabelClass::Dotted, &manifest),
        Err(DatabaseError::InvalidLabel(_))
    ));
    assert!(Manifest::from_json(r#"{ "widgets": {} }"#).is_err());
}

#[test]
fn manifest_file_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");
    let manifest = Manifest::from_json(MANIFEST).unwrap();
    fs::write(&path, manifest.to_json().unwrap()).unwrap();
    let registry = Arc::new(ExtensionRegistry::with_builtins().unwrap());
    let db = MemoryDatabase::open_manifest(&path, LabelClass::Dotted, registry).unwrap();
    assert_eq!(db.backend().to_manifest(), manifest);
    assert_eq!(db.path(), path.as_path());
}
