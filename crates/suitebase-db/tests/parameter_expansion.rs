// crates/suitebase-db/tests/parameter_expansion.rs
// ============================================================================
// Module: Parameter Database Tests
// Description: Parametrized tests, synthetic suites, and expansion.
// Purpose: Pin label disambiguation and argument overlay for variants.
// Dependencies: suitebase-core, suitebase-db, proptest
// ============================================================================

//! ## Overview
//! Integration tests wrapping an in-memory store with static parameters,
//! plus property checks on suite expansion.

// ============================================================================
// SECTION: Test Support
// ============================================================================

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
    reason = "Test-only assertions and helpers are permitted."
)]

use std::collections::BTreeSet;
use std::sync::Arc;

use proptest::prelude::*;
use suitebase_core::ExtensionRegistry;
use suitebase_core::FieldValue;
use suitebase_core::Label;
use suitebase_core::LabelClass;
use suitebase_db::Database;
use suitebase_db::DatabaseError;
use suitebase_db::Manifest;
use suitebase_db::MemoryDatabase;
use suitebase_db::ParameterDatabase;
use suitebase_db::StaticParameters;

type TestResult = Result<(), String>;

const MANIFEST: &str = r#"{
  "tests": {
    "t": {
      "kind": "test",
      "class": "command.ShellCommandTest",
      "arguments": [ { "name": "command", "value": { "text": "run" } } ]
    },
    "plain": { "kind": "test", "class": "command.ShellCommandTest" },
    "lib.a": { "kind": "test", "class": "command.ShellCommandTest" },
    "lib.b": { "kind": "test", "class": "command.ShellCommandTest" }
  },
  "suites": {
    "group": { "test_ids": ["t", "plain"] },
    "nested": { "test_ids": ["lib.a"], "suite_ids": ["group", "lib"] }
  }
}"#;

fn store() -> Arc<dyn Database> {
    let registry = Arc::new(ExtensionRegistry::with_builtins().unwrap());
    let manifest = Manifest::from_json(MANIFEST).unwrap();
    Arc::new(MemoryDatabase::from_manifest("params", LabelClass::Dotted, registry, &manifest).unwrap())
}

fn parameters() -> StaticParameters {
    StaticParameters::new()
        .with_parameter("t", "fast", [("exit_code", "1")])
        .with_parameter("t", "slow", [("command", "run --slow")])
        .with_parameter("group", "fast", Vec::<(String, String)>::new())
}

fn database() -> ParameterDatabase<StaticParameters> {
    ParameterDatabase::new(store(), parameters())
}

fn names(labels: &[Label]) -> Vec<String> {
    labels.iter().map(|label| label.as_str().to_string()).collect()
}

// ============================================================================
// SECTION: Disambiguation
// ============================================================================

#[test]
fn parametrized_test_is_suite_and_variants_are_tests() -> TestResult {
    let db = database();
    let checks = [
        ("has_suite(t)", db.has_suite("t")),
        ("has_test(t.fast)", db.has_test("t.fast")),
        ("has_test(t.slow)", db.has_test("t.slow")),
        ("has_test(plain)", db.has_test("plain")),
    ];
    for (name, result) in checks {
        if !result.map_err(|err| err.to_string())? {
            return Err(format!("{name} must hold"));
        }
    }
    if db.has_test("t.medium").map_err(|err| err.to_string())? {
        return Err("unknown parameter must not resolve".to_string());
    }
    if db.has_suite("plain.fast").map_err(|err| err.to_string())? {
        return Err("parameters are per test".to_string());
    }
    Ok(())
}

#[test]
fn variant_overlays_parameter_arguments() {
    let db = database();
    let fast = db.get_test("t.fast").unwrap();
    assert_eq!(fast.id().as_str(), "t.fast");
    assert_eq!(fast.arguments().get("command"), Some(&FieldValue::text("run")));
    assert_eq!(fast.arguments().get("exit_code"), Some(&FieldValue::Integer(1)));
    let slow = db.get_test("t.slow").unwrap();
    assert_eq!(slow.arguments().get("command"), Some(&FieldValue::text("run --slow")));
    assert_eq!(slow.arguments().get("exit_code"), None);
    assert_eq!(slow.get_instance().unwrap().argument("item_id"), Some(&FieldValue::text("t.slow")));
}

#[test]
fn invalid_parameter_arguments_are_reported() {
    let params = StaticParameters::new().with_parameter("t", "broken", [("exit_code", "many")]);
    let db = ParameterDatabase::new(store(), params);
    assert!(matches!(db.get_test("t.broken"), Err(DatabaseError::Argument(_))));
}

#[test]
fn unparametrized_ids_fall_through_to_child() {
    let db = database();
    assert_eq!(db.get_test("plain").unwrap().id().as_str(), "plain");
    assert!(matches!(db.get_test("nope"), Err(DatabaseError::NoSuchItem { .. })));
    assert!(matches!(db.get_suite("nope"), Err(DatabaseError::NoSuchItem { .. })));
}

// ============================================================================
// SECTION: Suites
// ============================================================================

#[test]
fn implicit_parameter_suite_lists_variants() {
    let db = database();
    let suite = db.get_suite("t").unwrap();
    assert!(suite.implicit);
    assert_eq!(names(&suite.test_ids), vec!["t.fast", "t.slow"]);
    assert!(suite.suite_ids.is_empty());
}

#[test]
fn wrapper_suite_turns_parametrized_tests_into_sub_suites() {
    let db = database();
    let group = db.get_suite("group").unwrap();
    assert!(!group.implicit);
    assert_eq!(names(&group.test_ids), vec!["plain"]);
    assert_eq!(names(&group.suite_ids), vec!["t"]);
}

#[test]
fn parameter_suite_joins_members_with_parameter() {
    let db = database();
    let suite = db.get_suite("group.fast").unwrap();
    assert_eq!(names(&suite.test_ids), vec!["t.fast", "plain.fast"]);
    assert!(db.has_suite("group.fast").unwrap());
}

#[test]
fn wrapper_expansion_replaces_tests_with_variants() {
    let db = database();
    let expanded = db.expand_ids(&["group"]).unwrap();
    assert_eq!(names(&expanded.test_ids), vec!["t.fast", "t.slow", "plain"]);
    assert_eq!(names(&expanded.suite_ids), vec!["group", "t"]);
}

#[test]
fn listings_reflect_the_parameter_view() {
    let db = database();
    assert_eq!(names(&db.get_test_ids("", true).unwrap()), vec!["lib.a", "lib.b", "plain", "t.fast", "t.slow"]);
    assert_eq!(names(&db.get_test_ids("", false).unwrap()), vec!["plain"]);
    assert_eq!(names(&db.get_test_ids("t", false).unwrap()), vec!["t.fast", "t.slow"]);
    assert_eq!(names(&db.get_suite_ids("", false).unwrap()), vec!["group", "group.fast", "lib", "nested", "t"]);
    assert_eq!(names(&db.get_subdirectories("").unwrap()), vec!["lib", "t"]);
    assert!(db.get_subdirectories("t").unwrap().is_empty());
}

// ============================================================================
// SECTION: Expansion Properties
// ============================================================================

const IDS: [&str; 10] = ["", "t", "t.fast", "t.slow", "plain", "group", "group.fast", "nested", "lib", "lib.a"];

proptest! {
    #[test]
    fn expansion_is_idempotent(picks in prop::collection::vec(0 .. IDS.len(), 1 .. 8)) {
        let db = database();
        let ids: Vec<&str> = picks.iter().map(|index| IDS[*index]).collect();
        let doubled: Vec<&str> = ids.iter().chain(ids.iter()).copied().collect();
        let once = db.expand_ids(&ids).unwrap();
        let twice = db.expand_ids(&doubled).unwrap();
        prop_assert_eq!(&once, &twice);
        let unique_tests: BTreeSet<&str> = once.test_ids.iter().map(Label::as_str).collect();
        prop_assert_eq!(unique_tests.len(), once.test_ids.len());
        let unique_suites: BTreeSet<&str> = once.suite_ids.iter().map(Label::as_str).collect();
        prop_assert_eq!(unique_suites.len(), once.suite_ids.len());
    }
}
