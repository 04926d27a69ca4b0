// crates/suitebase-db/tests/mount_federation.rs
// ============================================================================
// Module: Mount Federation Tests
// Description: Mounted lookups, id rewriting, and federation guards.
// Purpose: Ensure federated ids resolve to the same items as direct ids.
// Dependencies: suitebase-core, suitebase-db
// ============================================================================

//! ## Overview
//! Integration tests mounting in-memory stores and comparing federated
//! answers with direct answers from the mounted store.

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

use std::sync::Arc;
use std::sync::Mutex;
use std::thread;

use suitebase_core::ExtensionRegistry;
use suitebase_core::Label;
use suitebase_core::LabelClass;
use suitebase_db::Database;
use suitebase_db::DatabaseError;
use suitebase_db::DatabaseObserver;
use suitebase_db::ItemKind;
use suitebase_db::LookupEvent;
use suitebase_db::LookupOutcome;
use suitebase_db::Manifest;
use suitebase_db::MemoryDatabase;
use suitebase_db::MountDatabase;

type TestResult = Result<(), String>;

const CHILD_MANIFEST: &str = r#"{
  "tests": {
    "sub.test1": {
      "kind": "test",
      "class": "command.ExecTest",
      "arguments": [
        { "name": "program", "value": { "text": "/bin/check" } },
        { "name": "prerequisites", "value": { "set": [
          { "tuple": [ { "text": "sub.setup" }, { "enumeral": "PASS" } ] }
        ] } },
        { "name": "resources", "value": { "set": [ { "text": "res.tmp" } ] } }
      ]
    },
    "sub.setup": { "kind": "test", "class": "command.ShellCommandTest" }
  },
  "resources": {
    "res.tmp": {
      "kind": "resource",
      "class": "temporary.TempDirectoryResource"
    }
  },
  "suites": {
    "sub.all": { "test_ids": ["sub.test1"], "suite_ids": [] }
  }
}"#;

fn registry() -> Arc<ExtensionRegistry> {
    Arc::new(ExtensionRegistry::with_builtins().unwrap())
}

fn child(class: LabelClass) -> Arc<dyn Database> {
    let manifest = Manifest::from_json(CHILD_MANIFEST).unwrap();
    Arc::new(MemoryDatabase::from_manifest("child", class, registry(), &manifest).unwrap())
}

fn federation() -> (MountDatabase, Arc<dyn Database>) {
    let inner = child(LabelClass::Dotted);
    let mounts = vec![("m".to_string(), Arc::clone(&inner)), ("n".to_string(), child(LabelClass::Dotted))];
    (MountDatabase::new("fed", LabelClass::Dotted, registry(), mounts).unwrap(), inner)
}

fn names(labels: &[Label]) -> Vec<String> {
    labels.iter().map(|label| label.as_str().to_string()).collect()
}

#[derive(Default)]
struct RecordingObserver {
    events: Mutex<Vec<LookupEvent>>,
}

impl DatabaseObserver for RecordingObserver {
    fn record_lookup(&self, event: LookupEvent) {
        self.events.lock().unwrap().push(event);
    }
}

// ============================================================================
// SECTION: Id Round Trip
// ============================================================================

#[test]
fn mounted_test_matches_direct_lookup_with_prefixed_references() -> TestResult {
    let (fed, inner) = federation();
    let direct = inner.get_test("sub.test1").map_err(|err| err.to_string())?;
    let mounted = fed.get_test("m.sub.test1").map_err(|err| err.to_string())?;
    if mounted.id().as_str() != "m.sub.test1" {
        return Err(format!("unexpected id {}", mounted.id()));
    }
    if mounted.class_name() != direct.class_name() {
        return Err("class names differ".to_string());
    }
    let prerequisites = mounted.prerequisites();
    if prerequisites.len() != 1 || prerequisites[0].test_id != "m.sub.setup" || prerequisites[0].outcome != "PASS" {
        return Err(format!("prerequisites not rewritten: {prerequisites:?}"));
    }
    if mounted.resources() != vec!["m.res.tmp".to_string()] {
        return Err(format!("resources not rewritten: {:?}", mounted.resources()));
    }
    if mounted.arguments().get("program") != direct.arguments().get("program") {
        return Err("plain arguments must not change".to_string());
    }
    Ok(())
}

#[test]
fn mounted_resource_and_suite_are_prefixed() {
    let (fed, _) = federation();
    let resource = fed.get_resource("n.res.tmp").unwrap();
    assert_eq!(resource.id().as_str(), "n.res.tmp");
    let suite = fed.get_suite("m.sub.all").unwrap();
    assert!(!suite.implicit);
    assert_eq!(names(&suite.test_ids), vec!["m.sub.test1"]);
    let mount_root = fed.get_suite("m").unwrap();
    assert!(mount_root.implicit);
    assert_eq!(mount_root.id.as_str(), "m");
    assert_eq!(names(&mount_root.suite_ids), vec!["m.res", "m.sub"]);
}

#[test]
fn not_found_ids_are_relative_to_the_federation() {
    let (fed, _) = federation();
    let err = fed.get_test("m.sub.nope").unwrap_err();
    assert!(matches!(err, DatabaseError::NoSuchItem { kind: ItemKind::Test, ref id } if id == "m.sub.nope"));
    let err = fed.get_test("zz.x").unwrap_err();
    assert!(matches!(err, DatabaseError::NoSuchItem { ref id, .. } if id == "zz.x"));
    let err = fed.get_suite("m.nowhere").unwrap_err();
    assert!(matches!(err, DatabaseError::NoSuchItem { kind: ItemKind::Suite, ref id } if id == "m.nowhere"));
}

// ============================================================================
// SECTION: Root and Listings
// ============================================================================

#[test]
fn root_lists_mount_points() {
    let (fed, _) = federation();
    let root = fed.get_suite("").unwrap();
    assert!(root.implicit);
    assert!(root.test_ids.is_empty());
    assert_eq!(names(&root.suite_ids), vec!["m", "n"]);
    assert_eq!(names(&fed.get_subdirectories("").unwrap()), vec!["m", "n"]);
    assert_eq!(names(&fed.get_ids(ItemKind::Suite, "", false).unwrap()), vec!["m", "n"]);
    assert!(fed.get_ids(ItemKind::Test, "", false).unwrap().is_empty());
}

#[test]
fn recursive_listing_prefixes_every_child_id() {
    let (fed, _) = federation();
    let tests = names(&fed.get_ids(ItemKind::Test, "", true).unwrap());
    assert_eq!(tests, vec!["m.sub.setup", "m.sub.test1", "n.sub.setup", "n.sub.test1"]);
    let in_mount = names(&fed.get_test_ids("m.sub", false).unwrap());
    assert_eq!(in_mount, vec!["m.sub.setup", "m.sub.test1"]);
    assert_eq!(names(&fed.get_subdirectories("m").unwrap()), vec!["res", "sub"]);
}

#[test]
fn expansion_crosses_mount_points() {
    let (fed, _) = federation();
    let expanded = fed.expand_ids(&["m"]).unwrap();
    let tests = names(&expanded.test_ids);
    assert!(tests.contains(&"m.sub.test1".to_string()));
    assert!(tests.iter().all(|id| id.starts_with("m.")));
    assert!(names(&expanded.suite_ids).contains(&"m.sub.all".to_string()));
}

// ============================================================================
// SECTION: Guards
// ============================================================================

#[test]
fn construction_rejects_mismatched_label_classes() {
    let mounts = vec![("m".to_string(), child(LabelClass::Dotted)), ("p".to_string(), child(LabelClass::Path))];
    let err = MountDatabase::new("fed", LabelClass::Dotted, registry(), mounts).err().unwrap();
    assert!(matches!(err, DatabaseError::LabelClassMismatch { ref mount_point, .. } if mount_point == "p"));
}

#[test]
fn construction_rejects_bad_and_duplicate_mount_points() {
    let mounts = vec![("a.b".to_string(), child(LabelClass::Dotted))];
    let err = MountDatabase::new("fed", LabelClass::Dotted, registry(), mounts).err().unwrap();
    assert!(matches!(err, DatabaseError::InvalidMountPoint { .. }));
    let mounts = vec![("m".to_string(), child(LabelClass::Dotted)), ("m".to_string(), child(LabelClass::Dotted))];
    let err = MountDatabase::new("fed", LabelClass::Dotted, registry(), mounts).err().unwrap();
    assert!(matches!(err, DatabaseError::DuplicateMountPoint { .. }));
}

#[test]
fn federation_is_read_only() {
    let (fed, _) = federation();
    assert!(!fed.is_modifiable());
    let suite = fed.get_suite("m.sub.all").unwrap();
    assert!(matches!(fed.write_suite(&suite), Err(DatabaseError::NotModifiable)));
}

// ============================================================================
// SECTION: Observability and Sharing
// ============================================================================

#[test]
fn observer_receives_lookup_outcomes() {
    let observer = Arc::new(RecordingObserver::default());
    let (fed, _) = federation();
    let fed = fed.with_observer(Arc::clone(&observer) as Arc<dyn DatabaseObserver>);
    fed.get_test("m.sub.test1").unwrap();
    let _ = fed.get_test("m.sub.nope");
    let events = observer.events.lock().unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].outcome, LookupOutcome::Found);
    assert_eq!(events[0].database, "mount");
    assert_eq!(events[1].outcome, LookupOutcome::NotFound);
    assert_eq!(events[1].id, "m.sub.nope");
}

#[test]
fn concurrent_lookups_agree() {
    let (fed, _) = federation();
    let fed = Arc::new(fed);
    let handles: Vec<_> = (0 .. 8)
        .map(|index| {
            let fed = Arc::clone(&fed);
            let mount = if index % 2 == 0 { "m" } else { "n" };
            thread::spawn(move || fed.get_test(&format!("{mount}.sub.test1")).unwrap().prerequisites())
        })
        .collect();
    for (index, handle) in handles.into_iter().enumerate() {
        let mount = if index % 2 == 0 { "m" } else { "n" };
        let prerequisites = handle.join().unwrap();
        assert_eq!(prerequisites[0].test_id, format!("{mount}.sub.setup"));
    }
}
