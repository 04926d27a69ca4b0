// crates/suitebase-core/src/label/tests.rs
// ============================================================================
// Module: Label Tests
// Description: Unit tests for label validation, splitting, and normalization.
// Purpose: Pin the label algebra used by every database.
// Dependencies: suitebase-core
// ============================================================================

//! ## Overview
//! Exercises dotted labels, the root label, and the `thunk` normalizer.

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

use super::LabelClass;
use super::LabelError;
use super::thunk;

// ============================================================================
// SECTION: Validation
// ============================================================================

#[test]
fn dotted_rejects_leading_and_doubled_separators() {
    let class = LabelClass::Dotted;
    assert!(!class.is_valid(".x", false));
    assert!(!class.is_valid("a..b", false));
    assert!(!class.is_valid("a.", false));
    assert!(!class.is_valid("", false));
    assert!(class.is_valid("a.b", false));
    assert!(class.is_valid("test_1", true));
}

#[test]
fn component_rejects_separator() {
    assert!(!LabelClass::Dotted.is_valid("a.b", true));
    let sep = LabelClass::Path.separator();
    assert!(!LabelClass::Path.is_valid(&format!("a{sep}b"), true));
    assert!(LabelClass::Path.is_valid(&format!("a{sep}b"), false));
}

#[test]
fn path_class_rejects_leading_and_doubled_separators() {
    let sep = LabelClass::Path.separator();
    assert!(!LabelClass::Path.is_valid(&format!("{sep}x"), false));
    assert!(!LabelClass::Path.is_valid(&format!("a{sep}{sep}b"), false));
    assert!(LabelClass::Path.is_valid("Mixed Case", true));
}

#[test]
fn dotted_rejects_uppercase() {
    let err = LabelClass::Dotted.parse("Abc").unwrap_err();
    assert!(matches!(err, LabelError::Invalid { .. }));
}

#[test]
fn parse_accepts_root() {
    let root = LabelClass::Dotted.parse("").unwrap();
    assert!(root.is_root());
    assert!(root.components().is_empty());
}

// ============================================================================
// SECTION: Algebra
// ============================================================================

#[test]
fn split_and_split_left() {
    let label = LabelClass::Dotted.parse("a.b.c").unwrap();
    let (dir, base) = label.split();
    assert_eq!(dir.as_str(), "a.b");
    assert_eq!(base.as_str(), "c");
    let (first, rest) = label.split_left();
    assert_eq!(first.as_str(), "a");
    assert_eq!(rest.as_str(), "b.c");
}

#[test]
fn single_component_split_round_trips() {
    let label = LabelClass::Dotted.parse("a").unwrap();
    let (dir, base) = label.split();
    assert!(dir.is_root());
    assert_eq!(dir.join([base.as_str()]), label);
    let (first, rest) = label.split_left();
    assert!(rest.is_root());
    assert_eq!(first.join([rest.as_str()]), label);
}

#[test]
fn components_are_root_to_leaf() {
    let label = LabelClass::Dotted.parse("x.y.z").unwrap();
    let parts: Vec<String> = label.components().iter().map(ToString::to_string).collect();
    assert_eq!(parts, vec!["x", "y", "z"]);
}

#[test]
fn join_skips_empty_parts() {
    let root = LabelClass::Dotted.root();
    assert_eq!(root.join(["", "a", "", "b"]).as_str(), "a.b");
}

#[test]
fn prefix_and_relative() {
    let dir = LabelClass::Dotted.parse("a.b").unwrap();
    let inner = LabelClass::Dotted.parse("a.b.c").unwrap();
    let sibling = LabelClass::Dotted.parse("a.bc").unwrap();
    assert!(dir.is_prefix_of(&inner));
    assert!(dir.is_prefix_of(&dir));
    assert!(!dir.is_prefix_of(&sibling));
    assert_eq!(inner.relative_to(&dir).unwrap().as_str(), "c");
    assert!(sibling.relative_to(&dir).is_none());
    assert_eq!(inner.relative_to(&LabelClass::Dotted.root()).unwrap(), inner);
}

#[test]
fn reserved_labels_start_with_underscore() {
    assert!(LabelClass::Dotted.parse("_internal.x").unwrap().is_reserved());
    assert!(!LabelClass::Dotted.parse("x._internal").unwrap().is_reserved());
}

// ============================================================================
// SECTION: Normalization
// ============================================================================

#[test]
fn thunk_normalizes_text() {
    assert_eq!(thunk("  Hello World ").unwrap(), "hello_world");
    assert_eq!(thunk("C++").unwrap(), "cxx");
    assert_eq!(thunk("__private").unwrap(), "private");
    assert_eq!(thunk("a.b").unwrap(), "a_b");
}

#[test]
fn thunk_rejects_empty_result() {
    assert!(matches!(thunk("___"), Err(LabelError::Empty { .. })));
    assert!(matches!(thunk("   "), Err(LabelError::Empty { .. })));
}

#[test]
fn label_class_parses_names() {
    assert_eq!("dotted".parse::<LabelClass>().unwrap(), LabelClass::Dotted);
    assert_eq!("path".parse::<LabelClass>().unwrap(), LabelClass::Path);
    assert!(matches!("xml".parse::<LabelClass>(), Err(LabelError::UnknownClass(_))));
}
