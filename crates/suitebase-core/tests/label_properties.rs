// crates/suitebase-core/tests/label_properties.rs
// ============================================================================
// Module: Label Property-Based Tests
// Description: Property tests for the label split/join round-trip law.
// Purpose: Detect violations of the label algebra across generated labels.
// ============================================================================

//! Property-based tests for label invariants.

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

use proptest::prelude::*;
use suitebase_core::LabelClass;
use suitebase_core::thunk;

fn dotted_label_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-z0-9_-]{1,8}", 1 .. 6).prop_map(|parts| parts.join("."))
}

proptest! {
    #[test]
    fn split_then_join_reconstructs_label(text in dotted_label_strategy()) {
        let label = LabelClass::Dotted.parse(&text).unwrap();
        let (dir, base) = label.split();
        let joined = dir.join([base.as_str()]);
        prop_assert_eq!(joined.as_str(), text.as_str());
        prop_assert!(LabelClass::Dotted.is_valid(base.as_str(), true));
    }

    #[test]
    fn split_left_then_join_reconstructs_label(text in dotted_label_strategy()) {
        let label = LabelClass::Dotted.parse(&text).unwrap();
        let (first, rest) = label.split_left();
        let joined = first.join([rest.as_str()]);
        prop_assert_eq!(joined.as_str(), text.as_str());
        prop_assert!(LabelClass::Dotted.is_valid(first.as_str(), true));
    }

    #[test]
    fn components_rejoin_to_label(text in dotted_label_strategy()) {
        let label = LabelClass::Dotted.parse(&text).unwrap();
        let components = label.components();
        let rebuilt = LabelClass::Dotted.root().join(components.iter().map(|part| part.as_str()));
        prop_assert_eq!(rebuilt, label);
    }

    #[test]
    fn is_valid_never_accepts_doubled_separator(left in "[a-z]{1,4}", right in "[a-z]{1,4}") {
        let doubled = format!("{left}..{right}");
        let leading = format!(".{left}");
        prop_assert!(!LabelClass::Dotted.is_valid(&doubled, false));
        prop_assert!(!LabelClass::Dotted.is_valid(&leading, false));
    }

    #[test]
    fn thunk_output_is_a_valid_component(text in ".{0,24}") {
        if let Ok(normalized) = thunk(&text) {
            prop_assert!(LabelClass::Dotted.is_valid(&normalized, true));
            prop_assert!(!normalized.starts_with('_'));
        }
    }
}
