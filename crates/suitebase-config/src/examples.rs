// crates/suitebase-config/src/examples.rs
// ============================================================================
// Module: Config Examples
// Description: Canonical example configuration payloads.
// Purpose: Deterministic examples for docs and tooling.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Canonical example of a `suitebase.toml` configuration. The output is
//! deterministic and must always load and validate.

/// Returns a canonical example `suitebase.toml` configuration.
#[must_use]
pub fn config_toml_example() -> String {
    String::from(
        r#"[database]
path = "suites"
label_class = "dotted"

[mounts]
core = "core/manifest.json"
plugins = "plugins/manifest.json"

[[parameters."core.unit.parse"]]
name = "fast"
arguments = { exit_code = "0" }

[[parameters."core.unit.parse"]]
name = "verbose"
arguments = { environment = "VERBOSE=1" }
"#,
    )
}
