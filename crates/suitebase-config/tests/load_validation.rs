// crates/suitebase-config/tests/load_validation.rs
// ============================================================================
// Module: Config Load Validation Tests
// Description: Validate config loading guards (path, size, encoding).
// Purpose: Ensure config input handling is strict and fail-closed.
// ============================================================================

//! ## Overview
//! Loads configuration files through the public entry point and checks
//! every guard plus the structural validation rules.

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

use std::io::Write;
use std::path::Path;

use suitebase_config::ConfigError;
use suitebase_config::SuitebaseConfig;
use suitebase_config::config_toml_example;
use suitebase_core::LabelClass;
use tempfile::NamedTempFile;

type TestResult = Result<(), String>;

fn assert_invalid(result: Result<SuitebaseConfig, ConfigError>, needle: &str) -> TestResult {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(_) => Err("expected invalid config load".to_string()),
    }
}

fn write_config(content: &[u8]) -> Result<NamedTempFile, String> {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.write_all(content).map_err(|err| err.to_string())?;
    Ok(file)
}

#[test]
fn load_rejects_path_too_long() -> TestResult {
    let long_path = "a".repeat(5_000);
    assert_invalid(SuitebaseConfig::load(Some(Path::new(&long_path))), "config path exceeds max length")
}

#[test]
fn load_rejects_path_component_too_long() -> TestResult {
    let long_component = "a".repeat(300);
    assert_invalid(
        SuitebaseConfig::load(Some(Path::new(&long_component))),
        "config path component too long",
    )
}

#[test]
fn load_rejects_missing_file() -> TestResult {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    assert_invalid(SuitebaseConfig::load(Some(&dir.path().join("absent.toml"))), "config io error")
}

#[test]
fn load_rejects_oversized_file() -> TestResult {
    let file = write_config(&vec![b'#'; 1_048_577])?;
    assert_invalid(SuitebaseConfig::load(Some(file.path())), "config file exceeds size limit")
}

#[test]
fn load_rejects_non_utf8_file() -> TestResult {
    let file = write_config(&[0xFF, 0xFE, 0xFF])?;
    assert_invalid(SuitebaseConfig::load(Some(file.path())), "config file must be utf-8")
}

#[test]
fn load_rejects_malformed_toml() -> TestResult {
    let file = write_config(b"[database\n")?;
    assert_invalid(SuitebaseConfig::load(Some(file.path())), "config parse error")
}

#[test]
fn load_rejects_unknown_sections() -> TestResult {
    let file = write_config(b"[server]\nport = 1\n")?;
    assert_invalid(SuitebaseConfig::load(Some(file.path())), "config parse error")
}

#[test]
fn empty_file_uses_defaults() -> TestResult {
    let file = write_config(b"")?;
    let config = SuitebaseConfig::load(Some(file.path())).map_err(|err| err.to_string())?;
    if config.label_class().map_err(|err| err.to_string())? != LabelClass::Dotted {
        return Err("label class should default to dotted".to_string());
    }
    if config.source_dir.as_deref() != file.path().parent() {
        return Err("source_dir should be the config file's directory".to_string());
    }
    Ok(())
}

#[test]
fn validation_rejects_unknown_label_class() -> TestResult {
    assert_invalid(
        SuitebaseConfig::from_toml("[database]\nlabel_class = \"slashed\"\n"),
        "unknown database.label_class",
    )
}

#[test]
fn validation_rejects_invalid_mount_points() -> TestResult {
    assert_invalid(
        SuitebaseConfig::from_toml("[mounts]\n\"a.b\" = \"m.json\"\n"),
        "invalid mount point",
    )?;
    assert_invalid(SuitebaseConfig::from_toml("[mounts]\n\"\" = \"m.json\"\n"), "invalid mount point")
}

#[test]
fn validation_rejects_manifest_with_mounts() -> TestResult {
    assert_invalid(
        SuitebaseConfig::from_toml("[database]\nmanifest = \"a.json\"\n\n[mounts]\nm = \"m.json\"\n"),
        "mutually exclusive",
    )
}

#[test]
fn validation_rejects_empty_parameter_names() -> TestResult {
    assert_invalid(
        SuitebaseConfig::from_toml("[[parameters.unit]]\nname = \"\"\n"),
        "name must be non-empty",
    )
}

#[test]
fn example_config_validates() -> TestResult {
    let config = SuitebaseConfig::from_toml(&config_toml_example()).map_err(|err| err.to_string())?;
    if config.mounts.len() != 2 {
        return Err(format!("expected two mounts, found {}", config.mounts.len()));
    }
    let sets = config.parameters.get("core.unit.parse").ok_or("missing parameters")?;
    let names: Vec<&str> = sets.iter().map(|set| set.name.as_str()).collect();
    if names != ["fast", "verbose"] {
        return Err(format!("unexpected parameter names {names:?}"));
    }
    Ok(())
}
