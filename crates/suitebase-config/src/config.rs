// crates/suitebase-config/src/config.rs
// ============================================================================
// Module: Suitebase Configuration
// Description: Configuration loading, validation, and database wiring.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: serde, suitebase-core, suitebase-db, thiserror, toml, tracing
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Missing or invalid configuration fails closed.
//!
//! The file declares one of two database layouts:
//! - a single JSON manifest under `[database]`;
//! - a `[mounts]` table federating several manifests under mount points.
//!
//! A `[parameters]` table wraps either layout in a parameter database.
//! Relative paths resolve against the directory holding the config file.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Deserialize;
use suitebase_core::ExtensionRegistry;
use suitebase_core::LabelClass;
use suitebase_db::Database;
use suitebase_db::DatabaseError;
use suitebase_db::Manifest;
use suitebase_db::MemoryDatabase;
use suitebase_db::MemoryStore;
use suitebase_db::MountDatabase;
use suitebase_db::ParameterDatabase;
use suitebase_db::ParameterSet;
use suitebase_db::StaticParameters;
use thiserror::Error;
use tracing::debug;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "suitebase.toml";
/// Environment variable used to override the config path.
pub(crate) const CONFIG_ENV_VAR: &str = "SUITEBASE_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum number of mounted databases.
pub(crate) const MAX_MOUNTS: usize = 256;
/// Maximum number of parameter sets per test.
pub(crate) const MAX_PARAMETER_SETS: usize = 256;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Suitebase configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SuitebaseConfig {
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Manifest paths keyed by mount point.
    #[serde(default)]
    pub mounts: BTreeMap<String, PathBuf>,
    /// Parameter sets keyed by test id.
    #[serde(default)]
    pub parameters: BTreeMap<String, Vec<ParameterConfig>>,
    /// Directory holding the loaded file (not serialized).
    #[serde(skip)]
    pub source_dir: Option<PathBuf>,
}

impl SuitebaseConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let mut config = Self::from_toml(content)?;
        config.source_dir = resolved.parent().map(Path::to_path_buf);
        debug!(path = %resolved.display(), "loaded config");
        Ok(config)
    }

    /// Parses and validates configuration text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML and
    /// [`ConfigError::Invalid`] when validation fails.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let label_class = self.database.validate()?;
        if !self.mounts.is_empty() && self.database.manifest.is_some() {
            return Err(ConfigError::Invalid(
                "database.manifest and mounts are mutually exclusive".to_string(),
            ));
        }
        if self.mounts.len() > MAX_MOUNTS {
            return Err(ConfigError::Invalid("too many mounts".to_string()));
        }
        for (mount_point, manifest) in &self.mounts {
            if !label_class.is_valid(mount_point, true) {
                return Err(ConfigError::Invalid(format!("invalid mount point: `{mount_point}`")));
            }
            validate_path_string(&format!("mounts.{mount_point}"), &manifest.to_string_lossy())?;
        }
        for (test_id, sets) in &self.parameters {
            validate_parameters(label_class, test_id, sets)?;
        }
        Ok(())
    }

    /// Returns the configured label class.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for an unknown label class name.
    pub fn label_class(&self) -> Result<LabelClass, ConfigError> {
        self.database.label_class()
    }

    /// Resolves `path` against the directory holding the config file.
    #[must_use]
    pub fn resolve(&self, path: &Path) -> PathBuf {
        match &self.source_dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Returns the configured parameters as a static parameter source.
    #[must_use]
    pub fn static_parameters(&self) -> StaticParameters {
        let mut parameters = StaticParameters::new();
        for (test_id, sets) in &self.parameters {
            for set in sets {
                parameters.insert(test_id, set.to_parameter_set());
            }
        }
        parameters
    }

    /// Opens the configured database stack.
    ///
    /// Without a manifest or mounts the database is an empty in-memory
    /// store.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for an unknown label class and
    /// [`ConfigError::Database`] when a manifest cannot be loaded or a
    /// mount is rejected.
    pub fn open_database(&self) -> Result<Arc<dyn Database>, ConfigError> {
        let label_class = self.label_class()?;
        let registry = Arc::new(ExtensionRegistry::with_builtins().map_err(DatabaseError::from)?);
        let root = self.database.path.as_deref().map_or_else(
            || self.source_dir.clone().unwrap_or_default(),
            |path| self.resolve(path),
        );
        let base: Arc<dyn Database> = if !self.mounts.is_empty() {
            let mut mounts = Vec::with_capacity(self.mounts.len());
            for (mount_point, manifest) in &self.mounts {
                let manifest = self.resolve(manifest);
                let child =
                    MemoryDatabase::open_manifest(&manifest, label_class, Arc::clone(&registry))?
                        .read_only();
                mounts.push((mount_point.clone(), Arc::new(child) as Arc<dyn Database>));
            }
            Arc::new(MountDatabase::new(root, label_class, Arc::clone(&registry), mounts)?)
        } else if let Some(manifest) = &self.database.manifest {
            let manifest = Manifest::read_file(&self.resolve(manifest))?;
            Arc::new(MemoryDatabase::from_manifest(root, label_class, Arc::clone(&registry), &manifest)?)
        } else {
            Arc::new(MemoryDatabase::new(root, label_class, Arc::clone(&registry), MemoryStore::new()))
        };
        if self.parameters.is_empty() {
            return Ok(base);
        }
        debug!(tests = self.parameters.len(), "wrapping database with parameters");
        Ok(Arc::new(ParameterDatabase::new(base, self.static_parameters())))
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Root path reported by the database.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Label class name (`dotted` or `path`).
    #[serde(default = "default_label_class")]
    pub label_class: String,
    /// JSON manifest holding the store contents.
    #[serde(default)]
    pub manifest: Option<PathBuf>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: None,
            label_class: default_label_class(),
            manifest: None,
        }
    }
}

impl DatabaseConfig {
    /// Parses the label class name.
    fn label_class(&self) -> Result<LabelClass, ConfigError> {
        self.label_class.parse().map_err(|_| {
            ConfigError::Invalid(format!("unknown database.label_class: `{}`", self.label_class))
        })
    }

    /// Validates database configuration, returning the label class.
    fn validate(&self) -> Result<LabelClass, ConfigError> {
        let label_class = self.label_class()?;
        if let Some(path) = &self.path {
            validate_path_string("database.path", &path.to_string_lossy())?;
        }
        if let Some(manifest) = &self.manifest {
            validate_path_string("database.manifest", &manifest.to_string_lossy())?;
        }
        Ok(label_class)
    }
}

/// One parameter set in configuration form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParameterConfig {
    /// Parameter name; a single label component.
    pub name: String,
    /// Argument overrides in text form.
    #[serde(default)]
    pub arguments: BTreeMap<String, String>,
}

impl ParameterConfig {
    /// Converts to the database parameter form.
    #[must_use]
    pub fn to_parameter_set(&self) -> ParameterSet {
        ParameterSet {
            name: self.name.clone(),
            arguments: self.arguments.clone(),
        }
    }
}

/// Default label class name.
fn default_label_class() -> String {
    LabelClass::Dotted.as_str().to_string()
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
    /// The configured database could not be opened.
    #[error("config database error: {0}")]
    Database(#[from] DatabaseError),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        let component_value = component.as_os_str().to_string_lossy();
        if component_value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Validates the parameter sets declared for one test id.
fn validate_parameters(
    label_class: LabelClass,
    test_id: &str,
    sets: &[ParameterConfig],
) -> Result<(), ConfigError> {
    if !label_class.is_valid(test_id, false) {
        return Err(ConfigError::Invalid(format!("invalid parameter test id: `{test_id}`")));
    }
    if sets.len() > MAX_PARAMETER_SETS {
        return Err(ConfigError::Invalid(format!("too many parameters for `{test_id}`")));
    }
    let mut names = BTreeSet::new();
    for set in sets {
        if set.name.is_empty() {
            return Err(ConfigError::Invalid(format!(
                "parameters.{test_id} name must be non-empty"
            )));
        }
        if !label_class.is_valid(&set.name, true) {
            return Err(ConfigError::Invalid(format!(
                "parameters.{test_id} name `{}` is not a label component",
                set.name
            )));
        }
        if !names.insert(set.name.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "parameters.{test_id} name `{}` is repeated",
                set.name
            )));
        }
        if set.arguments.keys().any(String::is_empty) {
            return Err(ConfigError::Invalid(format!(
                "parameters.{test_id}.{} argument names must be non-empty",
                set.name
            )));
        }
    }
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================
