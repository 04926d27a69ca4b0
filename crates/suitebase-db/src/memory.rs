// crates/suitebase-db/src/memory.rs
// ============================================================================
// Module: Memory Store
// Description: In-process storage backend and JSON manifests.
// Purpose: Provide a reference backend for tests, tools, and small stores.
// Dependencies: serde, serde_json, suitebase-core
// ============================================================================

//! ## Overview
//! [`MemoryStore`] keeps stored items in lock-guarded maps. A [`Manifest`]
//! is the JSON file form of a whole store: tests and resources as extension
//! elements, explicit suites as membership lists, all keyed by id.
//! Security posture: manifest files are untrusted and size-limited.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::PoisonError;
use std::sync::RwLock;

use serde::Deserialize;
use serde::Serialize;
use suitebase_core::ExtensionElement;
use suitebase_core::ExtensionRegistry;
use suitebase_core::Label;
use suitebase_core::LabelClass;

use crate::error::DatabaseError;
use crate::item::ItemKind;
use crate::store::StorageBackend;
use crate::store::StoreDatabase;
use crate::store::StoredItem;
use crate::store::SuiteElement;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum size of a manifest file.
pub const MAX_MANIFEST_BYTES: u64 = 8 * 1024 * 1024;

// ============================================================================
// SECTION: Manifest
// ============================================================================

/// JSON file form of a store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Tests keyed by id.
    #[serde(default)]
    pub tests: BTreeMap<String, ExtensionElement>,
    /// Resources keyed by id.
    #[serde(default)]
    pub resources: BTreeMap<String, ExtensionElement>,
    /// Explicit suites keyed by id.
    #[serde(default)]
    pub suites: BTreeMap<String, SuiteElement>,
}

impl Manifest {
    /// Parses a manifest from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::Backend`] when the text is not a manifest.
    pub fn from_json(text: &str) -> Result<Self, DatabaseError> {
        serde_json::from_str(text).map_err(|err| DatabaseError::Backend(format!("invalid manifest: {err}")))
    }

    /// Renders the manifest as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::Backend`] when serialization fails.
    pub fn to_json(&self) -> Result<String, DatabaseError> {
        serde_json::to_string_pretty(self).map_err(|err| DatabaseError::Backend(err.to_string()))
    }

    /// Reads a manifest file.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::Backend`] when the file is missing, too
    /// large, or malformed.
    pub fn read_file(path: &Path) -> Result<Self, DatabaseError> {
        let io_error = |err: std::io::Error| DatabaseError::Backend(format!("{}: {err}", path.display()));
        let size = fs::metadata(path).map_err(io_error)?.len();
        if size > MAX_MANIFEST_BYTES {
            return Err(DatabaseError::Backend(format!(
                "{}: manifest exceeds {MAX_MANIFEST_BYTES} bytes",
                path.display()
            )));
        }
        let text = fs::read_to_string(path).map_err(io_error)?;
        Self::from_json(&text)
    }
}

// ============================================================================
// SECTION: Memory Store
// ============================================================================

/// Stored items keyed by kind, then id.
type ItemMap = BTreeMap<ItemKind, BTreeMap<Label, StoredItem>>;

/// In-process [`StorageBackend`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    /// Stored items.
    items: RwLock<ItemMap>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding the items of `manifest`.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::InvalidLabel`] when a manifest id is not a
    /// valid, non-root label of `label_class`.
    pub fn from_manifest(label_class: LabelClass, manifest: &Manifest) -> Result<Self, DatabaseError> {
        let mut items = ItemMap::new();
        let extensions = [(ItemKind::Test, &manifest.tests), (ItemKind::Resource, &manifest.resources)];
        for (kind, elements) in extensions {
            let entries = items.entry(kind).or_default();
            for (id, element) in elements {
                entries.insert(item_label(label_class, kind, id)?, StoredItem::Extension(element.clone()));
            }
        }
        let suites = items.entry(ItemKind::Suite).or_default();
        for (id, element) in &manifest.suites {
            suites.insert(item_label(label_class, ItemKind::Suite, id)?, StoredItem::Suite(element.clone()));
        }
        Ok(Self {
            items: RwLock::new(items),
        })
    }

    /// Returns the current contents as a manifest.
    #[must_use]
    pub fn to_manifest(&self) -> Manifest {
        let items = self.items.read().unwrap_or_else(PoisonError::into_inner);
        let mut manifest = Manifest::default();
        for (kind, entries) in items.iter() {
            for (id, item) in entries {
                let id = id.as_str().to_string();
                match (kind, item) {
                    (ItemKind::Test, StoredItem::Extension(element)) => {
                        manifest.tests.insert(id, element.clone());
                    }
                    (ItemKind::Resource, StoredItem::Extension(element)) => {
                        manifest.resources.insert(id, element.clone());
                    }
                    (ItemKind::Suite, StoredItem::Suite(element)) => {
                        manifest.suites.insert(id, element.clone());
                    }
                    _ => {}
                }
            }
        }
        manifest
    }
}

impl StorageBackend for MemoryStore {
    fn load(&self, kind: ItemKind, id: &Label) -> Result<Option<StoredItem>, DatabaseError> {
        let items = self.items.read().unwrap_or_else(PoisonError::into_inner);
        Ok(items.get(&kind).and_then(|entries| entries.get(id)).cloned())
    }

    fn list_ids(
        &self,
        kind: ItemKind,
        directory: &Label,
        recursive: bool,
    ) -> Result<Vec<Label>, DatabaseError> {
        let items = self.items.read().unwrap_or_else(PoisonError::into_inner);
        let Some(entries) = items.get(&kind) else {
            return Ok(Vec::new());
        };
        Ok(entries
            .keys()
            .filter(|id| {
                id.relative_to(directory)
                    .is_some_and(|relative| !relative.is_root() && (recursive || relative.dirname().is_root()))
            })
            .cloned()
            .collect())
    }

    fn store(&self, kind: ItemKind, id: &Label, item: StoredItem) -> Result<(), DatabaseError> {
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        items.entry(kind).or_default().insert(id.clone(), item);
        Ok(())
    }

    fn remove(&self, kind: ItemKind, id: &Label) -> Result<bool, DatabaseError> {
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        Ok(items.get_mut(&kind).is_some_and(|entries| entries.remove(id).is_some()))
    }
}

/// Parses a manifest id, rejecting the root.
fn item_label(label_class: LabelClass, kind: ItemKind, id: &str) -> Result<Label, DatabaseError> {
    let label = label_class.parse(id)?;
    if label.is_root() {
        return Err(DatabaseError::no_such(kind, id));
    }
    Ok(label)
}

// ============================================================================
// SECTION: Memory Database
// ============================================================================

/// Database held entirely in memory.
pub type MemoryDatabase = StoreDatabase<MemoryStore>;

impl StoreDatabase<MemoryStore> {
    /// Creates an empty, modifiable in-memory database.
    #[must_use]
    pub fn in_memory(label_class: LabelClass, registry: Arc<ExtensionRegistry>) -> Self {
        Self::new(PathBuf::new(), label_class, registry, MemoryStore::new())
    }

    /// Creates an in-memory database from `manifest`.
    ///
    /// # Errors
    ///
    /// See [`MemoryStore::from_manifest`].
    pub fn from_manifest(
        path: impl Into<PathBuf>,
        label_class: LabelClass,
        registry: Arc<ExtensionRegistry>,
        manifest: &Manifest,
    ) -> Result<Self, DatabaseError> {
        let store = MemoryStore::from_manifest(label_class, manifest)?;
        Ok(Self::new(path, label_class, registry, store))
    }

    /// Loads an in-memory database from a manifest file.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`Manifest::read_file`] and
    /// [`MemoryStore::from_manifest`].
    pub fn open_manifest(
        path: &Path,
        label_class: LabelClass,
        registry: Arc<ExtensionRegistry>,
    ) -> Result<Self, DatabaseError> {
        let manifest = Manifest::read_file(path)?;
        Self::from_manifest(path, label_class, registry, &manifest)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests;
