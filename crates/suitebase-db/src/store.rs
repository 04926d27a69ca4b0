// crates/suitebase-db/src/store.rs
// ============================================================================
// Module: Store Database
// Description: Database built on a pluggable storage backend.
// Purpose: Turn raw stored elements into descriptors and directory suites.
// Dependencies: serde, suitebase-core, tracing
// ============================================================================

//! ## Overview
//! [`StorageBackend`] is the collaborator a concrete store implements: load,
//! list, store, and remove serialized items. [`StoreDatabase`] layers the
//! [`Database`] contract on top: it decodes stored elements through the
//! extension registry and derives an implicit suite for the root and for
//! every directory.
//!
//! Invariants:
//! - Explicit suites take precedence over directory suites of the same id.
//! - Implicit suites are never written to the backend.
//!
//! Security posture: stored elements are untrusted and decoded through the
//! registry, which rejects unknown classes and arguments.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;
use suitebase_core::Extension;
use suitebase_core::ExtensionElement;
use suitebase_core::ExtensionKind;
use suitebase_core::ExtensionRegistry;
use suitebase_core::Label;
use suitebase_core::LabelClass;
use tracing::debug;

use crate::database::Database;
use crate::error::DatabaseError;
use crate::item::ItemDescriptor;
use crate::item::ItemKind;
use crate::item::ResourceDescriptor;
use crate::item::Suite;
use crate::item::TestDescriptor;
use crate::observer::DatabaseObserver;
use crate::observer::NoopObserver;
use crate::observer::observe;

// ============================================================================
// SECTION: Stored Forms
// ============================================================================

/// Serialized membership of an explicit suite.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteElement {
    /// Directly contained test ids.
    #[serde(default)]
    pub test_ids: Vec<String>,
    /// Directly contained suite ids.
    #[serde(default)]
    pub suite_ids: Vec<String>,
}

impl SuiteElement {
    /// Encodes the membership of `suite`.
    #[must_use]
    pub fn from_suite(suite: &Suite) -> Self {
        Self {
            test_ids: suite.test_ids.iter().map(|id| id.as_str().to_string()).collect(),
            suite_ids: suite.suite_ids.iter().map(|id| id.as_str().to_string()).collect(),
        }
    }
}

/// Raw item as held by a storage backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredItem {
    /// Serialized test or resource.
    Extension(ExtensionElement),
    /// Serialized explicit suite.
    Suite(SuiteElement),
}

// ============================================================================
// SECTION: Backend Contract
// ============================================================================

/// Raw storage collaborator for [`StoreDatabase`].
pub trait StorageBackend: Send + Sync {
    /// Loads the item of `kind` stored under `id`.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::Backend`] when storage fails. A missing item
    /// is `Ok(None)`.
    fn load(&self, kind: ItemKind, id: &Label) -> Result<Option<StoredItem>, DatabaseError>;

    /// Lists ids of stored items of `kind` below `directory`.
    ///
    /// Without `recursive`, only items directly inside `directory` are
    /// listed.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::Backend`] when storage fails.
    fn list_ids(
        &self,
        kind: ItemKind,
        directory: &Label,
        recursive: bool,
    ) -> Result<Vec<Label>, DatabaseError>;

    /// Stores `item` under `id`, replacing any previous item of `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::Backend`] when storage fails.
    fn store(&self, kind: ItemKind, id: &Label, item: StoredItem) -> Result<(), DatabaseError>;

    /// Removes the item of `kind` stored under `id`; returns false when
    /// nothing was stored.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::Backend`] when storage fails.
    fn remove(&self, kind: ItemKind, id: &Label) -> Result<bool, DatabaseError>;
}

// ============================================================================
// SECTION: Store Database
// ============================================================================

/// Stable observer label for store databases.
const DATABASE_NAME: &str = "store";

/// Database over a [`StorageBackend`].
pub struct StoreDatabase<B> {
    /// Root path of the store.
    path: PathBuf,
    /// Label class used for ids.
    label_class: LabelClass,
    /// Registry resolving stored classes.
    registry: Arc<ExtensionRegistry>,
    /// Storage collaborator.
    backend: B,
    /// Whether writes are accepted.
    modifiable: bool,
    /// Lookup event sink.
    observer: Arc<dyn DatabaseObserver>,
}

impl<B: StorageBackend> StoreDatabase<B> {
    /// Creates a modifiable database over `backend`.
    #[must_use]
    pub fn new(
        path: impl Into<PathBuf>,
        label_class: LabelClass,
        registry: Arc<ExtensionRegistry>,
        backend: B,
    ) -> Self {
        Self {
            path: path.into(),
            label_class,
            registry,
            backend,
            modifiable: true,
            observer: Arc::new(NoopObserver),
        }
    }

    /// Marks the database read-only.
    #[must_use]
    pub fn read_only(mut self) -> Self {
        self.modifiable = false;
        self
    }

    /// Installs a lookup observer.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn DatabaseObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Returns the storage backend.
    #[must_use]
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// Loads and decodes a test or resource.
    fn load_descriptor(&self, kind: ItemKind, id: &str) -> Result<ItemDescriptor, DatabaseError> {
        let label = self.parse_label(id)?;
        let Some(stored) = self.backend.load(kind, &label)? else {
            return Err(DatabaseError::no_such(kind, id));
        };
        let StoredItem::Extension(element) = stored else {
            return Err(DatabaseError::Backend(format!("{kind} `{id}` is stored as a suite")));
        };
        let (schema, arguments) = element.decode_arguments(self.registry.as_ref(), None)?;
        let expected = match kind {
            ItemKind::Resource => ExtensionKind::Resource,
            ItemKind::Test | ItemKind::Suite => ExtensionKind::Test,
        };
        if schema.kind() != expected {
            return Err(DatabaseError::Backend(format!(
                "{kind} `{id}` has class `{}` of kind {}",
                schema.class_name(),
                schema.kind()
            )));
        }
        Ok(ItemDescriptor::new(kind, label, schema.class_name(), arguments, Arc::clone(&self.registry)))
    }

    /// Returns the directories below `directory`, as full ids.
    ///
    /// A directory exists when some stored item lies below it.
    fn directories(&self, directory: &Label, recursive: bool) -> Result<Vec<Label>, DatabaseError> {
        let mut directories = BTreeSet::new();
        for kind in ItemKind::ALL {
            for id in self.backend.list_ids(kind, directory, true)? {
                let Some(relative) = id.relative_to(directory) else {
                    continue;
                };
                let components = relative.components();
                let deepest = components.len().saturating_sub(1);
                let deepest = if recursive { deepest } else { deepest.min(1) };
                for end in 1 ..= deepest {
                    let parts: Vec<&str> = components[.. end].iter().map(Label::as_str).collect();
                    directories.insert(directory.join(parts));
                }
            }
        }
        Ok(directories.into_iter().collect())
    }

    /// Builds the implicit suite of a directory.
    fn directory_suite(&self, directory: &Label) -> Result<Suite, DatabaseError> {
        let test_ids = self.get_ids(ItemKind::Test, directory.as_str(), false)?;
        let suite_ids = self.get_ids(ItemKind::Suite, directory.as_str(), false)?;
        Ok(Suite::implicit(directory.clone(), test_ids, suite_ids))
    }

    /// Looks up a suite without reporting to the observer.
    fn find_suite(&self, id: &str) -> Result<Suite, DatabaseError> {
        let label = self.parse_label(id)?;
        match self.backend.load(ItemKind::Suite, &label)? {
            Some(StoredItem::Suite(element)) => {
                let test_ids = parse_labels(self.label_class, &element.test_ids)?;
                let suite_ids = parse_labels(self.label_class, &element.suite_ids)?;
                return Ok(Suite::explicit(label, test_ids, suite_ids));
            }
            Some(StoredItem::Extension(_)) => {
                return Err(DatabaseError::Backend(format!("suite `{id}` is stored as an extension")));
            }
            None => {}
        }
        if label.is_root() || self.directories(&label.dirname(), false)?.contains(&label) {
            return self.directory_suite(&label);
        }
        Err(DatabaseError::no_such(ItemKind::Suite, id))
    }

    /// Fails unless the database accepts writes.
    const fn ensure_modifiable(&self) -> Result<(), DatabaseError> {
        if self.modifiable { Ok(()) } else { Err(DatabaseError::NotModifiable) }
    }

    /// Parses a non-root item id.
    fn parse_item_id(&self, kind: ItemKind, id: &str) -> Result<Label, DatabaseError> {
        let label = self.parse_label(id)?;
        if label.is_root() {
            return Err(DatabaseError::no_such(kind, id));
        }
        Ok(label)
    }
}

impl<B: StorageBackend> Database for StoreDatabase<B> {
    fn path(&self) -> &Path {
        &self.path
    }

    fn label_class(&self) -> LabelClass {
        self.label_class
    }

    fn is_modifiable(&self) -> bool {
        self.modifiable
    }

    fn registry(&self) -> &Arc<ExtensionRegistry> {
        &self.registry
    }

    fn get_test(&self, id: &str) -> Result<TestDescriptor, DatabaseError> {
        let result = self.load_descriptor(ItemKind::Test, id).map(TestDescriptor::new);
        observe(self.observer.as_ref(), DATABASE_NAME, ItemKind::Test, id, result)
    }

    fn get_resource(&self, id: &str) -> Result<ResourceDescriptor, DatabaseError> {
        let result = self.load_descriptor(ItemKind::Resource, id).map(ResourceDescriptor::new);
        observe(self.observer.as_ref(), DATABASE_NAME, ItemKind::Resource, id, result)
    }

    fn get_suite(&self, id: &str) -> Result<Suite, DatabaseError> {
        let result = self.find_suite(id);
        observe(self.observer.as_ref(), DATABASE_NAME, ItemKind::Suite, id, result)
    }

    fn get_ids(
        &self,
        kind: ItemKind,
        directory: &str,
        recursive: bool,
    ) -> Result<Vec<Label>, DatabaseError> {
        let directory = self.parse_label(directory)?;
        let stored = self.backend.list_ids(kind, &directory, recursive)?;
        if kind != ItemKind::Suite {
            return Ok(stored);
        }
        let mut ids: BTreeSet<Label> = stored.into_iter().collect();
        ids.extend(self.directories(&directory, recursive)?);
        Ok(ids.into_iter().collect())
    }

    fn get_subdirectories(&self, directory: &str) -> Result<Vec<Label>, DatabaseError> {
        let directory = self.parse_label(directory)?;
        Ok(self.directories(&directory, false)?.iter().map(Label::basename).collect())
    }

    fn write_extension(&self, id: &str, extension: &Extension) -> Result<(), DatabaseError> {
        self.ensure_modifiable()?;
        let kind = match extension.kind() {
            ExtensionKind::Test => ItemKind::Test,
            ExtensionKind::Resource => ItemKind::Resource,
            other => {
                return Err(DatabaseError::Backend(format!("cannot store {other} extensions")));
            }
        };
        let label = self.parse_item_id(kind, id)?;
        let element = ExtensionElement::from_extension(extension)?;
        debug!(kind = kind.as_str(), id, class = extension.class_name(), "storing extension");
        self.backend.store(kind, &label, StoredItem::Extension(element))
    }

    fn write_suite(&self, suite: &Suite) -> Result<(), DatabaseError> {
        self.ensure_modifiable()?;
        if suite.implicit {
            return Err(DatabaseError::NotModifiable);
        }
        let label = self.parse_item_id(ItemKind::Suite, suite.id.as_str())?;
        debug!(id = label.as_str(), tests = suite.test_ids.len(), "storing suite");
        self.backend.store(ItemKind::Suite, &label, StoredItem::Suite(SuiteElement::from_suite(suite)))
    }

    fn remove_extension(&self, kind: ItemKind, id: &str) -> Result<(), DatabaseError> {
        self.ensure_modifiable()?;
        let label = self.parse_item_id(kind, id)?;
        if self.backend.remove(kind, &label)? {
            debug!(kind = kind.as_str(), id, "removed item");
            Ok(())
        } else {
            Err(DatabaseError::no_such(kind, id))
        }
    }
}

/// Parses stored id strings into labels of `class`.
fn parse_labels(class: LabelClass, ids: &[String]) -> Result<Vec<Label>, DatabaseError> {
    ids.iter().map(|id| class.parse(id).map_err(DatabaseError::from)).collect()
}
