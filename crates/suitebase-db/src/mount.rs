// crates/suitebase-db/src/mount.rs
// ============================================================================
// Module: Mount Database
// Description: Read-only federation of databases under mount points.
// Purpose: Present several stores as one label space.
// Dependencies: suitebase-core, tracing
// ============================================================================

//! ## Overview
//! A [`MountDatabase`] exposes each child database below a one-component
//! mount point. A lookup strips the mount point, dispatches the remainder to
//! the child, and re-prefixes every id in the answer: the item id, ids held
//! in reference-typed arguments (prerequisites, resources), suite members,
//! and the id carried by a not-found error.
//!
//! Invariants:
//! - Every child uses the federation's label class.
//! - The federation never writes; write operations fail with
//!   [`DatabaseError::NotModifiable`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use suitebase_core::ExtensionRegistry;
use suitebase_core::Label;
use suitebase_core::LabelClass;
use tracing::debug;

use crate::database::Database;
use crate::error::DatabaseError;
use crate::item::ItemKind;
use crate::item::ResourceDescriptor;
use crate::item::Suite;
use crate::item::TestDescriptor;
use crate::observer::DatabaseObserver;
use crate::observer::NoopObserver;
use crate::observer::observe;

// ============================================================================
// SECTION: Mount Database
// ============================================================================

/// Stable observer label for mount databases.
const DATABASE_NAME: &str = "mount";

/// Child database selected for an id.
struct Selection<'a> {
    /// Mount point of the child.
    mount_point: Label,
    /// Child database.
    database: &'a dyn Database,
    /// Id relative to the child.
    rest: Label,
}

impl Selection<'_> {
    /// Prefixes a child-relative id with the mount point.
    fn join(&self, id: &str) -> Label {
        self.mount_point.join([id])
    }

    /// Prefixes a child-relative reference; empty references stay empty.
    fn join_reference(&self, id: &str) -> String {
        if id.is_empty() { String::new() } else { self.join(id).as_str().to_string() }
    }
}

/// Read-only federation of child databases.
pub struct MountDatabase {
    /// Root path of the federation.
    path: PathBuf,
    /// Label class shared by every child.
    label_class: LabelClass,
    /// Registry resolving extension classes.
    registry: Arc<ExtensionRegistry>,
    /// Child databases keyed by mount point.
    mounts: BTreeMap<String, Arc<dyn Database>>,
    /// Lookup event sink.
    observer: Arc<dyn DatabaseObserver>,
}

impl MountDatabase {
    /// Creates a federation of `mounts`.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::InvalidMountPoint`] when a mount point is
    /// not a single label component, [`DatabaseError::DuplicateMountPoint`]
    /// when one is repeated, and [`DatabaseError::LabelClassMismatch`] when
    /// a child uses another label class.
    pub fn new<I>(
        path: impl Into<PathBuf>,
        label_class: LabelClass,
        registry: Arc<ExtensionRegistry>,
        mounts: I,
    ) -> Result<Self, DatabaseError>
    where
        I: IntoIterator<Item = (String, Arc<dyn Database>)>,
    {
        let mut children = BTreeMap::new();
        for (mount_point, database) in mounts {
            if !label_class.is_valid(&mount_point, true) {
                return Err(DatabaseError::InvalidMountPoint {
                    mount_point,
                });
            }
            if database.label_class() != label_class {
                return Err(DatabaseError::LabelClassMismatch {
                    mount_point,
                    expected: label_class,
                    found: database.label_class(),
                });
            }
            if children.contains_key(&mount_point) {
                return Err(DatabaseError::DuplicateMountPoint {
                    mount_point,
                });
            }
            debug!(mount_point = mount_point.as_str(), "mounted database");
            children.insert(mount_point, database);
        }
        Ok(Self {
            path: path.into(),
            label_class,
            registry,
            mounts: children,
            observer: Arc::new(NoopObserver),
        })
    }

    /// Installs a lookup observer.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn DatabaseObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Returns the mount points in label order.
    #[must_use]
    pub fn mount_points(&self) -> Vec<Label> {
        self.mounts.keys().map(|mount_point| self.label_class.root().join([mount_point])).collect()
    }

    /// Returns the child mounted at `mount_point`.
    #[must_use]
    pub fn mounted(&self, mount_point: &str) -> Option<&Arc<dyn Database>> {
        self.mounts.get(mount_point)
    }

    /// Selects the child owning `label`.
    fn select(&self, label: &Label) -> Option<Selection<'_>> {
        let (mount_point, rest) = label.split_left();
        let database = self.mounts.get(mount_point.as_str())?;
        Some(Selection {
            mount_point,
            database: database.as_ref(),
            rest,
        })
    }

    /// Parses `id` and selects its child, failing with not-found for `kind`.
    fn select_item(&self, kind: ItemKind, id: &str) -> Result<Selection<'_>, DatabaseError> {
        let label = self.parse_label(id)?;
        self.select(&label).ok_or_else(|| DatabaseError::no_such(kind, id))
    }

    /// Looks up a test in the owning child.
    fn find_test(&self, id: &str) -> Result<TestDescriptor, DatabaseError> {
        let selection = self.select_item(ItemKind::Test, id)?;
        debug!(id, mount_point = selection.mount_point.as_str(), "dispatching test lookup");
        let test = selection
            .database
            .get_test(selection.rest.as_str())
            .map_err(|err| err.map_missing_id(|missing| selection.join(missing).as_str().to_string()))?;
        let rewritten = test.rewritten(selection.join(test.id().as_str()), &|reference| {
            selection.join_reference(reference)
        })?;
        Ok(TestDescriptor::new(rewritten))
    }

    /// Looks up a resource in the owning child.
    fn find_resource(&self, id: &str) -> Result<ResourceDescriptor, DatabaseError> {
        let selection = self.select_item(ItemKind::Resource, id)?;
        let resource = selection
            .database
            .get_resource(selection.rest.as_str())
            .map_err(|err| err.map_missing_id(|missing| selection.join(missing).as_str().to_string()))?;
        let rewritten = resource.rewritten(selection.join(resource.id().as_str()), &|reference| {
            selection.join_reference(reference)
        })?;
        Ok(ResourceDescriptor::new(rewritten))
    }

    /// Looks up a suite; the root suite lists the mount points.
    fn find_suite(&self, id: &str) -> Result<Suite, DatabaseError> {
        let label = self.parse_label(id)?;
        if label.is_root() {
            return Ok(Suite::implicit(label, Vec::new(), self.mount_points()));
        }
        let selection = self.select(&label).ok_or_else(|| DatabaseError::no_such(ItemKind::Suite, id))?;
        let suite = selection
            .database
            .get_suite(selection.rest.as_str())
            .map_err(|err| err.map_missing_id(|missing| selection.join(missing).as_str().to_string()))?;
        Ok(suite.map_ids(|child_id| selection.join(child_id.as_str())))
    }
}

impl Database for MountDatabase {
    fn path(&self) -> &Path {
        &self.path
    }

    fn label_class(&self) -> LabelClass {
        self.label_class
    }

    fn registry(&self) -> &Arc<ExtensionRegistry> {
        &self.registry
    }

    fn get_test(&self, id: &str) -> Result<TestDescriptor, DatabaseError> {
        observe(self.observer.as_ref(), DATABASE_NAME, ItemKind::Test, id, self.find_test(id))
    }

    fn get_resource(&self, id: &str) -> Result<ResourceDescriptor, DatabaseError> {
        observe(self.observer.as_ref(), DATABASE_NAME, ItemKind::Resource, id, self.find_resource(id))
    }

    fn get_suite(&self, id: &str) -> Result<Suite, DatabaseError> {
        observe(self.observer.as_ref(), DATABASE_NAME, ItemKind::Suite, id, self.find_suite(id))
    }

    fn get_ids(
        &self,
        kind: ItemKind,
        directory: &str,
        recursive: bool,
    ) -> Result<Vec<Label>, DatabaseError> {
        let label = self.parse_label(directory)?;
        if !label.is_root() {
            let Some(selection) = self.select(&label) else {
                return Ok(Vec::new());
            };
            let ids = selection.database.get_ids(kind, selection.rest.as_str(), recursive)?;
            return Ok(ids.iter().map(|id| selection.join(id.as_str())).collect());
        }
        let mut ids = Vec::new();
        if kind == ItemKind::Suite {
            ids.extend(self.mount_points());
        }
        if recursive {
            for (mount_point, database) in &self.mounts {
                let prefix = self.label_class.root().join([mount_point]);
                ids.extend(
                    database.get_ids(kind, "", true)?.iter().map(|id| prefix.join([id.as_str()])),
                );
            }
        }
        Ok(ids)
    }

    fn get_subdirectories(&self, directory: &str) -> Result<Vec<Label>, DatabaseError> {
        let label = self.parse_label(directory)?;
        if label.is_root() {
            return Ok(self.mount_points());
        }
        match self.select(&label) {
            Some(selection) => selection.database.get_subdirectories(selection.rest.as_str()),
            None => Ok(Vec::new()),
        }
    }
}
