// crates/suitebase-db/src/item.rs
// ============================================================================
// Module: Database Items
// Description: Item descriptors, suites, and item kinds.
// Purpose: Describe stored tests, resources, and suites returned by lookups.
// Dependencies: serde, suitebase-core
// ============================================================================

//! ## Overview
//! A lookup returns an [`ItemDescriptor`] (wrapped as [`TestDescriptor`] or
//! [`ResourceDescriptor`]) or a [`Suite`]. Descriptors carry the explicit
//! arguments read from storage and build the typed extension instance on
//! first request through [`ItemDescriptor::get_instance`].
//!
//! Invariants:
//! - The instance is built at most once per descriptor and never replaced.
//! - Suite membership lists are direct members only, never expanded.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;
use std::sync::OnceLock;

use serde::Serialize;
use suitebase_core::Arguments;
use suitebase_core::Extension;
use suitebase_core::ExtensionElement;
use suitebase_core::ExtensionRegistry;
use suitebase_core::FieldValue;
use suitebase_core::Label;
use suitebase_core::builtins::ITEM_ID_FIELD;
use suitebase_core::builtins::PREREQUISITES_FIELD;
use suitebase_core::builtins::RESOURCES_FIELD;

use crate::error::DatabaseError;

// ============================================================================
// SECTION: Item Kinds
// ============================================================================

/// Kinds of items a database stores.
///
/// # Invariants
/// - Variants are stable for error reporting and telemetry labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    /// A test.
    Test,
    /// A resource.
    Resource,
    /// A suite.
    Suite,
}

impl ItemKind {
    /// All item kinds in lookup order.
    pub const ALL: [Self; 3] = [Self::Test, Self::Resource, Self::Suite];

    /// Returns a stable label for the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Test => "test",
            Self::Resource => "resource",
            Self::Suite => "suite",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Item Descriptors
// ============================================================================

/// Stored test or resource with its explicit arguments.
///
/// # Invariants
/// - `kind` is [`ItemKind::Test`] or [`ItemKind::Resource`].
/// - `instance`, once set, is never replaced.
#[derive(Debug, Clone)]
pub struct ItemDescriptor {
    /// Item kind.
    kind: ItemKind,
    /// Item id within the returning database.
    id: Label,
    /// Fully qualified extension class name.
    class_name: String,
    /// Explicit arguments read from storage.
    arguments: Arguments,
    /// Registry resolving `class_name`.
    registry: Arc<ExtensionRegistry>,
    /// Lazily built extension instance.
    instance: OnceLock<Arc<Extension>>,
}

impl ItemDescriptor {
    /// Creates a descriptor.
    #[must_use]
    pub fn new(
        kind: ItemKind,
        id: Label,
        class_name: impl Into<String>,
        arguments: Arguments,
        registry: Arc<ExtensionRegistry>,
    ) -> Self {
        Self {
            kind,
            id,
            class_name: class_name.into(),
            arguments,
            registry,
            instance: OnceLock::new(),
        }
    }

    /// Returns the item kind.
    #[must_use]
    pub const fn kind(&self) -> ItemKind {
        self.kind
    }

    /// Returns the item id.
    #[must_use]
    pub const fn id(&self) -> &Label {
        &self.id
    }

    /// Returns the extension class name.
    #[must_use]
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Returns the explicit arguments.
    #[must_use]
    pub const fn arguments(&self) -> &Arguments {
        &self.arguments
    }

    /// Returns the registry resolving the class.
    #[must_use]
    pub const fn registry(&self) -> &Arc<ExtensionRegistry> {
        &self.registry
    }

    /// Returns the extension instance, building it on first use.
    ///
    /// The computed `item_id` argument receives the descriptor id.
    /// Concurrent first calls may each build an instance; exactly one is
    /// published and returned to every caller.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError`] when the class is unknown or the arguments
    /// do not fit its schema.
    pub fn get_instance(&self) -> Result<Arc<Extension>, DatabaseError> {
        if let Some(instance) = self.instance.get() {
            return Ok(Arc::clone(instance));
        }
        let mut computed = Arguments::new();
        computed.insert(ITEM_ID_FIELD.to_string(), FieldValue::text(self.id.as_str()));
        let built = Arc::new(self.registry.instantiate(&self.class_name, &self.arguments, &computed)?);
        Ok(Arc::clone(self.instance.get_or_init(|| built)))
    }

    /// Returns the structured element form of this item.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError`] when the instance cannot be built or encoded.
    pub fn element(&self) -> Result<ExtensionElement, DatabaseError> {
        Ok(ExtensionElement::from_extension(self.get_instance()?.as_ref())?)
    }

    /// Returns a copy under `id` with every item reference rewritten.
    ///
    /// References are found through the class schema, so ids nested inside
    /// sets, tuples, and dictionaries are rewritten too. Arguments without a
    /// schema field are copied unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::Schema`] when the class is unknown.
    pub fn rewritten(
        &self,
        id: Label,
        rewrite: &dyn Fn(&str) -> String,
    ) -> Result<Self, DatabaseError> {
        let schema = self.registry.class_arguments(&self.class_name)?;
        let arguments = self
            .arguments
            .iter()
            .map(|(name, value)| {
                let value = match schema.field(name) {
                    Some(field) if field.has_references() => field.rewrite_references(value, rewrite),
                    _ => value.clone(),
                };
                (name.clone(), value)
            })
            .collect();
        Ok(Self::new(self.kind, id, self.class_name.clone(), arguments, Arc::clone(&self.registry)))
    }

    /// Returns the text items of a set-valued argument.
    fn text_list(&self, name: &str) -> Vec<String> {
        self.arguments
            .get(name)
            .and_then(FieldValue::as_list)
            .map(|items| items.iter().filter_map(FieldValue::as_text).map(str::to_string).collect())
            .unwrap_or_default()
    }
}

/// Prerequisite of a test: the test that must run first and the outcome
/// it must produce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Prerequisite {
    /// Id of the prerequisite test.
    pub test_id: String,
    /// Required outcome.
    pub outcome: String,
}

/// Stored test.
#[derive(Debug, Clone)]
pub struct TestDescriptor(ItemDescriptor);

impl TestDescriptor {
    /// Wraps a descriptor of kind [`ItemKind::Test`].
    #[must_use]
    pub const fn new(descriptor: ItemDescriptor) -> Self {
        Self(descriptor)
    }

    /// Returns the wrapped descriptor.
    #[must_use]
    pub fn into_inner(self) -> ItemDescriptor {
        self.0
    }

    /// Returns the explicit prerequisites of the test.
    #[must_use]
    pub fn prerequisites(&self) -> Vec<Prerequisite> {
        let Some(items) = self.0.arguments.get(PREREQUISITES_FIELD).and_then(FieldValue::as_list) else {
            return Vec::new();
        };
        items
            .iter()
            .filter_map(|item| match item.as_list() {
                Some([test_id, outcome]) => Some(Prerequisite {
                    test_id: test_id.as_text()?.to_string(),
                    outcome: outcome.as_text()?.to_string(),
                }),
                _ => None,
            })
            .collect()
    }

    /// Returns the ids of the resources the test requires.
    #[must_use]
    pub fn resources(&self) -> Vec<String> {
        self.0.text_list(RESOURCES_FIELD)
    }
}

impl Deref for TestDescriptor {
    type Target = ItemDescriptor;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Stored resource.
#[derive(Debug, Clone)]
pub struct ResourceDescriptor(ItemDescriptor);

impl ResourceDescriptor {
    /// Wraps a descriptor of kind [`ItemKind::Resource`].
    #[must_use]
    pub const fn new(descriptor: ItemDescriptor) -> Self {
        Self(descriptor)
    }

    /// Returns the wrapped descriptor.
    #[must_use]
    pub fn into_inner(self) -> ItemDescriptor {
        self.0
    }

    /// Returns the ids of the resources this resource depends on.
    #[must_use]
    pub fn resources(&self) -> Vec<String> {
        self.0.text_list(RESOURCES_FIELD)
    }
}

impl Deref for ResourceDescriptor {
    type Target = ItemDescriptor;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

// ============================================================================
// SECTION: Suites
// ============================================================================

/// Named collection of test ids and sub-suite ids.
///
/// # Invariants
/// - `test_ids` and `suite_ids` list direct members only.
/// - Implicit suites are derived from the store layout and are not editable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Suite {
    /// Suite id.
    pub id: Label,
    /// True for suites derived from directories or parameters.
    pub implicit: bool,
    /// Directly contained test ids.
    pub test_ids: Vec<Label>,
    /// Directly contained suite ids.
    pub suite_ids: Vec<Label>,
}

impl Suite {
    /// Creates an explicit suite.
    #[must_use]
    pub const fn explicit(id: Label, test_ids: Vec<Label>, suite_ids: Vec<Label>) -> Self {
        Self {
            id,
            implicit: false,
            test_ids,
            suite_ids,
        }
    }

    /// Creates an implicit suite.
    #[must_use]
    pub const fn implicit(id: Label, test_ids: Vec<Label>, suite_ids: Vec<Label>) -> Self {
        Self {
            id,
            implicit: true,
            test_ids,
            suite_ids,
        }
    }

    /// Returns a copy with every id mapped through `map`.
    #[must_use]
    pub fn map_ids(&self, map: impl Fn(&Label) -> Label) -> Self {
        Self {
            id: map(&self.id),
            implicit: self.implicit,
            test_ids: self.test_ids.iter().map(&map).collect(),
            suite_ids: self.suite_ids.iter().map(&map).collect(),
        }
    }
}

// ============================================================================
// SECTION: Items
// ============================================================================

/// Any item a database can return.
#[derive(Debug, Clone)]
pub enum Item {
    /// A test.
    Test(TestDescriptor),
    /// A resource.
    Resource(ResourceDescriptor),
    /// A suite.
    Suite(Suite),
}

impl Item {
    /// Returns the kind of the item.
    #[must_use]
    pub const fn kind(&self) -> ItemKind {
        match self {
            Self::Test(_) => ItemKind::Test,
            Self::Resource(_) => ItemKind::Resource,
            Self::Suite(_) => ItemKind::Suite,
        }
    }

    /// Returns the item id.
    #[must_use]
    pub fn id(&self) -> &Label {
        match self {
            Self::Test(test) => test.id(),
            Self::Resource(resource) => resource.id(),
            Self::Suite(suite) => &suite.id,
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
