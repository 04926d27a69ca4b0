// crates/suitebase-db/src/parameter.rs
// ============================================================================
// Module: Parameter Database
// Description: Database that expands tests into parametrized variants.
// Purpose: Present each parametrizable test as a suite of its variants.
// Dependencies: suitebase-core, tracing
// ============================================================================

//! ## Overview
//! A [`ParameterDatabase`] wraps one child database. Every child test for
//! which the [`ParameterSource`] names parameters becomes an implicit suite
//! whose members are `test.parameter` for each parameter; the variant test
//! carries the child's arguments overridden by the parameter's arguments.
//!
//! Label resolution always tries the parametrized reading first: the
//! directory of the id is a child test (or suite) and the basename is one of
//! its parameters. Only when that fails is the whole id looked up in the
//! child.
//!
//! Suites come in four shapes:
//! - wrapper suites: child suites whose parametrizable tests are listed as
//!   sub-suites instead of tests;
//! - implicit parameter suites: one per child test, listing its variants;
//! - parameter suites `suite.parameter`: every member of a child suite
//!   joined with the parameter;
//! - the child's own suites otherwise unchanged.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use suitebase_core::ExtensionRegistry;
use suitebase_core::Label;
use suitebase_core::LabelClass;
use tracing::debug;

use crate::database::Database;
use crate::database::ExpandedIds;
use crate::database::collect_suite_members;
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
// SECTION: Parameter Source
// ============================================================================

/// Supplies parameter names and the arguments each parameter contributes.
///
/// Both methods default to "no parameters".
pub trait ParameterSource: Send + Sync {
    /// Returns the parameters applicable to `test_id`.
    fn parameters_for_test(&self, _test_id: &str) -> Vec<String> {
        Vec::new()
    }

    /// Returns the text arguments `parameter` contributes to `test_id`.
    fn arguments_for_parameter(&self, _test_id: &str, _parameter: &str) -> BTreeMap<String, String> {
        BTreeMap::new()
    }
}

/// One named parameter and its text arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterSet {
    /// Parameter name; a single label component.
    pub name: String,
    /// Argument overrides in text form.
    pub arguments: BTreeMap<String, String>,
}

/// Parameter source backed by a fixed map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticParameters {
    /// Parameter sets keyed by test id, in declaration order.
    parameters: BTreeMap<String, Vec<ParameterSet>>,
}

impl StaticParameters {
    /// Creates an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a parameter for `test_id`, replacing one of the same name.
    #[must_use]
    pub fn with_parameter<I, K, V>(mut self, test_id: &str, name: &str, arguments: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let set = ParameterSet {
            name: name.to_string(),
            arguments: arguments.into_iter().map(|(key, value)| (key.into(), value.into())).collect(),
        };
        self.insert(test_id, set);
        self
    }

    /// Adds `set` for `test_id`, replacing a set of the same name.
    pub fn insert(&mut self, test_id: &str, set: ParameterSet) {
        let sets = self.parameters.entry(test_id.to_string()).or_default();
        match sets.iter_mut().find(|existing| existing.name == set.name) {
            Some(existing) => *existing = set,
            None => sets.push(set),
        }
    }

    /// Returns true when no parameters are declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }
}

impl ParameterSource for StaticParameters {
    fn parameters_for_test(&self, test_id: &str) -> Vec<String> {
        self.parameters
            .get(test_id)
            .map(|sets| sets.iter().map(|set| set.name.clone()).collect())
            .unwrap_or_default()
    }

    fn arguments_for_parameter(&self, test_id: &str, parameter: &str) -> BTreeMap<String, String> {
        self.parameters
            .get(test_id)
            .and_then(|sets| sets.iter().find(|set| set.name == parameter))
            .map(|set| set.arguments.clone())
            .unwrap_or_default()
    }
}

// ============================================================================
// SECTION: Parameter Database
// ============================================================================

/// Stable observer label for parameter databases.
const DATABASE_NAME: &str = "parameter";

/// Read-only database exposing parametrized variants of a child's tests.
pub struct ParameterDatabase<P> {
    /// Wrapped database.
    child: Arc<dyn Database>,
    /// Parameter collaborator.
    source: P,
    /// Lookup event sink.
    observer: Arc<dyn DatabaseObserver>,
}

impl<P: ParameterSource> ParameterDatabase<P> {
    /// Wraps `child` with parameters from `source`.
    #[must_use]
    pub fn new(child: Arc<dyn Database>, source: P) -> Self {
        Self {
            child,
            source,
            observer: Arc::new(NoopObserver),
        }
    }

    /// Installs a lookup observer.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn DatabaseObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Returns the wrapped database.
    #[must_use]
    pub const fn wrapped(&self) -> &Arc<dyn Database> {
        &self.child
    }

    /// Returns the parameter source.
    #[must_use]
    pub const fn source(&self) -> &P {
        &self.source
    }

    /// Returns the parameters of `id`; the root has none.
    fn parameters(&self, id: &Label) -> Vec<String> {
        if id.is_root() { Vec::new() } else { self.source.parameters_for_test(id.as_str()) }
    }

    /// Returns true when `parameter` is a parameter of `id`.
    fn has_parameter(&self, id: &Label, parameter: &Label) -> bool {
        self.parameters(id).iter().any(|name| name == parameter.as_str())
    }

    /// Returns true when `label` names a parameter of a child test.
    fn is_parametrized_test(&self, label: &Label) -> Result<bool, DatabaseError> {
        if label.is_root() {
            return Ok(false);
        }
        let (directory, basename) = label.split();
        Ok(self.has_parameter(&directory, &basename) && self.child.has_test(directory.as_str())?)
    }

    /// Returns true when `label` names a parameter of a child suite.
    fn is_parameter_suite(&self, label: &Label) -> Result<bool, DatabaseError> {
        if label.is_root() {
            return Ok(false);
        }
        let (directory, basename) = label.split();
        Ok(self.has_parameter(&directory, &basename) && self.child.has_suite(directory.as_str())?)
    }

    /// Returns every `id.parameter` variant of `id`.
    fn variants(&self, id: &Label) -> Vec<Label> {
        self.parameters(id).iter().map(|parameter| id.join([parameter])).collect()
    }

    /// Looks up a test, parametrized reading first.
    fn find_test(&self, id: &str) -> Result<TestDescriptor, DatabaseError> {
        let label = self.parse_label(id)?;
        if !self.is_parametrized_test(&label)? {
            return self.child.get_test(id);
        }
        let (directory, parameter) = label.split();
        debug!(id, test = directory.as_str(), parameter = parameter.as_str(), "resolving parametrized test");
        let base = self.child.get_test(directory.as_str())?;
        let schema = base.registry().class_arguments(base.class_name())?;
        let overrides = self.source.arguments_for_parameter(directory.as_str(), parameter.as_str());
        let mut arguments = base.arguments().clone();
        arguments.extend(schema.validate_arguments(&overrides)?);
        Ok(TestDescriptor::new(ItemDescriptor::new(
            ItemKind::Test,
            label,
            base.class_name(),
            arguments,
            Arc::clone(base.registry()),
        )))
    }

    /// Builds the wrapper of a child suite.
    fn wrapper_suite(&self, suite: Suite) -> Suite {
        let (parametrized, plain): (Vec<Label>, Vec<Label>) =
            suite.test_ids.into_iter().partition(|test_id| !self.parameters(test_id).is_empty());
        let mut suite_ids = suite.suite_ids;
        suite_ids.extend(parametrized);
        Suite {
            id: suite.id,
            implicit: suite.implicit,
            test_ids: plain,
            suite_ids,
        }
    }

    /// Looks up a suite, parameter suites first.
    fn find_suite(&self, id: &str) -> Result<Suite, DatabaseError> {
        let label = self.parse_label(id)?;
        if self.is_parameter_suite(&label)? {
            let (directory, parameter) = label.split();
            let suite = self.child.get_suite(directory.as_str())?;
            let join = |member: &Label| member.join([parameter.as_str()]);
            return Ok(Suite::explicit(
                label,
                suite.test_ids.iter().map(join).collect(),
                suite.suite_ids.iter().map(join).collect(),
            ));
        }
        if self.child.has_suite(id)? {
            return Ok(self.wrapper_suite(self.child.get_suite(id)?));
        }
        if self.child.has_test(id)? {
            let variants = self.variants(&label);
            return Ok(Suite::implicit(label, variants, Vec::new()));
        }
        Err(DatabaseError::no_such(ItemKind::Suite, id))
    }

    /// Lists test ids in the parameter view.
    fn test_ids(&self, directory: &Label, recursive: bool) -> Result<Vec<Label>, DatabaseError> {
        if self.child.has_test(directory.as_str())? {
            return Ok(self.variants(directory));
        }
        let mut ids = Vec::new();
        for test_id in self.child.get_test_ids(directory.as_str(), recursive)? {
            let variants = self.variants(&test_id);
            if variants.is_empty() {
                ids.push(test_id);
            } else if recursive {
                ids.extend(variants);
            }
        }
        Ok(ids)
    }

    /// Lists suite ids in the parameter view.
    fn suite_ids(&self, directory: &Label, recursive: bool) -> Result<Vec<Label>, DatabaseError> {
        if self.child.has_test(directory.as_str())? {
            return Ok(Vec::new());
        }
        let mut ids = BTreeSet::new();
        for suite_id in self.child.get_suite_ids(directory.as_str(), recursive)? {
            ids.extend(self.variants(&suite_id));
            ids.insert(suite_id);
        }
        for test_id in self.child.get_test_ids(directory.as_str(), recursive)? {
            if !self.parameters(&test_id).is_empty() {
                ids.insert(test_id);
            }
        }
        Ok(ids.into_iter().collect())
    }
}

impl<P: ParameterSource> Database for ParameterDatabase<P> {
    fn path(&self) -> &Path {
        self.child.path()
    }

    fn label_class(&self) -> LabelClass {
        self.child.label_class()
    }

    fn registry(&self) -> &Arc<ExtensionRegistry> {
        self.child.registry()
    }

    fn get_test(&self, id: &str) -> Result<TestDescriptor, DatabaseError> {
        observe(self.observer.as_ref(), DATABASE_NAME, ItemKind::Test, id, self.find_test(id))
    }

    fn get_resource(&self, id: &str) -> Result<ResourceDescriptor, DatabaseError> {
        observe(self.observer.as_ref(), DATABASE_NAME, ItemKind::Resource, id, self.child.get_resource(id))
    }

    fn get_suite(&self, id: &str) -> Result<Suite, DatabaseError> {
        observe(self.observer.as_ref(), DATABASE_NAME, ItemKind::Suite, id, self.find_suite(id))
    }

    fn has_test(&self, id: &str) -> Result<bool, DatabaseError> {
        let Ok(label) = self.parse_label(id) else {
            return Ok(false);
        };
        Ok(self.is_parametrized_test(&label)? || self.child.has_test(id)?)
    }

    fn has_suite(&self, id: &str) -> Result<bool, DatabaseError> {
        let Ok(label) = self.parse_label(id) else {
            return Ok(false);
        };
        Ok(self.is_parameter_suite(&label)? || self.child.has_suite(id)? || self.child.has_test(id)?)
    }

    fn get_ids(
        &self,
        kind: ItemKind,
        directory: &str,
        recursive: bool,
    ) -> Result<Vec<Label>, DatabaseError> {
        let directory = self.parse_label(directory)?;
        match kind {
            ItemKind::Test => self.test_ids(&directory, recursive),
            ItemKind::Suite => self.suite_ids(&directory, recursive),
            ItemKind::Resource => {
                if self.child.has_test(directory.as_str())? {
                    return Ok(Vec::new());
                }
                self.child.get_resource_ids(directory.as_str(), recursive)
            }
        }
    }

    fn get_subdirectories(&self, directory: &str) -> Result<Vec<Label>, DatabaseError> {
        if self.child.has_test(directory)? {
            return Ok(Vec::new());
        }
        let mut subdirectories = self.child.get_subdirectories(directory)?;
        for test_id in self.child.get_test_ids(directory, false)? {
            if !self.parameters(&test_id).is_empty() {
                subdirectories.push(test_id.basename());
            }
        }
        Ok(subdirectories)
    }

    fn all_test_and_suite_ids(&self, suite: &Suite) -> Result<ExpandedIds, DatabaseError> {
        if self.is_parameter_suite(&suite.id)? || !self.child.has_suite(suite.id.as_str())? {
            return collect_suite_members(self, suite);
        }
        let child_suite = self.child.get_suite(suite.id.as_str())?;
        let members = self.child.all_test_and_suite_ids(&child_suite)?;
        let mut expanded = ExpandedIds {
            test_ids: Vec::new(),
            suite_ids: members.suite_ids,
        };
        for test_id in members.test_ids {
            let variants = self.variants(&test_id);
            if variants.is_empty() {
                expanded.test_ids.push(test_id);
            } else {
                expanded.suite_ids.push(test_id);
                expanded.test_ids.extend(variants);
            }
        }
        debug!(
            suite = suite.id.as_str(),
            tests = expanded.test_ids.len(),
            suites = expanded.suite_ids.len(),
            "expanded wrapper suite"
        );
        Ok(expanded)
    }
}
