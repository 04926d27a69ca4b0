// crates/suitebase-core/src/extension.rs
// ============================================================================
// Module: Extension Registry
// Description: Registry of pluggable extension classes and their schemas.
// Purpose: Merge, cache, and validate argument schemas across class hierarchies.
// Dependencies: thiserror, tracing
// ============================================================================

//! ## Overview
//! Extension classes are registered explicitly with an [`ExtensionRegistry`].
//! Each class declares its own fields through a builder function and names
//! its bases in an `extends` list. The registry merges the declared fields of
//! the class and all of its ancestors into a [`ClassSchema`]:
//! - Ancestors are visited in C3 linearization order, most-derived first.
//! - A field name claimed by a more-derived class shadows the same name in
//!   every ancestor.
//! - A field name may not collide with a reserved (non-field) attribute name
//!   of the class or its ancestors unless the class opts out of the check.
//!
//! Schemas are computed once per class and cached for the registry lifetime.
//! Concurrent first-time computation may run redundantly; exactly one result
//! is published and every caller observes it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::OnceLock;
use std::sync::PoisonError;
use std::sync::RwLock;

use thiserror::Error;
use tracing::debug;

use crate::field::Field;
use crate::field::FieldError;
use crate::value::Arguments;
use crate::value::FieldValue;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors produced while registering classes or computing schemas.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// No class is registered under the name.
    #[error("unknown extension class: `{class}`")]
    UnknownClass {
        /// Requested class name.
        class: String,
    },
    /// A class with the same name is already registered.
    #[error("extension class already registered: `{class}`")]
    DuplicateClass {
        /// Duplicated class name.
        class: String,
    },
    /// A class names a base that is not registered.
    #[error("extension class `{class}` extends unknown class `{base}`")]
    UnknownBase {
        /// Class declaring the base.
        class: String,
        /// Missing base name.
        base: String,
    },
    /// The `extends` graph has a cycle or no consistent linearization.
    #[error("extension class `{class}` has an inconsistent hierarchy")]
    InconsistentHierarchy {
        /// Class whose linearization failed.
        class: String,
    },
    /// A field name collides with a reserved attribute name.
    #[error("field `{field}` of class `{class}` collides with a non-field attribute")]
    FieldConflict {
        /// Class being merged.
        class: String,
        /// Colliding field name.
        field: String,
    },
    /// A class declares the same field name twice.
    #[error("class `{class}` declares field `{field}` more than once")]
    DuplicateField {
        /// Declaring class.
        class: String,
        /// Duplicated field name.
        field: String,
    },
    /// The class is abstract and cannot be instantiated.
    #[error("extension class `{class}` is abstract")]
    AbstractClass {
        /// Abstract class name.
        class: String,
    },
    /// The extension kind name is not recognized.
    #[error("unknown extension kind: `{kind}`")]
    UnknownKind {
        /// Offending kind name.
        kind: String,
    },
}

/// Errors produced while validating argument dictionaries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgumentError {
    /// The class schema could not be computed.
    #[error(transparent)]
    Schema(#[from] SchemaError),
    /// The argument name is not part of the class schema.
    #[error("class `{class}` has no argument named `{name}`")]
    Unknown {
        /// Class being validated.
        class: String,
        /// Unknown argument name.
        name: String,
    },
    /// The argument designates a computed field.
    #[error("argument `{name}` of class `{class}` is computed and cannot be assigned")]
    ComputedAssigned {
        /// Class being validated.
        class: String,
        /// Computed field name.
        name: String,
    },
    /// The argument value was rejected by its field.
    #[error("invalid value for argument `{name}` of class `{class}`: {source}")]
    InvalidValue {
        /// Class being validated.
        class: String,
        /// Argument name.
        name: String,
        /// Field conversion failure.
        source: FieldError,
    },
}

// ============================================================================
// SECTION: Extension Kinds
// ============================================================================

/// Role of an extension class in the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ExtensionKind {
    /// Test class.
    Test,
    /// Resource class.
    Resource,
    /// Database class.
    Database,
    /// Execution target class.
    Target,
    /// Result stream class.
    ResultStream,
    /// Label class.
    Label,
}

impl ExtensionKind {
    /// All kinds in canonical order.
    pub const ALL: [Self; 6] =
        [Self::Test, Self::Resource, Self::Database, Self::Target, Self::ResultStream, Self::Label];

    /// Returns the stable kind name used in the wire form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Test => "test",
            Self::Resource => "resource",
            Self::Database => "database",
            Self::Target => "target",
            Self::ResultStream => "result_stream",
            Self::Label => "label",
        }
    }
}

impl fmt::Display for ExtensionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExtensionKind {
    type Err = SchemaError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == value).ok_or_else(|| {
            SchemaError::UnknownKind {
                kind: value.to_string(),
            }
        })
    }
}

// ============================================================================
// SECTION: Extension Classes
// ============================================================================

/// Builder function returning the fields a class declares itself.
pub type FieldBuilder = fn() -> Vec<Field>;

/// Declares no fields.
const fn no_fields() -> Vec<Field> {
    Vec::new()
}

/// Registration record for one extension class.
///
/// # Invariants
/// - `name` is the fully qualified class name and is unique per registry.
#[derive(Debug, Clone)]
pub struct ExtensionClass {
    /// Fully qualified class name.
    name: String,
    /// Role of the class.
    kind: ExtensionKind,
    /// Documentation text.
    description: String,
    /// Direct bases in declaration order.
    extends: Vec<String>,
    /// Builder for the fields declared by this class.
    fields: FieldBuilder,
    /// Non-field attribute names of this class.
    reserved_names: Vec<String>,
    /// Whether fields may collide with reserved attribute names.
    allow_attribute_collisions: bool,
    /// Whether the class may be instantiated.
    is_abstract: bool,
}

impl ExtensionClass {
    /// Starts a class declaration with no bases and no fields.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: ExtensionKind) -> Self {
        Self {
            name: name.into(),
            kind,
            description: String::new(),
            extends: Vec::new(),
            fields: no_fields,
            reserved_names: Vec::new(),
            allow_attribute_collisions: false,
            is_abstract: false,
        }
    }

    /// Sets the documentation text.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Appends a direct base class.
    #[must_use]
    pub fn extends(mut self, base: impl Into<String>) -> Self {
        self.extends.push(base.into());
        self
    }

    /// Sets the builder for the fields declared by this class.
    #[must_use]
    pub fn with_fields(mut self, fields: FieldBuilder) -> Self {
        self.fields = fields;
        self
    }

    /// Adds non-field attribute names that fields must not reuse.
    #[must_use]
    pub fn with_reserved_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reserved_names.extend(names.into_iter().map(Into::into));
        self
    }

    /// Opts this class out of the attribute collision check.
    #[must_use]
    pub const fn allow_attribute_collisions(mut self) -> Self {
        self.allow_attribute_collisions = true;
        self
    }

    /// Marks the class as abstract.
    #[must_use]
    pub const fn abstract_class(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    /// Returns the fully qualified class name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the class kind.
    #[must_use]
    pub const fn kind(&self) -> ExtensionKind {
        self.kind
    }

    /// Returns the documentation text.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the direct bases.
    #[must_use]
    pub fn bases(&self) -> &[String] {
        &self.extends
    }

    /// Returns the fields declared by this class alone.
    #[must_use]
    pub fn declared_fields(&self) -> Vec<Field> {
        (self.fields)()
    }

    /// Returns true when the class is abstract.
    #[must_use]
    pub const fn is_abstract(&self) -> bool {
        self.is_abstract
    }
}

// ============================================================================
// SECTION: Class Schemas
// ============================================================================

/// Merged, ordered argument schema of one class.
///
/// # Invariants
/// - Field names are unique.
/// - Fields are ordered most-derived class first, then by declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassSchema {
    /// Fully qualified class name.
    class_name: String,
    /// Class kind.
    kind: ExtensionKind,
    /// Whether the class is abstract.
    is_abstract: bool,
    /// C3 linearization, starting with the class itself.
    ancestry: Vec<String>,
    /// Merged fields.
    fields: Vec<Field>,
    /// Field index by name.
    index: BTreeMap<String, usize>,
}

impl ClassSchema {
    /// Returns the fully qualified class name.
    #[must_use]
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Returns the class kind.
    #[must_use]
    pub const fn kind(&self) -> ExtensionKind {
        self.kind
    }

    /// Returns true when the class is abstract.
    #[must_use]
    pub const fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    /// Returns the class linearization, most-derived first.
    #[must_use]
    pub fn ancestry(&self) -> &[String] {
        &self.ancestry
    }

    /// Returns true when `ancestor` is the class itself or one of its bases.
    #[must_use]
    pub fn is_subclass_of(&self, ancestor: &str) -> bool {
        self.ancestry.iter().any(|name| name == ancestor)
    }

    /// Returns the merged fields in schema order.
    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Looks up a field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.index.get(name).and_then(|position| self.fields.get(*position))
    }

    /// Returns the schema field for an assignable argument.
    fn assignable_field(&self, name: &str) -> Result<&Field, ArgumentError> {
        let field = self.field(name).ok_or_else(|| ArgumentError::Unknown {
            class: self.class_name.clone(),
            name: name.to_string(),
        })?;
        if field.is_computed() {
            return Err(ArgumentError::ComputedAssigned {
                class: self.class_name.clone(),
                name: name.to_string(),
            });
        }
        Ok(field)
    }

    /// Converts text arguments into typed values.
    ///
    /// # Errors
    ///
    /// Returns [`ArgumentError::Unknown`] for names outside the schema,
    /// [`ArgumentError::ComputedAssigned`] for computed fields, and
    /// [`ArgumentError::InvalidValue`] when a text value does not parse.
    pub fn validate_arguments(
        &self,
        arguments: &BTreeMap<String, String>,
    ) -> Result<Arguments, ArgumentError> {
        let mut typed = Arguments::new();
        for (name, text) in arguments {
            let field = self.assignable_field(name)?;
            let value = field.parse_text(text).map_err(|source| ArgumentError::InvalidValue {
                class: self.class_name.clone(),
                name: name.clone(),
                source,
            })?;
            typed.insert(name.clone(), value);
        }
        Ok(typed)
    }

    /// Validates already-typed argument values.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`ClassSchema::validate_arguments`].
    pub fn validate_values(&self, arguments: &Arguments) -> Result<Arguments, ArgumentError> {
        let mut validated = Arguments::new();
        for (name, value) in arguments {
            let field = self.assignable_field(name)?;
            let value = field.validate(value).map_err(|source| ArgumentError::InvalidValue {
                class: self.class_name.clone(),
                name: name.clone(),
                source,
            })?;
            validated.insert(name.clone(), value);
        }
        Ok(validated)
    }

    /// Builds an extension instance from explicit and computed values.
    ///
    /// Every schema field receives the explicit value when given, else the
    /// computed context value when the field is computed, else its default.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::AbstractClass`] for abstract classes and the
    /// errors of [`ClassSchema::validate_values`] for explicit values.
    pub fn instantiate(
        self: &Arc<Self>,
        explicit: &Arguments,
        computed: &Arguments,
    ) -> Result<Extension, ArgumentError> {
        if self.is_abstract {
            return Err(SchemaError::AbstractClass {
                class: self.class_name.clone(),
            }
            .into());
        }
        let explicit = self.validate_values(explicit)?;
        let mut arguments = Arguments::new();
        for field in &self.fields {
            let value = explicit
                .get(field.name())
                .cloned()
                .or_else(|| {
                    if field.is_computed() { computed.get(field.name()).cloned() } else { None }
                })
                .unwrap_or_else(|| field.default_value());
            arguments.insert(field.name().to_string(), value);
        }
        Ok(Extension {
            schema: Arc::clone(self),
            explicit,
            arguments,
        })
    }
}

// ============================================================================
// SECTION: Extensions
// ============================================================================

/// Instance of an extension class with its resolved arguments.
///
/// # Invariants
/// - `arguments` holds a value for every field in `schema`.
/// - `explicit` holds only non-computed, caller-supplied values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extension {
    /// Schema of the instantiated class.
    schema: Arc<ClassSchema>,
    /// Caller-supplied arguments.
    explicit: Arguments,
    /// Resolved value for every schema field.
    arguments: Arguments,
}

impl Extension {
    /// Returns the fully qualified class name.
    #[must_use]
    pub fn class_name(&self) -> &str {
        self.schema.class_name()
    }

    /// Returns the extension kind.
    #[must_use]
    pub fn kind(&self) -> ExtensionKind {
        self.schema.kind()
    }

    /// Returns the class schema.
    #[must_use]
    pub const fn schema(&self) -> &Arc<ClassSchema> {
        &self.schema
    }

    /// Returns the caller-supplied arguments.
    #[must_use]
    pub const fn explicit_arguments(&self) -> &Arguments {
        &self.explicit
    }

    /// Returns the resolved value of every schema field.
    #[must_use]
    pub const fn arguments(&self) -> &Arguments {
        &self.arguments
    }

    /// Returns the resolved value of one argument.
    #[must_use]
    pub fn argument(&self, name: &str) -> Option<&FieldValue> {
        self.arguments.get(name)
    }
}

// ============================================================================
// SECTION: Class Loader
// ============================================================================

/// Resolves fully qualified class names to their schemas.
pub trait ClassLoader: Send + Sync {
    /// Loads the schema of `class`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`] when the class is unknown or its schema is
    /// invalid.
    fn load_class(&self, class: &str) -> Result<Arc<ClassSchema>, SchemaError>;
}

// ============================================================================
// SECTION: Registry
// ============================================================================

/// Registered class plus its lazily computed schema.
#[derive(Debug)]
struct RegisteredClass {
    /// Registration record.
    class: ExtensionClass,
    /// Cached merged schema.
    schema: OnceLock<Arc<ClassSchema>>,
}

/// Registry of extension classes keyed by fully qualified name.
///
/// # Invariants
/// - Class names are unique; registration never replaces a class.
/// - A published schema never changes for the registry lifetime.
#[derive(Debug, Default)]
pub struct ExtensionRegistry {
    /// Registered classes keyed by name.
    classes: RwLock<BTreeMap<String, Arc<RegisteredClass>>>,
}

impl ExtensionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a class.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::DuplicateClass`] when the name is taken.
    pub fn register(&self, class: ExtensionClass) -> Result<(), SchemaError> {
        let mut classes = self.classes.write().unwrap_or_else(PoisonError::into_inner);
        if classes.contains_key(class.name()) {
            return Err(SchemaError::DuplicateClass {
                class: class.name().to_string(),
            });
        }
        debug!(class = class.name(), kind = class.kind().as_str(), "registered extension class");
        classes.insert(
            class.name().to_string(),
            Arc::new(RegisteredClass {
                class,
                schema: OnceLock::new(),
            }),
        );
        Ok(())
    }

    /// Returns true when a class is registered under `class`.
    #[must_use]
    pub fn contains(&self, class: &str) -> bool {
        self.classes.read().unwrap_or_else(PoisonError::into_inner).contains_key(class)
    }

    /// Returns the registration record of `class`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::UnknownClass`] when the class is not registered.
    pub fn class(&self, class: &str) -> Result<ExtensionClass, SchemaError> {
        self.registered(class).map(|registered| registered.class.clone())
    }

    /// Lists registered class names, optionally filtered by kind.
    #[must_use]
    pub fn class_names(&self, kind: Option<ExtensionKind>) -> Vec<String> {
        let classes = self.classes.read().unwrap_or_else(PoisonError::into_inner);
        classes
            .values()
            .filter(|registered| kind.is_none_or(|kind| registered.class.kind() == kind))
            .map(|registered| registered.class.name().to_string())
            .collect()
    }

    /// Returns the merged argument schema of `class`.
    ///
    /// The schema is computed on first use and cached.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`] when the class or an ancestor is unknown, the
    /// hierarchy is inconsistent, or a field name conflicts.
    pub fn class_arguments(&self, class: &str) -> Result<Arc<ClassSchema>, SchemaError> {
        let registered = self.registered(class)?;
        if let Some(schema) = registered.schema.get() {
            return Ok(Arc::clone(schema));
        }
        let computed = Arc::new(self.compute_schema(&registered.class)?);
        Ok(Arc::clone(registered.schema.get_or_init(|| computed)))
    }

    /// Validates text arguments against the schema of `class`.
    ///
    /// # Errors
    ///
    /// See [`ClassSchema::validate_arguments`].
    pub fn validate_arguments(
        &self,
        class: &str,
        arguments: &BTreeMap<String, String>,
    ) -> Result<Arguments, ArgumentError> {
        self.class_arguments(class)?.validate_arguments(arguments)
    }

    /// Validates typed arguments against the schema of `class`.
    ///
    /// # Errors
    ///
    /// See [`ClassSchema::validate_values`].
    pub fn validate_values(
        &self,
        class: &str,
        arguments: &Arguments,
    ) -> Result<Arguments, ArgumentError> {
        self.class_arguments(class)?.validate_values(arguments)
    }

    /// Instantiates `class` with explicit and computed argument values.
    ///
    /// # Errors
    ///
    /// See [`ClassSchema::instantiate`].
    pub fn instantiate(
        &self,
        class: &str,
        explicit: &Arguments,
        computed: &Arguments,
    ) -> Result<Extension, ArgumentError> {
        self.class_arguments(class)?.instantiate(explicit, computed)
    }

    /// Returns the registration entry for `class`.
    fn registered(&self, class: &str) -> Result<Arc<RegisteredClass>, SchemaError> {
        let classes = self.classes.read().unwrap_or_else(PoisonError::into_inner);
        classes.get(class).cloned().ok_or_else(|| SchemaError::UnknownClass {
            class: class.to_string(),
        })
    }

    /// Merges the declared fields of `class` and its ancestors.
    fn compute_schema(&self, class: &ExtensionClass) -> Result<ClassSchema, SchemaError> {
        let ancestry = self.linearize(class.name(), &mut Vec::new())?;
        let mut ancestors = Vec::with_capacity(ancestry.len());
        for name in &ancestry {
            ancestors.push(self.registered(name)?);
        }

        let reserved: BTreeSet<&str> = ancestors
            .iter()
            .flat_map(|registered| registered.class.reserved_names.iter().map(String::as_str))
            .collect();
        let mut fields: Vec<Field> = Vec::new();
        let mut index = BTreeMap::new();
        for registered in &ancestors {
            let mut declared_here = BTreeSet::new();
            for field in registered.class.declared_fields() {
                if !declared_here.insert(field.name().to_string()) {
                    return Err(SchemaError::DuplicateField {
                        class: registered.class.name().to_string(),
                        field: field.name().to_string(),
                    });
                }
                if index.contains_key(field.name()) {
                    continue;
                }
                if !class.allow_attribute_collisions && reserved.contains(field.name()) {
                    return Err(SchemaError::FieldConflict {
                        class: class.name().to_string(),
                        field: field.name().to_string(),
                    });
                }
                index.insert(field.name().to_string(), fields.len());
                fields.push(field);
            }
        }
        debug!(class = class.name(), fields = fields.len(), "computed extension class schema");
        Ok(ClassSchema {
            class_name: class.name().to_string(),
            kind: class.kind(),
            is_abstract: class.is_abstract(),
            ancestry,
            fields,
            index,
        })
    }

    /// Computes the C3 linearization of `class`.
    fn linearize(&self, class: &str, visiting: &mut Vec<String>) -> Result<Vec<String>, SchemaError> {
        if visiting.iter().any(|name| name == class) {
            return Err(SchemaError::InconsistentHierarchy {
                class: class.to_string(),
            });
        }
        let registered = self.registered(class)?;
        let bases = registered.class.bases();
        visiting.push(class.to_string());
        let mut sequences = Vec::with_capacity(bases.len() + 1);
        for base in bases {
            if !self.contains(base) {
                return Err(SchemaError::UnknownBase {
                    class: class.to_string(),
                    base: base.clone(),
                });
            }
            sequences.push(self.linearize(base, visiting)?);
        }
        visiting.pop();
        sequences.push(bases.to_vec());

        let mut result = vec![class.to_string()];
        loop {
            sequences.retain(|sequence| !sequence.is_empty());
            if sequences.is_empty() {
                return Ok(result);
            }
            let candidate = sequences.iter().find_map(|sequence| {
                let head = sequence.first()?;
                let blocked = sequences.iter().any(|other| other.iter().skip(1).any(|name| name == head));
                if blocked { None } else { Some(head.clone()) }
            });
            let Some(next) = candidate else {
                return Err(SchemaError::InconsistentHierarchy {
                    class: class.to_string(),
                });
            };
            for sequence in &mut sequences {
                if sequence.first() == Some(&next) {
                    sequence.remove(0);
                }
            }
            result.push(next);
        }
    }
}

impl ClassLoader for ExtensionRegistry {
    fn load_class(&self, class: &str) -> Result<Arc<ClassSchema>, SchemaError> {
        self.class_arguments(class)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
