// crates/suitebase-core/src/field.rs
// ============================================================================
// Module: Suitebase Fields
// Description: Typed, validated schema entries for extension arguments.
// Purpose: Validate, parse, format, and encode argument values per field type.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! A [`Field`] declares one named argument of an extension class: its type,
//! documentation, default value, and whether it is computed. Fields own the
//! conversions between the three representations of an argument value:
//! caller-supplied text, typed [`FieldValue`]s, and structured
//! [`ValueNode`]s used by the wire form.
//!
//! Text lists (sets, tuples, dictionaries) are whitespace-separated. Items
//! containing whitespace, quotes, or backslashes are wrapped in double
//! quotes, with `\"` and `\\` escaping inside quotes. Dictionary items are
//! written as `key=value`.
//!
//! Security posture: text and node inputs are untrusted; every conversion
//! returns an error instead of panicking.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

use crate::value::Attachment;
use crate::value::FieldValue;
use crate::value::ValueNode;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors produced while converting or validating field values.
///
/// # Invariants
/// - Every variant names the field that rejected the value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    /// The value has the wrong shape for the field type.
    #[error("field `{field}` expects {expected}, found {found}")]
    TypeMismatch {
        /// Field name.
        field: String,
        /// Description of the expected type.
        expected: String,
        /// Name of the supplied value variant.
        found: &'static str,
    },
    /// Text could not be parsed as a value of the field type.
    #[error("field `{field}` cannot parse `{text}`: {reason}")]
    InvalidText {
        /// Field name.
        field: String,
        /// Offending text.
        text: String,
        /// Parse failure detail.
        reason: String,
    },
    /// The value is not one of the field's enumerals.
    #[error("field `{field}` has no enumeral `{value}` (expected one of {enumerals:?})")]
    UnknownEnumeral {
        /// Field name.
        field: String,
        /// Offending value.
        value: String,
        /// Accepted enumerals.
        enumerals: Vec<String>,
    },
    /// A tuple value has the wrong number of components.
    #[error("field `{field}` expects {expected} tuple components, found {found}")]
    TupleArity {
        /// Field name.
        field: String,
        /// Number of declared components.
        expected: usize,
        /// Number of supplied components.
        found: usize,
    },
    /// The field type has no text form.
    #[error("field `{field}` cannot be given as text")]
    NotTextual {
        /// Field name.
        field: String,
    },
    /// A structured node does not match the field type.
    #[error("field `{field}` expects a `{expected}` node, found `{found}`")]
    NodeMismatch {
        /// Field name.
        field: String,
        /// Expected node tag.
        expected: &'static str,
        /// Supplied node tag.
        found: &'static str,
    },
    /// Attachment resolution failed.
    #[error("field `{field}` attachment error: {message}")]
    Attachment {
        /// Field name.
        field: String,
        /// Resolver failure detail.
        message: String,
    },
    /// A quoted text list item is not terminated.
    #[error("field `{field}` has an unterminated quote in `{text}`")]
    UnbalancedQuote {
        /// Field name.
        field: String,
        /// Offending text.
        text: String,
    },
}

// ============================================================================
// SECTION: Collaborators
// ============================================================================

/// Resolves attachment metadata read from a structured node against the
/// attachment store.
pub trait AttachmentResolver {
    /// Resolves `attachment`, returning the metadata to store in the value.
    ///
    /// # Errors
    ///
    /// Returns a message when the attachment cannot be resolved.
    fn resolve(&self, attachment: Attachment) -> Result<Attachment, String>;
}

// ============================================================================
// SECTION: Field Types
// ============================================================================

/// Kind of item a reference field points to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    /// Test id.
    Test,
    /// Resource id.
    Resource,
    /// Suite id.
    Suite,
}

impl ReferenceKind {
    /// Returns the stable name of the referenced kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Test => "test",
            Self::Resource => "resource",
            Self::Suite => "suite",
        }
    }
}

/// Type of a field, including contained fields for composite types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    /// Free text.
    Text {
        /// Whether the value may span multiple lines verbatim.
        multiline: bool,
    },
    /// Signed 64-bit integer.
    Integer,
    /// Boolean flag.
    Boolean,
    /// One of a fixed list of enumerals.
    Enumeration {
        /// Accepted enumerals in declaration order.
        enumerals: Vec<String>,
    },
    /// Ordered collection of values of the contained field.
    Set(Box<Field>),
    /// Fixed-arity sequence of component fields.
    Tuple(Vec<Field>),
    /// Text-keyed mapping to values of the contained field.
    Dictionary(Box<Field>),
    /// Id of another stored item.
    Reference(ReferenceKind),
    /// Blob-valued attachment.
    Attachment,
}

impl FieldType {
    /// Returns the short type name used in listings.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Text {
                ..
            } => "text",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Enumeration {
                ..
            } => "enumeration",
            Self::Set(_) => "set",
            Self::Tuple(_) => "tuple",
            Self::Dictionary(_) => "dictionary",
            Self::Reference(_) => "reference",
            Self::Attachment => "attachment",
        }
    }
}

// ============================================================================
// SECTION: Field
// ============================================================================

/// One named, typed argument of an extension class.
///
/// # Invariants
/// - `name` is non-empty and unique within a merged class schema.
/// - Computed fields never accept caller-supplied values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Argument name.
    name: String,
    /// Display title; empty means the name is used.
    title: String,
    /// Documentation text.
    description: String,
    /// Value type.
    field_type: FieldType,
    /// Explicit default; `None` uses the type default.
    default: Option<FieldValue>,
    /// Whether the value is derived rather than supplied.
    computed: bool,
}

impl Field {
    /// Creates a field of the given type with no documentation.
    #[must_use]
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            title: String::new(),
            description: String::new(),
            field_type,
            default: None,
            computed: false,
        }
    }

    /// Creates a single-line text field.
    #[must_use]
    pub fn text(name: impl Into<String>) -> Self {
        Self::new(
            name,
            FieldType::Text {
                multiline: false,
            },
        )
    }

    /// Creates a multi-line text field.
    #[must_use]
    pub fn multiline_text(name: impl Into<String>) -> Self {
        Self::new(
            name,
            FieldType::Text {
                multiline: true,
            },
        )
    }

    /// Creates an integer field.
    #[must_use]
    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Integer)
    }

    /// Creates a boolean field.
    #[must_use]
    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Boolean)
    }

    /// Creates an enumeration field over `enumerals`.
    #[must_use]
    pub fn enumeration<I, S>(name: impl Into<String>, enumerals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            name,
            FieldType::Enumeration {
                enumerals: enumerals.into_iter().map(Into::into).collect(),
            },
        )
    }

    /// Creates a set field whose elements are described by `contained`.
    #[must_use]
    pub fn set(name: impl Into<String>, contained: Self) -> Self {
        Self::new(name, FieldType::Set(Box::new(contained)))
    }

    /// Creates a tuple field with the given component fields.
    #[must_use]
    pub fn tuple(name: impl Into<String>, components: Vec<Self>) -> Self {
        Self::new(name, FieldType::Tuple(components))
    }

    /// Creates a dictionary field whose values are described by `contained`.
    #[must_use]
    pub fn dictionary(name: impl Into<String>, contained: Self) -> Self {
        Self::new(name, FieldType::Dictionary(Box::new(contained)))
    }

    /// Creates a reference field pointing at items of `kind`.
    #[must_use]
    pub fn reference(name: impl Into<String>, kind: ReferenceKind) -> Self {
        Self::new(name, FieldType::Reference(kind))
    }

    /// Creates an attachment field.
    #[must_use]
    pub fn attachment(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Attachment)
    }

    /// Sets the display title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Sets the documentation text.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets an explicit default value.
    #[must_use]
    pub fn with_default(mut self, value: FieldValue) -> Self {
        self.default = Some(value);
        self
    }

    /// Marks the field as computed.
    #[must_use]
    pub const fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    /// Returns the argument name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the display title, falling back to the name.
    #[must_use]
    pub fn title(&self) -> &str {
        if self.title.is_empty() { &self.name } else { &self.title }
    }

    /// Returns the documentation text.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the field type.
    #[must_use]
    pub const fn field_type(&self) -> &FieldType {
        &self.field_type
    }

    /// Returns true when the field is computed.
    #[must_use]
    pub const fn is_computed(&self) -> bool {
        self.computed
    }

    /// Returns the default value: the explicit default, else the type's.
    #[must_use]
    pub fn default_value(&self) -> FieldValue {
        if let Some(value) = &self.default {
            return value.clone();
        }
        match &self.field_type {
            FieldType::Text {
                ..
            } => FieldValue::Text(String::new()),
            FieldType::Integer => FieldValue::Integer(0),
            FieldType::Boolean => FieldValue::Boolean(false),
            FieldType::Enumeration {
                enumerals,
            } => enumerals.first().map_or(FieldValue::Null, |first| FieldValue::text(first.clone())),
            FieldType::Set(_) => FieldValue::List(Vec::new()),
            FieldType::Tuple(components) => {
                FieldValue::List(components.iter().map(Self::default_value).collect())
            }
            FieldType::Dictionary(_) => FieldValue::Map(BTreeMap::new()),
            FieldType::Reference(_) | FieldType::Attachment => FieldValue::Null,
        }
    }

    /// Returns a human-readable description of the accepted values.
    #[must_use]
    pub fn describe(&self) -> String {
        match &self.field_type {
            FieldType::Text {
                multiline: false,
            } => "a string".to_string(),
            FieldType::Text {
                multiline: true,
            } => "a multi-line string".to_string(),
            FieldType::Integer => "an integer".to_string(),
            FieldType::Boolean => "a boolean".to_string(),
            FieldType::Enumeration {
                enumerals,
            } => format!("an enumeration of \"{}\"", enumerals.join("\", \"")),
            FieldType::Set(contained) => format!("a set of {}", contained.describe()),
            FieldType::Tuple(components) => {
                let parts: Vec<String> = components.iter().map(Self::describe).collect();
                format!("a tuple of ({})", parts.join(", "))
            }
            FieldType::Dictionary(contained) => {
                format!("a dictionary of {}", contained.describe())
            }
            FieldType::Reference(kind) => format!("a {} id", kind.as_str()),
            FieldType::Attachment => "an attachment".to_string(),
        }
    }

    // ------------------------------------------------------------------------
    // Validation
    // ------------------------------------------------------------------------

    /// Checks `value` against the field type and returns the normalized
    /// value.
    ///
    /// Scalar fields accept text and convert it with [`Field::parse_text`].
    ///
    /// # Errors
    ///
    /// Returns [`FieldError`] when the value does not fit the field type.
    pub fn validate(&self, value: &FieldValue) -> Result<FieldValue, FieldError> {
        match (&self.field_type, value) {
            (
                FieldType::Text {
                    multiline,
                },
                FieldValue::Text(text),
            ) => Ok(FieldValue::Text(if *multiline {
                text.clone()
            } else {
                text.trim_start().to_string()
            })),
            (
                FieldType::Text {
                    ..
                },
                FieldValue::Integer(number),
            ) => Ok(FieldValue::Text(number.to_string())),
            (FieldType::Integer, FieldValue::Integer(_))
            | (FieldType::Boolean, FieldValue::Boolean(_))
            | (FieldType::Reference(_) | FieldType::Attachment, FieldValue::Null)
            | (FieldType::Attachment, FieldValue::Attachment(_)) => Ok(value.clone()),
            (
                FieldType::Integer
                | FieldType::Boolean
                | FieldType::Enumeration {
                    ..
                }
                | FieldType::Reference(_),
                FieldValue::Text(text),
            ) => self.parse_text(text),
            (FieldType::Set(contained), FieldValue::List(items)) => Ok(FieldValue::List(
                items.iter().map(|item| contained.validate(item)).collect::<Result<_, _>>()?,
            )),
            (FieldType::Tuple(components), FieldValue::List(items)) => {
                if components.len() != items.len() {
                    return Err(FieldError::TupleArity {
                        field: self.name.clone(),
                        expected: components.len(),
                        found: items.len(),
                    });
                }
                Ok(FieldValue::List(
                    components
                        .iter()
                        .zip(items)
                        .map(|(component, item)| component.validate(item))
                        .collect::<Result<_, _>>()?,
                ))
            }
            (FieldType::Dictionary(contained), FieldValue::Map(items)) => {
                let mut validated = BTreeMap::new();
                for (key, item) in items {
                    validated.insert(key.clone(), contained.validate(item)?);
                }
                Ok(FieldValue::Map(validated))
            }
            (_, other) => Err(self.type_mismatch(other)),
        }
    }

    /// Builds a type mismatch error for `found`.
    fn type_mismatch(&self, found: &FieldValue) -> FieldError {
        FieldError::TypeMismatch {
            field: self.name.clone(),
            expected: self.describe(),
            found: found.type_name(),
        }
    }

    // ------------------------------------------------------------------------
    // Text form
    // ------------------------------------------------------------------------

    /// Parses the text form of a value.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError`] when the text is malformed or the field type
    /// has no text form.
    pub fn parse_text(&self, text: &str) -> Result<FieldValue, FieldError> {
        match &self.field_type {
            FieldType::Text {
                ..
            } => self.validate(&FieldValue::text(text)),
            FieldType::Integer => text.trim().parse::<i64>().map(FieldValue::Integer).map_err(
                |err| FieldError::InvalidText {
                    field: self.name.clone(),
                    text: text.to_string(),
                    reason: err.to_string(),
                },
            ),
            FieldType::Boolean => match text.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" => Ok(FieldValue::Boolean(true)),
                "false" | "no" | "0" => Ok(FieldValue::Boolean(false)),
                _ => Err(FieldError::InvalidText {
                    field: self.name.clone(),
                    text: text.to_string(),
                    reason: "expected true or false".to_string(),
                }),
            },
            FieldType::Enumeration {
                enumerals,
            } => {
                if enumerals.iter().any(|enumeral| enumeral == text) {
                    Ok(FieldValue::text(text))
                } else {
                    Err(FieldError::UnknownEnumeral {
                        field: self.name.clone(),
                        value: text.to_string(),
                        enumerals: enumerals.clone(),
                    })
                }
            }
            FieldType::Reference(_) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    Ok(FieldValue::Null)
                } else {
                    Ok(FieldValue::text(trimmed))
                }
            }
            FieldType::Set(contained) => Ok(FieldValue::List(
                self.split_list(text)?
                    .iter()
                    .map(|item| contained.parse_text(item))
                    .collect::<Result<_, _>>()?,
            )),
            FieldType::Tuple(components) => {
                let items = self.split_list(text)?;
                if items.len() != components.len() {
                    return Err(FieldError::TupleArity {
                        field: self.name.clone(),
                        expected: components.len(),
                        found: items.len(),
                    });
                }
                Ok(FieldValue::List(
                    components
                        .iter()
                        .zip(&items)
                        .map(|(component, item)| component.parse_text(item))
                        .collect::<Result<_, _>>()?,
                ))
            }
            FieldType::Dictionary(contained) => {
                let mut map = BTreeMap::new();
                for item in self.split_list(text)? {
                    let Some((key, value)) = item.split_once('=') else {
                        return Err(FieldError::InvalidText {
                            field: self.name.clone(),
                            text: item,
                            reason: "dictionary items must be key=value".to_string(),
                        });
                    };
                    map.insert(key.to_string(), contained.parse_text(value)?);
                }
                Ok(FieldValue::Map(map))
            }
            FieldType::Attachment => Err(FieldError::NotTextual {
                field: self.name.clone(),
            }),
        }
    }

    /// Formats a value in its text form, the inverse of
    /// [`Field::parse_text`].
    ///
    /// # Errors
    ///
    /// Returns [`FieldError`] when the value does not fit the field type or
    /// the type has no text form.
    pub fn format_text(&self, value: &FieldValue) -> Result<String, FieldError> {
        match (&self.field_type, value) {
            (FieldType::Attachment, _) => Err(FieldError::NotTextual {
                field: self.name.clone(),
            }),
            (FieldType::Reference(_), FieldValue::Null) => Ok(String::new()),
            (
                FieldType::Text {
                    ..
                }
                | FieldType::Enumeration {
                    ..
                }
                | FieldType::Reference(_),
                FieldValue::Text(text),
            ) => Ok(text.clone()),
            (FieldType::Integer, FieldValue::Integer(number)) => Ok(number.to_string()),
            (FieldType::Boolean, FieldValue::Boolean(flag)) => Ok(flag.to_string()),
            (FieldType::Set(contained), FieldValue::List(items)) => {
                let parts: Vec<String> =
                    items.iter().map(|item| contained.format_text(item)).collect::<Result<_, _>>()?;
                Ok(join_text_list(&parts))
            }
            (FieldType::Tuple(components), FieldValue::List(items))
                if components.len() == items.len() =>
            {
                let parts: Vec<String> = components
                    .iter()
                    .zip(items)
                    .map(|(component, item)| component.format_text(item))
                    .collect::<Result<_, _>>()?;
                Ok(join_text_list(&parts))
            }
            (FieldType::Dictionary(contained), FieldValue::Map(items)) => {
                let mut parts = Vec::with_capacity(items.len());
                for (key, item) in items {
                    parts.push(format!("{key}={}", contained.format_text(item)?));
                }
                Ok(join_text_list(&parts))
            }
            (_, other) => Err(self.type_mismatch(other)),
        }
    }

    /// Splits a text list, attributing quote errors to this field.
    fn split_list(&self, text: &str) -> Result<Vec<String>, FieldError> {
        split_text_list(text).ok_or_else(|| FieldError::UnbalancedQuote {
            field: self.name.clone(),
            text: text.to_string(),
        })
    }

    // ------------------------------------------------------------------------
    // Structured form
    // ------------------------------------------------------------------------

    /// Encodes a value as a structured node.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::TypeMismatch`] when the value does not fit the
    /// field type.
    pub fn to_node(&self, value: &FieldValue) -> Result<ValueNode, FieldError> {
        match (&self.field_type, value) {
            (
                FieldType::Text {
                    ..
                }
                | FieldType::Reference(_),
                FieldValue::Text(text),
            ) => Ok(ValueNode::Text(text.clone())),
            (FieldType::Reference(_), FieldValue::Null) => Ok(ValueNode::Text(String::new())),
            (FieldType::Integer, FieldValue::Integer(number)) => Ok(ValueNode::Integer(*number)),
            (FieldType::Boolean, FieldValue::Boolean(flag)) => Ok(ValueNode::Boolean(*flag)),
            (
                FieldType::Enumeration {
                    ..
                },
                FieldValue::Text(text),
            ) => Ok(ValueNode::Enumeral(text.clone())),
            (FieldType::Set(contained), FieldValue::List(items)) => Ok(ValueNode::Set(
                items.iter().map(|item| contained.to_node(item)).collect::<Result<_, _>>()?,
            )),
            (FieldType::Tuple(components), FieldValue::List(items))
                if components.len() == items.len() =>
            {
                Ok(ValueNode::Tuple(
                    components
                        .iter()
                        .zip(items)
                        .map(|(component, item)| component.to_node(item))
                        .collect::<Result<_, _>>()?,
                ))
            }
            (FieldType::Dictionary(contained), FieldValue::Map(items)) => {
                let mut nodes = BTreeMap::new();
                for (key, item) in items {
                    nodes.insert(key.clone(), contained.to_node(item)?);
                }
                Ok(ValueNode::Dictionary(nodes))
            }
            (FieldType::Attachment, FieldValue::Attachment(attachment)) => {
                Ok(ValueNode::Attachment(attachment.clone()))
            }
            (_, other) => Err(self.type_mismatch(other)),
        }
    }

    /// Decodes a structured node into a validated value.
    ///
    /// Attachment nodes are passed through `resolver` when one is supplied.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError`] when the node shape does not match the field
    /// type, the decoded value fails validation, or attachment resolution
    /// fails.
    pub fn from_node(
        &self,
        node: &ValueNode,
        resolver: Option<&dyn AttachmentResolver>,
    ) -> Result<FieldValue, FieldError> {
        match (&self.field_type, node) {
            (
                FieldType::Text {
                    ..
                }
                | FieldType::Reference(_),
                ValueNode::Text(text),
            )
            | (
                FieldType::Enumeration {
                    ..
                },
                ValueNode::Enumeral(text),
            ) => self.parse_text(text),
            (FieldType::Integer, ValueNode::Integer(number)) => Ok(FieldValue::Integer(*number)),
            (FieldType::Boolean, ValueNode::Boolean(flag)) => Ok(FieldValue::Boolean(*flag)),
            (FieldType::Set(contained), ValueNode::Set(nodes)) => Ok(FieldValue::List(
                nodes
                    .iter()
                    .map(|item| contained.from_node(item, resolver))
                    .collect::<Result<_, _>>()?,
            )),
            (FieldType::Tuple(components), ValueNode::Tuple(nodes)) => {
                if components.len() != nodes.len() {
                    return Err(FieldError::TupleArity {
                        field: self.name.clone(),
                        expected: components.len(),
                        found: nodes.len(),
                    });
                }
                Ok(FieldValue::List(
                    components
                        .iter()
                        .zip(nodes)
                        .map(|(component, item)| component.from_node(item, resolver))
                        .collect::<Result<_, _>>()?,
                ))
            }
            (FieldType::Dictionary(contained), ValueNode::Dictionary(nodes)) => {
                let mut map = BTreeMap::new();
                for (key, item) in nodes {
                    map.insert(key.clone(), contained.from_node(item, resolver)?);
                }
                Ok(FieldValue::Map(map))
            }
            (FieldType::Attachment, ValueNode::Attachment(attachment)) => {
                let attachment = match resolver {
                    Some(resolver) => resolver.resolve(attachment.clone()).map_err(|message| {
                        FieldError::Attachment {
                            field: self.name.clone(),
                            message,
                        }
                    })?,
                    None => attachment.clone(),
                };
                Ok(FieldValue::Attachment(attachment))
            }
            (field_type, other) => Err(FieldError::NodeMismatch {
                field: self.name.clone(),
                expected: expected_tag(field_type),
                found: other.tag(),
            }),
        }
    }

    // ------------------------------------------------------------------------
    // Reference rewriting
    // ------------------------------------------------------------------------

    /// Returns true when values of this field may contain item references.
    #[must_use]
    pub fn has_references(&self) -> bool {
        match &self.field_type {
            FieldType::Reference(_) => true,
            FieldType::Set(contained) | FieldType::Dictionary(contained) => {
                contained.has_references()
            }
            FieldType::Tuple(components) => components.iter().any(Self::has_references),
            _ => false,
        }
    }

    /// Rewrites every item id inside `value` with `rewrite`, descending into
    /// sets, tuples, and dictionaries.
    ///
    /// Values that do not match the field type are returned unchanged.
    #[must_use]
    pub fn rewrite_references(
        &self,
        value: &FieldValue,
        rewrite: &dyn Fn(&str) -> String,
    ) -> FieldValue {
        match (&self.field_type, value) {
            (FieldType::Reference(_), FieldValue::Text(id)) => FieldValue::Text(rewrite(id)),
            (FieldType::Set(contained), FieldValue::List(items)) => FieldValue::List(
                items.iter().map(|item| contained.rewrite_references(item, rewrite)).collect(),
            ),
            (FieldType::Tuple(components), FieldValue::List(items)) => FieldValue::List(
                components
                    .iter()
                    .zip(items)
                    .map(|(component, item)| component.rewrite_references(item, rewrite))
                    .collect(),
            ),
            (FieldType::Dictionary(contained), FieldValue::Map(items)) => FieldValue::Map(
                items
                    .iter()
                    .map(|(key, item)| (key.clone(), contained.rewrite_references(item, rewrite)))
                    .collect(),
            ),
            _ => value.clone(),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.field_type.name())
    }
}

/// Returns the node tag a field type decodes from.
const fn expected_tag(field_type: &FieldType) -> &'static str {
    match field_type {
        FieldType::Text {
            ..
        }
        | FieldType::Reference(_) => "text",
        FieldType::Integer => "integer",
        FieldType::Boolean => "boolean",
        FieldType::Enumeration {
            ..
        } => "enumeral",
        FieldType::Set(_) => "set",
        FieldType::Tuple(_) => "tuple",
        FieldType::Dictionary(_) => "dictionary",
        FieldType::Attachment => "attachment",
    }
}

// ============================================================================
// SECTION: Text Lists
// ============================================================================

/// Splits a whitespace-separated text list, honoring double quotes and
/// backslash escapes inside quotes.
///
/// Returns `None` when a quote is left open.
#[must_use]
pub fn split_text_list(text: &str) -> Option<Vec<String>> {
    let mut items = Vec::new();
    let mut current = String::new();
    let mut in_item = false;
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        if ch.is_whitespace() {
            if in_item {
                items.push(std::mem::take(&mut current));
                in_item = false;
            }
            continue;
        }
        in_item = true;
        if ch != '"' {
            current.push(ch);
            continue;
        }
        loop {
            match chars.next()? {
                '"' => break,
                '\\' => current.push(chars.next()?),
                other => current.push(other),
            }
        }
    }
    if in_item {
        items.push(current);
    }
    Some(items)
}

/// Joins items into a text list accepted by [`split_text_list`].
#[must_use]
pub fn join_text_list(items: &[String]) -> String {
    let mut out = String::new();
    for (index, item) in items.iter().enumerate() {
        if index > 0 {
            out.push(' ');
        }
        let needs_quotes = item.is_empty()
            || item.chars().any(|ch| ch.is_whitespace() || ch == '"' || ch == '\\');
        if !needs_quotes {
            out.push_str(item);
            continue;
        }
        out.push('"');
        for ch in item.chars() {
            if ch == '"' || ch == '\\' {
                out.push('\\');
            }
            out.push(ch);
        }
        out.push('"');
    }
    out
}

// ============================================================================
// SECTION: Tests
// ============================================================================
