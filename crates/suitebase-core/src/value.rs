// crates/suitebase-core/src/value.rs
// ============================================================================
// Module: Suitebase Values
// Description: Typed argument values and their structured node encoding.
// Purpose: Carry validated argument data between fields, extensions, and wire.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! [`FieldValue`] is the typed in-memory value of one extension argument.
//! [`ValueNode`] is the structured (DOM-like) encoding of a value as it
//! appears inside an `argument` element of the wire form. Both are produced
//! and consumed exclusively through [`crate::Field`], which knows the schema
//! needed to convert between them.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Field Values
// ============================================================================

/// Named typed arguments of one extension instance.
pub type Arguments = BTreeMap<String, FieldValue>;

/// Typed value held by a field.
///
/// # Invariants
/// - Values are only constructed or accepted through a field that validates
///   them against its type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Absent value (for example an unset reference).
    Null,
    /// Text, enumeral, or item reference.
    Text(String),
    /// Signed integer.
    Integer(i64),
    /// Boolean flag.
    Boolean(bool),
    /// Ordered sequence (set or tuple contents).
    List(Vec<FieldValue>),
    /// Attachment metadata.
    Attachment(Attachment),
    /// Text-keyed mapping (dictionary contents).
    Map(BTreeMap<String, FieldValue>),
}

impl FieldValue {
    /// Builds a text value.
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Returns the text payload when this is a text value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the integer payload when this is an integer value.
    #[must_use]
    pub const fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the boolean payload when this is a boolean value.
    #[must_use]
    pub const fn as_boolean(&self) -> Option<bool> {
        match self {
            Self::Boolean(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the list payload when this is a list value.
    #[must_use]
    pub fn as_list(&self) -> Option<&[Self]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Returns a short name for the variant, used in error messages.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Text(_) => "text",
            Self::Integer(_) => "integer",
            Self::Boolean(_) => "boolean",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Attachment(_) => "attachment",
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Text(value) => f.write_str(value),
            Self::Integer(value) => write!(f, "{value}"),
            Self::Boolean(value) => write!(f, "{value}"),
            Self::List(items) => {
                f.write_str("[")?;
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Map(items) => {
                f.write_str("{")?;
                for (index, (key, item)) in items.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {item}")?;
                }
                f.write_str("}")
            }
            Self::Attachment(attachment) => f.write_str(&attachment.file_name),
        }
    }
}

// ============================================================================
// SECTION: Attachments
// ============================================================================

/// Blob-valued argument metadata.
///
/// The payload itself lives in an external attachment store; `location`
/// identifies it there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Human-readable description.
    pub description: String,
    /// MIME type of the payload.
    pub mime_type: String,
    /// Suggested file name for the payload.
    pub file_name: String,
    /// Store-specific location of the payload.
    pub location: String,
}

// ============================================================================
// SECTION: Structured Nodes
// ============================================================================

/// Structured encoding of a field value inside an `argument` element.
///
/// # Invariants
/// - The node shape mirrors the field type that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueNode {
    /// Text or reference content.
    Text(String),
    /// Integer content.
    Integer(i64),
    /// Boolean content.
    Boolean(bool),
    /// Enumeral content.
    Enumeral(String),
    /// Set of contained nodes.
    Set(Vec<ValueNode>),
    /// Tuple of contained nodes, one per component field.
    Tuple(Vec<ValueNode>),
    /// Dictionary of contained nodes.
    Dictionary(BTreeMap<String, ValueNode>),
    /// Attachment metadata.
    Attachment(Attachment),
}

impl ValueNode {
    /// Returns the node tag name.
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Integer(_) => "integer",
            Self::Boolean(_) => "boolean",
            Self::Enumeral(_) => "enumeral",
            Self::Set(_) => "set",
            Self::Tuple(_) => "tuple",
            Self::Dictionary(_) => "dictionary",
            Self::Attachment(_) => "attachment",
        }
    }
}
