// crates/suitebase-core/src/element.rs
// ============================================================================
// Module: Extension Elements
// Description: Structured wire form of extension instances.
// Purpose: Serialize extensions to, and rebuild them from, element trees.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! An [`ExtensionElement`] is the encoding-independent structured form of one
//! extension instance: its `kind`, its fully qualified `class`, and one
//! [`ArgumentElement`] per non-computed explicit argument. JSON is the
//! encoding implemented here.
//! Security posture: element files are untrusted input and are size-limited
//! before parsing.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::extension::ArgumentError;
use crate::extension::ClassLoader;
use crate::extension::ClassSchema;
use crate::extension::Extension;
use crate::extension::ExtensionKind;
use crate::extension::SchemaError;
use crate::field::AttachmentResolver;
use crate::value::Arguments;
use crate::value::ValueNode;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum size of a serialized extension file.
pub const MAX_ELEMENT_FILE_BYTES: u64 = 1024 * 1024;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors produced while encoding or decoding extension elements.
#[derive(Debug, Error)]
pub enum ElementError {
    /// The element class could not be loaded.
    #[error(transparent)]
    Schema(#[from] SchemaError),
    /// An element argument was rejected.
    #[error(transparent)]
    Argument(#[from] ArgumentError),
    /// The element kind does not match the kind of its class.
    #[error("element declares kind `{declared}` but class `{class}` is a {actual}")]
    KindMismatch {
        /// Class named by the element.
        class: String,
        /// Kind declared by the element.
        declared: String,
        /// Kind of the registered class.
        actual: ExtensionKind,
    },
    /// The element lists the same argument twice.
    #[error("argument `{name}` appears more than once")]
    DuplicateArgument {
        /// Repeated argument name.
        name: String,
    },
    /// The JSON encoding is malformed.
    #[error("invalid extension json: {0}")]
    Json(String),
    /// Reading or writing an element file failed.
    #[error("extension file {path}: {message}")]
    Io {
        /// File path.
        path: String,
        /// Failure detail.
        message: String,
    },
    /// An element file exceeds [`MAX_ELEMENT_FILE_BYTES`].
    #[error("extension file {path} exceeds size limit")]
    TooLarge {
        /// File path.
        path: String,
    },
}

// ============================================================================
// SECTION: Elements
// ============================================================================

/// One explicit argument of an extension element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgumentElement {
    /// Argument name.
    pub name: String,
    /// Structured argument value.
    pub value: ValueNode,
}

/// Structured form of one extension instance.
///
/// # Invariants
/// - `arguments` never contains computed fields.
/// - Argument names are unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionElement {
    /// Extension kind name.
    pub kind: String,
    /// Fully qualified class name.
    pub class: String,
    /// Explicit arguments in schema order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<ArgumentElement>,
}

impl ExtensionElement {
    /// Encodes the explicit, non-computed arguments of `extension`.
    ///
    /// # Errors
    ///
    /// Returns [`ElementError::Argument`] when an explicit value does not
    /// fit its field.
    pub fn from_extension(extension: &Extension) -> Result<Self, ElementError> {
        let schema = extension.schema();
        let mut arguments = Vec::new();
        for field in schema.fields() {
            if field.is_computed() {
                continue;
            }
            let Some(value) = extension.explicit_arguments().get(field.name()) else {
                continue;
            };
            let node = field.to_node(value).map_err(|source| ArgumentError::InvalidValue {
                class: schema.class_name().to_string(),
                name: field.name().to_string(),
                source,
            })?;
            arguments.push(ArgumentElement {
                name: field.name().to_string(),
                value: node,
            });
        }
        Ok(Self {
            kind: schema.kind().as_str().to_string(),
            class: schema.class_name().to_string(),
            arguments,
        })
    }

    /// Resolves the element class and decodes its explicit arguments.
    ///
    /// # Errors
    ///
    /// Returns [`ElementError`] when the class cannot be loaded, the kind
    /// does not match, or an argument is unknown, computed, repeated, or
    /// malformed.
    pub fn decode_arguments(
        &self,
        loader: &dyn ClassLoader,
        resolver: Option<&dyn AttachmentResolver>,
    ) -> Result<(Arc<ClassSchema>, Arguments), ElementError> {
        let declared: ExtensionKind = self.kind.parse()?;
        let schema = loader.load_class(&self.class)?;
        if schema.kind() != declared {
            return Err(ElementError::KindMismatch {
                class: self.class.clone(),
                declared: self.kind.clone(),
                actual: schema.kind(),
            });
        }
        let mut seen = BTreeSet::new();
        let mut arguments = Arguments::new();
        for argument in &self.arguments {
            if !seen.insert(argument.name.as_str()) {
                return Err(ElementError::DuplicateArgument {
                    name: argument.name.clone(),
                });
            }
            let field = schema.field(&argument.name).ok_or_else(|| ArgumentError::Unknown {
                class: self.class.clone(),
                name: argument.name.clone(),
            })?;
            if field.is_computed() {
                return Err(ArgumentError::ComputedAssigned {
                    class: self.class.clone(),
                    name: argument.name.clone(),
                }
                .into());
            }
            let value = field.from_node(&argument.value, resolver).map_err(|source| {
                ArgumentError::InvalidValue {
                    class: self.class.clone(),
                    name: argument.name.clone(),
                    source,
                }
            })?;
            arguments.insert(argument.name.clone(), value);
        }
        Ok((schema, arguments))
    }

    /// Rebuilds the extension instance described by this element.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`ExtensionElement::decode_arguments`] and
    /// [`ClassSchema::instantiate`].
    pub fn to_extension(
        &self,
        loader: &dyn ClassLoader,
        resolver: Option<&dyn AttachmentResolver>,
        computed: &Arguments,
    ) -> Result<Extension, ElementError> {
        let (schema, explicit) = self.decode_arguments(loader, resolver)?;
        Ok(schema.instantiate(&explicit, computed)?)
    }

    // ------------------------------------------------------------------------
    // JSON encoding
    // ------------------------------------------------------------------------

    /// Renders the element as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ElementError::Json`] when serialization fails.
    pub fn to_json(&self) -> Result<String, ElementError> {
        serde_json::to_string_pretty(self).map_err(|err| ElementError::Json(err.to_string()))
    }

    /// Parses an element from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`ElementError::Json`] when the text is malformed.
    pub fn from_json(text: &str) -> Result<Self, ElementError> {
        serde_json::from_str(text).map_err(|err| ElementError::Json(err.to_string()))
    }

    /// Reads an element from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`ElementError::Io`] when the file cannot be read,
    /// [`ElementError::TooLarge`] when it exceeds the size limit, and
    /// [`ElementError::Json`] when it is malformed.
    pub fn read_file(path: &Path) -> Result<Self, ElementError> {
        let io_error = |err: std::io::Error| ElementError::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        };
        let metadata = fs::metadata(path).map_err(io_error)?;
        if metadata.len() > MAX_ELEMENT_FILE_BYTES {
            return Err(ElementError::TooLarge {
                path: path.display().to_string(),
            });
        }
        let text = fs::read_to_string(path).map_err(io_error)?;
        Self::from_json(&text)
    }

    /// Writes the element to a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`ElementError::Io`] when the file cannot be written.
    pub fn write_file(&self, path: &Path) -> Result<(), ElementError> {
        let text = self.to_json()?;
        fs::write(path, text).map_err(|err| ElementError::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        })
    }
}
