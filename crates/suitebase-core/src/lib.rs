// crates/suitebase-core/src/lib.rs
// ============================================================================
// Module: Suitebase Core
// Description: Labels, fields, and the extension schema registry.
// Purpose: Provide the schema and naming backbone shared by every store.
// Dependencies: serde, serde_json, thiserror, tracing
// ============================================================================

//! ## Overview
//! This crate defines how stored items are named and described:
//! - [`Label`] and [`LabelClass`] name tests, suites, and resources.
//! - [`Field`] declares one typed argument and owns its text and structured
//!   conversions.
//! - [`ExtensionRegistry`] merges class hierarchies into cached
//!   [`ClassSchema`]s and validates argument dictionaries against them.
//! - [`parse_descriptor`] and [`ExtensionElement`] implement the textual and
//!   structured forms of extension instances.
//!
//! Invariants:
//! - A class schema is computed at most once per registry and never changes.
//! - Label, field, and validation operations are pure and reentrant.
//!
//! Security posture: descriptor strings and element files are untrusted and
//! parsed with size limits.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod builtins;
pub mod descriptor;
pub mod element;
pub mod extension;
pub mod field;
pub mod label;
pub mod value;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use descriptor::Descriptor;
pub use descriptor::DescriptorError;
pub use descriptor::ResolveError;
pub use descriptor::ResolvedDescriptor;
pub use descriptor::parse_descriptor;
pub use descriptor::resolve_descriptor;
pub use element::ArgumentElement;
pub use element::ElementError;
pub use element::ExtensionElement;
pub use extension::ArgumentError;
pub use extension::ClassLoader;
pub use extension::ClassSchema;
pub use extension::Extension;
pub use extension::ExtensionClass;
pub use extension::ExtensionKind;
pub use extension::ExtensionRegistry;
pub use extension::FieldBuilder;
pub use extension::SchemaError;
pub use field::AttachmentResolver;
pub use field::Field;
pub use field::FieldError;
pub use field::FieldType;
pub use field::ReferenceKind;
pub use label::Label;
pub use label::LabelClass;
pub use label::LabelError;
pub use label::thunk;
pub use value::Arguments;
pub use value::Attachment;
pub use value::FieldValue;
pub use value::ValueNode;
