// crates/suitebase-core/src/label.rs
// ============================================================================
// Module: Suitebase Labels
// Description: Structured, separator-delimited names for stored items.
// Purpose: Provide validated labels with join/split algebra per label class.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! A [`Label`] names a test, suite, or resource the way a path names a file,
//! but independently of any one storage layout. Each label belongs to a
//! [`LabelClass`] that fixes the separator character and the accepted
//! character set. Labels are immutable; every operation returns new values.
//! Invariants:
//! - A non-root label never begins or ends with the separator.
//! - A label never contains two consecutive separators.
//! - The empty label is the root directory of a store.
//! - For every label `l`, `l.split()` yields `(d, b)` with `d.join([b]) == l`;
//!   the same holds for [`Label::split_left`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use serde::Serializer;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors produced while constructing labels.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LabelError {
    /// The candidate text is not a valid label for the class.
    #[error("invalid {class} label: `{label}`")]
    Invalid {
        /// Label class that rejected the candidate.
        class: LabelClass,
        /// Offending candidate text.
        label: String,
    },
    /// Normalizing free text produced an empty label.
    #[error("text `{text}` does not contain any label characters")]
    Empty {
        /// Original text handed to the normalizer.
        text: String,
    },
    /// The label class name is not recognized.
    #[error("unknown label class: `{0}`")]
    UnknownClass(String),
}

// ============================================================================
// SECTION: Label Class
// ============================================================================

/// Label conventions available to a database.
///
/// # Invariants
/// - Two databases are label-compatible exactly when their classes are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum LabelClass {
    /// Dotted identifiers over `[a-z0-9_-.]` with `.` as separator.
    #[default]
    Dotted,
    /// File-system style labels using the OS path separator.
    Path,
}

impl LabelClass {
    /// Returns the separator character for this class.
    #[must_use]
    pub const fn separator(self) -> char {
        match self {
            Self::Dotted => '.',
            Self::Path => std::path::MAIN_SEPARATOR,
        }
    }

    /// Returns the stable configuration name of this class.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dotted => "dotted",
            Self::Path => "path",
        }
    }

    /// Returns the root (empty) label of this class.
    #[must_use]
    pub const fn root(self) -> Label {
        Label {
            value: String::new(),
            class: self,
        }
    }

    /// Returns true when `candidate` is a valid label of this class.
    ///
    /// When `is_component` is true the candidate must also be a single
    /// component, so it may not contain the separator at all.
    #[must_use]
    pub fn is_valid(self, candidate: &str, is_component: bool) -> bool {
        if candidate.is_empty() {
            return false;
        }
        let sep = self.separator();
        if is_component && candidate.contains(sep) {
            return false;
        }
        if candidate.starts_with(sep) || candidate.ends_with(sep) {
            return false;
        }
        let mut doubled = String::with_capacity(2 * sep.len_utf8());
        doubled.push(sep);
        doubled.push(sep);
        if candidate.contains(doubled.as_str()) {
            return false;
        }
        candidate.chars().all(|ch| self.accepts_char(ch))
    }

    /// Parses `value` into a label of this class.
    ///
    /// The empty string is accepted and yields the root label.
    ///
    /// # Errors
    ///
    /// Returns [`LabelError::Invalid`] when `value` is not a valid label.
    pub fn parse(self, value: &str) -> Result<Label, LabelError> {
        if value.is_empty() {
            return Ok(self.root());
        }
        if !self.is_valid(value, false) {
            return Err(LabelError::Invalid {
                class: self,
                label: value.to_string(),
            });
        }
        Ok(Label::from_parts(self, value.to_string()))
    }

    /// Returns true when `ch` may appear in a label of this class.
    fn accepts_char(self, ch: char) -> bool {
        match self {
            Self::Dotted => {
                ch.is_ascii_lowercase() || ch.is_ascii_digit() || matches!(ch, '_' | '-' | '.')
            }
            Self::Path => ch != '\0',
        }
    }
}

impl fmt::Display for LabelClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LabelClass {
    type Err = LabelError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "dotted" | "python" => Ok(Self::Dotted),
            "path" | "file" => Ok(Self::Path),
            other => Err(LabelError::UnknownClass(other.to_string())),
        }
    }
}

// ============================================================================
// SECTION: Label
// ============================================================================

/// Immutable structured name bound to a label class.
///
/// # Invariants
/// - `value` is either empty (root) or valid for `class`, except for labels
///   assembled with [`Label::join`], which performs no validation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Label {
    /// Label text.
    value: String,
    /// Class the label belongs to.
    class: LabelClass,
}

impl Label {
    /// Builds a label without validation; callers guarantee the invariants.
    const fn from_parts(class: LabelClass, value: String) -> Self {
        Self {
            value,
            class,
        }
    }

    /// Returns the label text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Returns the class of this label.
    #[must_use]
    pub const fn class(&self) -> LabelClass {
        self.class
    }

    /// Returns true for the root (empty) label.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.value.is_empty()
    }

    /// Joins `parts` onto this label with the class separator.
    ///
    /// Empty parts are skipped, so joining the root with `x` yields `x`.
    #[must_use]
    pub fn join<I, S>(&self, parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let sep = self.class.separator();
        let mut value = self.value.clone();
        for part in parts {
            let part = part.as_ref();
            if part.is_empty() {
                continue;
            }
            if !value.is_empty() {
                value.push(sep);
            }
            value.push_str(part);
        }
        Self::from_parts(self.class, value)
    }

    /// Splits at the right-most separator into `(directory, basename)`.
    ///
    /// A label without a separator yields `(root, self)`.
    #[must_use]
    pub fn split(&self) -> (Self, Self) {
        match self.value.rsplit_once(self.class.separator()) {
            Some((dir, base)) => (
                Self::from_parts(self.class, dir.to_string()),
                Self::from_parts(self.class, base.to_string()),
            ),
            None => (self.class.root(), self.clone()),
        }
    }

    /// Splits at the left-most separator into `(first_component, rest)`.
    ///
    /// A label without a separator yields `(self, root)`.
    #[must_use]
    pub fn split_left(&self) -> (Self, Self) {
        match self.value.split_once(self.class.separator()) {
            Some((first, rest)) => (
                Self::from_parts(self.class, first.to_string()),
                Self::from_parts(self.class, rest.to_string()),
            ),
            None => (self.clone(), self.class.root()),
        }
    }

    /// Returns the components of this label in root-to-leaf order.
    ///
    /// The root label has no components.
    #[must_use]
    pub fn components(&self) -> Vec<Self> {
        let mut components = Vec::new();
        let mut rest = self.clone();
        while !rest.is_root() {
            let (first, remainder) = rest.split_left();
            components.push(first);
            rest = remainder;
        }
        components
    }

    /// Returns the last component of this label.
    #[must_use]
    pub fn basename(&self) -> Self {
        self.split().1
    }

    /// Returns this label without its last component.
    #[must_use]
    pub fn dirname(&self) -> Self {
        self.split().0
    }

    /// Returns true when this label is `other` or one of its ancestors.
    ///
    /// The root label is a prefix of every label.
    #[must_use]
    pub fn is_prefix_of(&self, other: &Self) -> bool {
        if self.is_root() {
            return true;
        }
        match other.value.strip_prefix(self.value.as_str()) {
            Some("") => true,
            Some(rest) => rest.starts_with(self.class.separator()),
            None => false,
        }
    }

    /// Returns `self` relative to `directory`, or `None` when `directory`
    /// is not a prefix of `self`.
    #[must_use]
    pub fn relative_to(&self, directory: &Self) -> Option<Self> {
        if !directory.is_prefix_of(self) {
            return None;
        }
        if directory.is_root() {
            return Some(self.clone());
        }
        let rest = &self.value[directory.value.len() ..];
        let rest = rest.strip_prefix(self.class.separator()).unwrap_or(rest);
        Some(Self::from_parts(self.class, rest.to_string()))
    }

    /// Returns true when the first component is reserved for internal use.
    #[must_use]
    pub fn is_reserved(&self) -> bool {
        self.value.starts_with('_')
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl AsRef<str> for Label {
    fn as_ref(&self) -> &str {
        &self.value
    }
}

impl Serialize for Label {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.value)
    }
}

// ============================================================================
// SECTION: Normalization
// ============================================================================

/// Coerces arbitrary text into a valid dotted label component.
///
/// The text is trimmed and lower-cased, `+` becomes `x`, every character
/// outside `[a-z0-9_]` becomes `_`, and leading underscores are removed.
///
/// # Errors
///
/// Returns [`LabelError::Empty`] when nothing remains after normalization.
pub fn thunk(text: &str) -> Result<String, LabelError> {
    let normalized: String = text
        .trim()
        .to_lowercase()
        .chars()
        .map(|ch| match ch {
            '+' => 'x',
            ch if ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_' => ch,
            _ => '_',
        })
        .collect();
    let normalized = normalized.trim_start_matches('_');
    if normalized.is_empty() {
        return Err(LabelError::Empty {
            text: text.to_string(),
        });
    }
    Ok(normalized.to_string())
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests;
