//! Access to crystallographic data blocks.
//!
//! A data block exposes named scalar fields (e.g. `_cell_length_a`) and named columns of looped
//! fields (e.g. `_atom_site_fract_x`). The values are raw strings: the placeholders `?`
//! (unknown) and `.` (inapplicable) mark absent data, and numeric values may carry standard
//! uncertainties in parentheses, as in `5.4310(2)`.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub mod ingestion;

#[cfg(test)]
#[path = "block_tests.rs"]
mod block_tests;

// =================
// Trait definitions
// =================

/// Trait for sources of named scalar and looped fields.
pub trait DataBlock {
    /// Returns the raw value of the scalar field `tag`, if present.
    fn value(&self, tag: &str) -> Option<&str>;

    /// Returns the raw values of the looped field `tag`, if present.
    fn loop_column(&self, tag: &str) -> Option<&[String]>;

    /// Returns the first value among the scalar fields `tags` that is present and not marked
    /// absent.
    fn first_value(&self, tags: &[&str]) -> Option<&str> {
        tags.iter()
            .filter_map(|tag| self.value(tag))
            .find(|value| !is_absent(value))
    }

    /// Returns the first column among the looped fields `tags` that is present.
    fn first_loop_column(&self, tags: &[&str]) -> Option<&[String]> {
        tags.iter().find_map(|tag| self.loop_column(tag))
    }
}

// ==================
// Struct definitions
// ==================

/// A data block held in memory.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryBlock {
    /// The name of the block.
    #[serde(default)]
    pub name: String,

    /// The scalar fields.
    #[serde(default)]
    pub values: IndexMap<String, String>,

    /// The looped fields, column by column.
    #[serde(default)]
    pub loops: IndexMap<String, Vec<String>>,
}

impl MemoryBlock {
    /// Creates an empty block with name `name`.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    /// Sets a scalar field.
    pub fn insert_value(&mut self, tag: &str, value: &str) -> &mut Self {
        self.values.insert(tag.to_string(), value.to_string());
        self
    }

    /// Sets a looped field.
    pub fn insert_loop(&mut self, tag: &str, column: &[&str]) -> &mut Self {
        self.loops.insert(
            tag.to_string(),
            column.iter().map(|value| value.to_string()).collect(),
        );
        self
    }
}

impl DataBlock for MemoryBlock {
    fn value(&self, tag: &str) -> Option<&str> {
        self.values.get(tag).map(String::as_str)
    }

    fn loop_column(&self, tag: &str) -> Option<&[String]> {
        self.loops.get(tag).map(Vec::as_slice)
    }
}

// =================
// Utility functions
// =================

/// Checks if a raw value is empty or one of the placeholders `?` and `.`.
#[must_use]
pub fn is_absent(value: &str) -> bool {
    matches!(strip_quotes(value), "" | "?" | ".")
}

/// Removes surrounding whitespace and a matching pair of single or double quotes.
#[must_use]
pub fn strip_quotes(value: &str) -> &str {
    let trimmed = value.trim();
    for quote in ['\'', '"'] {
        if trimmed.len() >= 2 && trimmed.starts_with(quote) && trimmed.ends_with(quote) {
            return trimmed[1..trimmed.len() - 1].trim();
        }
    }
    trimmed
}

/// Parses a raw numeric value, discarding any standard uncertainty in parentheses.
///
/// # Returns
///
/// The parsed value, or `None` if the value is absent or malformed.
#[must_use]
pub fn parse_numeric(value: &str) -> Option<f64> {
    if is_absent(value) {
        return None;
    }
    let stripped = strip_quotes(value);
    let number = match stripped.find('(') {
        Some(pos) => &stripped[..pos],
        None => stripped,
    };
    number.trim().parse::<f64>().ok().filter(|x| x.is_finite())
}
