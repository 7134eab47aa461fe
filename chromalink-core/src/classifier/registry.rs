//! Label registry
//!
//! Hands out sequential label identifiers and maps them to user names.
//! Identifiers start at 1 and are never reused within a session, even after
//! a label is deleted. Only `reset` rewinds the counter.

use alloc::collections::BTreeMap;
use alloc::string::String;

/// Name reported for labels the registry does not know
pub const UNKNOWN_LABEL_NAME: &str = "unknown";

/// Numeric class identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Label(u32);

impl Label {
    /// Wrap a raw identifier
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Raw identifier as sent on the wire
    pub const fn id(self) -> u32 {
        self.0
    }
}

/// Label name was empty or whitespace-only
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InvalidNameError;

/// Identifier allocator and id → name map
#[derive(Debug, Clone)]
pub struct LabelRegistry {
    names: BTreeMap<Label, String>,
    next_id: u32,
}

impl Default for LabelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl LabelRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            names: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Register a new class name and return its identifier
    ///
    /// Surrounding whitespace is trimmed from the stored name.
    pub fn create_label(&mut self, name: &str) -> Result<Label, InvalidNameError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(InvalidNameError);
        }

        let label = Label(self.next_id);
        self.next_id += 1;
        self.names.insert(label, String::from(name));
        Ok(label)
    }

    /// Display name for a label, or [`UNKNOWN_LABEL_NAME`]
    pub fn name_of(&self, label: Label) -> &str {
        self.names
            .get(&label)
            .map(String::as_str)
            .unwrap_or(UNKNOWN_LABEL_NAME)
    }

    /// Check whether a label currently has a name
    pub fn contains(&self, label: Label) -> bool {
        self.names.contains_key(&label)
    }

    /// Forget a label's name
    ///
    /// The identifier stays consumed. Returns true if the label existed.
    pub fn delete_label(&mut self, label: Label) -> bool {
        self.names.remove(&label).is_some()
    }

    /// Drop every name and restart numbering at 1
    pub fn reset(&mut self) {
        self.names.clear();
        self.next_id = 1;
    }

    /// Registered labels in identifier order
    pub fn labels(&self) -> impl Iterator<Item = (Label, &str)> {
        self.names.iter().map(|(l, n)| (*l, n.as_str()))
    }

    /// Number of named labels
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
