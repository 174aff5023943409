//! Exception items (AND groups) and exception sets (OR of items).

use serde::{Deserialize, Serialize};

use super::{EntryDefinition, ExceptionEntry, ListReference};
use crate::validation::{self, ConfigurationError};

/// An exception item as authored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ItemDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub entries: Vec<EntryDefinition>,
}

/// A validated exception item: a non-empty group of entries that must all match.
#[derive(Debug, Clone, PartialEq)]
pub struct ExceptionItem {
    pub item_id: Option<String>,
    pub name: Option<String>,
    entries: Vec<ExceptionEntry>,
}

impl ExceptionItem {
    /// Build an item from entries. Fails when `entries` is empty.
    pub fn new(entries: Vec<ExceptionEntry>) -> Result<Self, ConfigurationError> {
        if entries.is_empty() {
            return Err(ConfigurationError::single(
                "entries",
                "an exception item needs at least one entry",
            ));
        }
        Ok(Self {
            item_id: None,
            name: None,
            entries,
        })
    }

    pub fn with_id(mut self, item_id: impl Into<String>) -> Self {
        self.item_id = Some(item_id.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn entries(&self) -> &[ExceptionEntry] {
        &self.entries
    }

    /// Label for logs: the item id, then the name, then the position.
    pub fn label(&self, index: usize) -> String {
        self.item_id
            .clone()
            .or_else(|| self.name.clone())
            .unwrap_or_else(|| format!("#{index}"))
    }

    pub fn to_definition(&self) -> ItemDefinition {
        ItemDefinition {
            item_id: self.item_id.clone(),
            name: self.name.clone(),
            entries: self.entries.iter().map(ExceptionEntry::to_definition).collect(),
        }
    }

    /// Internal constructor for the validator, which has already checked non-emptiness.
    pub(crate) fn from_parts(
        item_id: Option<String>,
        name: Option<String>,
        entries: Vec<ExceptionEntry>,
    ) -> Self {
        Self {
            item_id,
            name,
            entries,
        }
    }
}

/// All exception items attached to a rule.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExceptionSet {
    items: Vec<ExceptionItem>,
}

impl ExceptionSet {
    pub fn new(items: Vec<ExceptionItem>) -> Self {
        Self { items }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Validate wire-format items into a typed set, collecting every error.
    pub fn compile(definitions: &[ItemDefinition]) -> Result<Self, ConfigurationError> {
        validation::compile_exceptions(definitions)
    }

    pub fn items(&self) -> &[ExceptionItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Every list referenced by any entry, deduplicated, in first-seen order.
    pub fn list_references(&self) -> Vec<&ListReference> {
        let mut refs: Vec<&ListReference> = Vec::new();
        for entry in self.items.iter().flat_map(|item| item.entries.iter()) {
            if let super::EntryMatch::List { list } = &entry.condition {
                if !refs.contains(&list) {
                    refs.push(list);
                }
            }
        }
        refs
    }

    pub fn to_definitions(&self) -> Vec<ItemDefinition> {
        self.items.iter().map(ExceptionItem::to_definition).collect()
    }
}
