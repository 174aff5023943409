//! Exception evaluation: entries, items and whole exception sets.
//!
//! Three levels, each a pure function over a [`Document`]:
//! - [`matches`]: one entry (`is`, `is one of`, `exists`, `is in list` and negations)
//! - [`item_matches`]: AND across an item's entries
//! - [`should_exclude`]: OR across a set's items
//!
//! An [`EvaluationContext`] carries what is fixed for a whole run: the
//! presence policy for `exists` and the value lists already resolved for the
//! set. [`ExceptionEvaluator`] builds that context from a [`ListSnapshot`] and
//! fails up front when a referenced list is missing.

mod item;
mod matcher;

use std::collections::HashMap;
use std::sync::Arc;

use tracing::trace;

use sift_core::{Document, FieldPresence};
use sift_lists::{ListSnapshot, ListType, ValueList};

use crate::schema::{EntryMatch, ExceptionItem, ExceptionSet};

pub use item::item_matches;
pub use matcher::matches;

// ── Context ─────────────────────────────────────────────────────────

/// Run-wide evaluation state: presence policy plus resolved lists by id.
#[derive(Debug, Clone, Default)]
pub struct EvaluationContext {
    pub presence: FieldPresence,
    lists: HashMap<String, Arc<ValueList>>,
}

impl EvaluationContext {
    pub fn new(presence: FieldPresence) -> Self {
        Self {
            presence,
            lists: HashMap::new(),
        }
    }

    /// Add a list, replacing any list with the same id.
    pub fn with_list(mut self, list: impl Into<Arc<ValueList>>) -> Self {
        let list = list.into();
        self.lists.insert(list.id.clone(), list);
        self
    }

    /// Resolve every list referenced by `set` from `snapshot`.
    ///
    /// A reference resolves only when both the id and the declared type match.
    pub fn resolve(
        set: &ExceptionSet,
        snapshot: &ListSnapshot,
        presence: FieldPresence,
    ) -> Result<Self, UnresolvedListError> {
        let mut ctx = Self::new(presence);
        for reference in set.list_references() {
            let list = snapshot
                .resolve(&reference.id, reference.list_type)
                .map_err(|_| UnresolvedListError {
                    list_id: reference.id.clone(),
                    list_type: reference.list_type,
                })?;
            ctx.lists.insert(reference.id.clone(), list);
        }
        Ok(ctx)
    }

    pub fn list(&self, id: &str) -> Option<&ValueList> {
        self.lists.get(id).map(Arc::as_ref)
    }
}

/// An exception entry names a list that is not loaded with that id and type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("list '{list_id}' of type '{list_type}' is not loaded")]
pub struct UnresolvedListError {
    pub list_id: String,
    pub list_type: ListType,
}

// ── Set evaluation ──────────────────────────────────────────────────

/// Whether any item of the set matches the document. An empty set never excludes.
pub fn should_exclude(document: &Document, set: &ExceptionSet, ctx: &EvaluationContext) -> bool {
    first_match(document, set, ctx).is_some()
}

fn first_match<'a>(
    document: &Document,
    set: &'a ExceptionSet,
    ctx: &EvaluationContext,
) -> Option<(usize, &'a ExceptionItem)> {
    set.items()
        .iter()
        .enumerate()
        .find(|(_, item)| item_matches(item, document, ctx))
}

/// An exception set bound to its resolved lists.
#[derive(Debug, Clone)]
pub struct ExceptionEvaluator<'a> {
    set: &'a ExceptionSet,
    ctx: EvaluationContext,
}

impl<'a> ExceptionEvaluator<'a> {
    /// Resolve the set's lists and bind them. Fails on the first unresolved list.
    pub fn new(
        set: &'a ExceptionSet,
        snapshot: &ListSnapshot,
        presence: FieldPresence,
    ) -> Result<Self, UnresolvedListError> {
        let ctx = EvaluationContext::resolve(set, snapshot, presence)?;
        Ok(Self { set, ctx })
    }

    pub fn context(&self) -> &EvaluationContext {
        &self.ctx
    }

    pub fn should_exclude(&self, document: &Document) -> bool {
        self.matching_item(document).is_some()
    }

    /// The first item that suppresses `document`, with its position in the set.
    pub fn matching_item(&self, document: &Document) -> Option<(usize, &'a ExceptionItem)> {
        let hit = first_match(document, self.set, &self.ctx);
        if let Some((index, item)) = hit {
            if tracing::enabled!(tracing::Level::TRACE) {
                for entry in item.entries() {
                    if !matches!(entry.condition, EntryMatch::Exists) {
                        trace!(
                            doc_id = %document.id,
                            item = %item.label(index),
                            entry = %entry,
                            values = %matcher::describe_values(document, &entry.field),
                            "entry matched"
                        );
                    }
                }
            }
        }
        hit
    }
}

// ── Tests ───────────────────────────────────────────────────────────
