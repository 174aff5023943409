//! Exception item evaluation: AND across entries.

use sift_core::Document;

use crate::schema::ExceptionItem;

use super::{matcher, EvaluationContext};

/// Whether every entry of the item holds for the document.
///
/// Short-circuits on the first failing entry. An item with no entries never
/// matches; validated items cannot be empty, so this only guards hand-built ones.
pub fn item_matches(item: &ExceptionItem, document: &Document, ctx: &EvaluationContext) -> bool {
    let entries = item.entries();
    !entries.is_empty() && entries.iter().all(|e| matcher::matches(e, document, ctx))
}
