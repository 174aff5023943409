//! Rule execution: filter candidate documents through a rule's exceptions.
//!
//! [`evaluate`] is the bare filter. [`RuleExecutor`] wraps it for whole rule
//! runs: list prefetch, parallel filtering of large batches, finding storage
//! and the execution log.

mod error;
mod executor;
mod findings;

pub use error::ExecutionError;
pub use executor::{ExecutionOutcome, RuleExecutor};
pub use findings::{Finding, FindingStore};

use sift_core::Document;

use crate::evaluator::{should_exclude, EvaluationContext};
use crate::schema::ExceptionSet;

/// Keep the documents no exception item matches, in input order.
pub fn evaluate(documents: Vec<Document>, set: &ExceptionSet, ctx: &EvaluationContext) -> Vec<Document> {
    documents
        .into_iter()
        .filter(|d| !should_exclude(d, set, ctx))
        .collect()
}
