//! Rule document schema with serde deserialization.
//!
//! Defines the type hierarchy for rule documents:
//! - `RuleEnvelope`: lightweight first-pass header (apiVersion, kind, metadata)
//! - `DetectionRule`: a rule and its exception items in wire format
//! - `ExceptionEntry` / `ExceptionItem` / `ExceptionSet`: the validated forms
//!   the evaluator runs on

mod entry;
mod envelope;
mod item;
mod kind;
mod metadata;
mod rule;

pub use entry::*;
pub use envelope::*;
pub use item::*;
pub use kind::*;
pub use metadata::*;
pub use rule::*;
