//! Value lists for `is in list` / `is not in list` exception entries.
//!
//! This crate provides:
//! - Typed lists (`keyword`, `ip`, `long`, ...) with canonicalized membership
//! - Import from newline-separated files or any `BufRead`
//! - Immutable [`ListSnapshot`]s handed to rule executions

pub mod error;
pub mod list_type;
pub mod store;

pub use error::{ListError, Result};
pub use list_type::ListType;
pub use store::{ListSnapshot, ListStore, LoadResult, LoadStatus, ValueList};
