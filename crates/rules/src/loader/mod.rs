//! Filesystem rule loader with hot-reload via `notify` watcher.
//!
//! Watches the rules directory for rule file changes (create, modify, delete)
//! and reloads affected rules into the in-memory rule set. Every rule is
//! validated and compiled on load, so the map only ever holds runnable rules.

mod core;
mod error;
mod watcher;

#[cfg(test)]
mod tests;

pub use self::core::{parse_rule, LoadedRule, RuleLoader};
pub use self::error::{LoadResult, LoadStatus, Result, RuleError};
