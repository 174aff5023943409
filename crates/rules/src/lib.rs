//! Detection-rule exception engine.
//!
//! This crate provides:
//! - YAML/JSON rule definitions with exception items (serde)
//! - Validation of wire-format entries into a typed operator/type union
//! - Exception evaluation: entries AND-ed within an item, items OR-ed
//! - A rule executor that filters candidate documents into findings
//! - Filesystem loader with hot-reload via `notify` watcher

pub mod evaluator;
pub mod execution;
pub mod execution_log;
pub mod loader;
pub mod schema;
pub mod validation;
