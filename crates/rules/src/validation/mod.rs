//! Rule validation with structured errors and suggestions.
//!
//! Validates rule headers and converts wire-format exception entries into
//! the typed [`ExceptionEntry`](crate::schema::ExceptionEntry) union. Every
//! problem is reported with a path such as `exceptions[1].entries[0].type`;
//! malformed entries are rejected here, at save time, never during evaluation.
//! Returns a [`ValidationResult`] with errors (block save) and warnings (advisory).

mod exception_checks;
mod rule_checks;

pub mod fuzzy;

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::schema::*;

// ── Result types ────────────────────────────────────────────────────

/// Overall validation outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

/// A blocking validation error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    /// JSON-path-like location, e.g. `"exceptions[0].entries[1].value"`.
    pub path: String,
    pub message: String,
    /// Optional "Did you mean …?" suggestion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

/// A non-blocking advisory warning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationResult {
    pub(crate) fn new() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub(crate) fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.valid = false;
        self.errors.push(ValidationError {
            path: path.into(),
            message: message.into(),
            suggestion: None,
        });
    }

    pub(crate) fn error_with_suggestion(
        &mut self,
        path: impl Into<String>,
        message: impl Into<String>,
        suggestion: impl Into<String>,
    ) {
        self.valid = false;
        self.errors.push(ValidationError {
            path: path.into(),
            message: message.into(),
            suggestion: Some(suggestion.into()),
        });
    }

    pub(crate) fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ValidationWarning {
            path: path.into(),
            message: message.into(),
        });
    }

    /// Hand back `value` if no errors were recorded.
    fn into_result<T>(self, value: T) -> Result<T, ConfigurationError> {
        if self.valid {
            for w in &self.warnings {
                debug!(path = %w.path, message = %w.message, "validation warning");
            }
            Ok(value)
        } else {
            Err(ConfigurationError {
                errors: self.errors,
            })
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)?;
        } else {
            write!(f, "{}: {}", self.path, self.message)?;
        }
        if let Some(s) = &self.suggestion {
            write!(f, " ({s})")?;
        }
        Ok(())
    }
}

/// A rule or exception list that cannot be saved as written.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid rule configuration: {}", join_errors(.errors))]
pub struct ConfigurationError {
    pub errors: Vec<ValidationError>,
}

impl ConfigurationError {
    pub(crate) fn single(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            errors: vec![ValidationError {
                path: path.into(),
                message: message.into(),
                suggestion: None,
            }],
        }
    }
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

// ── Public API ──────────────────────────────────────────────────────

/// Validate a parsed [`DetectionRule`].
pub fn validate_rule(rule: &DetectionRule) -> ValidationResult {
    let mut result = ValidationResult::new();
    rule_checks::validate_header(rule, &mut result);
    exception_checks::check_items(&rule.exceptions, "exceptions", &mut result);
    result
}

/// Parse raw YAML and validate. Returns parse errors merged with validation errors.
pub fn validate_yaml(yaml: &str) -> ValidationResult {
    match serde_yaml::from_str::<DetectionRule>(yaml) {
        Ok(rule) => validate_rule(&rule),
        Err(e) => {
            let mut result = ValidationResult::new();
            result.error("", format!("YAML parse error: {e}"));
            result
        }
    }
}

/// Validate a rule and convert it into its executable form.
pub fn compile_rule(rule: &DetectionRule) -> Result<CompiledRule, ConfigurationError> {
    let mut result = ValidationResult::new();
    rule_checks::validate_header(rule, &mut result);
    let items = exception_checks::check_items(&rule.exceptions, "exceptions", &mut result);
    result.into_result(CompiledRule {
        metadata: rule.metadata.clone(),
        index: rule.index.clone(),
        exceptions: ExceptionSet::new(items),
    })
}

/// Validate bare exception items (no rule header) into a typed set.
pub fn compile_exceptions(definitions: &[ItemDefinition]) -> Result<ExceptionSet, ConfigurationError> {
    let mut result = ValidationResult::new();
    let items = exception_checks::check_items(definitions, "exceptions", &mut result);
    result.into_result(ExceptionSet::new(items))
}

/// Validate a single wire-format entry.
pub fn compile_entry(definition: &EntryDefinition) -> Result<ExceptionEntry, ConfigurationError> {
    let mut result = ValidationResult::new();
    match exception_checks::check_entry(definition, "", &mut result) {
        Some(entry) => result.into_result(entry),
        None => Err(ConfigurationError {
            errors: result.errors,
        }),
    }
}

#[cfg(test)]
mod tests;
