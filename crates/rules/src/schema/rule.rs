//! Detection rule documents.

use serde::{Deserialize, Serialize};

use super::{CommonMetadata, ExceptionSet, ItemDefinition};
use crate::validation::{self, ConfigurationError};

/// A detection rule as stored on disk or received from the rule API.
///
/// ```yaml
/// apiVersion: v1
/// kind: DetectionRule
/// metadata:
///   id: keyword-array
///   name: Keyword array
/// index: [keyword_as_array]
/// exceptions:
///   - entries:
///       - field: keyword
///         operator: included
///         type: match
///         value: word one
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DetectionRule {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
    pub metadata: CommonMetadata,
    /// Source index patterns the rule's query reads from.
    #[serde(default)]
    pub index: Vec<String>,
    #[serde(default)]
    pub exceptions: Vec<ItemDefinition>,
}

impl DetectionRule {
    /// Validate the whole rule and produce the form the executor runs.
    pub fn compile(&self) -> Result<CompiledRule, ConfigurationError> {
        validation::compile_rule(self)
    }
}

/// A validated rule: metadata plus a typed exception set.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledRule {
    pub metadata: CommonMetadata,
    pub index: Vec<String>,
    pub exceptions: ExceptionSet,
}

impl CompiledRule {
    /// Build a rule directly from typed parts (no wire format involved).
    pub fn new(metadata: CommonMetadata, exceptions: ExceptionSet) -> Self {
        Self {
            metadata,
            index: Vec::new(),
            exceptions,
        }
    }

    pub fn id(&self) -> &str {
        &self.metadata.id
    }

    pub fn to_rule(&self) -> DetectionRule {
        DetectionRule {
            api_version: "v1".to_string(),
            kind: super::RuleKind::DetectionRule.to_string(),
            metadata: self.metadata.clone(),
            index: self.index.clone(),
            exceptions: self.exceptions.to_definitions(),
        }
    }
}
