//! Findings: the documents a rule run let through its exceptions.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;

use sift_core::Document;

/// A document that survived a rule's exceptions.
#[derive(Debug, Clone, Serialize)]
pub struct Finding {
    pub rule_id: String,
    pub document: Document,
    pub detected_at: DateTime<Utc>,
}

impl Finding {
    pub fn new(rule_id: &str, document: Document, detected_at: DateTime<Utc>) -> Self {
        Self {
            rule_id: rule_id.to_string(),
            document,
            detected_at,
        }
    }
}

/// Latest findings per rule. Each run replaces the rule's previous findings.
#[derive(Debug, Clone, Default)]
pub struct FindingStore {
    findings: Arc<RwLock<HashMap<String, Vec<Finding>>>>,
}

impl FindingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace(&self, rule_id: &str, findings: Vec<Finding>) {
        let mut guard = self.findings.write().expect("findings lock poisoned");
        guard.insert(rule_id.to_string(), findings);
    }

    pub fn get(&self, rule_id: &str) -> Vec<Finding> {
        let guard = self.findings.read().expect("findings lock poisoned");
        guard.get(rule_id).cloned().unwrap_or_default()
    }

    pub fn count(&self, rule_id: &str) -> usize {
        let guard = self.findings.read().expect("findings lock poisoned");
        guard.get(rule_id).map_or(0, Vec::len)
    }

    /// Rule ids with stored findings, sorted.
    pub fn rule_ids(&self) -> Vec<String> {
        let guard = self.findings.read().expect("findings lock poisoned");
        let mut ids: Vec<String> = guard.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn clear(&self, rule_id: &str) {
        let mut guard = self.findings.write().expect("findings lock poisoned");
        guard.remove(rule_id);
    }
}
