//! Whole-rule execution with list prefetch and parallel filtering.

use std::time::Instant;

use chrono::Utc;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use sift_core::config::EvaluationConfig;
use sift_core::Document;
use sift_lists::ListSnapshot;

use crate::evaluator::ExceptionEvaluator;
use crate::execution_log::{ExecutionLog, ExecutionRecord};
use crate::schema::{CompiledRule, DetectionRule};

use super::{ExecutionError, Finding, FindingStore};

/// Result of one rule run.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionOutcome {
    pub rule_id: String,
    pub findings: Vec<Finding>,
    pub candidates: usize,
    pub suppressed: usize,
    pub duration_ms: u64,
}

impl ExecutionOutcome {
    fn empty(rule_id: &str) -> Self {
        Self {
            rule_id: rule_id.to_string(),
            findings: Vec::new(),
            candidates: 0,
            suppressed: 0,
            duration_ms: 0,
        }
    }
}

/// Runs compiled rules over candidate documents.
///
/// Clones share the same finding store and execution log.
#[derive(Debug, Clone)]
pub struct RuleExecutor {
    config: EvaluationConfig,
    findings: FindingStore,
    log: ExecutionLog,
}

impl RuleExecutor {
    pub fn new(config: EvaluationConfig) -> Self {
        let log = ExecutionLog::with_capacity(config.execution_log_capacity);
        Self {
            config,
            findings: FindingStore::new(),
            log,
        }
    }

    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    pub fn findings(&self) -> &FindingStore {
        &self.findings
    }

    pub fn log(&self) -> &ExecutionLog {
        &self.log
    }

    /// Compile a wire-format rule and execute it.
    ///
    /// An invalid rule aborts the run like a missing list does: the
    /// execution log records the failure and earlier findings are kept.
    pub fn execute_definition(
        &self,
        rule: &DetectionRule,
        documents: Vec<Document>,
        lists: &ListSnapshot,
    ) -> Result<ExecutionOutcome, ExecutionError> {
        match rule.compile() {
            Ok(compiled) => self.execute(&compiled, documents, lists),
            Err(e) => {
                let rule_id = rule.metadata.id.as_str();
                warn!(rule_id, errors = e.errors.len(), "rule run aborted: {e}");
                self.log
                    .record(ExecutionRecord::failed(rule_id, documents.len(), 0, e.to_string()));
                Err(e.into())
            }
        }
    }

    /// Filter `documents` through the rule's exceptions and store the survivors.
    ///
    /// Every list the rule references is resolved before any document is
    /// looked at; a missing list aborts the run and leaves the previous
    /// findings for the rule untouched.
    pub fn execute(
        &self,
        rule: &CompiledRule,
        documents: Vec<Document>,
        lists: &ListSnapshot,
    ) -> Result<ExecutionOutcome, ExecutionError> {
        let rule_id = rule.id();
        if !rule.metadata.enabled {
            debug!(rule_id, "rule disabled, skipping");
            self.log.record(ExecutionRecord::succeeded(rule_id, 0, 0, 0, 0));
            return Ok(ExecutionOutcome::empty(rule_id));
        }

        let start = Instant::now();
        let candidates = documents.len();

        let evaluator = match ExceptionEvaluator::new(
            &rule.exceptions,
            lists,
            self.config.field_presence,
        ) {
            Ok(evaluator) => evaluator,
            Err(e) => {
                let duration_ms = start.elapsed().as_millis() as u64;
                warn!(rule_id, list_id = %e.list_id, list_type = %e.list_type, "rule run aborted: {e}");
                self.log
                    .record(ExecutionRecord::failed(rule_id, candidates, duration_ms, e.to_string()));
                return Err(e.into());
            }
        };

        let keep = |doc: &Document| match evaluator.matching_item(doc) {
            Some((index, item)) => {
                debug!(rule_id, doc_id = %doc.id, item = %item.label(index), "suppressed by exception");
                false
            }
            None => true,
        };

        let survivors: Vec<Document> = if candidates >= self.config.parallel_threshold {
            documents.into_par_iter().filter(|d| keep(d)).collect()
        } else {
            documents.into_iter().filter(|d| keep(d)).collect()
        };

        let suppressed = candidates - survivors.len();
        if survivors.len() > self.config.max_findings {
            warn!(
                rule_id,
                survivors = survivors.len(),
                max_findings = self.config.max_findings,
                "finding cap reached, dropping the rest"
            );
        }

        let detected_at = Utc::now();
        let findings: Vec<Finding> = survivors
            .into_iter()
            .take(self.config.max_findings)
            .map(|doc| Finding::new(rule_id, doc, detected_at))
            .collect();

        self.findings.replace(rule_id, findings.clone());

        let duration_ms = start.elapsed().as_millis() as u64;
        info!(
            rule_id,
            candidates,
            suppressed,
            findings = findings.len(),
            duration_ms,
            "rule executed"
        );
        self.log.record(ExecutionRecord::succeeded(
            rule_id,
            candidates,
            suppressed,
            findings.len(),
            duration_ms,
        ));

        Ok(ExecutionOutcome {
            rule_id: rule_id.to_string(),
            findings,
            candidates,
            suppressed,
            duration_ms,
        })
    }
}

impl Default for RuleExecutor {
    fn default() -> Self {
        Self::new(EvaluationConfig::default())
    }
}
