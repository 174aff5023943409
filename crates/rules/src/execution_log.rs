//! In-memory record of rule executions.
//!
//! Stores per-rule execution records capped at a configurable maximum
//! (default 500) with FIFO eviction. Uses `std::sync::RwLock` so it can be
//! shared with rayon worker threads.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sift_core::config::DEFAULT_EXECUTION_LOG_CAPACITY;

/// Outcome of one rule execution.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Succeeded,
    Failed,
}

/// One rule execution as recorded in the log.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionRecord {
    pub timestamp: DateTime<Utc>,
    pub rule_id: String,
    pub status: ExecutionStatus,
    /// Documents handed to the run.
    pub candidates: usize,
    /// Documents removed by an exception item.
    pub suppressed: usize,
    pub findings: usize,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExecutionRecord {
    pub fn succeeded(
        rule_id: &str,
        candidates: usize,
        suppressed: usize,
        findings: usize,
        duration_ms: u64,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            rule_id: rule_id.to_string(),
            status: ExecutionStatus::Succeeded,
            candidates,
            suppressed,
            findings,
            duration_ms,
            error: None,
        }
    }

    pub fn failed(rule_id: &str, candidates: usize, duration_ms: u64, error: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            rule_id: rule_id.to_string(),
            status: ExecutionStatus::Failed,
            candidates,
            suppressed: 0,
            findings: 0,
            duration_ms,
            error: Some(error.into()),
        }
    }
}

/// Query parameters for filtering execution records.
#[derive(Debug, Default, Deserialize)]
pub struct LogQueryParams {
    pub status: Option<ExecutionStatus>,
    /// Maximum number of records to return (default 100).
    pub limit: Option<u32>,
    /// Only return records at or after this RFC 3339 timestamp.
    pub since: Option<String>,
}

/// Per-rule execution log with FIFO eviction. Clones share the same records.
#[derive(Debug, Clone)]
pub struct ExecutionLog {
    records: Arc<RwLock<HashMap<String, VecDeque<ExecutionRecord>>>>,
    max_records_per_rule: usize,
}

impl ExecutionLog {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_EXECUTION_LOG_CAPACITY)
    }

    /// Create a log with a custom per-rule cap.
    pub fn with_capacity(max: usize) -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
            max_records_per_rule: max,
        }
    }

    pub fn record(&self, record: ExecutionRecord) {
        let mut guard = self.records.write().expect("execution_log lock poisoned");
        let deque = guard.entry(record.rule_id.clone()).or_default();
        deque.push_back(record);
        while deque.len() > self.max_records_per_rule {
            deque.pop_front();
        }
    }

    /// Most recent record for a rule.
    pub fn latest(&self, rule_id: &str) -> Option<ExecutionRecord> {
        let guard = self.records.read().expect("execution_log lock poisoned");
        guard.get(rule_id).and_then(|d| d.back().cloned())
    }

    /// Records for a rule, newest first, filtered by `params`.
    pub fn query(&self, rule_id: &str, params: &LogQueryParams) -> Vec<ExecutionRecord> {
        let guard = self.records.read().expect("execution_log lock poisoned");
        let Some(deque) = guard.get(rule_id) else {
            return Vec::new();
        };

        let since: Option<DateTime<Utc>> = params
            .since
            .as_ref()
            .and_then(|s| s.parse::<DateTime<Utc>>().ok());
        let limit = params.limit.unwrap_or(100) as usize;

        deque
            .iter()
            .rev()
            .filter(|r| params.status.map_or(true, |s| r.status == s))
            .filter(|r| since.map_or(true, |s| r.timestamp >= s))
            .take(limit)
            .cloned()
            .collect()
    }

    /// Clear all records for a rule.
    pub fn clear(&self, rule_id: &str) {
        let mut guard = self.records.write().expect("execution_log lock poisoned");
        guard.remove(rule_id);
    }
}

impl Default for ExecutionLog {
    fn default() -> Self {
        Self::new()
    }
}
