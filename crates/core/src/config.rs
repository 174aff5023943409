use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::document::FieldPresence;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_usize(profile: &str, key: &str, default: usize) -> usize {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub storage: StorageConfig,
    pub evaluation: EvaluationConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `SIFT_PROFILE`. When set (e.g. `PROD`), every key
    /// is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("SIFT_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            storage: StorageConfig::from_env_profiled(p),
            evaluation: EvaluationConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  storage:     rules_dir={}, lists_dir={}", self.storage.rules_dir.display(), self.storage.lists_dir.display());
        tracing::info!(
            "  evaluation:  presence={}, parallel_threshold={}, max_findings={}, log_capacity={}",
            self.evaluation.field_presence,
            self.evaluation.parallel_threshold,
            self.evaluation.max_findings,
            self.evaluation.execution_log_capacity,
        );
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            profile: String::new(),
            storage: StorageConfig::default(),
            evaluation: EvaluationConfig::default(),
        }
    }
}

// ── Storage ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory of YAML rule files.
    pub rules_dir: PathBuf,
    /// Directory of value-list files (one value per line).
    pub lists_dir: PathBuf,
}

impl StorageConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            rules_dir: PathBuf::from(profiled_env_or(p, "SIFT_RULES_DIR", "data/rules")),
            lists_dir: PathBuf::from(profiled_env_or(p, "SIFT_LISTS_DIR", "data/lists")),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            rules_dir: PathBuf::from("data/rules"),
            lists_dir: PathBuf::from("data/lists"),
        }
    }
}

// ── Evaluation ────────────────────────────────────────────────

pub const DEFAULT_PARALLEL_THRESHOLD: usize = 1024;
pub const DEFAULT_MAX_FINDINGS: usize = 10_000;
pub const DEFAULT_EXECUTION_LOG_CAPACITY: usize = 500;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// How `exists` decides field presence.
    pub field_presence: FieldPresence,
    /// Batches at or above this size are filtered on the rayon pool.
    pub parallel_threshold: usize,
    /// Upper bound on findings kept per rule run.
    pub max_findings: usize,
    /// Execution records kept per rule.
    pub execution_log_capacity: usize,
}

impl EvaluationConfig {
    fn from_env_profiled(p: &str) -> Self {
        let field_presence = match profiled_env_opt(p, "SIFT_FIELD_PRESENCE") {
            Some(raw) => raw.parse().unwrap_or_else(|e: String| {
                tracing::warn!(error = %e, "invalid SIFT_FIELD_PRESENCE, using default");
                FieldPresence::default()
            }),
            None => FieldPresence::default(),
        };
        Self {
            field_presence,
            parallel_threshold: profiled_env_usize(p, "SIFT_PARALLEL_THRESHOLD", DEFAULT_PARALLEL_THRESHOLD),
            max_findings: profiled_env_usize(p, "SIFT_MAX_FINDINGS", DEFAULT_MAX_FINDINGS),
            execution_log_capacity: profiled_env_usize(
                p,
                "SIFT_EXECUTION_LOG_CAPACITY",
                DEFAULT_EXECUTION_LOG_CAPACITY,
            ),
        }
    }
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            field_presence: FieldPresence::default(),
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
            max_findings: DEFAULT_MAX_FINDINGS,
            execution_log_capacity: DEFAULT_EXECUTION_LOG_CAPACITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Each test uses its own profile prefix so parallel tests never share keys.

    #[test]
    fn profiled_key_wins_over_plain_key() {
        env::set_var("CFGTEST_A_SIFT_MAX_FINDINGS", "42");
        let config = Config::for_profile("cfgtest_a");
        assert_eq!(config.profile_label(), "CFGTEST_A");
        assert_eq!(config.evaluation.max_findings, 42);
    }

    #[test]
    fn presence_mode_from_env() {
        env::set_var("CFGTEST_B_SIFT_FIELD_PRESENCE", "indexed");
        env::set_var("CFGTEST_B_SIFT_PARALLEL_THRESHOLD", "not-a-number");
        let config = Config::for_profile("CFGTEST_B");
        assert_eq!(config.evaluation.field_presence, FieldPresence::Indexed);
        assert_eq!(config.evaluation.parallel_threshold, DEFAULT_PARALLEL_THRESHOLD);
    }

    #[test]
    fn default_profile_label() {
        assert_eq!(Config::default().profile_label(), "default");
    }
}
