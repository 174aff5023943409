//! Core [`RuleLoader`] struct: filesystem-backed rule loading with optional hot-reload.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{info, warn};

use crate::schema::{CompiledRule, DetectionRule, RuleEnvelope};

use super::error::{LoadResult, LoadStatus, Result, RuleError};
use super::watcher::handle_fs_event;

/// Shared map of loaded rules keyed by `metadata.id`.
pub(super) type RuleMap = Arc<RwLock<HashMap<String, LoadedRule>>>;

/// A compiled rule and the file it came from.
#[derive(Debug, Clone)]
pub struct LoadedRule {
    pub rule: CompiledRule,
    pub path: PathBuf,
}

/// Filesystem-backed rule loader with optional hot-reload.
///
/// Scans a directory (recursively) for `*.yml` / `*.yaml` / `*.json` files,
/// deserializes them via two-pass deserialization, compiles them, and
/// maintains an in-memory map keyed by rule ID.
pub struct RuleLoader {
    /// Root directory containing rule files.
    rules_dir: PathBuf,
    rules: RuleMap,
    /// Active filesystem watcher (held to keep it alive).
    _watcher: Option<RecommendedWatcher>,
}

/// Whether a path has an extension the loader reads.
pub(super) fn is_rule_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e == "yml" || e == "yaml" || e == "json")
        .unwrap_or(false)
}

/// Parse and compile one rule document.
///
/// First pass: deserialize as [`RuleEnvelope`] to read `kind` and `metadata`.
/// Second pass: deserialize the full [`DetectionRule`], then validate it.
pub fn parse_rule(contents: &str) -> Result<CompiledRule> {
    let envelope: RuleEnvelope = serde_yaml::from_str(contents)?;

    if envelope.metadata.id.is_empty() {
        return Err(RuleError::Validation(
            "rule metadata.id must not be empty".to_string(),
        ));
    }

    let rule = envelope.parse_full().map_err(|e| {
        RuleError::Validation(format!("failed to parse rule '{}': {}", envelope.metadata.id, e))
    })?;
    Ok(rule.compile()?)
}

impl RuleLoader {
    /// Create a new loader for the given directory.
    ///
    /// Creates the directory (and parents) if it does not exist.
    pub fn new(rules_dir: PathBuf) -> Self {
        if !rules_dir.exists() {
            if let Err(e) = fs::create_dir_all(&rules_dir) {
                warn!(path = %rules_dir.display(), error = %e, "failed to create rules directory");
            }
        }
        Self {
            rules_dir,
            rules: Arc::new(RwLock::new(HashMap::new())),
            _watcher: None,
        }
    }

    /// Recursively scan the rules directory and load all rule files.
    ///
    /// Dotfiles and unsupported extensions are skipped. Parse and validation
    /// errors are reported per-file but do not abort the scan.
    pub fn load_all(&self) -> Result<Vec<LoadResult>> {
        let mut results = Vec::new();
        self.scan_dir_recursive(&self.rules_dir, &mut results)?;
        Ok(results)
    }

    fn scan_dir_recursive(&self, dir: &Path, results: &mut Vec<LoadResult>) -> Result<()> {
        let entries = match fs::read_dir(dir) {
            Ok(e) => e,
            Err(e) => {
                warn!(path = %dir.display(), error = %e, "failed to read directory");
                return Ok(());
            }
        };

        let mut paths = entries
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<Vec<_>>>()?;
        // Deterministic order, so duplicate ids resolve the same way every scan.
        paths.sort();

        for path in paths {
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                if name.starts_with('.') {
                    if path.is_file() {
                        results.push(LoadResult {
                            path,
                            status: LoadStatus::Skipped {
                                reason: "dotfile".to_string(),
                            },
                        });
                    }
                    continue;
                }
            }

            if path.is_dir() {
                self.scan_dir_recursive(&path, results)?;
                continue;
            }

            if !is_rule_file(&path) {
                results.push(LoadResult {
                    path,
                    status: LoadStatus::Skipped {
                        reason: "not a rule file".to_string(),
                    },
                });
                continue;
            }

            match self.load_file(&path) {
                Ok(rule) => {
                    let rule_id = rule.id().to_string();
                    info!(
                        rule_id = %rule_id,
                        items = rule.exceptions.len(),
                        path = %path.display(),
                        "loaded rule"
                    );
                    self.insert(rule, path.clone());
                    results.push(LoadResult {
                        path,
                        status: LoadStatus::Loaded { rule_id },
                    });
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to load rule file");
                    results.push(LoadResult {
                        path,
                        status: LoadStatus::Failed {
                            error: e.to_string(),
                        },
                    });
                }
            }
        }

        Ok(())
    }

    fn insert(&self, rule: CompiledRule, path: PathBuf) {
        let mut guard = self.rules.write().expect("rules lock poisoned");
        if let Some(previous) = guard.get(rule.id()) {
            if previous.path != path {
                warn!(
                    rule_id = %rule.id(),
                    previous = %previous.path.display(),
                    path = %path.display(),
                    "duplicate rule id, later file wins"
                );
            }
        }
        guard.insert(rule.id().to_string(), LoadedRule { rule, path });
    }

    /// Parse, validate and compile a single rule file without storing it.
    pub fn load_file(&self, path: &Path) -> Result<CompiledRule> {
        let contents = fs::read_to_string(path)?;
        parse_rule(&contents)
    }

    /// Start a filesystem watcher with 500ms debounce.
    ///
    /// On file create/modify the rule is re-parsed and upserted.
    /// On file delete the rule is removed from the in-memory map.
    /// Parse errors are logged as warnings; the previous version is kept.
    pub fn watch(&mut self) -> Result<()> {
        let rules = Arc::clone(&self.rules);

        let mut watcher = notify::recommended_watcher(
            move |res: std::result::Result<notify::Event, notify::Error>| match res {
                Ok(event) => handle_fs_event(&event, &rules),
                Err(e) => warn!(error = %e, "filesystem watcher error"),
            },
        )?;

        watcher.watch(&self.rules_dir, RecursiveMode::Recursive)?;

        let _ = watcher.configure(notify::Config::default().with_poll_interval(Duration::from_millis(500)));

        info!(path = %self.rules_dir.display(), "watching rules directory for changes (recursive)");
        self._watcher = Some(watcher);
        Ok(())
    }

    pub fn rules_dir(&self) -> &Path {
        &self.rules_dir
    }

    /// Get the shared rule map.
    pub fn rules(&self) -> Arc<RwLock<HashMap<String, LoadedRule>>> {
        Arc::clone(&self.rules)
    }

    /// Current compiled form of a rule.
    pub fn get(&self, id: &str) -> Option<CompiledRule> {
        let guard = self.rules.read().expect("rules lock poisoned");
        guard.get(id).map(|loaded| loaded.rule.clone())
    }

    /// Loaded rule ids, sorted.
    pub fn ids(&self) -> Vec<String> {
        let guard = self.rules.read().expect("rules lock poisoned");
        let mut ids: Vec<String> = guard.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Validate a rule and atomically write it to `<id>.yml`.
    ///
    /// Invalid rules are rejected before anything touches the disk. Writes
    /// go to a `.tmp` file first, then rename over the final path.
    pub fn write_rule(&self, rule: &DetectionRule) -> Result<PathBuf> {
        let compiled = rule.compile()?;
        let id = compiled.id().to_string();
        let final_path = self.rules_dir.join(format!("{id}.yml"));
        let tmp_path = self.rules_dir.join(format!(".{id}.tmp"));

        let yaml = serde_yaml::to_string(rule)?;
        fs::write(&tmp_path, yaml)?;
        fs::rename(&tmp_path, &final_path)?;

        info!(rule_id = %id, path = %final_path.display(), "wrote rule file");

        self.insert(compiled, final_path.clone());
        Ok(final_path)
    }

    /// Delete a rule's file and its in-memory entry.
    pub fn delete_rule(&self, id: &str) -> Result<()> {
        let known_path = {
            let guard = self.rules.read().expect("rules lock poisoned");
            guard.get(id).map(|loaded| loaded.path.clone())
        };

        let candidates = known_path.into_iter().chain(
            ["yml", "yaml", "json"]
                .iter()
                .map(|ext| self.rules_dir.join(format!("{id}.{ext}"))),
        );

        let mut removed = false;
        for path in candidates {
            if path.exists() {
                fs::remove_file(&path)?;
                removed = true;
                break;
            }
        }

        if !removed {
            return Err(RuleError::NotFound(id.to_string()));
        }

        self.rules.write().expect("rules lock poisoned").remove(id);

        info!(rule_id = %id, "deleted rule");
        Ok(())
    }
}
