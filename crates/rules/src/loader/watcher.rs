//! Filesystem event handler for the notify watcher (hot-reload).

use std::fs;
use std::path::Path;

use notify::event::{CreateKind, ModifyKind, RemoveKind};
use notify::{Event, EventKind};
use tracing::{info, warn};

use super::core::{is_rule_file, parse_rule, LoadedRule, RuleMap};

/// Handle a single filesystem event from the notify watcher.
pub(super) fn handle_fs_event(event: &Event, rules: &RuleMap) {
    for path in &event.paths {
        if !is_rule_file(path) {
            continue;
        }

        // Skip dotfiles (including our .tmp files)
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            if name.starts_with('.') {
                continue;
            }
        }

        match &event.kind {
            EventKind::Create(CreateKind::File)
            | EventKind::Modify(ModifyKind::Data(_))
            | EventKind::Modify(ModifyKind::Name(_)) => reload(path, rules),
            EventKind::Remove(RemoveKind::File) => remove_rules_by_path(rules, path),
            _ => {}
        }
    }
}

fn reload(path: &Path, rules: &RuleMap) {
    // A rename away from this path also arrives as a name change.
    if !path.exists() {
        remove_rules_by_path(rules, path);
        return;
    }

    let contents = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read file during hot-reload");
            return;
        }
    };

    match parse_rule(&contents) {
        Ok(rule) => {
            let rule_id = rule.id().to_string();
            info!(rule_id = %rule_id, path = %path.display(), "hot-reloaded rule");
            let mut guard = rules.write().expect("rules lock poisoned");
            // The file may now carry a different id than before.
            guard.retain(|id, loaded| loaded.path.as_path() != path || *id == rule_id);
            guard.insert(
                rule_id,
                LoadedRule {
                    rule,
                    path: path.to_path_buf(),
                },
            );
        }
        Err(e) => {
            warn!(
                path = %path.display(),
                error = %e,
                "failed to load rule during hot-reload, keeping previous version"
            );
        }
    }
}

/// Remove every rule loaded from `path`.
fn remove_rules_by_path(rules: &RuleMap, path: &Path) {
    let mut guard = rules.write().expect("rules lock poisoned");
    guard.retain(|id, loaded| {
        let keep = loaded.path.as_path() != path;
        if !keep {
            info!(rule_id = %id, path = %path.display(), "removed rule after file deletion");
        }
        keep
    });
}
