//! sift: run detection-rule exceptions over candidate documents.
//!
//! Subcommands:
//! - `validate`: check rule files and print every problem with its path
//! - `run`: filter an NDJSON batch through a rule and print the findings
//! - `rules`: load the rules directory and report each file
//! - `lists`: import value lists and print a summary

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use sift_core::config::{load_dotenv, Config};
use sift_core::{Document, FieldPresence};
use sift_lists::{ListStore, ListType, LoadStatus as ListLoadStatus};
use sift_rules::execution::RuleExecutor;
use sift_rules::loader::{parse_rule, LoadStatus, RuleLoader};
use sift_rules::validation::validate_yaml;

// ── CLI ─────────────────────────────────────────────────────────────

/// Detection-rule exception engine.
#[derive(Parser, Debug)]
#[command(name = "sift", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse and validate rule files.
    Validate {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Execute a rule against an NDJSON file of candidate documents.
    Run {
        /// Rule file (YAML or JSON).
        #[arg(long)]
        rule: PathBuf,

        /// Candidate documents, one JSON object per line.
        #[arg(long)]
        documents: PathBuf,

        /// Value list to import, as `<type>:<path>`. The list id is the file name.
        #[arg(long = "list", value_parser = parse_list_arg)]
        lists: Vec<(ListType, PathBuf)>,

        /// Lists directory laid out as `<dir>/<type>/<id>` (default: SIFT_LISTS_DIR).
        #[arg(long)]
        lists_dir: Option<PathBuf>,

        /// How `exists` treats empty arrays and nulls.
        #[arg(long, value_parser = parse_presence)]
        presence: Option<FieldPresence>,
    },

    /// Load every rule under the rules directory and report the result per file.
    Rules {
        /// Rules directory (default: SIFT_RULES_DIR).
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// Import value lists and print their sizes.
    Lists {
        #[arg(long = "list", value_parser = parse_list_arg, required = true)]
        lists: Vec<(ListType, PathBuf)>,
    },
}

fn parse_list_arg(raw: &str) -> std::result::Result<(ListType, PathBuf), String> {
    let (list_type, path) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected <type>:<path>, got '{raw}'"))?;
    let list_type = list_type.parse::<ListType>().map_err(|e| e.to_string())?;
    Ok((list_type, PathBuf::from(path)))
}

fn parse_presence(raw: &str) -> std::result::Result<FieldPresence, String> {
    raw.parse()
}

// ── Main ────────────────────────────────────────────────────────────

fn main() -> Result<ExitCode> {
    load_dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();
    config.log_summary();

    match cli.command {
        Command::Validate { files } => validate(&files),
        Command::Run {
            rule,
            documents,
            lists,
            lists_dir,
            presence,
        } => {
            let mut config = config;
            if let Some(presence) = presence {
                config.evaluation.field_presence = presence;
            }
            let lists_dir = lists_dir.unwrap_or_else(|| config.storage.lists_dir.clone());
            run(&config, &rule, &documents, &lists, &lists_dir)
        }
        Command::Rules { dir } => {
            let dir = dir.unwrap_or_else(|| config.storage.rules_dir.clone());
            rules(&dir)
        }
        Command::Lists { lists } => {
            let store = ListStore::new();
            import_lists(&store, &lists)?;
            for id in store.ids() {
                if let Some(list) = store.get(&id) {
                    println!("{}\t{}\t{} items", list.id, list.list_type, list.len());
                }
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

// ── Subcommands ─────────────────────────────────────────────────────

fn validate(files: &[PathBuf]) -> Result<ExitCode> {
    let mut failed = false;
    for path in files {
        let yaml = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let result = validate_yaml(&yaml);

        for w in &result.warnings {
            eprintln!("{}: warning: {}: {}", path.display(), w.path, w.message);
        }
        for e in &result.errors {
            eprintln!("{}: error: {e}", path.display());
        }
        if result.valid {
            println!("{}: ok", path.display());
        } else {
            failed = true;
        }
    }
    Ok(if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}

fn run(
    config: &Config,
    rule_path: &Path,
    documents_path: &Path,
    lists: &[(ListType, PathBuf)],
    lists_dir: &Path,
) -> Result<ExitCode> {
    let contents = fs::read_to_string(rule_path)
        .with_context(|| format!("failed to read rule {}", rule_path.display()))?;
    let rule = parse_rule(&contents)
        .with_context(|| format!("invalid rule {}", rule_path.display()))?;

    // Explicit --list imports override same-named lists from the directory.
    let store = ListStore::new();
    let loaded = store
        .load_dir(lists_dir)
        .with_context(|| format!("failed to load lists from {}", lists_dir.display()))?;
    for result in &loaded {
        if let ListLoadStatus::Failed { error } = &result.status {
            eprintln!("{}: warning: list skipped: {error}", result.path.display());
        }
    }
    import_lists(&store, lists)?;

    let documents = Document::read_ndjson(documents_path)
        .with_context(|| format!("invalid documents in {}", documents_path.display()))?;
    info!(rule_id = %rule.id(), documents = documents.len(), "executing rule");

    let executor = RuleExecutor::new(config.evaluation.clone());
    let outcome = executor
        .execute(&rule, documents, &store.snapshot())
        .with_context(|| format!("rule '{}' failed", rule.id()))?;

    for finding in &outcome.findings {
        println!("{}", serde_json::to_string(finding)?);
    }
    eprintln!(
        "{}: {} candidates, {} suppressed, {} findings in {}ms",
        outcome.rule_id,
        outcome.candidates,
        outcome.suppressed,
        outcome.findings.len(),
        outcome.duration_ms
    );
    Ok(ExitCode::SUCCESS)
}

fn rules(dir: &Path) -> Result<ExitCode> {
    if !dir.is_dir() {
        bail!("rules directory {} does not exist", dir.display());
    }
    let loader = RuleLoader::new(dir.to_path_buf());
    let results = loader.load_all().context("failed to scan rules directory")?;

    let mut failed = false;
    for result in &results {
        match &result.status {
            LoadStatus::Loaded { rule_id } => println!("{}: loaded {rule_id}", result.path.display()),
            LoadStatus::Skipped { reason } => println!("{}: skipped ({reason})", result.path.display()),
            LoadStatus::Failed { error } => {
                failed = true;
                eprintln!("{}: error: {error}", result.path.display());
            }
        }
    }
    println!("{} rules loaded", loader.ids().len());
    Ok(if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}

fn import_lists(store: &ListStore, lists: &[(ListType, PathBuf)]) -> Result<()> {
    for (list_type, path) in lists {
        store
            .import_file(path, *list_type)
            .with_context(|| format!("failed to import list {}", path.display()))?;
    }
    Ok(())
}
