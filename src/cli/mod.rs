//! CLI module for Keel.
//!
//! Commands:
//! - Extract: entities, deps, snapshot
//! - Change detection: diff, compare
//! - Graph queries: search, callers, callees, stats
//!
//! Every command prints JSON on stdout; logs go to stderr.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::KeelConfig;
use crate::graph::{analyze_directory, scan_stats, Analysis, CodeGraph};
use crate::hash::{compare, diff_entities, HashPair};

#[derive(Parser, Debug)]
#[command(name = "keel")]
#[command(about = "Keel - entities, call graphs and change fingerprints", long_about = None)]
pub struct Cli {
    /// Project root directory (default: current directory)
    #[arg(short, long, default_value = ".")]
    pub root: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    // ─── Extraction ───────────────────────────────────────────────
    /// List every extracted entity
    Entities,

    /// List dependency edges
    Deps {
        /// Only edges whose target is outside the project
        #[arg(long)]
        unresolved: bool,
    },

    /// Write the full analysis to a JSON snapshot
    Snapshot {
        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },

    // ─── Change Detection ─────────────────────────────────────────
    /// Classify entity changes between two snapshots
    Diff { old: PathBuf, new: PathBuf },

    /// Compare two `sig:body` hash pairs
    Compare { old: String, new: String },

    // ─── Graph Queries ────────────────────────────────────────────
    /// Search entities by name
    Search {
        query: String,

        /// Max results
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Entities that call a symbol
    Callers { symbol: String },

    /// Entities a symbol calls
    Callees { symbol: String },

    /// Show graph statistics
    Stats,
}

/// Parse arguments and run, writing to stdout.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let stdout = std::io::stdout();
    execute(cli, &mut stdout.lock())
}

/// Run one parsed command, writing its JSON output to `out`.
pub fn execute(cli: Cli, out: &mut impl Write) -> Result<()> {
    let root = cli.root.canonicalize().unwrap_or(cli.root);

    match cli.command {
        Commands::Compare { old, new } => {
            let class = compare(&old, &new);
            let report = CompareReport {
                old_well_formed: HashPair::parse(&old).is_well_formed(),
                new_well_formed: HashPair::parse(&new).is_well_formed(),
                signature_changed: class.signature_changed,
                body_changed: class.body_changed,
            };
            print_json(out, &report)
        }

        Commands::Diff { old, new } => {
            let old = load_snapshot(&old)?;
            let new = load_snapshot(&new)?;
            print_json(out, &diff_entities(&old.entities, &new.entities))
        }

        Commands::Entities => {
            let analysis = analyze(&root)?;
            print_json(out, &analysis.entities)
        }

        Commands::Deps { unresolved } => {
            let analysis = analyze(&root)?;
            if unresolved {
                let deps: Vec<_> = analysis.unresolved().collect();
                print_json(out, &deps)
            } else {
                print_json(out, &analysis.dependencies)
            }
        }

        Commands::Snapshot { output } => {
            let analysis = analyze(&root)?;
            analysis
                .save(&output)
                .with_context(|| format!("failed to write snapshot {}", output.display()))?;
            info!(path = %output.display(), entities = analysis.entities.len(), "wrote snapshot");
            Ok(())
        }

        Commands::Search { query, limit } => {
            let graph = CodeGraph::from_analysis(&analyze(&root)?);
            print_json(out, &graph.search(&query, limit))
        }

        Commands::Callers { symbol } => {
            let graph = CodeGraph::from_analysis(&analyze(&root)?);
            print_json(out, &graph.callers(&symbol))
        }

        Commands::Callees { symbol } => {
            let graph = CodeGraph::from_analysis(&analyze(&root)?);
            print_json(out, &graph.callees(&symbol))
        }

        Commands::Stats => {
            let config = KeelConfig::load_for_root(&root);
            let files = scan_stats(&root, &config);
            let graph = CodeGraph::from_analysis(&analyze(&root)?);
            print_json(
                out,
                &StatsReport {
                    files: files.total_files,
                    files_by_language: files.by_language,
                    graph: graph.stats(),
                },
            )
        }
    }
}

#[derive(Serialize)]
struct CompareReport {
    old_well_formed: bool,
    new_well_formed: bool,
    signature_changed: bool,
    body_changed: bool,
}

#[derive(Serialize)]
struct StatsReport {
    files: usize,
    files_by_language: std::collections::BTreeMap<&'static str, usize>,
    graph: crate::graph::GraphStats,
}

fn analyze(root: &Path) -> Result<Analysis> {
    let config = KeelConfig::load_for_root(root);
    analyze_directory(root, &config).with_context(|| format!("failed to analyze {}", root.display()))
}

fn load_snapshot(path: &Path) -> Result<Analysis> {
    Analysis::load(path).with_context(|| format!("failed to read snapshot {}", path.display()))
}

fn print_json(out: &mut impl Write, value: &impl Serialize) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn project() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("auth.rs"),
            "pub fn login(user: &str) -> bool {\n    validate(user);\n    audit::record(user);\n    true\n}\n\nfn validate(_input: &str) -> bool {\n    true\n}\n",
        )
        .unwrap();
        dir
    }

    fn exec(args: &[&str]) -> serde_json::Value {
        let cli = Cli::try_parse_from(std::iter::once("keel").chain(args.iter().copied())).unwrap();
        let mut out = Vec::new();
        execute(cli, &mut out).unwrap();
        serde_json::from_slice(&out).unwrap()
    }

    #[test]
    fn test_entities_and_deps() {
        let dir = project();
        let root = dir.path().to_str().unwrap();

        let entities = exec(&["-r", root, "entities"]);
        let names: Vec<&str> = entities
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["login", "validate"]);

        let deps = exec(&["-r", root, "deps"]);
        assert_eq!(deps.as_array().unwrap().len(), 2);

        let unresolved = exec(&["-r", root, "deps", "--unresolved"]);
        let unresolved = unresolved.as_array().unwrap();
        assert_eq!(unresolved.len(), 1);
        assert_eq!(unresolved[0]["to_qualified"], "audit::record");
    }

    #[test]
    fn test_callers_and_callees() {
        let dir = project();
        let root = dir.path().to_str().unwrap();

        let callers = exec(&["-r", root, "callers", "validate"]);
        assert_eq!(callers[0]["entity"]["name"], "login");

        let callees = exec(&["-r", root, "callees", "login"]);
        assert_eq!(callees.as_array().unwrap().len(), 1);
        assert_eq!(callees[0]["relationship"], "Calls");
    }

    #[test]
    fn test_snapshot_then_diff() {
        let dir = project();
        let root = dir.path().to_str().unwrap();
        let before = dir.path().join("before.json");
        let after = dir.path().join("after.json");

        exec_quiet(&["-r", root, "snapshot", "-o", before.to_str().unwrap()]);
        fs::write(
            dir.path().join("auth.rs"),
            "pub fn login(user: &str) -> bool {\n    validate(user);\n    true\n}\n\nfn validate(_input: &str) -> bool {\n    true\n}\n",
        )
        .unwrap();
        exec_quiet(&["-r", root, "snapshot", "-o", after.to_str().unwrap()]);

        let diff = exec(&["diff", before.to_str().unwrap(), after.to_str().unwrap()]);
        let diff = diff.as_array().unwrap();
        let login = diff.iter().find(|c| c["name"] == "login").unwrap();
        assert_eq!(login["status"], "modified");
        assert_eq!(login["signature_changed"], false);
        assert_eq!(login["body_changed"], true);

        // moved up a line, same content
        let validate = diff.iter().find(|c| c["name"] == "validate").unwrap();
        assert_eq!(validate["status"], "unchanged");
        assert_ne!(validate["old_id"], validate["new_id"]);
    }

    #[test]
    fn test_compare_pairs() {
        let report = exec(&["compare", "a:b", "a:c"]);
        assert_eq!(report["signature_changed"], false);
        assert_eq!(report["body_changed"], true);

        let report = exec(&["compare", "garbage", "a:b"]);
        assert_eq!(report["old_well_formed"], false);
        assert_eq!(report["signature_changed"], true);
        assert_eq!(report["body_changed"], true);
    }

    #[test]
    fn test_stats() {
        let dir = project();
        let stats = exec(&["-r", dir.path().to_str().unwrap(), "stats"]);
        assert_eq!(stats["files"], 1);
        assert_eq!(stats["graph"]["entity_count"], 2);
        assert_eq!(stats["graph"]["unresolved_count"], 1);
    }

    fn exec_quiet(args: &[&str]) {
        let cli = Cli::try_parse_from(std::iter::once("keel").chain(args.iter().copied())).unwrap();
        let mut out = Vec::new();
        execute(cli, &mut out).unwrap();
        assert!(out.is_empty());
    }
}
