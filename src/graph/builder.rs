//! Batch pipeline: parse, hash, resolve, extract.
//!
//! Walks source files respecting .gitignore, parses each with tree-sitter in
//! parallel, builds one [`SymbolResolver`] over the whole batch, and then
//! extracts dependencies per unit in parallel against the frozen resolver.

use ignore::WalkBuilder;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::types::{Dependency, Entity};
use crate::adapter::{adapter_for, Builtins};
use crate::callgraph::{CallGraphEntity, CallGraphExtractor};
use crate::config::KeelConfig;
use crate::error::{KeelError, Result};
use crate::hash::HashEngine;
use crate::parser::{extract_entities, parse_source, ParsedUnit, SupportedLanguage};
use crate::resolver::SymbolResolver;

/// One input file of a batch.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub source: String,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>, source: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            source: source.into(),
        }
    }
}

/// A unit that was dropped from the batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitFailure {
    pub path: PathBuf,
    pub error: String,
}

/// Everything extracted from one batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Analysis {
    /// Entities of every unit, units sorted by path, source order within.
    pub entities: Vec<Entity>,
    /// Dependencies in discovery order per entity.
    pub dependencies: Vec<Dependency>,
    #[serde(default)]
    pub failures: Vec<UnitFailure>,
}

impl Analysis {
    pub fn resolved(&self) -> impl Iterator<Item = &Dependency> {
        self.dependencies.iter().filter(|d| d.is_resolved())
    }

    pub fn unresolved(&self) -> impl Iterator<Item = &Dependency> {
        self.dependencies.iter().filter(|d| !d.is_resolved())
    }

    /// Read a snapshot written by [`Analysis::save`].
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Write the analysis as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

/// A unit that survived phase 1.
struct HashedUnit {
    unit: ParsedUnit,
    entities: Vec<Entity>,
}

/// Run the full pipeline over in-memory sources.
pub fn analyze_sources(mut files: Vec<SourceFile>, config: &KeelConfig) -> Analysis {
    files.sort_by(|a, b| a.path.cmp(&b.path));
    debug!(file_count = files.len(), "analyzing batch");

    // Phase 1: parse, extract and hash each unit independently.
    let outcomes: Vec<std::result::Result<HashedUnit, UnitFailure>> = files
        .into_par_iter()
        .map(|file| {
            hash_unit(&file).map_err(|e| {
                warn!(file = %file.path.display(), error = %e, "skipping unit");
                UnitFailure {
                    path: file.path.clone(),
                    error: e.to_string(),
                }
            })
        })
        .collect();

    let mut failures = Vec::new();
    let mut units = Vec::with_capacity(outcomes.len());
    for outcome in outcomes {
        match outcome {
            Ok(unit) => units.push(unit),
            Err(failure) => failures.push(failure),
        }
    }

    link_units(units, failures, config)
}

/// Phases 2 and 3 over the units that parsed.
fn link_units(
    units: Vec<HashedUnit>,
    mut failures: Vec<UnitFailure>,
    config: &KeelConfig,
) -> Analysis {
    // Phase 2: one resolver for the whole batch, read-only from here on.
    let resolver = SymbolResolver::build(units.iter().flat_map(|u| &u.entities));
    let builtins: HashMap<SupportedLanguage, Builtins> = SupportedLanguage::ALL
        .iter()
        .map(|&lang| (lang, Builtins::for_language(lang, &config.builtins)))
        .collect();
    debug!(symbols = resolver.len(), "built symbol resolver");

    // Phase 3: dependencies per unit against the frozen resolver.
    let extracted: Vec<std::result::Result<Vec<Dependency>, UnitFailure>> = units
        .par_iter()
        .map(|hashed| {
            extract_unit(hashed, &builtins, &resolver).map_err(|e| {
                warn!(file = %hashed.unit.path.display(), error = %e, "dependency extraction failed");
                UnitFailure {
                    path: hashed.unit.path.clone(),
                    error: e.to_string(),
                }
            })
        })
        .collect();

    let mut analysis = Analysis::default();
    for (hashed, deps) in units.into_iter().zip(extracted) {
        match deps {
            Ok(deps) => {
                analysis.entities.extend(hashed.entities);
                analysis.dependencies.extend(deps);
            }
            Err(failure) => failures.push(failure),
        }
    }
    failures.sort_by(|a, b| a.path.cmp(&b.path));
    analysis.failures = failures;

    info!(
        entities = analysis.entities.len(),
        dependencies = analysis.dependencies.len(),
        unresolved = analysis.unresolved().count(),
        failures = analysis.failures.len(),
        "analysis complete"
    );
    analysis
}

/// Scan `root` and analyze every supported file under it.
///
/// Paths in the result are relative to `root`.
pub fn analyze_directory(root: &Path, config: &KeelConfig) -> Result<Analysis> {
    if !root.is_dir() {
        return Err(KeelError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} is not a directory", root.display()),
        )));
    }
    let files = collect_sources(root, config);
    info!(root = %root.display(), files = files.len(), "scanned directory");
    Ok(analyze_sources(files, config))
}

/// Read every supported, non-ignored file under `root`.
pub fn collect_sources(root: &Path, config: &KeelConfig) -> Vec<SourceFile> {
    let paths: Vec<PathBuf> = WalkBuilder::new(root)
        .hidden(!config.scan.include_hidden)
        .git_ignore(true)
        .git_global(true)
        .git_exclude(true)
        .build()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
        .filter(|entry| SupportedLanguage::from_path(entry.path()).is_some())
        .filter(|entry| {
            let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
            if size > config.scan.max_file_size {
                debug!(file = %entry.path().display(), size, "skipping large file");
                return false;
            }
            true
        })
        .map(|entry| entry.into_path())
        .collect();

    paths
        .into_par_iter()
        .filter_map(|path| match fs::read_to_string(&path) {
            Ok(source) => {
                let relative = path.strip_prefix(root).unwrap_or(&path).to_path_buf();
                Some(SourceFile::new(relative, source))
            }
            Err(e) => {
                warn!(file = %path.display(), error = %e, "failed to read file");
                None
            }
        })
        .collect()
}

fn hash_unit(file: &SourceFile) -> Result<HashedUnit> {
    let unit = parse_source(&file.path, &file.source)?;
    unit.validate()?;
    let adapter = adapter_for(unit.language);
    let engine = HashEngine::new(adapter, unit.source());

    let entities = extract_entities(&unit, adapter)
        .into_iter()
        .map(|parsed| {
            let mut entity = parsed.entity;
            engine.apply(&mut entity, parsed.node);
            entity
        })
        .collect();

    Ok(HashedUnit { unit, entities })
}

fn extract_unit(
    hashed: &HashedUnit,
    builtins: &HashMap<SupportedLanguage, Builtins>,
    resolver: &SymbolResolver,
) -> Result<Vec<Dependency>> {
    let unit = &hashed.unit;
    let builtins = builtins
        .get(&unit.language)
        .ok_or_else(|| KeelError::UnsupportedLanguage(unit.language.name().to_string()))?;
    let adapter = adapter_for(unit.language);
    let extractor = CallGraphExtractor::new(adapter, builtins, resolver, unit.source(), &unit.path);

    let entities = hashed
        .entities
        .iter()
        .map(|entity| Ok(CallGraphEntity::new(entity, unit.require_node(&entity.span)?)))
        .collect::<Result<Vec<_>>>()?;

    Ok(extractor.extract_all(&entities))
}

/// Counts of files `analyze_directory` would pick up.
pub fn scan_stats(root: &Path, config: &KeelConfig) -> ScanStats {
    let mut stats = ScanStats::default();

    for entry in WalkBuilder::new(root)
        .hidden(!config.scan.include_hidden)
        .git_ignore(true)
        .build()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_some_and(|ft| ft.is_file()))
    {
        if let Some(lang) = SupportedLanguage::from_path(entry.path()) {
            stats.total_files += 1;
            *stats.by_language.entry(lang.name()).or_default() += 1;
        }
    }

    stats
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanStats {
    pub total_files: usize,
    pub by_language: std::collections::BTreeMap<&'static str, usize>,
}

impl std::fmt::Display for ScanStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Found {} source files", self.total_files)?;
        if !self.by_language.is_empty() {
            let parts: Vec<String> = self
                .by_language
                .iter()
                .map(|(lang, n)| format!("{}: {}", lang, n))
                .collect();
            write!(f, " ({})", parts.join(", "))?;
        }
        Ok(())
    }
}
