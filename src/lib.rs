//! # Keel
//!
//! Language-agnostic code model extraction.
//!
//! Keel parses source files with tree-sitter and produces, for every
//! declaration, an [`Entity`] carrying a location-anchored id and a pair of
//! change fingerprints, plus typed [`Dependency`] edges (calls, type usage,
//! inheritance, method ownership) resolved best-effort across the batch.
//!
//! ## Key Features
//!
//! - **Multi-language**: Rust, Go, Java, Python, JavaScript, TypeScript
//! - **Shared algorithms**: one extractor driven by a small per-language adapter
//! - **Change fingerprints**: signature and body hashes that ignore formatting
//! - **Parallel**: units are parsed and extracted concurrently with rayon
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use keel::{analyze_directory, CodeGraph, KeelConfig};
//! use std::path::Path;
//!
//! let root = Path::new(".");
//! let analysis = analyze_directory(root, &KeelConfig::load_for_root(root))?;
//! let graph = CodeGraph::from_analysis(&analysis);
//! for caller in graph.callers("login") {
//!     println!("{} ({}:{})", caller.entity.name, caller.entity.file.display(), caller.line);
//! }
//! # Ok::<(), keel::KeelError>(())
//! ```

pub mod adapter;
pub mod callgraph;
pub mod cli;
pub mod config;
pub mod error;
pub mod graph;
pub mod hash;
pub mod parser;
pub mod resolver;
pub mod walker;

// Re-exports for convenience
pub use config::KeelConfig;
pub use error::{KeelError, Result};

// Model and pipeline
pub use graph::{
    analyze_directory, analyze_sources, Analysis, CodeGraph, Dependency, DependencyKind, Entity,
    EntityKind, GraphStats, SearchResult, SourceFile,
};
pub use parser::{parse_source, SupportedLanguage};

// Extraction building blocks
pub use adapter::{adapter_for, Builtins, LanguageAdapter};
pub use callgraph::{CallGraphEntity, CallGraphExtractor};
pub use resolver::SymbolResolver;
pub use walker::walk;

// Change detection
pub use hash::{compare, diff_entities, ChangeClass, ChangeStatus, EntityChange, HashPair};
