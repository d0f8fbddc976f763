//! Code graph module.
//!
//! Provides the entity/dependency data model, the batch pipeline that
//! produces it, and the petgraph-backed graph for querying it.

pub mod builder;
pub mod engine;
pub mod types;

pub use builder::{
    analyze_directory, analyze_sources, collect_sources, scan_stats, Analysis, ScanStats,
    SourceFile, UnitFailure,
};
pub use engine::{CodeGraph, DependencyInfo, GraphStats, SearchResult, SymbolRef};
pub use types::{
    Dependency, DependencyKind, EdgeData, Entity, EntityDetail, EntityKind, Field, Location,
    NodeData, NodeSpan, Param, TypeKind,
};
