//! The queryable code graph.
//!
//! Uses petgraph to store one node per entity and one edge per resolved
//! dependency. Unresolved dependencies have no target node and are kept
//! aside as a plain list.

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use tracing::{debug, info};

use super::builder::Analysis;
use super::types::*;

/// Entities and their resolved dependencies, indexed for lookup.
#[derive(Debug, Default)]
pub struct CodeGraph {
    graph: DiGraph<NodeData, EdgeData>,
    /// Entity id -> node.
    id_index: HashMap<String, NodeIndex>,
    /// Simple and qualified name -> nodes.
    symbol_index: HashMap<String, Vec<NodeIndex>>,
    unresolved: Vec<Dependency>,
}

impl CodeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the graph for one batch.
    pub fn from_analysis(analysis: &Analysis) -> Self {
        let mut graph = Self::new();

        for entity in &analysis.entities {
            graph.add_entity(entity);
        }

        let mut dangling = 0;
        for dep in &analysis.dependencies {
            if !graph.add_dependency(dep) {
                dangling += 1;
            }
        }
        if dangling > 0 {
            debug!(dangling, "dropped edges whose endpoints are not in the graph");
        }

        info!(
            nodes = graph.graph.node_count(),
            edges = graph.graph.edge_count(),
            unresolved = graph.unresolved.len(),
            "built code graph"
        );
        graph
    }

    // ─── Node Operations ────────────────────────────────────────

    /// Add an entity node. A repeated id returns the existing node.
    pub fn add_entity(&mut self, entity: &Entity) -> NodeIndex {
        if let Some(&idx) = self.id_index.get(&entity.id) {
            return idx;
        }
        let idx = self.graph.add_node(NodeData::from(entity));
        self.id_index.insert(entity.id.clone(), idx);
        self.symbol_index.entry(entity.name.clone()).or_default().push(idx);
        if let Some(qualified) = &entity.qualified_name {
            if qualified != &entity.name {
                self.symbol_index.entry(qualified.clone()).or_default().push(idx);
            }
        }
        idx
    }

    // ─── Edge Operations ────────────────────────────────────────

    /// Record a dependency. Resolved ones become edges, the rest go to the
    /// unresolved list. Returns false when an endpoint is not in the graph.
    pub fn add_dependency(&mut self, dep: &Dependency) -> bool {
        let Some(&from) = self.id_index.get(&dep.from_id) else {
            return false;
        };
        let Some(to_id) = &dep.to_id else {
            self.unresolved.push(dep.clone());
            return true;
        };
        match self.id_index.get(to_id) {
            Some(&to) => {
                self.graph.add_edge(from, to, EdgeData::from(dep));
                true
            }
            None => false,
        }
    }

    // ─── Query Operations ───────────────────────────────────────

    /// Look up a node by entity id.
    pub fn entity(&self, id: &str) -> Option<&NodeData> {
        self.id_index.get(id).map(|&idx| &self.graph[idx])
    }

    /// Search entities by name. Returns up to `limit` results.
    ///
    /// Exact simple or qualified matches win; otherwise a case-insensitive
    /// substring search ranked prefix-first.
    pub fn search(&self, query: &str, limit: usize) -> Vec<SearchResult> {
        if let Some(indexes) = self.symbol_index.get(query) {
            return indexes
                .iter()
                .take(limit)
                .map(|&idx| self.build_search_result(idx))
                .collect();
        }

        let query_lower = query.to_lowercase();
        let mut scored: Vec<(usize, &str, NodeIndex)> = self
            .graph
            .node_indices()
            .filter_map(|idx| {
                let name = self.graph[idx].name.to_lowercase();
                let score = if name.starts_with(&query_lower) {
                    0
                } else if name.contains(&query_lower) {
                    1
                } else {
                    return None;
                };
                Some((score, self.graph[idx].name.as_str(), idx))
            })
            .collect();
        scored.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)).then_with(|| a.2.cmp(&b.2)));

        scored
            .into_iter()
            .take(limit)
            .map(|(_, _, idx)| self.build_search_result(idx))
            .collect()
    }

    /// Entities that call `symbol`.
    pub fn callers(&self, symbol: &str) -> Vec<DependencyInfo> {
        self.related(symbol, Direction::Incoming, Some(DependencyKind::Calls))
    }

    /// Entities `symbol` calls.
    pub fn callees(&self, symbol: &str) -> Vec<DependencyInfo> {
        self.related(symbol, Direction::Outgoing, Some(DependencyKind::Calls))
    }

    /// Everything that depends on `symbol`, any edge kind.
    pub fn dependents(&self, symbol: &str) -> Vec<DependencyInfo> {
        self.related(symbol, Direction::Incoming, None)
    }

    /// Everything `symbol` depends on, any edge kind.
    pub fn dependencies(&self, symbol: &str) -> Vec<DependencyInfo> {
        self.related(symbol, Direction::Outgoing, None)
    }

    /// Dependencies whose target is outside the batch.
    pub fn unresolved(&self) -> &[Dependency] {
        &self.unresolved
    }

    // ─── Stats ──────────────────────────────────────────────────

    pub fn stats(&self) -> GraphStats {
        let mut by_kind = BTreeMap::new();
        for node in self.graph.node_weights() {
            *by_kind.entry(node.kind.to_string()).or_insert(0) += 1;
        }
        let mut by_edge_kind = BTreeMap::new();
        for edge in self.graph.edge_weights() {
            *by_edge_kind.entry(edge.kind.to_string()).or_insert(0) += 1;
        }

        GraphStats {
            entity_count: self.graph.node_count(),
            edge_count: self.graph.edge_count(),
            unresolved_count: self.unresolved.len(),
            unique_names: self
                .graph
                .node_weights()
                .map(|n| n.name.as_str())
                .collect::<std::collections::HashSet<_>>()
                .len(),
            by_kind,
            by_edge_kind,
        }
    }

    // ─── Internal Helpers ───────────────────────────────────────

    fn related(
        &self,
        symbol: &str,
        direction: Direction,
        kind: Option<DependencyKind>,
    ) -> Vec<DependencyInfo> {
        let Some(indexes) = self.symbol_index.get(symbol) else {
            return Vec::new();
        };

        let mut deps = Vec::new();
        for &idx in indexes {
            let start = deps.len();
            for edge in self.graph.edges_directed(idx, direction) {
                let data = edge.weight();
                if kind.is_some_and(|k| k != data.kind) {
                    continue;
                }
                let other = match direction {
                    Direction::Incoming => edge.source(),
                    Direction::Outgoing => edge.target(),
                };
                deps.push(DependencyInfo {
                    entity: SymbolRef::from(&self.graph[other]),
                    relationship: data.kind,
                    line: data.line,
                    optional: data.optional,
                });
            }
            // petgraph walks edges newest-first
            deps[start..].reverse();
        }
        deps
    }

    fn build_search_result(&self, idx: NodeIndex) -> SearchResult {
        let node = &self.graph[idx];
        let neighbors = |direction: Direction| -> Vec<SymbolRef> {
            let mut refs: Vec<SymbolRef> = self
                .graph
                .edges_directed(idx, direction)
                .filter(|e| e.weight().kind == DependencyKind::Calls)
                .map(|e| {
                    let other = match direction {
                        Direction::Incoming => e.source(),
                        Direction::Outgoing => e.target(),
                    };
                    SymbolRef::from(&self.graph[other])
                })
                .collect();
            refs.reverse();
            refs
        };

        SearchResult {
            entity: node.clone(),
            calls: neighbors(Direction::Outgoing),
            called_by: neighbors(Direction::Incoming),
        }
    }
}

// ─── Query Result Types ─────────────────────────────────────────

/// A search result returned by `CodeGraph::search`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(flatten)]
    pub entity: NodeData,
    /// What this entity calls.
    pub calls: Vec<SymbolRef>,
    /// What calls this entity.
    pub called_by: Vec<SymbolRef>,
}

/// A lightweight pointer at an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolRef {
    pub id: String,
    pub name: String,
    pub kind: EntityKind,
    pub file: PathBuf,
    pub line: usize,
}

impl From<&NodeData> for SymbolRef {
    fn from(node: &NodeData) -> Self {
        Self {
            id: node.id.clone(),
            name: node.name.clone(),
            kind: node.kind,
            file: node.file_path.clone(),
            line: node.line_start,
        }
    }
}

/// One edge seen from a queried entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyInfo {
    /// The entity on the other end.
    pub entity: SymbolRef,
    pub relationship: DependencyKind,
    /// Line of the dependency site.
    pub line: usize,
    pub optional: bool,
}

/// Statistics about the graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphStats {
    pub entity_count: usize,
    pub edge_count: usize,
    pub unresolved_count: usize,
    pub unique_names: usize,
    pub by_kind: BTreeMap<String, usize>,
    pub by_edge_kind: BTreeMap<String, usize>,
}
