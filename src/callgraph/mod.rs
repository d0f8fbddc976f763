//! Dependency extraction.
//!
//! The [`CallGraphExtractor`] turns one entity plus its syntax node into
//! typed [`Dependency`] edges. It dispatches on the entity kind:
//!
//! - callables: call sites and constructions in the body, type references
//!   in the whole declaration, and a `MethodOf` edge for methods;
//! - types and enums: the supertype list and field type references.
//!
//! Missing nodes contribute nothing; extraction itself never fails.

mod calls;
mod types;

use std::collections::HashMap;
use std::path::Path;
use tree_sitter::Node;

use crate::adapter::{Builtins, LanguageAdapter};
use crate::graph::types::{Dependency, DependencyKind, Entity, EntityKind, Location};
use crate::parser::{ParsedEntity, SourceText};
use crate::resolver::SymbolResolver;

/// The slice of an [`Entity`] extraction needs, plus its node.
#[derive(Debug, Clone)]
pub struct CallGraphEntity<'t> {
    pub id: String,
    pub name: String,
    pub qualified_name: Option<String>,
    pub kind: EntityKind,
    pub node: Node<'t>,
}

impl<'t> CallGraphEntity<'t> {
    pub fn new(entity: &Entity, node: Node<'t>) -> Self {
        Self {
            id: entity.id.clone(),
            name: entity.name.clone(),
            qualified_name: entity.qualified_name.clone(),
            kind: entity.kind,
            node,
        }
    }
}

impl<'t> From<&ParsedEntity<'t>> for CallGraphEntity<'t> {
    fn from(parsed: &ParsedEntity<'t>) -> Self {
        Self::new(&parsed.entity, parsed.node)
    }
}

/// Per-unit extractor. Cheap to build; holds only borrows.
pub struct CallGraphExtractor<'a> {
    adapter: &'a dyn LanguageAdapter,
    builtins: &'a Builtins,
    resolver: &'a SymbolResolver,
    src: SourceText<'a>,
    file_path: &'a Path,
}

impl<'a> CallGraphExtractor<'a> {
    pub fn new(
        adapter: &'a dyn LanguageAdapter,
        builtins: &'a Builtins,
        resolver: &'a SymbolResolver,
        src: SourceText<'a>,
        file_path: &'a Path,
    ) -> Self {
        Self {
            adapter,
            builtins,
            resolver,
            src,
            file_path,
        }
    }

    /// All dependencies of one entity, in discovery order.
    pub fn extract(&self, entity: &CallGraphEntity<'_>) -> Vec<Dependency> {
        let mut edges = EdgeSet::new(&entity.id);
        match entity.kind {
            EntityKind::Function | EntityKind::Method => {
                if let Some(body) = self.adapter.body_of(entity.node) {
                    self.collect_calls(body, &mut edges);
                }
                self.collect_type_refs(entity.node, &mut edges);
                if entity.kind == EntityKind::Method {
                    self.collect_owner(entity, &mut edges);
                }
            }
            EntityKind::Type | EntityKind::Enum => {
                self.collect_bases(entity.node, &mut edges);
                for field in self.adapter.field_declarations(entity.node) {
                    self.collect_type_refs(field, &mut edges);
                }
            }
            EntityKind::Const | EntityKind::Var | EntityKind::Import => {}
        }
        edges.into_vec(self.file_path)
    }

    /// Extract every entity of a unit.
    pub fn extract_all<'t>(&self, entities: &[CallGraphEntity<'t>]) -> Vec<Dependency> {
        entities.iter().flat_map(|e| self.extract(e)).collect()
    }

    fn resolve(&self, target: &str) -> Option<String> {
        self.resolver.resolve(target).map(str::to_string)
    }
}

/// One pending edge before it becomes a [`Dependency`].
pub(crate) struct EdgeTarget {
    pub kind: DependencyKind,
    pub to_name: String,
    pub to_qualified: Option<String>,
    pub to_id: Option<String>,
    pub line: usize,
    pub optional: bool,
}

/// Edges of one entity, deduplicated by `(kind, key)`.
///
/// A repeated edge stays optional only while every occurrence is.
pub(crate) struct EdgeSet<'e> {
    from_id: &'e str,
    edges: Vec<EdgeTarget>,
    index: HashMap<(DependencyKind, String), usize>,
}

impl<'e> EdgeSet<'e> {
    fn new(from_id: &'e str) -> Self {
        Self {
            from_id,
            edges: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub(crate) fn add(&mut self, key: String, edge: EdgeTarget) {
        match self.index.get(&(edge.kind, key.clone())) {
            Some(&i) => self.edges[i].optional &= edge.optional,
            None => {
                self.index.insert((edge.kind, key), self.edges.len());
                self.edges.push(edge);
            }
        }
    }

    fn into_vec(self, file_path: &Path) -> Vec<Dependency> {
        let from_id = self.from_id;
        self.edges
            .into_iter()
            .map(|edge| Dependency {
                from_id: from_id.to_string(),
                to_name: edge.to_name,
                to_qualified: edge.to_qualified,
                to_id: edge.to_id,
                kind: edge.kind,
                location: Location {
                    file_path: file_path.to_path_buf(),
                    line: edge.line,
                },
                optional: edge.optional,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::adapter_for;
    use crate::config::BuiltinOverrides;
    use crate::parser::{extract_entities, parse_source, ParsedUnit};

    /// Parse one file, resolve against its own entities, return edges of
    /// the entity called `name`.
    pub(super) fn edges_of(path: &str, source: &str, name: &str) -> Vec<Dependency> {
        let unit = parse_source(Path::new(path), source).unwrap();
        edges_in(&unit, name)
    }

    pub(super) fn edges_in(unit: &ParsedUnit, name: &str) -> Vec<Dependency> {
        let adapter = adapter_for(unit.language);
        let parsed = extract_entities(unit, adapter);
        let resolver = SymbolResolver::build(parsed.iter().map(|p| &p.entity));
        let builtins = Builtins::for_language(unit.language, &BuiltinOverrides::default());
        let extractor =
            CallGraphExtractor::new(adapter, &builtins, &resolver, unit.source(), &unit.path);
        let target = parsed
            .iter()
            .find(|p| p.entity.name == name)
            .unwrap_or_else(|| panic!("no entity {}", name));
        extractor.extract(&CallGraphEntity::from(target))
    }

    pub(super) fn of_kind(deps: &[Dependency], kind: DependencyKind) -> Vec<&Dependency> {
        deps.iter().filter(|d| d.kind == kind).collect()
    }

    #[test]
    fn test_edge_set_dedup_keeps_unconditional() {
        let mut set = EdgeSet::new("f");
        let edge = |optional| EdgeTarget {
            kind: DependencyKind::Calls,
            to_name: "save".to_string(),
            to_qualified: None,
            to_id: None,
            line: 1,
            optional,
        };
        set.add("save".to_string(), edge(true));
        set.add("save".to_string(), edge(false));
        set.add("save".to_string(), edge(true));
        let deps = set.into_vec(Path::new("a.rs"));
        assert_eq!(deps.len(), 1);
        assert!(!deps[0].optional);
        assert_eq!(deps[0].from_id, "f");
    }

    #[test]
    fn test_const_and_import_have_no_edges() {
        let deps = edges_of("a.rs", "const MAX: Limit = Limit::new();\n", "MAX");
        assert!(deps.is_empty());
    }

    #[test]
    fn test_interface_method_without_body() {
        let deps = edges_of(
            "S.java",
            "interface Store { User find(String id); }\n",
            "find",
        );
        assert!(of_kind(&deps, DependencyKind::Calls).is_empty());
        assert_eq!(of_kind(&deps, DependencyKind::MethodOf).len(), 1);
        let uses: Vec<&str> = of_kind(&deps, DependencyKind::UsesType)
            .iter()
            .map(|d| d.to_name.as_str())
            .collect();
        assert_eq!(uses, vec!["User"]);
    }
}
