//! Type-usage, inheritance and ownership edges.

use tree_sitter::Node;

use super::{CallGraphEntity, CallGraphExtractor, EdgeSet, EdgeTarget};
use crate::adapter::{
    is_qualified, last_segment, owner_name, strip_generics, BaseClause, DeclKind,
};
use crate::graph::types::{qualifier_of, DependencyKind};
use crate::walker::walk;

impl CallGraphExtractor<'_> {
    /// `UsesType` edges for every type reference under `root`.
    pub(super) fn collect_type_refs(&self, root: Node<'_>, edges: &mut EdgeSet<'_>) {
        walk(root, |node| {
            let Some(text) = self.adapter.type_reference(node, &self.src) else {
                return true;
            };
            self.add_type_edge(DependencyKind::UsesType, &text, node.start_position().row, edges);
            false
        });
    }

    /// `Extends` / `Implements` edges from a declaration's supertype list.
    ///
    /// Explicit clauses keep their kind. In a positional list the first
    /// entry extends and the rest implement, except on interface-like kinds
    /// where every entry extends.
    pub(super) fn collect_bases(&self, node: Node<'_>, edges: &mut EdgeSet<'_>) {
        let interface_like = matches!(
            self.adapter.classify(node, &self.src),
            Some(DeclKind::Type(kind)) if kind.is_interface_like()
        );

        for (position, base) in self.adapter.base_types(node, &self.src).into_iter().enumerate() {
            let kind = match base.clause {
                BaseClause::Extends => DependencyKind::Extends,
                BaseClause::Implements => DependencyKind::Implements,
                BaseClause::Positional if interface_like || position == 0 => {
                    DependencyKind::Extends
                }
                BaseClause::Positional => DependencyKind::Implements,
            };
            self.add_type_edge(kind, &base.text, base.row, edges);
        }
    }

    /// One `MethodOf` edge to the owning type.
    pub(super) fn collect_owner(&self, entity: &CallGraphEntity<'_>, edges: &mut EdgeSet<'_>) {
        let Some(owner) = owner_name(self.adapter, entity.node, &self.src) else {
            return;
        };
        let qualifier = entity
            .qualified_name
            .as_deref()
            .and_then(|q| qualifier_of(q, &entity.name))
            .map(str::to_string);
        let target = qualifier.clone().unwrap_or_else(|| owner.clone());

        edges.add(
            owner.clone(),
            EdgeTarget {
                kind: DependencyKind::MethodOf,
                to_id: self.resolve(&target),
                to_name: owner,
                to_qualified: qualifier,
                line: entity.node.start_position().row + 1,
                optional: false,
            },
        );
    }

    fn add_type_edge(&self, kind: DependencyKind, text: &str, row: usize, edges: &mut EdgeSet<'_>) {
        let ty = strip_generics(text);
        if ty.is_empty() || self.builtins.is_builtin_qualifier(&ty) {
            return;
        }
        edges.add(
            ty.clone(),
            EdgeTarget {
                kind,
                to_id: self.resolve(&ty),
                to_name: last_segment(&ty).to_string(),
                to_qualified: is_qualified(&ty).then(|| ty.clone()),
                line: row + 1,
                optional: false,
            },
        );
    }
}
