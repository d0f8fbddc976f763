//! Batch-local symbol resolution.
//!
//! [`SymbolResolver`] is built once from every entity in a batch and is
//! read-only afterwards, so the call-graph pass can share it across threads
//! without locking.

use std::collections::HashMap;

use crate::adapter::{is_qualified, last_segment};
use crate::graph::types::{Entity, EntityKind};

/// Name → entity id index over one batch.
#[derive(Debug, Clone, Default)]
pub struct SymbolResolver {
    by_qualified: HashMap<String, String>,
    by_name: HashMap<String, String>,
}

impl SymbolResolver {
    /// Index `entities`. When several entities share a name the first one
    /// wins. Imports are not resolution targets.
    pub fn build<'a>(entities: impl IntoIterator<Item = &'a Entity>) -> Self {
        let mut resolver = Self::default();
        for entity in entities {
            if entity.kind == EntityKind::Import {
                continue;
            }
            if let Some(qualified) = &entity.qualified_name {
                resolver
                    .by_qualified
                    .entry(qualified.clone())
                    .or_insert_with(|| entity.id.clone());
            }
            resolver
                .by_name
                .entry(entity.name.clone())
                .or_insert_with(|| entity.id.clone());
        }
        resolver
    }

    /// Resolve `target` to an entity id.
    ///
    /// Exact qualified or simple match first; a qualified target that misses
    /// is retried with its last segment only.
    pub fn resolve(&self, target: &str) -> Option<&str> {
        if let Some(id) = self.lookup(target) {
            return Some(id);
        }
        if is_qualified(target) {
            return self.by_name.get(last_segment(target)).map(String::as_str);
        }
        None
    }

    fn lookup(&self, name: &str) -> Option<&str> {
        self.by_qualified
            .get(name)
            .or_else(|| self.by_name.get(name))
            .map(String::as_str)
    }

    /// Number of distinct names indexed.
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::types::{EntityDetail, NodeSpan, TypeKind};
    use crate::parser::SupportedLanguage;
    use std::path::PathBuf;

    fn entity(kind: EntityKind, name: &str, qualified: Option<&str>, id: &str) -> Entity {
        Entity {
            id: id.to_string(),
            kind,
            name: name.to_string(),
            qualified_name: qualified.map(str::to_string),
            language: SupportedLanguage::Rust,
            file_path: PathBuf::from("src/lib.rs"),
            line_start: 1,
            line_end: 1,
            detail: EntityDetail::Type {
                type_kind: TypeKind::Struct,
                fields: vec![],
            },
            sig_hash: String::new(),
            body_hash: String::new(),
            span: NodeSpan::default(),
        }
    }

    #[test]
    fn test_exact_and_qualified_match() {
        let entities = vec![
            entity(EntityKind::Type, "User", None, "type:1"),
            entity(EntityKind::Method, "new", Some("User::new"), "method:2"),
        ];
        let resolver = SymbolResolver::build(&entities);
        assert_eq!(resolver.resolve("User"), Some("type:1"));
        assert_eq!(resolver.resolve("User::new"), Some("method:2"));
        assert_eq!(resolver.resolve("new"), Some("method:2"));
    }

    #[test]
    fn test_last_segment_fallback() {
        let entities = vec![entity(EntityKind::Type, "HashMap", None, "type:9")];
        let resolver = SymbolResolver::build(&entities);
        assert_eq!(resolver.resolve("std::collections::HashMap"), Some("type:9"));
        assert_eq!(resolver.resolve("java.util.HashMap"), Some("type:9"));
        assert_eq!(resolver.resolve("BTreeMap"), None);
    }

    #[test]
    fn test_first_entity_wins() {
        let entities = vec![
            entity(EntityKind::Function, "save", None, "function:a"),
            entity(EntityKind::Function, "save", None, "function:b"),
        ];
        let resolver = SymbolResolver::build(&entities);
        assert_eq!(resolver.resolve("save"), Some("function:a"));
        assert_eq!(resolver.len(), 1);
    }

    #[test]
    fn test_imports_are_not_targets() {
        let entities = vec![entity(EntityKind::Import, "HashMap", None, "import:1")];
        let resolver = SymbolResolver::build(&entities);
        assert!(resolver.is_empty());
        assert_eq!(resolver.resolve("HashMap"), None);
    }
}
