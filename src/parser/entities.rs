//! Declaration extraction.
//!
//! A single [`walk`] over the unit asks the adapter to classify each node.
//! Callables and value declarations are leaves (locals are never entities);
//! type-like declarations are descended into so their members are found.

use tree_sitter::Node;

use super::{span_of, ParsedUnit, SourceText};
use crate::adapter::{owner_chain, owner_name, DeclKind, ImportShape, LanguageAdapter};
use crate::graph::types::{Entity, EntityDetail, EntityKind};
use crate::walker::walk;

/// An entity together with its declaration node in the unit's tree.
#[derive(Debug, Clone)]
pub struct ParsedEntity<'t> {
    pub entity: Entity,
    pub node: Node<'t>,
}

/// Extract every declaration in `unit`, in source order.
pub fn extract_entities<'t>(unit: &'t ParsedUnit, adapter: &dyn LanguageAdapter) -> Vec<ParsedEntity<'t>> {
    let src = unit.source();
    let package = adapter.package_name(unit.root(), &src);
    let mut out = Vec::new();

    walk(unit.root(), |node| {
        let Some(decl) = adapter.classify(node, &src) else {
            return true;
        };
        let ctx = DeclContext {
            unit,
            adapter,
            src: &src,
            package: package.as_deref(),
        };
        match decl {
            DeclKind::Import => {
                for import in adapter.imports(node, &src) {
                    out.push(ctx.import(node, import));
                }
            }
            _ => {
                for name in adapter.declared_names(node, &src) {
                    out.push(ctx.declaration(node, decl, name));
                }
            }
        }
        matches!(decl, DeclKind::Type(_) | DeclKind::Enum)
    });

    out
}

struct DeclContext<'a, 't> {
    unit: &'t ParsedUnit,
    adapter: &'a dyn LanguageAdapter,
    src: &'a SourceText<'t>,
    package: Option<&'a str>,
}

impl<'a, 't> DeclContext<'a, 't> {
    fn declaration(&self, node: Node<'t>, decl: DeclKind, name: String) -> ParsedEntity<'t> {
        let (adapter, src) = (self.adapter, self.src);

        let (kind, detail) = match decl {
            DeclKind::Callable => {
                let owner = owner_name(adapter, node, src);
                let kind = if owner.is_some() {
                    EntityKind::Method
                } else {
                    EntityKind::Function
                };
                let detail = EntityDetail::Callable {
                    params: adapter.parameters(node, src),
                    returns: adapter.return_types(node, src),
                    receiver: adapter.receiver(node, src).or(owner),
                };
                (kind, detail)
            }
            DeclKind::Type(type_kind) => {
                let fields = adapter
                    .field_declarations(node)
                    .into_iter()
                    .flat_map(|field| adapter.field_shape(field, src))
                    .collect();
                (EntityKind::Type, EntityDetail::Type { type_kind, fields })
            }
            DeclKind::Enum => (
                EntityKind::Enum,
                EntityDetail::Enum {
                    values: adapter.enum_values(node, src),
                },
            ),
            DeclKind::Const | DeclKind::Var => {
                let kind = if decl == DeclKind::Const {
                    EntityKind::Const
                } else {
                    EntityKind::Var
                };
                let detail = EntityDetail::Value {
                    type_text: adapter.value_type(node, src),
                };
                (kind, detail)
            }
            DeclKind::Import => (
                EntityKind::Import,
                EntityDetail::Import {
                    path: name.clone(),
                    alias: None,
                },
            ),
        };

        let qualified_name = self.qualify(node, &name);
        self.entity(node, kind, name, qualified_name, detail)
    }

    fn import(&self, node: Node<'t>, import: ImportShape) -> ParsedEntity<'t> {
        let detail = EntityDetail::Import {
            path: import.path,
            alias: import.alias,
        };
        self.entity(node, EntityKind::Import, import.name, None, detail)
    }

    /// Package + owner chain + name, or `None` without any prefix.
    fn qualify(&self, node: Node<'t>, name: &str) -> Option<String> {
        let mut parts: Vec<String> = self.package.map(str::to_string).into_iter().collect();
        parts.extend(owner_chain(self.adapter, node, self.src));
        if parts.is_empty() {
            return None;
        }
        parts.push(name.to_string());
        Some(parts.join(self.adapter.scope_separator()))
    }

    fn entity(
        &self,
        node: Node<'t>,
        kind: EntityKind,
        name: String,
        qualified_name: Option<String>,
        detail: EntityDetail,
    ) -> ParsedEntity<'t> {
        let line_start = node.start_position().row + 1;
        let entity = Entity {
            id: Entity::make_id(kind, &self.unit.path, line_start, &name),
            kind,
            name,
            qualified_name,
            language: self.unit.language,
            file_path: self.unit.path.clone(),
            line_start,
            line_end: node.end_position().row + 1,
            detail,
            sig_hash: String::new(),
            body_hash: String::new(),
            span: span_of(node),
        };
        ParsedEntity { entity, node }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::adapter_for;
    use crate::graph::types::TypeKind;
    use crate::parser::parse_source;
    use std::path::Path;

    fn extract(path: &str, source: &str) -> Vec<Entity> {
        let unit = parse_source(Path::new(path), source).unwrap();
        extract_entities(&unit, adapter_for(unit.language))
            .into_iter()
            .map(|p| p.entity)
            .collect()
    }

    fn by_name<'a>(entities: &'a [Entity], name: &str) -> &'a Entity {
        entities
            .iter()
            .find(|e| e.name == name)
            .unwrap_or_else(|| panic!("no entity {}", name))
    }

    #[test]
    fn test_rust_entities() {
        let entities = extract(
            "src/user.rs",
            r#"use std::collections::HashMap;

const MAX: usize = 10;

pub struct User {
    id: u64,
    name: String,
}

impl User {
    pub fn new(id: u64) -> Self {
        fn helper() {}
        User { id, name: String::new() }
    }
}

pub enum Role { Admin, Member }

fn main() {}
"#,
        );
        let names: Vec<&str> = entities.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["HashMap", "MAX", "User", "new", "Role", "main"]);

        let new = by_name(&entities, "new");
        assert_eq!(new.kind, EntityKind::Method);
        assert_eq!(new.qualified_name.as_deref(), Some("User::new"));
        assert_eq!(new.line_start, 11);
        assert_eq!(new.line_end, 14);

        let user = by_name(&entities, "User");
        assert_eq!(user.kind, EntityKind::Type);
        match &user.detail {
            EntityDetail::Type { type_kind, fields } => {
                assert_eq!(*type_kind, TypeKind::Struct);
                assert_eq!(fields.len(), 2);
            }
            other => panic!("unexpected detail {:?}", other),
        }

        let role = by_name(&entities, "Role");
        assert_eq!(
            role.detail,
            EntityDetail::Enum {
                values: vec!["Admin".to_string(), "Member".to_string()]
            }
        );

        assert_eq!(by_name(&entities, "main").kind, EntityKind::Function);
        assert_eq!(by_name(&entities, "main").qualified_name, None);
        assert_eq!(by_name(&entities, "MAX").kind, EntityKind::Const);
    }

    #[test]
    fn test_go_receiver_methods_and_package() {
        let entities = extract(
            "users/user.go",
            "package users\n\nimport \"fmt\"\n\nconst A, B = 1, 2\n\ntype User struct {\n\tName string\n}\n\nfunc (u *User) Greet() { fmt.Println(u.Name) }\n\nfunc New() *User { return &User{} }\n",
        );
        let greet = by_name(&entities, "Greet");
        assert_eq!(greet.kind, EntityKind::Method);
        assert_eq!(greet.qualified_name.as_deref(), Some("users.User.Greet"));
        match &greet.detail {
            EntityDetail::Callable { receiver, .. } => {
                assert_eq!(receiver.as_deref(), Some("*User"))
            }
            other => panic!("unexpected detail {:?}", other),
        }

        let new = by_name(&entities, "New");
        assert_eq!(new.kind, EntityKind::Function);
        assert_eq!(new.qualified_name.as_deref(), Some("users.New"));

        assert_eq!(by_name(&entities, "A").kind, EntityKind::Const);
        assert_eq!(by_name(&entities, "B").kind, EntityKind::Const);
        assert_eq!(by_name(&entities, "fmt").kind, EntityKind::Import);
    }

    #[test]
    fn test_java_nested_owner_chain() {
        let entities = extract(
            "src/Outer.java",
            "package com.acme;\n\npublic class Outer {\n  static class Inner {\n    void run() {}\n  }\n  Outer() {}\n}\n",
        );
        let run = by_name(&entities, "run");
        assert_eq!(run.qualified_name.as_deref(), Some("com.acme.Outer.Inner.run"));
        let inner = by_name(&entities, "Inner");
        assert_eq!(inner.qualified_name.as_deref(), Some("com.acme.Outer.Inner"));
        let ctor = entities
            .iter()
            .find(|e| e.name == "Outer" && e.kind == EntityKind::Method)
            .unwrap();
        assert_eq!(ctor.qualified_name.as_deref(), Some("com.acme.Outer.Outer"));
    }

    #[test]
    fn test_python_methods_and_module_values() {
        let entities = extract(
            "app/service.py",
            "import os\n\nTIMEOUT = 30\n\nclass Service(Base):\n    retries: int = 3\n\n    def run(self):\n        local = 1\n        return local\n\ndef main():\n    pass\n",
        );
        let names: Vec<&str> = entities.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["os", "TIMEOUT", "Service", "run", "main"]);
        assert_eq!(by_name(&entities, "run").kind, EntityKind::Method);
        assert_eq!(
            by_name(&entities, "run").qualified_name.as_deref(),
            Some("Service.run")
        );
        assert_eq!(by_name(&entities, "main").kind, EntityKind::Function);
    }

    #[test]
    fn test_typescript_entities() {
        let entities = extract(
            "web/store.ts",
            "interface Repo { find(id: string): User; }\nexport class Store implements Repo {\n  cache: Map<string, User>;\n  find(id: string): User { return this.cache.get(id); }\n}\nexport const load = () => new Store();\nenum Mode { Fast, Slow }\n",
        );
        let find: Vec<&Entity> = entities.iter().filter(|e| e.name == "find").collect();
        assert_eq!(find.len(), 2);
        assert_eq!(find[0].qualified_name.as_deref(), Some("Repo.find"));
        assert_eq!(find[1].qualified_name.as_deref(), Some("Store.find"));
        assert_eq!(by_name(&entities, "load").kind, EntityKind::Function);
        assert_eq!(by_name(&entities, "Mode").kind, EntityKind::Enum);
    }

    #[test]
    fn test_ids_anchor_on_location() {
        let a = extract("a.rs", "fn f() {}\n");
        let b = extract("a.rs", "fn f() {}\n");
        let shifted = extract("a.rs", "\nfn f() {}\n");
        assert_eq!(a[0].id, b[0].id);
        assert_ne!(a[0].id, shifted[0].id);
    }

    #[test]
    fn test_malformed_source_yields_partial_entities() {
        let entities = extract("bad.rs", "fn ok() {}\nfn broken( {\n");
        assert!(entities.iter().any(|e| e.name == "ok"));
    }
}
