//! Java grammar adapter.

use tree_sitter::Node;

use super::{
    child_of_kind, children_of_kind, is_field_of, last_segment, normalize_type, BaseClause,
    BaseType, Callee, DeclKind, ImportShape, LanguageAdapter,
};
use crate::graph::types::{Field, Param, TypeKind};
use crate::parser::SourceText;

pub struct JavaAdapter;

const BUILTINS: &[&str] = &[
    // java.lang
    "Object", "String", "StringBuilder", "Integer", "Long", "Short", "Byte", "Double",
    "Float", "Boolean", "Character", "Number", "Math", "System", "Thread", "Runnable",
    "Iterable", "Comparable", "CharSequence", "Class", "Void", "Enum", "Record", "Override",
    "Deprecated", "SuppressWarnings", "FunctionalInterface", "var",
    // exceptions
    "Exception", "RuntimeException", "Error", "Throwable", "IllegalArgumentException",
    "IllegalStateException", "NullPointerException", "IndexOutOfBoundsException",
    "UnsupportedOperationException", "IOException", "InterruptedException",
    // java.util
    "List", "ArrayList", "LinkedList", "Map", "HashMap", "LinkedHashMap", "TreeMap", "Set",
    "HashSet", "LinkedHashSet", "TreeSet", "Queue", "Deque", "ArrayDeque", "Collection",
    "Collections", "Arrays", "Objects", "Optional", "Iterator", "UUID",
    // java.util.function / stream
    "Function", "BiFunction", "Supplier", "Consumer", "Predicate", "Stream", "Collectors",
    // java.time
    "Instant", "Duration", "LocalDate", "LocalDateTime",
];

const TYPE_DECLARATIONS: &[&str] = &[
    "class_declaration",
    "interface_declaration",
    "enum_declaration",
    "record_declaration",
];

impl LanguageAdapter for JavaAdapter {
    fn name(&self) -> &'static str {
        "java"
    }

    fn default_builtins(&self) -> &'static [&'static str] {
        BUILTINS
    }

    fn classify(&self, node: Node<'_>, src: &SourceText<'_>) -> Option<DeclKind> {
        match node.kind() {
            "method_declaration" | "constructor_declaration" | "compact_constructor_declaration" => {
                Some(DeclKind::Callable)
            }
            "class_declaration" => Some(DeclKind::Type(TypeKind::Class)),
            "interface_declaration" | "annotation_type_declaration" => {
                Some(DeclKind::Type(TypeKind::Interface))
            }
            "record_declaration" => Some(DeclKind::Type(TypeKind::Record)),
            "enum_declaration" => Some(DeclKind::Enum),
            "constant_declaration" => Some(DeclKind::Const),
            "field_declaration" => {
                let modifiers = modifiers(node, src);
                if !modifiers.contains(&"static") {
                    return None;
                }
                if modifiers.contains(&"final") {
                    Some(DeclKind::Const)
                } else {
                    Some(DeclKind::Var)
                }
            }
            "import_declaration" => Some(DeclKind::Import),
            _ => None,
        }
    }

    fn declared_names(&self, node: Node<'_>, src: &SourceText<'_>) -> Vec<String> {
        match node.kind() {
            "field_declaration" | "constant_declaration" => declarators(node)
                .into_iter()
                .filter_map(|d| src.field(d, "name"))
                .map(str::to_string)
                .collect(),
            // compact constructors repeat the record name
            "compact_constructor_declaration" => node
                .parent()
                .and_then(|body| body.parent())
                .and_then(|record| src.field(record, "name"))
                .map(|name| vec![name.to_string()])
                .unwrap_or_default(),
            _ => src
                .field(node, "name")
                .map(|name| vec![name.to_string()])
                .unwrap_or_default(),
        }
    }

    fn parameters(&self, node: Node<'_>, src: &SourceText<'_>) -> Vec<Param> {
        let Some(list) = node.child_by_field_name("parameters") else {
            return Vec::new();
        };
        formal_parameters(list, src)
    }

    fn return_types(&self, node: Node<'_>, src: &SourceText<'_>) -> Vec<String> {
        if node.kind() != "method_declaration" {
            return Vec::new();
        }
        src.field(node, "type")
            .map(|ty| vec![normalize_type(ty)])
            .unwrap_or_default()
    }

    fn field_declarations<'t>(&self, node: Node<'t>) -> Vec<Node<'t>> {
        let mut fields = Vec::new();
        if node.kind() == "record_declaration" {
            if let Some(params) = node.child_by_field_name("parameters") {
                fields.extend(children_of_kind(params, "formal_parameter"));
            }
        }
        if let Some(body) = node.child_by_field_name("body") {
            fields.extend(children_of_kind(body, "field_declaration"));
            // enum bodies keep their members in a nested declarations node
            if let Some(decls) = child_of_kind(body, "enum_body_declarations") {
                fields.extend(children_of_kind(decls, "field_declaration"));
            }
        }
        fields
    }

    fn field_shape(&self, field: Node<'_>, src: &SourceText<'_>) -> Vec<Field> {
        let type_text = src.field(field, "type").map(normalize_type);
        match field.kind() {
            "formal_parameter" => vec![Field {
                name: src.field(field, "name").unwrap_or_default().to_string(),
                type_text,
            }],
            _ => declarators(field)
                .into_iter()
                .map(|d| Field {
                    name: src.field(d, "name").unwrap_or_default().to_string(),
                    type_text: type_text.clone(),
                })
                .collect(),
        }
    }

    fn enum_values(&self, node: Node<'_>, src: &SourceText<'_>) -> Vec<String> {
        let Some(body) = node.child_by_field_name("body") else {
            return Vec::new();
        };
        children_of_kind(body, "enum_constant")
            .into_iter()
            .filter_map(|constant| src.field(constant, "name"))
            .map(str::to_string)
            .collect()
    }

    fn imports(&self, node: Node<'_>, src: &SourceText<'_>) -> Vec<ImportShape> {
        let mut cursor = node.walk();
        let target = node
            .named_children(&mut cursor)
            .find(|c| matches!(c.kind(), "scoped_identifier" | "identifier"));
        let Some(target) = target else {
            return Vec::new();
        };
        let path = src.text(target).to_string();
        if child_of_kind(node, "asterisk").is_some() {
            return vec![ImportShape {
                name: "*".to_string(),
                path: format!("{}.*", path),
                alias: None,
            }];
        }
        vec![ImportShape {
            name: last_segment(&path).to_string(),
            path,
            alias: None,
        }]
    }

    fn package_name(&self, root: Node<'_>, src: &SourceText<'_>) -> Option<String> {
        let package = child_of_kind(root, "package_declaration")?;
        let mut cursor = package.walk();
        let name = package
            .named_children(&mut cursor)
            .find(|c| matches!(c.kind(), "scoped_identifier" | "identifier"))?;
        Some(src.text(name).to_string())
    }

    fn body_of<'t>(&self, node: Node<'t>) -> Option<Node<'t>> {
        match node.kind() {
            "field_declaration" | "constant_declaration" => declarators(node)
                .into_iter()
                .find_map(|d| d.child_by_field_name("value")),
            _ => node.child_by_field_name("body"),
        }
    }

    fn is_call(&self, node: Node<'_>) -> bool {
        node.kind() == "method_invocation"
    }

    fn callee(&self, node: Node<'_>, src: &SourceText<'_>) -> Option<Callee> {
        let name = src.field(node, "name")?;
        match src.field(node, "object") {
            Some(object) => Some(Callee::qualified(object, name, ".")),
            None => Some(Callee::bare(name)),
        }
    }

    fn is_construction(&self, node: Node<'_>) -> bool {
        node.kind() == "object_creation_expression"
    }

    fn constructed_type(&self, node: Node<'_>, src: &SourceText<'_>) -> Option<String> {
        src.field(node, "type").map(str::to_string)
    }

    fn type_reference(&self, node: Node<'_>, src: &SourceText<'_>) -> Option<String> {
        match node.kind() {
            "scoped_type_identifier" => Some(normalize_type(src.text(node))),
            "type_identifier" => {
                let parent = node.parent()?;
                if parent.kind() == "type_parameter"
                    || is_field_of(node, &["object_creation_expression"], "type")
                {
                    return None;
                }
                Some(src.text(node).to_string())
            }
            _ => None,
        }
    }

    fn base_types(&self, node: Node<'_>, src: &SourceText<'_>) -> Vec<BaseType> {
        let mut bases = Vec::new();
        if let Some(superclass) = node.child_by_field_name("superclass") {
            let mut cursor = superclass.walk();
            for ty in superclass.named_children(&mut cursor) {
                bases.push(base(ty, BaseClause::Extends, src));
            }
        }
        if let Some(interfaces) = node.child_by_field_name("interfaces") {
            for ty in type_list(interfaces) {
                bases.push(base(ty, BaseClause::Implements, src));
            }
        }
        if let Some(extends) = child_of_kind(node, "extends_interfaces") {
            for ty in type_list(extends) {
                bases.push(base(ty, BaseClause::Extends, src));
            }
        }
        bases
    }

    fn is_branch(&self, kind: &str) -> bool {
        matches!(
            kind,
            "if_statement"
                | "switch_expression"
                | "switch_statement"
                | "switch_block_statement_group"
                | "switch_rule"
                | "ternary_expression"
        )
    }

    fn is_callable_boundary(&self, kind: &str) -> bool {
        matches!(
            kind,
            "method_declaration"
                | "constructor_declaration"
                | "compact_constructor_declaration"
                | "lambda_expression"
                | "static_initializer"
        )
    }

    fn is_type_boundary(&self, kind: &str) -> bool {
        TYPE_DECLARATIONS.contains(&kind) || kind == "annotation_type_declaration"
    }
}

fn modifiers<'a>(node: Node<'_>, src: &SourceText<'a>) -> Vec<&'a str> {
    let Some(modifiers) = child_of_kind(node, "modifiers") else {
        return Vec::new();
    };
    src.text(modifiers).split_whitespace().collect()
}

fn declarators(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    node.children_by_field_name("declarator", &mut cursor).collect()
}

fn type_list(node: Node<'_>) -> Vec<Node<'_>> {
    let list = child_of_kind(node, "type_list").unwrap_or(node);
    let mut cursor = list.walk();
    list.named_children(&mut cursor).collect()
}

fn base(ty: Node<'_>, clause: BaseClause, src: &SourceText<'_>) -> BaseType {
    BaseType {
        text: normalize_type(src.text(ty)),
        clause,
        row: ty.start_position().row,
    }
}

fn formal_parameters(list: Node<'_>, src: &SourceText<'_>) -> Vec<Param> {
    let mut cursor = list.walk();
    list.named_children(&mut cursor)
        .filter_map(|param| match param.kind() {
            "formal_parameter" => Some(Param {
                name: src.field(param, "name").unwrap_or_default().to_string(),
                type_text: src.field(param, "type").map(normalize_type),
            }),
            "spread_parameter" => {
                let mut inner = param.walk();
                let children: Vec<Node<'_>> = param.named_children(&mut inner).collect();
                let ty = children
                    .iter()
                    .find(|c| !matches!(c.kind(), "modifiers" | "variable_declarator"));
                let name = children
                    .iter()
                    .find(|c| c.kind() == "variable_declarator")
                    .and_then(|d| src.field(*d, "name"));
                Some(Param {
                    name: name.unwrap_or_default().to_string(),
                    type_text: ty.map(|t| format!("{}...", normalize_type(src.text(*t)))),
                })
            }
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_source;
    use crate::walker::walk;
    use std::path::Path;

    fn find<'t>(root: Node<'t>, kind: &str) -> Node<'t> {
        let mut found = None;
        walk(root, |node| {
            if found.is_none() && node.kind() == kind {
                found = Some(node);
            }
            found.is_none()
        });
        found.unwrap_or_else(|| panic!("no {} node", kind))
    }

    #[test]
    fn test_class_bases_in_order() {
        let unit = parse_source(
            Path::new("A.java"),
            "class Admin extends User implements Auditable, Comparable<Admin> {}\n",
        )
        .unwrap();
        let src = unit.source();
        let class = find(unit.root(), "class_declaration");
        let bases = JavaAdapter.base_types(class, &src);
        assert_eq!(bases.len(), 3);
        assert_eq!(bases[0].text, "User");
        assert_eq!(bases[0].clause, BaseClause::Extends);
        assert_eq!(bases[1].text, "Auditable");
        assert_eq!(bases[1].clause, BaseClause::Implements);
        assert_eq!(bases[2].text, "Comparable<Admin>");
    }

    #[test]
    fn test_interface_extends() {
        let unit = parse_source(
            Path::new("R.java"),
            "interface Repo extends Reader, Writer {}\n",
        )
        .unwrap();
        let src = unit.source();
        let iface = find(unit.root(), "interface_declaration");
        let bases = JavaAdapter.base_types(iface, &src);
        assert!(bases.iter().all(|b| b.clause == BaseClause::Extends));
        assert_eq!(bases.len(), 2);
    }

    #[test]
    fn test_static_final_field_is_const() {
        let unit = parse_source(
            Path::new("C.java"),
            "class C { static final int MAX = 3, MIN = 1; private String name; }\n",
        )
        .unwrap();
        let src = unit.source();
        let mut kinds = Vec::new();
        walk(unit.root(), |node| {
            if node.kind() == "field_declaration" {
                kinds.push(JavaAdapter.classify(node, &src));
                if kinds.len() == 1 {
                    assert_eq!(JavaAdapter.declared_names(node, &src), vec!["MAX", "MIN"]);
                }
            }
            true
        });
        assert_eq!(kinds, vec![Some(DeclKind::Const), None]);

        let class = find(unit.root(), "class_declaration");
        let fields: Vec<Field> = JavaAdapter
            .field_declarations(class)
            .into_iter()
            .flat_map(|f| JavaAdapter.field_shape(f, &src))
            .collect();
        assert_eq!(fields.len(), 3);
        assert_eq!(fields[2].name, "name");
        assert_eq!(fields[2].type_text.as_deref(), Some("String"));
    }

    #[test]
    fn test_invocation_callee() {
        let unit = parse_source(
            Path::new("S.java"),
            "class S { void run() { this.repo.save(user); log(); } }\n",
        )
        .unwrap();
        let src = unit.source();
        let mut callees = Vec::new();
        walk(unit.root(), |node| {
            if JavaAdapter.is_call(node) {
                callees.push(JavaAdapter.callee(node, &src).unwrap().full());
            }
            true
        });
        assert_eq!(callees, vec!["this.repo.save", "log"]);
    }

    #[test]
    fn test_imports_and_package() {
        let unit = parse_source(
            Path::new("S.java"),
            "package com.acme.users;\n\nimport java.util.List;\nimport com.acme.core.*;\n",
        )
        .unwrap();
        let src = unit.source();
        assert_eq!(
            JavaAdapter.package_name(unit.root(), &src).as_deref(),
            Some("com.acme.users")
        );
        let mut imports = Vec::new();
        walk(unit.root(), |node| {
            if node.kind() == "import_declaration" {
                imports.extend(JavaAdapter.imports(node, &src));
            }
            true
        });
        assert_eq!(imports[0].name, "List");
        assert_eq!(imports[0].path, "java.util.List");
        assert_eq!(imports[1].name, "*");
        assert_eq!(imports[1].path, "com.acme.core.*");
    }
}
