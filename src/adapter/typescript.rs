//! TypeScript, TSX and JavaScript grammar adapter.
//!
//! The JavaScript grammar is a subset of the TypeScript one for everything
//! this adapter asks about, so all three share it.

use tree_sitter::Node;

use super::{
    child_of_kind, children_of_kind, is_field_of, normalize_type, unquote, BaseClause, BaseType,
    Callee, DeclKind, ImportShape, LanguageAdapter,
};
use crate::graph::types::{Field, Param, TypeKind};
use crate::parser::SourceText;

pub struct TypeScriptAdapter;

const BUILTINS: &[&str] = &[
    // primitives and globals
    "string", "number", "boolean", "bigint", "symbol", "object", "unknown", "never", "void",
    "any", "undefined", "null", "super", "globalThis", "window", "document", "process",
    "console", "require", "module", "exports",
    // standard objects
    "Object", "Array", "String", "Number", "Boolean", "Symbol", "BigInt", "Function", "Date",
    "RegExp", "Math", "JSON", "Promise", "Map", "Set", "WeakMap", "WeakSet", "Proxy",
    "Reflect", "Intl", "Buffer", "URL", "URLSearchParams",
    "Error", "TypeError", "RangeError", "SyntaxError", "ReferenceError",
    // global functions
    "parseInt", "parseFloat", "isNaN", "isFinite", "setTimeout", "setInterval",
    "clearTimeout", "clearInterval", "fetch", "structuredClone",
    // utility types
    "Record", "Partial", "Required", "Readonly", "Pick", "Omit", "Exclude", "Extract",
    "NonNullable", "ReturnType", "Parameters", "InstanceType", "Awaited", "ReadonlyArray",
    "Iterable", "AsyncIterable", "PromiseLike",
];

const DECLARATION_NAMES: &[&str] = &[
    "class_declaration",
    "abstract_class_declaration",
    "interface_declaration",
    "type_alias_declaration",
    "enum_declaration",
    "type_parameter",
];

const FUNCTION_VALUES: &[&str] = &["arrow_function", "function_expression", "function"];

impl LanguageAdapter for TypeScriptAdapter {
    fn name(&self) -> &'static str {
        "typescript"
    }

    fn default_builtins(&self) -> &'static [&'static str] {
        BUILTINS
    }

    fn classify(&self, node: Node<'_>, _src: &SourceText<'_>) -> Option<DeclKind> {
        match node.kind() {
            "function_declaration"
            | "generator_function_declaration"
            | "method_definition"
            | "method_signature"
            | "abstract_method_signature" => Some(DeclKind::Callable),
            "class_declaration" | "abstract_class_declaration" => {
                Some(DeclKind::Type(TypeKind::Class))
            }
            "interface_declaration" => Some(DeclKind::Type(TypeKind::Interface)),
            "type_alias_declaration" => Some(DeclKind::Type(TypeKind::Alias)),
            "enum_declaration" => Some(DeclKind::Enum),
            "import_statement" => Some(DeclKind::Import),
            "variable_declarator" => {
                let declaration = top_level_declaration(node)?;
                if function_value(node).is_some() {
                    Some(DeclKind::Callable)
                } else if keyword(declaration) == Some("const") {
                    Some(DeclKind::Const)
                } else {
                    Some(DeclKind::Var)
                }
            }
            _ => None,
        }
    }

    fn parameters(&self, node: Node<'_>, src: &SourceText<'_>) -> Vec<Param> {
        let target = function_value(node).unwrap_or(node);
        let Some(list) = target.child_by_field_name("parameters") else {
            // `x => ...`
            return target
                .child_by_field_name("parameter")
                .map(|p| {
                    vec![Param {
                        name: src.text(p).to_string(),
                        type_text: None,
                    }]
                })
                .unwrap_or_default();
        };
        let mut cursor = list.walk();
        list.named_children(&mut cursor)
            .filter(|p| p.kind() != "comment")
            .map(|param| match param.kind() {
                "required_parameter" | "optional_parameter" => Param {
                    name: src.field(param, "pattern").unwrap_or_default().to_string(),
                    type_text: param
                        .child_by_field_name("type")
                        .map(|t| annotation_text(t, src)),
                },
                // plain JavaScript parameters are bare patterns
                _ => Param {
                    name: src.text(param).to_string(),
                    type_text: None,
                },
            })
            .collect()
    }

    fn return_types(&self, node: Node<'_>, src: &SourceText<'_>) -> Vec<String> {
        let target = function_value(node).unwrap_or(node);
        target
            .child_by_field_name("return_type")
            .map(|t| vec![annotation_text(t, src)])
            .unwrap_or_default()
    }

    fn field_declarations<'t>(&self, node: Node<'t>) -> Vec<Node<'t>> {
        if node.kind() == "type_alias_declaration" {
            return node.child_by_field_name("value").into_iter().collect();
        }
        let Some(body) = node.child_by_field_name("body") else {
            return Vec::new();
        };
        let mut cursor = body.walk();
        body.named_children(&mut cursor)
            .filter(|member| {
                matches!(
                    member.kind(),
                    "public_field_definition" | "field_definition" | "property_signature"
                )
            })
            .collect()
    }

    fn field_shape(&self, field: Node<'_>, src: &SourceText<'_>) -> Vec<Field> {
        match field.kind() {
            "public_field_definition" | "property_signature" => vec![Field {
                name: src.field(field, "name").unwrap_or_default().to_string(),
                type_text: field
                    .child_by_field_name("type")
                    .map(|t| annotation_text(t, src)),
            }],
            "field_definition" => vec![Field {
                name: src.field(field, "property").unwrap_or_default().to_string(),
                type_text: None,
            }],
            // aliased type
            _ => vec![Field {
                name: String::new(),
                type_text: Some(normalize_type(src.text(field))),
            }],
        }
    }

    fn enum_values(&self, node: Node<'_>, src: &SourceText<'_>) -> Vec<String> {
        let Some(body) = node.child_by_field_name("body") else {
            return Vec::new();
        };
        let mut cursor = body.walk();
        body.named_children(&mut cursor)
            .filter_map(|member| match member.kind() {
                "property_identifier" | "string" => Some(src.text(member).to_string()),
                "enum_assignment" => src.field(member, "name").map(str::to_string),
                _ => None,
            })
            .collect()
    }

    fn value_type(&self, node: Node<'_>, src: &SourceText<'_>) -> Option<String> {
        node.child_by_field_name("type").map(|t| annotation_text(t, src))
    }

    fn imports(&self, node: Node<'_>, src: &SourceText<'_>) -> Vec<ImportShape> {
        let Some(path) = src.field(node, "source").map(unquote) else {
            return Vec::new();
        };
        let Some(clause) = child_of_kind(node, "import_clause") else {
            // side-effect import
            return vec![ImportShape {
                name: path.clone(),
                path,
                alias: None,
            }];
        };

        let mut out = Vec::new();
        let mut cursor = clause.walk();
        for part in clause.named_children(&mut cursor) {
            match part.kind() {
                "identifier" => out.push(ImportShape {
                    name: src.text(part).to_string(),
                    path: path.clone(),
                    alias: None,
                }),
                "namespace_import" => {
                    if let Some(ident) = child_of_kind(part, "identifier") {
                        out.push(ImportShape {
                            name: src.text(ident).to_string(),
                            path: format!("{}.*", path),
                            alias: Some(src.text(ident).to_string()),
                        });
                    }
                }
                "named_imports" => {
                    for spec in children_of_kind(part, "import_specifier") {
                        let imported = src.field(spec, "name").unwrap_or_default();
                        let alias = src.field(spec, "alias").map(str::to_string);
                        out.push(ImportShape {
                            name: alias.clone().unwrap_or_else(|| imported.to_string()),
                            path: format!("{}.{}", path, imported),
                            alias,
                        });
                    }
                }
                _ => {}
            }
        }
        out
    }

    fn body_of<'t>(&self, node: Node<'t>) -> Option<Node<'t>> {
        if node.kind() == "variable_declarator" {
            return match function_value(node) {
                Some(function) => function.child_by_field_name("body"),
                None => node.child_by_field_name("value"),
            };
        }
        node.child_by_field_name("body")
    }

    fn is_call(&self, node: Node<'_>) -> bool {
        node.kind() == "call_expression"
    }

    fn callee(&self, node: Node<'_>, src: &SourceText<'_>) -> Option<Callee> {
        let function = node.child_by_field_name("function")?;
        match function.kind() {
            "identifier" | "super" | "import" => Some(Callee::bare(src.text(function))),
            "member_expression" => Some(Callee::qualified(
                src.field(function, "object")?,
                src.field(function, "property")?,
                ".",
            )),
            _ => None,
        }
    }

    fn is_construction(&self, node: Node<'_>) -> bool {
        node.kind() == "new_expression"
    }

    fn constructed_type(&self, node: Node<'_>, src: &SourceText<'_>) -> Option<String> {
        src.field(node, "constructor").map(str::to_string)
    }

    fn type_reference(&self, node: Node<'_>, src: &SourceText<'_>) -> Option<String> {
        match node.kind() {
            "nested_type_identifier" => Some(normalize_type(src.text(node))),
            "type_identifier" => {
                if is_field_of(node, DECLARATION_NAMES, "name") {
                    return None;
                }
                Some(src.text(node).to_string())
            }
            _ => None,
        }
    }

    fn base_types(&self, node: Node<'_>, src: &SourceText<'_>) -> Vec<BaseType> {
        let mut bases = Vec::new();
        if let Some(heritage) = child_of_kind(node, "class_heritage") {
            let mut cursor = heritage.walk();
            for part in heritage.named_children(&mut cursor) {
                match part.kind() {
                    "extends_clause" => {
                        let mut inner = part.walk();
                        for value in part.children_by_field_name("value", &mut inner) {
                            bases.push(base(value, BaseClause::Extends, src));
                        }
                    }
                    "implements_clause" => {
                        let mut inner = part.walk();
                        for ty in part.named_children(&mut inner) {
                            bases.push(base(ty, BaseClause::Implements, src));
                        }
                    }
                    "comment" => {}
                    // JavaScript: `class A extends B`
                    _ => bases.push(base(part, BaseClause::Extends, src)),
                }
            }
        }
        if let Some(extends) = child_of_kind(node, "extends_type_clause") {
            let mut cursor = extends.walk();
            for ty in extends.named_children(&mut cursor) {
                bases.push(base(ty, BaseClause::Extends, src));
            }
        }
        bases
    }

    fn is_branch(&self, kind: &str) -> bool {
        matches!(
            kind,
            "if_statement"
                | "else_clause"
                | "switch_statement"
                | "switch_case"
                | "switch_default"
                | "ternary_expression"
        )
    }

    fn is_callable_boundary(&self, kind: &str) -> bool {
        matches!(
            kind,
            "function_declaration"
                | "generator_function_declaration"
                | "function_expression"
                | "function"
                | "generator_function"
                | "arrow_function"
                | "method_definition"
                | "method_signature"
                | "abstract_method_signature"
        )
    }

    fn is_type_boundary(&self, kind: &str) -> bool {
        matches!(
            kind,
            "class_declaration" | "abstract_class_declaration" | "class" | "interface_declaration"
        )
    }
}

/// The `lexical_declaration`/`variable_declaration` of a module-level
/// declarator.
fn top_level_declaration(declarator: Node<'_>) -> Option<Node<'_>> {
    let declaration = declarator.parent()?;
    if !matches!(
        declaration.kind(),
        "lexical_declaration" | "variable_declaration"
    ) {
        return None;
    }
    let mut scope = declaration.parent()?;
    if scope.kind() == "export_statement" {
        scope = scope.parent()?;
    }
    (scope.kind() == "program").then_some(declaration)
}

/// Leading keyword of a declaration (`const`, `let`, `var`).
fn keyword(declaration: Node<'_>) -> Option<&'static str> {
    let mut cursor = declaration.walk();
    let first = declaration.children(&mut cursor).next();
    first.map(|kw| kw.kind())
}

/// The function a declarator is initialized with, if any.
fn function_value(node: Node<'_>) -> Option<Node<'_>> {
    if node.kind() != "variable_declarator" {
        return None;
    }
    node.child_by_field_name("value")
        .filter(|value| FUNCTION_VALUES.contains(&value.kind()))
}

/// Text of a `type_annotation` without the leading colon.
fn annotation_text(node: Node<'_>, src: &SourceText<'_>) -> String {
    let text = normalize_type(src.text(node));
    text.strip_prefix(':').map(str::to_string).unwrap_or(text)
}

fn base(node: Node<'_>, clause: BaseClause, src: &SourceText<'_>) -> BaseType {
    BaseType {
        text: normalize_type(src.text(node)),
        clause,
        row: node.start_position().row,
    }
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
    fn test_class_heritage() {
        let unit = parse_source(
            Path::new("a.ts"),
            "class Admin extends User implements Auditable, Named {}\n",
        )
        .unwrap();
        let src = unit.source();
        let class = find(unit.root(), "class_declaration");
        let bases = TypeScriptAdapter.base_types(class, &src);
        let texts: Vec<(&str, BaseClause)> =
            bases.iter().map(|b| (b.text.as_str(), b.clause)).collect();
        assert_eq!(
            texts,
            vec![
                ("User", BaseClause::Extends),
                ("Auditable", BaseClause::Implements),
                ("Named", BaseClause::Implements),
            ]
        );
    }

    #[test]
    fn test_javascript_extends() {
        let unit = parse_source(Path::new("a.js"), "class Admin extends User {}\n").unwrap();
        let src = unit.source();
        let class = find(unit.root(), "class_declaration");
        let bases = TypeScriptAdapter.base_types(class, &src);
        assert_eq!(bases.len(), 1);
        assert_eq!(bases[0].text, "User");
        assert_eq!(bases[0].clause, BaseClause::Extends);
    }

    #[test]
    fn test_arrow_const_is_callable() {
        let unit = parse_source(
            Path::new("a.ts"),
            "export const save = async (user: User): Promise<void> => { await db.put(user); };\nconst LIMIT = 10;\nlet counter = 0;\n",
        )
        .unwrap();
        let src = unit.source();
        let mut kinds = Vec::new();
        walk(unit.root(), |node| {
            if node.kind() == "variable_declarator" {
                kinds.push(TypeScriptAdapter.classify(node, &src));
                if kinds.len() == 1 {
                    let params = TypeScriptAdapter.parameters(node, &src);
                    assert_eq!(params[0].type_text.as_deref(), Some("User"));
                    assert_eq!(
                        TypeScriptAdapter.return_types(node, &src),
                        vec!["Promise<void>"]
                    );
                }
            }
            true
        });
        assert_eq!(
            kinds,
            vec![
                Some(DeclKind::Callable),
                Some(DeclKind::Const),
                Some(DeclKind::Var)
            ]
        );
    }

    #[test]
    fn test_named_imports() {
        let unit = parse_source(
            Path::new("a.ts"),
            "import Default, { load, save as persist } from './store';\n",
        )
        .unwrap();
        let src = unit.source();
        let stmt = find(unit.root(), "import_statement");
        let imports = TypeScriptAdapter.imports(stmt, &src);
        let names: Vec<&str> = imports.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Default", "load", "persist"]);
        assert_eq!(imports[2].path, "./store.save");
    }

    #[test]
    fn test_member_callee() {
        let unit = parse_source(Path::new("a.ts"), "function f() { this.repo.find(1); }\n")
            .unwrap();
        let src = unit.source();
        let call = find(unit.root(), "call_expression");
        let callee = TypeScriptAdapter.callee(call, &src).unwrap();
        assert_eq!(callee.qualifier.as_deref(), Some("this.repo"));
        assert_eq!(callee.name, "find");
    }
}
