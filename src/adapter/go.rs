//! Go grammar adapter.
//!
//! Methods are declared outside their type, so ownership comes from the
//! receiver rather than an enclosing declaration.

use tree_sitter::Node;

use super::{
    child_of_kind, children_of_kind, field_children, is_field_of, normalize_type, unquote,
    BaseClause, BaseType, Callee, DeclKind, ImportShape, LanguageAdapter,
};
use crate::graph::types::{Field, Param, TypeKind};
use crate::parser::SourceText;

pub struct GoAdapter;

const BUILTINS: &[&str] = &[
    // predeclared types
    "bool", "byte", "rune", "string", "error", "any", "comparable", "int", "int8", "int16",
    "int32", "int64", "uint", "uint8", "uint16", "uint32", "uint64", "uintptr", "float32",
    "float64", "complex64", "complex128", "map", "chan",
    // predeclared functions
    "append", "cap", "clear", "close", "complex", "copy", "delete", "imag", "len", "make",
    "max", "min", "new", "panic", "print", "println", "real", "recover",
    // standard library packages
    "fmt", "errors", "strings", "strconv", "bytes", "os", "io", "bufio", "time", "context",
    "sync", "atomic", "log", "slog", "http", "json", "sort", "slices", "maps", "math", "rand",
    "filepath", "path", "regexp", "reflect", "unicode", "utf8", "testing",
];

impl LanguageAdapter for GoAdapter {
    fn name(&self) -> &'static str {
        "go"
    }

    fn default_builtins(&self) -> &'static [&'static str] {
        BUILTINS
    }

    fn classify(&self, node: Node<'_>, _src: &SourceText<'_>) -> Option<DeclKind> {
        match node.kind() {
            "function_declaration" | "method_declaration" | "method_elem" | "method_spec" => {
                Some(DeclKind::Callable)
            }
            "type_spec" | "type_alias" => {
                let kind = match node.child_by_field_name("type").map(|t| t.kind()) {
                    Some("struct_type") => TypeKind::Struct,
                    Some("interface_type") => TypeKind::Interface,
                    _ => TypeKind::Alias,
                };
                Some(DeclKind::Type(kind))
            }
            "const_spec" => Some(DeclKind::Const),
            "var_spec" => Some(DeclKind::Var),
            "import_spec" => Some(DeclKind::Import),
            _ => None,
        }
    }

    fn declared_names(&self, node: Node<'_>, src: &SourceText<'_>) -> Vec<String> {
        field_children(node, "name")
            .into_iter()
            .map(|name| src.text(name).to_string())
            .filter(|name| !name.is_empty() && name != "_")
            .collect()
    }

    fn parameters(&self, node: Node<'_>, src: &SourceText<'_>) -> Vec<Param> {
        node.child_by_field_name("parameters")
            .map(|list| parameter_list(list, src))
            .unwrap_or_default()
    }

    fn return_types(&self, node: Node<'_>, src: &SourceText<'_>) -> Vec<String> {
        match node.child_by_field_name("result") {
            Some(result) if result.kind() == "parameter_list" => parameter_list(result, src)
                .into_iter()
                .filter_map(|p| p.type_text)
                .collect(),
            Some(result) => vec![normalize_type(src.text(result))],
            None => Vec::new(),
        }
    }

    fn receiver(&self, node: Node<'_>, src: &SourceText<'_>) -> Option<String> {
        let list = node.child_by_field_name("receiver")?;
        let param = child_of_kind(list, "parameter_declaration")?;
        src.field(param, "type").map(normalize_type)
    }

    fn field_declarations<'t>(&self, node: Node<'t>) -> Vec<Node<'t>> {
        let Some(ty) = node.child_by_field_name("type") else {
            return Vec::new();
        };
        match ty.kind() {
            "struct_type" => child_of_kind(ty, "field_declaration_list")
                .map(|list| children_of_kind(list, "field_declaration"))
                .unwrap_or_default(),
            "interface_type" => Vec::new(),
            _ => vec![ty],
        }
    }

    fn field_shape(&self, field: Node<'_>, src: &SourceText<'_>) -> Vec<Field> {
        if field.kind() != "field_declaration" {
            return vec![Field {
                name: String::new(),
                type_text: Some(normalize_type(src.text(field))),
            }];
        }
        let type_text = src.field(field, "type").map(normalize_type);
        let names = field_children(field, "name");
        if names.is_empty() {
            // embedded field: named after its type
            let name = type_text.clone().unwrap_or_default();
            return vec![Field { name, type_text }];
        }
        names
            .into_iter()
            .map(|name| Field {
                name: src.text(name).to_string(),
                type_text: type_text.clone(),
            })
            .collect()
    }

    fn body_of<'t>(&self, node: Node<'t>) -> Option<Node<'t>> {
        match node.kind() {
            "const_spec" | "var_spec" => node.child_by_field_name("value"),
            _ => node.child_by_field_name("body"),
        }
    }

    fn imports(&self, node: Node<'_>, src: &SourceText<'_>) -> Vec<ImportShape> {
        let Some(path) = src.field(node, "path").map(unquote) else {
            return Vec::new();
        };
        let alias = src.field(node, "name").map(str::to_string);
        let name = alias
            .clone()
            .unwrap_or_else(|| path.rsplit('/').next().unwrap_or(&path).to_string());
        vec![ImportShape { name, path, alias }]
    }

    fn package_name(&self, root: Node<'_>, src: &SourceText<'_>) -> Option<String> {
        let clause = child_of_kind(root, "package_clause")?;
        let ident = child_of_kind(clause, "package_identifier")?;
        Some(src.text(ident).to_string())
    }

    fn is_call(&self, node: Node<'_>) -> bool {
        node.kind() == "call_expression"
    }

    fn callee(&self, node: Node<'_>, src: &SourceText<'_>) -> Option<Callee> {
        let function = node.child_by_field_name("function")?;
        match function.kind() {
            "identifier" => Some(Callee::bare(src.text(function))),
            "selector_expression" => Some(Callee::qualified(
                src.field(function, "operand")?,
                src.field(function, "field")?,
                ".",
            )),
            _ => None,
        }
    }

    fn is_construction(&self, node: Node<'_>) -> bool {
        node.kind() == "composite_literal"
    }

    fn constructed_type(&self, node: Node<'_>, src: &SourceText<'_>) -> Option<String> {
        src.field(node, "type").map(str::to_string)
    }

    fn type_reference(&self, node: Node<'_>, src: &SourceText<'_>) -> Option<String> {
        match node.kind() {
            "qualified_type" => Some(normalize_type(src.text(node))),
            "type_identifier" => {
                if is_field_of(node, &["type_spec", "type_alias"], "name")
                    || is_field_of(node, &["composite_literal"], "type")
                {
                    return None;
                }
                Some(src.text(node).to_string())
            }
            _ => None,
        }
    }

    fn base_types(&self, node: Node<'_>, src: &SourceText<'_>) -> Vec<BaseType> {
        let Some(ty) = node.child_by_field_name("type") else {
            return Vec::new();
        };
        if ty.kind() != "interface_type" {
            return Vec::new();
        }
        // embedded interfaces; unions and `~T` terms are constraints
        children_of_kind(ty, "type_elem")
            .into_iter()
            .filter(|elem| {
                elem.named_child_count() == 1
                    && elem.named_child(0).is_some_and(|t| t.kind() != "negated_type")
            })
            .map(|elem| BaseType {
                text: normalize_type(src.text(elem)),
                clause: BaseClause::Extends,
                row: elem.start_position().row,
            })
            .collect()
    }

    fn is_branch(&self, kind: &str) -> bool {
        matches!(
            kind,
            "if_statement"
                | "expression_switch_statement"
                | "type_switch_statement"
                | "select_statement"
                | "expression_case"
                | "type_case"
                | "default_case"
                | "communication_case"
        )
    }

    fn is_callable_boundary(&self, kind: &str) -> bool {
        matches!(
            kind,
            "function_declaration" | "method_declaration" | "func_literal" | "method_elem"
        )
    }

    fn is_type_boundary(&self, kind: &str) -> bool {
        kind == "type_spec"
    }
}

fn parameter_list(list: Node<'_>, src: &SourceText<'_>) -> Vec<Param> {
    let mut params = Vec::new();
    let mut cursor = list.walk();
    for decl in list.named_children(&mut cursor) {
        if !matches!(
            decl.kind(),
            "parameter_declaration" | "variadic_parameter_declaration"
        ) {
            continue;
        }
        let mut type_text = src.field(decl, "type").map(normalize_type);
        if decl.kind() == "variadic_parameter_declaration" {
            type_text = type_text.map(|t| format!("...{}", t));
        }
        let names = field_children(decl, "name");
        if names.is_empty() {
            params.push(Param {
                name: String::new(),
                type_text,
            });
            continue;
        }
        for name in names {
            params.push(Param {
                name: src.text(name).to_string(),
                type_text: type_text.clone(),
            });
        }
    }
    params
}
