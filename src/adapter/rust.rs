//! Rust grammar adapter.

use tree_sitter::Node;

use super::{
    child_of_kind, children_of_kind, is_field_of, last_segment, normalize_type, strip_generics,
    BaseClause, BaseType, Callee, DeclKind, ImportShape, LanguageAdapter,
};
use crate::graph::types::{Field, Param, TypeKind};
use crate::parser::SourceText;
use crate::walker::ancestors;

pub struct RustAdapter;

const BUILTINS: &[&str] = &[
    // primitives
    "bool", "char", "str", "u8", "u16", "u32", "u64", "u128", "usize", "i8", "i16", "i32",
    "i64", "i128", "isize", "f32", "f64",
    // std types
    "String", "Vec", "Option", "Result", "Box", "Rc", "Arc", "Cell", "RefCell", "Mutex",
    "RwLock", "HashMap", "HashSet", "BTreeMap", "BTreeSet", "VecDeque", "Cow", "Path",
    "PathBuf", "Duration", "Instant", "PhantomData", "Ordering", "Self",
    // prelude traits
    "Clone", "Copy", "Debug", "Default", "Display", "Eq", "PartialEq", "Ord", "PartialOrd",
    "Hash", "Send", "Sync", "Sized", "Fn", "FnMut", "FnOnce", "From", "Into", "TryFrom",
    "TryInto", "AsRef", "AsMut", "Iterator", "IntoIterator", "ToString", "Drop",
    // prelude values and functions
    "Some", "None", "Ok", "Err", "drop",
    // macros
    "println", "print", "eprintln", "eprint", "format", "write", "writeln", "vec", "panic",
    "assert", "assert_eq", "assert_ne", "debug_assert", "debug_assert_eq", "todo",
    "unimplemented", "unreachable", "matches", "dbg", "include_str", "concat", "env",
    // crate roots
    "std", "core", "alloc",
];

const DECLARATION_NAMES: &[&str] = &[
    "struct_item",
    "enum_item",
    "union_item",
    "trait_item",
    "type_item",
    "struct_expression",
    "type_parameter",
];

const TYPE_PARAMETERS: &[&str] = &[
    "type_parameters",
    "constrained_type_parameter",
    "optional_type_parameter",
];

impl LanguageAdapter for RustAdapter {
    fn name(&self) -> &'static str {
        "rust"
    }

    fn scope_separator(&self) -> &'static str {
        "::"
    }

    fn default_builtins(&self) -> &'static [&'static str] {
        BUILTINS
    }

    fn classify(&self, node: Node<'_>, _src: &SourceText<'_>) -> Option<DeclKind> {
        match node.kind() {
            "function_item" | "function_signature_item" => Some(DeclKind::Callable),
            "struct_item" | "union_item" => Some(DeclKind::Type(TypeKind::Struct)),
            "trait_item" => Some(DeclKind::Type(TypeKind::Trait)),
            "type_item" => Some(DeclKind::Type(TypeKind::Alias)),
            "enum_item" => Some(DeclKind::Enum),
            "const_item" => Some(DeclKind::Const),
            "static_item" => Some(DeclKind::Var),
            "use_declaration" => Some(DeclKind::Import),
            _ => None,
        }
    }

    fn parameters(&self, node: Node<'_>, src: &SourceText<'_>) -> Vec<Param> {
        let Some(list) = node.child_by_field_name("parameters") else {
            return Vec::new();
        };
        let mut cursor = list.walk();
        list.named_children(&mut cursor)
            .filter_map(|param| match param.kind() {
                "parameter" => Some(Param {
                    name: src.field(param, "pattern").unwrap_or_default().to_string(),
                    type_text: src.field(param, "type").map(normalize_type),
                }),
                // `self`, `&self`, `&mut self`: receiver mutability is part of the contract.
                "self_parameter" => Some(Param {
                    name: "self".to_string(),
                    type_text: Some(normalize_type(src.text(param))),
                }),
                "variadic_parameter" => Some(Param {
                    name: "...".to_string(),
                    type_text: None,
                }),
                _ => None,
            })
            .collect()
    }

    fn return_types(&self, node: Node<'_>, src: &SourceText<'_>) -> Vec<String> {
        src.field(node, "return_type")
            .map(|ret| vec![normalize_type(ret)])
            .unwrap_or_default()
    }

    fn field_declarations<'t>(&self, node: Node<'t>) -> Vec<Node<'t>> {
        match node.kind() {
            "type_item" => node.child_by_field_name("type").into_iter().collect(),
            "enum_item" => {
                let Some(variants) = node.child_by_field_name("body") else {
                    return Vec::new();
                };
                children_of_kind(variants, "enum_variant")
                    .into_iter()
                    .filter_map(|variant| variant.child_by_field_name("body"))
                    .collect()
            }
            _ => match node.child_by_field_name("body") {
                Some(body) if body.kind() == "field_declaration_list" => {
                    children_of_kind(body, "field_declaration")
                }
                Some(body) if body.kind() == "ordered_field_declaration_list" => vec![body],
                _ => Vec::new(),
            },
        }
    }

    fn field_shape(&self, field: Node<'_>, src: &SourceText<'_>) -> Vec<Field> {
        match field.kind() {
            "field_declaration" => vec![Field {
                name: src.field(field, "name").unwrap_or_default().to_string(),
                type_text: src.field(field, "type").map(normalize_type),
            }],
            // tuple struct: positional names
            "ordered_field_declaration_list" => {
                let mut cursor = field.walk();
                field
                    .children_by_field_name("type", &mut cursor)
                    .enumerate()
                    .map(|(i, ty)| Field {
                        name: i.to_string(),
                        type_text: Some(normalize_type(src.text(ty))),
                    })
                    .collect()
            }
            // aliased type
            _ => vec![Field {
                name: String::new(),
                type_text: Some(normalize_type(src.text(field))),
            }],
        }
    }

    fn enum_values(&self, node: Node<'_>, src: &SourceText<'_>) -> Vec<String> {
        let Some(variants) = node.child_by_field_name("body") else {
            return Vec::new();
        };
        children_of_kind(variants, "enum_variant")
            .into_iter()
            .filter_map(|variant| src.field(variant, "name"))
            .map(str::to_string)
            .collect()
    }

    fn imports(&self, node: Node<'_>, src: &SourceText<'_>) -> Vec<ImportShape> {
        let mut out = Vec::new();
        if let Some(argument) = node.child_by_field_name("argument") {
            collect_use(argument, "", src, &mut out);
        }
        out
    }

    fn body_of<'t>(&self, node: Node<'t>) -> Option<Node<'t>> {
        match node.kind() {
            "const_item" | "static_item" => node.child_by_field_name("value"),
            _ => node.child_by_field_name("body"),
        }
    }

    fn is_call(&self, node: Node<'_>) -> bool {
        matches!(node.kind(), "call_expression" | "macro_invocation")
    }

    fn callee(&self, node: Node<'_>, src: &SourceText<'_>) -> Option<Callee> {
        if node.kind() == "macro_invocation" {
            let name = src.field(node, "macro")?;
            return Some(split_path(name));
        }

        let mut function = node.child_by_field_name("function")?;
        if function.kind() == "generic_function" {
            function = function.child_by_field_name("function")?;
        }
        match function.kind() {
            "identifier" => Some(Callee::bare(src.text(function))),
            "field_expression" => Some(Callee::qualified(
                src.field(function, "value")?,
                src.field(function, "field")?,
                ".",
            )),
            "scoped_identifier" => Some(resolve_self(split_path(src.text(function)), node, src)),
            _ => None,
        }
    }

    fn is_construction(&self, node: Node<'_>) -> bool {
        node.kind() == "struct_expression"
    }

    fn constructed_type(&self, node: Node<'_>, src: &SourceText<'_>) -> Option<String> {
        match src.field(node, "name")? {
            "Self" => self_type(node, src).or_else(|| Some("Self".to_string())),
            name => Some(name.to_string()),
        }
    }

    fn type_reference(&self, node: Node<'_>, src: &SourceText<'_>) -> Option<String> {
        match node.kind() {
            "scoped_type_identifier" => {
                if is_field_of(node, &["struct_expression"], "name") {
                    return None;
                }
                Some(normalize_type(src.text(node)))
            }
            "type_identifier" => {
                if is_field_of(node, DECLARATION_NAMES, "name")
                    || node.parent().is_some_and(|p| TYPE_PARAMETERS.contains(&p.kind()))
                {
                    return None;
                }
                Some(src.text(node).to_string())
            }
            _ => None,
        }
    }

    fn base_types(&self, node: Node<'_>, src: &SourceText<'_>) -> Vec<BaseType> {
        if node.kind() != "trait_item" {
            return Vec::new();
        }
        let Some(bounds) = node.child_by_field_name("bounds") else {
            return Vec::new();
        };
        let mut cursor = bounds.walk();
        bounds
            .named_children(&mut cursor)
            .filter(|bound| bound.kind() != "lifetime")
            .map(|bound| BaseType {
                text: normalize_type(src.text(bound)),
                clause: BaseClause::Extends,
                row: bound.start_position().row,
            })
            .collect()
    }

    fn is_branch(&self, kind: &str) -> bool {
        matches!(
            kind,
            "if_expression" | "else_clause" | "match_expression" | "match_arm"
        )
    }

    fn is_callable_boundary(&self, kind: &str) -> bool {
        matches!(
            kind,
            "function_item" | "function_signature_item" | "closure_expression"
        )
    }

    fn is_type_boundary(&self, kind: &str) -> bool {
        matches!(kind, "impl_item" | "trait_item")
    }

    fn type_boundary_name(&self, node: Node<'_>, src: &SourceText<'_>) -> Option<String> {
        match node.kind() {
            "impl_item" => src.field(node, "type").map(normalize_type),
            _ => src.field(node, "name").map(str::to_string),
        }
    }
}

/// `a::b::c` → qualifier `a::b`, name `c`.
fn split_path(text: &str) -> Callee {
    match text.rsplit_once("::") {
        Some((qualifier, name)) if !qualifier.is_empty() => {
            Callee::qualified(qualifier, name, "::")
        }
        _ => Callee::bare(text),
    }
}

/// Type named by `Self` at `node`: the enclosing impl or trait.
fn self_type(node: Node<'_>, src: &SourceText<'_>) -> Option<String> {
    let owner = ancestors(node).find(|a| matches!(a.kind(), "impl_item" | "trait_item"))?;
    let name = strip_generics(&RustAdapter.type_boundary_name(owner, src)?);
    (!name.is_empty()).then_some(name)
}

/// `Self::f` → `Owner::f`.
fn resolve_self(mut callee: Callee, node: Node<'_>, src: &SourceText<'_>) -> Callee {
    let rest = match callee.qualifier.as_deref() {
        Some("Self") => Some(String::new()),
        Some(q) => q.strip_prefix("Self::").map(|r| format!("::{}", r)),
        None => None,
    };
    if let (Some(rest), Some(owner)) = (rest, self_type(node, src)) {
        callee.qualifier = Some(format!("{}{}", owner, rest));
    }
    callee
}

/// Flatten a use tree into imported names.
fn collect_use(node: Node<'_>, prefix: &str, src: &SourceText<'_>, out: &mut Vec<ImportShape>) {
    let join = |path: &str| {
        if prefix.is_empty() {
            path.to_string()
        } else {
            format!("{}::{}", prefix, path)
        }
    };

    match node.kind() {
        "use_as_clause" => {
            let path = join(src.field(node, "path").unwrap_or_default());
            let alias = src.field(node, "alias").map(str::to_string);
            out.push(ImportShape {
                name: alias.clone().unwrap_or_else(|| last_segment(&path).to_string()),
                path,
                alias,
            });
        }
        "scoped_use_list" => {
            let path = join(src.field(node, "path").unwrap_or_default());
            if let Some(list) = node.child_by_field_name("list") {
                collect_use(list, &path, src, out);
            }
        }
        "use_list" => {
            let mut cursor = node.walk();
            for item in node.named_children(&mut cursor) {
                collect_use(item, prefix, src, out);
            }
        }
        "use_wildcard" => {
            let path = join(&normalize_type(src.text(node)));
            out.push(ImportShape {
                name: "*".to_string(),
                path,
                alias: None,
            });
        }
        "identifier" | "scoped_identifier" | "crate" | "self" | "super" => {
            let path = join(src.text(node));
            out.push(ImportShape {
                name: last_segment(&path).to_string(),
                path,
                alias: None,
            });
        }
        _ => {
            if let Some(inner) = child_of_kind(node, "use_list") {
                collect_use(inner, prefix, src, out);
            }
        }
    }
}
