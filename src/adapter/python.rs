//! Python grammar adapter.
//!
//! Type positions are the `type` nodes produced for annotations; an
//! identifier counts as a type reference only when every ancestor between it
//! and that `type` node is a type wrapper (generic, union, splat, ...).

use tree_sitter::Node;

use super::{
    field_children, last_segment, normalize_type, BaseClause, BaseType, Callee, DeclKind,
    ImportShape, LanguageAdapter,
};
use crate::graph::types::{Field, Param, TypeKind};
use crate::parser::SourceText;

pub struct PythonAdapter;

const BUILTINS: &[&str] = &[
    // types
    "object", "type", "int", "float", "complex", "bool", "str", "bytes", "bytearray", "list",
    "dict", "set", "frozenset", "tuple", "range", "slice", "memoryview", "None",
    // functions
    "print", "len", "repr", "isinstance", "issubclass", "super", "open", "enumerate", "zip",
    "map", "filter", "sorted", "reversed", "sum", "min", "max", "abs", "any", "all", "iter",
    "next", "getattr", "setattr", "hasattr", "delattr", "id", "hash", "format", "input",
    "round", "divmod", "vars", "dir", "callable", "staticmethod", "classmethod", "property",
    // exceptions
    "Exception", "BaseException", "ValueError", "TypeError", "KeyError", "IndexError",
    "AttributeError", "RuntimeError", "NotImplementedError", "StopIteration", "OSError",
    // typing
    "Any", "Optional", "Union", "List", "Dict", "Set", "Tuple", "Callable", "Iterable",
    "Iterator", "Sequence", "Mapping", "Type", "TypeVar", "Generic", "Protocol", "Literal",
    // common modules
    "os", "sys", "re", "json", "math", "time", "datetime", "logging", "typing", "asyncio",
    "collections", "functools", "itertools", "pathlib",
];

/// Kinds that may sit between an identifier and its enclosing `type` node.
const TYPE_WRAPPERS: &[&str] = &[
    "generic_type",
    "type_parameter",
    "union_type",
    "member_type",
    "constrained_type",
    "splat_type",
    "subscript",
    "binary_operator",
    "list",
    "tuple",
];

impl LanguageAdapter for PythonAdapter {
    fn name(&self) -> &'static str {
        "python"
    }

    fn default_builtins(&self) -> &'static [&'static str] {
        BUILTINS
    }

    fn classify(&self, node: Node<'_>, src: &SourceText<'_>) -> Option<DeclKind> {
        match node.kind() {
            "function_definition" => Some(DeclKind::Callable),
            "class_definition" => Some(DeclKind::Type(TypeKind::Class)),
            "import_statement" | "import_from_statement" => Some(DeclKind::Import),
            "assignment" if is_module_level(node) => {
                let names = self.declared_names(node, src);
                if !names.is_empty() && names.iter().all(|n| is_constant_name(n)) {
                    Some(DeclKind::Const)
                } else {
                    Some(DeclKind::Var)
                }
            }
            _ => None,
        }
    }

    fn declared_names(&self, node: Node<'_>, src: &SourceText<'_>) -> Vec<String> {
        if node.kind() != "assignment" {
            return src
                .field(node, "name")
                .map(|name| vec![name.to_string()])
                .unwrap_or_default();
        }
        let Some(left) = node.child_by_field_name("left") else {
            return Vec::new();
        };
        match left.kind() {
            "identifier" => vec![src.text(left).to_string()],
            "pattern_list" | "tuple_pattern" => {
                let mut cursor = left.walk();
                left.named_children(&mut cursor)
                    .filter(|c| c.kind() == "identifier")
                    .map(|c| src.text(c).to_string())
                    .collect()
            }
            _ => Vec::new(),
        }
    }

    fn parameters(&self, node: Node<'_>, src: &SourceText<'_>) -> Vec<Param> {
        let Some(list) = node.child_by_field_name("parameters") else {
            return Vec::new();
        };
        let mut cursor = list.walk();
        list.named_children(&mut cursor)
            .filter_map(|param| {
                let (name, type_text) = match param.kind() {
                    "identifier" | "list_splat_pattern" | "dictionary_splat_pattern" => {
                        (src.text(param).to_string(), None)
                    }
                    "typed_parameter" => {
                        let mut inner = param.walk();
                        let name = param
                            .named_children(&mut inner)
                            .next()
                            .map(|n| src.text(n).to_string())
                            .unwrap_or_default();
                        (name, src.field(param, "type").map(normalize_type))
                    }
                    "default_parameter" | "typed_default_parameter" => (
                        src.field(param, "name").unwrap_or_default().to_string(),
                        src.field(param, "type").map(normalize_type),
                    ),
                    _ => return None,
                };
                Some(Param { name, type_text })
            })
            .collect()
    }

    fn return_types(&self, node: Node<'_>, src: &SourceText<'_>) -> Vec<String> {
        src.field(node, "return_type")
            .map(|ret| vec![normalize_type(ret)])
            .unwrap_or_default()
    }

    fn field_declarations<'t>(&self, node: Node<'t>) -> Vec<Node<'t>> {
        let Some(body) = node.child_by_field_name("body") else {
            return Vec::new();
        };
        let mut fields = Vec::new();
        let mut cursor = body.walk();
        for statement in body.named_children(&mut cursor) {
            if statement.kind() != "expression_statement" {
                continue;
            }
            let mut inner = statement.walk();
            fields.extend(
                statement
                    .named_children(&mut inner)
                    .filter(|c| c.kind() == "assignment"),
            );
        }
        fields
    }

    fn field_shape(&self, field: Node<'_>, src: &SourceText<'_>) -> Vec<Field> {
        let type_text = src.field(field, "type").map(normalize_type);
        self.declared_names(field, src)
            .into_iter()
            .map(|name| Field {
                name,
                type_text: type_text.clone(),
            })
            .collect()
    }

    fn imports(&self, node: Node<'_>, src: &SourceText<'_>) -> Vec<ImportShape> {
        let module = src.field(node, "module_name").map(str::to_string);
        let mut out: Vec<ImportShape> = field_children(node, "name")
            .into_iter()
            .map(|name| {
                let (path, alias) = match name.kind() {
                    "aliased_import" => (
                        src.field(name, "name").unwrap_or_default().to_string(),
                        src.field(name, "alias").map(str::to_string),
                    ),
                    _ => (src.text(name).to_string(), None),
                };
                let local = alias
                    .clone()
                    .unwrap_or_else(|| last_segment(&path).to_string());
                let path = match &module {
                    Some(module) => format!("{}.{}", module, path),
                    None => path,
                };
                ImportShape {
                    name: local,
                    path,
                    alias,
                }
            })
            .collect();

        if let Some(module) = module {
            let mut cursor = node.walk();
            let wildcard = node
                .named_children(&mut cursor)
                .any(|c| c.kind() == "wildcard_import");
            if wildcard {
                out.push(ImportShape {
                    name: "*".to_string(),
                    path: format!("{}.*", module),
                    alias: None,
                });
            }
        }
        out
    }

    fn body_of<'t>(&self, node: Node<'t>) -> Option<Node<'t>> {
        match node.kind() {
            "assignment" => node.child_by_field_name("right"),
            _ => node.child_by_field_name("body"),
        }
    }

    fn is_call(&self, node: Node<'_>) -> bool {
        node.kind() == "call"
    }

    fn callee(&self, node: Node<'_>, src: &SourceText<'_>) -> Option<Callee> {
        let function = node.child_by_field_name("function")?;
        match function.kind() {
            "identifier" => Some(Callee::bare(src.text(function))),
            "attribute" => Some(Callee::qualified(
                src.field(function, "object")?,
                src.field(function, "attribute")?,
                ".",
            )),
            _ => None,
        }
    }

    fn type_reference(&self, node: Node<'_>, src: &SourceText<'_>) -> Option<String> {
        if !matches!(node.kind(), "identifier" | "attribute" | "member_type") {
            return None;
        }
        if !in_type_position(node) {
            return None;
        }
        Some(normalize_type(src.text(node)))
    }

    fn base_types(&self, node: Node<'_>, src: &SourceText<'_>) -> Vec<BaseType> {
        let Some(bases) = node.child_by_field_name("superclasses") else {
            return Vec::new();
        };
        let mut cursor = bases.walk();
        bases
            .named_children(&mut cursor)
            .filter(|base| !matches!(base.kind(), "keyword_argument" | "comment"))
            .map(|base| BaseType {
                text: normalize_type(src.text(base)),
                clause: BaseClause::Positional,
                row: base.start_position().row,
            })
            .collect()
    }

    fn is_branch(&self, kind: &str) -> bool {
        matches!(
            kind,
            "if_statement"
                | "elif_clause"
                | "else_clause"
                | "conditional_expression"
                | "match_statement"
                | "case_clause"
        )
    }

    fn is_callable_boundary(&self, kind: &str) -> bool {
        matches!(kind, "function_definition" | "lambda")
    }

    fn is_type_boundary(&self, kind: &str) -> bool {
        kind == "class_definition"
    }
}

/// `assignment` directly under the module (not in a class or function).
fn is_module_level(node: Node<'_>) -> bool {
    node.parent()
        .filter(|p| p.kind() == "expression_statement")
        .and_then(|p| p.parent())
        .is_some_and(|gp| gp.kind() == "module")
}

fn is_constant_name(name: &str) -> bool {
    name.chars().any(|c| c.is_ascii_uppercase())
        && name
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

fn in_type_position(node: Node<'_>) -> bool {
    let mut current = node;
    while let Some(parent) = current.parent() {
        match parent.kind() {
            "type" => return true,
            kind if TYPE_WRAPPERS.contains(&kind) => current = parent,
            _ => return false,
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_source;
    use crate::walker::walk;
    use std::path::Path;

    fn first_statement(root: Node<'_>) -> Node<'_> {
        let mut cursor = root.walk();
        let first = root.named_children(&mut cursor).next();
        first.expect("empty module")
    }

    #[test]
    fn test_annotations_are_type_references() {
        let unit = parse_source(
            Path::new("svc.py"),
            "def load(repo: Repository, ids: list[UserId]) -> models.User:\n    return repo.get(ids)\n",
        )
        .unwrap();
        let src = unit.source();
        let mut refs = Vec::new();
        walk(unit.root(), |node| match PythonAdapter.type_reference(node, &src) {
            Some(text) => {
                refs.push(text);
                false
            }
            None => true,
        });
        assert!(refs.contains(&"Repository".to_string()));
        assert!(refs.contains(&"UserId".to_string()));
        assert!(refs.contains(&"models.User".to_string()));
        // expression identifiers are not types
        assert!(!refs.contains(&"repo".to_string()));
        assert!(!refs.contains(&"ids".to_string()));
    }

    #[test]
    fn test_module_assignments() {
        let unit = parse_source(
            Path::new("cfg.py"),
            "MAX_RETRIES = 3\ncache = {}\n\nclass C:\n    limit: int = 5\n",
        )
        .unwrap();
        let src = unit.source();
        let mut kinds = Vec::new();
        walk(unit.root(), |node| {
            if node.kind() == "assignment" {
                kinds.push(PythonAdapter.classify(node, &src));
            }
            true
        });
        assert_eq!(
            kinds,
            vec![Some(DeclKind::Const), Some(DeclKind::Var), None]
        );
    }

    #[test]
    fn test_parameters_keep_types() {
        let unit = parse_source(
            Path::new("a.py"),
            "def f(self, a: int, b=2, c: str = 'x', *args, **kw):\n    pass\n",
        )
        .unwrap();
        let src = unit.source();
        let func = first_statement(unit.root());
        let params = PythonAdapter.parameters(func, &src);
        let names: Vec<&str> = params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["self", "a", "b", "c", "*args", "**kw"]);
        assert_eq!(params[1].type_text.as_deref(), Some("int"));
        assert_eq!(params[3].type_text.as_deref(), Some("str"));
    }

    #[test]
    fn test_from_import_with_alias() {
        let unit = parse_source(
            Path::new("a.py"),
            "from app.models import User, Group as G\n",
        )
        .unwrap();
        let src = unit.source();
        let stmt = first_statement(unit.root());
        let imports = PythonAdapter.imports(stmt, &src);
        assert_eq!(imports.len(), 2);
        assert_eq!(imports[0].name, "User");
        assert_eq!(imports[0].path, "app.models.User");
        assert_eq!(imports[1].name, "G");
        assert_eq!(imports[1].alias.as_deref(), Some("G"));
    }

    #[test]
    fn test_superclasses_skip_keywords() {
        let unit = parse_source(
            Path::new("a.py"),
            "class Admin(User, Auditable, metaclass=Meta):\n    pass\n",
        )
        .unwrap();
        let src = unit.source();
        let class = first_statement(unit.root());
        let bases: Vec<String> = PythonAdapter
            .base_types(class, &src)
            .into_iter()
            .map(|b| b.text)
            .collect();
        assert_eq!(bases, vec!["User", "Auditable"]);
    }
}
