//! Language adapters.
//!
//! A [`LanguageAdapter`] answers the grammar-specific questions ("is this a
//! call?", "what is the callee?", "is this identifier in a type position?")
//! so the shared extraction and hashing algorithms never look at node-kind
//! strings directly. One adapter per grammar family.

pub mod go;
pub mod java;
pub mod python;
pub mod rust;
pub mod typescript;

use std::collections::HashSet;
use tree_sitter::Node;

use crate::config::BuiltinOverrides;
use crate::graph::types::{Field, Param, TypeKind};
use crate::parser::{SourceText, SupportedLanguage};
use crate::walker::ancestors;

/// Declaration classes recognised during entity extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    /// Function, method or constructor.
    Callable,
    Type(TypeKind),
    Enum,
    Const,
    Var,
    Import,
}

/// Target of a call site: `qualifier<sep>name` or a bare `name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Callee {
    pub name: String,
    pub qualifier: Option<String>,
    pub separator: &'static str,
}

impl Callee {
    pub fn bare(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            qualifier: None,
            separator: ".",
        }
    }

    pub fn qualified(
        qualifier: impl Into<String>,
        name: impl Into<String>,
        separator: &'static str,
    ) -> Self {
        Self {
            name: name.into(),
            qualifier: Some(qualifier.into()),
            separator,
        }
    }

    /// `qualifier<sep>name`, or just the name.
    pub fn full(&self) -> String {
        match &self.qualifier {
            Some(q) => format!("{}{}{}", q, self.separator, self.name),
            None => self.name.clone(),
        }
    }
}

/// Which clause a base type came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseClause {
    /// An explicit `extends` clause.
    Extends,
    /// An explicit `implements` clause.
    Implements,
    /// A plain list where position decides (first entry extends).
    Positional,
}

/// One entry of a declaration's supertype list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseType {
    pub text: String,
    pub clause: BaseClause,
    /// 0-indexed row of the entry.
    pub row: usize,
}

/// One imported name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportShape {
    pub name: String,
    pub path: String,
    pub alias: Option<String>,
}

/// The per-grammar classification surface.
///
/// Defaults cover the common tree-sitter conventions (`name` and `body`
/// fields); adapters override what their grammar does differently.
pub trait LanguageAdapter: Send + Sync {
    fn name(&self) -> &'static str;

    /// Separator used when building qualified names.
    fn scope_separator(&self) -> &'static str {
        "."
    }

    /// Static default builtin list; see [`Builtins`].
    fn default_builtins(&self) -> &'static [&'static str];

    // ─── Declarations ───────────────────────────────────────────

    fn classify(&self, node: Node<'_>, src: &SourceText<'_>) -> Option<DeclKind>;

    /// Names introduced by a declaration node (several for `const a, b`).
    fn declared_names(&self, node: Node<'_>, src: &SourceText<'_>) -> Vec<String> {
        src.field(node, "name")
            .filter(|name| !name.is_empty())
            .map(|name| vec![name.to_string()])
            .unwrap_or_default()
    }

    fn parameters(&self, _node: Node<'_>, _src: &SourceText<'_>) -> Vec<Param> {
        Vec::new()
    }

    fn return_types(&self, _node: Node<'_>, _src: &SourceText<'_>) -> Vec<String> {
        Vec::new()
    }

    /// Receiver type text for languages that declare methods outside the
    /// type body (Go). Keeps pointer-ness, e.g. `*User`.
    fn receiver(&self, _node: Node<'_>, _src: &SourceText<'_>) -> Option<String> {
        None
    }

    /// Field declaration nodes of a type-like declaration.
    fn field_declarations<'t>(&self, _node: Node<'t>) -> Vec<Node<'t>> {
        Vec::new()
    }

    /// Name/type pairs declared by one field declaration node.
    fn field_shape(&self, _field: Node<'_>, _src: &SourceText<'_>) -> Vec<Field> {
        Vec::new()
    }

    fn enum_values(&self, _node: Node<'_>, _src: &SourceText<'_>) -> Vec<String> {
        Vec::new()
    }

    /// Declared type of a const/var.
    fn value_type(&self, node: Node<'_>, src: &SourceText<'_>) -> Option<String> {
        src.field(node, "type").map(normalize_type)
    }

    fn imports(&self, _node: Node<'_>, _src: &SourceText<'_>) -> Vec<ImportShape> {
        Vec::new()
    }

    /// Package/namespace prefix for qualified names.
    fn package_name(&self, _root: Node<'_>, _src: &SourceText<'_>) -> Option<String> {
        None
    }

    // ─── Traversal Classification ───────────────────────────────

    /// The executable body (block or expression-body shorthand) of a
    /// callable, or the initializer of a const/var.
    fn body_of<'t>(&self, node: Node<'t>) -> Option<Node<'t>> {
        node.child_by_field_name("body")
    }

    fn is_comment(&self, kind: &str) -> bool {
        kind.ends_with("comment")
    }

    fn is_call(&self, node: Node<'_>) -> bool;

    fn callee(&self, node: Node<'_>, src: &SourceText<'_>) -> Option<Callee>;

    fn is_construction(&self, _node: Node<'_>) -> bool {
        false
    }

    /// Raw type text of a construction node.
    fn constructed_type(&self, _node: Node<'_>, _src: &SourceText<'_>) -> Option<String> {
        None
    }

    /// If `node` is a type reference in type position, its text.
    ///
    /// The caller skips the subtree of a matched node, so qualified forms
    /// (`pkg.Type`) should match on the qualified node itself.
    fn type_reference(&self, node: Node<'_>, src: &SourceText<'_>) -> Option<String>;

    /// Supertype list in declaration order.
    fn base_types(&self, _node: Node<'_>, _src: &SourceText<'_>) -> Vec<BaseType> {
        Vec::new()
    }

    /// if/switch/match/ternary/case-arm constructs.
    fn is_branch(&self, kind: &str) -> bool;

    /// function/lambda/closure constructs.
    fn is_callable_boundary(&self, kind: &str) -> bool;

    /// Nodes that own methods (class bodies, impl blocks, ...).
    fn is_type_boundary(&self, kind: &str) -> bool;

    /// Name of a type-boundary node.
    fn type_boundary_name(&self, node: Node<'_>, src: &SourceText<'_>) -> Option<String> {
        src.field(node, "name").map(str::to_string)
    }
}

// ─── Registry ───────────────────────────────────────────────────────────────

static RUST: rust::RustAdapter = rust::RustAdapter;
static GO: go::GoAdapter = go::GoAdapter;
static JAVA: java::JavaAdapter = java::JavaAdapter;
static PYTHON: python::PythonAdapter = python::PythonAdapter;
static TYPESCRIPT: typescript::TypeScriptAdapter = typescript::TypeScriptAdapter;

/// The adapter for a language. JavaScript, TypeScript and TSX share one.
pub fn adapter_for(language: SupportedLanguage) -> &'static dyn LanguageAdapter {
    match language {
        SupportedLanguage::Rust => &RUST,
        SupportedLanguage::Go => &GO,
        SupportedLanguage::Java => &JAVA,
        SupportedLanguage::Python => &PYTHON,
        SupportedLanguage::JavaScript | SupportedLanguage::TypeScript | SupportedLanguage::Tsx => {
            &TYPESCRIPT
        }
    }
}

// ─── Builtins ───────────────────────────────────────────────────────────────

/// Names excluded from the dependency graph for one language.
///
/// Seeded from the adapter's static list, then adjusted by config: `extra`
/// adds names, `allow` removes them.
#[derive(Debug, Clone, Default)]
pub struct Builtins {
    names: HashSet<String>,
}

impl Builtins {
    pub fn new<'a>(defaults: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            names: defaults.into_iter().map(str::to_string).collect(),
        }
    }

    /// Builtins for `language` with config overrides applied.
    pub fn for_language(language: SupportedLanguage, overrides: &BuiltinOverrides) -> Self {
        let mut builtins = Self::new(adapter_for(language).default_builtins().iter().copied());
        for name in overrides.extra_for(language.config_key()) {
            builtins.names.insert(name.to_string());
        }
        for name in &overrides.allow {
            builtins.names.remove(name);
        }
        builtins
    }

    pub fn is_builtin(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// A qualifier is builtin when its first or last segment is, so both
    /// `String::from` and `os.path.join` are filtered.
    pub fn is_builtin_qualifier(&self, qualifier: &str) -> bool {
        let first = first_segment(qualifier);
        self.is_builtin(first) || self.is_builtin(last_segment(qualifier))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

// ─── Shared Helpers ─────────────────────────────────────────────────────────

/// Remove all whitespace from type text.
pub fn normalize_type(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Outer name of a possibly generic, pointer or slice type:
/// `List<User>` → `List`, `*pkg.User` → `pkg.User`, `[]User` → `User`.
pub fn strip_generics(text: &str) -> String {
    let text = text.trim_start_matches(|c: char| matches!(c, '*' | '&' | '[' | ']') || c.is_whitespace());
    let text = text.strip_prefix("mut ").unwrap_or(text);
    let text = normalize_type(text);
    let text = text.trim_start_matches(|c: char| matches!(c, '*' | '&' | '[' | ']'));
    let end = text.find(|c: char| c == '<' || c == '[').unwrap_or(text.len());
    text[..end].to_string()
}

/// Last segment after a `::` or `.` separator.
pub fn last_segment(text: &str) -> &str {
    let colon = text.rfind("::").map(|i| i + 2);
    let dot = text.rfind('.').map(|i| i + 1);
    match colon.max(dot) {
        Some(i) => &text[i..],
        None => text,
    }
}

/// First segment before a `::` or `.` separator.
pub fn first_segment(text: &str) -> &str {
    let colon = text.find("::");
    let dot = text.find('.');
    let end = match (colon, dot) {
        (Some(a), Some(b)) => a.min(b),
        (Some(a), None) => a,
        (None, Some(b)) => b,
        (None, None) => text.len(),
    };
    &text[..end]
}

/// Whether text contains a scope separator.
pub fn is_qualified(text: &str) -> bool {
    text.contains("::") || text.contains('.')
}

/// Nearest enclosing type boundary, stopping at callable boundaries.
pub fn enclosing_type<'t>(adapter: &dyn LanguageAdapter, node: Node<'t>) -> Option<Node<'t>> {
    for ancestor in ancestors(node) {
        let kind = ancestor.kind();
        if adapter.is_type_boundary(kind) {
            return Some(ancestor);
        }
        if adapter.is_callable_boundary(kind) {
            return None;
        }
    }
    None
}

/// Owner type name of a callable: Go receiver, else the enclosing type.
pub fn owner_name(adapter: &dyn LanguageAdapter, node: Node<'_>, src: &SourceText<'_>) -> Option<String> {
    if let Some(receiver) = adapter.receiver(node, src) {
        let owner = strip_generics(&receiver);
        return (!owner.is_empty()).then_some(owner);
    }
    let owner = enclosing_type(adapter, node)?;
    adapter
        .type_boundary_name(owner, src)
        .map(|name| strip_generics(&name))
        .filter(|name| !name.is_empty())
}

/// Chain of owner names from outermost to innermost.
pub fn owner_chain(adapter: &dyn LanguageAdapter, node: Node<'_>, src: &SourceText<'_>) -> Vec<String> {
    if let Some(owner) = adapter
        .receiver(node, src)
        .map(|r| strip_generics(&r))
        .filter(|r| !r.is_empty())
    {
        return vec![owner];
    }

    let mut chain = Vec::new();
    let mut current = node;
    while let Some(owner) = enclosing_type(adapter, current) {
        if let Some(name) = adapter.type_boundary_name(owner, src) {
            let name = strip_generics(&name);
            if !name.is_empty() {
                chain.push(name);
            }
        }
        current = owner;
    }
    chain.reverse();
    chain
}

/// Whether `node` is the `field` child of a parent whose kind is listed.
pub(crate) fn is_field_of(node: Node<'_>, parent_kinds: &[&str], field: &str) -> bool {
    node.parent().is_some_and(|parent| {
        parent_kinds.contains(&parent.kind())
            && parent
                .child_by_field_name(field)
                .is_some_and(|child| child.id() == node.id())
    })
}

/// All children stored under `field` (several for `a, b int`).
pub(crate) fn field_children<'t>(node: Node<'t>, field: &str) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.children_by_field_name(field, &mut cursor).collect()
}

/// Named children of a given kind.
pub(crate) fn children_of_kind<'t>(node: Node<'t>, kind: &str) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|child| child.kind() == kind)
        .collect()
}

/// First named child of a given kind.
pub(crate) fn child_of_kind<'t>(node: Node<'t>, kind: &str) -> Option<Node<'t>> {
    let mut cursor = node.walk();
    let found = node.named_children(&mut cursor).find(|child| child.kind() == kind);
    found
}

/// Strip matching quote characters from a string literal.
pub(crate) fn unquote(text: &str) -> String {
    text.trim()
        .trim_matches(|c: char| c == '"' || c == '\'' || c == '`')
        .to_string()
}
