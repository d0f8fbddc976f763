//! Core types for the Keel code model.
//!
//! Defines entities (extracted declarations), dependency edges between
//! them, and the node/edge payloads stored in the [`CodeGraph`].
//!
//! [`CodeGraph`]: super::engine::CodeGraph

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::hash::{path_hash, HashPair};
use crate::parser::SupportedLanguage;

/// The kind of an extracted declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// A free function.
    Function,
    /// A function owned by a type (impl block, class body, Go receiver).
    Method,
    /// A struct, class, interface, trait, record or type alias.
    Type,
    /// An enumeration.
    Enum,
    /// A constant.
    Const,
    /// A module- or package-level variable.
    Var,
    /// An import / use declaration.
    Import,
}

impl EntityKind {
    /// Short tag used in entity ids.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Function => "function",
            EntityKind::Method => "method",
            EntityKind::Type => "type",
            EntityKind::Enum => "enum",
            EntityKind::Const => "const",
            EntityKind::Var => "var",
            EntityKind::Import => "import",
        }
    }

    /// Functions and methods have executable bodies and call sites.
    pub fn is_callable(&self) -> bool {
        matches!(self, EntityKind::Function | EntityKind::Method)
    }

    /// Types and enums may carry base-type lists and fields.
    pub fn is_type_like(&self) -> bool {
        matches!(self, EntityKind::Type | EntityKind::Enum)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The shape of a type declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    Struct,
    Class,
    Interface,
    Trait,
    Record,
    Alias,
}

impl TypeKind {
    /// Interfaces and traits list only supertypes they extend.
    pub fn is_interface_like(&self) -> bool {
        matches!(self, TypeKind::Interface | TypeKind::Trait)
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeKind::Struct => write!(f, "struct"),
            TypeKind::Class => write!(f, "class"),
            TypeKind::Interface => write!(f, "interface"),
            TypeKind::Trait => write!(f, "trait"),
            TypeKind::Record => write!(f, "record"),
            TypeKind::Alias => write!(f, "alias"),
        }
    }
}

/// A callable parameter. Only `type_text` participates in the signature hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub type_text: Option<String>,
}

/// A field of a struct/class/record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub type_text: Option<String>,
}

/// Kind-specific payload of an [`Entity`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum EntityDetail {
    Callable {
        params: Vec<Param>,
        returns: Vec<String>,
        /// Receiver type text (Go `*T` vs `T`) or the owning type's name.
        receiver: Option<String>,
    },
    Type {
        type_kind: TypeKind,
        fields: Vec<Field>,
    },
    Enum {
        values: Vec<String>,
    },
    Value {
        type_text: Option<String>,
    },
    Import {
        path: String,
        alias: Option<String>,
    },
}

/// Byte span and grammar kind id of a declaration node.
///
/// This is how an entity keeps a non-owning handle into the provider's tree
/// without borrowing it: the parser re-locates the node from the span.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeSpan {
    pub kind_id: u16,
    pub start_byte: usize,
    pub end_byte: usize,
}

/// One extracted declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    /// Location-anchored identifier, see [`Entity::make_id`].
    pub id: String,
    pub kind: EntityKind,
    pub name: String,
    pub qualified_name: Option<String>,
    pub language: SupportedLanguage,
    pub file_path: PathBuf,
    /// Starting line (1-indexed).
    pub line_start: usize,
    /// Ending line (1-indexed).
    pub line_end: usize,
    pub detail: EntityDetail,
    /// Signature fingerprint, filled in by the hash engine.
    #[serde(default)]
    pub sig_hash: String,
    /// Body fingerprint, filled in by the hash engine.
    #[serde(default)]
    pub body_hash: String,
    #[serde(default)]
    pub span: NodeSpan,
}

impl Entity {
    /// Derive an entity id from `(kind, file-path hash, start line, name)`.
    ///
    /// Re-parsing identical content at the same location yields the same id;
    /// shifting the declaration to another line yields a new one.
    pub fn make_id(kind: EntityKind, file_path: &std::path::Path, line_start: usize, name: &str) -> String {
        format!(
            "{}:{}:{}:{}",
            kind.as_str(),
            path_hash(file_path),
            line_start,
            name
        )
    }

    /// The stored `sig:body` pair.
    pub fn hash_pair(&self) -> HashPair {
        HashPair::new(self.sig_hash.clone(), self.body_hash.clone())
    }

    /// The owner-type part of the qualified name, if any.
    pub fn qualifier(&self) -> Option<&str> {
        qualifier_of(self.qualified_name.as_deref()?, &self.name)
    }
}

/// `qualified` minus its trailing `::name` / `.name`.
pub fn qualifier_of<'a>(qualified: &'a str, name: &str) -> Option<&'a str> {
    let prefix = qualified.strip_suffix(name)?;
    let prefix = prefix
        .strip_suffix("::")
        .or_else(|| prefix.strip_suffix('.'))?;
    (!prefix.is_empty()).then_some(prefix)
}

/// The kind of a dependency edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DependencyKind {
    /// Invocation, or construction modeled as a call to the type's constructor.
    Calls,
    /// A type referenced in a type position.
    UsesType,
    /// A class implementing an interface.
    Implements,
    /// A superclass or super-interface.
    Extends,
    /// A method pointing at its owning type.
    MethodOf,
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DependencyKind::Calls => write!(f, "calls"),
            DependencyKind::UsesType => write!(f, "uses_type"),
            DependencyKind::Implements => write!(f, "implements"),
            DependencyKind::Extends => write!(f, "extends"),
            DependencyKind::MethodOf => write!(f, "method_of"),
        }
    }
}

/// Source location of a dependency (1-indexed line).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub file_path: PathBuf,
    pub line: usize,
}

/// A directed edge from an entity to a (possibly unresolved) target.
///
/// `to_name` is always populated; `to_id` stays `None` when the target could
/// not be resolved within the batch, which is a permanent, valid state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub from_id: String,
    pub to_name: String,
    pub to_qualified: Option<String>,
    pub to_id: Option<String>,
    pub kind: DependencyKind,
    pub location: Location,
    /// True when the edge only fires along some control-flow paths.
    pub optional: bool,
}

impl Dependency {
    pub fn is_resolved(&self) -> bool {
        self.to_id.is_some()
    }

    /// The most specific target text available.
    pub fn target(&self) -> &str {
        self.to_qualified.as_deref().unwrap_or(&self.to_name)
    }
}

// ─── Graph Payloads ───────────────────────────────────────────────────────────

/// Data stored in a [`CodeGraph`](super::engine::CodeGraph) node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeData {
    pub id: String,
    pub name: String,
    pub qualified_name: Option<String>,
    pub kind: EntityKind,
    pub file_path: PathBuf,
    pub line_start: usize,
    pub line_end: usize,
}

impl From<&Entity> for NodeData {
    fn from(entity: &Entity) -> Self {
        Self {
            id: entity.id.clone(),
            name: entity.name.clone(),
            qualified_name: entity.qualified_name.clone(),
            kind: entity.kind,
            file_path: entity.file_path.clone(),
            line_start: entity.line_start,
            line_end: entity.line_end,
        }
    }
}

/// Data stored on a graph edge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeData {
    pub kind: DependencyKind,
    pub optional: bool,
    pub line: usize,
}

impl From<&Dependency> for EdgeData {
    fn from(dep: &Dependency) -> Self {
        Self {
            kind: dep.kind,
            optional: dep.optional,
            line: dep.location.line,
        }
    }
}
