//! Signature and body fingerprints.
//!
//! Every entity carries two SHA-256 digests:
//! - the **signature hash** covers the externally visible contract
//!   (kind, name, parameter types, returns, receiver, fields, ...);
//! - the **body hash** covers the implementation's syntax tree, ignoring
//!   comments and formatting.
//!
//! Keeping them apart lets a consumer skip caller re-analysis when only a
//! body changed. See [`compare`] for change classification.

pub mod diff;
pub mod pair;

pub use diff::{diff_entities, ChangeStatus, EntityChange};
pub use pair::{compare, ChangeClass, HashPair, PAIR_DELIMITER};

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::Path;
use tree_sitter::Node;

use crate::adapter::{normalize_type, LanguageAdapter};
use crate::graph::types::{Entity, EntityDetail, EntityKind, TypeKind};
use crate::parser::SourceText;
use crate::walker::walk;

/// Length of every hash half, in hex characters.
pub const HASH_LENGTH: usize = 64;

/// Body hash of an entity without a body.
pub const EMPTY_BODY_HASH: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";

/// Hex SHA-256 of arbitrary bytes.
pub fn digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Short, stable hash of a file path for entity ids.
pub fn path_hash(path: &Path) -> String {
    let normalized = path.to_string_lossy().replace('\\', "/");
    digest(normalized.as_bytes())[..12].to_string()
}

// ─── Signature ──────────────────────────────────────────────────────────────

/// Canonical contract of an entity. Parameter names are deliberately absent.
#[derive(Serialize)]
struct Contract<'a> {
    kind: EntityKind,
    name: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    params: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    returns: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    receiver: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    type_kind: Option<TypeKind>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    fields: Vec<(&'a str, String)>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    values: Vec<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    value_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    import: Option<(&'a str, Option<&'a str>)>,
}

impl<'a> Contract<'a> {
    fn of(entity: &'a Entity) -> Self {
        let mut contract = Contract {
            kind: entity.kind,
            name: &entity.name,
            params: Vec::new(),
            returns: Vec::new(),
            receiver: None,
            type_kind: None,
            fields: Vec::new(),
            values: Vec::new(),
            value_type: None,
            import: None,
        };

        let norm = |text: &Option<String>| text.as_deref().map(normalize_type).unwrap_or_default();

        match &entity.detail {
            EntityDetail::Callable {
                params,
                returns,
                receiver,
            } => {
                contract.params = params.iter().map(|p| norm(&p.type_text)).collect();
                contract.returns = returns.iter().map(|r| normalize_type(r)).collect();
                contract.receiver = receiver.as_deref().map(normalize_type);
            }
            EntityDetail::Type { type_kind, fields } => {
                contract.type_kind = Some(*type_kind);
                contract.fields = fields
                    .iter()
                    .map(|f| (f.name.as_str(), norm(&f.type_text)))
                    .collect();
            }
            EntityDetail::Enum { values } => {
                contract.values = values.iter().map(String::as_str).collect();
            }
            EntityDetail::Value { type_text } => {
                contract.value_type = type_text.as_deref().map(normalize_type);
            }
            EntityDetail::Import { path, alias } => {
                contract.import = Some((path.as_str(), alias.as_deref()));
            }
        }
        contract
    }
}

/// Fingerprint of an entity's externally visible contract.
pub fn signature_hash(entity: &Entity) -> String {
    let canonical = serde_json::to_vec(&Contract::of(entity)).unwrap_or_default();
    digest(&canonical)
}

// ─── Body ───────────────────────────────────────────────────────────────────

/// Fingerprint of a body subtree, or [`EMPTY_BODY_HASH`] when there is none.
///
/// Each visited node contributes `depth|kind` and, for named leaves
/// (identifiers, literals), its token text. Comment subtrees are skipped.
/// Anonymous tokens are represented by their kind, which is their text, so
/// operators and keywords still count.
pub fn body_hash(adapter: &dyn LanguageAdapter, body: Option<Node<'_>>, src: &SourceText<'_>) -> String {
    let Some(body) = body else {
        return EMPTY_BODY_HASH.to_string();
    };

    let mut hasher = Sha256::new();
    let mut depths: HashMap<usize, usize> = HashMap::new();
    depths.insert(body.id(), 0);

    walk(body, |node| {
        if adapter.is_comment(node.kind()) {
            return false;
        }
        let depth = match node.parent() {
            Some(parent) if node.id() != body.id() => {
                depths.get(&parent.id()).copied().unwrap_or(0) + 1
            }
            _ => 0,
        };
        depths.insert(node.id(), depth);

        hasher.update(depth.to_string().as_bytes());
        hasher.update(b"|");
        hasher.update(node.kind().as_bytes());
        if node.is_named() && node.child_count() == 0 {
            hasher.update(b"|");
            hasher.update(src.text(node).as_bytes());
        }
        hasher.update(b"\n");
        true
    });

    format!("{:x}", hasher.finalize())
}

/// Fills in the hash fields of freshly extracted entities.
pub struct HashEngine<'a> {
    adapter: &'a dyn LanguageAdapter,
    src: SourceText<'a>,
}

impl<'a> HashEngine<'a> {
    pub fn new(adapter: &'a dyn LanguageAdapter, src: SourceText<'a>) -> Self {
        Self { adapter, src }
    }

    /// Compute both hashes of `entity` whose declaration node is `node`.
    pub fn apply(&self, entity: &mut Entity, node: Node<'_>) {
        entity.sig_hash = signature_hash(entity);
        let body = match entity.kind {
            EntityKind::Type | EntityKind::Enum | EntityKind::Import => None,
            _ => self.adapter.body_of(node),
        };
        entity.body_hash = body_hash(self.adapter, body, &self.src);
    }
}
