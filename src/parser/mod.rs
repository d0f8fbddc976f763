//! Parsing: tree-sitter binding and entity extraction.
//!
//! [`parse_source`] turns one file into a [`ParsedUnit`] that owns both the
//! text and the syntax tree. Everything downstream borrows from the unit.

pub mod entities;
pub mod language;
pub mod source;

pub use entities::{extract_entities, ParsedEntity};
pub use language::SupportedLanguage;
pub use source::SourceText;

use std::path::{Path, PathBuf};
use tracing::debug;
use tree_sitter::{Node, Parser, Tree};

use crate::error::{KeelError, Result};
use crate::graph::types::NodeSpan;

/// One parsed compilation unit.
pub struct ParsedUnit {
    pub path: PathBuf,
    pub language: SupportedLanguage,
    source: String,
    tree: Tree,
}

impl std::fmt::Debug for ParsedUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParsedUnit")
            .field("path", &self.path)
            .field("language", &self.language)
            .field("bytes", &self.source.len())
            .finish()
    }
}

impl ParsedUnit {
    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    pub fn source(&self) -> SourceText<'_> {
        SourceText::new(&self.source)
    }

    /// Check that the tree actually describes this unit's text.
    pub fn validate(&self) -> Result<()> {
        let root = self.root();
        if root.end_byte() > self.source.len() {
            return Err(KeelError::InvalidTree {
                path: self.path.clone(),
                reason: format!(
                    "root ends at byte {} but source has {} bytes",
                    root.end_byte(),
                    self.source.len()
                ),
            });
        }
        Ok(())
    }

    /// Re-locate the declaration node recorded in `span`.
    ///
    /// Starts from the smallest node covering the range and climbs while the
    /// range is unchanged until the recorded kind is found.
    pub fn node_at(&self, span: &NodeSpan) -> Option<Node<'_>> {
        let mut node = self
            .root()
            .descendant_for_byte_range(span.start_byte, span.end_byte)?;
        loop {
            if node.start_byte() != span.start_byte || node.end_byte() != span.end_byte {
                return None;
            }
            if node.kind_id() == span.kind_id {
                return Some(node);
            }
            node = node.parent()?;
        }
    }

    /// Like [`node_at`](Self::node_at) but a miss is an invalid tree.
    pub fn require_node(&self, span: &NodeSpan) -> Result<Node<'_>> {
        self.node_at(span).ok_or_else(|| KeelError::InvalidTree {
            path: self.path.clone(),
            reason: format!(
                "no node of kind {} at bytes {}..{}",
                span.kind_id, span.start_byte, span.end_byte
            ),
        })
    }
}

/// Span handle for a node, see [`ParsedUnit::node_at`].
pub fn span_of(node: Node<'_>) -> NodeSpan {
    NodeSpan {
        kind_id: node.kind_id(),
        start_byte: node.start_byte(),
        end_byte: node.end_byte(),
    }
}

/// Parse a source file into a [`ParsedUnit`].
pub fn parse_source(path: &Path, source: &str) -> Result<ParsedUnit> {
    let language = SupportedLanguage::from_path(path).ok_or_else(|| {
        KeelError::UnsupportedLanguage(
            path.extension()
                .map(|e| e.to_string_lossy().to_string())
                .unwrap_or_else(|| path.display().to_string()),
        )
    })?;

    let mut parser = Parser::new();
    parser
        .set_language(&language.tree_sitter_language())
        .map_err(|_| KeelError::Parse {
            path: path.to_path_buf(),
        })?;

    let tree = parser.parse(source, None).ok_or_else(|| KeelError::Parse {
        path: path.to_path_buf(),
    })?;

    debug!(
        file = %path.display(),
        language = language.name(),
        has_errors = tree.root_node().has_error(),
        "parsed unit"
    );

    Ok(ParsedUnit {
        path: path.to_path_buf(),
        language,
        source: source.to_string(),
        tree,
    })
}
