//! Bounds-checked access to source text by byte range.

use std::ops::Range;
use tree_sitter::Node;

/// Source text of one compilation unit.
///
/// All accessors return `""` instead of panicking when a range falls outside
/// the text or splits a UTF-8 sequence.
#[derive(Debug, Clone, Copy)]
pub struct SourceText<'a> {
    text: &'a str,
}

impl<'a> SourceText<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text }
    }

    pub fn as_str(&self) -> &'a str {
        self.text
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.text.as_bytes()
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Slice by byte range.
    pub fn slice(&self, range: Range<usize>) -> &'a str {
        if range.start > range.end {
            return "";
        }
        self.text.get(range).unwrap_or("")
    }

    /// Text covered by a node.
    pub fn text(&self, node: Node<'_>) -> &'a str {
        self.slice(node.byte_range())
    }

    /// Text of a node's named field, if the field is present.
    pub fn field(&self, node: Node<'_>, field: &str) -> Option<&'a str> {
        node.child_by_field_name(field).map(|child| self.text(child))
    }
}
