//! Generic tree walker.
//!
//! Every scan in Keel (declarations, call sites, type references, body
//! fingerprints) is a [`walk`] with a different visitor.

use tree_sitter::Node;

/// Depth-first, pre-order traversal of `root` and its descendants.
///
/// When `visit` returns `false` for a node, that node's subtree is skipped
/// and traversal continues with its next sibling. The walk never leaves the
/// subtree rooted at `root`.
pub fn walk<'tree, F>(root: Node<'tree>, mut visit: F)
where
    F: FnMut(Node<'tree>) -> bool,
{
    let mut cursor = root.walk();
    let mut depth = 0usize;

    loop {
        if visit(cursor.node()) && cursor.goto_first_child() {
            depth += 1;
            continue;
        }

        // Advance to the next sibling, climbing as needed.
        loop {
            if depth == 0 {
                return;
            }
            if cursor.goto_next_sibling() {
                break;
            }
            cursor.goto_parent();
            depth -= 1;
        }
    }
}

/// Strict ancestors of `node`, nearest first, ending at the root.
pub fn ancestors<'tree>(node: Node<'tree>) -> impl Iterator<Item = Node<'tree>> {
    std::iter::successors(node.parent(), |n| n.parent())
}
