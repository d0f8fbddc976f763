//! Classify entity changes between two batches.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;

use super::pair::{compare_pairs, ChangeClass};
use crate::graph::types::{Entity, EntityKind};

/// Outcome for one entity across two batches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ChangeStatus {
    Added,
    Removed,
    Unchanged,
    Modified {
        signature_changed: bool,
        body_changed: bool,
    },
}

/// One line of a batch diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityChange {
    pub file_path: PathBuf,
    pub kind: EntityKind,
    pub name: String,
    #[serde(flatten)]
    pub status: ChangeStatus,
    pub old_id: Option<String>,
    pub new_id: Option<String>,
}

type MatchKey = (PathBuf, EntityKind, String);

fn match_key(entity: &Entity) -> MatchKey {
    (
        entity.file_path.clone(),
        entity.kind,
        entity
            .qualified_name
            .clone()
            .unwrap_or_else(|| entity.name.clone()),
    )
}

/// Pair entities of `old` and `new` and classify each pair.
///
/// Entities match on file, kind and qualified (or simple) name; ids are
/// line-anchored and would report every shifted declaration as new.
/// Duplicated keys pair up in source order. Output lists `new` order first,
/// then removals in `old` order.
pub fn diff_entities(old: &[Entity], new: &[Entity]) -> Vec<EntityChange> {
    let mut pending: HashMap<MatchKey, VecDeque<&Entity>> = HashMap::new();
    for entity in old {
        pending.entry(match_key(entity)).or_default().push_back(entity);
    }

    let mut changes = Vec::with_capacity(new.len());
    for entity in new {
        let previous = pending
            .get_mut(&match_key(entity))
            .and_then(VecDeque::pop_front);

        let status = match previous {
            None => ChangeStatus::Added,
            Some(previous) => {
                let class: ChangeClass = compare_pairs(&previous.hash_pair(), &entity.hash_pair());
                if class.is_unchanged() {
                    ChangeStatus::Unchanged
                } else {
                    ChangeStatus::Modified {
                        signature_changed: class.signature_changed,
                        body_changed: class.body_changed,
                    }
                }
            }
        };

        changes.push(EntityChange {
            file_path: entity.file_path.clone(),
            kind: entity.kind,
            name: entity.name.clone(),
            status,
            old_id: previous.map(|p| p.id.clone()),
            new_id: Some(entity.id.clone()),
        });
    }

    for entity in old {
        let key = match_key(entity);
        let still_pending = pending
            .get(&key)
            .is_some_and(|queue| queue.iter().any(|e| std::ptr::eq(*e, entity)));
        if still_pending {
            changes.push(EntityChange {
                file_path: entity.file_path.clone(),
                kind: entity.kind,
                name: entity.name.clone(),
                status: ChangeStatus::Removed,
                old_id: Some(entity.id.clone()),
                new_id: None,
            });
        }
    }

    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::types::{EntityDetail, NodeSpan};
    use crate::parser::SupportedLanguage;

    fn entity(name: &str, line: usize, sig: &str, body: &str) -> Entity {
        Entity {
            id: format!("function:x:{}:{}", line, name),
            kind: EntityKind::Function,
            name: name.to_string(),
            qualified_name: None,
            language: SupportedLanguage::Rust,
            file_path: PathBuf::from("src/lib.rs"),
            line_start: line,
            line_end: line + 2,
            detail: EntityDetail::Callable {
                params: vec![],
                returns: vec![],
                receiver: None,
            },
            sig_hash: sig.to_string(),
            body_hash: body.to_string(),
            span: NodeSpan::default(),
        }
    }

    fn status_of<'a>(changes: &'a [EntityChange], name: &str) -> &'a ChangeStatus {
        &changes.iter().find(|c| c.name == name).unwrap().status
    }

    #[test]
    fn test_diff_classifies_each_status() {
        let old = vec![
            entity("keep", 1, "s1", "b1"),
            entity("edit", 5, "s2", "b2"),
            entity("gone", 9, "s3", "b3"),
        ];
        let new = vec![
            // shifted down two lines: new id, same hashes
            entity("keep", 3, "s1", "b1"),
            entity("edit", 7, "s2", "b2x"),
            entity("fresh", 11, "s4", "b4"),
        ];

        let changes = diff_entities(&old, &new);
        assert_eq!(changes.len(), 4);
        assert_eq!(*status_of(&changes, "keep"), ChangeStatus::Unchanged);
        assert_eq!(
            *status_of(&changes, "edit"),
            ChangeStatus::Modified {
                signature_changed: false,
                body_changed: true
            }
        );
        assert_eq!(*status_of(&changes, "fresh"), ChangeStatus::Added);
        assert_eq!(*status_of(&changes, "gone"), ChangeStatus::Removed);
        assert_eq!(changes.last().unwrap().name, "gone");
    }

    #[test]
    fn test_diff_missing_hashes_force_recompute() {
        let old = vec![entity("f", 1, "", "")];
        let new = vec![entity("f", 1, "", "")];
        let changes = diff_entities(&old, &new);
        assert_eq!(
            changes[0].status,
            ChangeStatus::Modified {
                signature_changed: true,
                body_changed: true
            }
        );
    }

    #[test]
    fn test_diff_pairs_duplicates_in_order() {
        let old = vec![entity("init", 1, "a", "a"), entity("init", 10, "b", "b")];
        let new = vec![entity("init", 2, "a", "a")];
        let changes = diff_entities(&old, &new);
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].status, ChangeStatus::Unchanged);
        assert_eq!(changes[1].status, ChangeStatus::Removed);
        assert_eq!(changes[1].old_id.as_deref(), Some("function:x:10:init"));
    }
}
