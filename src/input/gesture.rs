//! Drag gesture gating and drop translation.
//!
//! Inline-editable widgets (a title text box, say) must never start a drag
//! when clicked, while the card or column chrome around them still drags
//! fine. The host platform's DOM/widget hierarchy is abstracted here as a
//! parent-pointer arena where any node can carry a `no_drag` marker; a drag
//! may initiate only if neither the pressed node nor any of its ancestors
//! carries the marker. Rejected gestures are silently suppressed, never
//! errors.

use crate::board::reorder::DropOutcome;
use crate::board::Board;

pub type NodeId = usize;

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    no_drag: bool,
}

/// Parent-pointer view of the widget hierarchy, just enough to answer
/// ancestry questions about drag markers.
#[derive(Debug, Default)]
pub struct WidgetTree {
    nodes: Vec<Node>,
}

impl WidgetTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, parent: Option<NodeId>) -> NodeId {
        self.insert_node(parent, false)
    }

    /// Insert a node flagged as non-draggable (e.g. an inline edit field).
    pub fn insert_no_drag(&mut self, parent: Option<NodeId>) -> NodeId {
        self.insert_node(parent, true)
    }

    fn insert_node(&mut self, parent: Option<NodeId>, no_drag: bool) -> NodeId {
        debug_assert!(parent.is_none_or(|p| p < self.nodes.len()));
        self.nodes.push(Node { parent, no_drag });
        self.nodes.len() - 1
    }

    pub fn mark_no_drag(&mut self, node: NodeId) {
        if let Some(n) = self.nodes.get_mut(node) {
            n.no_drag = true;
        }
    }

    /// Whether a pointer-down on `target` may initiate a drag. Walks the
    /// ancestor chain from the target; any marked node on the way up (the
    /// target included) rejects activation. Pure predicate, no side effects.
    pub fn can_initiate_drag(&self, target: NodeId) -> bool {
        let mut current = Some(target);
        while let Some(idx) = current {
            let Some(node) = self.nodes.get(idx) else {
                // Unknown node: fail closed, no drag.
                return false;
            };
            if node.no_drag {
                return false;
            }
            current = node.parent;
        }
        true
    }
}

/// What was picked up and where it was released, as reported by the
/// platform's drag layer.
#[derive(Debug, Clone, PartialEq)]
pub enum DragPayload {
    /// A column drag; carries the full column ordering after the drop.
    Column { column_order: Vec<String> },
    /// A card drag. Source and target may be the same column.
    Card {
        card_id: String,
        source_column_id: String,
        target_column_id: String,
        drop_index: usize,
        /// Column ordering visible when the gesture completed.
        column_order: Vec<String>,
    },
}

/// A completed drop: the widget the pointer originally went down on, plus
/// the drag layer's payload.
#[derive(Debug, Clone)]
pub struct DragEvent {
    pub origin: NodeId,
    pub payload: DragPayload,
}

/// Validate a drop against the gesture gate and translate it into a reducer
/// input. Classifies a card released over its own column as a same-column
/// reorder and anything else as a cross-column move. Returns `None` for a
/// gated origin or a payload that does not match the board (fail closed).
pub fn map_drop(tree: &WidgetTree, board: &Board, event: &DragEvent) -> Option<DropOutcome> {
    if !tree.can_initiate_drag(event.origin) {
        return None;
    }

    match &event.payload {
        DragPayload::Column { column_order } => Some(DropOutcome::ColumnReorder {
            column_order: column_order.clone(),
        }),
        DragPayload::Card {
            card_id,
            source_column_id,
            target_column_id,
            drop_index,
            column_order,
        } => {
            if source_column_id == target_column_id {
                let card_order =
                    reordered_within(board, source_column_id, card_id, *drop_index)?;
                Some(DropOutcome::CardReorder {
                    column_id: source_column_id.clone(),
                    card_order,
                })
            } else {
                Some(DropOutcome::CardMove {
                    card_id: card_id.clone(),
                    source_column_id: source_column_id.clone(),
                    target_column_id: target_column_id.clone(),
                    drop_index: Some(*drop_index),
                    column_order: column_order.clone(),
                })
            }
        }
    }
}

/// Compute a column's new card order after moving `card_id` to `drop_index`
/// within the same column.
fn reordered_within(
    board: &Board,
    column_id: &str,
    card_id: &str,
    drop_index: usize,
) -> Option<Vec<String>> {
    let col = board.column(column_id)?;
    let from = col.card_order.iter().position(|id| id == card_id)?;
    let mut order = col.card_order.clone();
    let id = order.remove(from);
    let at = drop_index.min(order.len());
    order.insert(at, id);
    Some(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::testutil::test_board;

    fn ids(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    /// root > card > title field (no-drag)
    fn card_tree() -> (WidgetTree, NodeId, NodeId, NodeId) {
        let mut tree = WidgetTree::new();
        let root = tree.insert(None);
        let card = tree.insert(Some(root));
        let title = tree.insert_no_drag(Some(card));
        (tree, root, card, title)
    }

    #[test]
    fn chrome_allows_drag() {
        let (tree, root, card, _) = card_tree();
        assert!(tree.can_initiate_drag(root));
        assert!(tree.can_initiate_drag(card));
    }

    #[test]
    fn marked_node_blocks_drag() {
        let (tree, _, _, title) = card_tree();
        assert!(!tree.can_initiate_drag(title));
    }

    #[test]
    fn marked_ancestor_blocks_descendants() {
        let (mut tree, _, _, title) = card_tree();
        let inner = tree.insert(Some(title));
        let deepest = tree.insert(Some(inner));
        assert!(!tree.can_initiate_drag(deepest));
    }

    #[test]
    fn mark_no_drag_applies_retroactively() {
        let (mut tree, _, card, _) = card_tree();
        let child = tree.insert(Some(card));
        assert!(tree.can_initiate_drag(child));
        tree.mark_no_drag(card);
        assert!(!tree.can_initiate_drag(child));
    }

    #[test]
    fn unknown_node_blocks_drag() {
        let tree = WidgetTree::new();
        assert!(!tree.can_initiate_drag(42));
    }

    #[test]
    fn gated_origin_suppresses_drop() {
        let (tree, _, _, title) = card_tree();
        let board = test_board(&[("c1", &["a", "b"])]);
        let event = DragEvent {
            origin: title,
            payload: DragPayload::Column {
                column_order: ids(&["c1"]),
            },
        };
        assert_eq!(map_drop(&tree, &board, &event), None);
    }

    #[test]
    fn column_payload_maps_to_column_reorder() {
        let (tree, _, card, _) = card_tree();
        let board = test_board(&[("c1", &[]), ("c2", &[])]);
        let event = DragEvent {
            origin: card,
            payload: DragPayload::Column {
                column_order: ids(&["c2", "c1"]),
            },
        };
        assert_eq!(
            map_drop(&tree, &board, &event),
            Some(DropOutcome::ColumnReorder {
                column_order: ids(&["c2", "c1"]),
            })
        );
    }

    #[test]
    fn same_column_drop_maps_to_card_reorder() {
        let (tree, _, card, _) = card_tree();
        let board = test_board(&[("c1", &["a", "b", "c"])]);
        let event = DragEvent {
            origin: card,
            payload: DragPayload::Card {
                card_id: "c".into(),
                source_column_id: "c1".into(),
                target_column_id: "c1".into(),
                drop_index: 0,
                column_order: ids(&["c1"]),
            },
        };
        assert_eq!(
            map_drop(&tree, &board, &event),
            Some(DropOutcome::CardReorder {
                column_id: "c1".into(),
                card_order: ids(&["c", "a", "b"]),
            })
        );
    }

    #[test]
    fn cross_column_drop_maps_to_card_move() {
        let (tree, _, card, _) = card_tree();
        let board = test_board(&[("c1", &["a"]), ("c2", &[])]);
        let event = DragEvent {
            origin: card,
            payload: DragPayload::Card {
                card_id: "a".into(),
                source_column_id: "c1".into(),
                target_column_id: "c2".into(),
                drop_index: 0,
                column_order: ids(&["c1", "c2"]),
            },
        };
        assert_eq!(
            map_drop(&tree, &board, &event),
            Some(DropOutcome::CardMove {
                card_id: "a".into(),
                source_column_id: "c1".into(),
                target_column_id: "c2".into(),
                drop_index: Some(0),
                column_order: ids(&["c1", "c2"]),
            })
        );
    }

    #[test]
    fn same_column_drop_with_unknown_card_is_suppressed() {
        let (tree, _, card, _) = card_tree();
        let board = test_board(&[("c1", &["a"])]);
        let event = DragEvent {
            origin: card,
            payload: DragPayload::Card {
                card_id: "zzz".into(),
                source_column_id: "c1".into(),
                target_column_id: "c1".into(),
                drop_index: 0,
                column_order: ids(&["c1"]),
            },
        };
        assert_eq!(map_drop(&tree, &board, &event), None);
    }
}
