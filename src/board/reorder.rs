//! Reorder reducer: pure computation of a new board snapshot from a
//! completed drag gesture.
//!
//! Every transition takes the current board by reference and returns a fresh
//! snapshot, so the rest of the client only ever observes fully-applied
//! states. A drop that references unknown columns or cards, or supplies an
//! order list that is not a permutation of the existing one, fails closed:
//! `apply` returns `None` and the caller keeps its current snapshot.

use super::placeholder::{ensure_placeholder, strip_placeholder};
use super::{Board, Card, Column};

/// Outcome of a completed drag gesture. The three cases are mutually
/// exclusive by drag source.
#[derive(Debug, Clone, PartialEq)]
pub enum DropOutcome {
    /// A column was dragged to a new position within the board. Carries the
    /// full column ordering after the drop.
    ColumnReorder { column_order: Vec<String> },
    /// A card was dropped back into its own column at a new position.
    /// Carries the column's full card ordering after the drop.
    CardReorder {
        column_id: String,
        card_order: Vec<String>,
    },
    /// A card was dropped into a different column.
    CardMove {
        card_id: String,
        source_column_id: String,
        target_column_id: String,
        /// Position within the target column; `None` appends.
        drop_index: Option<usize>,
        /// Board-level column ordering as the drag layer saw it when the
        /// gesture completed (columns may have shifted mid-gesture).
        column_order: Vec<String>,
    },
}

/// Apply a drop to the board, returning the new snapshot, or `None` if the
/// drop is inconsistent with the current state.
pub fn apply(board: &Board, drop: &DropOutcome) -> Option<Board> {
    match drop {
        DropOutcome::ColumnReorder { column_order } => reorder_columns(board, column_order),
        DropOutcome::CardReorder {
            column_id,
            card_order,
        } => reorder_cards(board, column_id, card_order),
        DropOutcome::CardMove {
            card_id,
            source_column_id,
            target_column_id,
            drop_index,
            column_order,
        } => move_card(
            board,
            card_id,
            source_column_id,
            target_column_id,
            *drop_index,
            column_order,
        ),
    }
}

/// Case 1: columns reordered within the board. No card-level changes.
fn reorder_columns(board: &Board, column_order: &[String]) -> Option<Board> {
    let columns = permute_columns(&board.columns, column_order)?;
    Some(Board {
        id: board.id.clone(),
        column_order: column_order.to_vec(),
        columns,
    })
}

/// Case 2: cards reordered within a single column. All other columns
/// untouched.
fn reorder_cards(board: &Board, column_id: &str, card_order: &[String]) -> Option<Board> {
    let col_idx = board.column_index(column_id)?;
    let col = &board.columns[col_idx];

    let cards = permute_cards(&col.cards, card_order)?;
    let mut next = board.clone();
    next.columns[col_idx].card_order = card_order.to_vec();
    next.columns[col_idx].cards = cards;
    Some(next)
}

/// Case 3: a card moved into a different column, possibly while the columns
/// themselves were also reordered during the same gesture.
fn move_card(
    board: &Board,
    card_id: &str,
    source_column_id: &str,
    target_column_id: &str,
    drop_index: Option<usize>,
    column_order: &[String],
) -> Option<Board> {
    if source_column_id == target_column_id {
        return None;
    }

    // Board-level snapshot ordering first; the card edit below is
    // position-independent.
    let mut next = reorder_columns(board, column_order)?;

    let src_idx = next.column_index(source_column_id)?;
    let tgt_idx = next.column_index(target_column_id)?;

    let card_pos = next.columns[src_idx].card_position(card_id)?;
    // Placeholders are synthetic and never move between columns.
    next.columns[src_idx].cards[card_pos].as_real()?;

    let mut card = next.columns[src_idx].cards.remove(card_pos);
    next.columns[src_idx].card_order.retain(|id| id != card_id);
    if let Card::Real(real) = &mut card {
        real.column_id = target_column_id.to_string();
    }

    // Source may have just emptied; target may have held only its filler.
    ensure_placeholder(&mut next.columns[src_idx]);
    strip_placeholder(&mut next.columns[tgt_idx]);

    let target = &mut next.columns[tgt_idx];
    let at = drop_index.unwrap_or(target.cards.len()).min(target.cards.len());
    target.cards.insert(at, card);
    target.card_order.insert(at, card_id.to_string());

    debug_assert!(next.check_invariants().is_ok());
    Some(next)
}

/// Rebuild `columns` in the order given by `order`, or `None` if `order` is
/// not a duplicate-free permutation of the existing column ids.
fn permute_columns(columns: &[Column], order: &[String]) -> Option<Vec<Column>> {
    if order.len() != columns.len() {
        return None;
    }
    let mut out = Vec::with_capacity(columns.len());
    for id in order {
        let col = columns.iter().find(|c| c.id == *id)?;
        if out.iter().any(|c: &Column| c.id == *id) {
            return None;
        }
        out.push(col.clone());
    }
    Some(out)
}

/// Rebuild `cards` in the order given by `order`, or `None` if `order` is
/// not a duplicate-free permutation of the existing card ids.
fn permute_cards(cards: &[Card], order: &[String]) -> Option<Vec<Card>> {
    if order.len() != cards.len() {
        return None;
    }
    let mut out = Vec::with_capacity(cards.len());
    for id in order {
        let card = cards.iter().find(|c| c.id() == id)?;
        if out.iter().any(|c: &Card| c.id() == id) {
            return None;
        }
        out.push(card.clone());
    }
    Some(out)
}
