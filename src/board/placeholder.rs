//! Placeholder synthesis: every column keeps at least one orderable entry.
//!
//! An empty column has nothing to drop a card onto, so it gets a synthetic
//! placeholder card with a deterministically derived id. Placeholders exist
//! only in client memory: they are stripped the moment a real card lands and
//! filtered out of every reconciliation payload.

use super::{Card, Column};

const PLACEHOLDER_SUFFIX: &str = "-placeholder-card";

/// Derive the placeholder id for a column. Pure; the same column always
/// yields the same id.
pub fn placeholder_id(column_id: &str) -> String {
    format!("{column_id}{PLACEHOLDER_SUFFIX}")
}

/// The synthetic filler entity for an empty column.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceholderCard {
    pub id: String,
    pub column_id: String,
}

impl PlaceholderCard {
    pub fn new(column_id: &str) -> Self {
        Self {
            id: placeholder_id(column_id),
            column_id: column_id.to_string(),
        }
    }
}

/// Inject the placeholder iff the column has zero real cards. Leaves a
/// column that already has real cards (or already holds its placeholder)
/// untouched.
pub fn ensure_placeholder(col: &mut Column) {
    if col.real_card_count() > 0 {
        return;
    }
    if col.cards.len() == 1 && col.cards[0].is_placeholder() && col.card_order.len() == 1 {
        return;
    }
    let ph = PlaceholderCard::new(&col.id);
    col.card_order = vec![ph.id.clone()];
    col.cards = vec![Card::Placeholder(ph)];
}

/// Remove the placeholder from the column's card list and order list. Called
/// before the first real card lands so the placeholder is replaced, not
/// kept alongside.
pub fn strip_placeholder(col: &mut Column) {
    let ph_id = placeholder_id(&col.id);
    col.cards.retain(|c| !c.is_placeholder());
    col.card_order.retain(|id| *id != ph_id);
}

/// The column's order list with placeholder ids filtered out, the only form
/// an order list ever takes in a persistence payload. An empty column yields
/// an empty list.
pub fn real_card_order(col: &Column) -> Vec<String> {
    let ph_id = placeholder_id(&col.id);
    col.card_order
        .iter()
        .filter(|id| **id != ph_id)
        .cloned()
        .collect()
}
