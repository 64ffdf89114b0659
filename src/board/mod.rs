pub mod placeholder;
pub mod reorder;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use placeholder::PlaceholderCard;

/// The active board record: the board-level column ordering plus the
/// denormalized column objects. Owned by exactly one view at a time; all
/// mutation goes through [`reorder::apply`], which returns a fresh snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Board {
    pub id: String,
    /// Permutation of `columns[].id`, no duplicates.
    pub column_order: Vec<String>,
    pub columns: Vec<Column>,
}

/// A single kanban column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub id: String,
    pub board_id: String,
    pub title: String,
    /// Permutation of `cards[].id`. An empty column holds exactly the
    /// placeholder id here, never an empty list.
    pub card_order: Vec<String>,
    pub cards: Vec<Card>,
}

/// A card entry in a column. Empty columns carry a synthetic placeholder so
/// they still have a drop target; making it a variant (rather than a flag on
/// an ordinary card) means a placeholder can never be persisted or moved by
/// construction.
#[derive(Debug, Clone, PartialEq)]
pub enum Card {
    Real(RealCard),
    Placeholder(PlaceholderCard),
}

/// A server-backed card. Only real cards cross the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealCard {
    pub id: String,
    pub column_id: String,
    pub title: String,
    #[serde(default)]
    pub priority: Priority,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

/// Priority levels, display-only on this side of the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl RealCard {
    pub fn new(id: String, column_id: String, title: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            column_id,
            title,
            priority: Priority::default(),
            created: now,
            updated: now,
        }
    }
}

impl Card {
    pub fn id(&self) -> &str {
        match self {
            Self::Real(card) => &card.id,
            Self::Placeholder(ph) => &ph.id,
        }
    }

    pub fn column_id(&self) -> &str {
        match self {
            Self::Real(card) => &card.column_id,
            Self::Placeholder(ph) => &ph.column_id,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder(_))
    }

    pub fn as_real(&self) -> Option<&RealCard> {
        match self {
            Self::Real(card) => Some(card),
            Self::Placeholder(_) => None,
        }
    }
}

impl Column {
    /// Number of non-placeholder cards.
    pub fn real_card_count(&self) -> usize {
        self.cards.iter().filter(|c| !c.is_placeholder()).count()
    }

    pub fn card_position(&self, card_id: &str) -> Option<usize> {
        self.cards.iter().position(|c| c.id() == card_id)
    }
}

impl Board {
    pub fn column(&self, column_id: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.id == column_id)
    }

    pub fn column_index(&self, column_id: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.id == column_id)
    }

    /// Find which column a card is in and its index within that column.
    pub fn find_card(&self, card_id: &str) -> Option<(usize, usize)> {
        for (col_idx, col) in self.columns.iter().enumerate() {
            if let Some(card_idx) = col.card_position(card_id) {
                return Some((col_idx, card_idx));
            }
        }
        None
    }

    /// Verify every structural invariant of the order cache. Returns the
    /// first violation as a message; used by tests and debug assertions.
    pub fn check_invariants(&self) -> Result<(), String> {
        let col_ids: Vec<&str> = self.columns.iter().map(|c| c.id.as_str()).collect();
        if !is_permutation(&self.column_order, &col_ids) {
            return Err(format!(
                "column_order {:?} is not a permutation of column ids {col_ids:?}",
                self.column_order
            ));
        }
        for col in &self.columns {
            let card_ids: Vec<&str> = col.cards.iter().map(|c| c.id()).collect();
            if !is_permutation(&col.card_order, &card_ids) {
                return Err(format!(
                    "column {}: card_order {:?} is not a permutation of card ids {card_ids:?}",
                    col.id, col.card_order
                ));
            }
            let real = col.real_card_count();
            let placeholders = col.cards.len() - real;
            if real == 0 && (placeholders != 1 || col.card_order.len() != 1) {
                return Err(format!(
                    "empty column {} must hold exactly one placeholder entry",
                    col.id
                ));
            }
            if real > 0 && placeholders != 0 {
                return Err(format!(
                    "non-empty column {} still contains a placeholder",
                    col.id
                ));
            }
            for card in &col.cards {
                if card.column_id() != col.id {
                    return Err(format!(
                        "card {} carries column_id {} but lives in column {}",
                        card.id(),
                        card.column_id(),
                        col.id
                    ));
                }
            }
        }
        // A card id appears in exactly one column's order list.
        let mut seen = std::collections::HashSet::new();
        for col in &self.columns {
            for id in &col.card_order {
                if !seen.insert(id.as_str()) {
                    return Err(format!("card {id} appears in more than one column"));
                }
            }
        }
        Ok(())
    }
}

/// Whether `order` lists exactly the ids in `ids`, each once.
fn is_permutation(order: &[String], ids: &[&str]) -> bool {
    if order.len() != ids.len() {
        return false;
    }
    let mut seen = std::collections::HashSet::new();
    for id in order {
        if !seen.insert(id.as_str()) {
            return false;
        }
        if !ids.contains(&id.as_str()) {
            return false;
        }
    }
    true
}

#[cfg(test)]
pub(crate) mod testutil {
    use super::placeholder::ensure_placeholder;
    use super::*;

    /// Build a board from `(column_id, card_ids)` pairs. Column titles are
    /// derived from the id; empty columns get their placeholder.
    pub fn test_board(columns: &[(&str, &[&str])]) -> Board {
        let cols: Vec<Column> = columns
            .iter()
            .map(|(col_id, card_ids)| {
                let mut col = Column {
                    id: col_id.to_string(),
                    board_id: "board-1".into(),
                    title: col_id.to_uppercase(),
                    card_order: card_ids.iter().map(|s| s.to_string()).collect(),
                    cards: card_ids
                        .iter()
                        .map(|id| {
                            Card::Real(RealCard::new(
                                id.to_string(),
                                col_id.to_string(),
                                format!("Card {id}"),
                            ))
                        })
                        .collect(),
                };
                ensure_placeholder(&mut col);
                col
            })
            .collect();
        Board {
            id: "board-1".into(),
            column_order: cols.iter().map(|c| c.id.clone()).collect(),
            columns: cols,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testutil::test_board;
    use super::*;

    #[test]
    fn test_board_satisfies_invariants() {
        let board = test_board(&[("c1", &["a", "b"]), ("c2", &[])]);
        board.check_invariants().unwrap();
    }

    #[test]
    fn find_card_locates_column_and_index() {
        let board = test_board(&[("c1", &["a", "b"]), ("c2", &["x"])]);
        assert_eq!(board.find_card("b"), Some((0, 1)));
        assert_eq!(board.find_card("x"), Some((1, 0)));
        assert_eq!(board.find_card("nope"), None);
    }

    #[test]
    fn empty_column_holds_single_placeholder() {
        let board = test_board(&[("c1", &[])]);
        let col = &board.columns[0];
        assert_eq!(col.cards.len(), 1);
        assert!(col.cards[0].is_placeholder());
        assert_eq!(col.card_order, vec!["c1-placeholder-card".to_string()]);
        assert_eq!(col.real_card_count(), 0);
    }

    #[test]
    fn invariant_rejects_duplicate_column_order() {
        let mut board = test_board(&[("c1", &["a"]), ("c2", &["b"])]);
        board.column_order = vec!["c1".into(), "c1".into()];
        assert!(board.check_invariants().is_err());
    }

    #[test]
    fn invariant_rejects_mismatched_card_column_id() {
        let mut board = test_board(&[("c1", &["a"]), ("c2", &[])]);
        if let Card::Real(card) = &mut board.columns[0].cards[0] {
            card.column_id = "c2".into();
        }
        assert!(board.check_invariants().is_err());
    }

    #[test]
    fn invariant_rejects_placeholder_alongside_real_card() {
        let mut board = test_board(&[("c1", &["a"])]);
        let ph = PlaceholderCard::new("c1");
        board.columns[0].card_order.push(ph.id.clone());
        board.columns[0].cards.push(Card::Placeholder(ph));
        assert!(board.check_invariants().is_err());
    }

    #[test]
    fn invariant_rejects_card_in_two_columns() {
        let mut board = test_board(&[("c1", &["a"]), ("c2", &["b"])]);
        board.columns[1].card_order.push("a".into());
        board.columns[1].cards.push(Card::Real(RealCard::new(
            "a".into(),
            "c2".into(),
            "dup".into(),
        )));
        assert!(board.check_invariants().is_err());
    }
}
