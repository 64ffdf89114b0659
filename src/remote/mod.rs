//! REST boundary: the server is an opaque collaborator reached through a
//! whole-board fetch and three persist calls, one per reorder transition.

pub mod dispatch;

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::board::placeholder::{ensure_placeholder, real_card_order};
use crate::board::reorder::DropOutcome;
use crate::board::{Board, Card, Column, Priority, RealCard};
use crate::config::ClientConfig;

#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("board {0} not found on the server")]
    BoardNotFound(String),
    #[error("server returned {status} for {context}")]
    Status { context: String, status: u16 },
}

// ---------------------------------------------------------------------------
// Persist payloads
// ---------------------------------------------------------------------------

/// `PUT board/{boardId}` body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnOrderPayload {
    pub column_order_ids: Vec<String>,
    pub seq: u64,
}

/// `PUT column/{columnId}` body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardOrderPayload {
    pub card_order_ids: Vec<String>,
    pub seq: u64,
}

/// `PUT boards/supports/moving_card` body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveCardPayload {
    pub current_card_id: String,
    pub prev_column_id: String,
    pub prev_card_order_ids: Vec<String>,
    pub next_column_id: String,
    pub next_card_order_ids: Vec<String>,
    pub seq: u64,
}

/// One reconciliation call. Derived from an already-applied local reorder,
/// so order lists come from the new snapshot with placeholder ids filtered
/// out (an empty column persists as an empty list).
#[derive(Debug, Clone, PartialEq)]
pub enum Update {
    ColumnOrder {
        board_id: String,
        payload: ColumnOrderPayload,
    },
    CardOrder {
        column_id: String,
        payload: CardOrderPayload,
    },
    MoveCard(MoveCardPayload),
}

impl Update {
    /// The minimal persist call for a drop, computed against the board
    /// snapshot the reducer just produced. `seq` is the board's monotonic
    /// write counter; the server rejects stale sequence numbers, which
    /// closes the out-of-order-arrival gap between two rapid drags.
    pub fn from_drop(board: &Board, drop: &DropOutcome, seq: u64) -> Option<Update> {
        match drop {
            DropOutcome::ColumnReorder { .. } => Some(Update::ColumnOrder {
                board_id: board.id.clone(),
                payload: ColumnOrderPayload {
                    column_order_ids: board.column_order.clone(),
                    seq,
                },
            }),
            DropOutcome::CardReorder { column_id, .. } => {
                let col = board.column(column_id)?;
                Some(Update::CardOrder {
                    column_id: column_id.clone(),
                    payload: CardOrderPayload {
                        card_order_ids: real_card_order(col),
                        seq,
                    },
                })
            }
            DropOutcome::CardMove {
                card_id,
                source_column_id,
                target_column_id,
                ..
            } => {
                let source = board.column(source_column_id)?;
                let target = board.column(target_column_id)?;
                Some(Update::MoveCard(MoveCardPayload {
                    current_card_id: card_id.clone(),
                    prev_column_id: source_column_id.clone(),
                    prev_card_order_ids: real_card_order(source),
                    next_column_id: target_column_id.clone(),
                    next_card_order_ids: real_card_order(target),
                    seq,
                }))
            }
        }
    }

    pub fn seq(&self) -> u64 {
        match self {
            Update::ColumnOrder { payload, .. } => payload.seq,
            Update::CardOrder { payload, .. } => payload.seq,
            Update::MoveCard(payload) => payload.seq,
        }
    }

    /// Short label for logs and notifications.
    pub fn describe(&self) -> &'static str {
        match self {
            Update::ColumnOrder { .. } => "column order",
            Update::CardOrder { .. } => "card order",
            Update::MoveCard(_) => "card move",
        }
    }
}

// ---------------------------------------------------------------------------
// Wire representation of a fetched board
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BoardDto {
    id: String,
    #[serde(default)]
    column_order_ids: Vec<String>,
    #[serde(default)]
    columns: Vec<ColumnDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ColumnDto {
    id: String,
    board_id: String,
    title: String,
    #[serde(default)]
    card_order_ids: Vec<String>,
    #[serde(default)]
    cards: Vec<CardDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CardDto {
    id: String,
    title: String,
    #[serde(default)]
    priority: Priority,
    created: Option<DateTime<Utc>>,
    updated: Option<DateTime<Utc>>,
}

impl BoardDto {
    /// Normalize into the client order cache: order lists are rebuilt to be
    /// permutations even if the server response is ragged (ids missing from
    /// an order list land at the end), and empty columns get their
    /// placeholder.
    fn into_board(self) -> Board {
        let columns: Vec<Column> = self.columns.into_iter().map(ColumnDto::into_column).collect();
        let mut column_order: Vec<String> = self
            .column_order_ids
            .into_iter()
            .filter(|id| columns.iter().any(|c| c.id == *id))
            .collect();
        for col in &columns {
            if !column_order.contains(&col.id) {
                column_order.push(col.id.clone());
            }
        }
        let columns = column_order
            .iter()
            .map(|id| {
                columns
                    .iter()
                    .find(|c| c.id == *id)
                    .cloned()
                    .expect("column_order built from columns")
            })
            .collect();
        Board {
            id: self.id,
            column_order,
            columns,
        }
    }
}

impl ColumnDto {
    fn into_column(self) -> Column {
        let mut cards: Vec<Card> = Vec::with_capacity(self.cards.len());
        let mut remaining: Vec<CardDto> = self.cards;
        for id in &self.card_order_ids {
            if let Some(pos) = remaining.iter().position(|c| c.id == *id) {
                cards.push(remaining.remove(pos).into_card(&self.id));
            }
        }
        for dto in remaining {
            cards.push(dto.into_card(&self.id));
        }
        let card_order = cards.iter().map(|c| c.id().to_string()).collect();
        let mut col = Column {
            id: self.id,
            board_id: self.board_id,
            title: self.title,
            card_order,
            cards,
        };
        ensure_placeholder(&mut col);
        col
    }
}

impl CardDto {
    fn into_card(self, column_id: &str) -> Card {
        let now = Utc::now();
        Card::Real(RealCard {
            id: self.id,
            column_id: column_id.to_string(),
            title: self.title,
            priority: self.priority,
            created: self.created.unwrap_or(now),
            updated: self.updated.unwrap_or(now),
        })
    }
}

// ---------------------------------------------------------------------------
// HTTP client
// ---------------------------------------------------------------------------

/// Blocking HTTP client over the board API. Cheap to clone-and-move into the
/// dispatcher worker; the UI thread only uses it for the initial fetch.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::blocking::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self, RemoteError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn authorize(
        &self,
        req: reqwest::blocking::RequestBuilder,
    ) -> reqwest::blocking::RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    /// Fetch the whole board. Placeholder synthesis runs as part of
    /// normalization, so the returned record already satisfies the order
    /// cache invariants.
    pub fn fetch_board(&self, board_id: &str) -> Result<Board, RemoteError> {
        let url = self.url(&format!("board/{board_id}"));
        tracing::debug!(%url, "fetching board");
        let resp = self.authorize(self.http.get(&url)).send()?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(RemoteError::BoardNotFound(board_id.to_string()));
        }
        if !resp.status().is_success() {
            return Err(RemoteError::Status {
                context: format!("GET board/{board_id}"),
                status: resp.status().as_u16(),
            });
        }
        let dto: BoardDto = resp.json()?;
        Ok(dto.into_board())
    }

    /// Issue one persist call. Called from the dispatcher worker, never from
    /// the thread owning the board.
    pub fn push(&self, update: &Update) -> Result<(), RemoteError> {
        let (context, resp) = match update {
            Update::ColumnOrder { board_id, payload } => {
                let path = format!("board/{board_id}");
                let resp = self
                    .authorize(self.http.put(self.url(&path)))
                    .json(payload)
                    .send()?;
                (path, resp)
            }
            Update::CardOrder { column_id, payload } => {
                let path = format!("column/{column_id}");
                let resp = self
                    .authorize(self.http.put(self.url(&path)))
                    .json(payload)
                    .send()?;
                (path, resp)
            }
            Update::MoveCard(payload) => {
                let path = "boards/supports/moving_card".to_string();
                let resp = self
                    .authorize(self.http.put(self.url(&path)))
                    .json(payload)
                    .send()?;
                (path, resp)
            }
        };
        if !resp.status().is_success() {
            return Err(RemoteError::Status {
                context: format!("PUT {context}"),
                status: resp.status().as_u16(),
            });
        }
        Ok(())
    }
}
