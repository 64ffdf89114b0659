//! Application state: the open board, its optimistic snapshot history, and
//! the notification line.

use std::time::{Duration, Instant};

use crate::board::reorder::{self, DropOutcome};
use crate::board::Board;
use crate::remote::dispatch::{DispatchOutcome, Dispatcher};
use crate::remote::Update;

/// Notification severity for statusbar coloring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Error,
}

/// Global application state.
pub struct AppState {
    /// The open board, replaced wholesale on every accepted drop.
    pub board: Option<Board>,
    /// Monotonic sequence number stamped into each persist payload; the
    /// server rejects writes carrying a smaller value than it last saw.
    seq: u64,
    dispatcher: Option<Dispatcher>,
    pub notification: Option<String>,
    pub notification_level: NotificationLevel,
    pub notification_expires: Option<Instant>,
}

impl AppState {
    pub fn new(dispatcher: Option<Dispatcher>) -> Self {
        Self {
            board: None,
            seq: 0,
            dispatcher,
            notification: None,
            notification_level: NotificationLevel::Info,
            notification_expires: None,
        }
    }

    /// Make a freshly fetched board the open one. Resets the persist
    /// sequence: numbering is per board session.
    pub fn open_board(&mut self, board: Board) {
        self.board = Some(board);
        self.seq = 0;
    }

    /// Discard the open board. Local reorder state is not kept around; the
    /// next open refetches from the server.
    pub fn close_board(&mut self) {
        self.board = None;
        self.seq = 0;
    }

    /// Apply a completed drop to the open board. On success the new snapshot
    /// replaces the old one and a persist call is queued; on rejection
    /// nothing changes and `false` comes back.
    pub fn handle_drop(&mut self, drop: &DropOutcome) -> bool {
        let Some(board) = &self.board else {
            return false;
        };
        let Some(next) = reorder::apply(board, drop) else {
            tracing::debug!("drop rejected, board unchanged");
            return false;
        };
        self.seq += 1;
        if let Some(update) = Update::from_drop(&next, drop, self.seq) {
            if let Some(dispatcher) = &self.dispatcher {
                dispatcher.enqueue(update);
            }
        }
        self.board = Some(next);
        true
    }

    /// Show a transient notification.
    pub fn notify(&mut self, msg: impl Into<String>) {
        self.notification = Some(msg.into());
        self.notification_level = NotificationLevel::Info;
        self.notification_expires = Some(Instant::now() + Duration::from_secs(3));
    }

    /// Show a transient error notification (rendered in red).
    pub fn notify_error(&mut self, msg: impl Into<String>) {
        self.notification = Some(msg.into());
        self.notification_level = NotificationLevel::Error;
        self.notification_expires = Some(Instant::now() + Duration::from_secs(3));
    }

    /// Clear expired notifications.
    pub fn tick_notification(&mut self) {
        if let Some(expires) = self.notification_expires {
            if Instant::now() >= expires {
                self.notification = None;
                self.notification_level = NotificationLevel::Info;
                self.notification_expires = None;
            }
        }
    }

    /// Per-frame upkeep: expire the notification line and surface any
    /// persist outcomes that came back from the dispatcher. Failures only
    /// notify; the optimistic snapshot stays.
    pub fn tick(&mut self) {
        self.tick_notification();
        let outcomes = match &self.dispatcher {
            Some(d) => d.poll(),
            None => return,
        };
        for outcome in outcomes {
            match outcome {
                DispatchOutcome::Persisted { .. } => {}
                DispatchOutcome::Failed { what, error, .. } => {
                    self.notify_error(format!("Saving {what} failed: {error}"));
                }
            }
        }
    }

    /// Take the dispatcher out for a final drain before exit.
    pub fn take_dispatcher(&mut self) -> Option<Dispatcher> {
        self.dispatcher.take()
    }
}
