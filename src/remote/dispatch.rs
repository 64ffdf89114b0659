//! Reconciliation dispatcher: persists reorders without blocking the UI.
//!
//! Updates are queued onto a channel consumed by a single worker thread that
//! owns the HTTP client. The enqueueing side never waits: the optimistic
//! local state is already visible when the call goes out. Outcomes flow back
//! over a second channel and surface as notifications; a failed call does
//! not roll local state back (the stamped sequence number lets the server
//! reject stale writes instead).

use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
use std::thread::JoinHandle;

use tracing::{debug, warn};

use super::{ApiClient, RemoteError, Update};

/// Result of one reconciliation attempt.
#[derive(Debug)]
pub enum DispatchOutcome {
    Persisted { seq: u64, what: &'static str },
    Failed {
        seq: u64,
        what: &'static str,
        error: RemoteError,
    },
}

/// Owns the worker thread. Dropping (or draining) the dispatcher closes the
/// queue and joins the worker after it finishes any in-flight call.
pub struct Dispatcher {
    tx: Option<Sender<Update>>,
    results: Receiver<DispatchOutcome>,
    worker: Option<JoinHandle<()>>,
}

impl Dispatcher {
    pub fn spawn(client: ApiClient) -> Self {
        let (tx, rx) = channel::<Update>();
        let (result_tx, results) = channel();
        let worker = std::thread::spawn(move || worker_loop(client, rx, result_tx));
        Self {
            tx: Some(tx),
            results,
            worker: Some(worker),
        }
    }

    /// Queue a persist call. Fire-and-forget: returns immediately, and a
    /// dispatcher that has already shut down silently drops the update.
    pub fn enqueue(&self, update: Update) {
        debug!(seq = update.seq(), what = update.describe(), "enqueue persist");
        if let Some(tx) = &self.tx {
            let _ = tx.send(update);
        }
    }

    /// Collect any outcomes that have arrived, without blocking.
    pub fn poll(&self) -> Vec<DispatchOutcome> {
        let mut out = Vec::new();
        loop {
            match self.results.try_recv() {
                Ok(outcome) => out.push(outcome),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        out
    }

    /// Close the queue, wait for the worker to flush every pending call, and
    /// return all remaining outcomes. For one-shot CLI runs that must not
    /// exit before the persist has gone out.
    pub fn drain(mut self) -> Vec<DispatchOutcome> {
        self.tx.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
        let mut out = Vec::new();
        while let Ok(outcome) = self.results.try_recv() {
            out.push(outcome);
        }
        out
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        self.tx.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn worker_loop(client: ApiClient, rx: Receiver<Update>, results: Sender<DispatchOutcome>) {
    for update in rx {
        let seq = update.seq();
        let what = update.describe();
        let outcome = match client.push(&update) {
            Ok(()) => {
                debug!(seq, what, "persisted");
                DispatchOutcome::Persisted { seq, what }
            }
            Err(error) => {
                warn!(seq, what, %error, "persist failed");
                DispatchOutcome::Failed { seq, what, error }
            }
        };
        // The receiving side may be gone (view unmounted); keep flushing.
        let _ = results.send(outcome);
    }
}
