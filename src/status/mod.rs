//! Presence text derived from queue depth and worker activity
//!
//! The broadcast line is a pure projection of `(worker state, queue depth)`
//! recomputed after every enqueue and every worker transition. It is never
//! stored independently of the underlying counts, so it cannot drift.

use crate::queue::QueueStats;
use tokio::sync::watch;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    Busy,
}

/// Render the presence line for a worker state and waiting count.
pub fn presence_line(state: WorkerState, waiting: usize) -> String {
    match state {
        WorkerState::Busy => format!("processing (and {} waiting)", waiting),
        WorkerState::Idle => "awaiting new requests".to_string(),
    }
}

/// Broadcasts the presence line over a watch channel.
///
/// Fire-and-forget: external presence surfaces (the chat platform's activity
/// display) subscribe to the receiver; nothing in the pipeline waits on them.
pub struct StatusNotifier {
    tx: watch::Sender<String>,
}

impl StatusNotifier {
    pub fn new() -> (Self, watch::Receiver<String>) {
        let (tx, rx) = watch::channel(presence_line(WorkerState::Idle, 0));
        (Self { tx }, rx)
    }

    /// Recompute the presence line from a queue snapshot and broadcast it.
    ///
    /// A non-empty queue with a free processing slot is only ever observed
    /// in the window before the worker claims the head, so it projects to
    /// `Busy` with the head job excluded from the waiting count.
    pub fn refresh(&self, stats: QueueStats) {
        let line = if stats.processing {
            presence_line(WorkerState::Busy, stats.depth)
        } else if stats.depth > 0 {
            presence_line(WorkerState::Busy, stats.depth - 1)
        } else {
            presence_line(WorkerState::Idle, 0)
        };

        debug!(%line, depth = stats.depth, processing = stats.processing, "Presence updated");
        self.tx.send_replace(line);
    }

    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.tx.subscribe()
    }

    /// Current presence line without subscribing.
    pub fn current(&self) -> String {
        self.tx.borrow().clone()
    }
}
