//! In-memory FIFO queue feeding the single download worker
//!
//! The queue is the only structure touched from two execution contexts: the
//! gateway task appends and reads depth, the worker task pops. One mutex
//! covers append, length read, and pop, so the position returned by
//! [`JobQueue::enqueue`] is always consistent with the append that produced
//! it. Jobs are not persisted; a record lives only until its result is
//! reported.

use super::job::ClipJob;
use std::collections::VecDeque;
use tokio::sync::{Mutex, Notify};
use tracing::debug;

/// Consistent view of queue depth and the processing slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueStats {
    /// Jobs still waiting (excludes the one being processed)
    pub depth: usize,
    /// Whether the single processing slot is occupied
    pub processing: bool,
}

/// Unbounded FIFO of pending jobs plus a single processing slot.
pub struct JobQueue {
    inner: Mutex<Inner>,
    notify: Notify,
}

struct Inner {
    jobs: VecDeque<ClipJob>,
    processing: bool,
}

impl JobQueue {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                jobs: VecDeque::new(),
                processing: false,
            }),
            notify: Notify::new(),
        }
    }

    /// Append a job at the tail and return how many queued jobs sit strictly
    /// ahead of it. Zero means it is next up, though a job may still occupy
    /// the processing slot.
    pub async fn enqueue(&self, job: ClipJob) -> usize {
        let position = {
            let mut inner = self.inner.lock().await;
            let position = inner.jobs.len();
            inner.jobs.push_back(job);
            position
        };

        self.notify.notify_one();
        debug!(position, "Job enqueued");
        position
    }

    /// Count of jobs in `Queued` state. The processing slot is not included.
    pub async fn depth(&self) -> usize {
        self.inner.lock().await.jobs.len()
    }

    /// Depth and processing-slot state read under one lock.
    pub async fn stats(&self) -> QueueStats {
        let inner = self.inner.lock().await;
        QueueStats {
            depth: inner.jobs.len(),
            processing: inner.processing,
        }
    }

    /// Remove and return the head job, suspending until one is available.
    ///
    /// The processing slot is claimed in the same critical section as the
    /// pop. Only the worker loop calls this today, but the wakeup protocol
    /// (register interest, re-check, then wait) stays correct with more
    /// than one consumer.
    pub async fn dequeue_next(&self) -> ClipJob {
        loop {
            let notified = self.notify.notified();

            {
                let mut inner = self.inner.lock().await;
                if let Some(job) = inner.jobs.pop_front() {
                    inner.processing = true;
                    return job;
                }
            }

            notified.await;
        }
    }

    /// Release the processing slot after the current job reaches a terminal
    /// state.
    pub async fn finish_current(&self) {
        self.inner.lock().await.processing = false;
    }
}

impl Default for JobQueue {
    fn default() -> Self {
        Self::new()
    }
}
