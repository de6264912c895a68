//! Single sequential download worker
//!
//! One long-lived task owns the only concurrency slot: it dequeues a job,
//! runs the fetch operation, reports the terminal outcome through the
//! gateway, and refreshes presence. Downloads never overlap, which bounds
//! bandwidth and disk contention by construction and keeps completion order
//! equal to submission order.

pub mod fetch;

use crate::gateway::Gateway;
use crate::observability::Metrics;
use crate::queue::{ClipJob, JobOutcome, JobQueue};
use crate::status::StatusNotifier;
use crate::storage::FileStore;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

pub use fetch::{FetchError, FetchedClip, Fetcher, HttpFetcher};

pub struct Worker {
    queue: Arc<JobQueue>,
    store: Arc<FileStore>,
    fetcher: Arc<dyn Fetcher>,
    gateway: Arc<dyn Gateway>,
    status: Arc<StatusNotifier>,
    metrics: Arc<Metrics>,
    public_base_url: String,
    job_timeout: Duration,
}

impl Worker {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        queue: Arc<JobQueue>,
        store: Arc<FileStore>,
        fetcher: Arc<dyn Fetcher>,
        gateway: Arc<dyn Gateway>,
        status: Arc<StatusNotifier>,
        metrics: Arc<Metrics>,
        public_base_url: impl Into<String>,
        job_timeout: Duration,
    ) -> Self {
        Self {
            queue,
            store,
            fetcher,
            gateway,
            status,
            metrics,
            public_base_url: public_base_url.into(),
            job_timeout,
        }
    }

    /// Run forever, processing jobs strictly in arrival order.
    ///
    /// Every per-job fault is absorbed inside [`Worker::attempt`]; nothing a
    /// single job does can stop the loop or starve the jobs behind it.
    pub async fn run(self) {
        info!("Worker ready, waiting for requests");

        loop {
            let mut job = self.queue.dequeue_next().await;
            job.mark_processing();
            self.status.refresh(self.queue.stats().await);

            info!(job_id = %job.id, url = %job.source_url, "Processing clip");

            let outcome = self.attempt(&job).await;
            job.mark_terminal(&outcome);

            match &outcome {
                JobOutcome::Succeeded { file_name, .. } => {
                    self.metrics.clip_stored();
                    info!(job_id = %job.id, file = %file_name, "Clip ready");
                }
                JobOutcome::Failed { reason } => {
                    self.metrics.clip_failed();
                    self.store.discard_staging(job.id).await;
                    warn!(job_id = %job.id, %reason, "Clip failed");
                }
            }

            self.gateway
                .post_result(&job.requester, job.id, &outcome)
                .await;

            self.queue.finish_current().await;
            self.status.refresh(self.queue.stats().await);
        }
    }

    /// One bounded fetch attempt, isolated in its own task.
    ///
    /// The spawn gives a per-job fault boundary: a panic inside the fetch
    /// surfaces as a join error and becomes a `Failed` outcome instead of
    /// killing the loop. The timeout turns a hung fetch into `Failed` too.
    async fn attempt(&self, job: &ClipJob) -> JobOutcome {
        let fetcher = Arc::clone(&self.fetcher);
        let store = Arc::clone(&self.store);
        let job_id = job.id;
        let url = job.source_url.clone();
        let job_timeout = self.job_timeout;

        let task = tokio::spawn(async move {
            tokio::time::timeout(job_timeout, fetcher.fetch(job_id, &url, &store)).await
        });

        match task.await {
            Ok(Ok(Ok(clip))) => JobOutcome::Succeeded {
                public_url: format!("{}/{}", self.public_base_url, clip.file_name),
                file_name: clip.file_name,
            },
            Ok(Ok(Err(err))) => {
                // storage faults likely affect every later job too
                if let FetchError::Storage(source) = &err {
                    error!(%job_id, error = %source, "Clip storage failed");
                } else {
                    warn!(%job_id, error = %err, "Clip fetch failed");
                }
                JobOutcome::Failed {
                    reason: err.to_string(),
                }
            }
            Ok(Err(_elapsed)) => {
                warn!(%job_id, timeout_secs = job_timeout.as_secs(), "Clip fetch timed out");
                JobOutcome::Failed {
                    reason: format!("timed out after {}s", job_timeout.as_secs()),
                }
            }
            Err(join_err) => {
                error!(%job_id, error = %join_err, "Clip task aborted unexpectedly");
                JobOutcome::Failed {
                    reason: "internal error while processing the clip".to_string(),
                }
            }
        }
    }
}
