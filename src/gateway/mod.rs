//! Request gateway: the seam between the chat platform and the pipeline
//!
//! The chat client itself is an external collaborator. Inbound, it hands
//! submitted links to [`Submitter::submit`] and relays the synchronous
//! acknowledgement. Outbound, the worker calls [`Gateway::post_result`]
//! exactly once per job with the terminal outcome.

pub mod validation;

use crate::observability::Metrics;
use crate::queue::{ClipJob, JobOutcome, JobQueue, RequesterRef};
use crate::status::StatusNotifier;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

pub use validation::{ShareUrlError, validate_share_url};

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("invalid share link: {0}")]
    InvalidUrl(#[from] ShareUrlError),
}

/// Immediate, requester-only acknowledgement returned at submission time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ack {
    /// Nothing queued ahead; the worker picks this up next
    Starting,
    /// `ahead` jobs queued in front (always >= 1)
    Queued { ahead: usize },
}

impl Ack {
    pub fn message(&self) -> String {
        match self {
            Ack::Starting => "working on your clip now".to_string(),
            Ack::Queued { ahead: 1 } => "you're in line, 1 clip ahead of you".to_string(),
            Ack::Queued { ahead } => format!("you're in line, {ahead} clips ahead of you"),
        }
    }
}

/// Outbound result delivery, implemented by the chat adapter.
///
/// Called exactly once per job on terminal state. Delivery is best-effort;
/// failures must not propagate back into the worker loop.
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn post_result(&self, requester: &RequesterRef, job_id: Uuid, outcome: &JobOutcome);
}

/// Render the public result message for the originating channel.
pub fn result_message(requester: &RequesterRef, outcome: &JobOutcome) -> String {
    match outcome {
        JobOutcome::Succeeded { public_url, .. } => {
            format!("{} sent a clip: {}", requester.mention(), public_url)
        }
        JobOutcome::Failed { reason } => {
            format!("{} your clip could not be fetched: {}", requester.mention(), reason)
        }
    }
}

/// Inbound submission path: validate, enqueue, acknowledge.
pub struct Submitter {
    queue: Arc<JobQueue>,
    status: Arc<StatusNotifier>,
    metrics: Arc<Metrics>,
}

impl Submitter {
    pub fn new(queue: Arc<JobQueue>, status: Arc<StatusNotifier>, metrics: Arc<Metrics>) -> Self {
        Self {
            queue,
            status,
            metrics,
        }
    }

    /// Accept or reject one submitted link.
    ///
    /// Rejection happens synchronously before a job record exists: the queue
    /// and the presence line are untouched. On acceptance the position-ahead
    /// count is computed atomically with the append, so the acknowledgement
    /// can never disagree with the queue order.
    pub async fn submit(
        &self,
        url: &str,
        requester: RequesterRef,
    ) -> Result<Ack, SubmitError> {
        let url = url.trim();

        if let Err(err) = validate_share_url(url) {
            self.metrics.submission_rejected();
            return Err(SubmitError::InvalidUrl(err));
        }

        let job = ClipJob::new(url, requester);
        info!(job_id = %job.id, url, "Share link accepted");

        let ahead = self.queue.enqueue(job).await;
        self.metrics.submission_accepted();
        self.status.refresh(self.queue.stats().await);

        Ok(if ahead == 0 {
            Ack::Starting
        } else {
            Ack::Queued { ahead }
        })
    }
}

/// In-process gateway that delivers results to the structured log.
///
/// Stands in for the chat adapter when none is connected.
#[derive(Debug, Default)]
pub struct LogGateway;

impl LogGateway {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Gateway for LogGateway {
    async fn post_result(&self, requester: &RequesterRef, job_id: Uuid, outcome: &JobOutcome) {
        info!(
            %job_id,
            channel = %requester.channel,
            message = %result_message(requester, outcome),
            "Result posted"
        );
    }
}
