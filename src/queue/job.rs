//! Job record model for the download pipeline

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Opaque handle back to the invoking chat context.
///
/// Carries enough identity to address both the ephemeral acknowledgement
/// (requester-only) and the public terminal result (originating channel).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequesterRef {
    pub channel: String,
    pub user: String,
}

impl RequesterRef {
    pub fn new(channel: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            user: user.into(),
        }
    }

    /// Mention text placed in the public result message
    pub fn mention(&self) -> String {
        format!("@{}", self.user)
    }
}

/// Lifecycle state of one clip job.
///
/// Transitions are monotonic: `Queued → Processing → {Succeeded, Failed}`.
/// A job never re-enters `Queued` once dequeued (no retry loop).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Queued,
    Processing,
    Succeeded,
    Failed,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Succeeded | JobState::Failed)
    }
}

/// Terminal result of a job, populated exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Succeeded { file_name: String, public_url: String },
    Failed { reason: String },
}

/// One accepted request to fetch and host a single remote clip.
///
/// Created by the submission path after link validation, owned by the queue
/// until dequeued, then by the worker until its result is reported. Records
/// are discarded afterwards; only the stored file survives.
#[derive(Debug, Clone)]
pub struct ClipJob {
    pub id: Uuid,
    pub source_url: String,
    pub requester: RequesterRef,
    pub submitted_at: DateTime<Utc>,
    pub state: JobState,
}

impl ClipJob {
    pub fn new(source_url: impl Into<String>, requester: RequesterRef) -> Self {
        Self {
            id: Uuid::new_v4(),
            source_url: source_url.into(),
            requester,
            submitted_at: Utc::now(),
            state: JobState::Queued,
        }
    }

    pub fn mark_processing(&mut self) {
        debug_assert_eq!(self.state, JobState::Queued);
        self.state = JobState::Processing;
    }

    pub fn mark_terminal(&mut self, outcome: &JobOutcome) {
        debug_assert_eq!(self.state, JobState::Processing);
        self.state = match outcome {
            JobOutcome::Succeeded { .. } => JobState::Succeeded,
            JobOutcome::Failed { .. } => JobState::Failed,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_job_is_queued_with_unique_id() {
        let requester = RequesterRef::new("general", "alice");
        let a = ClipJob::new("https://cdn.example.com/ugc/1", requester.clone());
        let b = ClipJob::new("https://cdn.example.com/ugc/1", requester);

        assert_eq!(a.state, JobState::Queued);
        assert!(!a.state.is_terminal());
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_state_transitions() {
        let mut job = ClipJob::new(
            "https://cdn.example.com/ugc/1",
            RequesterRef::new("general", "alice"),
        );

        job.mark_processing();
        assert_eq!(job.state, JobState::Processing);

        job.mark_terminal(&JobOutcome::Failed {
            reason: "network error".to_string(),
        });
        assert_eq!(job.state, JobState::Failed);
        assert!(job.state.is_terminal());
    }

    #[test]
    fn test_mention_format() {
        let requester = RequesterRef::new("clips", "bob");
        assert_eq!(requester.mention(), "@bob");
    }
}
