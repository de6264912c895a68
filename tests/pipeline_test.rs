//! Full-pipeline scenario tests: submission, ordering, status, failures
//!
//! A scripted fetcher stands in for the network and a recording gateway
//! captures the terminal results, so every ordering and status property can
//! be asserted deterministically.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::{Mutex, Semaphore, mpsc, watch};
use tokio::time::timeout;
use uuid::Uuid;

use clipshare::api::{router, state::AppState};
use clipshare::config::Config;
use clipshare::gateway::{Ack, Gateway, SubmitError, Submitter};
use clipshare::observability::Metrics;
use clipshare::queue::{JobOutcome, JobQueue, RequesterRef};
use clipshare::status::StatusNotifier;
use clipshare::storage::FileStore;
use clipshare::worker::{FetchError, FetchedClip, Fetcher, Worker};

const URL_A: &str = "https://cdn.steamusercontent.com/ugc/100/aaaa";
const URL_B: &str = "https://cdn.steamusercontent.com/ugc/200/bbbb";
const URL_C: &str = "https://cdn.steamusercontent.com/ugc/300/cccc";

enum Script {
    Succeed {
        bytes: &'static [u8],
        delay: Duration,
    },
    Fail(&'static str),
    Hang,
}

/// Fetcher scripted per URL; each fetch consumes one gate permit before
/// doing anything, so tests can hold jobs in flight deliberately.
struct ScriptedFetcher {
    scripts: Mutex<HashMap<&'static str, Script>>,
    gate: Arc<Semaphore>,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl ScriptedFetcher {
    fn new(scripts: Vec<(&'static str, Script)>, gate: Arc<Semaphore>) -> Self {
        Self {
            scripts: Mutex::new(scripts.into_iter().collect()),
            gate,
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
        }
    }

    fn max_concurrent_fetches(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(
        &self,
        job_id: Uuid,
        url: &str,
        store: &FileStore,
    ) -> Result<FetchedClip, FetchError> {
        self.gate.acquire().await.unwrap().forget();

        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(active, Ordering::SeqCst);

        let script = self
            .scripts
            .lock()
            .await
            .remove(url)
            .expect("fetch called with an unscripted url");

        let result = match script {
            Script::Succeed { bytes, delay } => {
                tokio::time::sleep(delay).await;
                let mut staging = store.begin(job_id).await?;
                staging.write_chunk(bytes).await?;
                let file_name = staging.publish(job_id, "mp4").await?;
                Ok(FetchedClip {
                    file_name,
                    bytes: bytes.len() as u64,
                })
            }
            Script::Fail(reason) => Err(FetchError::RequestFailed(reason.to_string())),
            Script::Hang => {
                std::future::pending::<()>().await;
                unreachable!()
            }
        };

        self.active.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

struct RecordingGateway {
    tx: mpsc::UnboundedSender<(RequesterRef, Uuid, JobOutcome)>,
}

#[async_trait]
impl Gateway for RecordingGateway {
    async fn post_result(&self, requester: &RequesterRef, job_id: Uuid, outcome: &JobOutcome) {
        let _ = self.tx.send((requester.clone(), job_id, outcome.clone()));
    }
}

struct Pipeline {
    submitter: Submitter,
    queue: Arc<JobQueue>,
    store: Arc<FileStore>,
    status_rx: watch::Receiver<String>,
    results: mpsc::UnboundedReceiver<(RequesterRef, Uuid, JobOutcome)>,
    fetcher: Arc<ScriptedFetcher>,
    gate: Arc<Semaphore>,
    worker: Option<Worker>,
    _temp_dir: TempDir,
}

impl Pipeline {
    /// Build the whole pipeline around a scripted fetcher. The worker is
    /// constructed but not yet running; tests start it when their
    /// submissions are in place.
    async fn build(
        scripts: Vec<(&'static str, Script)>,
        gate_permits: usize,
        job_timeout: Duration,
    ) -> Self {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(FileStore::open(temp_dir.path()).await.unwrap());
        let queue = Arc::new(JobQueue::new());
        let (status, status_rx) = StatusNotifier::new();
        let status = Arc::new(status);
        let metrics = Arc::new(Metrics::new());

        let gate = Arc::new(Semaphore::new(gate_permits));
        let fetcher = Arc::new(ScriptedFetcher::new(scripts, gate.clone()));

        let (tx, results) = mpsc::unbounded_channel();
        let gateway = Arc::new(RecordingGateway { tx });

        let worker = Worker::new(
            queue.clone(),
            store.clone(),
            fetcher.clone(),
            gateway,
            status.clone(),
            metrics.clone(),
            "https://clips.example.com",
            job_timeout,
        );

        Self {
            submitter: Submitter::new(queue.clone(), status, metrics),
            queue,
            store,
            status_rx,
            results,
            fetcher,
            gate,
            worker: Some(worker),
            _temp_dir: temp_dir,
        }
    }

    fn start_worker(&mut self) {
        let worker = self.worker.take().expect("worker already started");
        tokio::spawn(worker.run());
    }

    async fn submit(&self, url: &str, user: &str) -> Result<Ack, SubmitError> {
        self.submitter
            .submit(url, RequesterRef::new("clips", user))
            .await
    }

    async fn next_result(&mut self) -> (RequesterRef, Uuid, JobOutcome) {
        timeout(Duration::from_secs(2), self.results.recv())
            .await
            .expect("timed out waiting for a job result")
            .expect("result channel closed")
    }

    async fn wait_for_status(&mut self, expected: &str) {
        let rx = &mut self.status_rx;
        timeout(Duration::from_secs(2), async {
            loop {
                if *rx.borrow_and_update() == expected {
                    return;
                }
                rx.changed().await.unwrap();
            }
        })
        .await
        .unwrap_or_else(|_| panic!("status never became '{expected}'"));
    }
}

#[tokio::test]
async fn test_acks_and_fifo_completion_order() {
    let mut pipeline = Pipeline::build(
        vec![
            (
                URL_A,
                Script::Succeed {
                    bytes: b"clip a",
                    delay: Duration::from_millis(30),
                },
            ),
            (
                URL_B,
                Script::Succeed {
                    bytes: b"clip b",
                    delay: Duration::ZERO,
                },
            ),
        ],
        100,
        Duration::from_secs(5),
    )
    .await;

    // both submitted before any processing starts
    let ack_a = pipeline.submit(URL_A, "alice").await.unwrap();
    let ack_b = pipeline.submit(URL_B, "bob").await.unwrap();
    assert_eq!(ack_a, Ack::Starting);
    assert_eq!(ack_b, Ack::Queued { ahead: 1 });
    assert_eq!(ack_b.message(), "you're in line, 1 clip ahead of you");

    pipeline.start_worker();

    // A completes first even though B's fetch is faster
    let (requester, _, outcome) = pipeline.next_result().await;
    assert_eq!(requester.user, "alice");
    assert!(matches!(outcome, JobOutcome::Succeeded { .. }));

    let (requester, _, outcome) = pipeline.next_result().await;
    assert_eq!(requester.user, "bob");
    match outcome {
        JobOutcome::Succeeded { file_name, .. } => {
            let content = tokio::fs::read(pipeline.store.resolve(&file_name).unwrap())
                .await
                .unwrap();
            assert_eq!(content, b"clip b");
        }
        other => panic!("expected success, got {other:?}"),
    }
}

#[tokio::test]
async fn test_downloads_never_overlap() {
    let mut pipeline = Pipeline::build(
        vec![
            (
                URL_A,
                Script::Succeed {
                    bytes: b"a",
                    delay: Duration::from_millis(10),
                },
            ),
            (
                URL_B,
                Script::Succeed {
                    bytes: b"b",
                    delay: Duration::from_millis(10),
                },
            ),
            (
                URL_C,
                Script::Succeed {
                    bytes: b"c",
                    delay: Duration::from_millis(10),
                },
            ),
        ],
        100,
        Duration::from_secs(5),
    )
    .await;

    pipeline.submit(URL_A, "alice").await.unwrap();
    pipeline.submit(URL_B, "bob").await.unwrap();
    pipeline.submit(URL_C, "carol").await.unwrap();
    pipeline.start_worker();

    let mut users = Vec::new();
    for _ in 0..3 {
        let (requester, _, outcome) = pipeline.next_result().await;
        assert!(matches!(outcome, JobOutcome::Succeeded { .. }));
        users.push(requester.user);
    }

    assert_eq!(users, ["alice", "bob", "carol"]);
    assert_eq!(pipeline.fetcher.max_concurrent_fetches(), 1);
}

#[tokio::test]
async fn test_invalid_url_has_no_side_effects() {
    let pipeline = Pipeline::build(vec![], 100, Duration::from_secs(5)).await;

    let result = pipeline.submit("https://example.com/clip.mp4", "mallory").await;
    assert!(matches!(result, Err(SubmitError::InvalidUrl(_))));

    assert_eq!(pipeline.queue.depth().await, 0);
    assert_eq!(*pipeline.status_rx.borrow(), "awaiting new requests");
    assert_eq!(pipeline.store.file_count().await, 0);
}

#[tokio::test]
async fn test_failed_fetch_reports_and_next_job_processes() {
    let mut pipeline = Pipeline::build(
        vec![
            (URL_A, Script::Fail("source expired")),
            (
                URL_B,
                Script::Succeed {
                    bytes: b"still fine",
                    delay: Duration::ZERO,
                },
            ),
        ],
        100,
        Duration::from_secs(5),
    )
    .await;

    pipeline.submit(URL_A, "alice").await.unwrap();
    pipeline.submit(URL_B, "bob").await.unwrap();
    pipeline.start_worker();

    let (requester, _, outcome) = pipeline.next_result().await;
    assert_eq!(requester.user, "alice");
    match outcome {
        JobOutcome::Failed { reason } => assert!(reason.contains("source expired")),
        other => panic!("expected failure, got {other:?}"),
    }

    let (requester, _, outcome) = pipeline.next_result().await;
    assert_eq!(requester.user, "bob");
    assert!(matches!(outcome, JobOutcome::Succeeded { .. }));

    // only the successful clip is on disk
    assert_eq!(pipeline.store.file_count().await, 1);
}

#[tokio::test]
async fn test_hung_fetch_times_out_and_pipeline_continues() {
    let mut pipeline = Pipeline::build(
        vec![
            (URL_A, Script::Hang),
            (
                URL_B,
                Script::Succeed {
                    bytes: b"after the hang",
                    delay: Duration::ZERO,
                },
            ),
        ],
        100,
        Duration::from_millis(50),
    )
    .await;

    pipeline.submit(URL_A, "alice").await.unwrap();
    pipeline.submit(URL_B, "bob").await.unwrap();
    pipeline.start_worker();

    let (requester, job_id, outcome) = pipeline.next_result().await;
    assert_eq!(requester.user, "alice");
    match outcome {
        JobOutcome::Failed { reason } => assert!(reason.contains("timed out")),
        other => panic!("expected timeout failure, got {other:?}"),
    }
    // nothing retrievable under the failed job's id
    assert!(pipeline
        .store
        .resolve(&format!("{job_id}.mp4"))
        .map(|p| !p.exists())
        .unwrap_or(true));

    let (requester, _, outcome) = pipeline.next_result().await;
    assert_eq!(requester.user, "bob");
    assert!(matches!(outcome, JobOutcome::Succeeded { .. }));
}

#[tokio::test]
async fn test_status_walk_through_a_busy_spell() {
    let mut pipeline = Pipeline::build(
        vec![
            (
                URL_A,
                Script::Succeed {
                    bytes: b"a",
                    delay: Duration::ZERO,
                },
            ),
            (
                URL_B,
                Script::Succeed {
                    bytes: b"b",
                    delay: Duration::ZERO,
                },
            ),
        ],
        0, // gate closed: jobs wait until the test releases them
        Duration::from_secs(5),
    )
    .await;

    pipeline.start_worker();
    assert_eq!(*pipeline.status_rx.borrow(), "awaiting new requests");

    pipeline.submit(URL_A, "alice").await.unwrap();
    pipeline.wait_for_status("processing (and 0 waiting)").await;

    pipeline.submit(URL_B, "bob").await.unwrap();
    pipeline.wait_for_status("processing (and 1 waiting)").await;

    pipeline.gate.add_permits(1);
    pipeline.next_result().await;
    pipeline.wait_for_status("processing (and 0 waiting)").await;

    pipeline.gate.add_permits(1);
    pipeline.next_result().await;
    pipeline.wait_for_status("awaiting new requests").await;
}

#[tokio::test]
async fn test_succeeded_clip_is_served_byte_identical() {
    let mut pipeline = Pipeline::build(
        vec![(
            URL_A,
            Script::Succeed {
                bytes: b"the whole clip, byte for byte",
                delay: Duration::ZERO,
            },
        )],
        100,
        Duration::from_secs(5),
    )
    .await;

    pipeline.submit(URL_A, "alice").await.unwrap();
    pipeline.start_worker();

    let (_, _, outcome) = pipeline.next_result().await;
    let (file_name, public_url) = match outcome {
        JobOutcome::Succeeded {
            file_name,
            public_url,
        } => (file_name, public_url),
        other => panic!("expected success, got {other:?}"),
    };
    assert_eq!(
        public_url,
        format!("https://clips.example.com/{file_name}")
    );

    // the published file is immediately retrievable over the file surface
    let (status, _rx) = StatusNotifier::new();
    let app = router(AppState::new(
        Arc::new(Config::default()),
        pipeline.store.clone(),
        Arc::new(status),
        Arc::new(Metrics::new()),
    ));

    use http_body_util::BodyExt;
    use tower::ServiceExt;

    let response = app
        .oneshot(
            axum::http::Request::builder()
                .uri(format!("/{file_name}"))
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), axum::http::StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"the whole clip, byte for byte");
}
