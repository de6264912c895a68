//! Process composition: wire the pipeline together and serve

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::api::{self, state::AppState};
use crate::config::Config;
use crate::gateway::{Gateway, LogGateway};
use crate::observability::Metrics;
use crate::queue::JobQueue;
use crate::status::StatusNotifier;
use crate::storage::FileStore;
use crate::worker::{HttpFetcher, Worker};

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub async fn run(address: Option<SocketAddr>) -> Result<(), AnyError> {
    info!("Loading configuration");
    let config = Config::load().map_err(|e| format!("Failed to load config: {}", e))?;
    let address = address.unwrap_or(config.server.bind_addr);

    info!(path = %config.server.downloads_dir.display(), "Opening file store");
    let store = Arc::new(FileStore::open(&config.server.downloads_dir).await?);

    let queue = Arc::new(JobQueue::new());
    let (status, _presence_rx) = StatusNotifier::new();
    let status = Arc::new(status);
    let metrics = Arc::new(Metrics::new());

    // The chat adapter is an external process; it submits through a
    // `Submitter` built over this queue and implements `Gateway` for result
    // delivery. Until one is connected, results go to the log.
    let gateway: Arc<dyn Gateway> = Arc::new(LogGateway::new());

    if config.gateway.bot_token.is_none() {
        info!("No bot credential configured; running file surface and worker only");
    }

    let fetcher = Arc::new(HttpFetcher::new(&config.fetch)?);
    let worker = Worker::new(
        queue.clone(),
        store.clone(),
        fetcher,
        gateway,
        status.clone(),
        metrics.clone(),
        config.server.public_base_url.clone(),
        Duration::from_secs(config.fetch.job_timeout_secs),
    );
    tokio::spawn(worker.run());
    info!("Download worker started");

    let state = AppState::new(Arc::new(config), store, status, metrics);
    api::serve(address, state).await
}
