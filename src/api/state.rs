use std::sync::Arc;

use crate::config::Config;
use crate::observability::Metrics;
use crate::status::StatusNotifier;
use crate::storage::FileStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<FileStore>,
    pub status: Arc<StatusNotifier>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(
        config: Arc<Config>,
        store: Arc<FileStore>,
        status: Arc<StatusNotifier>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            config,
            store,
            status,
            metrics,
        }
    }
}
