use std::sync::Arc;

use backend_domain::ports::{LogBroadcaster, LogRepository};
use backend_domain::RuntimeConfig;

use crate::ops::LogHub;
use crate::Metrics;

#[derive(Clone)]
pub struct AppState {
    pub config: RuntimeConfig,
    pub log_repo: Arc<dyn LogRepository>,
    /// Ingestion publishes through this port; normally the same object as `hub`.
    pub broadcaster: Arc<dyn LogBroadcaster>,
    pub hub: Arc<LogHub>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(config: RuntimeConfig, log_repo: Arc<dyn LogRepository>) -> Self {
        let hub = Arc::new(LogHub::new(config.stream_buffer));
        Self {
            config,
            log_repo,
            broadcaster: hub.clone(),
            hub,
            metrics: Arc::new(Metrics::default()),
        }
    }

    pub fn with_broadcaster(mut self, broadcaster: Arc<dyn LogBroadcaster>) -> Self {
        self.broadcaster = broadcaster;
        self
    }
}
