//! Shared application state

use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

use modgate_pipeline::Orchestrator;
use modgate_store::ModerationStore;

use crate::image::ImageFetcher;

/// State shared across all routes
#[derive(Clone)]
pub struct AppState {
    /// The moderation pipeline
    pub orchestrator: Arc<Orchestrator>,

    /// Store handle for the analytics read-side
    pub store: Arc<dyn ModerationStore>,

    /// Image acquisition collaborator
    pub fetcher: Arc<ImageFetcher>,

    /// Prometheus render handle, present when the exporter is installed
    pub metrics: Option<PrometheusHandle>,
}
