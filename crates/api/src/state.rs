use std::sync::Arc;

use atlas_assistant::Assistant;
use atlas_catalog::{Catalog, Ingestor};
use atlas_metrics::MetricsService;
use atlas_models::Config;
use atlas_store::PapersStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub catalog: Arc<Catalog>,
    pub assistant: Arc<Assistant>,
    pub ingestor: Arc<Ingestor>,
    pub papers_store: Arc<PapersStore>,
    pub metrics: Arc<MetricsService>,
}

impl AppState {
    pub fn new(
        config: Config,
        catalog: Arc<Catalog>,
        assistant: Arc<Assistant>,
        ingestor: Arc<Ingestor>,
        papers_store: Arc<PapersStore>,
        metrics: Arc<MetricsService>,
    ) -> Self {
        Self {
            config,
            catalog,
            assistant,
            ingestor,
            papers_store,
            metrics,
        }
    }
}
