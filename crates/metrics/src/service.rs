use atlas_models::AtlasError;
use prometheus::{Counter, Encoder, Histogram, HistogramOpts, Registry, TextEncoder};

pub struct MetricsService {
    registry: Registry,
    pages_served_total: Counter,
    labels_saved_total: Counter,
    papers_ingested_total: Counter,
    assistant_calls_total: Counter,
    segmentations_applied_total: Counter,
    errors_total: Counter,
    ingest_duration_ms: Histogram,
}

impl MetricsService {
    pub fn new() -> Result<Self, AtlasError> {
        let registry = Registry::new();

        let pages_served_total = Counter::new(
            "atlas_pages_served_total",
            "Total number of labelling pages served",
        )
        .map_err(|e| AtlasError::InternalError { reason: e.to_string() })?;

        let labels_saved_total = Counter::new(
            "atlas_labels_saved_total",
            "Total number of label save operations",
        )
        .map_err(|e| AtlasError::InternalError { reason: e.to_string() })?;

        let papers_ingested_total = Counter::new(
            "atlas_papers_ingested_total",
            "Total number of papers ingested",
        )
        .map_err(|e| AtlasError::InternalError { reason: e.to_string() })?;

        let assistant_calls_total = Counter::new(
            "atlas_assistant_calls_total",
            "Total number of assistant extraction calls",
        )
        .map_err(|e| AtlasError::InternalError { reason: e.to_string() })?;

        let segmentations_applied_total = Counter::new(
            "atlas_segmentations_applied_total",
            "Total number of segmentation alignment runs",
        )
        .map_err(|e| AtlasError::InternalError { reason: e.to_string() })?;

        let errors_total = Counter::new(
            "atlas_errors_total",
            "Total number of request errors",
        )
        .map_err(|e| AtlasError::InternalError { reason: e.to_string() })?;

        let ingest_duration_ms = Histogram::with_opts(HistogramOpts::new(
            "atlas_ingest_duration_ms",
            "Paper ingest pipeline duration in milliseconds",
        ))
        .map_err(|e| AtlasError::InternalError { reason: e.to_string() })?;

        registry
            .register(Box::new(pages_served_total.clone()))
            .map_err(|e| AtlasError::InternalError { reason: e.to_string() })?;
        registry
            .register(Box::new(labels_saved_total.clone()))
            .map_err(|e| AtlasError::InternalError { reason: e.to_string() })?;
        registry
            .register(Box::new(papers_ingested_total.clone()))
            .map_err(|e| AtlasError::InternalError { reason: e.to_string() })?;
        registry
            .register(Box::new(assistant_calls_total.clone()))
            .map_err(|e| AtlasError::InternalError { reason: e.to_string() })?;
        registry
            .register(Box::new(segmentations_applied_total.clone()))
            .map_err(|e| AtlasError::InternalError { reason: e.to_string() })?;
        registry
            .register(Box::new(errors_total.clone()))
            .map_err(|e| AtlasError::InternalError { reason: e.to_string() })?;
        registry
            .register(Box::new(ingest_duration_ms.clone()))
            .map_err(|e| AtlasError::InternalError { reason: e.to_string() })?;

        Ok(Self {
            registry,
            pages_served_total,
            labels_saved_total,
            papers_ingested_total,
            assistant_calls_total,
            segmentations_applied_total,
            errors_total,
            ingest_duration_ms,
        })
    }

    pub fn record_page_served(&self) {
        self.pages_served_total.inc();
    }

    pub fn record_labels_saved(&self) {
        self.labels_saved_total.inc();
    }

    pub fn record_paper_ingested(&self, duration_ms: f64) {
        self.papers_ingested_total.inc();
        self.ingest_duration_ms.observe(duration_ms);
    }

    pub fn record_assistant_call(&self) {
        self.assistant_calls_total.inc();
    }

    pub fn record_segmentation_applied(&self) {
        self.segmentations_applied_total.inc();
    }

    pub fn record_error(&self, _error_type: &str) {
        self.errors_total.inc();
    }

    /// Renders the registry in the Prometheus text exposition format.
    pub fn render(&self) -> Result<String, AtlasError> {
        let encoder = TextEncoder::new();
        let families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&families, &mut buffer)
            .map_err(|e| AtlasError::InternalError { reason: e.to_string() })?;
        String::from_utf8(buffer).map_err(|e| AtlasError::InternalError {
            reason: e.to_string(),
        })
    }
}
