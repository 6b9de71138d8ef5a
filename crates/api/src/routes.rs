use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers::*, AppState};

pub fn create_router() -> Router<AppState> {
    Router::new()
        // Labelling interface
        .route("/api/diatoms", get(get_diatoms_page))
        .route("/api/save", post(save_labels))
        .route("/api/download", get(download_labels))
        .route("/api/diatom_list_assistant", get(diatom_list_assistant))
        // Papers
        .route("/api/papers", get(list_papers))
        .route("/api/papers", post(ingest_paper))
        // Segmentation
        .route("/api/segmentation/:index", post(apply_segmentation))
        // Health and metrics
        .route("/healthz", get(health_check))
        .route("/metrics", get(metrics))
}

pub fn build_router(state: AppState) -> Router {
    create_router().with_state(state)
}
