use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
};
use std::collections::HashMap;

use atlas_assistant::reformat_labels_to_spaces;
use atlas_catalog::IngestReport;
use atlas_models::{
    AssistantFindingsResponse, AtlasError, DiatomsData, DiatomsPage, ErrorShape,
    IngestPaperRequest, Paper, SaveLabelsRequest, SaveLabelsResponse, StoredObject,
};
use tracing::{error, info, instrument};

use crate::AppState;

type ApiError = (StatusCode, Json<ErrorShape>);

fn reject(state: &AppState, e: AtlasError) -> ApiError {
    state.metrics.record_error(e.error_type());
    (
        StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(e.to_error_shape()),
    )
}

#[instrument(skip(state))]
pub async fn get_diatoms_page(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<DiatomsPage>, ApiError> {
    let index = params.get("index").and_then(|s| s.parse::<usize>().ok());

    match state.catalog.page(index).await {
        Ok(page) => {
            state.metrics.record_page_served();
            Ok(Json(page))
        }
        // An empty catalog renders as a soft page, not a 4xx; the
        // labelling interface shows the message inline.
        Err(e @ AtlasError::CatalogEmpty) => {
            state.metrics.record_error(e.error_type());
            Ok(Json(DiatomsPage {
                current_index: 0,
                total_images: 0,
                data: DiatomsData::default(),
                error: Some(e.to_string()),
            }))
        }
        Err(e) => {
            error!("Failed to serve diatoms page: {}", e);
            Err(reject(&state, e))
        }
    }
}

#[instrument(skip(state, payload))]
pub async fn save_labels(
    State(state): State<AppState>,
    Json(payload): Json<SaveLabelsRequest>,
) -> Result<Json<SaveLabelsResponse>, ApiError> {
    info!("Saving labels for image {}", payload.image_index);

    match state.catalog.save_labels(payload).await {
        Ok(response) => {
            state.metrics.record_labels_saved();
            Ok(Json(response))
        }
        Err(e) => {
            error!("Failed to save labels: {}", e);
            Err(reject(&state, e))
        }
    }
}

/// Serves the whole papers document as a JSON attachment.
#[instrument(skip(state))]
pub async fn download_labels(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let papers = state.catalog.snapshot().await;
    let body = match serde_json::to_vec_pretty(&papers) {
        Ok(body) => body,
        Err(e) => {
            return Err(reject(
                &state,
                AtlasError::InternalError {
                    reason: format!("failed to encode papers document: {e}"),
                },
            ))
        }
    };

    let filename = format!(
        "diatom_labels_{}.json",
        state.config.storage.session_id
    );
    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={filename}"),
            ),
        ],
        body,
    ))
}

/// Runs the missing-species assistant for one image and merges anything
/// it found into the catalog.
#[instrument(skip(state))]
pub async fn diatom_list_assistant(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<AssistantFindingsResponse>, ApiError> {
    let index = params
        .get("index")
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(0);

    let (labels, pdf_text_content) = match state.catalog.labels_for_image(index).await {
        Ok(found) => found,
        Err(e) => return Err(reject(&state, e)),
    };

    let readable_labels = reformat_labels_to_spaces(&labels);
    state.metrics.record_assistant_call();
    let findings = match state
        .assistant
        .find_missing_species(&pdf_text_content, &readable_labels)
        .await
    {
        Ok(findings) => findings,
        Err(e) => {
            error!("Missing-species assistant failed: {}", e);
            return Err(reject(&state, e));
        }
    };

    let data_saved = match state
        .catalog
        .merge_proposed(index, &findings.species_data)
        .await
    {
        Ok(changed) => changed,
        Err(e) => return Err(reject(&state, e)),
    };

    info!(
        index,
        found = findings.species_data.len(),
        data_saved,
        "Assistant findings processed"
    );
    Ok(Json(AssistantFindingsResponse {
        labels: readable_labels,
        pdf_text_content,
        species_data: findings.species_data,
        labels_retrieved: findings.labels_retrieved,
        message: findings.message,
        data_saved,
    }))
}

#[instrument(skip(state))]
pub async fn list_papers(
    State(state): State<AppState>,
) -> Result<Json<Vec<StoredObject>>, ApiError> {
    match state.papers_store.list_uploaded_pdfs().await {
        Ok(objects) => Ok(Json(objects)),
        Err(e) => {
            error!("Failed to list uploaded papers: {}", e);
            Err(reject(&state, e))
        }
    }
}

#[instrument(skip(state, payload))]
pub async fn ingest_paper(
    State(state): State<AppState>,
    Json(payload): Json<IngestPaperRequest>,
) -> Result<Json<Paper>, ApiError> {
    info!("Ingesting paper from {}", payload.pdf_url);
    let started = std::time::Instant::now();

    match state.ingestor.ingest(&payload.pdf_url).await {
        Ok(IngestReport {
            paper,
            species_found,
            images_uploaded,
            ..
        }) => {
            state
                .metrics
                .record_paper_ingested(started.elapsed().as_millis() as f64);
            info!(species_found, images_uploaded, "Paper ingested");
            Ok(Json(paper))
        }
        Err(e) => {
            error!("Ingest failed for {}: {}", payload.pdf_url, e);
            Err(reject(&state, e))
        }
    }
}

#[instrument(skip(state))]
pub async fn apply_segmentation(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> Result<Json<DiatomsData>, ApiError> {
    match state.catalog.apply_segmentation(index).await {
        Ok(data) => {
            state.metrics.record_segmentation_applied();
            Ok(Json(data))
        }
        Err(e) => {
            error!("Segmentation alignment failed for image {}: {}", index, e);
            Err(reject(&state, e))
        }
    }
}

pub async fn health_check() -> &'static str {
    "OK"
}

#[instrument(skip(state))]
pub async fn metrics(State(state): State<AppState>) -> Result<String, ApiError> {
    state.metrics.render().map_err(|e| reject(&state, e))
}
