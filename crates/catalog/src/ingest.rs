use std::sync::Arc;

use atlas_assistant::{Assistant, CitationMethod};
use atlas_models::{AtlasError, DiatomsData, LabelRecord, LimitsConfig, Paper, PaperInfo};
use atlas_pdf::{extract_images, extract_text, fetch_pdf, filename_from_url, sha256_hex};
use atlas_store::PapersStore;
use bytes::Bytes;
use chrono::Utc;
use tracing::{info, instrument, warn};

use crate::tracker::{UploadRecord, UploadTracker};
use crate::Catalog;

/// Outcome of one ingest run, returned to the API caller.
#[derive(Debug, Clone, serde::Serialize)]
pub struct IngestReport {
    pub pdf_file_url: String,
    pub original_filename: String,
    pub file_256_hash: String,
    pub images_uploaded: usize,
    pub species_found: usize,
    pub document_url: String,
    pub replaced: bool,
    /// The catalog entry as persisted.
    pub paper: Paper,
}

/// Drives a PDF from a URL to a fully labelled catalog entry: download,
/// archive, text and image extraction, assistant extraction, upsert.
pub struct Ingestor {
    client: reqwest::Client,
    papers_store: Arc<PapersStore>,
    catalog: Arc<Catalog>,
    assistant: Arc<Assistant>,
    tracker: Arc<UploadTracker>,
    limits: LimitsConfig,
    citation_method: CitationMethod,
}

impl Ingestor {
    pub fn new(
        client: reqwest::Client,
        papers_store: Arc<PapersStore>,
        catalog: Arc<Catalog>,
        assistant: Arc<Assistant>,
        tracker: Arc<UploadTracker>,
        limits: LimitsConfig,
        citation_method: CitationMethod,
    ) -> Self {
        Self {
            client,
            papers_store,
            catalog,
            assistant,
            tracker,
            limits,
            citation_method,
        }
    }

    #[instrument(skip(self))]
    pub async fn ingest(&self, pdf_url: &str) -> Result<IngestReport, AtlasError> {
        if pdf_url.trim().is_empty() {
            return Err(AtlasError::InvalidRequest {
                reason: "pdf_url must not be empty".to_string(),
            });
        }

        let max_bytes = self.limits.max_pdf_size_mb * 1024 * 1024;
        let fetched = fetch_pdf(&self.client, pdf_url, max_bytes).await?;
        let hash = sha256_hex(&fetched.bytes);
        let filename = filename_from_url(pdf_url);

        let (_, archived_url) = self
            .papers_store
            .upload_pdf(&filename, fetched.bytes.clone())
            .await?;
        info!(url = %archived_url, hash = %hash, "Archived PDF");

        let text = extract_text(&fetched.bytes)?;
        let image_urls = self.upload_images(&fetched.bytes, &hash).await?;

        let mut paper_info = self.assistant.extract_paper_info(&text.full_text).await?;
        paper_info.paper_image_urls = image_urls.clone();
        let species_found = paper_info.diatom_species_array.len();

        let citation = self
            .assistant
            .extract_citation(&text.first_two_pages, self.citation_method)
            .await;

        let diatoms_data = build_diatoms_data(&paper_info, image_urls.first());

        let paper = Paper {
            pdf_file_url: archived_url.clone(),
            original_filename: Some(filename.clone()),
            file_256_hash: Some(hash.clone()),
            pdf_text_content: text.full_text,
            first_two_pages_text: Some(text.first_two_pages),
            citation: Some(citation.clone()),
            paper_info: Some(paper_info),
            diatoms_data,
            upload_timestamp: Some(Utc::now()),
            processed: true,
        };
        let (document_url, replaced) = self.catalog.upsert_paper(paper.clone()).await?;

        self.tracker
            .record_upload(&UploadRecord {
                public_url: archived_url.clone(),
                sha256: hash.clone(),
                original_filename: filename.clone(),
                citation_title: citation.title,
                citation_year: citation.year,
                uploaded_at: Utc::now(),
                processed: false,
            })
            .await?;
        self.tracker.mark_processed(&archived_url).await?;

        info!(
            url = %archived_url,
            species = species_found,
            images = image_urls.len(),
            replaced,
            "Ingest complete"
        );
        Ok(IngestReport {
            pdf_file_url: archived_url,
            original_filename: filename,
            file_256_hash: hash,
            images_uploaded: image_urls.len(),
            species_found,
            document_url,
            replaced,
            paper,
        })
    }

    /// Extracts the embedded plate images and stores each one under a
    /// hash-derived name. Extraction failures skip images rather than
    /// failing the whole ingest; a paper without plates is still useful.
    async fn upload_images(&self, pdf: &Bytes, hash: &str) -> Result<Vec<String>, AtlasError> {
        let (images, pages) = match extract_images(pdf) {
            Ok(extracted) => extracted,
            Err(e) => {
                warn!("Image extraction failed, continuing without plates: {e}");
                return Ok(Vec::new());
            }
        };
        info!(images = images.len(), pages = pages.len(), "Extracted images");

        let mut urls = Vec::with_capacity(images.len());
        for (n, image) in images.into_iter().enumerate() {
            let filename = format!("{}_image_{}.{}", hash, n, image.suggested_ext);
            let url = self
                .papers_store
                .upload_image(&filename, Bytes::from(image.data))
                .await?;
            urls.push(url);
        }
        Ok(urls)
    }
}

/// Builds the initial labelling record set for a paper: one record per
/// extracted species, attached to the paper's first plate image.
pub fn build_diatoms_data(paper_info: &PaperInfo, image_url: Option<&String>) -> DiatomsData {
    let info = paper_info
        .diatom_species_array
        .iter()
        .map(|species| LabelRecord {
            label: vec![LabelRecord::display_label(
                species.species_index,
                &species.formatted_species_name,
            )],
            index: species.species_index,
            species: species.formatted_species_name.clone(),
            ..Default::default()
        })
        .collect();

    DiatomsData {
        image_url: image_url.cloned().unwrap_or_default(),
        info,
        ..Default::default()
    }
}
