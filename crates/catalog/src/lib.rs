pub mod ingest;
pub mod tracker;

pub use ingest::*;
pub use tracker::*;

use std::sync::Arc;

use atlas_models::{
    AtlasError, DiatomsData, DiatomsPage, Paper, ProposedLabel, SaveLabelsRequest,
    SaveLabelsResponse,
};
use atlas_store::PapersStore;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{info, instrument, warn};

/// In-memory view of the canonical papers document. All mutation paths
/// write the whole document back to the object store before returning,
/// so the store stays the source of truth across restarts.
pub struct Catalog {
    papers_store: Arc<PapersStore>,
    papers: RwLock<Vec<Paper>>,
}

impl Catalog {
    pub fn new(papers_store: Arc<PapersStore>) -> Self {
        Self {
            papers_store,
            papers: RwLock::new(Vec::new()),
        }
    }

    /// Public URL of the backing papers document.
    pub fn document_url(&self) -> String {
        self.papers_store.document_url()
    }

    /// Replaces the in-memory catalog with the stored document.
    #[instrument(skip(self))]
    pub async fn load(&self) -> Result<usize, AtlasError> {
        let loaded = self.papers_store.load_papers().await?;
        let count = loaded.len();
        *self.papers.write().await = loaded;
        info!(papers = count, "Catalog loaded");
        Ok(count)
    }

    /// Number of labelled plate images currently in the catalog.
    pub async fn total_images(&self) -> usize {
        let papers = self.papers.read().await;
        image_positions(&papers).len()
    }

    /// Full copy of the papers document, for export endpoints.
    pub async fn snapshot(&self) -> Vec<Paper> {
        self.papers.read().await.clone()
    }

    /// The labelling page at `index`. A missing or out-of-range index is
    /// clamped into the valid range so the interface can always render
    /// something; only an empty catalog is an error.
    #[instrument(skip(self))]
    pub async fn page(&self, index: Option<usize>) -> Result<DiatomsPage, AtlasError> {
        let papers = self.papers.read().await;
        let positions = image_positions(&papers);
        if positions.is_empty() {
            return Err(AtlasError::CatalogEmpty);
        }

        let requested = index.unwrap_or(0);
        let current_index = requested.min(positions.len() - 1);
        if current_index != requested {
            warn!(requested, clamped = current_index, "Image index clamped");
        }

        Ok(DiatomsPage {
            current_index,
            total_images: positions.len(),
            data: papers[positions[current_index]].diatoms_data.clone(),
            error: None,
        })
    }

    /// Overwrites the labels of one image and persists the document.
    /// Unlike reads, writes reject an out-of-range index outright.
    #[instrument(skip(self, request))]
    pub async fn save_labels(
        &self,
        request: SaveLabelsRequest,
    ) -> Result<SaveLabelsResponse, AtlasError> {
        let mut papers = self.papers.write().await;
        let positions = image_positions(&papers);
        if request.image_index >= positions.len() {
            return Err(AtlasError::ImageIndexOutOfRange {
                index: request.image_index,
                total: positions.len(),
            });
        }

        let target = positions[request.image_index];
        let image_url = papers[target].diatoms_data.image_url.clone();

        // Resolve by image URL, first match wins; the same plate can
        // appear under more than one paper entry.
        if let Some(paper) = papers
            .iter_mut()
            .find(|paper| paper.diatoms_data.image_url == image_url)
        {
            paper.diatoms_data.info = request.info.clone();
        }

        let document_url = self.papers_store.save_papers(&papers).await?;
        info!(
            index = request.image_index,
            labels = request.info.len(),
            "Saved labels"
        );
        Ok(SaveLabelsResponse {
            success: true,
            message: format!("Labels saved for image {}", request.image_index),
            timestamp: Utc::now(),
            saved_index: request.image_index,
            document_url,
        })
    }

    /// Display labels and paper text for one image, for the
    /// missing-species assistant. Strict on the index like all writes,
    /// since the result feeds a follow-up mutation.
    pub async fn labels_for_image(
        &self,
        image_index: usize,
    ) -> Result<(Vec<String>, String), AtlasError> {
        let papers = self.papers.read().await;
        let positions = image_positions(&papers);
        if image_index >= positions.len() {
            return Err(AtlasError::ImageIndexOutOfRange {
                index: image_index,
                total: positions.len(),
            });
        }
        let paper = &papers[positions[image_index]];
        let labels = paper
            .diatoms_data
            .info
            .iter()
            .map(|record| {
                record.label.first().cloned().unwrap_or_else(|| {
                    atlas_models::LabelRecord::display_label(record.index, &record.species)
                })
            })
            .collect();
        Ok((labels, paper.pdf_text_content.clone()))
    }

    /// Merges assistant-proposed labels into an image, skipping indices
    /// already present, and records the species metadata on the paper.
    /// Returns whether anything changed (and was persisted).
    #[instrument(skip(self, proposed))]
    pub async fn merge_proposed(
        &self,
        image_index: usize,
        proposed: &[ProposedLabel],
    ) -> Result<bool, AtlasError> {
        let mut papers = self.papers.write().await;
        let positions = image_positions(&papers);
        if image_index >= positions.len() {
            return Err(AtlasError::ImageIndexOutOfRange {
                index: image_index,
                total: positions.len(),
            });
        }

        let paper = &mut papers[positions[image_index]];
        let mut changed = false;
        for candidate in proposed {
            let exists = paper
                .diatoms_data
                .info
                .iter()
                .any(|record| record.index == candidate.record.index);
            if exists {
                continue;
            }
            paper.diatoms_data.info.push(candidate.record.clone());
            if let Some(species) = &candidate.full_species_info {
                paper
                    .paper_info
                    .get_or_insert_with(Default::default)
                    .diatom_species_array
                    .push(species.clone());
            }
            changed = true;
        }

        if changed {
            self.papers_store.save_papers(&papers).await?;
            info!(index = image_index, "Merged assistant findings");
        }
        Ok(changed)
    }

    /// Loads the segmentation file for an image, aligns its polygons with
    /// the labelled bounding boxes and persists the result.
    #[instrument(skip(self))]
    pub async fn apply_segmentation(
        &self,
        image_index: usize,
    ) -> Result<DiatomsData, AtlasError> {
        let mut papers = self.papers.write().await;
        let positions = image_positions(&papers);
        if image_index >= positions.len() {
            return Err(AtlasError::ImageIndexOutOfRange {
                index: image_index,
                total: positions.len(),
            });
        }

        let target = positions[image_index];
        let image_url = papers[target].diatoms_data.image_url.clone();
        let filename = image_url.rsplit('/').next().unwrap_or(&image_url).to_string();

        let text = self
            .papers_store
            .load_segmentation(&filename)
            .await?
            .ok_or_else(|| AtlasError::InvalidSegmentation {
                reason: format!("no segmentation file for image {filename}"),
            })?;

        atlas_segmentation::apply_to_image(&mut papers[target].diatoms_data, &text);
        self.papers_store.save_papers(&papers).await?;
        Ok(papers[target].diatoms_data.clone())
    }

    /// Inserts a paper, replacing any existing entry with the same PDF
    /// URL, and persists the document. Returns the document URL and
    /// whether an entry was replaced.
    #[instrument(skip(self, paper))]
    pub async fn upsert_paper(&self, paper: Paper) -> Result<(String, bool), AtlasError> {
        let mut papers = self.papers.write().await;
        let existing = papers
            .iter()
            .position(|p| p.pdf_file_url == paper.pdf_file_url);
        let replaced = existing.is_some();
        match existing {
            Some(at) => papers[at] = paper,
            None => papers.push(paper),
        }
        let document_url = self.papers_store.save_papers(&papers).await?;
        info!(replaced, total = papers.len(), "Upserted paper");
        Ok((document_url, replaced))
    }
}

/// Positions of papers that carry a plate image. The labelling interface
/// indexes over these, not over raw paper entries.
fn image_positions(papers: &[Paper]) -> Vec<usize> {
    papers
        .iter()
        .enumerate()
        .filter(|(_, paper)| !paper.diatoms_data.image_url.is_empty())
        .map(|(at, _)| at)
        .collect()
}
