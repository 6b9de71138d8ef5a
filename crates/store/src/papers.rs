use std::sync::Arc;

use atlas_models::{AtlasError, Paper, StorageConfig, StoredObject};
use bytes::Bytes;
use tracing::{info, instrument, warn};

use crate::{format_size_mb, parse_public_url, ObjectStore};

/// Typed access to the session's documents: the canonical papers JSON,
/// per-image segmentation files, and the archived PDFs and plate images.
pub struct PapersStore {
    store: Arc<dyn ObjectStore>,
    storage: StorageConfig,
}

impl PapersStore {
    pub fn new(store: Arc<dyn ObjectStore>, storage: StorageConfig) -> Self {
        Self { store, storage }
    }

    /// Public URL of the canonical papers document.
    pub fn document_url(&self) -> String {
        self.storage.papers_document_url()
    }

    /// Loads the papers document. Papers whose JSON cannot be decoded are
    /// skipped with a warning; a missing document is not an error here,
    /// the caller decides whether to start empty.
    #[instrument(skip(self))]
    pub async fn load_papers(&self) -> Result<Vec<Paper>, AtlasError> {
        let (bucket, path) = parse_public_url(&self.document_url())?;
        let raw = self.store.get_string(&bucket, &path).await?;

        let entries: Vec<serde_json::Value> =
            serde_json::from_str(&raw).map_err(|e| AtlasError::ObjectStoreError {
                reason: format!("papers document is not a JSON array: {e}"),
            })?;

        let total = entries.len();
        let mut papers = Vec::with_capacity(total);
        for entry in entries {
            match serde_json::from_value::<Paper>(entry) {
                Ok(paper) => papers.push(paper),
                Err(e) => warn!("Skipping undecodable paper entry: {e}"),
            }
        }
        info!(loaded = papers.len(), total = total, "Loaded papers document");
        Ok(papers)
    }

    /// Persists the whole papers document, pretty printed.
    #[instrument(skip(self, papers))]
    pub async fn save_papers(&self, papers: &[Paper]) -> Result<String, AtlasError> {
        let url = self.document_url();
        let (bucket, path) = parse_public_url(&url)?;
        let body = serde_json::to_vec_pretty(papers).map_err(|e| AtlasError::InternalError {
            reason: format!("failed to encode papers document: {e}"),
        })?;
        self.store
            .put(&bucket, &path, Bytes::from(body), "application/json")
            .await?;
        info!(count = papers.len(), url = %url, "Saved papers document");
        Ok(url)
    }

    /// Loads the segmentation file produced for an image, if present.
    #[instrument(skip(self))]
    pub async fn load_segmentation(
        &self,
        image_filename: &str,
    ) -> Result<Option<String>, AtlasError> {
        let bucket = &self.storage.segmentation_bucket;
        let path = format!("{}/{}.txt", self.storage.session_id, image_filename);
        if !self.store.exists(bucket, &path).await? {
            warn!(path = %path, "No segmentation file for image");
            return Ok(None);
        }
        Ok(Some(self.store.get_string(bucket, &path).await?))
    }

    /// Stores a segmentation file for an image, returning its public URL.
    #[instrument(skip(self, content))]
    pub async fn save_segmentation(
        &self,
        image_filename: &str,
        content: &str,
    ) -> Result<String, AtlasError> {
        let bucket = &self.storage.segmentation_bucket;
        let path = format!("{}/{}.txt", self.storage.session_id, image_filename);
        self.store
            .put(
                bucket,
                &path,
                Bytes::from(content.to_string()),
                "text/plain",
            )
            .await?;
        Ok(self.store.public_url(bucket, &path))
    }

    /// Archives an ingested PDF under the session's pdf/ prefix.
    #[instrument(skip(self, content))]
    pub async fn upload_pdf(
        &self,
        filename: &str,
        content: Bytes,
    ) -> Result<(String, String), AtlasError> {
        let bucket = &self.storage.papers_bucket;
        let blob_name = format!("pdf/{}/{}", self.storage.session_id, filename);
        self.store
            .put(bucket, &blob_name, content, "application/pdf")
            .await?;
        let public_url = self.store.public_url(bucket, &blob_name);
        Ok((blob_name, public_url))
    }

    /// Stores an extracted plate image, returning its public URL.
    #[instrument(skip(self, content))]
    pub async fn upload_image(
        &self,
        filename: &str,
        content: Bytes,
    ) -> Result<String, AtlasError> {
        let bucket = &self.storage.extracted_images_bucket;
        let path = format!("{}/{}", self.storage.session_id, filename);
        self.store.put(bucket, &path, content, "image/jpeg").await?;
        Ok(self.store.public_url(bucket, &path))
    }

    /// Lists the PDFs archived for this session, newest first.
    #[instrument(skip(self))]
    pub async fn list_uploaded_pdfs(&self) -> Result<Vec<StoredObject>, AtlasError> {
        let bucket = &self.storage.papers_bucket;
        let prefix = format!("pdf/{}/", self.storage.session_id);
        let mut objects: Vec<StoredObject> = self
            .store
            .list(bucket, &prefix)
            .await?
            .into_iter()
            .map(|meta| StoredObject {
                name: meta
                    .name
                    .rsplit('/')
                    .next()
                    .unwrap_or(&meta.name)
                    .to_string(),
                public_url: self.store.public_url(bucket, &meta.name),
                size: format_size_mb(meta.size),
                updated: meta.updated,
                blob_name: meta.name,
            })
            .collect();
        objects.sort_by(|a, b| b.updated.cmp(&a.updated));
        Ok(objects)
    }
}
