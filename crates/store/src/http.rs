use async_trait::async_trait;
use atlas_models::{AtlasError, StorageConfig};
use bytes::Bytes;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::{ObjectMeta, ObjectStore};

/// Object store speaking the storage service's public HTTP surface:
/// public-URL reads, JSON API listings and media uploads. Uploads carry
/// a bearer token when one is present in the configured env var.
pub struct HttpObjectStore {
    client: reqwest::Client,
    base_url: String,
    upload_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    items: Vec<ListItem>,
}

#[derive(Debug, Deserialize)]
struct ListItem {
    name: String,
    #[serde(default)]
    size: Option<String>,
    #[serde(default)]
    updated: Option<String>,
}

impl HttpObjectStore {
    pub fn new(client: reqwest::Client, storage: &StorageConfig) -> Self {
        let upload_token = std::env::var(&storage.upload_token_env).ok();
        Self {
            client,
            base_url: storage.base_url.trim_end_matches('/').to_string(),
            upload_token,
        }
    }

    pub fn with_token(client: reqwest::Client, base_url: &str, token: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            upload_token: token,
        }
    }

    fn store_err(context: &str, e: reqwest::Error) -> AtlasError {
        AtlasError::ObjectStoreError {
            reason: format!("{context}: {e}"),
        }
    }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    #[instrument(skip(self))]
    async fn get(&self, bucket: &str, path: &str) -> Result<Bytes, AtlasError> {
        let url = self.public_url(bucket, path);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Self::store_err("get", e))?
            .error_for_status()
            .map_err(|e| Self::store_err("get", e))?;
        response.bytes().await.map_err(|e| Self::store_err("get", e))
    }

    #[instrument(skip(self, content))]
    async fn put(
        &self,
        bucket: &str,
        path: &str,
        content: Bytes,
        content_type: &str,
    ) -> Result<(), AtlasError> {
        let url = format!(
            "{}/upload/storage/v1/b/{}/o?uploadType=media&name={}",
            self.base_url, bucket, path
        );
        let mut request = self
            .client
            .post(&url)
            .header("content-type", content_type)
            .body(content);
        if let Some(token) = &self.upload_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| AtlasError::UploadFailed {
            path: format!("{bucket}/{path}"),
            reason: e.to_string(),
        })?;
        if !response.status().is_success() {
            return Err(AtlasError::UploadFailed {
                path: format!("{bucket}/{path}"),
                reason: format!("status {}", response.status()),
            });
        }
        debug!(bucket = %bucket, path = %path, "Uploaded object");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn exists(&self, bucket: &str, path: &str) -> Result<bool, AtlasError> {
        let url = self.public_url(bucket, path);
        let response = self
            .client
            .head(&url)
            .send()
            .await
            .map_err(|e| Self::store_err("head", e))?;
        Ok(response.status().is_success())
    }

    #[instrument(skip(self))]
    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<ObjectMeta>, AtlasError> {
        let url = format!(
            "{}/storage/v1/b/{}/o?prefix={}",
            self.base_url, bucket, prefix
        );
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Self::store_err("list", e))?
            .error_for_status()
            .map_err(|e| Self::store_err("list", e))?;
        let listing: ListResponse = response
            .json()
            .await
            .map_err(|e| Self::store_err("list", e))?;

        Ok(listing
            .items
            .into_iter()
            .map(|item| ObjectMeta {
                name: item.name,
                size: item
                    .size
                    .as_deref()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(0),
                updated: item.updated.unwrap_or_default(),
            })
            .collect())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/{}/{}", self.base_url, bucket, path)
    }
}
