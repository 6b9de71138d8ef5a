pub mod http;
pub mod papers;

pub use http::*;
pub use papers::*;

use async_trait::async_trait;
use atlas_models::AtlasError;
use bytes::Bytes;

/// Metadata for one object in a bucket listing.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectMeta {
    /// Full object path within the bucket.
    pub name: String,
    pub size: u64,
    /// RFC 3339 update timestamp as reported by the store.
    pub updated: String,
}

/// Bucket-level object storage operations. The production implementation
/// speaks HTTP to the storage service; tests use an in-memory store.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn get(&self, bucket: &str, path: &str) -> Result<Bytes, AtlasError>;

    async fn put(
        &self,
        bucket: &str,
        path: &str,
        content: Bytes,
        content_type: &str,
    ) -> Result<(), AtlasError>;

    async fn exists(&self, bucket: &str, path: &str) -> Result<bool, AtlasError>;

    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<ObjectMeta>, AtlasError>;

    /// Public URL for an object, as served to browsers.
    fn public_url(&self, bucket: &str, path: &str) -> String;

    async fn get_string(&self, bucket: &str, path: &str) -> Result<String, AtlasError> {
        let bytes = self.get(bucket, path).await?;
        String::from_utf8(bytes.to_vec()).map_err(|e| AtlasError::ObjectStoreError {
            reason: format!("object {bucket}/{path} is not valid UTF-8: {e}"),
        })
    }
}

/// Splits a public object URL into `(bucket, path)`. The bucket is the
/// first path segment after the host; everything after it is the object
/// path.
pub fn parse_public_url(url: &str) -> Result<(String, String), AtlasError> {
    let mut parts = url.splitn(5, '/');
    let scheme = parts.next().unwrap_or_default();
    let empty = parts.next().unwrap_or_default();
    let host = parts.next().unwrap_or_default();
    let bucket = parts.next().unwrap_or_default();
    let path = parts.next().unwrap_or_default();

    if !scheme.starts_with("http") || !empty.is_empty() || host.is_empty() {
        return Err(AtlasError::InvalidRequest {
            reason: format!("not an object URL: {url}"),
        });
    }
    if bucket.is_empty() || path.is_empty() {
        return Err(AtlasError::InvalidRequest {
            reason: format!("object URL is missing bucket or path: {url}"),
        });
    }
    Ok((bucket.to_string(), path.to_string()))
}

/// Human readable object size, matching the listing format the labelling
/// front-end renders ("1.25 MB").
pub fn format_size_mb(size: u64) -> String {
    format!("{:.2} MB", size as f64 / 1024.0 / 1024.0)
}
