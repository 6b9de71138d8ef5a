//! In-memory fakes for the object store and the assistant transport,
//! plus fixture builders. Test-only crate.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use atlas_assistant::{AssistantTransport, Message};
use atlas_models::{AtlasError, Paper, StorageConfig};
use atlas_store::{parse_public_url, ObjectMeta, ObjectStore};
use bytes::Bytes;
use chrono::Utc;

const TEST_BASE_URL: &str = "https://storage.test";

/// Storage layout used across tests, pointed at the fake base URL.
pub fn storage_config() -> StorageConfig {
    StorageConfig {
        base_url: TEST_BASE_URL.to_string(),
        session_id: "test-session".to_string(),
        ..StorageConfig::default()
    }
}

/// Minimal paper fixture with a plate image and no labels.
pub fn test_paper(image_url: &str) -> Paper {
    Paper {
        pdf_file_url: format!("{TEST_BASE_URL}/papers-diatoms/pdf/test-session/{}.pdf",
            image_url.rsplit('/').next().unwrap_or("paper")),
        original_filename: None,
        file_256_hash: None,
        pdf_text_content: "Plate text mentioning Diploneis bombus.".to_string(),
        first_two_pages_text: None,
        citation: None,
        paper_info: None,
        diatoms_data: atlas_models::DiatomsData {
            image_url: image_url.to_string(),
            ..Default::default()
        },
        upload_timestamp: Some(Utc::now()),
        processed: true,
    }
}

/// Writes a papers document containing `papers` where the catalog will
/// look for it.
pub async fn seed_papers(store: &InMemoryStore, storage: &StorageConfig, papers: &[Paper]) {
    let (bucket, path) = parse_public_url(&storage.papers_document_url())
        .unwrap_or_else(|_| panic!("bad test document URL"));
    let body = serde_json::to_vec_pretty(papers).unwrap_or_else(|_| panic!("unencodable papers"));
    store
        .put(&bucket, &path, Bytes::from(body), "application/json")
        .await
        .unwrap_or_else(|_| panic!("seed failed"));
}

#[derive(Clone)]
struct StoredObjectEntry {
    content: Bytes,
    content_type: String,
    updated: String,
}

/// HashMap-backed `ObjectStore`, keyed by `(bucket, path)`.
#[derive(Default)]
pub struct InMemoryStore {
    objects: Mutex<HashMap<(String, String), StoredObjectEntry>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test convenience for seeding text objects (segmentation files).
    pub async fn put_text(&self, bucket: &str, path: &str, content: &str) {
        self.put(bucket, path, Bytes::from(content.to_string()), "text/plain")
            .await
            .unwrap_or_else(|_| panic!("put_text failed"));
    }

    /// Content type recorded for an object, if present.
    pub fn content_type_of(&self, bucket: &str, path: &str) -> Option<String> {
        let objects = self.objects.lock().unwrap_or_else(|e| e.into_inner());
        objects
            .get(&(bucket.to_string(), path.to_string()))
            .map(|entry| entry.content_type.clone())
    }
}

#[async_trait]
impl ObjectStore for InMemoryStore {
    async fn get(&self, bucket: &str, path: &str) -> Result<Bytes, AtlasError> {
        let objects = self.objects.lock().unwrap_or_else(|e| e.into_inner());
        objects
            .get(&(bucket.to_string(), path.to_string()))
            .map(|entry| entry.content.clone())
            .ok_or_else(|| AtlasError::ObjectStoreError {
                reason: format!("no such object: {bucket}/{path}"),
            })
    }

    async fn put(
        &self,
        bucket: &str,
        path: &str,
        content: Bytes,
        content_type: &str,
    ) -> Result<(), AtlasError> {
        let mut objects = self.objects.lock().unwrap_or_else(|e| e.into_inner());
        objects.insert(
            (bucket.to_string(), path.to_string()),
            StoredObjectEntry {
                content,
                content_type: content_type.to_string(),
                updated: Utc::now().to_rfc3339(),
            },
        );
        Ok(())
    }

    async fn exists(&self, bucket: &str, path: &str) -> Result<bool, AtlasError> {
        let objects = self.objects.lock().unwrap_or_else(|e| e.into_inner());
        Ok(objects.contains_key(&(bucket.to_string(), path.to_string())))
    }

    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<ObjectMeta>, AtlasError> {
        let objects = self.objects.lock().unwrap_or_else(|e| e.into_inner());
        let mut metas: Vec<ObjectMeta> = objects
            .iter()
            .filter(|((b, p), _)| b == bucket && p.starts_with(prefix))
            .map(|((_, p), entry)| ObjectMeta {
                name: p.clone(),
                size: entry.content.len() as u64,
                updated: entry.updated.clone(),
            })
            .collect();
        metas.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(metas)
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{TEST_BASE_URL}/{bucket}/{path}")
    }
}

/// Assistant transport that replays scripted replies in order. Runs out
/// of replies loudly rather than looping.
pub struct CannedTransport {
    replies: Mutex<Vec<String>>,
    pub calls: Mutex<Vec<serde_json::Value>>,
}

impl CannedTransport {
    pub fn new(replies: Vec<String>) -> Self {
        Self {
            replies: Mutex::new(replies),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn single(reply: &str) -> Self {
        Self::new(vec![reply.to_string()])
    }
}

#[async_trait]
impl AssistantTransport for CannedTransport {
    async fn complete(&self, messages: &[Message]) -> Result<String, AtlasError> {
        let mut calls = self.calls.lock().unwrap_or_else(|e| e.into_inner());
        calls.push(atlas_assistant::messages_to_json(messages));

        let mut replies = self.replies.lock().unwrap_or_else(|e| e.into_inner());
        if replies.is_empty() {
            return Err(AtlasError::AssistantError {
                reason: "canned transport has no replies left".to_string(),
            });
        }
        Ok(replies.remove(0))
    }
}

/// Shared handle type matching what production code expects.
pub fn arc_store(store: InMemoryStore) -> Arc<dyn ObjectStore> {
    Arc::new(store)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn store_roundtrip_and_listing() {
        let store = InMemoryStore::new();
        store.put_text("b", "dir/one.txt", "1").await;
        store.put_text("b", "dir/two.txt", "2").await;
        store.put_text("b", "other/three.txt", "3").await;

        assert!(store.exists("b", "dir/one.txt").await.unwrap());
        assert_eq!(store.get_string("b", "dir/two.txt").await.unwrap(), "2");

        let listed = store.list("b", "dir/").await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].name, "dir/one.txt");
    }

    #[tokio::test]
    async fn canned_transport_replays_in_order() {
        let transport = CannedTransport::new(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(transport.complete(&[]).await.unwrap(), "a");
        assert_eq!(transport.complete(&[]).await.unwrap(), "b");
        assert!(transport.complete(&[]).await.is_err());
    }
}
