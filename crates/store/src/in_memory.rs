//! In-memory store — useful for testing and ephemeral sessions.

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::Utc;
use docchat_core::document::{Document, OcrPayload, OcrRecord};
use docchat_core::error::StoreError;
use docchat_core::store::DocumentStore;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// An in-memory store backed by a Vec. Mirrors the SQLite contract.
pub struct InMemoryStore {
    documents: Arc<RwLock<Vec<Document>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            documents: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn create_document(
        &self,
        filename: &str,
        raw_bytes: &[u8],
        payload: &OcrPayload,
    ) -> Result<Document, StoreError> {
        let now = Utc::now();
        let doc_id = Uuid::new_v4().to_string();
        let payload_json = serde_json::to_string(payload)
            .map_err(|e| StoreError::Storage(format!("Payload serialization: {e}")))?;

        let doc = Document {
            id: doc_id.clone(),
            filename: filename.to_string(),
            content: BASE64.encode(raw_bytes),
            created_at: now,
            updated_at: now,
            ocr_result: Some(OcrRecord {
                id: Uuid::new_v4().to_string(),
                document_id: doc_id,
                content: payload_json,
                created_at: now,
                updated_at: now,
            }),
        };

        self.documents.write().await.push(doc.clone());
        Ok(doc)
    }

    async fn list_documents(&self) -> Result<Vec<Document>, StoreError> {
        // Inserted in order, so newest-first is reverse insertion order.
        let documents = self.documents.read().await;
        Ok(documents.iter().rev().cloned().collect())
    }

    async fn find_ocr_results(
        &self,
        ids: &[String],
    ) -> Result<Vec<(OcrRecord, Document)>, StoreError> {
        let documents = self.documents.read().await;
        Ok(documents
            .iter()
            .filter(|d| ids.contains(&d.id))
            .filter_map(|d| {
                let record = d.ocr_result.clone()?;
                let mut doc = d.clone();
                doc.ocr_result = None;
                Some((record, doc))
            })
            .collect())
    }

    async fn delete_document(&self, id: &str) -> Result<bool, StoreError> {
        let mut documents = self.documents.write().await;
        let len_before = documents.len();
        documents.retain(|d| d.id != id);
        Ok(documents.len() < len_before)
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.documents.read().await.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docchat_core::document::{Page, PageSummary};

    fn make_payload(filename: &str) -> OcrPayload {
        OcrPayload {
            file_name: filename.into(),
            completion_time: 10,
            input_tokens: 1,
            output_tokens: 1,
            pages: vec![Page {
                page: 1,
                content: "content".into(),
                content_length: 7,
            }],
            summary: PageSummary {
                total_pages: 1,
                successful_pages: 1,
                failed_pages: 0,
            },
        }
    }

    #[tokio::test]
    async fn create_list_delete() {
        let store = InMemoryStore::new();
        let a = store
            .create_document("a.pdf", b"%PDF", &make_payload("a.pdf"))
            .await
            .unwrap();
        store
            .create_document("b.pdf", b"%PDF", &make_payload("b.pdf"))
            .await
            .unwrap();

        let docs = store.list_documents().await.unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].filename, "b.pdf"); // newest first

        assert!(store.delete_document(&a.id).await.unwrap());
        assert!(!store.delete_document(&a.id).await.unwrap());
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn find_omits_absent_ids() {
        let store = InMemoryStore::new();
        let a = store
            .create_document("a.pdf", b"%PDF", &make_payload("a.pdf"))
            .await
            .unwrap();

        let results = store
            .find_ocr_results(&[a.id.clone(), "missing".into()])
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].1.filename, "a.pdf");
    }
}
