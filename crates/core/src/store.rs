//! DocumentStore trait — persistence for documents and their OCR results.
//!
//! The store is plain CRUD over two related tables. The one subtlety is
//! atomicity: a Document without its OCRResult must never be observable,
//! so `create_document` writes both rows in a single transaction.

use async_trait::async_trait;

use crate::document::{Document, OcrPayload, OcrRecord};
use crate::error::StoreError;

/// The core DocumentStore trait.
///
/// Implementations: SQLite (default), in-memory (for testing).
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// The backend name (e.g., "sqlite", "memory").
    fn name(&self) -> &str;

    /// Atomically create a document together with its OCR result.
    ///
    /// `raw_bytes` are the uploaded PDF bytes; they are stored base64-encoded.
    /// Returns the created document with the OCR record embedded.
    async fn create_document(
        &self,
        filename: &str,
        raw_bytes: &[u8],
        payload: &OcrPayload,
    ) -> std::result::Result<Document, StoreError>;

    /// List all documents, newest first, each with its OCR record embedded
    /// when one exists.
    async fn list_documents(&self) -> std::result::Result<Vec<Document>, StoreError>;

    /// Fetch OCR results for all documents whose id is in `ids`, joined with
    /// the parent document. Set-membership semantics: absent ids are silently
    /// omitted, never reported individually. Return order is unspecified.
    async fn find_ocr_results(
        &self,
        ids: &[String],
    ) -> std::result::Result<Vec<(OcrRecord, Document)>, StoreError>;

    /// Delete a document and its OCR result (OCR row first). Returns `false`
    /// if no such document exists. Safe to call on a document that has no
    /// OCR row.
    async fn delete_document(&self, id: &str) -> std::result::Result<bool, StoreError>;

    /// Total number of stored documents.
    async fn count(&self) -> std::result::Result<usize, StoreError>;
}
