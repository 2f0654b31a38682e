//! Document and OCR payload types.
//!
//! `OcrPayload` is the one semi-stable wire format in the system: it is
//! stored as serialized JSON inside the `ocr_results.content` column, and
//! existing rows must remain readable. Field names are camelCase on the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored document: the uploaded PDF plus metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique ID (uuid v4), stable for the document's lifetime.
    pub id: String,

    /// Original filename of the upload.
    pub filename: String,

    /// The raw PDF bytes, base64-encoded.
    pub content: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// The OCR result row, embedded on list/create responses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocr_result: Option<OcrRecord>,
}

/// One row of the `ocr_results` table: a serialized `OcrPayload` keyed by
/// its parent document (one-to-one).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrRecord {
    pub id: String,

    /// Foreign key to the parent [`Document`].
    pub document_id: String,

    /// Serialized [`OcrPayload`] JSON.
    pub content: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OcrRecord {
    /// Deserialize the stored payload.
    pub fn payload(&self) -> serde_json::Result<OcrPayload> {
        serde_json::from_str(&self.content)
    }
}

/// The structured per-page OCR output for one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrPayload {
    pub file_name: String,

    /// Wall-clock time the OCR run took, in milliseconds.
    pub completion_time: u64,

    pub input_tokens: u64,
    pub output_tokens: u64,

    /// Non-empty for any successfully stored result. Populated in processing
    /// order; render order is ascending `page` number, not array position.
    pub pages: Vec<Page>,

    pub summary: PageSummary,
}

/// A single OCR'd page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    /// 1-based page index, unique within a payload.
    pub page: u32,

    /// Extracted text for this page.
    pub content: String,

    pub content_length: u64,
}

/// Per-document page counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSummary {
    pub total_pages: u32,
    pub successful_pages: u32,
    pub failed_pages: u32,
}

/// Ephemeral per-request aggregation of selected documents' text.
///
/// Produced by the context assembler; lifetime is one chat request. Never
/// persisted and never shared between concurrent assembly calls.
#[derive(Debug, Clone)]
pub struct ContextBundle {
    /// Per-document renderings, in deterministic (input-id) order.
    pub documents: Vec<RenderedDocument>,

    /// All renderings joined with the `\n\n---\n\n` separator.
    pub combined_text: String,
}

/// One document's contribution to a [`ContextBundle`].
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub filename: String,
    pub rendered_text: String,
}
