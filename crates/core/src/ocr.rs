//! OcrEngine trait — the abstraction over the external OCR pipeline.
//!
//! The engine takes a PDF byte buffer and returns structured per-page text.
//! Whether the implementation writes temp files, shells out, or calls a
//! hosted API is invisible to callers; any temporary artifacts are the
//! implementation's responsibility to release.

use async_trait::async_trait;

use crate::document::OcrPayload;
use crate::error::OcrError;

/// The core OcrEngine trait.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// The engine name (e.g., "remote").
    fn name(&self) -> &str;

    /// Run OCR over a PDF byte buffer.
    ///
    /// On success the payload's `pages` is non-empty and every page's
    /// `content_length` equals `content.len()`.
    async fn run_ocr(
        &self,
        raw_pdf: &[u8],
        filename: &str,
    ) -> std::result::Result<OcrPayload, OcrError>;
}
