//! The context assembler.
//!
//! # Algorithm
//!
//! 1. Reject an empty selection (`NoDocumentsSelected`)
//! 2. One set-membership fetch of OCR results joined with their documents;
//!    absent ids are silently omitted
//! 3. Reject an empty fetch result (`NoResultsFound`)
//! 4. Parse each stored payload; the first malformed record aborts the whole
//!    assembly (`MalformedResult` naming the offending document)
//! 5. Render each document as `Document: {filename}` followed by its pages
//!    in ascending page-number order, pages joined by a blank line
//! 6. Join documents with `\n\n---\n\n` in input-id order
//! 7. Wrap the combined text and the question into the final prompt

use std::sync::Arc;

use docchat_core::document::{ContextBundle, OcrPayload, RenderedDocument};
use docchat_core::error::AssemblyError;
use docchat_core::store::DocumentStore;
use tracing::debug;

/// Separator between per-document renderings.
const DOCUMENT_SEPARATOR: &str = "\n\n---\n\n";
/// Separator between pages within one document.
const PAGE_SEPARATOR: &str = "\n\n";

/// The assembled grounding context plus the final prompt string.
#[derive(Debug, Clone)]
pub struct AssembledPrompt {
    /// The per-request bundle; lifetime is this request only.
    pub bundle: ContextBundle,
    /// The full prompt handed to the answering backend by the caller.
    pub prompt: String,
}

/// The context assembler. Stateless besides its store handle — create one
/// and share it across requests; concurrent calls never share bundles.
pub struct ContextAssembler {
    store: Arc<dyn DocumentStore>,
}

impl ContextAssembler {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Assemble grounding context for `document_ids` and wrap `question`
    /// into the final prompt.
    ///
    /// Read-only against the store; performs no network calls. All error
    /// variants are terminal for the request.
    pub async fn assemble(
        &self,
        document_ids: &[String],
        question: &str,
    ) -> Result<AssembledPrompt, AssemblyError> {
        if document_ids.is_empty() {
            return Err(AssemblyError::NoDocumentsSelected);
        }

        let fetched = self.store.find_ocr_results(document_ids).await?;
        if fetched.is_empty() {
            return Err(AssemblyError::NoResultsFound);
        }

        // Deterministic order: the caller's id order, first occurrence wins.
        let mut documents: Vec<RenderedDocument> = Vec::with_capacity(fetched.len());
        let mut seen: Vec<&str> = Vec::with_capacity(fetched.len());

        for id in document_ids {
            if seen.contains(&id.as_str()) {
                continue;
            }
            let Some((record, doc)) = fetched.iter().find(|(_, d)| d.id == *id) else {
                // Deleted or never existed: the set-membership fetch already
                // omitted it, and so do we.
                continue;
            };
            seen.push(id.as_str());

            let payload: OcrPayload =
                record
                    .payload()
                    .map_err(|e| AssemblyError::MalformedResult {
                        filename: doc.filename.clone(),
                        reason: e.to_string(),
                    })?;

            documents.push(RenderedDocument {
                filename: doc.filename.clone(),
                rendered_text: render_document(&doc.filename, &payload),
            });
        }

        let combined_text = documents
            .iter()
            .map(|d| d.rendered_text.as_str())
            .collect::<Vec<_>>()
            .join(DOCUMENT_SEPARATOR);

        let prompt = format!(
            "Context from documents:\n{combined_text}\n\nUser question: {question}"
        );

        debug!(
            documents = documents.len(),
            prompt_len = prompt.len(),
            "Assembled document context"
        );

        Ok(AssembledPrompt {
            bundle: ContextBundle {
                documents,
                combined_text,
            },
            prompt,
        })
    }
}

/// Render one document: header line plus pages in ascending page-number
/// order. Array position is populated in processing order and is not
/// trusted — pages are sorted defensively.
fn render_document(filename: &str, payload: &OcrPayload) -> String {
    let mut pages: Vec<_> = payload.pages.iter().collect();
    pages.sort_by_key(|p| p.page);

    let body = pages
        .iter()
        .map(|p| p.content.as_str())
        .collect::<Vec<_>>()
        .join(PAGE_SEPARATOR);

    format!("Document: {filename}\n{body}")
}
