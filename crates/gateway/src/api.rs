//! Document and chat endpoints.
//!
//! Every failure is converted to a JSON `{error}` body at this boundary
//! and logged; nothing is retried here. Response bodies use camelCase
//! field names, matching what stored clients already consume.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use docchat_core::document::{Document, OcrRecord};
use docchat_core::error::{AnswerError, AssemblyError, OcrError};

use crate::SharedState;

// ── DTOs ──────────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub(crate) struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DocumentDto {
    pub id: String,
    pub filename: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocr_result: Option<OcrRecordDto>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct OcrRecordDto {
    pub id: String,
    pub document_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Document> for DocumentDto {
    fn from(doc: Document) -> Self {
        Self {
            id: doc.id,
            filename: doc.filename,
            content: doc.content,
            created_at: doc.created_at,
            updated_at: doc.updated_at,
            ocr_result: doc.ocr_result.map(OcrRecordDto::from),
        }
    }
}

impl From<OcrRecord> for OcrRecordDto {
    fn from(record: OcrRecord) -> Self {
        Self {
            id: record.id,
            document_id: record.document_id,
            content: record.content,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

#[derive(Serialize, Deserialize)]
pub(crate) struct UploadResponse {
    pub success: bool,
    pub document: DocumentDto,
}

#[derive(Serialize, Deserialize)]
pub(crate) struct DocumentListResponse {
    pub documents: Vec<DocumentDto>,
}

#[derive(Serialize, Deserialize)]
pub(crate) struct DeleteResponse {
    pub success: bool,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub document_ids: Vec<String>,
}

#[derive(Serialize, Deserialize)]
pub(crate) struct ChatResponse {
    pub message: String,
}

// ── Handlers ──────────────────────────────────────────────────────────────

/// `POST /documents` — Upload a PDF, run OCR, persist both rows.
///
/// The OCR call is awaited without holding any shared lock, so a slow
/// upload never blocks listing or chat.
pub(crate) async fn upload_document_handler(
    State(state): State<SharedState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut filename: Option<String> = None;
    let mut bytes: Option<Vec<u8>> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        api_error(StatusCode::BAD_REQUEST, format!("Invalid multipart body: {e}"))
    })? {
        if field.name() == Some("file") {
            filename = Some(
                field
                    .file_name()
                    .unwrap_or("document.pdf")
                    .to_string(),
            );
            let data = field.bytes().await.map_err(|e| {
                api_error(
                    StatusCode::BAD_REQUEST,
                    format!("Failed to read file field: {e}"),
                )
            })?;
            bytes = Some(data.to_vec());
        }
    }

    let (Some(filename), Some(bytes)) = (filename, bytes) else {
        return Err(api_error(StatusCode::BAD_REQUEST, "No file uploaded"));
    };
    if bytes.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "Uploaded file is empty"));
    }

    info!(filename = %filename, bytes = bytes.len(), "Processing PDF upload");

    let payload = state.ocr.run_ocr(&bytes, &filename).await.map_err(|e| {
        error!(filename = %filename, error = %e, "OCR failed");
        match e {
            OcrError::AuthenticationFailed(_) => {
                api_error(StatusCode::INTERNAL_SERVER_ERROR, "OCR authentication failed")
            }
            other => api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to process PDF: {other}"),
            ),
        }
    })?;

    let document = state
        .store
        .create_document(&filename, &bytes, &payload)
        .await
        .map_err(|e| {
            error!(filename = %filename, error = %e, "Failed to persist document");
            api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to store document: {e}"),
            )
        })?;

    info!(id = %document.id, pages = payload.pages.len(), "Document stored");

    Ok(Json(UploadResponse {
        success: true,
        document: document.into(),
    }))
}

/// `GET /documents` — List all documents, newest first.
pub(crate) async fn list_documents_handler(
    State(state): State<SharedState>,
) -> Result<Json<DocumentListResponse>, ApiError> {
    let documents = state.store.list_documents().await.map_err(|e| {
        error!(error = %e, "Failed to list documents");
        api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to fetch documents: {e}"),
        )
    })?;

    Ok(Json(DocumentListResponse {
        documents: documents.into_iter().map(DocumentDto::from).collect(),
    }))
}

/// `DELETE /documents/{id}` — Delete a document and its OCR result.
pub(crate) async fn delete_document_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let deleted = state.store.delete_document(&id).await.map_err(|e| {
        error!(id = %id, error = %e, "Failed to delete document");
        api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to delete document: {e}"),
        )
    })?;

    if !deleted {
        return Err(api_error(StatusCode::NOT_FOUND, "Document not found"));
    }

    info!(id = %id, "Document deleted");
    Ok(Json(DeleteResponse { success: true }))
}

/// `POST /chat` — Answer a question grounded in the selected documents.
pub(crate) async fn chat_handler(
    State(state): State<SharedState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    info!(
        documents = payload.document_ids.len(),
        message_len = payload.message.len(),
        "Chat request"
    );

    let assembled = state
        .assembler
        .assemble(&payload.document_ids, &payload.message)
        .await
        .map_err(|e| match e {
            AssemblyError::NoDocumentsSelected => {
                api_error(StatusCode::BAD_REQUEST, "No documents selected")
            }
            AssemblyError::NoResultsFound => api_error(
                StatusCode::NOT_FOUND,
                "No OCR results found for selected documents",
            ),
            AssemblyError::MalformedResult { .. } => {
                error!(error = %e, "Context assembly failed");
                api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
            AssemblyError::Store(inner) => {
                error!(error = %inner, "Store failure during assembly");
                api_error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Failed to fetch documents: {inner}"),
                )
            }
        })?;

    let answer = state
        .answerer
        .answer(&assembled.prompt)
        .await
        .map_err(|e| {
            error!(error = %e, "Answering failed");
            match e {
                AnswerError::Timeout(_) => {
                    warn!("Answer backend timed out");
                    api_error(StatusCode::INTERNAL_SERVER_ERROR, "Answering timed out")
                }
                other => api_error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Failed to get answer: {other}"),
                ),
            }
        })?;

    Ok(Json(ChatResponse { message: answer }))
}

// ── Tests ─────────────────────────────────────────────────────────────────
