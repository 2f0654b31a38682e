//! Error types for the docchat domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all docchat operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Store errors ---
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    // --- OCR errors ---
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    // --- Answering errors ---
    #[error("Answer error: {0}")]
    Answer(#[from] AnswerError),

    // --- Context assembly errors ---
    #[error("Assembly error: {0}")]
    Assembly(#[from] AssemblyError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Document not found: {0}")]
    NotFound(String),
}

#[derive(Debug, Clone, Error)]
pub enum OcrError {
    #[error("OCR API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by OCR engine, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("OCR returned no pages for {0}")]
    EmptyResult(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Clone, Error)]
pub enum AnswerError {
    #[error("Flow API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Malformed flow response: {0}")]
    MalformedResponse(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Errors from context assembly.
///
/// All three caller-facing variants are terminal for the request — the
/// caller surfaces them as user-facing messages, not retries.
#[derive(Debug, Error)]
pub enum AssemblyError {
    #[error("No documents selected")]
    NoDocumentsSelected,

    #[error("No OCR results found for selected documents")]
    NoResultsFound,

    #[error("Malformed OCR payload for document '{filename}': {reason}")]
    MalformedResult { filename: String, reason: String },

    #[error("Store error during assembly: {0}")]
    Store(#[from] StoreError),
}
