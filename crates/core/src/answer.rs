//! Answerer trait — the abstraction over the question-answering backend.
//!
//! Treated as an opaque, possibly slow (tens of seconds), single-shot call.
//! Retry and backoff, if desired, belong to the implementation or its
//! caller — never to context assembly.

use async_trait::async_trait;

use crate::error::AnswerError;

/// The core Answerer trait.
#[async_trait]
pub trait Answerer: Send + Sync {
    /// The backend name (e.g., "flow").
    fn name(&self) -> &str;

    /// Send a fully assembled prompt and return the natural-language answer.
    async fn answer(&self, prompt: &str) -> std::result::Result<String, AnswerError>;
}
