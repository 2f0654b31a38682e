//! # docchat Core
//!
//! Domain types, traits, and error definitions for the docchat service.
//! This crate has **zero framework dependencies** — it defines the domain model
//! that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator (document store, OCR engine, answering backend)
//! is defined as a trait here. Implementations live in their respective crates.
//! This enables:
//! - Swapping implementations via configuration
//! - Easy testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod answer;
pub mod document;
pub mod error;
pub mod ocr;
pub mod store;

// Re-export key types at crate root for ergonomics
pub use answer::Answerer;
pub use document::{ContextBundle, Document, OcrPayload, OcrRecord, Page, PageSummary, RenderedDocument};
pub use error::{AnswerError, AssemblyError, Error, OcrError, Result, StoreError};
pub use ocr::OcrEngine;
pub use store::DocumentStore;
