//! Context assembly pipeline — the core architectural component.
//!
//! Turns a caller-supplied set of document ids plus a free-text question into
//! a single grounding prompt for the answering backend, failing predictably
//! when inputs are invalid or inconsistent.
//!
//! # Determinism
//!
//! Assembly is deterministic: documents are rendered in the caller's
//! `document_ids` order (duplicates contribute once, first occurrence wins)
//! and pages within a document in ascending page number. The store's return
//! order is never trusted for either.
//!
//! # Freshness
//!
//! No caching: every call re-fetches and re-renders from scratch, so a
//! deletion between selection and assembly simply drops that document from
//! the bundle. This is a deliberate simplicity choice, not an oversight.

pub mod assembler;

pub use assembler::{AssembledPrompt, ContextAssembler};
