//! Remote adapters for docchat's two external collaborators:
//! the OCR engine and the hosted answering flow.
//!
//! Both are single-shot HTTP calls with bounded timeouts and no built-in
//! retry; retry policy, if any, belongs to the caller.

pub mod answer;
pub mod ocr;

pub use answer::FlowAnswerer;
pub use ocr::RemoteOcrEngine;
