//! Remote OCR engine.
//!
//! Buffer-in, struct-out: the PDF bytes travel as a base64 data URL inside
//! the request body, so the adapter never touches the filesystem and has
//! nothing to clean up. Whatever the hosted engine does with temp files is
//! its own business.

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use docchat_config::OcrConfig;
use docchat_core::document::{OcrPayload, Page, PageSummary};
use docchat_core::error::OcrError;
use docchat_core::ocr::OcrEngine;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// OCR engine backed by a hosted OCR API.
pub struct RemoteOcrEngine {
    name: String,
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl RemoteOcrEngine {
    /// Create a new engine with default base URL, model, and timeout.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_timeout(api_key, DEFAULT_TIMEOUT)
    }

    /// Create with an explicit request timeout. OCR runs take tens of
    /// seconds; the timeout bounds an otherwise unbounded external call.
    pub fn with_timeout(api_key: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            name: "remote".into(),
            base_url: DEFAULT_BASE_URL.into(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.into(),
            client,
        }
    }

    /// Create from configuration.
    pub fn from_config(config: &OcrConfig) -> Self {
        Self::with_timeout(
            config.api_key.clone().unwrap_or_default(),
            Duration::from_secs(config.timeout_secs),
        )
        .with_base_url(&config.api_url)
        .with_model(&config.model)
    }

    /// Override the base URL (e.g., for testing or proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Override the OCR model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Build an `OcrPayload` from the API response, enforcing the result
    /// guarantee: non-empty pages, `content_length == content.len()`.
    fn payload_from_response(
        filename: &str,
        elapsed_ms: u64,
        resp: OcrApiResponse,
    ) -> Result<OcrPayload, OcrError> {
        if resp.pages.is_empty() {
            return Err(OcrError::EmptyResult(filename.to_string()));
        }

        let pages: Vec<Page> = resp
            .pages
            .into_iter()
            .map(|p| Page {
                page: p.page.max(1),
                content_length: p.content.len() as u64,
                content: p.content,
            })
            .collect();

        let total = pages.len() as u32;
        let usage = resp.usage.unwrap_or_default();

        Ok(OcrPayload {
            file_name: filename.to_string(),
            completion_time: elapsed_ms,
            input_tokens: usage.input_tokens,
            output_tokens: usage.output_tokens,
            pages,
            summary: PageSummary {
                total_pages: total,
                successful_pages: total,
                failed_pages: 0,
            },
        })
    }
}

#[async_trait]
impl OcrEngine for RemoteOcrEngine {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run_ocr(&self, raw_pdf: &[u8], filename: &str) -> Result<OcrPayload, OcrError> {
        let url = format!("{}/v1/ocr", self.base_url);
        let document = format!("data:application/pdf;base64,{}", BASE64.encode(raw_pdf));

        let body = serde_json::json!({
            "model": self.model,
            "file_name": filename,
            "document": document,
        });

        debug!(filename, bytes = raw_pdf.len(), "Sending OCR request");
        let started = Instant::now();

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    OcrError::Timeout(format!("OCR request for {filename}: {e}"))
                } else {
                    OcrError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();

        if status == 429 {
            return Err(OcrError::RateLimited {
                retry_after_secs: 5,
            });
        }
        if status == 401 || status == 403 {
            return Err(OcrError::AuthenticationFailed("Invalid OCR API key".into()));
        }
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "OCR API error");
            return Err(OcrError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let api_resp: OcrApiResponse = response.json().await.map_err(|e| OcrError::ApiError {
            status_code: 200,
            message: format!("Failed to parse OCR response: {e}"),
        })?;

        let elapsed_ms = started.elapsed().as_millis() as u64;
        let payload = Self::payload_from_response(filename, elapsed_ms, api_resp)?;

        debug!(
            filename,
            pages = payload.pages.len(),
            elapsed_ms,
            "OCR complete"
        );
        Ok(payload)
    }
}

// --- OCR API types ---

#[derive(Debug, Deserialize)]
struct OcrApiResponse {
    pages: Vec<ApiPage>,
    #[serde(default)]
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiPage {
    #[serde(default)]
    page: u32,
    #[serde(default)]
    content: String,
}

#[derive(Debug, Default, Deserialize)]
struct ApiUsage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructor() {
        let engine = RemoteOcrEngine::new("sk-test");
        assert_eq!(engine.name(), "remote");
        assert_eq!(engine.base_url, DEFAULT_BASE_URL);
        assert_eq!(engine.model, DEFAULT_MODEL);
    }

    #[test]
    fn builder_overrides() {
        let engine = RemoteOcrEngine::new("sk-test")
            .with_base_url("https://ocr.example.com/")
            .with_model("ocr-large");
        assert_eq!(engine.base_url, "https://ocr.example.com");
        assert_eq!(engine.model, "ocr-large");
    }

    #[test]
    fn from_config_uses_config_values() {
        let config = OcrConfig {
            api_url: "https://proxy.internal".into(),
            api_key: Some("sk-cfg".into()),
            model: "ocr-mini".into(),
            timeout_secs: 30,
        };
        let engine = RemoteOcrEngine::from_config(&config);
        assert_eq!(engine.base_url, "https://proxy.internal");
        assert_eq!(engine.model, "ocr-mini");
    }

    #[test]
    fn parse_response_fills_payload() {
        let resp: OcrApiResponse = serde_json::from_str(
            r#"{
                "pages": [
                    {"page": 1, "content": "Total: $10"},
                    {"page": 2, "content": "Thank you"}
                ],
                "usage": {"input_tokens": 1200, "output_tokens": 340}
            }"#,
        )
        .unwrap();

        let payload =
            RemoteOcrEngine::payload_from_response("invoice.pdf", 4200, resp).unwrap();
        assert_eq!(payload.file_name, "invoice.pdf");
        assert_eq!(payload.completion_time, 4200);
        assert_eq!(payload.input_tokens, 1200);
        assert_eq!(payload.output_tokens, 340);
        assert_eq!(payload.pages.len(), 2);
        assert_eq!(payload.pages[0].page, 1);
        assert_eq!(payload.pages[0].content_length, 10);
        assert_eq!(payload.summary.total_pages, 2);
        assert_eq!(payload.summary.successful_pages, 2);
        assert_eq!(payload.summary.failed_pages, 0);
    }

    #[test]
    fn parse_response_without_usage() {
        let resp: OcrApiResponse =
            serde_json::from_str(r#"{"pages": [{"page": 1, "content": "x"}]}"#).unwrap();
        let payload = RemoteOcrEngine::payload_from_response("a.pdf", 10, resp).unwrap();
        assert_eq!(payload.input_tokens, 0);
        assert_eq!(payload.output_tokens, 0);
    }

    #[test]
    fn empty_pages_rejected() {
        let resp: OcrApiResponse = serde_json::from_str(r#"{"pages": []}"#).unwrap();
        let err = RemoteOcrEngine::payload_from_response("blank.pdf", 10, resp).unwrap_err();
        match err {
            OcrError::EmptyResult(filename) => assert_eq!(filename, "blank.pdf"),
            other => panic!("Expected EmptyResult, got {other:?}"),
        }
    }

    #[test]
    fn zero_page_number_clamped_to_one() {
        let resp: OcrApiResponse =
            serde_json::from_str(r#"{"pages": [{"content": "no page field"}]}"#).unwrap();
        let payload = RemoteOcrEngine::payload_from_response("a.pdf", 10, resp).unwrap();
        assert_eq!(payload.pages[0].page, 1);
    }

    #[test]
    fn content_length_tracks_content() {
        let resp: OcrApiResponse = serde_json::from_str(
            r#"{"pages": [{"page": 1, "content": "naïve café"}]}"#,
        )
        .unwrap();
        let payload = RemoteOcrEngine::payload_from_response("a.pdf", 10, resp).unwrap();
        assert_eq!(
            payload.pages[0].content_length,
            payload.pages[0].content.len() as u64
        );
    }
}
