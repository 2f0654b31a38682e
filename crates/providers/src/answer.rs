//! Hosted answering flow adapter.
//!
//! Single-shot: one POST per question, no retries, no streaming. Retry
//! policy belongs to the caller.

use async_trait::async_trait;
use docchat_config::AnswerConfig;
use docchat_core::answer::Answerer;
use docchat_core::error::AnswerError;
use std::time::Duration;
use tracing::{debug, warn};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Answerer backed by a hosted flow endpoint (Langflow-compatible).
pub struct FlowAnswerer {
    name: String,
    flow_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl FlowAnswerer {
    pub fn new(flow_url: impl Into<String>) -> Self {
        Self::with_timeout(flow_url, DEFAULT_TIMEOUT)
    }

    /// Create with an explicit request timeout.
    pub fn with_timeout(flow_url: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            name: "flow".into(),
            flow_url: flow_url.into(),
            api_key: None,
            client,
        }
    }

    /// Create from configuration. Fails if no flow URL is configured.
    pub fn from_config(config: &AnswerConfig) -> Result<Self, AnswerError> {
        let flow_url = config.flow_url.clone().ok_or_else(|| {
            AnswerError::MalformedResponse("No flow URL configured".into())
        })?;
        let mut answerer =
            Self::with_timeout(flow_url, Duration::from_secs(config.timeout_secs));
        answerer.api_key = config.api_key.clone();
        Ok(answerer)
    }

    /// Attach a bearer token for flows that require one.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Pull the answer text out of the flow's nested response envelope.
    fn extract_answer(body: &serde_json::Value) -> Result<String, AnswerError> {
        body.pointer("/outputs/0/outputs/0/results/message/text")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| {
                AnswerError::MalformedResponse(
                    "Missing outputs[0].outputs[0].results.message.text".into(),
                )
            })
    }
}

#[async_trait]
impl Answerer for FlowAnswerer {
    fn name(&self) -> &str {
        &self.name
    }

    async fn answer(&self, prompt: &str) -> Result<String, AnswerError> {
        let body = serde_json::json!({
            "input_value": prompt,
            "output_type": "chat",
            "input_type": "chat",
            "tweaks": {},
        });

        debug!(prompt_len = prompt.len(), "Sending answer request");

        let mut request = self.client.post(&self.flow_url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                AnswerError::Timeout(format!("Answer request: {e}"))
            } else {
                AnswerError::Network(e.to_string())
            }
        })?;

        let status = response.status().as_u16();

        if status == 401 || status == 403 {
            return Err(AnswerError::AuthenticationFailed(
                "Invalid flow API key".into(),
            ));
        }
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Flow API error");
            return Err(AnswerError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let body: serde_json::Value = response.json().await.map_err(|e| {
            AnswerError::MalformedResponse(format!("Response was not JSON: {e}"))
        })?;

        let answer = Self::extract_answer(&body)?;
        debug!(answer_len = answer.len(), "Answer received");
        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flow_response(text: &str) -> serde_json::Value {
        serde_json::json!({
            "session_id": "abc",
            "outputs": [{
                "inputs": {},
                "outputs": [{
                    "results": {
                        "message": {
                            "text": text,
                            "sender": "Machine"
                        }
                    }
                }]
            }]
        })
    }

    #[test]
    fn extracts_answer_from_nested_envelope() {
        let body = flow_response("The total is $10.50.");
        let answer = FlowAnswerer::extract_answer(&body).unwrap();
        assert_eq!(answer, "The total is $10.50.");
    }

    #[test]
    fn missing_text_is_malformed() {
        let body = serde_json::json!({"outputs": [{"outputs": [{"results": {}}]}]});
        let err = FlowAnswerer::extract_answer(&body).unwrap_err();
        assert!(matches!(err, AnswerError::MalformedResponse(_)));
    }

    #[test]
    fn empty_outputs_is_malformed() {
        let body = serde_json::json!({"outputs": []});
        assert!(FlowAnswerer::extract_answer(&body).is_err());
    }

    #[test]
    fn non_string_text_is_malformed() {
        let body = serde_json::json!({
            "outputs": [{"outputs": [{"results": {"message": {"text": 42}}}]}]
        });
        assert!(FlowAnswerer::extract_answer(&body).is_err());
    }

    #[test]
    fn from_config_requires_flow_url() {
        let config = AnswerConfig {
            flow_url: None,
            api_key: None,
            timeout_secs: 60,
        };
        assert!(FlowAnswerer::from_config(&config).is_err());

        let config = AnswerConfig {
            flow_url: Some("http://localhost:7860/api/v1/run/flow-id".into()),
            api_key: Some("lf-key".into()),
            timeout_secs: 60,
        };
        let answerer = FlowAnswerer::from_config(&config).unwrap();
        assert_eq!(answerer.name(), "flow");
        assert_eq!(answerer.api_key.as_deref(), Some("lf-key"));
    }
}
