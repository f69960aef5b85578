//! Minimal single-shot LLM client for user-intent classification.
//!
//! One POST per classification, Anthropic-style messages wire format. The
//! API key is read from the configured environment variable at request
//! time and never logged or stored. Redirects are disabled; the caller
//! wraps the whole call in a timeout and falls back to the heuristic
//! verdict on any failure.

use std::time::Duration;

use serde::Deserialize;
use serde_json::json;

use warden_types::{LlmEndpointConfig, WardenError};

/// Maximum completion size we ever need for a one-line JSON verdict.
const MAX_TOKENS: u32 = 256;

/// Async single-shot completion client.
pub struct LlmClient {
    http: reqwest::Client,
    config: LlmEndpointConfig,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

impl LlmClient {
    pub fn new(config: LlmEndpointConfig) -> Result<Self, WardenError> {
        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent("warden/0.4")
            .build()
            .map_err(|e| WardenError::ClassifyError(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http, config })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.timeout_secs)
    }

    /// Send one user prompt and return the first text block of the reply.
    pub async fn complete(&self, prompt: &str) -> Result<String, WardenError> {
        let api_key = std::env::var(&self.config.api_key_env).map_err(|_| {
            WardenError::ClassifyError(format!(
                "API key environment variable {} is not set",
                self.config.api_key_env
            ))
        })?;

        let body = json!({
            "model": self.config.model,
            "max_tokens": MAX_TOKENS,
            "messages": [{"role": "user", "content": prompt}],
        });

        let response = self
            .http
            .post(format!("{}/v1/messages", self.config.endpoint_url.trim_end_matches('/')))
            .header("x-api-key", api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&body)
            .send()
            .await
            .map_err(|e| WardenError::ClassifyError(format!("classification request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(WardenError::ClassifyError(format!(
                "classification endpoint returned {status}"
            )));
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|e| WardenError::ClassifyError(format!("bad classification response: {e}")))?;

        completion
            .content
            .into_iter()
            .map(|b| b.text)
            .find(|t| !t.is_empty())
            .ok_or_else(|| WardenError::ClassifyError("empty classification response".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_shape_parses() {
        let json = r#"{"content":[{"type":"text","text":"{\"verdict\":\"safe\"}"}]}"#;
        let parsed: CompletionResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.content.len(), 1);
        assert!(parsed.content[0].text.contains("safe"));
    }

    #[test]
    fn empty_content_is_tolerated_by_parser() {
        let parsed: CompletionResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.content.is_empty());
    }
}
