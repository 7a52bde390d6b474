/// LLM Client — the production `ModelBackend`, backed by the Anthropic Messages API.
///
/// ARCHITECTURAL RULE: No other module may call the Anthropic API directly.
/// Flows reach the model only through `ModelInvoker`, which owns timeouts and retries;
/// this client makes exactly one HTTP attempt per call.
///
/// Model: claude-sonnet-4-5 (hardcoded — do not make configurable to prevent drift)
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::flows::invoker::{ModelBackend, ModelError, ModelErrorKind, ModelRequest};

pub mod prompts;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
/// The model used for all flows.
pub const MODEL: &str = "claude-sonnet-4-5";
const MAX_TOKENS: u32 = 4096;

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct LlmResponse {
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub stop_reason: Option<String>,
    pub usage: Usage,
}

#[derive(Debug, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl LlmResponse {
    /// Extracts the text content from the first text block.
    pub fn text(&self) -> Option<&str> {
        self.content
            .iter()
            .find(|b| b.block_type == "text")
            .and_then(|b| b.text.as_deref())
    }

    pub fn is_refusal(&self) -> bool {
        self.stop_reason.as_deref() == Some("refusal")
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorBody,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorBody {
    message: String,
}

#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
}

impl LlmClient {
    pub fn new(api_key: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client, api_key })
    }

    /// Makes one raw call to the Claude API and classifies any failure.
    pub async fn call(&self, prompt: &str, system: &str) -> Result<LlmResponse, ModelError> {
        let request_body = AnthropicRequest {
            model: MODEL,
            max_tokens: MAX_TOKENS,
            system,
            messages: vec![AnthropicMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request_body)
            .send()
            .await
            .map_err(classify_transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<AnthropicError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            warn!("LLM API returned {}: {}", status, message);
            return Err(classify_status(status.as_u16(), message));
        }

        let llm_response: LlmResponse = response
            .json()
            .await
            .map_err(|e| ModelError::malformed(format!("unreadable API response: {e}")))?;

        debug!(
            "LLM call succeeded: input_tokens={}, output_tokens={}",
            llm_response.usage.input_tokens, llm_response.usage.output_tokens
        );

        Ok(llm_response)
    }
}

#[async_trait]
impl ModelBackend for LlmClient {
    async fn invoke(&self, request: &ModelRequest) -> Result<Value, ModelError> {
        let system = format!(
            "{}\n\nOUTPUT JSON SCHEMA:\n{}",
            request.system, request.output_schema
        );
        let response = self.call(&request.prompt, &system).await?;
        decode_response(&response)
    }
}

fn decode_response(response: &LlmResponse) -> Result<Value, ModelError> {
    if response.is_refusal() {
        return Err(ModelError::refused("model declined to answer"));
    }
    let text = response
        .text()
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ModelError::malformed("LLM returned empty content"))?;
    serde_json::from_str(strip_json_fences(text))
        .map_err(|e| ModelError::malformed(format!("response is not JSON: {e}")))
}

fn classify_status(status: u16, message: String) -> ModelError {
    let kind = match status {
        429 => ModelErrorKind::RateLimited,
        // Credential failures surface as an outage.
        401 | 403 => ModelErrorKind::Unavailable,
        500..=599 => ModelErrorKind::Unavailable,
        _ => ModelErrorKind::Refused,
    };
    ModelError::new(kind, format!("status {status}: {message}"))
}

fn classify_transport(err: reqwest::Error) -> ModelError {
    if err.is_timeout() {
        ModelError::new(ModelErrorKind::Timeout, err.to_string())
    } else {
        ModelError::unavailable(err.to_string())
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(stripped) = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
    else {
        return text;
    };
    let stripped = stripped.trim_start();
    stripped
        .strip_suffix("```")
        .map(|s| s.trim())
        .unwrap_or(stripped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(body: Value) -> LlmResponse {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        let input = "{\"key\": \"value\"}";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_classify_status() {
        assert_eq!(
            classify_status(429, "slow".into()).kind,
            ModelErrorKind::RateLimited
        );
        assert_eq!(
            classify_status(529, "overloaded".into()).kind,
            ModelErrorKind::Unavailable
        );
        assert_eq!(
            classify_status(401, "bad key".into()).kind,
            ModelErrorKind::Unavailable
        );
        assert_eq!(
            classify_status(400, "bad request".into()).kind,
            ModelErrorKind::Refused
        );
    }

    #[test]
    fn test_decode_fenced_json_response() {
        let value = decode_response(&response(json!({
            "content": [{"type": "text", "text": "```json\n{\"prompt\": \"Hi?\"}\n```"}],
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 10, "output_tokens": 5}
        })))
        .unwrap();
        assert_eq!(value, json!({"prompt": "Hi?"}));
    }

    #[test]
    fn test_decode_refusal_and_garbage() {
        let refused = decode_response(&response(json!({
            "content": [],
            "stop_reason": "refusal",
            "usage": {"input_tokens": 10, "output_tokens": 0}
        })))
        .unwrap_err();
        assert_eq!(refused.kind, ModelErrorKind::Refused);

        let garbage = decode_response(&response(json!({
            "content": [{"type": "text", "text": "Sure! Here you go."}],
            "usage": {"input_tokens": 10, "output_tokens": 5}
        })))
        .unwrap_err();
        assert_eq!(garbage.kind, ModelErrorKind::MalformedOutput);

        let empty = decode_response(&response(json!({
            "content": [{"type": "text", "text": "  "}],
            "usage": {"input_tokens": 10, "output_tokens": 0}
        })))
        .unwrap_err();
        assert_eq!(empty.kind, ModelErrorKind::MalformedOutput);
    }
}
