//! Model Invoker — the only component in the flow path that performs I/O.
//!
//! The backend is a single-method capability (`ModelBackend`) injected at
//! construction: `LlmClient` in production, a deterministic stub in tests.
//! `ModelInvoker` wraps it with one deadline for the whole call and a single
//! retry on transient failures using a fixed backoff. The retry only runs when
//! the backoff ends before the deadline; it gets whatever time is left.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::flows::schema::Schema;
use crate::llm_client::prompts::JSON_ONLY_SYSTEM;

// ────────────────────────────────────────────────────────────────────────────
// Errors
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelErrorKind {
    Timeout,
    RateLimited,
    Refused,
    MalformedOutput,
    Unavailable,
}

impl ModelErrorKind {
    /// Transient kinds get one more attempt; Refused / MalformedOutput never do.
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            ModelErrorKind::Timeout | ModelErrorKind::RateLimited | ModelErrorKind::Unavailable
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ModelErrorKind::Timeout => "timeout",
            ModelErrorKind::RateLimited => "rate_limited",
            ModelErrorKind::Refused => "refused",
            ModelErrorKind::MalformedOutput => "malformed_output",
            ModelErrorKind::Unavailable => "unavailable",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("model {}: {message}", .kind.as_str())]
pub struct ModelError {
    pub kind: ModelErrorKind,
    pub message: String,
}

impl ModelError {
    pub fn new(kind: ModelErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn timeout(after: Duration) -> Self {
        Self::new(
            ModelErrorKind::Timeout,
            format!("no response within {}ms", after.as_millis()),
        )
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(ModelErrorKind::RateLimited, message)
    }

    pub fn refused(message: impl Into<String>) -> Self {
        Self::new(ModelErrorKind::Refused, message)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(ModelErrorKind::MalformedOutput, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(ModelErrorKind::Unavailable, message)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Backend seam
// ────────────────────────────────────────────────────────────────────────────

/// Everything a backend needs for one structured call.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRequest {
    pub flow: String,
    pub system: String,
    pub prompt: String,
    /// JSON Schema of the expected output object.
    pub output_schema: Value,
}

/// A language-model backend. One attempt per call; retries live in `ModelInvoker`.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    async fn invoke(&self, request: &ModelRequest) -> Result<Value, ModelError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Invoker
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Extra attempts after the first. Transient failures only.
    pub max_retries: u32,
    pub backoff: Duration,
    /// Bound on the whole call: every attempt plus the backoff between them.
    pub call_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 1,
            backoff: Duration::from_millis(500),
            call_timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Clone)]
pub struct ModelInvoker {
    backend: Arc<dyn ModelBackend>,
    policy: RetryPolicy,
}

impl ModelInvoker {
    pub fn new(backend: Arc<dyn ModelBackend>, policy: RetryPolicy) -> Self {
        Self { backend, policy }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Sends `prompt` to the backend, asking for an object shaped like `output_schema`.
    ///
    /// The returned object is NOT yet schema-checked; the executor does that.
    /// Dropping the returned future abandons only this invocation.
    pub async fn invoke(
        &self,
        flow: &str,
        prompt: String,
        output_schema: &Schema,
    ) -> Result<Value, ModelError> {
        let request = ModelRequest {
            flow: flow.to_string(),
            system: system_instruction(),
            prompt,
            output_schema: output_schema.to_json_schema(),
        };

        let attempts = self.policy.max_retries + 1;
        let deadline = Instant::now() + self.policy.call_timeout;
        let mut attempt = 0;

        loop {
            attempt += 1;
            let outcome = match tokio::time::timeout_at(deadline, self.backend.invoke(&request)).await
            {
                Ok(result) => result,
                Err(_) => Err(ModelError::timeout(self.policy.call_timeout)),
            };

            match outcome {
                Ok(value) if value.is_object() => {
                    debug!("flow '{}' model call succeeded on attempt {}", flow, attempt);
                    return Ok(value);
                }
                Ok(other) => {
                    return Err(ModelError::malformed(format!(
                        "expected a JSON object, got {}",
                        truncate(&other.to_string(), 80)
                    )));
                }
                Err(err) if err.kind.is_transient() && attempt < attempts => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if remaining <= self.policy.backoff {
                        warn!(
                            "flow '{}' model attempt {}/{} failed ({}), no time left to retry",
                            flow, attempt, attempts, err
                        );
                        return Err(err);
                    }
                    warn!(
                        "flow '{}' model attempt {}/{} failed ({}), retrying after {}ms",
                        flow,
                        attempt,
                        attempts,
                        err,
                        self.policy.backoff.as_millis()
                    );
                    tokio::time::sleep(self.policy.backoff).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

fn system_instruction() -> String {
    format!(
        "{JSON_ONLY_SYSTEM} The JSON object MUST conform to the JSON Schema supplied with \
        this request: include every required property, use only the listed properties, \
        and omit optional properties you have nothing to say about."
    )
}

fn truncate(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flows::schema::{Field, FieldKind};
    use crate::flows::stub::StubBackend;
    use serde_json::json;

    fn schema() -> Schema {
        Schema::new(vec![Field::required("prompt", FieldKind::String, "A question")])
    }

    fn invoker(stub: &Arc<StubBackend>) -> ModelInvoker {
        ModelInvoker::new(stub.clone(), RetryPolicy::default())
    }

    #[test]
    fn test_transient_kinds() {
        assert!(ModelErrorKind::Timeout.is_transient());
        assert!(ModelErrorKind::RateLimited.is_transient());
        assert!(ModelErrorKind::Unavailable.is_transient());
        assert!(!ModelErrorKind::Refused.is_transient());
        assert!(!ModelErrorKind::MalformedOutput.is_transient());
    }

    #[test]
    fn test_model_error_display() {
        let err = ModelError::rate_limited("slow down");
        assert_eq!(err.to_string(), "model rate_limited: slow down");
    }

    #[tokio::test]
    async fn test_request_carries_schema_and_json_instruction() {
        let stub = Arc::new(StubBackend::new(vec![Ok(json!({"prompt": "Hi?"}))]));
        let value = invoker(&stub)
            .invoke("getOralFluencyPrompt", "Ask something".to_string(), &schema())
            .await
            .unwrap();

        assert_eq!(value, json!({"prompt": "Hi?"}));
        let request = stub.last_request().unwrap();
        assert_eq!(request.flow, "getOralFluencyPrompt");
        assert_eq!(request.prompt, "Ask something");
        assert_eq!(request.output_schema["required"], json!(["prompt"]));
        assert!(request.system.contains("valid JSON only"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_retry_on_transient_then_success() {
        let stub = Arc::new(StubBackend::new(vec![
            Err(ModelError::unavailable("503")),
            Ok(json!({"prompt": "Hi?"})),
        ]));
        let value = invoker(&stub)
            .invoke("f", "p".to_string(), &schema())
            .await
            .unwrap();
        assert_eq!(value["prompt"], "Hi?");
        assert_eq!(stub.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_two_transient_failures_surface_without_third_attempt() {
        let stub = Arc::new(StubBackend::new(vec![
            Err(ModelError::rate_limited("429")),
            Err(ModelError::rate_limited("429 again")),
            Ok(json!({"prompt": "never reached"})),
        ]));
        let err = invoker(&stub)
            .invoke("f", "p".to_string(), &schema())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ModelErrorKind::RateLimited);
        assert_eq!(err.message, "429 again");
        assert_eq!(stub.calls(), 2);
    }

    #[tokio::test]
    async fn test_refused_and_malformed_are_not_retried() {
        for failure in [ModelError::refused("no"), ModelError::malformed("garbage")] {
            let kind = failure.kind;
            let stub = Arc::new(StubBackend::new(vec![
                Err(failure),
                Ok(json!({"prompt": "x"})),
            ]));
            let err = invoker(&stub)
                .invoke("f", "p".to_string(), &schema())
                .await
                .unwrap_err();
            assert_eq!(err.kind, kind);
            assert_eq!(stub.calls(), 1);
        }
    }

    #[tokio::test]
    async fn test_non_object_result_is_malformed() {
        let stub = Arc::new(StubBackend::new(vec![Ok(json!(["not", "an", "object"]))]));
        let err = invoker(&stub)
            .invoke("f", "p".to_string(), &schema())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ModelErrorKind::MalformedOutput);
        assert_eq!(stub.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stuck_backend_is_bounded_by_call_timeout() {
        let stub = Arc::new(StubBackend::hanging());
        let policy = RetryPolicy {
            max_retries: 1,
            backoff: Duration::from_millis(500),
            call_timeout: Duration::from_secs(60),
        };
        let started = Instant::now();
        let err = ModelInvoker::new(stub.clone(), policy)
            .invoke("f", "p".to_string(), &schema())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ModelErrorKind::Timeout);
        assert!(started.elapsed() <= policy.call_timeout);
        assert_eq!(stub.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_after_fast_failure_shares_the_deadline() {
        let stub = Arc::new(StubBackend::hanging_after(vec![Err(ModelError::unavailable("503"))]));
        let policy = RetryPolicy {
            max_retries: 1,
            backoff: Duration::from_millis(100),
            call_timeout: Duration::from_secs(2),
        };
        let started = Instant::now();
        let err = ModelInvoker::new(stub.clone(), policy)
            .invoke("f", "p".to_string(), &schema())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ModelErrorKind::Timeout);
        assert!(started.elapsed() <= policy.call_timeout);
        assert_eq!(stub.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_retry_when_backoff_outlasts_deadline() {
        let stub = Arc::new(StubBackend::new(vec![
            Err(ModelError::rate_limited("429")),
            Ok(json!({"prompt": "too late"})),
        ]));
        let policy = RetryPolicy {
            max_retries: 1,
            backoff: Duration::from_secs(5),
            call_timeout: Duration::from_secs(2),
        };
        let err = ModelInvoker::new(stub.clone(), policy)
            .invoke("f", "p".to_string(), &schema())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ModelErrorKind::RateLimited);
        assert_eq!(stub.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_one_invocation_leaves_others_running() {
        let stub = Arc::new(StubBackend::new(vec![Ok(json!({"prompt": "kept"}))]));
        let invoker = invoker(&stub);

        let hanging = Arc::new(StubBackend::hanging());
        let cancelled = ModelInvoker::new(hanging.clone(), RetryPolicy::default());
        let handle = tokio::spawn(async move {
            cancelled.invoke("f", "p".to_string(), &schema()).await
        });
        tokio::task::yield_now().await;
        handle.abort();

        let value = invoker
            .invoke("f", "p".to_string(), &schema())
            .await
            .unwrap();
        assert_eq!(value["prompt"], "kept");
    }
}
