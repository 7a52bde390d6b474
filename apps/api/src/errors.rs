use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::flows::invoker::ModelErrorKind;
use crate::flows::registry::FlowError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Flow(#[from] FlowError),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String, Option<Value>) {
        match self {
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone(), None)
            }
            AppError::Flow(err) => flow_parts(err),
        }
    }
}

fn flow_parts(err: &FlowError) -> (StatusCode, &'static str, String, Option<Value>) {
    match err {
        FlowError::InputInvalid(errors) => (
            StatusCode::BAD_REQUEST,
            "INPUT_INVALID",
            err.to_string(),
            Some(json!(errors.errors)),
        ),
        FlowError::FlowNotFound(_) => (StatusCode::NOT_FOUND, "FLOW_NOT_FOUND", err.to_string(), None),
        FlowError::OutputInvalid(errors) => {
            tracing::error!("{err}");
            (
                StatusCode::BAD_GATEWAY,
                "OUTPUT_INVALID",
                "The AI model returned an unusable answer".to_string(),
                Some(json!(errors.errors)),
            )
        }
        FlowError::Model(model) => {
            let (status, code) = match model.kind {
                ModelErrorKind::Refused => (StatusCode::UNPROCESSABLE_ENTITY, "MODEL_REFUSED"),
                ModelErrorKind::RateLimited => (StatusCode::TOO_MANY_REQUESTS, "MODEL_RATE_LIMITED"),
                ModelErrorKind::MalformedOutput => (StatusCode::BAD_GATEWAY, "MODEL_MALFORMED_OUTPUT"),
                ModelErrorKind::Unavailable => (StatusCode::SERVICE_UNAVAILABLE, "MODEL_UNAVAILABLE"),
                ModelErrorKind::Timeout => (StatusCode::GATEWAY_TIMEOUT, "MODEL_TIMEOUT"),
            };
            tracing::error!("LLM error: {model}");
            (status, code, model.to_string(), None)
        }
        FlowError::Contract(e) => {
            tracing::error!("Flow contract error: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "CONTRACT_ERROR",
                "An AI processing error occurred".to_string(),
                None,
            )
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = self.parts();

        let mut error = json!({
            "code": code,
            "message": message
        });
        if let Some(details) = details {
            error["details"] = details;
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}
