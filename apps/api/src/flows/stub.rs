//! Deterministic `ModelBackend` used by unit tests across the crate.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::flows::invoker::{ModelBackend, ModelError, ModelRequest};

/// Replays scripted results in order and records every request it receives.
pub struct StubBackend {
    responses: Mutex<VecDeque<Result<Value, ModelError>>>,
    requests: Mutex<Vec<ModelRequest>>,
    calls: AtomicUsize,
    hang: bool,
}

impl StubBackend {
    pub fn new(responses: Vec<Result<Value, ModelError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            hang: false,
        }
    }

    /// A backend that never answers.
    pub fn hanging() -> Self {
        Self::hanging_after(Vec::new())
    }

    /// Replays `responses`, then never answers again.
    pub fn hanging_after(responses: Vec<Result<Value, ModelError>>) -> Self {
        Self {
            hang: true,
            ..Self::new(responses)
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<ModelRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> Option<ModelRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ModelBackend for StubBackend {
    async fn invoke(&self, request: &ModelRequest) -> Result<Value, ModelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        let next = self.responses.lock().unwrap().pop_front();
        match next {
            Some(result) => result,
            None if self.hang => std::future::pending().await,
            None => Err(ModelError::unavailable("stub has no scripted response")),
        }
    }
}
