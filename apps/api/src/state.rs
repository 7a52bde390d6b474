use std::sync::Arc;

use crate::flows::FlowExecutor;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Frozen flow registry plus the model invoker. Shared without locking.
    pub executor: Arc<FlowExecutor>,
}

impl AppState {
    pub fn new(executor: FlowExecutor) -> Self {
        Self {
            executor: Arc::new(executor),
        }
    }
}
