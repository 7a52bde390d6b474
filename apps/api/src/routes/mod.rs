pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::flows::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Flow API
        .route("/api/v1/flows", get(handlers::handle_list_flows))
        .route("/api/v1/flows/:name", post(handlers::handle_run_flow))
        // Coaching API
        .route(
            "/api/v1/coach/digital-twin",
            post(handlers::handle_digital_twin),
        )
        .route(
            "/api/v1/coach/learning-plan",
            post(handlers::handle_learning_plan),
        )
        .route("/api/v1/coach/guidance", post(handlers::handle_guidance))
        .route("/api/v1/coach/interview", post(handlers::handle_interview))
        .with_state(state)
}
