use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use coach::config::Config;
use coach::flows::{default_registry, FlowExecutor, ModelInvoker};
use coach::llm_client::{self, LlmClient};
use coach::routes::build_router;
use coach::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Coach API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize LLM client (single attempt per call; ModelInvoker retries)
    let llm = LlmClient::new(config.anthropic_api_key.clone(), config.llm_timeout)?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    let policy = config.retry_policy();
    info!(
        "Model invoker: timeout {}s, {} retry after {}ms",
        policy.call_timeout.as_secs(),
        policy.max_retries,
        policy.backoff.as_millis()
    );
    let invoker = ModelInvoker::new(Arc::new(llm), policy);

    // Build and freeze the flow catalog
    let registry = default_registry().context("Failed to build flow catalog")?;
    info!("Registered {} flows: {:?}", registry.len(), registry.names());
    let executor = FlowExecutor::new(registry, invoker);

    // Build router
    let app = build_router(AppState::new(executor))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
