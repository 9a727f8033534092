//! HTTP API gateway for AcademAide.
//!
//! A thin Axum surface over [`ChatPipeline`]: health check plus the v1
//! chat, history and quiz endpoints. Authentication happens upstream of
//! this service; callers pass the user id they have already verified.

pub mod api_v1;

use axum::extract::DefaultBodyLimit;
use axum::{Router, response::Json, routing::get};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

use academaide_config::AppConfig;
use academaide_pipeline::ChatPipeline;

/// Shared application state.
pub struct GatewayState {
    pub pipeline: Arc<ChatPipeline>,
    pub started_at: chrono::DateTime<chrono::Utc>,
}

pub type SharedState = Arc<GatewayState>;

impl GatewayState {
    pub fn new(pipeline: Arc<ChatPipeline>) -> SharedState {
        Arc::new(Self {
            pipeline,
            started_at: chrono::Utc::now(),
        })
    }
}

/// Build the router with every route and layer.
///
/// - 64 KB request body limit
/// - permissive CORS for GET/POST/DELETE with JSON bodies
/// - HTTP trace logging
pub fn build_router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::DELETE,
        ])
        .allow_headers([axum::http::header::CONTENT_TYPE])
        .allow_origin(tower_http::cors::Any)
        .max_age(std::time::Duration::from_secs(3600));

    Router::new()
        .route("/health", get(health_handler))
        .nest("/v1", api_v1::v1_router())
        .with_state(state)
        .layer(DefaultBodyLimit::max(64 * 1024))
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Serve until Ctrl-C.
pub async fn start(config: &AppConfig, pipeline: Arc<ChatPipeline>) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);
    let app = build_router(GatewayState::new(pipeline));

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: i64,
}

async fn health_handler(
    axum::extract::State(state): axum::extract::State<SharedState>,
) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        uptime_secs: (chrono::Utc::now() - state.started_at).num_seconds(),
    })
}
