//! HTTP server assembly

pub mod response;

use axum::{
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::net::SocketAddr;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::features;
use crate::store::DynStore;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: DynStore,
}

/// Build the storage backend and serve the API until shutdown
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let store = crate::store::init(&config).await?;
    let app = create_router(AppState { store });

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Assemble the full router
pub fn create_router(state: AppState) -> Router {
    let api_v1 = features::router(features::FeatureState {
        store: state.store.clone(),
    });

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .nest("/api/v1", api_v1)
        .layer(TraceLayer::new_for_http())
}

async fn root() -> impl IntoResponse {
    Json(json!({
        "name": "CRP Server",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running"
    }))
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "Failed to install shutdown signal handler");
    }
}
