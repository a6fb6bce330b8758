//! Minimal HTTP health endpoint for container orchestration probes.

use anyhow::Result;
use axum::{routing::get, Json, Router};
use serde_json::{json, Value};
use tracing::info;

async fn status() -> Json<Value> {
    Json(json!({ "status": "ok", "service": "contactline" }))
}

fn build_router() -> Router {
    Router::new()
        .route("/", get(status))
        .route("/health", get(status))
}

/// Serve the health endpoint until the process exits.
pub async fn serve(port: u16) -> Result<()> {
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Health endpoint listening on {}", addr);
    axum::serve(listener, build_router()).await?;
    Ok(())
}
