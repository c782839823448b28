//! Operational status endpoint.
//!
//! Pull-based: the sequencer publishes a snapshot after every applied
//! transition and this router serves the latest one.

use crate::sequencer::StatusSnapshot;
use axum::{extract::State, routing::get, Json, Router};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;

pub fn router(status: Arc<RwLock<StatusSnapshot>>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/status", get(serve_status))
        .layer(TraceLayer::new_for_http())
        .with_state(status)
}

async fn healthz() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn serve_status(
    State(status): State<Arc<RwLock<StatusSnapshot>>>,
) -> Json<StatusSnapshot> {
    Json(status.read().await.clone())
}
