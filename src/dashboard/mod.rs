//! JSON presentation surface over the latest game snapshot.
//!
//! The core exposes no other surface; whatever renders the UI consumes these
//! endpoints. CORS is left permissive so a static page on another origin can
//! poll them directly.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use std::sync::Arc;
use tokio::sync::watch;
use tower_http::cors::CorsLayer;

use crate::feed::GameSnapshot;

#[derive(Clone)]
pub struct AppState {
    /// Latest fully-processed snapshot; `None` until the first successful
    /// poll cycle.
    pub latest: watch::Receiver<Option<GameSnapshot>>,
}

/// Build the Axum router for the presentation API.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/state", get(state_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

/// GET /api/state — the canonical game state plus estimation outputs.
async fn state_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let snapshot = state.latest.borrow().clone();
    match snapshot {
        Some(snap) => Ok(Json(snap)),
        None => Err((
            StatusCode::SERVICE_UNAVAILABLE,
            "no snapshot available yet".to_string(),
        )),
    }
}

/// GET /health
async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}
