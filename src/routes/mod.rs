pub mod auth;
pub mod leetcode;
pub mod progress;
pub mod questions;

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderValue, Method};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde_json::{json, Value};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::config::AppConfig;
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .nest("/api/auth", auth::router())
        .nest("/api/questions", questions::router())
        .nest("/api/progress", progress::router())
        .nest("/api/leetcode", leetcode::router())
        .layer(cors)
        .with_state(state)
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

async fn root() -> Json<Value> {
    Json(json!({
        "message": "CodeQuest Tracker API is live!",
        "status": "Healthy",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// Readiness is asked of the store on every call rather than cached in a
/// process-wide flag.
async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    let connected = state.db.ping().await;
    Json(json!({
        "status": "OK",
        "database": if connected { "Connected" } else { "Disconnected" },
        "timestamp": Utc::now().to_rfc3339(),
    }))
}
