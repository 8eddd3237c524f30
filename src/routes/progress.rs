use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::progress;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(get_progress))
        .route("/stats", get(get_stats))
        .route("/:question_id", put(update_progress))
}

async fn get_progress(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<Value>, ApiError> {
    let progress = progress::fetch_or_create(&state.db, &user.user_id).await?;
    Ok(Json(json!({ "success": true, "progress": progress })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProgressRequest {
    pub is_completed: bool,
}

async fn update_progress(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(question_id): Path<String>,
    Json(req): Json<UpdateProgressRequest>,
) -> Result<Json<Value>, ApiError> {
    let progress =
        progress::set_completion(&state.db, &user.user_id, &question_id, req.is_completed).await?;
    Ok(Json(json!({ "success": true, "progress": progress })))
}

async fn get_stats(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<Value>, ApiError> {
    let stats = progress::stats(&state.db, &user.user_id).await?;
    Ok(Json(json!({ "success": true, "stats": stats })))
}
