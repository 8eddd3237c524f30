use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::{AuthError, AuthUser};
use crate::database::User;
use crate::error::ApiError;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/test", get(test))
        .route("/set-username", post(set_username))
        .route("/sync", post(sync))
        .route("/stats", get(stats))
        .route("/check-problem/:problem_id", get(check_problem))
}

async fn test() -> Json<Value> {
    Json(json!({
        "success": true,
        "message": "LeetCode API routes are working!",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

async fn load_user(state: &AppState, user: &AuthUser) -> Result<User, ApiError> {
    let id = Uuid::parse_str(&user.user_id).map_err(|_| AuthError::InvalidToken)?;
    state
        .db
        .get_user(id)
        .await?
        .ok_or(ApiError::NotFound("User"))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetUsernameRequest {
    #[serde(default)]
    pub leetcode_username: String,
}

async fn set_username(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<SetUsernameRequest>,
) -> Result<Json<Value>, ApiError> {
    let username = req.leetcode_username.trim().to_string();
    if username.is_empty() {
        return Err(ApiError::BadRequest(
            "LeetCode username is required".to_string(),
        ));
    }

    let profile = load_user(&state, &user).await?;
    state.db.set_leetcode_username(profile.id, &username).await?;

    Ok(Json(json!({
        "message": "LeetCode username updated successfully",
        "leetcodeUsername": username,
    })))
}

/// Single-attempt sync against the external stats service. No retry or
/// backoff; a failure is the caller's answer for this request.
async fn sync(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<Value>, ApiError> {
    let profile = load_user(&state, &user).await?;
    if profile.leetcode_username.is_empty() {
        return Err(ApiError::BadRequest(
            "Please set your LeetCode username first".to_string(),
        ));
    }

    let stats = state
        .leetcode
        .fetch_stats(&profile.leetcode_username)
        .await?;
    let synced_at = Utc::now();
    state
        .db
        .update_leetcode_stats(profile.id, &stats, synced_at)
        .await?;

    Ok(Json(json!({
        "message": "LeetCode data synced successfully",
        "stats": stats,
        "lastSync": synced_at,
    })))
}

async fn stats(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<Value>, ApiError> {
    let profile = load_user(&state, &user).await?;
    Ok(Json(json!({
        "leetcodeUsername": profile.leetcode_username,
        "stats": profile.leetcode_stats,
        "lastSync": profile.last_leetcode_sync,
        "solvedCount": profile.solved_problem_ids.len(),
        "hasLeetCodeLinked": !profile.leetcode_username.is_empty(),
    })))
}

async fn check_problem(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(problem_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let profile = load_user(&state, &user).await?;
    Ok(Json(json!({
        "solved": profile.has_solved(&problem_id),
        "problemId": problem_id,
    })))
}
