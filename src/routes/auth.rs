use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::auth::{self, AuthError, AuthUser};
use crate::database::{DatabaseError, LeetcodeStats, User};
use crate::error::{validation_messages, ApiError};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/me", get(me))
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 30, message = "Username must be 3-30 characters"))]
    pub username: String,
    #[validate(email(message = "Please enter a valid email"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Please enter a valid email"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate().map_err(|e| ApiError::Validation(validation_messages(e)))?;

    let username = req.username.trim().to_string();
    let email = req.email.trim().to_lowercase();

    if state.db.user_exists(&email, &username).await? {
        return Err(ApiError::BadRequest(
            "User with this email or username already exists".to_string(),
        ));
    }

    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4(),
        username,
        email,
        password_hash: auth::hash_password(&req.password)?,
        leetcode_username: String::new(),
        last_leetcode_sync: None,
        leetcode_stats: LeetcodeStats::default(),
        solved_problem_ids: Vec::new(),
        created_at: now,
        updated_at: now,
    };

    // A concurrent register can still lose the race after the exists check;
    // the unique index reports it the same way.
    state.db.create_user(&user).await.map_err(|e| match e {
        DatabaseError::DuplicateKey(_) => ApiError::BadRequest(
            "User with this email or username already exists".to_string(),
        ),
        other => ApiError::Database(other),
    })?;

    let token = auth::generate_token(&user.id.to_string(), &state.config.jwt_secret)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Registration successful",
            "token": token,
            "user": user,
        })),
    ))
}

async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate().map_err(|e| ApiError::Validation(validation_messages(e)))?;

    let email = req.email.trim().to_lowercase();
    let user = state
        .db
        .find_user_by_email(&email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid email or password".to_string()))?;

    if !auth::verify_password(&req.password, &user.password_hash) {
        return Err(ApiError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    }

    let token = auth::generate_token(&user.id.to_string(), &state.config.jwt_secret)?;

    Ok(Json(json!({
        "success": true,
        "message": "Login successful",
        "token": token,
        "user": user,
    })))
}

async fn me(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let id = Uuid::parse_str(&user.user_id).map_err(|_| AuthError::InvalidToken)?;
    let profile = state
        .db
        .get_user(id)
        .await?
        .ok_or(ApiError::NotFound("User"))?;

    Ok(Json(json!({ "success": true, "user": profile })))
}
