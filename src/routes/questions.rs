use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use validator::Validate;

use crate::database::{DatabaseError, Difficulty, Question, QuestionFilter};
use crate::error::{validation_messages, ApiError};
use crate::importer;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/companies", get(companies))
        .route("/company/:name", get(by_company))
        .route("/:id", put(update))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub company: Option<String>,
    pub difficulty: Option<String>,
    pub search: Option<String>,
}

fn parse_difficulty(value: Option<&str>) -> Result<Option<Difficulty>, ApiError> {
    match value {
        None => Ok(None),
        Some(raw) => Difficulty::parse(raw).map(Some).ok_or_else(|| {
            ApiError::BadRequest("difficulty must be Easy, Medium or Hard".to_string())
        }),
    }
}

async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Question>>, ApiError> {
    let filter = QuestionFilter {
        company: query.company,
        difficulty: parse_difficulty(query.difficulty.as_deref())?,
        search: query.search,
    };
    Ok(Json(state.db.list_questions(&filter).await?))
}

async fn companies(State(state): State<Arc<AppState>>) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(state.db.distinct_companies().await?))
}

async fn by_company(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<Vec<Question>>, ApiError> {
    Ok(Json(state.db.questions_for_company(&name).await?))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuestionRequest {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    pub difficulty: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub companies: Vec<String>,
    pub source_url: Option<String>,
    pub order: Option<i32>,
}

async fn create(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateQuestionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate().map_err(|e| ApiError::Validation(validation_messages(e)))?;

    let title = req.title.trim().to_string();
    let id = importer::canonical_id(req.source_url.as_deref(), Some(title.as_str()))
        .ok_or_else(|| ApiError::BadRequest("Unable to derive a question id".to_string()))?;
    let difficulty = parse_difficulty(req.difficulty.as_deref())?.unwrap_or(Difficulty::Medium);

    let question = Question {
        id,
        title,
        difficulty,
        topics: dedup(req.topics),
        companies: dedup(req.companies),
        source_url: req
            .source_url
            .as_deref()
            .map(importer::resolve_source_url)
            .unwrap_or_default(),
        solved: false,
        order: req.order.unwrap_or(0),
        is_custom: true,
        added_at: Utc::now(),
    };

    state.db.insert_question(&question).await.map_err(|e| match e {
        DatabaseError::DuplicateKey(_) => {
            ApiError::BadRequest("Question with this id already exists".to_string())
        }
        other => ApiError::Database(other),
    })?;

    Ok((StatusCode::CREATED, Json(question)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuestionRequest {
    pub title: Option<String>,
    pub difficulty: Option<String>,
    pub topics: Option<Vec<String>>,
    pub companies: Option<Vec<String>>,
    pub source_url: Option<String>,
    pub solved: Option<bool>,
    pub order: Option<i32>,
}

async fn update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateQuestionRequest>,
) -> Result<Json<Question>, ApiError> {
    let mut question = state
        .db
        .get_question(&id)
        .await?
        .ok_or(ApiError::NotFound("Question"))?;

    if let Some(title) = req.title {
        let title = title.trim().to_string();
        if title.is_empty() {
            return Err(ApiError::Validation(vec!["Title is required".to_string()]));
        }
        question.title = title;
    }
    if let Some(difficulty) = parse_difficulty(req.difficulty.as_deref())? {
        question.difficulty = difficulty;
    }
    if let Some(topics) = req.topics {
        question.topics = dedup(topics);
    }
    if let Some(companies) = req.companies {
        question.companies = dedup(companies);
    }
    if let Some(source_url) = req.source_url {
        question.source_url = importer::resolve_source_url(&source_url);
    }
    if let Some(solved) = req.solved {
        question.solved = solved;
    }
    if let Some(order) = req.order {
        question.order = order;
    }

    state.db.update_question(&question).await?;
    Ok(Json(question))
}

fn dedup(values: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        let value = value.trim().to_string();
        if !value.is_empty() && !out.contains(&value) {
            out.push(value);
        }
    }
    out
}
