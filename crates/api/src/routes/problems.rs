//! Problem routes.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, patch, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::de;
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::AppState;
use deciframe_core::lifecycle::{Priority, ProblemStatus};
use deciframe_db::repositories::problem::{CreateProblemInput, UpdateProblemInput};
use deciframe_db::ProblemRepository;

const DEFAULT_LIST_LIMIT: u64 = 100;

/// Creates the problems router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/problems", get(list_problems))
        .route("/problems", post(create_problem))
        .route("/problems/{id}", get(get_problem))
        .route("/problems/{id}", patch(update_problem))
        .route("/problems/{id}", delete(delete_problem))
        .route("/problems/{id}/status", post(transition_problem))
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    status: Option<String>,
    limit: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct CreateProblemRequest {
    title: String,
    description: String,
    priority: Option<String>,
    impact: Option<String>,
    department_id: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct UpdateProblemRequest {
    title: Option<String>,
    description: Option<String>,
    priority: Option<String>,
    /// `Some(None)` clears the impact tag.
    #[serde(default, deserialize_with = "de::double_option")]
    impact: Option<Option<String>>,
    #[serde(default, deserialize_with = "de::double_option")]
    department_id: Option<Option<i32>>,
}

#[derive(Debug, Deserialize)]
struct TransitionRequest {
    status: String,
}

fn parse_priority(s: Option<&str>) -> Result<Priority, ApiError> {
    match s {
        None => Ok(Priority::Medium),
        Some(s) => {
            Priority::parse(s).ok_or_else(|| ApiError::validation(format!("Unknown priority: {s}")))
        }
    }
}

fn parse_status(s: &str) -> Result<ProblemStatus, ApiError> {
    ProblemStatus::parse(s).ok_or_else(|| ApiError::validation(format!("Unknown status: {s}")))
}

/// GET /problems - List problems, optionally filtered by status.
async fn list_problems(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let status = query.status.as_deref().map(parse_status).transpose()?;
    let problems = ProblemRepository::new(state.db.clone())
        .list(
            auth.organization_id(),
            status,
            query.limit.unwrap_or(DEFAULT_LIST_LIMIT),
        )
        .await?;
    Ok(Json(json!({ "problems": problems })))
}

/// POST /problems - Report a problem.
async fn create_problem(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateProblemRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.title.trim().is_empty() {
        return Err(ApiError::validation("Title is required"));
    }
    let priority = parse_priority(payload.priority.as_deref())?;

    let problem = ProblemRepository::new(state.db.clone())
        .create(
            auth.organization_id(),
            CreateProblemInput {
                title: payload.title,
                description: payload.description,
                priority,
                impact: payload.impact,
                department_id: payload.department_id,
                reported_by: auth.user_id(),
            },
        )
        .await?;

    state.triggers.problem_created(&problem, auth.user_id());
    info!(problem_id = problem.id, code = %problem.code(), "problem reported");

    Ok((StatusCode::CREATED, Json(problem)))
}

/// GET `/problems/{id}` - One problem.
async fn get_problem(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let problem = ProblemRepository::new(state.db.clone())
        .find_by_id(auth.organization_id(), id)
        .await?
        .ok_or_else(|| ApiError::not_found("problem"))?;
    Ok(Json(problem))
}

/// PATCH `/problems/{id}` - Update non-status fields.
///
/// Recording an impact assessment raises the analyzed event.
async fn update_problem(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateProblemRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let priority = payload.priority.as_deref().map(parse_priority_some).transpose()?;
    let impact_assessed = matches!(payload.impact, Some(Some(_)));

    let problem = ProblemRepository::new(state.db.clone())
        .update(
            auth.organization_id(),
            id,
            UpdateProblemInput {
                title: payload.title,
                description: payload.description,
                priority,
                impact: payload.impact,
                department_id: payload.department_id,
            },
        )
        .await?;

    if impact_assessed {
        state.triggers.problem_analyzed(&problem, auth.user_id());
    }

    Ok(Json(problem))
}

fn parse_priority_some(s: &str) -> Result<Priority, ApiError> {
    Priority::parse(s).ok_or_else(|| ApiError::validation(format!("Unknown priority: {s}")))
}

/// POST `/problems/{id}/status` - Transition through the status machine.
async fn transition_problem(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<TransitionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let to = parse_status(&payload.status)?;
    let problem = ProblemRepository::new(state.db.clone())
        .transition(auth.organization_id(), id, to)
        .await?;

    info!(problem_id = problem.id, status = %problem.status, "problem transitioned");
    Ok(Json(problem))
}

/// DELETE `/problems/{id}` - Delete a problem.
async fn delete_problem(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    ProblemRepository::new(state.db.clone())
        .delete(auth.organization_id(), id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
