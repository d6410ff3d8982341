//! Project and milestone routes.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::AppState;
use deciframe_core::lifecycle::{Priority, ProjectStatus};
use deciframe_db::repositories::project::{CreateMilestoneInput, CreateProjectInput};
use deciframe_db::ProjectRepository;

const DEFAULT_LIST_LIMIT: u64 = 100;

/// Creates the projects router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/projects", get(list_projects))
        .route("/projects", post(create_project))
        .route("/projects/{id}", get(get_project))
        .route("/projects/{id}/status", post(transition_project))
        .route("/projects/{id}/milestones", get(list_milestones))
        .route("/projects/{id}/milestones", post(create_milestone))
        .route("/milestones/{id}/complete", post(complete_milestone))
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    status: Option<String>,
    limit: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct CreateProjectRequest {
    name: String,
    description: Option<String>,
    priority: Option<String>,
    budget: Option<Decimal>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    project_manager_id: Option<i32>,
    department_id: Option<i32>,
    case_id: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct TransitionRequest {
    status: String,
}

#[derive(Debug, Deserialize)]
struct CreateMilestoneRequest {
    name: String,
    owner_id: Option<i32>,
    due_date: NaiveDate,
    notes: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompleteMilestoneRequest {
    completion_date: Option<NaiveDate>,
    notes: Option<String>,
}

fn parse_status(s: &str) -> Result<ProjectStatus, ApiError> {
    ProjectStatus::parse(s).ok_or_else(|| ApiError::validation(format!("Unknown status: {s}")))
}

/// GET /projects - List projects, optionally filtered by status.
async fn list_projects(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let status = query.status.as_deref().map(parse_status).transpose()?;
    let projects = ProjectRepository::new(state.db.clone())
        .list(
            auth.organization_id(),
            status,
            query.limit.unwrap_or(DEFAULT_LIST_LIMIT),
        )
        .await?;
    Ok(Json(json!({ "projects": projects })))
}

/// POST /projects - Open a project, optionally realizing an approved case.
async fn create_project(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateProjectRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::validation("Project name is required"));
    }
    let priority = match payload.priority.as_deref() {
        None => Priority::Medium,
        Some(s) => Priority::parse(s)
            .ok_or_else(|| ApiError::validation(format!("Unknown priority: {s}")))?,
    };

    let project = ProjectRepository::new(state.db.clone())
        .create(
            auth.organization_id(),
            CreateProjectInput {
                name: payload.name,
                description: payload.description,
                priority,
                budget: payload.budget,
                start_date: payload.start_date,
                end_date: payload.end_date,
                project_manager_id: payload.project_manager_id,
                department_id: payload.department_id,
                case_id: payload.case_id,
            },
        )
        .await?;

    state.triggers.project_created(&project, auth.user_id());
    info!(project_id = project.id, code = %project.code(), "project created");

    Ok((StatusCode::CREATED, Json(project)))
}

/// GET `/projects/{id}` - One project.
async fn get_project(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let project = ProjectRepository::new(state.db.clone())
        .find_by_id(auth.organization_id(), id)
        .await?
        .ok_or_else(|| ApiError::not_found("project"))?;
    Ok(Json(project))
}

/// POST `/projects/{id}/status` - Transition through the status machine.
///
/// Raises the status-change event with the previous status so workflows can
/// condition on the edge, not just the destination.
async fn transition_project(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<TransitionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let to = parse_status(&payload.status)?;
    let repo = ProjectRepository::new(state.db.clone());
    let old_status = repo
        .find_by_id(auth.organization_id(), id)
        .await?
        .ok_or_else(|| ApiError::not_found("project"))?
        .status;

    let project = repo.transition(auth.organization_id(), id, to).await?;
    state
        .triggers
        .project_status_change(&project, &old_status, auth.user_id());

    info!(project_id = project.id, status = %project.status, "project transitioned");
    Ok(Json(project))
}

/// GET `/projects/{id}/milestones` - A project's milestones by due date.
async fn list_milestones(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let milestones = ProjectRepository::new(state.db.clone())
        .list_milestones(auth.organization_id(), id)
        .await?;
    Ok(Json(json!({ "milestones": milestones })))
}

/// POST `/projects/{id}/milestones` - Add a milestone.
async fn create_milestone(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<CreateMilestoneRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::validation("Milestone name is required"));
    }

    let milestone = ProjectRepository::new(state.db.clone())
        .create_milestone(
            auth.organization_id(),
            id,
            CreateMilestoneInput {
                name: payload.name,
                owner_id: payload.owner_id,
                due_date: payload.due_date,
                notes: payload.notes,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(milestone)))
}

/// POST `/milestones/{id}/complete` - Mark a milestone done.
///
/// A completion date is required; the repository rejects completion
/// without one.
async fn complete_milestone(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<CompleteMilestoneRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let milestone = ProjectRepository::new(state.db.clone())
        .complete_milestone(
            auth.organization_id(),
            id,
            payload.completion_date,
            payload.notes,
        )
        .await?;

    state.triggers.milestone_completed(&milestone, auth.user_id());
    info!(milestone_id = milestone.id, "milestone completed");

    Ok(Json(milestone))
}
