//! Workflow template routes.
//!
//! Definitions are parsed and validated against the action vocabulary at
//! save time, so a template that reaches the processor is always runnable.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::AppState;
use deciframe_db::repositories::workflow::UpsertWorkflowInput;
use deciframe_db::WorkflowRepository;

/// Creates the workflows router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/workflows", get(list_workflows))
        .route("/workflows", post(create_workflow))
        .route("/workflows/{id}", get(get_workflow))
        .route("/workflows/{id}", put(update_workflow))
        .route("/workflows/{id}", delete(delete_workflow))
        .route("/workflows/{id}/activate", post(activate_workflow))
        .route("/workflows/library", get(list_library))
        .route("/workflows/library/{id}/clone", post(clone_from_library))
}

#[derive(Debug, Deserialize)]
struct UpsertWorkflowRequest {
    name: String,
    description: Option<String>,
    definition: serde_json::Value,
    #[serde(default)]
    is_active: bool,
}

#[derive(Debug, Deserialize)]
struct ActivateRequest {
    is_active: bool,
}

fn require_template_manager(auth: &AuthUser) -> Result<(), ApiError> {
    if auth.role().can_manage_templates() {
        Ok(())
    } else {
        Err(ApiError::forbidden(
            "Your role cannot manage workflow templates",
        ))
    }
}

fn upsert_input(payload: UpsertWorkflowRequest) -> Result<UpsertWorkflowInput, ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::validation("Workflow name is required"));
    }
    Ok(UpsertWorkflowInput {
        name: payload.name,
        description: payload.description,
        definition: payload.definition,
        is_active: payload.is_active,
    })
}

/// GET /workflows - The tenant's templates by name.
async fn list_workflows(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let workflows = WorkflowRepository::new(state.db.clone())
        .list(auth.organization_id())
        .await?;
    Ok(Json(json!({ "workflows": workflows })))
}

/// POST /workflows - Save a template after validating its definition.
async fn create_workflow(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<UpsertWorkflowRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_template_manager(&auth)?;
    let input = upsert_input(payload)?;

    let workflow = WorkflowRepository::new(state.db.clone())
        .create(
            auth.organization_id(),
            input,
            Some(auth.user_id()),
            &state.registry.action_names(),
        )
        .await?;

    info!(workflow_id = workflow.id, name = %workflow.name, "workflow template created");
    Ok((StatusCode::CREATED, Json(workflow)))
}

/// GET `/workflows/{id}` - One template.
async fn get_workflow(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let workflow = WorkflowRepository::new(state.db.clone())
        .find_by_id(auth.organization_id(), id)
        .await?
        .ok_or_else(|| ApiError::not_found("workflow template"))?;
    Ok(Json(workflow))
}

/// PUT `/workflows/{id}` - Replace a template, re-validating the definition.
async fn update_workflow(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<UpsertWorkflowRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_template_manager(&auth)?;
    let input = upsert_input(payload)?;

    let workflow = WorkflowRepository::new(state.db.clone())
        .update(
            auth.organization_id(),
            id,
            input,
            &state.registry.action_names(),
        )
        .await?;
    Ok(Json(workflow))
}

/// POST `/workflows/{id}/activate` - Flip event matching on or off.
async fn activate_workflow(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<ActivateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_template_manager(&auth)?;

    let workflow = WorkflowRepository::new(state.db.clone())
        .set_active(auth.organization_id(), id, payload.is_active)
        .await?;

    info!(workflow_id = workflow.id, is_active = workflow.is_active, "workflow activation changed");
    Ok(Json(workflow))
}

/// DELETE `/workflows/{id}` - Delete a template.
async fn delete_workflow(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    require_template_manager(&auth)?;

    WorkflowRepository::new(state.db.clone())
        .delete(auth.organization_id(), id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /workflows/library - The shared starter catalog.
async fn list_library(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let entries = WorkflowRepository::new(state.db.clone())
        .list_library()
        .await?;
    Ok(Json(json!({ "library": entries })))
}

/// POST `/workflows/library/{id}/clone` - Copy a catalog entry into the
/// tenant's own templates. The clone starts inactive.
async fn clone_from_library(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    require_template_manager(&auth)?;

    let workflow = WorkflowRepository::new(state.db.clone())
        .clone_from_library(
            auth.organization_id(),
            id,
            Some(auth.user_id()),
            &state.registry.action_names(),
        )
        .await?;

    info!(workflow_id = workflow.id, library_id = id, "workflow cloned from library");
    Ok((StatusCode::CREATED, Json(workflow)))
}
