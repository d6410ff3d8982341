//! Department hierarchy routes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, patch, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::AppState;
use deciframe_db::{DepartmentRepository, UserRepository};

/// Creates the departments router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/departments", get(list_departments))
        .route("/departments", post(create_department))
        .route("/departments/{id}", patch(reparent_department))
        .route("/departments/{id}", delete(delete_department))
        .route(
            "/departments/{id}/members/{user_id}",
            put(assign_member),
        )
}

#[derive(Debug, Deserialize)]
struct CreateDepartmentRequest {
    name: String,
    parent_id: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct ReparentRequest {
    parent_id: Option<i32>,
}

/// GET /departments - The tenant's hierarchy, ordered by level then name.
async fn list_departments(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let departments = DepartmentRepository::new(state.db.clone())
        .list(auth.organization_id())
        .await?;
    Ok(Json(json!({ "departments": departments })))
}

/// POST /departments - Create a department under an optional parent.
async fn create_department(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateDepartmentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if !auth.role().is_admin() {
        return Err(ApiError::forbidden("Only an admin can manage departments"));
    }
    if payload.name.trim().is_empty() {
        return Err(ApiError::validation("Department name is required"));
    }

    let department = DepartmentRepository::new(state.db.clone())
        .create(auth.organization_id(), payload.name.trim(), payload.parent_id)
        .await?;

    info!(department_id = department.id, "department created");
    Ok((StatusCode::CREATED, Json(department)))
}

/// PATCH `/departments/{id}` - Move a department under a new parent.
async fn reparent_department(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<ReparentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if !auth.role().is_admin() {
        return Err(ApiError::forbidden("Only an admin can manage departments"));
    }

    let department = DepartmentRepository::new(state.db.clone())
        .reparent(auth.organization_id(), id, payload.parent_id)
        .await?;
    Ok(Json(department))
}

/// DELETE `/departments/{id}` - Delete an unreferenced department.
async fn delete_department(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    if !auth.role().is_admin() {
        return Err(ApiError::forbidden("Only an admin can manage departments"));
    }

    DepartmentRepository::new(state.db.clone())
        .delete(auth.organization_id(), id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT `/departments/{id}/members/{user_id}` - Assign a user to a department.
async fn assign_member(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((id, user_id)): Path<(i32, i32)>,
) -> Result<impl IntoResponse, ApiError> {
    if !auth.role().is_admin() {
        return Err(ApiError::forbidden("Only an admin can assign departments"));
    }

    let org = auth.organization_id();
    DepartmentRepository::new(state.db.clone())
        .find_by_id(org, id)
        .await?
        .ok_or_else(|| ApiError::not_found("department"))?;
    let user = UserRepository::new(state.db.clone())
        .assign_department(org, user_id, id)
        .await?;

    info!(user_id = user.id, department_id = id, "user assigned to department");
    Ok(Json(user))
}
