//! Scheduled report template routes.

use axum::{
    extract::{Path, Query, State},
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
use deciframe_core::report::{ReportFrequency, TemplateType};
use deciframe_db::repositories::report::UpsertReportTemplateInput;
use deciframe_db::ReportRepository;

const DEFAULT_RUNS_LIMIT: u64 = 20;

/// Creates the reports router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/reports/templates", get(list_templates))
        .route("/reports/templates", post(create_template))
        .route("/reports/templates/{id}", get(get_template))
        .route("/reports/templates/{id}", put(update_template))
        .route("/reports/templates/{id}", delete(delete_template))
        .route("/reports/templates/{id}/runs", get(list_runs))
        .route("/reports/templates/{id}/run", post(run_template))
}

#[derive(Debug, Deserialize)]
struct UpsertTemplateRequest {
    name: String,
    frequency: String,
    template_type: Option<String>,
    #[serde(default)]
    filters: serde_json::Value,
    #[serde(default)]
    recipients: serde_json::Value,
    #[serde(default = "default_active")]
    is_active: bool,
}

#[derive(Debug, Deserialize)]
struct RunsQuery {
    limit: Option<u64>,
}

const fn default_active() -> bool {
    true
}

fn require_template_manager(auth: &AuthUser) -> Result<(), ApiError> {
    if auth.role().can_manage_templates() {
        Ok(())
    } else {
        Err(ApiError::forbidden(
            "Your role cannot manage report templates",
        ))
    }
}

fn upsert_input(payload: UpsertTemplateRequest) -> Result<UpsertReportTemplateInput, ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::validation("Report template name is required"));
    }
    let frequency = ReportFrequency::parse(&payload.frequency).ok_or_else(|| {
        ApiError::validation(format!("Unknown frequency: {}", payload.frequency))
    })?;
    let template_type = payload
        .template_type
        .as_deref()
        .map_or_else(TemplateType::default, TemplateType::parse);

    let filters = if payload.filters.is_null() {
        json!({})
    } else {
        payload.filters
    };
    let recipients = if payload.recipients.is_null() {
        json!([])
    } else {
        payload.recipients
    };

    Ok(UpsertReportTemplateInput {
        name: payload.name,
        frequency,
        template_type,
        filters,
        recipients,
        is_active: payload.is_active,
    })
}

/// GET /reports/templates - The tenant's templates by name.
async fn list_templates(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let templates = ReportRepository::new(state.db.clone())
        .list_templates(auth.organization_id())
        .await?;
    Ok(Json(json!({ "templates": templates })))
}

/// POST /reports/templates - Create a template for the scheduler.
async fn create_template(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<UpsertTemplateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_template_manager(&auth)?;
    let input = upsert_input(payload)?;

    let template = ReportRepository::new(state.db.clone())
        .create_template(auth.organization_id(), input, Some(auth.user_id()))
        .await?;

    info!(template_id = template.id, name = %template.name, "report template created");
    Ok((StatusCode::CREATED, Json(template)))
}

/// GET `/reports/templates/{id}` - One template.
async fn get_template(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let template = ReportRepository::new(state.db.clone())
        .find_template(auth.organization_id(), id)
        .await?
        .ok_or_else(|| ApiError::not_found("report template"))?;
    Ok(Json(template))
}

/// PUT `/reports/templates/{id}` - Replace a template.
async fn update_template(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<UpsertTemplateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_template_manager(&auth)?;
    let input = upsert_input(payload)?;

    let template = ReportRepository::new(state.db.clone())
        .update_template(auth.organization_id(), id, input)
        .await?;
    Ok(Json(template))
}

/// DELETE `/reports/templates/{id}` - Delete a template.
async fn delete_template(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    require_template_manager(&auth)?;

    ReportRepository::new(state.db.clone())
        .delete_template(auth.organization_id(), id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET `/reports/templates/{id}/runs` - Run history, newest first.
async fn list_runs(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i32>,
    Query(query): Query<RunsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let runs = ReportRepository::new(state.db.clone())
        .list_runs(
            auth.organization_id(),
            id,
            query.limit.unwrap_or(DEFAULT_RUNS_LIMIT),
        )
        .await?;
    Ok(Json(json!({ "runs": runs })))
}

/// POST `/reports/templates/{id}/run` - Generate and send the report now.
///
/// The pipeline runs in the background; the run row it opens is the
/// handle for polling the outcome.
async fn run_template(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    require_template_manager(&auth)?;

    let template = ReportRepository::new(state.db.clone())
        .find_template(auth.organization_id(), id)
        .await?
        .ok_or_else(|| ApiError::not_found("report template"))?;

    info!(template_id = template.id, "manual report run requested");
    let pipeline = state.pipeline.clone();
    tokio::spawn(async move {
        pipeline.run(&template).await;
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "template_id": id, "status": "started" })),
    ))
}
