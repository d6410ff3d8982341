//! Business case, epic, and story routes.
//!
//! Epics and their stories are only editable by roles that own elaboration
//! (BA, Admin), and only while the epic is in an editable status; the
//! repository enforces the latter.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, patch, post},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::de;
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::AppState;
use deciframe_core::lifecycle::{CaseDepth, CaseStatus, CaseType, EpicStatus};
use deciframe_db::repositories::business_case::{CreateCaseInput, UpdateCaseInput};
use deciframe_db::repositories::epic::StoryInput;
use deciframe_db::{BusinessCaseRepository, EpicRepository};

const DEFAULT_LIST_LIMIT: u64 = 100;

/// Creates the business cases router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/cases", get(list_cases))
        .route("/cases", post(create_case))
        .route("/cases/{id}", get(get_case))
        .route("/cases/{id}", patch(update_case))
        .route("/cases/{id}", delete(delete_case))
        .route("/cases/{id}/status", post(transition_case))
        .route("/cases/{id}/epics", get(list_epics))
        .route("/cases/{id}/epics", post(create_epic))
        .route("/epics/{id}", patch(update_epic))
        .route("/epics/{id}", delete(delete_epic))
        .route("/epics/{id}/status", post(transition_epic))
        .route("/epics/{id}/project", post(link_epic_project))
        .route("/epics/{id}/stories", get(list_stories))
        .route("/epics/{id}/stories", post(create_story))
        .route("/epics/{id}/stories/{story_id}", patch(update_story))
        .route("/epics/{id}/stories/{story_id}", delete(delete_story))
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    status: Option<String>,
    limit: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct CreateCaseRequest {
    title: String,
    description: Option<String>,
    summary: Option<String>,
    initiative_name: Option<String>,
    problem_id: Option<i32>,
    case_type: Option<String>,
    case_depth: Option<String>,
    cost_estimate: Option<Decimal>,
    benefit_estimate: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
struct UpdateCaseRequest {
    title: Option<String>,
    #[serde(default, deserialize_with = "de::double_option")]
    description: Option<Option<String>>,
    #[serde(default, deserialize_with = "de::double_option")]
    summary: Option<Option<String>>,
    case_depth: Option<String>,
    #[serde(default, deserialize_with = "de::double_option")]
    cost_estimate: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "de::double_option")]
    benefit_estimate: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "de::double_option")]
    risk_level: Option<Option<String>>,
    #[serde(default, deserialize_with = "de::double_option")]
    assigned_ba: Option<Option<i32>>,
}

#[derive(Debug, Deserialize)]
struct TransitionRequest {
    status: String,
}

#[derive(Debug, Deserialize)]
struct EpicRequest {
    title: String,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UpdateEpicRequest {
    title: Option<String>,
    #[serde(default, deserialize_with = "de::double_option")]
    description: Option<Option<String>>,
}

#[derive(Debug, Deserialize)]
struct LinkProjectRequest {
    project_id: i32,
}

#[derive(Debug, Deserialize)]
struct StoryRequest {
    title: String,
    description: Option<String>,
    priority: Option<String>,
    effort_estimate: Option<i32>,
    #[serde(default)]
    acceptance_criteria: serde_json::Value,
}

fn parse_case_status(s: &str) -> Result<CaseStatus, ApiError> {
    CaseStatus::parse(s).ok_or_else(|| ApiError::validation(format!("Unknown status: {s}")))
}

/// Resolves the case type: explicit when given, otherwise inferred from the
/// problem link. Hybrid is rejected unless the tenant opts in.
fn resolve_case_type(
    requested: Option<&str>,
    has_problem: bool,
    hybrid_enabled: bool,
) -> Result<CaseType, ApiError> {
    let case_type = match requested {
        None if has_problem => CaseType::Reactive,
        None => CaseType::Proactive,
        Some(s) => CaseType::parse(s)
            .ok_or_else(|| ApiError::validation(format!("Unknown case type: {s}")))?,
    };
    if case_type == CaseType::Hybrid && !hybrid_enabled {
        return Err(ApiError::validation(
            "Hybrid cases are not enabled for this organization",
        ));
    }
    Ok(case_type)
}

fn require_epic_editor(auth: &AuthUser) -> Result<(), ApiError> {
    if auth.role().can_edit_epics() {
        Ok(())
    } else {
        Err(ApiError::forbidden(
            "Only a business analyst or admin can edit epics and stories",
        ))
    }
}

fn story_input(payload: StoryRequest) -> Result<StoryInput, ApiError> {
    if payload.title.trim().is_empty() {
        return Err(ApiError::validation("Story title is required"));
    }
    let priority = match payload.priority.as_deref() {
        None => "Medium".to_string(),
        Some(s) => deciframe_core::lifecycle::Priority::parse(s)
            .ok_or_else(|| ApiError::validation(format!("Unknown priority: {s}")))?
            .as_str()
            .to_string(),
    };
    let acceptance_criteria = if payload.acceptance_criteria.is_null() {
        json!([])
    } else {
        payload.acceptance_criteria
    };
    Ok(StoryInput {
        title: payload.title,
        description: payload.description,
        priority,
        effort_estimate: payload.effort_estimate,
        acceptance_criteria,
    })
}

// ---- cases ----

/// GET /cases - List business cases.
async fn list_cases(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let status = query.status.as_deref().map(parse_case_status).transpose()?;
    let cases = BusinessCaseRepository::new(state.db.clone())
        .list(
            auth.organization_id(),
            status,
            query.limit.unwrap_or(DEFAULT_LIST_LIMIT),
        )
        .await?;
    Ok(Json(json!({ "cases": cases })))
}

/// POST /cases - Create a business case.
///
/// Reactive cases reference a problem; the depth rule against the tenant's
/// full-case threshold is enforced by the repository.
async fn create_case(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateCaseRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.title.trim().is_empty() {
        return Err(ApiError::validation("Title is required"));
    }
    let case_type = resolve_case_type(
        payload.case_type.as_deref(),
        payload.problem_id.is_some(),
        state.settings.enable_hybrid_cases,
    )?;
    let case_depth = match payload.case_depth.as_deref() {
        None => CaseDepth::Light,
        Some(s) => CaseDepth::parse(s)
            .ok_or_else(|| ApiError::validation(format!("Unknown case depth: {s}")))?,
    };

    let case = BusinessCaseRepository::new(state.db.clone())
        .create(
            auth.organization_id(),
            CreateCaseInput {
                title: payload.title,
                description: payload.description,
                summary: payload.summary,
                initiative_name: payload.initiative_name,
                problem_id: payload.problem_id,
                case_type,
                case_depth,
                cost_estimate: payload.cost_estimate,
                benefit_estimate: payload.benefit_estimate,
                created_by: auth.user_id(),
            },
            state.settings.full_case_threshold,
        )
        .await?;

    info!(case_id = case.id, code = %case.code(), "business case created");
    Ok((StatusCode::CREATED, Json(case)))
}

/// GET `/cases/{id}` - One case.
async fn get_case(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let case = BusinessCaseRepository::new(state.db.clone())
        .find_by_id(auth.organization_id(), id)
        .await?
        .ok_or_else(|| ApiError::not_found("business case"))?;
    Ok(Json(case))
}

/// PATCH `/cases/{id}` - Update case fields.
async fn update_case(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateCaseRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let case_depth = payload
        .case_depth
        .as_deref()
        .map(|s| {
            CaseDepth::parse(s)
                .ok_or_else(|| ApiError::validation(format!("Unknown case depth: {s}")))
        })
        .transpose()?;

    let case = BusinessCaseRepository::new(state.db.clone())
        .update(
            auth.organization_id(),
            id,
            UpdateCaseInput {
                title: payload.title,
                description: payload.description,
                summary: payload.summary,
                case_depth,
                cost_estimate: payload.cost_estimate,
                benefit_estimate: payload.benefit_estimate,
                risk_level: payload.risk_level,
                assigned_ba: payload.assigned_ba,
            },
            state.settings.full_case_threshold,
        )
        .await?;
    Ok(Json(case))
}

/// POST `/cases/{id}/status` - Transition through the status machine.
///
/// Submission and approval raise their workflow events; approval is gated
/// on an approving role.
async fn transition_case(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<TransitionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let to = parse_case_status(&payload.status)?;
    if to == CaseStatus::Approved && !auth.role().can_approve_cases() {
        return Err(ApiError::forbidden(
            "Your role cannot approve business cases",
        ));
    }

    let case = BusinessCaseRepository::new(state.db.clone())
        .transition(auth.organization_id(), id, to, auth.user_id())
        .await?;

    match to {
        CaseStatus::Submitted => state.triggers.case_submitted(&case, auth.user_id()),
        CaseStatus::Approved => state.triggers.case_approved(&case, auth.user_id()),
        _ => {}
    }

    info!(case_id = case.id, status = %case.status, "business case transitioned");
    Ok(Json(case))
}

/// DELETE `/cases/{id}` - Delete a case.
async fn delete_case(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    BusinessCaseRepository::new(state.db.clone())
        .delete(auth.organization_id(), id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---- epics ----

/// GET `/cases/{id}/epics` - A case's epics.
async fn list_epics(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let epics = EpicRepository::new(state.db.clone())
        .list_for_case(auth.organization_id(), id)
        .await?;
    Ok(Json(json!({ "epics": epics })))
}

/// POST `/cases/{id}/epics` - Draft an epic under a case.
async fn create_epic(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<EpicRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_epic_editor(&auth)?;
    if payload.title.trim().is_empty() {
        return Err(ApiError::validation("Epic title is required"));
    }

    let org = auth.organization_id();
    BusinessCaseRepository::new(state.db.clone())
        .find_by_id(org, id)
        .await?
        .ok_or_else(|| ApiError::not_found("business case"))?;

    let epic = EpicRepository::new(state.db.clone())
        .create(
            org,
            id,
            &payload.title,
            payload.description.as_deref(),
            auth.user_id(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(epic)))
}

/// PATCH `/epics/{id}` - Update an editable epic.
async fn update_epic(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateEpicRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_epic_editor(&auth)?;
    let epic = EpicRepository::new(state.db.clone())
        .update(
            auth.organization_id(),
            id,
            payload.title,
            payload.description,
        )
        .await?;
    Ok(Json(epic))
}

/// POST `/epics/{id}/status` - Move an epic through its review machine.
async fn transition_epic(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<TransitionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let to = EpicStatus::parse(&payload.status)
        .ok_or_else(|| ApiError::validation(format!("Unknown status: {}", payload.status)))?;
    // Submitting is the BA's move; review verdicts need an approving role.
    match to {
        EpicStatus::Draft | EpicStatus::Submitted => require_epic_editor(&auth)?,
        _ => {
            if !auth.role().can_approve_cases() {
                return Err(ApiError::forbidden("Your role cannot review epics"));
            }
        }
    }

    let epic = EpicRepository::new(state.db.clone())
        .transition(auth.organization_id(), id, to)
        .await?;
    Ok(Json(epic))
}

/// POST `/epics/{id}/project` - Link an epic to the project delivering it.
async fn link_epic_project(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<LinkProjectRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_epic_editor(&auth)?;
    let epic = EpicRepository::new(state.db.clone())
        .link_project(auth.organization_id(), id, payload.project_id)
        .await?;
    Ok(Json(epic))
}

/// DELETE `/epics/{id}` - Delete an editable epic and its stories.
async fn delete_epic(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    require_epic_editor(&auth)?;
    EpicRepository::new(state.db.clone())
        .delete(auth.organization_id(), id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---- stories ----

/// GET `/epics/{id}/stories` - An epic's stories.
async fn list_stories(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let stories = EpicRepository::new(state.db.clone())
        .list_stories(auth.organization_id(), id)
        .await?;
    Ok(Json(json!({ "stories": stories })))
}

/// POST `/epics/{id}/stories` - Add a story to an editable epic.
async fn create_story(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<StoryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_epic_editor(&auth)?;
    let input = story_input(payload)?;
    let story = EpicRepository::new(state.db.clone())
        .create_story(auth.organization_id(), id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(story)))
}

/// PATCH `/epics/{id}/stories/{story_id}` - Rewrite a story.
async fn update_story(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((id, story_id)): Path<(i32, i32)>,
    Json(payload): Json<StoryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_epic_editor(&auth)?;
    let input = story_input(payload)?;
    let story = EpicRepository::new(state.db.clone())
        .update_story(auth.organization_id(), id, story_id, input)
        .await?;
    Ok(Json(story))
}

/// DELETE `/epics/{id}/stories/{story_id}` - Remove a story.
async fn delete_story(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((id, story_id)): Path<(i32, i32)>,
) -> Result<impl IntoResponse, ApiError> {
    require_epic_editor(&auth)?;
    EpicRepository::new(state.db.clone())
        .delete_story(auth.organization_id(), id, story_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_type_inferred_from_problem_link() {
        assert_eq!(
            resolve_case_type(None, true, false).unwrap(),
            CaseType::Reactive
        );
        assert_eq!(
            resolve_case_type(None, false, false).unwrap(),
            CaseType::Proactive
        );
    }

    #[test]
    fn test_explicit_case_type_wins() {
        assert_eq!(
            resolve_case_type(Some("Proactive"), true, false).unwrap(),
            CaseType::Proactive
        );
        assert!(resolve_case_type(Some("Speculative"), false, false).is_err());
    }

    #[test]
    fn test_hybrid_requires_tenant_opt_in() {
        assert!(resolve_case_type(Some("Hybrid"), true, false).is_err());
        assert_eq!(
            resolve_case_type(Some("Hybrid"), true, true).unwrap(),
            CaseType::Hybrid
        );
    }
}
