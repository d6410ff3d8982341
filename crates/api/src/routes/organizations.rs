//! Organization preference routes.

use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, patch},
    Json, Router,
};
use serde::Deserialize;
use tracing::info;

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::AppState;
use deciframe_db::OrganizationRepository;
use deciframe_shared::types::{DateFormat, Theme};

/// Creates the organization router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/organization", get(get_organization))
        .route("/organization/preferences", patch(update_preferences))
}

#[derive(Debug, Deserialize)]
struct PreferencesRequest {
    currency: Option<String>,
    date_format: Option<String>,
    timezone: Option<String>,
    default_theme: Option<String>,
}

/// GET /organization - The caller's own organization.
async fn get_organization(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let org = OrganizationRepository::new(state.db.clone())
        .find_by_id(auth.organization_id())
        .await?
        .ok_or_else(|| ApiError::not_found("organization"))?;
    Ok(Json(org))
}

/// PATCH /organization/preferences - Update tenant preferences (admin only).
async fn update_preferences(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<PreferencesRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if !auth.role().is_admin() {
        return Err(ApiError::forbidden(
            "Only an admin can change organization preferences",
        ));
    }
    if let Some(ref format) = payload.date_format {
        if DateFormat::parse(format).is_none() {
            return Err(ApiError::validation(format!(
                "Unknown date format: {format}"
            )));
        }
    }
    if let Some(ref theme) = payload.default_theme {
        if Theme::parse(theme).is_none() {
            return Err(ApiError::validation(format!("Unknown theme: {theme}")));
        }
    }

    let org = OrganizationRepository::new(state.db.clone())
        .update_preferences(
            auth.organization_id(),
            payload.currency,
            payload.date_format,
            payload.timezone,
            payload.default_theme,
        )
        .await?;

    info!(org_id = org.id, updated_by = auth.user_id(), "organization preferences updated");
    Ok(Json(org))
}
