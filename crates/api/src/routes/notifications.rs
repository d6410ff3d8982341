//! Notification routes: the user's feed plus tenant delivery settings.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::AppState;
use deciframe_core::notify::Frequency;
use deciframe_core::workflow::events;
use deciframe_db::repositories::notification::SettingUpdate;
use deciframe_db::NotificationRepository;

const DEFAULT_FEED_LIMIT: u64 = 50;

/// Creates the notifications router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/notifications", get(list_notifications))
        .route("/notifications/{id}/read", post(mark_read))
        .route("/notifications/read-all", post(mark_all_read))
        .route("/notifications/settings", get(list_settings))
        .route("/notifications/settings/{event}", put(update_setting))
        .route("/notifications/templates/{event}", put(update_template))
}

#[derive(Debug, Deserialize)]
struct FeedQuery {
    #[serde(default)]
    unread_only: bool,
    limit: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct SettingRequest {
    frequency: String,
    threshold_hours: Option<i32>,
    #[serde(default = "default_true")]
    channel_email: bool,
    #[serde(default = "default_true")]
    channel_in_app: bool,
    #[serde(default)]
    channel_push: bool,
}

#[derive(Debug, Deserialize)]
struct TemplateRequest {
    subject_template: String,
    body_template: String,
    #[serde(default = "default_true")]
    email_enabled: bool,
    #[serde(default = "default_true")]
    in_app_enabled: bool,
}

const fn default_true() -> bool {
    true
}

fn known_event(event: &str) -> Result<(), ApiError> {
    if events::is_known(event) {
        Ok(())
    } else {
        Err(ApiError::validation(format!("Unknown event: {event}")))
    }
}

fn require_admin(auth: &AuthUser) -> Result<(), ApiError> {
    if auth.role().is_admin() {
        Ok(())
    } else {
        Err(ApiError::forbidden(
            "Only an admin can manage notification settings",
        ))
    }
}

/// GET /notifications - The caller's feed, newest first, with unread count.
async fn list_notifications(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<FeedQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = NotificationRepository::new(state.db.clone());
    let org = auth.organization_id();
    let notifications = repo
        .list_for_user(
            org,
            auth.user_id(),
            query.unread_only,
            query.limit.unwrap_or(DEFAULT_FEED_LIMIT),
        )
        .await?;
    let unread_count = repo.unread_count(org, auth.user_id()).await?;

    Ok(Json(json!({
        "notifications": notifications,
        "unread_count": unread_count,
    })))
}

/// POST `/notifications/{id}/read` - Mark one of the caller's rows read.
async fn mark_read(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let marked = NotificationRepository::new(state.db.clone())
        .mark_read(auth.organization_id(), auth.user_id(), id)
        .await?;
    if !marked {
        return Err(ApiError::not_found("notification"));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// POST /notifications/read-all - Clear the caller's unread backlog.
async fn mark_all_read(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let marked = NotificationRepository::new(state.db.clone())
        .mark_all_read(auth.organization_id(), auth.user_id())
        .await?;
    Ok(Json(json!({ "marked": marked })))
}

/// GET /notifications/settings - The tenant's per-event delivery settings.
async fn list_settings(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let settings = NotificationRepository::new(state.db.clone())
        .list_settings(auth.organization_id())
        .await?;
    Ok(Json(json!({ "settings": settings })))
}

/// PUT `/notifications/settings/{event}` - Set delivery for one event.
async fn update_setting(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(event): Path<String>,
    Json(payload): Json<SettingRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&auth)?;
    known_event(&event)?;
    let frequency = Frequency::parse(&payload.frequency).ok_or_else(|| {
        ApiError::validation(format!("Unknown frequency: {}", payload.frequency))
    })?;
    if payload.threshold_hours.is_some_and(|h| h <= 0) {
        return Err(ApiError::validation(
            "Escalation threshold must be a positive number of hours",
        ));
    }

    let setting = NotificationRepository::new(state.db.clone())
        .upsert_setting(
            auth.organization_id(),
            &event,
            SettingUpdate {
                frequency,
                threshold_hours: payload.threshold_hours,
                channel_email: payload.channel_email,
                channel_in_app: payload.channel_in_app,
                channel_push: payload.channel_push,
            },
        )
        .await?;

    info!(event = %event, frequency = %frequency.as_str(), "notification setting updated");
    Ok(Json(setting))
}

/// PUT `/notifications/templates/{event}` - Override the message template.
async fn update_template(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(event): Path<String>,
    Json(payload): Json<TemplateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&auth)?;
    known_event(&event)?;
    if payload.subject_template.trim().is_empty() || payload.body_template.trim().is_empty() {
        return Err(ApiError::validation(
            "Subject and body templates are required",
        ));
    }

    let template = NotificationRepository::new(state.db.clone())
        .upsert_template(
            auth.organization_id(),
            &event,
            &payload.subject_template,
            &payload.body_template,
            payload.email_enabled,
            payload.in_app_enabled,
        )
        .await?;
    Ok(Json(template))
}
