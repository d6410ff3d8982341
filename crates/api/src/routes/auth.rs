//! Authentication routes: registration and login.
//!
//! Tenancy is keyed by email domain. The first registration for a domain
//! creates the organization with config defaults and promotes that user to
//! Admin; later registrations join the existing tenant.

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::post, Json, Router};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use crate::error::ApiError;
use crate::AppState;
use deciframe_core::auth::{hash_password, verify_password, Role};
use deciframe_db::{OrganizationRepository, UserRepository};

/// Creates the auth router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

#[derive(Debug, Deserialize)]
struct RegisterRequest {
    email: String,
    password: String,
    name: String,
    role: Option<String>,
    department_id: Option<i32>,
    organization_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

/// The domain part of an email address, lowercased.
fn email_domain(email: &str) -> Option<String> {
    let (local, domain) = email.rsplit_once('@')?;
    if local.is_empty() || domain.is_empty() || !domain.contains('.') {
        return None;
    }
    Some(domain.to_lowercase())
}

/// POST /auth/register - Register a user, creating the tenant on first use.
async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(domain) = email_domain(&payload.email) else {
        return Err(ApiError::validation("A valid email address is required"));
    };
    if payload.password.len() < 8 {
        return Err(ApiError::validation(
            "Password must be at least 8 characters",
        ));
    }
    let requested_role = match payload.role.as_deref() {
        None => Role::Staff,
        Some(s) => Role::parse(s)
            .ok_or_else(|| ApiError::validation(format!("Unknown role: {s}")))?,
    };

    let org_repo = OrganizationRepository::new(state.db.clone());
    let user_repo = UserRepository::new(state.db.clone());

    let organization = match org_repo.find_by_domain(&domain).await? {
        Some(org) => org,
        None => {
            let name = payload.organization_name.clone().unwrap_or_else(|| domain.clone());
            let org = org_repo
                .create(
                    &name,
                    &domain,
                    &state.settings.default_currency,
                    &state.settings.default_date_format.to_string(),
                    &state.settings.default_timezone,
                )
                .await?;
            info!(org_id = org.id, domain = %domain, "organization created");
            org
        }
    };

    let password_hash = hash_password(&payload.password).map_err(|e| {
        error!(error = %e, "password hashing failed");
        ApiError::validation("Password could not be processed")
    })?;

    let user = user_repo
        .create(
            organization.id,
            &payload.email,
            &payload.name,
            &password_hash,
            requested_role,
            payload.department_id,
        )
        .await?;

    let token = state
        .jwt
        .generate_token(user.id, organization.id, &user.role)
        .map_err(|e| {
            error!(error = %e, "token generation failed");
            ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "An error occurred during registration",
            )
        })?;

    info!(user_id = user.id, org_id = organization.id, "user registered");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "token": token,
            "user": user,
            "organization": { "id": organization.id, "name": organization.name }
        })),
    ))
}

/// POST /auth/login - Authenticate and return a session token.
async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let invalid = || {
        ApiError::new(
            StatusCode::UNAUTHORIZED,
            "invalid_credentials",
            "Invalid email or password",
        )
    };

    let Some(domain) = email_domain(&payload.email) else {
        return Err(invalid());
    };

    let org_repo = OrganizationRepository::new(state.db.clone());
    let user_repo = UserRepository::new(state.db.clone());

    let organization = org_repo.find_by_domain(&domain).await?.ok_or_else(invalid)?;
    let user = user_repo
        .find_by_email(organization.id, &payload.email)
        .await?
        .ok_or_else(invalid)?;

    match verify_password(&payload.password, &user.password_hash) {
        Ok(true) => {}
        Ok(false) => {
            info!(user_id = user.id, "failed login attempt");
            return Err(invalid());
        }
        Err(e) => {
            error!(error = %e, "password verification error");
            return Err(ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "An error occurred during login",
            ));
        }
    }

    let token = state
        .jwt
        .generate_token(user.id, organization.id, &user.role)
        .map_err(|e| {
            error!(error = %e, "token generation failed");
            ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "An error occurred during login",
            )
        })?;

    info!(user_id = user.id, "user logged in");

    Ok(Json(json!({ "token": token, "user": user })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_domain_extraction() {
        assert_eq!(email_domain("a@acme.com"), Some("acme.com".to_string()));
        assert_eq!(email_domain("A@ACME.COM"), Some("acme.com".to_string()));
        assert_eq!(email_domain("not-an-email"), None);
        assert_eq!(email_domain("@acme.com"), None);
        assert_eq!(email_domain("a@nodot"), None);
    }
}
