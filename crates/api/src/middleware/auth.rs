//! Authentication middleware for protected routes.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::AppState;
use deciframe_core::auth::Role;
use deciframe_shared::{CurrentUser, JwtError};

/// Extracts the bearer token from the Authorization header.
fn extract_bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
}

/// Authentication middleware that validates session tokens.
///
/// Validates the Bearer token and stores a [`CurrentUser`] in the request
/// extensions; every tenant-scoped handler reads its organization id from
/// there rather than from any ambient global.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let Some(token) = auth_header.and_then(extract_bearer_token) else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "error": "missing_token",
                "message": "Authorization header with Bearer token is required"
            })),
        )
            .into_response();
    };

    match state.jwt.validate_token(token) {
        Ok(claims) => {
            request.extensions_mut().insert(CurrentUser::from(claims));
            next.run(request).await
        }
        Err(e) => {
            let (error, message) = match e {
                JwtError::Expired => ("token_expired", "Token has expired"),
                _ => ("invalid_token", "Invalid or malformed token"),
            };
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": error, "message": message })),
            )
                .into_response()
        }
    }
}

/// Extractor for the authenticated principal.
///
/// ```ignore
/// async fn handler(auth: AuthUser) -> impl IntoResponse {
///     let org = auth.organization_id();
///     // ...
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser(pub CurrentUser);

impl AuthUser {
    /// Returns the acting user's id.
    #[must_use]
    pub const fn user_id(&self) -> i32 {
        self.0.user_id
    }

    /// Returns the acting user's organization id.
    #[must_use]
    pub const fn organization_id(&self) -> i32 {
        self.0.organization_id
    }

    /// Returns the acting user's role.
    ///
    /// A role name minted by an old token that no longer parses degrades
    /// to the least-privileged role.
    #[must_use]
    pub fn role(&self) -> Role {
        Role::parse(&self.0.role).unwrap_or(Role::Staff)
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<serde_json::Value>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({
                        "error": "unauthorized",
                        "message": "Authentication required"
                    })),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(extract_bearer_token("bearer abc"), Some("abc"));
        assert_eq!(extract_bearer_token("Basic abc"), None);
    }

    #[test]
    fn test_unknown_role_degrades_to_staff() {
        let auth = AuthUser(CurrentUser {
            user_id: 1,
            organization_id: 2,
            role: "Wizard".to_string(),
        });
        assert_eq!(auth.role(), Role::Staff);
    }
}
