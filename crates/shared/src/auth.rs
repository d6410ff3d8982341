//! Authentication claims and request context.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// JWT claims for session tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID).
    pub sub: i32,
    /// Organization ID of the acting principal.
    pub org: i32,
    /// User's role name.
    pub role: String,
    /// Issued at timestamp.
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
}

impl Claims {
    /// Creates new claims for a user session.
    #[must_use]
    pub fn new(user_id: i32, organization_id: i32, role: &str, expires_at: DateTime<Utc>) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id,
            org: organization_id,
            role: role.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    /// Returns the user ID from claims.
    #[must_use]
    pub const fn user_id(&self) -> i32 {
        self.sub
    }

    /// Returns the organization ID from claims.
    #[must_use]
    pub const fn organization_id(&self) -> i32 {
        self.org
    }
}

/// The authenticated principal, threaded explicitly through handlers.
///
/// Every organization-scoped read and write is parameterized by
/// `organization_id`; handlers never consult ambient globals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User ID.
    pub user_id: i32,
    /// Organization the principal belongs to.
    pub organization_id: i32,
    /// Role name.
    pub role: String,
}

impl From<Claims> for CurrentUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            organization_id: claims.org,
            role: claims.role,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_round_trip_into_current_user() {
        let expires = Utc::now() + chrono::Duration::hours(12);
        let claims = Claims::new(7, 3, "Manager", expires);
        let user: CurrentUser = claims.into();
        assert_eq!(user.user_id, 7);
        assert_eq!(user.organization_id, 3);
        assert_eq!(user.role, "Manager");
    }
}
