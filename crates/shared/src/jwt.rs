//! JWT session token generation and validation.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;

use crate::auth::Claims;

/// JWT configuration.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Secret key for signing tokens.
    pub secret: String,
    /// Session lifetime in hours.
    pub session_hours: i64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: "change-me-in-production".to_string(),
            session_hours: 12,
        }
    }
}

/// Errors that can occur during JWT operations.
#[derive(Debug, Error)]
pub enum JwtError {
    /// Token encoding failed.
    #[error("failed to encode token: {0}")]
    EncodingError(String),

    /// Token has expired.
    #[error("token has expired")]
    Expired,

    /// Token is invalid.
    #[error("invalid token")]
    Invalid,
}

/// JWT service for session token operations.
#[derive(Clone)]
pub struct JwtService {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("session_hours", &self.config.session_hours)
            .field("keys", &"[hidden]")
            .finish()
    }
}

impl JwtService {
    /// Creates a new JWT service with the given configuration.
    #[must_use]
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());
        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// Generates a session token for a user.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::EncodingError` if token generation fails.
    pub fn generate_token(
        &self,
        user_id: i32,
        organization_id: i32,
        role: &str,
    ) -> Result<String, JwtError> {
        let expires_at = Utc::now() + Duration::hours(self.config.session_hours);
        let claims = Claims::new(user_id, organization_id, role, expires_at);

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingError(e.to_string()))
    }

    /// Validates and decodes a session token.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::Expired` for expired tokens and `JwtError::Invalid`
    /// for anything else that fails validation.
    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
                _ => JwtError::Invalid,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> JwtService {
        JwtService::new(JwtConfig {
            secret: "test-secret".to_string(),
            session_hours: 12,
        })
    }

    #[test]
    fn test_generate_and_validate_token() {
        let svc = service();
        let token = svc.generate_token(1, 2, "Admin").unwrap();
        let claims = svc.validate_token(&token).unwrap();
        assert_eq!(claims.user_id(), 1);
        assert_eq!(claims.organization_id(), 2);
        assert_eq!(claims.role, "Admin");
    }

    #[test]
    fn test_validate_rejects_garbage() {
        let svc = service();
        assert!(matches!(
            svc.validate_token("not-a-token"),
            Err(JwtError::Invalid)
        ));
    }

    #[test]
    fn test_validate_rejects_wrong_secret() {
        let token = service().generate_token(1, 2, "Staff").unwrap();
        let other = JwtService::new(JwtConfig {
            secret: "different".to_string(),
            session_hours: 12,
        });
        assert!(other.validate_token(&token).is_err());
    }
}
