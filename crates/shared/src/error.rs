//! Application-wide error types.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types.
///
/// `NotFound` deliberately covers both "does not exist" and "exists in a
/// different organization" so that response codes never leak tenancy.
#[derive(Debug, Error)]
pub enum AppError {
    /// No authenticated principal.
    #[error("Authentication required: {0}")]
    AuthRequired(String),

    /// Role forbids the action.
    #[error("Access denied: {0}")]
    Forbidden(String),

    /// Resource absent or outside the caller's organization.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Request shape or business-invariant violation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Notification target user could not be resolved.
    #[error("Recipient not found: {0}")]
    RecipientNotFound(String),

    /// Workflow event queue is at capacity.
    #[error("Event queue full: {0}")]
    QueueFull(String),

    /// A workflow action handler raised.
    #[error("Action handler error: {0}")]
    Handler(String),

    /// Outbound mail delivery failed.
    #[error("Mail transport error: {0}")]
    Transport(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::AuthRequired(_) => 401,
            Self::Forbidden(_) => 403,
            Self::NotFound(_) => 404,
            Self::Validation(_) => 422,
            Self::RecipientNotFound(_)
            | Self::QueueFull(_)
            | Self::Handler(_)
            | Self::Transport(_)
            | Self::Database(_)
            | Self::Internal(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::AuthRequired(_) => "AUTH_REQUIRED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_FAILURE",
            Self::RecipientNotFound(_) => "RECIPIENT_NOT_FOUND",
            Self::QueueFull(_) => "QUEUE_FULL",
            Self::Handler(_) => "HANDLER_ERROR",
            Self::Transport(_) => "TRANSPORT_FAILURE",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// True when the error may be surfaced verbatim to an end user.
    ///
    /// Dispatch and queue failures are logged and swallowed; only request
    /// boundary errors travel back in a response body.
    #[must_use]
    pub const fn is_surfaced(&self) -> bool {
        matches!(
            self,
            Self::AuthRequired(_) | Self::Forbidden(_) | Self::NotFound(_) | Self::Validation(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(AppError::AuthRequired(String::new()).status_code(), 401);
        assert_eq!(AppError::Forbidden(String::new()).status_code(), 403);
        assert_eq!(AppError::NotFound(String::new()).status_code(), 404);
        assert_eq!(AppError::Validation(String::new()).status_code(), 422);
        assert_eq!(AppError::RecipientNotFound(String::new()).status_code(), 500);
        assert_eq!(AppError::QueueFull(String::new()).status_code(), 500);
        assert_eq!(AppError::Handler(String::new()).status_code(), 500);
        assert_eq!(AppError::Transport(String::new()).status_code(), 500);
        assert_eq!(AppError::Database(String::new()).status_code(), 500);
        assert_eq!(AppError::Internal(String::new()).status_code(), 500);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            AppError::AuthRequired(String::new()).error_code(),
            "AUTH_REQUIRED"
        );
        assert_eq!(AppError::NotFound(String::new()).error_code(), "NOT_FOUND");
        assert_eq!(
            AppError::Validation(String::new()).error_code(),
            "VALIDATION_FAILURE"
        );
        assert_eq!(
            AppError::QueueFull(String::new()).error_code(),
            "QUEUE_FULL"
        );
        assert_eq!(
            AppError::Transport(String::new()).error_code(),
            "TRANSPORT_FAILURE"
        );
    }

    #[test]
    fn test_only_boundary_errors_surface() {
        assert!(AppError::AuthRequired(String::new()).is_surfaced());
        assert!(AppError::Forbidden(String::new()).is_surfaced());
        assert!(AppError::NotFound(String::new()).is_surfaced());
        assert!(AppError::Validation(String::new()).is_surfaced());
        assert!(!AppError::RecipientNotFound(String::new()).is_surfaced());
        assert!(!AppError::QueueFull(String::new()).is_surfaced());
        assert!(!AppError::Transport(String::new()).is_surfaced());
        assert!(!AppError::Internal(String::new()).is_surfaced());
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            AppError::NotFound("problem 42".into()).to_string(),
            "Not found: problem 42"
        );
        assert_eq!(
            AppError::Validation("cost exceeds threshold".into()).to_string(),
            "Validation error: cost exceeds threshold"
        );
    }
}
