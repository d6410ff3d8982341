//! Error-to-response mapping.
//!
//! Every fallible handler returns [`ApiError`]; the `From` impls below
//! decide which repository failures surface verbatim and which collapse to
//! a generic 500. Response bodies are always `{ "error", "message" }`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::DbErr;
use serde_json::json;
use tracing::error;

use deciframe_db::repositories::{
    business_case::CaseError, department::DepartmentError, epic::EpicError,
    organization::OrganizationError, problem::ProblemError, project::ProjectError,
    report::ReportError, user::UserError, workflow::WorkflowRepoError,
};
use deciframe_shared::AppError;

/// An error ready to travel back in a response.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    /// Builds an error response directly.
    #[must_use]
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    /// 404 with a consistent body.
    #[must_use]
    pub fn not_found(what: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", format!("{what} not found"))
    }

    /// 422 for request-shape and business-rule violations.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, "validation_failure", message)
    }

    /// 403 for role checks.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, "forbidden", message)
    }

    /// Generic 500; the cause goes to the log, not the body.
    fn internal(cause: impl std::fmt::Display) -> Self {
        error!(error = %cause, "request failed");
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            "An internal error occurred",
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(json!({ "error": self.code, "message": self.message })),
        )
            .into_response()
    }
}

impl From<DbErr> for ApiError {
    fn from(e: DbErr) -> Self {
        Self::internal(e)
    }
}

impl From<AppError> for ApiError {
    fn from(e: AppError) -> Self {
        if e.is_surfaced() {
            let status = StatusCode::from_u16(e.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            let code = match e {
                AppError::AuthRequired(_) => "auth_required",
                AppError::Forbidden(_) => "forbidden",
                AppError::NotFound(_) => "not_found",
                _ => "validation_failure",
            };
            Self::new(status, code, e.to_string())
        } else {
            Self::internal(e)
        }
    }
}

impl From<ProblemError> for ApiError {
    fn from(e: ProblemError) -> Self {
        match e {
            ProblemError::NotFound => Self::not_found("problem"),
            ProblemError::InvalidTransition { .. } | ProblemError::InvalidValue(_) => {
                Self::validation(e.to_string())
            }
            ProblemError::Db(db) => Self::internal(db),
        }
    }
}

impl From<CaseError> for ApiError {
    fn from(e: CaseError) -> Self {
        match e {
            CaseError::NotFound => Self::not_found("business case"),
            CaseError::InvalidTransition { .. }
            | CaseError::DepthRule(_)
            | CaseError::InvalidValue(_) => Self::validation(e.to_string()),
            CaseError::Db(db) => Self::internal(db),
        }
    }
}

impl From<ProjectError> for ApiError {
    fn from(e: ProjectError) -> Self {
        match e {
            ProjectError::NotFound => Self::not_found("project"),
            ProjectError::MilestoneNotFound => Self::not_found("milestone"),
            ProjectError::InvalidTransition { .. }
            | ProjectError::Milestone(_)
            | ProjectError::InvalidValue(_) => Self::validation(e.to_string()),
            ProjectError::Db(db) => Self::internal(db),
        }
    }
}

impl From<EpicError> for ApiError {
    fn from(e: EpicError) -> Self {
        match e {
            EpicError::NotFound => Self::not_found("epic"),
            EpicError::StoryNotFound => Self::not_found("story"),
            EpicError::NotEditable(_) => {
                Self::new(StatusCode::CONFLICT, "not_editable", e.to_string())
            }
            EpicError::InvalidTransition { .. } | EpicError::InvalidValue(_) => {
                Self::validation(e.to_string())
            }
            EpicError::Db(db) => Self::internal(db),
        }
    }
}

impl From<DepartmentError> for ApiError {
    fn from(e: DepartmentError) -> Self {
        match e {
            DepartmentError::NotFound => Self::not_found("department"),
            DepartmentError::ParentNotFound => Self::not_found("parent department"),
            DepartmentError::Hierarchy(_) => Self::validation(e.to_string()),
            DepartmentError::InUse => Self::new(StatusCode::CONFLICT, "in_use", e.to_string()),
            DepartmentError::Db(db) => Self::internal(db),
        }
    }
}

impl From<OrganizationError> for ApiError {
    fn from(e: OrganizationError) -> Self {
        match e {
            OrganizationError::NotFound => Self::not_found("organization"),
            OrganizationError::HasChildren(_) => {
                Self::new(StatusCode::CONFLICT, "in_use", e.to_string())
            }
            OrganizationError::Db(db) => Self::internal(db),
        }
    }
}

impl From<UserError> for ApiError {
    fn from(e: UserError) -> Self {
        match e {
            UserError::NotFound => Self::not_found("user"),
            UserError::EmailTaken => Self::new(StatusCode::CONFLICT, "email_taken", e.to_string()),
            UserError::Db(db) => Self::internal(db),
        }
    }
}

impl From<WorkflowRepoError> for ApiError {
    fn from(e: WorkflowRepoError) -> Self {
        match e {
            WorkflowRepoError::NotFound => Self::not_found("workflow template"),
            WorkflowRepoError::LibraryEntryNotFound => Self::not_found("library entry"),
            WorkflowRepoError::Invalid(inner) => Self::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                "invalid_definition",
                inner.to_string(),
            ),
            WorkflowRepoError::Db(db) => Self::internal(db),
        }
    }
}

impl From<ReportError> for ApiError {
    fn from(e: ReportError) -> Self {
        match e {
            ReportError::NotFound => Self::not_found("report template"),
            ReportError::RunNotFound => Self::not_found("report run"),
            ReportError::InvalidTransition { .. } | ReportError::InvalidValue(_) => {
                Self::validation(e.to_string())
            }
            ReportError::Db(db) => Self::internal(db),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_mapping() {
        let err = ApiError::from(ProblemError::NotFound);
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.code, "not_found");
    }

    #[test]
    fn test_transition_maps_to_422() {
        let err = ApiError::from(CaseError::InvalidTransition {
            from: "Open".into(),
            to: "Approved".into(),
        });
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_db_error_is_not_leaked() {
        let err = ApiError::from(DbErr::Custom("password=hunter2".into()));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.message.contains("hunter2"));
    }

    #[test]
    fn test_epic_not_editable_is_conflict() {
        let err = ApiError::from(EpicError::NotEditable("Submitted".into()));
        assert_eq!(err.status, StatusCode::CONFLICT);
        assert_eq!(err.code, "not_editable");
    }
}
