//! Workflow error types.

use thiserror::Error;

use super::condition::ConditionError;

/// Errors raised while validating or executing workflow templates.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// A template definition failed validation.
    #[error("invalid workflow definition: {0}")]
    InvalidDefinition(String),

    /// A condition string could not be parsed.
    #[error("invalid condition in step {step_index}: {source}")]
    InvalidCondition {
        /// Index of the offending step.
        step_index: usize,
        /// The underlying parse error.
        #[source]
        source: ConditionError,
    },

    /// A step names an action no handler is registered for.
    #[error("unknown action '{action}' in step {step_index}")]
    UnknownAction {
        /// Index of the offending step.
        step_index: usize,
        /// The unresolvable action name.
        action: String,
    },

    /// Database error while loading templates.
    #[error("database error: {0}")]
    Database(String),
}

/// Error returned by an action handler.
///
/// Handler failures are recorded in the step report; they abort the template
/// only when the step opts into `stop_on_error`.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct HandlerError(pub String);

impl HandlerError {
    /// Creates a handler error from any displayable cause.
    pub fn new(cause: impl std::fmt::Display) -> Self {
        Self(cause.to_string())
    }
}
