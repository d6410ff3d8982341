//! Workflow engine core: template definitions, the condition grammar, and
//! the step executor.
//!
//! The database-facing half (template lookup, action side effects) lives in
//! the `engine` crate; everything here is pure and independently testable.

mod condition;
mod context;
mod definition;
mod error;
mod executor;
pub mod events;

pub use condition::{ConditionError, Predicate, Subject};
pub use context::ExecutionContext;
pub use definition::{validate_definition, StepDefinition, WorkflowDefinition};
pub use error::{HandlerError, WorkflowError};
pub use executor::{
    execute_template, ActionHandler, ActionRegistry, InvocationReport, InvocationStatus,
    StepReport, StepStatus,
};
