//! Workflow step executor.
//!
//! Runs the steps of one matched template against an execution context,
//! gated by parsed predicates, recording a per-step and per-template report
//! suitable for auditing and UI display.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use super::condition::Predicate;
use super::context::ExecutionContext;
use super::definition::{StepDefinition, WorkflowDefinition};
use super::error::HandlerError;

/// A registered side-effecting workflow action.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    /// The action name templates refer to.
    fn name(&self) -> &'static str;

    /// Executes the action, returning a small result document.
    async fn execute(
        &self,
        step: &StepDefinition,
        ctx: &mut ExecutionContext,
    ) -> Result<Value, HandlerError>;
}

/// Mapping from action name to handler.
#[derive(Clone, Default)]
pub struct ActionRegistry {
    handlers: HashMap<&'static str, Arc<dyn ActionHandler>>,
}

impl ActionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler under its own name.
    pub fn register(&mut self, handler: Arc<dyn ActionHandler>) {
        self.handlers.insert(handler.name(), handler);
    }

    /// Looks up a handler by action name.
    #[must_use]
    pub fn get(&self, action: &str) -> Option<&Arc<dyn ActionHandler>> {
        self.handlers.get(action)
    }

    /// The registered action vocabulary, for save-time validation.
    #[must_use]
    pub fn action_names(&self) -> Vec<&'static str> {
        self.handlers.keys().copied().collect()
    }
}

impl std::fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionRegistry")
            .field("actions", &self.action_names())
            .finish()
    }
}

/// Outcome of one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// Handler ran and returned a result.
    Completed,
    /// Conditions not met; handler not invoked.
    Skipped,
    /// Handler raised or the action was unresolvable.
    Error,
}

/// Report for one executed step.
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    /// Position in the template.
    pub step_index: usize,
    /// Action name.
    pub action: String,
    /// Outcome.
    pub status: StepStatus,
    /// Handler result document, when completed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error message, when errored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// When the step started.
    pub started_at: DateTime<Utc>,
    /// When the step finished.
    pub finished_at: DateTime<Utc>,
}

/// Overall invocation outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InvocationStatus {
    /// All steps attempted (individual steps may have erred).
    Completed,
    /// Aborted by a `stop_on_error` step.
    Aborted,
}

/// Report for one (template, event) invocation.
#[derive(Debug, Clone, Serialize)]
pub struct InvocationReport {
    /// Template id.
    pub template_id: i32,
    /// Template display name.
    pub template_name: String,
    /// Triggering event.
    pub event_name: String,
    /// Overall outcome.
    pub status: InvocationStatus,
    /// Per-step reports in execution order.
    pub steps: Vec<StepReport>,
    /// When the invocation started.
    pub started_at: DateTime<Utc>,
    /// When the invocation finished.
    pub completed_at: DateTime<Utc>,
}

/// Executes every step of a matched template.
///
/// A template with zero steps completes immediately. A step with an empty
/// condition list executes unconditionally. Step errors are recorded and
/// execution continues unless the step carries `stop_on_error`.
///
/// Stored conditions were validated at save time; one that no longer parses
/// is reported as a step error, never silently true.
pub async fn execute_template(
    definition: &WorkflowDefinition,
    registry: &ActionRegistry,
    mut ctx: ExecutionContext,
) -> InvocationReport {
    let started_at = Utc::now();
    info!(
        template = %ctx.template_name(),
        event = %ctx.event_name(),
        "executing workflow template"
    );

    let mut steps = Vec::with_capacity(definition.steps.len());
    let mut status = InvocationStatus::Completed;

    for (step_index, step) in definition.steps.iter().enumerate() {
        let report = execute_step(step, step_index, registry, &mut ctx).await;
        let errored = report.status == StepStatus::Error;
        steps.push(report);

        if errored && step.stop_on_error {
            warn!(
                template = %ctx.template_name(),
                step_index,
                "aborting template after stop_on_error step"
            );
            status = InvocationStatus::Aborted;
            break;
        }
    }

    InvocationReport {
        template_id: ctx.template_id(),
        template_name: ctx.template_name().to_string(),
        event_name: ctx.event_name().to_string(),
        status,
        steps,
        started_at,
        completed_at: Utc::now(),
    }
}

async fn execute_step(
    step: &StepDefinition,
    step_index: usize,
    registry: &ActionRegistry,
    ctx: &mut ExecutionContext,
) -> StepReport {
    let started_at = Utc::now();

    match conditions_met(step, ctx) {
        Ok(false) => {
            info!(step_index, action = %step.action, "step skipped: conditions not met");
            return StepReport {
                step_index,
                action: step.action.clone(),
                status: StepStatus::Skipped,
                result: None,
                error: None,
                started_at,
                finished_at: Utc::now(),
            };
        }
        Err(parse_error) => {
            return StepReport {
                step_index,
                action: step.action.clone(),
                status: StepStatus::Error,
                result: None,
                error: Some(parse_error),
                started_at,
                finished_at: Utc::now(),
            };
        }
        Ok(true) => {}
    }

    let Some(handler) = registry.get(&step.action) else {
        return StepReport {
            step_index,
            action: step.action.clone(),
            status: StepStatus::Error,
            result: None,
            error: Some(format!("no handler registered for action '{}'", step.action)),
            started_at,
            finished_at: Utc::now(),
        };
    };

    match handler.execute(step, ctx).await {
        Ok(result) => StepReport {
            step_index,
            action: step.action.clone(),
            status: StepStatus::Completed,
            result: Some(result),
            error: None,
            started_at,
            finished_at: Utc::now(),
        },
        Err(e) => {
            warn!(step_index, action = %step.action, error = %e, "step handler failed");
            StepReport {
                step_index,
                action: step.action.clone(),
                status: StepStatus::Error,
                result: None,
                error: Some(e.to_string()),
                started_at,
                finished_at: Utc::now(),
            }
        }
    }
}

fn conditions_met(step: &StepDefinition, ctx: &ExecutionContext) -> Result<bool, String> {
    for condition in &step.conditions {
        let predicate = Predicate::parse(condition).map_err(|e| e.to_string())?;
        if !predicate.evaluate(ctx.data()) {
            return Ok(false);
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Recorder {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl ActionHandler for Recorder {
        fn name(&self) -> &'static str {
            "record"
        }

        async fn execute(
            &self,
            _step: &StepDefinition,
            _ctx: &mut ExecutionContext,
        ) -> Result<Value, HandlerError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(HandlerError::new("boom"))
            } else {
                Ok(json!({"status": "ok"}))
            }
        }
    }

    fn registry(fail: bool) -> (ActionRegistry, Arc<Recorder>) {
        let handler = Arc::new(Recorder {
            calls: AtomicUsize::new(0),
            fail,
        });
        let mut registry = ActionRegistry::new();
        registry.register(handler.clone());
        (registry, handler)
    }

    fn ctx(data: Value) -> ExecutionContext {
        ExecutionContext::new("problem_created", 1, "test", 1, data)
    }

    fn definition(value: Value) -> WorkflowDefinition {
        WorkflowDefinition::from_value(&value).unwrap()
    }

    #[tokio::test]
    async fn test_zero_steps_completes_immediately() {
        let (registry, _) = registry(false);
        let def = definition(json!({"triggers": ["problem_created"], "steps": []}));
        let report = execute_template(&def, &registry, ctx(json!({}))).await;
        assert_eq!(report.status, InvocationStatus::Completed);
        assert!(report.steps.is_empty());
        assert!(report.completed_at >= report.started_at);
    }

    #[tokio::test]
    async fn test_empty_conditions_execute_unconditionally() {
        let (registry, handler) = registry(false);
        let def = definition(json!({
            "triggers": ["problem_created"],
            "steps": [{"action": "record"}]
        }));
        let report = execute_template(&def, &registry, ctx(json!({}))).await;
        assert_eq!(report.steps[0].status, StepStatus::Completed);
        assert_eq!(handler.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unmet_condition_skips_step() {
        let (registry, handler) = registry(false);
        let def = definition(json!({
            "triggers": ["problem_created"],
            "steps": [{
                "action": "record",
                "conditions": ["problem.priority == \"High\""]
            }]
        }));
        let data = json!({"problem": {"priority": "Low"}});
        let report = execute_template(&def, &registry, ctx(data)).await;
        assert_eq!(report.status, InvocationStatus::Completed);
        assert_eq!(report.steps.len(), 1);
        assert_eq!(report.steps[0].status, StepStatus::Skipped);
        assert_eq!(handler.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unknown_action_is_step_error() {
        let (registry, _) = registry(false);
        let def = definition(json!({
            "triggers": ["problem_created"],
            "steps": [{"action": "launch_rocket"}]
        }));
        let report = execute_template(&def, &registry, ctx(json!({}))).await;
        assert_eq!(report.steps[0].status, StepStatus::Error);
        assert_eq!(report.status, InvocationStatus::Completed);
    }

    #[tokio::test]
    async fn test_stop_on_error_aborts_remaining_steps() {
        let (registry, handler) = registry(true);
        let def = definition(json!({
            "triggers": ["problem_created"],
            "steps": [
                {"action": "record", "stop_on_error": true},
                {"action": "record"}
            ]
        }));
        let report = execute_template(&def, &registry, ctx(json!({}))).await;
        assert_eq!(report.status, InvocationStatus::Aborted);
        assert_eq!(report.steps.len(), 1);
        assert_eq!(handler.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_error_without_stop_continues() {
        let (registry, handler) = registry(true);
        let def = definition(json!({
            "triggers": ["problem_created"],
            "steps": [
                {"action": "record"},
                {"action": "record"}
            ]
        }));
        let report = execute_template(&def, &registry, ctx(json!({}))).await;
        assert_eq!(report.status, InvocationStatus::Completed);
        assert_eq!(report.steps.len(), 2);
        assert_eq!(handler.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_malformed_stored_condition_is_error_not_true() {
        let (registry, handler) = registry(false);
        let def = definition(json!({
            "triggers": ["problem_created"],
            "steps": [{
                "action": "record",
                "conditions": ["problem.vibes == \"good\""]
            }]
        }));
        let report = execute_template(&def, &registry, ctx(json!({}))).await;
        assert_eq!(report.steps[0].status, StepStatus::Error);
        assert_eq!(handler.calls.load(Ordering::SeqCst), 0);
    }
}
