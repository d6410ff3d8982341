//! Workflow template definition schema.
//!
//! A template's stored `definition` document:
//!
//! ```json
//! { "triggers": ["problem_created"],
//!   "steps": [{ "action": "notify_manager",
//!               "conditions": ["problem.priority == \"High\""],
//!               "stop_on_error": false,
//!               "target": "department_manager" }] }
//! ```
//!
//! Unknown actions and unparsable conditions are rejected at save time.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::condition::Predicate;
use super::error::WorkflowError;
use super::events;

/// Parsed workflow template definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    /// Event names that trigger this template.
    pub triggers: Vec<String>,
    /// Steps executed in order.
    #[serde(default)]
    pub steps: Vec<StepDefinition>,
}

/// One step of a workflow template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepDefinition {
    /// Registered action handler name.
    pub action: String,
    /// Predicate strings; empty means always execute.
    #[serde(default)]
    pub conditions: Vec<String>,
    /// Abort the template when this step errors.
    #[serde(default)]
    pub stop_on_error: bool,
    /// Handler-specific parameters (target, template, due_days, ...).
    #[serde(flatten)]
    pub params: serde_json::Map<String, Value>,
}

impl StepDefinition {
    /// Reads a string parameter.
    #[must_use]
    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(Value::as_str)
    }

    /// Reads an integer parameter.
    #[must_use]
    pub fn param_i64(&self, key: &str) -> Option<i64> {
        self.params.get(key).and_then(Value::as_i64)
    }
}

impl WorkflowDefinition {
    /// Parses a stored definition document.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::InvalidDefinition` when the document does not
    /// match the schema.
    pub fn from_value(value: &Value) -> Result<Self, WorkflowError> {
        serde_json::from_value(value.clone())
            .map_err(|e| WorkflowError::InvalidDefinition(e.to_string()))
    }

    /// Returns true when `event_name` is one of the triggers.
    #[must_use]
    pub fn matches(&self, event_name: &str) -> bool {
        self.triggers.iter().any(|t| t == event_name)
    }
}

/// Validates a definition for saving.
///
/// Checks, in order: at least one trigger, all triggers are known event
/// names, every step action is in `known_actions`, and every condition
/// parses under the predicate grammar.
///
/// # Errors
///
/// Returns the first violation found.
pub fn validate_definition(
    definition: &WorkflowDefinition,
    known_actions: &[&str],
) -> Result<(), WorkflowError> {
    if definition.triggers.is_empty() {
        return Err(WorkflowError::InvalidDefinition(
            "definition requires at least one trigger".to_string(),
        ));
    }

    for trigger in &definition.triggers {
        if !events::is_known(trigger) {
            return Err(WorkflowError::InvalidDefinition(format!(
                "unknown trigger event '{trigger}'"
            )));
        }
    }

    for (step_index, step) in definition.steps.iter().enumerate() {
        if !known_actions.contains(&step.action.as_str()) {
            return Err(WorkflowError::UnknownAction {
                step_index,
                action: step.action.clone(),
            });
        }

        for condition in &step.conditions {
            Predicate::parse(condition).map_err(|source| WorkflowError::InvalidCondition {
                step_index,
                source,
            })?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ACTIONS: &[&str] = &["notify_manager", "log_action"];

    fn definition(value: Value) -> WorkflowDefinition {
        WorkflowDefinition::from_value(&value).unwrap()
    }

    #[test]
    fn test_parse_definition_with_params() {
        let def = definition(json!({
            "triggers": ["problem_created"],
            "steps": [{
                "action": "notify_manager",
                "conditions": ["problem.priority == \"High\""],
                "stop_on_error": true,
                "target": "department_manager",
                "due_days": 3
            }]
        }));

        assert!(def.matches("problem_created"));
        assert!(!def.matches("case_approved"));
        let step = &def.steps[0];
        assert!(step.stop_on_error);
        assert_eq!(step.param_str("target"), Some("department_manager"));
        assert_eq!(step.param_i64("due_days"), Some(3));
    }

    #[test]
    fn test_validate_accepts_good_definition() {
        let def = definition(json!({
            "triggers": ["problem_created", "case_approved"],
            "steps": [
                {"action": "notify_manager", "conditions": []},
                {"action": "log_action"}
            ]
        }));
        assert!(validate_definition(&def, ACTIONS).is_ok());
    }

    #[test]
    fn test_validate_rejects_unknown_trigger() {
        let def = definition(json!({"triggers": ["problem_deleted"], "steps": []}));
        assert!(matches!(
            validate_definition(&def, ACTIONS),
            Err(WorkflowError::InvalidDefinition(_))
        ));
    }

    #[test]
    fn test_validate_rejects_unknown_action() {
        let def = definition(json!({
            "triggers": ["problem_created"],
            "steps": [{"action": "launch_rocket"}]
        }));
        assert!(matches!(
            validate_definition(&def, ACTIONS),
            Err(WorkflowError::UnknownAction { step_index: 0, .. })
        ));
    }

    #[test]
    fn test_validate_rejects_unparsable_condition() {
        let def = definition(json!({
            "triggers": ["problem_created"],
            "steps": [{
                "action": "notify_manager",
                "conditions": ["problem.vibes == \"good\""]
            }]
        }));
        assert!(matches!(
            validate_definition(&def, ACTIONS),
            Err(WorkflowError::InvalidCondition { step_index: 0, .. })
        ));
    }

    #[test]
    fn test_validate_requires_trigger() {
        let def = definition(json!({"triggers": [], "steps": []}));
        assert!(validate_definition(&def, ACTIONS).is_err());
    }
}
