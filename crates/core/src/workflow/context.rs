//! Execution context shared by the steps of one template invocation.

use serde_json::{Map, Value};

/// Context passed to action handlers during one (template, event) invocation.
///
/// Exposes the original event context, the template identity, slot accessors
/// for the common entity projections, and a scratchpad shared across the
/// steps of this single invocation.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    event_name: String,
    template_id: i32,
    template_name: String,
    organization_id: i32,
    data: Value,
    scratchpad: Map<String, Value>,
}

impl ExecutionContext {
    /// Creates a context for one invocation.
    #[must_use]
    pub fn new(
        event_name: impl Into<String>,
        template_id: i32,
        template_name: impl Into<String>,
        organization_id: i32,
        data: Value,
    ) -> Self {
        Self {
            event_name: event_name.into(),
            template_id,
            template_name: template_name.into(),
            organization_id,
            data,
            scratchpad: Map::new(),
        }
    }

    /// The triggering event name.
    #[must_use]
    pub fn event_name(&self) -> &str {
        &self.event_name
    }

    /// The template being executed.
    #[must_use]
    pub const fn template_id(&self) -> i32 {
        self.template_id
    }

    /// The template's display name.
    #[must_use]
    pub fn template_name(&self) -> &str {
        &self.template_name
    }

    /// The tenant this invocation runs in.
    #[must_use]
    pub const fn organization_id(&self) -> i32 {
        self.organization_id
    }

    /// The original event context document.
    #[must_use]
    pub const fn data(&self) -> &Value {
        &self.data
    }

    /// Reads a top-level slot from the event context.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// The problem projection, if present.
    #[must_use]
    pub fn problem(&self) -> Option<&Value> {
        self.get("problem")
    }

    /// The business case projection, if present.
    #[must_use]
    pub fn case(&self) -> Option<&Value> {
        self.get("case")
    }

    /// The project projection, if present.
    #[must_use]
    pub fn project(&self) -> Option<&Value> {
        self.get("project")
    }

    /// The milestone projection, if present.
    #[must_use]
    pub fn milestone(&self) -> Option<&Value> {
        self.get("milestone")
    }

    /// The acting user's id, if present.
    #[must_use]
    pub fn user_id(&self) -> Option<i32> {
        self.get("user_id")
            .and_then(Value::as_i64)
            .and_then(|id| i32::try_from(id).ok())
    }

    /// The department id, read from the context itself or from the first
    /// entity projection that carries one.
    #[must_use]
    pub fn department_id(&self) -> Option<i32> {
        let direct = self.get("department_id").and_then(Value::as_i64);
        let from_entity = ["user", "problem", "case", "project"]
            .iter()
            .find_map(|slot| self.get(slot)?.get("department_id")?.as_i64());

        direct
            .or(from_entity)
            .and_then(|id| i32::try_from(id).ok())
    }

    /// Stores a computed value for later steps of this invocation.
    pub fn set_scratch(&mut self, key: impl Into<String>, value: Value) {
        self.scratchpad.insert(key.into(), value);
    }

    /// Reads a value computed by a previous step.
    #[must_use]
    pub fn scratch(&self, key: &str) -> Option<&Value> {
        self.scratchpad.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn context(data: Value) -> ExecutionContext {
        ExecutionContext::new("problem_created", 1, "High priority triage", 42, data)
    }

    #[test]
    fn test_slot_accessors() {
        let ctx = context(json!({
            "problem": {"id": 9, "priority": "High"},
            "user_id": 3
        }));
        assert_eq!(ctx.problem().unwrap()["id"], 9);
        assert!(ctx.case().is_none());
        assert_eq!(ctx.user_id(), Some(3));
        assert_eq!(ctx.organization_id(), 42);
    }

    #[test]
    fn test_department_id_fallback_chain() {
        let direct = context(json!({"department_id": 5}));
        assert_eq!(direct.department_id(), Some(5));

        let from_problem = context(json!({"problem": {"department_id": 7}}));
        assert_eq!(from_problem.department_id(), Some(7));

        let absent = context(json!({}));
        assert_eq!(absent.department_id(), None);
    }

    #[test]
    fn test_scratchpad_shared_across_steps() {
        let mut ctx = context(json!({}));
        assert!(ctx.scratch("manager_id").is_none());
        ctx.set_scratch("manager_id", json!(12));
        assert_eq!(ctx.scratch("manager_id"), Some(&json!(12)));
    }
}
