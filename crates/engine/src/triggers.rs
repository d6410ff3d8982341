//! Event publication.
//!
//! Domain mutations raise events through the single [`EventPublisher`]
//! port. A failed publish is logged and swallowed; raising an event never
//! fails the mutation that caused it.

use std::sync::Arc;

use serde_json::{json, Value};

use deciframe_core::workflow::events;
use deciframe_db::entities::{business_cases, problems, project_milestones, projects};

use crate::queue::{Event, EventQueue};

/// Narrow publish port between domain code and the event queue.
pub trait EventPublisher: Send + Sync {
    /// Hands an event to the queue. Best effort; implementations swallow
    /// rejection after logging it.
    fn publish(&self, event: Event);
}

impl EventPublisher for EventQueue {
    fn publish(&self, event: Event) {
        // `enqueue` logs the rejection; nothing propagates to the caller.
        let _ = self.enqueue(event);
    }
}

/// Typed raise methods, one per domain mutation that emits an event.
///
/// Each builds the context document handlers and message templates read:
/// an entity projection under its slot name plus the acting user and
/// department.
#[derive(Clone)]
pub struct Triggers {
    publisher: Arc<dyn EventPublisher>,
}

impl Triggers {
    /// Creates the trigger facade over a publish port.
    #[must_use]
    pub fn new(publisher: Arc<dyn EventPublisher>) -> Self {
        Self { publisher }
    }

    /// The underlying publish port.
    #[must_use]
    pub fn publisher(&self) -> &dyn EventPublisher {
        self.publisher.as_ref()
    }

    /// Raises a bare named event with an arbitrary context.
    pub fn raise(&self, event_name: &str, organization_id: i32, context: Value) {
        self.publisher
            .publish(Event::new(event_name, organization_id, context));
    }

    pub fn problem_created(&self, problem: &problems::Model, acting_user: i32) {
        self.raise(
            events::PROBLEM_CREATED,
            problem.organization_id,
            problem_context(problem, acting_user),
        );
    }

    pub fn problem_analyzed(&self, problem: &problems::Model, acting_user: i32) {
        self.raise(
            events::PROBLEM_ANALYZED,
            problem.organization_id,
            problem_context(problem, acting_user),
        );
    }

    pub fn case_submitted(&self, case: &business_cases::Model, acting_user: i32) {
        self.raise(
            events::CASE_SUBMITTED,
            case.organization_id,
            case_context(case, acting_user),
        );
    }

    pub fn case_approved(&self, case: &business_cases::Model, acting_user: i32) {
        self.raise(
            events::CASE_APPROVED,
            case.organization_id,
            case_context(case, acting_user),
        );
    }

    pub fn project_created(&self, project: &projects::Model, acting_user: i32) {
        self.raise(
            events::PROJECT_CREATED,
            project.organization_id,
            project_context(project, acting_user, None),
        );
    }

    pub fn project_status_change(
        &self,
        project: &projects::Model,
        old_status: &str,
        acting_user: i32,
    ) {
        self.raise(
            events::PROJECT_STATUS_CHANGE,
            project.organization_id,
            project_context(project, acting_user, Some(old_status)),
        );
        let completed = deciframe_core::lifecycle::ProjectStatus::parse(&project.status)
            .is_some_and(|s| s.is_completed());
        if completed {
            self.raise(
                events::PROJECT_COMPLETED,
                project.organization_id,
                project_context(project, acting_user, Some(old_status)),
            );
        }
    }

    pub fn milestone_completed(&self, milestone: &project_milestones::Model, acting_user: i32) {
        self.raise(
            events::MILESTONE_COMPLETED,
            milestone.organization_id,
            json!({
                "milestone": {
                    "id": milestone.id,
                    "name": milestone.name,
                    "due_date": milestone.due_date.to_string(),
                    "project_id": milestone.project_id,
                },
                "project_id": milestone.project_id,
                "user_id": acting_user,
            }),
        );
    }
}

fn problem_context(problem: &problems::Model, acting_user: i32) -> Value {
    json!({
        "problem": {
            "id": problem.id,
            "code": problem.code(),
            "title": problem.title,
            "priority": problem.priority,
            "status": problem.status,
            "impact": problem.impact,
            "department_id": problem.department_id,
            "reported_by": problem.reported_by,
        },
        "user_id": acting_user,
        "department_id": problem.department_id,
    })
}

fn case_context(case: &business_cases::Model, acting_user: i32) -> Value {
    json!({
        "case": {
            "id": case.id,
            "code": case.code(),
            "title": case.title,
            "status": case.status,
            "case_type": case.case_type,
            "case_depth": case.case_depth,
            "cost_estimate": case.cost_estimate.map(|d| d.to_string()),
            "risk_level": case.risk_level,
            "problem_id": case.problem_id,
            "assigned_ba": case.assigned_ba,
            "created_by": case.created_by,
        },
        "user_id": acting_user,
    })
}

fn project_context(project: &projects::Model, acting_user: i32, old_status: Option<&str>) -> Value {
    let mut context = json!({
        "project": {
            "id": project.id,
            "code": project.code(),
            "name": project.name,
            "status": project.status,
            "priority": project.priority,
            "budget": project.budget.map(|d| d.to_string()),
            "project_manager_id": project.project_manager_id,
            "department_id": project.department_id,
            "case_id": project.case_id,
        },
        "user_id": acting_user,
        "department_id": project.department_id,
    });
    if let Some(old) = old_status {
        context["old_status"] = json!(old);
    }
    context
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn sample_problem() -> problems::Model {
        problems::Model {
            id: 42,
            organization_id: 1,
            title: "Checkout latency".to_string(),
            description: "p99 above two seconds".to_string(),
            priority: "High".to_string(),
            status: "Open".to_string(),
            impact: Some("Revenue".to_string()),
            department_id: Some(3),
            reported_by: 7,
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    fn sample_project(status: &str) -> projects::Model {
        projects::Model {
            id: 5,
            organization_id: 1,
            name: "Checkout revamp".to_string(),
            description: None,
            status: status.to_string(),
            priority: "High".to_string(),
            budget: Some(Decimal::new(120_000, 0)),
            start_date: None,
            end_date: None,
            project_manager_id: Some(9),
            department_id: Some(3),
            case_id: Some(2),
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    #[derive(Default)]
    struct RecordingPublisher {
        events: std::sync::Mutex<Vec<Event>>,
    }

    impl EventPublisher for RecordingPublisher {
        fn publish(&self, event: Event) {
            self.events.lock().unwrap().push(event);
        }
    }

    #[test]
    fn test_problem_created_context_projection() {
        let publisher = Arc::new(RecordingPublisher::default());
        let triggers = Triggers::new(publisher.clone());
        triggers.problem_created(&sample_problem(), 7);

        let events = publisher.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, "problem_created");
        assert_eq!(events[0].organization_id, 1);
        assert_eq!(events[0].context["problem"]["code"], "P0042");
        assert_eq!(events[0].context["user_id"], 7);
        assert_eq!(events[0].context["department_id"], 3);
    }

    #[test]
    fn test_completion_raises_both_status_change_and_completed() {
        let publisher = Arc::new(RecordingPublisher::default());
        let triggers = Triggers::new(publisher.clone());
        triggers.project_status_change(&sample_project("Resolved"), "InProgress", 9);

        let events = publisher.events.lock().unwrap();
        let names: Vec<&str> = events.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["project_status_change", "project_completed"]);
        assert_eq!(events[0].context["old_status"], "InProgress");
    }

    #[test]
    fn test_non_completion_status_change_raises_once() {
        let publisher = Arc::new(RecordingPublisher::default());
        let triggers = Triggers::new(publisher.clone());
        triggers.project_status_change(&sample_project("OnHold"), "InProgress", 9);

        assert_eq!(publisher.events.lock().unwrap().len(), 1);
    }
}
