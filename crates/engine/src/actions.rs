//! Workflow action handlers.
//!
//! The ten actions a workflow template step may name. Each handler is a
//! thin adapter from step parameters and execution context onto the
//! repositories and the notification dispatcher. Handler failures surface
//! as step errors in the invocation report; they never raise past the
//! executor.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use serde_json::{json, Value};

use deciframe_core::auth::Role;
use deciframe_core::lifecycle::{CaseDepth, CaseStatus, CaseType};
use deciframe_core::workflow::{
    events, ActionHandler, ActionRegistry, ExecutionContext, HandlerError, StepDefinition,
};
use deciframe_db::repositories::{
    AuditRepository, BusinessCaseRepository, CreateCaseInput, DelayedJobRepository, JobType,
    NotificationRepository, UpdateCaseInput, UserRepository,
};

use crate::dispatch::NotificationDispatcher;

/// Shared dependencies for all handlers.
pub struct ActionServices {
    /// User lookups (managers, analysts, recipients).
    pub users: UserRepository,
    /// Case creation, assignment, and approval.
    pub cases: BusinessCaseRepository,
    /// Direct in-app rows for task-style actions.
    pub notifications: NotificationRepository,
    /// Audit trail for `log_action` and task creation.
    pub audit: AuditRepository,
    /// Follow-up scheduling.
    pub jobs: DelayedJobRepository,
    /// Notification delivery.
    pub dispatcher: NotificationDispatcher,
    /// Tenant cost threshold for the case depth rule.
    pub full_case_threshold: Decimal,
}

/// Builds the registry holding all ten production actions.
#[must_use]
pub fn build_registry(services: Arc<ActionServices>) -> ActionRegistry {
    let mut registry = ActionRegistry::new();
    registry.register(Arc::new(NotifyManager(services.clone())));
    registry.register(Arc::new(SendNotification(services.clone())));
    registry.register(Arc::new(NotifyStakeholders(services.clone())));
    registry.register(Arc::new(CreateTask(services.clone())));
    registry.register(Arc::new(EscalateToManager(services.clone())));
    registry.register(Arc::new(AutoApprove(services.clone())));
    registry.register(Arc::new(ScheduleFollowUp(services.clone())));
    registry.register(Arc::new(CreateBusinessCase(services.clone())));
    registry.register(Arc::new(AssignBusinessAnalyst(services.clone())));
    registry.register(Arc::new(LogAction(services)));
    registry
}

fn target_user(step: &StepDefinition, ctx: &ExecutionContext) -> Result<i32, HandlerError> {
    step.param_i64("user_id")
        .and_then(|id| i32::try_from(id).ok())
        .or_else(|| ctx.user_id())
        .ok_or_else(|| HandlerError::new("no target user in step parameters or context"))
}

fn entity_id(ctx: &ExecutionContext, slot: &str) -> Result<i32, HandlerError> {
    ctx.get(slot)
        .and_then(|entity| entity.get("id"))
        .and_then(Value::as_i64)
        .and_then(|id| i32::try_from(id).ok())
        .ok_or_else(|| HandlerError::new(format!("no {slot} in context")))
}

async fn resolve_manager(
    services: &ActionServices,
    ctx: &ExecutionContext,
) -> Result<i32, HandlerError> {
    let department_id = ctx
        .department_id()
        .ok_or_else(|| HandlerError::new("no department in context"))?;
    let manager = services
        .users
        .department_manager(ctx.organization_id(), department_id)
        .await
        .map_err(|e| HandlerError::new(e.to_string()))?
        .ok_or_else(|| {
            HandlerError::new(format!("department {department_id} has no manager"))
        })?;
    Ok(manager.id)
}

struct NotifyManager(Arc<ActionServices>);

#[async_trait]
impl ActionHandler for NotifyManager {
    fn name(&self) -> &'static str {
        "notify_manager"
    }

    async fn execute(
        &self,
        _step: &StepDefinition,
        ctx: &mut ExecutionContext,
    ) -> Result<Value, HandlerError> {
        let manager_id = resolve_manager(&self.0, ctx).await?;
        self.0
            .dispatcher
            .dispatch_logged(ctx.organization_id(), ctx.event_name(), manager_id, ctx.data())
            .await;
        ctx.set_scratch("manager_id", json!(manager_id));
        Ok(json!({ "notified_user_id": manager_id }))
    }
}

struct SendNotification(Arc<ActionServices>);

#[async_trait]
impl ActionHandler for SendNotification {
    fn name(&self) -> &'static str {
        "send_notification"
    }

    async fn execute(
        &self,
        step: &StepDefinition,
        ctx: &mut ExecutionContext,
    ) -> Result<Value, HandlerError> {
        let user_id = target_user(step, ctx)?;

        // An explicit message bypasses the tenant's stored template.
        if let Some(message) = step.param_str("message") {
            let row = self
                .0
                .notifications
                .create(
                    ctx.organization_id(),
                    user_id,
                    message,
                    None,
                    Some(ctx.event_name()),
                    false,
                )
                .await
                .map_err(|e| HandlerError::new(e.to_string()))?;
            return Ok(json!({ "notification_id": row.id, "user_id": user_id }));
        }

        self.0
            .dispatcher
            .dispatch_logged(ctx.organization_id(), ctx.event_name(), user_id, ctx.data())
            .await;
        Ok(json!({ "user_id": user_id }))
    }
}

struct NotifyStakeholders(Arc<ActionServices>);

#[async_trait]
impl ActionHandler for NotifyStakeholders {
    fn name(&self) -> &'static str {
        "notify_stakeholders"
    }

    async fn execute(
        &self,
        _step: &StepDefinition,
        ctx: &mut ExecutionContext,
    ) -> Result<Value, HandlerError> {
        let mut stakeholders = Vec::new();
        let mut push = |value: Option<&Value>| {
            if let Some(id) = value
                .and_then(Value::as_i64)
                .and_then(|id| i32::try_from(id).ok())
            {
                if !stakeholders.contains(&id) {
                    stakeholders.push(id);
                }
            }
        };

        push(ctx.get("user_id"));
        push(ctx.problem().and_then(|p| p.get("reported_by")));
        push(ctx.case().and_then(|c| c.get("created_by")));
        push(ctx.case().and_then(|c| c.get("assigned_ba")));
        push(ctx.project().and_then(|p| p.get("project_manager_id")));

        for user_id in &stakeholders {
            self.0
                .dispatcher
                .dispatch_logged(ctx.organization_id(), ctx.event_name(), *user_id, ctx.data())
                .await;
        }
        Ok(json!({ "notified": stakeholders.len() }))
    }
}

struct CreateTask(Arc<ActionServices>);

#[async_trait]
impl ActionHandler for CreateTask {
    fn name(&self) -> &'static str {
        "create_task"
    }

    async fn execute(
        &self,
        step: &StepDefinition,
        ctx: &mut ExecutionContext,
    ) -> Result<Value, HandlerError> {
        let assignee = step
            .param_i64("assignee")
            .and_then(|id| i32::try_from(id).ok())
            .or_else(|| ctx.user_id())
            .ok_or_else(|| HandlerError::new("no assignee in step parameters or context"))?;
        let title = step.param_str("title").unwrap_or("Follow up");

        let row = self
            .0
            .notifications
            .create(
                ctx.organization_id(),
                assignee,
                &format!("Task: {title}"),
                None,
                Some(ctx.event_name()),
                false,
            )
            .await
            .map_err(|e| HandlerError::new(e.to_string()))?;

        self.0
            .audit
            .record(
                ctx.organization_id(),
                ctx.user_id(),
                "task_created",
                None,
                Some(json!({ "title": title, "assignee": assignee, "event": ctx.event_name() })),
            )
            .await
            .map_err(|e| HandlerError::new(e.to_string()))?;

        Ok(json!({ "notification_id": row.id, "assignee": assignee, "title": title }))
    }
}

struct EscalateToManager(Arc<ActionServices>);

#[async_trait]
impl ActionHandler for EscalateToManager {
    fn name(&self) -> &'static str {
        "escalate_to_manager"
    }

    async fn execute(
        &self,
        _step: &StepDefinition,
        ctx: &mut ExecutionContext,
    ) -> Result<Value, HandlerError> {
        let manager_id = resolve_manager(&self.0, ctx).await?;
        self.0
            .dispatcher
            .dispatch(
                ctx.organization_id(),
                ctx.event_name(),
                manager_id,
                ctx.data(),
                true,
            )
            .await
            .map_err(|e| HandlerError::new(e.to_string()))?;
        Ok(json!({ "escalated_to": manager_id }))
    }
}

struct AutoApprove(Arc<ActionServices>);

#[async_trait]
impl ActionHandler for AutoApprove {
    fn name(&self) -> &'static str {
        "auto_approve"
    }

    async fn execute(
        &self,
        _step: &StepDefinition,
        ctx: &mut ExecutionContext,
    ) -> Result<Value, HandlerError> {
        let case_id = entity_id(ctx, "case")?;
        let acting_user = ctx.user_id().unwrap_or(0);
        let case = self
            .0
            .cases
            .transition(ctx.organization_id(), case_id, CaseStatus::Approved, acting_user)
            .await
            .map_err(|e| HandlerError::new(e.to_string()))?;
        Ok(json!({ "case_id": case.id, "status": case.status }))
    }
}

struct ScheduleFollowUp(Arc<ActionServices>);

#[async_trait]
impl ActionHandler for ScheduleFollowUp {
    fn name(&self) -> &'static str {
        "schedule_follow_up"
    }

    async fn execute(
        &self,
        step: &StepDefinition,
        ctx: &mut ExecutionContext,
    ) -> Result<Value, HandlerError> {
        let due_days = step.param_i64("due_days").unwrap_or(3).max(0);
        let event_name = step.param_str("event").unwrap_or(events::CASE_REVIEW_DUE);
        let run_at = Utc::now() + Duration::days(due_days);

        let job = self
            .0
            .jobs
            .schedule(
                ctx.organization_id(),
                JobType::FollowUp,
                run_at,
                json!({ "event_name": event_name, "context": ctx.data() }),
            )
            .await
            .map_err(|e| HandlerError::new(e.to_string()))?;
        Ok(json!({ "job_id": job.id, "event": event_name, "run_at": run_at.to_rfc3339() }))
    }
}

struct CreateBusinessCase(Arc<ActionServices>);

#[async_trait]
impl ActionHandler for CreateBusinessCase {
    fn name(&self) -> &'static str {
        "create_business_case"
    }

    async fn execute(
        &self,
        _step: &StepDefinition,
        ctx: &mut ExecutionContext,
    ) -> Result<Value, HandlerError> {
        let problem = ctx
            .problem()
            .ok_or_else(|| HandlerError::new("no problem in context"))?;
        let problem_id = entity_id(ctx, "problem")?;
        let title = problem
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or("Untitled problem");
        let created_by = ctx
            .user_id()
            .or_else(|| {
                problem
                    .get("reported_by")
                    .and_then(Value::as_i64)
                    .and_then(|id| i32::try_from(id).ok())
            })
            .ok_or_else(|| HandlerError::new("no acting user in context"))?;

        let case = self
            .0
            .cases
            .create(
                ctx.organization_id(),
                CreateCaseInput {
                    title: format!("Business case for {title}"),
                    description: None,
                    summary: None,
                    initiative_name: None,
                    problem_id: Some(problem_id),
                    case_type: CaseType::Reactive,
                    case_depth: CaseDepth::Light,
                    cost_estimate: None,
                    benefit_estimate: None,
                    created_by,
                },
                self.0.full_case_threshold,
            )
            .await
            .map_err(|e| HandlerError::new(e.to_string()))?;

        ctx.set_scratch("created_case_id", json!(case.id));
        Ok(json!({ "case_id": case.id, "code": case.code() }))
    }
}

struct AssignBusinessAnalyst(Arc<ActionServices>);

#[async_trait]
impl ActionHandler for AssignBusinessAnalyst {
    fn name(&self) -> &'static str {
        "assign_business_analyst"
    }

    async fn execute(
        &self,
        _step: &StepDefinition,
        ctx: &mut ExecutionContext,
    ) -> Result<Value, HandlerError> {
        // A case created earlier in this invocation takes precedence over
        // the event's own case slot.
        let case_id = ctx
            .scratch("created_case_id")
            .and_then(Value::as_i64)
            .and_then(|id| i32::try_from(id).ok())
            .map_or_else(|| entity_id(ctx, "case"), Ok)?;

        let analysts = self
            .0
            .users
            .list_by_role(ctx.organization_id(), Role::Ba)
            .await
            .map_err(|e| HandlerError::new(e.to_string()))?;
        let analyst = analysts
            .first()
            .ok_or_else(|| HandlerError::new("no business analyst in organization"))?;

        self.0
            .cases
            .update(
                ctx.organization_id(),
                case_id,
                UpdateCaseInput {
                    assigned_ba: Some(Some(analyst.id)),
                    ..Default::default()
                },
                self.0.full_case_threshold,
            )
            .await
            .map_err(|e| HandlerError::new(e.to_string()))?;

        self.0
            .dispatcher
            .dispatch_logged(ctx.organization_id(), ctx.event_name(), analyst.id, ctx.data())
            .await;
        Ok(json!({ "case_id": case_id, "assigned_ba": analyst.id }))
    }
}

struct LogAction(Arc<ActionServices>);

#[async_trait]
impl ActionHandler for LogAction {
    fn name(&self) -> &'static str {
        "log_action"
    }

    async fn execute(
        &self,
        step: &StepDefinition,
        ctx: &mut ExecutionContext,
    ) -> Result<Value, HandlerError> {
        let message = step.param_str("message").unwrap_or("workflow step reached");
        let row = self
            .0
            .audit
            .record(
                ctx.organization_id(),
                ctx.user_id(),
                "workflow_log",
                Some(&format!("template:{}", ctx.template_id())),
                Some(json!({ "message": message, "event": ctx.event_name() })),
            )
            .await
            .map_err(|e| HandlerError::new(e.to_string()))?;
        Ok(json!({ "audit_id": row.id }))
    }
}
