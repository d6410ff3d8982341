//! Notification dispatch.
//!
//! One entry point, [`NotificationDispatcher::dispatch`], decides per
//! tenant setting whether an event reaches a user at all, on which
//! channels, and when. The in-app row is written only when the inbox
//! channel is enabled; immediate deliveries send email inline, batched
//! frequencies park the email in a delayed job until the delivery
//! boundary. Escalation thresholds become delayed jobs too, re-dispatched
//! only if the original notification is still unread.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use sea_orm::DbErr;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{error, info, warn};

use deciframe_core::notify::{context_variables, render_or_default, Frequency};
use deciframe_core::workflow::events;
use deciframe_db::repositories::{
    channels_of, DelayedJobRepository, JobType, NotificationRepository, ProjectRepository,
    UserRepository,
};
use deciframe_db::entities::delayed_jobs;
use deciframe_shared::email::EmailService;

use crate::queue::Event;
use crate::triggers::EventPublisher;

/// Outbound mail transport seam.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Sends one HTML email.
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), String>;

    /// Sends one HTML email with a PDF attachment.
    async fn send_with_attachment(
        &self,
        to: &str,
        subject: &str,
        html_body: &str,
        attachment_path: &std::path::Path,
        attachment_name: &str,
    ) -> Result<(), String>;
}

#[async_trait]
impl Mailer for EmailService {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), String> {
        self.send_email(to, subject, html_body)
            .await
            .map_err(|e| e.to_string())
    }

    async fn send_with_attachment(
        &self,
        to: &str,
        subject: &str,
        html_body: &str,
        attachment_path: &std::path::Path,
        attachment_name: &str,
    ) -> Result<(), String> {
        self.send_email_with_attachment(to, subject, html_body, attachment_path, attachment_name)
            .await
            .map_err(|e| e.to_string())
    }
}

/// Dispatch failures.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The target user does not exist in the tenant.
    #[error("notification recipient {0} not found")]
    RecipientNotFound(i32),

    /// Underlying database error.
    #[error(transparent)]
    Db(#[from] DbErr),
}

/// What a dispatch call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// No setting row, every channel disabled, or no deliverable channel.
    Muted,
    /// Delivered now. The in-app row exists only when the inbox channel
    /// (in-app or push) is enabled; an email-only setting carries none.
    Delivered {
        /// Id of the in-app row, when one was written.
        notification_id: Option<i32>,
        /// Whether the inline email went out.
        email_sent: bool,
    },
    /// Email parked until the delivery boundary.
    Batched {
        /// Id of the in-app row, when one was written.
        notification_id: Option<i32>,
    },
}

/// Per-tenant, per-event notification delivery.
#[derive(Clone)]
pub struct NotificationDispatcher {
    notifications: NotificationRepository,
    users: UserRepository,
    projects: ProjectRepository,
    jobs: DelayedJobRepository,
    mailer: Option<Arc<dyn Mailer>>,
    due_soon_days: i64,
}

impl NotificationDispatcher {
    /// Creates a dispatcher. `mailer = None` disables outbound email; in-app
    /// delivery is unaffected.
    #[must_use]
    pub fn new(
        notifications: NotificationRepository,
        users: UserRepository,
        projects: ProjectRepository,
        jobs: DelayedJobRepository,
        mailer: Option<Arc<dyn Mailer>>,
        due_soon_days: i64,
    ) -> Self {
        Self {
            notifications,
            users,
            projects,
            jobs,
            mailer,
            due_soon_days,
        }
    }

    /// Delivers `event_name` to one user according to the tenant's setting.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::RecipientNotFound`] for an unknown user.
    /// Callers log and drop it; a missing recipient never aborts the
    /// surrounding operation.
    pub async fn dispatch(
        &self,
        organization_id: i32,
        event_name: &str,
        user_id: i32,
        context: &Value,
        is_escalation: bool,
    ) -> Result<DispatchOutcome, DispatchError> {
        let Some(setting) = self
            .notifications
            .get_setting(organization_id, event_name)
            .await?
        else {
            return Ok(DispatchOutcome::Muted);
        };
        let channels = channels_of(&setting);
        if channels.is_muted() {
            return Ok(DispatchOutcome::Muted);
        }

        let user = self
            .users
            .find_by_id(organization_id, user_id)
            .await?
            .ok_or(DispatchError::RecipientNotFound(user_id))?;

        let template = self
            .notifications
            .get_template(organization_id, event_name)
            .await?;
        let mut vars = context_variables(context);
        vars.insert("event_name".to_string(), event_name.to_string());
        let (default_subject, default_body) = default_message(event_name);
        let message = render_or_default(
            template.as_ref().map(|t| t.subject_template.as_str()),
            template.as_ref().map(|t| t.body_template.as_str()),
            default_subject,
            default_body,
            &vars,
        );

        let email_wanted = channels.email
            && template.as_ref().is_none_or(|t| t.email_enabled)
            && self.mailer.is_some();

        // An email channel without a configured transport leaves nothing
        // deliverable.
        if !channels.wants_inbox() && !email_wanted {
            return Ok(DispatchOutcome::Muted);
        }

        let row = if channels.wants_inbox() {
            let link = context.get("link").and_then(Value::as_str);
            Some(
                self.notifications
                    .create(
                        organization_id,
                        user_id,
                        &message.body,
                        link,
                        Some(event_name),
                        is_escalation,
                    )
                    .await?,
            )
        } else {
            None
        };
        let notification_id = row.as_ref().map(|r| r.id);

        let frequency = Frequency::parse(&setting.frequency).unwrap_or_default();
        if frequency.is_batched() {
            if email_wanted {
                let run_at = frequency.next_delivery(Utc::now());
                let mut payload = json!({
                    "email": user.email,
                    "subject": message.subject,
                    "body": message.body,
                });
                if let Some(id) = notification_id {
                    payload["notification_id"] = json!(id);
                }
                self.jobs
                    .schedule(organization_id, JobType::BatchedEmail, run_at, payload)
                    .await?;
            }
            return Ok(DispatchOutcome::Batched { notification_id });
        }

        let mut email_sent = false;
        if email_wanted {
            if let Some(mailer) = &self.mailer {
                match mailer.send(&user.email, &message.subject, &message.body).await {
                    Ok(()) => email_sent = true,
                    Err(e) => {
                        warn!(
                            user_id,
                            event = event_name,
                            error = %e,
                            "email send failed; in-app notification stands"
                        );
                    }
                }
                if let Some(id) = notification_id {
                    self.notifications.record_email_result(id, email_sent).await?;
                }
            }
        }

        // Escalation fires once per original notification; the unread check
        // needs an inbox row, so email-only deliveries never escalate.
        if !is_escalation {
            if let Some(id) = notification_id {
                if let Some(hours) = setting.threshold_hours.filter(|h| *h > 0) {
                    let run_at = Utc::now() + Duration::hours(i64::from(hours));
                    self.jobs
                        .schedule(
                            organization_id,
                            JobType::Escalation,
                            run_at,
                            json!({
                                "notification_id": id,
                                "event_name": event_name,
                                "user_id": user_id,
                                "context": context,
                            }),
                        )
                        .await?;
                }
            }
        }

        Ok(DispatchOutcome::Delivered {
            notification_id,
            email_sent,
        })
    }

    /// Dispatches and downgrades a missing recipient to a log entry.
    pub async fn dispatch_logged(
        &self,
        organization_id: i32,
        event_name: &str,
        user_id: i32,
        context: &Value,
    ) {
        match self
            .dispatch(organization_id, event_name, user_id, context, false)
            .await
        {
            Ok(_) => {}
            Err(DispatchError::RecipientNotFound(id)) => {
                warn!(user_id = id, event = event_name, "recipient not found; dropping notification");
            }
            Err(DispatchError::Db(e)) => {
                error!(event = event_name, error = %e, "notification dispatch failed");
            }
        }
    }

    // ---- sweeps ----

    /// Notifies owners of milestones due within the sweep window and raises
    /// `milestone_due_soon` for workflow templates.
    pub async fn sweep_milestones_due_soon(
        &self,
        publisher: &dyn EventPublisher,
        today: NaiveDate,
    ) {
        let target = today + Duration::days(self.due_soon_days);
        let milestones = match self.projects.milestones_due_on(target).await {
            Ok(rows) => rows,
            Err(e) => {
                error!(error = %e, "due-soon milestone sweep query failed");
                return;
            }
        };
        for milestone in milestones {
            let context = milestone_context(&milestone, None);
            if let Some(owner) = milestone.owner_id {
                self.dispatch_logged(
                    milestone.organization_id,
                    events::MILESTONE_DUE_SOON,
                    owner,
                    &context,
                )
                .await;
            }
            publisher.publish(Event::new(
                events::MILESTONE_DUE_SOON,
                milestone.organization_id,
                context,
            ));
        }
    }

    /// Notifies owners of overdue milestones and raises `milestone_overdue`.
    pub async fn sweep_milestones_overdue(
        &self,
        publisher: &dyn EventPublisher,
        today: NaiveDate,
    ) {
        let milestones = match self.projects.milestones_overdue(today).await {
            Ok(rows) => rows,
            Err(e) => {
                error!(error = %e, "overdue milestone sweep query failed");
                return;
            }
        };
        for milestone in milestones {
            let days_overdue = (today - milestone.due_date).num_days();
            let context = milestone_context(&milestone, Some(days_overdue));
            if let Some(owner) = milestone.owner_id {
                self.dispatch_logged(
                    milestone.organization_id,
                    events::MILESTONE_OVERDUE,
                    owner,
                    &context,
                )
                .await;
            }
            publisher.publish(Event::new(
                events::MILESTONE_OVERDUE,
                milestone.organization_id,
                context,
            ));
        }
    }

    // ---- delayed jobs ----

    /// Executes due delayed jobs: escalation re-dispatch, batched email,
    /// and follow-up event publication.
    ///
    /// At-least-once; a job that keeps failing is retired after three
    /// attempts.
    pub async fn process_due_jobs(&self, publisher: &dyn EventPublisher, limit: u64) {
        let jobs = match self.jobs.due_jobs(Utc::now(), limit).await {
            Ok(jobs) => jobs,
            Err(e) => {
                error!(error = %e, "delayed job scan failed");
                return;
            }
        };
        for job in jobs {
            let job_id = job.id;
            let outcome = self.run_job(publisher, &job).await;
            let result = match outcome {
                Ok(()) => self.jobs.mark_processed(job_id).await,
                Err(e) => {
                    warn!(job_id, job_type = %job.job_type, error = %e, "delayed job failed");
                    match self.jobs.bump_attempts(job_id).await {
                        Ok(attempts) if attempts >= 3 => {
                            error!(job_id, attempts, "delayed job retired after repeated failures");
                            self.jobs.mark_processed(job_id).await
                        }
                        Ok(_) => Ok(()),
                        Err(e) => Err(e),
                    }
                }
            };
            if let Err(e) = result {
                error!(job_id, error = %e, "delayed job bookkeeping failed");
            }
        }
    }

    async fn run_job(
        &self,
        publisher: &dyn EventPublisher,
        job: &delayed_jobs::Model,
    ) -> Result<(), String> {
        match JobType::parse(&job.job_type) {
            Some(JobType::Escalation) => self.run_escalation(job).await,
            Some(JobType::BatchedEmail) => self.run_batched_email(job).await,
            Some(JobType::FollowUp) => {
                let event_name = job
                    .payload
                    .get("event_name")
                    .and_then(Value::as_str)
                    .ok_or("follow-up payload missing event_name")?;
                let context = job.payload.get("context").cloned().unwrap_or(Value::Null);
                publisher.publish(Event::new(event_name, job.organization_id, context));
                Ok(())
            }
            None => {
                // Unknown types are retired, not retried forever.
                warn!(job_id = job.id, job_type = %job.job_type, "unknown delayed job type");
                Ok(())
            }
        }
    }

    async fn run_escalation(&self, job: &delayed_jobs::Model) -> Result<(), String> {
        let payload = &job.payload;
        let notification_id = payload
            .get("notification_id")
            .and_then(Value::as_i64)
            .and_then(|id| i32::try_from(id).ok())
            .ok_or("escalation payload missing notification_id")?;
        let user_id = payload
            .get("user_id")
            .and_then(Value::as_i64)
            .and_then(|id| i32::try_from(id).ok())
            .ok_or("escalation payload missing user_id")?;
        let event_name = payload
            .get("event_name")
            .and_then(Value::as_str)
            .ok_or("escalation payload missing event_name")?;
        let context = payload.get("context").cloned().unwrap_or(Value::Null);

        let original = self
            .notifications
            .find_by_id(notification_id)
            .await
            .map_err(|e| e.to_string())?;
        if original.is_none_or(|n| n.is_read) {
            return Ok(());
        }

        info!(notification_id, event = event_name, "escalating unread notification");
        match self
            .dispatch(job.organization_id, event_name, user_id, &context, true)
            .await
        {
            Ok(_) => Ok(()),
            // A recipient removed since scheduling is not a retryable failure.
            Err(DispatchError::RecipientNotFound(_)) => Ok(()),
            Err(DispatchError::Db(e)) => Err(e.to_string()),
        }
    }

    async fn run_batched_email(&self, job: &delayed_jobs::Model) -> Result<(), String> {
        let Some(mailer) = &self.mailer else {
            return Ok(());
        };
        let payload = &job.payload;
        let email = payload
            .get("email")
            .and_then(Value::as_str)
            .ok_or("batched email payload missing address")?;
        let subject = payload.get("subject").and_then(Value::as_str).unwrap_or("");
        let body = payload.get("body").and_then(Value::as_str).unwrap_or("");

        mailer.send(email, subject, body).await?;

        if let Some(notification_id) = payload
            .get("notification_id")
            .and_then(Value::as_i64)
            .and_then(|id| i32::try_from(id).ok())
        {
            self.notifications
                .record_email_result(notification_id, true)
                .await
                .map_err(|e| e.to_string())?;
        }
        Ok(())
    }
}

fn milestone_context(
    milestone: &deciframe_db::entities::project_milestones::Model,
    days_overdue: Option<i64>,
) -> Value {
    let mut context = json!({
        "milestone": {
            "id": milestone.id,
            "name": milestone.name,
            "due_date": milestone.due_date.to_string(),
            "project_id": milestone.project_id,
        },
        "project_id": milestone.project_id,
    });
    if let Some(owner) = milestone.owner_id {
        context["user_id"] = json!(owner);
    }
    if let Some(days) = days_overdue {
        context["days_overdue"] = json!(days);
    }
    context
}

/// Fallback subject/body per event, used when a tenant has no stored
/// message template.
fn default_message(event_name: &str) -> (&'static str, &'static str) {
    match event_name {
        events::PROBLEM_CREATED => (
            "New problem {{entity_code}}",
            "Problem {{entity_code}} \"{{entity_title}}\" was reported.",
        ),
        events::CASE_SUBMITTED => (
            "Business case {{entity_code}} submitted",
            "Business case {{entity_code}} \"{{entity_title}}\" is awaiting review.",
        ),
        events::CASE_APPROVED => (
            "Business case {{entity_code}} approved",
            "Business case {{entity_code}} \"{{entity_title}}\" was approved.",
        ),
        events::PROJECT_CREATED => (
            "New project {{entity_code}}",
            "Project {{entity_code}} \"{{entity_title}}\" was created.",
        ),
        events::MILESTONE_DUE_SOON => (
            "Milestone due soon: {{milestone_name}}",
            "Milestone \"{{milestone_name}}\" is due on {{milestone_due_date}}.",
        ),
        events::MILESTONE_OVERDUE => (
            "Milestone overdue: {{milestone_name}}",
            "Milestone \"{{milestone_name}}\" is {{days_overdue}} day(s) overdue.",
        ),
        _ => (
            "DeciFrame update",
            "{{entity_code}} \"{{entity_title}}\" changed: {{event_name}}.",
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_message_known_event() {
        let (subject, _) = default_message(events::MILESTONE_OVERDUE);
        assert!(subject.contains("overdue"));
    }

    #[test]
    fn test_default_message_fallback() {
        let (subject, body) = default_message(events::IT_INCIDENT);
        assert_eq!(subject, "DeciFrame update");
        assert!(body.contains("{{event_name}}"));
    }

    #[test]
    fn test_milestone_context_carries_owner_and_overdue_days() {
        let milestone = deciframe_db::entities::project_milestones::Model {
            id: 3,
            organization_id: 1,
            project_id: 7,
            name: "Beta launch".to_string(),
            owner_id: Some(12),
            due_date: chrono::NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            completed: false,
            completion_date: None,
            notes: None,
            created_at: chrono::Utc::now().into(),
        };
        let context = milestone_context(&milestone, Some(4));
        assert_eq!(context["user_id"], 12);
        assert_eq!(context["days_overdue"], 4);
        assert_eq!(context["milestone"]["name"], "Beta launch");
    }
}
