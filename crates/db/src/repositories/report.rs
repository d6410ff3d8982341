//! Report template and run repository.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use thiserror::Error;

use deciframe_core::lifecycle::RunStatus;
use deciframe_core::report::{ReportFrequency, TemplateType};

use crate::entities::{report_runs, report_templates};

/// Report-repository failures.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The template does not exist in this tenant.
    #[error("report template not found")]
    NotFound,

    /// The run does not exist.
    #[error("report run not found")]
    RunNotFound,

    /// The run is already terminal.
    #[error("cannot transition run from {from} to {to}")]
    InvalidTransition {
        /// Current status.
        from: String,
        /// Requested status.
        to: String,
    },

    /// A stored or submitted enum value is not recognized.
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// Underlying database error.
    #[error(transparent)]
    Db(#[from] DbErr),
}

/// Input for creating or updating a report template.
#[derive(Debug, Clone)]
pub struct UpsertReportTemplateInput {
    /// Display name.
    pub name: String,
    /// Scheduling frequency.
    pub frequency: ReportFrequency,
    /// Layout selector.
    pub template_type: TemplateType,
    /// Dataset filter payload.
    pub filters: serde_json::Value,
    /// Mailing list: user ids, role names, or literal addresses.
    pub recipients: serde_json::Value,
    /// Whether the scheduler picks this template up.
    pub is_active: bool,
}

/// Report repository.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    db: DatabaseConnection,
}

impl ReportRepository {
    /// Creates a new report repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a template by id within a tenant.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_template(
        &self,
        organization_id: i32,
        id: i32,
    ) -> Result<Option<report_templates::Model>, DbErr> {
        report_templates::Entity::find_by_id(id)
            .filter(report_templates::Column::OrganizationId.eq(organization_id))
            .one(&self.db)
            .await
    }

    /// Lists a tenant's templates by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_templates(
        &self,
        organization_id: i32,
    ) -> Result<Vec<report_templates::Model>, DbErr> {
        report_templates::Entity::find()
            .filter(report_templates::Column::OrganizationId.eq(organization_id))
            .order_by_asc(report_templates::Column::Name)
            .all(&self.db)
            .await
    }

    /// Creates a template.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn create_template(
        &self,
        organization_id: i32,
        input: UpsertReportTemplateInput,
        created_by: Option<i32>,
    ) -> Result<report_templates::Model, DbErr> {
        let now = chrono::Utc::now().into();
        report_templates::ActiveModel {
            organization_id: Set(organization_id),
            name: Set(input.name),
            frequency: Set(input.frequency.as_str().to_string()),
            template_type: Set(input.template_type.as_str().to_string()),
            filters: Set(input.filters),
            recipients: Set(input.recipients),
            is_active: Set(input.is_active),
            last_run_at: Set(None),
            created_by: Set(created_by),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await
    }

    /// Updates a template.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::NotFound` for an unknown template.
    pub async fn update_template(
        &self,
        organization_id: i32,
        id: i32,
        input: UpsertReportTemplateInput,
    ) -> Result<report_templates::Model, ReportError> {
        let template = self
            .find_template(organization_id, id)
            .await?
            .ok_or(ReportError::NotFound)?;

        let mut active: report_templates::ActiveModel = template.into();
        active.name = Set(input.name);
        active.frequency = Set(input.frequency.as_str().to_string());
        active.template_type = Set(input.template_type.as_str().to_string());
        active.filters = Set(input.filters);
        active.recipients = Set(input.recipients);
        active.is_active = Set(input.is_active);
        active.updated_at = Set(chrono::Utc::now().into());
        Ok(active.update(&self.db).await?)
    }

    /// Deletes a template and its runs.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::NotFound` for an unknown template.
    pub async fn delete_template(&self, organization_id: i32, id: i32) -> Result<(), ReportError> {
        let result = report_templates::Entity::delete_by_id(id)
            .filter(report_templates::Column::OrganizationId.eq(organization_id))
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(ReportError::NotFound);
        }
        Ok(())
    }

    /// Active templates at a frequency whose last run predates `since`,
    /// across all tenants.
    ///
    /// The scheduler uses this as its last-run gate so a missed tick does
    /// not double-fire.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn due_templates(
        &self,
        frequency: ReportFrequency,
        since: DateTime<Utc>,
    ) -> Result<Vec<report_templates::Model>, DbErr> {
        report_templates::Entity::find()
            .filter(report_templates::Column::IsActive.eq(true))
            .filter(report_templates::Column::Frequency.eq(frequency.as_str()))
            .filter(
                report_templates::Column::LastRunAt
                    .is_null()
                    .or(report_templates::Column::LastRunAt.lt(since)),
            )
            .all(&self.db)
            .await
    }

    /// Stamps a template's last-run timestamp.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::NotFound` for an unknown template.
    pub async fn mark_template_run(
        &self,
        organization_id: i32,
        id: i32,
        at: DateTime<Utc>,
    ) -> Result<(), ReportError> {
        let template = self
            .find_template(organization_id, id)
            .await?
            .ok_or(ReportError::NotFound)?;

        let mut active: report_templates::ActiveModel = template.into();
        active.last_run_at = Set(Some(at.into()));
        active.update(&self.db).await?;
        Ok(())
    }

    // ---- runs ----

    /// Opens a run in the running state.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn start_run(
        &self,
        organization_id: i32,
        template_id: i32,
    ) -> Result<report_runs::Model, DbErr> {
        report_runs::ActiveModel {
            organization_id: Set(organization_id),
            template_id: Set(template_id),
            status: Set(RunStatus::Running.as_str().to_string()),
            emails_sent: Set(0),
            started_at: Set(chrono::Utc::now().into()),
            ..Default::default()
        }
        .insert(&self.db)
        .await
    }

    /// Closes a run as completed with its artifact and send count.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::InvalidTransition` when the run is already
    /// terminal.
    pub async fn complete_run(
        &self,
        run_id: i32,
        artifact_path: &str,
        emails_sent: i32,
    ) -> Result<report_runs::Model, ReportError> {
        self.close_run(run_id, RunStatus::Completed, Some(artifact_path), emails_sent, None)
            .await
    }

    /// Closes a run as failed with an error message.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::InvalidTransition` when the run is already
    /// terminal.
    pub async fn fail_run(
        &self,
        run_id: i32,
        error_message: &str,
    ) -> Result<report_runs::Model, ReportError> {
        self.close_run(run_id, RunStatus::Failed, None, 0, Some(error_message))
            .await
    }

    /// Lists a template's runs, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_runs(
        &self,
        organization_id: i32,
        template_id: i32,
        limit: u64,
    ) -> Result<Vec<report_runs::Model>, DbErr> {
        report_runs::Entity::find()
            .filter(report_runs::Column::OrganizationId.eq(organization_id))
            .filter(report_runs::Column::TemplateId.eq(template_id))
            .order_by_desc(report_runs::Column::StartedAt)
            .limit(limit)
            .all(&self.db)
            .await
    }

    async fn close_run(
        &self,
        run_id: i32,
        to: RunStatus,
        artifact_path: Option<&str>,
        emails_sent: i32,
        error_message: Option<&str>,
    ) -> Result<report_runs::Model, ReportError> {
        let run = report_runs::Entity::find_by_id(run_id)
            .one(&self.db)
            .await?
            .ok_or(ReportError::RunNotFound)?;

        let from = RunStatus::parse(&run.status)
            .ok_or_else(|| ReportError::InvalidValue(run.status.clone()))?;
        if !from.can_transition(to) {
            return Err(ReportError::InvalidTransition {
                from: from.as_str().to_string(),
                to: to.as_str().to_string(),
            });
        }

        let mut active: report_runs::ActiveModel = run.into();
        active.status = Set(to.as_str().to_string());
        active.artifact_path = Set(artifact_path.map(ToString::to_string));
        active.emails_sent = Set(emails_sent);
        active.error_message = Set(error_message.map(ToString::to_string));
        active.completed_at = Set(Some(chrono::Utc::now().into()));
        Ok(active.update(&self.db).await?)
    }
}
