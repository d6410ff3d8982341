//! Delayed job repository: durable escalations and batched email delivery.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};

use crate::entities::delayed_jobs;

/// Kinds of delayed work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobType {
    /// Re-dispatch of a notification after its escalation threshold.
    Escalation,
    /// Batched email held until the recipient's delivery boundary.
    BatchedEmail,
    /// A workflow event raised when the job falls due.
    FollowUp,
}

impl JobType {
    /// The stored form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Escalation => "escalation",
            Self::BatchedEmail => "batched_email",
            Self::FollowUp => "follow_up",
        }
    }

    /// Parses the stored form.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "escalation" => Some(Self::Escalation),
            "batched_email" => Some(Self::BatchedEmail),
            "follow_up" => Some(Self::FollowUp),
            _ => None,
        }
    }
}

/// Delayed job repository.
#[derive(Debug, Clone)]
pub struct DelayedJobRepository {
    db: DatabaseConnection,
}

impl DelayedJobRepository {
    /// Creates a new delayed job repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Schedules a job to run at or after `run_at`.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn schedule(
        &self,
        organization_id: i32,
        job_type: JobType,
        run_at: DateTime<Utc>,
        payload: serde_json::Value,
    ) -> Result<delayed_jobs::Model, DbErr> {
        delayed_jobs::ActiveModel {
            organization_id: Set(organization_id),
            job_type: Set(job_type.as_str().to_string()),
            run_at: Set(run_at.into()),
            payload: Set(payload),
            attempts: Set(0),
            processed_at: Set(None),
            created_at: Set(chrono::Utc::now().into()),
            ..Default::default()
        }
        .insert(&self.db)
        .await
    }

    /// Unprocessed jobs whose run time has passed, oldest first.
    ///
    /// At-least-once: a job stays due until marked processed, so a crash
    /// between execution and the mark replays it.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn due_jobs(
        &self,
        now: DateTime<Utc>,
        limit: u64,
    ) -> Result<Vec<delayed_jobs::Model>, DbErr> {
        delayed_jobs::Entity::find()
            .filter(delayed_jobs::Column::ProcessedAt.is_null())
            .filter(delayed_jobs::Column::RunAt.lte(now))
            .order_by_asc(delayed_jobs::Column::RunAt)
            .limit(limit)
            .all(&self.db)
            .await
    }

    /// Marks a job processed.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn mark_processed(&self, job_id: i32) -> Result<(), DbErr> {
        let Some(job) = delayed_jobs::Entity::find_by_id(job_id).one(&self.db).await? else {
            return Ok(());
        };
        let mut active: delayed_jobs::ActiveModel = job.into();
        active.processed_at = Set(Some(chrono::Utc::now().into()));
        active.update(&self.db).await?;
        Ok(())
    }

    /// Increments the attempt counter after a failed execution.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn bump_attempts(&self, job_id: i32) -> Result<i32, DbErr> {
        let Some(job) = delayed_jobs::Entity::find_by_id(job_id).one(&self.db).await? else {
            return Ok(0);
        };
        let attempts = job.attempts + 1;
        let mut active: delayed_jobs::ActiveModel = job.into();
        active.attempts = Set(attempts);
        active.update(&self.db).await?;
        Ok(attempts)
    }
}
