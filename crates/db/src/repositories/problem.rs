//! Problem repository for database operations.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use thiserror::Error;

use deciframe_core::lifecycle::{Priority, ProblemStatus};

use crate::entities::problems;

/// Problem-specific failures.
#[derive(Debug, Error)]
pub enum ProblemError {
    /// The problem does not exist in this tenant.
    #[error("problem not found")]
    NotFound,

    /// The requested status transition is not reachable.
    #[error("cannot transition problem from {from} to {to}")]
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

/// Input for creating a problem.
#[derive(Debug, Clone)]
pub struct CreateProblemInput {
    /// Short title; indexed for search.
    pub title: String,
    /// Full description; indexed for search.
    pub description: String,
    /// Priority; defaults to Medium upstream.
    pub priority: Priority,
    /// Optional impact tag.
    pub impact: Option<String>,
    /// Owning department.
    pub department_id: Option<i32>,
    /// Reporting user.
    pub reported_by: i32,
}

/// Input for updating problem fields (status goes through
/// [`ProblemRepository::transition`]).
#[derive(Debug, Clone, Default)]
pub struct UpdateProblemInput {
    /// New title.
    pub title: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New priority.
    pub priority: Option<Priority>,
    /// New impact tag.
    pub impact: Option<Option<String>>,
    /// New department.
    pub department_id: Option<Option<i32>>,
}

/// Problem repository.
#[derive(Debug, Clone)]
pub struct ProblemRepository {
    db: DatabaseConnection,
}

impl ProblemRepository {
    /// Creates a new problem repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a problem by id within a tenant.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(
        &self,
        organization_id: i32,
        id: i32,
    ) -> Result<Option<problems::Model>, DbErr> {
        problems::Entity::find_by_id(id)
            .filter(problems::Column::OrganizationId.eq(organization_id))
            .one(&self.db)
            .await
    }

    /// Lists problems for a tenant, optionally filtered by status, newest
    /// first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        organization_id: i32,
        status: Option<ProblemStatus>,
        limit: u64,
    ) -> Result<Vec<problems::Model>, DbErr> {
        let mut query = problems::Entity::find()
            .filter(problems::Column::OrganizationId.eq(organization_id));
        if let Some(status) = status {
            query = query.filter(problems::Column::Status.eq(status.as_str()));
        }
        query
            .order_by_desc(problems::Column::CreatedAt)
            .limit(limit)
            .all(&self.db)
            .await
    }

    /// Creates a problem in the Open status.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn create(
        &self,
        organization_id: i32,
        input: CreateProblemInput,
    ) -> Result<problems::Model, DbErr> {
        let now = chrono::Utc::now().into();
        problems::ActiveModel {
            organization_id: Set(organization_id),
            title: Set(input.title),
            description: Set(input.description),
            priority: Set(input.priority.as_str().to_string()),
            status: Set(ProblemStatus::Open.as_str().to_string()),
            impact: Set(input.impact),
            department_id: Set(input.department_id),
            reported_by: Set(input.reported_by),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await
    }

    /// Updates non-status fields.
    ///
    /// # Errors
    ///
    /// Returns `ProblemError::NotFound` for an unknown problem.
    pub async fn update(
        &self,
        organization_id: i32,
        id: i32,
        input: UpdateProblemInput,
    ) -> Result<problems::Model, ProblemError> {
        let problem = self
            .find_by_id(organization_id, id)
            .await?
            .ok_or(ProblemError::NotFound)?;

        let mut active: problems::ActiveModel = problem.into();
        if let Some(title) = input.title {
            active.title = Set(title);
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        if let Some(priority) = input.priority {
            active.priority = Set(priority.as_str().to_string());
        }
        if let Some(impact) = input.impact {
            active.impact = Set(impact);
        }
        if let Some(department_id) = input.department_id {
            active.department_id = Set(department_id);
        }
        active.updated_at = Set(chrono::Utc::now().into());
        Ok(active.update(&self.db).await?)
    }

    /// Transitions a problem to a new status, enforcing the status machine.
    ///
    /// # Errors
    ///
    /// Returns `ProblemError::InvalidTransition` for an unreachable target.
    pub async fn transition(
        &self,
        organization_id: i32,
        id: i32,
        to: ProblemStatus,
    ) -> Result<problems::Model, ProblemError> {
        let problem = self
            .find_by_id(organization_id, id)
            .await?
            .ok_or(ProblemError::NotFound)?;

        let from = ProblemStatus::parse(&problem.status)
            .ok_or_else(|| ProblemError::InvalidValue(problem.status.clone()))?;
        if !from.can_transition(to) {
            return Err(ProblemError::InvalidTransition {
                from: from.as_str().to_string(),
                to: to.as_str().to_string(),
            });
        }

        let mut active: problems::ActiveModel = problem.into();
        active.status = Set(to.as_str().to_string());
        active.updated_at = Set(chrono::Utc::now().into());
        Ok(active.update(&self.db).await?)
    }

    /// Deletes a problem.
    ///
    /// # Errors
    ///
    /// Returns `ProblemError::NotFound` for an unknown problem.
    pub async fn delete(&self, organization_id: i32, id: i32) -> Result<(), ProblemError> {
        let result = problems::Entity::delete_by_id(id)
            .filter(problems::Column::OrganizationId.eq(organization_id))
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(ProblemError::NotFound);
        }
        Ok(())
    }
}
