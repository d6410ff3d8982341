//! Project and milestone repository for database operations.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use thiserror::Error;

use deciframe_core::lifecycle::{validate_completion, MilestoneError, Priority, ProjectStatus};

use crate::entities::{project_milestones, projects};

/// Project-specific failures.
#[derive(Debug, Error)]
pub enum ProjectError {
    /// The project does not exist in this tenant.
    #[error("project not found")]
    NotFound,

    /// The milestone does not exist in this tenant.
    #[error("milestone not found")]
    MilestoneNotFound,

    /// The requested status transition is not reachable.
    #[error("cannot transition project from {from} to {to}")]
    InvalidTransition {
        /// Current status.
        from: String,
        /// Requested status.
        to: String,
    },

    /// Milestone completion invariant violation.
    #[error(transparent)]
    Milestone(#[from] MilestoneError),

    /// A stored or submitted enum value is not recognized.
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// Underlying database error.
    #[error(transparent)]
    Db(#[from] DbErr),
}

/// Input for creating a project.
#[derive(Debug, Clone)]
pub struct CreateProjectInput {
    /// Project name; indexed for search.
    pub name: String,
    /// Description; indexed for search.
    pub description: Option<String>,
    /// Priority.
    pub priority: Priority,
    /// Allocated budget.
    pub budget: Option<Decimal>,
    /// Planned start.
    pub start_date: Option<NaiveDate>,
    /// Planned end.
    pub end_date: Option<NaiveDate>,
    /// Assigned project manager.
    pub project_manager_id: Option<i32>,
    /// Owning department.
    pub department_id: Option<i32>,
    /// Approved business case this project realizes.
    pub case_id: Option<i32>,
}

/// Input for creating a milestone.
#[derive(Debug, Clone)]
pub struct CreateMilestoneInput {
    /// Milestone name.
    pub name: String,
    /// Responsible owner.
    pub owner_id: Option<i32>,
    /// Due date.
    pub due_date: NaiveDate,
    /// Free-form notes.
    pub notes: Option<String>,
}

/// Project repository.
#[derive(Debug, Clone)]
pub struct ProjectRepository {
    db: DatabaseConnection,
}

impl ProjectRepository {
    /// Creates a new project repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a project by id within a tenant.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(
        &self,
        organization_id: i32,
        id: i32,
    ) -> Result<Option<projects::Model>, DbErr> {
        projects::Entity::find_by_id(id)
            .filter(projects::Column::OrganizationId.eq(organization_id))
            .one(&self.db)
            .await
    }

    /// Lists projects for a tenant, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        organization_id: i32,
        status: Option<ProjectStatus>,
        limit: u64,
    ) -> Result<Vec<projects::Model>, DbErr> {
        let mut query =
            projects::Entity::find().filter(projects::Column::OrganizationId.eq(organization_id));
        if let Some(status) = status {
            query = query.filter(projects::Column::Status.eq(status.as_str()));
        }
        query
            .order_by_desc(projects::Column::CreatedAt)
            .limit(limit)
            .all(&self.db)
            .await
    }

    /// Creates a project in the Open status.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn create(
        &self,
        organization_id: i32,
        input: CreateProjectInput,
    ) -> Result<projects::Model, DbErr> {
        let now = chrono::Utc::now().into();
        projects::ActiveModel {
            organization_id: Set(organization_id),
            name: Set(input.name),
            description: Set(input.description),
            status: Set(ProjectStatus::Open.as_str().to_string()),
            priority: Set(input.priority.as_str().to_string()),
            budget: Set(input.budget),
            start_date: Set(input.start_date),
            end_date: Set(input.end_date),
            project_manager_id: Set(input.project_manager_id),
            department_id: Set(input.department_id),
            case_id: Set(input.case_id),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await
    }

    /// Transitions a project to a new status, enforcing the status machine.
    ///
    /// # Errors
    ///
    /// Returns `ProjectError::InvalidTransition` for an unreachable target.
    pub async fn transition(
        &self,
        organization_id: i32,
        id: i32,
        to: ProjectStatus,
    ) -> Result<projects::Model, ProjectError> {
        let project = self
            .find_by_id(organization_id, id)
            .await?
            .ok_or(ProjectError::NotFound)?;

        let from = ProjectStatus::parse(&project.status)
            .ok_or_else(|| ProjectError::InvalidValue(project.status.clone()))?;
        if !from.can_transition(to) {
            return Err(ProjectError::InvalidTransition {
                from: from.as_str().to_string(),
                to: to.as_str().to_string(),
            });
        }

        let mut active: projects::ActiveModel = project.into();
        active.status = Set(to.as_str().to_string());
        active.updated_at = Set(chrono::Utc::now().into());
        Ok(active.update(&self.db).await?)
    }

    /// Lists a project's milestones ordered by due date.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_milestones(
        &self,
        organization_id: i32,
        project_id: i32,
    ) -> Result<Vec<project_milestones::Model>, DbErr> {
        project_milestones::Entity::find()
            .filter(project_milestones::Column::OrganizationId.eq(organization_id))
            .filter(project_milestones::Column::ProjectId.eq(project_id))
            .order_by_asc(project_milestones::Column::DueDate)
            .all(&self.db)
            .await
    }

    /// Creates a milestone under a project.
    ///
    /// # Errors
    ///
    /// Returns `ProjectError::NotFound` for an unknown project.
    pub async fn create_milestone(
        &self,
        organization_id: i32,
        project_id: i32,
        input: CreateMilestoneInput,
    ) -> Result<project_milestones::Model, ProjectError> {
        self.find_by_id(organization_id, project_id)
            .await?
            .ok_or(ProjectError::NotFound)?;

        Ok(project_milestones::ActiveModel {
            organization_id: Set(organization_id),
            project_id: Set(project_id),
            name: Set(input.name),
            owner_id: Set(input.owner_id),
            due_date: Set(input.due_date),
            completed: Set(false),
            notes: Set(input.notes),
            created_at: Set(chrono::Utc::now().into()),
            ..Default::default()
        }
        .insert(&self.db)
        .await?)
    }

    /// Marks a milestone complete, requiring a completion date.
    ///
    /// # Errors
    ///
    /// Returns `ProjectError::Milestone` when the completion date is absent.
    pub async fn complete_milestone(
        &self,
        organization_id: i32,
        milestone_id: i32,
        completion_date: Option<NaiveDate>,
        notes: Option<String>,
    ) -> Result<project_milestones::Model, ProjectError> {
        validate_completion(true, completion_date)?;

        let milestone = project_milestones::Entity::find_by_id(milestone_id)
            .filter(project_milestones::Column::OrganizationId.eq(organization_id))
            .one(&self.db)
            .await?
            .ok_or(ProjectError::MilestoneNotFound)?;

        let mut active: project_milestones::ActiveModel = milestone.into();
        active.completed = Set(true);
        active.completion_date = Set(completion_date);
        if let Some(notes) = notes {
            active.notes = Set(Some(notes));
        }
        Ok(active.update(&self.db).await?)
    }

    /// Incomplete milestones due exactly on `date`, across all tenants.
    ///
    /// Used by the due-soon sweep, which runs outside any request context.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn milestones_due_on(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<project_milestones::Model>, DbErr> {
        project_milestones::Entity::find()
            .filter(project_milestones::Column::Completed.eq(false))
            .filter(project_milestones::Column::DueDate.eq(date))
            .all(&self.db)
            .await
    }

    /// Incomplete milestones overdue as of `today`, across all tenants.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn milestones_overdue(
        &self,
        today: NaiveDate,
    ) -> Result<Vec<project_milestones::Model>, DbErr> {
        project_milestones::Entity::find()
            .filter(project_milestones::Column::Completed.eq(false))
            .filter(project_milestones::Column::DueDate.lt(today))
            .all(&self.db)
            .await
    }
}
