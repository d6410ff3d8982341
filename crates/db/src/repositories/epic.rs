//! Epic and story repository.
//!
//! Epics hang off a business case and carry a review status machine;
//! stories hang off an epic. Editing an epic (or its stories) is only
//! allowed while the epic's status is editable.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use thiserror::Error;

use deciframe_core::lifecycle::EpicStatus;

use crate::entities::{epics, stories};
use crate::rls::RlsExt;

/// Epic-specific failures.
#[derive(Debug, Error)]
pub enum EpicError {
    /// The epic does not exist in this tenant.
    #[error("epic not found")]
    NotFound,

    /// The story does not exist under this epic.
    #[error("story not found")]
    StoryNotFound,

    /// The requested status transition is not reachable.
    #[error("cannot transition epic from {from} to {to}")]
    InvalidTransition {
        /// Current status.
        from: String,
        /// Requested status.
        to: String,
    },

    /// The epic is past the editable part of its lifecycle.
    #[error("epic is not editable in status {0}")]
    NotEditable(String),

    /// A stored status value is not recognized.
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// Underlying database error.
    #[error(transparent)]
    Db(#[from] DbErr),
}

/// Input for creating or updating a story.
#[derive(Debug, Clone)]
pub struct StoryInput {
    /// Story title.
    pub title: String,
    /// Story description.
    pub description: Option<String>,
    /// Priority label.
    pub priority: String,
    /// Effort points.
    pub effort_estimate: Option<i32>,
    /// Acceptance criteria entries.
    pub acceptance_criteria: serde_json::Value,
}

/// Epic and story repository.
#[derive(Debug, Clone)]
pub struct EpicRepository {
    db: DatabaseConnection,
}

impl EpicRepository {
    /// Creates a new epic repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds an epic by id within a tenant.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(
        &self,
        organization_id: i32,
        id: i32,
    ) -> Result<Option<epics::Model>, DbErr> {
        epics::Entity::find_by_id(id)
            .filter(epics::Column::OrganizationId.eq(organization_id))
            .one(&self.db)
            .await
    }

    /// Lists a case's epics in creation order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_for_case(
        &self,
        organization_id: i32,
        case_id: i32,
    ) -> Result<Vec<epics::Model>, DbErr> {
        epics::Entity::find()
            .filter(epics::Column::OrganizationId.eq(organization_id))
            .filter(epics::Column::CaseId.eq(case_id))
            .order_by_asc(epics::Column::Id)
            .all(&self.db)
            .await
    }

    /// Creates a draft epic under a case.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn create(
        &self,
        organization_id: i32,
        case_id: i32,
        title: &str,
        description: Option<&str>,
        created_by: i32,
    ) -> Result<epics::Model, DbErr> {
        let now = chrono::Utc::now().into();
        epics::ActiveModel {
            organization_id: Set(organization_id),
            case_id: Set(case_id),
            project_id: Set(None),
            title: Set(title.to_string()),
            description: Set(description.map(ToString::to_string)),
            status: Set(EpicStatus::Draft.as_str().to_string()),
            created_by: Set(created_by),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await
    }

    /// Updates title and description while the epic is editable.
    ///
    /// # Errors
    ///
    /// Returns `EpicError::NotEditable` once the epic has been submitted.
    pub async fn update(
        &self,
        organization_id: i32,
        id: i32,
        title: Option<String>,
        description: Option<Option<String>>,
    ) -> Result<epics::Model, EpicError> {
        let epic = self
            .editable_epic(organization_id, id)
            .await?;

        let mut active: epics::ActiveModel = epic.into();
        if let Some(title) = title {
            active.title = Set(title);
        }
        if let Some(description) = description {
            active.description = Set(description);
        }
        active.updated_at = Set(chrono::Utc::now().into());
        Ok(active.update(&self.db).await?)
    }

    /// Transitions an epic through its review machine.
    ///
    /// # Errors
    ///
    /// Returns `EpicError::InvalidTransition` for an unreachable target.
    pub async fn transition(
        &self,
        organization_id: i32,
        id: i32,
        to: EpicStatus,
    ) -> Result<epics::Model, EpicError> {
        let epic = self
            .find_by_id(organization_id, id)
            .await?
            .ok_or(EpicError::NotFound)?;

        let from = EpicStatus::parse(&epic.status)
            .ok_or_else(|| EpicError::InvalidValue(epic.status.clone()))?;
        if !from.can_transition(to) {
            return Err(EpicError::InvalidTransition {
                from: from.as_str().to_string(),
                to: to.as_str().to_string(),
            });
        }

        let mut active: epics::ActiveModel = epic.into();
        active.status = Set(to.as_str().to_string());
        active.updated_at = Set(chrono::Utc::now().into());
        Ok(active.update(&self.db).await?)
    }

    /// Links an epic to the project delivering it.
    ///
    /// # Errors
    ///
    /// Returns `EpicError::NotFound` for an unknown epic.
    pub async fn link_project(
        &self,
        organization_id: i32,
        id: i32,
        project_id: i32,
    ) -> Result<epics::Model, EpicError> {
        let epic = self
            .find_by_id(organization_id, id)
            .await?
            .ok_or(EpicError::NotFound)?;

        let mut active: epics::ActiveModel = epic.into();
        active.project_id = Set(Some(project_id));
        active.updated_at = Set(chrono::Utc::now().into());
        Ok(active.update(&self.db).await?)
    }

    /// Deletes an editable epic and its stories.
    ///
    /// # Errors
    ///
    /// Returns `EpicError::NotEditable` once the epic has been submitted.
    pub async fn delete(&self, organization_id: i32, id: i32) -> Result<(), EpicError> {
        let epic = self.editable_epic(organization_id, id).await?;

        // Both deletes land in one tenant-fenced transaction.
        let rls = self.db.with_rls(organization_id).await?;
        stories::Entity::delete_many()
            .filter(stories::Column::EpicId.eq(epic.id))
            .exec(rls.transaction())
            .await?;
        epics::Entity::delete_by_id(epic.id)
            .exec(rls.transaction())
            .await?;
        rls.commit().await?;
        Ok(())
    }

    // ---- stories ----

    /// Lists an epic's stories in creation order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_stories(
        &self,
        organization_id: i32,
        epic_id: i32,
    ) -> Result<Vec<stories::Model>, DbErr> {
        stories::Entity::find()
            .filter(stories::Column::OrganizationId.eq(organization_id))
            .filter(stories::Column::EpicId.eq(epic_id))
            .order_by_asc(stories::Column::Id)
            .all(&self.db)
            .await
    }

    /// Adds a story to an editable epic.
    ///
    /// # Errors
    ///
    /// Returns `EpicError::NotEditable` once the epic has been submitted.
    pub async fn create_story(
        &self,
        organization_id: i32,
        epic_id: i32,
        input: StoryInput,
    ) -> Result<stories::Model, EpicError> {
        self.editable_epic(organization_id, epic_id).await?;

        let now = chrono::Utc::now().into();
        Ok(stories::ActiveModel {
            organization_id: Set(organization_id),
            epic_id: Set(epic_id),
            title: Set(input.title),
            description: Set(input.description),
            priority: Set(input.priority),
            effort_estimate: Set(input.effort_estimate),
            acceptance_criteria: Set(input.acceptance_criteria),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await?)
    }

    /// Rewrites a story on an editable epic.
    ///
    /// # Errors
    ///
    /// Returns `EpicError::StoryNotFound` for an unknown story.
    pub async fn update_story(
        &self,
        organization_id: i32,
        epic_id: i32,
        story_id: i32,
        input: StoryInput,
    ) -> Result<stories::Model, EpicError> {
        self.editable_epic(organization_id, epic_id).await?;

        let story = stories::Entity::find_by_id(story_id)
            .filter(stories::Column::OrganizationId.eq(organization_id))
            .filter(stories::Column::EpicId.eq(epic_id))
            .one(&self.db)
            .await?
            .ok_or(EpicError::StoryNotFound)?;

        let mut active: stories::ActiveModel = story.into();
        active.title = Set(input.title);
        active.description = Set(input.description);
        active.priority = Set(input.priority);
        active.effort_estimate = Set(input.effort_estimate);
        active.acceptance_criteria = Set(input.acceptance_criteria);
        active.updated_at = Set(chrono::Utc::now().into());
        Ok(active.update(&self.db).await?)
    }

    /// Deletes a story from an editable epic.
    ///
    /// # Errors
    ///
    /// Returns `EpicError::StoryNotFound` for an unknown story.
    pub async fn delete_story(
        &self,
        organization_id: i32,
        epic_id: i32,
        story_id: i32,
    ) -> Result<(), EpicError> {
        self.editable_epic(organization_id, epic_id).await?;

        let result = stories::Entity::delete_by_id(story_id)
            .filter(stories::Column::OrganizationId.eq(organization_id))
            .filter(stories::Column::EpicId.eq(epic_id))
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(EpicError::StoryNotFound);
        }
        Ok(())
    }

    async fn editable_epic(
        &self,
        organization_id: i32,
        id: i32,
    ) -> Result<epics::Model, EpicError> {
        let epic = self
            .find_by_id(organization_id, id)
            .await?
            .ok_or(EpicError::NotFound)?;
        let status = EpicStatus::parse(&epic.status)
            .ok_or_else(|| EpicError::InvalidValue(epic.status.clone()))?;
        if !status.is_editable() {
            return Err(EpicError::NotEditable(status.as_str().to_string()));
        }
        Ok(epic)
    }
}
