//! Workflow template repository.
//!
//! Definitions are validated against the condition grammar and the action
//! vocabulary before any write; a template that would fail at execution
//! time is rejected at save time instead.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbBackend, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set, Statement,
};
use thiserror::Error;

use deciframe_core::workflow::{validate_definition, WorkflowDefinition, WorkflowError};

use crate::entities::{workflow_library, workflow_templates};

/// Workflow-repository failures.
#[derive(Debug, Error)]
pub enum WorkflowRepoError {
    /// The template does not exist in this tenant.
    #[error("workflow template not found")]
    NotFound,

    /// The library entry does not exist.
    #[error("library entry not found")]
    LibraryEntryNotFound,

    /// The definition failed validation.
    #[error(transparent)]
    Invalid(#[from] WorkflowError),

    /// Underlying database error.
    #[error(transparent)]
    Db(#[from] DbErr),
}

/// Input for creating or updating a workflow template.
#[derive(Debug, Clone)]
pub struct UpsertWorkflowInput {
    /// Display name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// The structured definition document.
    pub definition: serde_json::Value,
    /// Whether the template participates in event matching.
    pub is_active: bool,
}

/// Workflow template repository.
#[derive(Debug, Clone)]
pub struct WorkflowRepository {
    db: DatabaseConnection,
}

impl WorkflowRepository {
    /// Creates a new workflow repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a template by id within a tenant.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(
        &self,
        organization_id: i32,
        id: i32,
    ) -> Result<Option<workflow_templates::Model>, DbErr> {
        workflow_templates::Entity::find_by_id(id)
            .filter(workflow_templates::Column::OrganizationId.eq(organization_id))
            .one(&self.db)
            .await
    }

    /// Lists a tenant's templates by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        organization_id: i32,
    ) -> Result<Vec<workflow_templates::Model>, DbErr> {
        workflow_templates::Entity::find()
            .filter(workflow_templates::Column::OrganizationId.eq(organization_id))
            .order_by_asc(workflow_templates::Column::Name)
            .all(&self.db)
            .await
    }

    /// Creates a template after validating its definition.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowRepoError::Invalid` for a definition with unknown
    /// triggers, unknown actions, or unparsable conditions.
    pub async fn create(
        &self,
        organization_id: i32,
        input: UpsertWorkflowInput,
        created_by: Option<i32>,
        known_actions: &[&str],
    ) -> Result<workflow_templates::Model, WorkflowRepoError> {
        let parsed = WorkflowDefinition::from_value(&input.definition)?;
        validate_definition(&parsed, known_actions)?;

        let now = chrono::Utc::now().into();
        Ok(workflow_templates::ActiveModel {
            organization_id: Set(organization_id),
            name: Set(input.name),
            description: Set(input.description),
            definition: Set(input.definition),
            is_active: Set(input.is_active),
            created_by: Set(created_by),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await?)
    }

    /// Replaces a template's definition and metadata after validation.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowRepoError::Invalid` for a bad definition and
    /// `WorkflowRepoError::NotFound` for an unknown template.
    pub async fn update(
        &self,
        organization_id: i32,
        id: i32,
        input: UpsertWorkflowInput,
        known_actions: &[&str],
    ) -> Result<workflow_templates::Model, WorkflowRepoError> {
        let parsed = WorkflowDefinition::from_value(&input.definition)?;
        validate_definition(&parsed, known_actions)?;

        let template = self
            .find_by_id(organization_id, id)
            .await?
            .ok_or(WorkflowRepoError::NotFound)?;

        let mut active: workflow_templates::ActiveModel = template.into();
        active.name = Set(input.name);
        active.description = Set(input.description);
        active.definition = Set(input.definition);
        active.is_active = Set(input.is_active);
        active.updated_at = Set(chrono::Utc::now().into());
        Ok(active.update(&self.db).await?)
    }

    /// Toggles a template's active flag.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowRepoError::NotFound` for an unknown template.
    pub async fn set_active(
        &self,
        organization_id: i32,
        id: i32,
        is_active: bool,
    ) -> Result<workflow_templates::Model, WorkflowRepoError> {
        let template = self
            .find_by_id(organization_id, id)
            .await?
            .ok_or(WorkflowRepoError::NotFound)?;

        let mut active: workflow_templates::ActiveModel = template.into();
        active.is_active = Set(is_active);
        active.updated_at = Set(chrono::Utc::now().into());
        Ok(active.update(&self.db).await?)
    }

    /// Deletes a template.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowRepoError::NotFound` for an unknown template.
    pub async fn delete(&self, organization_id: i32, id: i32) -> Result<(), WorkflowRepoError> {
        let result = workflow_templates::Entity::delete_by_id(id)
            .filter(workflow_templates::Column::OrganizationId.eq(organization_id))
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(WorkflowRepoError::NotFound);
        }
        Ok(())
    }

    /// Active templates of a tenant whose triggers include `event_name`,
    /// paired with their parsed definitions.
    ///
    /// The trigger-membership test runs as a JSONB predicate so the
    /// database filters before anything is loaded; if that query fails
    /// (older server, mangled document), the tenant's active templates are
    /// scanned in memory instead. A stored definition that no longer
    /// parses is skipped with a log entry rather than failing the whole
    /// match.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_active_matching(
        &self,
        organization_id: i32,
        event_name: &str,
    ) -> Result<Vec<(workflow_templates::Model, WorkflowDefinition)>, DbErr> {
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            "SELECT * FROM workflow_templates \
             WHERE organization_id = $1 AND is_active \
               AND definition->'triggers' ? $2 \
             ORDER BY id",
            [organization_id.into(), event_name.into()],
        );
        let candidates = match workflow_templates::Entity::find()
            .from_raw_sql(stmt)
            .all(&self.db)
            .await
        {
            Ok(rows) => rows,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "trigger-membership query failed; scanning active templates"
                );
                workflow_templates::Entity::find()
                    .filter(workflow_templates::Column::OrganizationId.eq(organization_id))
                    .filter(workflow_templates::Column::IsActive.eq(true))
                    .all(&self.db)
                    .await?
            }
        };

        // matches() re-checks membership; it is the filter on the fallback
        // path and a no-op on the JSONB path.
        let mut matching = Vec::new();
        for template in candidates {
            match WorkflowDefinition::from_value(&template.definition) {
                Ok(definition) if definition.matches(event_name) => {
                    matching.push((template, definition));
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(
                        template_id = template.id,
                        error = %e,
                        "skipping template with unreadable definition"
                    );
                }
            }
        }
        Ok(matching)
    }

    // ---- library ----

    /// Lists the global example catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_library(&self) -> Result<Vec<workflow_library::Model>, DbErr> {
        workflow_library::Entity::find()
            .order_by_asc(workflow_library::Column::Name)
            .all(&self.db)
            .await
    }

    /// Clones a library entry into a tenant's own templates, inactive until
    /// an admin reviews it.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowRepoError::LibraryEntryNotFound` for an unknown
    /// entry.
    pub async fn clone_from_library(
        &self,
        organization_id: i32,
        library_id: i32,
        created_by: Option<i32>,
        known_actions: &[&str],
    ) -> Result<workflow_templates::Model, WorkflowRepoError> {
        let entry = workflow_library::Entity::find_by_id(library_id)
            .one(&self.db)
            .await?
            .ok_or(WorkflowRepoError::LibraryEntryNotFound)?;

        self.create(
            organization_id,
            UpsertWorkflowInput {
                name: entry.name,
                description: entry.description,
                definition: entry.definition,
                is_active: false,
            },
            created_by,
            known_actions,
        )
        .await
    }
}
