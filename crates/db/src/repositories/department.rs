//! Department repository enforcing the hierarchy rules.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use thiserror::Error;

use deciframe_core::department::{check_acyclic, child_level, HierarchyError};

use crate::entities::{departments, problems, projects, users};

/// Department-specific failures.
#[derive(Debug, Error)]
pub enum DepartmentError {
    /// The department does not exist in this tenant.
    #[error("department not found")]
    NotFound,

    /// The parent department does not exist in this tenant.
    #[error("parent department not found")]
    ParentNotFound,

    /// Hierarchy rule violation (depth or cycle).
    #[error(transparent)]
    Hierarchy(#[from] HierarchyError),

    /// Deletion refused while users, problems, or projects reference it.
    #[error("department is still referenced")]
    InUse,

    /// Underlying database error.
    #[error(transparent)]
    Db(#[from] DbErr),
}

/// Department repository.
#[derive(Debug, Clone)]
pub struct DepartmentRepository {
    db: DatabaseConnection,
}

impl DepartmentRepository {
    /// Creates a new department repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a department by id within a tenant.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(
        &self,
        organization_id: i32,
        id: i32,
    ) -> Result<Option<departments::Model>, DbErr> {
        departments::Entity::find_by_id(id)
            .filter(departments::Column::OrganizationId.eq(organization_id))
            .one(&self.db)
            .await
    }

    /// Lists a tenant's departments ordered by level then name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self, organization_id: i32) -> Result<Vec<departments::Model>, DbErr> {
        departments::Entity::find()
            .filter(departments::Column::OrganizationId.eq(organization_id))
            .order_by_asc(departments::Column::Level)
            .order_by_asc(departments::Column::Name)
            .all(&self.db)
            .await
    }

    /// Creates a department under an optional parent.
    ///
    /// Level is derived from the parent; creating below the maximum depth
    /// is rejected.
    ///
    /// # Errors
    ///
    /// Returns `DepartmentError::Hierarchy` when the new node would exceed
    /// five levels.
    pub async fn create(
        &self,
        organization_id: i32,
        name: &str,
        parent_id: Option<i32>,
    ) -> Result<departments::Model, DepartmentError> {
        let parent_level = match parent_id {
            Some(pid) => {
                let parent = self
                    .find_by_id(organization_id, pid)
                    .await?
                    .ok_or(DepartmentError::ParentNotFound)?;
                Some(parent.level)
            }
            None => None,
        };
        let level = child_level(parent_level)?;

        Ok(departments::ActiveModel {
            organization_id: Set(organization_id),
            name: Set(name.to_string()),
            parent_id: Set(parent_id),
            level: Set(level),
            created_at: Set(chrono::Utc::now().into()),
            ..Default::default()
        }
        .insert(&self.db)
        .await?)
    }

    /// Moves a department under a new parent, re-checking depth and cycles.
    ///
    /// # Errors
    ///
    /// Returns `DepartmentError::Hierarchy` on a cycle or depth violation.
    pub async fn reparent(
        &self,
        organization_id: i32,
        id: i32,
        new_parent_id: Option<i32>,
    ) -> Result<departments::Model, DepartmentError> {
        let department = self
            .find_by_id(organization_id, id)
            .await?
            .ok_or(DepartmentError::NotFound)?;

        let parent_level = match new_parent_id {
            Some(pid) => {
                let parent = self
                    .find_by_id(organization_id, pid)
                    .await?
                    .ok_or(DepartmentError::ParentNotFound)?;
                let chain = self.parent_chain(organization_id, parent.id).await?;
                check_acyclic(id, &chain)?;
                Some(parent.level)
            }
            None => None,
        };
        let level = child_level(parent_level)?;

        let mut active: departments::ActiveModel = department.into();
        active.parent_id = Set(new_parent_id);
        active.level = Set(level);
        Ok(active.update(&self.db).await?)
    }

    /// Deletes a department, refusing while anything references it.
    ///
    /// # Errors
    ///
    /// Returns `DepartmentError::InUse` when users, problems, or projects
    /// still point at it.
    pub async fn delete(&self, organization_id: i32, id: i32) -> Result<(), DepartmentError> {
        let referenced = users::Entity::find()
            .filter(users::Column::DepartmentId.eq(id))
            .count(&self.db)
            .await?
            + problems::Entity::find()
                .filter(problems::Column::DepartmentId.eq(id))
                .count(&self.db)
                .await?
            + projects::Entity::find()
                .filter(projects::Column::DepartmentId.eq(id))
                .count(&self.db)
                .await?;
        if referenced > 0 {
            return Err(DepartmentError::InUse);
        }

        let result = departments::Entity::delete_by_id(id)
            .filter(departments::Column::OrganizationId.eq(organization_id))
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(DepartmentError::NotFound);
        }
        Ok(())
    }

    /// Walks parent links from `from_id` to the root, returning the ids
    /// passed through, starting with `from_id` itself.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn parent_chain(
        &self,
        organization_id: i32,
        from_id: i32,
    ) -> Result<Vec<i32>, DbErr> {
        let mut chain = Vec::new();
        let mut cursor = Some(from_id);
        // Bounded by the depth rule; the cap guards corrupted data.
        while let Some(id) = cursor {
            if chain.len() > 8 {
                break;
            }
            chain.push(id);
            cursor = self
                .find_by_id(organization_id, id)
                .await?
                .and_then(|d| d.parent_id);
        }
        Ok(chain)
    }
}
