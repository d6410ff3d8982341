//! User repository for database operations.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, Set,
};
use thiserror::Error;

use deciframe_core::auth::Role;

use crate::entities::users;

/// User-specific failures.
#[derive(Debug, Error)]
pub enum UserError {
    /// The user does not exist in this tenant.
    #[error("user not found")]
    NotFound,

    /// The email is already registered in this tenant.
    #[error("email already registered")]
    EmailTaken,

    /// Underlying database error.
    #[error(transparent)]
    Db(#[from] DbErr),
}

/// User repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    /// Creates a new user repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a user by id within a tenant.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(
        &self,
        organization_id: i32,
        id: i32,
    ) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find_by_id(id)
            .filter(users::Column::OrganizationId.eq(organization_id))
            .one(&self.db)
            .await
    }

    /// Finds a user by email within a tenant.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_email(
        &self,
        organization_id: i32,
        email: &str,
    ) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find()
            .filter(users::Column::OrganizationId.eq(organization_id))
            .filter(users::Column::Email.eq(email.to_lowercase()))
            .one(&self.db)
            .await
    }

    /// Creates a user.
    ///
    /// The first user of an organization is promoted to Admin regardless of
    /// the requested role; later users keep the requested role (default
    /// Staff) with `department_status = pending` when no department was
    /// chosen.
    ///
    /// # Errors
    ///
    /// Returns `UserError::EmailTaken` for a duplicate email in the tenant.
    pub async fn create(
        &self,
        organization_id: i32,
        email: &str,
        name: &str,
        password_hash: &str,
        requested_role: Role,
        department_id: Option<i32>,
    ) -> Result<users::Model, UserError> {
        let email = email.to_lowercase();
        if self.find_by_email(organization_id, &email).await?.is_some() {
            return Err(UserError::EmailTaken);
        }

        let existing = users::Entity::find()
            .filter(users::Column::OrganizationId.eq(organization_id))
            .count(&self.db)
            .await?;
        let role = if existing == 0 {
            Role::Admin
        } else {
            requested_role
        };
        let department_status = if department_id.is_some() {
            "assigned"
        } else {
            "pending"
        };

        let now = chrono::Utc::now().into();
        Ok(users::ActiveModel {
            organization_id: Set(organization_id),
            email: Set(email),
            name: Set(name.to_string()),
            password_hash: Set(password_hash.to_string()),
            role: Set(role.as_str().to_string()),
            department_id: Set(department_id),
            department_status: Set(department_status.to_string()),
            theme: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await?)
    }

    /// Lists users holding a role within a tenant.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_by_role(
        &self,
        organization_id: i32,
        role: Role,
    ) -> Result<Vec<users::Model>, DbErr> {
        users::Entity::find()
            .filter(users::Column::OrganizationId.eq(organization_id))
            .filter(users::Column::Role.eq(role.as_str()))
            .all(&self.db)
            .await
    }

    /// The manager of a department, if one is assigned to it.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn department_manager(
        &self,
        organization_id: i32,
        department_id: i32,
    ) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find()
            .filter(users::Column::OrganizationId.eq(organization_id))
            .filter(users::Column::DepartmentId.eq(department_id))
            .filter(users::Column::Role.eq(Role::Manager.as_str()))
            .one(&self.db)
            .await
    }

    /// Assigns a user to a department, clearing the pending status.
    ///
    /// # Errors
    ///
    /// Returns `UserError::NotFound` for an unknown user.
    pub async fn assign_department(
        &self,
        organization_id: i32,
        user_id: i32,
        department_id: i32,
    ) -> Result<users::Model, UserError> {
        let user = self
            .find_by_id(organization_id, user_id)
            .await?
            .ok_or(UserError::NotFound)?;

        let mut active: users::ActiveModel = user.into();
        active.department_id = Set(Some(department_id));
        active.department_status = Set("assigned".to_string());
        active.updated_at = Set(chrono::Utc::now().into());
        Ok(active.update(&self.db).await?)
    }

    /// Updates a user's preferred theme.
    ///
    /// # Errors
    ///
    /// Returns `UserError::NotFound` for an unknown user.
    pub async fn set_theme(
        &self,
        organization_id: i32,
        user_id: i32,
        theme: Option<String>,
    ) -> Result<users::Model, UserError> {
        let user = self
            .find_by_id(organization_id, user_id)
            .await?
            .ok_or(UserError::NotFound)?;

        let mut active: users::ActiveModel = user.into();
        active.theme = Set(theme);
        active.updated_at = Set(chrono::Utc::now().into());
        Ok(active.update(&self.db).await?)
    }
}
