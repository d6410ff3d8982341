//! Organization repository for database operations.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, Set,
};
use thiserror::Error;

use crate::entities::{organizations, users};

/// Organization-specific failures.
#[derive(Debug, Error)]
pub enum OrganizationError {
    /// The organization does not exist.
    #[error("organization not found")]
    NotFound,

    /// Deletion refused while child entities exist.
    #[error("organization still has {0} users")]
    HasChildren(u64),

    /// Underlying database error.
    #[error(transparent)]
    Db(#[from] DbErr),
}

/// Organization repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct OrganizationRepository {
    db: DatabaseConnection,
}

impl OrganizationRepository {
    /// Creates a new organization repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds an organization by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: i32) -> Result<Option<organizations::Model>, DbErr> {
        organizations::Entity::find_by_id(id).one(&self.db).await
    }

    /// Lists every organization; used by the scheduler to fan out review
    /// events.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self) -> Result<Vec<organizations::Model>, DbErr> {
        organizations::Entity::find().all(&self.db).await
    }

    /// Finds an organization by registered email domain.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_domain(
        &self,
        domain: &str,
    ) -> Result<Option<organizations::Model>, DbErr> {
        organizations::Entity::find()
            .filter(organizations::Column::Domain.eq(domain))
            .one(&self.db)
            .await
    }

    /// Creates an organization with default preferences.
    ///
    /// Called during first registration for a domain; preference defaults
    /// come from the application config.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn create(
        &self,
        name: &str,
        domain: &str,
        currency: &str,
        date_format: &str,
        timezone: &str,
    ) -> Result<organizations::Model, DbErr> {
        let now = chrono::Utc::now().into();
        organizations::ActiveModel {
            name: Set(name.to_string()),
            domain: Set(domain.to_lowercase()),
            currency: Set(currency.to_string()),
            date_format: Set(date_format.to_string()),
            timezone: Set(timezone.to_string()),
            default_theme: Set("light".to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await
    }

    /// Updates tenant preferences.
    ///
    /// # Errors
    ///
    /// Returns `OrganizationError::NotFound` for an unknown id.
    pub async fn update_preferences(
        &self,
        id: i32,
        currency: Option<String>,
        date_format: Option<String>,
        timezone: Option<String>,
        default_theme: Option<String>,
    ) -> Result<organizations::Model, OrganizationError> {
        let org = self
            .find_by_id(id)
            .await?
            .ok_or(OrganizationError::NotFound)?;

        let mut active: organizations::ActiveModel = org.into();
        if let Some(currency) = currency {
            active.currency = Set(currency);
        }
        if let Some(date_format) = date_format {
            active.date_format = Set(date_format);
        }
        if let Some(timezone) = timezone {
            active.timezone = Set(timezone);
        }
        if let Some(theme) = default_theme {
            active.default_theme = Set(theme);
        }
        active.updated_at = Set(chrono::Utc::now().into());
        Ok(active.update(&self.db).await?)
    }

    /// Deletes an organization, refusing while users remain.
    ///
    /// # Errors
    ///
    /// Returns `OrganizationError::HasChildren` when users still reference
    /// the tenant.
    pub async fn delete(&self, id: i32) -> Result<(), OrganizationError> {
        let user_count = users::Entity::find()
            .filter(users::Column::OrganizationId.eq(id))
            .count(&self.db)
            .await?;
        if user_count > 0 {
            return Err(OrganizationError::HasChildren(user_count));
        }

        organizations::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(())
    }
}
