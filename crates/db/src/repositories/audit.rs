//! Audit log repository.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};

use crate::entities::audit_logs;

/// Audit log repository.
#[derive(Debug, Clone)]
pub struct AuditRepository {
    db: DatabaseConnection,
}

impl AuditRepository {
    /// Creates a new audit repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Records one audit entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn record(
        &self,
        organization_id: i32,
        user_id: Option<i32>,
        action: &str,
        target: Option<&str>,
        details: Option<serde_json::Value>,
    ) -> Result<audit_logs::Model, DbErr> {
        audit_logs::ActiveModel {
            organization_id: Set(organization_id),
            user_id: Set(user_id),
            action: Set(action.to_string()),
            target: Set(target.map(ToString::to_string)),
            details: Set(details),
            created_at: Set(chrono::Utc::now().into()),
            ..Default::default()
        }
        .insert(&self.db)
        .await
    }

    /// Most recent entries for a tenant.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn recent(
        &self,
        organization_id: i32,
        limit: u64,
    ) -> Result<Vec<audit_logs::Model>, DbErr> {
        audit_logs::Entity::find()
            .filter(audit_logs::Column::OrganizationId.eq(organization_id))
            .order_by_desc(audit_logs::Column::CreatedAt)
            .limit(limit)
            .all(&self.db)
            .await
    }
}
