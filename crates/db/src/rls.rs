//! Row-Level Security (RLS) context management.
//!
//! Utilities for setting the `PostgreSQL` RLS context per request so that
//! multi-tenant isolation is enforced by the database, not just by query
//! filters.
//!
//! # Usage
//!
//! ```ignore
//! use deciframe_db::rls::RlsExt;
//!
//! // In a handler, after resolving the acting principal:
//! let rls = db.with_rls(ctx.organization_id).await?;
//! let problems = problems::Entity::find().all(rls.transaction()).await?;
//! rls.commit().await?;
//! ```

use sea_orm::{ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbErr, TransactionTrait};

/// A transaction wrapper that scopes every statement to one tenant.
///
/// Sets the `app.current_organization_id` session variable with `SET LOCAL`
/// before any query runs; RLS policies compare tenant columns against it.
pub struct RlsConnection {
    txn: DatabaseTransaction,
}

impl RlsConnection {
    /// Begins a transaction with the tenant context applied.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction cannot be started or the context
    /// variable cannot be set.
    pub async fn new(db: &DatabaseConnection, organization_id: i32) -> Result<Self, DbErr> {
        let txn = db.begin().await?;
        set_rls_context(&txn, organization_id).await?;
        Ok(Self { txn })
    }

    /// The underlying transaction for executing queries.
    #[must_use]
    pub fn transaction(&self) -> &DatabaseTransaction {
        &self.txn
    }

    /// Commits the transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the commit fails.
    pub async fn commit(self) -> Result<(), DbErr> {
        self.txn.commit().await
    }

    /// Rolls back the transaction, discarding all changes.
    ///
    /// # Errors
    ///
    /// Returns an error if the rollback fails.
    pub async fn rollback(self) -> Result<(), DbErr> {
        self.txn.rollback().await
    }
}

/// Sets the tenant context on an existing transaction.
///
/// `SET LOCAL` scopes the variable to the transaction; ids are integers so
/// interpolation cannot carry injection payloads.
///
/// # Errors
///
/// Returns an error if the statement fails.
pub async fn set_rls_context(
    txn: &DatabaseTransaction,
    organization_id: i32,
) -> Result<(), DbErr> {
    let sql = format!("SET LOCAL app.current_organization_id = '{organization_id}'");
    txn.execute_unprepared(&sql).await?;
    Ok(())
}

/// Extension trait for `DatabaseConnection` to create RLS-scoped transactions.
#[async_trait::async_trait]
pub trait RlsExt {
    /// Begins an RLS-scoped transaction for the given tenant.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction cannot be created.
    async fn with_rls(&self, organization_id: i32) -> Result<RlsConnection, DbErr>;
}

#[async_trait::async_trait]
impl RlsExt for DatabaseConnection {
    async fn with_rls(&self, organization_id: i32) -> Result<RlsConnection, DbErr> {
        RlsConnection::new(self, organization_id).await
    }
}
