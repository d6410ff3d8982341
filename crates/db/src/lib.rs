//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - Repository abstractions for data access
//! - Database migrations, including the search vectors and RLS policies
//! - The per-request RLS transaction wrapper

pub mod entities;
pub mod migration;
pub mod repositories;
pub mod rls;

pub use repositories::{
    AuditRepository, BusinessCaseRepository, DelayedJobRepository, DepartmentRepository,
    EpicRepository,
    NotificationRepository, OrganizationRepository, ProblemRepository, ProjectRepository,
    ReportDataRepository, ReportRepository, SearchRepository, UserRepository, WorkflowRepository,
};
pub use rls::{RlsConnection, RlsExt};

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use std::time::Duration;

/// Establishes a connection pool to the database.
///
/// Connections are health-checked before use and recycled after the given
/// idle window so stale connections never serve a request.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(
    database_url: &str,
    max_connections: u32,
    recycle_secs: u64,
) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(database_url);
    options
        .max_connections(max_connections)
        .test_before_acquire(true)
        .idle_timeout(Duration::from_secs(recycle_secs))
        .max_lifetime(Duration::from_secs(recycle_secs));
    Database::connect(options).await
}
