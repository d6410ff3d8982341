//! Database migrations.
//!
//! Migrations are managed using sea-orm-migration.

pub use sea_orm_migration::prelude::*;

mod m20260830_000001_initial;
mod m20260830_000002_search;
mod m20260830_000003_force_rls;
mod m20260830_000004_seed_library;

/// Migrator for running database migrations.
pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260830_000001_initial::Migration),
            Box::new(m20260830_000002_search::Migration),
            Box::new(m20260830_000003_force_rls::Migration),
            Box::new(m20260830_000004_seed_library::Migration),
        ]
    }
}
