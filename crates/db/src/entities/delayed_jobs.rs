//! `SeaORM` Entity for the delayed_jobs table.
//!
//! Durable queue for notification escalations and batched email delivery.
//! The scheduler sweeps rows whose `run_at` has passed and marks them
//! processed; rows survive a process restart.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "delayed_jobs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub organization_id: i32,
    pub job_type: String,
    pub run_at: DateTimeWithTimeZone,
    pub payload: Json,
    pub attempts: i32,
    pub processed_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::organizations::Entity",
        from = "Column::OrganizationId",
        to = "super::organizations::Column::Id"
    )]
    Organizations,
}

impl ActiveModelBehavior for ActiveModel {}
