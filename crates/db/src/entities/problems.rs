//! `SeaORM` Entity for the problems table.
//!
//! The `search_vector` column exists in the schema but is maintained by a
//! database trigger and never read through the entity, so it is omitted here.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "problems")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub organization_id: i32,
    pub title: String,
    pub description: String,
    pub priority: String,
    pub status: String,
    pub impact: Option<String>,
    pub department_id: Option<i32>,
    pub reported_by: i32,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// The display code derived from the numeric id.
    #[must_use]
    pub fn code(&self) -> String {
        deciframe_core::code::CodedEntity::Problem.code(self.id)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::organizations::Entity",
        from = "Column::OrganizationId",
        to = "super::organizations::Column::Id"
    )]
    Organizations,
    #[sea_orm(
        belongs_to = "super::departments::Entity",
        from = "Column::DepartmentId",
        to = "super::departments::Column::Id"
    )]
    Departments,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::ReportedBy",
        to = "super::users::Column::Id"
    )]
    Reporter,
    #[sea_orm(has_many = "super::business_cases::Entity")]
    BusinessCases,
}

impl Related<super::business_cases::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BusinessCases.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
