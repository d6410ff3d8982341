//! `SeaORM` Entity for the projects table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "projects")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub organization_id: i32,
    pub name: String,
    pub description: Option<String>,
    pub status: String,
    pub priority: String,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))", nullable)]
    pub budget: Option<Decimal>,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
    pub project_manager_id: Option<i32>,
    pub department_id: Option<i32>,
    pub case_id: Option<i32>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// The display code derived from the numeric id.
    #[must_use]
    pub fn code(&self) -> String {
        deciframe_core::code::CodedEntity::Project.code(self.id)
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
        belongs_to = "super::business_cases::Entity",
        from = "Column::CaseId",
        to = "super::business_cases::Column::Id"
    )]
    BusinessCases,
    #[sea_orm(has_many = "super::project_milestones::Entity")]
    Milestones,
}

impl Related<super::project_milestones::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Milestones.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
