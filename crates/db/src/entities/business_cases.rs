//! `SeaORM` Entity for the business_cases table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "business_cases")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub organization_id: i32,
    pub title: String,
    pub description: Option<String>,
    pub summary: Option<String>,
    pub initiative_name: Option<String>,
    pub problem_id: Option<i32>,
    pub case_type: String,
    pub case_depth: String,
    pub status: String,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))", nullable)]
    pub cost_estimate: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))", nullable)]
    pub benefit_estimate: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((8, 2)))", nullable)]
    pub roi: Option<Decimal>,
    pub risk_level: Option<String>,
    pub assigned_ba: Option<i32>,
    pub approved_by: Option<i32>,
    pub created_by: i32,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// The display code derived from the numeric id.
    #[must_use]
    pub fn code(&self) -> String {
        deciframe_core::code::CodedEntity::BusinessCase.code(self.id)
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
        belongs_to = "super::problems::Entity",
        from = "Column::ProblemId",
        to = "super::problems::Column::Id"
    )]
    Problems,
    #[sea_orm(has_many = "super::epics::Entity")]
    Epics,
}

impl Related<super::problems::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Problems.def()
    }
}

impl Related<super::epics::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Epics.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
