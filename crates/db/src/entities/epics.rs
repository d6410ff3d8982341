//! `SeaORM` Entity for the epics table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "epics")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub organization_id: i32,
    pub case_id: i32,
    pub project_id: Option<i32>,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub created_by: i32,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::business_cases::Entity",
        from = "Column::CaseId",
        to = "super::business_cases::Column::Id"
    )]
    BusinessCases,
    #[sea_orm(
        belongs_to = "super::projects::Entity",
        from = "Column::ProjectId",
        to = "super::projects::Column::Id"
    )]
    Projects,
    #[sea_orm(has_many = "super::stories::Entity")]
    Stories,
}

impl Related<super::business_cases::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BusinessCases.def()
    }
}

impl Related<super::stories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Stories.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
