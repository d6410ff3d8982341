//! `SeaORM` Entity for the stories table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "stories")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub organization_id: i32,
    pub epic_id: i32,
    pub title: String,
    pub description: Option<String>,
    pub priority: String,
    pub effort_estimate: Option<i32>,
    pub acceptance_criteria: Json,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::epics::Entity",
        from = "Column::EpicId",
        to = "super::epics::Column::Id"
    )]
    Epics,
}

impl Related<super::epics::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Epics.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
