use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::event::SourceType;
use crate::{spex_activity, spexare, task_activity};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "activity")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub spexare_id: i64,
    pub created_by: String,
    pub created_at: DateTimeWithTimeZone,
    pub last_modified_by: Option<String>,
    pub last_modified_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Spexare,
    SpexActivity,
    TaskActivity,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Spexare => Entity::belongs_to(spexare::Entity)
                .from(Column::SpexareId)
                .to(spexare::Column::Id)
                .into(),
            Relation::SpexActivity => Entity::has_many(spex_activity::Entity).into(),
            Relation::TaskActivity => Entity::has_many(task_activity::Entity).into(),
        }
    }
}

impl Related<spexare::Entity> for Entity {
    fn to() -> RelationDef { Relation::Spexare.def() }
}

impl Related<spex_activity::Entity> for Entity {
    fn to() -> RelationDef { Relation::SpexActivity.def() }
}

impl Related<task_activity::Entity> for Entity {
    fn to() -> RelationDef { Relation::TaskActivity.def() }
}

crate::audited_behavior!(SourceType::Spexare);
