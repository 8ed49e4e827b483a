use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::event::SourceType;
use crate::validation::{self, MAX_TEXT};
use crate::{errors::ModelError, task_activity, types};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "actor")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub role: Option<String>,
    pub vocal_id: String,
    pub task_activity_id: i64,
    pub created_by: String,
    pub created_at: DateTimeWithTimeZone,
    pub last_modified_by: Option<String>,
    pub last_modified_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    TaskActivity,
    Vocal,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::TaskActivity => Entity::belongs_to(task_activity::Entity)
                .from(Column::TaskActivityId)
                .to(task_activity::Column::Id)
                .into(),
            Relation::Vocal => Entity::belongs_to(types::Entity)
                .from(Column::VocalId)
                .to(types::Column::Id)
                .into(),
        }
    }
}

impl Related<task_activity::Entity> for Entity {
    fn to() -> RelationDef { Relation::TaskActivity.def() }
}

impl Related<types::Entity> for Entity {
    fn to() -> RelationDef { Relation::Vocal.def() }
}

crate::audited_behavior!(SourceType::Spexare);

pub fn validate_role(v: Option<&str>) -> Result<(), ModelError> { validation::optional("role", v, MAX_TEXT) }
