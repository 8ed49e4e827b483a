use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::event::SourceType;
use crate::{activity, actor, task};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "task_activity")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub activity_id: i64,
    pub task_id: i64,
    pub created_by: String,
    pub created_at: DateTimeWithTimeZone,
    pub last_modified_by: Option<String>,
    pub last_modified_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Activity,
    Task,
    Actor,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Activity => Entity::belongs_to(activity::Entity)
                .from(Column::ActivityId)
                .to(activity::Column::Id)
                .into(),
            Relation::Task => Entity::belongs_to(task::Entity)
                .from(Column::TaskId)
                .to(task::Column::Id)
                .into(),
            Relation::Actor => Entity::has_many(actor::Entity).into(),
        }
    }
}

impl Related<activity::Entity> for Entity {
    fn to() -> RelationDef { Relation::Activity.def() }
}

impl Related<task::Entity> for Entity {
    fn to() -> RelationDef { Relation::Task.def() }
}

impl Related<actor::Entity> for Entity {
    fn to() -> RelationDef { Relation::Actor.def() }
}

crate::audited_behavior!(SourceType::Spexare);
