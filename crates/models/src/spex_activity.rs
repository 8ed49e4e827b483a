use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::event::SourceType;
use crate::{activity, spex};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "spex_activity")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub activity_id: i64,
    pub spex_id: i64,
    pub created_by: String,
    pub created_at: DateTimeWithTimeZone,
    pub last_modified_by: Option<String>,
    pub last_modified_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Activity,
    Spex,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Activity => Entity::belongs_to(activity::Entity)
                .from(Column::ActivityId)
                .to(activity::Column::Id)
                .into(),
            Relation::Spex => Entity::belongs_to(spex::Entity)
                .from(Column::SpexId)
                .to(spex::Column::Id)
                .into(),
        }
    }
}

impl Related<activity::Entity> for Entity {
    fn to() -> RelationDef { Relation::Activity.def() }
}

impl Related<spex::Entity> for Entity {
    fn to() -> RelationDef { Relation::Spex.def() }
}

crate::audited_behavior!(SourceType::Spexare);
