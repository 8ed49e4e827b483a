use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{spexare, tag};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tagging")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub spexare_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub tag_id: i64,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Spexare,
    Tag,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Spexare => Entity::belongs_to(spexare::Entity)
                .from(Column::SpexareId)
                .to(spexare::Column::Id)
                .into(),
            Relation::Tag => Entity::belongs_to(tag::Entity)
                .from(Column::TagId)
                .to(tag::Column::Id)
                .into(),
        }
    }
}

impl Related<spexare::Entity> for Entity {
    fn to() -> RelationDef { Relation::Spexare.def() }
}

impl Related<tag::Entity> for Entity {
    fn to() -> RelationDef { Relation::Tag.def() }
}

impl ActiveModelBehavior for ActiveModel {}
