use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::event::SourceType;
use crate::validation::{self, MAX_TEXT};
use crate::{errors::ModelError, spexare, tagging};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tag")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub created_by: String,
    pub created_at: DateTimeWithTimeZone,
    pub last_modified_by: Option<String>,
    pub last_modified_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Tagging,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Tagging => Entity::has_many(tagging::Entity).into(),
        }
    }
}

impl Related<spexare::Entity> for Entity {
    fn to() -> RelationDef { tagging::Relation::Spexare.def() }

    fn via() -> Option<RelationDef> { Some(tagging::Relation::Tag.def().rev()) }
}

crate::audited_behavior!(SourceType::Tag);

pub fn validate_name(v: &str) -> Result<(), ModelError> { validation::required("name", v, MAX_TEXT) }
