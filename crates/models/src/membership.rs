use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::event::SourceType;
use crate::validation;
use crate::{errors::ModelError, spexare, types};

/// A year of membership of some MEMBERSHIP type.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "membership")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub year: String,
    pub type_id: String,
    pub spexare_id: i64,
    pub created_by: String,
    pub created_at: DateTimeWithTimeZone,
    pub last_modified_by: Option<String>,
    pub last_modified_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Spexare,
    Type,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Spexare => Entity::belongs_to(spexare::Entity)
                .from(Column::SpexareId)
                .to(spexare::Column::Id)
                .into(),
            Relation::Type => Entity::belongs_to(types::Entity)
                .from(Column::TypeId)
                .to(types::Column::Id)
                .into(),
        }
    }
}

impl Related<spexare::Entity> for Entity {
    fn to() -> RelationDef { Relation::Spexare.def() }
}

impl Related<types::Entity> for Entity {
    fn to() -> RelationDef { Relation::Type.def() }
}

crate::audited_behavior!(SourceType::Spexare);

pub fn validate_year(v: &str) -> Result<(), ModelError> { validation::year("year", v) }
