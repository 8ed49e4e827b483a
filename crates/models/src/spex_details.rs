use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::validation::{self, MAX_TEXT};
use crate::{errors::ModelError, spex, spex_category};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "spex_details")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub title: String,
    #[serde(skip)]
    pub poster: Option<Vec<u8>>,
    pub poster_content_type: Option<String>,
    pub category_id: Option<i64>,
    pub created_by: String,
    pub created_at: DateTimeWithTimeZone,
    pub last_modified_by: Option<String>,
    pub last_modified_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Category,
    Spex,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Category => Entity::belongs_to(spex_category::Entity)
                .from(Column::CategoryId)
                .to(spex_category::Column::Id)
                .into(),
            Relation::Spex => Entity::has_many(spex::Entity).into(),
        }
    }
}

impl Related<spex_category::Entity> for Entity {
    fn to() -> RelationDef { Relation::Category.def() }
}

impl Related<spex::Entity> for Entity {
    fn to() -> RelationDef { Relation::Spex.def() }
}

crate::audited_behavior!();

pub fn validate_title(v: &str) -> Result<(), ModelError> { validation::required("title", v, MAX_TEXT) }
