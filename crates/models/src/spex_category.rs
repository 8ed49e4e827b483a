use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::event::SourceType;
use crate::validation::{self, MAX_TEXT};
use crate::{errors::ModelError, spex_details};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "spex_category")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub first_year: String,
    #[serde(skip)]
    pub logo: Option<Vec<u8>>,
    pub logo_content_type: Option<String>,
    pub created_by: String,
    pub created_at: DateTimeWithTimeZone,
    pub last_modified_by: Option<String>,
    pub last_modified_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Details,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Details => Entity::has_many(spex_details::Entity).into(),
        }
    }
}

impl Related<spex_details::Entity> for Entity {
    fn to() -> RelationDef { Relation::Details.def() }
}

crate::audited_behavior!(SourceType::SpexCategory);

pub fn validate_name(v: &str) -> Result<(), ModelError> { validation::required("name", v, MAX_TEXT) }
pub fn validate_first_year(v: &str) -> Result<(), ModelError> { validation::year("firstYear", v) }
