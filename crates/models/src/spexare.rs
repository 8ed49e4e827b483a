use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::event::SourceType;
use crate::validation::{self, MAX_TEXT};
use crate::{activity, errors::ModelError, tag, tagging};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "spexare")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub nick_name: Option<String>,
    pub social_security_number: Option<String>,
    pub graduation: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub comment: Option<String>,
    #[serde(skip)]
    pub image: Option<Vec<u8>>,
    pub image_content_type: Option<String>,
    pub partner_id: Option<i64>,
    pub created_by: String,
    pub created_at: DateTimeWithTimeZone,
    pub last_modified_by: Option<String>,
    pub last_modified_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Activity,
    Tagging,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Activity => Entity::has_many(activity::Entity).into(),
            Relation::Tagging => Entity::has_many(tagging::Entity).into(),
        }
    }
}

impl Related<activity::Entity> for Entity {
    fn to() -> RelationDef { Relation::Activity.def() }
}

impl Related<tag::Entity> for Entity {
    fn to() -> RelationDef { tagging::Relation::Tag.def() }

    fn via() -> Option<RelationDef> { Some(tagging::Relation::Spexare.def().rev()) }
}

crate::audited_behavior!(SourceType::Spexare);

pub fn validate_first_name(v: &str) -> Result<(), ModelError> { validation::required("firstName", v, MAX_TEXT) }
pub fn validate_last_name(v: &str) -> Result<(), ModelError> { validation::required("lastName", v, MAX_TEXT) }
pub fn validate_nick_name(v: Option<&str>) -> Result<(), ModelError> { validation::optional("nickName", v, MAX_TEXT) }
pub fn validate_graduation(v: Option<&str>) -> Result<(), ModelError> { validation::optional("graduation", v, MAX_TEXT) }

pub fn validate_social_security_number(v: Option<&str>) -> Result<(), ModelError> {
    v.map_or(Ok(()), |s| validation::social_security_number("socialSecurityNumber", s))
}
