use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::event::SourceType;
use crate::{errors::ModelError, spex_activity, spex_details, validation};

/// A production year. Rows with `parent_id` set are revivals.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "spex")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub year: String,
    pub parent_id: Option<i64>,
    pub details_id: i64,
    pub created_by: String,
    pub created_at: DateTimeWithTimeZone,
    pub last_modified_by: Option<String>,
    pub last_modified_at: Option<DateTimeWithTimeZone>,
}

impl Model {
    pub fn is_revival(&self) -> bool {
        self.parent_id.is_some()
    }
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Details,
    SpexActivity,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Details => Entity::belongs_to(spex_details::Entity)
                .from(Column::DetailsId)
                .to(spex_details::Column::Id)
                .into(),
            Relation::SpexActivity => Entity::has_many(spex_activity::Entity).into(),
        }
    }
}

impl Related<spex_details::Entity> for Entity {
    fn to() -> RelationDef { Relation::Details.def() }
}

impl Related<spex_activity::Entity> for Entity {
    fn to() -> RelationDef { Relation::SpexActivity.def() }
}

crate::audited_behavior!(SourceType::Spex);

pub fn validate_year(v: &str) -> Result<(), ModelError> { validation::year("year", v) }
