use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::event::SourceType;
use crate::validation::{self, MAX_TEXT};
use crate::{errors::ModelError, task_activity, task_category};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "task")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub category_id: Option<i64>,
    pub created_by: String,
    pub created_at: DateTimeWithTimeZone,
    pub last_modified_by: Option<String>,
    pub last_modified_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Category,
    TaskActivity,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Category => Entity::belongs_to(task_category::Entity)
                .from(Column::CategoryId)
                .to(task_category::Column::Id)
                .into(),
            Relation::TaskActivity => Entity::has_many(task_activity::Entity).into(),
        }
    }
}

impl Related<task_category::Entity> for Entity {
    fn to() -> RelationDef { Relation::Category.def() }
}

impl Related<task_activity::Entity> for Entity {
    fn to() -> RelationDef { Relation::TaskActivity.def() }
}

crate::audited_behavior!(SourceType::Task);

pub fn validate_name(v: &str) -> Result<(), ModelError> { validation::required("name", v, MAX_TEXT) }
