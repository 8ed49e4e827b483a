use chrono::Utc;
use sea_orm::{entity::prelude::*, Set};
use serde::{Deserialize, Serialize};

use crate::audit::current_auditor;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "event")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub event: EventType,
    pub source: SourceType,
    pub created_by: String,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    #[sea_orm(string_value = "CREATE")]
    Create,
    #[sea_orm(string_value = "UPDATE")]
    Update,
    #[sea_orm(string_value = "REMOVE")]
    Remove,
}

impl EventType {
    pub fn on_save(insert: bool) -> Self {
        if insert { Self::Create } else { Self::Update }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceType {
    #[sea_orm(string_value = "NEWS")]
    News,
    #[sea_orm(string_value = "SPEX")]
    Spex,
    #[sea_orm(string_value = "SPEX_CATEGORY")]
    SpexCategory,
    #[sea_orm(string_value = "SPEXARE")]
    Spexare,
    #[sea_orm(string_value = "TAG")]
    Tag,
    #[sea_orm(string_value = "TASK")]
    Task,
    #[sea_orm(string_value = "TASK_CATEGORY")]
    TaskCategory,
    #[sea_orm(string_value = "USER")]
    User,
    #[sea_orm(string_value = "AUTHORITY")]
    Authority,
    #[sea_orm(string_value = "STATE")]
    State,
    #[sea_orm(string_value = "SESSION")]
    Session,
}

impl std::str::FromStr for SourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use sea_orm::Iterable;
        Self::iter()
            .find(|v| v.to_value().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown event source '{s}'"))
    }
}

/// Append an event row on the caller's connection (or transaction).
pub async fn record<C>(db: &C, event: EventType, source: SourceType) -> Result<Model, DbErr>
where
    C: ConnectionTrait,
{
    ActiveModel {
        event: Set(event),
        source: Set(source),
        created_by: Set(current_auditor()),
        created_at: Set(Utc::now().into()),
        ..Default::default()
    }
    .insert(db)
    .await
}
