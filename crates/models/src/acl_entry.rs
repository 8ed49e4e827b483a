use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A single permission granted to a role on one object.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "acl_entry")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub object_class: String,
    pub object_id: i64,
    pub sid: String,
    pub permission: AclPermission,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AclPermission {
    #[sea_orm(string_value = "READ")]
    Read,
    #[sea_orm(string_value = "WRITE")]
    Write,
    #[sea_orm(string_value = "CREATE")]
    Create,
    #[sea_orm(string_value = "DELETE")]
    Delete,
    #[sea_orm(string_value = "ADMINISTRATION")]
    Administration,
}
