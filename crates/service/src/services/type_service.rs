use models::types::{self, TypeType};
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;

use crate::errors::ServiceError;

pub const DEFAULT_LANGUAGE: &str = "sv";

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TypeDto {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: TypeType,
    pub label: Option<String>,
}

impl TypeDto {
    fn localized(m: types::Model, lang: &str) -> Self {
        Self { label: m.label(lang), id: m.id, kind: m.kind }
    }
}

pub async fn find_all<C: ConnectionTrait>(db: &C, lang: &str) -> Result<Vec<TypeDto>, ServiceError> {
    let rows = types::Entity::find()
        .order_by_asc(types::Column::Kind)
        .order_by_asc(types::Column::Id)
        .all(db)
        .await?;
    Ok(rows.into_iter().map(|m| TypeDto::localized(m, lang)).collect())
}

pub async fn find_by_type<C: ConnectionTrait>(db: &C, kind: TypeType, lang: &str) -> Result<Vec<TypeDto>, ServiceError> {
    let rows = types::Entity::find()
        .filter(types::Column::Kind.eq(kind))
        .order_by_asc(types::Column::Id)
        .all(db)
        .await?;
    Ok(rows.into_iter().map(|m| TypeDto::localized(m, lang)).collect())
}

pub async fn find_by_id_and_type<C: ConnectionTrait>(db: &C, id: &str, kind: TypeType, lang: &str) -> Result<Option<TypeDto>, ServiceError> {
    let row = types::Entity::find_by_id(id.to_string())
        .filter(types::Column::Kind.eq(kind))
        .one(db)
        .await?;
    Ok(row.map(|m| TypeDto::localized(m, lang)))
}

/// Primary language subtag of the first `Accept-Language` entry.
pub fn primary_language(accept_language: Option<&str>) -> String {
    accept_language
        .and_then(|h| h.split(',').next())
        .and_then(|tag| tag.split(';').next())
        .and_then(|tag| tag.trim().split(['-', '_']).next())
        .map(|p| p.trim().to_ascii_lowercase())
        .filter(|p| !p.is_empty() && p != "*")
        .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string())
}
