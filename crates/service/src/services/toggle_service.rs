use models::toggle;
use models::types::TypeType;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter, Set};
use serde::Serialize;
use tracing::{info, instrument};

use crate::dto::AuditDto;
use crate::errors::ServiceError;
use crate::filter::{FieldKind, Fields};
use crate::pagination::{fetch_page, Page, PageRequest, SortOrder};
use crate::services::scope;

pub const FIELDS: Fields<toggle::Column> = Fields::new(&[
    ("id", toggle::Column::Id, FieldKind::Integer),
    ("type", toggle::Column::TypeId, FieldKind::Text),
    ("value", toggle::Column::Value, FieldKind::Bool),
    ("createdBy", toggle::Column::CreatedBy, FieldKind::Text),
    ("createdAt", toggle::Column::CreatedAt, FieldKind::Text),
    ("lastModifiedBy", toggle::Column::LastModifiedBy, FieldKind::Text),
    ("lastModifiedAt", toggle::Column::LastModifiedAt, FieldKind::Text),
]);

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ToggleDto {
    pub id: i64,
    pub value: bool,
    #[serde(rename = "type")]
    pub type_id: String,
    #[serde(flatten)]
    pub audit: AuditDto,
}

impl From<toggle::Model> for ToggleDto {
    fn from(m: toggle::Model) -> Self {
        Self { id: m.id, audit: crate::audit_of!(m), value: m.value, type_id: m.type_id }
    }
}

async fn find_in_scope<C: ConnectionTrait>(db: &C, spexare_id: i64, type_id: &str, id: i64) -> Result<toggle::Model, ServiceError> {
    scope::ensure_spexare(db, spexare_id).await?;
    scope::ensure_type(db, TypeType::Toggle, type_id).await?;
    let found = toggle::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found_id("toggle", id))?;
    if found.spexare_id != spexare_id || found.type_id != type_id {
        return Err(ServiceError::Unprocessable(format!(
            "toggle {id} does not belong to spexare {spexare_id} with type {type_id}"
        )));
    }
    Ok(found)
}

pub async fn find_by_spexare<C: ConnectionTrait>(
    db: &C,
    spexare_id: i64,
    filter: Option<&str>,
    req: &PageRequest,
) -> Result<Page<ToggleDto>, ServiceError> {
    scope::ensure_spexare(db, spexare_id).await?;
    let mut q = toggle::Entity::find().filter(toggle::Column::SpexareId.eq(spexare_id));
    if let Some(cond) = FIELDS.condition(filter)? {
        q = q.filter(cond);
    }
    let page = fetch_page(db, q, &req.clone().or_sort(SortOrder::asc("type")), &FIELDS).await?;
    Ok(page.map(ToggleDto::from))
}

pub async fn find_by_id<C: ConnectionTrait>(db: &C, spexare_id: i64, id: i64) -> Result<Option<ToggleDto>, ServiceError> {
    scope::ensure_spexare(db, spexare_id).await?;
    Ok(toggle::Entity::find_by_id(id)
        .filter(toggle::Column::SpexareId.eq(spexare_id))
        .one(db)
        .await?
        .map(ToggleDto::from))
}

#[instrument(skip(db))]
pub async fn create<C: ConnectionTrait>(db: &C, spexare_id: i64, type_id: &str, value: bool) -> Result<ToggleDto, ServiceError> {
    scope::ensure_spexare(db, spexare_id).await?;
    scope::ensure_type(db, TypeType::Toggle, type_id).await?;
    let taken = toggle::Entity::find()
        .filter(toggle::Column::SpexareId.eq(spexare_id))
        .filter(toggle::Column::TypeId.eq(type_id))
        .count(db)
        .await?;
    if taken > 0 {
        return Err(ServiceError::Conflict(format!("spexare {spexare_id} already has toggle {type_id}")));
    }
    let created = toggle::ActiveModel {
        value: Set(value),
        type_id: Set(type_id.to_string()),
        spexare_id: Set(spexare_id),
        ..Default::default()
    }
    .insert(db)
    .await?;
    info!(spexare_id = %spexare_id, toggle_id = %created.id, "toggle_created");
    Ok(created.into())
}

#[instrument(skip(db))]
pub async fn update<C: ConnectionTrait>(db: &C, spexare_id: i64, type_id: &str, id: i64, value: bool) -> Result<ToggleDto, ServiceError> {
    let mut am: toggle::ActiveModel = find_in_scope(db, spexare_id, type_id, id).await?.into();
    am.value = Set(value);
    let updated = am.update(db).await?;
    info!(spexare_id = %spexare_id, toggle_id = %id, value, "toggle_updated");
    Ok(updated.into())
}

#[instrument(skip(db))]
pub async fn delete<C: ConnectionTrait>(db: &C, spexare_id: i64, type_id: &str, id: i64) -> Result<(), ServiceError> {
    find_in_scope(db, spexare_id, type_id, id).await?.delete(db).await?;
    info!(spexare_id = %spexare_id, toggle_id = %id, "toggle_deleted");
    Ok(())
}
