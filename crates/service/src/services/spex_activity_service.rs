use models::{spex, spex_activity};
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter, Set};
use serde::Serialize;
use tracing::{info, instrument};

use crate::dto::AuditDto;
use crate::errors::ServiceError;
use crate::filter::{FieldKind, Fields};
use crate::pagination::{fetch_page, Page, PageRequest, SortOrder};
use crate::permission::Role;
use crate::services::{scope, spex_service};

pub const FIELDS: Fields<spex_activity::Column> = Fields::new(&[
    ("id", spex_activity::Column::Id, FieldKind::Integer),
    ("spex", spex_activity::Column::SpexId, FieldKind::Integer),
    ("createdBy", spex_activity::Column::CreatedBy, FieldKind::Text),
    ("createdAt", spex_activity::Column::CreatedAt, FieldKind::Text),
    ("lastModifiedBy", spex_activity::Column::LastModifiedBy, FieldKind::Text),
    ("lastModifiedAt", spex_activity::Column::LastModifiedAt, FieldKind::Text),
]);

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SpexActivityDto {
    pub id: i64,
    #[serde(skip)]
    pub spex_id: i64,
    #[serde(flatten)]
    pub audit: AuditDto,
}

impl From<spex_activity::Model> for SpexActivityDto {
    fn from(m: spex_activity::Model) -> Self {
        Self { id: m.id, spex_id: m.spex_id, audit: crate::audit_of!(m) }
    }
}

async fn find_in_scope<C: ConnectionTrait>(db: &C, spexare_id: i64, activity_id: i64, id: i64) -> Result<spex_activity::Model, ServiceError> {
    scope::activity(db, spexare_id, activity_id).await?;
    spex_activity::Entity::find_by_id(id)
        .filter(spex_activity::Column::ActivityId.eq(activity_id))
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found_id("spex activity", id))
}

async fn ensure_spex<C: ConnectionTrait>(db: &C, spex_id: i64) -> Result<(), ServiceError> {
    if spex::Entity::find_by_id(spex_id).one(db).await?.is_none() {
        return Err(ServiceError::not_found_id("spex", spex_id));
    }
    Ok(())
}

async fn pair_exists<C: ConnectionTrait>(db: &C, activity_id: i64, spex_id: i64) -> Result<bool, ServiceError> {
    let n = spex_activity::Entity::find()
        .filter(spex_activity::Column::ActivityId.eq(activity_id))
        .filter(spex_activity::Column::SpexId.eq(spex_id))
        .count(db)
        .await?;
    Ok(n > 0)
}

pub async fn find_by_activity<C: ConnectionTrait>(
    db: &C,
    spexare_id: i64,
    activity_id: i64,
    filter: Option<&str>,
    req: &PageRequest,
) -> Result<Page<SpexActivityDto>, ServiceError> {
    scope::activity(db, spexare_id, activity_id).await?;
    let mut q = spex_activity::Entity::find().filter(spex_activity::Column::ActivityId.eq(activity_id));
    if let Some(cond) = FIELDS.condition(filter)? {
        q = q.filter(cond);
    }
    let page = fetch_page(db, q, &req.clone().or_sort(SortOrder::asc("id")), &FIELDS).await?;
    Ok(page.map(SpexActivityDto::from))
}

pub async fn find_by_id<C: ConnectionTrait>(db: &C, spexare_id: i64, activity_id: i64, id: i64) -> Result<Option<SpexActivityDto>, ServiceError> {
    scope::activity(db, spexare_id, activity_id).await?;
    Ok(spex_activity::Entity::find_by_id(id)
        .filter(spex_activity::Column::ActivityId.eq(activity_id))
        .one(db)
        .await?
        .map(SpexActivityDto::from))
}

#[instrument(skip(db))]
pub async fn create<C: ConnectionTrait>(db: &C, spexare_id: i64, activity_id: i64, spex_id: i64) -> Result<SpexActivityDto, ServiceError> {
    scope::activity(db, spexare_id, activity_id).await?;
    ensure_spex(db, spex_id).await?;
    if pair_exists(db, activity_id, spex_id).await? {
        return Err(ServiceError::Conflict(format!("activity {activity_id} already has spex {spex_id}")));
    }
    let created = spex_activity::ActiveModel {
        activity_id: Set(activity_id),
        spex_id: Set(spex_id),
        ..Default::default()
    }
    .insert(db)
    .await?;
    info!(activity_id = %activity_id, spex_id = %spex_id, "spex_activity_created");
    Ok(created.into())
}

#[instrument(skip(db))]
pub async fn update<C: ConnectionTrait>(db: &C, spexare_id: i64, activity_id: i64, id: i64, spex_id: i64) -> Result<SpexActivityDto, ServiceError> {
    let current = find_in_scope(db, spexare_id, activity_id, id).await?;
    ensure_spex(db, spex_id).await?;
    if current.spex_id == spex_id {
        return Ok(current.into());
    }
    if pair_exists(db, activity_id, spex_id).await? {
        return Err(ServiceError::Conflict(format!("activity {activity_id} already has spex {spex_id}")));
    }
    let mut am: spex_activity::ActiveModel = current.into();
    am.spex_id = Set(spex_id);
    Ok(am.update(db).await?.into())
}

#[instrument(skip(db))]
pub async fn delete<C: ConnectionTrait>(db: &C, spexare_id: i64, activity_id: i64, id: i64) -> Result<(), ServiceError> {
    find_in_scope(db, spexare_id, activity_id, id).await?.delete(db).await?;
    Ok(())
}

pub async fn find_spex<C: ConnectionTrait>(
    db: &C,
    roles: &[Role],
    spexare_id: i64,
    activity_id: i64,
    id: i64,
) -> Result<Option<spex_service::SpexDto>, ServiceError> {
    let found = find_in_scope(db, spexare_id, activity_id, id).await?;
    spex_service::find_by_id(db, roles, found.spex_id).await
}
