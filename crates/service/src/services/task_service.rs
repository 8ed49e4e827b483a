use models::acl_entry::AclPermission;
use models::task;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait, QueryFilter, QueryOrder, Select, Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::dto::AuditDto;
use crate::errors::ServiceError;
use crate::filter::{FieldKind, Fields};
use crate::pagination::{fetch_page, Page, PageRequest, SortOrder};
use crate::patch::{double_option, required};
use crate::permission::{self, ObjectClass, Role};
use crate::services::task_category_service::{self, TaskCategoryDto};

pub const FIELDS: Fields<task::Column> = Fields::new(&[
    ("id", task::Column::Id, FieldKind::Integer),
    ("name", task::Column::Name, FieldKind::Text),
    ("category", task::Column::CategoryId, FieldKind::Integer),
    ("createdBy", task::Column::CreatedBy, FieldKind::Text),
    ("createdAt", task::Column::CreatedAt, FieldKind::Text),
    ("lastModifiedBy", task::Column::LastModifiedBy, FieldKind::Text),
    ("lastModifiedAt", task::Column::LastModifiedAt, FieldKind::Text),
]);

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskDto {
    pub id: i64,
    pub name: String,
    #[serde(skip)]
    pub category_id: Option<i64>,
    #[serde(flatten)]
    pub audit: AuditDto,
}

impl From<task::Model> for TaskDto {
    fn from(m: task::Model) -> Self {
        Self { id: m.id, audit: crate::audit_of!(m), name: m.name, category_id: m.category_id }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct TaskCreateDto {
    pub name: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TaskUpdateDto {
    pub id: i64,
    pub name: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TaskPatchDto {
    pub id: i64,
    #[serde(default, deserialize_with = "double_option")]
    pub name: Option<Option<String>>,
}

fn visible(roles: &[Role]) -> Select<task::Entity> {
    task::Entity::find().filter(task::Column::Id.in_subquery(permission::permitted_ids(ObjectClass::Task, roles, AclPermission::Read)))
}

async fn find_model<C: ConnectionTrait>(db: &C, roles: &[Role], id: i64) -> Result<task::Model, ServiceError> {
    visible(roles)
        .filter(task::Column::Id.eq(id))
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found_id("task", id))
}

pub async fn find_all<C: ConnectionTrait>(db: &C, roles: &[Role], filter: Option<&str>, req: &PageRequest) -> Result<Page<TaskDto>, ServiceError> {
    let mut q = visible(roles);
    if let Some(cond) = FIELDS.condition(filter)? {
        q = q.filter(cond);
    }
    let page = fetch_page(db, q, &req.clone().or_sort(SortOrder::asc("name")), &FIELDS).await?;
    Ok(page.map(TaskDto::from))
}

pub async fn find_for_export<C: ConnectionTrait>(db: &C, roles: &[Role], ids: &[i64]) -> Result<Vec<TaskDto>, ServiceError> {
    let mut q = visible(roles);
    if !ids.is_empty() {
        q = q.filter(task::Column::Id.is_in(ids.iter().copied()));
    }
    let rows = q.order_by_asc(task::Column::CreatedAt).order_by_asc(task::Column::Id).all(db).await?;
    Ok(rows.into_iter().map(TaskDto::from).collect())
}

pub async fn find_by_id<C: ConnectionTrait>(db: &C, roles: &[Role], id: i64) -> Result<Option<TaskDto>, ServiceError> {
    Ok(visible(roles).filter(task::Column::Id.eq(id)).one(db).await?.map(TaskDto::from))
}

pub async fn exists<C: ConnectionTrait>(db: &C, id: i64) -> Result<bool, ServiceError> {
    Ok(task::Entity::find_by_id(id).one(db).await?.is_some())
}

#[instrument(skip(db, dto))]
pub async fn create<C: ConnectionTrait + TransactionTrait>(db: &C, dto: TaskCreateDto) -> Result<TaskDto, ServiceError> {
    task::validate_name(&dto.name)?;
    let txn = db.begin().await?;
    let created = task::ActiveModel {
        name: Set(dto.name),
        category_id: Set(None),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    permission::grant_defaults(&txn, ObjectClass::Task, created.id).await?;
    txn.commit().await?;
    info!(task_id = %created.id, "task_created");
    Ok(created.into())
}

#[instrument(skip(db, roles, dto), fields(id = %id))]
pub async fn update<C: ConnectionTrait>(db: &C, roles: &[Role], id: i64, dto: TaskUpdateDto) -> Result<TaskDto, ServiceError> {
    if dto.id != id {
        return Err(ServiceError::Validation("id in body does not match path".into()));
    }
    task::validate_name(&dto.name)?;
    let mut am: task::ActiveModel = find_model(db, roles, id).await?.into();
    am.name = Set(dto.name);
    Ok(am.update(db).await?.into())
}

#[instrument(skip(db, roles, dto), fields(id = %id))]
pub async fn partial_update<C: ConnectionTrait>(db: &C, roles: &[Role], id: i64, dto: TaskPatchDto) -> Result<TaskDto, ServiceError> {
    if dto.id != id {
        return Err(ServiceError::Validation("id in body does not match path".into()));
    }
    let current = find_model(db, roles, id).await?;
    let Some(name) = required("name", dto.name)? else { return Ok(current.into()) };
    task::validate_name(&name)?;
    let mut am: task::ActiveModel = current.into();
    am.name = Set(name);
    Ok(am.update(db).await?.into())
}

#[instrument(skip(db, roles))]
pub async fn delete<C: ConnectionTrait + TransactionTrait>(db: &C, roles: &[Role], id: i64) -> Result<(), ServiceError> {
    let txn = db.begin().await?;
    find_model(&txn, roles, id).await?.delete(&txn).await?;
    permission::revoke_all(&txn, ObjectClass::Task, id).await?;
    txn.commit().await?;
    info!(task_id = %id, "task_deleted");
    Ok(())
}

pub async fn find_category<C: ConnectionTrait>(db: &C, roles: &[Role], id: i64) -> Result<Option<TaskCategoryDto>, ServiceError> {
    match find_model(db, roles, id).await?.category_id {
        Some(cid) => task_category_service::find_by_id(db, roles, cid).await,
        None => Ok(None),
    }
}

#[instrument(skip(db, roles))]
pub async fn set_category<C: ConnectionTrait>(db: &C, roles: &[Role], id: i64, category_id: i64) -> Result<TaskDto, ServiceError> {
    let current = find_model(db, roles, id).await?;
    if task_category_service::find_by_id(db, roles, category_id).await?.is_none() {
        return Err(ServiceError::not_found_id("task category", category_id));
    }
    let mut am: task::ActiveModel = current.into();
    am.category_id = Set(Some(category_id));
    Ok(am.update(db).await?.into())
}

#[instrument(skip(db, roles))]
pub async fn remove_category<C: ConnectionTrait>(db: &C, roles: &[Role], id: i64) -> Result<TaskDto, ServiceError> {
    let mut am: task::ActiveModel = find_model(db, roles, id).await?.into();
    am.category_id = Set(None);
    Ok(am.update(db).await?.into())
}
