use models::acl_entry::AclPermission;
use models::task_category;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait, QueryFilter, QueryOrder, Select, Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::dto::AuditDto;
use crate::errors::ServiceError;
use crate::filter::{FieldKind, Fields};
use crate::pagination::{fetch_page, Page, PageRequest, SortOrder};
use crate::patch::{double_option, required};
use crate::permission::{self, ObjectClass, Role};

pub const FIELDS: Fields<task_category::Column> = Fields::new(&[
    ("id", task_category::Column::Id, FieldKind::Integer),
    ("name", task_category::Column::Name, FieldKind::Text),
    ("hasActor", task_category::Column::HasActor, FieldKind::Bool),
    ("createdBy", task_category::Column::CreatedBy, FieldKind::Text),
    ("createdAt", task_category::Column::CreatedAt, FieldKind::Text),
    ("lastModifiedBy", task_category::Column::LastModifiedBy, FieldKind::Text),
    ("lastModifiedAt", task_category::Column::LastModifiedAt, FieldKind::Text),
]);

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskCategoryDto {
    pub id: i64,
    pub name: String,
    pub has_actor: bool,
    #[serde(flatten)]
    pub audit: AuditDto,
}

impl From<task_category::Model> for TaskCategoryDto {
    fn from(m: task_category::Model) -> Self {
        Self { id: m.id, audit: crate::audit_of!(m), name: m.name, has_actor: m.has_actor }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskCategoryCreateDto {
    pub name: String,
    #[serde(default)]
    pub has_actor: bool,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskCategoryUpdateDto {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub has_actor: bool,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskCategoryPatchDto {
    pub id: i64,
    #[serde(default, deserialize_with = "double_option")]
    pub name: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub has_actor: Option<Option<bool>>,
}

fn visible(roles: &[Role]) -> Select<task_category::Entity> {
    task_category::Entity::find().filter(task_category::Column::Id.in_subquery(permission::permitted_ids(
        ObjectClass::TaskCategory,
        roles,
        AclPermission::Read,
    )))
}

async fn find_model<C: ConnectionTrait>(db: &C, roles: &[Role], id: i64) -> Result<task_category::Model, ServiceError> {
    visible(roles)
        .filter(task_category::Column::Id.eq(id))
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found_id("task category", id))
}

pub async fn find_all<C: ConnectionTrait>(db: &C, roles: &[Role], filter: Option<&str>, req: &PageRequest) -> Result<Page<TaskCategoryDto>, ServiceError> {
    let mut q = visible(roles);
    if let Some(cond) = FIELDS.condition(filter)? {
        q = q.filter(cond);
    }
    let page = fetch_page(db, q, &req.clone().or_sort(SortOrder::asc("name")), &FIELDS).await?;
    Ok(page.map(TaskCategoryDto::from))
}

pub async fn find_for_export<C: ConnectionTrait>(db: &C, roles: &[Role], ids: &[i64]) -> Result<Vec<TaskCategoryDto>, ServiceError> {
    let mut q = visible(roles);
    if !ids.is_empty() {
        q = q.filter(task_category::Column::Id.is_in(ids.iter().copied()));
    }
    let rows = q.order_by_asc(task_category::Column::CreatedAt).order_by_asc(task_category::Column::Id).all(db).await?;
    Ok(rows.into_iter().map(TaskCategoryDto::from).collect())
}

pub async fn find_by_id<C: ConnectionTrait>(db: &C, roles: &[Role], id: i64) -> Result<Option<TaskCategoryDto>, ServiceError> {
    Ok(visible(roles)
        .filter(task_category::Column::Id.eq(id))
        .one(db)
        .await?
        .map(TaskCategoryDto::from))
}

pub async fn exists<C: ConnectionTrait>(db: &C, id: i64) -> Result<bool, ServiceError> {
    Ok(task_category::Entity::find_by_id(id).one(db).await?.is_some())
}

#[instrument(skip(db, dto))]
pub async fn create<C: ConnectionTrait + TransactionTrait>(db: &C, dto: TaskCategoryCreateDto) -> Result<TaskCategoryDto, ServiceError> {
    task_category::validate_name(&dto.name)?;
    let txn = db.begin().await?;
    let created = task_category::ActiveModel {
        name: Set(dto.name),
        has_actor: Set(dto.has_actor),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    permission::grant_defaults(&txn, ObjectClass::TaskCategory, created.id).await?;
    txn.commit().await?;
    info!(task_category_id = %created.id, "task_category_created");
    Ok(created.into())
}

#[instrument(skip(db, roles, dto), fields(id = %id))]
pub async fn update<C: ConnectionTrait>(db: &C, roles: &[Role], id: i64, dto: TaskCategoryUpdateDto) -> Result<TaskCategoryDto, ServiceError> {
    if dto.id != id {
        return Err(ServiceError::Validation("id in body does not match path".into()));
    }
    task_category::validate_name(&dto.name)?;
    let mut am: task_category::ActiveModel = find_model(db, roles, id).await?.into();
    am.name = Set(dto.name);
    am.has_actor = Set(dto.has_actor);
    Ok(am.update(db).await?.into())
}

#[instrument(skip(db, roles, dto), fields(id = %id))]
pub async fn partial_update<C: ConnectionTrait>(db: &C, roles: &[Role], id: i64, dto: TaskCategoryPatchDto) -> Result<TaskCategoryDto, ServiceError> {
    if dto.id != id {
        return Err(ServiceError::Validation("id in body does not match path".into()));
    }
    let current = find_model(db, roles, id).await?;
    let name = required("name", dto.name)?.unwrap_or_else(|| current.name.clone());
    let has_actor = required("hasActor", dto.has_actor)?.unwrap_or(current.has_actor);
    task_category::validate_name(&name)?;
    let mut am: task_category::ActiveModel = current.into();
    am.name = Set(name);
    am.has_actor = Set(has_actor);
    Ok(am.update(db).await?.into())
}

#[instrument(skip(db, roles))]
pub async fn delete<C: ConnectionTrait + TransactionTrait>(db: &C, roles: &[Role], id: i64) -> Result<(), ServiceError> {
    let txn = db.begin().await?;
    find_model(&txn, roles, id).await?.delete(&txn).await?;
    permission::revoke_all(&txn, ObjectClass::TaskCategory, id).await?;
    txn.commit().await?;
    info!(task_category_id = %id, "task_category_deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{get_db, ALL_ROLES};

    #[tokio::test]
    async fn task_category_crud_service() -> Result<(), anyhow::Error> {
        let db = get_db().await?;
        let created = create(&db, TaskCategoryCreateDto { name: "Scen".into(), has_actor: true }).await?;
        create(&db, TaskCategoryCreateDto { name: "Teknik".into(), has_actor: false }).await?;

        let actors = find_all(&db, ALL_ROLES, Some("hasActor:true"), &PageRequest::default()).await?;
        assert_eq!(actors.total_elements, 1);
        assert!(find_all(&db, ALL_ROLES, Some("hasActor:maybe"), &PageRequest::default()).await.is_err());

        let updated = update(&db, ALL_ROLES, created.id, TaskCategoryUpdateDto { id: created.id, name: "Scenen".into(), has_actor: false }).await?;
        assert!(!updated.has_actor);

        delete(&db, ALL_ROLES, created.id).await?;
        assert!(find_by_id(&db, ALL_ROLES, created.id).await?.is_none());
        Ok(())
    }
}
