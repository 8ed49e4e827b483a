use models::{task, task_activity};
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter, Set};
use serde::Serialize;
use tracing::{info, instrument};

use crate::dto::AuditDto;
use crate::errors::ServiceError;
use crate::filter::{FieldKind, Fields};
use crate::pagination::{fetch_page, Page, PageRequest, SortOrder};
use crate::permission::Role;
use crate::services::{scope, task_service};

pub const FIELDS: Fields<task_activity::Column> = Fields::new(&[
    ("id", task_activity::Column::Id, FieldKind::Integer),
    ("task", task_activity::Column::TaskId, FieldKind::Integer),
    ("createdBy", task_activity::Column::CreatedBy, FieldKind::Text),
    ("createdAt", task_activity::Column::CreatedAt, FieldKind::Text),
    ("lastModifiedBy", task_activity::Column::LastModifiedBy, FieldKind::Text),
    ("lastModifiedAt", task_activity::Column::LastModifiedAt, FieldKind::Text),
]);

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskActivityDto {
    pub id: i64,
    #[serde(skip)]
    pub task_id: i64,
    #[serde(flatten)]
    pub audit: AuditDto,
}

impl From<task_activity::Model> for TaskActivityDto {
    fn from(m: task_activity::Model) -> Self {
        Self { id: m.id, task_id: m.task_id, audit: crate::audit_of!(m) }
    }
}

async fn ensure_task<C: ConnectionTrait>(db: &C, task_id: i64) -> Result<(), ServiceError> {
    if task::Entity::find_by_id(task_id).one(db).await?.is_none() {
        return Err(ServiceError::not_found_id("task", task_id));
    }
    Ok(())
}

async fn pair_exists<C: ConnectionTrait>(db: &C, activity_id: i64, task_id: i64) -> Result<bool, ServiceError> {
    let n = task_activity::Entity::find()
        .filter(task_activity::Column::ActivityId.eq(activity_id))
        .filter(task_activity::Column::TaskId.eq(task_id))
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
) -> Result<Page<TaskActivityDto>, ServiceError> {
    scope::activity(db, spexare_id, activity_id).await?;
    let mut q = task_activity::Entity::find().filter(task_activity::Column::ActivityId.eq(activity_id));
    if let Some(cond) = FIELDS.condition(filter)? {
        q = q.filter(cond);
    }
    let page = fetch_page(db, q, &req.clone().or_sort(SortOrder::asc("id")), &FIELDS).await?;
    Ok(page.map(TaskActivityDto::from))
}

pub async fn find_by_id<C: ConnectionTrait>(db: &C, spexare_id: i64, activity_id: i64, id: i64) -> Result<Option<TaskActivityDto>, ServiceError> {
    scope::activity(db, spexare_id, activity_id).await?;
    Ok(task_activity::Entity::find_by_id(id)
        .filter(task_activity::Column::ActivityId.eq(activity_id))
        .one(db)
        .await?
        .map(TaskActivityDto::from))
}

#[instrument(skip(db))]
pub async fn create<C: ConnectionTrait>(db: &C, spexare_id: i64, activity_id: i64, task_id: i64) -> Result<TaskActivityDto, ServiceError> {
    scope::activity(db, spexare_id, activity_id).await?;
    ensure_task(db, task_id).await?;
    if pair_exists(db, activity_id, task_id).await? {
        return Err(ServiceError::Conflict(format!("activity {activity_id} already has task {task_id}")));
    }
    let created = task_activity::ActiveModel {
        activity_id: Set(activity_id),
        task_id: Set(task_id),
        ..Default::default()
    }
    .insert(db)
    .await?;
    info!(activity_id = %activity_id, task_id = %task_id, "task_activity_created");
    Ok(created.into())
}

#[instrument(skip(db))]
pub async fn update<C: ConnectionTrait>(db: &C, spexare_id: i64, activity_id: i64, id: i64, task_id: i64) -> Result<TaskActivityDto, ServiceError> {
    let current = scope::task_activity(db, spexare_id, activity_id, id).await?;
    ensure_task(db, task_id).await?;
    if current.task_id == task_id {
        return Ok(current.into());
    }
    if pair_exists(db, activity_id, task_id).await? {
        return Err(ServiceError::Conflict(format!("activity {activity_id} already has task {task_id}")));
    }
    let mut am: task_activity::ActiveModel = current.into();
    am.task_id = Set(task_id);
    Ok(am.update(db).await?.into())
}

#[instrument(skip(db))]
pub async fn delete<C: ConnectionTrait>(db: &C, spexare_id: i64, activity_id: i64, id: i64) -> Result<(), ServiceError> {
    scope::task_activity(db, spexare_id, activity_id, id).await?.delete(db).await?;
    Ok(())
}

pub async fn find_task<C: ConnectionTrait>(
    db: &C,
    roles: &[Role],
    spexare_id: i64,
    activity_id: i64,
    id: i64,
) -> Result<Option<task_service::TaskDto>, ServiceError> {
    let found = scope::task_activity(db, spexare_id, activity_id, id).await?;
    task_service::find_by_id(db, roles, found.task_id).await
}
