use models::actor;
use models::types::{self, TypeType};
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::dto::AuditDto;
use crate::errors::ServiceError;
use crate::filter::{FieldKind, Fields};
use crate::pagination::{fetch_page, Page, PageRequest, SortOrder};
use crate::patch::double_option;
use crate::services::scope;

pub const FIELDS: Fields<actor::Column> = Fields::new(&[
    ("id", actor::Column::Id, FieldKind::Integer),
    ("role", actor::Column::Role, FieldKind::Text),
    ("vocal", actor::Column::VocalId, FieldKind::Text),
    ("createdBy", actor::Column::CreatedBy, FieldKind::Text),
    ("createdAt", actor::Column::CreatedAt, FieldKind::Text),
    ("lastModifiedBy", actor::Column::LastModifiedBy, FieldKind::Text),
    ("lastModifiedAt", actor::Column::LastModifiedAt, FieldKind::Text),
]);

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActorDto {
    pub id: i64,
    pub role: Option<String>,
    #[serde(skip)]
    pub vocal_id: String,
    #[serde(flatten)]
    pub audit: AuditDto,
}

impl From<actor::Model> for ActorDto {
    fn from(m: actor::Model) -> Self {
        Self { id: m.id, audit: crate::audit_of!(m), role: m.role, vocal_id: m.vocal_id }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ActorCreateDto {
    pub role: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ActorUpdateDto {
    pub id: i64,
    pub role: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ActorPatchDto {
    pub id: i64,
    #[serde(default, deserialize_with = "double_option")]
    pub role: Option<Option<String>>,
}

async fn ensure_vocal<C: ConnectionTrait>(db: &C, vocal_id: &str) -> Result<(), ServiceError> {
    let found = types::Entity::find_by_id(vocal_id.to_string())
        .filter(types::Column::Kind.eq(TypeType::Vocal))
        .one(db)
        .await?;
    if found.is_none() {
        return Err(ServiceError::not_found_id("vocal", vocal_id));
    }
    Ok(())
}

async fn find_in_scope<C: ConnectionTrait>(
    db: &C,
    spexare_id: i64,
    activity_id: i64,
    task_activity_id: i64,
    vocal_id: &str,
    id: i64,
) -> Result<actor::Model, ServiceError> {
    scope::task_activity(db, spexare_id, activity_id, task_activity_id).await?;
    ensure_vocal(db, vocal_id).await?;
    actor::Entity::find_by_id(id)
        .filter(actor::Column::TaskActivityId.eq(task_activity_id))
        .filter(actor::Column::VocalId.eq(vocal_id))
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found_id("actor", id))
}

pub async fn find_by_task_activity<C: ConnectionTrait>(
    db: &C,
    spexare_id: i64,
    activity_id: i64,
    task_activity_id: i64,
    filter: Option<&str>,
    req: &PageRequest,
) -> Result<Page<ActorDto>, ServiceError> {
    scope::task_activity(db, spexare_id, activity_id, task_activity_id).await?;
    let mut q = actor::Entity::find().filter(actor::Column::TaskActivityId.eq(task_activity_id));
    if let Some(cond) = FIELDS.condition(filter)? {
        q = q.filter(cond);
    }
    let page = fetch_page(db, q, &req.clone().or_sort(SortOrder::asc("id")), &FIELDS).await?;
    Ok(page.map(ActorDto::from))
}

pub async fn find_by_id<C: ConnectionTrait>(
    db: &C,
    spexare_id: i64,
    activity_id: i64,
    task_activity_id: i64,
    id: i64,
) -> Result<Option<ActorDto>, ServiceError> {
    scope::task_activity(db, spexare_id, activity_id, task_activity_id).await?;
    Ok(actor::Entity::find_by_id(id)
        .filter(actor::Column::TaskActivityId.eq(task_activity_id))
        .one(db)
        .await?
        .map(ActorDto::from))
}

#[instrument(skip(db, dto))]
pub async fn create<C: ConnectionTrait>(
    db: &C,
    spexare_id: i64,
    activity_id: i64,
    task_activity_id: i64,
    vocal_id: &str,
    dto: ActorCreateDto,
) -> Result<ActorDto, ServiceError> {
    scope::task_activity(db, spexare_id, activity_id, task_activity_id).await?;
    ensure_vocal(db, vocal_id).await?;
    actor::validate_role(dto.role.as_deref())?;
    let taken = actor::Entity::find()
        .filter(actor::Column::TaskActivityId.eq(task_activity_id))
        .filter(actor::Column::VocalId.eq(vocal_id))
        .count(db)
        .await?;
    if taken > 0 {
        return Err(ServiceError::Conflict(format!("task activity {task_activity_id} already has vocal {vocal_id}")));
    }
    let created = actor::ActiveModel {
        role: Set(dto.role),
        vocal_id: Set(vocal_id.to_string()),
        task_activity_id: Set(task_activity_id),
        ..Default::default()
    }
    .insert(db)
    .await?;
    info!(task_activity_id = %task_activity_id, actor_id = %created.id, "actor_created");
    Ok(created.into())
}

#[instrument(skip(db, dto))]
pub async fn update<C: ConnectionTrait>(
    db: &C,
    spexare_id: i64,
    activity_id: i64,
    task_activity_id: i64,
    vocal_id: &str,
    id: i64,
    dto: ActorUpdateDto,
) -> Result<ActorDto, ServiceError> {
    let patch = ActorPatchDto { id: dto.id, role: Some(dto.role) };
    partial_update(db, spexare_id, activity_id, task_activity_id, vocal_id, id, patch).await
}

#[instrument(skip(db, dto))]
pub async fn partial_update<C: ConnectionTrait>(
    db: &C,
    spexare_id: i64,
    activity_id: i64,
    task_activity_id: i64,
    vocal_id: &str,
    id: i64,
    dto: ActorPatchDto,
) -> Result<ActorDto, ServiceError> {
    if dto.id != id {
        return Err(ServiceError::Validation("id in body does not match path".into()));
    }
    let current = find_in_scope(db, spexare_id, activity_id, task_activity_id, vocal_id, id).await?;
    let Some(role) = dto.role else { return Ok(current.into()) };
    actor::validate_role(role.as_deref())?;
    let mut am: actor::ActiveModel = current.into();
    am.role = Set(role);
    Ok(am.update(db).await?.into())
}

#[instrument(skip(db))]
pub async fn delete<C: ConnectionTrait>(
    db: &C,
    spexare_id: i64,
    activity_id: i64,
    task_activity_id: i64,
    vocal_id: &str,
    id: i64,
) -> Result<(), ServiceError> {
    find_in_scope(db, spexare_id, activity_id, task_activity_id, vocal_id, id)
        .await?
        .delete(db)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{activity_service, task_activity_service, task_service::{self, TaskCreateDto}};
    use crate::test_support::get_db;
    use models::spexare;

    #[tokio::test]
    async fn actor_lifecycle_and_vocal_rules() -> Result<(), anyhow::Error> {
        let db = get_db().await?;
        let s = spexare::ActiveModel { first_name: Set("A".into()), last_name: Set("A".into()), ..Default::default() }.insert(&db).await?;
        let act = activity_service::create(&db, s.id).await?;
        let task = task_service::create(&db, TaskCreateDto { name: "Skådespelare".into() }).await?;
        let ta = task_activity_service::create(&db, s.id, act.id, task.id).await?;

        let dto = ActorCreateDto { role: Some("Napoleon".into()) };
        let actor = create(&db, s.id, act.id, ta.id, "B1", dto.clone()).await?;
        assert_eq!(actor.vocal_id, "B1");
        assert!(matches!(create(&db, s.id, act.id, ta.id, "B1", dto.clone()).await, Err(ServiceError::Conflict(_))));
        assert!(matches!(create(&db, s.id, act.id, ta.id, "X9", dto).await, Err(ServiceError::NotFound(_))));

        let patched = partial_update(&db, s.id, act.id, ta.id, "B1", actor.id, ActorPatchDto { id: actor.id, role: Some(None) }).await?;
        assert_eq!(patched.role, None);

        // wrong vocal in the path does not reach the actor
        assert!(matches!(delete(&db, s.id, act.id, ta.id, "S1", actor.id).await, Err(ServiceError::NotFound(_))));

        let page = find_by_task_activity(&db, s.id, act.id, ta.id, Some("vocal:B1"), &PageRequest::default()).await?;
        assert_eq!(page.total_elements, 1);

        delete(&db, s.id, act.id, ta.id, "B1", actor.id).await?;
        assert!(find_by_id(&db, s.id, act.id, ta.id, actor.id).await?.is_none());
        Ok(())
    }
}
