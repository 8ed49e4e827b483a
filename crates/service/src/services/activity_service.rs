use models::activity;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait, QueryFilter, Set};
use serde::Serialize;
use tracing::{info, instrument};

use crate::dto::AuditDto;
use crate::errors::ServiceError;
use crate::filter::{FieldKind, Fields};
use crate::pagination::{fetch_page, Page, PageRequest, SortOrder};
use crate::services::scope;

pub const FIELDS: Fields<activity::Column> = Fields::new(&[
    ("id", activity::Column::Id, FieldKind::Integer),
    ("createdBy", activity::Column::CreatedBy, FieldKind::Text),
    ("createdAt", activity::Column::CreatedAt, FieldKind::Text),
    ("lastModifiedBy", activity::Column::LastModifiedBy, FieldKind::Text),
    ("lastModifiedAt", activity::Column::LastModifiedAt, FieldKind::Text),
]);

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActivityDto {
    pub id: i64,
    #[serde(skip)]
    pub spexare_id: i64,
    #[serde(flatten)]
    pub audit: AuditDto,
}

impl From<activity::Model> for ActivityDto {
    fn from(m: activity::Model) -> Self {
        Self { id: m.id, spexare_id: m.spexare_id, audit: crate::audit_of!(m) }
    }
}

pub async fn find_by_spexare<C: ConnectionTrait>(
    db: &C,
    spexare_id: i64,
    filter: Option<&str>,
    req: &PageRequest,
) -> Result<Page<ActivityDto>, ServiceError> {
    scope::ensure_spexare(db, spexare_id).await?;
    let mut q = activity::Entity::find().filter(activity::Column::SpexareId.eq(spexare_id));
    if let Some(cond) = FIELDS.condition(filter)? {
        q = q.filter(cond);
    }
    let page = fetch_page(db, q, &req.clone().or_sort(SortOrder::asc("id")), &FIELDS).await?;
    Ok(page.map(ActivityDto::from))
}

pub async fn find_by_id<C: ConnectionTrait>(db: &C, spexare_id: i64, id: i64) -> Result<Option<ActivityDto>, ServiceError> {
    scope::ensure_spexare(db, spexare_id).await?;
    Ok(activity::Entity::find_by_id(id)
        .filter(activity::Column::SpexareId.eq(spexare_id))
        .one(db)
        .await?
        .map(ActivityDto::from))
}

#[instrument(skip(db))]
pub async fn create<C: ConnectionTrait>(db: &C, spexare_id: i64) -> Result<ActivityDto, ServiceError> {
    scope::ensure_spexare(db, spexare_id).await?;
    let created = activity::ActiveModel { spexare_id: Set(spexare_id), ..Default::default() }
        .insert(db)
        .await?;
    info!(spexare_id = %spexare_id, activity_id = %created.id, "activity_created");
    Ok(created.into())
}

#[instrument(skip(db))]
pub async fn delete<C: ConnectionTrait>(db: &C, spexare_id: i64, id: i64) -> Result<(), ServiceError> {
    let found = scope::activity(db, spexare_id, id).await?;
    found.delete(db).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::get_db;
    use models::spexare;

    #[tokio::test]
    async fn activities_are_scoped_to_their_spexare() -> Result<(), anyhow::Error> {
        let db = get_db().await?;
        let a = spexare::ActiveModel { first_name: Set("A".into()), last_name: Set("A".into()), ..Default::default() }.insert(&db).await?;
        let b = spexare::ActiveModel { first_name: Set("B".into()), last_name: Set("B".into()), ..Default::default() }.insert(&db).await?;

        let act = create(&db, a.id).await?;
        assert!(find_by_id(&db, a.id, act.id).await?.is_some());
        assert!(find_by_id(&db, b.id, act.id).await?.is_none());
        assert!(matches!(find_by_id(&db, 999, act.id).await, Err(ServiceError::NotFound(_))));

        let page = find_by_spexare(&db, a.id, None, &PageRequest::default()).await?;
        assert_eq!(page.total_elements, 1);

        assert!(matches!(delete(&db, b.id, act.id).await, Err(ServiceError::NotFound(_))));
        delete(&db, a.id, act.id).await?;
        assert!(find_by_id(&db, a.id, act.id).await?.is_none());
        Ok(())
    }
}
