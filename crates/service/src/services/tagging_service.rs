//! Tags attached to a spexare. The link rows carry no audit columns.

use models::{tag, tagging};
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, JoinType, ModelTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set};
use tracing::{info, instrument};

use crate::errors::ServiceError;
use crate::permission::Role;
use crate::services::scope;
use crate::services::tag_service::{self, TagDto};

pub async fn find_by_spexare<C: ConnectionTrait>(db: &C, roles: &[Role], spexare_id: i64) -> Result<Vec<TagDto>, ServiceError> {
    scope::ensure_spexare(db, spexare_id).await?;
    let rows = tag_service::visible(roles)
        .join(JoinType::InnerJoin, tag::Relation::Tagging.def())
        .filter(tagging::Column::SpexareId.eq(spexare_id))
        .order_by_asc(tag::Column::Name)
        .all(db)
        .await?;
    Ok(rows.into_iter().map(TagDto::from).collect())
}

#[instrument(skip(db))]
pub async fn create<C: ConnectionTrait>(db: &C, spexare_id: i64, tag_id: i64) -> Result<(), ServiceError> {
    scope::ensure_spexare(db, spexare_id).await?;
    if !tag_service::exists(db, tag_id).await? {
        return Err(ServiceError::not_found_id("tag", tag_id));
    }
    if tagging::Entity::find_by_id((spexare_id, tag_id)).one(db).await?.is_some() {
        return Err(ServiceError::Conflict(format!("spexare {spexare_id} already tagged with {tag_id}")));
    }
    tagging::ActiveModel { spexare_id: Set(spexare_id), tag_id: Set(tag_id) }.insert(db).await?;
    info!(spexare_id = %spexare_id, tag_id = %tag_id, "tagging_created");
    Ok(())
}

#[instrument(skip(db))]
pub async fn delete<C: ConnectionTrait>(db: &C, spexare_id: i64, tag_id: i64) -> Result<(), ServiceError> {
    scope::ensure_spexare(db, spexare_id).await?;
    if !tag_service::exists(db, tag_id).await? {
        return Err(ServiceError::not_found_id("tag", tag_id));
    }
    let Some(link) = tagging::Entity::find_by_id((spexare_id, tag_id)).one(db).await? else {
        return Err(ServiceError::Unprocessable(format!("spexare {spexare_id} is not tagged with {tag_id}")));
    };
    link.delete(db).await?;
    info!(spexare_id = %spexare_id, tag_id = %tag_id, "tagging_deleted");
    Ok(())
}
