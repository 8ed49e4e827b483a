//! Parent-chain lookups for nested resources.
//!
//! A child is only visible through the path that owns it:
//! spexare → activity → task activity. Any broken link is a 404.

use models::types::{self, TypeType};
use models::{activity, spexare, task_activity};
use sea_orm::{ActiveEnum, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter};

use crate::errors::ServiceError;

pub async fn spexare<C: ConnectionTrait>(db: &C, spexare_id: i64) -> Result<spexare::Model, ServiceError> {
    spexare::Entity::find_by_id(spexare_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found_id("spexare", spexare_id))
}

pub async fn ensure_spexare<C: ConnectionTrait>(db: &C, spexare_id: i64) -> Result<(), ServiceError> {
    let n = spexare::Entity::find()
        .filter(spexare::Column::Id.eq(spexare_id))
        .count(db)
        .await?;
    if n == 0 {
        return Err(ServiceError::not_found_id("spexare", spexare_id));
    }
    Ok(())
}

/// The type must exist and be of `kind`; a type of another kind reads as missing.
pub async fn ensure_type<C: ConnectionTrait>(db: &C, kind: TypeType, type_id: &str) -> Result<(), ServiceError> {
    let n = types::Entity::find()
        .filter(types::Column::Id.eq(type_id))
        .filter(types::Column::Kind.eq(kind))
        .count(db)
        .await?;
    if n == 0 {
        return Err(ServiceError::NotFound(format!("type {type_id} of kind {} not found", kind.to_value())));
    }
    Ok(())
}

pub async fn activity<C: ConnectionTrait>(db: &C, spexare_id: i64, activity_id: i64) -> Result<activity::Model, ServiceError> {
    ensure_spexare(db, spexare_id).await?;
    activity::Entity::find_by_id(activity_id)
        .filter(activity::Column::SpexareId.eq(spexare_id))
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("spexare {spexare_id} and/or activity {activity_id} do not exist")))
}

pub async fn task_activity<C: ConnectionTrait>(
    db: &C,
    spexare_id: i64,
    activity_id: i64,
    task_activity_id: i64,
) -> Result<task_activity::Model, ServiceError> {
    activity(db, spexare_id, activity_id).await?;
    task_activity::Entity::find_by_id(task_activity_id)
        .filter(task_activity::Column::ActivityId.eq(activity_id))
        .one(db)
        .await?
        .ok_or_else(|| {
            ServiceError::NotFound(format!(
                "spexare {spexare_id}, activity {activity_id} and/or task activity {task_activity_id} do not exist"
            ))
        })
}
