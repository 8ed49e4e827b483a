use models::membership;
use models::types::TypeType;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter, Set};
use serde::Serialize;
use tracing::{info, instrument};

use crate::dto::AuditDto;
use crate::errors::ServiceError;
use crate::filter::{FieldKind, Fields};
use crate::pagination::{fetch_page, Page, PageRequest, SortOrder};
use crate::services::scope;

pub const FIELDS: Fields<membership::Column> = Fields::new(&[
    ("id", membership::Column::Id, FieldKind::Integer),
    ("type", membership::Column::TypeId, FieldKind::Text),
    ("year", membership::Column::Year, FieldKind::Text),
    ("createdBy", membership::Column::CreatedBy, FieldKind::Text),
    ("createdAt", membership::Column::CreatedAt, FieldKind::Text),
    ("lastModifiedBy", membership::Column::LastModifiedBy, FieldKind::Text),
    ("lastModifiedAt", membership::Column::LastModifiedAt, FieldKind::Text),
]);

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MembershipDto {
    pub id: i64,
    pub year: String,
    #[serde(rename = "type")]
    pub type_id: String,
    #[serde(flatten)]
    pub audit: AuditDto,
}

impl From<membership::Model> for MembershipDto {
    fn from(m: membership::Model) -> Self {
        Self { id: m.id, audit: crate::audit_of!(m), year: m.year, type_id: m.type_id }
    }
}

pub async fn find_by_spexare<C: ConnectionTrait>(
    db: &C,
    spexare_id: i64,
    filter: Option<&str>,
    req: &PageRequest,
) -> Result<Page<MembershipDto>, ServiceError> {
    scope::ensure_spexare(db, spexare_id).await?;
    let mut q = membership::Entity::find().filter(membership::Column::SpexareId.eq(spexare_id));
    if let Some(cond) = FIELDS.condition(filter)? {
        q = q.filter(cond);
    }
    let page = fetch_page(db, q, &req.clone().or_sort(SortOrder::asc("year")), &FIELDS).await?;
    Ok(page.map(MembershipDto::from))
}

pub async fn find_by_id<C: ConnectionTrait>(db: &C, spexare_id: i64, id: i64) -> Result<Option<MembershipDto>, ServiceError> {
    scope::ensure_spexare(db, spexare_id).await?;
    Ok(membership::Entity::find_by_id(id)
        .filter(membership::Column::SpexareId.eq(spexare_id))
        .one(db)
        .await?
        .map(MembershipDto::from))
}

#[instrument(skip(db))]
pub async fn create<C: ConnectionTrait>(db: &C, spexare_id: i64, type_id: &str, year: &str) -> Result<MembershipDto, ServiceError> {
    scope::ensure_spexare(db, spexare_id).await?;
    scope::ensure_type(db, TypeType::Membership, type_id).await?;
    membership::validate_year(year)?;
    let taken = membership::Entity::find()
        .filter(membership::Column::SpexareId.eq(spexare_id))
        .filter(membership::Column::TypeId.eq(type_id))
        .filter(membership::Column::Year.eq(year))
        .count(db)
        .await?;
    if taken > 0 {
        return Err(ServiceError::Conflict(format!("spexare {spexare_id} already has {type_id} membership for {year}")));
    }
    let created = membership::ActiveModel {
        year: Set(year.to_string()),
        type_id: Set(type_id.to_string()),
        spexare_id: Set(spexare_id),
        ..Default::default()
    }
    .insert(db)
    .await?;
    info!(spexare_id = %spexare_id, membership_id = %created.id, "membership_created");
    Ok(created.into())
}

/// A missing id is a 404; a membership under another spexare or type is a 422.
#[instrument(skip(db))]
pub async fn delete<C: ConnectionTrait>(db: &C, spexare_id: i64, type_id: &str, id: i64) -> Result<(), ServiceError> {
    scope::ensure_spexare(db, spexare_id).await?;
    scope::ensure_type(db, TypeType::Membership, type_id).await?;
    let found = membership::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found_id("membership", id))?;
    if found.spexare_id != spexare_id || found.type_id != type_id {
        return Err(ServiceError::Unprocessable(format!(
            "membership {id} does not belong to spexare {spexare_id} with type {type_id}"
        )));
    }
    found.delete(db).await?;
    info!(spexare_id = %spexare_id, membership_id = %id, "membership_deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::get_db;
    use models::spexare;

    #[tokio::test]
    async fn membership_years_are_unique_per_type() -> Result<(), anyhow::Error> {
        let db = get_db().await?;
        let s = spexare::ActiveModel { first_name: Set("Kalle".into()), last_name: Set("Anka".into()), ..Default::default() }.insert(&db).await?;

        let m = create(&db, s.id, "FGV", "1998").await?;
        create(&db, s.id, "FGV", "1999").await?;
        create(&db, s.id, "CING", "1998").await?;
        assert!(matches!(create(&db, s.id, "FGV", "1998").await, Err(ServiceError::Conflict(_))));
        assert!(matches!(create(&db, s.id, "FGV", "98").await, Err(ServiceError::Model(_))));
        assert!(matches!(create(&db, s.id, "HOME", "2000").await, Err(ServiceError::NotFound(_))));

        let page = find_by_spexare(&db, s.id, Some("type:FGV"), &PageRequest::default()).await?;
        assert_eq!(page.total_elements, 2);
        assert_eq!(page.content[0].year, "1998");

        assert!(matches!(delete(&db, s.id, "CING", m.id).await, Err(ServiceError::Unprocessable(_))));
        assert!(matches!(delete(&db, s.id, "FGV", 4242).await, Err(ServiceError::NotFound(_))));
        delete(&db, s.id, "FGV", m.id).await?;
        assert!(find_by_id(&db, s.id, m.id).await?.is_none());
        Ok(())
    }
}
