use models::acl_entry::AclPermission;
use models::tag;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait, QueryFilter, QueryOrder, Select, Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::dto::AuditDto;
use crate::errors::ServiceError;
use crate::filter::{FieldKind, Fields};
use crate::pagination::{fetch_page, Page, PageRequest, SortOrder};
use crate::patch::{double_option, required};
use crate::permission::{self, ObjectClass, Role};

pub const FIELDS: Fields<tag::Column> = Fields::new(&[
    ("id", tag::Column::Id, FieldKind::Integer),
    ("name", tag::Column::Name, FieldKind::Text),
    ("createdBy", tag::Column::CreatedBy, FieldKind::Text),
    ("createdAt", tag::Column::CreatedAt, FieldKind::Text),
    ("lastModifiedBy", tag::Column::LastModifiedBy, FieldKind::Text),
    ("lastModifiedAt", tag::Column::LastModifiedAt, FieldKind::Text),
]);

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TagDto {
    pub id: i64,
    pub name: String,
    #[serde(flatten)]
    pub audit: AuditDto,
}

impl From<tag::Model> for TagDto {
    fn from(m: tag::Model) -> Self {
        Self { id: m.id, audit: crate::audit_of!(m), name: m.name }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct TagCreateDto {
    pub name: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TagUpdateDto {
    pub id: i64,
    pub name: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TagPatchDto {
    pub id: i64,
    #[serde(default, deserialize_with = "double_option")]
    pub name: Option<Option<String>>,
}

pub(crate) fn visible(roles: &[Role]) -> Select<tag::Entity> {
    tag::Entity::find().filter(tag::Column::Id.in_subquery(permission::permitted_ids(ObjectClass::Tag, roles, AclPermission::Read)))
}

async fn find_model<C: ConnectionTrait>(db: &C, roles: &[Role], id: i64) -> Result<tag::Model, ServiceError> {
    visible(roles)
        .filter(tag::Column::Id.eq(id))
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found_id("tag", id))
}

pub async fn find_all<C: ConnectionTrait>(db: &C, roles: &[Role], filter: Option<&str>, req: &PageRequest) -> Result<Page<TagDto>, ServiceError> {
    let mut q = visible(roles);
    if let Some(cond) = FIELDS.condition(filter)? {
        q = q.filter(cond);
    }
    let page = fetch_page(db, q, &req.clone().or_sort(SortOrder::asc("name")), &FIELDS).await?;
    Ok(page.map(TagDto::from))
}

pub async fn find_for_export<C: ConnectionTrait>(db: &C, roles: &[Role], ids: &[i64]) -> Result<Vec<TagDto>, ServiceError> {
    let mut q = visible(roles);
    if !ids.is_empty() {
        q = q.filter(tag::Column::Id.is_in(ids.iter().copied()));
    }
    let rows = q.order_by_asc(tag::Column::CreatedAt).order_by_asc(tag::Column::Id).all(db).await?;
    Ok(rows.into_iter().map(TagDto::from).collect())
}

pub async fn find_by_id<C: ConnectionTrait>(db: &C, roles: &[Role], id: i64) -> Result<Option<TagDto>, ServiceError> {
    Ok(visible(roles).filter(tag::Column::Id.eq(id)).one(db).await?.map(TagDto::from))
}

pub async fn exists<C: ConnectionTrait>(db: &C, id: i64) -> Result<bool, ServiceError> {
    Ok(tag::Entity::find_by_id(id).one(db).await?.is_some())
}

#[instrument(skip(db, dto))]
pub async fn create<C: ConnectionTrait + TransactionTrait>(db: &C, dto: TagCreateDto) -> Result<TagDto, ServiceError> {
    tag::validate_name(&dto.name)?;
    let txn = db.begin().await?;
    let created = tag::ActiveModel { name: Set(dto.name), ..Default::default() }.insert(&txn).await?;
    permission::grant_defaults(&txn, ObjectClass::Tag, created.id).await?;
    txn.commit().await?;
    info!(tag_id = %created.id, "tag_created");
    Ok(created.into())
}

#[instrument(skip(db, roles, dto), fields(id = %id))]
pub async fn update<C: ConnectionTrait>(db: &C, roles: &[Role], id: i64, dto: TagUpdateDto) -> Result<TagDto, ServiceError> {
    if dto.id != id {
        return Err(ServiceError::Validation("id in body does not match path".into()));
    }
    tag::validate_name(&dto.name)?;
    let mut am: tag::ActiveModel = find_model(db, roles, id).await?.into();
    am.name = Set(dto.name);
    Ok(am.update(db).await?.into())
}

#[instrument(skip(db, roles, dto), fields(id = %id))]
pub async fn partial_update<C: ConnectionTrait>(db: &C, roles: &[Role], id: i64, dto: TagPatchDto) -> Result<TagDto, ServiceError> {
    if dto.id != id {
        return Err(ServiceError::Validation("id in body does not match path".into()));
    }
    let current = find_model(db, roles, id).await?;
    let Some(name) = required("name", dto.name)? else { return Ok(current.into()) };
    tag::validate_name(&name)?;
    let mut am: tag::ActiveModel = current.into();
    am.name = Set(name);
    Ok(am.update(db).await?.into())
}

#[instrument(skip(db, roles))]
pub async fn delete<C: ConnectionTrait + TransactionTrait>(db: &C, roles: &[Role], id: i64) -> Result<(), ServiceError> {
    let txn = db.begin().await?;
    find_model(&txn, roles, id).await?.delete(&txn).await?;
    permission::revoke_all(&txn, ObjectClass::Tag, id).await?;
    txn.commit().await?;
    info!(tag_id = %id, "tag_deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{get_db, ALL_ROLES};

    #[tokio::test]
    async fn tag_crud_service() -> Result<(), anyhow::Error> {
        let db = get_db().await?;
        let created = create(&db, TagCreateDto { name: "Styrelse".into() }).await?;
        let found = find_by_id(&db, &[Role::User], created.id).await?.unwrap();
        assert_eq!(found.name, "Styrelse");

        let renamed = update(&db, ALL_ROLES, created.id, TagUpdateDto { id: created.id, name: "Styrelsen".into() }).await?;
        assert_eq!(renamed.name, "Styrelsen");
        assert!(matches!(create(&db, TagCreateDto { name: "".into() }).await, Err(ServiceError::Model(_))));

        let page = find_all(&db, ALL_ROLES, Some("name~STYR"), &PageRequest::default()).await?;
        assert_eq!(page.total_elements, 1);

        delete(&db, &[Role::Editor], created.id).await?;
        assert!(find_by_id(&db, ALL_ROLES, created.id).await?.is_none());
        Ok(())
    }
}
