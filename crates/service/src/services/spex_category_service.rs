use models::acl_entry::AclPermission;
use models::spex_category;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait, QueryFilter, QueryOrder, Select, Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::dto::AuditDto;
use crate::errors::ServiceError;
use crate::filter::{FieldKind, Fields};
use crate::pagination::{fetch_page, Page, PageRequest, SortOrder};
use crate::patch::{double_option, required};
use crate::permission::{self, ObjectClass, Role};

pub const FIELDS: Fields<spex_category::Column> = Fields::new(&[
    ("id", spex_category::Column::Id, FieldKind::Integer),
    ("name", spex_category::Column::Name, FieldKind::Text),
    ("firstYear", spex_category::Column::FirstYear, FieldKind::Text),
    ("createdBy", spex_category::Column::CreatedBy, FieldKind::Text),
    ("createdAt", spex_category::Column::CreatedAt, FieldKind::Text),
    ("lastModifiedBy", spex_category::Column::LastModifiedBy, FieldKind::Text),
    ("lastModifiedAt", spex_category::Column::LastModifiedAt, FieldKind::Text),
]);

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SpexCategoryDto {
    pub id: i64,
    pub name: String,
    pub first_year: String,
    #[serde(skip)]
    pub has_logo: bool,
    #[serde(flatten)]
    pub audit: AuditDto,
}

impl From<spex_category::Model> for SpexCategoryDto {
    fn from(m: spex_category::Model) -> Self {
        Self {
            id: m.id,
            audit: crate::audit_of!(m),
            has_logo: m.logo.is_some(),
            name: m.name,
            first_year: m.first_year,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpexCategoryCreateDto {
    pub name: String,
    pub first_year: String,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpexCategoryUpdateDto {
    pub id: i64,
    pub name: String,
    pub first_year: String,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpexCategoryPatchDto {
    pub id: i64,
    #[serde(default, deserialize_with = "double_option")]
    pub name: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub first_year: Option<Option<String>>,
}

fn visible(roles: &[Role]) -> Select<spex_category::Entity> {
    spex_category::Entity::find().filter(spex_category::Column::Id.in_subquery(permission::permitted_ids(
        ObjectClass::SpexCategory,
        roles,
        AclPermission::Read,
    )))
}

async fn find_model<C: ConnectionTrait>(db: &C, roles: &[Role], id: i64) -> Result<spex_category::Model, ServiceError> {
    visible(roles)
        .filter(spex_category::Column::Id.eq(id))
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found_id("spex category", id))
}

fn validate(name: &str, first_year: &str) -> Result<(), ServiceError> {
    spex_category::validate_name(name)?;
    spex_category::validate_first_year(first_year)?;
    Ok(())
}

pub async fn find_all<C: ConnectionTrait>(db: &C, roles: &[Role], filter: Option<&str>, req: &PageRequest) -> Result<Page<SpexCategoryDto>, ServiceError> {
    let mut q = visible(roles);
    if let Some(cond) = FIELDS.condition(filter)? {
        q = q.filter(cond);
    }
    let page = fetch_page(db, q, &req.clone().or_sort(SortOrder::asc("name")), &FIELDS).await?;
    Ok(page.map(SpexCategoryDto::from))
}

pub async fn find_for_export<C: ConnectionTrait>(db: &C, roles: &[Role], ids: &[i64]) -> Result<Vec<SpexCategoryDto>, ServiceError> {
    let mut q = visible(roles);
    if !ids.is_empty() {
        q = q.filter(spex_category::Column::Id.is_in(ids.iter().copied()));
    }
    let rows = q.order_by_asc(spex_category::Column::CreatedAt).order_by_asc(spex_category::Column::Id).all(db).await?;
    Ok(rows.into_iter().map(SpexCategoryDto::from).collect())
}

pub async fn find_by_id<C: ConnectionTrait>(db: &C, roles: &[Role], id: i64) -> Result<Option<SpexCategoryDto>, ServiceError> {
    Ok(visible(roles)
        .filter(spex_category::Column::Id.eq(id))
        .one(db)
        .await?
        .map(SpexCategoryDto::from))
}

pub async fn exists<C: ConnectionTrait>(db: &C, id: i64) -> Result<bool, ServiceError> {
    Ok(spex_category::Entity::find_by_id(id).one(db).await?.is_some())
}

#[instrument(skip(db, dto))]
pub async fn create<C: ConnectionTrait + TransactionTrait>(db: &C, dto: SpexCategoryCreateDto) -> Result<SpexCategoryDto, ServiceError> {
    validate(&dto.name, &dto.first_year)?;
    let txn = db.begin().await?;
    let created = spex_category::ActiveModel {
        name: Set(dto.name),
        first_year: Set(dto.first_year),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    permission::grant_defaults(&txn, ObjectClass::SpexCategory, created.id).await?;
    txn.commit().await?;
    info!(spex_category_id = %created.id, "spex_category_created");
    Ok(created.into())
}

#[instrument(skip(db, roles, dto), fields(id = %id))]
pub async fn update<C: ConnectionTrait>(db: &C, roles: &[Role], id: i64, dto: SpexCategoryUpdateDto) -> Result<SpexCategoryDto, ServiceError> {
    if dto.id != id {
        return Err(ServiceError::Validation("id in body does not match path".into()));
    }
    validate(&dto.name, &dto.first_year)?;
    let mut am: spex_category::ActiveModel = find_model(db, roles, id).await?.into();
    am.name = Set(dto.name);
    am.first_year = Set(dto.first_year);
    Ok(am.update(db).await?.into())
}

#[instrument(skip(db, roles, dto), fields(id = %id))]
pub async fn partial_update<C: ConnectionTrait>(db: &C, roles: &[Role], id: i64, dto: SpexCategoryPatchDto) -> Result<SpexCategoryDto, ServiceError> {
    if dto.id != id {
        return Err(ServiceError::Validation("id in body does not match path".into()));
    }
    let current = find_model(db, roles, id).await?;
    let name = required("name", dto.name)?.unwrap_or_else(|| current.name.clone());
    let first_year = required("firstYear", dto.first_year)?.unwrap_or_else(|| current.first_year.clone());
    validate(&name, &first_year)?;
    let mut am: spex_category::ActiveModel = current.into();
    am.name = Set(name);
    am.first_year = Set(first_year);
    Ok(am.update(db).await?.into())
}

#[instrument(skip(db, roles))]
pub async fn delete<C: ConnectionTrait + TransactionTrait>(db: &C, roles: &[Role], id: i64) -> Result<(), ServiceError> {
    let txn = db.begin().await?;
    find_model(&txn, roles, id).await?.delete(&txn).await?;
    permission::revoke_all(&txn, ObjectClass::SpexCategory, id).await?;
    txn.commit().await?;
    info!(spex_category_id = %id, "spex_category_deleted");
    Ok(())
}

pub async fn find_logo<C: ConnectionTrait>(db: &C, roles: &[Role], id: i64) -> Result<Option<(Vec<u8>, String)>, ServiceError> {
    let found = find_model(db, roles, id).await?;
    Ok(match (found.logo, found.logo_content_type) {
        (Some(bytes), Some(ct)) => Some((bytes, ct)),
        _ => None,
    })
}

pub async fn save_logo<C: ConnectionTrait>(db: &C, roles: &[Role], id: i64, bytes: Vec<u8>, content_type: &str) -> Result<(), ServiceError> {
    if !common::media::is_supported_image(content_type) {
        return Err(ServiceError::UnsupportedMedia(content_type.to_string()));
    }
    let mut am: spex_category::ActiveModel = find_model(db, roles, id).await?.into();
    am.logo = Set(Some(bytes));
    am.logo_content_type = Set(Some(common::media::essence(content_type)));
    am.update(db).await?;
    Ok(())
}

pub async fn delete_logo<C: ConnectionTrait>(db: &C, roles: &[Role], id: i64) -> Result<(), ServiceError> {
    let mut am: spex_category::ActiveModel = find_model(db, roles, id).await?.into();
    am.logo = Set(None);
    am.logo_content_type = Set(None);
    am.update(db).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{get_db, ALL_ROLES};

    #[tokio::test]
    async fn spex_category_crud_and_logo() -> Result<(), anyhow::Error> {
        let db = get_db().await?;
        let created = create(&db, SpexCategoryCreateDto { name: "Chalmersspexet".into(), first_year: "1948".into() }).await?;
        let patched = partial_update(&db, ALL_ROLES, created.id, SpexCategoryPatchDto { id: created.id, name: Some(Some("Spexet".into())), first_year: None }).await?;
        assert_eq!((patched.name.as_str(), patched.first_year.as_str()), ("Spexet", "1948"));
        assert!(matches!(
            partial_update(&db, ALL_ROLES, created.id, SpexCategoryPatchDto { id: created.id, name: None, first_year: Some(Some("48".into())) }).await,
            Err(ServiceError::Model(_))
        ));

        save_logo(&db, ALL_ROLES, created.id, vec![0x89, b'P', b'N', b'G'], "image/png; charset=binary").await?;
        let (_, ct) = find_logo(&db, ALL_ROLES, created.id).await?.unwrap();
        assert_eq!(ct, "image/png");
        assert!(find_by_id(&db, ALL_ROLES, created.id).await?.unwrap().has_logo);

        delete(&db, &[Role::Admin], created.id).await?;
        assert!(find_by_id(&db, ALL_ROLES, created.id).await?.is_none());
        Ok(())
    }
}
