//! Productions and their revivals.
//!
//! A spex row carries the year; title, poster and category live on the shared
//! `spex_details` row, so a revival and its parent always agree on them.

use std::collections::HashMap;

use models::acl_entry::AclPermission;
use models::{spex, spex_details};
use sea_orm::{ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, Select, Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::dto::AuditDto;
use crate::errors::ServiceError;
use crate::filter::{FieldKind, Fields};
use crate::pagination::{fetch_page, Page, PageRequest, SortOrder};
use crate::patch::{double_option, required};
use crate::permission::{self, ObjectClass, Role};
use crate::services::spex_category_service::{self, SpexCategoryDto};

pub const FIELDS: Fields<spex::Column> = Fields::new(&[
    ("id", spex::Column::Id, FieldKind::Integer),
    ("year", spex::Column::Year, FieldKind::Text),
    ("parent", spex::Column::ParentId, FieldKind::Integer),
    ("createdBy", spex::Column::CreatedBy, FieldKind::Text),
    ("createdAt", spex::Column::CreatedAt, FieldKind::Text),
    ("lastModifiedBy", spex::Column::LastModifiedBy, FieldKind::Text),
    ("lastModifiedAt", spex::Column::LastModifiedAt, FieldKind::Text),
]);

/// Listing shows originals unless the caller filters otherwise.
pub const DEFAULT_FILTER: &str = "parent:NULL";

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SpexDto {
    pub id: i64,
    pub year: String,
    pub title: String,
    pub revival: bool,
    #[serde(skip)]
    pub parent_id: Option<i64>,
    #[serde(skip)]
    pub has_poster: bool,
    #[serde(skip)]
    pub category_id: Option<i64>,
    #[serde(flatten)]
    pub audit: AuditDto,
}

impl SpexDto {
    fn from_parts(m: spex::Model, details: &spex_details::Model) -> Self {
        Self {
            id: m.id,
            audit: crate::audit_of!(m),
            year: m.year,
            title: details.title.clone(),
            revival: m.parent_id.is_some(),
            parent_id: m.parent_id,
            has_poster: details.poster.is_some(),
            category_id: details.category_id,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct SpexCreateDto {
    pub year: String,
    pub title: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SpexUpdateDto {
    pub id: i64,
    pub year: String,
    pub title: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SpexPatchDto {
    pub id: i64,
    #[serde(default, deserialize_with = "double_option")]
    pub year: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub title: Option<Option<String>>,
}

fn readable(roles: &[Role]) -> Condition {
    Condition::all().add(spex::Column::Id.in_subquery(permission::permitted_ids(ObjectClass::Spex, roles, AclPermission::Read)))
}

fn visible(roles: &[Role]) -> Select<spex::Entity> {
    spex::Entity::find().filter(readable(roles))
}

async fn details_of<C: ConnectionTrait>(db: &C, m: &spex::Model) -> Result<spex_details::Model, ServiceError> {
    spex_details::Entity::find_by_id(m.details_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::Db(format!("spex {} has no details", m.id)))
}

async fn to_dto<C: ConnectionTrait>(db: &C, m: spex::Model) -> Result<SpexDto, ServiceError> {
    let details = details_of(db, &m).await?;
    Ok(SpexDto::from_parts(m, &details))
}

async fn to_dtos<C: ConnectionTrait>(db: &C, rows: Vec<spex::Model>) -> Result<Vec<SpexDto>, ServiceError> {
    let ids: Vec<i64> = rows.iter().map(|m| m.details_id).collect();
    let details: HashMap<i64, spex_details::Model> = spex_details::Entity::find()
        .filter(spex_details::Column::Id.is_in(ids))
        .all(db)
        .await?
        .into_iter()
        .map(|d| (d.id, d))
        .collect();
    rows.into_iter()
        .map(|m| {
            let d = details
                .get(&m.details_id)
                .ok_or_else(|| ServiceError::Db(format!("spex {} has no details", m.id)))?;
            Ok(SpexDto::from_parts(m, d))
        })
        .collect()
}

async fn page_to_dtos<C: ConnectionTrait>(db: &C, page: Page<spex::Model>) -> Result<Page<SpexDto>, ServiceError> {
    let Page { content, number, size, total_elements, total_pages } = page;
    let content = to_dtos(db, content).await?;
    Ok(Page { content, number, size, total_elements, total_pages })
}

/// Readable spex row or 404.
async fn find_model<C: ConnectionTrait>(db: &C, roles: &[Role], id: i64) -> Result<spex::Model, ServiceError> {
    visible(roles)
        .filter(spex::Column::Id.eq(id))
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found_id("spex", id))
}

fn validate(year: &str, title: &str) -> Result<(), ServiceError> {
    spex::validate_year(year)?;
    spex_details::validate_title(title)?;
    Ok(())
}

pub fn default_sort() -> SortOrder {
    SortOrder::asc("year")
}

pub async fn find_all<C: ConnectionTrait>(db: &C, roles: &[Role], filter: Option<&str>, req: &PageRequest) -> Result<Page<SpexDto>, ServiceError> {
    let filter = filter.filter(|f| !f.trim().is_empty()).unwrap_or(DEFAULT_FILTER);
    let mut q = visible(roles);
    if let Some(cond) = FIELDS.condition(Some(filter))? {
        q = q.filter(cond);
    }
    let page = fetch_page(db, q, &req.clone().or_sort(default_sort()), &FIELDS).await?;
    page_to_dtos(db, page).await
}

pub async fn find_for_export<C: ConnectionTrait>(db: &C, roles: &[Role], ids: &[i64], revivals: bool) -> Result<Vec<SpexDto>, ServiceError> {
    let mut q = visible(roles);
    q = if revivals { q.filter(spex::Column::ParentId.is_not_null()) } else { q.filter(spex::Column::ParentId.is_null()) };
    if !ids.is_empty() {
        let ids: Vec<i64> = ids.to_vec();
        q = if revivals {
            q.filter(spex::Column::ParentId.is_in(ids))
        } else {
            q.filter(spex::Column::Id.is_in(ids))
        };
    }
    let rows = q.order_by_asc(spex::Column::CreatedAt).order_by_asc(spex::Column::Id).all(db).await?;
    to_dtos(db, rows).await
}

pub async fn find_by_id<C: ConnectionTrait>(db: &C, roles: &[Role], id: i64) -> Result<Option<SpexDto>, ServiceError> {
    match visible(roles).filter(spex::Column::Id.eq(id)).one(db).await? {
        Some(m) => Ok(Some(to_dto(db, m).await?)),
        None => Ok(None),
    }
}

#[instrument(skip(db, dto))]
pub async fn create<C: ConnectionTrait + TransactionTrait>(db: &C, dto: SpexCreateDto) -> Result<SpexDto, ServiceError> {
    validate(&dto.year, &dto.title)?;
    let txn = db.begin().await?;
    let details = spex_details::ActiveModel { title: Set(dto.title), ..Default::default() }
        .insert(&txn)
        .await?;
    let created = spex::ActiveModel {
        year: Set(dto.year),
        details_id: Set(details.id),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    permission::grant_defaults(&txn, ObjectClass::Spex, created.id).await?;
    txn.commit().await?;
    info!(spex_id = %created.id, "spex_created");
    Ok(SpexDto::from_parts(created, &details))
}

async fn save<C: ConnectionTrait>(db: &C, current: spex::Model, year: String, title: String) -> Result<SpexDto, ServiceError> {
    validate(&year, &title)?;
    let details = details_of(db, &current).await?;
    let details = if details.title != title {
        let mut am: spex_details::ActiveModel = details.into();
        am.title = Set(title);
        am.update(db).await?
    } else {
        details
    };
    let mut am: spex::ActiveModel = current.into();
    am.year = Set(year);
    let updated = am.update(db).await?;
    Ok(SpexDto::from_parts(updated, &details))
}

#[instrument(skip(db, roles, dto), fields(id = %id))]
pub async fn update<C: ConnectionTrait + TransactionTrait>(db: &C, roles: &[Role], id: i64, dto: SpexUpdateDto) -> Result<SpexDto, ServiceError> {
    if dto.id != id {
        return Err(ServiceError::Validation("id in body does not match path".into()));
    }
    let txn = db.begin().await?;
    let current = find_model(&txn, roles, id).await?;
    let updated = save(&txn, current, dto.year, dto.title).await?;
    txn.commit().await?;
    Ok(updated)
}

#[instrument(skip(db, roles, dto), fields(id = %id))]
pub async fn partial_update<C: ConnectionTrait + TransactionTrait>(db: &C, roles: &[Role], id: i64, dto: SpexPatchDto) -> Result<SpexDto, ServiceError> {
    if dto.id != id {
        return Err(ServiceError::Validation("id in body does not match path".into()));
    }
    let txn = db.begin().await?;
    let current = find_model(&txn, roles, id).await?;
    let title = match required("title", dto.title)? {
        Some(t) => t,
        None => details_of(&txn, &current).await?.title,
    };
    let year = required("year", dto.year)?.unwrap_or_else(|| current.year.clone());
    let updated = save(&txn, current, year, title).await?;
    txn.commit().await?;
    Ok(updated)
}

/// Remove one spex row with its ACL, and the details once nothing refers to them.
async fn remove<C: ConnectionTrait>(db: &C, m: spex::Model) -> Result<(), ServiceError> {
    let id = m.id;
    let details_id = m.details_id;
    m.delete(db).await?;
    permission::revoke_all(db, ObjectClass::Spex, id).await?;
    let still_used = spex::Entity::find()
        .filter(spex::Column::DetailsId.eq(details_id))
        .count(db)
        .await?;
    if still_used == 0 {
        spex_details::Entity::delete_by_id(details_id).exec(db).await?;
    }
    Ok(())
}

#[instrument(skip(db, roles))]
pub async fn delete<C: ConnectionTrait + TransactionTrait>(db: &C, roles: &[Role], id: i64) -> Result<(), ServiceError> {
    let txn = db.begin().await?;
    let found = find_model(&txn, roles, id).await?;
    for revival in spex::Entity::find().filter(spex::Column::ParentId.eq(id)).all(&txn).await? {
        remove(&txn, revival).await?;
    }
    remove(&txn, found).await?;
    txn.commit().await?;
    info!(spex_id = %id, "spex_deleted");
    Ok(())
}

pub async fn find_poster<C: ConnectionTrait>(db: &C, roles: &[Role], id: i64) -> Result<Option<(Vec<u8>, String)>, ServiceError> {
    let found = find_model(db, roles, id).await?;
    let details = details_of(db, &found).await?;
    Ok(match (details.poster, details.poster_content_type) {
        (Some(bytes), Some(ct)) => Some((bytes, ct)),
        _ => None,
    })
}

pub async fn save_poster<C: ConnectionTrait>(db: &C, roles: &[Role], id: i64, bytes: Vec<u8>, content_type: &str) -> Result<(), ServiceError> {
    if !common::media::is_supported_image(content_type) {
        return Err(ServiceError::UnsupportedMedia(content_type.to_string()));
    }
    let found = find_model(db, roles, id).await?;
    let mut am: spex_details::ActiveModel = details_of(db, &found).await?.into();
    am.poster = Set(Some(bytes));
    am.poster_content_type = Set(Some(common::media::essence(content_type)));
    am.update(db).await?;
    Ok(())
}

pub async fn delete_poster<C: ConnectionTrait>(db: &C, roles: &[Role], id: i64) -> Result<(), ServiceError> {
    let found = find_model(db, roles, id).await?;
    let mut am: spex_details::ActiveModel = details_of(db, &found).await?.into();
    am.poster = Set(None);
    am.poster_content_type = Set(None);
    am.update(db).await?;
    Ok(())
}

/// The original a revival belongs to; `None` for an original.
pub async fn find_parent<C: ConnectionTrait>(db: &C, roles: &[Role], id: i64) -> Result<Option<SpexDto>, ServiceError> {
    let found = find_model(db, roles, id).await?;
    match found.parent_id {
        Some(pid) => find_by_id(db, roles, pid).await,
        None => Ok(None),
    }
}

pub async fn find_all_revivals<C: ConnectionTrait>(db: &C, roles: &[Role], req: &PageRequest) -> Result<Page<SpexDto>, ServiceError> {
    let q = visible(roles).filter(spex::Column::ParentId.is_not_null());
    let page = fetch_page(db, q, &req.clone().or_sort(default_sort()), &FIELDS).await?;
    page_to_dtos(db, page).await
}

pub async fn find_revivals_by_spex<C: ConnectionTrait>(db: &C, roles: &[Role], id: i64, req: &PageRequest) -> Result<Page<SpexDto>, ServiceError> {
    find_model(db, roles, id).await?;
    let q = visible(roles).filter(spex::Column::ParentId.eq(id));
    let page = fetch_page(db, q, &req.clone().or_sort(default_sort()), &FIELDS).await?;
    page_to_dtos(db, page).await
}

pub async fn find_revival_by_id<C: ConnectionTrait>(db: &C, roles: &[Role], id: i64, revival_id: i64) -> Result<Option<SpexDto>, ServiceError> {
    find_model(db, roles, id).await?;
    match visible(roles)
        .filter(spex::Column::Id.eq(revival_id))
        .filter(spex::Column::ParentId.eq(id))
        .one(db)
        .await?
    {
        Some(m) => Ok(Some(to_dto(db, m).await?)),
        None => Ok(None),
    }
}

async fn revival_by_year<C: ConnectionTrait>(db: &C, id: i64, year: &str) -> Result<Option<spex::Model>, ServiceError> {
    Ok(spex::Entity::find()
        .filter(spex::Column::ParentId.eq(id))
        .filter(spex::Column::Year.eq(year))
        .one(db)
        .await?)
}

#[instrument(skip(db, roles))]
pub async fn add_revival<C: ConnectionTrait + TransactionTrait>(db: &C, roles: &[Role], id: i64, year: &str) -> Result<SpexDto, ServiceError> {
    spex::validate_year(year)?;
    let txn = db.begin().await?;
    let parent = find_model(&txn, roles, id).await?;
    if parent.is_revival() {
        return Err(ServiceError::Validation(format!("spex {id} is itself a revival")));
    }
    if revival_by_year(&txn, id, year).await?.is_some() {
        return Err(ServiceError::Conflict(format!("spex {id} already has a revival in {year}")));
    }
    let created = spex::ActiveModel {
        year: Set(year.to_string()),
        parent_id: Set(Some(id)),
        details_id: Set(parent.details_id),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    permission::grant_defaults(&txn, ObjectClass::Spex, created.id).await?;
    let dto = to_dto(&txn, created).await?;
    txn.commit().await?;
    info!(spex_id = %id, revival_id = %dto.id, "revival_added");
    Ok(dto)
}

#[instrument(skip(db, roles))]
pub async fn delete_revival<C: ConnectionTrait + TransactionTrait>(db: &C, roles: &[Role], id: i64, year: &str) -> Result<(), ServiceError> {
    let txn = db.begin().await?;
    find_model(&txn, roles, id).await?;
    let revival = revival_by_year(&txn, id, year)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("spex {id} has no revival in {year}")))?;
    remove(&txn, revival).await?;
    txn.commit().await?;
    Ok(())
}

pub async fn find_category<C: ConnectionTrait>(db: &C, roles: &[Role], id: i64) -> Result<Option<SpexCategoryDto>, ServiceError> {
    let found = find_model(db, roles, id).await?;
    match details_of(db, &found).await?.category_id {
        Some(cid) => spex_category_service::find_by_id(db, roles, cid).await,
        None => Ok(None),
    }
}

#[instrument(skip(db, roles))]
pub async fn set_category<C: ConnectionTrait>(db: &C, roles: &[Role], id: i64, category_id: i64) -> Result<SpexDto, ServiceError> {
    let found = find_model(db, roles, id).await?;
    if spex_category_service::find_by_id(db, roles, category_id).await?.is_none() {
        return Err(ServiceError::not_found_id("spex category", category_id));
    }
    let mut am: spex_details::ActiveModel = details_of(db, &found).await?.into();
    am.category_id = Set(Some(category_id));
    let details = am.update(db).await?;
    Ok(SpexDto::from_parts(found, &details))
}

#[instrument(skip(db, roles))]
pub async fn remove_category<C: ConnectionTrait>(db: &C, roles: &[Role], id: i64) -> Result<SpexDto, ServiceError> {
    let found = find_model(db, roles, id).await?;
    let mut am: spex_details::ActiveModel = details_of(db, &found).await?.into();
    am.category_id = Set(None);
    let details = am.update(db).await?;
    Ok(SpexDto::from_parts(found, &details))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::spex_category_service::SpexCategoryCreateDto;
    use crate::test_support::{get_db, ALL_ROLES};

    fn napoleon() -> SpexCreateDto {
        SpexCreateDto { year: "1948".into(), title: "Napoleon".into() }
    }

    #[tokio::test]
    async fn spex_crud_service() -> Result<(), anyhow::Error> {
        let db = get_db().await?;
        let created = create(&db, napoleon()).await?;
        assert_eq!(created.title, "Napoleon");
        assert!(!created.revival);

        let updated = update(&db, ALL_ROLES, created.id, SpexUpdateDto { id: created.id, year: "1949".into(), title: "Napoleon II".into() }).await?;
        assert_eq!((updated.year.as_str(), updated.title.as_str()), ("1949", "Napoleon II"));

        let patched = partial_update(&db, ALL_ROLES, created.id, SpexPatchDto { id: created.id, year: None, title: Some(Some("Bonaparte".into())) }).await?;
        assert_eq!((patched.year.as_str(), patched.title.as_str()), ("1949", "Bonaparte"));

        let bad = create(&db, SpexCreateDto { year: "1848".into(), title: "Old".into() }).await;
        assert!(matches!(bad, Err(ServiceError::Model(_))));

        delete(&db, &[Role::Admin], created.id).await?;
        assert!(find_by_id(&db, ALL_ROLES, created.id).await?.is_none());
        assert_eq!(spex_details::Entity::find().count(&db).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn revivals_share_details_and_go_with_parent() -> Result<(), anyhow::Error> {
        let db = get_db().await?;
        let parent = create(&db, napoleon()).await?;
        let revival = add_revival(&db, ALL_ROLES, parent.id, "1978").await?;
        assert!(revival.revival);
        assert_eq!(revival.title, "Napoleon");
        assert!(matches!(add_revival(&db, ALL_ROLES, parent.id, "1978").await, Err(ServiceError::Conflict(_))));

        // the default listing hides revivals
        let originals = find_all(&db, ALL_ROLES, None, &PageRequest::default()).await?;
        assert_eq!(originals.total_elements, 1);
        let revivals = find_revivals_by_spex(&db, ALL_ROLES, parent.id, &PageRequest::default()).await?;
        assert_eq!(revivals.content[0].id, revival.id);
        assert_eq!(find_parent(&db, ALL_ROLES, revival.id).await?.map(|p| p.id), Some(parent.id));
        assert!(find_parent(&db, ALL_ROLES, parent.id).await?.is_none());

        delete_revival(&db, ALL_ROLES, parent.id, "1978").await?;
        assert!(find_revival_by_id(&db, ALL_ROLES, parent.id, revival.id).await?.is_none());
        // details survive while the parent uses them
        assert_eq!(spex_details::Entity::find().count(&db).await?, 1);

        add_revival(&db, ALL_ROLES, parent.id, "1990").await?;
        delete(&db, ALL_ROLES, parent.id).await?;
        assert_eq!(spex::Entity::find().count(&db).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn category_assignment() -> Result<(), anyhow::Error> {
        let db = get_db().await?;
        let s = create(&db, napoleon()).await?;
        let cat = spex_category_service::create(&db, SpexCategoryCreateDto { name: "Chalmersspexet".into(), first_year: "1948".into() }).await?;
        assert!(find_category(&db, ALL_ROLES, s.id).await?.is_none());
        set_category(&db, ALL_ROLES, s.id, cat.id).await?;
        assert_eq!(find_category(&db, ALL_ROLES, s.id).await?.map(|c| c.id), Some(cat.id));
        assert!(matches!(set_category(&db, ALL_ROLES, s.id, 999).await, Err(ServiceError::NotFound(_))));
        remove_category(&db, ALL_ROLES, s.id).await?;
        assert!(find_category(&db, ALL_ROLES, s.id).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn unreadable_category_cannot_be_assigned() -> Result<(), anyhow::Error> {
        let db = get_db().await?;
        let s = create(&db, napoleon()).await?;
        let cat = spex_category_service::create(&db, SpexCategoryCreateDto { name: "Chalmersspexet".into(), first_year: "1948".into() }).await?;
        permission::revoke_all(&db, ObjectClass::SpexCategory, cat.id).await?;
        assert!(matches!(set_category(&db, ALL_ROLES, s.id, cat.id).await, Err(ServiceError::NotFound(_))));
        assert!(find_category(&db, ALL_ROLES, s.id).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn unreadable_spex_is_not_found() -> Result<(), anyhow::Error> {
        let db = get_db().await?;
        let s = create(&db, napoleon()).await?;
        permission::revoke_all(&db, ObjectClass::Spex, s.id).await?;
        assert!(find_by_id(&db, ALL_ROLES, s.id).await?.is_none());
        assert!(matches!(delete(&db, ALL_ROLES, s.id).await, Err(ServiceError::NotFound(_))));
        Ok(())
    }
}
