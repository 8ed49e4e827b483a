use models::spexare;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait, QueryFilter, QueryOrder, Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::dto::AuditDto;
use crate::errors::ServiceError;
use crate::filter::{FieldKind, Fields};
use crate::pagination::{fetch_page, Page, PageRequest, SortOrder};
use crate::patch::{double_option, required};
use crate::services::scope;

pub const FIELDS: Fields<spexare::Column> = Fields::new(&[
    ("id", spexare::Column::Id, FieldKind::Integer),
    ("firstName", spexare::Column::FirstName, FieldKind::Text),
    ("lastName", spexare::Column::LastName, FieldKind::Text),
    ("nickName", spexare::Column::NickName, FieldKind::Text),
    ("socialSecurityNumber", spexare::Column::SocialSecurityNumber, FieldKind::Text),
    ("graduation", spexare::Column::Graduation, FieldKind::Text),
    ("comment", spexare::Column::Comment, FieldKind::Text),
    ("partner", spexare::Column::PartnerId, FieldKind::Integer),
    ("createdBy", spexare::Column::CreatedBy, FieldKind::Text),
    ("createdAt", spexare::Column::CreatedAt, FieldKind::Text),
    ("lastModifiedBy", spexare::Column::LastModifiedBy, FieldKind::Text),
    ("lastModifiedAt", spexare::Column::LastModifiedAt, FieldKind::Text),
]);

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SpexareDto {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub nick_name: Option<String>,
    pub social_security_number: Option<String>,
    pub graduation: Option<String>,
    pub comment: Option<String>,
    #[serde(skip)]
    pub has_image: bool,
    #[serde(skip)]
    pub partner_id: Option<i64>,
    #[serde(flatten)]
    pub audit: AuditDto,
}

impl From<spexare::Model> for SpexareDto {
    fn from(m: spexare::Model) -> Self {
        Self {
            id: m.id,
            audit: crate::audit_of!(m),
            first_name: m.first_name,
            last_name: m.last_name,
            nick_name: m.nick_name,
            social_security_number: m.social_security_number,
            graduation: m.graduation,
            comment: m.comment,
            has_image: m.image.is_some(),
            partner_id: m.partner_id,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpexareCreateDto {
    pub first_name: String,
    pub last_name: String,
    pub nick_name: Option<String>,
    pub social_security_number: Option<String>,
    pub graduation: Option<String>,
    pub comment: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpexareUpdateDto {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub nick_name: Option<String>,
    pub social_security_number: Option<String>,
    pub graduation: Option<String>,
    pub comment: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpexarePatchDto {
    pub id: i64,
    #[serde(default, deserialize_with = "double_option")]
    pub first_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub last_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub nick_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub social_security_number: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub graduation: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub comment: Option<Option<String>>,
}

fn validate(
    first_name: &str,
    last_name: &str,
    nick_name: Option<&str>,
    ssn: Option<&str>,
    graduation: Option<&str>,
) -> Result<(), ServiceError> {
    spexare::validate_first_name(first_name)?;
    spexare::validate_last_name(last_name)?;
    spexare::validate_nick_name(nick_name)?;
    spexare::validate_social_security_number(ssn)?;
    spexare::validate_graduation(graduation)?;
    Ok(())
}

pub fn default_sort() -> SortOrder {
    SortOrder::asc("firstName")
}

pub async fn find_all<C: ConnectionTrait>(db: &C, filter: Option<&str>, req: &PageRequest) -> Result<Page<SpexareDto>, ServiceError> {
    let mut q = spexare::Entity::find();
    if let Some(cond) = FIELDS.condition(filter)? {
        q = q.filter(cond);
    }
    let page = fetch_page(db, q, &req.clone().or_sort(default_sort()), &FIELDS).await?;
    Ok(page.map(SpexareDto::from))
}

/// Rows for export, oldest first; all rows when `ids` is empty.
pub async fn find_for_export<C: ConnectionTrait>(db: &C, ids: &[i64]) -> Result<Vec<spexare::Model>, ServiceError> {
    let mut q = spexare::Entity::find();
    if !ids.is_empty() {
        q = q.filter(spexare::Column::Id.is_in(ids.iter().copied()));
    }
    Ok(q.order_by_asc(spexare::Column::CreatedAt).order_by_asc(spexare::Column::Id).all(db).await?)
}

pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: i64) -> Result<Option<SpexareDto>, ServiceError> {
    Ok(spexare::Entity::find_by_id(id).one(db).await?.map(SpexareDto::from))
}

#[instrument(skip(db, dto))]
pub async fn create<C: ConnectionTrait>(db: &C, dto: SpexareCreateDto) -> Result<SpexareDto, ServiceError> {
    validate(
        &dto.first_name,
        &dto.last_name,
        dto.nick_name.as_deref(),
        dto.social_security_number.as_deref(),
        dto.graduation.as_deref(),
    )?;
    let created = spexare::ActiveModel {
        first_name: Set(dto.first_name),
        last_name: Set(dto.last_name),
        nick_name: Set(dto.nick_name),
        social_security_number: Set(dto.social_security_number),
        graduation: Set(dto.graduation),
        comment: Set(dto.comment),
        ..Default::default()
    }
    .insert(db)
    .await?;
    info!(spexare_id = %created.id, "spexare_created");
    Ok(created.into())
}

#[instrument(skip(db, dto), fields(id = %id))]
pub async fn update<C: ConnectionTrait>(db: &C, id: i64, dto: SpexareUpdateDto) -> Result<SpexareDto, ServiceError> {
    if dto.id != id {
        return Err(ServiceError::Validation("id in body does not match path".into()));
    }
    validate(
        &dto.first_name,
        &dto.last_name,
        dto.nick_name.as_deref(),
        dto.social_security_number.as_deref(),
        dto.graduation.as_deref(),
    )?;
    let mut am: spexare::ActiveModel = scope::spexare(db, id).await?.into();
    am.first_name = Set(dto.first_name);
    am.last_name = Set(dto.last_name);
    am.nick_name = Set(dto.nick_name);
    am.social_security_number = Set(dto.social_security_number);
    am.graduation = Set(dto.graduation);
    am.comment = Set(dto.comment);
    Ok(am.update(db).await?.into())
}

#[instrument(skip(db, dto), fields(id = %id))]
pub async fn partial_update<C: ConnectionTrait>(db: &C, id: i64, dto: SpexarePatchDto) -> Result<SpexareDto, ServiceError> {
    if dto.id != id {
        return Err(ServiceError::Validation("id in body does not match path".into()));
    }
    let current = scope::spexare(db, id).await?;
    let first_name = required("firstName", dto.first_name)?.unwrap_or_else(|| current.first_name.clone());
    let last_name = required("lastName", dto.last_name)?.unwrap_or_else(|| current.last_name.clone());
    let nick_name = dto.nick_name.unwrap_or_else(|| current.nick_name.clone());
    let ssn = dto.social_security_number.unwrap_or_else(|| current.social_security_number.clone());
    let graduation = dto.graduation.unwrap_or_else(|| current.graduation.clone());
    let comment = dto.comment.unwrap_or_else(|| current.comment.clone());
    validate(&first_name, &last_name, nick_name.as_deref(), ssn.as_deref(), graduation.as_deref())?;

    let mut am: spexare::ActiveModel = current.into();
    am.first_name = Set(first_name);
    am.last_name = Set(last_name);
    am.nick_name = Set(nick_name);
    am.social_security_number = Set(ssn);
    am.graduation = Set(graduation);
    am.comment = Set(comment);
    Ok(am.update(db).await?.into())
}

/// Delete a spexare; a partner pointing back loses the reference.
#[instrument(skip(db))]
pub async fn delete<C: ConnectionTrait + TransactionTrait>(db: &C, id: i64) -> Result<(), ServiceError> {
    let txn = db.begin().await?;
    let found = scope::spexare(&txn, id).await?;
    for partner in spexare::Entity::find().filter(spexare::Column::PartnerId.eq(id)).all(&txn).await? {
        let mut am: spexare::ActiveModel = partner.into();
        am.partner_id = Set(None);
        am.update(&txn).await?;
    }
    found.delete(&txn).await?;
    txn.commit().await?;
    info!(spexare_id = %id, "spexare_deleted");
    Ok(())
}

pub async fn find_image<C: ConnectionTrait>(db: &C, id: i64) -> Result<Option<(Vec<u8>, String)>, ServiceError> {
    let found = scope::spexare(db, id).await?;
    Ok(match (found.image, found.image_content_type) {
        (Some(bytes), Some(ct)) => Some((bytes, ct)),
        _ => None,
    })
}

pub async fn save_image<C: ConnectionTrait>(db: &C, id: i64, bytes: Vec<u8>, content_type: &str) -> Result<(), ServiceError> {
    if !common::media::is_supported_image(content_type) {
        return Err(ServiceError::UnsupportedMedia(content_type.to_string()));
    }
    let mut am: spexare::ActiveModel = scope::spexare(db, id).await?.into();
    am.image = Set(Some(bytes));
    am.image_content_type = Set(Some(common::media::essence(content_type)));
    am.update(db).await?;
    Ok(())
}

pub async fn delete_image<C: ConnectionTrait>(db: &C, id: i64) -> Result<(), ServiceError> {
    let mut am: spexare::ActiveModel = scope::spexare(db, id).await?.into();
    am.image = Set(None);
    am.image_content_type = Set(None);
    am.update(db).await?;
    Ok(())
}

pub async fn find_partner<C: ConnectionTrait>(db: &C, id: i64) -> Result<Option<SpexareDto>, ServiceError> {
    let found = scope::spexare(db, id).await?;
    match found.partner_id {
        Some(pid) => find_by_id(db, pid).await,
        None => Ok(None),
    }
}

async fn set_partner_column<C: ConnectionTrait>(db: &C, m: spexare::Model, partner: Option<i64>) -> Result<spexare::Model, ServiceError> {
    let mut am: spexare::ActiveModel = m.into();
    am.partner_id = Set(partner);
    Ok(am.update(db).await?)
}

/// Drop whatever partnership `m` is part of, on both sides.
async fn clear_partnership<C: ConnectionTrait>(db: &C, m: spexare::Model) -> Result<spexare::Model, ServiceError> {
    for other in spexare::Entity::find().filter(spexare::Column::PartnerId.eq(m.id)).all(db).await? {
        set_partner_column(db, other, None).await?;
    }
    if m.partner_id.is_some() {
        return set_partner_column(db, m, None).await;
    }
    Ok(m)
}

/// Make `id` and `partner_id` each other's partner, dissolving earlier partnerships.
#[instrument(skip(db))]
pub async fn set_partner<C: ConnectionTrait + TransactionTrait>(db: &C, id: i64, partner_id: i64) -> Result<SpexareDto, ServiceError> {
    if id == partner_id {
        return Err(ServiceError::Validation("a spexare cannot be their own partner".into()));
    }
    let txn = db.begin().await?;
    let me = scope::spexare(&txn, id).await?;
    scope::ensure_spexare(&txn, partner_id).await?;

    let me = clear_partnership(&txn, me).await?;
    // re-read: clearing `me` may have touched the partner row
    let partner = clear_partnership(&txn, scope::spexare(&txn, partner_id).await?).await?;
    let me = scope::spexare(&txn, me.id).await?;

    let updated = set_partner_column(&txn, me, Some(partner.id)).await?;
    set_partner_column(&txn, partner, Some(id)).await?;
    txn.commit().await?;
    info!(spexare_id = %id, partner_id = %partner_id, "partner_set");
    Ok(updated.into())
}

#[instrument(skip(db))]
pub async fn remove_partner<C: ConnectionTrait + TransactionTrait>(db: &C, id: i64) -> Result<SpexareDto, ServiceError> {
    let txn = db.begin().await?;
    let me = scope::spexare(&txn, id).await?;
    let me = clear_partnership(&txn, me).await?;
    txn.commit().await?;
    Ok(me.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::get_db;

    fn kalle() -> SpexareCreateDto {
        SpexareCreateDto {
            first_name: "Kalle".into(),
            last_name: "Anka".into(),
            nick_name: None,
            social_security_number: Some("811218-9876".into()),
            graduation: None,
            comment: None,
        }
    }

    #[tokio::test]
    async fn spexare_crud_service() -> Result<(), anyhow::Error> {
        let db = get_db().await?;
        let created = create(&db, kalle()).await?;
        assert_eq!(created.first_name, "Kalle");

        let update_dto = SpexareUpdateDto {
            id: created.id,
            first_name: "Karl".into(),
            last_name: "Anka".into(),
            nick_name: Some("Kalle".into()),
            social_security_number: None,
            graduation: None,
            comment: Some("hej".into()),
        };
        let updated = update(&db, created.id, update_dto.clone()).await?;
        assert_eq!(updated.first_name, "Karl");
        assert_eq!(updated.social_security_number, None);

        let mismatched = update(&db, created.id + 1, update_dto).await;
        assert!(matches!(mismatched, Err(ServiceError::Validation(_))));

        delete(&db, created.id).await?;
        assert!(find_by_id(&db, created.id).await?.is_none());
        assert!(matches!(delete(&db, created.id).await, Err(ServiceError::NotFound(_))));
        Ok(())
    }

    #[tokio::test]
    async fn invalid_social_security_number_is_rejected() -> Result<(), anyhow::Error> {
        let db = get_db().await?;
        let mut dto = kalle();
        dto.social_security_number = Some("811218-9875".into());
        assert!(matches!(create(&db, dto).await, Err(ServiceError::Model(_))));
        Ok(())
    }

    #[tokio::test]
    async fn patch_keeps_absent_and_clears_null() -> Result<(), anyhow::Error> {
        let db = get_db().await?;
        let mut dto = kalle();
        dto.nick_name = Some("Kula".into());
        dto.graduation = Some("F08".into());
        let created = create(&db, dto).await?;

        let patch: SpexarePatchDto = serde_json::from_value(serde_json::json!({
            "id": created.id, "nickName": null, "lastName": "Duck"
        }))?;
        let patched = partial_update(&db, created.id, patch).await?;
        assert_eq!(patched.nick_name, None);
        assert_eq!(patched.last_name, "Duck");
        assert_eq!(patched.graduation.as_deref(), Some("F08"));

        let null_required: SpexarePatchDto = serde_json::from_value(serde_json::json!({"id": created.id, "firstName": null}))?;
        assert!(matches!(partial_update(&db, created.id, null_required).await, Err(ServiceError::Validation(_))));
        Ok(())
    }

    #[tokio::test]
    async fn filter_and_sort_listing() -> Result<(), anyhow::Error> {
        let db = get_db().await?;
        for name in ["Olle", "Anna", "Kalle"] {
            let mut dto = kalle();
            dto.first_name = name.into();
            create(&db, dto).await?;
        }
        let page = find_all(&db, None, &PageRequest::default()).await?;
        let names: Vec<_> = page.content.iter().map(|s| s.first_name.as_str()).collect();
        assert_eq!(names, vec!["Anna", "Kalle", "Olle"]);
        assert_eq!(page.total_elements, 3);

        let page = find_all(&db, Some("firstName:*lle"), &PageRequest::default()).await?;
        assert_eq!(page.total_elements, 2);

        let req = PageRequest::new(Some(1), Some(2), &["firstName,desc".into()])?;
        let page = find_all(&db, None, &req).await?;
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.content.len(), 1);
        assert_eq!(page.content[0].first_name, "Anna");

        assert!(find_all(&db, Some("shoeSize:42"), &PageRequest::default()).await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn partners_are_mutual_and_exclusive() -> Result<(), anyhow::Error> {
        let db = get_db().await?;
        let a = create(&db, kalle()).await?;
        let b = create(&db, kalle()).await?;
        let c = create(&db, kalle()).await?;

        set_partner(&db, a.id, b.id).await?;
        assert_eq!(find_partner(&db, b.id).await?.map(|p| p.id), Some(a.id));

        // c takes over b; a is left alone
        set_partner(&db, c.id, b.id).await?;
        assert_eq!(find_partner(&db, b.id).await?.map(|p| p.id), Some(c.id));
        assert!(find_partner(&db, a.id).await?.is_none());

        assert!(matches!(set_partner(&db, a.id, a.id).await, Err(ServiceError::Validation(_))));

        remove_partner(&db, c.id).await?;
        assert!(find_partner(&db, b.id).await?.is_none());

        set_partner(&db, a.id, b.id).await?;
        delete(&db, a.id).await?;
        assert!(find_partner(&db, b.id).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn image_round_trip() -> Result<(), anyhow::Error> {
        let db = get_db().await?;
        let a = create(&db, kalle()).await?;
        assert!(find_image(&db, a.id).await?.is_none());
        assert!(matches!(
            save_image(&db, a.id, vec![1, 2, 3], "text/plain").await,
            Err(ServiceError::UnsupportedMedia(_))
        ));
        save_image(&db, a.id, b"GIF89a....".to_vec(), "image/gif").await?;
        let (bytes, ct) = find_image(&db, a.id).await?.unwrap();
        assert_eq!(ct, "image/gif");
        assert!(bytes.starts_with(b"GIF89a"));
        delete_image(&db, a.id).await?;
        assert!(find_image(&db, a.id).await?.is_none());
        Ok(())
    }
}
