use models::address;
use models::types::TypeType;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::dto::AuditDto;
use crate::errors::ServiceError;
use crate::filter::{FieldKind, Fields};
use crate::pagination::{fetch_page, Page, PageRequest, SortOrder};
use crate::patch::double_option;
use crate::services::scope;

pub const FIELDS: Fields<address::Column> = Fields::new(&[
    ("id", address::Column::Id, FieldKind::Integer),
    ("type", address::Column::TypeId, FieldKind::Text),
    ("streetAddress", address::Column::StreetAddress, FieldKind::Text),
    ("postalCode", address::Column::PostalCode, FieldKind::Text),
    ("city", address::Column::City, FieldKind::Text),
    ("country", address::Column::Country, FieldKind::Text),
    ("phone", address::Column::Phone, FieldKind::Text),
    ("phoneMobile", address::Column::PhoneMobile, FieldKind::Text),
    ("emailAddress", address::Column::EmailAddress, FieldKind::Text),
    ("createdBy", address::Column::CreatedBy, FieldKind::Text),
    ("createdAt", address::Column::CreatedAt, FieldKind::Text),
    ("lastModifiedBy", address::Column::LastModifiedBy, FieldKind::Text),
    ("lastModifiedAt", address::Column::LastModifiedAt, FieldKind::Text),
]);

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AddressDto {
    pub id: i64,
    pub street_address: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub phone: Option<String>,
    pub phone_mobile: Option<String>,
    pub email_address: Option<String>,
    #[serde(rename = "type")]
    pub type_id: String,
    #[serde(flatten)]
    pub audit: AuditDto,
}

impl From<address::Model> for AddressDto {
    fn from(m: address::Model) -> Self {
        Self {
            id: m.id,
            audit: crate::audit_of!(m),
            street_address: m.street_address,
            postal_code: m.postal_code,
            city: m.city,
            country: m.country,
            phone: m.phone,
            phone_mobile: m.phone_mobile,
            email_address: m.email_address,
            type_id: m.type_id,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressCreateDto {
    pub street_address: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub phone: Option<String>,
    pub phone_mobile: Option<String>,
    pub email_address: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressUpdateDto {
    pub id: i64,
    pub street_address: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub phone: Option<String>,
    pub phone_mobile: Option<String>,
    pub email_address: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressPatchDto {
    pub id: i64,
    #[serde(default, deserialize_with = "double_option")]
    pub street_address: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub postal_code: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub city: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub country: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub phone_mobile: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub email_address: Option<Option<String>>,
}

struct Contact<'a> {
    street_address: Option<&'a str>,
    postal_code: Option<&'a str>,
    city: Option<&'a str>,
    country: Option<&'a str>,
    phone: Option<&'a str>,
    phone_mobile: Option<&'a str>,
    email_address: Option<&'a str>,
}

impl Contact<'_> {
    fn validate(&self) -> Result<(), ServiceError> {
        for (field, v) in [
            ("streetAddress", self.street_address),
            ("postalCode", self.postal_code),
            ("city", self.city),
            ("country", self.country),
            ("phone", self.phone),
            ("phoneMobile", self.phone_mobile),
        ] {
            address::validate_text(field, v)?;
        }
        address::validate_email_address(self.email_address)?;
        Ok(())
    }
}

/// Loads an address under `spexare_id` and `type_id`.
/// A missing id is a 404; an address that lives elsewhere is a 422.
async fn find_in_scope<C: ConnectionTrait>(db: &C, spexare_id: i64, type_id: &str, id: i64) -> Result<address::Model, ServiceError> {
    scope::ensure_spexare(db, spexare_id).await?;
    scope::ensure_type(db, TypeType::Address, type_id).await?;
    let found = address::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found_id("address", id))?;
    if found.spexare_id != spexare_id || found.type_id != type_id {
        return Err(ServiceError::Unprocessable(format!(
            "address {id} does not belong to spexare {spexare_id} with type {type_id}"
        )));
    }
    Ok(found)
}

pub async fn find_by_spexare<C: ConnectionTrait>(
    db: &C,
    spexare_id: i64,
    filter: Option<&str>,
    req: &PageRequest,
) -> Result<Page<AddressDto>, ServiceError> {
    scope::ensure_spexare(db, spexare_id).await?;
    let mut q = address::Entity::find().filter(address::Column::SpexareId.eq(spexare_id));
    if let Some(cond) = FIELDS.condition(filter)? {
        q = q.filter(cond);
    }
    let page = fetch_page(db, q, &req.clone().or_sort(SortOrder::asc("type")), &FIELDS).await?;
    Ok(page.map(AddressDto::from))
}

pub async fn find_by_id<C: ConnectionTrait>(db: &C, spexare_id: i64, id: i64) -> Result<Option<AddressDto>, ServiceError> {
    scope::ensure_spexare(db, spexare_id).await?;
    Ok(address::Entity::find_by_id(id)
        .filter(address::Column::SpexareId.eq(spexare_id))
        .one(db)
        .await?
        .map(AddressDto::from))
}

#[instrument(skip(db, dto))]
pub async fn create<C: ConnectionTrait>(db: &C, spexare_id: i64, type_id: &str, dto: AddressCreateDto) -> Result<AddressDto, ServiceError> {
    scope::ensure_spexare(db, spexare_id).await?;
    scope::ensure_type(db, TypeType::Address, type_id).await?;
    Contact {
        street_address: dto.street_address.as_deref(),
        postal_code: dto.postal_code.as_deref(),
        city: dto.city.as_deref(),
        country: dto.country.as_deref(),
        phone: dto.phone.as_deref(),
        phone_mobile: dto.phone_mobile.as_deref(),
        email_address: dto.email_address.as_deref(),
    }
    .validate()?;
    let am = address::ActiveModel {
        street_address: Set(dto.street_address),
        postal_code: Set(dto.postal_code),
        city: Set(dto.city),
        country: Set(dto.country),
        phone: Set(dto.phone),
        phone_mobile: Set(dto.phone_mobile),
        email_address: Set(dto.email_address),
        type_id: Set(type_id.to_string()),
        spexare_id: Set(spexare_id),
        ..Default::default()
    };
    let taken = address::Entity::find()
        .filter(address::Column::SpexareId.eq(spexare_id))
        .filter(address::Column::TypeId.eq(type_id))
        .count(db)
        .await?;
    if taken > 0 {
        return Err(ServiceError::Conflict(format!("spexare {spexare_id} already has an address of type {type_id}")));
    }
    let created = am.insert(db).await?;
    info!(spexare_id = %spexare_id, address_id = %created.id, "address_created");
    Ok(created.into())
}

#[instrument(skip(db, dto))]
pub async fn update<C: ConnectionTrait>(
    db: &C,
    spexare_id: i64,
    type_id: &str,
    id: i64,
    dto: AddressUpdateDto,
) -> Result<AddressDto, ServiceError> {
    let patch = AddressPatchDto {
        id: dto.id,
        street_address: Some(dto.street_address),
        postal_code: Some(dto.postal_code),
        city: Some(dto.city),
        country: Some(dto.country),
        phone: Some(dto.phone),
        phone_mobile: Some(dto.phone_mobile),
        email_address: Some(dto.email_address),
    };
    partial_update(db, spexare_id, type_id, id, patch).await
}

#[instrument(skip(db, dto))]
pub async fn partial_update<C: ConnectionTrait>(
    db: &C,
    spexare_id: i64,
    type_id: &str,
    id: i64,
    dto: AddressPatchDto,
) -> Result<AddressDto, ServiceError> {
    if dto.id != id {
        return Err(ServiceError::Validation("id in body does not match path".into()));
    }
    let current = find_in_scope(db, spexare_id, type_id, id).await?;
    let street_address = dto.street_address.unwrap_or_else(|| current.street_address.clone());
    let postal_code = dto.postal_code.unwrap_or_else(|| current.postal_code.clone());
    let city = dto.city.unwrap_or_else(|| current.city.clone());
    let country = dto.country.unwrap_or_else(|| current.country.clone());
    let phone = dto.phone.unwrap_or_else(|| current.phone.clone());
    let phone_mobile = dto.phone_mobile.unwrap_or_else(|| current.phone_mobile.clone());
    let email_address = dto.email_address.unwrap_or_else(|| current.email_address.clone());
    Contact {
        street_address: street_address.as_deref(),
        postal_code: postal_code.as_deref(),
        city: city.as_deref(),
        country: country.as_deref(),
        phone: phone.as_deref(),
        phone_mobile: phone_mobile.as_deref(),
        email_address: email_address.as_deref(),
    }
    .validate()?;
    let mut am: address::ActiveModel = current.into();
    am.street_address = Set(street_address);
    am.postal_code = Set(postal_code);
    am.city = Set(city);
    am.country = Set(country);
    am.phone = Set(phone);
    am.phone_mobile = Set(phone_mobile);
    am.email_address = Set(email_address);
    let updated = am.update(db).await?;
    info!(spexare_id = %spexare_id, address_id = %id, "address_updated");
    Ok(updated.into())
}

#[instrument(skip(db))]
pub async fn delete<C: ConnectionTrait>(db: &C, spexare_id: i64, type_id: &str, id: i64) -> Result<(), ServiceError> {
    find_in_scope(db, spexare_id, type_id, id).await?.delete(db).await?;
    info!(spexare_id = %spexare_id, address_id = %id, "address_deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::get_db;
    use models::spexare;

    async fn two_spexare(db: &sea_orm::DatabaseConnection) -> Result<(i64, i64), anyhow::Error> {
        let a = spexare::ActiveModel { first_name: Set("Kalle".into()), last_name: Set("Anka".into()), ..Default::default() }.insert(db).await?;
        let b = spexare::ActiveModel { first_name: Set("Rut".into()), last_name: Set("Ek".into()), ..Default::default() }.insert(db).await?;
        Ok((a.id, b.id))
    }

    #[tokio::test]
    async fn address_lifecycle_one_per_type() -> Result<(), anyhow::Error> {
        let db = get_db().await?;
        let (kalle, rut) = two_spexare(&db).await?;

        let dto = AddressCreateDto { city: Some("Göteborg".into()), email_address: Some("kalle@example.se".into()), ..Default::default() };
        let home = create(&db, kalle, "HOME", dto.clone()).await?;
        assert_eq!(home.type_id, "HOME");
        assert!(matches!(create(&db, kalle, "HOME", dto.clone()).await, Err(ServiceError::Conflict(_))));
        create(&db, kalle, "WORK", dto.clone()).await?;

        // a vocal is a type but not an address type
        assert!(matches!(create(&db, kalle, "S1", dto.clone()).await, Err(ServiceError::NotFound(_))));
        assert!(matches!(create(&db, 999, "HOME", dto).await, Err(ServiceError::NotFound(_))));

        let bad = AddressCreateDto { email_address: Some("not-an-email".into()), ..Default::default() };
        assert!(matches!(create(&db, rut, "HOME", bad).await, Err(ServiceError::Model(_))));

        let patched = partial_update(
            &db,
            kalle,
            "HOME",
            home.id,
            AddressPatchDto { id: home.id, street_address: Some(Some("Kungsgatan 1".into())), city: Some(None), ..Default::default() },
        )
        .await?;
        assert_eq!(patched.street_address.as_deref(), Some("Kungsgatan 1"));
        assert_eq!(patched.city, None);
        assert_eq!(patched.email_address.as_deref(), Some("kalle@example.se"));

        let page = find_by_spexare(&db, kalle, None, &PageRequest::default()).await?;
        assert_eq!(page.total_elements, 2);
        assert_eq!(page.content[0].type_id, "HOME");
        let page = find_by_spexare(&db, kalle, Some("type:WORK"), &PageRequest::default()).await?;
        assert_eq!(page.total_elements, 1);
        Ok(())
    }

    #[tokio::test]
    async fn address_outside_path_is_unprocessable() -> Result<(), anyhow::Error> {
        let db = get_db().await?;
        let (kalle, rut) = two_spexare(&db).await?;
        let home = create(&db, kalle, "HOME", AddressCreateDto::default()).await?;

        let body = |id| AddressUpdateDto {
            id,
            street_address: None,
            postal_code: None,
            city: Some("Lund".into()),
            country: None,
            phone: None,
            phone_mobile: None,
            email_address: None,
        };
        assert!(matches!(update(&db, rut, "HOME", home.id, body(home.id)).await, Err(ServiceError::Unprocessable(_))));
        assert!(matches!(update(&db, kalle, "WORK", home.id, body(home.id)).await, Err(ServiceError::Unprocessable(_))));
        assert!(matches!(update(&db, kalle, "HOME", home.id, body(home.id + 1)).await, Err(ServiceError::Validation(_))));
        assert!(matches!(delete(&db, kalle, "HOME", 4242).await, Err(ServiceError::NotFound(_))));
        assert!(find_by_id(&db, rut, home.id).await?.is_none());

        assert_eq!(update(&db, kalle, "HOME", home.id, body(home.id)).await?.city.as_deref(), Some("Lund"));
        delete(&db, kalle, "HOME", home.id).await?;
        assert!(find_by_id(&db, kalle, home.id).await?.is_none());
        Ok(())
    }
}
