//! Addresses, memberships, consents and toggles of a spexare.
//!
//! Every item is keyed by a code-list type: `POST …/{typeId}` creates, while
//! `…/{typeId}/{id}` addresses an existing item and must match its type.

use axum::{
    extract::{Path, Request, State},
    http::StatusCode,
    response::Response,
    routing::{get, post, put},
    Router,
};
use axum_extra::extract::Query;
use service::services::{
    address_service::{self, AddressCreateDto, AddressDto, AddressPatchDto, AddressUpdateDto},
    consent_service::{self, ConsentDto},
    membership_service::{self, MembershipDto},
    toggle_service::{self, ToggleDto},
};

use crate::auth::{CurrentUser, ServerState};
use crate::errors::JsonApiError;
use crate::extract::ListParams;
use crate::hal::{self, Hal, Links};
use crate::routes::activities::paged;
use crate::routes::{json, not_found};

pub fn router() -> Router<ServerState> {
    const ADDRESSES: &str = "/api/v1/spexare/:id/addresses";
    const MEMBERSHIPS: &str = "/api/v1/spexare/:id/memberships";
    const CONSENTS: &str = "/api/v1/spexare/:id/consents";
    const TOGGLES: &str = "/api/v1/spexare/:id/toggles";
    Router::new()
        .route(ADDRESSES, get(list_addresses))
        .route(&format!("{ADDRESSES}/:key"), get(find_address).post(create_address))
        .route(&format!("{ADDRESSES}/:key/:item"), put(update_address).patch(partial_update_address).delete(delete_address))
        .route(MEMBERSHIPS, get(list_memberships))
        .route(&format!("{MEMBERSHIPS}/:key"), get(find_membership))
        .route(&format!("{MEMBERSHIPS}/:key/:item"), post(create_membership).delete(delete_membership))
        .route(CONSENTS, get(list_consents))
        .route(&format!("{CONSENTS}/:key"), get(find_consent))
        .route(&format!("{CONSENTS}/:key/:item"), post(create_consent).delete(delete_consent))
        .route(&format!("{CONSENTS}/:key/:item/:value"), put(update_consent))
        .route(TOGGLES, get(list_toggles))
        .route(&format!("{TOGGLES}/:key"), get(find_toggle))
        .route(&format!("{TOGGLES}/:key/:item"), post(create_toggle).delete(delete_toggle))
        .route(&format!("{TOGGLES}/:key/:item/:value"), put(update_toggle))
}

fn item_links(hal: &Hal, sid: i64, rel: &'static str, kind: &str, id: i64, type_id: &str) -> Links {
    let collection = format!("/api/v1/spexare/{sid}/{rel}");
    Links::new()
        .add("self", hal.href(&format!("{collection}/{id}")))
        .add(rel, hal.href(&collection))
        .add("spexare", hal.href(&format!("/api/v1/spexare/{sid}")))
        .add("type", hal.href(&format!("/api/v1/settings/types/{kind}/{type_id}")))
}

fn id_of(what: &str, key: &str) -> Result<i64, JsonApiError> {
    key.parse().map_err(|_| not_found(what, key))
}

fn flag(raw: &str) -> Result<bool, JsonApiError> {
    raw.parse().map_err(|_| JsonApiError::bad_request(format!("value: '{raw}' is not a boolean")))
}

fn address_links(hal: &Hal, sid: i64, a: &AddressDto) -> Links {
    item_links(hal, sid, "addresses", "ADDRESS", a.id, &a.type_id)
}

pub async fn list_addresses(
    State(state): State<ServerState>,
    _user: CurrentUser,
    hal: Hal,
    Path(sid): Path<i64>,
    Query(params): Query<ListParams>,
) -> Result<Response, JsonApiError> {
    let page = address_service::find_by_spexare(&state.db, sid, params.filter(), &params.page_request()?).await?;
    let path = format!("/api/v1/spexare/{sid}/addresses");
    paged(&hal, "addresses", page, &path, &params, |a| hal.entity(a, address_links(&hal, sid, a)))
}

/// `GET …/addresses/{id}`
pub async fn find_address(
    State(state): State<ServerState>,
    _user: CurrentUser,
    hal: Hal,
    Path((sid, key)): Path<(i64, String)>,
) -> Result<Response, JsonApiError> {
    let id = id_of("address", &key)?;
    let found = address_service::find_by_id(&state.db, sid, id).await?.ok_or_else(|| not_found("address", id))?;
    Ok(hal::respond(StatusCode::OK, hal.entity(&found, address_links(&hal, sid, &found))?))
}

/// `POST …/addresses/{typeId}` with the address fields as body.
pub async fn create_address(
    State(state): State<ServerState>,
    _user: CurrentUser,
    hal: Hal,
    Path((sid, type_id)): Path<(i64, String)>,
    req: Request,
) -> Result<Response, JsonApiError> {
    let dto: AddressCreateDto = json(req).await?;
    let created = address_service::create(&state.db, sid, &type_id, dto).await?;
    let body = hal.entity(&created, address_links(&hal, sid, &created))?;
    Ok(hal::created(hal.href(&format!("/api/v1/spexare/{sid}/addresses/{}", created.id)), body))
}

pub async fn update_address(
    State(state): State<ServerState>,
    _user: CurrentUser,
    hal: Hal,
    Path((sid, type_id, id)): Path<(i64, String, i64)>,
    req: Request,
) -> Result<Response, JsonApiError> {
    let dto: AddressUpdateDto = json(req).await?;
    let updated = address_service::update(&state.db, sid, &type_id, id, dto).await?;
    Ok(hal::respond(StatusCode::ACCEPTED, hal.entity(&updated, address_links(&hal, sid, &updated))?))
}

pub async fn partial_update_address(
    State(state): State<ServerState>,
    _user: CurrentUser,
    hal: Hal,
    Path((sid, type_id, id)): Path<(i64, String, i64)>,
    req: Request,
) -> Result<Response, JsonApiError> {
    let dto: AddressPatchDto = json(req).await?;
    let updated = address_service::partial_update(&state.db, sid, &type_id, id, dto).await?;
    Ok(hal::respond(StatusCode::ACCEPTED, hal.entity(&updated, address_links(&hal, sid, &updated))?))
}

pub async fn delete_address(
    State(state): State<ServerState>,
    _user: CurrentUser,
    Path((sid, type_id, id)): Path<(i64, String, i64)>,
) -> Result<StatusCode, JsonApiError> {
    address_service::delete(&state.db, sid, &type_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn membership_links(hal: &Hal, sid: i64, m: &MembershipDto) -> Links {
    item_links(hal, sid, "memberships", "MEMBERSHIP", m.id, &m.type_id)
}

pub async fn list_memberships(
    State(state): State<ServerState>,
    _user: CurrentUser,
    hal: Hal,
    Path(sid): Path<i64>,
    Query(params): Query<ListParams>,
) -> Result<Response, JsonApiError> {
    let page = membership_service::find_by_spexare(&state.db, sid, params.filter(), &params.page_request()?).await?;
    let path = format!("/api/v1/spexare/{sid}/memberships");
    paged(&hal, "memberships", page, &path, &params, |m| hal.entity(m, membership_links(&hal, sid, m)))
}

pub async fn find_membership(
    State(state): State<ServerState>,
    _user: CurrentUser,
    hal: Hal,
    Path((sid, key)): Path<(i64, String)>,
) -> Result<Response, JsonApiError> {
    let id = id_of("membership", &key)?;
    let found = membership_service::find_by_id(&state.db, sid, id).await?.ok_or_else(|| not_found("membership", id))?;
    Ok(hal::respond(StatusCode::OK, hal.entity(&found, membership_links(&hal, sid, &found))?))
}

/// `POST …/memberships/{typeId}/{year}`
pub async fn create_membership(
    State(state): State<ServerState>,
    _user: CurrentUser,
    hal: Hal,
    Path((sid, type_id, year)): Path<(i64, String, String)>,
) -> Result<Response, JsonApiError> {
    let created = membership_service::create(&state.db, sid, &type_id, &year).await?;
    let body = hal.entity(&created, membership_links(&hal, sid, &created))?;
    Ok(hal::created(hal.href(&format!("/api/v1/spexare/{sid}/memberships/{}", created.id)), body))
}

pub async fn delete_membership(
    State(state): State<ServerState>,
    _user: CurrentUser,
    Path((sid, type_id, id)): Path<(i64, String, i64)>,
) -> Result<StatusCode, JsonApiError> {
    membership_service::delete(&state.db, sid, &type_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Consents and toggles share their shape: a boolean per type.
macro_rules! flag_handlers {
    ($svc:ident, $dto:ty, $rel:literal, $kind:literal, $what:literal,
     $links:ident, $list:ident, $find:ident, $create:ident, $update:ident, $delete:ident) => {
        fn $links(hal: &Hal, sid: i64, f: &$dto) -> Links {
            item_links(hal, sid, $rel, $kind, f.id, &f.type_id)
        }

        pub async fn $list(
            State(state): State<ServerState>,
            _user: CurrentUser,
            hal: Hal,
            Path(sid): Path<i64>,
            Query(params): Query<ListParams>,
        ) -> Result<Response, JsonApiError> {
            let page = $svc::find_by_spexare(&state.db, sid, params.filter(), &params.page_request()?).await?;
            let path = format!("/api/v1/spexare/{sid}/{}", $rel);
            paged(&hal, $rel, page, &path, &params, |f| hal.entity(f, $links(&hal, sid, f)))
        }

        pub async fn $find(
            State(state): State<ServerState>,
            _user: CurrentUser,
            hal: Hal,
            Path((sid, key)): Path<(i64, String)>,
        ) -> Result<Response, JsonApiError> {
            let id = id_of($what, &key)?;
            let found = $svc::find_by_id(&state.db, sid, id).await?.ok_or_else(|| not_found($what, id))?;
            Ok(hal::respond(StatusCode::OK, hal.entity(&found, $links(&hal, sid, &found))?))
        }

        /// `POST …/{typeId}/{value}`
        pub async fn $create(
            State(state): State<ServerState>,
            _user: CurrentUser,
            hal: Hal,
            Path((sid, type_id, value)): Path<(i64, String, String)>,
        ) -> Result<Response, JsonApiError> {
            let created = $svc::create(&state.db, sid, &type_id, flag(&value)?).await?;
            let body = hal.entity(&created, $links(&hal, sid, &created))?;
            Ok(hal::created(hal.href(&format!("/api/v1/spexare/{sid}/{}/{}", $rel, created.id)), body))
        }

        /// `PUT …/{typeId}/{id}/{value}`
        pub async fn $update(
            State(state): State<ServerState>,
            _user: CurrentUser,
            hal: Hal,
            Path((sid, type_id, id, value)): Path<(i64, String, i64, String)>,
        ) -> Result<Response, JsonApiError> {
            let updated = $svc::update(&state.db, sid, &type_id, id, flag(&value)?).await?;
            Ok(hal::respond(StatusCode::ACCEPTED, hal.entity(&updated, $links(&hal, sid, &updated))?))
        }

        pub async fn $delete(
            State(state): State<ServerState>,
            _user: CurrentUser,
            Path((sid, type_id, id)): Path<(i64, String, i64)>,
        ) -> Result<StatusCode, JsonApiError> {
            $svc::delete(&state.db, sid, &type_id, id).await?;
            Ok(StatusCode::NO_CONTENT)
        }
    };
}

flag_handlers!(
    consent_service, ConsentDto, "consents", "CONSENT", "consent",
    consent_links, list_consents, find_consent, create_consent, update_consent, delete_consent
);

flag_handlers!(
    toggle_service, ToggleDto, "toggles", "TOGGLE", "toggle",
    toggle_links, list_toggles, find_toggle, create_toggle, update_toggle, delete_toggle
);
