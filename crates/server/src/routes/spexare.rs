use axum::{
    extract::{Path, Request, State},
    http::{HeaderMap, StatusCode},
    response::Response,
    routing::{get, put},
    Router,
};
use axum_extra::extract::Query;
use models::event::SourceType;
use service::impex::Resource;
use service::permission::Role;
use service::services::spexare_service::{self, SpexareCreateDto, SpexareDto, SpexarePatchDto, SpexareUpdateDto};
use tracing::info;

use crate::auth::{CurrentUser, ServerState};
use crate::errors::JsonApiError;
use crate::extract::{self, EventParams, ListParams};
use crate::hal::{self, Hal, Links};
use crate::routes::{events_for, export_if_requested, json, not_found};

const BASE: &str = "/api/v1/spexare";

pub fn router() -> Router<ServerState> {
    Router::new()
        .route(BASE, get(list).post(create))
        .route("/api/v1/spexare/events", get(events))
        .route("/api/v1/spexare/:id", get(find).put(update).patch(partial_update).delete(remove))
        .route("/api/v1/spexare/:id/image", get(image).post(save_image).put(save_image).delete(delete_image))
        .route("/api/v1/spexare/:id/partner", get(partner).delete(remove_partner))
        .route("/api/v1/spexare/:id/partner/:partner_id", put(set_partner))
}

pub(crate) fn links(hal: &Hal, s: &SpexareDto) -> Links {
    let me = format!("{BASE}/{}", s.id);
    Links::new()
        .add("self", hal.href(&me))
        .add("spexare", hal.href(BASE))
        .add("activities", hal.href(&format!("{me}/activities")))
        .add("tags", hal.href(&format!("{me}/tags")))
        .add("addresses", hal.href(&format!("{me}/addresses")))
        .add("memberships", hal.href(&format!("{me}/memberships")))
        .add("consents", hal.href(&format!("{me}/consents")))
        .add("toggles", hal.href(&format!("{me}/toggles")))
        .add_if(s.has_image, "image", || hal.href(&format!("{me}/image")))
        .add_if(s.partner_id.is_some(), "partner", || hal.href(&format!("{me}/partner")))
}

fn to_hal(hal: &Hal, s: &SpexareDto) -> Result<serde_json::Value, JsonApiError> {
    hal.entity(s, links(hal, s))
}

#[utoipa::path(get, path = "/api/v1/spexare", tag = "spexare", responses((status = 200, description = "Page of spexare, search result with facets, or a spreadsheet"), (status = 400, description = "Bad filter")))]
pub async fn list(
    State(state): State<ServerState>,
    user: CurrentUser,
    hal: Hal,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> Result<Response, JsonApiError> {
    if let Some(res) = export_if_requested(&state, &user, &headers, &params, Resource::Spexare).await? {
        return Ok(res);
    }
    let req = params.page_request()?;
    if let Some(q) = params.q.as_deref().filter(|q| !q.trim().is_empty()) {
        let result = state.search.search(q, &req).await?;
        let facets = result.facets;
        let page = result.page.try_map(|s| to_hal(&hal, &s))?;
        let body = hal.page("spexare", page, BASE, &params.link_params());
        return Ok(hal::respond(StatusCode::OK, Hal::facets(body, &facets)));
    }
    let page = spexare_service::find_all(&state.db, params.filter(), &req).await?;
    let page = page.try_map(|s| to_hal(&hal, &s))?;
    Ok(hal::respond(StatusCode::OK, hal.page("spexare", page, BASE, &params.link_params())))
}

#[utoipa::path(post, path = "/api/v1/spexare", tag = "spexare", responses((status = 201, description = "Created"), (status = 400, description = "Validation Error")))]
pub async fn create(State(state): State<ServerState>, _user: CurrentUser, hal: Hal, req: Request) -> Result<Response, JsonApiError> {
    let dto: SpexareCreateDto = json(req).await?;
    let created = spexare_service::create(&state.db, dto).await?;
    info!(spexare_id = %created.id, "spexare_create_request");
    Ok(hal::created(hal.href(&format!("{BASE}/{}", created.id)), to_hal(&hal, &created)?))
}

#[utoipa::path(get, path = "/api/v1/spexare/{id}", tag = "spexare", params(("id" = i64, Path, description = "Spexare id")), responses((status = 200, description = "OK"), (status = 404, description = "Not Found")))]
pub async fn find(State(state): State<ServerState>, _user: CurrentUser, hal: Hal, Path(id): Path<i64>) -> Result<Response, JsonApiError> {
    let found = spexare_service::find_by_id(&state.db, id).await?.ok_or_else(|| not_found("spexare", id))?;
    Ok(hal::respond(StatusCode::OK, to_hal(&hal, &found)?))
}

#[utoipa::path(put, path = "/api/v1/spexare/{id}", tag = "spexare", params(("id" = i64, Path, description = "Spexare id")), responses((status = 202, description = "Accepted"), (status = 400, description = "Validation Error"), (status = 404, description = "Not Found")))]
pub async fn update(State(state): State<ServerState>, _user: CurrentUser, hal: Hal, Path(id): Path<i64>, req: Request) -> Result<Response, JsonApiError> {
    let dto: SpexareUpdateDto = json(req).await?;
    let updated = spexare_service::update(&state.db, id, dto).await?;
    Ok(hal::respond(StatusCode::ACCEPTED, to_hal(&hal, &updated)?))
}

pub async fn partial_update(State(state): State<ServerState>, _user: CurrentUser, hal: Hal, Path(id): Path<i64>, req: Request) -> Result<Response, JsonApiError> {
    let dto: SpexarePatchDto = json(req).await?;
    let updated = spexare_service::partial_update(&state.db, id, dto).await?;
    Ok(hal::respond(StatusCode::ACCEPTED, to_hal(&hal, &updated)?))
}

#[utoipa::path(delete, path = "/api/v1/spexare/{id}", tag = "spexare", params(("id" = i64, Path, description = "Spexare id")), responses((status = 204, description = "Deleted"), (status = 403, description = "Forbidden"), (status = 404, description = "Not Found")))]
pub async fn remove(State(state): State<ServerState>, user: CurrentUser, Path(id): Path<i64>) -> Result<StatusCode, JsonApiError> {
    user.require(&[Role::Admin, Role::Editor])?;
    spexare_service::delete(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn image(State(state): State<ServerState>, _user: CurrentUser, Path(id): Path<i64>) -> Result<Response, JsonApiError> {
    crate::routes::binary(spexare_service::find_image(&state.db, id).await?, "image")
}

pub async fn save_image(State(state): State<ServerState>, _user: CurrentUser, Path(id): Path<i64>, req: Request) -> Result<StatusCode, JsonApiError> {
    let upload = extract::upload(req).await?;
    let content_type = upload.content_type.unwrap_or_default();
    spexare_service::save_image(&state.db, id, upload.bytes, &content_type).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_image(State(state): State<ServerState>, _user: CurrentUser, Path(id): Path<i64>) -> Result<StatusCode, JsonApiError> {
    spexare_service::delete_image(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn partner(State(state): State<ServerState>, _user: CurrentUser, hal: Hal, Path(id): Path<i64>) -> Result<Response, JsonApiError> {
    let found = spexare_service::find_partner(&state.db, id).await?.ok_or_else(|| not_found("partner of spexare", id))?;
    Ok(hal::respond(StatusCode::OK, to_hal(&hal, &found)?))
}

pub async fn set_partner(
    State(state): State<ServerState>,
    _user: CurrentUser,
    hal: Hal,
    Path((id, partner_id)): Path<(i64, i64)>,
) -> Result<Response, JsonApiError> {
    let updated = spexare_service::set_partner(&state.db, id, partner_id).await?;
    Ok(hal::respond(StatusCode::ACCEPTED, to_hal(&hal, &updated)?))
}

pub async fn remove_partner(State(state): State<ServerState>, _user: CurrentUser, Path(id): Path<i64>) -> Result<StatusCode, JsonApiError> {
    spexare_service::remove_partner(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn events(State(state): State<ServerState>, user: CurrentUser, hal: Hal, Query(params): Query<EventParams>) -> Result<Response, JsonApiError> {
    events_for(&state, &user, &hal, params, SourceType::Spexare, "/api/v1/spexare/events").await
}
