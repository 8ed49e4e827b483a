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
use service::services::spex_service::{self, SpexCreateDto, SpexDto, SpexPatchDto, SpexUpdateDto};

use crate::auth::{CurrentUser, ServerState};
use crate::errors::JsonApiError;
use crate::extract::{self, EventParams, ListParams};
use crate::hal::{self, Hal, Links};
use crate::routes::{binary, events_for, export_if_requested, json, not_found, spex_categories};

const BASE: &str = "/api/v1/spex";

pub fn router() -> Router<ServerState> {
    Router::new()
        .route(BASE, get(list).post(create))
        .route("/api/v1/spex/events", get(events))
        .route("/api/v1/spex/revivals", get(all_revivals))
        .route("/api/v1/spex/:id", get(find).put(update).patch(partial_update).delete(remove))
        .route("/api/v1/spex/:id/poster", get(poster).post(save_poster).put(save_poster).delete(delete_poster))
        .route("/api/v1/spex/:id/parent", get(parent))
        .route("/api/v1/spex/:id/revivals", get(revivals))
        .route("/api/v1/spex/:id/revivals/:key", get(revival).post(add_revival).delete(delete_revival))
        .route("/api/v1/spex/:id/category", get(category).delete(remove_category))
        .route("/api/v1/spex/:id/category/:category_id", put(set_category))
}

pub(crate) fn links(hal: &Hal, s: &SpexDto) -> Links {
    let me = format!("{BASE}/{}", s.id);
    Links::new()
        .add("self", hal.href(&me))
        .add("spex", hal.href(BASE))
        .add_if(s.has_poster, "poster", || hal.href(&format!("{me}/poster")))
        .add_if(s.parent_id.is_some(), "parent", || hal.href(&format!("{me}/parent")))
        .add_if(s.parent_id.is_none(), "revivals", || hal.href(&format!("{me}/revivals")))
        .add_if(s.category_id.is_some(), "category", || hal.href(&format!("{me}/category")))
}

fn to_hal(hal: &Hal, s: &SpexDto) -> Result<serde_json::Value, JsonApiError> {
    hal.entity(s, links(hal, s))
}

#[utoipa::path(get, path = "/api/v1/spex", tag = "spex", responses((status = 200, description = "Page of spex or a spreadsheet"), (status = 406, description = "Unsupported export type")))]
pub async fn list(
    State(state): State<ServerState>,
    user: CurrentUser,
    hal: Hal,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> Result<Response, JsonApiError> {
    if let Some(res) = export_if_requested(&state, &user, &headers, &params, Resource::Spex).await? {
        return Ok(res);
    }
    let page = spex_service::find_all(&state.db, user.roles(), params.filter(), &params.page_request()?).await?;
    let page = page.try_map(|s| to_hal(&hal, &s))?;
    Ok(hal::respond(StatusCode::OK, hal.page("spex", page, BASE, &params.link_params())))
}

#[utoipa::path(post, path = "/api/v1/spex", tag = "spex", responses((status = 201, description = "Created"), (status = 403, description = "Forbidden")))]
pub async fn create(State(state): State<ServerState>, user: CurrentUser, hal: Hal, req: Request) -> Result<Response, JsonApiError> {
    user.require(&[Role::Admin])?;
    let dto: SpexCreateDto = json(req).await?;
    let created = spex_service::create(&state.db, dto).await?;
    Ok(hal::created(hal.href(&format!("{BASE}/{}", created.id)), to_hal(&hal, &created)?))
}

pub async fn find(State(state): State<ServerState>, user: CurrentUser, hal: Hal, Path(id): Path<i64>) -> Result<Response, JsonApiError> {
    let found = spex_service::find_by_id(&state.db, user.roles(), id).await?.ok_or_else(|| not_found("spex", id))?;
    Ok(hal::respond(StatusCode::OK, to_hal(&hal, &found)?))
}

pub async fn update(State(state): State<ServerState>, user: CurrentUser, hal: Hal, Path(id): Path<i64>, req: Request) -> Result<Response, JsonApiError> {
    user.require(&[Role::Admin, Role::Editor])?;
    let dto: SpexUpdateDto = json(req).await?;
    let updated = spex_service::update(&state.db, user.roles(), id, dto).await?;
    Ok(hal::respond(StatusCode::ACCEPTED, to_hal(&hal, &updated)?))
}

pub async fn partial_update(State(state): State<ServerState>, user: CurrentUser, hal: Hal, Path(id): Path<i64>, req: Request) -> Result<Response, JsonApiError> {
    user.require(&[Role::Admin, Role::Editor])?;
    let dto: SpexPatchDto = json(req).await?;
    let updated = spex_service::partial_update(&state.db, user.roles(), id, dto).await?;
    Ok(hal::respond(StatusCode::ACCEPTED, to_hal(&hal, &updated)?))
}

pub async fn remove(State(state): State<ServerState>, user: CurrentUser, Path(id): Path<i64>) -> Result<StatusCode, JsonApiError> {
    user.require(&[Role::Admin])?;
    spex_service::delete(&state.db, user.roles(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn poster(State(state): State<ServerState>, user: CurrentUser, Path(id): Path<i64>) -> Result<Response, JsonApiError> {
    binary(spex_service::find_poster(&state.db, user.roles(), id).await?, "poster")
}

pub async fn save_poster(State(state): State<ServerState>, user: CurrentUser, Path(id): Path<i64>, req: Request) -> Result<StatusCode, JsonApiError> {
    user.require(&[Role::Admin, Role::Editor])?;
    let upload = extract::upload(req).await?;
    let content_type = upload.content_type.unwrap_or_default();
    spex_service::save_poster(&state.db, user.roles(), id, upload.bytes, &content_type).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_poster(State(state): State<ServerState>, user: CurrentUser, Path(id): Path<i64>) -> Result<StatusCode, JsonApiError> {
    user.require(&[Role::Admin, Role::Editor])?;
    spex_service::delete_poster(&state.db, user.roles(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn parent(State(state): State<ServerState>, user: CurrentUser, hal: Hal, Path(id): Path<i64>) -> Result<Response, JsonApiError> {
    let found = spex_service::find_parent(&state.db, user.roles(), id).await?.ok_or_else(|| not_found("parent of spex", id))?;
    Ok(hal::respond(StatusCode::OK, to_hal(&hal, &found)?))
}

pub async fn all_revivals(
    State(state): State<ServerState>,
    user: CurrentUser,
    hal: Hal,
    Query(params): Query<ListParams>,
) -> Result<Response, JsonApiError> {
    let page = spex_service::find_all_revivals(&state.db, user.roles(), &params.page_request()?).await?;
    let page = page.try_map(|s| to_hal(&hal, &s))?;
    Ok(hal::respond(StatusCode::OK, hal.page("spex", page, "/api/v1/spex/revivals", &params.link_params())))
}

pub async fn revivals(
    State(state): State<ServerState>,
    user: CurrentUser,
    hal: Hal,
    Path(id): Path<i64>,
    Query(params): Query<ListParams>,
) -> Result<Response, JsonApiError> {
    let page = spex_service::find_revivals_by_spex(&state.db, user.roles(), id, &params.page_request()?).await?;
    let page = page.try_map(|s| to_hal(&hal, &s))?;
    Ok(hal::respond(StatusCode::OK, hal.page("spex", page, &format!("{BASE}/{id}/revivals"), &params.link_params())))
}

/// `GET /{id}/revivals/{revivalId}`
pub async fn revival(State(state): State<ServerState>, user: CurrentUser, hal: Hal, Path((id, key)): Path<(i64, String)>) -> Result<Response, JsonApiError> {
    let revival_id: i64 = key.parse().map_err(|_| not_found("revival", &key))?;
    let found = spex_service::find_revival_by_id(&state.db, user.roles(), id, revival_id)
        .await?
        .ok_or_else(|| not_found("revival", revival_id))?;
    Ok(hal::respond(StatusCode::OK, to_hal(&hal, &found)?))
}

/// `POST /{id}/revivals/{year}`
pub async fn add_revival(State(state): State<ServerState>, user: CurrentUser, hal: Hal, Path((id, year)): Path<(i64, String)>) -> Result<Response, JsonApiError> {
    user.require(&[Role::Admin, Role::Editor])?;
    let created = spex_service::add_revival(&state.db, user.roles(), id, &year).await?;
    Ok(hal::created(hal.href(&format!("{BASE}/{id}/revivals/{}", created.id)), to_hal(&hal, &created)?))
}

/// `DELETE /{id}/revivals/{year}`
pub async fn delete_revival(State(state): State<ServerState>, user: CurrentUser, Path((id, year)): Path<(i64, String)>) -> Result<StatusCode, JsonApiError> {
    user.require(&[Role::Admin, Role::Editor])?;
    spex_service::delete_revival(&state.db, user.roles(), id, &year).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn category(State(state): State<ServerState>, user: CurrentUser, hal: Hal, Path(id): Path<i64>) -> Result<Response, JsonApiError> {
    let found = spex_service::find_category(&state.db, user.roles(), id).await?.ok_or_else(|| not_found("category of spex", id))?;
    Ok(hal::respond(StatusCode::OK, hal.entity(&found, spex_categories::links(&hal, &found))?))
}

pub async fn set_category(
    State(state): State<ServerState>,
    user: CurrentUser,
    hal: Hal,
    Path((id, category_id)): Path<(i64, i64)>,
) -> Result<Response, JsonApiError> {
    user.require(&[Role::Admin, Role::Editor])?;
    let updated = spex_service::set_category(&state.db, user.roles(), id, category_id).await?;
    Ok(hal::respond(StatusCode::ACCEPTED, to_hal(&hal, &updated)?))
}

pub async fn remove_category(State(state): State<ServerState>, user: CurrentUser, Path(id): Path<i64>) -> Result<StatusCode, JsonApiError> {
    user.require(&[Role::Admin, Role::Editor])?;
    spex_service::remove_category(&state.db, user.roles(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn events(State(state): State<ServerState>, user: CurrentUser, hal: Hal, Query(params): Query<EventParams>) -> Result<Response, JsonApiError> {
    events_for(&state, &user, &hal, params, SourceType::Spex, "/api/v1/spex/events").await
}
