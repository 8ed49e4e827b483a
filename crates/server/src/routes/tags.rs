//! Tags and the tagging of spexare.

use axum::{
    extract::{Path, Request, State},
    http::{HeaderMap, StatusCode},
    response::Response,
    routing::get,
    Router,
};
use axum_extra::extract::Query;
use models::event::SourceType;
use service::impex::Resource;
use service::permission::Role;
use service::services::tag_service::{self, TagCreateDto, TagDto, TagPatchDto, TagUpdateDto};
use service::services::tagging_service;

use crate::auth::{CurrentUser, ServerState};
use crate::errors::JsonApiError;
use crate::extract::{EventParams, ListParams};
use crate::hal::{self, Hal, Links};
use crate::routes::{events_for, export_if_requested, import_response, json, json_or_import, not_found, Body};

const BASE: &str = "/api/v1/tags";

pub fn router() -> Router<ServerState> {
    Router::new()
        .route(BASE, get(list).post(create))
        .route("/api/v1/tags/events", get(events))
        .route("/api/v1/tags/:id", get(find).put(update).patch(partial_update).delete(remove))
        .route("/api/v1/spexare/:id/tags", get(tags_of_spexare))
        .route("/api/v1/spexare/:id/tags/:tag_id", get(tag_of_spexare).put(tag_spexare).post(tag_spexare).delete(untag_spexare))
}

pub(crate) fn links(hal: &Hal, t: &TagDto) -> Links {
    Links::new().add("self", hal.href(&format!("{BASE}/{}", t.id))).add("tags", hal.href(BASE))
}

fn to_hal(hal: &Hal, t: &TagDto) -> Result<serde_json::Value, JsonApiError> {
    hal.entity(t, links(hal, t))
}

#[utoipa::path(get, path = "/api/v1/tags", tag = "tags", responses((status = 200, description = "Page of tags or a spreadsheet")))]
pub async fn list(
    State(state): State<ServerState>,
    user: CurrentUser,
    hal: Hal,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> Result<Response, JsonApiError> {
    if let Some(res) = export_if_requested(&state, &user, &headers, &params, Resource::Tag).await? {
        return Ok(res);
    }
    let page = tag_service::find_all(&state.db, user.roles(), params.filter(), &params.page_request()?).await?;
    let page = page.try_map(|t| to_hal(&hal, &t))?;
    Ok(hal::respond(StatusCode::OK, hal.page("tags", page, BASE, &params.link_params())))
}

#[utoipa::path(post, path = "/api/v1/tags", tag = "tags", responses((status = 201, description = "Created"), (status = 200, description = "Imported")))]
pub async fn create(State(state): State<ServerState>, user: CurrentUser, hal: Hal, req: Request) -> Result<Response, JsonApiError> {
    user.require(&[Role::Admin, Role::Editor])?;
    match json_or_import::<TagCreateDto>(&state, Resource::Tag, req).await? {
        Body::Import(result) => Ok(import_response(result)),
        Body::Json(dto) => {
            let created = tag_service::create(&state.db, dto).await?;
            Ok(hal::created(hal.href(&format!("{BASE}/{}", created.id)), to_hal(&hal, &created)?))
        }
    }
}

pub async fn find(State(state): State<ServerState>, user: CurrentUser, hal: Hal, Path(id): Path<i64>) -> Result<Response, JsonApiError> {
    let found = tag_service::find_by_id(&state.db, user.roles(), id).await?.ok_or_else(|| not_found("tag", id))?;
    Ok(hal::respond(StatusCode::OK, to_hal(&hal, &found)?))
}

pub async fn update(State(state): State<ServerState>, user: CurrentUser, hal: Hal, Path(id): Path<i64>, req: Request) -> Result<Response, JsonApiError> {
    user.require(&[Role::Admin, Role::Editor])?;
    let dto: TagUpdateDto = json(req).await?;
    let updated = tag_service::update(&state.db, user.roles(), id, dto).await?;
    Ok(hal::respond(StatusCode::ACCEPTED, to_hal(&hal, &updated)?))
}

pub async fn partial_update(State(state): State<ServerState>, user: CurrentUser, hal: Hal, Path(id): Path<i64>, req: Request) -> Result<Response, JsonApiError> {
    user.require(&[Role::Admin, Role::Editor])?;
    let dto: TagPatchDto = json(req).await?;
    let updated = tag_service::partial_update(&state.db, user.roles(), id, dto).await?;
    Ok(hal::respond(StatusCode::ACCEPTED, to_hal(&hal, &updated)?))
}

pub async fn remove(State(state): State<ServerState>, user: CurrentUser, Path(id): Path<i64>) -> Result<StatusCode, JsonApiError> {
    user.require(&[Role::Admin, Role::Editor])?;
    tag_service::delete(&state.db, user.roles(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn events(State(state): State<ServerState>, user: CurrentUser, hal: Hal, Query(params): Query<EventParams>) -> Result<Response, JsonApiError> {
    events_for(&state, &user, &hal, params, SourceType::Tag, "/api/v1/tags/events").await
}

pub async fn tags_of_spexare(State(state): State<ServerState>, user: CurrentUser, hal: Hal, Path(sid): Path<i64>) -> Result<Response, JsonApiError> {
    let tags = tagging_service::find_by_spexare(&state.db, user.roles(), sid).await?;
    let items = tags.iter().map(|t| to_hal(&hal, t)).collect::<Result<Vec<_>, _>>()?;
    let self_link = Links::new().add("self", hal.href(&format!("/api/v1/spexare/{sid}/tags")));
    Ok(hal::respond(StatusCode::OK, hal.collection("tags", items, self_link)))
}

pub async fn tag_of_spexare(
    State(state): State<ServerState>,
    user: CurrentUser,
    hal: Hal,
    Path((sid, tag_id)): Path<(i64, i64)>,
) -> Result<Response, JsonApiError> {
    let tags = tagging_service::find_by_spexare(&state.db, user.roles(), sid).await?;
    let found = tags.into_iter().find(|t| t.id == tag_id).ok_or_else(|| not_found("tag", tag_id))?;
    Ok(hal::respond(StatusCode::OK, to_hal(&hal, &found)?))
}

pub async fn tag_spexare(State(state): State<ServerState>, _user: CurrentUser, Path((sid, tag_id)): Path<(i64, i64)>) -> Result<StatusCode, JsonApiError> {
    tagging_service::create(&state.db, sid, tag_id).await?;
    Ok(StatusCode::ACCEPTED)
}

pub async fn untag_spexare(State(state): State<ServerState>, _user: CurrentUser, Path((sid, tag_id)): Path<(i64, i64)>) -> Result<StatusCode, JsonApiError> {
    tagging_service::delete(&state.db, sid, tag_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
