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
use service::services::spex_category_service::{
    self, SpexCategoryCreateDto, SpexCategoryDto, SpexCategoryPatchDto, SpexCategoryUpdateDto,
};

use crate::auth::{CurrentUser, ServerState};
use crate::errors::JsonApiError;
use crate::extract::{self, EventParams, ListParams};
use crate::hal::{self, Hal, Links};
use crate::routes::{binary, events_for, export_if_requested, import_response, json, json_or_import, not_found, Body};

const BASE: &str = "/api/v1/spex/categories";

pub fn router() -> Router<ServerState> {
    Router::new()
        .route(BASE, get(list).post(create))
        .route("/api/v1/spex/categories/events", get(events))
        .route("/api/v1/spex/categories/:id", get(find).put(update).patch(partial_update).delete(remove))
        .route("/api/v1/spex/categories/:id/logo", get(logo).post(save_logo).put(save_logo).delete(delete_logo))
}

pub(crate) fn links(hal: &Hal, c: &SpexCategoryDto) -> Links {
    let me = format!("{BASE}/{}", c.id);
    Links::new()
        .add("self", hal.href(&me))
        .add("spex-categories", hal.href(BASE))
        .add_if(c.has_logo, "logo", || hal.href(&format!("{me}/logo")))
}

fn to_hal(hal: &Hal, c: &SpexCategoryDto) -> Result<serde_json::Value, JsonApiError> {
    hal.entity(c, links(hal, c))
}

#[utoipa::path(get, path = "/api/v1/spex/categories", tag = "spex-categories", responses((status = 200, description = "Page of spex categories or a spreadsheet")))]
pub async fn list(
    State(state): State<ServerState>,
    user: CurrentUser,
    hal: Hal,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> Result<Response, JsonApiError> {
    if let Some(res) = export_if_requested(&state, &user, &headers, &params, Resource::SpexCategory).await? {
        return Ok(res);
    }
    let page = spex_category_service::find_all(&state.db, user.roles(), params.filter(), &params.page_request()?).await?;
    let page = page.try_map(|c| to_hal(&hal, &c))?;
    Ok(hal::respond(StatusCode::OK, hal.page("spex-categories", page, BASE, &params.link_params())))
}

/// Create from JSON, or import a spreadsheet body.
#[utoipa::path(post, path = "/api/v1/spex/categories", tag = "spex-categories", responses((status = 201, description = "Created"), (status = 200, description = "Imported"), (status = 400, description = "Invalid body or rows")))]
pub async fn create(State(state): State<ServerState>, user: CurrentUser, hal: Hal, req: Request) -> Result<Response, JsonApiError> {
    user.require(&[Role::Admin])?;
    match json_or_import::<SpexCategoryCreateDto>(&state, Resource::SpexCategory, req).await? {
        Body::Import(result) => Ok(import_response(result)),
        Body::Json(dto) => {
            let created = spex_category_service::create(&state.db, dto).await?;
            Ok(hal::created(hal.href(&format!("{BASE}/{}", created.id)), to_hal(&hal, &created)?))
        }
    }
}

pub async fn find(State(state): State<ServerState>, user: CurrentUser, hal: Hal, Path(id): Path<i64>) -> Result<Response, JsonApiError> {
    let found = spex_category_service::find_by_id(&state.db, user.roles(), id)
        .await?
        .ok_or_else(|| not_found("spex category", id))?;
    Ok(hal::respond(StatusCode::OK, to_hal(&hal, &found)?))
}

pub async fn update(State(state): State<ServerState>, user: CurrentUser, hal: Hal, Path(id): Path<i64>, req: Request) -> Result<Response, JsonApiError> {
    user.require(&[Role::Admin])?;
    let dto: SpexCategoryUpdateDto = json(req).await?;
    let updated = spex_category_service::update(&state.db, user.roles(), id, dto).await?;
    Ok(hal::respond(StatusCode::ACCEPTED, to_hal(&hal, &updated)?))
}

pub async fn partial_update(State(state): State<ServerState>, user: CurrentUser, hal: Hal, Path(id): Path<i64>, req: Request) -> Result<Response, JsonApiError> {
    user.require(&[Role::Admin])?;
    let dto: SpexCategoryPatchDto = json(req).await?;
    let updated = spex_category_service::partial_update(&state.db, user.roles(), id, dto).await?;
    Ok(hal::respond(StatusCode::ACCEPTED, to_hal(&hal, &updated)?))
}

pub async fn remove(State(state): State<ServerState>, user: CurrentUser, Path(id): Path<i64>) -> Result<StatusCode, JsonApiError> {
    user.require(&[Role::Admin])?;
    spex_category_service::delete(&state.db, user.roles(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn logo(State(state): State<ServerState>, user: CurrentUser, Path(id): Path<i64>) -> Result<Response, JsonApiError> {
    binary(spex_category_service::find_logo(&state.db, user.roles(), id).await?, "logo")
}

pub async fn save_logo(State(state): State<ServerState>, user: CurrentUser, Path(id): Path<i64>, req: Request) -> Result<StatusCode, JsonApiError> {
    user.require(&[Role::Admin])?;
    let upload = extract::upload(req).await?;
    let content_type = upload.content_type.unwrap_or_default();
    spex_category_service::save_logo(&state.db, user.roles(), id, upload.bytes, &content_type).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_logo(State(state): State<ServerState>, user: CurrentUser, Path(id): Path<i64>) -> Result<StatusCode, JsonApiError> {
    user.require(&[Role::Admin])?;
    spex_category_service::delete_logo(&state.db, user.roles(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn events(State(state): State<ServerState>, user: CurrentUser, hal: Hal, Query(params): Query<EventParams>) -> Result<Response, JsonApiError> {
    events_for(&state, &user, &hal, params, SourceType::SpexCategory, "/api/v1/spex/categories/events").await
}
