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
use service::services::task_category_service::{
    self, TaskCategoryCreateDto, TaskCategoryDto, TaskCategoryPatchDto, TaskCategoryUpdateDto,
};

use crate::auth::{CurrentUser, ServerState};
use crate::errors::JsonApiError;
use crate::extract::{EventParams, ListParams};
use crate::hal::{self, Hal, Links};
use crate::routes::{events_for, export_if_requested, import_response, json, json_or_import, not_found, Body};

const BASE: &str = "/api/v1/task-categories";

pub fn router() -> Router<ServerState> {
    Router::new()
        .route(BASE, get(list).post(create))
        .route("/api/v1/task-categories/events", get(events))
        .route("/api/v1/task-categories/:id", get(find).put(update).patch(partial_update).delete(remove))
}

pub(crate) fn links(hal: &Hal, c: &TaskCategoryDto) -> Links {
    Links::new().add("self", hal.href(&format!("{BASE}/{}", c.id))).add("task-categories", hal.href(BASE))
}

fn to_hal(hal: &Hal, c: &TaskCategoryDto) -> Result<serde_json::Value, JsonApiError> {
    hal.entity(c, links(hal, c))
}

#[utoipa::path(get, path = "/api/v1/task-categories", tag = "task-categories", responses((status = 200, description = "Page of task categories or a spreadsheet")))]
pub async fn list(
    State(state): State<ServerState>,
    user: CurrentUser,
    hal: Hal,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> Result<Response, JsonApiError> {
    if let Some(res) = export_if_requested(&state, &user, &headers, &params, Resource::TaskCategory).await? {
        return Ok(res);
    }
    let page = task_category_service::find_all(&state.db, user.roles(), params.filter(), &params.page_request()?).await?;
    let page = page.try_map(|c| to_hal(&hal, &c))?;
    Ok(hal::respond(StatusCode::OK, hal.page("task-categories", page, BASE, &params.link_params())))
}

#[utoipa::path(post, path = "/api/v1/task-categories", tag = "task-categories", responses((status = 201, description = "Created"), (status = 200, description = "Imported")))]
pub async fn create(State(state): State<ServerState>, user: CurrentUser, hal: Hal, req: Request) -> Result<Response, JsonApiError> {
    user.require(&[Role::Admin])?;
    match json_or_import::<TaskCategoryCreateDto>(&state, Resource::TaskCategory, req).await? {
        Body::Import(result) => Ok(import_response(result)),
        Body::Json(dto) => {
            let created = task_category_service::create(&state.db, dto).await?;
            Ok(hal::created(hal.href(&format!("{BASE}/{}", created.id)), to_hal(&hal, &created)?))
        }
    }
}

pub async fn find(State(state): State<ServerState>, user: CurrentUser, hal: Hal, Path(id): Path<i64>) -> Result<Response, JsonApiError> {
    let found = task_category_service::find_by_id(&state.db, user.roles(), id)
        .await?
        .ok_or_else(|| not_found("task category", id))?;
    Ok(hal::respond(StatusCode::OK, to_hal(&hal, &found)?))
}

pub async fn update(State(state): State<ServerState>, user: CurrentUser, hal: Hal, Path(id): Path<i64>, req: Request) -> Result<Response, JsonApiError> {
    user.require(&[Role::Admin])?;
    let dto: TaskCategoryUpdateDto = json(req).await?;
    let updated = task_category_service::update(&state.db, user.roles(), id, dto).await?;
    Ok(hal::respond(StatusCode::ACCEPTED, to_hal(&hal, &updated)?))
}

pub async fn partial_update(State(state): State<ServerState>, user: CurrentUser, hal: Hal, Path(id): Path<i64>, req: Request) -> Result<Response, JsonApiError> {
    user.require(&[Role::Admin])?;
    let dto: TaskCategoryPatchDto = json(req).await?;
    let updated = task_category_service::partial_update(&state.db, user.roles(), id, dto).await?;
    Ok(hal::respond(StatusCode::ACCEPTED, to_hal(&hal, &updated)?))
}

pub async fn remove(State(state): State<ServerState>, user: CurrentUser, Path(id): Path<i64>) -> Result<StatusCode, JsonApiError> {
    user.require(&[Role::Admin])?;
    task_category_service::delete(&state.db, user.roles(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn events(State(state): State<ServerState>, user: CurrentUser, hal: Hal, Query(params): Query<EventParams>) -> Result<Response, JsonApiError> {
    events_for(&state, &user, &hal, params, SourceType::TaskCategory, "/api/v1/task-categories/events").await
}
