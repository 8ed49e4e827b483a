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
use service::services::task_service::{self, TaskCreateDto, TaskDto, TaskPatchDto, TaskUpdateDto};

use crate::auth::{CurrentUser, ServerState};
use crate::errors::JsonApiError;
use crate::extract::{EventParams, ListParams};
use crate::hal::{self, Hal, Links};
use crate::routes::{events_for, export_if_requested, import_response, json, json_or_import, not_found, task_categories, Body};

const BASE: &str = "/api/v1/tasks";

pub fn router() -> Router<ServerState> {
    Router::new()
        .route(BASE, get(list).post(create))
        .route("/api/v1/tasks/events", get(events))
        .route("/api/v1/tasks/:id", get(find).put(update).patch(partial_update).delete(remove))
        .route("/api/v1/tasks/:id/category", get(category).delete(remove_category))
        .route("/api/v1/tasks/:id/category/:category_id", put(set_category))
}

pub(crate) fn links(hal: &Hal, t: &TaskDto) -> Links {
    let me = format!("{BASE}/{}", t.id);
    Links::new()
        .add("self", hal.href(&me))
        .add("tasks", hal.href(BASE))
        .add_if(t.category_id.is_some(), "category", || hal.href(&format!("{me}/category")))
}

fn to_hal(hal: &Hal, t: &TaskDto) -> Result<serde_json::Value, JsonApiError> {
    hal.entity(t, links(hal, t))
}

#[utoipa::path(get, path = "/api/v1/tasks", tag = "tasks", responses((status = 200, description = "Page of tasks or a spreadsheet")))]
pub async fn list(
    State(state): State<ServerState>,
    user: CurrentUser,
    hal: Hal,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> Result<Response, JsonApiError> {
    if let Some(res) = export_if_requested(&state, &user, &headers, &params, Resource::Task).await? {
        return Ok(res);
    }
    let page = task_service::find_all(&state.db, user.roles(), params.filter(), &params.page_request()?).await?;
    let page = page.try_map(|t| to_hal(&hal, &t))?;
    Ok(hal::respond(StatusCode::OK, hal.page("tasks", page, BASE, &params.link_params())))
}

#[utoipa::path(post, path = "/api/v1/tasks", tag = "tasks", responses((status = 201, description = "Created"), (status = 200, description = "Imported")))]
pub async fn create(State(state): State<ServerState>, user: CurrentUser, hal: Hal, req: Request) -> Result<Response, JsonApiError> {
    user.require(&[Role::Admin])?;
    match json_or_import::<TaskCreateDto>(&state, Resource::Task, req).await? {
        Body::Import(result) => Ok(import_response(result)),
        Body::Json(dto) => {
            let created = task_service::create(&state.db, dto).await?;
            Ok(hal::created(hal.href(&format!("{BASE}/{}", created.id)), to_hal(&hal, &created)?))
        }
    }
}

pub async fn find(State(state): State<ServerState>, user: CurrentUser, hal: Hal, Path(id): Path<i64>) -> Result<Response, JsonApiError> {
    let found = task_service::find_by_id(&state.db, user.roles(), id).await?.ok_or_else(|| not_found("task", id))?;
    Ok(hal::respond(StatusCode::OK, to_hal(&hal, &found)?))
}

pub async fn update(State(state): State<ServerState>, user: CurrentUser, hal: Hal, Path(id): Path<i64>, req: Request) -> Result<Response, JsonApiError> {
    user.require(&[Role::Admin, Role::Editor])?;
    let dto: TaskUpdateDto = json(req).await?;
    let updated = task_service::update(&state.db, user.roles(), id, dto).await?;
    Ok(hal::respond(StatusCode::ACCEPTED, to_hal(&hal, &updated)?))
}

pub async fn partial_update(State(state): State<ServerState>, user: CurrentUser, hal: Hal, Path(id): Path<i64>, req: Request) -> Result<Response, JsonApiError> {
    user.require(&[Role::Admin, Role::Editor])?;
    let dto: TaskPatchDto = json(req).await?;
    let updated = task_service::partial_update(&state.db, user.roles(), id, dto).await?;
    Ok(hal::respond(StatusCode::ACCEPTED, to_hal(&hal, &updated)?))
}

pub async fn remove(State(state): State<ServerState>, user: CurrentUser, Path(id): Path<i64>) -> Result<StatusCode, JsonApiError> {
    user.require(&[Role::Admin])?;
    task_service::delete(&state.db, user.roles(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn category(State(state): State<ServerState>, user: CurrentUser, hal: Hal, Path(id): Path<i64>) -> Result<Response, JsonApiError> {
    let found = task_service::find_category(&state.db, user.roles(), id).await?.ok_or_else(|| not_found("category of task", id))?;
    Ok(hal::respond(StatusCode::OK, hal.entity(&found, task_categories::links(&hal, &found))?))
}

pub async fn set_category(
    State(state): State<ServerState>,
    user: CurrentUser,
    hal: Hal,
    Path((id, category_id)): Path<(i64, i64)>,
) -> Result<Response, JsonApiError> {
    user.require(&[Role::Admin])?;
    let updated = task_service::set_category(&state.db, user.roles(), id, category_id).await?;
    Ok(hal::respond(StatusCode::ACCEPTED, to_hal(&hal, &updated)?))
}

pub async fn remove_category(State(state): State<ServerState>, user: CurrentUser, Path(id): Path<i64>) -> Result<StatusCode, JsonApiError> {
    user.require(&[Role::Admin])?;
    task_service::remove_category(&state.db, user.roles(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn events(State(state): State<ServerState>, user: CurrentUser, hal: Hal, Query(params): Query<EventParams>) -> Result<Response, JsonApiError> {
    events_for(&state, &user, &hal, params, SourceType::Task, "/api/v1/tasks/events").await
}
