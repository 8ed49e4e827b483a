//! Activities of a spexare and their spex, task and actor children.

use axum::{
    extract::{Path, Request, State},
    http::StatusCode,
    response::Response,
    routing::{get, put},
    Router,
};
use axum_extra::extract::Query;
use serde_json::Value;
use service::pagination::Page;
use service::services::{
    activity_service::{self, ActivityDto},
    actor_service::{self, ActorCreateDto, ActorDto, ActorPatchDto, ActorUpdateDto},
    spex_activity_service::{self, SpexActivityDto},
    task_activity_service::{self, TaskActivityDto},
};

use crate::auth::{CurrentUser, ServerState};
use crate::errors::JsonApiError;
use crate::extract::ListParams;
use crate::hal::{self, Hal, Links};
use crate::routes::{json, not_found};

pub fn router() -> Router<ServerState> {
    const ACTIVITIES: &str = "/api/v1/spexare/:id/activities";
    const SPEX: &str = "/api/v1/spexare/:id/activities/:aid/spex-activities";
    const TASK: &str = "/api/v1/spexare/:id/activities/:aid/task-activities";
    Router::new()
        .route(ACTIVITIES, get(list_activities).post(create_activity))
        .route(&format!("{ACTIVITIES}/:aid"), get(find_activity).delete(delete_activity))
        .route(SPEX, get(list_spex_activities))
        .route(&format!("{SPEX}/:said"), get(find_spex_activity).post(create_spex_activity).delete(delete_spex_activity))
        .route(&format!("{SPEX}/:said/spex"), get(spex_of_activity))
        .route(&format!("{SPEX}/:said/:spex_id"), put(update_spex_activity))
        .route(TASK, get(list_task_activities))
        .route(&format!("{TASK}/:taid"), get(find_task_activity).post(create_task_activity).delete(delete_task_activity))
        .route(&format!("{TASK}/:taid/task"), get(task_of_activity))
        .route(&format!("{TASK}/:taid/:task_id"), put(update_task_activity))
        .route(&format!("{TASK}/:taid/actors"), get(list_actors))
        .route(&format!("{TASK}/:taid/actors/:key"), get(find_actor).post(create_actor))
        .route(&format!("{TASK}/:taid/actors/:key/:actor_id"), put(update_actor).patch(partial_update_actor).delete(delete_actor))
}

fn activity_path(sid: i64, aid: i64) -> String {
    format!("/api/v1/spexare/{sid}/activities/{aid}")
}

fn activity_links(hal: &Hal, sid: i64, a: &ActivityDto) -> Links {
    let me = activity_path(sid, a.id);
    Links::new()
        .add("self", hal.href(&me))
        .add("spexare", hal.href(&format!("/api/v1/spexare/{sid}")))
        .add("spex-activities", hal.href(&format!("{me}/spex-activities")))
        .add("task-activities", hal.href(&format!("{me}/task-activities")))
}

fn spex_activity_links(hal: &Hal, sid: i64, aid: i64, sa: &SpexActivityDto) -> Links {
    let me = format!("{}/spex-activities/{}", activity_path(sid, aid), sa.id);
    Links::new()
        .add("self", hal.href(&me))
        .add("activity", hal.href(&activity_path(sid, aid)))
        .add("spex", hal.href(&format!("{me}/spex")))
}

fn task_activity_links(hal: &Hal, sid: i64, aid: i64, ta: &TaskActivityDto) -> Links {
    let me = format!("{}/task-activities/{}", activity_path(sid, aid), ta.id);
    Links::new()
        .add("self", hal.href(&me))
        .add("activity", hal.href(&activity_path(sid, aid)))
        .add("task", hal.href(&format!("{me}/task")))
        .add("actors", hal.href(&format!("{me}/actors")))
}

fn actor_links(hal: &Hal, sid: i64, aid: i64, taid: i64, a: &ActorDto) -> Links {
    let parent = format!("{}/task-activities/{taid}", activity_path(sid, aid));
    Links::new()
        .add("self", hal.href(&format!("{parent}/actors/{}", a.id)))
        .add("task-activity", hal.href(&parent))
        .add("vocal", hal.href(&format!("/api/v1/settings/types/VOCAL/{}", a.vocal_id)))
}

pub(crate) fn paged<T>(
    hal: &Hal,
    rel: &str,
    page: Page<T>,
    path: &str,
    params: &ListParams,
    to: impl Fn(&T) -> Result<Value, JsonApiError>,
) -> Result<Response, JsonApiError> {
    let page = page.try_map(|t| to(&t))?;
    Ok(hal::respond(StatusCode::OK, hal.page(rel, page, path, &params.link_params())))
}

pub async fn list_activities(
    State(state): State<ServerState>,
    _user: CurrentUser,
    hal: Hal,
    Path(sid): Path<i64>,
    Query(params): Query<ListParams>,
) -> Result<Response, JsonApiError> {
    let page = activity_service::find_by_spexare(&state.db, sid, params.filter(), &params.page_request()?).await?;
    let path = format!("/api/v1/spexare/{sid}/activities");
    paged(&hal, "activities", page, &path, &params, |a| hal.entity(a, activity_links(&hal, sid, a)))
}

pub async fn find_activity(State(state): State<ServerState>, _user: CurrentUser, hal: Hal, Path((sid, id)): Path<(i64, i64)>) -> Result<Response, JsonApiError> {
    let found = activity_service::find_by_id(&state.db, sid, id).await?.ok_or_else(|| not_found("activity", id))?;
    Ok(hal::respond(StatusCode::OK, hal.entity(&found, activity_links(&hal, sid, &found))?))
}

pub async fn create_activity(State(state): State<ServerState>, _user: CurrentUser, hal: Hal, Path(sid): Path<i64>) -> Result<Response, JsonApiError> {
    let created = activity_service::create(&state.db, sid).await?;
    let body = hal.entity(&created, activity_links(&hal, sid, &created))?;
    Ok(hal::created(hal.href(&activity_path(sid, created.id)), body))
}

pub async fn delete_activity(State(state): State<ServerState>, _user: CurrentUser, Path((sid, id)): Path<(i64, i64)>) -> Result<StatusCode, JsonApiError> {
    activity_service::delete(&state.db, sid, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_spex_activities(
    State(state): State<ServerState>,
    _user: CurrentUser,
    hal: Hal,
    Path((sid, aid)): Path<(i64, i64)>,
    Query(params): Query<ListParams>,
) -> Result<Response, JsonApiError> {
    let page = spex_activity_service::find_by_activity(&state.db, sid, aid, params.filter(), &params.page_request()?).await?;
    let path = format!("{}/spex-activities", activity_path(sid, aid));
    paged(&hal, "spex-activities", page, &path, &params, |sa| hal.entity(sa, spex_activity_links(&hal, sid, aid, sa)))
}

pub async fn find_spex_activity(
    State(state): State<ServerState>,
    _user: CurrentUser,
    hal: Hal,
    Path((sid, aid, id)): Path<(i64, i64, i64)>,
) -> Result<Response, JsonApiError> {
    let found = spex_activity_service::find_by_id(&state.db, sid, aid, id).await?.ok_or_else(|| not_found("spex activity", id))?;
    Ok(hal::respond(StatusCode::OK, hal.entity(&found, spex_activity_links(&hal, sid, aid, &found))?))
}

/// `POST …/spex-activities/{spexId}`
pub async fn create_spex_activity(
    State(state): State<ServerState>,
    _user: CurrentUser,
    hal: Hal,
    Path((sid, aid, spex_id)): Path<(i64, i64, i64)>,
) -> Result<Response, JsonApiError> {
    let created = spex_activity_service::create(&state.db, sid, aid, spex_id).await?;
    let body = hal.entity(&created, spex_activity_links(&hal, sid, aid, &created))?;
    Ok(hal::created(hal.href(&format!("{}/spex-activities/{}", activity_path(sid, aid), created.id)), body))
}

pub async fn update_spex_activity(
    State(state): State<ServerState>,
    _user: CurrentUser,
    hal: Hal,
    Path((sid, aid, id, spex_id)): Path<(i64, i64, i64, i64)>,
) -> Result<Response, JsonApiError> {
    let updated = spex_activity_service::update(&state.db, sid, aid, id, spex_id).await?;
    Ok(hal::respond(StatusCode::ACCEPTED, hal.entity(&updated, spex_activity_links(&hal, sid, aid, &updated))?))
}

pub async fn delete_spex_activity(
    State(state): State<ServerState>,
    _user: CurrentUser,
    Path((sid, aid, id)): Path<(i64, i64, i64)>,
) -> Result<StatusCode, JsonApiError> {
    spex_activity_service::delete(&state.db, sid, aid, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn spex_of_activity(
    State(state): State<ServerState>,
    user: CurrentUser,
    hal: Hal,
    Path((sid, aid, id)): Path<(i64, i64, i64)>,
) -> Result<Response, JsonApiError> {
    let spex = spex_activity_service::find_spex(&state.db, user.roles(), sid, aid, id).await?.ok_or_else(|| not_found("spex of spex activity", id))?;
    Ok(hal::respond(StatusCode::OK, hal.entity(&spex, super::spex::links(&hal, &spex))?))
}

pub async fn list_task_activities(
    State(state): State<ServerState>,
    _user: CurrentUser,
    hal: Hal,
    Path((sid, aid)): Path<(i64, i64)>,
    Query(params): Query<ListParams>,
) -> Result<Response, JsonApiError> {
    let page = task_activity_service::find_by_activity(&state.db, sid, aid, params.filter(), &params.page_request()?).await?;
    let path = format!("{}/task-activities", activity_path(sid, aid));
    paged(&hal, "task-activities", page, &path, &params, |ta| hal.entity(ta, task_activity_links(&hal, sid, aid, ta)))
}

pub async fn find_task_activity(
    State(state): State<ServerState>,
    _user: CurrentUser,
    hal: Hal,
    Path((sid, aid, id)): Path<(i64, i64, i64)>,
) -> Result<Response, JsonApiError> {
    let found = task_activity_service::find_by_id(&state.db, sid, aid, id).await?.ok_or_else(|| not_found("task activity", id))?;
    Ok(hal::respond(StatusCode::OK, hal.entity(&found, task_activity_links(&hal, sid, aid, &found))?))
}

/// `POST …/task-activities/{taskId}`
pub async fn create_task_activity(
    State(state): State<ServerState>,
    _user: CurrentUser,
    hal: Hal,
    Path((sid, aid, task_id)): Path<(i64, i64, i64)>,
) -> Result<Response, JsonApiError> {
    let created = task_activity_service::create(&state.db, sid, aid, task_id).await?;
    let body = hal.entity(&created, task_activity_links(&hal, sid, aid, &created))?;
    Ok(hal::created(hal.href(&format!("{}/task-activities/{}", activity_path(sid, aid), created.id)), body))
}

pub async fn update_task_activity(
    State(state): State<ServerState>,
    _user: CurrentUser,
    hal: Hal,
    Path((sid, aid, id, task_id)): Path<(i64, i64, i64, i64)>,
) -> Result<Response, JsonApiError> {
    let updated = task_activity_service::update(&state.db, sid, aid, id, task_id).await?;
    Ok(hal::respond(StatusCode::ACCEPTED, hal.entity(&updated, task_activity_links(&hal, sid, aid, &updated))?))
}

pub async fn delete_task_activity(
    State(state): State<ServerState>,
    _user: CurrentUser,
    Path((sid, aid, id)): Path<(i64, i64, i64)>,
) -> Result<StatusCode, JsonApiError> {
    task_activity_service::delete(&state.db, sid, aid, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn task_of_activity(
    State(state): State<ServerState>,
    user: CurrentUser,
    hal: Hal,
    Path((sid, aid, id)): Path<(i64, i64, i64)>,
) -> Result<Response, JsonApiError> {
    let task = task_activity_service::find_task(&state.db, user.roles(), sid, aid, id).await?.ok_or_else(|| not_found("task of task activity", id))?;
    Ok(hal::respond(StatusCode::OK, hal.entity(&task, super::tasks::links(&hal, &task))?))
}

pub async fn list_actors(
    State(state): State<ServerState>,
    _user: CurrentUser,
    hal: Hal,
    Path((sid, aid, taid)): Path<(i64, i64, i64)>,
    Query(params): Query<ListParams>,
) -> Result<Response, JsonApiError> {
    let page = actor_service::find_by_task_activity(&state.db, sid, aid, taid, params.filter(), &params.page_request()?).await?;
    let path = format!("{}/task-activities/{taid}/actors", activity_path(sid, aid));
    paged(&hal, "actors", page, &path, &params, |a| hal.entity(a, actor_links(&hal, sid, aid, taid, a)))
}

/// `GET …/actors/{id}`
pub async fn find_actor(
    State(state): State<ServerState>,
    _user: CurrentUser,
    hal: Hal,
    Path((sid, aid, taid, key)): Path<(i64, i64, i64, String)>,
) -> Result<Response, JsonApiError> {
    let id: i64 = key.parse().map_err(|_| not_found("actor", &key))?;
    let found = actor_service::find_by_id(&state.db, sid, aid, taid, id).await?.ok_or_else(|| not_found("actor", id))?;
    Ok(hal::respond(StatusCode::OK, hal.entity(&found, actor_links(&hal, sid, aid, taid, &found))?))
}

/// `POST …/actors/{vocalId}` with body `{role}`.
pub async fn create_actor(
    State(state): State<ServerState>,
    _user: CurrentUser,
    hal: Hal,
    Path((sid, aid, taid, vocal_id)): Path<(i64, i64, i64, String)>,
    req: Request,
) -> Result<Response, JsonApiError> {
    let dto: ActorCreateDto = json(req).await?;
    let created = actor_service::create(&state.db, sid, aid, taid, &vocal_id, dto).await?;
    let body = hal.entity(&created, actor_links(&hal, sid, aid, taid, &created))?;
    let location = format!("{}/task-activities/{taid}/actors/{}", activity_path(sid, aid), created.id);
    Ok(hal::created(hal.href(&location), body))
}

pub async fn update_actor(
    State(state): State<ServerState>,
    _user: CurrentUser,
    hal: Hal,
    Path((sid, aid, taid, vocal_id, id)): Path<(i64, i64, i64, String, i64)>,
    req: Request,
) -> Result<Response, JsonApiError> {
    let dto: ActorUpdateDto = json(req).await?;
    let updated = actor_service::update(&state.db, sid, aid, taid, &vocal_id, id, dto).await?;
    Ok(hal::respond(StatusCode::ACCEPTED, hal.entity(&updated, actor_links(&hal, sid, aid, taid, &updated))?))
}

pub async fn partial_update_actor(
    State(state): State<ServerState>,
    _user: CurrentUser,
    hal: Hal,
    Path((sid, aid, taid, vocal_id, id)): Path<(i64, i64, i64, String, i64)>,
    req: Request,
) -> Result<Response, JsonApiError> {
    let dto: ActorPatchDto = json(req).await?;
    let updated = actor_service::partial_update(&state.db, sid, aid, taid, &vocal_id, id, dto).await?;
    Ok(hal::respond(StatusCode::ACCEPTED, hal.entity(&updated, actor_links(&hal, sid, aid, taid, &updated))?))
}

pub async fn delete_actor(
    State(state): State<ServerState>,
    _user: CurrentUser,
    Path((sid, aid, taid, vocal_id, id)): Path<(i64, i64, i64, String, i64)>,
) -> Result<StatusCode, JsonApiError> {
    actor_service::delete(&state.db, sid, aid, taid, &vocal_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
