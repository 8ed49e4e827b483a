use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Response,
    routing::get,
    Router,
};
use axum_extra::extract::Query;
use models::event::SourceType;
use service::permission::Role;
use service::services::event_service::{self, EventDto, DEFAULT_SINCE_IN_DAYS};

use crate::auth::{CurrentUser, ServerState};
use crate::errors::JsonApiError;
use crate::extract::EventParams;
use crate::hal::{self, Hal, Links};
use crate::routes::not_found;

const BASE: &str = "/api/v1/events";

pub fn router() -> Router<ServerState> {
    Router::new().route(BASE, get(list)).route("/api/v1/events/:id", get(find))
}

fn to_hal(hal: &Hal, e: &EventDto) -> Result<serde_json::Value, JsonApiError> {
    hal.entity(e, Links::new().add("self", hal.href(&format!("{BASE}/{}", e.id))).add("events", hal.href(BASE)))
}

#[utoipa::path(
    get,
    path = "/api/v1/events",
    tag = "events",
    params(("sinceInDays" = Option<u32>, Query, description = "Days back from the start of today"), ("source" = Option<String>, Query, description = "Event source")),
    responses((status = 200, description = "Events, newest first"), (status = 403, description = "Forbidden"))
)]
pub async fn list(State(state): State<ServerState>, user: CurrentUser, hal: Hal, Query(params): Query<EventParams>) -> Result<Response, JsonApiError> {
    user.require(&[Role::Admin])?;
    let source = params
        .source
        .as_deref()
        .map(|s| s.parse::<SourceType>().map_err(JsonApiError::bad_request))
        .transpose()?;
    let days = params.since_in_days.unwrap_or(DEFAULT_SINCE_IN_DAYS);
    let events = event_service::find_since(&state.db, days, source).await?;
    let items = events.iter().map(|e| to_hal(&hal, e)).collect::<Result<Vec<_>, _>>()?;
    Ok(hal::respond(StatusCode::OK, hal.collection("events", items, Links::new().add("self", hal.href(BASE)))))
}

pub async fn find(State(state): State<ServerState>, user: CurrentUser, hal: Hal, Path(id): Path<i64>) -> Result<Response, JsonApiError> {
    user.require(&[Role::Admin])?;
    let found = event_service::find_by_id(&state.db, id).await?.ok_or_else(|| not_found("event", id))?;
    Ok(hal::respond(StatusCode::OK, to_hal(&hal, &found)?))
}
