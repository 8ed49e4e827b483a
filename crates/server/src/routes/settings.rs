use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::Response,
    routing::get,
    Router,
};
use models::types::TypeType;
use sea_orm::ActiveEnum;
use service::services::type_service::{self, TypeDto};

use crate::auth::{CurrentUser, ServerState};
use crate::errors::JsonApiError;
use crate::extract;
use crate::hal::{self, Hal, Links};
use crate::routes::not_found;

const BASE: &str = "/api/v1/settings/types";

pub fn router() -> Router<ServerState> {
    Router::new()
        .route(BASE, get(list))
        .route("/api/v1/settings/types/:kind", get(by_type))
        .route("/api/v1/settings/types/:kind/:id", get(find))
}

fn to_hal(hal: &Hal, t: &TypeDto) -> Result<serde_json::Value, JsonApiError> {
    let kind = t.kind.to_value();
    hal.entity(t, Links::new().add("self", hal.href(&format!("{BASE}/{kind}/{}", t.id))).add("types", hal.href(BASE)))
}

fn parse_kind(raw: &str) -> Result<TypeType, JsonApiError> {
    raw.parse::<TypeType>().map_err(|_| not_found("type", raw))
}

fn collection(hal: &Hal, types: &[TypeDto], self_path: &str) -> Result<Response, JsonApiError> {
    let items = types.iter().map(|t| to_hal(hal, t)).collect::<Result<Vec<_>, _>>()?;
    Ok(hal::respond(StatusCode::OK, hal.collection("types", items, Links::new().add("self", hal.href(self_path)))))
}

#[utoipa::path(get, path = "/api/v1/settings/types", tag = "settings", responses((status = 200, description = "All types with labels in the requested language")))]
pub async fn list(State(state): State<ServerState>, _user: CurrentUser, hal: Hal, headers: HeaderMap) -> Result<Response, JsonApiError> {
    let types = type_service::find_all(&state.db, &extract::language(&headers)).await?;
    collection(&hal, &types, BASE)
}

pub async fn by_type(
    State(state): State<ServerState>,
    _user: CurrentUser,
    hal: Hal,
    headers: HeaderMap,
    Path(kind): Path<String>,
) -> Result<Response, JsonApiError> {
    let parsed = parse_kind(&kind)?;
    let types = type_service::find_by_type(&state.db, parsed, &extract::language(&headers)).await?;
    collection(&hal, &types, &format!("{BASE}/{kind}"))
}

pub async fn find(
    State(state): State<ServerState>,
    _user: CurrentUser,
    hal: Hal,
    headers: HeaderMap,
    Path((kind, id)): Path<(String, String)>,
) -> Result<Response, JsonApiError> {
    let parsed = parse_kind(&kind)?;
    let found = type_service::find_by_id_and_type(&state.db, &id, parsed, &extract::language(&headers))
        .await?
        .ok_or_else(|| not_found("type", &id))?;
    Ok(hal::respond(StatusCode::OK, to_hal(&hal, &found)?))
}
