use axum::{
    extract::{DefaultBodyLimit, FromRequest, Request},
    http::{header, HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::de::DeserializeOwned;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use common::media::APPLICATION_XLSX;
use common::types::Health;
use models::event::SourceType;
use service::dto::ImportResultDto;
use service::impex::{self, Resource};
use service::permission::Role;
use service::services::event_service::{self, DEFAULT_SINCE_IN_DAYS};

use crate::auth::{self, CurrentUser, ServerState};
use crate::errors::JsonApiError;
use crate::extract::{self, EventParams};
use crate::hal::{self, Hal, Links};
use crate::metrics;
use crate::openapi::ApiDoc;

pub mod activities;
pub mod events;
pub mod profile;
pub mod settings;
pub mod spex;
pub mod spex_categories;
pub mod spexare;
pub mod tags;
pub mod task_categories;
pub mod tasks;

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "OK")))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

pub async fn metrics_handler() -> (StatusCode, String) {
    metrics::encode_metrics()
}

/// Build the full application router: public endpoints, docs and the `/api/v1` resources.
pub fn build_router(state: ServerState, cors: CorsLayer, max_upload_bytes: usize) -> Router {
    let api = Router::new()
        .merge(spexare::router())
        .merge(activities::router())
        .merge(profile::router())
        .merge(spex::router())
        .merge(spex_categories::router())
        .merge(tasks::router())
        .merge(task_categories::router())
        .merge(tags::router())
        .merge(events::router())
        .merge(settings::router());

    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics_handler))
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(api)
        .layer(middleware::from_fn_with_state(state.clone(), auth::require_bearer_token_state))
        .with_state(state)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(middleware::from_fn(metrics::track))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}

/// Workbook download with an attachment disposition.
pub(crate) fn spreadsheet(resource: Resource, bytes: Vec<u8>) -> Response {
    let mut res = (StatusCode::OK, bytes).into_response();
    let headers = res.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(APPLICATION_XLSX));
    if let Ok(v) = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", resource.file_name())) {
        headers.insert(header::CONTENT_DISPOSITION, v);
    }
    res
}

/// Export `resource` when `Accept` names a spreadsheet type.
pub(crate) async fn export_if_requested(
    state: &ServerState,
    user: &CurrentUser,
    headers: &axum::http::HeaderMap,
    params: &extract::ListParams,
    resource: Resource,
) -> Result<Option<Response>, JsonApiError> {
    let Some(media) = extract::export_type(headers) else { return Ok(None) };
    impex::check_export_type(media)?;
    let bytes = impex::export(&state.db, user.roles(), resource, &params.ids()?).await?;
    Ok(Some(spreadsheet(resource, bytes)))
}

/// A JSON body, or a spreadsheet import when the body is one.
pub(crate) enum Body<T> {
    Json(T),
    Import(ImportResultDto),
}

pub(crate) async fn json_or_import<T: DeserializeOwned>(state: &ServerState, resource: Resource, req: Request) -> Result<Body<T>, JsonApiError> {
    let content_type = extract::content_type(req.headers()).unwrap_or_default();
    if resource.importable() && impex::is_spreadsheet(&content_type) {
        let upload = extract::upload(req).await?;
        let result = impex::import(&state.db, resource, &content_type, upload.bytes).await?;
        return Ok(Body::Import(result));
    }
    let Json(dto) = Json::<T>::from_request(req, &()).await.map_err(|e| JsonApiError::bad_request(e.body_text()))?;
    Ok(Body::Json(dto))
}

pub(crate) fn import_response(result: ImportResultDto) -> Response {
    let status = if result.success { StatusCode::OK } else { StatusCode::BAD_REQUEST };
    (status, Json(result)).into_response()
}

pub(crate) async fn json<T: DeserializeOwned>(req: Request) -> Result<T, JsonApiError> {
    let Json(dto) = Json::<T>::from_request(req, &()).await.map_err(|e| JsonApiError::bad_request(e.body_text()))?;
    Ok(dto)
}

/// Binary attachment (image, poster, logo) or 404.
pub(crate) fn binary(found: Option<(Vec<u8>, String)>, what: &str) -> Result<Response, JsonApiError> {
    let (bytes, content_type) = found.ok_or_else(|| JsonApiError::new(StatusCode::NOT_FOUND, "Not Found", Some(format!("no {what}"))))?;
    let mut res = (StatusCode::OK, bytes).into_response();
    if let Ok(v) = HeaderValue::from_str(&content_type) {
        res.headers_mut().insert(header::CONTENT_TYPE, v);
    }
    Ok(res)
}

pub(crate) fn not_found(what: &str, id: impl std::fmt::Display) -> JsonApiError {
    JsonApiError::new(StatusCode::NOT_FOUND, "Not Found", Some(format!("{what} {id} not found")))
}

/// Resource-scoped event listing, admin only.
pub(crate) async fn events_for(
    state: &ServerState,
    user: &CurrentUser,
    hal: &Hal,
    params: EventParams,
    source: SourceType,
    self_path: &str,
) -> Result<Response, JsonApiError> {
    user.require(&[Role::Admin])?;
    let days = params.since_in_days.unwrap_or(DEFAULT_SINCE_IN_DAYS);
    let events = event_service::find_since(&state.db, days, Some(source)).await?;
    let items = events
        .iter()
        .map(|e| hal.entity(e, Links::new().add("self", hal.href(&format!("/api/v1/events/{}", e.id)))))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(hal::respond(StatusCode::OK, hal.collection("events", items, Links::new().add("self", hal.href(self_path)))))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body as HttpBody};
    use axum::http::{Method, Request as HttpRequest};
    use sea_orm::DatabaseConnection;
    use service::search::SeaOrmSearchRepository;
    use tower::ServiceExt;

    use super::*;
    use crate::auth::ServerAuthConfig;

    fn app() -> Router {
        let db = DatabaseConnection::Disconnected;
        let state = ServerState {
            search: Arc::new(SeaOrmSearchRepository { db: db.clone() }),
            db,
            auth: ServerAuthConfig { jwt_secret: "secret".into(), leeway_secs: 0 },
        };
        build_router(state, CorsLayer::very_permissive(), 1024)
    }

    #[tokio::test]
    async fn health_is_public() {
        let res = app().oneshot(HttpRequest::get("/health").body(HttpBody::empty()).unwrap()).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], br#"{"status":"ok"}"#);
    }

    #[tokio::test]
    async fn api_requires_a_token() {
        let res = app().oneshot(HttpRequest::get("/api/v1/tags").body(HttpBody::empty()).unwrap()).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn preflight_passes_without_token() {
        let req = HttpRequest::builder()
            .method(Method::OPTIONS)
            .uri("/api/v1/tags")
            .header(header::ORIGIN, "http://localhost:3000")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(HttpBody::empty())
            .unwrap();
        let res = app().oneshot(req).await.unwrap();
        assert!(res.status().is_success());
    }
}
