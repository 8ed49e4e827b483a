//! Bearer-token authentication, role extraction and the per-request auditor.

use std::sync::Arc;

use axum::async_trait;
use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::http::{header, Method};
use axum::middleware::Next;
use axum::response::Response;
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use service::permission::Role;
use service::search::SearchRepository;
use tracing::{debug, warn};

use crate::errors::JsonApiError;

pub const AUTH_COOKIE: &str = "auth_token";

#[derive(Clone)]
pub struct ServerAuthConfig {
    pub jwt_secret: String,
    pub leeway_secs: u64,
}

#[derive(Clone)]
pub struct ServerState {
    pub db: DatabaseConnection,
    pub auth: ServerAuthConfig,
    pub search: Arc<dyn SearchRepository>,
}

#[derive(Debug, Default, Deserialize)]
struct RealmAccess {
    #[serde(default)]
    roles: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct Claims {
    sub: Option<String>,
    preferred_username: Option<String>,
    #[serde(default)]
    roles: Vec<String>,
    #[serde(default)]
    realm_access: RealmAccess,
}

/// The authenticated caller, available to handlers as an extractor.
#[derive(Clone, Debug)]
pub struct CurrentUser {
    pub username: String,
    pub roles: Vec<Role>,
}

impl CurrentUser {
    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    pub fn has_any(&self, allowed: &[Role]) -> bool {
        self.roles.iter().any(|r| allowed.contains(r))
    }

    /// 403 unless the caller holds one of `allowed`.
    pub fn require(&self, allowed: &[Role]) -> Result<(), JsonApiError> {
        if self.has_any(allowed) {
            Ok(())
        } else {
            Err(JsonApiError::forbidden("insufficient role"))
        }
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = JsonApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(|| JsonApiError::unauthorized("not authenticated"))
    }
}

fn is_public(path: &str, method: &Method) -> bool {
    path == "/health"
        || path == "/metrics"
        || path.starts_with("/docs")
        || path.starts_with("/api-docs")
        || method == Method::OPTIONS
}

fn bearer_or_cookie(req: &Request) -> Result<String, JsonApiError> {
    if let Some(h) = req.headers().get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        return h
            .strip_prefix("Bearer ")
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| JsonApiError::unauthorized("expected a Bearer token"));
    }
    CookieJar::from_headers(req.headers())
        .get(AUTH_COOKIE)
        .map(|c| c.value().trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| JsonApiError::unauthorized("missing Authorization header and auth_token cookie"))
}

pub fn decode_user(token: &str, cfg: &ServerAuthConfig) -> Result<CurrentUser, JsonApiError> {
    let key = DecodingKey::from_secret(cfg.jwt_secret.as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.leeway = cfg.leeway_secs;
    validation.required_spec_claims.clear();
    let data = decode::<Claims>(token, &key, &validation).map_err(|e| {
        warn!(err = %e, "token validation failed");
        JsonApiError::unauthorized("invalid token")
    })?;
    let claims = data.claims;
    let mut roles: Vec<Role> = claims
        .roles
        .iter()
        .chain(claims.realm_access.roles.iter())
        .filter_map(|r| Role::from_claim(r))
        .collect();
    roles.sort_by_key(|r| r.sid());
    roles.dedup();
    let username = claims
        .preferred_username
        .or(claims.sub)
        .unwrap_or_else(|| models::audit::SYSTEM_AUDITOR.to_string());
    Ok(CurrentUser { username, roles })
}

/// Global middleware: everything except the whitelist needs a valid token,
/// and `/api/v1` additionally needs one of the known roles. The request then
/// runs with the caller as auditor.
pub async fn require_bearer_token_state(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, JsonApiError> {
    if is_public(req.uri().path(), req.method()) {
        return Ok(next.run(req).await);
    }
    let token = bearer_or_cookie(&req)?;
    let user = decode_user(&token, &state.auth)?;
    if req.uri().path().starts_with("/api/v1") && user.roles.is_empty() {
        warn!(user = %user.username, "no known role in token");
        return Err(JsonApiError::forbidden("no role granted"));
    }
    debug!(user = %user.username, roles = ?user.roles, "authenticated");
    let auditor = user.username.clone();
    req.extensions_mut().insert(user);
    Ok(models::audit::with_auditor(auditor, next.run(req)).await)
}
