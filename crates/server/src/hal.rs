//! HAL+JSON assembly: `_links`, `_embedded`, page metadata and facets.

use std::convert::Infallible;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::{json, Map, Value};
use service::pagination::Page;
use service::search::Facet;

use crate::errors::JsonApiError;

const FALLBACK_BASE: &str = "http://localhost";

#[derive(Default)]
pub struct Links(Vec<(&'static str, String)>);

impl Links {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(mut self, rel: &'static str, href: String) -> Self {
        self.0.push((rel, href));
        self
    }

    pub fn add_if(self, cond: bool, rel: &'static str, href: impl FnOnce() -> String) -> Self {
        if cond {
            self.add(rel, href())
        } else {
            self
        }
    }

    fn to_value(&self) -> Value {
        let map: Map<String, Value> = self.0.iter().map(|(rel, href)| (rel.to_string(), json!({ "href": href }))).collect();
        Value::Object(map)
    }
}

/// Query parameters carried over into page links.
#[derive(Clone, Debug, Default)]
pub struct PageParams {
    pub filter: Option<String>,
    pub q: Option<String>,
    pub sort: Vec<String>,
}

/// Absolute link builder for the current request.
#[derive(Clone, Debug)]
pub struct Hal {
    base: String,
}

impl Hal {
    pub fn new(base: impl Into<String>) -> Self {
        Self { base: base.into().trim_end_matches('/').to_string() }
    }

    /// Base URL from `X-Forwarded-Proto` and `Host`.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let get = |name: &str| headers.get(name).and_then(|v| v.to_str().ok()).map(str::trim).filter(|v| !v.is_empty());
        match get(header::HOST.as_str()) {
            Some(host) => Self::new(format!("{}://{}", get("x-forwarded-proto").unwrap_or("http"), host)),
            None => Self::new(FALLBACK_BASE),
        }
    }

    pub fn href(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub fn entity<T: Serialize>(&self, dto: &T, links: Links) -> Result<Value, JsonApiError> {
        let mut value = serde_json::to_value(dto).map_err(|e| JsonApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Serialization Error", Some(e.to_string())))?;
        if let Value::Object(map) = &mut value {
            map.insert("_links".into(), links.to_value());
        }
        Ok(value)
    }

    pub fn collection(&self, rel: &str, items: Vec<Value>, links: Links) -> Value {
        json!({
            "_embedded": { rel: items },
            "_links": links.to_value(),
        })
    }

    pub fn page(&self, rel: &str, page: Page<Value>, path: &str, params: &PageParams) -> Value {
        let link = |n: u64| self.href(&format!("{path}?{}", query_string(n, page.size, params)));
        let last = page.total_pages.saturating_sub(1);
        let links = Links::new()
            .add_if(page.total_pages > 0, "first", || link(0))
            .add_if(page.has_prev(), "prev", || link(page.number - 1))
            .add("self", link(page.number))
            .add_if(page.has_next(), "next", || link(page.number + 1))
            .add_if(page.total_pages > 0, "last", || link(last));
        json!({
            "_embedded": { rel: page.content },
            "_links": links.to_value(),
            "page": {
                "size": page.size,
                "totalElements": page.total_elements,
                "totalPages": page.total_pages,
                "number": page.number,
            },
        })
    }

    pub fn facets(mut body: Value, facets: &[Facet]) -> Value {
        if let Value::Object(map) = &mut body {
            map.insert("_facets".into(), json!(facets));
        }
        body
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Hal {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Hal::from_headers(&parts.headers))
    }
}

fn query_string(page: u64, size: u64, params: &PageParams) -> String {
    let mut pairs = vec![("page", page.to_string()), ("size", size.to_string())];
    pairs.extend(params.sort.iter().map(|s| ("sort", s.clone())));
    if let Some(f) = params.filter.as_deref().filter(|f| !f.is_empty()) {
        pairs.push(("filter", f.to_string()));
    }
    if let Some(q) = params.q.as_deref().filter(|q| !q.is_empty()) {
        pairs.push(("q", q.to_string()));
    }
    serde_urlencoded::to_string(&pairs).unwrap_or_default()
}

/// `application/hal+json` response with the given status.
pub fn respond(status: StatusCode, body: Value) -> Response {
    let mut res = (status, axum::Json(body)).into_response();
    res.headers_mut().insert(header::CONTENT_TYPE, HeaderValue::from_static(common::media::HAL_JSON));
    res
}

/// 201 with `Location` pointing at the new resource.
pub fn created(location: String, body: Value) -> Response {
    let mut res = respond(StatusCode::CREATED, body);
    if let Ok(v) = HeaderValue::from_str(&location) {
        res.headers_mut().insert(header::LOCATION, v);
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(number: u64, total: u64) -> Page<Value> {
        Page { content: vec![json!({"id": 1})], number, size: 1, total_elements: total, total_pages: total }
    }

    #[test]
    fn base_url_from_forwarded_headers() {
        let mut h = HeaderMap::new();
        assert_eq!(Hal::from_headers(&h).href("/x"), "http://localhost/x");
        h.insert(header::HOST, HeaderValue::from_static("register.example.org"));
        h.insert("x-forwarded-proto", HeaderValue::from_static("https"));
        assert_eq!(Hal::from_headers(&h).href("/api/v1/tags"), "https://register.example.org/api/v1/tags");
    }

    #[test]
    fn page_links_keep_filter_and_sort() {
        let hal = Hal::new("http://h");
        let params = PageParams { filter: Some("name:Kal*".into()), q: None, sort: vec!["name,desc".into()] };
        let body = hal.page("tags", page(1, 3), "/api/v1/tags", &params);
        let links = &body["_links"];
        assert_eq!(links["next"]["href"], "http://h/api/v1/tags?page=2&size=1&sort=name%2Cdesc&filter=name%3AKal*");
        assert_eq!(links["prev"]["href"], "http://h/api/v1/tags?page=0&size=1&sort=name%2Cdesc&filter=name%3AKal*");
        assert_eq!(body["page"]["totalElements"], 3);
        assert_eq!(body["_embedded"]["tags"][0]["id"], 1);
    }

    #[test]
    fn search_terms_are_form_encoded() {
        let params = PageParams { filter: None, q: Some("kalle & anka".into()), sort: Vec::new() };
        let body = Hal::new("http://h").page("spexare", page(0, 2), "/s", &params);
        assert_eq!(body["_links"]["next"]["href"], "http://h/s?page=1&size=1&q=kalle+%26+anka");
    }

    #[test]
    fn single_page_has_no_prev_or_next() {
        let body = Hal::new("http://h").page("tags", page(0, 1), "/t", &PageParams::default());
        assert!(body["_links"].get("prev").is_none());
        assert!(body["_links"].get("next").is_none());
        assert_eq!(body["_links"]["last"]["href"], "http://h/t?page=0&size=1");
    }
}
