//! Request helpers shared by the resource handlers.

use axum::body::Bytes;
use axum::extract::{FromRequest, Multipart, Request};
use axum::http::{header, HeaderMap};
use common::media::{self, APPLICATION_XLS, APPLICATION_XLSX};
use serde::Deserialize;
use service::pagination::PageRequest;
use service::services::type_service;

use crate::errors::JsonApiError;
use crate::hal::PageParams;

/// `filter`, `q`, paging, repeatable `sort` and export `ids`.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub filter: Option<String>,
    pub q: Option<String>,
    pub page: Option<u64>,
    pub size: Option<u64>,
    #[serde(default)]
    pub sort: Vec<String>,
    pub ids: Option<String>,
}

impl ListParams {
    pub fn page_request(&self) -> Result<PageRequest, JsonApiError> {
        Ok(PageRequest::new(self.page, self.size, &self.sort)?)
    }

    pub fn filter(&self) -> Option<&str> {
        self.filter.as_deref().filter(|f| !f.trim().is_empty())
    }

    pub fn link_params(&self) -> PageParams {
        PageParams { filter: self.filter.clone(), q: self.q.clone(), sort: self.sort.clone() }
    }

    /// `ids=1,2,3`; empty when absent.
    pub fn ids(&self) -> Result<Vec<i64>, JsonApiError> {
        self.ids
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| s.parse::<i64>().map_err(|_| JsonApiError::bad_request(format!("invalid id '{s}'"))))
            .collect()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventParams {
    pub since_in_days: Option<u32>,
    pub source: Option<String>,
}

/// Spreadsheet media type named in `Accept`, if any.
pub fn export_type(headers: &HeaderMap) -> Option<&'static str> {
    let accept = headers.get(header::ACCEPT).and_then(|v| v.to_str().ok())?;
    accept.split(',').map(media::essence).find_map(|m| match m.as_str() {
        APPLICATION_XLSX => Some(APPLICATION_XLSX),
        APPLICATION_XLS => Some(APPLICATION_XLS),
        _ => None,
    })
}

pub fn content_type(headers: &HeaderMap) -> Option<String> {
    headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok()).map(str::to_string)
}

pub fn language(headers: &HeaderMap) -> String {
    type_service::primary_language(headers.get(header::ACCEPT_LANGUAGE).and_then(|v| v.to_str().ok()))
}

/// An uploaded file with the content type resolved from header, part or bytes.
pub struct Upload {
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Accept either a raw body or a multipart form with a `file` part.
pub async fn upload(req: Request) -> Result<Upload, JsonApiError> {
    let declared = content_type(req.headers());
    let is_multipart = declared.as_deref().map(media::essence).as_deref() == Some(media::MULTIPART_FORM_DATA);
    if is_multipart {
        let mut form = Multipart::from_request(req, &())
            .await
            .map_err(|e| JsonApiError::bad_request(e.body_text()))?;
        while let Some(field) = form.next_field().await.map_err(|e| JsonApiError::bad_request(e.body_text()))? {
            if field.name() != Some("file") {
                continue;
            }
            let part_type = field.content_type().map(str::to_string);
            let bytes = field.bytes().await.map_err(|e| JsonApiError::bad_request(e.body_text()))?;
            return Ok(Upload { content_type: media::resolve_content_type(part_type.as_deref(), &bytes), bytes: bytes.to_vec() });
        }
        return Err(JsonApiError::bad_request("multipart body has no 'file' part"));
    }
    let bytes = Bytes::from_request(req, &())
        .await
        .map_err(|e| JsonApiError::bad_request(e.body_text()))?;
    Ok(Upload { content_type: media::resolve_content_type(declared.as_deref(), &bytes), bytes: bytes.to_vec() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn ids_are_parsed_from_csv() {
        let p = ListParams { ids: Some("1, 2,3".into()), ..Default::default() };
        assert_eq!(p.ids().unwrap(), vec![1, 2, 3]);
        assert!(ListParams { ids: Some("1,x".into()), ..Default::default() }.ids().is_err());
        assert!(ListParams::default().ids().unwrap().is_empty());
    }

    #[test]
    fn spreadsheet_accept_header() {
        let mut h = HeaderMap::new();
        assert_eq!(export_type(&h), None);
        h.insert(header::ACCEPT, HeaderValue::from_static("application/hal+json, application/vnd.ms-excel"));
        assert_eq!(export_type(&h), Some(APPLICATION_XLS));
    }
}
