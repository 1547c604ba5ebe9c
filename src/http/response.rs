//! Response construction.
//!
//! # Responsibilities
//! - Render `EdgeError` as a JSON body with the mapped status
//! - Build static-asset and page responses with their caching headers
//! - Answer CORS preflight requests
//! - Turn caught panics into a generic 500
//!
//! # Design Decisions
//! - Error bodies carry only the request path, never file-system paths
//! - Header values are validated once at startup and cloned per response

use std::any::Any;

use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::error::EdgeError;
use crate::site::mime::HTML_CONTENT_TYPE;

pub const ALLOWED_METHODS: &str = "GET, HEAD, OPTIONS";

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<&'a str>,
}

impl IntoResponse for EdgeError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            error: self.to_string(),
            path: self.path(),
        };
        let mut response = (status, Json(body)).into_response();
        if status == StatusCode::METHOD_NOT_ALLOWED {
            response
                .headers_mut()
                .insert(header::ALLOW, HeaderValue::from_static(ALLOWED_METHODS));
        }
        response
    }
}

/// Per-response header settings for files served from the root.
#[derive(Debug, Clone)]
pub struct FileHeaders {
    pub static_cache_control: HeaderValue,
    pub page_cache_control: HeaderValue,
    pub nosniff: bool,
}

impl FileHeaders {
    /// A static asset: bytes with their MIME type and long-lived caching.
    pub fn asset(&self, bytes: Vec<u8>, content_type: &'static str) -> Response {
        self.build(bytes, HeaderValue::from_static(content_type), self.static_cache_control.clone())
    }

    /// A rendered page.
    pub fn page(&self, bytes: Vec<u8>) -> Response {
        self.build(bytes, HeaderValue::from_static(HTML_CONTENT_TYPE), self.page_cache_control.clone())
    }

    fn build(&self, bytes: Vec<u8>, content_type: HeaderValue, cache_control: HeaderValue) -> Response {
        let mut response = Response::new(Body::from(bytes));
        let headers = response.headers_mut();
        headers.insert(header::CONTENT_TYPE, content_type);
        headers.insert(header::CACHE_CONTROL, cache_control);
        if self.nosniff {
            headers.insert(header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
        }
        response
    }
}

/// `204` answer to `OPTIONS`.
pub fn preflight() -> Response {
    let mut response = StatusCode::NO_CONTENT.into_response();
    let headers = response.headers_mut();
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOWED_METHODS),
    );
    headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static("*"));
    response
}

/// `CatchPanicLayer` handler: log the payload, answer 500.
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    tracing::error!(panic = %detail, "Handler panicked");
    EdgeError::Internal.into_response()
}
