//! Request handling and transformation.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4) for every request
//! - Extract routing-relevant information (method, path segments, query)
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Path segments are percent-decoded once; the raw path is kept for the
//!   proxy route, whose target is itself percent-encoded

use std::collections::HashMap;

use axum::http::{HeaderMap, Method, Request, Uri};
use percent_encoding::percent_decode_str;
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

pub const X_REQUEST_ID: &str = "x-request-id";

/// Produces `x-request-id` values for requests that arrive without one.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        id.parse().ok().map(RequestId::new)
    }
}

/// The request ID header value, or `"unknown"`.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Routing view of an inbound request. Immutable once built.
#[derive(Debug, Clone)]
pub struct EdgeRequest {
    method: Method,
    raw_path: String,
    segments: Vec<String>,
    query: HashMap<String, String>,
}

impl EdgeRequest {
    pub fn new(method: Method, uri: &Uri) -> Self {
        let raw_path = uri.path().to_string();
        let segments = raw_path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| percent_decode_str(s).decode_utf8_lossy().into_owned())
            .collect();
        // Repeated keys: last occurrence wins.
        let query = uri
            .query()
            .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
            .unwrap_or_default();

        Self {
            method,
            raw_path,
            segments,
            query,
        }
    }

    pub fn from_request<B>(request: &Request<B>) -> Self {
        Self::new(request.method().clone(), request.uri())
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Path exactly as received (still percent-encoded).
    pub fn raw_path(&self) -> &str {
        &self.raw_path
    }

    /// Decoded, non-empty path segments.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn first_segment(&self) -> Option<&str> {
        self.segments.first().map(String::as_str)
    }

    /// Decoded segments joined with `/`, without a leading slash.
    pub fn relative_path(&self) -> String {
        self.segments.join("/")
    }

    /// Decoded path with a leading slash; a trailing slash is kept so
    /// `/player/` still matches the `/player/` prefix.
    pub fn decoded_path(&self) -> String {
        let mut path = format!("/{}", self.relative_path());
        if self.raw_path.len() > 1 && self.raw_path.ends_with('/') && !self.segments.is_empty() {
            path.push('/');
        }
        path
    }

    pub fn query(&self) -> &HashMap<String, String> {
        &self.query
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }
}
