//! Upstream response relay.
//!
//! The upstream status is kept, headers are sanitized, and the body is
//! streamed chunk by chunk. Dropping the returned response (client gone)
//! drops the upstream stream and its connection.

use axum::body::Body;
use axum::http::{header, HeaderValue};
use axum::response::Response;
use futures_util::TryStreamExt;

use crate::security::headers::{strip_hop_by_hop, ResponseSanitizer};
use crate::site::mime::DEFAULT_CONTENT_TYPE;

/// Convert an upstream response into the response sent to the client.
pub fn relay(upstream: reqwest::Response, sanitizer: &ResponseSanitizer) -> Response {
    let status = upstream.status();
    let mut headers = strip_hop_by_hop(&sanitizer.strip(upstream.headers()));
    if !headers.contains_key(header::CONTENT_TYPE) {
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(DEFAULT_CONTENT_TYPE));
    }

    let stream = upstream
        .bytes_stream()
        .inspect_err(|e| tracing::warn!(error = %e, "Upstream body stream failed"));

    let mut response = Response::new(Body::from_stream(stream));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}
