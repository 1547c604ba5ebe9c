//! Request-level error taxonomy.
//!
//! Every rejection produced while handling a request is one of these
//! variants. Each maps to a fixed HTTP status and renders as a small JSON
//! body (see `http::response`). File-system paths and upstream error text
//! are logged, never returned.

use axum::http::StatusCode;
use thiserror::Error;

/// Errors that terminate handling of a single request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EdgeError {
    /// Requested path resolved outside the project root.
    #[error("Access denied")]
    PathEscape,

    /// No file or route matched.
    #[error("{message}")]
    NotFound {
        message: String,
        /// Request URL path echoed back to the caller, if any.
        path: Option<String>,
    },

    /// Proxy target missing, malformed, or blocked by the SSRF policy.
    #[error("Invalid URL")]
    InvalidTarget,

    /// Proxy auth missing, wrong, expired, or proxying disabled.
    #[error("Unauthorized")]
    Unauthorized,

    /// Upstream fetch failed or timed out.
    #[error("Proxy request failed")]
    UpstreamFailure,

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Internal server error")]
    Internal,
}

impl EdgeError {
    /// Generic "no route" rejection carrying the request path.
    pub fn not_found(path: impl Into<String>) -> Self {
        EdgeError::NotFound {
            message: "Not found".to_string(),
            path: Some(path.into()),
        }
    }

    /// Static asset lookup failed.
    pub fn file_not_found(path: impl Into<String>) -> Self {
        EdgeError::NotFound {
            message: "File not found".to_string(),
            path: Some(path.into()),
        }
    }

    /// A page template is missing, e.g. `index.html not found`.
    pub fn page_missing(name: &str) -> Self {
        EdgeError::NotFound {
            message: format!("{} not found", name),
            path: None,
        }
    }

    /// HTTP status this error is reported with.
    pub fn status(&self) -> StatusCode {
        match self {
            EdgeError::PathEscape => StatusCode::FORBIDDEN,
            EdgeError::NotFound { .. } => StatusCode::NOT_FOUND,
            EdgeError::InvalidTarget => StatusCode::BAD_REQUEST,
            EdgeError::Unauthorized => StatusCode::UNAUTHORIZED,
            EdgeError::UpstreamFailure => StatusCode::BAD_GATEWAY,
            EdgeError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            EdgeError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The `path` field of the JSON body, when one applies.
    pub fn path(&self) -> Option<&str> {
        match self {
            EdgeError::NotFound { path, .. } => path.as_deref(),
            _ => None,
        }
    }
}

/// Result type alias for request handling.
pub type Result<T> = std::result::Result<T, EdgeError>;
