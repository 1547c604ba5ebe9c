//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with one catch-all handler
//! - Wire up middleware (timeout, request ID, tracing, panic capture)
//! - Bind server to listener and shut down gracefully
//! - Dispatch each `RouteDecision` to the static, page or proxy handler
//! - Observability (metrics, correlation IDs)

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{HeaderValue, Request},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::EdgeConfig;
use crate::error::EdgeError;
use crate::http::request::{request_id, EdgeRequest, MakeRequestUuid};
use crate::http::response::{self, FileHeaders};
use crate::lifecycle::ShutdownSignal;
use crate::observability::metrics;
use crate::proxy::ProxyService;
use crate::routing::{RouteDecision, Router as EdgeRouter};
use crate::security::PathGuard;
use crate::site::files::{read_file, FileError};
use crate::site::PageRenderer;

/// Failures while assembling the server from configuration.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("project root {path}: {source}")]
    Root {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to build upstream client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("invalid header value for {field}")]
    Header { field: &'static str },
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<EdgeRouter>,
    pub proxy: Arc<ProxyService>,
    pub pages: PageRenderer,
    pub files: FileHeaders,
    pub max_file_bytes: u64,
}

/// HTTP server for the edge handler.
pub struct HttpServer {
    router: Router,
    config: EdgeConfig,
}

impl HttpServer {
    /// Build the immutable application state from `config`.
    pub fn new(config: EdgeConfig) -> Result<Self, StartupError> {
        let guard = PathGuard::new(&config.site.root).map_err(|source| StartupError::Root {
            path: config.site.root.display().to_string(),
            source,
        })?;
        let router = Arc::new(EdgeRouter::from_config(&config.site, &config.proxy, guard));
        let proxy = Arc::new(ProxyService::from_config(&config)?);

        let pages = PageRenderer::new(
            config.site.password_placeholder.as_str(),
            proxy.auth_state().page_digest(),
            config.site.max_file_bytes,
        );
        let files = FileHeaders {
            static_cache_control: header_value(&config.site.static_cache_control, "site.static_cache_control")?,
            page_cache_control: header_value(&config.site.page_cache_control, "site.page_cache_control")?,
            nosniff: config.security.enable_headers,
        };

        let state = AppState {
            router,
            proxy,
            pages,
            files,
            max_file_bytes: config.site.max_file_bytes,
        };

        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &EdgeConfig, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(edge_handler))
            .route("/", any(edge_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(CatchPanicLayer::custom(response::handle_panic))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The configured service, for in-process use (tests drive it with `oneshot`).
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(self, listener: TcpListener, shutdown: ShutdownSignal) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            root = %self.config.site.root.display(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown.recv())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

fn header_value(value: &str, field: &'static str) -> Result<HeaderValue, StartupError> {
    HeaderValue::from_str(value).map_err(|_| StartupError::Header { field })
}

/// Single entry point: classify, dispatch, record.
async fn edge_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let request_id = request_id(request.headers()).to_string();
    let req = EdgeRequest::from_request(&request);
    let method = req.method().to_string();

    let decision = state.router.classify(&req);
    let route = decision.label();

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %req.raw_path(),
        route,
        "Routing request"
    );

    let response = match dispatch(&state, &req, decision).await {
        Ok(response) => response,
        Err(e) => {
            tracing::info!(
                request_id = %request_id,
                path = %req.raw_path(),
                status = e.status().as_u16(),
                error = %e,
                "Request rejected"
            );
            e.into_response()
        }
    };

    metrics::record_request(&method, response.status().as_u16(), route, start_time);
    response
}

async fn dispatch(state: &AppState, req: &EdgeRequest, decision: RouteDecision) -> Result<Response, EdgeError> {
    match decision {
        RouteDecision::Preflight => Ok(response::preflight()),
        RouteDecision::MethodNotAllowed => Err(EdgeError::MethodNotAllowed),
        RouteDecision::Forbidden => Err(EdgeError::PathEscape),
        RouteDecision::NotFound => Err(EdgeError::not_found(req.raw_path())),
        RouteDecision::Proxy(encoded) => state.proxy.forward(req, &encoded).await,
        RouteDecision::StaticAsset(path) => {
            let file = read_file(state.router.guard(), &path, state.max_file_bytes)
                .await
                .map_err(|e| file_error(e, || EdgeError::file_not_found(req.raw_path())))?;
            Ok(state.files.asset(file.bytes, file.content_type))
        }
        RouteDecision::Page(template) => {
            let name = template
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let page = state
                .pages
                .render(state.router.guard(), &template)
                .await
                .map_err(|e| file_error(e, || EdgeError::page_missing(&name)))?;
            Ok(state.files.page(page))
        }
    }
}

/// Map a file failure; `missing` builds the 404 for absent files.
fn file_error(e: FileError, missing: impl FnOnce() -> EdgeError) -> EdgeError {
    match e {
        FileError::NotFound | FileError::Directory | FileError::TooLarge { .. } => missing(),
        FileError::Escape => EdgeError::PathEscape,
        FileError::Io(err) => {
            tracing::error!(error = %err, "File read failed");
            EdgeError::Internal
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use std::fs;
    use tower::ServiceExt;

    fn server(dir: &std::path::Path) -> HttpServer {
        let mut config = EdgeConfig::default();
        config.site.root = dir.to_path_buf();
        config.proxy.password = "swordfish".to_string();
        HttpServer::new(config).unwrap()
    }

    async fn get(server: &HttpServer, uri: &str) -> Response {
        server
            .router()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn missing_page_template_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let server = server(dir.path());
        let response = get(&server, "/").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "index.html not found");
        assert!(json.get("path").is_none());
    }

    #[tokio::test]
    async fn oversized_file_is_404() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("big.bin"), vec![0u8; 64]).unwrap();
        let mut config = EdgeConfig::default();
        config.site.root = dir.path().to_path_buf();
        config.site.max_file_bytes = 16;
        let server = HttpServer::new(config).unwrap();

        let response = get(&server, "/big.bin").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn request_id_is_set_and_propagated() {
        let dir = tempfile::tempdir().unwrap();
        let server = server(dir.path());
        let response = get(&server, "/nothing").await;
        assert!(response.headers().contains_key("x-request-id"));

        let response = server
            .router()
            .oneshot(
                Request::builder()
                    .uri("/nothing")
                    .header("x-request-id", "abc-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.headers()["x-request-id"], "abc-123");
    }

    #[test]
    fn invalid_cache_header_fails_startup() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = EdgeConfig::default();
        config.site.root = dir.path().to_path_buf();
        config.site.page_cache_control = "bad\nvalue".to_string();
        assert!(matches!(
            HttpServer::new(config),
            Err(StartupError::Header { field: "site.page_cache_control" })
        ));
    }
}
