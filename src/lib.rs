//! Edge handler library: sandboxed static files, password-substituted pages
//! and an SSRF-filtered, password-gated forward proxy behind one listener.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod proxy;
pub mod routing;
pub mod security;
pub mod site;

pub use config::schema::EdgeConfig;
pub use error::EdgeError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
