//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID, decoded path segments, query)
//!     → routing layer classifies the request
//!     → site / proxy handlers
//!     → response.rs (JSON errors, caching headers, preflight)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{EdgeRequest, MakeRequestUuid, X_REQUEST_ID};
pub use server::{AppState, HttpServer, StartupError};
