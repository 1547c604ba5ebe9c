//! Site subsystem: the project's own files.
//!
//! # Data Flow
//! ```text
//! RouteDecision::StaticAsset(path)
//!     → files.rs (stat, symlink-safe containment, size bound, read)
//!     → mime.rs (Content-Type by extension)
//!
//! RouteDecision::Page(template)
//!     → pages.rs (read via files.rs, substitute password digest)
//! ```

pub mod files;
pub mod mime;
pub mod pages;

pub use files::{FileError, LoadedFile};
pub use pages::PageRenderer;
