//! Extension → `Content-Type` table.

use std::path::Path;

pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";
pub const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

const MIME_TYPES: &[(&str, &str)] = &[
    ("html", HTML_CONTENT_TYPE),
    ("htm", HTML_CONTENT_TYPE),
    ("js", "application/javascript; charset=utf-8"),
    ("mjs", "application/javascript; charset=utf-8"),
    ("css", "text/css; charset=utf-8"),
    ("json", "application/json"),
    ("map", "application/json"),
    ("webmanifest", "application/manifest+json"),
    ("txt", "text/plain; charset=utf-8"),
    ("svg", "image/svg+xml"),
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("ico", "image/x-icon"),
    ("woff", "font/woff"),
    ("woff2", "font/woff2"),
    ("ttf", "font/ttf"),
    ("eot", "application/vnd.ms-fontobject"),
];

/// Content type for a file path, by extension (case-insensitive).
pub fn content_type_for(path: &Path) -> &'static str {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(|ext| {
            MIME_TYPES
                .iter()
                .find(|(known, _)| known.eq_ignore_ascii_case(ext))
                .map(|(_, mime)| *mime)
        })
        .unwrap_or(DEFAULT_CONTENT_TYPE)
}
