//! Page rendering: a template file with one placeholder replaced.

use std::path::Path;

use crate::security::PathGuard;
use crate::site::files::{read_file, FileError};

/// Settings shared by every page render.
#[derive(Debug, Clone)]
pub struct PageRenderer {
    placeholder: String,
    digest: String,
    max_bytes: u64,
}

impl PageRenderer {
    /// `digest` is substituted for every occurrence of `placeholder`.
    pub fn new(placeholder: impl Into<String>, digest: impl Into<String>, max_bytes: u64) -> Self {
        Self {
            placeholder: placeholder.into(),
            digest: digest.into(),
            max_bytes,
        }
    }

    /// Load `template` and substitute the placeholder.
    pub async fn render(&self, guard: &PathGuard, template: &Path) -> Result<Vec<u8>, FileError> {
        let file = read_file(guard, template, self.max_bytes).await?;
        Ok(substitute(&file.bytes, &self.placeholder, &self.digest))
    }
}

/// Replace every occurrence of `placeholder` in `template` with `value`.
///
/// Works on raw bytes so templates need not be valid UTF-8. An empty
/// placeholder leaves the template untouched.
pub fn substitute(template: &[u8], placeholder: &str, value: &str) -> Vec<u8> {
    let needle = placeholder.as_bytes();
    if needle.is_empty() || template.len() < needle.len() {
        return template.to_vec();
    }

    let mut out = Vec::with_capacity(template.len());
    let mut rest = template;
    while let Some(pos) = rest.windows(needle.len()).position(|w| w == needle) {
        out.extend_from_slice(&rest[..pos]);
        out.extend_from_slice(value.as_bytes());
        rest = &rest[pos + needle.len()..];
    }
    out.extend_from_slice(rest);
    out
}
