//! Bounded, single-shot file reads beneath the project root.

use std::io;
use std::path::Path;

use thiserror::Error;

use crate::security::PathGuard;
use crate::site::mime::content_type_for;

#[derive(Debug, Error)]
pub enum FileError {
    #[error("file not found")]
    NotFound,

    #[error("path is a directory")]
    Directory,

    #[error("file is {size} bytes, limit is {limit}")]
    TooLarge { size: u64, limit: u64 },

    /// The file exists but its canonical path (symlinks resolved) lies
    /// outside the canonical root.
    #[error("resolved file escapes project root")]
    Escape,

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// A file read into memory.
#[derive(Debug, Clone)]
pub struct LoadedFile {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
}

/// Read `path` (already resolved by the guard) if it is a regular file
/// within the root and no larger than `max_bytes`.
pub async fn read_file(guard: &PathGuard, path: &Path, max_bytes: u64) -> Result<LoadedFile, FileError> {
    tracing::debug!(path = %path.display(), "Reading file");

    // The guard already approved the path; a failed stat (NUL byte, name
    // too long, file used as a directory) is reported as missing.
    let metadata = match tokio::fs::metadata(path).await {
        Ok(m) => m,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "File not found");
            return Err(FileError::NotFound);
        }
    };

    if metadata.is_dir() {
        tracing::debug!(path = %path.display(), "Path is a directory");
        return Err(FileError::Directory);
    }

    let canonical = tokio::fs::canonicalize(path).await?;
    if !guard.confines(&canonical) {
        tracing::warn!(
            path = %path.display(),
            canonical = %canonical.display(),
            "File resolves outside project root"
        );
        return Err(FileError::Escape);
    }

    if metadata.len() > max_bytes {
        tracing::warn!(path = %path.display(), size = metadata.len(), limit = max_bytes, "File too large");
        return Err(FileError::TooLarge {
            size: metadata.len(),
            limit: max_bytes,
        });
    }

    let bytes = tokio::fs::read(&canonical).await?;
    let content_type = content_type_for(path);

    tracing::debug!(
        path = %path.display(),
        content_type,
        size = bytes.len(),
        "File read"
    );

    Ok(LoadedFile {
        bytes,
        content_type,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn site() -> (tempfile::TempDir, PathGuard) {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("style.css"), b"body { color: red }").unwrap();
        fs::create_dir(dir.path().join("assets")).unwrap();
        let guard = PathGuard::new(dir.path()).unwrap();
        (dir, guard)
    }

    #[tokio::test]
    async fn reads_existing_file() {
        let (_dir, guard) = site();
        let path = guard.resolve("style.css").unwrap();
        let file = read_file(&guard, &path, 1024).await.unwrap();
        assert_eq!(file.bytes, b"body { color: red }");
        assert_eq!(file.content_type, "text/css; charset=utf-8");
    }

    #[tokio::test]
    async fn missing_file() {
        let (_dir, guard) = site();
        let path = guard.resolve("nope.js").unwrap();
        assert!(matches!(read_file(&guard, &path, 1024).await, Err(FileError::NotFound)));
    }

    #[tokio::test]
    async fn unusable_names_are_missing() {
        let (_dir, guard) = site();
        let nul = guard.resolve("a\0.css").unwrap();
        assert!(matches!(read_file(&guard, &nul, 1024).await, Err(FileError::NotFound)));

        let long = guard.resolve(&format!("{}.css", "a".repeat(300))).unwrap();
        assert!(matches!(read_file(&guard, &long, 1024).await, Err(FileError::NotFound)));

        let under_file = guard.resolve("style.css/x.css").unwrap();
        assert!(matches!(read_file(&guard, &under_file, 1024).await, Err(FileError::NotFound)));
    }

    #[tokio::test]
    async fn directory_is_not_served() {
        let (_dir, guard) = site();
        let path = guard.resolve("assets").unwrap();
        assert!(matches!(read_file(&guard, &path, 1024).await, Err(FileError::Directory)));
    }

    #[tokio::test]
    async fn size_limit_enforced() {
        let (_dir, guard) = site();
        let path = guard.resolve("style.css").unwrap();
        assert!(matches!(
            read_file(&guard, &path, 4).await,
            Err(FileError::TooLarge { limit: 4, .. })
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn symlink_out_of_root_is_refused() {
        let outside = tempfile::tempdir().unwrap();
        fs::write(outside.path().join("secret.txt"), b"secret").unwrap();
        let (dir, guard) = site();
        std::os::unix::fs::symlink(outside.path().join("secret.txt"), dir.path().join("leak.txt")).unwrap();

        let path = guard.resolve("leak.txt").unwrap();
        assert!(matches!(read_file(&guard, &path, 1024).await, Err(FileError::Escape)));
    }
}
