//! Per-request snapshot of a resolved path.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use super::root::ServingRoot;
use crate::http::mime::MediaType;

/// What the filesystem said about a path when the request started
///
/// The snapshot is never refreshed; a file that changes while it is being
/// sent is still described by these values.
#[derive(Debug, Clone)]
pub struct ResolvedTarget {
    pub path: PathBuf,
    pub exists: bool,
    pub is_dir: bool,
    pub size: u64,
    pub modified: Option<SystemTime>,
    pub media: MediaType,
}

impl ResolvedTarget {
    /// Stat `path` once and resolve its type through `root`'s cache
    ///
    /// A path that cannot be stat'ed for any reason is reported as missing.
    pub async fn snapshot(root: &ServingRoot, path: &Path) -> Self {
        let media = root.media_for_path(path);
        match tokio::fs::metadata(path).await {
            Ok(meta) => Self {
                path: path.to_path_buf(),
                exists: true,
                is_dir: meta.is_dir(),
                size: meta.len(),
                modified: meta.modified().ok(),
                media,
            },
            Err(_) => Self {
                path: path.to_path_buf(),
                exists: false,
                is_dir: false,
                size: 0,
                modified: None,
                media,
            },
        }
    }

    /// Replace the resolved type, as processors that re-label content do
    #[must_use]
    pub fn with_media(mut self, media: MediaType) -> Self {
        self.media = media;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_snapshot_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        std::fs::write(&path, b"hello").unwrap();

        let root = ServingRoot::new(dir.path());
        let target = ResolvedTarget::snapshot(&root, &path).await;
        assert!(target.exists);
        assert!(!target.is_dir);
        assert_eq!(target.size, 5);
        assert!(target.modified.is_some());
        assert_eq!(target.media.content_type, "text/plain");
    }

    #[tokio::test]
    async fn test_snapshot_missing_and_dir() {
        let dir = tempfile::tempdir().unwrap();
        let root = ServingRoot::new(dir.path());

        let missing = ResolvedTarget::snapshot(&root, &dir.path().join("gone")).await;
        assert!(!missing.exists);

        let this = ResolvedTarget::snapshot(&root, dir.path()).await;
        assert!(this.exists);
        assert!(this.is_dir);
    }

    #[tokio::test]
    async fn test_snapshot_is_stale_after_change() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grow.bin");
        std::fs::write(&path, b"12").unwrap();

        let root = ServingRoot::new(dir.path());
        let target = ResolvedTarget::snapshot(&root, &path).await;
        std::fs::write(&path, b"123456").unwrap();
        assert_eq!(target.size, 2);
    }
}
