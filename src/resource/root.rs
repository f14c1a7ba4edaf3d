//! Serving root: the read-only configuration behind one mount point.

use dashmap::DashMap;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::processor::{ProcessorKind, ProcessorRegistry};
use crate::http::mime::{self, ExtensionTable, MediaType};

pub const DEFAULT_TYPE: &str = "text/html";

pub fn default_index_names() -> Vec<String> {
    ["index", "index.html", "index.htm"]
        .iter()
        .map(ToString::to_string)
        .collect()
}

/// Everything a request below one mount needs to know about its root
///
/// Built once at startup and shared by every request through an `Arc`.
/// Only the type cache changes afterwards.
#[derive(Debug)]
pub struct ServingRoot {
    path: PathBuf,
    default_type: String,
    index_names: Vec<String>,
    ignored_exts: Vec<String>,
    processors: ProcessorRegistry,
    content_types: ExtensionTable,
    content_encodings: ExtensionTable,
    /// Type lookups keyed by absolute path.
    ///
    /// Two requests for the same cold path may both compute the entry and
    /// both insert it. They compute the same value, so the race is accepted
    /// rather than serialised.
    type_cache: DashMap<PathBuf, MediaType>,
}

impl ServingRoot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            default_type: DEFAULT_TYPE.to_string(),
            index_names: default_index_names(),
            ignored_exts: Vec::new(),
            processors: ProcessorRegistry::default(),
            content_types: mime::default_content_types().clone(),
            content_encodings: mime::default_content_encodings(),
            type_cache: DashMap::new(),
        }
    }

    #[must_use]
    pub fn with_default_type(mut self, default_type: impl Into<String>) -> Self {
        self.default_type = default_type.into();
        self
    }

    #[must_use]
    pub fn with_index_names(mut self, names: Vec<String>) -> Self {
        self.index_names = names;
        self
    }

    #[must_use]
    pub fn with_ignored_exts(mut self, exts: Vec<String>) -> Self {
        self.ignored_exts = exts;
        self
    }

    #[must_use]
    pub fn with_processor(mut self, ext: &str, kind: ProcessorKind) -> Self {
        self.processors.register(ext, kind);
        self
    }

    #[must_use]
    pub fn with_content_types(mut self, overrides: &HashMap<String, String>) -> Self {
        self.content_types = mime::merge_table(&self.content_types, overrides);
        self
    }

    #[must_use]
    pub fn with_content_encodings(mut self, overrides: &HashMap<String, String>) -> Self {
        self.content_encodings = mime::merge_table(&self.content_encodings, overrides);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn default_type(&self) -> &str {
        &self.default_type
    }

    pub fn index_names(&self) -> &[String] {
        &self.index_names
    }

    pub fn ignored_exts(&self) -> &[String] {
        &self.ignored_exts
    }

    pub const fn processors(&self) -> &ProcessorRegistry {
        &self.processors
    }

    /// Type and encoding for a bare file name, without caching
    pub fn media_for_name(&self, name: &str) -> MediaType {
        mime::resolve_type(
            name,
            &self.content_types,
            &self.content_encodings,
            &self.default_type,
        )
    }

    /// Type and encoding for `path`, cached per path
    pub fn media_for_path(&self, path: &Path) -> MediaType {
        if let Some(cached) = self.type_cache.get(path) {
            return cached.clone();
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let media = self.media_for_name(&name);
        self.type_cache.insert(path.to_path_buf(), media.clone());
        media
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let root = ServingRoot::new("/srv");
        assert_eq!(root.default_type(), "text/html");
        assert_eq!(root.index_names(), ["index", "index.html", "index.htm"]);
        assert!(root.ignored_exts().is_empty());
        assert_eq!(root.media_for_name("README").content_type, "text/html");
    }

    #[test]
    fn test_overrides() {
        let types = HashMap::from([("log".to_string(), "text/plain".to_string())]);
        let encodings = HashMap::from([(".zst".to_string(), "zstd".to_string())]);
        let root = ServingRoot::new("/srv")
            .with_default_type("application/octet-stream")
            .with_content_types(&types)
            .with_content_encodings(&encodings);

        assert_eq!(root.media_for_name("x.log").content_type, "text/plain");
        let media = root.media_for_name("x.log.zst");
        assert_eq!(media.content_type, "text/plain");
        assert_eq!(media.encoding.as_deref(), Some("zstd"));
        assert_eq!(root.media_for_name("x").content_type, "application/octet-stream");
    }

    #[test]
    fn test_media_cache_is_stable() {
        let root = ServingRoot::new("/srv");
        let path = Path::new("/srv/a/notes.txt.gz");
        let first = root.media_for_path(path);
        let second = root.media_for_path(path);
        assert_eq!(first, second);
        assert_eq!(first.content_type, "text/plain");
        assert_eq!(root.type_cache.len(), 1);
    }
}
