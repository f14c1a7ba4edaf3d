//! Path resolution module
//!
//! Walks URL segments down from a serving root. Each step checks the segment
//! for traversal, looks for index files on a trailing slash, falls back to
//! sibling files with an ignored extension, and hands files with a registered
//! extension to their processor.

use std::fs::Metadata;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};
use std::sync::Arc;

use super::processor::ProcessorKind;
use super::root::ServingRoot;
use crate::logger;

/// Ignored extension that matches any sibling extension.
pub const ANY_EXTENSION: &str = "*";

/// A path below a serving root that existed when it was resolved
#[derive(Debug, Clone)]
pub struct FileNode {
    root: Arc<ServingRoot>,
    path: PathBuf,
    is_dir: bool,
}

impl FileNode {
    /// Node for the root directory itself
    pub async fn at_root(root: Arc<ServingRoot>) -> Self {
        let path = root.path().to_path_buf();
        let is_dir = stat(&path).await.is_some_and(|m| m.is_dir());
        Self { root, path, is_dir }
    }

    fn child(&self, path: PathBuf, meta: &Metadata) -> Self {
        Self {
            root: Arc::clone(&self.root),
            path,
            is_dir: meta.is_dir(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub const fn is_dir(&self) -> bool {
        self.is_dir
    }

    pub fn serving_root(&self) -> &Arc<ServingRoot> {
        &self.root
    }

    fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Outcome of resolving one segment or a whole path
#[derive(Debug)]
pub enum Resolution {
    /// An existing file or directory, served by `FileResource`
    Node(FileNode),
    /// A directory asked for with a trailing slash and no index file
    Listing(FileNode),
    /// A file whose extension has a processor registered
    Processor { kind: ProcessorKind, node: FileNode },
    NotFound,
    /// The segment tried to leave its directory
    Insecure,
}

/// True for segments that must never be joined onto a directory
pub fn is_insecure(segment: &str) -> bool {
    segment == ".." || segment.contains('/') || segment.contains(MAIN_SEPARATOR)
}

async fn stat(path: &Path) -> Option<Metadata> {
    tokio::fs::metadata(path).await.ok()
}

/// Resolve `segment` inside the directory `dir`
///
/// Every candidate path is checked for existence exactly once.
///
/// # Arguments
/// * `dir` - Node the segment is looked up in; anything but a directory has no children
/// * `segment` - One percent-decoded URL segment, `""` for a trailing slash
pub async fn resolve_segment(dir: &FileNode, segment: &str) -> Resolution {
    if !dir.is_dir {
        return Resolution::NotFound;
    }
    if is_insecure(segment) {
        return Resolution::Insecure;
    }

    let node = if segment.is_empty() {
        match find_index(dir).await {
            Some(node) => node,
            None => return Resolution::Listing(dir.clone()),
        }
    } else {
        let candidate = dir.path.join(segment);
        match stat(&candidate).await {
            Some(meta) => dir.child(candidate, &meta),
            None => match sibling_search(dir, segment).await {
                Some(node) => node,
                None => return Resolution::NotFound,
            },
        }
    };

    match dir.root.processors().lookup(&node.file_name()) {
        Some(kind) => Resolution::Processor { kind, node },
        None => Resolution::Node(node),
    }
}

async fn find_index(dir: &FileNode) -> Option<FileNode> {
    for name in dir.root.index_names() {
        let candidate = dir.path.join(name);
        match stat(&candidate).await {
            Some(meta) if meta.is_file() => return Some(dir.child(candidate, &meta)),
            _ => {}
        }
    }
    None
}

/// Look for `segment` plus each ignored extension, in configured order
async fn sibling_search(dir: &FileNode, segment: &str) -> Option<FileNode> {
    for ext in dir.root.ignored_exts() {
        if ext.is_empty() {
            // the bare name already failed its existence check
            continue;
        }
        if ext == ANY_EXTENSION {
            if let Some(node) = wildcard_sibling(dir, segment).await {
                return Some(node);
            }
            continue;
        }
        let candidate = dir.path.join(format!("{segment}{ext}"));
        if let Some(meta) = stat(&candidate).await {
            return Some(dir.child(candidate, &meta));
        }
    }
    None
}

async fn wildcard_sibling(dir: &FileNode, segment: &str) -> Option<FileNode> {
    let prefix = format!("{segment}.");
    let mut entries = tokio::fs::read_dir(&dir.path).await.ok()?;
    let mut names = Vec::new();
    while let Ok(Some(entry)) = entries.next_entry().await {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with(&prefix) {
            names.push(name);
        }
    }
    names.sort();

    for name in names {
        let candidate = dir.path.join(name);
        if let Some(meta) = stat(&candidate).await {
            return Some(dir.child(candidate, &meta));
        }
    }
    None
}

/// Resolve every segment of a request path below `root`
///
/// No segments means the root itself. Only the last segment may produce a
/// listing or a processor; anything found before that must be a directory.
pub async fn traverse(root: Arc<ServingRoot>, segments: &[String]) -> Resolution {
    let mut node = FileNode::at_root(root).await;

    let Some((last, parents)) = segments.split_last() else {
        return Resolution::Node(node);
    };

    for segment in parents {
        match resolve_segment(&node, segment).await {
            Resolution::Node(next) => node = next,
            Resolution::Insecure => {
                logger::log_warning(&format!("Blocked path traversal segment {segment:?}"));
                return Resolution::Insecure;
            }
            _ => return Resolution::NotFound,
        }
    }

    let resolution = resolve_segment(&node, last).await;
    if matches!(resolution, Resolution::Insecure) {
        logger::log_warning(&format!("Blocked path traversal segment {last:?}"));
    }
    resolution
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn segments(path: &str) -> Vec<String> {
        path.split('/').map(ToString::to_string).collect()
    }

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("readme.txt"), "read me").unwrap();
        fs::create_dir(dir.path().join("docs")).unwrap();
        fs::write(dir.path().join("docs").join("index.html"), "<h1>docs</h1>").unwrap();
        fs::create_dir(dir.path().join("empty")).unwrap();
        fs::write(dir.path().join("page.asis"), "HTTP/1.1 200 OK\r\n\r\n").unwrap();
        dir
    }

    fn node_path(resolution: &Resolution) -> &Path {
        match resolution {
            Resolution::Node(node) | Resolution::Listing(node) => node.path(),
            Resolution::Processor { node, .. } => node.path(),
            other => panic!("unexpected resolution {other:?}"),
        }
    }

    #[test]
    fn test_is_insecure() {
        assert!(is_insecure(".."));
        assert!(is_insecure("a/b"));
        assert!(is_insecure(&format!("a{MAIN_SEPARATOR}b")));
        assert!(!is_insecure("."));
        assert!(!is_insecure("..."));
        assert!(!is_insecure("file..txt"));
        assert!(!is_insecure(""));
    }

    #[tokio::test]
    async fn test_traverse_file() {
        let dir = fixture();
        let root = Arc::new(ServingRoot::new(dir.path()));
        let resolution = traverse(root, &segments("readme.txt")).await;
        assert!(matches!(resolution, Resolution::Node(ref n) if !n.is_dir()));
        assert_eq!(node_path(&resolution), dir.path().join("readme.txt"));
    }

    #[tokio::test]
    async fn test_traverse_rejects_dotdot() {
        let dir = fixture();
        let root = Arc::new(ServingRoot::new(dir.path().join("docs")));
        let resolution = traverse(root, &segments("../readme.txt")).await;
        assert!(matches!(resolution, Resolution::Insecure));
    }

    #[tokio::test]
    async fn test_trailing_slash_finds_index() {
        let dir = fixture();
        let root = Arc::new(ServingRoot::new(dir.path()));
        let resolution = traverse(root, &segments("docs/")).await;
        assert_eq!(node_path(&resolution), dir.path().join("docs").join("index.html"));
    }

    #[tokio::test]
    async fn test_index_directory_is_not_an_index_file() {
        let dir = fixture();
        fs::create_dir(dir.path().join("empty").join("index.html")).unwrap();
        let root = Arc::new(ServingRoot::new(dir.path()));
        let resolution = traverse(root, &segments("empty/")).await;
        assert!(matches!(resolution, Resolution::Listing(_)));
        assert_eq!(node_path(&resolution), dir.path().join("empty"));
    }

    #[tokio::test]
    async fn test_trailing_slash_without_index_lists() {
        let dir = fixture();
        let root = Arc::new(ServingRoot::new(dir.path()));
        let resolution = traverse(root, &segments("empty/")).await;
        assert!(matches!(resolution, Resolution::Listing(_)));
    }

    #[tokio::test]
    async fn test_directory_without_slash_is_node() {
        let dir = fixture();
        let root = Arc::new(ServingRoot::new(dir.path()));
        let resolution = traverse(root, &segments("docs")).await;
        assert!(matches!(resolution, Resolution::Node(ref n) if n.is_dir()));

        let resolution = traverse(Arc::new(ServingRoot::new(dir.path())), &[]).await;
        assert!(matches!(resolution, Resolution::Node(ref n) if n.is_dir()));
    }

    #[tokio::test]
    async fn test_missing_and_file_parent() {
        let dir = fixture();
        let root = Arc::new(ServingRoot::new(dir.path()));
        assert!(matches!(
            traverse(Arc::clone(&root), &segments("nope")).await,
            Resolution::NotFound
        ));
        assert!(matches!(
            traverse(root, &segments("readme.txt/more")).await,
            Resolution::NotFound
        ));
    }

    #[tokio::test]
    async fn test_sibling_extension_search() {
        let dir = fixture();
        let root = Arc::new(
            ServingRoot::new(dir.path()).with_ignored_exts(vec![".md".into(), ".txt".into()]),
        );
        let resolution = traverse(root, &segments("readme")).await;
        assert_eq!(node_path(&resolution), dir.path().join("readme.txt"));
    }

    #[tokio::test]
    async fn test_sibling_wildcard_takes_first_sorted() {
        let dir = fixture();
        fs::write(dir.path().join("notes.zz"), "z").unwrap();
        fs::write(dir.path().join("notes.aa"), "a").unwrap();
        let root = Arc::new(ServingRoot::new(dir.path()).with_ignored_exts(vec!["*".into()]));
        let resolution = traverse(root, &segments("notes")).await;
        assert_eq!(node_path(&resolution), dir.path().join("notes.aa"));
    }

    #[tokio::test]
    async fn test_processor_dispatch() {
        let dir = fixture();
        let root = Arc::new(ServingRoot::new(dir.path()).with_processor("asis", ProcessorKind::Asis));
        let resolution = traverse(Arc::clone(&root), &segments("page.asis")).await;
        assert!(matches!(
            resolution,
            Resolution::Processor {
                kind: ProcessorKind::Asis,
                ..
            }
        ));

        let resolution = traverse(root, &segments("readme.txt")).await;
        assert!(matches!(resolution, Resolution::Node(_)));
    }

    #[tokio::test]
    async fn test_sibling_hit_can_dispatch_processor() {
        let dir = fixture();
        let root = Arc::new(
            ServingRoot::new(dir.path())
                .with_ignored_exts(vec![".asis".into()])
                .with_processor("asis", ProcessorKind::Asis),
        );
        let resolution = traverse(root, &segments("page")).await;
        assert!(matches!(resolution, Resolution::Processor { .. }));
    }
}
