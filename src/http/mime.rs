//! MIME type detection module
//!
//! Resolves a file name to its `Content-Type` and optional `Content-Encoding`.
//! A compression suffix (`.gz`, `.bz2`) is reported as the encoding and the
//! type comes from the extension underneath it, so `notes.txt.gz` is served
//! as `text/plain` with `Content-Encoding: gzip`.

use std::collections::HashMap;
use std::sync::OnceLock;

/// Extension (lowercase, with leading dot) to value.
pub type ExtensionTable = HashMap<String, String>;

/// Resolved type and encoding of one file name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaType {
    pub content_type: String,
    pub encoding: Option<String>,
}

const BUILTIN_TYPES: &[(&str, &str)] = &[
    // Text
    (".html", "text/html"),
    (".htm", "text/html"),
    (".css", "text/css"),
    (".txt", "text/plain"),
    (".text", "text/plain"),
    (".md", "text/markdown"),
    (".csv", "text/csv"),
    (".xml", "text/xml"),
    (".conf", "text/plain"),
    (".diff", "text/plain"),
    (".patch", "text/plain"),
    (".java", "text/plain"),
    (".py", "text/plain"),
    (".rs", "text/plain"),
    (".oz", "text/x-oz"),
    (".wml", "text/vnd.wap.wml"),
    // JavaScript/WASM
    (".js", "application/javascript"),
    (".mjs", "application/javascript"),
    (".json", "application/json"),
    (".wasm", "application/wasm"),
    (".xul", "application/vnd.mozilla.xul+xml"),
    // Images
    (".png", "image/png"),
    (".jpg", "image/jpeg"),
    (".jpeg", "image/jpeg"),
    (".gif", "image/gif"),
    (".svg", "image/svg+xml"),
    (".ico", "image/vnd.microsoft.icon"),
    (".webp", "image/webp"),
    // Video
    (".mp4", "video/mp4"),
    (".webm", "video/webm"),
    (".ogv", "video/ogg"),
    (".mov", "video/quicktime"),
    (".avi", "video/x-msvideo"),
    // Audio
    (".mp3", "audio/mpeg"),
    (".wav", "audio/x-wav"),
    (".flac", "audio/x-flac"),
    (".ogg", "application/ogg"),
    (".m4a", "audio/mp4"),
    // Fonts
    (".woff", "font/woff"),
    (".woff2", "font/woff2"),
    (".ttf", "font/ttf"),
    (".otf", "font/otf"),
    // Archives and documents
    (".pdf", "application/pdf"),
    (".zip", "application/zip"),
    (".tar", "application/x-tar"),
    (".tgz", "application/x-gtar"),
    (".exe", "application/x-executable"),
    (".swf", "application/x-shockwave-flash"),
];

const BUILTIN_ENCODINGS: &[(&str, &str)] = &[(".gz", "gzip"), (".bz2", "bzip2")];

static DEFAULT_TYPES: OnceLock<ExtensionTable> = OnceLock::new();

/// Process-wide content-type table, built on first use and never mutated.
pub fn default_content_types() -> &'static ExtensionTable {
    DEFAULT_TYPES.get_or_init(|| table_from(BUILTIN_TYPES))
}

pub fn default_content_encodings() -> ExtensionTable {
    table_from(BUILTIN_ENCODINGS)
}

/// Copy of `base` with `overrides` applied.
///
/// Override keys may be given with or without the leading dot and in any case.
pub fn merge_table(base: &ExtensionTable, overrides: &HashMap<String, String>) -> ExtensionTable {
    let mut table = base.clone();
    for (ext, value) in overrides {
        table.insert(normalize_extension(ext), value.clone());
    }
    table
}

/// Lowercase `ext` and make sure it starts with a dot.
pub fn normalize_extension(ext: &str) -> String {
    let ext = ext.to_ascii_lowercase();
    if ext.starts_with('.') {
        ext
    } else {
        format!(".{ext}")
    }
}

/// Split `name` into stem and extension (extension keeps its dot).
///
/// Leading dots do not start an extension, so `.profile` has none.
pub fn split_extension(name: &str) -> (&str, &str) {
    let Some(dot) = name.rfind('.') else {
        return (name, "");
    };
    if name[..dot].bytes().all(|b| b == b'.') {
        return (name, "");
    }
    name.split_at(dot)
}

/// Resolve `filename` against the type and encoding tables
///
/// # Examples
/// ```
/// use rust_fileserver::http::mime::{default_content_encodings, default_content_types, resolve_type};
///
/// let encodings = default_content_encodings();
/// let media = resolve_type("a.txt.gz", default_content_types(), &encodings, "text/html");
/// assert_eq!(media.content_type, "text/plain");
/// assert_eq!(media.encoding.as_deref(), Some("gzip"));
/// ```
pub fn resolve_type(
    filename: &str,
    types: &ExtensionTable,
    encodings: &ExtensionTable,
    default_type: &str,
) -> MediaType {
    let (stem, ext) = split_extension(filename);
    let mut ext = ext.to_ascii_lowercase();

    let encoding = encodings.get(&ext).cloned();
    if encoding.is_some() {
        ext = split_extension(stem).1.to_ascii_lowercase();
    }

    let content_type = types
        .get(&ext)
        .cloned()
        .unwrap_or_else(|| default_type.to_string());

    MediaType {
        content_type,
        encoding,
    }
}

fn table_from(entries: &[(&str, &str)]) -> ExtensionTable {
    entries
        .iter()
        .map(|(ext, value)| ((*ext).to_string(), (*value).to_string()))
        .collect()
}
