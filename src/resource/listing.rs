//! Directory listing module
//!
//! Renders an HTML table of a directory's entries.

use hyper::http::request::Parts;
use hyper::{Method, Response};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::fmt::Write as _;

use super::path::FileNode;
use crate::http::body::ServeBody;
use crate::http::mime::MediaType;
use crate::http::response::build_html_response;
use crate::logger;

/// Characters left alone in entry links, besides ASCII alphanumerics.
const HREF: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'_')
    .remove(b'.')
    .remove(b'-')
    .remove(b'~');

const STYLE: &str = "\
    body { font-family: sans-serif; margin: 2em; }\n\
    table { border-collapse: collapse; }\n\
    th, td { text-align: left; padding: 0.2em 1em; }\n\
    tr.odd { background-color: #f0f0f0; }\n\
    tr.even { background-color: #ffffff; }\n";

/// One row of a listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub name: String,
    pub is_dir: bool,
    pub size: u64,
    /// Resolved type and encoding; `None` for directories
    pub media: Option<MediaType>,
}

/// Lists a directory node, optionally restricted to given names
#[derive(Debug, Clone)]
pub struct DirectoryLister {
    node: FileNode,
    names: Option<Vec<String>>,
}

impl DirectoryLister {
    pub const fn new(node: FileNode) -> Self {
        Self { node, names: None }
    }

    /// List only `names`, in the order given
    pub const fn with_names(node: FileNode, names: Vec<String>) -> Self {
        Self {
            node,
            names: Some(names),
        }
    }

    /// Stat each entry; entries that vanish before they are stat'ed are skipped
    pub async fn entries(&self) -> Vec<DirectoryEntry> {
        let names = match &self.names {
            Some(names) => names.clone(),
            None => self.sorted_names().await,
        };

        let root = self.node.serving_root();
        let mut entries = Vec::with_capacity(names.len());
        for name in names {
            let path = self.node.path().join(&name);
            match tokio::fs::metadata(&path).await {
                Ok(meta) if meta.is_dir() => entries.push(DirectoryEntry {
                    name,
                    is_dir: true,
                    size: 0,
                    media: None,
                }),
                Ok(meta) => {
                    let media = root.media_for_name(&name);
                    entries.push(DirectoryEntry {
                        name,
                        is_dir: false,
                        size: meta.len(),
                        media: Some(media),
                    });
                }
                Err(e) => {
                    logger::log_debug(&format!("Skipping listing entry {}: {e}", path.display()));
                }
            }
        }
        entries
    }

    async fn sorted_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        let mut dir = match tokio::fs::read_dir(self.node.path()).await {
            Ok(dir) => dir,
            Err(e) => {
                logger::log_warning(&format!(
                    "Failed to read directory {}: {e}",
                    self.node.path().display()
                ));
                return names;
            }
        };
        while let Ok(Some(entry)) = dir.next_entry().await {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        names
    }

    /// Listing page for `req`; HEAD gets the headers only
    pub async fn render(&self, req: &Parts) -> Response<ServeBody> {
        let request_path = req
            .uri
            .path_and_query()
            .map_or_else(|| req.uri.path().to_string(), ToString::to_string);
        let html = render_listing(&self.entries().await, &request_path);
        build_html_response(html, req.method == Method::HEAD)
    }
}

/// Build the listing page
///
/// # Arguments
/// * `entries` - Rows in display order
/// * `request_path` - Raw request path, shown decoded in the title
pub fn render_listing(entries: &[DirectoryEntry], request_path: &str) -> String {
    let decoded = percent_decode_str(request_path).decode_utf8_lossy();
    let title = format!("Directory listing for {}", escape_html(&decoded));

    let mut rows = String::new();
    for (i, entry) in entries.iter().enumerate() {
        let class = if i % 2 == 0 { "odd" } else { "even" };
        let mut href = utf8_percent_encode(&entry.name, HREF).to_string();
        let mut text = escape_html(&entry.name);
        let (size, content_type, encoding) = if entry.is_dir {
            href.push('/');
            text.push('/');
            (String::new(), "[Directory]".to_string(), String::new())
        } else {
            let (content_type, encoding) = entry.media.as_ref().map_or_else(
                || (String::new(), String::new()),
                |m| {
                    (
                        format!("[{}]", escape_html(&m.content_type)),
                        m.encoding
                            .as_ref()
                            .map(|e| format!("[{}]", escape_html(e)))
                            .unwrap_or_default(),
                    )
                },
            );
            (format_file_size(entry.size), content_type, encoding)
        };
        let _ = writeln!(
            rows,
            "<tr class=\"{class}\">\n    <td><a href=\"{href}\">{text}</a></td>\n    \
             <td>{size}</td>\n    <td>{content_type}</td>\n    <td>{encoding}</td>\n</tr>"
        );
    }

    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n\
         <style>\n{STYLE}</style>\n</head>\n<body>\n<h1>{title}</h1>\n\n<table>\n    <thead>\n        \
         <tr>\n            <th>Filename</th>\n            <th>Size</th>\n            \
         <th>Content type</th>\n            <th>Content encoding</th>\n        </tr>\n    \
         </thead>\n    <tbody>\n{rows}    </tbody>\n</table>\n\n</body>\n</html>\n"
    )
}

/// Human-readable size in 1024-based units, truncated
///
/// # Examples
/// ```
/// use rust_fileserver::resource::listing::format_file_size;
/// assert_eq!(format_file_size(1023), "1023B");
/// assert_eq!(format_file_size(1536), "1K");
/// assert_eq!(format_file_size(5 * 1024 * 1024 * 1024), "5G");
/// ```
pub fn format_file_size(size: u64) -> String {
    const K: u64 = 1024;
    if size < K {
        format!("{size}B")
    } else if size < K * K {
        format!("{}K", size / K)
    } else if size < K * K * K {
        format!("{}M", size / (K * K))
    } else {
        format!("{}G", size / (K * K * K))
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::path::{traverse, Resolution};
    use crate::resource::root::ServingRoot;
    use crate::resource::testing::{body_string, header, request_parts};
    use std::fs;
    use std::sync::Arc;

    fn file(name: &str, size: u64, content_type: &str, encoding: Option<&str>) -> DirectoryEntry {
        DirectoryEntry {
            name: name.to_string(),
            is_dir: false,
            size,
            media: Some(MediaType {
                content_type: content_type.to_string(),
                encoding: encoding.map(ToString::to_string),
            }),
        }
    }

    async fn listed_dir(dir: &tempfile::TempDir) -> FileNode {
        let root = Arc::new(ServingRoot::new(dir.path()));
        match traverse(root, &[String::new()]).await {
            Resolution::Listing(node) => node,
            other => panic!("expected a listing, got {other:?}"),
        }
    }

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0B");
        assert_eq!(format_file_size(1024), "1K");
        assert_eq!(format_file_size(1024 * 1024 - 1), "1023K");
        assert_eq!(format_file_size(3 * 1024 * 1024 + 7), "3M");
        assert_eq!(format_file_size(1024 * 1024 * 1024), "1G");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<a href='x'>&\"</a>"), "&lt;a href=&#x27;x&#x27;&gt;&amp;&quot;&lt;/a&gt;");
    }

    #[test]
    fn test_render_rows() {
        let entries = vec![
            DirectoryEntry {
                name: "sub dir".to_string(),
                is_dir: true,
                size: 0,
                media: None,
            },
            file("a<b>.txt.gz", 2048, "text/plain", Some("gzip")),
            file("plain.bin", 10, "application/octet-stream", None),
        ];
        let html = render_listing(&entries, "/files/my%20docs/");

        assert!(html.contains("<title>Directory listing for /files/my docs/</title>"));
        assert!(html.contains("<a href=\"sub%20dir/\">sub dir/</a>"));
        assert!(html.contains("<td>[Directory]</td>"));
        assert!(html.contains("<a href=\"a%3Cb%3E.txt.gz\">a&lt;b&gt;.txt.gz</a>"));
        assert!(html.contains("<td>2K</td>"));
        assert!(html.contains("<td>[text/plain]</td>"));
        assert!(html.contains("<td>[gzip]</td>"));
        assert!(html.contains("<td>10B</td>"));

        let odd = html.find("<tr class=\"odd\">").unwrap();
        let even = html.find("<tr class=\"even\">").unwrap();
        assert!(odd < even);
        assert_eq!(html.matches("<tr class=\"odd\">").count(), 2);
    }

    #[test]
    fn test_title_is_escaped() {
        let html = render_listing(&[], "/%3Cscript%3E/");
        assert!(html.contains("Directory listing for /&lt;script&gt;/"));
        assert!(!html.contains("<script>"));
    }

    #[tokio::test]
    async fn test_entries_sorted() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.txt"), "bb").unwrap();
        fs::write(dir.path().join("a.txt"), "a").unwrap();
        fs::create_dir(dir.path().join("c")).unwrap();

        let entries = DirectoryLister::new(listed_dir(&dir).await).entries().await;
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["a.txt", "b.txt", "c"]);
        assert_eq!(entries[1].size, 2);
        assert!(entries[2].is_dir);
        assert!(entries[2].media.is_none());
    }

    #[tokio::test]
    async fn test_restricted_names_keep_order_and_skip_missing() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("one"), "1").unwrap();
        fs::write(dir.path().join("two"), "2").unwrap();

        let names = vec!["two".to_string(), "vanished".to_string(), "one".to_string()];
        let entries = DirectoryLister::with_names(listed_dir(&dir).await, names)
            .entries()
            .await;
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["two", "one"]);
    }

    #[tokio::test]
    async fn test_render_response() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("hello.txt"), "hi").unwrap();
        let lister = DirectoryLister::new(listed_dir(&dir).await);

        let resp = lister.render(&request_parts(Method::GET, "/", &[])).await;
        assert_eq!(header(&resp, "content-type"), "text/html; charset=utf-8");
        let body = body_string(resp).await;
        assert!(body.contains("hello.txt"));

        let resp = lister.render(&request_parts(Method::HEAD, "/", &[])).await;
        assert_eq!(header(&resp, "content-length"), body.len().to_string());
        assert_eq!(body_string(resp).await, "");
    }
}
