//! Processor registry
//!
//! A processor takes over a file whose extension is registered for it. The
//! set of processors is closed and fixed when the configuration is loaded.

use hyper::header::{HeaderName, HeaderValue};
use hyper::http::request::Parts;
use hyper::{Method, Response, StatusCode};
use serde::Deserialize;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::Path;

use crate::error::ServeError;
use crate::http::body::{empty_body, full_body, ServeBody};
use crate::http::mime::MediaType;
use crate::http::response::{build_403_response, build_404_response};
use crate::logger;

/// Type forced on files shown by the `source` processor.
pub const SOURCE_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessorKind {
    /// The file holds a complete HTTP response, sent as written
    Asis,
    /// The file is shown as plain text
    Source,
}

impl ProcessorKind {
    /// Type override applied when the processor serves through `FileResource`
    pub fn media_override(self) -> Option<MediaType> {
        match self {
            Self::Asis => None,
            Self::Source => Some(MediaType {
                content_type: SOURCE_CONTENT_TYPE.to_string(),
                encoding: None,
            }),
        }
    }
}

/// Extension to processor, extensions stored as `.ext`
#[derive(Debug, Clone, Default)]
pub struct ProcessorRegistry {
    by_ext: HashMap<String, ProcessorKind>,
}

impl ProcessorRegistry {
    pub fn register(&mut self, ext: &str, kind: ProcessorKind) {
        self.by_ext.insert(normalize(ext), kind);
    }

    pub fn is_empty(&self) -> bool {
        self.by_ext.is_empty()
    }

    /// Processor for a file name, by its final extension
    pub fn lookup(&self, name: &str) -> Option<ProcessorKind> {
        let (_, ext) = crate::http::mime::split_extension(name);
        if ext.is_empty() {
            return None;
        }
        self.by_ext.get(&normalize(ext)).copied()
    }
}

#[cfg(windows)]
fn normalize(ext: &str) -> String {
    crate::http::mime::normalize_extension(ext)
}

#[cfg(not(windows))]
fn normalize(ext: &str) -> String {
    if ext.starts_with('.') {
        ext.to_string()
    } else {
        format!(".{ext}")
    }
}

/// Send a stored HTTP response
///
/// The file starts with a status line (`HTTP/1.1 200 OK` or `Status: 200`),
/// then header lines, a blank line and the body.
pub async fn render_asis(path: &Path, req: &Parts) -> Result<Response<ServeBody>, ServeError> {
    let raw = match tokio::fs::read(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::PermissionDenied => {
            logger::log_warning(&format!("Permission denied reading {}", path.display()));
            return Ok(build_403_response());
        }
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(build_404_response()),
        Err(e) => return Err(ServeError::io(path, e)),
    };

    let stored = parse_stored_response(&raw).map_err(|reason| ServeError::MalformedAsis {
        path: path.to_path_buf(),
        reason,
    })?;

    let mut builder = Response::builder().status(stored.status);
    for (name, value) in stored.headers {
        builder = builder.header(name, value);
    }

    let body = if req.method == Method::HEAD {
        empty_body()
    } else {
        full_body(stored.body)
    };
    Ok(builder.body(body)?)
}

struct StoredResponse {
    status: StatusCode,
    headers: Vec<(HeaderName, HeaderValue)>,
    body: Vec<u8>,
}

fn parse_stored_response(raw: &[u8]) -> Result<StoredResponse, String> {
    let (head, body) = split_head(raw).ok_or("missing blank line after headers")?;
    let head = std::str::from_utf8(head).map_err(|e| format!("headers are not UTF-8: {e}"))?;
    let mut lines = head.lines();

    let status_line = lines.next().unwrap_or_default();
    let status = parse_status_line(status_line)?;

    let mut headers = Vec::new();
    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| format!("header line without colon: {line:?}"))?;
        let name = HeaderName::from_bytes(name.trim().as_bytes())
            .map_err(|e| format!("bad header name {name:?}: {e}"))?;
        let value =
            HeaderValue::from_str(value.trim()).map_err(|e| format!("bad value for {name}: {e}"))?;
        headers.push((name, value));
    }

    Ok(StoredResponse {
        status,
        headers,
        body: body.to_vec(),
    })
}

fn split_head(raw: &[u8]) -> Option<(&[u8], &[u8])> {
    let crlf = raw.windows(4).position(|w| w == b"\r\n\r\n").map(|i| (i, 4));
    let lf = raw.windows(2).position(|w| w == b"\n\n").map(|i| (i, 2));
    let (at, len) = match (crlf, lf) {
        (Some(a), Some(b)) => {
            if a.0 <= b.0 {
                a
            } else {
                b
            }
        }
        (Some(a), None) => a,
        (None, Some(b)) => b,
        (None, None) => return None,
    };
    Some((&raw[..at], &raw[at + len..]))
}

fn parse_status_line(line: &str) -> Result<StatusCode, String> {
    let code = if let Some(rest) = line.strip_prefix("Status:") {
        rest.split_whitespace().next()
    } else if line.starts_with("HTTP/") {
        line.split_whitespace().nth(1)
    } else {
        None
    };
    code.and_then(|c| c.parse::<u16>().ok())
        .and_then(|c| StatusCode::from_u16(c).ok())
        .ok_or_else(|| format!("bad status line: {line:?}"))
}
