//! File resource module
//!
//! Turns one resolved node into a response: redirect or listing for
//! directories, then conditional GET, range selection and streaming for
//! files.

use hyper::header::{HeaderValue, ACCEPT_RANGES, IF_MODIFIED_SINCE, LAST_MODIFIED, RANGE};
use hyper::http::request::Parts;
use hyper::{Method, Response, Uri};
use std::io::ErrorKind;

use super::listing::DirectoryLister;
use super::path::FileNode;
use super::target::ResolvedTarget;
use crate::error::ServeError;
use crate::http::body::{empty_body, ServeBody};
use crate::http::cache::{format_http_date, is_not_modified, modified_seconds};
use crate::http::mime::MediaType;
use crate::http::response::{
    build_304_response, build_403_response, build_404_response, build_redirect_response,
};
use crate::logger;
use crate::stream::{make_producer, producer_body};

/// A file or directory below a serving root
#[derive(Debug, Clone)]
pub struct FileResource {
    node: FileNode,
    media_override: Option<MediaType>,
}

impl FileResource {
    pub const fn new(node: FileNode) -> Self {
        Self {
            node,
            media_override: None,
        }
    }

    /// Serve with a fixed type instead of the one derived from the name
    #[must_use]
    pub fn with_media(mut self, media: Option<MediaType>) -> Self {
        self.media_override = media;
        self
    }

    /// Produce the response for `req`
    ///
    /// # Returns
    /// Not-found, forbidden, redirect and range outcomes are ordinary
    /// responses. An open failure other than permission denied is returned as
    /// an error for the caller to report.
    pub async fn render(&self, req: &Parts) -> Result<Response<ServeBody>, ServeError> {
        let mut target = ResolvedTarget::snapshot(self.node.serving_root(), self.node.path()).await;
        if let Some(media) = &self.media_override {
            target = target.with_media(media.clone());
        }

        if !target.exists {
            return Ok(build_404_response());
        }
        if target.is_dir {
            if req.uri.path().ends_with('/') {
                return Ok(DirectoryLister::new(self.node.clone()).render(req).await);
            }
            return Ok(build_redirect_response(&add_slash(&req.uri)));
        }

        let file = match tokio::fs::File::open(&target.path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::PermissionDenied => {
                logger::log_warning(&format!("Permission denied opening {}", target.path.display()));
                let mut response = build_403_response();
                response
                    .headers_mut()
                    .insert(ACCEPT_RANGES, HeaderValue::from_static("bytes"));
                return Ok(response);
            }
            Err(e) => return Err(ServeError::io(&target.path, e)),
        };

        let last_modified = target.modified.map(|m| {
            let secs = modified_seconds(m);
            (secs, format_http_date(secs))
        });
        if let Some((secs, ref formatted)) = last_modified {
            let since = req
                .headers
                .get(IF_MODIFIED_SINCE)
                .and_then(|v| v.to_str().ok());
            if is_not_modified(since, secs) {
                return Ok(build_304_response(formatted));
            }
        }

        let range = req.headers.get(RANGE).and_then(|v| v.to_str().ok());
        let prepared = make_producer(range, &target.media, target.size, file);

        let mut response = Response::new(empty_body());
        *response.status_mut() = prepared.status;
        let headers = response.headers_mut();
        headers.insert(ACCEPT_RANGES, HeaderValue::from_static("bytes"));
        if let Some((_, formatted)) = last_modified {
            if let Ok(value) = HeaderValue::from_str(&formatted) {
                headers.insert(LAST_MODIFIED, value);
            }
        }
        headers.extend(prepared.headers);

        if req.method != Method::HEAD {
            if let Some(producer) = prepared.producer {
                *response.body_mut() = producer_body(producer);
            }
        }
        Ok(response)
    }
}

/// Same URL with a slash after the path, query kept
fn add_slash(uri: &Uri) -> String {
    match uri.query() {
        Some(query) => format!("{}/?{query}", uri.path()),
        None => format!("{}/", uri.path()),
    }
}
