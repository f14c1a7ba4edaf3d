//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: method validation, fixed data
//! routes, mount matching and dispatch into the resource layer.

use hyper::body::Incoming;
use hyper::header::{HeaderName, CONTENT_LENGTH, REFERER, USER_AGENT};
use hyper::http::request::Parts;
use hyper::{Method, Request, Response, Version};
use percent_encoding::percent_decode_str;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use crate::config::AppState;
use crate::http::{self, ServeBody};
use crate::logger::{self, AccessLogEntry};
use crate::resource;

/// Main entry point for HTTP request handling
pub async fn handle_request(
    req: Request<Incoming>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<ServeBody>, Infallible> {
    let started = Instant::now();
    let (parts, _body) = req.into_parts();

    let response = respond(&parts, &state).await;

    if state.config.logging.access_log {
        let entry = access_entry(&parts, &response, peer_addr, started);
        logger::log_access(&entry, state.config.logging.access_log_format);
    }
    Ok(response)
}

/// Build the response for one request
pub async fn respond(parts: &Parts, state: &AppState) -> Response<ServeBody> {
    if let Some(resp) = check_http_method(&parts.method) {
        return resp;
    }

    let path = parts.uri.path();
    if let Some(data) = state.data.get(path) {
        return data.render(parts.method == Method::HEAD);
    }

    let Some((mount, rest)) = state.find_mount(path) else {
        return http::build_404_response();
    };
    let Some(segments) = split_segments(rest) else {
        logger::log_debug(&format!("Rejecting undecodable path {path:?}"));
        return http::build_404_response();
    };

    match resource::serve_path(Arc::clone(&mount.root), &segments, parts).await {
        Ok(resp) => resp,
        Err(e) => {
            logger::log_error(&format!("{} {path}: {e}", parts.method));
            http::build_500_response()
        }
    }
}

/// Check HTTP method and return appropriate response for non-GET/HEAD methods
fn check_http_method(method: &Method) -> Option<Response<ServeBody>> {
    match *method {
        Method::GET | Method::HEAD => None,
        Method::OPTIONS => Some(http::build_options_response()),
        _ => {
            logger::log_warning(&format!("Method not allowed: {method}"));
            Some(http::build_405_response())
        }
    }
}

/// Percent-decoded segments of the path below a mount
///
/// `""` (the mount prefix itself) has no segments; `"/"` has one empty
/// segment. Returns `None` when a segment is not valid UTF-8 once decoded.
fn split_segments(rest: &str) -> Option<Vec<String>> {
    let Some(rest) = rest.strip_prefix('/') else {
        return Some(Vec::new());
    };
    rest.split('/')
        .map(|s| percent_decode_str(s).decode_utf8().ok().map(|d| d.into_owned()))
        .collect()
}

fn access_entry(
    parts: &Parts,
    response: &Response<ServeBody>,
    peer_addr: SocketAddr,
    started: Instant,
) -> AccessLogEntry {
    let header = |name: HeaderName| {
        parts
            .headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string)
    };

    let mut entry = AccessLogEntry::new(
        peer_addr.ip().to_string(),
        parts.method.to_string(),
        parts.uri.path().to_string(),
    );
    entry.query = parts.uri.query().map(ToString::to_string);
    entry.http_version = version_label(parts.version).to_string();
    entry.status = response.status().as_u16();
    entry.body_bytes = response
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok());
    entry.referer = header(REFERER);
    entry.user_agent = header(USER_AGENT);
    entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
    entry
}

const fn version_label(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        Version::HTTP_3 => "3",
        _ => "1.1",
    }
}
