//! HTTP response building module
//!
//! Canned responses for the outcomes that carry no file content.

use hyper::header::{HeaderValue, ALLOW, CONTENT_LENGTH, CONTENT_TYPE, LAST_MODIFIED, LOCATION};
use hyper::{Response, StatusCode};

use super::body::{empty_body, full_body, ServeBody};

const ALLOWED_METHODS: &str = "GET, HEAD, OPTIONS";

/// Build 304 Not Modified response
pub fn build_304_response(last_modified: &str) -> Response<ServeBody> {
    Response::builder()
        .status(StatusCode::NOT_MODIFIED)
        .header(LAST_MODIFIED, last_modified)
        .header("Accept-Ranges", "bytes")
        .body(empty_body())
        .unwrap_or_else(|e| fallback("304", &e, StatusCode::NOT_MODIFIED))
}

/// Build 403 Forbidden response
pub fn build_403_response() -> Response<ServeBody> {
    text_response(StatusCode::FORBIDDEN, "403 Forbidden")
}

/// Build 404 Not Found response
pub fn build_404_response() -> Response<ServeBody> {
    text_response(StatusCode::NOT_FOUND, "404 Not Found")
}

/// Build 405 Method Not Allowed response
pub fn build_405_response() -> Response<ServeBody> {
    let mut response = text_response(StatusCode::METHOD_NOT_ALLOWED, "405 Method Not Allowed");
    response
        .headers_mut()
        .insert(ALLOW, HeaderValue::from_static(ALLOWED_METHODS));
    response
}

/// Build 500 Internal Server Error response
pub fn build_500_response() -> Response<ServeBody> {
    text_response(StatusCode::INTERNAL_SERVER_ERROR, "500 Internal Server Error")
}

/// Build OPTIONS response
pub fn build_options_response() -> Response<ServeBody> {
    Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header(ALLOW, ALLOWED_METHODS)
        .body(empty_body())
        .unwrap_or_else(|e| fallback("OPTIONS", &e, StatusCode::NO_CONTENT))
}

/// Build 302 redirect response with an empty body
pub fn build_redirect_response(target: &str) -> Response<ServeBody> {
    Response::builder()
        .status(StatusCode::FOUND)
        .header(LOCATION, target)
        .header(CONTENT_LENGTH, 0)
        .body(empty_body())
        .unwrap_or_else(|e| fallback("302", &e, StatusCode::FOUND))
}

/// Build HTML response; HEAD keeps the length but drops the body
pub fn build_html_response(content: String, is_head: bool) -> Response<ServeBody> {
    let content_length = content.len();
    let body = if is_head {
        empty_body()
    } else {
        full_body(content)
    };

    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, "text/html; charset=utf-8")
        .header(CONTENT_LENGTH, content_length)
        .body(body)
        .unwrap_or_else(|e| fallback("HTML", &e, StatusCode::OK))
}

fn text_response(status: StatusCode, text: &'static str) -> Response<ServeBody> {
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "text/plain")
        .header(CONTENT_LENGTH, text.len())
        .body(full_body(text))
        .unwrap_or_else(|e| fallback(status.as_str(), &e, status))
}

/// Log response build error and answer with a bare status
fn fallback(what: &str, error: &hyper::http::Error, status: StatusCode) -> Response<ServeBody> {
    crate::logger::log_error(&format!("Failed to build {what} response: {error}"));
    let mut response = Response::new(empty_body());
    *response.status_mut() = status;
    response
}
