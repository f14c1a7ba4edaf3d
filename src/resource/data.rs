//! Fixed in-memory responses.

use hyper::body::Bytes;
use hyper::header::{CONTENT_LENGTH, CONTENT_TYPE};
use hyper::{Response, StatusCode};

use crate::http::body::{empty_body, full_body, ServeBody};
use crate::logger;

#[derive(Debug, Clone)]
pub struct StaticData {
    content_type: String,
    data: Bytes,
}

impl StaticData {
    pub fn new(content_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            content_type: content_type.into(),
            data: data.into(),
        }
    }

    pub fn render(&self, is_head: bool) -> Response<ServeBody> {
        let body = if is_head {
            empty_body()
        } else {
            full_body(self.data.clone())
        };
        Response::builder()
            .status(StatusCode::OK)
            .header(CONTENT_TYPE, &self.content_type)
            .header(CONTENT_LENGTH, self.data.len())
            .body(body)
            .unwrap_or_else(|e| {
                logger::log_error(&format!("Failed to build data response: {e}"));
                Response::new(empty_body())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::testing::{body_string, header};

    #[tokio::test]
    async fn test_render() {
        let data = StaticData::new("text/plain", "User-agent: *\nDisallow:\n");
        let resp = data.render(false);
        assert_eq!(header(&resp, "content-type"), "text/plain");
        assert_eq!(header(&resp, "content-length"), "24");
        assert_eq!(body_string(resp).await, "User-agent: *\nDisallow:\n");

        let resp = data.render(true);
        assert_eq!(header(&resp, "content-length"), "24");
        assert_eq!(body_string(resp).await, "");
    }

    #[test]
    fn test_bad_content_type_still_responds() {
        let resp = StaticData::new("bad\nvalue", "x").render(false);
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
