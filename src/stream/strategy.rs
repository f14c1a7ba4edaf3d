//! Picks the producer strategy for a request and computes its status line
//! and content headers.

use hyper::header::{
    HeaderMap, HeaderName, HeaderValue, CONTENT_ENCODING, CONTENT_LENGTH, CONTENT_RANGE,
    CONTENT_TYPE,
};
use hyper::StatusCode;

use super::multipart::{generate_boundary, MultipartPlan};
use super::producers::{MultipleRangeProducer, SingleRangeProducer, WholeFileProducer};
use super::StaticProducer;
use crate::http::mime::MediaType;
use crate::http::range::{parse_range_header, resolve_range, unsatisfied_content_range, RangeSpec};
use crate::logger;

/// Status, content headers and (unless unsatisfiable) the body producer
pub struct Prepared<F> {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub producer: Option<StaticProducer<F>>,
}

impl<F> Prepared<F> {
    fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            producer: None,
        }
    }

    fn set(&mut self, name: HeaderName, value: impl ToString) {
        match HeaderValue::from_str(&value.to_string()) {
            Ok(v) => {
                self.headers.insert(name, v);
            }
            Err(e) => logger::log_warning(&format!("Dropping invalid {name} header value: {e}")),
        }
    }

    fn set_content_headers(&mut self, media: &MediaType, size: u64) {
        self.set(CONTENT_LENGTH, size);
        self.set(CONTENT_TYPE, &media.content_type);
        if let Some(encoding) = &media.encoding {
            self.set(CONTENT_ENCODING, encoding);
        }
    }
}

/// Choose whole-file, single-range or multi-range production
///
/// A Range header that fails to parse is ignored and the whole file is sent.
///
/// # Arguments
/// * `range_header` - Value of the request's Range header
/// * `media` - Resolved type and encoding of the file
/// * `total` - File size from the request's snapshot
/// * `file` - File opened for reading; dropped when no body will be sent
pub fn make_producer<F>(
    range_header: Option<&str>,
    media: &MediaType,
    total: u64,
    file: F,
) -> Prepared<F> {
    let specs = match range_header.map(parse_range_header) {
        None => return whole_file(media, total, file),
        Some(Err(e)) => {
            logger::log_debug(&format!(
                "Ignoring malformed Range header {:?}: {e}",
                range_header.unwrap_or_default()
            ));
            return whole_file(media, total, file);
        }
        Some(Ok(specs)) => specs,
    };

    if let [spec] = specs.as_slice() {
        single_range(*spec, media, total, file)
    } else {
        multiple_ranges(&specs, media, total, file)
    }
}

fn whole_file<F>(media: &MediaType, total: u64, file: F) -> Prepared<F> {
    let mut prepared = Prepared::new(StatusCode::OK);
    prepared.set_content_headers(media, total);
    prepared.producer = Some(StaticProducer::Whole(WholeFileProducer::new(file, total)));
    prepared
}

fn single_range<F>(spec: RangeSpec, media: &MediaType, total: u64, file: F) -> Prepared<F> {
    let range = resolve_range(spec, total);
    if !range.is_satisfiable() {
        let mut prepared = Prepared::new(StatusCode::RANGE_NOT_SATISFIABLE);
        prepared.set(CONTENT_RANGE, unsatisfied_content_range(total));
        prepared.set_content_headers(media, 0);
        return prepared;
    }

    let mut prepared = Prepared::new(StatusCode::PARTIAL_CONTENT);
    prepared.set(CONTENT_RANGE, range.content_range(total));
    prepared.set_content_headers(media, range.size);
    prepared.producer = Some(StaticProducer::Single(SingleRangeProducer::new(
        file,
        range.offset,
        range.size,
    )));
    prepared
}

fn multiple_ranges<F>(specs: &[RangeSpec], media: &MediaType, total: u64, file: F) -> Prepared<F> {
    let Some(plan) = MultipartPlan::build(specs, total, &media.content_type, generate_boundary())
    else {
        let mut prepared = Prepared::new(StatusCode::RANGE_NOT_SATISFIABLE);
        prepared.set(CONTENT_LENGTH, 0);
        prepared.set(CONTENT_RANGE, unsatisfied_content_range(total));
        return prepared;
    };

    let mut prepared = Prepared::new(StatusCode::PARTIAL_CONTENT);
    prepared.set(CONTENT_TYPE, plan.content_type());
    prepared.set(CONTENT_LENGTH, plan.content_length);
    prepared.producer = Some(StaticProducer::Multiple(MultipleRangeProducer::new(
        file, plan.parts,
    )));
    prepared
}

#[cfg(test)]
mod tests {
    use super::super::testing::{drain, sample, RecordingConsumer};
    use super::*;
    use std::io::Cursor;

    fn text() -> MediaType {
        MediaType {
            content_type: "text/plain".to_string(),
            encoding: None,
        }
    }

    fn header<'a, F>(prepared: &'a Prepared<F>, name: &HeaderName) -> &'a str {
        prepared.headers.get(name).unwrap().to_str().unwrap()
    }

    #[test]
    fn test_no_range_header() {
        let prepared = make_producer(None, &text(), 500, Cursor::new(sample(500)));
        assert_eq!(prepared.status, StatusCode::OK);
        assert_eq!(header(&prepared, &CONTENT_LENGTH), "500");
        assert_eq!(header(&prepared, &CONTENT_TYPE), "text/plain");
        assert!(prepared.headers.get(CONTENT_ENCODING).is_none());
        assert!(matches!(prepared.producer, Some(StaticProducer::Whole(_))));
    }

    #[test]
    fn test_encoding_header() {
        let media = MediaType {
            content_type: "text/plain".to_string(),
            encoding: Some("gzip".to_string()),
        };
        let prepared = make_producer(None, &media, 3, Cursor::new(sample(3)));
        assert_eq!(header(&prepared, &CONTENT_ENCODING), "gzip");
    }

    #[test]
    fn test_malformed_range_degrades_to_full() {
        for value in ["bytes=abc", "bytes=5-1", "pages=1-2", "bytes=0-1,zz"] {
            let prepared = make_producer(Some(value), &text(), 500, Cursor::new(sample(500)));
            assert_eq!(prepared.status, StatusCode::OK, "{value}");
            assert_eq!(header(&prepared, &CONTENT_LENGTH), "500");
        }
    }

    #[tokio::test]
    async fn test_single_range() {
        let data = sample(500);
        let prepared = make_producer(Some("bytes=0-99"), &text(), 500, Cursor::new(data.clone()));
        assert_eq!(prepared.status, StatusCode::PARTIAL_CONTENT);
        assert_eq!(header(&prepared, &CONTENT_RANGE), "bytes 0-99/500");
        assert_eq!(header(&prepared, &CONTENT_LENGTH), "100");

        let mut producer = prepared.producer.unwrap();
        let mut consumer = RecordingConsumer::default();
        drain(&mut producer, &mut consumer).await;
        assert_eq!(consumer.body(), &data[..100]);
    }

    #[test]
    fn test_suffix_range() {
        let prepared = make_producer(Some("bytes=-50"), &text(), 500, Cursor::new(sample(500)));
        assert_eq!(header(&prepared, &CONTENT_RANGE), "bytes 450-499/500");
    }

    #[test]
    fn test_single_unsatisfiable() {
        let prepared = make_producer(Some("bytes=1000-2000"), &text(), 500, Cursor::new(sample(500)));
        assert_eq!(prepared.status, StatusCode::RANGE_NOT_SATISFIABLE);
        assert_eq!(header(&prepared, &CONTENT_RANGE), "bytes */500");
        assert_eq!(header(&prepared, &CONTENT_LENGTH), "0");
        assert!(prepared.producer.is_none());
    }

    #[test]
    fn test_multiple_ranges_headers() {
        let prepared = make_producer(Some("bytes=0-10,20-30"), &text(), 500, Cursor::new(sample(500)));
        assert_eq!(prepared.status, StatusCode::PARTIAL_CONTENT);
        assert!(header(&prepared, &CONTENT_TYPE).starts_with("multipart/byteranges; boundary=\""));
        assert!(prepared.headers.get(CONTENT_RANGE).is_none());
        assert!(matches!(prepared.producer, Some(StaticProducer::Multiple(_))));
    }

    #[test]
    fn test_multiple_unsatisfiable() {
        let prepared =
            make_producer(Some("bytes=600-700,800-"), &text(), 500, Cursor::new(sample(500)));
        assert_eq!(prepared.status, StatusCode::RANGE_NOT_SATISFIABLE);
        assert_eq!(header(&prepared, &CONTENT_LENGTH), "0");
        assert_eq!(header(&prepared, &CONTENT_RANGE), "bytes */500");
        assert!(prepared.producer.is_none());
    }
}
