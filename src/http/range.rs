//! HTTP Range request parsing module
//!
//! Range header parsing and byte-range arithmetic, compliant with RFC 7233.
//! Parsing is independent of the resource size; [`resolve_range`] turns a
//! parsed spec into a concrete interval once the size is known.

/// One `first-last` entry of a Range header; at most one side is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeSpec {
    pub start: Option<u64>,
    pub end: Option<u64>,
}

impl RangeSpec {
    pub const fn new(start: Option<u64>, end: Option<u64>) -> Self {
        Self { start, end }
    }
}

/// Why a Range header was rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RangeError {
    #[error("missing '=' separator")]
    MissingEquals,
    #[error("unsupported bytes-unit: {0:?}")]
    UnsupportedUnit(String),
    #[error("invalid byte-range (no '-'): {0:?}")]
    MalformedSpec(String),
    #[error("invalid byte-range (no bounds): {0:?}")]
    MissingBound(String),
    #[error("invalid byte-range (not a number): {0:?}")]
    NotANumber(String),
    #[error("invalid byte-range (start after end): {0:?}")]
    InvalidOrder(String),
    #[error("no byte-ranges given")]
    Empty,
}

/// Parse a Range header value into its byte-range specs
///
/// Supported entry forms:
/// - `start-end` - Specific range, end inclusive
/// - `start-` - From start to end of resource
/// - `-suffix` - Last suffix bytes
///
/// # Examples
/// ```
/// use rust_fileserver::http::range::{parse_range_header, RangeSpec};
///
/// let specs = parse_range_header("bytes=0-99, -20").unwrap();
/// assert_eq!(specs, vec![RangeSpec::new(Some(0), Some(99)), RangeSpec::new(None, Some(20))]);
///
/// assert!(parse_range_header("lines=1-2").is_err());
/// ```
pub fn parse_range_header(header: &str) -> Result<Vec<RangeSpec>, RangeError> {
    let (unit, value) = header.split_once('=').ok_or(RangeError::MissingEquals)?;
    let unit = unit.trim();
    if unit != "bytes" {
        return Err(RangeError::UnsupportedUnit(unit.to_string()));
    }

    let specs = value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(parse_entry)
        .collect::<Result<Vec<_>, _>>()?;

    if specs.is_empty() {
        return Err(RangeError::Empty);
    }
    Ok(specs)
}

fn parse_entry(entry: &str) -> Result<RangeSpec, RangeError> {
    let (start, end) = entry
        .split_once('-')
        .ok_or_else(|| RangeError::MalformedSpec(entry.to_string()))?;

    let start = parse_bound(start.trim(), entry)?;
    let end = parse_bound(end.trim(), entry)?;

    match (start, end) {
        (None, None) => Err(RangeError::MissingBound(entry.to_string())),
        (Some(s), Some(e)) if s > e => Err(RangeError::InvalidOrder(entry.to_string())),
        _ => Ok(RangeSpec { start, end }),
    }
}

fn parse_bound(bound: &str, entry: &str) -> Result<Option<u64>, RangeError> {
    if bound.is_empty() {
        return Ok(None);
    }
    if !bound.bytes().all(|b| b.is_ascii_digit()) {
        return Err(RangeError::NotANumber(entry.to_string()));
    }
    bound
        .parse::<u64>()
        .map(Some)
        .map_err(|_| RangeError::NotANumber(entry.to_string()))
}

/// Concrete `(offset, size)` interval inside a resource.
///
/// [`ResolvedRange::UNSATISFIABLE`] (`0, 0`) means the spec does not overlap
/// the resource at all. It is never a legitimate empty range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedRange {
    pub offset: u64,
    pub size: u64,
}

impl ResolvedRange {
    pub const UNSATISFIABLE: Self = Self { offset: 0, size: 0 };

    pub fn is_satisfiable(self) -> bool {
        self != Self::UNSATISFIABLE
    }

    /// Inclusive index of the last byte; only meaningful when satisfiable.
    pub const fn last_byte(self) -> u64 {
        self.offset + self.size - 1
    }

    /// `Content-Range` value for this interval of a `total`-byte resource
    pub fn content_range(self, total: u64) -> String {
        format!("bytes {}-{}/{total}", self.offset, self.last_byte())
    }
}

/// `Content-Range` value for a 416 response
pub fn unsatisfied_content_range(total: u64) -> String {
    format!("bytes */{total}")
}

/// Resolve one spec against a resource of `file_size` bytes.
///
/// The end bound is inclusive and clamped to the resource; a suffix longer
/// than the resource covers all of it.
pub fn resolve_range(spec: RangeSpec, file_size: u64) -> ResolvedRange {
    let (offset, end) = match (spec.start, spec.end) {
        (None, Some(suffix)) => (file_size.saturating_sub(suffix), file_size),
        (Some(start), None) => (start, file_size),
        (Some(start), Some(end)) if end < file_size => (start, end + 1),
        (Some(start), Some(_)) => (start, file_size),
        (None, None) => return ResolvedRange::UNSATISFIABLE,
    };

    if offset >= file_size {
        return ResolvedRange::UNSATISFIABLE;
    }
    ResolvedRange {
        offset,
        size: end - offset,
    }
}
