//! HTTP protocol layer module
//!
//! Header-level building blocks that know nothing about the filesystem:
//! MIME lookup, range arithmetic, date handling, canned responses.

pub mod body;
pub mod cache;
pub mod mime;
pub mod range;
pub mod response;

// Re-export commonly used types
pub use body::{empty_body, full_body, ServeBody};
pub use range::{parse_range_header, resolve_range, RangeError, RangeSpec, ResolvedRange};
pub use response::{
    build_304_response, build_403_response, build_404_response, build_405_response,
    build_500_response, build_html_response, build_options_response,
    build_redirect_response,
};
