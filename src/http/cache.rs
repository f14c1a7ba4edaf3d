//! HTTP cache control module
//!
//! `Last-Modified` formatting and `If-Modified-Since` evaluation.

use chrono::{DateTime, NaiveDateTime, Utc};
use std::time::{SystemTime, UNIX_EPOCH};

const IMF_FIXDATE: &str = "%a, %d %b %Y %H:%M:%S GMT";
const RFC_850: &str = "%A, %d-%b-%y %H:%M:%S GMT";
const ASCTIME: &str = "%a %b %d %H:%M:%S %Y";

/// Modification time in whole seconds since the epoch, rounded up
///
/// Rounding up keeps a sub-second mtime from looking older than the
/// `Last-Modified` value a client echoes back.
pub fn modified_seconds(mtime: SystemTime) -> i64 {
    let Ok(since_epoch) = mtime.duration_since(UNIX_EPOCH) else {
        return 0;
    };
    let secs = i64::try_from(since_epoch.as_secs()).unwrap_or(i64::MAX);
    if since_epoch.subsec_nanos() > 0 {
        secs.saturating_add(1)
    } else {
        secs
    }
}

/// Format seconds since the epoch as an IMF-fixdate
///
/// # Examples
/// ```
/// use rust_fileserver::http::cache::format_http_date;
/// assert_eq!(format_http_date(784_111_777), "Sun, 06 Nov 1994 08:49:37 GMT");
/// ```
pub fn format_http_date(secs: i64) -> String {
    DateTime::<Utc>::from_timestamp(secs, 0)
        .unwrap_or_default()
        .format(IMF_FIXDATE)
        .to_string()
}

/// Parse an HTTP date in any of the three forms RFC 7231 allows
pub fn parse_http_date(value: &str) -> Option<i64> {
    let value = value.split_whitespace().collect::<Vec<_>>().join(" ");

    if let Ok(dt) = DateTime::parse_from_rfc2822(&value) {
        return Some(dt.timestamp());
    }
    [IMF_FIXDATE, RFC_850, ASCTIME]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(&value, fmt).ok())
        .map(|dt| dt.and_utc().timestamp())
}

/// Check whether the client's copy is still current
///
/// # Arguments
/// * `if_modified_since` - Client-sent If-Modified-Since header
/// * `modified` - Resource modification time, see [`modified_seconds`]
///
/// # Returns
/// Returns true if the response should be 304; unparsable dates never match
pub fn is_not_modified(if_modified_since: Option<&str>, modified: i64) -> bool {
    if_modified_since
        .and_then(parse_http_date)
        .is_some_and(|since| since >= modified)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const SUNDAY: i64 = 784_111_777;

    #[test]
    fn test_parse_all_formats() {
        assert_eq!(parse_http_date("Sun, 06 Nov 1994 08:49:37 GMT"), Some(SUNDAY));
        assert_eq!(parse_http_date("Sunday, 06-Nov-94 08:49:37 GMT"), Some(SUNDAY));
        assert_eq!(parse_http_date("Sun Nov  6 08:49:37 1994"), Some(SUNDAY));
        assert_eq!(parse_http_date("yesterday"), None);
    }

    #[test]
    fn test_format_round_trip() {
        let formatted = format_http_date(SUNDAY);
        assert_eq!(parse_http_date(&formatted), Some(SUNDAY));
    }

    #[test]
    fn test_modified_seconds_rounds_up() {
        let exact = UNIX_EPOCH + Duration::from_secs(100);
        assert_eq!(modified_seconds(exact), 100);
        let fractional = UNIX_EPOCH + Duration::from_millis(100_250);
        assert_eq!(modified_seconds(fractional), 101);
    }

    #[test]
    fn test_is_not_modified() {
        let header = format_http_date(SUNDAY);
        assert!(is_not_modified(Some(&header), SUNDAY));
        assert!(is_not_modified(Some(&header), SUNDAY - 1));
        assert!(!is_not_modified(Some(&header), SUNDAY + 1));
        assert!(!is_not_modified(Some("garbage"), SUNDAY));
        assert!(!is_not_modified(None, SUNDAY));
    }
}
