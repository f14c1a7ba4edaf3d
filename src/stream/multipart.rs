//! multipart/byteranges layout, computed before any byte is sent.

use chrono::Utc;

use crate::http::range::{resolve_range, RangeSpec};

/// One part of the body: separator text, then `size` bytes at `offset`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartPlan {
    pub separator: String,
    pub offset: u64,
    pub size: u64,
}

#[derive(Debug, Clone)]
pub struct MultipartPlan {
    pub boundary: String,
    /// Satisfiable parts in request order, then the closing boundary.
    pub parts: Vec<PartPlan>,
    /// Exact body length, separators and closing boundary included.
    pub content_length: u64,
}

impl MultipartPlan {
    /// Lay out the body for `specs` against a `total`-byte resource.
    ///
    /// Unsatisfiable specs are left out; returns `None` when none remain.
    pub fn build(
        specs: &[RangeSpec],
        total: u64,
        content_type: &str,
        boundary: String,
    ) -> Option<Self> {
        let mut parts = Vec::with_capacity(specs.len() + 1);
        let mut content_length = 0;

        for spec in specs {
            let range = resolve_range(*spec, total);
            if !range.is_satisfiable() {
                continue;
            }
            let separator = format!(
                "\r\n--{boundary}\r\nContent-type: {content_type}\r\nContent-range: {}\r\n\r\n",
                range.content_range(total)
            );
            content_length += separator.len() as u64 + range.size;
            parts.push(PartPlan {
                separator,
                offset: range.offset,
                size: range.size,
            });
        }

        if parts.is_empty() {
            return None;
        }

        let closing = format!("\r\n--{boundary}--\r\n");
        content_length += closing.len() as u64;
        parts.push(PartPlan {
            separator: closing,
            offset: 0,
            size: 0,
        });

        Some(Self {
            boundary,
            parts,
            content_length,
        })
    }

    /// Value of the response's `Content-Type` header
    pub fn content_type(&self) -> String {
        format!("multipart/byteranges; boundary=\"{}\"", self.boundary)
    }
}

/// Boundary token unique within one response
pub fn generate_boundary() -> String {
    let micros = Utc::now().timestamp_micros().unsigned_abs();
    format!("{micros:x}{:x}", std::process::id())
}
