//! HTTP Range header parsing module
//!
//! Parses the single-range `bytes=start-end` form used by tiled raster
//! clients, validated against a known total file size.

/// A validated inclusive byte interval within a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    /// Start byte position (inclusive)
    pub start: u64,
    /// End byte position (inclusive, already clamped to the file size)
    pub end: u64,
}

impl ByteRange {
    /// Number of bytes covered by the range. Never zero: the interval is
    /// inclusive on both ends.
    #[inline]
    #[must_use]
    pub const fn length(&self) -> u64 {
        self.end - self.start + 1
    }
}

/// Range header parse result
#[derive(Debug)]
pub enum RangeParseResult {
    /// Well-formed, satisfiable range
    Valid(ByteRange),
    /// Malformed header (wrong prefix, non-numeric start, multiple ranges)
    Invalid,
    /// Well-formed but unsatisfiable (start at or beyond EOF, or past the
    /// requested end)
    NotSatisfiable,
}

/// Parse an HTTP Range header (single range only, bytes unit)
///
/// Supported format: `bytes=start-end` where `end` is optional. An absent
/// end means "to end of file"; an end past EOF is clamped to `total - 1`.
/// Suffix ranges (`bytes=-500`) and multi-range headers are rejected.
///
/// # Examples
/// ```
/// use cogserve::http::range::{parse_range_header, RangeParseResult};
///
/// match parse_range_header("bytes=0-99", 1000) {
///     RangeParseResult::Valid(r) => assert_eq!(r.length(), 100),
///     _ => panic!("expected a valid range"),
/// }
/// assert!(matches!(
///     parse_range_header("bytes=abc", 1000),
///     RangeParseResult::Invalid
/// ));
/// ```
#[must_use]
pub fn parse_range_header(header: &str, total: u64) -> RangeParseResult {
    let Some(value) = header.strip_prefix("bytes=") else {
        return RangeParseResult::Invalid;
    };

    // Only a single range is supported (not multi-range)
    if value.contains(',') {
        return RangeParseResult::Invalid;
    }

    let Some((start_str, end_str)) = value.split_once('-') else {
        return RangeParseResult::Invalid;
    };
    let (start_str, end_str) = (start_str.trim(), end_str.trim());

    // Start is mandatory: suffix ranges are not part of the grammar
    let Ok(start) = start_str.parse::<u64>() else {
        return RangeParseResult::Invalid;
    };

    if start >= total {
        return RangeParseResult::NotSatisfiable;
    }

    let end = if end_str.is_empty() {
        total - 1 // open-ended: serve to end of file
    } else {
        let Ok(e) = end_str.parse::<u64>() else {
            return RangeParseResult::Invalid;
        };
        e.min(total - 1)
    };

    if start > end {
        return RangeParseResult::NotSatisfiable;
    }

    RangeParseResult::Valid(ByteRange { start, end })
}
