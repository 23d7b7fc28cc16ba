//! Byte range header grammar.
//!
//! Uploads describe their payload with `Content-Range: bytes start-end/total`;
//! downloads ask for a slice with `Range: bytes=start-end`, `bytes=start-` or
//! `bytes=-suffix`. Both forms use inclusive, 0-indexed offsets.

use std::fmt;
use std::str::FromStr;

use crate::constants::RANGE_UNIT;

/// Errors produced while parsing or resolving byte ranges.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RangeError {
    #[error("malformed range: {0}")]
    Malformed(String),

    #[error("range not satisfiable for {size} bytes")]
    Unsatisfiable { size: u64 },
}

fn parse_offset(raw: &str, what: &str) -> Result<u64, RangeError> {
    raw.trim()
        .parse::<u64>()
        .map_err(|_| RangeError::Malformed(format!("invalid {what}: {raw:?}")))
}

// ---------------------------------------------------------------------------
// Content-Range (uploads)
// ---------------------------------------------------------------------------

/// A parsed `Content-Range: bytes start-end/total` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentRange {
    pub start: u64,
    /// Inclusive.
    pub end: u64,
    /// Declared size of the whole file.
    pub total: u64,
}

impl ContentRange {
    /// Number of bytes covered by the range.
    pub fn byte_count(&self) -> u64 {
        self.end - self.start + 1
    }
}

impl FromStr for ContentRange {
    type Err = RangeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        let spec = value
            .strip_prefix(RANGE_UNIT)
            .and_then(|rest| rest.strip_prefix(' '))
            .ok_or_else(|| RangeError::Malformed(format!("expected `{RANGE_UNIT} ` unit")))?;

        let (span, total) = spec
            .split_once('/')
            .ok_or_else(|| RangeError::Malformed("missing `/total`".into()))?;
        let (start, end) = span
            .split_once('-')
            .ok_or_else(|| RangeError::Malformed("missing `start-end`".into()))?;

        let start = parse_offset(start, "start byte")?;
        let end = parse_offset(end, "end byte")?;
        let total = parse_offset(total, "total size")?;

        if end < start {
            return Err(RangeError::Malformed(format!(
                "end byte {end} before start byte {start}"
            )));
        }
        if total == 0 {
            return Err(RangeError::Malformed("total size must be positive".into()));
        }
        if end >= total {
            return Err(RangeError::Malformed(format!(
                "end byte {end} beyond total size {total}"
            )));
        }

        Ok(Self { start, end, total })
    }
}

impl fmt::Display for ContentRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{RANGE_UNIT} {}-{}/{}", self.start, self.end, self.total)
    }
}

// ---------------------------------------------------------------------------
// Range (downloads)
// ---------------------------------------------------------------------------

/// A single-range `Range` request header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteRangeSpec {
    /// `bytes=start-end` or `bytes=start-`.
    From { start: u64, end: Option<u64> },
    /// `bytes=-n`: the last `n` bytes.
    Suffix(u64),
}

impl ByteRangeSpec {
    /// Resolves the request against a file of `size` bytes.
    ///
    /// Returns the inclusive `(start, end)` to serve. The end is clamped to
    /// the last byte of the file.
    pub fn resolve(&self, size: u64) -> Result<(u64, u64), RangeError> {
        let unsatisfiable = RangeError::Unsatisfiable { size };
        if size == 0 {
            return Err(unsatisfiable);
        }
        let last = size - 1;

        match *self {
            Self::From { start, end } => {
                if end.is_some_and(|end| end < start) || start > last {
                    return Err(unsatisfiable);
                }
                Ok((start, end.map_or(last, |end| end.min(last))))
            }
            Self::Suffix(0) => Err(unsatisfiable),
            Self::Suffix(n) => Ok((size.saturating_sub(n), last)),
        }
    }
}

impl FromStr for ByteRangeSpec {
    type Err = RangeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let spec = value
            .trim()
            .strip_prefix(RANGE_UNIT)
            .and_then(|rest| rest.strip_prefix('='))
            .ok_or_else(|| RangeError::Malformed(format!("expected `{RANGE_UNIT}=` unit")))?;

        if spec.contains(',') {
            return Err(RangeError::Malformed("multiple ranges not supported".into()));
        }

        let (start, end) = spec
            .split_once('-')
            .ok_or_else(|| RangeError::Malformed("missing `-`".into()))?;
        let (start, end) = (start.trim(), end.trim());

        if start.is_empty() {
            return Ok(Self::Suffix(parse_offset(end, "suffix length")?));
        }

        let start = parse_offset(start, "start byte")?;
        let end = if end.is_empty() {
            None
        } else {
            Some(parse_offset(end, "end byte")?)
        };
        Ok(Self::From { start, end })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_range_parses() {
        let r: ContentRange = "bytes 0-4/10".parse().unwrap();
        assert_eq!(
            r,
            ContentRange {
                start: 0,
                end: 4,
                total: 10
            }
        );
        assert_eq!(r.byte_count(), 5);
        assert_eq!(r.to_string(), "bytes 0-4/10");
    }

    #[test]
    fn content_range_single_byte() {
        let r: ContentRange = "bytes 9-9/10".parse().unwrap();
        assert_eq!(r.byte_count(), 1);
    }

    #[test]
    fn content_range_rejects_wrong_unit() {
        assert!(matches!(
            "items 0-4/10".parse::<ContentRange>(),
            Err(RangeError::Malformed(_))
        ));
    }

    #[test]
    fn content_range_rejects_missing_total() {
        assert!("bytes 0-4".parse::<ContentRange>().is_err());
        assert!("bytes 0-4/*".parse::<ContentRange>().is_err());
    }

    #[test]
    fn content_range_rejects_reversed() {
        assert!("bytes 5-4/10".parse::<ContentRange>().is_err());
    }

    #[test]
    fn content_range_rejects_negative_start() {
        assert!("bytes -1-4/10".parse::<ContentRange>().is_err());
    }

    #[test]
    fn content_range_rejects_zero_total() {
        assert!("bytes 0-0/0".parse::<ContentRange>().is_err());
    }

    #[test]
    fn content_range_rejects_end_past_total() {
        assert!("bytes 0-10/10".parse::<ContentRange>().is_err());
    }

    #[test]
    fn range_spec_forms() {
        assert_eq!(
            "bytes=2-5".parse::<ByteRangeSpec>().unwrap(),
            ByteRangeSpec::From {
                start: 2,
                end: Some(5)
            }
        );
        assert_eq!(
            "bytes=7-".parse::<ByteRangeSpec>().unwrap(),
            ByteRangeSpec::From {
                start: 7,
                end: None
            }
        );
        assert_eq!(
            "bytes=-3".parse::<ByteRangeSpec>().unwrap(),
            ByteRangeSpec::Suffix(3)
        );
    }

    #[test]
    fn range_spec_rejects_multiple_ranges() {
        assert!("bytes=0-1,4-5".parse::<ByteRangeSpec>().is_err());
    }

    #[test]
    fn range_spec_rejects_garbage() {
        assert!("bytes=abc".parse::<ByteRangeSpec>().is_err());
        assert!("pages=0-1".parse::<ByteRangeSpec>().is_err());
        assert!("bytes=x-1".parse::<ByteRangeSpec>().is_err());
    }

    #[test]
    fn resolve_clamps_end() {
        let spec = ByteRangeSpec::From {
            start: 2,
            end: Some(100),
        };
        assert_eq!(spec.resolve(10).unwrap(), (2, 9));
        let open = ByteRangeSpec::From {
            start: 2,
            end: None,
        };
        assert_eq!(open.resolve(10).unwrap(), (2, 9));
    }

    #[test]
    fn resolve_start_past_end_of_file() {
        let spec = ByteRangeSpec::From {
            start: 10,
            end: None,
        };
        assert_eq!(
            spec.resolve(10),
            Err(RangeError::Unsatisfiable { size: 10 })
        );
    }

    #[test]
    fn resolve_reversed_is_unsatisfiable() {
        let spec = ByteRangeSpec::From {
            start: 5,
            end: Some(2),
        };
        assert!(spec.resolve(10).is_err());
    }

    #[test]
    fn resolve_empty_file() {
        let spec = ByteRangeSpec::From {
            start: 0,
            end: None,
        };
        assert!(spec.resolve(0).is_err());
    }

    #[test]
    fn resolve_suffix() {
        assert_eq!(ByteRangeSpec::Suffix(3).resolve(10).unwrap(), (7, 9));
        assert_eq!(ByteRangeSpec::Suffix(50).resolve(10).unwrap(), (0, 9));
        assert!(ByteRangeSpec::Suffix(0).resolve(10).is_err());
    }
}
