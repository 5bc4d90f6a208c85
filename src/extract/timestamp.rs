/// Generation-timestamp extraction from a fetched radar image.
///
/// The primary source is the GIF comment, an ISO-8601-like date-time with
/// no offset, which is always wall-clock time in the reference zone. When
/// the policy allows it and no comment is present, the `Last-Modified`
/// response header is used instead. No freshness judgement happens here.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Deserialize;

use crate::extract::gif;
use crate::model::{
    ExtractedTimestamp, ExtractionFailure, Timestamp, TimestampSource, reference_offset,
};

/// Which sources may supply the timestamp.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtractionPolicy {
    /// Embedded comment only; no comment means `Missing`.
    CommentOnly,
    /// Embedded comment, else the `Last-Modified` header.
    #[default]
    CommentThenHeader,
}

/// Naive layouts accepted for the embedded comment, tried in order.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Extracts the generation timestamp from an image body and its
/// `Last-Modified` header value.
///
/// A comment that is present but unparseable is `Malformed` and does not
/// fall through to the header.
pub fn extract(
    body: &[u8],
    last_modified: Option<&str>,
    policy: ExtractionPolicy,
) -> Result<ExtractedTimestamp, ExtractionFailure> {
    if let Some(comment) = gif::read_comment(body)?.filter(|c| !c.is_empty()) {
        let at = parse_comment(&comment)?;
        return Ok(ExtractedTimestamp::new(at, TimestampSource::EmbeddedComment));
    }

    match (policy, last_modified) {
        (ExtractionPolicy::CommentThenHeader, Some(value)) => {
            let at = parse_last_modified(value)?;
            Ok(ExtractedTimestamp::new(at, TimestampSource::TransportLastModified))
        }
        _ => Err(ExtractionFailure::Missing),
    }
}

/// Parses raw comment bytes as a naive date-time in the reference zone.
///
/// An explicit offset in the text is discarded: the wall-clock reading is
/// kept and re-labelled as UTC+5:30.
pub fn parse_comment(raw: &[u8]) -> Result<Timestamp, ExtractionFailure> {
    let malformed = || ExtractionFailure::Malformed {
        origin: TimestampSource::EmbeddedComment,
        text: String::from_utf8_lossy(raw).into_owned(),
    };
    let text = std::str::from_utf8(raw).map_err(|_| malformed())?;
    let text = text.trim_matches(|c: char| c == '\0' || c.is_whitespace());

    let naive = parse_naive(text).ok_or_else(malformed)?;
    naive
        .and_local_timezone(reference_offset())
        .single()
        .ok_or_else(malformed)
}

fn parse_naive(text: &str) -> Option<NaiveDateTime> {
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .or_else(|| {
            DateTime::parse_from_rfc3339(text)
                .ok()
                .map(|dt| dt.naive_local())
        })
}

/// Parses an HTTP `Last-Modified` value (IMF-fixdate, e.g.
/// `Sat, 01 Jun 2024 03:00:00 GMT`) and converts it to the reference zone.
pub fn parse_last_modified(value: &str) -> Result<Timestamp, ExtractionFailure> {
    DateTime::parse_from_rfc2822(value.trim())
        .map(|dt| dt.with_timezone(&reference_offset()))
        .map_err(|_| ExtractionFailure::Malformed {
            origin: TimestampSource::TransportLastModified,
            text: value.to_string(),
        })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
