/// Core data types for the radar freshness monitoring service.
///
/// This module defines the shared domain model imported by all other modules:
/// timestamps and where they came from, the fixed status taxonomy, the
/// per-pair `StatusRecord`, and the error types for each failure stage.
/// It contains no logic beyond formatting and classification helpers.

use chrono::{DateTime, FixedOffset};
use serde::{Serialize, Serializer};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Reference time zone
// ---------------------------------------------------------------------------

/// Offset of the reference time zone (UTC+5:30), in seconds east of UTC.
pub const REFERENCE_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

/// Every timestamp handled by the engine lives in the reference zone.
pub type Timestamp = DateTime<FixedOffset>;

/// The fixed UTC+5:30 offset applied to all naive source timestamps.
///
/// Never inferred from the data: embedded comments carry no offset, and the
/// `Last-Modified` fallback is converted into this zone after parsing.
pub fn reference_offset() -> FixedOffset {
    FixedOffset::east_opt(REFERENCE_OFFSET_SECS).expect("UTC+5:30 is within chrono's offset range")
}

/// Current wall-clock time in the reference zone.
pub fn now_in_reference_zone() -> Timestamp {
    chrono::Utc::now().with_timezone(&reference_offset())
}

// ---------------------------------------------------------------------------
// Display sentinels
// ---------------------------------------------------------------------------

/// Date/time placeholder when no timestamp is available.
pub const SENTINEL_NA: &str = "NA";

/// Date/time placeholder when a timestamp source was present but unparseable.
pub const SENTINEL_INVALID: &str = "Invalid";

/// Station-row cell for a product with no usable timestamp.
pub const SENTINEL_MISSING: &str = "Missing";

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M:%S";
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ---------------------------------------------------------------------------
// Timestamp types
// ---------------------------------------------------------------------------

/// Where an extracted timestamp came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimestampSource {
    /// Comment extension embedded in the image container.
    EmbeddedComment,
    /// `Last-Modified` response header.
    TransportLastModified,
}

impl std::fmt::Display for TimestampSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimestampSource::EmbeddedComment => write!(f, "embedded-comment"),
            TimestampSource::TransportLastModified => write!(f, "transport-last-modified"),
        }
    }
}

/// A generation timestamp in the reference zone, tagged with its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractedTimestamp {
    pub at: Timestamp,
    pub source: TimestampSource,
}

impl ExtractedTimestamp {
    pub fn new(at: Timestamp, source: TimestampSource) -> Self {
        Self { at, source }
    }

    pub fn date_string(&self) -> String {
        self.at.format(DATE_FORMAT).to_string()
    }

    pub fn time_string(&self) -> String {
        self.at.format(TIME_FORMAT).to_string()
    }

    pub fn datetime_string(&self) -> String {
        self.at.format(DATETIME_FORMAT).to_string()
    }
}

/// Binary freshness verdict for one extracted timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    Fresh,
    Stale,
}

// ---------------------------------------------------------------------------
// Status taxonomy
// ---------------------------------------------------------------------------

/// Status label of a `StatusRecord`.
///
/// The serialized strings are a presentation contract with the dashboard
/// and must not change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusLabel {
    /// Timestamp extracted and within the product threshold.
    Ok,
    /// Timestamp extracted but older than the product threshold.
    NotOk,
    /// A timestamp source was present but could not be parsed.
    Invalid,
    /// No timestamp source was available at all.
    TimestampMissing,
    /// The image could not be fetched or opened.
    Problem,
    /// Manually asserted label copied from an override record.
    Manual(String),
}

impl StatusLabel {
    pub fn as_str(&self) -> &str {
        match self {
            StatusLabel::Ok => "Ok",
            StatusLabel::NotOk => "Not Ok",
            StatusLabel::Invalid => "Invalid",
            StatusLabel::TimestampMissing => "Timestamp Missing",
            StatusLabel::Problem => "problem",
            StatusLabel::Manual(label) => label,
        }
    }

    /// Only a fresh, live-evaluated product counts towards a passing station.
    pub fn is_ok(&self) -> bool {
        matches!(self, StatusLabel::Ok)
    }
}

impl std::fmt::Display for StatusLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for StatusLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// The externally visible result for one (station, product) pair.
///
/// Field names match the JSON consumed by the status dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusRecord {
    pub station: String,
    pub date: String,
    pub time: String,
    pub status: StatusLabel,
    pub product_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub overridden: bool,
    /// The timestamp behind `date`/`time`, when one was extracted.
    #[serde(skip)]
    pub timestamp: Option<ExtractedTimestamp>,
}

impl StatusRecord {
    /// Record for a pair whose timestamp was extracted and evaluated.
    pub fn evaluated(station: &str, product: &str, ts: ExtractedTimestamp, freshness: Freshness) -> Self {
        let status = match freshness {
            Freshness::Fresh => StatusLabel::Ok,
            Freshness::Stale => StatusLabel::NotOk,
        };
        Self {
            station: station.to_string(),
            date: ts.date_string(),
            time: ts.time_string(),
            status,
            product_type: product.to_string(),
            error_message: None,
            overridden: false,
            timestamp: Some(ts),
        }
    }

    /// Record for a pair that produced no timestamp.
    pub fn without_timestamp(
        station: &str,
        product: &str,
        status: StatusLabel,
        sentinel: &str,
        error_message: Option<String>,
    ) -> Self {
        Self {
            station: station.to_string(),
            date: sentinel.to_string(),
            time: sentinel.to_string(),
            status,
            product_type: product.to_string(),
            error_message,
            overridden: false,
            timestamp: None,
        }
    }

    /// Record copied verbatim from a manual override; no fetch took place.
    pub fn overridden(station: &str, product: &str, status: &str, date: &str, time: &str) -> Self {
        Self {
            station: station.to_string(),
            date: date.to_string(),
            time: time.to_string(),
            status: StatusLabel::Manual(status.to_string()),
            product_type: product.to_string(),
            error_message: None,
            overridden: true,
            timestamp: None,
        }
    }
}

/// Overall pass/fail signal for a station across its gating products.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Fail,
}

impl Verdict {
    /// Marker glyph expected by the dashboard's `overall` column.
    pub fn glyph(&self) -> &'static str {
        match self {
            Verdict::Pass => "✔️",
            Verdict::Fail => "❌",
        }
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Transport-level failure of a single fetch attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The request did not complete within the per-request timeout.
    #[error("request timed out: {0}")]
    Timeout(String),
    /// The connection could not be established.
    #[error("connection failed: {0}")]
    Connect(String),
    /// Non-2xx HTTP response.
    #[error("HTTP error: {status} for url ({url})")]
    HttpStatus { status: u16, url: String },
    /// Any other request or body-read failure.
    #[error("request failed: {0}")]
    Request(String),
}

/// The image payload could not be walked as an image container.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContainerError {
    #[error("cannot identify image file: missing GIF signature")]
    NotGif,
    #[error("image data truncated at byte {0}")]
    Truncated(usize),
    #[error("unexpected block introducer 0x{byte:02x} at byte {offset}")]
    UnknownBlock { byte: u8, offset: usize },
}

/// Why a timestamp could not be extracted from a fetched image.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionFailure {
    /// Neither an embedded comment nor a usable header was present.
    #[error("no timestamp source available")]
    Missing,
    /// A timestamp source was present but its text did not parse.
    #[error("malformed {origin} timestamp: {text:?}")]
    Malformed { origin: TimestampSource, text: String },
    /// The payload could not be opened as an image at all.
    #[error(transparent)]
    Container(#[from] ContainerError),
}
