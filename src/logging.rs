/// Structured logging for the radar monitoring service
///
/// Provides context-rich logging with station/product identifiers and a
/// component tag, routed through the `log` facade. `init_logger` installs
/// `env_logger`; `RUST_LOG` still takes precedence when set.

use std::fmt;

use crate::model::{ExtractionFailure, FetchError};

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warning),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level '{}'", other)),
        }
    }
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Warning => log::LevelFilter::Warn,
            LogLevel::Error => log::LevelFilter::Error,
        }
    }
}

impl From<LogLevel> for log::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Info => log::Level::Info,
            LogLevel::Warning => log::Level::Warn,
            LogLevel::Error => log::Level::Error,
        }
    }
}

// ---------------------------------------------------------------------------
// Components
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Radar,
    Extract,
    Override,
    Config,
    Report,
    System,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::Radar => write!(f, "RADAR"),
            Component::Extract => write!(f, "EXTRACT"),
            Component::Override => write!(f, "OVERRIDE"),
            Component::Config => write!(f, "CONFIG"),
            Component::Report => write!(f, "REPORT"),
            Component::System => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Failure Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureType {
    /// Expected failure - station image not published, likely down or in maintenance
    Expected,
    /// Unexpected failure - indicates service degradation or configuration issue
    Unexpected,
    /// Unknown - cannot determine if this is expected or not
    Unknown,
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureType::Expected => write!(f, "EXPECTED"),
            FailureType::Unexpected => write!(f, "UNEXPECTED"),
            FailureType::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

// ---------------------------------------------------------------------------
// Logger Setup
// ---------------------------------------------------------------------------

/// Install `env_logger` at `min_level`. Safe to call more than once; later
/// calls are ignored.
pub fn init_logger(min_level: LogLevel, console_timestamps: bool) {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(min_level.into()).parse_default_env();
    if !console_timestamps {
        builder.format_timestamp(None);
    }
    let _ = builder.try_init();
}

fn site_part(site_id: Option<&str>) -> String {
    site_id.map(|s| format!(" [{}]", s)).unwrap_or_default()
}

fn emit(level: LogLevel, component: Component, site_id: Option<&str>, message: &str) {
    let level: log::Level = level.into();
    log::log!(level, "{}{}: {}", component, site_part(site_id), message);
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

/// Log a general informational message
pub fn info(component: Component, site_id: Option<&str>, message: &str) {
    emit(LogLevel::Info, component, site_id, message);
}

/// Log a warning message
pub fn warn(component: Component, site_id: Option<&str>, message: &str) {
    emit(LogLevel::Warning, component, site_id, message);
}

/// Log an error message
pub fn error(component: Component, site_id: Option<&str>, message: &str) {
    emit(LogLevel::Error, component, site_id, message);
}

/// Log a debug message
pub fn debug(component: Component, site_id: Option<&str>, message: &str) {
    emit(LogLevel::Debug, component, site_id, message);
}

// ---------------------------------------------------------------------------
// Failure Classification Helpers
// ---------------------------------------------------------------------------

/// Classify a radar image fetch failure.
pub fn classify_fetch_failure(err: &FetchError) -> FailureType {
    match err {
        // The image is simply not being published; usually a station outage.
        FetchError::HttpStatus { status: 404, .. } => FailureType::Expected,
        FetchError::HttpStatus { status, .. } if *status >= 500 => FailureType::Unexpected,
        FetchError::HttpStatus { .. } => FailureType::Unknown,
        FetchError::Timeout(_) | FetchError::Connect(_) => FailureType::Unexpected,
        FetchError::Request(_) => FailureType::Unknown,
    }
}

/// Classify a timestamp extraction failure.
pub fn classify_extraction_failure(failure: &ExtractionFailure) -> FailureType {
    match failure {
        ExtractionFailure::Missing => FailureType::Unknown,
        ExtractionFailure::Malformed { .. } | ExtractionFailure::Container(_) => {
            FailureType::Unexpected
        }
    }
}

// ---------------------------------------------------------------------------
// Structured Failure Logging
// ---------------------------------------------------------------------------

fn log_classified(component: Component, site_id: &str, failure_type: FailureType, message: &str) {
    match failure_type {
        FailureType::Expected => debug(component, Some(site_id), message),
        FailureType::Unexpected => error(component, Some(site_id), message),
        FailureType::Unknown => warn(component, Some(site_id), message),
    }
}

/// Log a fetch failure with automatic classification
pub fn log_fetch_failure(station: &str, product: &str, err: &FetchError) {
    let failure_type = classify_fetch_failure(err);
    let message = format!("fetch {} failed [{}]: {}", product, failure_type, err);
    log_classified(Component::Radar, station, failure_type, &message);
}

/// Log an extraction failure with automatic classification
pub fn log_extraction_failure(station: &str, product: &str, failure: &ExtractionFailure) {
    let failure_type = classify_extraction_failure(failure);
    let message = format!("timestamp {} [{}]: {}", product, failure_type, failure);
    log_classified(Component::Extract, station, failure_type, &message);
}

// ---------------------------------------------------------------------------
// Cycle Summary Logging
// ---------------------------------------------------------------------------

/// Log a summary of one poll cycle.
pub fn log_cycle_summary(total: usize, ok: usize, overridden: usize, failed: usize) {
    let message = format!(
        "Poll cycle complete: {}/{} ok, {} overridden, {} not ok",
        ok, total, overridden, failed
    );

    if failed == 0 {
        info(Component::System, None, &message);
    } else if ok == 0 {
        error(Component::System, None, &message);
    } else {
        warn(Component::System, None, &message);
    }
}
