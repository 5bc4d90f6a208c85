//! Monitor configuration.
//!
//! A `MonitorConfig` bundles everything one poll cycle is parameterised by:
//! station catalog, product catalog with thresholds, fetch settings, the
//! extraction fallback policy and override settings. It is built once at
//! startup, either from a built-in preset or a TOML file, optionally
//! adjusted from `RDRMON_*` environment variables, and then treated as
//! immutable.
//!
//! ```toml
//! extraction = "comment-then-header"
//! output_dir = "reports"
//!
//! [fetch]
//! base_url = "https://mausam.imd.gov.in/Radar"
//! timeout_secs = 5
//! workers = 8
//!
//! [overrides]
//! path = "station_overrides.json"
//! precedence = "station-wide"
//!
//! [[products]]
//! code = "caz"
//! threshold_minutes = 90
//!
//! [[stations]]
//! code = "koc"
//! name = "Kochi"
//! region = "Kerala"
//! correction = "day-month-swap"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::extract::ExtractionPolicy;
use crate::ingest::radar::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
use crate::logging::{self, Component};
use crate::overrides::OverridePrecedence;
use crate::products::{Product, ProductCatalog};
use crate::stations::{Station, StationCatalog};

pub const DEFAULT_WORKERS: usize = 8;
pub const DEFAULT_OVERRIDES_PATH: &str = "station_overrides.json";

pub const ENV_BASE_URL: &str = "RDRMON_BASE_URL";
pub const ENV_OVERRIDES: &str = "RDRMON_OVERRIDES";
pub const ENV_OUTPUT_DIR: &str = "RDRMON_OUTPUT_DIR";
pub const ENV_WORKERS: &str = "RDRMON_WORKERS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid config TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("config must list at least one {0}")]
    Empty(&'static str),
    #[error("duplicate {kind} code '{code}'")]
    Duplicate { kind: &'static str, code: String },
    #[error("fetch.{0} must be greater than zero")]
    Zero(&'static str),
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchSettings {
    pub base_url: String,
    pub timeout: Duration,
    /// Upper bound on concurrent fetches per cycle.
    pub workers: usize,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            workers: DEFAULT_WORKERS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverrideSettings {
    pub path: PathBuf,
    pub precedence: OverridePrecedence,
}

impl Default for OverrideSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_OVERRIDES_PATH),
            precedence: OverridePrecedence::default(),
        }
    }
}

/// Complete, validated configuration for the poll engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    pub stations: StationCatalog,
    pub products: ProductCatalog,
    pub fetch: FetchSettings,
    pub extraction: ExtractionPolicy,
    pub overrides: OverrideSettings,
    pub output_dir: PathBuf,
}

// ---------------------------------------------------------------------------
// TOML shape
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    extraction: Option<ExtractionPolicy>,
    #[serde(default)]
    output_dir: Option<PathBuf>,
    #[serde(default)]
    fetch: RawFetch,
    #[serde(default)]
    overrides: RawOverrides,
    #[serde(default)]
    products: Option<Vec<Product>>,
    #[serde(default)]
    stations: Option<Vec<Station>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFetch {
    base_url: Option<String>,
    timeout_secs: Option<u64>,
    workers: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawOverrides {
    path: Option<PathBuf>,
    precedence: Option<OverridePrecedence>,
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

impl MonitorConfig {
    /// All seven IMD products at every IMD station, header fallback enabled.
    pub fn all_products() -> Self {
        Self {
            stations: StationCatalog::imd_default(),
            products: ProductCatalog::imd_all_products(),
            fetch: FetchSettings::default(),
            extraction: ExtractionPolicy::CommentThenHeader,
            overrides: OverrideSettings::default(),
            output_dir: PathBuf::from("."),
        }
    }

    /// One product at a 30-minute threshold, comment-only extraction.
    pub fn single_product(code: &str) -> Self {
        Self {
            products: ProductCatalog::single(code, crate::products::DEFAULT_THRESHOLD_MINUTES),
            extraction: ExtractionPolicy::CommentOnly,
            ..Self::all_products()
        }
    }

    /// Parses and validates a TOML document. Omitted sections fall back to
    /// the `all_products` preset.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(text)?;
        let base = Self::all_products();

        let config = Self {
            stations: raw.stations.map(StationCatalog::new).unwrap_or(base.stations),
            products: raw.products.map(ProductCatalog::new).unwrap_or(base.products),
            fetch: FetchSettings {
                base_url: raw.fetch.base_url.unwrap_or(base.fetch.base_url),
                timeout: raw
                    .fetch
                    .timeout_secs
                    .map(Duration::from_secs)
                    .unwrap_or(base.fetch.timeout),
                workers: raw.fetch.workers.unwrap_or(base.fetch.workers),
            },
            extraction: raw.extraction.unwrap_or(base.extraction),
            overrides: OverrideSettings {
                path: raw.overrides.path.unwrap_or(base.overrides.path),
                precedence: raw.overrides.precedence.unwrap_or_default(),
            },
            output_dir: raw.output_dir.unwrap_or(base.output_dir),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stations.is_empty() {
            return Err(ConfigError::Empty("station"));
        }
        if self.products.is_empty() {
            return Err(ConfigError::Empty("product"));
        }
        if let Some(code) = self.stations.first_duplicate() {
            return Err(ConfigError::Duplicate {
                kind: "station",
                code: code.to_string(),
            });
        }
        if let Some(code) = self.products.first_duplicate() {
            return Err(ConfigError::Duplicate {
                kind: "product",
                code: code.to_string(),
            });
        }
        if self.fetch.workers == 0 {
            return Err(ConfigError::Zero("workers"));
        }
        if self.fetch.timeout.is_zero() {
            return Err(ConfigError::Zero("timeout_secs"));
        }
        Ok(())
    }

    /// Applies `RDRMON_*` variables from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Applies `RDRMON_*` overrides from an arbitrary lookup. Unparseable
    /// numeric values are logged and ignored.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_BASE_URL) {
            self.fetch.base_url = url;
        }
        if let Some(path) = lookup(ENV_OVERRIDES) {
            self.overrides.path = PathBuf::from(path);
        }
        if let Some(dir) = lookup(ENV_OUTPUT_DIR) {
            self.output_dir = PathBuf::from(dir);
        }
        if let Some(value) = lookup(ENV_WORKERS) {
            match value.trim().parse::<usize>() {
                Ok(n) if n > 0 => self.fetch.workers = n,
                _ => logging::warn(
                    Component::Config,
                    None,
                    &format!("Ignoring {}={:?}: expected a positive integer", ENV_WORKERS, value),
                ),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
