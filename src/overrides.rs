//! Manual status overrides.
//!
//! Operators keep a JSON file of stations that are known to be down (for
//! maintenance, power failure, etc.). An override record replaces live
//! fetching with a manually asserted status, either for the whole station
//! or, when the record carries a `products` map, for individual products.
//!
//! File shape:
//!
//! ```json
//! [
//!   { "stn": "bhj", "status": "Under Maintenance", "date": "2024-05-01", "time": "10:00" },
//!   { "stn": "koc", "status": "Partial", "products": { "pac": { "status": "Disabled" } } }
//! ]
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::logging::{self, Component};
use crate::model::SENTINEL_NA;

#[derive(Debug, Error)]
pub enum OverrideError {
    #[error("failed to read override file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid override JSON: {0}")]
    Json(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Per-product values inside an override record. Missing fields inherit
/// from the station-level record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProductOverride {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
}

/// One manually asserted station status. `date` and `time` are free-form
/// display strings and are never parsed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OverrideRecord {
    pub stn: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub products: HashMap<String, ProductOverride>,
}

impl OverrideRecord {
    pub fn status(&self) -> &str {
        self.status.as_deref().unwrap_or("Unknown")
    }

    /// Records without per-product entries cover the whole station.
    pub fn is_station_wide(&self) -> bool {
        self.products.is_empty()
    }

    /// `"<status> Since <date> <time>"`, as shown in the station row.
    pub fn manual_status(&self) -> String {
        format!(
            "{} Since {} {}",
            self.status(),
            self.date.as_deref().unwrap_or(""),
            self.time.as_deref().unwrap_or("")
        )
        .trim()
        .to_string()
    }
}

/// Which override shape wins when a record carries per-product entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverridePrecedence {
    /// Any record suppresses every product of its station; per-product
    /// entries only supply the values shown for that product.
    #[default]
    StationWide,
    /// Records with per-product entries suppress only the listed products;
    /// the remaining products are fetched live.
    ProductSpecific,
}

/// Override values resolved for one (station, product) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOverride {
    pub status: String,
    pub date: String,
    pub time: String,
    /// The whole station is suppressed, not just this product.
    pub station_wide: bool,
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Station code -> override record, loaded once per cycle and never mutated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverrideStore {
    records: HashMap<String, OverrideRecord>,
}

impl OverrideStore {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<OverrideRecord>) -> Self {
        Self {
            records: records.into_iter().map(|r| (r.stn.clone(), r)).collect(),
        }
    }

    /// Parses an override document. Entries lacking a usable `stn` are
    /// skipped with a warning; a later entry for the same station replaces
    /// an earlier one.
    pub fn parse(json: &str) -> Result<Self, OverrideError> {
        let entries: Vec<serde_json::Value> = serde_json::from_str(json)?;
        let mut records = Vec::with_capacity(entries.len());
        for (index, entry) in entries.into_iter().enumerate() {
            match serde_json::from_value::<OverrideRecord>(entry) {
                Ok(record) => records.push(record),
                Err(e) => logging::warn(
                    Component::Override,
                    None,
                    &format!("Skipping override entry {}: {}", index, e),
                ),
            }
        }
        Ok(Self::from_records(records))
    }

    /// Reads and parses `path`.
    ///
    /// Returns `Ok(None)` when the file does not exist.
    pub fn read(path: &Path) -> Result<Option<Self>, OverrideError> {
        if !path.exists() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(path).map_err(|source| OverrideError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&text).map(Some)
    }

    /// Loads overrides, degrading to an empty store on any failure.
    ///
    /// A missing file is normal and silent; an unreadable or malformed one
    /// is logged as a warning and the cycle proceeds with live fetches.
    pub fn load(path: &Path) -> Self {
        match Self::read(path) {
            Ok(Some(store)) => {
                logging::info(
                    Component::Override,
                    None,
                    &format!("Loaded {} override(s) from {}", store.len(), path.display()),
                );
                store
            }
            Ok(None) => Self::empty(),
            Err(e) => {
                logging::warn(
                    Component::Override,
                    None,
                    &format!("{}; continuing without overrides", e),
                );
                Self::empty()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, station: &str) -> Option<&OverrideRecord> {
        self.records.get(station)
    }

    /// Whether every product of `station` is suppressed under `precedence`.
    pub fn is_station_wide(&self, station: &str, precedence: OverridePrecedence) -> bool {
        match (self.get(station), precedence) {
            (None, _) => false,
            (Some(_), OverridePrecedence::StationWide) => true,
            (Some(record), OverridePrecedence::ProductSpecific) => record.is_station_wide(),
        }
    }

    /// Resolves the override (if any) that replaces fetching `product` at
    /// `station`.
    pub fn resolve(
        &self,
        station: &str,
        product: &str,
        precedence: OverridePrecedence,
    ) -> Option<ResolvedOverride> {
        let record = self.get(station)?;
        let station_wide = self.is_station_wide(station, precedence);
        let entry = record.products.get(product);
        if !station_wide && entry.is_none() {
            return None;
        }

        let pick = |specific: Option<&Option<String>>, general: &Option<String>| {
            specific
                .and_then(|v| v.clone())
                .or_else(|| general.clone())
        };
        Some(ResolvedOverride {
            status: pick(entry.map(|e| &e.status), &record.status)
                .unwrap_or_else(|| "Unknown".to_string()),
            date: pick(entry.map(|e| &e.date), &record.date)
                .unwrap_or_else(|| SENTINEL_NA.to_string()),
            time: pick(entry.map(|e| &e.time), &record.time)
                .unwrap_or_else(|| SENTINEL_NA.to_string()),
            station_wide,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
