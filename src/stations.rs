/// Station registry for the radar freshness monitoring service.
///
/// Defines the catalog of radar ground stations polled each cycle, with
/// display metadata and the optional per-station timestamp correction.
/// The catalog is an immutable value built at startup (from the default
/// IMD list or a TOML config) and passed into the poll cycle; nothing here
/// is global state, so several catalogs can coexist in one process.

use serde::Deserialize;

use crate::correction::CorrectionKind;

// ---------------------------------------------------------------------------
// Station metadata
// ---------------------------------------------------------------------------

/// Metadata for a single radar station.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Station {
    /// Short lowercase station code used in image URLs (e.g. `"koc"`).
    pub code: String,
    /// Display name. Falls back to the upper-cased code when absent.
    #[serde(default)]
    pub name: Option<String>,
    /// State / union territory the station sits in.
    #[serde(default, alias = "state")]
    pub region: Option<String>,
    /// Station-specific timestamp correction, if the upstream feed is known
    /// to need one.
    #[serde(default)]
    pub correction: Option<CorrectionKind>,
}

impl Station {
    pub fn new(code: &str, name: &str, region: &str) -> Self {
        Self {
            code: code.to_string(),
            name: Some(name.to_string()),
            region: Some(region.to_string()),
            correction: None,
        }
    }

    pub fn with_correction(mut self, correction: CorrectionKind) -> Self {
        self.correction = Some(correction);
        self
    }

    pub fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| self.code.to_uppercase())
    }

    pub fn region_or_unknown(&self) -> &str {
        self.region.as_deref().unwrap_or("Unknown")
    }
}

/// (code, name, state) for every IMD radar site polled by default.
const IMD_STATIONS: &[(&str, &str, &str)] = &[
    ("agt", "Agartala", "Tripura"),
    ("aya", "Delhi Ayanagar", "Delhi"),
    ("bnh", "Banihal", "Jammu & Kashmir"),
    ("bhj", "Bhuj", "Gujrat"),
    ("bhp", "Bhopal", "Madhya Pradesh"),
    ("cpj", "Cherapunji", "Meghalaya"),
    ("cni", "Chennai", "Tamilnadu"),
    ("dli", "Delhi Hq", "Delhi"),
    ("dlh", "Delhi Palam", "Delhi"),
    ("goa", "Goa", "Goa"),
    ("gop", "Gopalpur", "Odhisa"),
    ("hyd", "Hyderabad", "Telangana"),
    ("jot", "Jot", "Himachal Pradesh"),
    ("jmu", "Jammu", "Jammu & Kashmir"),
    ("jpr", "Jaipur", "Rajasthan"),
    ("kuf", "Kufri", "Himachal Pradesh"),
    ("kkl", "Karaikal", "Puducherry"),
    ("kol", "Kolkata", "West Bengal"),
    ("koc", "Kochi", "Kerala"),
    ("leh", "Leh", "Ladakh"),
    ("ldn", "Lansdowne", "Uttrakhand"),
    ("lkn", "Lucknow", "Uttar Pradesh"),
    ("mks", "Mukteshwar", "Uttrakhand"),
    ("mur", "Murari Devi", "Himachal Pradesh"),
    ("mbr", "Mohanbari", "Assam"),
    ("mpt", "Machilipatnam", "Andhra Pradesh"),
    ("mum", "Mumbai", "Maharashtra"),
    ("ngp", "Nagpur", "Maharashtra"),
    ("pdp", "Paradip", "Odhisa"),
    ("plk", "Pallikarni", "Tamilnadu"),
    ("ptn", "Patna", "Bihar"),
    ("ptl", "Patiala", "Punjab"),
    ("rpr", "Raipur", "Chattisgarh"),
    ("shr", "Sriharikota", "Andhra Pradesh"),
    ("sur", "Surkanda Devi", "Uttrakhand"),
    ("slp", "Solapur", "Maharashtra"),
    ("srn", "Srinagar", "Jammu & Kashmir"),
    ("tvm", "Trivandrum", "Kerala"),
    ("vrv", "Veravai", "Maharashtra"),
    ("vsk", "Visakhapatnam", "Andhra Pradesh"),
];

/// Kochi occasionally publishes timestamps with day and month transposed.
const DAY_MONTH_SWAP_STATION: &str = "koc";

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Ordered, immutable set of stations polled in a cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationCatalog {
    stations: Vec<Station>,
}

impl StationCatalog {
    pub fn new(stations: Vec<Station>) -> Self {
        Self { stations }
    }

    /// The 40 IMD radar sites, with the Kochi day/month correction attached.
    pub fn imd_default() -> Self {
        let stations = IMD_STATIONS
            .iter()
            .map(|(code, name, state)| {
                let station = Station::new(code, name, state);
                if *code == DAY_MONTH_SWAP_STATION {
                    station.with_correction(CorrectionKind::DayMonthSwap)
                } else {
                    station
                }
            })
            .collect();
        Self { stations }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Station> {
        self.stations.iter()
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// Station codes in catalog order.
    pub fn codes(&self) -> Vec<&str> {
        self.stations.iter().map(|s| s.code.as_str()).collect()
    }

    /// Looks up a station by code. Returns `None` if not found.
    pub fn find(&self, code: &str) -> Option<&Station> {
        self.stations.iter().find(|s| s.code == code)
    }

    /// Display name for a code, falling back to the upper-cased code.
    pub fn display_name(&self, code: &str) -> String {
        self.find(code)
            .map(Station::display_name)
            .unwrap_or_else(|| code.to_uppercase())
    }

    pub fn region(&self, code: &str) -> String {
        self.find(code)
            .map(|s| s.region_or_unknown().to_string())
            .unwrap_or_else(|| "Unknown".to_string())
    }

    /// Returns the first code that appears more than once, if any.
    pub fn first_duplicate(&self) -> Option<&str> {
        let mut seen = std::collections::HashSet::new();
        self.stations
            .iter()
            .map(|s| s.code.as_str())
            .find(|code| !seen.insert(*code))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------


// ---------------------------------------------------------------------------
// Integration Tests - Live Radar Endpoint
// ---------------------------------------------------------------------------
//
// These tests verify that the catalog's stations actually publish images on
// the live IMD radar endpoint. They are marked #[ignore] so they don't run
// during normal CI builds.
//
// To run these tests manually:
//   cargo test -- --ignored station_api
