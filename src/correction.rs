//! Station-specific timestamp corrections.
//!
//! Some upstream radar sites publish timestamps with known, structural
//! defects. A correction is a named capability attached to a station in the
//! catalog; the poll cycle looks it up by station code and applies it after
//! extraction. Stations without a correction get the timestamp unchanged.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use serde::Deserialize;

use crate::model::Timestamp;
use crate::stations::StationCatalog;

/// Re-interprets an extracted timestamp. Implementations must never reject
/// a timestamp: the worst case is returning the input unmodified.
pub trait TimestampCorrection: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &'static str;

    fn correct(&self, timestamp: Timestamp, now: Timestamp) -> Timestamp;
}

/// Correction names accepted in station configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CorrectionKind {
    DayMonthSwap,
}

impl CorrectionKind {
    pub fn capability(self) -> Arc<dyn TimestampCorrection> {
        match self {
            CorrectionKind::DayMonthSwap => Arc::new(DayMonthSwap),
        }
    }
}

// ---------------------------------------------------------------------------
// Day/month transposition
// ---------------------------------------------------------------------------

/// Swaps day and month when the swapped reading lies strictly closer to
/// `now` than the original.
///
/// Only attempted when both fields are <= 12 and they differ; a date like
/// 5 May is its own swap.
#[derive(Debug, Clone, Copy, Default)]
pub struct DayMonthSwap;

impl TimestampCorrection for DayMonthSwap {
    fn name(&self) -> &'static str {
        "day-month-swap"
    }

    fn correct(&self, timestamp: Timestamp, now: Timestamp) -> Timestamp {
        let (day, month) = (timestamp.day(), timestamp.month());
        if day > 12 || month > 12 || day == month {
            return timestamp;
        }
        let Some(candidate) = swap_day_month(timestamp) else {
            return timestamp;
        };
        if (now - candidate).abs() < (now - timestamp).abs() {
            candidate
        } else {
            timestamp
        }
    }
}

fn swap_day_month(timestamp: Timestamp) -> Option<Timestamp> {
    let date = NaiveDate::from_ymd_opt(timestamp.year(), timestamp.day(), timestamp.month())?;
    date.and_time(timestamp.time())
        .and_local_timezone(*timestamp.offset())
        .single()
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Station code -> correction capability, built once per catalog.
#[derive(Debug, Clone, Default)]
pub struct CorrectionRegistry {
    by_station: HashMap<String, Arc<dyn TimestampCorrection>>,
}

impl CorrectionRegistry {
    pub fn from_catalog(catalog: &StationCatalog) -> Self {
        let by_station = catalog
            .iter()
            .filter_map(|s| s.correction.map(|kind| (s.code.clone(), kind.capability())))
            .collect();
        Self { by_station }
    }

    /// Attaches (or replaces) the correction used for `station`.
    pub fn register(&mut self, station: &str, correction: Arc<dyn TimestampCorrection>) {
        self.by_station.insert(station.to_string(), correction);
    }

    pub fn lookup(&self, station: &str) -> Option<&dyn TimestampCorrection> {
        self.by_station.get(station).map(|c| c.as_ref())
    }

    /// Applies the station's correction, or returns `timestamp` untouched.
    pub fn apply(&self, station: &str, timestamp: Timestamp, now: Timestamp) -> Timestamp {
        match self.lookup(station) {
            Some(correction) => correction.correct(timestamp, now),
            None => timestamp,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::reference_offset;
    use crate::stations::Station;
    use chrono::TimeZone;

    fn ist(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> Timestamp {
        reference_offset()
            .with_ymd_and_hms(y, mo, d, h, mi, 0)
            .unwrap()
    }

    #[test]
    fn test_swapped_reading_closer_to_now_is_taken() {
        // Published as 2024-03-06 (6 March) but really 3 June.
        let now = ist(2024, 6, 3, 12, 0);
        let corrected = DayMonthSwap.correct(ist(2024, 3, 6, 11, 50), now);
        assert_eq!(corrected, ist(2024, 6, 3, 11, 50));
    }

    #[test]
    fn test_original_retained_when_swap_is_farther() {
        // day=3, month=6 against now 2024-06-03T12:00: the swap (6 March)
        // would be three months away.
        let now = ist(2024, 6, 3, 12, 0);
        let original = ist(2024, 6, 3, 11, 50);
        assert_eq!(DayMonthSwap.correct(original, now), original);
    }

    #[test]
    fn test_no_op_when_day_equals_month() {
        let now = ist(2024, 6, 3, 12, 0);
        let original = ist(2024, 5, 5, 8, 0);
        assert_eq!(DayMonthSwap.correct(original, now), original);
    }

    #[test]
    fn test_no_op_when_day_exceeds_twelve() {
        let now = ist(2024, 6, 13, 12, 0);
        let original = ist(2024, 6, 13, 11, 0);
        assert_eq!(DayMonthSwap.correct(original, now), original);
    }

    #[test]
    fn test_time_of_day_and_offset_preserved_by_swap() {
        let now = ist(2024, 11, 2, 0, 30);
        let corrected = DayMonthSwap.correct(ist(2024, 2, 11, 23, 59), now);
        assert_eq!(corrected, ist(2024, 11, 2, 23, 59));
        assert_eq!(corrected.offset(), &reference_offset());
    }

    #[test]
    fn test_never_returns_candidate_farther_than_original() {
        let now = ist(2024, 6, 3, 12, 0);
        for month in 1..=12 {
            for day in 1..=12 {
                let original = ist(2024, month, day, 9, 15);
                let corrected = DayMonthSwap.correct(original, now);
                assert!(
                    (now - corrected).abs() <= (now - original).abs(),
                    "correction moved {} away from now",
                    original
                );
            }
        }
    }

    #[test]
    fn test_equal_distance_keeps_original() {
        // Strictly-closer rule: a tie must not swap.
        let now = ist(2024, 6, 3, 12, 0);
        let original = ist(2024, 3, 6, 12, 0);
        let candidate = ist(2024, 6, 3, 12, 0);
        assert!((now - candidate).abs() < (now - original).abs());
        let tie_now = original + (candidate - original) / 2;
        assert_eq!(DayMonthSwap.correct(original, tie_now), original);
    }

    #[test]
    fn test_registry_applies_only_to_registered_station() {
        let catalog = StationCatalog::new(vec![
            Station::new("koc", "Kochi", "Kerala").with_correction(CorrectionKind::DayMonthSwap),
            Station::new("tvm", "Trivandrum", "Kerala"),
        ]);
        let registry = CorrectionRegistry::from_catalog(&catalog);
        let now = ist(2024, 6, 3, 12, 0);
        let transposed = ist(2024, 3, 6, 11, 50);

        assert_eq!(registry.apply("koc", transposed, now), ist(2024, 6, 3, 11, 50));
        assert_eq!(registry.apply("tvm", transposed, now), transposed);
        assert!(registry.lookup("tvm").is_none());
        assert_eq!(registry.lookup("koc").map(|c| c.name()), Some("day-month-swap"));
    }

    #[test]
    fn test_register_adds_correction_for_new_station() {
        let mut registry = CorrectionRegistry::default();
        registry.register("goa", CorrectionKind::DayMonthSwap.capability());
        let now = ist(2024, 6, 3, 12, 0);
        assert_eq!(registry.apply("goa", ist(2024, 3, 6, 11, 0), now), ist(2024, 6, 3, 11, 0));
    }
}
