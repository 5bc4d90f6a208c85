/// Radar snapshot staleness detection.
///
/// Radar products are regenerated every few minutes under normal operation.
/// A snapshot whose generation timestamp falls too far behind the clock
/// means the site has stopped producing or publishing, which the dashboard
/// needs to flag.
///
/// # Clock injection
/// All functions accept a `now` parameter rather than reading the clock
/// internally. This makes staleness purely deterministic in tests without
/// mocking or time manipulation.

use chrono::TimeDelta;

use crate::model::{Freshness, Timestamp, now_in_reference_zone};

// ---------------------------------------------------------------------------
// Freshness check
// ---------------------------------------------------------------------------

/// Classifies `timestamp` against `threshold_minutes` relative to `now`.
///
/// Staleness is defined as strictly greater than the threshold:
///   age >  threshold  →  Stale
///   age == threshold  →  Fresh
///
/// A negative age (future-dated snapshot or clock skew) is Fresh.
pub fn evaluate(timestamp: Timestamp, now: Timestamp, threshold_minutes: u32) -> Freshness {
    if is_stale_at(timestamp, threshold_minutes, now) {
        Freshness::Stale
    } else {
        Freshness::Fresh
    }
}

/// Returns `true` if `timestamp` is older than `threshold_minutes` at `now`.
pub fn is_stale_at(timestamp: Timestamp, threshold_minutes: u32, now: Timestamp) -> bool {
    now - timestamp > TimeDelta::minutes(i64::from(threshold_minutes))
}

/// Convenience wrapper that uses the real current time.
/// Use `is_stale_at` in tests to keep them deterministic.
pub fn is_stale(timestamp: Timestamp, threshold_minutes: u32) -> bool {
    is_stale_at(timestamp, threshold_minutes, now_in_reference_zone())
}

/// Whole minutes elapsed between `timestamp` and `now`; negative when the
/// snapshot is dated in the future.
pub fn age_minutes(timestamp: Timestamp, now: Timestamp) -> i64 {
    (now - timestamp).num_minutes()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::reference_offset;
    use chrono::TimeZone;

    fn ist(h: u32, m: u32, s: u32) -> Timestamp {
        reference_offset()
            .with_ymd_and_hms(2024, 6, 1, h, m, s)
            .unwrap()
    }

    /// A fixed "now" used across all tests: 2024-06-01 10:00:00 +05:30.
    fn fixed_now() -> Timestamp {
        ist(10, 0, 0)
    }

    // --- Fresh --------------------------------------------------------------

    #[test]
    fn test_snapshot_5_minutes_old_is_fresh() {
        assert_eq!(evaluate(ist(9, 55, 0), fixed_now(), 30), Freshness::Fresh);
    }

    #[test]
    fn test_snapshot_exactly_at_threshold_is_fresh() {
        // 90 minutes old against a 90-minute threshold: equality is fresh.
        assert_eq!(evaluate(ist(8, 30, 0), fixed_now(), 90), Freshness::Fresh);
    }

    #[test]
    fn test_future_dated_snapshot_is_fresh() {
        assert_eq!(evaluate(ist(11, 45, 0), fixed_now(), 30), Freshness::Fresh);
        assert!(age_minutes(ist(11, 45, 0), fixed_now()) < 0);
    }

    #[test]
    fn test_zero_threshold_accepts_same_instant_only() {
        assert_eq!(evaluate(fixed_now(), fixed_now(), 0), Freshness::Fresh);
        assert_eq!(evaluate(ist(9, 59, 59), fixed_now(), 0), Freshness::Stale);
    }

    // --- Stale --------------------------------------------------------------

    #[test]
    fn test_one_second_past_threshold_is_stale() {
        // 08:29:59 is 90m01s before 10:00:00.
        assert_eq!(evaluate(ist(8, 29, 59), fixed_now(), 90), Freshness::Stale);
    }

    #[test]
    fn test_one_minute_past_threshold_is_stale() {
        assert_eq!(evaluate(ist(8, 29, 0), fixed_now(), 90), Freshness::Stale);
        assert_eq!(age_minutes(ist(8, 29, 0), fixed_now()), 91);
    }

    #[test]
    fn test_other_offset_compared_as_instant() {
        // 04:00 UTC == 09:30 IST, so 30 minutes old.
        let utc_snapshot = chrono::Utc
            .with_ymd_and_hms(2024, 6, 1, 4, 0, 0)
            .unwrap()
            .fixed_offset();
        assert!(!is_stale_at(utc_snapshot, 30, fixed_now()));
        assert!(is_stale_at(utc_snapshot, 29, fixed_now()));
    }

    // --- Threshold variation ------------------------------------------------

    #[test]
    fn test_same_snapshot_stale_under_tight_threshold_not_under_daily() {
        let snapshot = ist(7, 0, 0); // 3 hours old
        assert!(is_stale_at(snapshot, 90, fixed_now()));
        assert!(!is_stale_at(snapshot, 1440, fixed_now()));
    }

    #[test]
    fn test_boundary_holds_for_range_of_thresholds() {
        for threshold in [0u32, 1, 30, 60, 90, 1440] {
            let at = fixed_now() - TimeDelta::minutes(i64::from(threshold));
            assert_eq!(evaluate(at, fixed_now(), threshold), Freshness::Fresh);
            let past = at - TimeDelta::minutes(1);
            assert_eq!(evaluate(past, fixed_now(), threshold), Freshness::Stale);
        }
    }
}
