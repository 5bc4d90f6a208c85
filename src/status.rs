//! Per-pair status resolution and per-station verdicts.
//!
//! Each (station, product) pair moves through one of three paths, and every
//! path ends in exactly one `StatusRecord`:
//!
//! ```text
//! Overridden ─────────────────────────────────────────────► record (manual)
//! Pending → Fetched → Extracted → Corrected → Evaluated ──► Ok / Not Ok
//!                   └► ExtractionFailed ──────────────────► Invalid / Timestamp Missing / problem
//!         └► FetchFailed ─────────────────────────────────► problem
//! ```

use crate::alert::stalenesses;
use crate::correction::CorrectionRegistry;
use crate::extract::{self, ExtractionPolicy};
use crate::ingest::radar::FetchedImage;
use crate::logging::{self, Component};
use crate::model::{
    ExtractionFailure, FetchError, SENTINEL_INVALID, SENTINEL_NA, StatusLabel, StatusRecord,
    Timestamp, Verdict,
};
use crate::overrides::ResolvedOverride;
use crate::products::{Product, ProductCatalog};
use crate::stations::Station;

// ---------------------------------------------------------------------------
// Pair resolution
// ---------------------------------------------------------------------------

/// Record for a pair suppressed by an override. No fetch takes place.
pub fn override_record(station: &str, product: &str, resolved: &ResolvedOverride) -> StatusRecord {
    StatusRecord::overridden(
        station,
        product,
        &resolved.status,
        &resolved.date,
        &resolved.time,
    )
}

/// Turns one fetch outcome into the pair's status record: extraction, the
/// station's correction (identity unless registered), then freshness.
pub fn resolve_fetch(
    station: &str,
    product: &Product,
    outcome: Result<FetchedImage, FetchError>,
    now: Timestamp,
    corrections: &CorrectionRegistry,
    policy: ExtractionPolicy,
) -> StatusRecord {
    let image = match outcome {
        Ok(image) => image,
        Err(e) => {
            logging::log_fetch_failure(station, &product.code, &e);
            return StatusRecord::without_timestamp(
                station,
                &product.code,
                StatusLabel::Problem,
                SENTINEL_NA,
                Some(e.to_string()),
            );
        }
    };

    let extracted = match extract::extract(&image.body, image.last_modified.as_deref(), policy) {
        Ok(ts) => ts,
        Err(failure) => {
            logging::log_extraction_failure(station, &product.code, &failure);
            return extraction_failure_record(station, &product.code, &failure);
        }
    };

    let mut corrected = extracted;
    corrected.at = corrections.apply(station, extracted.at, now);
    if corrected.at != extracted.at {
        logging::info(
            Component::Extract,
            Some(station),
            &format!(
                "{} timestamp corrected from {} to {}",
                product.code,
                extracted.datetime_string(),
                corrected.datetime_string()
            ),
        );
    }

    let freshness = stalenesses::evaluate(corrected.at, now, product.threshold_minutes);
    logging::debug(
        Component::Radar,
        Some(station),
        &format!(
            "{} generated {} via {} ({} min old, threshold {}): {:?}",
            product.code,
            corrected.datetime_string(),
            corrected.source,
            stalenesses::age_minutes(corrected.at, now),
            product.threshold_minutes,
            freshness
        ),
    );
    StatusRecord::evaluated(station, &product.code, corrected, freshness)
}

fn extraction_failure_record(station: &str, product: &str, failure: &ExtractionFailure) -> StatusRecord {
    match failure {
        ExtractionFailure::Missing => StatusRecord::without_timestamp(
            station,
            product,
            StatusLabel::TimestampMissing,
            SENTINEL_NA,
            None,
        ),
        ExtractionFailure::Malformed { .. } => StatusRecord::without_timestamp(
            station,
            product,
            StatusLabel::Invalid,
            SENTINEL_INVALID,
            Some(failure.to_string()),
        ),
        ExtractionFailure::Container(e) => StatusRecord::without_timestamp(
            station,
            product,
            StatusLabel::Problem,
            SENTINEL_NA,
            Some(e.to_string()),
        ),
    }
}

// ---------------------------------------------------------------------------
// Station verdict
// ---------------------------------------------------------------------------

/// All records for one station plus its overall verdict.
#[derive(Debug, Clone, PartialEq)]
pub struct StationStatus {
    pub station: String,
    pub name: String,
    pub region: String,
    pub records: Vec<StatusRecord>,
    pub overall: Verdict,
    /// Set when a station-wide override suppressed every product.
    pub manual_status: Option<String>,
}

impl StationStatus {
    pub fn record(&self, product: &str) -> Option<&StatusRecord> {
        self.records.iter().find(|r| r.product_type == product)
    }
}

/// Pass iff every gating product has an `Ok` record. A station-wide
/// override always fails, whatever the product data says.
pub fn overall_verdict(
    records: &[StatusRecord],
    products: &ProductCatalog,
    station_wide_override: bool,
) -> Verdict {
    if station_wide_override {
        return Verdict::Fail;
    }
    let all_ok = products.gating().all(|product| {
        records
            .iter()
            .any(|r| r.product_type == product.code && r.status.is_ok())
    });
    if all_ok { Verdict::Pass } else { Verdict::Fail }
}

/// Builds the station summary from that station's records.
pub fn summarize_station(
    station: &Station,
    records: Vec<StatusRecord>,
    products: &ProductCatalog,
    manual_status: Option<String>,
) -> StationStatus {
    let overall = overall_verdict(&records, products, manual_status.is_some());
    StationStatus {
        station: station.code.clone(),
        name: station.display_name(),
        region: station.region_or_unknown().to_string(),
        records,
        overall,
        manual_status,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correction::CorrectionKind;
    use crate::extract::gif::fixtures::gif_with_comment;
    use crate::model::{ContainerError, reference_offset};
    use crate::stations::StationCatalog;
    use chrono::TimeZone;

    fn now() -> Timestamp {
        reference_offset().with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap()
    }

    fn image(comment: &str) -> Result<FetchedImage, FetchError> {
        Ok(FetchedImage {
            body: gif_with_comment(Some(comment.as_bytes())),
            last_modified: None,
        })
    }

    fn resolve(station: &str, outcome: Result<FetchedImage, FetchError>) -> StatusRecord {
        let catalog = StationCatalog::imd_default();
        let corrections = CorrectionRegistry::from_catalog(&catalog);
        resolve_fetch(
            station,
            &Product::new("caz", 90),
            outcome,
            now(),
            &corrections,
            ExtractionPolicy::CommentThenHeader,
        )
    }

    #[test]
    fn test_fresh_snapshot_is_ok_with_formatted_timestamp() {
        let record = resolve("goa", image("2024-06-01T08:30:00"));
        assert_eq!(record.status, StatusLabel::Ok);
        assert_eq!(record.date, "2024-06-01");
        assert_eq!(record.time, "08:30:00");
        assert_eq!(record.error_message, None);
    }

    #[test]
    fn test_stale_snapshot_is_not_ok() {
        let record = resolve("goa", image("2024-06-01T08:29:59"));
        assert_eq!(record.status, StatusLabel::NotOk);
        assert_eq!(record.time, "08:29:59");
    }

    #[test]
    fn test_fetch_failure_is_problem_with_detail() {
        let err = FetchError::Timeout("operation timed out".into());
        let record = resolve("goa", Err(err));
        assert_eq!(record.status, StatusLabel::Problem);
        assert_eq!(record.date, "NA");
        assert_eq!(record.time, "NA");
        assert!(record.error_message.unwrap().contains("timed out"));
        assert!(record.timestamp.is_none());
    }

    #[test]
    fn test_malformed_comment_is_invalid_with_sentinels() {
        let record = resolve("goa", image("not a date"));
        assert_eq!(record.status, StatusLabel::Invalid);
        assert_eq!(record.date, "Invalid");
        assert_eq!(record.time, "Invalid");
    }

    #[test]
    fn test_missing_timestamp_has_na_sentinels() {
        let outcome = Ok(FetchedImage {
            body: gif_with_comment(None),
            last_modified: None,
        });
        let record = resolve("goa", outcome);
        assert_eq!(record.status, StatusLabel::TimestampMissing);
        assert_eq!((record.date.as_str(), record.time.as_str()), ("NA", "NA"));
    }

    #[test]
    fn test_undecodable_body_is_problem() {
        let outcome = Ok(FetchedImage {
            body: b"<html/>".to_vec(),
            last_modified: None,
        });
        let record = resolve("goa", outcome);
        assert_eq!(record.status, StatusLabel::Problem);
        assert_eq!(record.error_message, Some(ContainerError::NotGif.to_string()));
    }

    #[test]
    fn test_kochi_transposed_date_is_corrected_before_evaluation() {
        // 2024-01-06 would be months stale; read as 1 June it is fresh.
        let record = resolve("koc", image("2024-01-06T09:45:00"));
        assert_eq!(record.status, StatusLabel::Ok);
        assert_eq!(record.date, "2024-06-01");
    }

    #[test]
    fn test_other_stations_are_never_corrected() {
        let record = resolve("tvm", image("2024-01-06T09:45:00"));
        assert_eq!(record.status, StatusLabel::NotOk);
        assert_eq!(record.date, "2024-01-06");
    }

    #[test]
    fn test_override_record_carries_marker() {
        let resolved = ResolvedOverride {
            status: "Under Maintenance".into(),
            date: "2024-05-01".into(),
            time: "10:00".into(),
            station_wide: true,
        };
        let record = override_record("bhj", "caz", &resolved);
        assert!(record.overridden);
        assert_eq!(record.status.as_str(), "Under Maintenance");
        assert_eq!(record.date, "2024-05-01");
    }

    // --- Overall verdict ----------------------------------------------------

    fn record(product: &str, status: StatusLabel) -> StatusRecord {
        StatusRecord::without_timestamp("goa", product, status, "NA", None)
    }

    #[test]
    fn test_overall_passes_when_all_gating_ok() {
        let products = ProductCatalog::new(vec![
            Product::new("caz", 90),
            Product::new("pac", 1440).auxiliary(),
        ]);
        let records = vec![
            record("caz", StatusLabel::Ok),
            record("pac", StatusLabel::Problem),
        ];
        assert_eq!(overall_verdict(&records, &products, false), Verdict::Pass);
    }

    #[test]
    fn test_any_failing_gating_product_fails_station() {
        let products = ProductCatalog::new(vec![Product::new("caz", 90), Product::new("ppi", 90)]);
        for bad in [
            StatusLabel::NotOk,
            StatusLabel::Invalid,
            StatusLabel::TimestampMissing,
            StatusLabel::Problem,
            StatusLabel::Manual("Down".into()),
        ] {
            let records = vec![record("caz", StatusLabel::Ok), record("ppi", bad.clone())];
            assert_eq!(
                overall_verdict(&records, &products, false),
                Verdict::Fail,
                "{:?} should fail the station",
                bad
            );
        }
    }

    #[test]
    fn test_station_wide_override_forces_fail() {
        let products = ProductCatalog::single("caz", 90);
        let records = vec![record("caz", StatusLabel::Ok)];
        assert_eq!(overall_verdict(&records, &products, true), Verdict::Fail);
    }

    #[test]
    fn test_summarize_station_fills_display_metadata() {
        let catalog = StationCatalog::imd_default();
        let station = catalog.find("koc").unwrap();
        assert_eq!(station.correction, Some(CorrectionKind::DayMonthSwap));
        let summary = summarize_station(
            station,
            vec![record("caz", StatusLabel::Ok)],
            &ProductCatalog::single("caz", 30),
            None,
        );
        assert_eq!(summary.name, "Kochi");
        assert_eq!(summary.region, "Kerala");
        assert_eq!(summary.overall, Verdict::Pass);
        assert!(summary.record("caz").is_some());
    }
}
