//! JSON status reports for the dashboard.
//!
//! Two shapes are produced from a completed cycle:
//! - a record report: a JSON array of `StatusRecord` for one product, written
//!   to `status_<product>_<YYYYmmdd_HHMMSS>.json`;
//! - a station report: one row per station with a column per product and an
//!   `overall` marker, written to `status_all_<YYYYmmdd_HHMMSS>.json`.
//!
//! Field names, sentinel strings and marker glyphs are a contract with the
//! dashboard.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};
use thiserror::Error;

use crate::logging::{self, Component};
use crate::model::{SENTINEL_INVALID, SENTINEL_MISSING, StatusLabel, StatusRecord, Timestamp, Verdict};
use crate::poll::CycleReport;
use crate::products::ProductCatalog;
use crate::status::StationStatus;

const FILE_STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to write report {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Station rows
// ---------------------------------------------------------------------------

/// One dashboard row. Serialized with keys in display order:
/// `station`, `name`, `state`, product columns or `manual_status`, `overall`.
#[derive(Debug, Clone, PartialEq)]
pub struct StationRow {
    pub station: String,
    pub name: String,
    pub state: String,
    pub columns: Vec<(String, String)>,
    pub manual_status: Option<String>,
    pub overall: Verdict,
}

impl Serialize for StationRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("station", &self.station)?;
        map.serialize_entry("name", &self.name)?;
        map.serialize_entry("state", &self.state)?;
        if let Some(manual) = &self.manual_status {
            map.serialize_entry("manual_status", manual)?;
        }
        for (product, value) in &self.columns {
            map.serialize_entry(product, value)?;
        }
        map.serialize_entry("overall", self.overall.glyph())?;
        map.end()
    }
}

/// Cell text for one product in a station row.
pub fn cell_value(record: &StatusRecord) -> String {
    if let Some(ts) = &record.timestamp {
        return ts.datetime_string();
    }
    match &record.status {
        StatusLabel::Invalid => SENTINEL_INVALID.to_string(),
        StatusLabel::Manual(label) => label.clone(),
        _ => SENTINEL_MISSING.to_string(),
    }
}

/// Builds a row. Stations under a station-wide override carry only their
/// manual status; their product columns are omitted.
pub fn station_row(status: &StationStatus, products: &ProductCatalog) -> StationRow {
    let columns = if status.manual_status.is_some() {
        Vec::new()
    } else {
        products
            .iter()
            .filter_map(|p| status.record(&p.code).map(|r| (p.code.clone(), cell_value(r))))
            .collect()
    };
    StationRow {
        station: status.station.clone(),
        name: status.name.clone(),
        state: status.region.clone(),
        columns,
        manual_status: status.manual_status.clone(),
        overall: status.overall,
    }
}

pub fn station_rows(report: &CycleReport, products: &ProductCatalog) -> Vec<StationRow> {
    report
        .stations
        .iter()
        .map(|s| station_row(s, products))
        .collect()
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// `status_<label>_<YYYYmmdd_HHMMSS>.json`
pub fn report_filename(label: &str, generated_at: Timestamp) -> String {
    format!("status_{}_{}.json", label, generated_at.format(FILE_STAMP_FORMAT))
}

pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> Result<String, ReportError> {
    Ok(serde_json::to_string_pretty(value)?)
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), ReportError> {
    let io_err = |source: std::io::Error| ReportError::Io {
        path: path.display().to_string(),
        source,
    };
    let mut writer = BufWriter::new(File::create(path).map_err(io_err)?);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush().map_err(io_err)
}

/// Writes the record report for `product` into `dir`.
pub fn write_records_report(
    dir: &Path,
    product: &str,
    report: &CycleReport,
) -> Result<PathBuf, ReportError> {
    let path = dir.join(report_filename(product, report.generated_at));
    let records = report.records_for(product);
    write_json(&path, &records)?;
    logging::info(
        Component::Report,
        None,
        &format!("Wrote {} {} record(s) to {}", records.len(), product, path.display()),
    );
    Ok(path)
}

/// Writes the all-products station report into `dir`.
pub fn write_station_report(
    dir: &Path,
    report: &CycleReport,
    products: &ProductCatalog,
) -> Result<PathBuf, ReportError> {
    let path = dir.join(report_filename("all", report.generated_at));
    let rows = station_rows(report, products);
    write_json(&path, &rows)?;
    logging::info(
        Component::Report,
        None,
        &format!("Wrote {} station row(s) to {}", rows.len(), path.display()),
    );
    Ok(path)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ExtractedTimestamp, Freshness, TimestampSource, reference_offset};
    use crate::products::Product;
    use chrono::TimeZone;

    fn at() -> Timestamp {
        reference_offset().with_ymd_and_hms(2024, 6, 1, 9, 45, 7).unwrap()
    }

    fn ok_record(product: &str) -> StatusRecord {
        StatusRecord::evaluated(
            "goa",
            product,
            ExtractedTimestamp::new(at(), TimestampSource::EmbeddedComment),
            Freshness::Fresh,
        )
    }

    fn products() -> ProductCatalog {
        ProductCatalog::new(vec![
            Product::new("caz", 90),
            Product::new("ppi", 90),
            Product::new("pac", 1440).auxiliary(),
        ])
    }

    fn goa(records: Vec<StatusRecord>, manual: Option<&str>, overall: Verdict) -> StationStatus {
        StationStatus {
            station: "goa".into(),
            name: "Goa".into(),
            region: "Goa".into(),
            records,
            overall,
            manual_status: manual.map(str::to_string),
        }
    }

    #[test]
    fn test_record_serialization_matches_dashboard_fields() {
        let value = serde_json::to_value(ok_record("caz")).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "station": "goa",
                "date": "2024-06-01",
                "time": "09:45:07",
                "status": "Ok",
                "product_type": "caz"
            })
        );
    }

    #[test]
    fn test_problem_record_carries_error_message() {
        let record = StatusRecord::without_timestamp(
            "goa",
            "caz",
            StatusLabel::Problem,
            "NA",
            Some("HTTP error: 404".into()),
        );
        let value = serde_json::to_value(record).unwrap();
        assert_eq!(value["status"], "problem");
        assert_eq!(value["error_message"], "HTTP error: 404");
    }

    #[test]
    fn test_overridden_record_is_marked() {
        let record = StatusRecord::overridden("goa", "caz", "Down", "NA", "NA");
        let value = serde_json::to_value(record).unwrap();
        assert_eq!(value["overridden"], true);
        assert_eq!(value["status"], "Down");
    }

    #[test]
    fn test_cell_values() {
        assert_eq!(cell_value(&ok_record("caz")), "2024-06-01 09:45:07");
        let invalid = StatusRecord::without_timestamp("goa", "caz", StatusLabel::Invalid, "Invalid", None);
        assert_eq!(cell_value(&invalid), "Invalid");
        let missing = StatusRecord::without_timestamp("goa", "caz", StatusLabel::TimestampMissing, "NA", None);
        assert_eq!(cell_value(&missing), "Missing");
        let problem = StatusRecord::without_timestamp("goa", "caz", StatusLabel::Problem, "NA", None);
        assert_eq!(cell_value(&problem), "Missing");
        let manual = StatusRecord::overridden("goa", "pac", "Disabled", "NA", "NA");
        assert_eq!(cell_value(&manual), "Disabled");
    }

    #[test]
    fn test_station_row_keys_in_display_order() {
        let status = goa(
            vec![ok_record("caz"), ok_record("ppi"), ok_record("pac")],
            None,
            Verdict::Pass,
        );
        let json = serde_json::to_string(&station_row(&status, &products())).unwrap();
        assert_eq!(
            json,
            r#"{"station":"goa","name":"Goa","state":"Goa","caz":"2024-06-01 09:45:07","ppi":"2024-06-01 09:45:07","pac":"2024-06-01 09:45:07","overall":"✔️"}"#
        );
    }

    #[test]
    fn test_station_wide_override_row_has_manual_status_only() {
        let records = vec![
            StatusRecord::overridden("goa", "caz", "Down", "2024-05-01", "10:00"),
            StatusRecord::overridden("goa", "ppi", "Down", "2024-05-01", "10:00"),
            StatusRecord::overridden("goa", "pac", "Down", "2024-05-01", "10:00"),
        ];
        let status = goa(records, Some("Down Since 2024-05-01 10:00"), Verdict::Fail);
        let row = station_row(&status, &products());
        assert!(row.columns.is_empty());
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(
            json,
            r#"{"station":"goa","name":"Goa","state":"Goa","manual_status":"Down Since 2024-05-01 10:00","overall":"❌"}"#
        );
    }

    #[test]
    fn test_report_filename() {
        assert_eq!(report_filename("caz", at()), "status_caz_20240601_094507.json");
        assert_eq!(report_filename("all", at()), "status_all_20240601_094507.json");
    }

    #[test]
    fn test_write_reports_to_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let report = CycleReport {
            generated_at: at(),
            stations: vec![goa(vec![ok_record("caz")], None, Verdict::Pass)],
        };
        let catalog = ProductCatalog::single("caz", 30);

        let records_path = write_records_report(dir.path(), "caz", &report).expect("writes");
        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&records_path).unwrap()).unwrap();
        assert_eq!(written.as_array().map(Vec::len), Some(1));

        let rows_path = write_station_report(dir.path(), &report, &catalog).expect("writes");
        let text = std::fs::read_to_string(&rows_path).unwrap();
        assert!(text.contains("\"overall\": \"✔️\""), "glyph kept as UTF-8: {}", text);
    }

    #[test]
    fn test_write_into_missing_directory_is_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let report = CycleReport {
            generated_at: at(),
            stations: Vec::new(),
        };
        let err = write_records_report(&dir.path().join("nope"), "caz", &report).unwrap_err();
        assert!(matches!(err, ReportError::Io { .. }));
    }
}
