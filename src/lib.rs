//! Radar product freshness monitoring service.
//!
//! Polls IMD weather-radar stations for their product snapshots, extracts
//! each snapshot's generation timestamp, classifies it against a per-product
//! staleness threshold, folds in manual overrides, and produces status
//! reports for the dashboard.

pub mod alert;
pub mod config;
pub mod correction;
pub mod extract;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod overrides;
pub mod poll;
pub mod products;
pub mod report;
pub mod stations;
pub mod status;
