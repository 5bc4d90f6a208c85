//! One poll cycle over the station × product space.
//!
//! Overrides are resolved first and never reach the transport. The remaining
//! pairs are handed to a bounded set of scoped worker threads that share one
//! transport; each worker pulls the next pair index from an atomic counter,
//! so completion order is arbitrary. Results are slotted back by index and
//! the cycle's output is always in catalog order (station-major).

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;

use thiserror::Error;

use crate::config::MonitorConfig;
use crate::correction::CorrectionRegistry;
use crate::ingest::radar::ImageTransport;
use crate::logging::{self, Component};
use crate::model::{StatusRecord, Timestamp, now_in_reference_zone};
use crate::overrides::OverrideStore;
use crate::products::Product;
use crate::stations::Station;
use crate::status::{self, StationStatus};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CycleError {
    #[error("poll cycle cancelled; partial results discarded")]
    Cancelled,
    #[error("poll cycle produced {produced} of {expected} records")]
    Incomplete { expected: usize, produced: usize },
}

/// Shared flag that stops workers from starting new fetches. In-flight
/// fetches finish (bounded by the transport timeout) and are discarded.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Everything one completed cycle produced.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub generated_at: Timestamp,
    /// One entry per station, in catalog order.
    pub stations: Vec<StationStatus>,
}

impl CycleReport {
    /// Every (station, product) record, station-major.
    pub fn records(&self) -> impl Iterator<Item = &StatusRecord> {
        self.stations.iter().flat_map(|s| s.records.iter())
    }

    /// Records for a single product across all stations.
    pub fn records_for(&self, product: &str) -> Vec<StatusRecord> {
        self.records()
            .filter(|r| r.product_type == product)
            .cloned()
            .collect()
    }
}

struct Job<'a> {
    slot: usize,
    station: &'a Station,
    product: &'a Product,
}

/// A configured, reusable poll engine. Holds no state between cycles.
pub struct PollCycle<'a> {
    config: &'a MonitorConfig,
    overrides: OverrideStore,
    corrections: CorrectionRegistry,
}

impl<'a> PollCycle<'a> {
    pub fn new(config: &'a MonitorConfig, overrides: OverrideStore) -> Self {
        Self {
            config,
            overrides,
            corrections: CorrectionRegistry::from_catalog(&config.stations),
        }
    }

    /// Replaces the correction registry built from the catalog.
    pub fn with_corrections(mut self, corrections: CorrectionRegistry) -> Self {
        self.corrections = corrections;
        self
    }

    /// Runs a cycle against the real clock.
    pub fn run_now(
        &self,
        transport: &dyn ImageTransport,
        cancel: &CancelToken,
    ) -> Result<CycleReport, CycleError> {
        self.run(transport, now_in_reference_zone(), cancel)
    }

    /// Runs one cycle with `now` as the single reference instant.
    pub fn run(
        &self,
        transport: &dyn ImageTransport,
        now: Timestamp,
        cancel: &CancelToken,
    ) -> Result<CycleReport, CycleError> {
        let stations = &self.config.stations;
        let products = &self.config.products;
        let precedence = self.config.overrides.precedence;
        let expected = stations.len() * products.len();

        let mut slots: Vec<Option<StatusRecord>> = vec![None; expected];
        let mut jobs = Vec::new();
        for (si, station) in stations.iter().enumerate() {
            for (pi, product) in products.iter().enumerate() {
                let slot = si * products.len() + pi;
                match self.overrides.resolve(&station.code, &product.code, precedence) {
                    Some(resolved) => {
                        slots[slot] = Some(status::override_record(&station.code, &product.code, &resolved));
                    }
                    None => jobs.push(Job { slot, station, product }),
                }
            }
        }
        logging::info(
            Component::System,
            None,
            &format!(
                "Polling {} pair(s) across {} station(s); {} overridden",
                jobs.len(),
                stations.len(),
                expected - jobs.len()
            ),
        );

        self.fetch_all(transport, now, cancel, &jobs, &mut slots);

        if cancel.is_cancelled() {
            logging::warn(Component::System, None, "Poll cycle cancelled");
            return Err(CycleError::Cancelled);
        }

        let records: Vec<StatusRecord> = slots.into_iter().flatten().collect();
        if records.len() != expected {
            return Err(CycleError::Incomplete {
                expected,
                produced: records.len(),
            });
        }

        let mut records = records.into_iter();
        let summaries: Vec<StationStatus> = stations
            .iter()
            .map(|station| {
                let own: Vec<StatusRecord> = records.by_ref().take(products.len()).collect();
                let manual_status = if self.overrides.is_station_wide(&station.code, precedence) {
                    self.overrides.get(&station.code).map(|r| r.manual_status())
                } else {
                    None
                };
                status::summarize_station(station, own, products, manual_status)
            })
            .collect();

        let report = CycleReport {
            generated_at: now,
            stations: summaries,
        };
        let ok = report.records().filter(|r| r.status.is_ok()).count();
        let overridden = report.records().filter(|r| r.overridden).count();
        logging::log_cycle_summary(expected, ok, overridden, expected - ok - overridden);
        Ok(report)
    }

    fn fetch_all(
        &self,
        transport: &dyn ImageTransport,
        now: Timestamp,
        cancel: &CancelToken,
        jobs: &[Job<'_>],
        slots: &mut [Option<StatusRecord>],
    ) {
        if jobs.is_empty() {
            return;
        }
        let workers = self.config.fetch.workers.clamp(1, jobs.len());
        let next = AtomicUsize::new(0);
        let corrections = &self.corrections;
        let policy = self.config.extraction;
        let (tx, rx) = mpsc::channel::<(usize, StatusRecord)>();

        thread::scope(|scope| {
            for _ in 0..workers {
                let tx = tx.clone();
                let next = &next;
                scope.spawn(move || {
                    while !cancel.is_cancelled() {
                        let Some(job) = jobs.get(next.fetch_add(1, Ordering::Relaxed)) else {
                            break;
                        };
                        let outcome = transport.fetch(&job.station.code, &job.product.code);
                        let record = status::resolve_fetch(
                            &job.station.code,
                            job.product,
                            outcome,
                            now,
                            corrections,
                            policy,
                        );
                        if tx.send((job.slot, record)).is_err() {
                            break;
                        }
                    }
                });
            }
            drop(tx);

            for (slot, record) in rx {
                slots[slot] = Some(record);
            }
        });
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
