//! Freshness classification.
//!
//! Notification dispatch is not handled here; this module only turns an
//! extracted timestamp into a Fresh/Stale verdict.

pub mod stalenesses;

pub use stalenesses::evaluate;
