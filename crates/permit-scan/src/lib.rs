//! # Permit Scan
//!
//! This crate runs one availability scan for a recreation.gov permit: it
//! fetches the months covering the configured window, diffs the open dates
//! against the dates already notified, alerts on anything new and persists
//! the updated seen state.

/// Configuration, date window and error types for permit scans
mod scan_types;
pub use scan_types::*;

/// Flat-file store of dates that have already been notified
mod seen_store;
pub use seen_store::*;

/// The scan driver
mod executor;
pub use executor::*;

/// Window arithmetic and fetch retry used by the executor
mod executor_helpers;
pub use executor_helpers::*;
