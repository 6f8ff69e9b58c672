//! # RecGov
//!
//! This crate provides a client for the Rec.gov permit availability API, and the
//! parsing that turns a monthly availability payload into a set of open dates.

/// Extraction of available dates from a monthly permit payload.
mod availability;
pub use availability::*;

/// HTTP client for the monthly permit availability endpoint.
mod permit_client;
pub use permit_client::*;

/// Error types for Rec.gov API calls.
mod types;
pub use types::*;
