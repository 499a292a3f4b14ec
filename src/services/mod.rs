//! Entity services: CRUD and simple aggregates for donors, drives and requests.
//!
//! Services are stateless wrappers over [`Storage`](crate::storage::Storage).
//! They assign identifiers and defaults, validate input against each
//! entity's invariants, and report failures as [`crate::Error`].

use serde::Serialize;

use crate::error::{Error, Result};

mod donors;
mod drives;
mod requests;

pub use donors::{BloodTypeCount, DonorService, DonorSummary};
pub use drives::{DriveService, DriveSummary};
pub use requests::{RequestService, RequestSummary};

/// Number of records carrying one status label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    pub status: String,
    pub count: i64,
}

impl StatusCount {
    pub(crate) fn from_pairs(pairs: Vec<(String, i64)>) -> Vec<StatusCount> {
        pairs
            .into_iter()
            .map(|(status, count)| StatusCount { status, count })
            .collect()
    }
}

/// Count for `status` in a grouped result, zero if absent.
pub(crate) fn count_of(counts: &[StatusCount], status: &str) -> i64 {
    counts
        .iter()
        .find(|c| c.status == status)
        .map_or(0, |c| c.count)
}

/// A trimmed, non-blank required string.
pub(crate) fn required_text(value: Option<String>, field: &str) -> Result<String> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(Error::validation(format!("{field} is required"))),
    }
}

pub(crate) fn required<T>(value: Option<T>, field: &str) -> Result<T> {
    value.ok_or_else(|| Error::validation(format!("{field} is required")))
}

/// A trimmed optional string, empty when absent.
pub(crate) fn optional_text(value: Option<String>) -> String {
    value.map(|v| v.trim().to_string()).unwrap_or_default()
}
