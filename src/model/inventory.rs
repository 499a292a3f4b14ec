use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{BloodType, deserialize_opt_timestamp};
use crate::ledger::{DEFAULT_EXPIRY_DAYS, DEFAULT_LOW_STOCK_THRESHOLD};

/// Stock on hand for one blood type.
///
/// `units` is the authoritative aggregate. It normally equals the sum of
/// `expiry_batches[*].units`, but administrative corrections and allocations
/// change `units` without touching batches, so the two may drift apart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryRecord {
    pub blood_type: BloodType,
    pub units: i64,
    pub last_updated: DateTime<Utc>,
    /// Batches in the order they were received.
    pub expiry_batches: Vec<ExpiryBatch>,
}

impl InventoryRecord {
    /// Sum of units across all batches.
    pub fn batch_units(&self) -> i64 {
        self.expiry_batches.iter().map(|b| b.units).sum()
    }

    /// `units` minus the batch total; zero when the two agree.
    pub fn drift(&self) -> i64 {
        self.units - self.batch_units()
    }
}

/// Units received together, sharing one expiry date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpiryBatch {
    pub id: i64,
    pub units: i64,
    pub expiry_date: DateTime<Utc>,
    pub donation_date: DateTime<Utc>,
}

/// One batch flagged by the expiry alert, flattened out of its record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpiringBatch {
    pub blood_type: BloodType,
    pub units: i64,
    pub expiry_date: DateTime<Utc>,
}

/// Body of `POST /inventory`: receive donated units.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplenishRequest {
    pub blood_type: Option<BloodType>,
    pub units: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_opt_timestamp")]
    pub expiry_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_opt_timestamp")]
    pub donation_date: Option<DateTime<Utc>>,
}

/// Body of `PUT /inventory/:bloodType`: absolute correction.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SetUnitsRequest {
    pub units: Option<i64>,
}

/// Body of `POST /inventory/:bloodType/use`: allocation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UseRequest {
    pub units: Option<i64>,
}

/// Query parameters for the low-stock alert.
#[derive(Debug, Deserialize)]
pub struct LowStockQuery {
    /// Records strictly below this many units are reported (default: 30).
    #[serde(default = "default_low_stock_threshold")]
    pub threshold: u32,
}

fn default_low_stock_threshold() -> u32 {
    DEFAULT_LOW_STOCK_THRESHOLD
}

/// Query parameters for the expiry alert.
#[derive(Debug, Deserialize)]
pub struct ExpiringQuery {
    /// Look-ahead window in days (default: 7).
    #[serde(default = "default_expiry_days")]
    pub days: u32,
}

fn default_expiry_days() -> u32 {
    DEFAULT_EXPIRY_DAYS
}
