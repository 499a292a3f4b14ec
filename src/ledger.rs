//! Inventory ledger: units on hand per blood type.
//!
//! The ledger is the only writer of inventory records and expiry batches.
//! It guarantees that:
//!
//! - `units` never goes below zero;
//! - an allocation either takes the full amount or nothing;
//! - concurrent allocations and replenishments of the same blood type never
//!   lose an update (the store applies each one as a single atomic write).
//!
//! Allocations decrement the aggregate only. They do not pick or shrink
//! individual batches, and direct corrections leave batches untouched, so
//! `units` and the batch total can drift apart (see [`InventoryRecord::drift`]).

use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::model::{self, BloodType, ExpiringBatch, InventoryRecord};
use crate::storage::{Deduction, Storage};

/// Default threshold for [`InventoryLedger::low_stock_alerts`].
pub const DEFAULT_LOW_STOCK_THRESHOLD: u32 = 30;

/// Default look-ahead for [`InventoryLedger::expiring_batches`].
pub const DEFAULT_EXPIRY_DAYS: u32 = 7;

/// Upper bound on the units moved by a single operation.
pub const MAX_UNITS_PER_OPERATION: i64 = 1_000_000;

/// Reads and writes stock levels on top of [`Storage`].
#[derive(Clone)]
pub struct InventoryLedger {
    storage: Storage,
}

impl InventoryLedger {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// Every record, sorted by blood type label.
    pub async fn get_all(&self) -> Result<Vec<InventoryRecord>> {
        self.storage.list_inventory().await
    }

    pub async fn get_by_type(&self, blood_type: BloodType) -> Result<InventoryRecord> {
        self.storage
            .get_inventory(blood_type)
            .await?
            .ok_or_else(|| not_in_inventory(blood_type))
    }

    /// Make sure every blood type has a record. Existing records are left
    /// alone; returns only the records this call created.
    pub async fn initialize(&self) -> Result<Vec<InventoryRecord>> {
        let now = model::now();
        let mut created = Vec::new();

        for blood_type in BloodType::ALL {
            if let Some(record) = self.storage.insert_inventory_if_absent(*blood_type, now).await? {
                created.push(record);
            }
        }

        info!(created = created.len(), "Inventory initialized");
        Ok(created)
    }

    /// Receive `units` of `blood_type`, creating the record on first receipt.
    ///
    /// With an `expiry_date`, the units are also recorded as a new batch whose
    /// donation date defaults to now.
    pub async fn replenish(
        &self,
        blood_type: BloodType,
        units: i64,
        expiry_date: Option<DateTime<Utc>>,
        donation_date: Option<DateTime<Utc>>,
    ) -> Result<InventoryRecord> {
        check_positive(units)?;

        let now = model::now();
        let batch = expiry_date.map(|expiry| (expiry, donation_date.unwrap_or(now)));

        let record = self.storage.add_units(blood_type, units, batch, now).await?;

        info!(
            blood_type = %blood_type,
            units,
            batched = batch.is_some(),
            total = record.units,
            "Inventory replenished"
        );
        Ok(record)
    }

    /// Administrative correction: overwrite the unit count.
    pub async fn set_units(&self, blood_type: BloodType, units: i64) -> Result<InventoryRecord> {
        if units < 0 {
            return Err(Error::InvalidQuantity(
                "units must be a non-negative integer".to_string(),
            ));
        }

        let record = self
            .storage
            .set_units(blood_type, units, model::now())
            .await?
            .ok_or_else(|| not_in_inventory(blood_type))?;

        info!(
            blood_type = %blood_type,
            units,
            drift = record.drift(),
            "Inventory units corrected"
        );
        Ok(record)
    }

    /// Allocate `units` of `blood_type`.
    ///
    /// Fails with [`Error::InsufficientStock`] and changes nothing if fewer
    /// than `units` are on hand.
    pub async fn consume(&self, blood_type: BloodType, units: i64) -> Result<InventoryRecord> {
        check_positive(units)?;

        match self.storage.deduct_units(blood_type, units, model::now()).await? {
            Deduction::Applied(record) => {
                info!(
                    blood_type = %blood_type,
                    units,
                    remaining = record.units,
                    "Inventory consumed"
                );
                Ok(record)
            }
            Deduction::Insufficient { available } => {
                warn!(
                    blood_type = %blood_type,
                    requested = units,
                    available,
                    "Allocation refused: insufficient stock"
                );
                Err(Error::InsufficientStock {
                    blood_type,
                    requested: units,
                    available,
                })
            }
            Deduction::Missing => Err(not_in_inventory(blood_type)),
        }
    }

    /// Records holding strictly fewer than `threshold` units.
    pub async fn low_stock_alerts(&self, threshold: i64) -> Result<Vec<InventoryRecord>> {
        self.storage.list_inventory_below(threshold).await
    }

    /// Batches expiring within `days_ahead` days of `now`, boundary included.
    ///
    /// Grouped by blood type label, then in arrival order within a record.
    pub async fn expiring_batches(
        &self,
        days_ahead: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<ExpiringBatch>> {
        let cutoff = Duration::try_days(days_ahead)
            .and_then(|ahead| now.checked_add_signed(ahead))
            .ok_or_else(|| Error::validation(format!("days out of range: {days_ahead}")))?;

        self.storage.list_batches_expiring_by(cutoff).await
    }
}

fn not_in_inventory(blood_type: BloodType) -> Error {
    Error::not_found(format!("Blood type {blood_type} not found in inventory"))
}

fn check_positive(units: i64) -> Result<()> {
    if units <= 0 {
        return Err(Error::InvalidQuantity(
            "units must be a positive integer".to_string(),
        ));
    }
    check_bounded(units)
}

fn check_bounded(units: i64) -> Result<()> {
    if units > MAX_UNITS_PER_OPERATION {
        return Err(Error::InvalidQuantity(format!(
            "units must not exceed {MAX_UNITS_PER_OPERATION}"
        )));
    }
    Ok(())
}
