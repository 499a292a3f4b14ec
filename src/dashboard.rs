//! Dashboard overview: the headline figures of the blood bank in one read.
//!
//! The overview combines:
//! - donor and request counts from the entity services
//! - drives still ahead (upcoming or ongoing)
//! - total units on hand and the records running low, from the ledger
//!
//! # Usage
//!
//! ```ignore
//! let dashboard = Dashboard::new(storage.clone());
//! let overview = dashboard.overview().await?;
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::error::Result;
use crate::ledger::{DEFAULT_LOW_STOCK_THRESHOLD, InventoryLedger};
use crate::model::{self, DriveStatus, InventoryRecord, RequestStatus};
use crate::services::{DriveService, RequestService, count_of};
use crate::storage::{Storage, Table};

/// Snapshot returned by `GET /api/dashboard`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardOverview {
    pub total_donors: i64,
    /// Sum of `units` across all inventory records.
    pub total_units: i64,
    pub pending_requests: i64,
    /// Drives that are upcoming or ongoing.
    pub upcoming_drives: i64,
    /// Records below [`DEFAULT_LOW_STOCK_THRESHOLD`], sorted by blood type.
    pub low_stock: Vec<InventoryRecord>,
    pub generated_at: DateTime<Utc>,
}

/// Read-only aggregator over the store, the ledger and the services.
#[derive(Clone)]
pub struct Dashboard {
    storage: Storage,
    ledger: InventoryLedger,
    drives: DriveService,
    requests: RequestService,
}

impl Dashboard {
    pub fn new(storage: Storage) -> Self {
        Self {
            ledger: InventoryLedger::new(storage.clone()),
            drives: DriveService::new(storage.clone()),
            requests: RequestService::new(storage.clone()),
            storage,
        }
    }

    pub async fn overview(&self) -> Result<DashboardOverview> {
        let total_donors = self.storage.count(Table::Donors).await?;
        let total_units = self.storage.total_units().await?;

        let requests = self.requests.count_by_status().await?;
        let drives = self.drives.count_by_status().await?;
        let upcoming_drives = DriveStatus::SCHEDULED
            .iter()
            .map(|status| count_of(&drives, status.as_str()))
            .sum();

        let low_stock = self
            .ledger
            .low_stock_alerts(i64::from(DEFAULT_LOW_STOCK_THRESHOLD))
            .await?;

        debug!(total_donors, total_units, low = low_stock.len(), "Dashboard computed");

        Ok(DashboardOverview {
            total_donors,
            total_units,
            pending_requests: count_of(&requests, RequestStatus::Pending.as_str()),
            upcoming_drives,
            low_stock,
            generated_at: model::now(),
        })
    }
}
