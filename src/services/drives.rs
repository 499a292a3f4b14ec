use serde::Serialize;
use tracing::info;

use super::{StatusCount, count_of, optional_text, required, required_text};
use crate::error::{Error, Result};
use crate::model::{self, DonationDrive, DrivePatch, DriveStatus, NewDrive};
use crate::storage::{self, Storage, Table};

/// Donation drive scheduling.
#[derive(Clone)]
pub struct DriveService {
    storage: Storage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveSummary {
    pub total_drives: i64,
    pub upcoming_drives: i64,
    pub completed_drives: i64,
}

impl DriveService {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// All drives, latest event date first.
    pub async fn list(&self) -> Result<Vec<DonationDrive>> {
        self.storage.list_drives().await
    }

    pub async fn get(&self, id: &str) -> Result<DonationDrive> {
        self.storage
            .get_drive(id)
            .await?
            .ok_or_else(|| Error::not_found("Drive not found"))
    }

    pub async fn create(&self, input: NewDrive) -> Result<DonationDrive> {
        let drive = DonationDrive {
            id: storage::new_id(),
            name: required_text(input.name, "name")?,
            location: required_text(input.location, "location")?,
            date: required(input.date, "date")?,
            time: required_text(input.time, "time")?,
            organizer: required_text(input.organizer, "organizer")?,
            contact_number: required_text(input.contact_number, "contactNumber")?,
            expected_donors: input.expected_donors.unwrap_or(0),
            actual_donors: 0,
            status: DriveStatus::Upcoming,
            description: optional_text(input.description),
            created_at: model::now(),
        };
        drive.validate()?;

        self.storage.insert_drive(&drive).await?;

        info!(id = %drive.id, date = %drive.date, "Drive scheduled");
        Ok(drive)
    }

    pub async fn update(&self, id: &str, patch: DrivePatch) -> Result<DonationDrive> {
        let mut drive = self.get(id).await?;
        patch.apply_to(&mut drive);
        drive.validate()?;

        if !self.storage.update_drive(&drive).await? {
            return Err(Error::not_found("Drive not found"));
        }

        info!(id = %drive.id, status = %drive.status, "Drive updated");
        Ok(drive)
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        if !self.storage.delete_drive(id).await? {
            return Err(Error::not_found("Drive not found"));
        }

        info!(id, "Drive deleted");
        Ok(())
    }

    /// Upcoming and ongoing drives, soonest first.
    pub async fn upcoming(&self) -> Result<Vec<DonationDrive>> {
        self.storage
            .list_drives_with_status(&DriveStatus::SCHEDULED)
            .await
    }

    pub async fn count_by_status(&self) -> Result<Vec<StatusCount>> {
        let pairs = self.storage.count_grouped(Table::Drives, "status").await?;
        Ok(StatusCount::from_pairs(pairs))
    }

    pub async fn summary(&self) -> Result<DriveSummary> {
        let total_drives = self.storage.count(Table::Drives).await?;
        let by_status = self.count_by_status().await?;

        Ok(DriveSummary {
            total_drives,
            upcoming_drives: count_of(&by_status, DriveStatus::Upcoming.as_str()),
            completed_drives: count_of(&by_status, DriveStatus::Completed.as_str()),
        })
    }
}
