use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::deserialize_opt_timestamp;
use crate::error::{Error, Result};

labelled_enum! {
    DriveStatus ("drive status") {
        Upcoming => "Upcoming",
        Ongoing => "Ongoing",
        Completed => "Completed",
        Cancelled => "Cancelled",
    }
}

impl DriveStatus {
    /// Drives that still lie ahead or are running right now.
    pub const SCHEDULED: [DriveStatus; 2] = [DriveStatus::Upcoming, DriveStatus::Ongoing];
}

/// A donation drive event.
///
/// `actual_donors` is entered by hand after the event and is not linked to
/// donor records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationDrive {
    pub id: String,
    pub name: String,
    pub location: String,
    pub date: DateTime<Utc>,
    /// Free-form start time as entered, e.g. "09:30".
    pub time: String,
    pub organizer: String,
    pub contact_number: String,
    pub expected_donors: i64,
    pub actual_donors: i64,
    pub status: DriveStatus,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl DonationDrive {
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("name", &self.name),
            ("location", &self.location),
            ("time", &self.time),
            ("organizer", &self.organizer),
            ("contactNumber", &self.contact_number),
        ] {
            if value.trim().is_empty() {
                return Err(Error::validation(format!("{field} is required")));
            }
        }

        if self.expected_donors < 0 || self.actual_donors < 0 {
            return Err(Error::validation("Donor counts cannot be negative"));
        }

        Ok(())
    }
}

/// Request body for scheduling a drive.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDrive {
    pub name: Option<String>,
    pub location: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opt_timestamp")]
    pub date: Option<DateTime<Utc>>,
    pub time: Option<String>,
    pub organizer: Option<String>,
    pub contact_number: Option<String>,
    pub expected_donors: Option<i64>,
    pub description: Option<String>,
}

/// Fields a drive update may touch.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrivePatch {
    pub name: Option<String>,
    pub location: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opt_timestamp")]
    pub date: Option<DateTime<Utc>>,
    pub time: Option<String>,
    pub organizer: Option<String>,
    pub contact_number: Option<String>,
    pub expected_donors: Option<i64>,
    pub actual_donors: Option<i64>,
    pub status: Option<DriveStatus>,
    pub description: Option<String>,
}

impl DrivePatch {
    pub fn apply_to(self, drive: &mut DonationDrive) {
        if let Some(v) = self.name {
            drive.name = v.trim().to_string();
        }
        if let Some(v) = self.location {
            drive.location = v.trim().to_string();
        }
        if let Some(v) = self.date {
            drive.date = v;
        }
        if let Some(v) = self.time {
            drive.time = v.trim().to_string();
        }
        if let Some(v) = self.organizer {
            drive.organizer = v.trim().to_string();
        }
        if let Some(v) = self.contact_number {
            drive.contact_number = v.trim().to_string();
        }
        if let Some(v) = self.expected_donors {
            drive.expected_donors = v;
        }
        if let Some(v) = self.actual_donors {
            drive.actual_donors = v;
        }
        if let Some(v) = self.status {
            drive.status = v;
        }
        if let Some(v) = self.description {
            drive.description = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_drive_accepts_plain_date() {
        let input: NewDrive = serde_json::from_value(serde_json::json!({
            "name": "Campus Drive",
            "date": "2025-06-01",
            "time": "09:00"
        }))
        .unwrap();

        assert_eq!(input.date.unwrap().to_rfc3339(), "2025-06-01T00:00:00+00:00");
        assert!(input.expected_donors.is_none());
    }

    #[test]
    fn test_new_drive_rejects_bad_date() {
        let result = serde_json::from_value::<NewDrive>(serde_json::json!({ "date": "soon" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_patch_status_and_attendance() {
        let mut drive = DonationDrive {
            id: "x".to_string(),
            name: "Campus Drive".to_string(),
            location: "Hall A".to_string(),
            date: crate::model::now(),
            time: "09:00".to_string(),
            organizer: "Red Cross".to_string(),
            contact_number: "555".to_string(),
            expected_donors: 40,
            actual_donors: 0,
            status: DriveStatus::Upcoming,
            description: String::new(),
            created_at: crate::model::now(),
        };

        DrivePatch {
            status: Some(DriveStatus::Completed),
            actual_donors: Some(37),
            ..Default::default()
        }
        .apply_to(&mut drive);

        assert_eq!(drive.status, DriveStatus::Completed);
        assert_eq!(drive.actual_donors, 37);
        assert_eq!(drive.expected_donors, 40);
        assert!(drive.validate().is_ok());

        drive.actual_donors = -3;
        assert!(drive.validate().is_err());
    }
}
