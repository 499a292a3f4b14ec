use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::BloodType;
use crate::error::{Error, Result};

labelled_enum! {
    Urgency ("urgency") {
        Low => "Low",
        Medium => "Medium",
        High => "High",
        Critical => "Critical",
    }
}

labelled_enum! {
    RequestStatus ("request status") {
        Pending => "Pending",
        Fulfilled => "Fulfilled",
        Cancelled => "Cancelled",
    }
}

/// A hospital's demand for units of one blood type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BloodRequest {
    pub id: String,
    pub patient: String,
    pub blood_type: BloodType,
    pub units: i64,
    pub hospital: String,
    pub contact_number: String,
    pub urgency: Urgency,
    pub status: RequestStatus,
    pub request_date: DateTime<Utc>,
    /// Set once, the first time the request becomes `Fulfilled`.
    pub fulfilled_date: Option<DateTime<Utc>>,
    pub notes: String,
}

impl BloodRequest {
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("patient", &self.patient),
            ("hospital", &self.hospital),
            ("contactNumber", &self.contact_number),
        ] {
            if value.trim().is_empty() {
                return Err(Error::validation(format!("{field} is required")));
            }
        }

        if self.units <= 0 {
            return Err(Error::validation("units must be a positive integer"));
        }

        Ok(())
    }

    /// Move to `status`, stamping `fulfilled_date` on the first transition to
    /// `Fulfilled`. Any status may follow any other; the stamp is never cleared.
    pub fn transition(&mut self, status: RequestStatus, now: DateTime<Utc>) {
        self.status = status;
        if status == RequestStatus::Fulfilled && self.fulfilled_date.is_none() {
            self.fulfilled_date = Some(now);
        }
    }
}

/// Request body for filing a blood request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBloodRequest {
    pub patient: Option<String>,
    pub blood_type: Option<BloodType>,
    pub units: Option<i64>,
    pub hospital: Option<String>,
    pub contact_number: Option<String>,
    pub urgency: Option<Urgency>,
    pub notes: Option<String>,
}

/// Fields a request update may touch. `fulfilledDate` is not among them.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestPatch {
    pub patient: Option<String>,
    pub blood_type: Option<BloodType>,
    pub units: Option<i64>,
    pub hospital: Option<String>,
    pub contact_number: Option<String>,
    pub urgency: Option<Urgency>,
    pub status: Option<RequestStatus>,
    pub notes: Option<String>,
}

impl RequestPatch {
    pub fn apply_to(self, request: &mut BloodRequest, now: DateTime<Utc>) {
        if let Some(v) = self.patient {
            request.patient = v.trim().to_string();
        }
        if let Some(v) = self.blood_type {
            request.blood_type = v;
        }
        if let Some(v) = self.units {
            request.units = v;
        }
        if let Some(v) = self.hospital {
            request.hospital = v.trim().to_string();
        }
        if let Some(v) = self.contact_number {
            request.contact_number = v.trim().to_string();
        }
        if let Some(v) = self.urgency {
            request.urgency = v;
        }
        if let Some(v) = self.notes {
            request.notes = v;
        }
        if let Some(status) = self.status {
            request.transition(status, now);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn pending_request() -> BloodRequest {
        BloodRequest {
            id: "r-1".to_string(),
            patient: "Mary Major".to_string(),
            blood_type: BloodType::ANeg,
            units: 2,
            hospital: "General".to_string(),
            contact_number: "555-0100".to_string(),
            urgency: Urgency::High,
            status: RequestStatus::Pending,
            request_date: crate::model::now(),
            fulfilled_date: None,
            notes: String::new(),
        }
    }

    #[test]
    fn test_fulfilled_date_set_once() {
        let mut request = pending_request();
        let first = crate::model::now();

        request.transition(RequestStatus::Fulfilled, first);
        assert_eq!(request.fulfilled_date, Some(first));

        request.transition(RequestStatus::Fulfilled, first + Duration::hours(3));
        assert_eq!(request.fulfilled_date, Some(first));
    }

    #[test]
    fn test_fulfilled_date_survives_reopen() {
        let mut request = pending_request();
        let now = crate::model::now();

        request.transition(RequestStatus::Fulfilled, now);
        request.transition(RequestStatus::Pending, now + Duration::minutes(1));

        assert_eq!(request.status, RequestStatus::Pending);
        assert_eq!(request.fulfilled_date, Some(now));
    }

    #[test]
    fn test_cancel_does_not_stamp() {
        let mut request = pending_request();
        request.transition(RequestStatus::Cancelled, crate::model::now());
        assert!(request.fulfilled_date.is_none());
    }

    #[test]
    fn test_non_positive_units_rejected() {
        let mut request = pending_request();
        request.units = 0;
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_patch_ignores_fulfilled_date_field() {
        let mut request = pending_request();
        let patch: RequestPatch = serde_json::from_value(serde_json::json!({
            "fulfilledDate": "2020-01-01T00:00:00Z",
            "notes": "cross-matched"
        }))
        .unwrap();

        patch.apply_to(&mut request, crate::model::now());

        assert!(request.fulfilled_date.is_none());
        assert_eq!(request.notes, "cross-matched");
    }
}
