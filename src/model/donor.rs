use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{BloodType, deserialize_opt_timestamp};
use crate::error::{Error, Result};

labelled_enum! {
    /// Whether a donor can be called in right now.
    Availability ("availability") {
        Available => "Available",
        Busy => "Busy",
        Unavailable => "Unavailable",
    }
}

labelled_enum! {
    /// Administrative lifecycle of a donor record.
    DonorStatus ("donor status") {
        Active => "Active",
        Pending => "Pending",
        Inactive => "Inactive",
    }
}

labelled_enum! {
    Gender ("gender") {
        Male => "Male",
        Female => "Female",
        Other => "Other",
    }
}

/// A registered donor: identity, eligibility and donation history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Donor {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    /// Primary phone number.
    pub contact: String,
    pub address: String,
    pub city: String,
    #[serde(rename = "dob")]
    pub date_of_birth: Option<NaiveDate>,
    pub blood_type: BloodType,
    /// Body weight in kilograms.
    pub weight: Option<f64>,
    pub gender: Option<Gender>,
    pub emergency_name: String,
    pub emergency_phone: String,
    pub availability: Availability,
    pub months_since_first_donation: i64,
    /// Lifetime number of donations.
    pub donation_count: i64,
    /// Lifetime volume donated, in pints.
    pub pints_donated: f64,
    pub medical_history: String,
    pub status: DonorStatus,
    pub created_at: DateTime<Utc>,
    pub last_donation: Option<DateTime<Utc>>,
}

impl Donor {
    /// Check the invariants every stored donor must satisfy.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("firstName", &self.first_name),
            ("lastName", &self.last_name),
            ("contact", &self.contact),
        ] {
            if value.trim().is_empty() {
                return Err(Error::validation(format!("{field} is required")));
            }
        }

        if self.months_since_first_donation < 0 || self.donation_count < 0 {
            return Err(Error::validation("Donation counters cannot be negative"));
        }
        if self.pints_donated < 0.0 || !self.pints_donated.is_finite() {
            return Err(Error::validation("pintsDonated must be a non-negative number"));
        }
        if let Some(weight) = self.weight {
            if weight <= 0.0 || !weight.is_finite() {
                return Err(Error::validation("weight must be a positive number"));
            }
        }

        Ok(())
    }
}

/// Request body for registering a donor.
///
/// Everything is optional at the type level so missing required fields
/// surface as a validation message instead of a decode failure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDonor {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub contact: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    #[serde(rename = "dob")]
    pub date_of_birth: Option<NaiveDate>,
    pub blood_type: Option<BloodType>,
    pub weight: Option<f64>,
    pub gender: Option<Gender>,
    pub emergency_name: Option<String>,
    pub emergency_phone: Option<String>,
    pub availability: Option<Availability>,
    pub months_since_first_donation: Option<i64>,
    pub donation_count: Option<i64>,
    pub pints_donated: Option<f64>,
    pub medical_history: Option<String>,
    pub status: Option<DonorStatus>,
    #[serde(default, deserialize_with = "deserialize_opt_timestamp")]
    pub last_donation: Option<DateTime<Utc>>,
}

/// Fields a donor update may touch. Anything else in the body is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonorPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub contact: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    #[serde(rename = "dob")]
    pub date_of_birth: Option<NaiveDate>,
    pub blood_type: Option<BloodType>,
    pub weight: Option<f64>,
    pub gender: Option<Gender>,
    pub emergency_name: Option<String>,
    pub emergency_phone: Option<String>,
    pub availability: Option<Availability>,
    pub months_since_first_donation: Option<i64>,
    pub donation_count: Option<i64>,
    pub pints_donated: Option<f64>,
    pub medical_history: Option<String>,
    pub status: Option<DonorStatus>,
    #[serde(default, deserialize_with = "deserialize_opt_timestamp")]
    pub last_donation: Option<DateTime<Utc>>,
}

impl DonorPatch {
    /// Merge the provided fields into `donor`.
    pub fn apply_to(self, donor: &mut Donor) {
        if let Some(v) = self.first_name {
            donor.first_name = v.trim().to_string();
        }
        if let Some(v) = self.last_name {
            donor.last_name = v.trim().to_string();
        }
        if let Some(v) = self.email {
            donor.email = normalize_email(v);
        }
        if let Some(v) = self.contact {
            donor.contact = v.trim().to_string();
        }
        if let Some(v) = self.address {
            donor.address = v.trim().to_string();
        }
        if let Some(v) = self.city {
            donor.city = v.trim().to_string();
        }
        if let Some(v) = self.date_of_birth {
            donor.date_of_birth = Some(v);
        }
        if let Some(v) = self.blood_type {
            donor.blood_type = v;
        }
        if let Some(v) = self.weight {
            donor.weight = Some(v);
        }
        if let Some(v) = self.gender {
            donor.gender = Some(v);
        }
        if let Some(v) = self.emergency_name {
            donor.emergency_name = v.trim().to_string();
        }
        if let Some(v) = self.emergency_phone {
            donor.emergency_phone = v.trim().to_string();
        }
        if let Some(v) = self.availability {
            donor.availability = v;
        }
        if let Some(v) = self.months_since_first_donation {
            donor.months_since_first_donation = v;
        }
        if let Some(v) = self.donation_count {
            donor.donation_count = v;
        }
        if let Some(v) = self.pints_donated {
            donor.pints_donated = v;
        }
        if let Some(v) = self.medical_history {
            donor.medical_history = v;
        }
        if let Some(v) = self.status {
            donor.status = v;
        }
        if let Some(v) = self.last_donation {
            donor.last_donation = Some(v);
        }
    }
}

/// Trim and lowercase an email; blank means "no email".
pub(crate) fn normalize_email(raw: String) -> Option<String> {
    let email = raw.trim().to_lowercase();
    (!email.is_empty()).then_some(email)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_donor() -> Donor {
        Donor {
            id: "d-1".to_string(),
            first_name: "John".to_string(),
            last_name: "Doe".to_string(),
            email: Some("john.doe@email.com".to_string()),
            contact: "1234567890".to_string(),
            address: "123 Main St".to_string(),
            city: "New York".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 5, 15),
            blood_type: BloodType::OPos,
            weight: Some(75.0),
            gender: Some(Gender::Male),
            emergency_name: "Jane Doe".to_string(),
            emergency_phone: "0987654321".to_string(),
            availability: Availability::Available,
            months_since_first_donation: 24,
            donation_count: 5,
            pints_donated: 2.5,
            medical_history: "None".to_string(),
            status: DonorStatus::Active,
            created_at: crate::model::now(),
            last_donation: None,
        }
    }

    #[test]
    fn test_valid_donor() {
        assert!(sample_donor().validate().is_ok());
    }

    #[test]
    fn test_labels_parse_from_str() {
        assert_eq!("Busy".parse::<Availability>().unwrap(), Availability::Busy);
        assert_eq!("Pending".parse::<DonorStatus>().unwrap(), DonorStatus::Pending);
        assert_eq!("Other".parse::<Gender>().unwrap(), Gender::Other);

        let err = "busy".parse::<Availability>().unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_blank_name_rejected() {
        let mut donor = sample_donor();
        donor.first_name = "   ".to_string();

        let err = donor.validate().unwrap_err();
        assert!(err.to_string().contains("firstName"));
    }

    #[test]
    fn test_negative_counters_rejected() {
        let mut donor = sample_donor();
        donor.donation_count = -1;
        assert!(donor.validate().is_err());

        let mut donor = sample_donor();
        donor.weight = Some(0.0);
        assert!(donor.validate().is_err());
    }

    #[test]
    fn test_patch_merges_only_given_fields() {
        let mut donor = sample_donor();
        let patch: DonorPatch = serde_json::from_value(serde_json::json!({
            "city": "  Boston ",
            "availability": "Busy",
            "email": "JOHN@EXAMPLE.COM",
            "createdAt": "2001-01-01T00:00:00Z",
            "favouriteColour": "red"
        }))
        .unwrap();

        let created_at = donor.created_at;
        patch.apply_to(&mut donor);

        assert_eq!(donor.city, "Boston");
        assert_eq!(donor.availability, Availability::Busy);
        assert_eq!(donor.email.as_deref(), Some("john@example.com"));
        assert_eq!(donor.created_at, created_at);
        assert_eq!(donor.first_name, "John");
    }

    #[test]
    fn test_patch_rejects_out_of_enum_status() {
        let result = serde_json::from_value::<DonorPatch>(serde_json::json!({ "status": "Retired" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_donor_serializes_camel_case() {
        let value = serde_json::to_value(sample_donor()).unwrap();
        assert_eq!(value["bloodType"], "O+");
        assert_eq!(value["firstName"], "John");
        assert_eq!(value["dob"], "1990-05-15");
        assert!(value.get("blood_type").is_none());
    }
}
