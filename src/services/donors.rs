use serde::Serialize;
use tracing::info;

use super::{StatusCount, count_of, optional_text, required, required_text};
use crate::error::{Error, Result};
use crate::model::{self, Availability, BloodType, Donor, DonorPatch, DonorStatus, NewDonor};
use crate::storage::{self, Storage, Table};

/// Donor registration and lookup.
#[derive(Clone)]
pub struct DonorService {
    storage: Storage,
}

/// Dashboard figures for donors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DonorSummary {
    pub total_donors: i64,
    pub active_donors: i64,
    pub blood_type_distribution: Vec<BloodTypeCount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BloodTypeCount {
    pub blood_type: BloodType,
    pub count: i64,
}

impl DonorService {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// All donors, newest registration first.
    pub async fn list(&self) -> Result<Vec<Donor>> {
        self.storage.list_donors().await
    }

    pub async fn get(&self, id: &str) -> Result<Donor> {
        self.storage
            .get_donor(id)
            .await?
            .ok_or_else(|| Error::not_found("Donor not found"))
    }

    pub async fn create(&self, input: NewDonor) -> Result<Donor> {
        let donor = Donor {
            id: storage::new_id(),
            first_name: required_text(input.first_name, "firstName")?,
            last_name: required_text(input.last_name, "lastName")?,
            email: input.email.and_then(model::normalize_email),
            contact: required_text(input.contact, "contact")?,
            address: optional_text(input.address),
            city: optional_text(input.city),
            date_of_birth: input.date_of_birth,
            blood_type: required(input.blood_type, "bloodType")?,
            weight: input.weight,
            gender: input.gender,
            emergency_name: optional_text(input.emergency_name),
            emergency_phone: optional_text(input.emergency_phone),
            availability: input.availability.unwrap_or(Availability::Available),
            months_since_first_donation: input.months_since_first_donation.unwrap_or(0),
            donation_count: input.donation_count.unwrap_or(0),
            pints_donated: input.pints_donated.unwrap_or(0.0),
            medical_history: input.medical_history.unwrap_or_default(),
            status: input.status.unwrap_or(DonorStatus::Active),
            created_at: model::now(),
            last_donation: input.last_donation,
        };
        donor.validate()?;

        self.storage.insert_donor(&donor).await?;

        info!(id = %donor.id, blood_type = %donor.blood_type, "Donor registered");
        Ok(donor)
    }

    pub async fn update(&self, id: &str, patch: DonorPatch) -> Result<Donor> {
        let mut donor = self.get(id).await?;
        patch.apply_to(&mut donor);
        donor.validate()?;

        if !self.storage.update_donor(&donor).await? {
            return Err(Error::not_found("Donor not found"));
        }

        info!(id = %donor.id, "Donor updated");
        Ok(donor)
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        if !self.storage.delete_donor(id).await? {
            return Err(Error::not_found("Donor not found"));
        }

        info!(id, "Donor deleted");
        Ok(())
    }

    pub async fn by_blood_type(&self, blood_type: BloodType) -> Result<Vec<Donor>> {
        self.storage.list_donors_by_blood_type(blood_type).await
    }

    pub async fn count_by_status(&self) -> Result<Vec<StatusCount>> {
        let pairs = self.storage.count_grouped(Table::Donors, "status").await?;
        Ok(StatusCount::from_pairs(pairs))
    }

    /// Total and active donors plus how many donors carry each blood type.
    pub async fn summary(&self) -> Result<DonorSummary> {
        let total_donors = self.storage.count(Table::Donors).await?;
        let by_status = self.count_by_status().await?;

        let blood_type_distribution = self
            .storage
            .count_grouped(Table::Donors, "blood_type")
            .await?
            .into_iter()
            .map(|(label, count)| -> Result<BloodTypeCount> {
                Ok(BloodTypeCount {
                    blood_type: storage::parse_label(&label)?,
                    count,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(DonorSummary {
            total_donors,
            active_donors: count_of(&by_status, DonorStatus::Active.as_str()),
            blood_type_distribution,
        })
    }
}
