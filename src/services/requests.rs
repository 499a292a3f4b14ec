use serde::Serialize;
use tracing::info;

use super::{StatusCount, count_of, required, required_text};
use crate::error::{Error, Result};
use crate::model::{
    self, BloodRequest, NewBloodRequest, RequestPatch, RequestStatus, Urgency,
};
use crate::storage::{self, Storage, Table};

/// Blood request intake and status tracking.
///
/// Fulfilling a request does not deduct inventory; allocation is a separate
/// ledger call made by the operator.
#[derive(Clone)]
pub struct RequestService {
    storage: Storage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestSummary {
    pub total_requests: i64,
    pub pending_requests: i64,
    pub fulfilled_requests: i64,
}

impl RequestService {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// All requests, most recent first.
    pub async fn list(&self) -> Result<Vec<BloodRequest>> {
        self.storage.list_requests().await
    }

    pub async fn get(&self, id: &str) -> Result<BloodRequest> {
        self.storage
            .get_request(id)
            .await?
            .ok_or_else(|| Error::not_found("Request not found"))
    }

    pub async fn create(&self, input: NewBloodRequest) -> Result<BloodRequest> {
        let request = BloodRequest {
            id: storage::new_id(),
            patient: required_text(input.patient, "patient")?,
            blood_type: required(input.blood_type, "bloodType")?,
            units: input.units.unwrap_or(1),
            hospital: required_text(input.hospital, "hospital")?,
            contact_number: required_text(input.contact_number, "contactNumber")?,
            urgency: input.urgency.unwrap_or(Urgency::Medium),
            status: RequestStatus::Pending,
            request_date: model::now(),
            fulfilled_date: None,
            notes: input.notes.unwrap_or_default(),
        };
        request.validate()?;

        self.storage.insert_request(&request).await?;

        info!(
            id = %request.id,
            blood_type = %request.blood_type,
            units = request.units,
            urgency = %request.urgency,
            "Blood request filed"
        );
        Ok(request)
    }

    /// Merge `patch` into the request. The first move to `Fulfilled` stamps
    /// `fulfilledDate`; later updates never change it.
    pub async fn update(&self, id: &str, patch: RequestPatch) -> Result<BloodRequest> {
        let mut request = self.get(id).await?;
        patch.apply_to(&mut request, model::now());
        request.validate()?;

        if !self.storage.update_request(&request).await? {
            return Err(Error::not_found("Request not found"));
        }

        info!(id = %request.id, status = %request.status, "Blood request updated");
        Ok(request)
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        if !self.storage.delete_request(id).await? {
            return Err(Error::not_found("Request not found"));
        }

        info!(id, "Blood request deleted");
        Ok(())
    }

    pub async fn pending(&self) -> Result<Vec<BloodRequest>> {
        self.storage
            .list_requests_with_status(RequestStatus::Pending)
            .await
    }

    pub async fn count_by_status(&self) -> Result<Vec<StatusCount>> {
        let pairs = self.storage.count_grouped(Table::Requests, "status").await?;
        Ok(StatusCount::from_pairs(pairs))
    }

    pub async fn summary(&self) -> Result<RequestSummary> {
        let total_requests = self.storage.count(Table::Requests).await?;
        let by_status = self.count_by_status().await?;

        Ok(RequestSummary {
            total_requests,
            pending_requests: count_of(&by_status, RequestStatus::Pending.as_str()),
            fulfilled_requests: count_of(&by_status, RequestStatus::Fulfilled.as_str()),
        })
    }
}
