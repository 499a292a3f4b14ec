use axum::{
    Json, Router,
    extract::rejection::JsonRejection,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use tracing::{info, instrument, warn};

use super::{ApiResult, AppState, Message, extract_json, parse_blood_type};
use crate::model::{Donor, DonorPatch, NewDonor};
use crate::services::{DonorSummary, StatusCount};

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/donors", get(list_donors).post(create_donor))
        .route("/donors/stats/summary", get(donor_summary))
        .route("/donors/stats/status", get(donor_status_counts))
        .route("/donors/search/bloodtype/:blood_type", get(donors_by_blood_type))
        .route(
            "/donors/:id",
            get(get_donor).put(update_donor).delete(delete_donor),
        )
}

/// GET /api/donors - All donors, newest first.
#[instrument(skip(state))]
pub async fn list_donors(State(state): State<AppState>) -> ApiResult<Json<Vec<Donor>>> {
    let donors = state
        .donors
        .list()
        .await
        .inspect_err(|e| warn!(error = %e, "Failed to list donors"))?;
    Ok(Json(donors))
}

/// GET /api/donors/:id
#[instrument(skip(state))]
pub async fn get_donor(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Donor>> {
    Ok(Json(state.donors.get(&id).await?))
}

/// POST /api/donors - Register a donor.
///
/// `firstName`, `lastName`, `contact` and `bloodType` are required.
/// Returns `201 Created` with the stored donor.
#[instrument(skip(state, body))]
pub async fn create_donor(
    State(state): State<AppState>,
    body: Result<Json<NewDonor>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Donor>)> {
    let input = extract_json(body)?;

    match state.donors.create(input).await {
        Ok(donor) => Ok((StatusCode::CREATED, Json(donor))),
        Err(e) => {
            warn!(error = %e, "Failed to register donor");
            Err(e.into())
        }
    }
}

/// PUT /api/donors/:id - Merge the given fields into the donor.
#[instrument(skip(state, body))]
pub async fn update_donor(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<DonorPatch>, JsonRejection>,
) -> ApiResult<Json<Donor>> {
    let patch = extract_json(body)?;

    let donor = state
        .donors
        .update(&id, patch)
        .await
        .inspect_err(|e| warn!(id = %id, error = %e, "Failed to update donor"))?;
    Ok(Json(donor))
}

/// DELETE /api/donors/:id
#[instrument(skip(state))]
pub async fn delete_donor(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Message>> {
    state.donors.delete(&id).await?;
    Ok(Message::new("Donor deleted successfully"))
}

/// GET /api/donors/search/bloodtype/:bloodType
#[instrument(skip(state))]
pub async fn donors_by_blood_type(
    State(state): State<AppState>,
    Path(blood_type): Path<String>,
) -> ApiResult<Json<Vec<Donor>>> {
    let blood_type = parse_blood_type(&blood_type)?;
    let donors = state.donors.by_blood_type(blood_type).await?;

    info!(blood_type = %blood_type, count = donors.len(), "Donors searched by blood type");
    Ok(Json(donors))
}

/// GET /api/donors/stats/summary
#[instrument(skip(state))]
pub async fn donor_summary(State(state): State<AppState>) -> ApiResult<Json<DonorSummary>> {
    Ok(Json(state.donors.summary().await?))
}

/// GET /api/donors/stats/status - Donor count per status.
#[instrument(skip(state))]
pub async fn donor_status_counts(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<StatusCount>>> {
    Ok(Json(state.donors.count_by_status().await?))
}
