use axum::{
    Json, Router,
    extract::rejection::JsonRejection,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use tracing::{info, instrument, warn};

use super::{ApiResult, AppState, Message, extract_json};
use crate::model::{DonationDrive, DrivePatch, NewDrive};
use crate::services::{DriveSummary, StatusCount};

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/drives", get(list_drives).post(create_drive))
        .route("/drives/filter/upcoming", get(upcoming_drives))
        .route("/drives/stats/summary", get(drive_summary))
        .route("/drives/stats/status", get(drive_status_counts))
        .route(
            "/drives/:id",
            get(get_drive).put(update_drive).delete(delete_drive),
        )
}

/// GET /api/drives - All drives, latest date first.
#[instrument(skip(state))]
pub async fn list_drives(State(state): State<AppState>) -> ApiResult<Json<Vec<DonationDrive>>> {
    Ok(Json(state.drives.list().await?))
}

/// GET /api/drives/:id
#[instrument(skip(state))]
pub async fn get_drive(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<DonationDrive>> {
    Ok(Json(state.drives.get(&id).await?))
}

/// POST /api/drives - Schedule a donation drive.
///
/// `name`, `location`, `date`, `time`, `organizer` and `contactNumber` are
/// required. `date` may be a full timestamp or a `YYYY-MM-DD` date.
#[instrument(skip(state, body))]
pub async fn create_drive(
    State(state): State<AppState>,
    body: Result<Json<NewDrive>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<DonationDrive>)> {
    let input = extract_json(body)?;

    let drive = state
        .drives
        .create(input)
        .await
        .inspect_err(|e| warn!(error = %e, "Failed to schedule drive"))?;
    Ok((StatusCode::CREATED, Json(drive)))
}

/// PUT /api/drives/:id
#[instrument(skip(state, body))]
pub async fn update_drive(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<DrivePatch>, JsonRejection>,
) -> ApiResult<Json<DonationDrive>> {
    let patch = extract_json(body)?;

    let drive = state
        .drives
        .update(&id, patch)
        .await
        .inspect_err(|e| warn!(id = %id, error = %e, "Failed to update drive"))?;
    Ok(Json(drive))
}

/// DELETE /api/drives/:id
#[instrument(skip(state))]
pub async fn delete_drive(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Message>> {
    state.drives.delete(&id).await?;
    Ok(Message::new("Drive deleted successfully"))
}

/// GET /api/drives/filter/upcoming - Upcoming and ongoing drives, soonest first.
#[instrument(skip(state))]
pub async fn upcoming_drives(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<DonationDrive>>> {
    let drives = state.drives.upcoming().await?;

    info!(count = drives.len(), "Upcoming drives queried");
    Ok(Json(drives))
}

/// GET /api/drives/stats/summary
#[instrument(skip(state))]
pub async fn drive_summary(State(state): State<AppState>) -> ApiResult<Json<DriveSummary>> {
    Ok(Json(state.drives.summary().await?))
}

/// GET /api/drives/stats/status
#[instrument(skip(state))]
pub async fn drive_status_counts(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<StatusCount>>> {
    Ok(Json(state.drives.count_by_status().await?))
}
