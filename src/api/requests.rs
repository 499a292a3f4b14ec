use axum::{
    Json, Router,
    extract::rejection::JsonRejection,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use tracing::{info, instrument, warn};

use super::{ApiResult, AppState, Message, extract_json};
use crate::model::{BloodRequest, NewBloodRequest, RequestPatch};
use crate::services::{RequestSummary, StatusCount};

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/requests", get(list_requests).post(create_request))
        .route("/requests/filter/pending", get(pending_requests))
        .route("/requests/stats/summary", get(request_summary))
        .route("/requests/stats/status", get(request_status_counts))
        .route(
            "/requests/:id",
            get(get_request).put(update_request).delete(delete_request),
        )
}

/// GET /api/requests - All requests, most recent first.
#[instrument(skip(state))]
pub async fn list_requests(State(state): State<AppState>) -> ApiResult<Json<Vec<BloodRequest>>> {
    Ok(Json(state.requests.list().await?))
}

/// GET /api/requests/:id
#[instrument(skip(state))]
pub async fn get_request(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<BloodRequest>> {
    Ok(Json(state.requests.get(&id).await?))
}

/// POST /api/requests - File a blood request.
///
/// Creating or fulfilling a request never touches inventory; allocation goes
/// through `POST /api/inventory/:bloodType/use`.
#[instrument(skip(state, body))]
pub async fn create_request(
    State(state): State<AppState>,
    body: Result<Json<NewBloodRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<BloodRequest>)> {
    let input = extract_json(body)?;

    match state.requests.create(input).await {
        Ok(request) => Ok((StatusCode::CREATED, Json(request))),
        Err(e) => {
            warn!(error = %e, "Failed to file blood request");
            Err(e.into())
        }
    }
}

/// PUT /api/requests/:id
///
/// Setting `status` to `Fulfilled` stamps `fulfilledDate` the first time.
#[instrument(skip(state, body))]
pub async fn update_request(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<RequestPatch>, JsonRejection>,
) -> ApiResult<Json<BloodRequest>> {
    let patch = extract_json(body)?;

    let request = state
        .requests
        .update(&id, patch)
        .await
        .inspect_err(|e| warn!(id = %id, error = %e, "Failed to update blood request"))?;
    Ok(Json(request))
}

/// DELETE /api/requests/:id
#[instrument(skip(state))]
pub async fn delete_request(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Message>> {
    state.requests.delete(&id).await?;
    Ok(Message::new("Request deleted successfully"))
}

/// GET /api/requests/filter/pending
#[instrument(skip(state))]
pub async fn pending_requests(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<BloodRequest>>> {
    let requests = state.requests.pending().await?;

    info!(count = requests.len(), "Pending requests queried");
    Ok(Json(requests))
}

/// GET /api/requests/stats/summary
#[instrument(skip(state))]
pub async fn request_summary(State(state): State<AppState>) -> ApiResult<Json<RequestSummary>> {
    Ok(Json(state.requests.summary().await?))
}

/// GET /api/requests/stats/status
#[instrument(skip(state))]
pub async fn request_status_counts(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<StatusCount>>> {
    Ok(Json(state.requests.count_by_status().await?))
}
