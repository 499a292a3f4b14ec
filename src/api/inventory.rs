use axum::{
    Json, Router,
    extract::rejection::{JsonRejection, QueryRejection},
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::Serialize;
use tracing::{info, instrument, warn};

use super::{ApiResult, AppState, extract_json, extract_query, parse_blood_type};
use crate::error::Error;
use crate::model::{
    self, ExpiringBatch, ExpiringQuery, InventoryRecord, LowStockQuery, ReplenishRequest,
    SetUnitsRequest, UseRequest,
};

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/inventory", get(list_inventory).post(replenish))
        .route("/inventory/initialize", post(initialize_inventory))
        .route("/inventory/alerts/low-stock", get(low_stock_alerts))
        .route("/inventory/alerts/expiring", get(expiring_batches))
        .route(
            "/inventory/:blood_type",
            get(get_inventory).put(set_units),
        )
        .route("/inventory/:blood_type/use", post(use_units))
}

/// Response of `POST /api/inventory/initialize`.
#[derive(Debug, Serialize)]
pub struct InitializeResponse {
    pub message: &'static str,
    /// Records created by this call; empty when all types already existed.
    pub items: Vec<InventoryRecord>,
}

/// GET /api/inventory - Every record, sorted by blood type.
#[instrument(skip(state))]
pub async fn list_inventory(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<InventoryRecord>>> {
    Ok(Json(state.ledger.get_all().await?))
}

/// GET /api/inventory/:bloodType
///
/// The blood type must be percent-encoded in the path (`A%2B` for `A+`).
#[instrument(skip(state))]
pub async fn get_inventory(
    State(state): State<AppState>,
    Path(blood_type): Path<String>,
) -> ApiResult<Json<InventoryRecord>> {
    let blood_type = parse_blood_type(&blood_type)?;
    Ok(Json(state.ledger.get_by_type(blood_type).await?))
}

/// POST /api/inventory - Receive units, creating the record if needed.
///
/// # Request Body
///
/// ```json
/// {
///     "bloodType": "O-",
///     "units": 10,
///     "expiryDate": "2025-03-01",
///     "donationDate": "2025-01-20"
/// }
/// ```
///
/// `expiryDate` and `donationDate` are optional. Returns `201 Created`.
#[instrument(skip(state, body))]
pub async fn replenish(
    State(state): State<AppState>,
    body: Result<Json<ReplenishRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<InventoryRecord>)> {
    let request = extract_json(body)?;
    let blood_type = request
        .blood_type
        .ok_or_else(|| Error::validation("bloodType is required"))?;
    let units = request.units.ok_or_else(|| Error::validation("units is required"))?;

    match state
        .ledger
        .replenish(blood_type, units, request.expiry_date, request.donation_date)
        .await
    {
        Ok(record) => Ok((StatusCode::CREATED, Json(record))),
        Err(e) => {
            warn!(blood_type = %blood_type, units, error = %e, "Failed to replenish inventory");
            Err(e.into())
        }
    }
}

/// PUT /api/inventory/:bloodType - Overwrite the unit count.
///
/// Expiry batches are left as they are.
#[instrument(skip(state, body))]
pub async fn set_units(
    State(state): State<AppState>,
    Path(blood_type): Path<String>,
    body: Result<Json<SetUnitsRequest>, JsonRejection>,
) -> ApiResult<Json<InventoryRecord>> {
    let blood_type = parse_blood_type(&blood_type)?;
    let units = extract_json(body)?
        .units
        .ok_or_else(|| Error::validation("units is required"))?;

    match state.ledger.set_units(blood_type, units).await {
        Ok(record) => Ok(Json(record)),
        Err(e) => {
            warn!(blood_type = %blood_type, units, error = %e, "Failed to set inventory units");
            Err(e.into())
        }
    }
}

/// POST /api/inventory/:bloodType/use - Allocate units.
///
/// Responds `400` with an "Insufficient units in inventory" message and leaves
/// stock unchanged when fewer units are on hand than requested.
#[instrument(skip(state, body))]
pub async fn use_units(
    State(state): State<AppState>,
    Path(blood_type): Path<String>,
    body: Result<Json<UseRequest>, JsonRejection>,
) -> ApiResult<Json<InventoryRecord>> {
    let blood_type = parse_blood_type(&blood_type)?;
    let units = extract_json(body)?
        .units
        .ok_or_else(|| Error::validation("units is required"))?;

    Ok(Json(state.ledger.consume(blood_type, units).await?))
}

/// GET /api/inventory/alerts/low-stock?threshold=30
#[instrument(skip(state))]
pub async fn low_stock_alerts(
    State(state): State<AppState>,
    query: Result<Query<LowStockQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<InventoryRecord>>> {
    let query = extract_query(query)?;
    let records = state
        .ledger
        .low_stock_alerts(i64::from(query.threshold))
        .await?;

    info!(threshold = query.threshold, count = records.len(), "Low stock alerts queried");
    Ok(Json(records))
}

/// GET /api/inventory/alerts/expiring?days=7
#[instrument(skip(state))]
pub async fn expiring_batches(
    State(state): State<AppState>,
    query: Result<Query<ExpiringQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<ExpiringBatch>>> {
    let query = extract_query(query)?;
    let batches = state
        .ledger
        .expiring_batches(i64::from(query.days), model::now())
        .await?;

    info!(days = query.days, count = batches.len(), "Expiring batches queried");
    Ok(Json(batches))
}

/// POST /api/inventory/initialize - Ensure every blood type has a record.
#[instrument(skip(state))]
pub async fn initialize_inventory(
    State(state): State<AppState>,
) -> ApiResult<(StatusCode, Json<InitializeResponse>)> {
    let items = state.ledger.initialize().await?;

    Ok((
        StatusCode::CREATED,
        Json(InitializeResponse {
            message: "Inventory initialized",
            items,
        }),
    ))
}
