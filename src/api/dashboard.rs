use axum::{Json, Router, extract::State, routing::get};
use tracing::{info, instrument};

use super::{ApiResult, AppState};
use crate::dashboard::DashboardOverview;

pub(super) fn routes() -> Router<AppState> {
    Router::new().route("/dashboard", get(get_dashboard))
}

/// GET /api/dashboard - Headline figures for the front page.
///
/// # Response
///
/// ```json
/// {
///     "totalDonors": 120,
///     "totalUnits": 340,
///     "pendingRequests": 4,
///     "upcomingDrives": 2,
///     "lowStock": [{ "bloodType": "O-", "units": 12, ... }],
///     "generatedAt": "2025-01-20T10:30:00.000Z"
/// }
/// ```
#[instrument(skip(state))]
pub async fn get_dashboard(State(state): State<AppState>) -> ApiResult<Json<DashboardOverview>> {
    let overview = state.dashboard.overview().await?;

    info!(
        total_donors = overview.total_donors,
        total_units = overview.total_units,
        low_stock = overview.low_stock.len(),
        "Dashboard queried"
    );
    Ok(Json(overview))
}
