//! HTTP API for the blood bank.
//!
//! Every resource lives under `/api`:
//!
//! - `/api/donors`, `/api/drives`, `/api/requests`: CRUD plus filters and summaries
//! - `/api/inventory`: stock levels, replenishment, allocation and alerts
//! - `/api/dashboard`: headline figures in one call
//!
//! `GET /` and `GET /health` sit at the root. Handlers never pick status codes
//! for failures themselves; they return [`ApiError`], which maps the domain
//! [`Error`] to a status and a `{"message": ...}` body.

use axum::{
    Json, Router,
    extract::rejection::{JsonRejection, QueryRejection},
    extract::Query,
    http::{StatusCode, header},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::error;

use crate::dashboard::Dashboard;
use crate::error::Error;
use crate::ledger::InventoryLedger;
use crate::model::{self, BloodType};
use crate::services::{DonorService, DriveService, RequestService};
use crate::storage::Storage;

mod dashboard;
mod donors;
mod drives;
mod inventory;
mod requests;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub ledger: InventoryLedger,
    pub donors: DonorService,
    pub drives: DriveService,
    pub requests: RequestService,
    pub dashboard: Dashboard,
}

impl AppState {
    /// Wire every component to the same store.
    pub fn new(storage: Storage) -> Self {
        Self {
            ledger: InventoryLedger::new(storage.clone()),
            donors: DonorService::new(storage.clone()),
            drives: DriveService::new(storage.clone()),
            requests: RequestService::new(storage.clone()),
            dashboard: Dashboard::new(storage),
        }
    }
}

/// The full router served by the binary.
pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .merge(donors::routes())
        .merge(drives::routes())
        .merge(requests::routes())
        .merge(inventory::routes())
        .merge(dashboard::routes());

    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .nest("/api", api)
        .fallback(not_found)
        .layer(middleware::map_response(method_not_allowed))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// Error returned by every handler.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(Error::Validation(rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError(Error::Validation(rejection.body_text()))
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            err if err.is_client_error() => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            // Details stay in the log
            error!(error = %self.0, "Request failed");
            "Internal server error".to_string()
        } else {
            self.0.to_string()
        };
        (status, Json(Message { message })).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// `{"message": ...}` body used for errors and plain acknowledgements.
#[derive(Debug, Serialize)]
pub struct Message {
    pub message: String,
}

impl Message {
    pub fn new(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            message: message.into(),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
}

/// Unwrap a JSON body, turning a rejection into a validation error.
pub(crate) fn extract_json<T>(body: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    body.map(|Json(value)| value).map_err(ApiError::from)
}

pub(crate) fn extract_query<T>(query: Result<Query<T>, QueryRejection>) -> ApiResult<T> {
    query.map(|Query(value)| value).map_err(ApiError::from)
}

/// Parse a blood type path segment such as `A+` or `AB-`.
pub(crate) fn parse_blood_type(raw: &str) -> ApiResult<BloodType> {
    Ok(raw.parse::<BloodType>()?)
}

/// GET / - API banner.
pub async fn index() -> impl IntoResponse {
    Json(json!({
        "message": "Blood Bank Management API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "donors": "/api/donors",
            "drives": "/api/drives",
            "requests": "/api/requests",
            "inventory": "/api/inventory",
            "dashboard": "/api/dashboard",
            "health": "/health",
        }
    }))
}

/// GET /health - Liveness check.
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK",
        timestamp: model::now(),
    })
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Message::new("Route not found"))
}

/// Give the router's bare 405 the same `{"message": ...}` body as other failures.
async fn method_not_allowed(response: Response) -> Response {
    if response.status() != StatusCode::METHOD_NOT_ALLOWED {
        return response;
    }

    let allow = response.headers().get(header::ALLOW).cloned();
    let mut replaced = (
        StatusCode::METHOD_NOT_ALLOWED,
        Message::new("Method not allowed"),
    )
        .into_response();
    if let Some(allow) = allow {
        replaced.headers_mut().insert(header::ALLOW, allow);
    }
    replaced
}
