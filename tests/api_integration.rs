//! Integration tests for the Bloodbank HTTP API.
//!
//! These tests drive the same router the binary serves, end to end through
//! the SQLite store.

use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{Value, json};

use bloodbank::api::{AppState, app};
use bloodbank::storage::Storage;

async fn create_test_server() -> TestServer {
    let storage = Storage::new("sqlite::memory:").await.unwrap();
    TestServer::new(app(AppState::new(storage))).unwrap()
}

fn inventory_path(blood_type: &str) -> String {
    format!("/api/inventory/{}", urlencoding::encode(blood_type))
}

async fn create_donor(server: &TestServer, first_name: &str, blood_type: &str) -> Value {
    let response = server
        .post("/api/donors")
        .json(&json!({
            "firstName": first_name,
            "lastName": "Tester",
            "contact": "555-0101",
            "bloodType": blood_type
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json()
}

#[tokio::test]
async fn test_health_endpoint() {
    let server = create_test_server().await;

    let response = server.get("/health").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "OK");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_index_banner() {
    let server = create_test_server().await;

    let body: Value = server.get("/").await.json();

    assert_eq!(body["endpoints"]["inventory"], "/api/inventory");
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let server = create_test_server().await;

    let response = server.get("/api/nothing-here").await;

    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["message"], "Route not found");
}

#[tokio::test]
async fn test_donor_crud_cycle() {
    let server = create_test_server().await;

    let donor = create_donor(&server, "Ada", "O-").await;
    let id = donor["id"].as_str().unwrap().to_string();
    assert_eq!(donor["status"], "Active");
    assert_eq!(donor["availability"], "Available");

    let fetched: Value = server.get(&format!("/api/donors/{id}")).await.json();
    assert_eq!(fetched, donor);

    let response = server
        .put(&format!("/api/donors/{id}"))
        .json(&json!({ "city": "Leeds", "isAdmin": true }))
        .await;
    response.assert_status_ok();
    let updated: Value = response.json();
    assert_eq!(updated["city"], "Leeds");
    assert!(updated.get("isAdmin").is_none());

    let response = server.delete(&format!("/api/donors/{id}")).await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["message"], "Donor deleted successfully");

    let response = server.get(&format!("/api/donors/{id}")).await;
    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["message"], "Donor not found");
}

#[tokio::test]
async fn test_donor_missing_required_field() {
    let server = create_test_server().await;

    let response = server
        .post("/api/donors")
        .json(&json!({ "firstName": "Ada", "lastName": "Tester", "contact": "555" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["message"].as_str().unwrap().contains("bloodType"));
}

#[tokio::test]
async fn test_donor_invalid_blood_type_label() {
    let server = create_test_server().await;

    let response = server
        .post("/api/donors")
        .json(&json!({
            "firstName": "Ada",
            "lastName": "Tester",
            "contact": "555",
            "bloodType": "C+"
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_donor_search_and_summary() {
    let server = create_test_server().await;
    create_donor(&server, "A", "AB+").await;
    create_donor(&server, "B", "AB+").await;
    create_donor(&server, "C", "O+").await;

    let response = server
        .get(&format!(
            "/api/donors/search/bloodtype/{}",
            urlencoding::encode("AB+")
        ))
        .await;
    response.assert_status_ok();
    let donors: Vec<Value> = response.json();
    assert_eq!(donors.len(), 2);

    let summary: Value = server.get("/api/donors/stats/summary").await.json();
    assert_eq!(summary["totalDonors"], 3);
    assert_eq!(summary["activeDonors"], 3);
    assert_eq!(
        summary["bloodTypeDistribution"],
        json!([
            { "bloodType": "AB+", "count": 2 },
            { "bloodType": "O+", "count": 1 }
        ])
    );

    let response = server.get("/api/donors/search/bloodtype/Q").await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_drive_upcoming_filter() {
    let server = create_test_server().await;

    for (name, date) in [("Later", "2099-06-01"), ("Sooner", "2099-01-15")] {
        server
            .post("/api/drives")
            .json(&json!({
                "name": name,
                "location": "Town Hall",
                "date": date,
                "time": "10:00",
                "organizer": "Red Cross",
                "contactNumber": "555-0199"
            }))
            .await
            .assert_status(StatusCode::CREATED);
    }

    let upcoming: Vec<Value> = server.get("/api/drives/filter/upcoming").await.json();
    let names: Vec<&str> = upcoming.iter().map(|d| d["name"].as_str().unwrap()).collect();
    assert_eq!(names, ["Sooner", "Later"]);
    assert_eq!(upcoming[0]["date"], "2099-01-15T00:00:00Z");

    let summary: Value = server.get("/api/drives/stats/summary").await.json();
    assert_eq!(summary["totalDrives"], 2);
    assert_eq!(summary["upcomingDrives"], 2);
    assert_eq!(summary["completedDrives"], 0);
}

#[tokio::test]
async fn test_request_fulfilment_stamps_date_once() {
    let server = create_test_server().await;

    let request: Value = server
        .post("/api/requests")
        .json(&json!({
            "patient": "Pat",
            "bloodType": "B-",
            "hospital": "General",
            "contactNumber": "555-0142",
            "urgency": "Critical"
        }))
        .await
        .json();
    let id = request["id"].as_str().unwrap().to_string();
    assert_eq!(request["units"], 1);
    assert_eq!(request["status"], "Pending");

    let pending: Vec<Value> = server.get("/api/requests/filter/pending").await.json();
    assert_eq!(pending.len(), 1);

    let first: Value = server
        .put(&format!("/api/requests/{id}"))
        .json(&json!({ "status": "Fulfilled" }))
        .await
        .json();
    assert!(first["fulfilledDate"].is_string());

    let second: Value = server
        .put(&format!("/api/requests/{id}"))
        .json(&json!({ "status": "Fulfilled", "notes": "delivered" }))
        .await
        .json();
    assert_eq!(second["fulfilledDate"], first["fulfilledDate"]);
    assert_eq!(second["notes"], "delivered");

    let pending: Vec<Value> = server.get("/api/requests/filter/pending").await.json();
    assert!(pending.is_empty());

    let summary: Value = server.get("/api/requests/stats/summary").await.json();
    assert_eq!(summary["fulfilledRequests"], 1);
}

#[tokio::test]
async fn test_initialize_inventory_is_idempotent() {
    let server = create_test_server().await;

    let response = server.post("/api/inventory/initialize").await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["message"], "Inventory initialized");
    assert_eq!(body["items"].as_array().unwrap().len(), 8);

    let body: Value = server.post("/api/inventory/initialize").await.json();
    assert!(body["items"].as_array().unwrap().is_empty());

    let all: Vec<Value> = server.get("/api/inventory").await.json();
    let labels: Vec<&str> = all.iter().map(|r| r["bloodType"].as_str().unwrap()).collect();
    assert_eq!(labels, ["A+", "A-", "AB+", "AB-", "B+", "B-", "O+", "O-"]);
    assert!(all.iter().all(|r| r["units"] == 0));
}

#[tokio::test]
async fn test_replenish_and_consume() {
    let server = create_test_server().await;

    let response = server
        .post("/api/inventory")
        .json(&json!({ "bloodType": "A+", "units": 10, "expiryDate": "2099-01-01" }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let record: Value = response.json();
    assert_eq!(record["units"], 10);
    assert_eq!(record["expiryBatches"].as_array().unwrap().len(), 1);
    assert_eq!(record["expiryBatches"][0]["units"], 10);

    let response = server
        .post(&format!("{}/use", inventory_path("A+")))
        .json(&json!({ "units": 4 }))
        .await;
    response.assert_status_ok();
    let record: Value = response.json();
    assert_eq!(record["units"], 6);

    let response = server
        .post(&format!("{}/use", inventory_path("A+")))
        .json(&json!({ "units": 7 }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(
        body["message"]
            .as_str()
            .unwrap()
            .starts_with("Insufficient units in inventory")
    );

    let record: Value = server.get(&inventory_path("A+")).await.json();
    assert_eq!(record["units"], 6);
}

#[tokio::test]
async fn test_consume_rejects_non_positive_units() {
    let server = create_test_server().await;
    server
        .post("/api/inventory")
        .json(&json!({ "bloodType": "O-", "units": 5 }))
        .await
        .assert_status(StatusCode::CREATED);

    for units in [0, -3] {
        let response = server
            .post(&format!("{}/use", inventory_path("O-")))
            .json(&json!({ "units": units }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    let response = server
        .post(&format!("{}/use", inventory_path("O-")))
        .json(&json!({ "units": "lots" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_set_units_and_missing_record() {
    let server = create_test_server().await;

    let response = server
        .put(&inventory_path("B+"))
        .json(&json!({ "units": 5 }))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);

    server
        .post("/api/inventory")
        .json(&json!({ "bloodType": "B+", "units": 40, "expiryDate": "2099-01-01" }))
        .await
        .assert_status(StatusCode::CREATED);

    let response = server
        .put(&inventory_path("B+"))
        .json(&json!({ "units": 5 }))
        .await;
    response.assert_status_ok();

    let record: Value = server.get(&inventory_path("B+")).await.json();
    assert_eq!(record["units"], 5);
    assert_eq!(record["expiryBatches"][0]["units"], 40);
}

#[tokio::test]
async fn test_low_stock_alerts_threshold() {
    let server = create_test_server().await;
    for (blood_type, units) in [("A-", 30), ("AB-", 29), ("O+", 100)] {
        server
            .post("/api/inventory")
            .json(&json!({ "bloodType": blood_type, "units": units }))
            .await
            .assert_status(StatusCode::CREATED);
    }

    let low: Vec<Value> = server.get("/api/inventory/alerts/low-stock").await.json();
    assert_eq!(low.len(), 1);
    assert_eq!(low[0]["bloodType"], "AB-");

    let low: Vec<Value> = server
        .get("/api/inventory/alerts/low-stock?threshold=31")
        .await
        .json();
    assert_eq!(low.len(), 2);

    let response = server
        .get("/api/inventory/alerts/low-stock?threshold=-1")
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_expiring_alerts() {
    let server = create_test_server().await;
    let soon = (chrono::Utc::now() + chrono::Duration::days(3)).to_rfc3339();
    let later = (chrono::Utc::now() + chrono::Duration::days(30)).to_rfc3339();

    for expiry in [&soon, &later] {
        server
            .post("/api/inventory")
            .json(&json!({ "bloodType": "A+", "units": 2, "expiryDate": expiry }))
            .await
            .assert_status(StatusCode::CREATED);
    }

    let batches: Vec<Value> = server.get("/api/inventory/alerts/expiring").await.json();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0]["bloodType"], "A+");

    let batches: Vec<Value> = server
        .get("/api/inventory/alerts/expiring?days=60")
        .await
        .json();
    assert_eq!(batches.len(), 2);
}

#[tokio::test]
async fn test_invalid_path_blood_type_is_400() {
    let server = create_test_server().await;

    let response = server.get("/api/inventory/Z9").await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_json_is_400() {
    let server = create_test_server().await;

    let response = server
        .post("/api/requests")
        .text("{not json")
        .content_type("application/json")
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_dashboard_overview() {
    let server = create_test_server().await;
    create_donor(&server, "Ada", "O-").await;
    server
        .post("/api/inventory")
        .json(&json!({ "bloodType": "O-", "units": 12 }))
        .await
        .assert_status(StatusCode::CREATED);

    let response = server.get("/api/dashboard").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["totalDonors"], 1);
    assert_eq!(body["totalUnits"], 12);
    assert_eq!(body["pendingRequests"], 0);
    assert_eq!(body["lowStock"][0]["bloodType"], "O-");
}

#[tokio::test]
async fn test_wrong_method_gets_json_message() {
    let server = create_test_server().await;

    let response = server.get("/api/inventory/initialize").await;

    response.assert_status(StatusCode::METHOD_NOT_ALLOWED);
    let body: Value = response.json();
    assert_eq!(body["message"], "Method not allowed");
    assert!(response.headers().contains_key("allow"));
}

#[tokio::test]
async fn test_large_absolute_correction_is_accepted() {
    let server = create_test_server().await;
    server
        .post("/api/inventory")
        .json(&json!({ "bloodType": "AB+", "units": 1 }))
        .await
        .assert_status(StatusCode::CREATED);

    let response = server
        .put(&inventory_path("AB+"))
        .json(&json!({ "units": 5_000_000 }))
        .await;

    response.assert_status_ok();
    let record: Value = response.json();
    assert_eq!(record["units"], 5_000_000);
}
