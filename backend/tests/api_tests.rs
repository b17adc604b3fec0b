//! HTTP API tests
//!
//! Drives the full router against an in-memory store:
//! - Actor header enforcement on mutating routes
//! - Status codes and the error body shape
//! - A transfer carried end to end over HTTP

mod common;

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use common::*;
use lumber_inventory::config::{
    Config, DatabaseConfig, NotificationConfig, ServerConfig, StoreBackend,
};
use lumber_inventory::notifications::LogNotifier;
use lumber_inventory::{create_app, AppState};
use serde_json::{json, Value};
use tower::ServiceExt;

fn test_config() -> Config {
    Config {
        environment: "test".to_string(),
        server: ServerConfig::default(),
        database: DatabaseConfig {
            backend: StoreBackend::Memory,
            url: String::new(),
            max_connections: 1,
            min_connections: 1,
            run_migrations: false,
        },
        notifications: NotificationConfig::default(),
    }
}

async fn app() -> (Router, Yard) {
    let yard = Yard::with_cedar().await;
    let state = AppState {
        store: yard.store.clone(),
        notifier: Arc::new(LogNotifier),
        config: Arc::new(test_config()),
    };
    (create_app(state), yard)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-actor-email", "Yard@Example.com");
    let body = match body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

// ============================================================================
// Actor Tests
// ============================================================================

#[tokio::test]
async fn test_mutation_without_actor_is_unauthorized() {
    let (app, yard) = app().await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/stock/adjust")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({
                "sku": SKU,
                "location_id": FARM_WS,
                "quantity": 5,
                "reason": "Sneaky"
            })
            .to_string(),
        ))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(yard.quantity(SKU, FARM_WS).await, 100);
}

#[tokio::test]
async fn test_actor_email_is_normalized() {
    let (app, yard) = app().await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/stock/adjust",
        Some(json!({
            "sku": SKU,
            "location_id": FARM_WS,
            "quantity": 110,
            "reason": "Delivery"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(yard.audit_entries().await[0].actor, "yard@example.com");
}

// ============================================================================
// Status Code Tests
// ============================================================================

#[tokio::test]
async fn test_reads_and_health() {
    let (app, _yard) = app().await;

    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["store"], "connected");

    let (status, body) = send(&app, Method::GET, "/api/v1/locations", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 5);

    let (status, body) = send(&app, Method::GET, &format!("/api/v1/items/{}/stock", SKU), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_on_hand"], 100);
}

#[tokio::test]
async fn test_create_item_returns_created() {
    let (app, _yard) = app().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/items",
        Some(json!({
            "sku": "OAK-1x4x8",
            "description": "White oak 1x4x8",
            "farm_par_level": 20
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "active");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/items",
        Some(json!({ "sku": "OAK-1x4x8", "description": "Again" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");
}

#[tokio::test]
async fn test_insufficient_stock_body() {
    let (app, yard) = app().await;
    let project = yard.project("Lakeside Deck").await;

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/v1/projects/{}/allocations", project.project_id),
        Some(json!({ "sku": SKU, "source_location": FARM_WS, "quantity": 150 })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "INSUFFICIENT_STOCK");
    assert_eq!(body["error"]["available"], 100);
    assert_eq!(body["error"]["requested"], 150);
}

#[tokio::test]
async fn test_unknown_resources_are_404() {
    let (app, _yard) = app().await;

    let (status, body) = send(&app, Method::GET, "/api/v1/transfers/999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    let (status, _) = send(&app, Method::POST, "/api/v1/pick-lists/999/start", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ============================================================================
// Workflow Tests
// ============================================================================

#[tokio::test]
async fn test_transfer_over_http() {
    let (app, yard) = app().await;

    let (status, transfer) = send(
        &app,
        Method::POST,
        "/api/v1/transfers",
        Some(json!({
            "sku": SKU,
            "quantity": 40,
            "from_location": FARM_WS,
            "to_location": MKE_SHOP
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(transfer["status"], "requested");
    let id = transfer["id"].as_i64().unwrap();

    let (status, shipped) = send(&app, Method::POST, &format!("/api/v1/transfers/{}/ship", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(shipped["status"], "in_transit");

    // receiving twice is an illegal transition
    let (status, received) = send(&app, Method::POST, &format!("/api/v1/transfers/{}/receive", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(received["status"], "received");
    let (status, body) = send(&app, Method::POST, &format!("/api/v1/transfers/{}/receive", id), None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "INVALID_STATE");

    assert_eq!(yard.quantity(SKU, FARM_WS).await, 60);
    assert_eq!(yard.quantity(SKU, MKE_SHOP).await, 40);
    assert_eq!(yard.quantity(SKU, TRANSIT).await, 0);
}

#[tokio::test]
async fn test_audit_csv_export() {
    let (app, _yard) = app().await;

    let request = Request::builder()
        .uri("/api/v1/audit?format=csv&sku=CDR-2x6x12")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/csv");

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let csv = String::from_utf8(bytes.to_vec()).unwrap();
    // header, item creation, opening balance
    assert_eq!(csv.lines().count(), 3);
}
