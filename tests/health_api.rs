mod common;

use axum::http::StatusCode;
use common::{executor, get, router, router_with};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::atomic::Ordering;
use std::sync::Arc;

#[tokio::test]
async fn health_is_up_without_touching_storage() {
    let exec = Arc::new(executor());
    exec.down.store(true, Ordering::SeqCst);
    let res = get(router_with(exec), "/health").await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body, json!({"status": "up"}));
}

#[tokio::test]
async fn version_lists_served_collections() {
    let res = get(router(), "/version").await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["name"], "inventory-api");
    assert_eq!(res.body["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(res.body["api_prefix"], "/api/v1");
    assert_eq!(res.body["collections"], json!(["filament", "spool", "vendor"]));
}

#[tokio::test]
async fn ready_reflects_storage() {
    let exec = Arc::new(executor());
    let res = get(router_with(exec.clone()), "/ready").await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body, json!({"status": "up", "storage": "up"}));

    exec.down.store(true, Ordering::SeqCst);
    let res = get(router_with(exec), "/ready").await;
    assert_eq!(res.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(res.body, json!({"status": "down", "storage": "down"}));
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let res = get(router(), "/nope/at/all/here").await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.error_code(), "not_found");
}
