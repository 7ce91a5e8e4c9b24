//! Service routes outside the entity API: liveness, storage readiness, and a service summary.

use super::API_PREFIX;
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
enum Status {
    Up,
    Down,
}

#[derive(Serialize)]
struct Liveness {
    status: Status,
}

#[derive(Serialize)]
struct Readiness {
    status: Status,
    storage: Status,
}

/// What this instance serves: crate version and the collections mounted under the API prefix.
#[derive(Serialize)]
struct ServiceInfo {
    name: &'static str,
    version: &'static str,
    api_prefix: &'static str,
    collections: Vec<String>,
}

async fn health() -> Json<Liveness> {
    Json(Liveness { status: Status::Up })
}

/// 503 while the executor cannot reach storage, so load balancers hold traffic back.
async fn ready(State(state): State<AppState>) -> (StatusCode, Json<Readiness>) {
    match state.executor.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(Readiness {
                status: Status::Up,
                storage: Status::Up,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "storage unreachable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(Readiness {
                    status: Status::Down,
                    storage: Status::Down,
                }),
            )
        }
    }
}

async fn info(State(state): State<AppState>) -> Json<ServiceInfo> {
    let mut collections: Vec<String> = state.schema.entities().map(|e| e.path_segment.clone()).collect();
    collections.sort();
    Json(ServiceInfo {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        api_prefix: API_PREFIX,
        collections,
    })
}

pub fn common_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/version", get(info))
        .with_state(state)
}
