//! Router assembly.

mod common;
mod entity;

pub use common::common_routes;
pub use entity::entity_routes;

use crate::response::error_body;
use crate::state::AppState;
use axum::{http::StatusCode, Json, Router};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

pub const API_PREFIX: &str = "/api/v1";

async fn not_found() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(error_body("not_found", "no such route".into(), None)),
    )
}

/// Full application router: service routes at the root, entity reads under `/api/v1`.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(common_routes(state.clone()))
        .nest(API_PREFIX, entity_routes(state))
        .fallback(not_found)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}
