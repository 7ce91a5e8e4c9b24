//! Entity read routes. Paths are parameterized; handlers resolve the entity by path segment.

use crate::handlers::{find, read};
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn entity_routes(state: AppState) -> Router {
    Router::new()
        .route("/:path_segment", get(find))
        .route("/:path_segment/:id", get(read))
        .with_state(state)
}
