//! List responses and the error envelope.

use axum::{
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;

pub const TOTAL_COUNT_HEADER: HeaderName = HeaderName::from_static("x-total-count");

/// `200` with a JSON array body and the unwindowed match count in `X-Total-Count`.
#[derive(Debug)]
pub struct ListResponse {
    pub rows: Vec<Value>,
    pub total_count: u64,
}

impl ListResponse {
    pub fn new(rows: Vec<Value>, total_count: u64) -> Self {
        ListResponse { rows, total_count }
    }
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        (
            StatusCode::OK,
            [(TOTAL_COUNT_HEADER, HeaderValue::from(self.total_count))],
            Json(self.rows),
        )
            .into_response()
    }
}

pub fn error_body(code: &str, message: String, details: Option<Value>) -> Value {
    serde_json::json!({
        "error": {
            "code": code,
            "message": message,
            "details": details
        }
    })
}
