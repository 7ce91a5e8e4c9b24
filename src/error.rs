//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing reference: {kind} '{id}'")]
    MissingReference { kind: &'static str, id: String },
    #[error("invalid primary key: entity {entity} field {field}")]
    InvalidPrimaryKey { entity: String, field: String },
    #[error("duplicate {kind} name: {name}")]
    DuplicateName { kind: &'static str, name: String },
    #[error("invalid alias '{alias}' on entity {entity}: {reason}")]
    InvalidAlias {
        entity: String,
        alias: String,
        reason: String,
    },
    #[error("config load: {0}")]
    Load(String),
    #[error("validation: {0}")]
    Validation(String),
}

/// Input-only failures of query construction. The same input always fails the same way.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("unknown field '{field}' on {entity}")]
    UnknownField { entity: String, field: String },
    #[error("relation '{relation}' on {entity} needs a nested field (e.g. '{relation}.id')")]
    EmptyRelationPath { entity: String, relation: String },
    #[error("invalid sort direction '{0}', expected 'asc' or 'desc'")]
    InvalidSortDirection(String),
    #[error("invalid value '{value}' for field '{field}': expected {expected}")]
    InvalidFilterValue {
        field: String,
        value: String,
        expected: &'static str,
    },
}

impl QueryError {
    pub fn code(&self) -> &'static str {
        match self {
            QueryError::UnknownField { .. } => "unknown_field",
            QueryError::EmptyRelationPath { .. } => "empty_relation_path",
            QueryError::InvalidSortDirection(_) => "invalid_sort_direction",
            QueryError::InvalidFilterValue { .. } => "invalid_filter_value",
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Query(#[from] QueryError),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AppError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
            AppError::Query(e) => (StatusCode::BAD_REQUEST, e.code()),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            AppError::Db(e) => {
                tracing::error!(error = %e, "storage failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error")
            }
        };
        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
                details: None,
            },
        };
        (status, Json(body)).into_response()
    }
}
