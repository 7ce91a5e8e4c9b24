//! Inventory API: schema-driven filtering, sorting and pagination over PostgreSQL.

pub mod config;
pub mod error;
pub mod handlers;
pub mod query;
pub mod response;
pub mod routes;
pub mod service;
pub mod settings;
pub mod sql;
pub mod state;

pub use config::{load_from_path, resolve, SchemaConfig, SchemaGraph};
pub use error::{AppError, ConfigError, QueryError};
pub use response::{error_body, ListResponse};
pub use routes::{app, common_routes, entity_routes};
pub use service::{FindRequest, FindResult, FindService, PgExecutor, QueryExecutor};
pub use settings::Settings;
pub use state::AppState;
