//! Query execution and the find operation built on it.

mod executor;
mod find;
pub use executor::{PgExecutor, QueryExecutor};
pub use find::{FindRequest, FindResult, FindService};
