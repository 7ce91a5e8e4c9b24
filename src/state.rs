//! Shared application state for all routes. Built once at startup, read-only afterwards.

use crate::config::SchemaGraph;
use crate::service::QueryExecutor;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub schema: Arc<SchemaGraph>,
    pub executor: Arc<dyn QueryExecutor>,
}

impl AppState {
    pub fn new(schema: SchemaGraph, executor: impl QueryExecutor + 'static) -> Self {
        AppState {
            schema: Arc::new(schema),
            executor: Arc::new(executor),
        }
    }
}
