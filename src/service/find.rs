//! Find operation: one filtered, sorted, windowed page plus the unwindowed total.

use crate::config::{EntityId, SchemaGraph};
use crate::error::AppError;
use crate::query::{
    assemble, parse_literal, resolve, FieldPath, FilterSpec, Ordering, Predicate, ResultWindow, RowQuery, SortSpec,
};
use crate::service::QueryExecutor;
use serde_json::Value;

#[derive(Clone, Debug, Default)]
pub struct FindRequest {
    pub filters: Vec<FilterSpec>,
    pub sorts: SortSpec,
    pub window: ResultWindow,
}

#[derive(Debug)]
pub struct FindResult {
    pub rows: Vec<Value>,
    /// Matching rows ignoring the window.
    pub total_count: u64,
}

pub struct FindService;

impl FindService {
    /// Build both queries, then run them concurrently. Query errors surface before any storage access.
    pub async fn find(
        schema: &SchemaGraph,
        executor: &dyn QueryExecutor,
        root: EntityId,
        request: &FindRequest,
    ) -> Result<FindResult, AppError> {
        let (rows, count) = assemble(schema, root, &request.filters, &request.sorts, request.window)?;
        let (rows, total_count) = tokio::try_join!(executor.fetch_rows(schema, &rows), executor.count(schema, &count))?;
        tracing::debug!(
            entity = %schema.entity(root).name,
            returned = rows.len(),
            total_count,
            "find"
        );
        Ok(FindResult { rows, total_count })
    }

    /// One row by primary key, or `None`.
    pub async fn get_by_id(
        schema: &SchemaGraph,
        executor: &dyn QueryExecutor,
        root: EntityId,
        id: &str,
    ) -> Result<Option<Value>, AppError> {
        let entity = schema.entity(root);
        let column = resolve(schema, root, &FieldPath::from_segments([entity.primary_key.as_str()]))?;
        let value = parse_literal(&column, id)?;
        let rows = RowQuery {
            root,
            filter: Some(Predicate::Eq(column, value)),
            ordering: Ordering::default(),
            window: ResultWindow::new(Some(1), 0),
        };
        Ok(executor.fetch_rows(schema, &rows).await?.into_iter().next())
    }
}
