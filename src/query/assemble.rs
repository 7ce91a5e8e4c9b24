//! Assembles filters, ordering, and the result window into a row query and a count query.

use crate::config::{EntityId, SchemaGraph};
use crate::error::QueryError;
use crate::query::{build_ordering, build_predicate, resolve, FilterSpec, Ordering, Predicate, SortSpec};

/// Pagination bounds. Only the row query is windowed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ResultWindow {
    /// `None` returns every row after `offset`.
    pub limit: Option<u64>,
    pub offset: u64,
}

impl ResultWindow {
    pub fn new(limit: Option<u64>, offset: u64) -> Self {
        ResultWindow { limit, offset }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RowQuery {
    pub root: EntityId,
    pub filter: Option<Predicate>,
    pub ordering: Ordering,
    pub window: ResultWindow,
}

/// Same filter as the row query, without ordering or window.
#[derive(Clone, Debug, PartialEq)]
pub struct CountQuery {
    pub root: EntityId,
    pub filter: Option<Predicate>,
}

/// AND of one predicate per filter, in input order. Unset filters contribute nothing.
pub fn build_filter(schema: &SchemaGraph, root: EntityId, filters: &[FilterSpec]) -> Result<Option<Predicate>, QueryError> {
    let mut parts = Vec::with_capacity(filters.len());
    for spec in filters {
        let column = resolve(schema, root, &spec.path)?;
        if let Some(p) = build_predicate(&column, spec.value.as_deref())? {
            parts.push(p);
        }
    }
    Ok(Predicate::all(parts))
}

pub fn assemble(
    schema: &SchemaGraph,
    root: EntityId,
    filters: &[FilterSpec],
    sorts: &SortSpec,
    window: ResultWindow,
) -> Result<(RowQuery, CountQuery), QueryError> {
    let filter = build_filter(schema, root, filters)?;
    let ordering = build_ordering(schema, root, sorts)?;
    let count = CountQuery {
        root,
        filter: filter.clone(),
    };
    let rows = RowQuery {
        root,
        filter,
        ordering,
        window,
    };
    Ok((rows, count))
}
