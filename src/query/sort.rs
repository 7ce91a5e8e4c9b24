//! Multi-key sort specs and the ordering clauses built from them.

use crate::config::{EntityId, SchemaGraph};
use crate::error::QueryError;
use crate::query::{resolve, ColumnRef, FieldPath};
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl FromStr for SortDirection {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("asc") {
            Ok(SortDirection::Asc)
        } else if s.eq_ignore_ascii_case("desc") {
            Ok(SortDirection::Desc)
        } else {
            Err(QueryError::InvalidSortDirection(s.to_string()))
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SortKey {
    pub path: FieldPath,
    pub direction: SortDirection,
}

/// Sort keys in priority order: the first key is primary, later keys break ties.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SortSpec {
    keys: Vec<SortKey>,
}

impl SortSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(mut self, path: FieldPath, direction: SortDirection) -> Self {
        self.keys.push(SortKey { path, direction });
        self
    }

    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Parse `field:direction[,field:direction...]` with dotted field paths.
    pub fn parse(input: &str) -> Result<Self, QueryError> {
        Self::parse_with(input, |name| Ok(FieldPath::parse(name)))
    }

    /// Parse like [`SortSpec::parse`], mapping each field name through `field`.
    pub fn parse_with<F>(input: &str, mut field: F) -> Result<Self, QueryError>
    where
        F: FnMut(&str) -> Result<FieldPath, QueryError>,
    {
        let mut spec = SortSpec::new();
        for token in input.split(',').filter(|t| !t.is_empty()) {
            let (name, direction) = token.split_once(':').unwrap_or((token, ""));
            let direction: SortDirection = direction.parse()?;
            spec.keys.push(SortKey {
                path: field(name)?,
                direction,
            });
        }
        Ok(spec)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderTerm {
    pub column: ColumnRef,
    pub direction: SortDirection,
}

/// Lexicographic multi-key ordering, terms in sort-spec order.
///
/// No key is added implicitly. Rows equal on every term come back in whatever order
/// storage produces; callers wanting a total order include a unique field such as `id`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Ordering {
    terms: Vec<OrderTerm>,
}

impl Ordering {
    pub fn terms(&self) -> &[OrderTerm] {
        &self.terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

pub fn build_ordering(schema: &SchemaGraph, root: EntityId, sorts: &SortSpec) -> Result<Ordering, QueryError> {
    let terms = sorts
        .keys()
        .iter()
        .map(|key| {
            resolve(schema, root, &key.path).map(|column| OrderTerm {
                column,
                direction: key.direction,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Ordering { terms })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::inventory;
    use assert_matches::assert_matches;

    #[test]
    fn parses_in_order_case_insensitively() {
        let spec = SortSpec::parse("used_weight:DESC,id:asc").unwrap();
        let keys: Vec<(String, SortDirection)> = spec
            .keys()
            .iter()
            .map(|k| (k.path.to_string(), k.direction))
            .collect();
        assert_eq!(
            keys,
            [
                ("used_weight".to_string(), SortDirection::Desc),
                ("id".to_string(), SortDirection::Asc)
            ]
        );
    }

    #[test]
    fn rejects_bad_direction() {
        assert_eq!(
            SortSpec::parse("id:up").unwrap_err(),
            QueryError::InvalidSortDirection("up".into())
        );
        assert_matches!(SortSpec::parse("id"), Err(QueryError::InvalidSortDirection(d)) if d.is_empty());
    }

    #[test]
    fn empty_input_is_empty_spec() {
        assert!(SortSpec::parse("").unwrap().is_empty());
        assert_eq!(SortSpec::parse("id:asc,").unwrap().keys().len(), 1);
    }

    #[test]
    fn ordering_keeps_spec_order_without_extra_terms() {
        let schema = inventory::schema().unwrap();
        let root = schema.entity_by_name("spool").unwrap().id;
        let spec = SortSpec::new()
            .then(FieldPath::parse("filament.vendor.name"), SortDirection::Asc)
            .then(FieldPath::parse("used_weight"), SortDirection::Desc);
        let ordering = build_ordering(&schema, root, &spec).unwrap();
        let fields: Vec<String> = ordering.terms().iter().map(|t| t.column.path().to_string()).collect();
        assert_eq!(fields, ["filament.vendor.name", "used_weight"]);
        assert_eq!(ordering.terms()[1].direction, SortDirection::Desc);
    }

    #[test]
    fn ordering_surfaces_resolution_errors() {
        let schema = inventory::schema().unwrap();
        let root = schema.entity_by_name("spool").unwrap().id;
        let spec = SortSpec::parse("filament:asc").unwrap();
        assert_matches!(
            build_ordering(&schema, root, &spec),
            Err(QueryError::EmptyRelationPath { .. })
        );
    }
}
