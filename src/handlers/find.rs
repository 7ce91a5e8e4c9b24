//! Entity read handlers: find (filtered list) and get-by-id.

use crate::config::{EntityType, SchemaGraph};
use crate::error::AppError;
use crate::query::{canonical_path, parse_bool, FieldPath, FilterSpec, SortSpec};
use crate::response::ListResponse;
use crate::service::{FindRequest, FindService};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::Value;

fn entity_for<'a>(schema: &'a SchemaGraph, path_segment: &str) -> Result<&'a EntityType, AppError> {
    schema
        .entity_by_path(path_segment)
        .ok_or_else(|| AppError::NotFound(format!("entity '{}'", path_segment)))
}

/// Window bounds are rendered into SQL, where LIMIT and OFFSET are `bigint`.
fn parse_u64(name: &str, v: &str) -> Result<u64, AppError> {
    v.parse::<u64>()
        .ok()
        .filter(|n| i64::try_from(*n).is_ok())
        .ok_or_else(|| {
            AppError::BadRequest(format!(
                "'{}' must be an integer between 0 and {}, got '{}'",
                name,
                i64::MAX,
                v
            ))
        })
}

/// Turn query parameters, in request order, into a find request.
///
/// `sort`, `limit`, `offset` and `allow_archived` are reserved; every other name is a field
/// filter. Archived rows are excluded unless `allow_archived` is true.
pub fn parse_find_request(
    schema: &SchemaGraph,
    entity: &EntityType,
    params: &[(String, String)],
) -> Result<FindRequest, AppError> {
    let root = entity.id;
    let mut request = FindRequest::default();
    let mut allow_archived = false;

    for (k, v) in params {
        match k.as_str() {
            "sort" => {
                request.sorts = SortSpec::parse_with(v, |name| canonical_path(schema, root, name))?;
            }
            "limit" => request.window.limit = Some(parse_u64(k, v)?),
            "offset" => request.window.offset = parse_u64(k, v)?,
            "allow_archived" => {
                allow_archived = parse_bool(v)
                    .ok_or_else(|| AppError::BadRequest(format!("'allow_archived' must be true or false, got '{}'", v)))?;
            }
            name => {
                let path = canonical_path(schema, root, name)?;
                request.filters.push(FilterSpec::new(path, v.as_str()));
            }
        }
    }

    if let Some(flag) = &entity.archive_flag {
        if !allow_archived {
            request
                .filters
                .push(FilterSpec::new(FieldPath::from_segments([flag.as_str()]), "false"));
        }
    }
    Ok(request)
}

pub async fn find(
    State(state): State<AppState>,
    Path(path_segment): Path<String>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<ListResponse, AppError> {
    let schema = &state.schema;
    let entity = entity_for(schema, &path_segment)?;
    let request = parse_find_request(schema, entity, &params)?;
    let result = FindService::find(schema, state.executor.as_ref(), entity.id, &request).await?;
    Ok(ListResponse::new(result.rows, result.total_count))
}

pub async fn read(
    State(state): State<AppState>,
    Path((path_segment, id)): Path<(String, String)>,
) -> Result<Json<Value>, AppError> {
    let schema = &state.schema;
    let entity = entity_for(schema, &path_segment)?;
    let row = FindService::get_by_id(schema, state.executor.as_ref(), entity.id, &id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{} {}", entity.name, id)))?;
    Ok(Json(row))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::inventory;
    use crate::error::QueryError;
    use crate::query::{ResultWindow, SortDirection};
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;

    fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn paths(request: &FindRequest) -> Vec<String> {
        request.filters.iter().map(|f| f.path.to_string()).collect()
    }

    #[test]
    fn reserved_params_and_filters_in_order() {
        let schema = inventory::schema().unwrap();
        let spool = schema.entity_by_name("spool").unwrap();
        let request = parse_find_request(
            &schema,
            spool,
            &params(&[
                ("vendor_name", "prusa"),
                ("sort", "filament_name:desc,id:asc"),
                ("limit", "10"),
                ("location", "shelf"),
                ("offset", "20"),
            ]),
        )
        .unwrap();
        assert_eq!(paths(&request), ["filament.vendor.name", "location", "archived"]);
        assert_eq!(request.filters[2].value.as_deref(), Some("false"));
        assert_eq!(request.window, ResultWindow::new(Some(10), 20));
        let keys: Vec<(String, SortDirection)> = request
            .sorts
            .keys()
            .iter()
            .map(|k| (k.path.to_string(), k.direction))
            .collect();
        assert_eq!(
            keys,
            [
                ("filament.name".to_string(), SortDirection::Desc),
                ("id".to_string(), SortDirection::Asc)
            ]
        );
    }

    #[test]
    fn allow_archived_drops_the_archive_filter() {
        let schema = inventory::schema().unwrap();
        let spool = schema.entity_by_name("spool").unwrap();
        let request = parse_find_request(&schema, spool, &params(&[("allow_archived", "true")])).unwrap();
        assert!(request.filters.is_empty());
    }

    #[test]
    fn entities_without_archive_flag_get_no_filter() {
        let schema = inventory::schema().unwrap();
        let vendor = schema.entity_by_name("vendor").unwrap();
        let request = parse_find_request(&schema, vendor, &[]).unwrap();
        assert!(request.filters.is_empty());
        assert_eq!(request.window, ResultWindow::default());
    }

    #[test]
    fn window_accepts_the_bigint_maximum() {
        let schema = inventory::schema().unwrap();
        let spool = schema.entity_by_name("spool").unwrap();
        let max = i64::MAX.to_string();
        let request = parse_find_request(&schema, spool, &params(&[("limit", &max), ("offset", &max)])).unwrap();
        assert_eq!(request.window, ResultWindow::new(Some(i64::MAX as u64), i64::MAX as u64));
        assert_matches!(
            parse_find_request(&schema, spool, &params(&[("limit", "9223372036854775808")])),
            Err(AppError::BadRequest(msg)) if msg.contains("limit")
        );
    }

    #[test]
    fn bad_params_are_rejected() {
        let schema = inventory::schema().unwrap();
        let spool = schema.entity_by_name("spool").unwrap();
        assert_matches!(
            parse_find_request(&schema, spool, &params(&[("limit", "-1")])),
            Err(AppError::BadRequest(_))
        );
        assert_matches!(
            parse_find_request(&schema, spool, &params(&[("offset", "9223372036854775808")])),
            Err(AppError::BadRequest(_))
        );
        assert_matches!(
            parse_find_request(&schema, spool, &params(&[("allow_archived", "maybe")])),
            Err(AppError::BadRequest(_))
        );
        assert_matches!(
            parse_find_request(&schema, spool, &params(&[("colour", "red")])),
            Err(AppError::Query(QueryError::UnknownField { .. }))
        );
        assert_matches!(
            parse_find_request(&schema, spool, &params(&[("sort", "id:sideways")])),
            Err(AppError::Query(QueryError::InvalidSortDirection(_)))
        );
    }
}
