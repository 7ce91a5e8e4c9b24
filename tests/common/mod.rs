//! In-memory `QueryExecutor` and fixtures for router tests.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{DateTime, Utc};
use inventory_api::config::{inventory, SchemaGraph};
use inventory_api::query::{ColumnRef, CountQuery, Literal, Predicate, RowQuery, SortDirection};
use inventory_api::{app, AppError, AppState, QueryExecutor};
use serde_json::{json, Value};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering as AtomicOrdering};
use std::sync::Arc;
use tower::ServiceExt;

/// Evaluates predicates and orderings over nested JSON rows, keyed by entity name.
#[derive(Default)]
pub struct MemoryExecutor {
    rows: HashMap<String, Vec<Value>>,
    pub calls: AtomicUsize,
    pub down: AtomicBool,
}

impl MemoryExecutor {
    pub fn new(rows: HashMap<String, Vec<Value>>) -> Self {
        MemoryExecutor {
            rows,
            ..Default::default()
        }
    }

    fn matching(&self, schema: &SchemaGraph, root: inventory_api::config::EntityId, filter: Option<&Predicate>) -> Vec<Value> {
        let name = &schema.entity(root).name;
        self.rows
            .get(name)
            .map(|rows| {
                rows.iter()
                    .filter(|row| filter.map_or(true, |p| eval(p, row)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    fn storage(&self) -> Result<(), AppError> {
        self.calls.fetch_add(1, AtomicOrdering::SeqCst);
        if self.down.load(AtomicOrdering::SeqCst) {
            return Err(AppError::Db(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl QueryExecutor for MemoryExecutor {
    async fn fetch_rows(&self, schema: &SchemaGraph, query: &RowQuery) -> Result<Vec<Value>, AppError> {
        self.storage()?;
        let mut rows = self.matching(schema, query.root, query.filter.as_ref());
        rows.sort_by(|a, b| {
            for term in query.ordering.terms() {
                let ord = compare(lookup(a, &term.column), lookup(b, &term.column));
                let ord = match term.direction {
                    SortDirection::Asc => ord,
                    SortDirection::Desc => ord.reverse(),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            Ordering::Equal
        });
        let skipped = rows.into_iter().skip(query.window.offset as usize);
        Ok(match query.window.limit {
            Some(n) => skipped.take(n as usize).collect(),
            None => skipped.collect(),
        })
    }

    async fn count(&self, schema: &SchemaGraph, query: &CountQuery) -> Result<u64, AppError> {
        self.storage()?;
        Ok(self.matching(schema, query.root, query.filter.as_ref()).len() as u64)
    }

    async fn ping(&self) -> Result<(), AppError> {
        self.storage()
    }
}

/// Follow the column's relation hops, then read the field. Indexing through a missing
/// related row (null) yields null.
fn lookup<'a>(row: &'a Value, column: &ColumnRef) -> &'a Value {
    let related = column
        .hops()
        .iter()
        .fold(row, |current, hop| &current[hop.relation.as_str()]);
    &related[column.field()]
}

fn equals(value: &Value, literal: &Literal) -> bool {
    match literal {
        Literal::Text(s) => value.as_str() == Some(s.as_str()),
        Literal::Integer(n) => value.as_i64() == Some(*n),
        Literal::Float(f) => value.as_f64() == Some(*f),
        Literal::Boolean(b) => value.as_bool() == Some(*b),
        Literal::Timestamp(t) => value
            .as_str()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|d| d.with_timezone(&Utc))
            == Some(*t),
    }
}

/// Comparisons against NULL are false, like SQL.
fn eval(predicate: &Predicate, row: &Value) -> bool {
    match predicate {
        Predicate::Eq(c, lit) => equals(lookup(row, c), lit),
        Predicate::IsNull(c) => lookup(row, c).is_null(),
        Predicate::Contains(c, needle) => lookup(row, c)
            .as_str()
            .map_or(false, |s| s.to_lowercase().contains(&needle.to_lowercase())),
        Predicate::In(c, values) => values.iter().any(|lit| equals(lookup(row, c), lit)),
        Predicate::Or(parts) => parts.iter().any(|p| eval(p, row)),
        Predicate::And(parts) => parts.iter().all(|p| eval(p, row)),
    }
}

/// Ascending order with nulls last.
fn compare(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Greater,
        (_, Value::Null) => Ordering::Less,
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

pub fn vendors() -> Vec<Value> {
    vec![
        json!({"id": 1, "registered": "2024-01-01T10:00:00+00:00", "name": "Prusa", "comment": null, "empty_spool_weight": 200.0, "external_id": null}),
        json!({"id": 2, "registered": "2024-01-02T10:00:00+00:00", "name": "eSun", "comment": "cheap", "empty_spool_weight": null, "external_id": null}),
    ]
}

fn filament(id: i64, name: &str, material: &str, vendor: Option<&Value>) -> Value {
    json!({
        "id": id,
        "registered": "2024-01-03T10:00:00+00:00",
        "name": name,
        "vendor_id": vendor.map(|v| v["id"].clone()),
        "material": material,
        "density": 1.24,
        "diameter": 1.75,
        "vendor": vendor.cloned(),
    })
}

pub fn filaments() -> Vec<Value> {
    let v = vendors();
    vec![
        filament(1, "Galaxy Black", "PLA", Some(&v[0])),
        filament(2, "Fire Red", "PETG", Some(&v[1])),
        filament(3, "Mystery", "PLA", None),
    ]
}

/// Grams of filament to millimetres, as the computed length fields do it.
fn length(weight: f64, filament: &Value) -> f64 {
    let density = filament["density"].as_f64().unwrap();
    let radius = filament["diameter"].as_f64().unwrap() / 2.0;
    weight / density * 1000.0 / (std::f64::consts::PI * radius * radius)
}

fn spool(
    id: i64,
    filament: &Value,
    (initial_weight, used_weight): (Option<f64>, f64),
    location: Option<&str>,
    archived: Option<bool>,
) -> Value {
    let remaining_weight = initial_weight.map(|w| (w - used_weight).max(0.0));
    json!({
        "id": id,
        "registered": format!("2024-02-0{}T12:00:00+00:00", id),
        "first_used": null,
        "last_used": null,
        "filament_id": filament["id"].clone(),
        "initial_weight": initial_weight,
        "used_weight": used_weight,
        "location": location,
        "lot_nr": null,
        "archived": archived,
        "remaining_weight": remaining_weight,
        "used_length": length(used_weight, filament),
        "remaining_length": remaining_weight.map(|w| length(w, filament)),
        "filament": filament.clone(),
    })
}

/// Five active spools (ids 1..5) plus archived spool 6. Remaining weight of the active
/// ones: 1000, 0, unknown, 250, 750.
pub fn spools() -> Vec<Value> {
    let f = filaments();
    vec![
        spool(1, &f[0], (Some(1000.0), 0.0), Some("Shelf A"), None),
        spool(2, &f[1], (Some(1000.0), 1000.0), Some("Shelf B"), Some(false)),
        spool(3, &f[2], (None, 0.0), None, None),
        spool(4, &f[0], (Some(1250.0), 1000.0), Some(""), Some(false)),
        spool(5, &f[1], (Some(750.0), 0.0), Some("Drybox"), None),
        spool(6, &f[0], (Some(1000.0), 250.0), Some("Shelf A"), Some(true)),
    ]
}

pub fn executor() -> MemoryExecutor {
    MemoryExecutor::new(HashMap::from([
        ("vendor".to_string(), vendors()),
        ("filament".to_string(), filaments()),
        ("spool".to_string(), spools()),
    ]))
}

pub fn router_with(executor: Arc<MemoryExecutor>) -> Router {
    let state = AppState {
        schema: Arc::new(inventory::schema().unwrap()),
        executor,
    };
    app(state)
}

pub fn router() -> Router {
    router_with(Arc::new(executor()))
}

pub struct TestResponse {
    pub status: StatusCode,
    pub total_count: Option<u64>,
    pub body: Value,
}

impl TestResponse {
    pub fn ids(&self) -> Vec<i64> {
        self.body
            .as_array()
            .expect("array body")
            .iter()
            .map(|row| row["id"].as_i64().unwrap())
            .collect()
    }

    pub fn error_code(&self) -> &str {
        self.body["error"]["code"].as_str().unwrap_or_default()
    }
}

pub async fn get(router: Router, uri: &str) -> TestResponse {
    let res = router
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = res.status();
    let total_count = res
        .headers()
        .get("x-total-count")
        .map(|v| v.to_str().unwrap().parse().unwrap());
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    TestResponse {
        status,
        total_count,
        body,
    }
}
