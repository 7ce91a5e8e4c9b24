//! Query execution seam: the HTTP layer talks to a `QueryExecutor`, PostgreSQL is one implementation.

use crate::config::{EntityType, FieldKind, SchemaGraph};
use crate::error::AppError;
use crate::query::{CountQuery, RowQuery};
use crate::sql::{count_rows, select_rows, QueryBuf};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Rows as JSON objects: one key per scalar field plus one per embedded relation.
    async fn fetch_rows(&self, schema: &SchemaGraph, query: &RowQuery) -> Result<Vec<Value>, AppError>;

    async fn count(&self, schema: &SchemaGraph, query: &CountQuery) -> Result<u64, AppError>;

    /// Storage reachability, behind `GET /ready`.
    async fn ping(&self) -> Result<(), AppError>;
}

pub struct PgExecutor {
    pool: PgPool,
}

impl PgExecutor {
    pub fn new(pool: PgPool) -> Self {
        PgExecutor { pool }
    }

    fn bound<'q>(q: &'q QueryBuf) -> sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(p.clone());
        }
        query
    }
}

#[async_trait]
impl QueryExecutor for PgExecutor {
    async fn fetch_rows(&self, schema: &SchemaGraph, query: &RowQuery) -> Result<Vec<Value>, AppError> {
        let entity = schema.entity(query.root);
        let q = select_rows(schema, query)?;
        let rows = Self::bound(&q).fetch_all(&self.pool).await?;
        rows.iter().map(|r| row_to_json(entity, r)).collect()
    }

    async fn count(&self, schema: &SchemaGraph, query: &CountQuery) -> Result<u64, AppError> {
        let q = count_rows(schema, query);
        let row = Self::bound(&q).fetch_one(&self.pool).await?;
        let n: i64 = row.try_get(0)?;
        Ok(n.max(0) as u64)
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Decode by declared field type; the renderer casts every column to one Rust type per kind.
fn row_to_json(entity: &EntityType, row: &PgRow) -> Result<Value, AppError> {
    let mut map = serde_json::Map::new();
    for field in &entity.fields {
        let name = field.name.as_str();
        let v = match field.ty.kind() {
            FieldKind::Integer => row.try_get::<Option<i64>, _>(name)?.map(Value::from),
            FieldKind::Float => row
                .try_get::<Option<f64>, _>(name)?
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number),
            FieldKind::Boolean => row.try_get::<Option<bool>, _>(name)?.map(Value::Bool),
            FieldKind::String => row.try_get::<Option<String>, _>(name)?.map(Value::String),
            FieldKind::Timestamp => row
                .try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(name)?
                .map(|d| Value::String(d.to_rfc3339())),
        };
        map.insert(name.to_string(), v.unwrap_or(Value::Null));
    }
    for relation in &entity.relations {
        if let Some(v) = embedded(row.try_get::<Option<Value>, _>(relation.name.as_str()))? {
            map.insert(relation.name.clone(), v.unwrap_or(Value::Null));
        }
    }
    Ok(Value::Object(map))
}

/// A relation column is absent once the embed depth runs out; any other failure is an error.
fn embedded(got: Result<Option<Value>, sqlx::Error>) -> Result<Option<Option<Value>>, AppError> {
    match got {
        Ok(v) => Ok(Some(v)),
        Err(sqlx::Error::ColumnNotFound(_)) => Ok(None),
        Err(e) => Err(e.into()),
    }
}
