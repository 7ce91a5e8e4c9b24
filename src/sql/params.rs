//! Convert query literals to values that sqlx can bind.

use crate::query::Literal;
use chrono::{DateTime, Utc};
use sqlx::encode::{Encode, IsNull};
use sqlx::postgres::{PgTypeInfo, Postgres};
use sqlx::Database;

/// A value bound to a PostgreSQL query parameter.
#[derive(Clone, Debug, PartialEq)]
pub enum PgBindValue {
    Bool(bool),
    I64(i64),
    F64(f64),
    String(String),
    Timestamp(DateTime<Utc>),
}

impl From<&Literal> for PgBindValue {
    fn from(v: &Literal) -> Self {
        match v {
            Literal::Text(s) => PgBindValue::String(s.clone()),
            Literal::Integer(n) => PgBindValue::I64(*n),
            Literal::Float(f) => PgBindValue::F64(*f),
            Literal::Boolean(b) => PgBindValue::Bool(*b),
            Literal::Timestamp(t) => PgBindValue::Timestamp(*t),
        }
    }
}

impl<'q> Encode<'q, Postgres> for PgBindValue {
    fn encode_by_ref(
        &self,
        buf: &mut <Postgres as Database>::ArgumentBuffer<'q>,
    ) -> Result<IsNull, Box<dyn std::error::Error + Send + Sync>> {
        match self {
            PgBindValue::Bool(b) => <bool as Encode<Postgres>>::encode_by_ref(b, buf),
            PgBindValue::I64(n) => <i64 as Encode<Postgres>>::encode_by_ref(n, buf),
            PgBindValue::F64(n) => <f64 as Encode<Postgres>>::encode_by_ref(n, buf),
            PgBindValue::String(s) => {
                let s_ref: &str = s.as_str();
                <&str as Encode<Postgres>>::encode_by_ref(&s_ref, buf)
            }
            PgBindValue::Timestamp(t) => <DateTime<Utc> as Encode<Postgres>>::encode_by_ref(t, buf),
        }
    }

    fn produces(&self) -> Option<PgTypeInfo> {
        Some(match self {
            PgBindValue::Bool(_) => PgTypeInfo::with_name("BOOL"),
            PgBindValue::I64(_) => PgTypeInfo::with_name("INT8"),
            PgBindValue::F64(_) => PgTypeInfo::with_name("FLOAT8"),
            PgBindValue::String(_) => PgTypeInfo::with_name("TEXT"),
            PgBindValue::Timestamp(_) => PgTypeInfo::with_name("TIMESTAMPTZ"),
        })
    }
}

impl sqlx::Type<Postgres> for PgBindValue {
    fn type_info() -> PgTypeInfo {
        PgTypeInfo::with_name("TEXT")
    }
}
