//! Predicate construction from raw filter values, one builder per semantic type.

use crate::config::ScalarType;
use crate::error::QueryError;
use crate::query::{ColumnRef, FieldPath, Literal, Predicate};
use chrono::{DateTime, NaiveDateTime, Utc};

/// Integer filter value meaning "field is null".
pub const NULL_SENTINEL: i64 = -1;

/// One filter parameter. `value: None` means the filter was not supplied at all.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilterSpec {
    pub path: FieldPath,
    pub value: Option<String>,
}

impl FilterSpec {
    pub fn new(path: FieldPath, value: impl Into<String>) -> Self {
        FilterSpec {
            path,
            value: Some(value.into()),
        }
    }

    pub fn unset(path: FieldPath) -> Self {
        FilterSpec { path, value: None }
    }
}

/// Build the predicate for one filter value. `None` input yields no predicate.
pub fn build_predicate(column: &ColumnRef, raw: Option<&str>) -> Result<Option<Predicate>, QueryError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let predicate = match column.ty() {
        ScalarType::Text => Some(text_predicate(column, raw, false)),
        ScalarType::NullableText => Some(text_predicate(column, raw, true)),
        ScalarType::Integer => Some(integer_predicate(column, raw)?),
        ScalarType::NullableInteger => Some(nullable_integer_predicate(column, raw)?),
        ScalarType::NullableBoolean => nullable_boolean_predicate(column, raw)?,
        ScalarType::Float
        | ScalarType::NullableFloat
        | ScalarType::Boolean
        | ScalarType::Timestamp
        | ScalarType::NullableTimestamp => membership_predicate(column, parse_list(column, raw)?),
    };
    Ok(predicate)
}

/// `"abc"` -> `abc`. Needs both quotes, so a lone `"` is not quoted.
fn quoted_inner(part: &str) -> Option<&str> {
    if part.len() >= 2 && part.starts_with('"') && part.ends_with('"') {
        Some(&part[1..part.len() - 1])
    } else {
        None
    }
}

fn empty_text(column: &ColumnRef, nullable: bool) -> Predicate {
    let is_empty = Predicate::Eq(column.clone(), Literal::Text(String::new()));
    if nullable {
        Predicate::Or(vec![Predicate::IsNull(column.clone()), is_empty])
    } else {
        is_empty
    }
}

fn text_predicate(column: &ColumnRef, raw: &str, nullable: bool) -> Predicate {
    let alternatives = raw
        .split(',')
        .map(|part| match quoted_inner(part) {
            _ if part.is_empty() => empty_text(column, nullable),
            Some("") => empty_text(column, nullable),
            Some(inner) => Predicate::Eq(column.clone(), Literal::Text(inner.to_string())),
            None => Predicate::Contains(column.clone(), part.to_string()),
        })
        .collect();
    Predicate::any(alternatives)
}

fn parse_integer(column: &ColumnRef, part: &str) -> Result<i64, QueryError> {
    part.trim().parse().map_err(|_| invalid(column, part, "an integer"))
}

fn integer_predicate(column: &ColumnRef, raw: &str) -> Result<Predicate, QueryError> {
    let values = raw
        .split(',')
        .map(|part| parse_integer(column, part).map(Literal::Integer))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Predicate::In(column.clone(), values))
}

fn nullable_integer_predicate(column: &ColumnRef, raw: &str) -> Result<Predicate, QueryError> {
    let alternatives = raw
        .split(',')
        .map(|part| {
            parse_integer(column, part).map(|n| match n {
                NULL_SENTINEL => Predicate::IsNull(column.clone()),
                n => Predicate::Eq(column.clone(), Literal::Integer(n)),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Predicate::any(alternatives))
}

/// An unset flag reads as false, so `false` also matches NULL.
fn nullable_boolean_predicate(column: &ColumnRef, raw: &str) -> Result<Option<Predicate>, QueryError> {
    let alternatives: Vec<Predicate> = parse_list(column, raw)?
        .into_iter()
        .map(|value| match value {
            Literal::Boolean(false) => Predicate::Or(vec![
                Predicate::Eq(column.clone(), Literal::Boolean(false)),
                Predicate::IsNull(column.clone()),
            ]),
            other => Predicate::Eq(column.clone(), other),
        })
        .collect();
    if alternatives.is_empty() {
        Ok(None)
    } else {
        Ok(Some(Predicate::any(alternatives)))
    }
}

/// `column IN (values)`, or no predicate at all for an empty list.
pub fn membership_predicate(column: &ColumnRef, values: Vec<Literal>) -> Option<Predicate> {
    if values.is_empty() {
        None
    } else {
        Some(Predicate::In(column.clone(), values))
    }
}

/// Parse the non-empty comma-separated parts as literals of the column's type.
fn parse_list(column: &ColumnRef, raw: &str) -> Result<Vec<Literal>, QueryError> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| parse_literal(column, part))
        .collect()
}

pub fn parse_literal(column: &ColumnRef, part: &str) -> Result<Literal, QueryError> {
    match column.ty() {
        ScalarType::Text | ScalarType::NullableText => Ok(Literal::Text(part.to_string())),
        ScalarType::Integer | ScalarType::NullableInteger => parse_integer(column, part).map(Literal::Integer),
        ScalarType::Float | ScalarType::NullableFloat => part
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(Literal::Float)
            .ok_or_else(|| invalid(column, part, "a number")),
        ScalarType::Boolean | ScalarType::NullableBoolean => parse_bool(part)
            .map(Literal::Boolean)
            .ok_or_else(|| invalid(column, part, "true or false")),
        ScalarType::Timestamp | ScalarType::NullableTimestamp => parse_timestamp(part)
            .map(Literal::Timestamp)
            .ok_or_else(|| invalid(column, part, "an RFC 3339 timestamp")),
    }
}

pub fn parse_bool(s: &str) -> Option<bool> {
    if s.eq_ignore_ascii_case("true") || s == "1" {
        Some(true)
    } else if s.eq_ignore_ascii_case("false") || s == "0" {
        Some(false)
    } else {
        None
    }
}

/// RFC 3339, or a zone-less `YYYY-MM-DDTHH:MM:SS[.f]` taken as UTC.
fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Some(t.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|t| t.and_utc())
}

fn invalid(column: &ColumnRef, value: &str, expected: &'static str) -> QueryError {
    QueryError::InvalidFilterValue {
        field: column.path().to_string(),
        value: value.to_string(),
        expected,
    }
}
