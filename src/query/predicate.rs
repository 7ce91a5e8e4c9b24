//! Storage-independent boolean predicate tree.

use crate::query::ColumnRef;
use chrono::{DateTime, Utc};

#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Timestamp(DateTime<Utc>),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Predicate {
    Eq(ColumnRef, Literal),
    IsNull(ColumnRef),
    /// Case-insensitive substring containment.
    Contains(ColumnRef, String),
    In(ColumnRef, Vec<Literal>),
    Or(Vec<Predicate>),
    And(Vec<Predicate>),
}

impl Predicate {
    /// OR of the alternatives; a single alternative stands on its own.
    pub fn any(mut alternatives: Vec<Predicate>) -> Predicate {
        if alternatives.len() == 1 {
            alternatives.remove(0)
        } else {
            Predicate::Or(alternatives)
        }
    }

    /// AND of the parts, in order. No parts means no predicate.
    pub fn all(mut parts: Vec<Predicate>) -> Option<Predicate> {
        match parts.len() {
            0 => None,
            1 => Some(parts.remove(0)),
            _ => Some(Predicate::And(parts)),
        }
    }

    /// Columns referenced by this predicate, depth-first in construction order.
    pub fn columns(&self) -> Vec<&ColumnRef> {
        let mut out = Vec::new();
        self.collect_columns(&mut out);
        out
    }

    fn collect_columns<'a>(&'a self, out: &mut Vec<&'a ColumnRef>) {
        match self {
            Predicate::Eq(c, _) | Predicate::IsNull(c) | Predicate::Contains(c, _) | Predicate::In(c, _) => out.push(c),
            Predicate::Or(parts) | Predicate::And(parts) => {
                for p in parts {
                    p.collect_columns(out);
                }
            }
        }
    }
}
