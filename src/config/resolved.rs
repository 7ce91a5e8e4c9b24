//! Resolved schema graph: config validated and flattened into lookup tables for runtime use.
//!
//! Built once at startup and shared read-only (`Arc<SchemaGraph>`); nothing mutates it afterwards.

use crate::config::FieldKind;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Index of an entity inside its [`SchemaGraph`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EntityId(pub(crate) usize);

/// Semantic type of a scalar field. Predicate construction dispatches on this tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScalarType {
    Text,
    NullableText,
    Integer,
    NullableInteger,
    Float,
    NullableFloat,
    Boolean,
    NullableBoolean,
    Timestamp,
    NullableTimestamp,
}

impl ScalarType {
    pub fn new(kind: FieldKind, nullable: bool) -> Self {
        let ty = match kind {
            FieldKind::String => ScalarType::Text,
            FieldKind::Integer => ScalarType::Integer,
            FieldKind::Float => ScalarType::Float,
            FieldKind::Boolean => ScalarType::Boolean,
            FieldKind::Timestamp => ScalarType::Timestamp,
        };
        if nullable {
            ty.nullable()
        } else {
            ty
        }
    }

    /// Same type, allowing NULL.
    pub fn nullable(self) -> Self {
        match self {
            ScalarType::Text => ScalarType::NullableText,
            ScalarType::Integer => ScalarType::NullableInteger,
            ScalarType::Float => ScalarType::NullableFloat,
            ScalarType::Boolean => ScalarType::NullableBoolean,
            ScalarType::Timestamp => ScalarType::NullableTimestamp,
            other => other,
        }
    }

    pub fn is_nullable(self) -> bool {
        self.nullable() == self
    }

    pub fn kind(self) -> FieldKind {
        match self {
            ScalarType::Text | ScalarType::NullableText => FieldKind::String,
            ScalarType::Integer | ScalarType::NullableInteger => FieldKind::Integer,
            ScalarType::Float | ScalarType::NullableFloat => FieldKind::Float,
            ScalarType::Boolean | ScalarType::NullableBoolean => FieldKind::Boolean,
            ScalarType::Timestamp | ScalarType::NullableTimestamp => FieldKind::Timestamp,
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self.kind() {
            FieldKind::String => "string",
            FieldKind::Integer => "integer",
            FieldKind::Float => "float",
            FieldKind::Boolean => "boolean",
            FieldKind::Timestamp => "timestamp",
        };
        if self.is_nullable() {
            write!(f, "nullable {}", name)
        } else {
            f.write_str(name)
        }
    }
}

/// Piece of a computed-field expression: raw SQL, or a `{path}` placeholder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExprPart {
    Sql(String),
    Field(String),
}

/// Split `GREATEST({initial_weight} - {used_weight}, 0)` into SQL text and field placeholders.
pub fn parse_expression(expr: &str) -> Result<Vec<ExprPart>, String> {
    let mut parts = Vec::new();
    let mut rest = expr;
    while let Some(open) = rest.find(&['{', '}'][..]) {
        if rest[open..].starts_with('}') {
            return Err(format!("unmatched '}}' in '{}'", expr));
        }
        let Some(close) = rest[open + 1..].find(&['{', '}'][..]).map(|i| open + 1 + i) else {
            return Err(format!("unclosed '{{' in '{}'", expr));
        };
        if rest[close..].starts_with('{') {
            return Err(format!("nested '{{' in '{}'", expr));
        }
        let path = rest[open + 1..close].trim();
        if path.is_empty() {
            return Err(format!("empty placeholder in '{}'", expr));
        }
        if open > 0 {
            parts.push(ExprPart::Sql(rest[..open].to_string()));
        }
        parts.push(ExprPart::Field(path.to_string()));
        rest = &rest[close + 1..];
    }
    if !rest.is_empty() {
        parts.push(ExprPart::Sql(rest.to_string()));
    }
    if !parts.iter().any(|p| matches!(p, ExprPart::Field(_))) {
        return Err(format!("expression '{}' references no field", expr));
    }
    Ok(parts)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldSource {
    Column(String),
    /// Read-only value computed from other columns of the same row or its relations.
    Computed(Vec<ExprPart>),
}

#[derive(Clone, Debug)]
pub struct ScalarField {
    pub name: String,
    pub source: FieldSource,
    pub ty: ScalarType,
}

impl ScalarField {
    /// Stored column, `None` for computed fields.
    pub fn column(&self) -> Option<&str> {
        match &self.source {
            FieldSource::Column(c) => Some(c),
            FieldSource::Computed(_) => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct RelationField {
    pub name: String,
    pub target: EntityId,
    /// Column on the owning entity.
    pub foreign_key: String,
    /// Column on the target entity.
    pub target_key: String,
    pub optional: bool,
}

#[derive(Clone, Debug)]
pub struct EntityType {
    pub id: EntityId,
    pub name: String,
    pub schema_name: String,
    pub table_name: String,
    pub path_segment: String,
    pub primary_key: String,
    pub fields: Vec<ScalarField>,
    pub relations: Vec<RelationField>,
    /// Flat parameter name -> dotted field path.
    pub aliases: BTreeMap<String, String>,
    pub archive_flag: Option<String>,
    pub(crate) field_index: HashMap<String, usize>,
    pub(crate) relation_index: HashMap<String, usize>,
}

impl EntityType {
    pub fn field(&self, name: &str) -> Option<&ScalarField> {
        self.field_index.get(name).map(|&i| &self.fields[i])
    }

    pub fn relation(&self, name: &str) -> Option<&RelationField> {
        self.relation_index.get(name).map(|&i| &self.relations[i])
    }

    pub fn primary_key_field(&self) -> Option<&ScalarField> {
        self.field(&self.primary_key)
    }
}

#[derive(Clone, Debug)]
pub struct SchemaGraph {
    pub(crate) entities: Vec<EntityType>,
    pub(crate) by_name: HashMap<String, EntityId>,
    pub(crate) by_path: HashMap<String, EntityId>,
}

impl SchemaGraph {
    pub fn entity(&self, id: EntityId) -> &EntityType {
        &self.entities[id.0]
    }

    pub fn entity_by_name(&self, name: &str) -> Option<&EntityType> {
        self.by_name.get(name).map(|&id| self.entity(id))
    }

    pub fn entity_by_path(&self, path: &str) -> Option<&EntityType> {
        self.by_path.get(path).map(|&id| self.entity(id))
    }

    pub fn entities(&self) -> impl Iterator<Item = &EntityType> {
        self.entities.iter()
    }
}
