//! Field paths and their resolution against the schema graph.

use crate::config::{EntityId, EntityType, ExprPart, FieldSource, ScalarType, SchemaGraph};
use crate::error::QueryError;
use std::fmt;

/// Dotted sequence of names: zero or more relation hops, then a scalar field.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    pub fn parse(dotted: &str) -> Self {
        FieldPath {
            segments: dotted.split('.').map(str::to_string).collect(),
        }
    }

    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FieldPath {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    fn prefixed(mut self, relation: &str) -> Self {
        self.segments.insert(0, relation.to_string());
        self
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

/// One relation traversal: from the current entity to `target` via `foreign_key = target_key`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Hop {
    pub relation: String,
    pub target: EntityId,
    pub foreign_key: String,
    pub target_key: String,
    pub optional: bool,
}

/// Where a resolved field's value comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ColumnSource {
    Column(String),
    /// SQL fragments interleaved with the stored columns they read, in expression order.
    Computed(Vec<ComputedPart>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ComputedPart {
    Sql(String),
    Column(ColumnRef),
}

/// A scalar field reached from a root entity, with its declared semantic type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnRef {
    path: FieldPath,
    hops: Vec<Hop>,
    field: String,
    source: ColumnSource,
    ty: ScalarType,
}

impl ColumnRef {
    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    /// Relation hops from the root, outermost first.
    pub fn hops(&self) -> &[Hop] {
        &self.hops
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn source(&self) -> &ColumnSource {
        &self.source
    }

    pub fn ty(&self) -> ScalarType {
        self.ty
    }

    /// Relation paths that must be joined to read this value.
    pub fn hop_chains(&self) -> Vec<&[Hop]> {
        match &self.source {
            ColumnSource::Column(_) => vec![self.hops()],
            ColumnSource::Computed(parts) => parts
                .iter()
                .filter_map(|p| match p {
                    ComputedPart::Column(c) => Some(c.hops()),
                    ComputedPart::Sql(_) => None,
                })
                .collect(),
        }
    }
}

fn unknown_field(entity: &EntityType, path: &FieldPath) -> QueryError {
    QueryError::UnknownField {
        entity: entity.name.clone(),
        field: path.to_string(),
    }
}

/// Resolve `path` starting at `root`.
///
/// Every segment but the last must name a relation, the last a scalar field. The type is
/// the field's declared type; a missing related row makes every column read NULL, which
/// the predicate builders leave to SQL comparison semantics.
pub fn resolve(schema: &SchemaGraph, root: EntityId, path: &FieldPath) -> Result<ColumnRef, QueryError> {
    resolve_inner(schema, root, path, true)
}

fn resolve_inner(
    schema: &SchemaGraph,
    root: EntityId,
    path: &FieldPath,
    allow_computed: bool,
) -> Result<ColumnRef, QueryError> {
    let mut entity = schema.entity(root);
    let Some((last, relations)) = path.segments().split_last() else {
        return Err(unknown_field(entity, path));
    };

    let mut hops = Vec::with_capacity(relations.len());
    for segment in relations {
        let relation = entity.relation(segment).ok_or_else(|| unknown_field(entity, path))?;
        hops.push(Hop {
            relation: relation.name.clone(),
            target: relation.target,
            foreign_key: relation.foreign_key.clone(),
            target_key: relation.target_key.clone(),
            optional: relation.optional,
        });
        entity = schema.entity(relation.target);
    }

    let Some(field) = entity.field(last) else {
        if entity.relation(last).is_some() {
            return Err(QueryError::EmptyRelationPath {
                entity: entity.name.clone(),
                relation: last.clone(),
            });
        }
        return Err(unknown_field(entity, path));
    };

    let source = match &field.source {
        FieldSource::Column(c) => ColumnSource::Column(c.clone()),
        // computed fields read stored columns only, so resolution cannot cycle
        FieldSource::Computed(_) if !allow_computed => return Err(unknown_field(entity, path)),
        FieldSource::Computed(expr) => ColumnSource::Computed(
            expr.iter()
                .map(|part| match part {
                    ExprPart::Sql(sql) => Ok(ComputedPart::Sql(sql.clone())),
                    ExprPart::Field(inner) => {
                        let segments = relations.iter().cloned().chain(FieldPath::parse(inner).segments);
                        let inner = FieldPath::from_segments(segments);
                        resolve_inner(schema, root, &inner, false).map(ComputedPart::Column)
                    }
                })
                .collect::<Result<Vec<_>, _>>()?,
        ),
    };

    Ok(ColumnRef {
        path: path.clone(),
        hops,
        field: field.name.clone(),
        source,
        ty: field.ty,
    })
}

/// Map a query-parameter name to a field path.
///
/// A declared alias wins, dotted or not. Other dotted names are taken as-is. Otherwise,
/// in order: a scalar field of the same name, or `<relation>_<rest>` with `rest` resolved
/// on the relation's target.
pub fn canonical_path(schema: &SchemaGraph, root: EntityId, name: &str) -> Result<FieldPath, QueryError> {
    let entity = schema.entity(root);
    if let Some(target) = entity.aliases.get(name) {
        return Ok(FieldPath::parse(target));
    }
    if name.contains('.') {
        return Ok(FieldPath::parse(name));
    }
    if entity.field(name).is_some() {
        return Ok(FieldPath::from_segments([name]));
    }
    if entity.relation(name).is_some() {
        return Err(QueryError::EmptyRelationPath {
            entity: entity.name.clone(),
            relation: name.to_string(),
        });
    }

    let mut fallback = None;
    for relation in &entity.relations {
        let Some(rest) = name
            .strip_prefix(relation.name.as_str())
            .and_then(|r| r.strip_prefix('_'))
        else {
            continue;
        };
        match canonical_path(schema, relation.target, rest) {
            Ok(inner) => return Ok(inner.prefixed(&relation.name)),
            Err(e @ QueryError::EmptyRelationPath { .. }) => {
                fallback.get_or_insert(e);
            }
            Err(_) => {}
        }
    }
    Err(fallback.unwrap_or_else(|| QueryError::UnknownField {
        entity: entity.name.clone(),
        field: name.to_string(),
    }))
}
