//! Renders row and count queries to parameterized PostgreSQL.

use crate::config::{EntityType, FieldKind, RelationField, SchemaGraph};
use crate::error::QueryError;
use crate::query::{
    resolve, ColumnRef, ColumnSource, ComputedPart, CountQuery, FieldPath, Hop, Predicate, RowQuery, SortDirection,
};
use crate::sql::PgBindValue;

const MAIN_ALIAS: &str = "main";

/// How many relation levels are embedded as nested JSON objects in each row.
const MAX_EMBED_DEPTH: usize = 3;

/// Quote identifier for PostgreSQL (safe: only from schema config).
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

fn qualified_table(entity: &EntityType) -> String {
    format!("{}.{}", quoted(&entity.schema_name), quoted(&entity.table_name))
}

#[derive(Debug, Default)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<PgBindValue>,
}

impl QueryBuf {
    fn new() -> Self {
        Self::default()
    }

    fn push_param(&mut self, v: PgBindValue) -> usize {
        self.params.push(v);
        self.params.len()
    }
}

/// Join alias for the entity reached by `hops` from `base`: `main__filament__vendor`.
fn hop_alias(base: &str, hops: &[Hop]) -> String {
    hops.iter().fold(base.to_string(), |mut alias, hop| {
        alias.push_str("__");
        alias.push_str(&hop.relation);
        alias
    })
}

/// SQL for the column's value; computed fields render as a parenthesized expression.
fn column_expr(base: &str, column: &ColumnRef) -> String {
    match column.source() {
        ColumnSource::Column(c) => format!("{}.{}", quoted(&hop_alias(base, column.hops())), quoted(c)),
        ColumnSource::Computed(parts) => {
            let body: String = parts
                .iter()
                .map(|p| match p {
                    ComputedPart::Sql(sql) => sql.clone(),
                    ComputedPart::Column(c) => column_expr(base, c),
                })
                .collect();
            format!("({})", body)
        }
    }
}

/// LEFT JOIN per distinct relation path, in order of first use.
fn join_clauses<'a>(schema: &SchemaGraph, base: &str, columns: impl IntoIterator<Item = &'a ColumnRef>) -> String {
    let mut seen: Vec<String> = Vec::new();
    let mut out = String::new();
    for column in columns {
        for hops in column.hop_chains() {
            for i in 0..hops.len() {
                let alias = hop_alias(base, &hops[..=i]);
                if seen.contains(&alias) {
                    continue;
                }
                let hop = &hops[i];
                let parent = hop_alias(base, &hops[..i]);
                out.push_str(&format!(
                    " LEFT JOIN {} AS {} ON {}.{} = {}.{}",
                    qualified_table(schema.entity(hop.target)),
                    quoted(&alias),
                    quoted(&alias),
                    quoted(&hop.target_key),
                    quoted(&parent),
                    quoted(&hop.foreign_key)
                ));
                seen.push(alias);
            }
        }
    }
    out
}

/// Escape LIKE wildcards so the needle matches literally.
fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn render_predicate(q: &mut QueryBuf, predicate: &Predicate) -> String {
    match predicate {
        Predicate::Eq(c, v) => {
            let n = q.push_param(v.into());
            format!("{} = ${}", column_expr(MAIN_ALIAS, c), n)
        }
        Predicate::IsNull(c) => format!("{} IS NULL", column_expr(MAIN_ALIAS, c)),
        Predicate::Contains(c, needle) => {
            let n = q.push_param(PgBindValue::String(format!("%{}%", escape_like(needle))));
            format!("{} ILIKE ${}", column_expr(MAIN_ALIAS, c), n)
        }
        Predicate::In(_, values) if values.is_empty() => "FALSE".into(),
        Predicate::In(c, values) => {
            let placeholders: Vec<String> = values
                .iter()
                .map(|v| format!("${}", q.push_param(v.into())))
                .collect();
            format!("{} IN ({})", column_expr(MAIN_ALIAS, c), placeholders.join(", "))
        }
        Predicate::Or(parts) if parts.is_empty() => "FALSE".into(),
        Predicate::Or(parts) => {
            let parts: Vec<String> = parts.iter().map(|p| render_predicate(q, p)).collect();
            format!("({})", parts.join(" OR "))
        }
        Predicate::And(parts) if parts.is_empty() => "TRUE".into(),
        Predicate::And(parts) => {
            let parts: Vec<String> = parts.iter().map(|p| render_predicate(q, p)).collect();
            format!("({})", parts.join(" AND "))
        }
    }
}

/// Casts so the executor can decode every scalar column with one Rust type per kind.
fn decode_cast(kind: FieldKind) -> &'static str {
    match kind {
        FieldKind::Integer => "::int8",
        FieldKind::Float => "::float8",
        FieldKind::Timestamp => "::timestamptz",
        FieldKind::String | FieldKind::Boolean => "",
    }
}

/// Select list of `entity` under `alias`: scalar fields, then relations as nested JSON.
/// Also returns the computed fields, whose inputs may need joins from `alias`.
fn select_exprs(
    schema: &SchemaGraph,
    entity: &EntityType,
    alias: &str,
    depth: usize,
) -> Result<(Vec<String>, Vec<ColumnRef>), QueryError> {
    let mut exprs = Vec::with_capacity(entity.fields.len() + entity.relations.len());
    let mut computed = Vec::new();
    for f in &entity.fields {
        let value = match f.column() {
            Some(c) => format!("{}.{}", quoted(alias), quoted(c)),
            None => {
                let column = resolve(schema, entity.id, &FieldPath::from_segments([f.name.as_str()]))?;
                let value = column_expr(alias, &column);
                computed.push(column);
                value
            }
        };
        exprs.push(format!("{}{} AS {}", value, decode_cast(f.ty.kind()), quoted(&f.name)));
    }
    if depth < MAX_EMBED_DEPTH {
        for relation in &entity.relations {
            let sub = embed_subquery(schema, relation, alias, depth + 1)?;
            exprs.push(format!("{} AS {}", sub, quoted(&relation.name)));
        }
    }
    Ok((exprs, computed))
}

/// `(SELECT row_to_json(...))` for a to-one relation; NULL when the related row is missing.
fn embed_subquery(
    schema: &SchemaGraph,
    relation: &RelationField,
    parent_alias: &str,
    depth: usize,
) -> Result<String, QueryError> {
    let target = schema.entity(relation.target);
    let alias = format!("emb{}", depth);
    let sub = format!("sub{}", depth);
    let (cols, computed) = select_exprs(schema, target, &alias, depth)?;
    Ok(format!(
        "(SELECT row_to_json({sub}) FROM (SELECT {cols} FROM {table} AS {alias}{joins} WHERE {alias}.{tk} = {parent}.{fk}) {sub})",
        sub = sub,
        cols = cols.join(", "),
        table = qualified_table(target),
        alias = quoted(&alias),
        joins = join_clauses(schema, &alias, &computed),
        tk = quoted(&relation.target_key),
        parent = quoted(parent_alias),
        fk = quoted(&relation.foreign_key),
    ))
}

fn where_clause(q: &mut QueryBuf, filter: Option<&Predicate>) -> String {
    filter
        .map(|p| format!(" WHERE {}", render_predicate(q, p)))
        .unwrap_or_default()
}

/// SELECT rows: filtered, ordered in term order, then OFFSET/LIMIT.
pub fn select_rows(schema: &SchemaGraph, query: &RowQuery) -> Result<QueryBuf, QueryError> {
    let mut q = QueryBuf::new();
    let entity = schema.entity(query.root);
    let (select_list, computed) = select_exprs(schema, entity, MAIN_ALIAS, 0)?;

    let filter_columns = query.filter.as_ref().map(Predicate::columns).unwrap_or_default();
    let order_columns = query.ordering.terms().iter().map(|t| &t.column);
    let joins = join_clauses(
        schema,
        MAIN_ALIAS,
        computed.iter().chain(filter_columns).chain(order_columns),
    );

    let where_sql = where_clause(&mut q, query.filter.as_ref());
    let order_sql = if query.ordering.is_empty() {
        String::new()
    } else {
        let terms: Vec<String> = query
            .ordering
            .terms()
            .iter()
            .map(|t| {
                let dir = match t.direction {
                    SortDirection::Asc => "ASC",
                    SortDirection::Desc => "DESC",
                };
                format!("{} {}", column_expr(MAIN_ALIAS, &t.column), dir)
            })
            .collect();
        format!(" ORDER BY {}", terms.join(", "))
    };
    let limit_sql = query.window.limit.map(|n| format!(" LIMIT {}", n)).unwrap_or_default();
    let offset_sql = match query.window.offset {
        0 => String::new(),
        n => format!(" OFFSET {}", n),
    };

    q.sql = format!(
        "SELECT {} FROM {} AS {}{}{}{}{}{}",
        select_list.join(", "),
        qualified_table(entity),
        quoted(MAIN_ALIAS),
        joins,
        where_sql,
        order_sql,
        limit_sql,
        offset_sql
    );
    Ok(q)
}

/// SELECT COUNT(*) over the same filter, joining only what the filter needs.
pub fn count_rows(schema: &SchemaGraph, query: &CountQuery) -> QueryBuf {
    let mut q = QueryBuf::new();
    let entity = schema.entity(query.root);
    let filter_columns = query.filter.as_ref().map(Predicate::columns).unwrap_or_default();
    let joins = join_clauses(schema, MAIN_ALIAS, filter_columns);
    let where_sql = where_clause(&mut q, query.filter.as_ref());
    q.sql = format!(
        "SELECT COUNT(*) FROM {} AS {}{}{}",
        qualified_table(entity),
        quoted(MAIN_ALIAS),
        joins,
        where_sql
    );
    q
}
