//! Load schema config from JSON and build the resolved schema graph.

use crate::config::resolved::{
    parse_expression, EntityId, EntityType, FieldSource, RelationField, ScalarField, ScalarType, SchemaGraph,
};
use crate::config::types::*;
use crate::config::validate;
use crate::error::ConfigError;
use crate::query::{resolve as resolve_path, FieldPath};
use std::collections::HashMap;
use std::path::Path;

/// Build the schema graph from config (validates first).
pub fn resolve(config: &SchemaConfig) -> Result<SchemaGraph, ConfigError> {
    validate(config)?;

    let ids: HashMap<&str, EntityId> = config
        .entities
        .iter()
        .enumerate()
        .map(|(i, e)| (e.name.as_str(), EntityId(i)))
        .collect();
    let configs_by_name: HashMap<&str, &EntityConfig> =
        config.entities.iter().map(|e| (e.name.as_str(), e)).collect();

    let mut entities = Vec::with_capacity(config.entities.len());
    let mut by_name = HashMap::new();
    let mut by_path = HashMap::new();

    for (i, e) in config.entities.iter().enumerate() {
        let id = EntityId(i);
        let fields = e
            .fields
            .iter()
            .map(|f| {
                let source = match &f.expression {
                    Some(expr) => FieldSource::Computed(parse_expression(expr).map_err(ConfigError::Validation)?),
                    None => FieldSource::Column(f.column_name().to_string()),
                };
                Ok(ScalarField {
                    name: f.name.clone(),
                    source,
                    ty: ScalarType::new(f.kind, f.nullable),
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;
        let field_index = fields.iter().enumerate().map(|(i, f)| (f.name.clone(), i)).collect();

        let mut relations = Vec::with_capacity(e.relations.len());
        for r in &e.relations {
            let target = ids.get(r.target.as_str()).copied().ok_or_else(|| ConfigError::MissingReference {
                kind: "entity",
                id: r.target.clone(),
            })?;
            let target_config = configs_by_name[r.target.as_str()];
            let target_key_field = r.target_key.as_deref().unwrap_or(&target_config.primary_key);
            relations.push(RelationField {
                name: r.name.clone(),
                target,
                foreign_key: column_of(e, &r.foreign_key),
                target_key: column_of(target_config, target_key_field),
                optional: r.optional,
            });
        }
        let relation_index = relations.iter().enumerate().map(|(i, r)| (r.name.clone(), i)).collect();

        let path_segment = e.path_segment.clone().unwrap_or_else(|| e.name.clone());
        let entity = EntityType {
            id,
            name: e.name.clone(),
            schema_name: e.schema.clone().unwrap_or_else(|| config.default_schema.clone()),
            table_name: e.table.clone(),
            path_segment: path_segment.clone(),
            primary_key: e.primary_key.clone(),
            fields,
            relations,
            aliases: e.aliases.clone(),
            archive_flag: e.archive_flag.clone(),
            field_index,
            relation_index,
        };
        by_name.insert(e.name.clone(), id);
        by_path.insert(path_segment, id);
        entities.push(entity);
    }

    let graph = SchemaGraph {
        entities,
        by_name,
        by_path,
    };
    check_computed(&graph)?;
    check_aliases(&graph)?;
    tracing::debug!(entities = graph.entities.len(), "schema graph resolved");
    Ok(graph)
}

fn column_of(entity: &EntityConfig, field: &str) -> String {
    entity
        .fields
        .iter()
        .find(|f| f.name == field)
        .map(|f| f.column_name().to_string())
        .unwrap_or_else(|| field.to_string())
}

/// Computed-field placeholders must name stored columns reachable from the owning entity.
fn check_computed(graph: &SchemaGraph) -> Result<(), ConfigError> {
    for entity in graph.entities() {
        for field in entity.fields.iter().filter(|f| f.column().is_none()) {
            resolve_path(graph, entity.id, &FieldPath::from_segments([field.name.as_str()])).map_err(|e| {
                ConfigError::Validation(format!("computed field {}.{}: {}", entity.name, field.name, e))
            })?;
        }
    }
    Ok(())
}

/// Every alias must point at a scalar reachable from its entity.
fn check_aliases(graph: &SchemaGraph) -> Result<(), ConfigError> {
    for entity in graph.entities() {
        for (alias, target) in &entity.aliases {
            resolve_path(graph, entity.id, &FieldPath::parse(target)).map_err(|e| ConfigError::InvalidAlias {
                entity: entity.name.clone(),
                alias: alias.clone(),
                reason: e.to_string(),
            })?;
        }
    }
    Ok(())
}

pub fn parse_schema(json: &str) -> Result<SchemaConfig, ConfigError> {
    serde_json::from_str(json).map_err(|e| ConfigError::Load(e.to_string()))
}

/// Read and resolve a schema config file.
pub async fn load_from_path(path: impl AsRef<Path>) -> Result<SchemaGraph, ConfigError> {
    let path = path.as_ref();
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
    let config = parse_schema(&text)?;
    resolve(&config)
}
