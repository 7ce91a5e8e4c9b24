//! Schema config validation: referential integrity and naming consistency.

use crate::config::{parse_expression, FieldKind, SchemaConfig};
use crate::error::ConfigError;
use std::collections::{HashMap, HashSet};

pub fn validate(config: &SchemaConfig) -> Result<(), ConfigError> {
    if config.entities.is_empty() {
        return Err(ConfigError::Validation("at least one entity required".into()));
    }

    let mut names = HashSet::new();
    let mut path_segments = HashSet::new();
    for e in &config.entities {
        if !names.insert(e.name.as_str()) {
            return Err(ConfigError::DuplicateName {
                kind: "entity",
                name: e.name.clone(),
            });
        }
        let segment = e.path_segment.as_deref().unwrap_or(&e.name);
        if !path_segments.insert(segment) {
            return Err(ConfigError::DuplicateName {
                kind: "path segment",
                name: segment.to_string(),
            });
        }
    }

    let fields_by_entity: HashMap<&str, HashMap<&str, FieldKind>> = config
        .entities
        .iter()
        .map(|e| {
            let fields = e.fields.iter().map(|f| (f.name.as_str(), f.kind)).collect();
            (e.name.as_str(), fields)
        })
        .collect();

    for e in &config.entities {
        let mut member_names = HashSet::new();
        for f in &e.fields {
            if f.name.is_empty() || f.name.contains('.') {
                return Err(ConfigError::Validation(format!(
                    "invalid field name '{}' on {}",
                    f.name, e.name
                )));
            }
            if !member_names.insert(f.name.as_str()) {
                return Err(ConfigError::DuplicateName {
                    kind: "field",
                    name: format!("{}.{}", e.name, f.name),
                });
            }
            if let Some(expr) = &f.expression {
                if f.column.is_some() {
                    return Err(ConfigError::Validation(format!(
                        "field {}.{} has both a column and an expression",
                        e.name, f.name
                    )));
                }
                parse_expression(expr)
                    .map_err(|reason| ConfigError::Validation(format!("field {}.{}: {}", e.name, f.name, reason)))?;
            }
        }
        let is_computed = |name: &str| e.fields.iter().any(|f| f.name == name && f.expression.is_some());
        for (role, name) in std::iter::once(("primary key", e.primary_key.as_str()))
            .chain(e.relations.iter().map(|r| ("foreign key", r.foreign_key.as_str())))
            .chain(e.archive_flag.as_deref().map(|f| ("archive flag", f)))
        {
            if is_computed(name) {
                return Err(ConfigError::Validation(format!(
                    "{} {}.{} cannot be a computed field",
                    role, e.name, name
                )));
            }
        }

        let fields = &fields_by_entity[e.name.as_str()];
        if !fields.contains_key(e.primary_key.as_str()) {
            return Err(ConfigError::InvalidPrimaryKey {
                entity: e.name.clone(),
                field: e.primary_key.clone(),
            });
        }

        for r in &e.relations {
            if r.name.is_empty() || r.name.contains('.') {
                return Err(ConfigError::Validation(format!(
                    "invalid relation name '{}' on {}",
                    r.name, e.name
                )));
            }
            if !member_names.insert(r.name.as_str()) {
                return Err(ConfigError::DuplicateName {
                    kind: "field",
                    name: format!("{}.{}", e.name, r.name),
                });
            }
            let Some(target_fields) = fields_by_entity.get(r.target.as_str()) else {
                return Err(ConfigError::MissingReference {
                    kind: "entity",
                    id: r.target.clone(),
                });
            };
            if !fields.contains_key(r.foreign_key.as_str()) {
                return Err(ConfigError::MissingReference {
                    kind: "foreign key field",
                    id: format!("{}.{}", e.name, r.foreign_key),
                });
            }
            if let Some(target_key) = &r.target_key {
                if !target_fields.contains_key(target_key.as_str()) {
                    return Err(ConfigError::MissingReference {
                        kind: "target key field",
                        id: format!("{}.{}", r.target, target_key),
                    });
                }
            }
        }

        if let Some(flag) = &e.archive_flag {
            match fields.get(flag.as_str()) {
                Some(FieldKind::Boolean) => {}
                Some(_) => {
                    return Err(ConfigError::Validation(format!(
                        "archive flag {}.{} must be a boolean field",
                        e.name, flag
                    )))
                }
                None => {
                    return Err(ConfigError::MissingReference {
                        kind: "archive flag field",
                        id: format!("{}.{}", e.name, flag),
                    })
                }
            }
        }

        for alias in e.aliases.keys() {
            if member_names.contains(alias.as_str()) {
                return Err(ConfigError::InvalidAlias {
                    entity: e.name.clone(),
                    alias: alias.clone(),
                    reason: "shadows a field of the same name".into(),
                });
            }
        }
    }

    Ok(())
}
