//! Raw schema config types matching the JSON schema file (entities, fields, relations).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    String,
    Integer,
    Float,
    Boolean,
    Timestamp,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FieldConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    #[serde(default)]
    pub nullable: bool,
    /// Column name when it differs from the field name.
    #[serde(default)]
    pub column: Option<String>,
    /// SQL expression computing a read-only value instead of reading a column.
    /// `{path}` placeholders name other fields, e.g. `{used_weight} / {filament.density}`.
    #[serde(default)]
    pub expression: Option<String>,
}

impl FieldConfig {
    pub fn column_name(&self) -> &str {
        self.column.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RelationConfig {
    pub name: String,
    /// Name of the target entity.
    pub target: String,
    /// Field on this entity holding the key of the related row.
    pub foreign_key: String,
    /// Field on the target matched against `foreign_key`. Defaults to the target's primary key.
    #[serde(default)]
    pub target_key: Option<String>,
    #[serde(default = "default_true")]
    pub optional: bool,
}

fn default_true() -> bool {
    true
}

fn default_primary_key() -> String {
    "id".into()
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EntityConfig {
    pub name: String,
    pub table: String,
    /// PostgreSQL schema; defaults to the schema config's `default_schema`.
    #[serde(default)]
    pub schema: Option<String>,
    /// URL segment under /api/v1; defaults to `name`.
    #[serde(default)]
    pub path_segment: Option<String>,
    #[serde(default = "default_primary_key")]
    pub primary_key: String,
    pub fields: Vec<FieldConfig>,
    #[serde(default)]
    pub relations: Vec<RelationConfig>,
    /// Extra flat query-parameter names mapped to dotted field paths.
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
    /// Boolean field hiding rows unless `allow_archived=true` is passed.
    #[serde(default)]
    pub archive_flag: Option<String>,
}

fn default_schema() -> String {
    "public".into()
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SchemaConfig {
    #[serde(default = "default_schema")]
    pub default_schema: String,
    pub entities: Vec<EntityConfig>,
}
