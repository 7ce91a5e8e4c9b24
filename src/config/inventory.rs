//! Built-in inventory schema: spools of filament, filament types, and their vendors.

use crate::config::{parse_schema, resolve, SchemaConfig, SchemaGraph};
use crate::error::ConfigError;

const INVENTORY_SCHEMA: &str = include_str!("../../schema/inventory.json");

pub fn schema_config() -> Result<SchemaConfig, ConfigError> {
    parse_schema(INVENTORY_SCHEMA)
}

pub fn schema() -> Result<SchemaGraph, ConfigError> {
    resolve(&schema_config()?)
}
