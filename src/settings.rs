//! Process settings from the environment (after `.env` is loaded).

use std::path::PathBuf;

const DEFAULT_DATABASE_URL: &str = "postgres://localhost/inventory";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    pub database_url: String,
    pub bind_addr: String,
    /// Schema config file; the built-in inventory schema when unset.
    pub schema_path: Option<PathBuf>,
    pub max_connections: u32,
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let max_connections = match get("DB_MAX_CONNECTIONS").map(|v| v.parse::<u32>()) {
            Some(Ok(n)) if n > 0 => n,
            Some(_) => {
                tracing::warn!("ignoring invalid DB_MAX_CONNECTIONS, using {}", DEFAULT_MAX_CONNECTIONS);
                DEFAULT_MAX_CONNECTIONS
            }
            None => DEFAULT_MAX_CONNECTIONS,
        };
        Settings {
            database_url: get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.into()),
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.into()),
            schema_path: get("SCHEMA_PATH").filter(|p| !p.is_empty()).map(PathBuf::from),
            max_connections,
        }
    }
}
