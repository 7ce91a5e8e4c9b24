//! Inventory server: loads the schema, connects to PostgreSQL, serves entity reads.

use inventory_api::config::{inventory, load_from_path};
use inventory_api::{app, AppState, PgExecutor, Settings};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("inventory_api=info,tower_http=info")),
        )
        .init();

    let settings = Settings::from_env();
    let schema = match &settings.schema_path {
        Some(path) => load_from_path(path).await?,
        None => inventory::schema()?,
    };
    tracing::info!(entities = schema.entities().count(), "schema loaded");

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .connect(&settings.database_url)
        .await?;

    let state = AppState::new(schema, PgExecutor::new(pool));
    let listener = TcpListener::bind(&settings.bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app(state)).await?;
    Ok(())
}
