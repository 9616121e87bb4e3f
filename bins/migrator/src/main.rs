//! Database migration runner for Folio.
//!
//! Usage:
//!   migrator sync    - Open the store: run pending migrations, then create
//!                      or widen the document tables of the loaded schemas
//!   migrator up      - Run all pending migrations
//!   migrator down    - Rollback last migration
//!   migrator status  - Show migration status
//!   migrator fresh   - Drop all tables and re-run migrations
//!
//! `sync` reads the Folio configuration (`config/*.toml`, `FOLIO__*`).
//! The other commands are the `SeaORM` migration CLI and take the database
//! from `DATABASE_URL` or `-u`.

use std::sync::Arc;

use anyhow::Context;
use folio_core::schema::SchemaSet;
use folio_db::DocumentStore;
use folio_db::migration::Migrator;
use folio_shared::{AppConfig, SchemaConfig};
use sea_orm_migration::prelude::*;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn load_schemas(config: &SchemaConfig) -> anyhow::Result<SchemaSet> {
    let Some(path) = &config.path else {
        return Ok(SchemaSet::builtin()?);
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read schema definitions from {path}"))?;
    Ok(SchemaSet::from_json(&json)?)
}

async fn sync() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "folio=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("failed to load configuration")?;
    let schemas = Arc::new(load_schemas(&config.schemas)?);
    let store = DocumentStore::open(&config.database, schemas).await?;
    info!(
        url = %config.database.url,
        schemas = store.schemas().iter().count(),
        "store is up to date"
    );
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    if std::env::args().nth(1).as_deref() == Some("sync") {
        return sync().await;
    }

    // Run the migrator CLI (it sets up its own tracing)
    cli::run_cli(Migrator).await;
    Ok(())
}
