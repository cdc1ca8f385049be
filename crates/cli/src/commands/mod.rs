//! Subcommand implementations

pub mod config;
pub mod doctor;
pub mod report;
pub mod seed;
pub mod serve;

use std::sync::Arc;

use agro_registry_adapters::store::SqliteRegistryStore;
use anyhow::{Context, Result};

use crate::config::AppConfig;

/// Open the configured SQLite registry, creating it if missing
pub(crate) async fn open_store(config: &AppConfig) -> Result<Arc<SqliteRegistryStore>> {
    let path = &config.general.database_path;
    let store = SqliteRegistryStore::new(path)
        .await
        .with_context(|| format!("Failed to open registry database: {}", path.display()))?;
    Ok(Arc::new(store))
}
