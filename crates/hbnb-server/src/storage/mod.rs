//! Storage layer
//!
//! Two interchangeable backends behind [`hbnb_core::Storage`]: a JSON file
//! snapshot and an embedded SQLite database.

pub mod db;
pub mod file;

pub use db::DbStorage;
pub use file::FileStorage;

use crate::config::{Settings, StorageType};
use anyhow::{Context, Result};
use hbnb_core::Storage;
use std::sync::Arc;
use tracing::info;

/// Build the configured backend and load its durable state.
pub async fn open(settings: &Settings) -> Result<Arc<dyn Storage>> {
    let storage: Arc<dyn Storage> = match settings.type_storage {
        StorageType::File => Arc::new(FileStorage::new(&settings.file_path)),
        StorageType::Db => Arc::new(
            DbStorage::connect(&settings.db_path)
                .await
                .context("Failed to initialize database")?,
        ),
    };

    storage
        .reload()
        .await
        .with_context(|| format!("Failed to load {} storage", storage.backend()))?;
    info!("Storage ready: {}", storage.backend());
    Ok(storage)
}
