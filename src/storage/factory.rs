//! Storage factory for creating stores based on configuration

use crate::core::config::StoreConfig;
use crate::core::error::Result;
use crate::storage::{seed, MemStore};
use std::sync::Arc;
use tracing::info;

/// Store shared between request handlers
pub type SharedStorage = Arc<MemStore>;

/// Create a store as described by `config`, seeding demo data when asked to
pub fn create_storage(config: &StoreConfig) -> Result<MemStore> {
    let store = MemStore::with_config(config);
    if config.seed_demo_data {
        seed::seed_demo_data(&store)?;
    }
    info!(
        granularity = ?config.lock_granularity,
        stripes = config.lock_stripes,
        documents = store.total_document_count(),
        "Store initialized"
    );
    Ok(store)
}

/// Create a shared store as described by `config`
pub fn create_shared_storage(config: &StoreConfig) -> Result<SharedStorage> {
    Ok(Arc::new(create_storage(config)?))
}
