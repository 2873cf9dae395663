//! Feedstore - An In-Memory Document Store for Social Feeds
//!
//! Users, feeds and feed items are kept as JSON documents in named
//! collections. Feeds are assembled by following the id references between
//! them, and mutations lock the document they change so that concurrent
//! callers never lose each other's updates.
#![warn(missing_docs)]

// Core foundational modules
pub mod core;

// Main functional modules
pub mod types;
pub mod storage;
pub mod feed;
pub mod system;

// Re-export commonly used items for convenience
pub use crate::core::{Config, Error, Result};
pub use feed::FeedService;
pub use storage::MemStore;

/// Crate version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Initialize logging and metrics for `config`
pub fn init(config: &Config) -> Result<()> {
    crate::core::logging::init(&config.logging)?;
    tracing::info!("Initializing {} v{}", NAME, VERSION);

    // Registers the collectors before the first operation touches them
    system::metrics::Metrics::global();

    Ok(())
}
