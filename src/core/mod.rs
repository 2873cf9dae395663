//! Core system types and foundations
//!
//! This module contains the fundamental building blocks of the feed store:
//! identifier types, error handling, configuration and logging setup.

pub mod types;
pub mod error;
pub mod config;
pub mod logging;

// Re-export commonly used items
pub use types::{DocId, Timestamp};
pub use error::{Error, Result};
pub use config::{Config, LockGranularity};
