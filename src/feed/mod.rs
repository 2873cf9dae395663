//! Feed operations
//!
//! Read-side hydration of users, feeds and feed items, plus the mutations
//! that keep their references consistent.

/// User reference hydration
pub mod resolver;
/// Feed assembly
pub mod aggregator;
/// Locked read-modify-write operations
pub mod mutations;

pub use aggregator::FeedAggregator;
pub use mutations::FeedService;
pub use resolver::{ReferenceResolver, Resolve};
