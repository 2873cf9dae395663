//! Document models
//!
//! Typed views over the JSON documents kept in the store. Each stored model
//! implements [`crate::storage::Document`], which ties it to its collection.

/// User documents
pub mod user;
/// Feed documents
pub mod feed;
/// Feed item and comment documents
pub mod feed_item;

pub use user::User;
pub use feed::{Feed, HydratedFeed};
pub use feed_item::{
    Comment, FeedItem, FeedItemBody, HydratedComment, HydratedFeedItem, NewFeedItem, StatusUpdate,
};
