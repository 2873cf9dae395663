//! Feed aggregation
//!
//! Walks user -> feed -> feed item ids -> hydrated feed items.

use crate::core::error::Result;
use crate::core::types::DocId;
use crate::feed::resolver::ReferenceResolver;
use crate::storage::{DocumentStorage, DocumentStorageExt};
use crate::types::{Feed, FeedItem, HydratedFeed, HydratedFeedItem, User};

/// Read-only feed assembly over a store
pub struct FeedAggregator<'a, S: DocumentStorage + ?Sized> {
    store: &'a S,
    resolver: ReferenceResolver<'a, S>,
}

impl<'a, S: DocumentStorage + ?Sized> FeedAggregator<'a, S> {
    /// Aggregate over `store`
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            resolver: ReferenceResolver::new(store),
        }
    }

    /// The resolver used for hydration
    pub fn resolver(&self) -> &ReferenceResolver<'a, S> {
        &self.resolver
    }

    /// Hydrated feed of `user_id`, most recent item first
    ///
    /// # Errors
    ///
    /// * `NotFound` - If the user does not exist
    /// * `DanglingReference` - If the user's feed, an item in it, or a user an item refers to is missing
    pub fn get_feed(&self, user_id: DocId) -> Result<HydratedFeed> {
        let user: User = self.store.read_doc(user_id)?;
        let feed = self.user_feed(&user)?;

        let contents = feed
            .contents
            .iter()
            .map(|item_id| self.feed_entry(*item_id))
            .collect::<Result<Vec<_>>>()?;

        Ok(Feed {
            id: feed.id,
            contents,
        })
    }

    /// Hydrated feed item
    ///
    /// # Errors
    ///
    /// * `NotFound` - If the item does not exist
    /// * `DanglingReference` - If a user the item refers to is missing
    pub fn resolve_feed_item(&self, id: DocId) -> Result<HydratedFeedItem> {
        let item: FeedItem = self.store.read_doc(id)?;
        self.resolver.resolve_feed_item(item)
    }

    /// Stored feed that `user` points at
    pub fn user_feed(&self, user: &User) -> Result<Feed> {
        self.store
            .read_doc(user.feed)
            .map_err(|e| e.into_dangling("feed"))
    }

    /// Feed item listed in a feed; a missing one means a cascade went wrong
    pub fn feed_entry(&self, id: DocId) -> Result<HydratedFeedItem> {
        let item: FeedItem = self
            .store
            .read_doc(id)
            .map_err(|e| e.into_dangling("feed.contents"))?;
        self.resolver.resolve_feed_item(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::Error;
    use crate::storage::{seed, MemStore};
    use crate::types::NewFeedItem;
    use serde_json::json;

    fn seeded() -> MemStore {
        let store = MemStore::new();
        seed::seed_demo_data(&store).unwrap();
        store
    }

    #[test]
    fn test_get_feed_hydrates_items() {
        let store = seeded();
        let feed = FeedAggregator::new(&store).get_feed(4).unwrap();

        assert_eq!(feed.id, 4);
        assert_eq!(feed.contents.len(), 1);
        assert_eq!(feed.contents[0].id, 1);
        assert_eq!(feed.contents[0].author().name, "Someone");
    }

    #[test]
    fn test_get_feed_is_idempotent() {
        let store = seeded();
        let aggregator = FeedAggregator::new(&store);
        assert_eq!(aggregator.get_feed(4).unwrap(), aggregator.get_feed(4).unwrap());
    }

    #[test]
    fn test_get_feed_preserves_order() {
        let store = seeded();
        let second: FeedItem = store
            .add_doc(&NewFeedItem::status_update(2, "Here", "second", 5))
            .unwrap();
        let second_id = second.id;
        store.write("feeds", json!({"id": 4, "contents": [second_id, 1]})).unwrap();

        let feed = FeedAggregator::new(&store).get_feed(4).unwrap();
        let ids: Vec<_> = feed.contents.iter().map(|item| item.id).collect();
        assert_eq!(ids, vec![second_id, 1]);
    }

    #[test]
    fn test_get_feed_unknown_user() {
        let store = seeded();
        let err = FeedAggregator::new(&store).get_feed(99).unwrap_err();
        assert!(matches!(err, Error::NotFound { id: 99, .. }));
    }

    #[test]
    fn test_get_feed_missing_feed_is_dangling() {
        let store = seeded();
        store.delete("feeds", 4).unwrap();
        let err = FeedAggregator::new(&store).get_feed(4).unwrap_err();
        assert!(matches!(err, Error::DanglingReference { field: "feed", id: 4, .. }));
    }

    #[test]
    fn test_get_feed_missing_item_is_dangling() {
        let store = seeded();
        store.delete("feedItems", 1).unwrap();
        let err = FeedAggregator::new(&store).get_feed(4).unwrap_err();
        assert!(matches!(
            err,
            Error::DanglingReference { field: "feed.contents", id: 1, .. }
        ));
    }

    #[test]
    fn test_resolve_feed_item_missing_is_not_found() {
        let store = seeded();
        let err = FeedAggregator::new(&store).resolve_feed_item(5).unwrap_err();
        assert!(matches!(err, Error::NotFound { id: 5, .. }));
    }
}
