//! Mutation operations
//!
//! Every operation is a read-modify-write sequence over whole documents. The
//! document being changed is locked from its read until its write-back, so
//! two callers toggling the same like list cannot lose each other's update.
//! No operation holds more than one document lock at a time.
//!
//! Linking a new item into a feed and cascading a delete across feeds are
//! additionally ordered by the store's cascade gate, so a delete can never
//! scan the feeds between an item's creation and its feed write-back.
//!
//! Hydrated results are resolved from the document that was just written,
//! after its lock has been released.

use crate::core::error::{Error, Result};
use crate::core::types::{now_millis, DocId};
use crate::feed::aggregator::FeedAggregator;
use crate::feed::resolver::{ReferenceResolver, Resolve};
use crate::storage::{Document, DocumentStorage, DocumentStorageExt, MemStore};
use crate::system::metrics::Metrics;
use crate::types::{
    Comment, Feed, FeedItem, HydratedComment, HydratedFeed, HydratedFeedItem, NewFeedItem, User,
};
use std::sync::Arc;
use tracing::{debug, warn};

/// Feed operations over a shared store
pub struct FeedService<S: DocumentStorage = MemStore> {
    store: Arc<S>,
}

impl<S: DocumentStorage> Clone for FeedService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: DocumentStorage> FeedService<S> {
    /// Operate on `store`
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// The underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Read-only aggregation over the store
    pub fn aggregator(&self) -> FeedAggregator<'_, S> {
        FeedAggregator::new(&*self.store)
    }

    /// Reference resolution over the store
    pub fn resolver(&self) -> ReferenceResolver<'_, S> {
        ReferenceResolver::new(&*self.store)
    }

    /// Hydrated feed of `user_id`
    pub fn get_feed(&self, user_id: DocId) -> Result<HydratedFeed> {
        self.aggregator().get_feed(user_id)
    }

    /// Hydrated feed item
    pub fn resolve_feed_item(&self, id: DocId) -> Result<HydratedFeedItem> {
        self.aggregator().resolve_feed_item(id)
    }

    /// Lock `id`, read it, let `change` edit it and write it back.
    ///
    /// Nothing is written when `change` fails or alters the document's id.
    fn modify<T, R>(&self, id: DocId, change: impl FnOnce(&mut T) -> Result<R>) -> Result<(T, R)>
    where
        T: Document,
    {
        let _guard = self.store.lock_doc::<T>(id);
        let mut document: T = self.store.read_doc(id)?;
        let outcome = change(&mut document)?;
        if document.id() != id {
            return Err(Error::invariant(format!(
                "Document {}/{} changed its id to {}",
                T::COLLECTION,
                id,
                document.id()
            )));
        }
        self.store.write_doc(&document)?;
        Ok((document, outcome))
    }

    /// Require that `user_id` names an existing user
    fn existing_user(&self, user_id: DocId) -> Result<User> {
        self.store.read_doc(user_id)
    }

    /// Post a status update and put it at the front of the author's feed.
    ///
    /// Returns the stored item; its references are not resolved.
    ///
    /// # Errors
    ///
    /// * `NotFound` - If the author does not exist
    /// * `DanglingReference` - If the author's feed is missing
    pub fn post_status_update(
        &self,
        author: DocId,
        location: &str,
        text: &str,
    ) -> Result<FeedItem> {
        let _timer = Metrics::global().start_mutation("post_status_update");
        let user = self.existing_user(author)?;

        let _gate = self.store.cascade_shared();
        let (_, item) = self
            .modify::<Feed, _>(user.feed, |feed| {
                let draft = NewFeedItem::status_update(author, location, text, now_millis());
                let item: FeedItem = self.store.add_doc(&draft)?;
                feed.prepend(item.id);
                Ok(item)
            })
            .map_err(|e| e.into_dangling("feed"))?;

        debug!(author, item = item.id, feed = user.feed, "Status update posted");
        Ok(item)
    }

    /// Append a comment to a feed item's thread.
    ///
    /// # Errors
    ///
    /// * `NotFound` - If the feed item or the author does not exist
    pub fn post_comment(&self, feed_item: DocId, author: DocId, text: &str) -> Result<HydratedFeedItem> {
        let _timer = Metrics::global().start_mutation("post_comment");
        self.existing_user(author)?;

        let (item, ()) = self.modify::<FeedItem, _>(feed_item, |item| {
            item.comments.push(Comment::new(author, text, now_millis()));
            Ok(())
        })?;

        debug!(feed_item, author, comments = item.comments.len(), "Comment posted");
        self.resolver().resolve_feed_item(item)
    }

    /// Add `user` to a feed item's likes. Liking twice changes nothing.
    ///
    /// Returns the resolved like list.
    pub fn like_feed_item(&self, feed_item: DocId, user: DocId) -> Result<Vec<User>> {
        let _timer = Metrics::global().start_mutation("like_feed_item");
        self.existing_user(user)?;

        let (item, changed) = self.modify::<FeedItem, _>(feed_item, |item| Ok(item.like(user)))?;

        debug!(feed_item, user, changed, "Feed item liked");
        self.resolver().users("likeCounter", &item.like_counter)
    }

    /// Remove `user` from a feed item's likes. Unliking an absent user changes nothing.
    ///
    /// Returns the resolved like list.
    pub fn unlike_feed_item(&self, feed_item: DocId, user: DocId) -> Result<Vec<User>> {
        let _timer = Metrics::global().start_mutation("unlike_feed_item");

        let (item, changed) = self.modify::<FeedItem, _>(feed_item, |item| Ok(item.unlike(user)))?;

        debug!(feed_item, user, changed, "Feed item unliked");
        self.resolver().users("likeCounter", &item.like_counter)
    }

    /// Add `user` to the likes of the comment at `index`.
    ///
    /// Returns the comment with its author resolved.
    ///
    /// # Errors
    ///
    /// * `NotFound` - If the feed item or the user does not exist
    /// * `CommentNotFound` - If the thread is shorter than `index + 1`
    pub fn like_comment(&self, feed_item: DocId, index: usize, user: DocId) -> Result<HydratedComment> {
        let _timer = Metrics::global().start_mutation("like_comment");
        self.existing_user(user)?;

        let (_, comment) = self.modify::<FeedItem, _>(feed_item, |item| {
            let comment = item
                .comment_mut(index)
                .ok_or(Error::CommentNotFound { feed_item, index })?;
            comment.like(user);
            Ok(comment.clone())
        })?;

        debug!(feed_item, index, user, "Comment liked");
        comment.resolve(&self.resolver())
    }

    /// Remove `user` from the likes of the comment at `index`.
    ///
    /// Returns the comment with its author resolved.
    pub fn unlike_comment(&self, feed_item: DocId, index: usize, user: DocId) -> Result<HydratedComment> {
        let _timer = Metrics::global().start_mutation("unlike_comment");

        let (_, comment) = self.modify::<FeedItem, _>(feed_item, |item| {
            let comment = item
                .comment_mut(index)
                .ok_or(Error::CommentNotFound { feed_item, index })?;
            comment.unlike(user);
            Ok(comment.clone())
        })?;

        debug!(feed_item, index, user, "Comment unliked");
        comment.resolve(&self.resolver())
    }

    /// Replace the text of a feed item owned by `acting_user`.
    ///
    /// # Errors
    ///
    /// * `NotFound` - If the feed item does not exist
    /// * `PermissionDenied` - If `acting_user` is not the item's author
    pub fn update_feed_item_text(
        &self,
        feed_item: DocId,
        acting_user: DocId,
        text: &str,
    ) -> Result<HydratedFeedItem> {
        let _timer = Metrics::global().start_mutation("update_feed_item_text");

        let (item, ()) = self.modify::<FeedItem, _>(feed_item, |item| {
            if *item.author() != acting_user {
                return Err(Error::permission(format!(
                    "User {} is not the author of feed item {}",
                    acting_user, feed_item
                )));
            }
            item.set_text(text);
            Ok(())
        })?;

        debug!(feed_item, acting_user, "Feed item text updated");
        self.resolver().resolve_feed_item(item)
    }

    /// Delete a feed item and remove it from every feed that lists it.
    ///
    /// No status update can be posted while the cascade runs. Returns how many
    /// feeds were cleaned up.
    ///
    /// # Errors
    ///
    /// * `NotFound` - If the feed item does not exist
    pub fn delete_feed_item(&self, feed_item: DocId) -> Result<usize> {
        let _timer = Metrics::global().start_mutation("delete_feed_item");
        let _gate = self.store.cascade_exclusive();

        {
            let _guard = self.store.lock_doc::<FeedItem>(feed_item);
            self.store.delete(FeedItem::COLLECTION, feed_item)?;
        }

        let mut cleaned = 0;
        for (feed_id, snapshot) in self.store.get_collection(Feed::COLLECTION) {
            let listed = snapshot
                .get("contents")
                .and_then(|contents| contents.as_array())
                .map_or(false, |ids| ids.iter().any(|id| id.as_u64() == Some(feed_item)));
            if !listed {
                continue;
            }

            match self.modify::<Feed, _>(feed_id, |feed| Ok(feed.remove(feed_item))) {
                Ok((_, true)) => cleaned += 1,
                Ok((_, false)) => {}
                Err(Error::NotFound { .. }) => {
                    warn!(feed = feed_id, feed_item, "Feed vanished during cascade");
                }
                Err(e) => return Err(e),
            }
        }

        debug!(feed_item, feeds = cleaned, "Feed item deleted");
        Ok(cleaned)
    }

    /// Items in `user_id`'s feed whose text contains `query`, ignoring case.
    ///
    /// Results are hydrated and keep feed order.
    pub fn search_feed_items(&self, user_id: DocId, query: &str) -> Result<Vec<HydratedFeedItem>> {
        let aggregator = self.aggregator();
        let user: User = self.store.read_doc(user_id)?;
        let feed = aggregator.user_feed(&user)?;

        let mut matches = Vec::new();
        for item_id in feed.contents {
            let item: FeedItem = self
                .store
                .read_doc(item_id)
                .map_err(|e| e.into_dangling("feed.contents"))?;
            if item.matches(query) {
                matches.push(aggregator.resolver().resolve_feed_item(item)?);
            }
        }

        debug!(user = user_id, query, hits = matches.len(), "Feed searched");
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::seed;

    fn service() -> FeedService {
        let store = MemStore::new();
        seed::seed_demo_data(&store).unwrap();
        FeedService::new(Arc::new(store))
    }

    #[test]
    fn test_post_status_update_prepends() {
        let service = service();
        let item = service.post_status_update(4, "NYC", "hello").unwrap();

        assert_eq!(*item.author(), 4);
        assert_eq!(item.text(), "hello");
        assert!(item.like_counter.is_empty());
        assert!(item.comments.is_empty());
        assert!(item.post_date() > 0);

        let feed: Feed = service.store().read_doc(4).unwrap();
        assert_eq!(feed.contents, vec![item.id, 1]);
    }

    #[test]
    fn test_post_status_update_unknown_author() {
        let service = service();
        let err = service.post_status_update(42, "NYC", "hello").unwrap_err();
        assert!(matches!(err, Error::NotFound { id: 42, .. }));
        assert_eq!(service.store().document_count("feedItems"), 1);
    }

    #[test]
    fn test_post_comment_appends() {
        let service = service();
        let item = service.post_comment(1, 4, "cheer up").unwrap();

        assert_eq!(item.comments.len(), 3);
        let last = item.comments.last().unwrap();
        assert_eq!(last.author.name, "John Vilk");
        assert_eq!(last.contents, "cheer up");
        assert!(last.like_counter.is_empty());
    }

    #[test]
    fn test_like_feed_item_is_idempotent() {
        let service = service();
        let first = service.like_feed_item(1, 4).unwrap();
        let second = service.like_feed_item(1, 4).unwrap();

        assert_eq!(first, second);
        let ids: Vec<_> = second.iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![2, 3, 4]);
    }

    #[test]
    fn test_unlike_absent_user_is_noop() {
        let service = service();
        let before: FeedItem = service.store().read_doc(1).unwrap();
        let likers = service.unlike_feed_item(1, 4).unwrap();
        let after: FeedItem = service.store().read_doc(1).unwrap();

        assert_eq!(before, after);
        assert_eq!(likers.len(), 2);
    }

    #[test]
    fn test_like_unknown_item() {
        let service = service();
        assert!(matches!(service.like_feed_item(9, 4), Err(Error::NotFound { id: 9, .. })));
    }

    #[test]
    fn test_like_and_unlike_comment() {
        let service = service();
        let liked = service.like_comment(1, 0, 4).unwrap();
        assert_eq!(liked.author.name, "Someone Else");
        assert_eq!(liked.like_counter, vec![4]);

        let again = service.like_comment(1, 0, 4).unwrap();
        assert_eq!(again.like_counter, vec![4]);

        let unliked = service.unlike_comment(1, 0, 4).unwrap();
        assert!(unliked.like_counter.is_empty());

        let stored: FeedItem = service.store().read_doc(1).unwrap();
        assert!(stored.comments[0].like_counter.is_empty());
        assert!(stored.comments[1].like_counter.is_empty());
    }

    #[test]
    fn test_like_comment_out_of_range() {
        let service = service();
        let err = service.like_comment(1, 2, 4).unwrap_err();
        assert!(matches!(err, Error::CommentNotFound { feed_item: 1, index: 2 }));
    }

    #[test]
    fn test_update_text_by_author() {
        let service = service();
        let item = service.update_feed_item_text(1, 1, "better now").unwrap();
        assert_eq!(item.text(), "better now");
        assert_eq!(item.author().id, 1);

        let stored: FeedItem = service.store().read_doc(1).unwrap();
        assert_eq!(stored.text(), "better now");
    }

    #[test]
    fn test_update_text_by_other_user_denied() {
        let service = service();
        let err = service.update_feed_item_text(1, 4, "hijacked").unwrap_err();
        assert!(matches!(err, Error::PermissionDenied(_)));

        let stored: FeedItem = service.store().read_doc(1).unwrap();
        assert_eq!(stored.text(), "ugh.");
    }

    #[test]
    fn test_delete_cascades_to_every_feed() {
        let service = service();
        service
            .store()
            .write("feeds", serde_json::json!({"id": 2, "contents": [1]}))
            .unwrap();

        let cleaned = service.delete_feed_item(1).unwrap();
        assert_eq!(cleaned, 2);

        for (_, feed) in service.store().get_collection("feeds") {
            let feed: Feed = serde_json::from_value(feed).unwrap();
            assert!(!feed.contents.contains(&1));
        }
        assert!(matches!(service.resolve_feed_item(1), Err(Error::NotFound { .. })));
        assert!(service.get_feed(4).unwrap().contents.is_empty());
    }

    #[test]
    fn test_modify_rejects_id_change() {
        let service = service();
        let err = service
            .modify::<FeedItem, _>(1, |item| {
                item.id = 99;
                Ok(())
            })
            .unwrap_err();
        assert!(matches!(err, Error::InvariantViolation(_)));
        assert!(service.store().read("feedItems", 1).is_ok());
        assert!(service.store().read("feedItems", 99).is_err());
    }

    #[test]
    fn test_delete_missing_item() {
        let service = service();
        assert!(matches!(service.delete_feed_item(7), Err(Error::NotFound { .. })));
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let service = service();
        let posted = service.post_status_update(4, "NYC", "hello").unwrap();

        let hits = service.search_feed_items(4, "HELLO").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, posted.id);
        assert_eq!(hits[0].author().name, "John Vilk");

        assert_eq!(service.search_feed_items(4, "UGH").unwrap().len(), 1);
        assert!(service.search_feed_items(4, "nothing like this").unwrap().is_empty());
    }
}
