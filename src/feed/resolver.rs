//! Reference resolution
//!
//! Turns stored documents, whose user references are plain ids, into their
//! hydrated counterparts. Resolution only reads from the store.
//!
//! Each piece of a feed item that holds references implements [`Resolve`].
//! The kind-specific payload is reached through [`FeedItemBody`], so a new
//! item kind only needs a new variant and a `Resolve` impl for its payload.

use crate::core::error::{Error, Result};
use crate::core::types::DocId;
use crate::storage::{DocumentStorage, DocumentStorageExt};
use crate::system::metrics::Metrics;
use crate::types::{Comment, FeedItem, FeedItemBody, StatusUpdate, User};

/// Something whose user references can be replaced by user documents
pub trait Resolve {
    /// Shape with references resolved
    type Resolved;

    /// Resolve every reference, failing on the first one that dangles
    fn resolve<S>(self, resolver: &ReferenceResolver<'_, S>) -> Result<Self::Resolved>
    where
        S: DocumentStorage + ?Sized;
}

/// Read-only view of the store that hydrates references
pub struct ReferenceResolver<'a, S: DocumentStorage + ?Sized> {
    store: &'a S,
}

impl<'a, S: DocumentStorage + ?Sized> ReferenceResolver<'a, S> {
    /// Resolve against `store`
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Follow a user reference held in `field`
    ///
    /// A missing user is a `DanglingReference`, never skipped.
    pub fn user(&self, field: &'static str, id: DocId) -> Result<User> {
        self.store.read_doc::<User>(id).map_err(|e| {
            let e = e.into_dangling(field);
            if matches!(e, Error::DanglingReference { .. }) {
                Metrics::global().dangling_references.inc();
            }
            e
        })
    }

    /// Follow a list of user references, preserving order
    pub fn users(&self, field: &'static str, ids: &[DocId]) -> Result<Vec<User>> {
        ids.iter().map(|id| self.user(field, *id)).collect()
    }

    /// Hydrate a stored feed item
    pub fn resolve_feed_item(&self, item: FeedItem) -> Result<FeedItem<User>> {
        item.resolve(self)
    }
}

impl Resolve for FeedItem {
    type Resolved = FeedItem<User>;

    fn resolve<S>(self, resolver: &ReferenceResolver<'_, S>) -> Result<Self::Resolved>
    where
        S: DocumentStorage + ?Sized,
    {
        let like_counter = resolver.users("likeCounter", &self.like_counter)?;
        let body = self.body.resolve(resolver)?;
        let comments = self
            .comments
            .into_iter()
            .map(|comment| comment.resolve(resolver))
            .collect::<Result<Vec<_>>>()?;

        Ok(FeedItem {
            id: self.id,
            body,
            like_counter,
            comments,
        })
    }
}

impl Resolve for FeedItemBody {
    type Resolved = FeedItemBody<User>;

    fn resolve<S>(self, resolver: &ReferenceResolver<'_, S>) -> Result<Self::Resolved>
    where
        S: DocumentStorage + ?Sized,
    {
        match self {
            FeedItemBody::StatusUpdate { contents } => Ok(FeedItemBody::StatusUpdate {
                contents: contents.resolve(resolver)?,
            }),
        }
    }
}

impl Resolve for StatusUpdate {
    type Resolved = StatusUpdate<User>;

    fn resolve<S>(self, resolver: &ReferenceResolver<'_, S>) -> Result<Self::Resolved>
    where
        S: DocumentStorage + ?Sized,
    {
        Ok(StatusUpdate {
            author: resolver.user("contents.author", self.author)?,
            post_date: self.post_date,
            location: self.location,
            contents: self.contents,
            like_counter: self.like_counter,
        })
    }
}

impl Resolve for Comment {
    type Resolved = Comment<User>;

    fn resolve<S>(self, resolver: &ReferenceResolver<'_, S>) -> Result<Self::Resolved>
    where
        S: DocumentStorage + ?Sized,
    {
        Ok(Comment {
            author: resolver.user("comments.author", self.author)?,
            contents: self.contents,
            post_date: self.post_date,
            like_counter: self.like_counter,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{seed, MemStore};

    fn seeded() -> MemStore {
        let store = MemStore::new();
        seed::seed_demo_data(&store).unwrap();
        store
    }

    #[test]
    fn test_resolves_every_reference_in_order() {
        let store = seeded();
        let item: FeedItem = store.read_doc(1).unwrap();
        let resolved = ReferenceResolver::new(&store).resolve_feed_item(item).unwrap();

        assert_eq!(resolved.author().name, "Someone");
        let likers: Vec<_> = resolved.like_counter.iter().map(|u| u.id).collect();
        assert_eq!(likers, vec![2, 3]);
        let commenters: Vec<_> = resolved.comments.iter().map(|c| c.author.name.as_str()).collect();
        assert_eq!(commenters, vec!["Someone Else", "Another Person"]);
    }

    #[test]
    fn test_resolver_does_not_write() {
        let store = seeded();
        let before = store.read("feedItems", 1).unwrap();
        let item: FeedItem = store.read_doc(1).unwrap();
        ReferenceResolver::new(&store).resolve_feed_item(item).unwrap();
        assert_eq!(store.read("feedItems", 1).unwrap(), before);
    }

    #[test]
    fn test_missing_liker_is_dangling() {
        let store = seeded();
        store.delete("users", 3).unwrap();
        let item: FeedItem = store.read_doc(1).unwrap();
        let err = ReferenceResolver::new(&store).resolve_feed_item(item).unwrap_err();
        assert!(matches!(
            err,
            Error::DanglingReference { field: "likeCounter", id: 3, .. }
        ));
    }

    #[test]
    fn test_missing_author_is_dangling() {
        let store = seeded();
        store.delete("users", 1).unwrap();
        let item: FeedItem = store.read_doc(1).unwrap();
        let err = ReferenceResolver::new(&store).resolve_feed_item(item).unwrap_err();
        assert!(matches!(
            err,
            Error::DanglingReference { field: "contents.author", id: 1, .. }
        ));
    }

    #[test]
    fn test_missing_comment_author_is_dangling() {
        let store = seeded();
        let mut item: FeedItem = store.read_doc(1).unwrap();
        item.like_counter.clear();
        item.comments[1].author = 42;
        let err = ReferenceResolver::new(&store).resolve_feed_item(item).unwrap_err();
        assert!(matches!(
            err,
            Error::DanglingReference { field: "comments.author", id: 42, .. }
        ));
    }
}
