//! Feed documents
//!
//! A feed is an ordered list of feed item ids, most recent first. The same
//! shape carries hydrated items once the aggregator has resolved them.

use crate::core::types::{collections, DocId};
use crate::storage::Document;
use crate::types::feed_item::HydratedFeedItem;
use serde::{Deserialize, Serialize};

/// A user's feed; `T` is a feed item id when stored, a hydrated item when presented
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feed<T = DocId> {
    /// Identifier within `feeds`
    pub id: DocId,
    /// Feed items, most recent first
    pub contents: Vec<T>,
}

/// Feed with every item resolved
pub type HydratedFeed = Feed<HydratedFeedItem>;

impl Feed {
    /// Put `item` at the front of the feed. Returns false if it was already present.
    pub fn prepend(&mut self, item: DocId) -> bool {
        if self.contents.contains(&item) {
            return false;
        }
        self.contents.insert(0, item);
        true
    }

    /// Drop `item` from the feed. Returns true if anything was removed.
    pub fn remove(&mut self, item: DocId) -> bool {
        let before = self.contents.len();
        self.contents.retain(|id| *id != item);
        self.contents.len() != before
    }
}

impl Document for Feed {
    const COLLECTION: &'static str = collections::FEEDS;

    fn id(&self) -> DocId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepend_keeps_most_recent_first() {
        let mut feed = Feed { id: 1, contents: vec![3, 1] };
        assert!(feed.prepend(7));
        assert_eq!(feed.contents, vec![7, 3, 1]);
    }

    #[test]
    fn test_prepend_is_membership() {
        let mut feed = Feed { id: 1, contents: vec![3, 1] };
        assert!(!feed.prepend(1));
        assert_eq!(feed.contents, vec![3, 1]);
    }

    #[test]
    fn test_remove() {
        let mut feed = Feed { id: 1, contents: vec![3, 2, 1] };
        assert!(feed.remove(2));
        assert!(!feed.remove(2));
        assert_eq!(feed.contents, vec![3, 1]);
    }
}
