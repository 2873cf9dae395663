//! Feed item documents
//!
//! Stored shape:
//!
//! ```json
//! {
//!   "id": 1,
//!   "type": "statusUpdate",
//!   "contents": { "author": 1, "postDate": 1453668480000, "location": "Austin, TX",
//!                 "contents": "ugh.", "likeCounter": [] },
//!   "likeCounter": [2, 3],
//!   "comments": [ { "author": 2, "contents": "hope everything is ok!",
//!                   "postDate": 1453690800000, "likeCounter": [] } ]
//! }
//! ```
//!
//! Every type here is generic over `U`, the representation of a user
//! reference: a [`DocId`] when stored, a [`User`] once hydrated.

use crate::core::types::{collections, DocId, Timestamp};
use crate::storage::Document;
use crate::types::user::User;
use serde::{Deserialize, Serialize};

/// A feed entry. The `type` tag and `contents` live in [`FeedItemBody`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedItem<U = DocId> {
    /// Identifier within `feedItems`
    pub id: DocId,
    /// Kind-specific payload, tagged by `type`
    #[serde(flatten)]
    pub body: FeedItemBody<U>,
    /// Users who liked the item; each at most once
    pub like_counter: Vec<U>,
    /// Comment thread, oldest first; comments are addressed by position
    pub comments: Vec<Comment<U>>,
}

/// Kind-specific part of a feed item, selected by the `type` tag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FeedItemBody<U = DocId> {
    /// A text post with a location
    StatusUpdate {
        /// Post payload
        contents: StatusUpdate<U>,
    },
}

/// Payload of a `statusUpdate` item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate<U = DocId> {
    /// Author of the post
    pub author: U,
    /// Creation time
    pub post_date: Timestamp,
    /// Free-form location label
    pub location: String,
    /// Post text
    pub contents: String,
    /// Nested like list carried by the payload; never resolved
    #[serde(default)]
    pub like_counter: Vec<DocId>,
}

/// A comment on a feed item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment<U = DocId> {
    /// Comment author
    pub author: U,
    /// Comment text
    pub contents: String,
    /// Creation time
    pub post_date: Timestamp,
    /// Users who liked the comment; each at most once, never resolved
    #[serde(default)]
    pub like_counter: Vec<DocId>,
}

/// A feed item without an id, ready to be handed to `add`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFeedItem {
    #[serde(flatten)]
    body: FeedItemBody,
    like_counter: Vec<DocId>,
    comments: Vec<Comment>,
}

/// Feed item with the author, likers and comment authors resolved
pub type HydratedFeedItem = FeedItem<User>;

/// Comment with its author resolved
pub type HydratedComment = Comment<User>;

impl<U> FeedItem<U> {
    /// Author of the item
    pub fn author(&self) -> &U {
        match &self.body {
            FeedItemBody::StatusUpdate { contents } => &contents.author,
        }
    }

    /// Searchable text of the item
    pub fn text(&self) -> &str {
        match &self.body {
            FeedItemBody::StatusUpdate { contents } => &contents.contents,
        }
    }

    /// Creation time of the item
    pub fn post_date(&self) -> Timestamp {
        match &self.body {
            FeedItemBody::StatusUpdate { contents } => contents.post_date,
        }
    }

    /// Replace the item text
    pub fn set_text(&mut self, text: impl Into<String>) {
        match &mut self.body {
            FeedItemBody::StatusUpdate { contents } => contents.contents = text.into(),
        }
    }

    /// Case-insensitive substring match against the item text
    pub fn matches(&self, query: &str) -> bool {
        self.text().to_lowercase().contains(&query.to_lowercase())
    }
}

impl FeedItem {
    /// Record a like. Returns false if `user` already liked the item.
    pub fn like(&mut self, user: DocId) -> bool {
        add_like(&mut self.like_counter, user)
    }

    /// Withdraw a like. Returns false if `user` had not liked the item.
    pub fn unlike(&mut self, user: DocId) -> bool {
        remove_like(&mut self.like_counter, user)
    }

    /// Comment at `index`, if the thread is that long
    pub fn comment_mut(&mut self, index: usize) -> Option<&mut Comment> {
        self.comments.get_mut(index)
    }
}

impl Document for FeedItem {
    const COLLECTION: &'static str = collections::FEED_ITEMS;

    fn id(&self) -> DocId {
        self.id
    }
}

impl Comment {
    /// Fresh comment with no likes
    pub fn new(author: DocId, contents: impl Into<String>, post_date: Timestamp) -> Self {
        Self {
            author,
            contents: contents.into(),
            post_date,
            like_counter: Vec::new(),
        }
    }

    /// Record a like. Returns false if `user` already liked the comment.
    pub fn like(&mut self, user: DocId) -> bool {
        add_like(&mut self.like_counter, user)
    }

    /// Withdraw a like. Returns false if `user` had not liked the comment.
    pub fn unlike(&mut self, user: DocId) -> bool {
        remove_like(&mut self.like_counter, user)
    }
}

impl NewFeedItem {
    /// Status update with no likes and no comments
    pub fn status_update(
        author: DocId,
        location: impl Into<String>,
        text: impl Into<String>,
        post_date: Timestamp,
    ) -> Self {
        Self {
            body: FeedItemBody::StatusUpdate {
                contents: StatusUpdate {
                    author,
                    post_date,
                    location: location.into(),
                    contents: text.into(),
                    like_counter: Vec::new(),
                },
            },
            like_counter: Vec::new(),
            comments: Vec::new(),
        }
    }
}

fn add_like(list: &mut Vec<DocId>, user: DocId) -> bool {
    if list.contains(&user) {
        return false;
    }
    list.push(user);
    true
}

fn remove_like(list: &mut Vec<DocId>, user: DocId) -> bool {
    let before = list.len();
    list.retain(|id| *id != user);
    list.len() != before
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn stored_item() -> serde_json::Value {
        json!({
            "id": 1,
            "type": "statusUpdate",
            "contents": {
                "author": 1,
                "postDate": 1453668480000i64,
                "location": "Austin, TX",
                "contents": "ugh.",
                "likeCounter": []
            },
            "likeCounter": [2, 3],
            "comments": [{
                "author": 2,
                "contents": "hope everything is ok!",
                "postDate": 1453690800000i64,
                "likeCounter": []
            }]
        })
    }

    #[test]
    fn test_stored_shape_parses() {
        let item: FeedItem = serde_json::from_value(stored_item()).unwrap();
        assert_eq!(item.id, 1);
        assert_eq!(*item.author(), 1);
        assert_eq!(item.text(), "ugh.");
        assert_eq!(item.like_counter, vec![2, 3]);
        assert_eq!(item.comments.len(), 1);
        assert_eq!(item.comments[0].author, 2);
    }

    #[test]
    fn test_serializes_with_type_tag() {
        let item: FeedItem = serde_json::from_value(stored_item()).unwrap();
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["type"], "statusUpdate");
        assert_eq!(value["contents"]["postDate"], 1453668480000i64);
        assert_eq!(value, stored_item());
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let mut value = stored_item();
        value["type"] = json!("photo");
        assert!(serde_json::from_value::<FeedItem>(value).is_err());
    }

    #[test]
    fn test_new_feed_item_has_no_id() {
        let draft = NewFeedItem::status_update(4, "NYC", "hello", 10);
        let value = serde_json::to_value(&draft).unwrap();
        assert!(value.get("id").is_none());
        assert_eq!(value["type"], "statusUpdate");
        assert_eq!(value["contents"]["author"], 4);
        assert_eq!(value["likeCounter"], json!([]));
        assert_eq!(value["comments"], json!([]));
    }

    #[test]
    fn test_like_is_membership() {
        let mut item: FeedItem = serde_json::from_value(stored_item()).unwrap();
        assert!(item.like(4));
        assert!(!item.like(4));
        assert_eq!(item.like_counter, vec![2, 3, 4]);
        assert!(item.unlike(2));
        assert!(!item.unlike(2));
        assert_eq!(item.like_counter, vec![3, 4]);
    }

    #[test]
    fn test_matches_ignores_case() {
        let mut item: FeedItem = serde_json::from_value(stored_item()).unwrap();
        item.set_text("Hello World");
        assert!(item.matches("WORLD"));
        assert!(item.matches("lo wo"));
        assert!(!item.matches("bye"));
    }
}
