//! Demo data set
//!
//! Four users with one feed each. User 4's feed holds a single status update
//! by user 1, liked by users 2 and 3, with two comments.

use crate::core::error::{Error, Result};
use crate::core::types::{collections, DocId};
use crate::storage::{document_id, DocumentStorage};
use serde_json::{json, Value};
use tracing::debug;

const USER_NAMES: [&str; 4] = ["Someone", "Someone Else", "Another Person", "John Vilk"];

/// Populate `store` with the demo data set. Expects empty collections.
pub fn seed_demo_data<S: DocumentStorage + ?Sized>(store: &S) -> Result<()> {
    let mut feeds = Vec::with_capacity(USER_NAMES.len());
    let mut users = Vec::with_capacity(USER_NAMES.len());

    for name in USER_NAMES {
        let feed = assigned_id(store.add(collections::FEEDS, json!({ "contents": [] }))?)?;
        let user = assigned_id(store.add(
            collections::USERS,
            json!({ "name": name, "feed": feed }),
        )?)?;
        feeds.push(feed);
        users.push(user);
    }

    let status = store.add(
        collections::FEED_ITEMS,
        json!({
            "type": "statusUpdate",
            "contents": {
                "author": users[0],
                "postDate": 1453668480000i64,
                "location": "Austin, TX",
                "contents": "ugh.",
                "likeCounter": []
            },
            "likeCounter": [users[1], users[2]],
            "comments": [
                {
                    "author": users[1],
                    "contents": "hope everything is ok!",
                    "postDate": 1453690800000i64,
                    "likeCounter": []
                },
                {
                    "author": users[2],
                    "contents": "sending hugs your way",
                    "postDate": 1453690800000i64,
                    "likeCounter": []
                }
            ]
        }),
    )?;
    let status = assigned_id(status)?;

    store.write(collections::FEEDS, json!({ "id": feeds[3], "contents": [status] }))?;

    debug!(users = users.len(), feeds = feeds.len(), "Demo data seeded");
    Ok(())
}

fn assigned_id(document: Value) -> Result<DocId> {
    document_id(&document).ok_or_else(|| Error::invariant("Stored document has no id"))
}
