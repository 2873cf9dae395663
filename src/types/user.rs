//! User documents

use crate::core::types::{collections, DocId};
use crate::storage::Document;
use serde::{Deserialize, Serialize};

/// A user and the id of the one feed it owns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Identifier within `users`
    pub id: DocId,
    /// Display name
    pub name: String,
    /// Identifier of this user's feed in `feeds`
    pub feed: DocId,
}

impl Document for User {
    const COLLECTION: &'static str = collections::USERS;

    fn id(&self) -> DocId {
        self.id
    }
}
