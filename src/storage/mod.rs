//! Storage layer for the feed store
//!
//! This module provides the storage abstraction that the resolver, the
//! aggregator and the mutation operations are written against.
//!
//! Documents are JSON objects carrying a numeric `id` that is unique within
//! their collection. The primitives are deliberately coarse: a document is
//! read as a copy and written back whole. Read-modify-write sequences that
//! must not lose updates take the lock returned by
//! [`DocumentStorage::lock`] around the whole sequence.

use crate::core::error::Result;
use crate::core::types::DocId;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Stripe-based mutation locks
pub mod locks;

/// In-memory store (DashMap of JSON documents per collection)
pub mod mem_store;

/// Store construction from configuration
pub mod factory;

/// Demo data set
pub mod seed;

pub use factory::{create_shared_storage, create_storage, SharedStorage};
pub use locks::{CascadeExclusive, CascadeShared, DocumentGuard, LockTable};
pub use mem_store::MemStore;

/// Trait for document storage implementations
///
/// Every method is atomic on its own and immediately visible to subsequent
/// reads. Nothing here cascades across collections.
pub trait DocumentStorage: Send + Sync {
    /// Get a copy of a document
    ///
    /// # Errors
    ///
    /// * `NotFound` - If `id` is absent from `collection`
    fn read(&self, collection: &str, id: DocId) -> Result<Value>;

    /// Replace an existing document wholesale
    ///
    /// The document's own `id` field selects what gets replaced; a write never
    /// creates a document.
    ///
    /// # Errors
    ///
    /// * `InvariantViolation` - If the document is not an object or has no numeric `id`
    /// * `NotFound` - If the id does not exist in `collection`
    fn write(&self, collection: &str, document: Value) -> Result<Value>;

    /// Store a new document under the next unused id of `collection`
    ///
    /// Ids start at 1, grow monotonically and are never handed out twice,
    /// even after the document holding one is deleted.
    ///
    /// # Errors
    ///
    /// * `InvariantViolation` - If the document is not an object or already carries an `id`
    fn add(&self, collection: &str, document: Value) -> Result<Value>;

    /// Remove a document
    ///
    /// # Errors
    ///
    /// * `NotFound` - If `id` is absent from `collection`
    fn delete(&self, collection: &str, id: DocId) -> Result<()>;

    /// Snapshot of a whole collection, ordered by id. Unknown collections are empty.
    ///
    /// Meant for bulk scans such as cascade cleanup; prefer [`read`](Self::read).
    fn get_collection(&self, collection: &str) -> BTreeMap<DocId, Value>;

    /// Number of documents currently in `collection`
    fn document_count(&self, collection: &str) -> usize;

    /// Names of every collection that has been written to
    fn collection_names(&self) -> Vec<String>;

    /// Serialize read-modify-write sequences on one document
    ///
    /// The guard must be held from the read through the write-back. Callers
    /// never hold more than one guard at a time.
    fn lock(&self, collection: &str, id: DocId) -> DocumentGuard<'_>;

    /// Shared side of the cascade gate, held while a new id is linked into a feed
    ///
    /// Taken before any [`lock`](Self::lock) guard.
    fn cascade_shared(&self) -> CascadeShared<'_>;

    /// Exclusive side of the cascade gate, held across a delete and its cleanup
    fn cascade_exclusive(&self) -> CascadeExclusive<'_>;
}

/// A typed model stored in a fixed collection
pub trait Document: Serialize + DeserializeOwned {
    /// Collection the model lives in
    const COLLECTION: &'static str;

    /// The document's id
    fn id(&self) -> DocId;
}

/// Typed access on top of the JSON primitives
pub trait DocumentStorageExt: DocumentStorage {
    /// Read and decode a document
    fn read_doc<T: Document>(&self, id: DocId) -> Result<T> {
        let value = self.read(T::COLLECTION, id)?;
        Ok(serde_json::from_value(value)?)
    }

    /// Encode and write back a document
    fn write_doc<T: Document>(&self, document: &T) -> Result<()> {
        self.write(T::COLLECTION, serde_json::to_value(document)?)?;
        Ok(())
    }

    /// Add an id-less draft to `T`'s collection and decode the stored result
    fn add_doc<T: Document, D: Serialize>(&self, draft: &D) -> Result<T> {
        let stored = self.add(T::COLLECTION, serde_json::to_value(draft)?)?;
        Ok(serde_json::from_value(stored)?)
    }

    /// Guard for a typed document
    fn lock_doc<T: Document>(&self, id: DocId) -> DocumentGuard<'_> {
        self.lock(T::COLLECTION, id)
    }
}

impl<S: DocumentStorage + ?Sized> DocumentStorageExt for S {}

/// Extract the numeric `id` of a stored document
pub fn document_id(document: &Value) -> Option<DocId> {
    document.get("id").and_then(Value::as_u64)
}
