//! In-memory document store using DashMap
//!
//! Each collection is a `DashMap` of JSON documents with its own id counter.
//! Collections spring into existence on first `add`. The store is volatile:
//! nothing survives the process.

use crate::core::config::{LockGranularity, StoreConfig};
use crate::core::error::{Error, Result};
use crate::core::types::DocId;
use crate::storage::locks::{CascadeExclusive, CascadeShared, DocumentGuard, LockTable};
use crate::storage::{document_id, DocumentStorage};
use crate::system::metrics::Metrics;
use dashmap::DashMap;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// One named collection
#[derive(Debug)]
struct Collection {
    /// Map of document id to JSON document
    documents: DashMap<DocId, Value>,

    /// Next id to hand out; only ever increases
    next_id: AtomicU64,
}

impl Collection {
    fn new() -> Self {
        Self {
            documents: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }
}

/// In-memory store owning every collection
#[derive(Debug)]
pub struct MemStore {
    /// Collection name to collection
    collections: DashMap<String, Arc<Collection>>,

    /// Locks for read-modify-write sequences
    locks: LockTable,
}

impl MemStore {
    /// Create an empty store with default lock settings
    pub fn new() -> Self {
        Self::with_config(&StoreConfig::default())
    }

    /// Create an empty store with the lock settings from `config`
    pub fn with_config(config: &StoreConfig) -> Self {
        Self {
            collections: DashMap::new(),
            locks: LockTable::new(config.lock_granularity, config.lock_stripes),
        }
    }

    /// Scope of the locks handed out by [`DocumentStorage::lock`]
    pub fn lock_granularity(&self) -> LockGranularity {
        self.locks.granularity()
    }

    /// Total number of documents across every collection
    pub fn total_document_count(&self) -> usize {
        self.collections
            .iter()
            .map(|entry| entry.value().documents.len())
            .sum()
    }

    fn collection(&self, name: &str) -> Option<Arc<Collection>> {
        self.collections.get(name).map(|entry| Arc::clone(entry.value()))
    }

    fn collection_or_create(&self, name: &str) -> Arc<Collection> {
        if let Some(collection) = self.collection(name) {
            return collection;
        }
        Arc::clone(
            self.collections
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(Collection::new()))
                .value(),
        )
    }
}

impl Default for MemStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentStorage for MemStore {
    fn read(&self, collection: &str, id: DocId) -> Result<Value> {
        Metrics::global().documents_read.inc();
        self.collection(collection)
            .and_then(|c| c.documents.get(&id).map(|doc| doc.value().clone()))
            .ok_or_else(|| Error::not_found(collection, id))
    }

    fn write(&self, collection: &str, document: Value) -> Result<Value> {
        if !document.is_object() {
            return Err(Error::invariant(format!(
                "Cannot write a non-object document to {}",
                collection
            )));
        }
        let id = document_id(&document).ok_or_else(|| {
            Error::invariant(format!("Cannot write a document without an id to {}", collection))
        })?;

        let target = self
            .collection(collection)
            .ok_or_else(|| Error::not_found(collection, id))?;

        let mut slot = target
            .documents
            .get_mut(&id)
            .ok_or_else(|| Error::not_found(collection, id))?;
        *slot = document.clone();
        drop(slot);

        Metrics::global().documents_written.inc();
        debug!(collection, id, "Document written");
        Ok(document)
    }

    fn add(&self, collection: &str, mut document: Value) -> Result<Value> {
        let fields = document.as_object_mut().ok_or_else(|| {
            Error::invariant(format!("Cannot add a non-object document to {}", collection))
        })?;
        if fields.get("id").map_or(false, |id| !id.is_null()) {
            return Err(Error::invariant(format!(
                "Document added to {} already carries an id",
                collection
            )));
        }

        let target = self.collection_or_create(collection);
        let id = target.next_id.fetch_add(1, Ordering::SeqCst);
        fields.insert("id".to_string(), Value::from(id));

        target.documents.insert(id, document.clone());

        Metrics::global().documents_added.inc();
        debug!(collection, id, "Document added");
        Ok(document)
    }

    fn delete(&self, collection: &str, id: DocId) -> Result<()> {
        self.collection(collection)
            .and_then(|c| c.documents.remove(&id))
            .ok_or_else(|| Error::not_found(collection, id))?;

        Metrics::global().documents_deleted.inc();
        debug!(collection, id, "Document deleted");
        Ok(())
    }

    fn get_collection(&self, collection: &str) -> BTreeMap<DocId, Value> {
        self.collection(collection)
            .map(|c| {
                c.documents
                    .iter()
                    .map(|entry| (*entry.key(), entry.value().clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn document_count(&self, collection: &str) -> usize {
        self.collection(collection).map_or(0, |c| c.documents.len())
    }

    fn collection_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.collections.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    fn lock(&self, collection: &str, id: DocId) -> DocumentGuard<'_> {
        self.locks.acquire(collection, id)
    }

    fn cascade_shared(&self) -> CascadeShared<'_> {
        self.locks.cascade_shared()
    }

    fn cascade_exclusive(&self) -> CascadeExclusive<'_> {
        self.locks.cascade_exclusive()
    }
}
