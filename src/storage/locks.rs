//! Mutation locks
//!
//! A fixed array of mutexes that `(collection, id)` keys hash onto. Two keys
//! sharing a stripe only serialize more than strictly needed, and since a
//! caller holds at most one guard at a time there is no lock ordering to get
//! wrong. With [`LockGranularity::Collection`] the id is left out of the hash,
//! so every document of a collection shares one stripe.
//!
//! Next to the stripes sits the cascade gate. Operations that put a feed item
//! id into a feed hold it shared; a cascade delete holds it exclusively from
//! the delete through the last feed write-back. The gate is always taken
//! before any stripe.

use crate::core::config::LockGranularity;
use crate::core::types::DocId;
use parking_lot::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Held for the duration of a read-modify-write sequence
pub type DocumentGuard<'a> = MutexGuard<'a, ()>;

/// Held while linking a new item into a feed
pub type CascadeShared<'a> = RwLockReadGuard<'a, ()>;

/// Held for the whole of a cascade delete
pub type CascadeExclusive<'a> = RwLockWriteGuard<'a, ()>;

/// Striped lock table
#[derive(Debug)]
pub struct LockTable {
    granularity: LockGranularity,
    stripes: Box<[Mutex<()>]>,
    cascade: RwLock<()>,
}

impl LockTable {
    /// Create a table with `stripes` mutexes (at least one)
    pub fn new(granularity: LockGranularity, stripes: usize) -> Self {
        let stripes = (0..stripes.max(1)).map(|_| Mutex::new(())).collect();
        Self {
            granularity,
            stripes,
            cascade: RwLock::new(()),
        }
    }

    /// Configured lock scope
    pub fn granularity(&self) -> LockGranularity {
        self.granularity
    }

    /// Block until the stripe for `(collection, id)` is free and take it
    pub fn acquire(&self, collection: &str, id: DocId) -> DocumentGuard<'_> {
        self.stripes[self.stripe_for(collection, id)].lock()
    }

    /// Enter the cascade gate alongside other linking operations
    pub fn cascade_shared(&self) -> CascadeShared<'_> {
        self.cascade.read()
    }

    /// Enter the cascade gate alone
    pub fn cascade_exclusive(&self) -> CascadeExclusive<'_> {
        self.cascade.write()
    }

    fn stripe_for(&self, collection: &str, id: DocId) -> usize {
        let mut hasher = DefaultHasher::new();
        collection.hash(&mut hasher);
        if self.granularity == LockGranularity::Document {
            id.hash(&mut hasher);
        }
        (hasher.finish() % self.stripes.len() as u64) as usize
    }
}
