//! Error types and handling for the feed store
//!
//! This module defines all error types used throughout the system. Every
//! failure is returned to the immediate caller; nothing inside the core retries.

use crate::core::types::DocId;
use thiserror::Error;

/// Main result type used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the feed store
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested id is absent from its collection
    #[error("Document not found: {collection}/{id}")]
    NotFound {
        /// Collection that was searched
        collection: String,
        /// Missing document id
        id: DocId,
    },

    /// Comment index is past the end of a feed item's comment thread
    #[error("Comment {index} not found on feed item {feed_item}")]
    CommentNotFound {
        /// Feed item that owns the thread
        feed_item: DocId,
        /// Requested position in the thread
        index: usize,
    },

    /// A foreign key points at a document that no longer exists
    #[error("Dangling reference: {field} -> {collection}/{id}")]
    DanglingReference {
        /// Field holding the foreign key, e.g. `contents.author`
        field: &'static str,
        /// Collection the key points into
        collection: String,
        /// The id that could not be resolved
        id: DocId,
    },

    /// Caller broke a store contract (write without id, add with id, ...)
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// Acting principal does not own the document it tries to change
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Stored document could not be mapped to or from its typed model
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O errors from std
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Prometheus metrics errors
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a not found error
    pub fn not_found(collection: impl Into<String>, id: DocId) -> Self {
        Self::NotFound {
            collection: collection.into(),
            id,
        }
    }

    /// Create a dangling reference error
    pub fn dangling(field: &'static str, collection: impl Into<String>, id: DocId) -> Self {
        Self::DanglingReference {
            field,
            collection: collection.into(),
            id,
        }
    }

    /// Create an invariant violation error
    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    /// Create a permission error
    pub fn permission(msg: impl Into<String>) -> Self {
        Self::PermissionDenied(msg.into())
    }

    /// Turn a `NotFound` produced while following a foreign key into a
    /// `DanglingReference` naming the field that held the key.
    pub fn into_dangling(self, field: &'static str) -> Self {
        match self {
            Error::NotFound { collection, id } => Error::DanglingReference {
                field,
                collection,
                id,
            },
            other => other,
        }
    }

    /// Check if this is a client error (4xx equivalent)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::NotFound { .. }
                | Error::CommentNotFound { .. }
                | Error::InvariantViolation(_)
                | Error::PermissionDenied(_)
        )
    }

    /// Check if this error means stored data references something that is gone
    pub fn is_data_integrity_fault(&self) -> bool {
        matches!(self, Error::DanglingReference { .. } | Error::Serialization(_))
    }
}
