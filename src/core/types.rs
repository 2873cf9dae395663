//! Shared identifier and time types

/// Document identifier, unique within a collection and never reused
pub type DocId = u64;

/// Milliseconds since the Unix epoch
pub type Timestamp = i64;

/// Well-known collection names
pub mod collections {
    /// User documents
    pub const USERS: &str = "users";
    /// One feed per user
    pub const FEEDS: &str = "feeds";
    /// Status updates and other feed entries
    pub const FEED_ITEMS: &str = "feedItems";
}

/// Current wall-clock time as a [`Timestamp`]
pub fn now_millis() -> Timestamp {
    chrono::Utc::now().timestamp_millis()
}
