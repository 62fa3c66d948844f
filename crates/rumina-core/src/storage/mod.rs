//! Storage Module
//!
//! The Learner-Item State Store contract and its two implementations:
//! - [`MemoryStore`]: in-memory reference store, also the test workhorse
//! - [`SqliteStore`]: durable store on SQLite with WAL
//!
//! Any storage technology can sit behind [`StateStore`] as long as the
//! compare-and-swap is atomic per (user, item) record; that single property
//! is what the scheduler's correctness rests on.

mod memory;
pub(crate) mod migrations;
mod sqlite;

pub use memory::MemoryStore;
pub use migrations::MIGRATIONS;
pub use sqlite::SqliteStore;

use chrono::{DateTime, Utc};

use crate::state::LearnerItemState;

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Store error type
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Conditional write lost: the stored version no longer matches the
    /// version the writer read
    #[error("version conflict: expected version {expected}")]
    VersionConflict {
        /// The version the writer expected to replace
        expected: u64,
    },
    /// A record for this (user, item) already exists
    #[error("already tracked: user {user_id}, item {item_id}")]
    AlreadyTracked {
        /// The learner
        user_id: String,
        /// The item
        item_id: String,
    },
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// A stored record failed to decode
    #[error("invalid record: {0}")]
    InvalidRecord(String),
    /// The store cannot currently serve requests
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Store result type
pub type Result<T> = std::result::Result<T, StoreError>;

// ============================================================================
// STATE STORE CONTRACT
// ============================================================================

/// One entry in a due-item scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueItem {
    /// The due item's identifier
    pub item_id: String,
    /// When it became due
    pub due_at: DateTime<Utc>,
}

/// Capability the scheduler depends on: per-(user, item) records with
/// compare-and-swap semantics
///
/// `read`/`due_before`/`tracked_count` may observe a slightly stale
/// snapshot; `compare_and_swap` must be atomic per record so a stale reader
/// can never overwrite a newer write.
pub trait StateStore: Send + Sync {
    /// Read the current state for one (user, item), if tracked
    fn read(&self, user_id: &str, item_id: &str) -> Result<Option<LearnerItemState>>;

    /// Create the initial record for a newly attached item
    ///
    /// Fails with [`StoreError::AlreadyTracked`] if a record exists.
    fn create(&self, user_id: &str, item_id: &str, state: &LearnerItemState) -> Result<()>;

    /// Replace the record if and only if its stored version still equals
    /// `expected_version`
    ///
    /// Fails with [`StoreError::VersionConflict`] when a concurrent writer
    /// got there first (including the record disappearing mid-cycle).
    fn compare_and_swap(
        &self,
        user_id: &str,
        item_id: &str,
        expected_version: u64,
        new_state: &LearnerItemState,
    ) -> Result<()>;

    /// Items for `user_id` with `due_at <= as_of`, ordered by `due_at`
    /// ascending with `item_id` as the deterministic tiebreak, capped at
    /// `limit`
    fn due_before(&self, user_id: &str, as_of: DateTime<Utc>, limit: usize) -> Result<Vec<DueItem>>;

    /// Number of items tracked for this learner, due or not
    fn tracked_count(&self, user_id: &str) -> Result<u64>;
}
