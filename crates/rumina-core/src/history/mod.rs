//! History Recorder
//!
//! Append-only sink for [`ReviewEvent`]s. History is auxiliary data, not a
//! transactional partner: the scheduler commits the state change first and
//! then appends, and an append failure never rolls the state back. Delivery
//! is therefore at-least-once; consumers deduplicate by
//! (user_id, item_id, at).

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection};

use crate::state::ReviewEvent;

// ============================================================================
// ERROR TYPES
// ============================================================================

/// History sink error type
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    /// The sink cannot currently accept events
    #[error("history sink unavailable: {0}")]
    Unavailable(String),
    /// A stored event failed to decode
    #[error("invalid event: {0}")]
    InvalidEvent(String),
}

/// History result type
pub type Result<T> = std::result::Result<T, HistoryError>;

// ============================================================================
// SINK CONTRACT
// ============================================================================

/// Append-only review-event sink
///
/// Implementations must either persist the event or return an error; a
/// silent drop is a contract violation. Retrying failed appends is the
/// collaborator's job, never the scheduler's.
pub trait HistorySink: Send + Sync {
    /// Append one immutable review event
    fn append(&self, event: &ReviewEvent) -> Result<()>;
}

// ============================================================================
// IN-MEMORY SINK
// ============================================================================

/// In-memory history, append-only
///
/// The event log is only ever extended; the accessors hand out clones so
/// callers cannot mutate recorded history.
#[derive(Debug, Default)]
pub struct MemoryHistory {
    events: Mutex<Vec<ReviewEvent>>,
}

impl MemoryHistory {
    /// Create an empty history
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded events, in append order
    pub fn events(&self) -> Vec<ReviewEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Events for one (user, item), in append order
    pub fn events_for(&self, user_id: &str, item_id: &str) -> Vec<ReviewEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.user_id == user_id && e.item_id == item_id)
            .collect()
    }

    /// Total number of recorded events
    pub fn len(&self) -> usize {
        self.events.lock().map(|e| e.len()).unwrap_or(0)
    }

    /// Whether no events have been recorded
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl HistorySink for MemoryHistory {
    fn append(&self, event: &ReviewEvent) -> Result<()> {
        let mut events = self
            .events
            .lock()
            .map_err(|_| HistoryError::Unavailable("event log lock poisoned".to_string()))?;
        events.push(event.clone());
        Ok(())
    }
}

// ============================================================================
// SQLITE SINK
// ============================================================================

/// SQLite-backed history sink
///
/// Appends are `INSERT OR IGNORE` keyed on (user_id, item_id, at), which
/// makes redelivered events naturally idempotent.
pub struct SqliteHistory {
    conn: Mutex<Connection>,
}

impl SqliteHistory {
    /// Open (or create) a history log at the given path
    ///
    /// Shares the schema with [`crate::storage::SqliteStore`]; pointing both
    /// at the same file is the expected setup.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA busy_timeout = 5000;",
        )?;
        crate::storage::migrations::run_migrations(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Events for one (user, item), oldest first
    pub fn events_for(&self, user_id: &str, item_id: &str) -> Result<Vec<ReviewEvent>> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| HistoryError::Unavailable("connection lock poisoned".to_string()))?;
        let mut stmt = conn.prepare(
            "SELECT at, outcome, stage_before, stage_after
             FROM review_events
             WHERE user_id = ?1 AND item_id = ?2
             ORDER BY at ASC",
        )?;
        let rows = stmt.query_map(params![user_id, item_id], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, i64>(3)?,
            ))
        })?;

        let mut events = Vec::new();
        for row in rows {
            let (at, outcome, stage_before, stage_after) = row?;
            let decode = |v: i64| {
                u8::try_from(v)
                    .ok()
                    .and_then(crate::policy::Stage::from_u8)
                    .ok_or_else(|| HistoryError::InvalidEvent(format!("stage out of range: {v}")))
            };
            events.push(ReviewEvent {
                user_id: user_id.to_string(),
                item_id: item_id.to_string(),
                at: chrono::DateTime::from_timestamp_millis(at).ok_or_else(|| {
                    HistoryError::InvalidEvent(format!("timestamp out of range: {at}"))
                })?,
                outcome: crate::policy::Outcome::parse_name(&outcome).ok_or_else(|| {
                    HistoryError::InvalidEvent(format!("unknown outcome: {outcome}"))
                })?,
                stage_before: decode(stage_before)?,
                stage_after: decode(stage_after)?,
            });
        }
        Ok(events)
    }
}

impl HistorySink for SqliteHistory {
    fn append(&self, event: &ReviewEvent) -> Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| HistoryError::Unavailable("connection lock poisoned".to_string()))?;
        conn.execute(
            "INSERT OR IGNORE INTO review_events
                 (user_id, item_id, at, outcome, stage_before, stage_after)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                event.user_id,
                event.item_id,
                event.at.timestamp_millis(),
                event.outcome.as_str(),
                event.stage_before.as_u8(),
                event.stage_after.as_u8(),
            ],
        )?;
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
