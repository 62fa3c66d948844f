//! SQLite State Store
//!
//! Durable [`StateStore`] on SQLite with WAL. Compare-and-swap is a
//! conditional `UPDATE ... WHERE version = ?`; SQLite serializes writers per
//! connection, so the affected-row count tells us atomically whether we won.
//!
//! Timestamps are stored as unix milliseconds so index scans over `due_at`
//! order chronologically.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};

use super::migrations::run_migrations;
use super::{DueItem, Result, StateStore, StoreError};
use crate::policy::Stage;
use crate::state::LearnerItemState;

/// SQLite-backed state store
///
/// All methods take `&self`; the connection lives behind a mutex so the
/// store is `Send + Sync` and can be shared as `Arc<SqliteStore>`.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) a store at the given path
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_connection(Connection::open(path)?)
    }

    /// Open an in-memory store, mainly for tests
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        Self::configure_connection(&conn)?;
        run_migrations(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Apply PRAGMAs to a connection
    fn configure_connection(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;",
        )?;
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Unavailable("connection lock poisoned".to_string()))
    }
}

fn millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

fn from_millis(ms: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| StoreError::InvalidRecord(format!("timestamp out of range: {ms}")))
}

fn stage_from_i64(value: i64) -> Result<Stage> {
    u8::try_from(value)
        .ok()
        .and_then(Stage::from_u8)
        .ok_or_else(|| StoreError::InvalidRecord(format!("stage out of range: {value}")))
}

impl StateStore for SqliteStore {
    fn read(&self, user_id: &str, item_id: &str) -> Result<Option<LearnerItemState>> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT stage, due_at, last_reviewed_at, consecutive_correct, version
                 FROM learner_item_state
                 WHERE user_id = ?1 AND item_id = ?2",
                params![user_id, item_id],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, Option<i64>>(2)?,
                        row.get::<_, i64>(3)?,
                        row.get::<_, i64>(4)?,
                    ))
                },
            )
            .optional()?;

        match row {
            None => Ok(None),
            Some((stage, due_at, last_reviewed_at, consecutive_correct, version)) => {
                Ok(Some(LearnerItemState {
                    stage: stage_from_i64(stage)?,
                    due_at: from_millis(due_at)?,
                    last_reviewed_at: last_reviewed_at.map(from_millis).transpose()?,
                    consecutive_correct: u32::try_from(consecutive_correct).map_err(|_| {
                        StoreError::InvalidRecord(format!(
                            "consecutive_correct out of range: {consecutive_correct}"
                        ))
                    })?,
                    version: u64::try_from(version).map_err(|_| {
                        StoreError::InvalidRecord(format!("version out of range: {version}"))
                    })?,
                }))
            }
        }
    }

    fn create(&self, user_id: &str, item_id: &str, state: &LearnerItemState) -> Result<()> {
        let conn = self.lock()?;
        let result = conn.execute(
            "INSERT INTO learner_item_state
                 (user_id, item_id, stage, due_at, last_reviewed_at, consecutive_correct, version)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                user_id,
                item_id,
                state.stage.as_u8(),
                millis(state.due_at),
                state.last_reviewed_at.map(millis),
                state.consecutive_correct,
                state.version as i64,
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == ErrorCode::ConstraintViolation =>
            {
                Err(StoreError::AlreadyTracked {
                    user_id: user_id.to_string(),
                    item_id: item_id.to_string(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    fn compare_and_swap(
        &self,
        user_id: &str,
        item_id: &str,
        expected_version: u64,
        new_state: &LearnerItemState,
    ) -> Result<()> {
        let conn = self.lock()?;
        let updated = conn.execute(
            "UPDATE learner_item_state
             SET stage = ?1, due_at = ?2, last_reviewed_at = ?3,
                 consecutive_correct = ?4, version = ?5
             WHERE user_id = ?6 AND item_id = ?7 AND version = ?8",
            params![
                new_state.stage.as_u8(),
                millis(new_state.due_at),
                new_state.last_reviewed_at.map(millis),
                new_state.consecutive_correct,
                new_state.version as i64,
                user_id,
                item_id,
                expected_version as i64,
            ],
        )?;

        if updated == 0 {
            return Err(StoreError::VersionConflict {
                expected: expected_version,
            });
        }
        Ok(())
    }

    fn due_before(&self, user_id: &str, as_of: DateTime<Utc>, limit: usize) -> Result<Vec<DueItem>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT item_id, due_at
             FROM learner_item_state
             WHERE user_id = ?1 AND due_at <= ?2
             ORDER BY due_at ASC, item_id ASC
             LIMIT ?3",
        )?;

        let rows = stmt.query_map(params![user_id, millis(as_of), limit as i64], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        let mut due = Vec::new();
        for row in rows {
            let (item_id, due_at) = row?;
            due.push(DueItem {
                item_id,
                due_at: from_millis(due_at)?,
            });
        }
        Ok(due)
    }

    fn tracked_count(&self, user_id: &str) -> Result<u64> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM learner_item_state WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}

// ============================================================================
// TESTS
// ============================================================================
