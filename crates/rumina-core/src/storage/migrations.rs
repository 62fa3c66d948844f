//! Database Migrations
//!
//! Schema migration definitions for the SQLite store.

use rusqlite::Connection;

/// Migration definitions
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "Initial schema: learner item state and review events",
        up: MIGRATION_V1_UP,
    },
    Migration {
        version: 2,
        description: "Index for due-item scans",
        up: MIGRATION_V2_UP,
    },
];

/// A single schema migration
pub struct Migration {
    /// Target schema version after applying
    pub version: i32,
    /// Human-readable description
    pub description: &'static str,
    /// SQL to apply
    pub up: &'static str,
}

const MIGRATION_V1_UP: &str = "
    CREATE TABLE IF NOT EXISTS learner_item_state (
        user_id             TEXT    NOT NULL,
        item_id             TEXT    NOT NULL,
        stage               INTEGER NOT NULL,
        due_at              INTEGER NOT NULL,
        last_reviewed_at    INTEGER,
        consecutive_correct INTEGER NOT NULL DEFAULT 0,
        version             INTEGER NOT NULL DEFAULT 1,
        PRIMARY KEY (user_id, item_id)
    );

    CREATE TABLE IF NOT EXISTS review_events (
        user_id      TEXT    NOT NULL,
        item_id      TEXT    NOT NULL,
        at           INTEGER NOT NULL,
        outcome      TEXT    NOT NULL,
        stage_before INTEGER NOT NULL,
        stage_after  INTEGER NOT NULL,
        PRIMARY KEY (user_id, item_id, at)
    );
";

const MIGRATION_V2_UP: &str = "
    CREATE INDEX IF NOT EXISTS idx_state_user_due
        ON learner_item_state (user_id, due_at, item_id);
";

/// Apply any pending migrations, tracked via `PRAGMA user_version`
pub fn run_migrations(conn: &Connection) -> rusqlite::Result<()> {
    let current: i32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        tracing::debug!(
            version = migration.version,
            description = migration.description,
            "applying migration"
        );
        conn.execute_batch(migration.up)?;
        conn.pragma_update(None, "user_version", migration.version)?;
    }

    Ok(())
}
