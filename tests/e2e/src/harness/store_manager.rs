//! Test Store Manager
//!
//! Provides isolated engine instances for testing:
//! - Temporary SQLite-backed stores that are cleaned up automatically
//! - In-memory stores for fast unit-style journeys
//! - Concurrent test isolation (one database file per harness)

use std::sync::Arc;

use rumina_core::{
    MemoryHistory, MemoryStore, Scheduler, SessionConfig, SessionEngine, SqliteHistory,
    SqliteStore,
};
use tempfile::TempDir;

/// A fully wired engine over an isolated store
///
/// Holds the temp directory (when SQLite-backed) so the database file lives
/// as long as the harness.
pub struct TestHarness {
    /// Shared scheduler over the harness store
    pub scheduler: Arc<Scheduler>,
    /// Session engine over the same scheduler
    pub engine: SessionEngine,
    /// In-memory history sink, when the harness uses one
    pub history: Option<Arc<MemoryHistory>>,
    /// In-memory state store, when the harness uses one
    pub state_store: Option<Arc<MemoryStore>>,
    /// Temporary directory backing a SQLite harness
    _temp_dir: Option<TempDir>,
}

/// Harness over the in-memory store, with an inspectable history sink
pub fn memory_harness() -> TestHarness {
    memory_harness_with_config(SessionConfig::default())
}

/// In-memory harness with a custom session config
pub fn memory_harness_with_config(config: SessionConfig) -> TestHarness {
    let history = Arc::new(MemoryHistory::new());
    let store = Arc::new(MemoryStore::new());
    let scheduler = Arc::new(Scheduler::new(store.clone(), history.clone()));
    TestHarness {
        engine: SessionEngine::with_config(scheduler.clone(), config),
        scheduler,
        history: Some(history),
        state_store: Some(store),
        _temp_dir: None,
    }
}

/// Harness over a temporary SQLite database
///
/// State store and history sink share one database file, the expected
/// production wiring.
pub fn sqlite_harness() -> TestHarness {
    let temp_dir = tempfile::tempdir().expect("create temp dir");
    let db_path = temp_dir.path().join("rumina.db");

    let store = Arc::new(SqliteStore::open(&db_path).expect("open sqlite store"));
    let history = Arc::new(SqliteHistory::open(&db_path).expect("open sqlite history"));
    let scheduler = Arc::new(Scheduler::new(store, history));

    TestHarness {
        engine: SessionEngine::new(scheduler.clone()),
        scheduler,
        history: None,
        state_store: None,
        _temp_dir: Some(temp_dir),
    }
}
