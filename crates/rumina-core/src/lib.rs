//! # Rumina Core
//!
//! Spaced-repetition scheduling engine built on the "5 Cow Stomachs"
//! extended Leitner system: five retention stages with fixed, tunable
//! review intervals, plus stage 0 for never-reviewed items.
//!
//! - **Stage Policy**: pure promotion/demotion rules and the interval table
//! - **Scheduler**: due-item queries and race-free outcome recording via
//!   version-checked compare-and-swap against the state store
//! - **Session Engine**: ephemeral per-learner review sessions with
//!   repeat-on-miss and idle expiry
//! - **History Recorder**: append-only review audit trail for statistics
//!   and reminder collaborators
//!
//! The engine is library-level: it owns no wire format, no authentication,
//! and no UI. It consumes (user, item) identifiers and review outcomes and
//! produces due dates, stage transitions, and history events. Storage sits
//! behind the [`StateStore`] trait; per-record atomic compare-and-swap is
//! the only property the scheduler requires of it.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use chrono::Utc;
//! use rumina_core::{
//!     MemoryHistory, MemoryStore, Outcome, Scheduler, SessionEngine, SessionStatus,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let scheduler = Arc::new(Scheduler::new(
//!     Arc::new(MemoryStore::new()),
//!     Arc::new(MemoryHistory::new()),
//! ));
//!
//! // A learner acquires an item (normally driven by the attachment feed)
//! let now = Utc::now();
//! scheduler.initialize_state("learner-1", "item-1", now)?;
//!
//! // Run a review session
//! let engine = SessionEngine::new(scheduler.clone());
//! let mut session = engine.start_session("learner-1", None, now)?;
//! while session.status() == SessionStatus::InProgress {
//!     let _item = session.current_item();
//!     session.submit_answer(Outcome::Correct, Utc::now())?;
//! }
//! # Ok(())
//! # }
//! ```

#![warn(rustdoc::missing_crate_level_docs)]

// ============================================================================
// MODULES
// ============================================================================

pub mod history;
pub mod policy;
pub mod scheduler;
pub mod session;
pub mod state;
pub mod storage;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

// Stage policy
pub use policy::{Outcome, PolicyDecision, Stage, StagePolicy};

// Data model
pub use state::{LearnerItemState, ReviewEvent};

// Storage layer
pub use storage::{DueItem, MemoryStore, SqliteStore, StateStore, StoreError, MIGRATIONS};

// History
pub use history::{HistoryError, HistorySink, MemoryHistory, SqliteHistory};

// Scheduler
pub use scheduler::{RecordedOutcome, Scheduler, SchedulerConfig, SchedulerError};

// Session engine
pub use session::{
    AnswerResult, LearningSession, SessionConfig, SessionEngine, SessionError, SessionStatus,
};

// ============================================================================
// VERSION INFO
// ============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Number of retention stages ("stomachs"), not counting stage 0
pub const STAGE_COUNT: u8 = 5;

// ============================================================================
// PRELUDE
// ============================================================================

/// Convenient imports for common usage
pub mod prelude {
    pub use crate::{
        LearnerItemState, LearningSession, MemoryHistory, MemoryStore, Outcome, ReviewEvent,
        Scheduler, SchedulerError, SessionEngine, SessionStatus, SqliteStore, Stage, StagePolicy,
        StateStore,
    };
}
