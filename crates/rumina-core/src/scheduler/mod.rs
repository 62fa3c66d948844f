//! Scheduler
//!
//! The central component: decides which items are due for a learner and
//! applies review outcomes as a read-compute-CAS cycle against the state
//! store. Each call touches exactly one (user, item) record and never holds
//! more than that record's version, so concurrent reviews of the same item
//! from two devices serialize through the store's compare-and-swap while
//! everything else proceeds unblocked.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::history::HistorySink;
use crate::policy::{Outcome, StagePolicy};
use crate::state::{LearnerItemState, ReviewEvent};
use crate::storage::{StateStore, StoreError};

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Scheduler error type
///
/// `ConcurrentUpdate` is the only retryable variant: the caller should
/// re-invoke with fresh intent. Validation failures and unknown items are
/// final for the given input.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    /// No state tracked for this (user, item)
    #[error("unknown item: user {user_id}, item {item_id}")]
    UnknownItem {
        /// The learner
        user_id: String,
        /// The item
        item_id: String,
    },
    /// The user tracks no items at all
    #[error("no tracked items for user {0}")]
    NoTrackedItems(String),
    /// The review timestamp precedes the item's last recorded review
    #[error("review at {at} precedes last review at {last_reviewed_at}")]
    OutcomeBeforeLastReview {
        /// The rejected review timestamp
        at: DateTime<Utc>,
        /// The item's last recorded review
        last_reviewed_at: DateTime<Utc>,
    },
    /// Lost the compare-and-swap race on every attempt; retry with fresh state
    #[error("concurrent update lost after {attempts} attempts")]
    ConcurrentUpdate {
        /// How many read-compute-write cycles were tried
        attempts: u32,
    },
    /// Store failure, surfaced as-is
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Scheduler result type
pub type Result<T> = std::result::Result<T, SchedulerError>;

// ============================================================================
// CONFIG
// ============================================================================

/// Scheduler tuning knobs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Read-compute-write attempts before giving up with `ConcurrentUpdate`
    pub max_cas_attempts: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { max_cas_attempts: 3 }
    }
}

// ============================================================================
// SCHEDULER
// ============================================================================

/// Result of a successfully recorded outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedOutcome {
    /// The state as written to the store
    pub state: LearnerItemState,
    /// The history event emitted for this review
    pub event: ReviewEvent,
}

/// The scheduling engine
///
/// Stateless apart from its collaborators: all learner state lives in the
/// store, all audit data in the history sink. Cheap to share as
/// `Arc<Scheduler>` across sessions.
pub struct Scheduler {
    store: Arc<dyn StateStore>,
    history: Arc<dyn HistorySink>,
    policy: StagePolicy,
    config: SchedulerConfig,
}

impl Scheduler {
    /// Create a scheduler with the default policy and config
    pub fn new(store: Arc<dyn StateStore>, history: Arc<dyn HistorySink>) -> Self {
        Self::with_policy(store, history, StagePolicy::default(), SchedulerConfig::default())
    }

    /// Create a scheduler with a custom policy and config
    pub fn with_policy(
        store: Arc<dyn StateStore>,
        history: Arc<dyn HistorySink>,
        policy: StagePolicy,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            store,
            history,
            policy,
            config,
        }
    }

    /// The stage policy in effect
    pub fn policy(&self) -> &StagePolicy {
        &self.policy
    }

    /// Track a newly attached item for a learner: stage 0, due immediately
    ///
    /// Idempotent: the attachment feed may deliver the same (user, item)
    /// more than once, and re-initializing must never clobber progress, so
    /// an already-tracked item returns its existing state unchanged.
    pub fn initialize_state(
        &self,
        user_id: &str,
        item_id: &str,
        now: DateTime<Utc>,
    ) -> Result<LearnerItemState> {
        let state = LearnerItemState::new_tracked(now);
        match self.store.create(user_id, item_id, &state) {
            Ok(()) => {
                debug!(user_id, item_id, "initialized learner item state");
                Ok(state)
            }
            Err(StoreError::AlreadyTracked { .. }) => self
                .store
                .read(user_id, item_id)?
                .ok_or_else(|| SchedulerError::UnknownItem {
                    user_id: user_id.to_string(),
                    item_id: item_id.to_string(),
                }),
            Err(e) => Err(e.into()),
        }
    }

    /// Item identifiers due for review at `as_of`, oldest-overdue first
    ///
    /// Ties on `due_at` break by item id so repeated calls are
    /// deterministic. Never mutates state; may observe a stale snapshot.
    /// An empty result is valid — the call only fails with
    /// [`SchedulerError::NoTrackedItems`] when the user tracks nothing.
    pub fn due_items(
        &self,
        user_id: &str,
        as_of: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<String>> {
        let due = self.store.due_before(user_id, as_of, limit)?;
        if due.is_empty() && self.store.tracked_count(user_id)? == 0 {
            return Err(SchedulerError::NoTrackedItems(user_id.to_string()));
        }
        Ok(due.into_iter().map(|d| d.item_id).collect())
    }

    /// Record one review outcome for one (user, item)
    ///
    /// The full cycle: read state and version, run the stage policy,
    /// compare-and-swap the successor state, and on success append the
    /// review event. A lost CAS restarts the whole cycle with fresh state,
    /// up to the configured bound; exhausting the bound surfaces
    /// [`SchedulerError::ConcurrentUpdate`], which the caller may retry.
    ///
    /// History-append failures are logged and swallowed: the state change
    /// is already committed and history is explicitly at-least-once.
    pub fn record_outcome(
        &self,
        user_id: &str,
        item_id: &str,
        outcome: Outcome,
        at: DateTime<Utc>,
    ) -> Result<RecordedOutcome> {
        for attempt in 1..=self.config.max_cas_attempts {
            let current = self.store.read(user_id, item_id)?.ok_or_else(|| {
                SchedulerError::UnknownItem {
                    user_id: user_id.to_string(),
                    item_id: item_id.to_string(),
                }
            })?;

            if let Some(last) = current.last_reviewed_at {
                if at < last {
                    return Err(SchedulerError::OutcomeBeforeLastReview {
                        at,
                        last_reviewed_at: last,
                    });
                }
            }

            let decision = self
                .policy
                .review(current.stage, current.consecutive_correct, outcome, at);
            let next = current.applied(&decision, at);

            match self
                .store
                .compare_and_swap(user_id, item_id, current.version, &next)
            {
                Ok(()) => {
                    let event = ReviewEvent {
                        user_id: user_id.to_string(),
                        item_id: item_id.to_string(),
                        at,
                        outcome,
                        stage_before: current.stage,
                        stage_after: next.stage,
                    };
                    if let Err(e) = self.history.append(&event) {
                        warn!(user_id, item_id, error = %e, "history append failed; state change stands");
                    }
                    debug!(
                        user_id,
                        item_id,
                        outcome = %outcome,
                        stage_before = %event.stage_before,
                        stage_after = %event.stage_after,
                        "recorded outcome"
                    );
                    return Ok(RecordedOutcome { state: next, event });
                }
                Err(StoreError::VersionConflict { .. }) => {
                    debug!(user_id, item_id, attempt, "lost compare-and-swap, retrying");
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(SchedulerError::ConcurrentUpdate {
            attempts: self.config.max_cas_attempts,
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================
