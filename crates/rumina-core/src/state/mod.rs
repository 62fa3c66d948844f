//! Learner-Item State - The unit of scheduling
//!
//! One [`LearnerItemState`] record exists per (user, item) pair and is
//! owned exclusively by the scheduler: callers never set `due_at` or
//! `stage` directly, they submit review outcomes and the stage policy
//! derives the rest. The `version` counter backs optimistic concurrency
//! control in the state store.
//!
//! [`ReviewEvent`] is the append-only audit record emitted alongside every
//! successful state change.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::policy::{Outcome, PolicyDecision, Stage};

// ============================================================================
// LEARNER-ITEM STATE
// ============================================================================

/// Per-(user, item) scheduling state
///
/// Invariants maintained by the scheduler:
/// - `stage` only changes as the result of a recorded review outcome
/// - `due_at` is always `last_reviewed_at + interval(stage)` per the policy
///   (or the attachment time for never-reviewed items)
/// - `version` increments by exactly 1 on every successful write
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearnerItemState {
    /// Current retention stage (0 = new, 5 = graduated)
    pub stage: Stage,
    /// When the item is next eligible for review
    pub due_at: DateTime<Utc>,
    /// When the item was last reviewed, if ever
    pub last_reviewed_at: Option<DateTime<Utc>>,
    /// Length of the current correct-answer streak
    pub consecutive_correct: u32,
    /// Optimistic-concurrency version, starts at 1
    pub version: u64,
}

impl LearnerItemState {
    /// Fresh stage-0 state for a newly attached item, due immediately
    pub fn new_tracked(now: DateTime<Utc>) -> Self {
        Self {
            stage: Stage::New,
            due_at: now,
            last_reviewed_at: None,
            consecutive_correct: 0,
            version: 1,
        }
    }

    /// Whether the item is eligible for review at `as_of`
    pub fn is_due(&self, as_of: DateTime<Utc>) -> bool {
        self.due_at <= as_of
    }

    /// Successor state after a policy decision, with the version bumped
    ///
    /// This is the only way state advances; the caller still has to win the
    /// compare-and-swap against the store for it to become real.
    pub fn applied(&self, decision: &PolicyDecision, at: DateTime<Utc>) -> Self {
        Self {
            stage: decision.stage_after,
            due_at: decision.due_at,
            last_reviewed_at: Some(at),
            consecutive_correct: decision.consecutive_correct,
            version: self.version + 1,
        }
    }
}

// ============================================================================
// REVIEW EVENTS
// ============================================================================

/// One immutable review-history record
///
/// Appended after every successful state change; consumed by statistics and
/// reminder collaborators. Downstream consumers deduplicate by
/// (user_id, item_id, at), so delivery may be at-least-once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewEvent {
    /// The learner who reviewed
    pub user_id: String,
    /// The item that was reviewed
    pub item_id: String,
    /// When the review happened
    pub at: DateTime<Utc>,
    /// Whether the answer was correct
    pub outcome: Outcome,
    /// Stage before the review
    pub stage_before: Stage,
    /// Stage after the review
    pub stage_after: Stage,
}

// ============================================================================
// TESTS
// ============================================================================
