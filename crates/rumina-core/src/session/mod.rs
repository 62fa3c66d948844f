//! Session Engine
//!
//! Orchestrates one learner's bounded run through their due items. A
//! [`LearningSession`] is an ephemeral owned value: it lives in the process
//! that started it, is never persisted, and is dropped when it completes or
//! expires. Outcomes are durable the instant the scheduler records them, so
//! an expired or abandoned session never loses committed progress.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::policy::Outcome;
use crate::scheduler::{RecordedOutcome, Scheduler, SchedulerError};

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Session error type
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The session is not accepting answers in its current status
    #[error("session is {status}, not in progress")]
    NotInProgress {
        /// The status the session is in
        status: SessionStatus,
    },
    /// The session idled past its limit and has expired
    #[error("session expired after {idle_limit} of inactivity")]
    Expired {
        /// The configured idle limit
        idle_limit: Duration,
    },
    /// Error from the scheduler while recording the answer
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
}

/// Session result type
pub type Result<T> = std::result::Result<T, SessionError>;

// ============================================================================
// CONFIG & STATUS
// ============================================================================

/// Session tuning knobs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Default batch size when the caller does not specify one
    pub default_batch_size: usize,
    /// Inactivity window after which a session expires
    pub idle_limit: Duration,
    /// Re-queue incorrectly answered items once at the end of the session
    pub repeat_incorrect: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_batch_size: 20,
            idle_limit: Duration::minutes(30),
            repeat_incorrect: true,
        }
    }
}

/// Session state machine: `Created → InProgress → Completed | Expired`
///
/// `Created` is transient: `start_session` moves a new session straight to
/// `InProgress` (items queued) or `Completed` (nothing due) before handing
/// it out, so callers only ever observe the last three states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Constructed but not yet accepting answers
    Created,
    /// Items queued, accepting answers
    InProgress,
    /// All queued items (including repeats) answered - terminal
    Completed,
    /// Idled past the limit - terminal; committed outcomes stand
    Expired,
}

impl SessionStatus {
    /// Whether the session can still accept answers
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::Expired)
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SessionStatus::Created => "created",
            SessionStatus::InProgress => "in progress",
            SessionStatus::Completed => "completed",
            SessionStatus::Expired => "expired",
        };
        write!(f, "{s}")
    }
}

// ============================================================================
// ENGINE
// ============================================================================

/// Starts learning sessions against a shared scheduler
pub struct SessionEngine {
    scheduler: Arc<Scheduler>,
    config: SessionConfig,
}

impl SessionEngine {
    /// Create an engine with the default session config
    pub fn new(scheduler: Arc<Scheduler>) -> Self {
        Self::with_config(scheduler, SessionConfig::default())
    }

    /// Create an engine with a custom session config
    pub fn with_config(scheduler: Arc<Scheduler>, config: SessionConfig) -> Self {
        Self { scheduler, config }
    }

    /// Start a session for a learner with up to `batch_size` due items
    ///
    /// An empty due batch is not an error: the session is returned already
    /// `Completed` with nothing to review. A learner with no tracked items
    /// at all surfaces the scheduler's `NoTrackedItems`.
    pub fn start_session(
        &self,
        user_id: &str,
        batch_size: Option<usize>,
        now: DateTime<Utc>,
    ) -> Result<LearningSession> {
        let batch_size = batch_size.unwrap_or(self.config.default_batch_size);
        let queue = self.scheduler.due_items(user_id, now, batch_size)?;

        let mut session = LearningSession {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            scheduler: self.scheduler.clone(),
            config: self.config,
            queue: queue.into(),
            repeated: HashSet::new(),
            correct: 0,
            incorrect: 0,
            status: SessionStatus::Created,
            started_at: now,
            last_activity_at: now,
        };
        // An empty due batch completes on the spot; otherwise the session
        // starts taking answers immediately.
        session.status = if session.queue.is_empty() {
            SessionStatus::Completed
        } else {
            SessionStatus::InProgress
        };
        debug!(
            session_id = %session.id,
            user_id,
            queued = session.queue.len(),
            status = %session.status,
            "session started"
        );
        Ok(session)
    }
}

// ============================================================================
// SESSION
// ============================================================================

/// What one answer did to the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerResult {
    /// The item that was answered
    pub item_id: String,
    /// The committed scheduling result
    pub recorded: RecordedOutcome,
    /// Whether the item was re-queued for one more pass this session
    pub requeued: bool,
    /// Whether this answer completed the session
    pub session_complete: bool,
}

/// One learner's ephemeral run through a batch of due items
///
/// Owned by its caller; never shared across writers and never persisted.
/// Dropping a session mid-run loses nothing but the remaining queue.
pub struct LearningSession {
    id: String,
    user_id: String,
    scheduler: Arc<Scheduler>,
    config: SessionConfig,
    queue: VecDeque<String>,
    /// Items already given their one repeat this session
    repeated: HashSet<String>,
    correct: u32,
    incorrect: u32,
    status: SessionStatus,
    started_at: DateTime<Utc>,
    last_activity_at: DateTime<Utc>,
}

impl std::fmt::Debug for LearningSession {
    // `scheduler` holds trait objects with no Debug impl, so derive won't work
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LearningSession")
            .field("id", &self.id)
            .field("user_id", &self.user_id)
            .field("config", &self.config)
            .field("queue", &self.queue)
            .field("repeated", &self.repeated)
            .field("correct", &self.correct)
            .field("incorrect", &self.incorrect)
            .field("status", &self.status)
            .field("started_at", &self.started_at)
            .field("last_activity_at", &self.last_activity_at)
            .finish_non_exhaustive()
    }
}

impl LearningSession {
    /// Session identifier (UUID v4)
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The learner this session belongs to
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Current status
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// When the session started
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// The item currently up for review, if the session is in progress
    pub fn current_item(&self) -> Option<&str> {
        match self.status {
            SessionStatus::InProgress => self.queue.front().map(String::as_str),
            _ => None,
        }
    }

    /// Items still queued, including pending repeats
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    /// (correct, incorrect) counts so far
    pub fn tally(&self) -> (u32, u32) {
        (self.correct, self.incorrect)
    }

    /// Expire the session if it has idled past the limit
    ///
    /// Returns true when this call (or an earlier one) expired it.
    pub fn expire_if_idle(&mut self, now: DateTime<Utc>) -> bool {
        if self.status == SessionStatus::InProgress
            && now - self.last_activity_at > self.config.idle_limit
        {
            debug!(session_id = %self.id, "session expired from inactivity");
            self.status = SessionStatus::Expired;
        }
        self.status == SessionStatus::Expired
    }

    /// Answer the current item
    ///
    /// Records the outcome through the scheduler first — the state change
    /// is durable even if the session later expires — then advances the
    /// queue. Incorrect answers re-queue the item once at the tail so the
    /// learner sees it again before the session ends (at most one repeat
    /// per item per session).
    pub fn submit_answer(&mut self, outcome: Outcome, now: DateTime<Utc>) -> Result<AnswerResult> {
        if self.expire_if_idle(now) {
            return Err(SessionError::Expired {
                idle_limit: self.config.idle_limit,
            });
        }
        if self.status != SessionStatus::InProgress {
            return Err(SessionError::NotInProgress {
                status: self.status,
            });
        }

        // The queue is non-empty while InProgress
        let item_id = match self.queue.front() {
            Some(item) => item.clone(),
            None => {
                return Err(SessionError::NotInProgress {
                    status: self.status,
                })
            }
        };

        let recorded = self
            .scheduler
            .record_outcome(&self.user_id, &item_id, outcome, now)?;

        // Committed; everything past this point is session bookkeeping
        self.queue.pop_front();
        self.last_activity_at = now;

        let requeued = match outcome {
            Outcome::Correct => {
                self.correct += 1;
                false
            }
            Outcome::Incorrect => {
                self.incorrect += 1;
                if self.config.repeat_incorrect && self.repeated.insert(item_id.clone()) {
                    self.queue.push_back(item_id.clone());
                    true
                } else {
                    false
                }
            }
        };

        if self.queue.is_empty() {
            self.status = SessionStatus::Completed;
            debug!(
                session_id = %self.id,
                correct = self.correct,
                incorrect = self.incorrect,
                "session completed"
            );
        }

        Ok(AnswerResult {
            item_id,
            recorded,
            requeued,
            session_complete: self.status == SessionStatus::Completed,
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================
