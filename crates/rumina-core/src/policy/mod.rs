//! Stage Policy - The "5 Cow Stomachs" retention model
//!
//! An extended Leitner system: every tracked item sits in one of five
//! retention stages ("stomachs"), plus stage 0 for items that have never
//! been reviewed. Each stage maps to a fixed review interval; correct
//! answers move an item one stomach down the line, incorrect answers move
//! it one back (but never back to "new").
//!
//! Everything in this module is pure: no clocks, no storage, no I/O.
//! The scheduler feeds in the review timestamp and the policy hands back
//! the next stage and due date.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// STAGES
// ============================================================================

/// A retention stage in the extended Leitner scheme
///
/// `New` only exists before the first review; after any attempt the item
/// lives in stages 1-5. `Graduated` (stage 5) is terminal in the sense that
/// correct answers keep the item there on a long refresh interval, but a
/// graduated item can still be demoted by a wrong answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Never reviewed
    #[default]
    New,
    /// First stomach - shortest interval
    One,
    /// Second stomach
    Two,
    /// Third stomach
    Three,
    /// Fourth stomach
    Four,
    /// Fifth stomach - graduated, long refresh interval
    Graduated,
}

impl Stage {
    /// Numeric stage value (0 = new, 5 = graduated)
    pub fn as_u8(&self) -> u8 {
        match self {
            Stage::New => 0,
            Stage::One => 1,
            Stage::Two => 2,
            Stage::Three => 3,
            Stage::Four => 4,
            Stage::Graduated => 5,
        }
    }

    /// Parse from a numeric stage value
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Stage::New),
            1 => Some(Stage::One),
            2 => Some(Stage::Two),
            3 => Some(Stage::Three),
            4 => Some(Stage::Four),
            5 => Some(Stage::Graduated),
            _ => None,
        }
    }

    /// Whether this item has reached the final stomach
    pub fn is_graduated(&self) -> bool {
        matches!(self, Stage::Graduated)
    }

    /// Next stage up, saturating at `Graduated`
    pub fn promoted(&self) -> Stage {
        Stage::from_u8((self.as_u8() + 1).min(5)).unwrap_or(Stage::Graduated)
    }

    /// Next stage down, saturating at `One`
    ///
    /// An item that has ever been reviewed can never fall back to `New`;
    /// stage 0 only exists before the first attempt.
    pub fn demoted(&self) -> Stage {
        Stage::from_u8(self.as_u8().saturating_sub(1).max(1)).unwrap_or(Stage::One)
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

// ============================================================================
// OUTCOMES
// ============================================================================

/// The result of one review attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// The learner answered correctly
    Correct,
    /// The learner answered incorrectly
    Incorrect,
}

impl Outcome {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Correct => "correct",
            Outcome::Incorrect => "incorrect",
        }
    }

    /// Parse from string name
    pub fn parse_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "correct" => Some(Outcome::Correct),
            "incorrect" => Some(Outcome::Incorrect),
            _ => None,
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// POLICY
// ============================================================================

/// What one review does to an item, as computed by [`StagePolicy::review`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicyDecision {
    /// Stage after applying the outcome
    pub stage_after: Stage,
    /// Consecutive-correct streak after applying the outcome
    pub consecutive_correct: u32,
    /// Interval applied for the next review
    pub interval: Duration,
    /// When the item is next due: review time + interval
    pub due_at: DateTime<Utc>,
}

/// Stage-to-interval table and transition rules
///
/// The interval values are tunable; the defaults follow the classic
/// doubling-ish ladder with a long stage-5 refresher. The transition rules
/// themselves (promote on correct, demote with a floor of stage 1, stage 0
/// always advances to stage 1) are fixed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagePolicy {
    /// Review intervals for stages 1 through 5
    intervals: [Duration; 5],
}

impl Default for StagePolicy {
    fn default() -> Self {
        Self {
            intervals: [
                Duration::days(1),
                Duration::days(2),
                Duration::days(4),
                Duration::days(7),
                Duration::days(21),
            ],
        }
    }
}

impl StagePolicy {
    /// Create a policy with a custom interval table for stages 1-5
    pub fn with_intervals(intervals: [Duration; 5]) -> Self {
        Self { intervals }
    }

    /// Review interval for a stage
    ///
    /// Stage `New` has no interval: a new item is due immediately.
    pub fn interval(&self, stage: Stage) -> Duration {
        match stage {
            Stage::New => Duration::zero(),
            s => self.intervals[(s.as_u8() - 1) as usize],
        }
    }

    /// Apply one review outcome
    ///
    /// Pure function of (stage before, streak before, outcome, review time):
    /// - correct: promote one stage, saturating at graduated; streak + 1
    /// - incorrect: demote one stage, floored at stage 1; streak reset
    /// - first review (stage 0): advances to stage 1 for either outcome,
    ///   but only a correct answer starts the streak
    /// - graduated + correct: stays graduated, due date re-extended by the
    ///   stage-5 refresh interval
    pub fn review(
        &self,
        stage_before: Stage,
        consecutive_correct: u32,
        outcome: Outcome,
        at: DateTime<Utc>,
    ) -> PolicyDecision {
        let (stage_after, streak) = match outcome {
            Outcome::Correct => (stage_before.promoted(), consecutive_correct + 1),
            Outcome::Incorrect if stage_before == Stage::New => (Stage::One, 0),
            Outcome::Incorrect => (stage_before.demoted(), 0),
        };

        let interval = self.interval(stage_after);

        PolicyDecision {
            stage_after,
            consecutive_correct: streak,
            interval,
            due_at: at + interval,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
