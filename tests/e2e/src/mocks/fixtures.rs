//! Test Data Factory
//!
//! Utilities for generating realistic learner/item setups:
//! - Batch item attachment for one learner
//! - Driving an item to a target stage through real reviews
//! - A fixed base time so journeys are reproducible

use chrono::{DateTime, TimeZone, Utc};
use rumina_core::{Outcome, Scheduler, Stage};

/// Fixed, millisecond-aligned base time for reproducible journeys
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
}

/// Attach `count` items ("item-0000".."item-NNNN") for a learner
pub fn attach_items(scheduler: &Scheduler, user_id: &str, count: usize, now: DateTime<Utc>) -> Vec<String> {
    (0..count)
        .map(|i| {
            let item_id = format!("item-{i:04}");
            scheduler
                .initialize_state(user_id, &item_id, now)
                .expect("initialize item");
            item_id
        })
        .collect()
}

/// Review an item with correct answers until it reaches `target` stage
///
/// Each review happens exactly when the item comes due, so the resulting
/// due date is what the stage policy dictates. Returns the time of the
/// last review.
pub fn drive_to_stage(
    scheduler: &Scheduler,
    user_id: &str,
    item_id: &str,
    target: Stage,
    start: DateTime<Utc>,
) -> DateTime<Utc> {
    let mut at = start;
    loop {
        let recorded = scheduler
            .record_outcome(user_id, item_id, Outcome::Correct, at)
            .expect("record outcome");
        if recorded.state.stage >= target {
            return at;
        }
        at = recorded.state.due_at;
    }
}
