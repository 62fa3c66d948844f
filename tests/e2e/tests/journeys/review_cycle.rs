//! Review-cycle journeys
//!
//! A learner acquires items and reviews them over days: stage climbs on
//! correct answers, falls back on misses, and the due dates always follow
//! the stage policy's interval table.

use chrono::Duration;
use rumina_e2e_tests::harness::memory_harness;
use rumina_e2e_tests::mocks::fixtures::{attach_items, base_time, drive_to_stage};
use rumina_core::{Outcome, SchedulerError, Stage};

#[test]
fn new_item_first_miss_lands_in_stage_one() {
    let harness = memory_harness();
    let t0 = base_time();
    attach_items(&harness.scheduler, "ada", 1, t0);

    let recorded = harness
        .scheduler
        .record_outcome("ada", "item-0000", Outcome::Incorrect, t0)
        .unwrap();

    assert_eq!(recorded.state.stage, Stage::One);
    assert_eq!(recorded.state.due_at, t0 + Duration::days(1));
    assert_eq!(recorded.state.consecutive_correct, 0);
}

#[test]
fn stage_three_item_promotes_on_a_slightly_late_review() {
    let harness = memory_harness();
    let t0 = base_time();
    attach_items(&harness.scheduler, "ada", 1, t0);

    // Climb to stage 3, then answer 5 minutes after it comes due
    let last = drive_to_stage(&harness.scheduler, "ada", "item-0000", Stage::Three, t0);
    let due = harness.scheduler.policy().interval(Stage::Three);
    let review_at = last + due + Duration::minutes(5);

    let recorded = harness
        .scheduler
        .record_outcome("ada", "item-0000", Outcome::Correct, review_at)
        .unwrap();

    assert_eq!(recorded.state.stage, Stage::Four);
    assert_eq!(recorded.state.due_at, review_at + Duration::days(7));
}

#[test]
fn unattached_item_is_rejected() {
    let harness = memory_harness();
    let t0 = base_time();
    attach_items(&harness.scheduler, "ada", 1, t0);

    let err = harness
        .scheduler
        .record_outcome("ada", "never-attached", Outcome::Correct, t0)
        .unwrap_err();
    assert!(matches!(err, SchedulerError::UnknownItem { .. }));
}

#[test]
fn graduation_and_refresh_over_many_reviews() {
    let harness = memory_harness();
    let t0 = base_time();
    attach_items(&harness.scheduler, "ada", 1, t0);

    let last = drive_to_stage(&harness.scheduler, "ada", "item-0000", Stage::Graduated, t0);

    // A graduated item keeps refreshing on the long interval
    let refresh_at = last + Duration::days(21);
    let recorded = harness
        .scheduler
        .record_outcome("ada", "item-0000", Outcome::Correct, refresh_at)
        .unwrap();
    assert_eq!(recorded.state.stage, Stage::Graduated);
    assert_eq!(recorded.state.due_at, refresh_at + Duration::days(21));

    // One miss drops it a single stage, never further
    let recorded = harness
        .scheduler
        .record_outcome("ada", "item-0000", Outcome::Incorrect, recorded.state.due_at)
        .unwrap();
    assert_eq!(recorded.state.stage, Stage::Four);
    assert_eq!(recorded.state.consecutive_correct, 0);
}

#[test]
fn full_history_is_recorded_in_order() {
    let harness = memory_harness();
    let history = harness.history.as_ref().unwrap();
    let t0 = base_time();
    attach_items(&harness.scheduler, "ada", 1, t0);

    let outcomes = [Outcome::Incorrect, Outcome::Correct, Outcome::Correct];
    let mut at = t0;
    for outcome in outcomes {
        let recorded = harness
            .scheduler
            .record_outcome("ada", "item-0000", outcome, at)
            .unwrap();
        at = recorded.state.due_at;
    }

    let events = history.events_for("ada", "item-0000");
    assert_eq!(events.len(), 3);
    let stages: Vec<(Stage, Stage)> = events
        .iter()
        .map(|e| (e.stage_before, e.stage_after))
        .collect();
    assert_eq!(
        stages,
        [
            (Stage::New, Stage::One),
            (Stage::One, Stage::Two),
            (Stage::Two, Stage::Three),
        ]
    );
}

#[test]
fn due_query_surfaces_oldest_overdue_first() {
    let harness = memory_harness();
    let t0 = base_time();
    let items = attach_items(&harness.scheduler, "ada", 3, t0);

    // Review two items so their due dates spread out
    harness
        .scheduler
        .record_outcome("ada", &items[0], Outcome::Correct, t0)
        .unwrap(); // due t0 + 1d
    harness
        .scheduler
        .record_outcome("ada", &items[1], Outcome::Correct, t0)
        .unwrap();
    harness
        .scheduler
        .record_outcome("ada", &items[1], Outcome::Correct, t0 + Duration::days(1))
        .unwrap(); // due t0 + 3d

    let due = harness
        .scheduler
        .due_items("ada", t0 + Duration::days(3), 10)
        .unwrap();
    // item-0002 has been due since t0, item-0000 since t0+1d, item-0001 since t0+3d
    assert_eq!(due, [items[2].clone(), items[0].clone(), items[1].clone()]);
}
