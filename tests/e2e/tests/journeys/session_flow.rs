//! Session-flow journeys
//!
//! Whole sessions from start to completion or expiry, including the
//! missed-item repeat and the durability of mid-session progress.

use chrono::Duration;
use rumina_e2e_tests::harness::{memory_harness, memory_harness_with_config};
use rumina_e2e_tests::mocks::fixtures::{attach_items, base_time};
use rumina_core::{Outcome, SessionConfig, SessionError, SessionStatus, Stage};

#[test]
fn three_items_one_miss_means_four_answers() {
    let harness = memory_harness();
    let t0 = base_time();
    attach_items(&harness.scheduler, "ada", 3, t0);

    let mut session = harness.engine.start_session("ada", None, t0).unwrap();
    assert_eq!(session.status(), SessionStatus::InProgress);

    // Miss the second item, everything else correct
    let mut answers = 0;
    while session.status() == SessionStatus::InProgress {
        let item = session.current_item().unwrap().to_string();
        let outcome = if item == "item-0001" && answers < 3 {
            Outcome::Incorrect
        } else {
            Outcome::Correct
        };
        let result = session.submit_answer(outcome, t0).unwrap();
        answers += 1;
        if result.requeued {
            assert_eq!(result.item_id, "item-0001");
        }
    }

    // 3 items + 1 repeat of the missed one
    assert_eq!(answers, 4);
    assert_eq!(session.status(), SessionStatus::Completed);
    assert_eq!(session.tally(), (3, 1));

    // First attempt missed (new -> stage 1), the in-session repeat was
    // correct (stage 1 -> stage 2)
    let history = harness.history.as_ref().unwrap();
    let events = history.events_for("ada", "item-0001");
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].stage_after, Stage::One);
    assert_eq!(events[1].stage_after, Stage::Two);
}

#[test]
fn session_with_nothing_due_is_complete_not_an_error() {
    let harness = memory_harness();
    let t0 = base_time();
    attach_items(&harness.scheduler, "ada", 2, t0);

    // Clear today's queue first
    let mut session = harness.engine.start_session("ada", None, t0).unwrap();
    while session.status() == SessionStatus::InProgress {
        session.submit_answer(Outcome::Correct, t0).unwrap();
    }

    // Starting again the same day finds nothing due
    let session = harness.engine.start_session("ada", None, t0).unwrap();
    assert_eq!(session.status(), SessionStatus::Completed);
    assert_eq!(session.remaining(), 0);
}

#[test]
fn expiry_keeps_committed_outcomes() {
    let harness = memory_harness_with_config(SessionConfig {
        idle_limit: Duration::minutes(5),
        ..SessionConfig::default()
    });
    let t0 = base_time();
    attach_items(&harness.scheduler, "ada", 2, t0);

    let mut session = harness.engine.start_session("ada", None, t0).unwrap();
    session.submit_answer(Outcome::Correct, t0).unwrap();

    // Walk away; the late answer is rejected and the session expires
    let late = t0 + Duration::minutes(6);
    let err = session.submit_answer(Outcome::Correct, late).unwrap_err();
    assert!(matches!(err, SessionError::Expired { .. }));
    assert_eq!(session.status(), SessionStatus::Expired);

    // The first answer stuck: item-0000 is scheduled out, item-0001 still due
    let due = harness.scheduler.due_items("ada", late, 10).unwrap();
    assert_eq!(due, ["item-0001"]);
    let history = harness.history.as_ref().unwrap();
    assert_eq!(history.len(), 1);
}

#[test]
fn tomorrows_session_sees_yesterdays_items_again() {
    let harness = memory_harness();
    let t0 = base_time();
    attach_items(&harness.scheduler, "ada", 2, t0);

    let mut session = harness.engine.start_session("ada", None, t0).unwrap();
    while session.status() == SessionStatus::InProgress {
        session.submit_answer(Outcome::Correct, t0).unwrap();
    }

    // Stage-1 items come due after one day
    let tomorrow = t0 + Duration::days(1);
    let session = harness.engine.start_session("ada", None, tomorrow).unwrap();
    assert_eq!(session.status(), SessionStatus::InProgress);
    assert_eq!(session.remaining(), 2);
}

#[test]
fn batch_size_bounds_the_session() {
    let harness = memory_harness();
    let t0 = base_time();
    attach_items(&harness.scheduler, "ada", 30, t0);

    let session = harness.engine.start_session("ada", Some(5), t0).unwrap();
    assert_eq!(session.remaining(), 5);

    // Default batch size caps the rest
    let session = harness.engine.start_session("ada", None, t0).unwrap();
    assert_eq!(session.remaining(), 20);
}
