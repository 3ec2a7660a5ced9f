use crate::error::SimError;
use crate::sim::{Clock, SimTime};

#[test]
fn clock_starts_on_a_slot_boundary() {
    let clock = Clock::new(SimTime(50), SimTime(1_000));
    assert_eq!(clock.now(), SimTime::ZERO);
    assert!(clock.is_slot_boundary());
    // 没有路由周期时，t=0 仍然算一次路由边界
    assert!(clock.is_routing_boundary());
    assert_eq!(clock.pending_len(), 1);
}

#[test]
fn clock_advances_to_earliest_wake_time_and_dedups() {
    let mut clock = Clock::new(SimTime(50), SimTime(1_000));
    assert_eq!(clock.schedule_after(SimTime(20)), SimTime(20));
    assert_eq!(clock.schedule_after(SimTime(20)), SimTime(20));
    assert_eq!(clock.schedule_after(SimTime(80)), SimTime(80));
    assert_eq!(clock.pending_len(), 3);

    assert!(clock.advance().unwrap());
    assert_eq!(clock.now(), SimTime(20));
    assert!(!clock.is_slot_boundary());
    assert!(clock.is_due(SimTime(20)));
    assert!(!clock.is_due(SimTime(80)));

    assert!(clock.advance().unwrap());
    assert_eq!(clock.now(), SimTime(50));
    assert!(clock.is_slot_boundary());

    assert!(clock.advance().unwrap());
    assert_eq!(clock.now(), SimTime(80));
    assert!(!clock.is_slot_boundary());

    assert!(clock.advance().unwrap());
    assert_eq!(clock.now(), SimTime(100));
    assert!(clock.is_slot_boundary());
}

#[test]
fn clock_marks_routing_boundaries_including_time_zero() {
    let mut clock = Clock::new(SimTime(50), SimTime(1_000)).with_routing_period(SimTime(100));
    assert!(clock.is_routing_boundary());

    let mut boundaries = Vec::new();
    while clock.advance().unwrap() {
        if clock.is_routing_boundary() {
            boundaries.push(clock.now());
        }
        if clock.now() >= SimTime(300) {
            break;
        }
    }
    assert_eq!(boundaries, vec![SimTime(100), SimTime(200), SimTime(300)]);
}

#[test]
fn clock_reports_end_of_run_once_duration_is_reached() {
    let mut clock = Clock::new(SimTime(50), SimTime(100));
    assert!(clock.advance().unwrap());
    assert_eq!(clock.now(), SimTime(50));
    assert!(!clock.advance().unwrap());
    assert_eq!(clock.now(), SimTime(100));
}

#[test]
fn clock_routing_boundary_without_period_fires_only_at_zero() {
    let mut clock = Clock::new(SimTime(50), SimTime(1_000));
    assert!(clock.is_routing_boundary());
    while clock.advance().unwrap() {
        assert!(!clock.is_routing_boundary());
    }
}

#[test]
fn clock_with_zero_length_slot_is_stalled() {
    let mut clock = Clock::new(SimTime(0), SimTime(1_000));
    let err = clock.advance().unwrap_err();
    assert!(matches!(
        err,
        SimError::Stalled { now, duration } if now == SimTime::ZERO && duration == SimTime(1_000)
    ));
}

#[test]
fn clock_deadline_at_current_time_is_stalled() {
    let mut clock = Clock::new(SimTime(50), SimTime(1_000));
    assert!(clock.advance().unwrap());
    assert_eq!(clock.now(), SimTime(50));
    clock.schedule_after(SimTime::ZERO);
    assert!(matches!(clock.advance(), Err(SimError::Stalled { now, .. }) if now == SimTime(50)));
}
