//! Timer and frame clock tests
//!
//! Covers:
//! - TimerQueue dispatch order and due-time gating
//! - FrameClock first-frame baseline behaviour

use instant::{Duration, Instant};

use limelight::timer::{FrameClock, TimerQueue};

// ============================================================================
// TimerQueue
// ============================================================================

#[test]
fn nothing_fires_before_its_due_time() {
    let now = Instant::now();
    let mut timers: TimerQueue<u32> = TimerQueue::new();
    timers.schedule_at(now + Duration::from_millis(2000), 1);
    timers.schedule_at(now + Duration::from_millis(2500), 2);

    assert!(timers.poll(now).is_empty());
    assert!(timers.poll(now + Duration::from_millis(1999)).is_empty());
    assert_eq!(timers.len(), 2);
}

#[test]
fn due_actions_fire_in_scheduled_order() {
    let now = Instant::now();
    let mut timers: TimerQueue<u32> = TimerQueue::new();
    // Scheduled out of order on purpose.
    timers.schedule_at(now + Duration::from_millis(3000), 3);
    timers.schedule_at(now + Duration::from_millis(2000), 1);
    timers.schedule_at(now + Duration::from_millis(2500), 2);

    let fired = timers.poll(now + Duration::from_millis(3000));
    assert_eq!(fired, vec![1, 2, 3]);
    assert!(timers.is_empty());
}

#[test]
fn ties_break_by_insertion_order() {
    let now = Instant::now();
    let due = now + Duration::from_millis(100);
    let mut timers: TimerQueue<u32> = TimerQueue::new();
    timers.schedule_at(due, 1);
    timers.schedule_at(due, 2);
    timers.schedule_at(due, 3);

    assert_eq!(timers.poll(due), vec![1, 2, 3]);
}

#[test]
fn late_poll_still_fires_everything_once() {
    let now = Instant::now();
    let mut timers: TimerQueue<u32> = TimerQueue::new();
    timers.schedule_at(now + Duration::from_millis(10), 1);

    // Dispatch happens no earlier than the delay, but a busy loop may poll
    // much later.
    assert_eq!(timers.poll(now + Duration::from_secs(60)), vec![1]);
    assert!(timers.poll(now + Duration::from_secs(120)).is_empty());
}

#[test]
fn partial_poll_leaves_the_rest_queued() {
    let now = Instant::now();
    let mut timers: TimerQueue<u32> = TimerQueue::new();
    timers.schedule_at(now + Duration::from_millis(100), 1);
    timers.schedule_at(now + Duration::from_millis(200), 2);

    assert_eq!(timers.poll(now + Duration::from_millis(150)), vec![1]);
    assert_eq!(timers.len(), 1);
    assert_eq!(timers.poll(now + Duration::from_millis(250)), vec![2]);
}

// ============================================================================
// FrameClock
// ============================================================================

#[test]
fn first_tick_establishes_baseline_only() {
    let mut clock = FrameClock::new();
    let start = Instant::now();

    // No delta exists before a baseline does.
    assert!(clock.tick(start).is_none());

    let dt = clock.tick(start + Duration::from_millis(16));
    assert_eq!(dt, Some(Duration::from_millis(16)));
}

#[test]
fn deltas_are_between_consecutive_ticks() {
    let mut clock = FrameClock::new();
    let start = Instant::now();

    clock.tick(start);
    clock.tick(start + Duration::from_millis(10));
    let dt = clock.tick(start + Duration::from_millis(30));
    assert_eq!(dt, Some(Duration::from_millis(20)));
}
