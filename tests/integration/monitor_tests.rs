//! Request monitor and edge queue behaviour against the mock line.

use core::time::Duration;
use std::time::Instant;

use embedded_hal::digital::PinState;
use ota_lifecycle::app::monitor::{MonitorOutcome, RequestMonitor};
use ota_lifecycle::config::{EdgeDirection, EdgePolarity};
use ota_lifecycle::events::{EdgeEvent, EdgeQueue};
use ota_lifecycle::lifecycle::{LifecycleCell, LifecycleState};

use crate::mock_hw::{call_log, MockGpio, RecordingSink};

const PERIOD: Duration = Duration::from_millis(20);

fn edge() -> EdgeEvent {
    EdgeEvent { gpio: 0 }
}

#[test]
fn falling_edge_ignored_under_rising_polarity() {
    let (cell, queue) = (LifecycleCell::new(), EdgeQueue::new());
    let mut m = RequestMonitor::new(&queue, cell.requester().unwrap(), EdgePolarity::Rising, PERIOD);
    let mut line = MockGpio::new(call_log());
    let mut sink = RecordingSink::new();

    line.button = PinState::Low;
    queue.push_from_isr(edge());
    assert_eq!(
        m.poll(&mut line, &mut sink),
        MonitorOutcome::NotQualifying(EdgeDirection::Falling)
    );
    assert_eq!(cell.load(), LifecycleState::Running);
    assert!(sink.events.is_empty());
}

#[test]
fn both_polarity_accepts_falling_edge() {
    let (cell, queue) = (LifecycleCell::new(), EdgeQueue::new());
    let mut m = RequestMonitor::new(&queue, cell.requester().unwrap(), EdgePolarity::Both, PERIOD);
    let mut line = MockGpio::new(call_log());
    let mut sink = RecordingSink::new();

    line.button = PinState::Low;
    queue.push_from_isr(edge());
    assert_eq!(m.poll(&mut line, &mut sink), MonitorOutcome::Raised(edge()));
    assert_eq!(cell.load(), LifecycleState::UpdateRequested);
}

#[test]
fn cycle_waits_at_most_one_period_without_edges() {
    let (cell, queue) = (LifecycleCell::new(), EdgeQueue::new());
    let mut m = RequestMonitor::new(&queue, cell.requester().unwrap(), EdgePolarity::Rising, PERIOD);
    let mut line = MockGpio::new(call_log());
    let mut sink = RecordingSink::new();

    let start = Instant::now();
    assert_eq!(m.cycle(&mut line, &mut sink), MonitorOutcome::NoEdge);
    let waited = start.elapsed();
    assert!(waited >= PERIOD, "returned early after {waited:?}");
    assert!(waited < PERIOD * 20, "blocked for {waited:?}");
}

#[test]
fn cycle_picks_up_edge_queued_mid_wait() {
    let cell = LifecycleCell::new();
    let queue = EdgeQueue::new();
    let period = Duration::from_millis(50);
    let mut m = RequestMonitor::new(&queue, cell.requester().unwrap(), EdgePolarity::Rising, period);
    let mut line = MockGpio::new(call_log());
    line.button = PinState::High;
    let mut sink = RecordingSink::new();

    let start = Instant::now();
    let outcome = std::thread::scope(|s| {
        s.spawn(|| {
            std::thread::sleep(Duration::from_millis(10));
            queue.push_from_isr(edge());
        });
        m.cycle(&mut line, &mut sink)
    });
    assert_eq!(outcome, MonitorOutcome::Raised(edge()));
    assert!(start.elapsed() >= period);
    assert_eq!(cell.load(), LifecycleState::UpdateRequested);
}

#[test]
fn second_requester_cannot_be_claimed() {
    let cell = LifecycleCell::new();
    let first = cell.requester();
    assert!(first.is_some());
    assert!(cell.requester().is_none());
    assert!(cell.orchestrator().is_some());
    assert!(cell.orchestrator().is_none());
}
