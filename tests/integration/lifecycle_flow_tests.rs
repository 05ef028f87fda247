//! End-to-end lifecycle passes: button edge → request → quiesce → fetch →
//! reboot or recovery, driven through the cooperative simulation.

use embedded_hal::digital::PinState;
use ota_lifecycle::app::events::AppEvent;
use ota_lifecycle::config::{FetchConfig, SystemConfig};
use ota_lifecycle::error::{Error, FetchError, HwError};
use ota_lifecycle::events::{EdgeEvent, EdgeQueue};
use ota_lifecycle::fsm::TickOutcome;
use ota_lifecycle::lifecycle::{LifecycleCell, LifecycleState};

use crate::mock_hw::{call_log, count, position, Attempt, HwCall, ScriptedFetcher};
use crate::sim::Sim;

use LifecycleState::{Failed, Fetching, Preparing, Running, UpdateRequested};

const MAX_TICKS: usize = 16;

fn config_with_url() -> SystemConfig {
    SystemConfig {
        fetch: FetchConfig::with_url("https://updates.example.com/fw.bin").unwrap(),
        ..SystemConfig::default()
    }
}

const SUCCESS_PATH: [(LifecycleState, LifecycleState); 3] = [
    (Running, UpdateRequested),
    (UpdateRequested, Preparing),
    (Preparing, Fetching),
];

const FAILURE_PATH: [(LifecycleState, LifecycleState); 5] = [
    (Running, UpdateRequested),
    (UpdateRequested, Preparing),
    (Preparing, Fetching),
    (Fetching, Failed),
    (Failed, Running),
];

// ── Success ───────────────────────────────────────────────────

#[test]
fn successful_pass_ends_in_reboot_from_fetching() {
    let (cell, queue, log) = (LifecycleCell::new(), EdgeQueue::new(), call_log());
    let fetcher = ScriptedFetcher::succeeding(log.clone());
    let mut sim = Sim::new(&cell, &queue, &config_with_url(), log, fetcher);

    sim.click();
    assert_eq!(sim.run_pass(MAX_TICKS).unwrap(), TickOutcome::RebootPending);

    assert_eq!(sim.sink.transitions(), SUCCESS_PATH.to_vec());
    assert_eq!(cell.load(), Fetching, "state stays Fetching until restart");
    assert_eq!(
        sim.sink.count(|e| *e == AppEvent::RebootPending),
        1,
        "reboot reported once"
    );

    // Later ticks neither transition nor fetch again.
    for _ in 0..3 {
        assert_eq!(sim.tick().1.unwrap(), TickOutcome::RebootPending);
    }
    assert_eq!(count(&sim.log, &HwCall::Fetch), 1);
    assert_eq!(sim.sink.transitions().len(), 3);
}

#[test]
fn fetcher_receives_configured_record() {
    let (cell, queue, log) = (LifecycleCell::new(), EdgeQueue::new(), call_log());
    let fetcher = ScriptedFetcher::succeeding(log.clone());
    let config = config_with_url();
    let mut sim = Sim::new(&cell, &queue, &config, log, fetcher);

    sim.click();
    sim.run_pass(MAX_TICKS).unwrap();

    let seen = sim.board.fetcher.last_config.clone().unwrap();
    assert_eq!(seen, config.fetch);
    assert_eq!(seen.tx_buffer_size, 8192);
    assert_eq!(seen.rx_buffer_size, 4096);
    assert_eq!(seen.timeout_ms, 30_000);
}

// ── Failure and recovery ──────────────────────────────────────

#[test]
fn failed_fetch_recovers_to_running() {
    let (cell, queue, log) = (LifecycleCell::new(), EdgeQueue::new(), call_log());
    let fetcher = ScriptedFetcher::failing(log.clone(), FetchError::Connection);
    let mut sim = Sim::new(&cell, &queue, &config_with_url(), log, fetcher);

    sim.click();
    sim.run_pass(MAX_TICKS).unwrap();

    assert_eq!(sim.sink.transitions(), FAILURE_PATH.to_vec());
    assert_eq!(cell.load(), Running);
    assert!(sim.sink.events.contains(&AppEvent::UpdateFailed {
        category: "transport"
    }));
    assert!(sim.sink.events.contains(&AppEvent::PeripheralsRestored));
    assert!(sim.board.gpio.armed(), "edge interrupt re-armed");
    assert_eq!(sim.orch.passes(), 1);
    assert_eq!(sim.orch.failures(), 1);
}

#[test]
fn every_fetch_error_category_routes_to_failed() {
    let errors = [
        FetchError::Connection,
        FetchError::Tls,
        FetchError::HttpStatus(404),
        FetchError::ImageInvalid,
        FetchError::FlashWrite,
        FetchError::Timeout,
        FetchError::Platform(-1),
    ];
    for error in errors {
        let (cell, queue, log) = (LifecycleCell::new(), EdgeQueue::new(), call_log());
        let fetcher = ScriptedFetcher::failing(log.clone(), error);
        let mut sim = Sim::new(&cell, &queue, &config_with_url(), log, fetcher);

        sim.click();
        sim.run_pass(MAX_TICKS).unwrap();

        assert_eq!(sim.sink.transitions(), FAILURE_PATH.to_vec(), "{error:?}");
        assert!(
            sim.sink.events.contains(&AppEvent::UpdateFailed {
                category: error.category()
            }),
            "{error:?}"
        );
    }
}

#[test]
fn partial_download_then_error_fails_the_pass() {
    let (cell, queue, log) = (LifecycleCell::new(), EdgeQueue::new(), call_log());
    let fetcher = ScriptedFetcher::new(
        log.clone(),
        [Attempt::Partial {
            chunks: 3,
            then: FetchError::Timeout,
        }],
    );
    let mut sim = Sim::new(&cell, &queue, &config_with_url(), log, fetcher);

    sim.click();
    sim.run_pass(MAX_TICKS).unwrap();

    assert_eq!(count(&sim.log, &HwCall::FetchChunk(2)), 1);
    assert_eq!(sim.sink.transitions(), FAILURE_PATH.to_vec());
    assert_eq!(cell.load(), Running);
}

#[test]
fn missing_url_fails_without_fetching() {
    let (cell, queue, log) = (LifecycleCell::new(), EdgeQueue::new(), call_log());
    let fetcher = ScriptedFetcher::succeeding(log.clone());
    let mut sim = Sim::new(&cell, &queue, &SystemConfig::default(), log, fetcher);

    sim.click();
    sim.run_pass(MAX_TICKS).unwrap();

    assert_eq!(
        sim.sink.transitions(),
        vec![
            (Running, UpdateRequested),
            (UpdateRequested, Failed),
            (Failed, Running)
        ]
    );
    assert_eq!(count(&sim.log, &HwCall::FetchInit), 0);
    assert_eq!(count(&sim.log, &HwCall::Fetch), 0);
    assert!(sim.sink.events.contains(&AppEvent::UpdateFailed {
        category: "configuration"
    }));
}

#[test]
fn fetch_init_failure_skips_preparing() {
    let (cell, queue, log) = (LifecycleCell::new(), EdgeQueue::new(), call_log());
    let mut fetcher = ScriptedFetcher::succeeding(log.clone());
    fetcher.init_error = Some(FetchError::InvalidConfig);
    let mut sim = Sim::new(&cell, &queue, &config_with_url(), log, fetcher);

    sim.click();
    sim.run_pass(MAX_TICKS).unwrap();

    assert_eq!(sim.sink.transitions()[1], (UpdateRequested, Failed));
    assert_eq!(count(&sim.log, &HwCall::DetachIrq), 0, "never quiesced");
    assert_eq!(count(&sim.log, &HwCall::Fetch), 0);
    assert_eq!(cell.load(), Running);
}

#[test]
fn restore_failure_is_fatal() {
    let (cell, queue, log) = (LifecycleCell::new(), EdgeQueue::new(), call_log());
    let fetcher = ScriptedFetcher::failing(log.clone(), FetchError::Tls);
    let mut sim = Sim::new(&cell, &queue, &config_with_url(), log, fetcher);
    sim.board.gpio.fail_attach = Some(-3);

    sim.click();
    let err = sim.run_pass(MAX_TICKS).unwrap_err();

    assert_eq!(err, Error::Hw(HwError::IsrHandlerFailed(-3)));
    assert_eq!(cell.load(), Failed, "never reports Running after a bad restore");
}

// ── Quiescer ordering ─────────────────────────────────────────

#[test]
fn quiesce_runs_once_and_before_fetch() {
    let (cell, queue, log) = (LifecycleCell::new(), EdgeQueue::new(), call_log());
    let fetcher = ScriptedFetcher::failing(log.clone(), FetchError::FlashWrite);
    let mut sim = Sim::new(&cell, &queue, &config_with_url(), log, fetcher);

    sim.click();
    sim.run_pass(MAX_TICKS).unwrap();

    let idle = position(&sim.log, &HwCall::SetOutput(PinState::Low)).unwrap();
    let detach = position(&sim.log, &HwCall::DetachIrq).unwrap();
    let disable = position(&sim.log, &HwCall::DisableIrq).unwrap();
    let fetch = position(&sim.log, &HwCall::Fetch).unwrap();
    assert!(idle < detach && detach < disable && disable < fetch);

    assert_eq!(count(&sim.log, &HwCall::DetachIrq), 1);
    assert_eq!(count(&sim.log, &HwCall::DisableIrq), 1);
    assert_eq!(
        sim.sink.count(|e| *e == AppEvent::PeripheralsQuiesced),
        1
    );
}

// ── Request handling ──────────────────────────────────────────

#[test]
fn burst_of_edges_raises_one_request() {
    let (cell, queue, log) = (LifecycleCell::new(), EdgeQueue::new(), call_log());
    let fetcher = ScriptedFetcher::failing(log.clone(), FetchError::Connection);
    let mut sim = Sim::new(&cell, &queue, &config_with_url(), log, fetcher);

    sim.board.gpio.button = PinState::High;
    for _ in 0..15 {
        queue.push_from_isr(EdgeEvent { gpio: 0 });
    }
    assert_eq!(queue.len(), 10);
    assert_eq!(queue.dropped(), 5);

    for _ in 0..MAX_TICKS {
        sim.tick().1.unwrap();
    }

    let requests = sim
        .sink
        .transitions()
        .iter()
        .filter(|t| **t == (Running, UpdateRequested))
        .count();
    assert_eq!(requests, 1);
    assert_eq!(sim.orch.passes(), 1);
    assert!(queue.is_empty());
}

#[test]
fn presses_during_a_pass_are_ignored() {
    let (cell, queue, log) = (LifecycleCell::new(), EdgeQueue::new(), call_log());
    let fetcher = ScriptedFetcher::failing(log.clone(), FetchError::Connection);
    let mut sim = Sim::new(&cell, &queue, &config_with_url(), log, fetcher);

    sim.click();
    sim.tick().1.unwrap();
    assert_eq!(cell.load(), Preparing);

    // Still armed: the edge is queued, then discarded by the monitor.
    sim.click();
    sim.tick().1.unwrap();
    assert_eq!(cell.load(), Fetching);
    assert!(queue.is_empty());

    // Quiesced: the edge never reaches the queue.
    assert!(!sim.set_button(PinState::Low));
    assert!(!sim.set_button(PinState::High));

    sim.run_pass(MAX_TICKS).unwrap();
    assert_eq!(sim.orch.passes(), 1);
    assert_eq!(sim.sink.transitions(), FAILURE_PATH.to_vec());
}

#[test]
fn request_rearms_after_failure() {
    let (cell, queue, log) = (LifecycleCell::new(), EdgeQueue::new(), call_log());
    let fetcher = ScriptedFetcher::new(
        log.clone(),
        [Attempt::Fail(FetchError::HttpStatus(503)), Attempt::Succeed],
    );
    let mut sim = Sim::new(&cell, &queue, &config_with_url(), log, fetcher);

    sim.click();
    sim.run_pass(MAX_TICKS).unwrap();
    assert_eq!(cell.load(), Running);

    sim.click();
    assert_eq!(sim.run_pass(MAX_TICKS).unwrap(), TickOutcome::RebootPending);

    let mut expected = FAILURE_PATH.to_vec();
    expected.extend_from_slice(&SUCCESS_PATH);
    assert_eq!(sim.sink.transitions(), expected);
    assert_eq!(sim.orch.passes(), 2);
    assert_eq!(sim.orch.failures(), 1);
    assert_eq!(count(&sim.log, &HwCall::DetachIrq), 2, "quiesced once per pass");
}

#[test]
fn idle_device_never_leaves_running() {
    let (cell, queue, log) = (LifecycleCell::new(), EdgeQueue::new(), call_log());
    let fetcher = ScriptedFetcher::succeeding(log.clone());
    let mut sim = Sim::new(&cell, &queue, &config_with_url(), log, fetcher);

    for _ in 0..MAX_TICKS {
        assert_eq!(sim.tick().1.unwrap(), TickOutcome::Idle(Running));
    }
    assert!(sim.sink.transitions().is_empty());
    assert_eq!(sim.sink.events, vec![AppEvent::Started(Running)]);
}
