//! Task wiring: three long-lived threads pinned to the application core.
//!
//! | Task         | Priority | Stack | Period                 |
//! |--------------|----------|-------|------------------------|
//! | toggle       | 1        | 4 KB  | `toggle_period_ms`     |
//! | monitor      | 1        | 4 KB  | `monitor_period_ms`    |
//! | orchestrator | 5        | 10 KB | `orchestrator_period_ms` |

pub mod monitor;
pub mod orchestrator;
pub mod toggle;

use core::time::Duration;
use std::thread::JoinHandle;

use embedded_hal::digital::PinState;
use log::error;

use crate::adapters::log_sink::LogEventSink;
use crate::adapters::ota::EspFetcher;
use crate::app::monitor::RequestMonitor;
use crate::app::ports::Board;
use crate::config::SystemConfig;
use crate::drivers::hw_init::EspGpio;
use crate::drivers::task_pin::{spawn_on_core, Core, TaskSpec};
use crate::error::{Error, Result};
use crate::events::EDGE_QUEUE;
use crate::fsm::LifecycleOrchestrator;
use crate::lifecycle::LIFECYCLE;

pub const TOGGLE_TASK: TaskSpec = TaskSpec {
    name: "ota-toggle\0",
    core: Core::App,
    priority: 1,
    stack_kb: 4,
};

pub const MONITOR_TASK: TaskSpec = TaskSpec {
    name: "ota-monitor\0",
    core: Core::App,
    priority: 1,
    stack_kb: 4,
};

pub const ORCHESTRATOR_TASK: TaskSpec = TaskSpec {
    name: "ota-lifecycle\0",
    core: Core::App,
    priority: 5,
    stack_kb: 10,
};

/// Join handles of the spawned tasks, kept so `main` can park on them.
pub struct TaskHandles {
    pub toggle: JoinHandle<()>,
    pub monitor: JoinHandle<()>,
    pub orchestrator: JoinHandle<()>,
}

/// Claim both lifecycle capabilities and start all three tasks.
///
/// `gpio` must already be configured and armed.  Fails with
/// [`Error::Init`] if called twice or if a thread cannot be created.
pub fn spawn_all(config: &SystemConfig, gpio: EspGpio) -> Result<TaskHandles> {
    let requester = LIFECYCLE
        .requester()
        .ok_or(Error::Init("update requester already claimed"))?;
    let handle = LIFECYCLE
        .orchestrator()
        .ok_or(Error::Init("orchestrator handle already claimed"))?;

    let idle = PinState::from(config.pins.idle_level_high);
    let monitor = RequestMonitor::new(
        &EDGE_QUEUE,
        requester,
        config.pins.polarity,
        Duration::from_millis(u64::from(config.monitor_period_ms)),
    );
    let orch = LifecycleOrchestrator::new(handle, config);
    let board = Board {
        gpio: gpio.clone(),
        fetcher: EspFetcher::new(),
    };

    let toggle_period = Duration::from_millis(u64::from(config.toggle_period_ms));
    let orch_period = Duration::from_millis(u64::from(config.orchestrator_period_ms));
    let reader = LIFECYCLE.reader();
    let toggle_gpio = gpio.clone();
    let line = gpio;

    let toggle = spawn_on_core(TOGGLE_TASK, move || {
        toggle::run(reader, toggle_gpio, idle, toggle_period)
    })
    .map_err(spawn_failed)?;
    let monitor = spawn_on_core(MONITOR_TASK, move || {
        monitor::run(monitor, line, LogEventSink::new())
    })
    .map_err(spawn_failed)?;
    let orchestrator = spawn_on_core(ORCHESTRATOR_TASK, move || {
        orchestrator::run(orch, board, LogEventSink::new(), orch_period)
    })
    .map_err(spawn_failed)?;

    Ok(TaskHandles {
        toggle,
        monitor,
        orchestrator,
    })
}

fn spawn_failed(e: std::io::Error) -> Error {
    error!("Task spawn failed: {}", e);
    Error::Init("task spawn failed")
}
