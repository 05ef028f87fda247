//! Shared mutable context threaded through every lifecycle handler.
//!
//! `LifecycleContext` is the blackboard state handlers read from and
//! write to: the immutable fetch record, the quiesce level, per-pass
//! bookkeeping and an outbox of events the engine forwards to
//! the [`EventSink`](crate::app::ports::EventSink) after each handler.

use embedded_hal::digital::PinState;
use log::warn;

use crate::app::events::AppEvent;
use crate::config::{FetchConfig, SystemConfig};

/// Events a single handler call may queue.
const OUTBOX_DEPTH: usize = 4;

pub struct LifecycleContext {
    /// Fetch parameters; read-only for the lifetime of the orchestrator.
    pub fetch: FetchConfig,
    /// Level the output is forced to while quiesced.
    pub idle_level: PinState,

    // --- Per-pass bookkeeping (reset on entering Running) ---
    /// The fetch collaborator accepted `fetch` during this pass.
    pub fetcher_ready: bool,
    /// The quiescer has run during this pass.
    pub quiesced: bool,
    /// Category of the failure that routed this pass to `Failed`.
    pub failure: Option<&'static str>,

    outbox: heapless::Vec<AppEvent, OUTBOX_DEPTH>,
}

impl LifecycleContext {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            fetch: config.fetch.clone(),
            idle_level: PinState::from(config.pins.idle_level_high),
            fetcher_ready: false,
            quiesced: false,
            failure: None,
            outbox: heapless::Vec::new(),
        }
    }

    /// Queue an event for the sink.
    pub fn emit(&mut self, event: AppEvent) {
        if self.outbox.push(event).is_err() {
            warn!("Lifecycle outbox full, event dropped");
        }
    }

    /// Record a recoverable failure for this pass.
    pub fn fail(&mut self, category: &'static str) {
        self.failure = Some(category);
        self.emit(AppEvent::UpdateFailed { category });
    }

    /// Forget everything learned during the previous pass.
    pub fn reset_pass(&mut self) {
        self.fetcher_ready = false;
        self.quiesced = false;
        self.failure = None;
    }

    pub(super) fn take_outbox(&mut self) -> heapless::Vec<AppEvent, OUTBOX_DEPTH> {
        core::mem::take(&mut self.outbox)
    }
}
