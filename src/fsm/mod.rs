//! Function-pointer state machine driving the OTA lifecycle.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │  StateTable                                                      │
//! │  ┌─────────────────┬──────────┬─────────┬──────────────────────┐ │
//! │  │ LifecycleState  │ on_enter │ on_exit │ on_update            │ │
//! │  ├─────────────────┼──────────┼─────────┼──────────────────────┤ │
//! │  │ Running         │ fn(ctx)  │    -    │ fn(ctx, hw) -> Poll  │ │
//! │  │ UpdateRequested │    -     │    -    │ fn(ctx, hw) -> Poll  │ │
//! │  │ Preparing       │    -     │    -    │ fn(ctx, hw) -> Poll  │ │
//! │  │ Fetching        │ fn(ctx)  │    -    │ fn(ctx, hw) -> Poll  │ │
//! │  │ Failed          │ fn(ctx)  │    -    │ fn(ctx, hw) -> Poll  │ │
//! │  └─────────────────┴──────────┴─────────┴──────────────────────┘ │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each tick the engine first re-reads the shared lifecycle cell; if the
//! request monitor moved it (`Running → UpdateRequested`) the engine
//! follows.  It then runs `on_update` for the current state.  A
//! `Poll::Next` is committed to the cell through the
//! [`OrchestratorHandle`] before the engine's own pointer moves, so the
//! cell and the engine can never disagree on an orchestrator-driven edge.

pub mod context;
pub mod states;

use context::LifecycleContext;
use log::{error, info};

use crate::app::events::AppEvent;
use crate::app::ports::{EventSink, LifecyclePorts};
use crate::config::SystemConfig;
use crate::error::Error;
use crate::lifecycle::{LifecycleState, OrchestratorHandle};

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter` and `on_exit` actions.
pub type StateActionFn = fn(&mut LifecycleContext);

/// Signature for the per-poll handler.
pub type StateUpdateFn = fn(&mut LifecycleContext, &mut dyn LifecyclePorts) -> Result<Poll, Error>;

/// What a handler wants after its action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Poll {
    Stay,
    Next(LifecycleState),
    /// New image staged; the device must restart.
    Reboot,
}

/// What one [`LifecycleOrchestrator::tick`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Idle(LifecycleState),
    Transitioned {
        from: LifecycleState,
        to: LifecycleState,
    },
    /// Caller must restart the device; no further ticks do anything.
    RebootPending,
}

// ---------------------------------------------------------------------------
// State descriptor (one row in the table)
// ---------------------------------------------------------------------------

pub struct StateDescriptor {
    pub id: LifecycleState,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn>,
    pub on_exit: Option<StateActionFn>,
    pub on_update: StateUpdateFn,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

pub struct LifecycleOrchestrator<'a> {
    table: [StateDescriptor; LifecycleState::COUNT],
    current: usize,
    handle: OrchestratorHandle<'a>,
    ctx: LifecycleContext,
    passes: u32,
    failures: u32,
    reboot_pending: bool,
}

impl<'a> LifecycleOrchestrator<'a> {
    pub fn new(handle: OrchestratorHandle<'a>, config: &SystemConfig) -> Self {
        let current = handle.get() as usize;
        Self {
            table: states::build_state_table(),
            current,
            handle,
            ctx: LifecycleContext::new(config),
            passes: 0,
            failures: 0,
            reboot_pending: false,
        }
    }

    /// Run the initial `on_enter`.  Call once before the first `tick()`.
    pub fn start(&mut self, sink: &mut impl EventSink) {
        info!("FSM starting in state: {}", self.table[self.current].name);
        if let Some(enter) = self.table[self.current].on_enter {
            enter(&mut self.ctx);
        }
        sink.emit(&AppEvent::Started(self.state()));
    }

    /// One orchestrator poll.
    ///
    /// `Err` is fatal: either peripheral restoration failed or the cell
    /// refused a transition.  Recoverable failures surface as a
    /// transition to `Failed`.
    pub fn tick(
        &mut self,
        hw: &mut impl LifecyclePorts,
        sink: &mut impl EventSink,
    ) -> Result<TickOutcome, Error> {
        if self.reboot_pending {
            return Ok(TickOutcome::RebootPending);
        }

        let observed = self.handle.get();
        if observed as usize != self.current {
            if observed == LifecycleState::UpdateRequested {
                self.passes += 1;
            }
            self.follow(observed, sink);
        }

        let polled = (self.table[self.current].on_update)(&mut self.ctx, hw);
        self.flush(sink);

        match polled? {
            Poll::Stay => Ok(TickOutcome::Idle(self.state())),
            Poll::Next(next) => {
                let from = self.handle.advance(next).inspect_err(|e| {
                    error!("FSM: {}", e);
                })?;
                if next == LifecycleState::Failed {
                    self.failures += 1;
                }
                self.follow(next, sink);
                Ok(TickOutcome::Transitioned { from, to: next })
            }
            Poll::Reboot => {
                self.reboot_pending = true;
                sink.emit(&AppEvent::RebootPending);
                Ok(TickOutcome::RebootPending)
            }
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.table[self.current].id
    }

    /// Lifecycle passes started (requests observed) since boot.
    pub fn passes(&self) -> u32 {
        self.passes
    }

    /// Passes that ended in `Failed`.
    pub fn failures(&self) -> u32 {
        self.failures
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    /// Move the engine pointer to `next` (already committed to the cell).
    fn follow(&mut self, next: LifecycleState, sink: &mut impl EventSink) {
        let from = self.state();
        let next_idx = next as usize;

        info!(
            "FSM transition: {} -> {}",
            self.table[self.current].name, self.table[next_idx].name
        );

        if let Some(exit) = self.table[self.current].on_exit {
            exit(&mut self.ctx);
        }

        self.current = next_idx;

        if let Some(enter) = self.table[self.current].on_enter {
            enter(&mut self.ctx);
        }

        sink.emit(&AppEvent::StateChanged { from, to: next });
    }

    fn flush(&mut self, sink: &mut impl EventSink) {
        for event in &self.ctx.take_outbox() {
            sink.emit(event);
        }
    }
}
