//! Concrete lifecycle handlers and table builder.
//!
//! Each state is three plain `fn` pointers: no closures, no heap.  The
//! update handler performs the state's action on every poll and says
//! where to go next.
//!
//! ```text
//!  RUNNING ──[monitor: qualifying edge]──▶ UPDATE_REQUESTED
//!     ▲                                      │           │
//!     │                              [fetch ready]  [bad config]
//!     │                                      ▼           │
//!     │                                  PREPARING       │
//!     │                                      │           │
//!     │                                 [quiesced]       │
//!     │                                      ▼           │
//!     │                                  FETCHING ──[ok]──▶ reboot
//!     │                                      │           │
//!     │                                   [error]        │
//!     │                                      ▼           │
//!     └─────────[restored]────────────── FAILED ◀────────┘
//! ```

use log::{info, warn};

use super::context::LifecycleContext;
use super::{Poll, StateDescriptor};
use crate::app::events::AppEvent;
use crate::app::ports::LifecyclePorts;
use crate::drivers::quiesce;
use crate::error::{Error, FetchError};
use crate::lifecycle::LifecycleState;

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the state table.  Indexed by `LifecycleState as usize`.
pub fn build_state_table() -> [StateDescriptor; LifecycleState::COUNT] {
    [
        StateDescriptor {
            id: LifecycleState::Running,
            name: "Running",
            on_enter: Some(running_enter),
            on_exit: None,
            on_update: running,
        },
        StateDescriptor {
            id: LifecycleState::UpdateRequested,
            name: "UpdateRequested",
            on_enter: None,
            on_exit: None,
            on_update: update_requested,
        },
        StateDescriptor {
            id: LifecycleState::Preparing,
            name: "Preparing",
            on_enter: None,
            on_exit: None,
            on_update: preparing,
        },
        StateDescriptor {
            id: LifecycleState::Fetching,
            name: "Fetching",
            on_enter: Some(fetching_enter),
            on_exit: None,
            on_update: fetching,
        },
        StateDescriptor {
            id: LifecycleState::Failed,
            name: "Failed",
            on_enter: Some(failed_enter),
            on_exit: None,
            on_update: failed,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  RUNNING
// ═══════════════════════════════════════════════════════════════════════════

fn running_enter(ctx: &mut LifecycleContext) {
    ctx.reset_pass();
}

/// Nothing to do; only the request monitor leaves this state.
pub fn running(_ctx: &mut LifecycleContext, _hw: &mut dyn LifecyclePorts) -> Result<Poll, Error> {
    Ok(Poll::Stay)
}

// ═══════════════════════════════════════════════════════════════════════════
//  UPDATE_REQUESTED: validate the fetch record and arm the fetcher
// ═══════════════════════════════════════════════════════════════════════════

pub fn update_requested(
    ctx: &mut LifecycleContext,
    hw: &mut dyn LifecyclePorts,
) -> Result<Poll, Error> {
    let url = match ctx.fetch.validate() {
        Ok(url) => url,
        Err(e) => {
            warn!("UPDATE_REQUESTED: {}", e);
            ctx.fail("configuration");
            return Ok(Poll::Next(LifecycleState::Failed));
        }
    };
    info!("UPDATE_REQUESTED: target {}", url);

    if let Err(e) = hw.init(&ctx.fetch) {
        warn!("UPDATE_REQUESTED: fetch init failed: {}", e);
        ctx.fail(e.category());
        return Ok(Poll::Next(LifecycleState::Failed));
    }
    ctx.fetcher_ready = true;
    Ok(Poll::Next(LifecycleState::Preparing))
}

// ═══════════════════════════════════════════════════════════════════════════
//  PREPARING: quiesce peripherals before any network traffic
// ═══════════════════════════════════════════════════════════════════════════

pub fn preparing(ctx: &mut LifecycleContext, hw: &mut dyn LifecyclePorts) -> Result<Poll, Error> {
    quiesce::quiesce(hw, ctx.idle_level);
    ctx.quiesced = true;
    ctx.emit(AppEvent::PeripheralsQuiesced);
    Ok(Poll::Next(LifecycleState::Fetching))
}

// ═══════════════════════════════════════════════════════════════════════════
//  FETCHING: blocking download and flash
// ═══════════════════════════════════════════════════════════════════════════

fn fetching_enter(_ctx: &mut LifecycleContext) {
    info!("FETCHING: download started, this task blocks until it completes");
}

/// The fetcher is only called once this pass has both armed it and
/// quiesced the peripherals.
pub fn fetching(ctx: &mut LifecycleContext, hw: &mut dyn LifecyclePorts) -> Result<Poll, Error> {
    if !(ctx.fetcher_ready && ctx.quiesced) {
        let e = FetchError::NotInitialized;
        warn!(
            "FETCHING: refused (fetcher ready: {}, quiesced: {})",
            ctx.fetcher_ready, ctx.quiesced
        );
        ctx.fail(e.category());
        return Ok(Poll::Next(LifecycleState::Failed));
    }
    match hw.fetch_and_flash() {
        Ok(()) => {
            info!("FETCHING: image staged, restart required");
            Ok(Poll::Reboot)
        }
        Err(e) => {
            warn!("FETCHING: {} ({})", e, e.category());
            ctx.fail(e.category());
            Ok(Poll::Next(LifecycleState::Failed))
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  FAILED: restore normal peripherals and return to Running
// ═══════════════════════════════════════════════════════════════════════════

fn failed_enter(ctx: &mut LifecycleContext) {
    warn!(
        "FAILED: update aborted ({}), reverting to normal operation",
        ctx.failure.unwrap_or("unknown")
    );
}

/// A restore error escapes as `Err`: the request path cannot be re-armed.
pub fn failed(ctx: &mut LifecycleContext, hw: &mut dyn LifecyclePorts) -> Result<Poll, Error> {
    quiesce::restore(hw)?;
    ctx.emit(AppEvent::PeripheralsRestored);
    Ok(Poll::Next(LifecycleState::Running))
}
