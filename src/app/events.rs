//! Outbound application events.
//!
//! The monitor, orchestrator and boot validator emit these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them.

use crate::app::ports::ImageMark;
use crate::lifecycle::LifecycleState;

/// Structured events emitted by the lifecycle core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// The orchestrator has started (carries initial state).
    Started(LifecycleState),

    /// A qualifying edge raised an update request.
    RequestRaised { gpio: i32 },

    /// The lifecycle moved between states.
    StateChanged {
        from: LifecycleState,
        to: LifecycleState,
    },

    /// Output forced idle and button interrupt disabled.
    PeripheralsQuiesced,

    /// A recoverable failure routed the pass to `Failed`.
    UpdateFailed { category: &'static str },

    /// Normal peripheral configuration re-applied after a failure.
    PeripheralsRestored,

    /// New image staged; the device is about to restart.
    RebootPending,

    /// Boot validation finished.  `confirmed` is true when this boot
    /// advanced a pending image to confirmed.
    BootValidated { mark: ImageMark, confirmed: bool },
}
