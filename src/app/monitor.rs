//! Request monitor: turns queued button edges into an update request.
//!
//! Each cycle either waits (bounded by the monitor period) for one edge
//! while the lifecycle is `Running`, or drains and ignores everything
//! queued while it is not.  Only the monitor holds the [`Requester`], so
//! it is the only code that can raise `Running → UpdateRequested`.

use core::time::Duration;

use embedded_hal::digital::PinState;
use futures_lite::future;
use log::{debug, info};

use crate::app::events::AppEvent;
use crate::app::ports::{EventSink, LineLevel};
use crate::config::{EdgeDirection, EdgePolarity};
use crate::events::{EdgeEvent, EdgeQueue};
use crate::lifecycle::Requester;

/// Direction of the edge that just fired, judged from the level the line
/// settled at.
pub fn classify_edge(level: PinState) -> EdgeDirection {
    match level {
        PinState::High => EdgeDirection::Rising,
        PinState::Low => EdgeDirection::Falling,
    }
}

/// Result of one monitor cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorOutcome {
    /// Running, but no edge arrived.
    NoEdge,
    /// A qualifying edge moved the lifecycle to `UpdateRequested`.
    Raised(EdgeEvent),
    /// An edge arrived whose direction does not match the polarity.
    NotQualifying(EdgeDirection),
    /// The lifecycle was not `Running`; this many edges were discarded.
    Ignored(usize),
}

pub struct RequestMonitor<'a> {
    queue: &'a EdgeQueue,
    requester: Requester<'a>,
    polarity: EdgePolarity,
    period: Duration,
}

impl<'a> RequestMonitor<'a> {
    pub fn new(
        queue: &'a EdgeQueue,
        requester: Requester<'a>,
        polarity: EdgePolarity,
        period: Duration,
    ) -> Self {
        Self {
            queue,
            requester,
            polarity,
            period,
        }
    }

    /// One non-blocking cycle.  Used by the cooperative simulation and by
    /// [`cycle`](Self::cycle) once an edge is in hand.
    pub fn poll(&mut self, line: &mut impl LineLevel, sink: &mut impl EventSink) -> MonitorOutcome {
        if !self.requester.reader().is_running() {
            return self.ignore_queued();
        }
        match self.queue.try_take() {
            Some(edge) => self.handle(edge, line, sink),
            None => MonitorOutcome::NoEdge,
        }
    }

    /// One task cycle.  Blocks for at most one period, never spins.
    pub fn cycle(&mut self, line: &mut impl LineLevel, sink: &mut impl EventSink) -> MonitorOutcome {
        if !self.requester.reader().is_running() {
            let outcome = self.ignore_queued();
            future::block_on(async_io_mini::Timer::after(self.period));
            return outcome;
        }
        match self.queue.take_within(self.period) {
            Some(edge) => self.handle(edge, line, sink),
            None => MonitorOutcome::NoEdge,
        }
    }

    fn handle(
        &mut self,
        edge: EdgeEvent,
        line: &mut impl LineLevel,
        sink: &mut impl EventSink,
    ) -> MonitorOutcome {
        let direction = classify_edge(line.button_level());
        if !self.polarity.matches(direction) {
            debug!("Monitor: {:?} edge on GPIO {} ignored", direction, edge.gpio);
            return MonitorOutcome::NotQualifying(direction);
        }
        if self.requester.request_update() {
            info!("Monitor: update requested (GPIO {}, {:?})", edge.gpio, direction);
            sink.emit(&AppEvent::RequestRaised { gpio: edge.gpio });
            MonitorOutcome::Raised(edge)
        } else {
            // State left Running after the check above.
            MonitorOutcome::Ignored(1)
        }
    }

    fn ignore_queued(&self) -> MonitorOutcome {
        let n = self.queue.drain();
        if n > 0 {
            debug!("Monitor: {} edge(s) discarded outside Running", n);
        }
        MonitorOutcome::Ignored(n)
    }
}
