//! Interrupt-driven edge queue.
//!
//! The GPIO ISR is the only producer; the request monitor task is the only
//! consumer.  The ISR never blocks, allocates, or logs: it does one
//! `try_send` and bumps a counter when the queue is full.
//!
//! ```text
//! ┌─────────────┐  try_send   ┌──────────────┐      try_receive        ┌─────────────────┐
//! │  GPIO ISR   │────────────▶│  EdgeQueue   │────────────────────────▶│ Request Monitor │
//! │ (any edge)  │  (drop new) │  (depth 10)  │  (bounded by period)    │   (task)        │
//! └─────────────┘             └──────────────┘                         └─────────────────┘
//! ```

use core::sync::atomic::{AtomicU32, Ordering};
use core::time::Duration;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use futures_lite::future;

/// Depth of the edge queue.
pub const EDGE_QUEUE_DEPTH: usize = 10;

/// One hardware-level transition on a watched input line.  Direction is
/// not captured here; the consumer re-reads the line level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeEvent {
    pub gpio: i32,
}

/// Bounded ISR-to-task queue with a drop-newest overflow policy.
pub struct EdgeQueue {
    channel: Channel<CriticalSectionRawMutex, EdgeEvent, EDGE_QUEUE_DEPTH>,
    dropped: AtomicU32,
}

impl EdgeQueue {
    pub const fn new() -> Self {
        Self {
            channel: Channel::new(),
            dropped: AtomicU32::new(0),
        }
    }

    /// Enqueue from interrupt context.  Returns `false` if the queue was
    /// full and the event was discarded.
    pub fn push_from_isr(&self, event: EdgeEvent) -> bool {
        if self.channel.try_send(event).is_ok() {
            true
        } else {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            false
        }
    }

    /// Non-blocking dequeue.
    pub fn try_take(&self) -> Option<EdgeEvent> {
        self.channel.try_receive().ok()
    }

    /// Wait up to `period` for an edge.  Parks the calling thread on the
    /// `async-io-mini` reactor timer instead of spinning.
    ///
    /// The consumer never registers a waker on the channel: a waker fired
    /// from `try_send` would run in interrupt context.  An edge that lands
    /// mid-wait is picked up when the timer expires.
    pub fn take_within(&self, period: Duration) -> Option<EdgeEvent> {
        if let Some(event) = self.try_take() {
            return Some(event);
        }
        future::block_on(async_io_mini::Timer::after(period));
        self.try_take()
    }

    /// Discard everything currently queued.  Returns how many were removed.
    pub fn drain(&self) -> usize {
        let mut n = 0;
        while self.try_take().is_some() {
            n += 1;
        }
        n
    }

    /// Edges lost to a full queue since boot.
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.channel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channel.is_empty()
    }
}

impl Default for EdgeQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// The queue fed by the button ISR.
pub static EDGE_QUEUE: EdgeQueue = EdgeQueue::new();

/// ISR entry point: record an edge on `gpio` in [`EDGE_QUEUE`].
pub fn push_edge(gpio: i32) -> bool {
    EDGE_QUEUE.push_from_isr(EdgeEvent { gpio })
}
