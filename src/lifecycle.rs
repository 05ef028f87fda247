//! Process-wide lifecycle state.
//!
//! One `AtomicU8` holds the current [`LifecycleState`].  Writers never
//! touch the atomic directly: they hold a capability handle that exposes
//! only the transitions they are allowed to perform.
//!
//! ```text
//!               Requester                OrchestratorHandle
//!                   │                            │
//!   Running ──▶ UpdateRequested ──▶ Preparing ──▶ Fetching ──▶ (reset)
//!      ▲                 │                           │
//!      │                 └──────────▶ Failed ◀───────┘
//!      └─────────────────────────────────┘
//! ```
//!
//! Each cell hands out at most one [`Requester`] and one
//! [`OrchestratorHandle`]; readers are unlimited.  Every write is a
//! `compare_exchange` from the expected source state, so a stale writer
//! can never clobber a newer state.

use core::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use crate::error::TransitionError;

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum LifecycleState {
    Running = 0,
    UpdateRequested = 1,
    Preparing = 2,
    Fetching = 3,
    Failed = 4,
}

impl LifecycleState {
    /// Total number of states; sizes the orchestrator's state table.
    pub const COUNT: usize = 5;

    /// Convert a raw index back to a state.  Out-of-range values map to
    /// `Failed` (the recovery state) and trip a debug assertion.
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::Running,
            1 => Self::UpdateRequested,
            2 => Self::Preparing,
            3 => Self::Fetching,
            4 => Self::Failed,
            _ => {
                debug_assert!(false, "invalid lifecycle index: {idx}");
                Self::Failed
            }
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Running => "Running",
            Self::UpdateRequested => "UpdateRequested",
            Self::Preparing => "Preparing",
            Self::Fetching => "Fetching",
            Self::Failed => "Failed",
        }
    }

    /// The complete set of edges a lifecycle pass may take.
    pub const fn is_legal_edge(self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::Running, Self::UpdateRequested)
                | (Self::UpdateRequested, Self::Preparing)
                | (Self::UpdateRequested, Self::Failed)
                | (Self::Preparing, Self::Fetching)
                | (Self::Fetching, Self::Failed)
                | (Self::Failed, Self::Running)
        )
    }
}

// ---------------------------------------------------------------------------
// Cell
// ---------------------------------------------------------------------------

/// Shared, lock-free home of the lifecycle state.
pub struct LifecycleCell {
    raw: AtomicU8,
    requester_taken: AtomicBool,
    orchestrator_taken: AtomicBool,
}

impl LifecycleCell {
    /// A cell in `Running`, as at boot.
    pub const fn new() -> Self {
        Self {
            raw: AtomicU8::new(LifecycleState::Running as u8),
            requester_taken: AtomicBool::new(false),
            orchestrator_taken: AtomicBool::new(false),
        }
    }

    pub fn load(&self) -> LifecycleState {
        LifecycleState::from_index(self.raw.load(Ordering::Acquire) as usize)
    }

    pub fn reader(&self) -> StateReader<'_> {
        StateReader { cell: self }
    }

    /// Claim the request capability.  Returns `None` once claimed.
    pub fn requester(&self) -> Option<Requester<'_>> {
        (!self.requester_taken.swap(true, Ordering::AcqRel)).then_some(Requester { cell: self })
    }

    /// Claim the orchestrator capability.  Returns `None` once claimed.
    pub fn orchestrator(&self) -> Option<OrchestratorHandle<'_>> {
        (!self.orchestrator_taken.swap(true, Ordering::AcqRel))
            .then_some(OrchestratorHandle { cell: self })
    }

    fn swap_from(&self, from: LifecycleState, to: LifecycleState) -> Result<(), TransitionError> {
        self.raw
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(|_| TransitionError { from: self.load(), to })
    }
}

impl Default for LifecycleCell {
    fn default() -> Self {
        Self::new()
    }
}

/// The firmware's single lifecycle cell.
pub static LIFECYCLE: LifecycleCell = LifecycleCell::new();

// ---------------------------------------------------------------------------
// Capability handles
// ---------------------------------------------------------------------------

/// Read-only view; stale by at most one poll cycle is acceptable.
#[derive(Clone, Copy)]
pub struct StateReader<'a> {
    cell: &'a LifecycleCell,
}

impl StateReader<'_> {
    pub fn get(&self) -> LifecycleState {
        self.cell.load()
    }

    pub fn is_running(&self) -> bool {
        self.get() == LifecycleState::Running
    }
}

/// Held by the request monitor: may only raise `Running → UpdateRequested`.
pub struct Requester<'a> {
    cell: &'a LifecycleCell,
}

impl Requester<'_> {
    /// Raise an update request.  Returns `false` (and changes nothing) if
    /// the state was not `Running`.
    pub fn request_update(&self) -> bool {
        self.cell
            .swap_from(LifecycleState::Running, LifecycleState::UpdateRequested)
            .is_ok()
    }

    pub fn reader(&self) -> StateReader<'_> {
        self.cell.reader()
    }
}

/// Held by the lifecycle orchestrator: every edge except the request edge.
pub struct OrchestratorHandle<'a> {
    cell: &'a LifecycleCell,
}

impl OrchestratorHandle<'_> {
    pub fn get(&self) -> LifecycleState {
        self.cell.load()
    }

    /// Move from the current state to `to`.  Rejects the request edge and
    /// anything not in [`LifecycleState::is_legal_edge`].  Returns the
    /// state that was left.
    pub fn advance(&self, to: LifecycleState) -> Result<LifecycleState, TransitionError> {
        let from = self.cell.load();
        if to == LifecycleState::UpdateRequested || !from.is_legal_edge(to) {
            return Err(TransitionError { from, to });
        }
        self.cell.swap_from(from, to)?;
        Ok(from)
    }

    pub fn reader(&self) -> StateReader<'_> {
        self.cell.reader()
    }
}
