//! Mock adapters for integration tests.
//!
//! GPIO and fetch calls land in one shared, ordered log so tests can
//! assert on cross-collaborator ordering (quiesce strictly before fetch)
//! without touching real registers or the network.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use embedded_hal::digital::PinState;
use ota_lifecycle::app::events::AppEvent;
use ota_lifecycle::app::ports::{
    EventSink, FirmwareFetcher, GpioPort, ImageMark, LineLevel, ValidationMarkPort,
};
use ota_lifecycle::config::FetchConfig;
use ota_lifecycle::error::{FetchError, HwError, MarkError};
use ota_lifecycle::lifecycle::LifecycleState;

// ── Shared call log ───────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum HwCall {
    SetOutput(PinState),
    Configure,
    AttachIrq,
    DetachIrq,
    DisableIrq,
    FetchInit,
    FetchChunk(u32),
    Fetch,
}

pub type CallLog = Rc<RefCell<Vec<HwCall>>>;

pub fn call_log() -> CallLog {
    Rc::new(RefCell::new(Vec::new()))
}

pub fn count(log: &CallLog, call: &HwCall) -> usize {
    log.borrow().iter().filter(|c| *c == call).count()
}

pub fn position(log: &CallLog, call: &HwCall) -> Option<usize> {
    log.borrow().iter().position(|c| c == call)
}

// ── MockGpio ──────────────────────────────────────────────────

pub struct MockGpio {
    log: CallLog,
    pub button: PinState,
    pub output: PinState,
    pub irq_attached: bool,
    pub irq_enabled: bool,
    pub fail_configure: Option<i32>,
    pub fail_attach: Option<i32>,
}

#[allow(dead_code)]
impl MockGpio {
    /// Starts configured and armed, as `main` leaves it.
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            button: PinState::Low,
            output: PinState::Low,
            irq_attached: true,
            irq_enabled: true,
            fail_configure: None,
            fail_attach: None,
        }
    }

    /// Whether a button edge would reach the ISR right now.
    pub fn armed(&self) -> bool {
        self.irq_attached && self.irq_enabled
    }
}

impl GpioPort for MockGpio {
    fn set_output(&mut self, level: PinState) {
        self.output = level;
        self.log.borrow_mut().push(HwCall::SetOutput(level));
    }

    fn configure(&mut self) -> Result<(), HwError> {
        self.log.borrow_mut().push(HwCall::Configure);
        if let Some(rc) = self.fail_configure {
            return Err(HwError::GpioConfigFailed(rc));
        }
        self.irq_enabled = true;
        Ok(())
    }

    fn attach_edge_interrupt(&mut self) -> Result<(), HwError> {
        self.log.borrow_mut().push(HwCall::AttachIrq);
        if let Some(rc) = self.fail_attach {
            return Err(HwError::IsrHandlerFailed(rc));
        }
        self.irq_attached = true;
        Ok(())
    }

    fn detach_edge_interrupt(&mut self) {
        self.irq_attached = false;
        self.log.borrow_mut().push(HwCall::DetachIrq);
    }

    fn disable_edge_interrupt(&mut self) {
        self.irq_enabled = false;
        self.log.borrow_mut().push(HwCall::DisableIrq);
    }
}

impl LineLevel for MockGpio {
    fn button_level(&mut self) -> PinState {
        self.button
    }
}

// ── ScriptedFetcher ───────────────────────────────────────────

/// What one `fetch_and_flash` attempt does.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Attempt {
    Succeed,
    Fail(FetchError),
    /// Writes `chunks` blocks, then fails.
    Partial { chunks: u32, then: FetchError },
}

pub struct ScriptedFetcher {
    log: CallLog,
    attempts: VecDeque<Attempt>,
    pub init_error: Option<FetchError>,
    pub initialized: bool,
    pub last_config: Option<FetchConfig>,
}

#[allow(dead_code)]
impl ScriptedFetcher {
    pub fn new(log: CallLog, attempts: impl IntoIterator<Item = Attempt>) -> Self {
        Self {
            log,
            attempts: attempts.into_iter().collect(),
            init_error: None,
            initialized: false,
            last_config: None,
        }
    }

    pub fn succeeding(log: CallLog) -> Self {
        Self::new(log, [Attempt::Succeed])
    }

    pub fn failing(log: CallLog, error: FetchError) -> Self {
        Self::new(log, [Attempt::Fail(error)])
    }
}

impl FirmwareFetcher for ScriptedFetcher {
    fn init(&mut self, config: &FetchConfig) -> Result<(), FetchError> {
        self.log.borrow_mut().push(HwCall::FetchInit);
        self.last_config = Some(config.clone());
        if let Some(e) = self.init_error {
            self.initialized = false;
            return Err(e);
        }
        self.initialized = true;
        Ok(())
    }

    fn fetch_and_flash(&mut self) -> Result<(), FetchError> {
        self.log.borrow_mut().push(HwCall::Fetch);
        if !self.initialized {
            return Err(FetchError::NotInitialized);
        }
        match self.attempts.pop_front() {
            Some(Attempt::Succeed) => Ok(()),
            Some(Attempt::Fail(e)) => Err(e),
            Some(Attempt::Partial { chunks, then }) => {
                for i in 0..chunks {
                    self.log.borrow_mut().push(HwCall::FetchChunk(i));
                }
                Err(then)
            }
            None => Err(FetchError::Connection),
        }
    }
}

// ── MockMark ──────────────────────────────────────────────────

pub struct MockMark {
    pub mark: ImageMark,
    pub confirms: u32,
    pub read_error: Option<MarkError>,
    pub confirm_error: Option<MarkError>,
    pub digest: Option<[u8; 32]>,
    pub bootloader_digest: Option<[u8; 32]>,
    pub digest_reads: u32,
}

#[allow(dead_code)]
impl MockMark {
    pub fn new(mark: ImageMark) -> Self {
        Self {
            mark,
            confirms: 0,
            read_error: None,
            confirm_error: None,
            digest: None,
            bootloader_digest: None,
            digest_reads: 0,
        }
    }
}

impl ValidationMarkPort for MockMark {
    fn read_mark(&mut self) -> Result<ImageMark, MarkError> {
        match self.read_error {
            Some(e) => Err(e),
            None => Ok(self.mark),
        }
    }

    fn confirm_and_cancel_rollback(&mut self) -> Result<(), MarkError> {
        if let Some(e) = self.confirm_error {
            return Err(e);
        }
        self.confirms += 1;
        self.mark = ImageMark::Confirmed;
        Ok(())
    }

    fn bootloader_sha256(&mut self) -> Option<[u8; 32]> {
        self.digest_reads += 1;
        self.bootloader_digest
    }

    fn running_image_sha256(&mut self) -> Option<[u8; 32]> {
        self.digest_reads += 1;
        self.digest
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transitions(&self) -> Vec<(LifecycleState, LifecycleState)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                AppEvent::StateChanged { from, to } => Some((*from, *to)),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
