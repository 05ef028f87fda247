//! Unified error types for the OTA lifecycle firmware.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! orchestrator's error routing uniform.  All variants are `Copy` so they
//! can be passed through the state handlers and event sinks without
//! allocation.

use core::fmt;

use crate::lifecycle::LifecycleState;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Configuration is missing or invalid.
    Config(ConfigError),
    /// The fetch-and-flash collaborator failed.
    Fetch(FetchError),
    /// Peripheral configuration or interrupt registration failed.
    Hw(HwError),
    /// The image validation mark could not be read or advanced.
    Mark(MarkError),
    /// A lifecycle transition was rejected by the state cell.
    Transition(TransitionError),
    /// One-shot bootstrap step failed.
    Init(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Fetch(e) => write!(f, "fetch: {e}"),
            Self::Hw(e) => write!(f, "hw: {e}"),
            Self::Mark(e) => write!(f, "validation mark: {e}"),
            Self::Transition(e) => write!(f, "lifecycle: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// No firmware URL configured.
    MissingUrl,
    /// URL is not an `http://` or `https://` locator.
    InvalidUrl,
    /// URL does not fit the fixed-capacity buffer.
    UrlTooLong,
    /// A pin number is outside the addressable GPIO range.
    InvalidPin(i32),
    /// Button and output share the same pin.
    PinConflict,
    /// A task period is zero.
    InvalidPeriod(&'static str),
    /// Stored overlay failed deserialization.
    Corrupted,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingUrl => write!(f, "firmware URL missing"),
            Self::InvalidUrl => write!(f, "firmware URL must start with http:// or https://"),
            Self::UrlTooLong => write!(f, "firmware URL too long"),
            Self::InvalidPin(pin) => write!(f, "GPIO {pin} out of range"),
            Self::PinConflict => write!(f, "button and output pins must differ"),
            Self::InvalidPeriod(which) => write!(f, "{which} period must be non-zero"),
            Self::Corrupted => write!(f, "stored config corrupted"),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Fetch errors
// ---------------------------------------------------------------------------

/// Failure reported by the fetch-and-flash collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchError {
    /// Fetch configuration rejected by the collaborator.
    InvalidConfig,
    /// `fetch_and_flash` called without a successful `init`.
    NotInitialized,
    /// TCP connect / DNS / socket failure.
    Connection,
    /// TLS handshake or certificate verification failed.
    Tls,
    /// Server answered with a non-success HTTP status.
    HttpStatus(u16),
    /// Downloaded image failed header or digest validation.
    ImageInvalid,
    /// Writing the inactive partition failed.
    FlashWrite,
    /// Transfer stalled past the client timeout.
    Timeout,
    /// Any other platform error code.
    Platform(i32),
}

impl FetchError {
    /// Coarse, human-readable category used in logs and events.
    pub const fn category(self) -> &'static str {
        match self {
            Self::InvalidConfig | Self::NotInitialized => "configuration",
            Self::Connection | Self::Timeout => "transport",
            Self::Tls => "tls",
            Self::HttpStatus(_) => "http",
            Self::ImageInvalid => "image",
            Self::FlashWrite => "flash",
            Self::Platform(_) => "platform",
        }
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfig => write!(f, "invalid fetch configuration"),
            Self::NotInitialized => write!(f, "fetch subsystem not initialized"),
            Self::Connection => write!(f, "connection failed"),
            Self::Tls => write!(f, "TLS handshake failed"),
            Self::HttpStatus(code) => write!(f, "HTTP status {code}"),
            Self::ImageInvalid => write!(f, "image validation failed"),
            Self::FlashWrite => write!(f, "partition write failed"),
            Self::Timeout => write!(f, "transfer timed out"),
            Self::Platform(rc) => write!(f, "platform error (rc={rc})"),
        }
    }
}

impl From<FetchError> for Error {
    fn from(e: FetchError) -> Self {
        Self::Fetch(e)
    }
}

// ---------------------------------------------------------------------------
// Hardware errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwError {
    GpioConfigFailed(i32),
    IsrInstallFailed(i32),
    IsrHandlerFailed(i32),
}

impl fmt::Display for HwError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={rc})"),
            Self::IsrInstallFailed(rc) => write!(f, "GPIO ISR service install failed (rc={rc})"),
            Self::IsrHandlerFailed(rc) => write!(f, "GPIO ISR handler add failed (rc={rc})"),
        }
    }
}

impl From<HwError> for Error {
    fn from(e: HwError) -> Self {
        Self::Hw(e)
    }
}

// ---------------------------------------------------------------------------
// Validation mark errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkError {
    /// The running partition could not be located.
    NoRunningPartition,
    /// Reading the image state failed.
    ReadFailed(i32),
    /// Marking the image valid failed.
    ConfirmFailed(i32),
}

impl fmt::Display for MarkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoRunningPartition => write!(f, "running partition not found"),
            Self::ReadFailed(rc) => write!(f, "image state read failed (rc={rc})"),
            Self::ConfirmFailed(rc) => write!(f, "mark valid failed (rc={rc})"),
        }
    }
}

impl From<MarkError> for Error {
    fn from(e: MarkError) -> Self {
        Self::Mark(e)
    }
}

// ---------------------------------------------------------------------------
// Transition errors
// ---------------------------------------------------------------------------

/// A transition the state cell refused: either not a legal edge, or the
/// cell no longer held the expected source state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionError {
    pub from: LifecycleState,
    pub to: LifecycleState,
}

impl fmt::Display for TransitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "illegal transition {} -> {}", self.from.name(), self.to.name())
    }
}

impl From<TransitionError> for Error {
    fn from(e: TransitionError) -> Self {
        Self::Transition(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
