//! Port traits: the hexagonal boundary between lifecycle logic and the
//! platform.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ RequestMonitor / LifecycleOrchestrator / boot
//! ```
//!
//! Real adapters live in [`crate::drivers`] and [`crate::adapters`];
//! recording fakes live in the integration tests.  The domain code takes
//! these by generic parameter, so nothing above this line touches a
//! register.

use core::fmt;

use embedded_hal::digital::PinState;

use crate::config::FetchConfig;
use crate::error::{FetchError, HwError, MarkError};

// ───────────────────────────────────────────────────────────────
// GPIO port (output line + edge interrupt on the button line)
// ───────────────────────────────────────────────────────────────

/// Everything the lifecycle needs to do to the two GPIO lines.
pub trait GpioPort {
    /// Drive the output line.
    fn set_output(&mut self, level: PinState);

    /// Apply the normal operating configuration to both lines (direction,
    /// pull mode, interrupt type).  Idempotent.
    fn configure(&mut self) -> Result<(), HwError>;

    /// Register the edge handler on the button line.  Installs the shared
    /// ISR service if needed.
    fn attach_edge_interrupt(&mut self) -> Result<(), HwError>;

    /// Remove the edge handler from the button line.
    fn detach_edge_interrupt(&mut self);

    /// Stop the button line from generating interrupts at all.
    fn disable_edge_interrupt(&mut self);
}

/// Read side of the button line.
pub trait LineLevel {
    fn button_level(&mut self) -> PinState;
}

// ───────────────────────────────────────────────────────────────
// Fetch-and-flash collaborator
// ───────────────────────────────────────────────────────────────

/// Opaque, blocking firmware download and install.
pub trait FirmwareFetcher {
    /// Validate and latch `config` for the next fetch.
    fn init(&mut self, config: &FetchConfig) -> Result<(), FetchError>;

    /// Download and write the new image, then select it for next boot.
    ///
    /// `Ok(())` means the caller must restart; the image is already staged.
    /// Fails with [`FetchError::NotInitialized`] unless the last `init`
    /// succeeded.
    fn fetch_and_flash(&mut self) -> Result<(), FetchError>;
}

// ───────────────────────────────────────────────────────────────
// Validation mark collaborator
// ───────────────────────────────────────────────────────────────

/// Persisted verification state of the running image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageMark {
    Confirmed,
    PendingVerify,
    Undefined,
}

impl fmt::Display for ImageMark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Confirmed => write!(f, "confirmed"),
            Self::PendingVerify => write!(f, "pending-verify"),
            Self::Undefined => write!(f, "undefined"),
        }
    }
}

pub trait ValidationMarkPort {
    fn read_mark(&mut self) -> Result<ImageMark, MarkError>;

    /// Mark the running image valid and cancel the pending rollback.
    fn confirm_and_cancel_rollback(&mut self) -> Result<(), MarkError>;

    /// SHA-256 of the second-stage bootloader, if the platform can report it.
    fn bootloader_sha256(&mut self) -> Option<[u8; 32]> {
        None
    }

    /// SHA-256 of the running image, if the platform can report it.
    fn running_image_sha256(&mut self) -> Option<[u8; 32]> {
        None
    }
}

// ───────────────────────────────────────────────────────────────
// Event sink port (domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The lifecycle emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Connectivity port (bootstrap only)
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityError {
    NoCredentials,
    InvalidSsid,
    InvalidPassword,
    DriverInit(i32),
    ConnectionFailed,
}

impl fmt::Display for ConnectivityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredentials => write!(f, "no WiFi credentials configured"),
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => write!(f, "password invalid (must be 8-64 bytes for WPA2)"),
            Self::DriverInit(rc) => write!(f, "WiFi driver init failed (rc={rc})"),
            Self::ConnectionFailed => write!(f, "WiFi connection failed"),
        }
    }
}

impl core::error::Error for ConnectivityError {}

/// Synchronous network bring-up, completed before any task starts.
pub trait ConnectivityPort {
    fn connect(&mut self) -> Result<(), ConnectivityError>;
    fn is_connected(&self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Composite
// ───────────────────────────────────────────────────────────────

/// Hardware surface handed to the orchestrator's state handlers.
pub trait LifecyclePorts: GpioPort + FirmwareFetcher {}

impl<T: GpioPort + FirmwareFetcher> LifecyclePorts for T {}

/// Pairs a GPIO adapter with a fetcher to form one [`LifecyclePorts`].
pub struct Board<G, F> {
    pub gpio: G,
    pub fetcher: F,
}

impl<G: GpioPort, F> GpioPort for Board<G, F> {
    fn set_output(&mut self, level: PinState) {
        self.gpio.set_output(level);
    }
    fn configure(&mut self) -> Result<(), HwError> {
        self.gpio.configure()
    }
    fn attach_edge_interrupt(&mut self) -> Result<(), HwError> {
        self.gpio.attach_edge_interrupt()
    }
    fn detach_edge_interrupt(&mut self) {
        self.gpio.detach_edge_interrupt();
    }
    fn disable_edge_interrupt(&mut self) {
        self.gpio.disable_edge_interrupt();
    }
}

impl<G, F: FirmwareFetcher> FirmwareFetcher for Board<G, F> {
    fn init(&mut self, config: &FetchConfig) -> Result<(), FetchError> {
        self.fetcher.init(config)
    }
    fn fetch_and_flash(&mut self) -> Result<(), FetchError> {
        self.fetcher.fetch_and_flash()
    }
}
