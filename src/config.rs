//! System configuration parameters
//!
//! Every tunable of the OTA lifecycle: pin identities, trigger polarity,
//! task periods, and the update fetch record.  Defaults come from the
//! build environment (`OTA_*` variables, see `build.rs`); a JSON overlay
//! stored in NVS may replace them at boot.  Nothing here is mutable once
//! the tasks are running.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::pins;

/// Capacity of the firmware URL buffer.
pub const URL_CAPACITY: usize = 256;

// ---------------------------------------------------------------------------
// Edge source
// ---------------------------------------------------------------------------

/// Direction of a single transition on the button line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeDirection {
    Rising,
    Falling,
}

/// Which edge directions count as an update request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgePolarity {
    Rising,
    Falling,
    Both,
}

impl EdgePolarity {
    /// True if an edge in `direction` qualifies under this polarity.
    pub const fn matches(self, direction: EdgeDirection) -> bool {
        match self {
            Self::Rising => matches!(direction, EdgeDirection::Rising),
            Self::Falling => matches!(direction, EdgeDirection::Falling),
            Self::Both => true,
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "rising" => Some(Self::Rising),
            "falling" => Some(Self::Falling),
            "both" | "any" => Some(Self::Both),
            _ => None,
        }
    }
}

/// Internal pull resistor on the button input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PullMode {
    Up,
    Down,
    Floating,
}

impl PullMode {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "up" | "pullup" => Some(Self::Up),
            "down" | "pulldown" => Some(Self::Down),
            "floating" | "none" => Some(Self::Floating),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Pins
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinConfig {
    /// Input line watched for update requests.
    pub button_gpio: i32,
    /// Output line toggled during normal operation.
    pub output_gpio: i32,
    /// Edge direction(s) that raise a request.
    pub polarity: EdgePolarity,
    /// Pull resistor on the button input.
    pub pull: PullMode,
    /// Level forced on the output while quiesced.
    pub idle_level_high: bool,
}

impl Default for PinConfig {
    fn default() -> Self {
        Self {
            button_gpio: pins::BUTTON_GPIO,
            output_gpio: pins::OUTPUT_GPIO,
            polarity: EdgePolarity::Rising,
            pull: PullMode::Up,
            idle_level_high: pins::OUTPUT_IDLE_HIGH,
        }
    }
}

// ---------------------------------------------------------------------------
// Update fetch record
// ---------------------------------------------------------------------------

/// Parameters handed to the fetch-and-flash collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchConfig {
    /// HTTPS endpoint hosting the firmware binary.
    pub url: Option<heapless::String<URL_CAPACITY>>,
    /// Enable HTTP keep-alive.
    pub keep_alive: bool,
    /// Skip the certificate common-name check (debug only).
    pub skip_cn_check: bool,
    /// HTTP client timeout.
    pub timeout_ms: u32,
    /// Response buffer size.
    pub rx_buffer_size: u32,
    /// Request line + headers buffer size.
    pub tx_buffer_size: u32,
    /// Verify the server against the built-in certificate bundle.  When
    /// false an embedded PEM (`OTA_CA_CERT_PEM`) is used instead.
    pub use_cert_bundle: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            url: None,
            keep_alive: true,
            skip_cn_check: false,
            timeout_ms: 30_000,
            rx_buffer_size: 4096,
            tx_buffer_size: 8192,
            use_cert_bundle: true,
        }
    }
}

impl FetchConfig {
    /// Build a record pointing at `url`.
    pub fn with_url(url: &str) -> Result<Self, ConfigError> {
        let mut buf = heapless::String::new();
        buf.push_str(url).map_err(|()| ConfigError::UrlTooLong)?;
        Ok(Self {
            url: Some(buf),
            ..Self::default()
        })
    }

    /// Fail fast on an absent, empty, or non-HTTP locator.
    pub fn validate(&self) -> Result<&str, ConfigError> {
        let url = self
            .url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or(ConfigError::MissingUrl)?;
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(ConfigError::InvalidUrl);
        }
        Ok(url)
    }
}

// ---------------------------------------------------------------------------
// System configuration
// ---------------------------------------------------------------------------

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemConfig {
    pub pins: PinConfig,

    // --- Timing ---
    /// Request monitor period (milliseconds)
    pub monitor_period_ms: u32,
    /// Lifecycle orchestrator poll period (milliseconds)
    pub orchestrator_period_ms: u32,
    /// Output toggle period (milliseconds)
    pub toggle_period_ms: u32,

    // --- Update ---
    pub fetch: FetchConfig,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            pins: PinConfig::default(),
            monitor_period_ms: 100,
            orchestrator_period_ms: 500,
            toggle_period_ms: 1000,
            fetch: FetchConfig::default(),
        }
    }
}

impl SystemConfig {
    /// Defaults overridden by the `OTA_*` variables captured at build time.
    /// Unparseable values fall back to the default silently.
    pub fn from_build_env() -> Self {
        let mut cfg = Self::default();

        if let Some(url) = option_env!("OTA_FIRMWARE_URL") {
            if let Ok(fetch) = FetchConfig::with_url(url) {
                cfg.fetch.url = fetch.url;
            }
        }
        if let Some(pin) = option_env!("OTA_BUTTON_GPIO").and_then(|v| v.parse().ok()) {
            cfg.pins.button_gpio = pin;
        }
        if let Some(pin) = option_env!("OTA_OUTPUT_GPIO").and_then(|v| v.parse().ok()) {
            cfg.pins.output_gpio = pin;
        }
        if let Some(p) = option_env!("OTA_BUTTON_POLARITY").and_then(EdgePolarity::parse) {
            cfg.pins.polarity = p;
        }
        if let Some(p) = option_env!("OTA_BUTTON_PULL").and_then(PullMode::parse) {
            cfg.pins.pull = p;
        }
        if let Some(ms) = option_env!("OTA_TOGGLE_PERIOD_MS").and_then(|v| v.parse().ok()) {
            cfg.toggle_period_ms = ms;
        }
        if option_env!("OTA_CA_CERT_PEM").is_some() {
            cfg.fetch.use_cert_bundle = false;
        }
        cfg
    }

    /// Parse a JSON overlay (as stored in NVS).
    pub fn from_json(bytes: &[u8]) -> Result<Self, ConfigError> {
        serde_json::from_slice(bytes).map_err(|_| ConfigError::Corrupted)
    }

    /// Structural checks run once at boot.  The fetch URL is deliberately
    /// not checked here: a missing URL is a lifecycle failure, not a boot
    /// failure.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for pin in [self.pins.button_gpio, self.pins.output_gpio] {
            if !(0..=pins::MAX_GPIO).contains(&pin) {
                return Err(ConfigError::InvalidPin(pin));
            }
        }
        if self.pins.button_gpio == self.pins.output_gpio {
            return Err(ConfigError::PinConflict);
        }
        if self.monitor_period_ms == 0 {
            return Err(ConfigError::InvalidPeriod("monitor"));
        }
        if self.orchestrator_period_ms == 0 {
            return Err(ConfigError::InvalidPeriod("orchestrator"));
        }
        if self.toggle_period_ms == 0 {
            return Err(ConfigError::InvalidPeriod("toggle"));
        }
        Ok(())
    }
}
