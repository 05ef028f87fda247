//! Default GPIO assignments for the OTA lifecycle board.
//!
//! Single source of truth for the compile-time defaults.  Every value can
//! be overridden at build time (see [`crate::config`]) or by the boot-time
//! NVS overlay; drivers always take pin numbers from `PinConfig`, never
//! from here directly.

// ---------------------------------------------------------------------------
// User button (update request trigger)
// ---------------------------------------------------------------------------

/// Momentary push-button that requests a firmware update.
pub const BUTTON_GPIO: i32 = 0;

// ---------------------------------------------------------------------------
// Output line (periodically toggled, forced idle while updating)
// ---------------------------------------------------------------------------

/// Digital output driven by the toggle task.
pub const OUTPUT_GPIO: i32 = 2;

/// Level the output line is forced to while the device is quiesced.
/// `false` = LOW.
pub const OUTPUT_IDLE_HIGH: bool = false;

// ---------------------------------------------------------------------------
// Limits
// ---------------------------------------------------------------------------

/// Highest GPIO number addressable through a 64-bit `pin_bit_mask`.
pub const MAX_GPIO: i32 = 63;
