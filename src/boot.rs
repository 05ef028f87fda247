//! Boot-time image validation.
//!
//! Runs once in `main`, before any task is spawned.  A freshly flashed
//! image boots in `pending-verify`; confirming it here cancels the
//! bootloader's rollback on the next reset.

use core::fmt::{self, Write as _};

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::{EventSink, ImageMark, ValidationMarkPort};
use crate::error::MarkError;

/// Confirm the running image if it is pending verification.
///
/// Returns the mark as read before any change.  `Confirmed` and
/// `Undefined` are left alone, so repeated calls are no-ops.
pub fn validate_running_image(
    port: &mut impl ValidationMarkPort,
    sink: &mut impl EventSink,
) -> Result<ImageMark, MarkError> {
    if let Some(digest) = port.bootloader_sha256() {
        info!("Boot: bootloader sha256 {}", Sha256Hex(&digest));
    }
    if let Some(digest) = port.running_image_sha256() {
        info!("Boot: running image sha256 {}", Sha256Hex(&digest));
    }

    let mark = port.read_mark()?;
    let confirmed = match mark {
        ImageMark::PendingVerify => {
            port.confirm_and_cancel_rollback()
                .inspect_err(|e| warn!("Boot: {}", e))?;
            info!("Boot: image confirmed, rollback cancelled");
            true
        }
        ImageMark::Confirmed | ImageMark::Undefined => {
            info!("Boot: image mark {}, nothing to do", mark);
            false
        }
    };
    sink.emit(&AppEvent::BootValidated { mark, confirmed });
    Ok(mark)
}

/// Lowercase hex rendering of a SHA-256 digest.
struct Sha256Hex<'a>(&'a [u8; 32]);

impl fmt::Display for Sha256Hex<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const DIGITS: &[u8; 16] = b"0123456789abcdef";
        for b in self.0 {
            f.write_char(char::from(DIGITS[usize::from(b >> 4)]))?;
            f.write_char(char::from(DIGITS[usize::from(b & 0x0f)]))?;
        }
        Ok(())
    }
}
