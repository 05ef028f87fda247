//! Peripheral quiescing around a firmware fetch.
//!
//! [`quiesce`] runs once per lifecycle pass, strictly before the fetch:
//! output to idle, button handler removed, button interrupt disabled.
//! [`restore`] is its inverse and runs on the `Failed → Running` edge.

use embedded_hal::digital::PinState;
use log::info;

use crate::app::ports::GpioPort;
use crate::error::HwError;

/// Force the output idle and silence the button line.  Cannot fail.
pub fn quiesce<G: GpioPort + ?Sized>(gpio: &mut G, idle: PinState) {
    gpio.set_output(idle);
    gpio.detach_edge_interrupt();
    gpio.disable_edge_interrupt();
    info!("Peripherals quiesced (output {:?})", idle);
}

/// Re-apply the normal configuration and re-arm the edge handler.
/// An error here leaves the request path dead and is fatal to the caller.
pub fn restore<G: GpioPort + ?Sized>(gpio: &mut G) -> Result<(), HwError> {
    gpio.configure()?;
    gpio.attach_edge_interrupt()?;
    info!("Peripherals restored");
    Ok(())
}
