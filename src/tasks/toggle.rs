//! Peripheral-toggle task: flips the output line while `Running`.

use core::time::Duration;

use embedded_hal::digital::PinState;
use log::info;

use crate::app::ports::GpioPort;
use crate::lifecycle::StateReader;

/// Output toggler.  Holds the level last driven.
pub struct Toggler {
    level: PinState,
}

impl Toggler {
    pub fn new(initial: PinState) -> Self {
        Self { level: initial }
    }

    /// Flip the output if the lifecycle is `Running`.  Returns the level
    /// driven, or `None` when gated off.  A stale read only delays the
    /// gate by one period.
    pub fn step(&mut self, reader: &StateReader<'_>, gpio: &mut impl GpioPort) -> Option<PinState> {
        if !reader.is_running() {
            return None;
        }
        self.level = !self.level;
        gpio.set_output(self.level);
        Some(self.level)
    }
}

/// Task body.  Never returns.
pub fn run(reader: StateReader<'static>, mut gpio: impl GpioPort, idle: PinState, period: Duration) -> ! {
    let mut toggler = Toggler::new(idle);
    loop {
        if let Some(level) = toggler.step(&reader, &mut gpio) {
            info!("Toggle: output {:?}", level);
        }
        std::thread::sleep(period);
    }
}
