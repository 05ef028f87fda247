//! Request-monitor task.

use log::debug;

use crate::app::monitor::{MonitorOutcome, RequestMonitor};
use crate::app::ports::{EventSink, LineLevel};

/// Task body.  Each cycle blocks for at most one monitor period.
pub fn run(
    mut monitor: RequestMonitor<'static>,
    mut line: impl LineLevel,
    mut sink: impl EventSink,
) -> ! {
    loop {
        if let MonitorOutcome::NotQualifying(direction) = monitor.cycle(&mut line, &mut sink) {
            debug!("Monitor task: {:?} edge did not qualify", direction);
        }
    }
}
