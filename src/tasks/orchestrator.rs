//! Lifecycle-orchestrator task.

use core::time::Duration;

use log::error;

use crate::adapters::ota;
use crate::app::ports::{EventSink, LifecyclePorts};
use crate::fsm::{LifecycleOrchestrator, TickOutcome};

/// Task body.  Polls once per `period`; restarts the device after a
/// successful fetch and escalates fatal errors to the panic handler.
pub fn run(
    mut orchestrator: LifecycleOrchestrator<'static>,
    mut hw: impl LifecyclePorts,
    mut sink: impl EventSink,
    period: Duration,
) -> ! {
    orchestrator.start(&mut sink);
    loop {
        match orchestrator.tick(&mut hw, &mut sink) {
            Ok(TickOutcome::RebootPending) => ota::restart(),
            Ok(_) => {}
            Err(e) => {
                error!(
                    "Lifecycle fault in {}: {} (passes={}, failures={})",
                    orchestrator.state().name(),
                    e,
                    orchestrator.passes(),
                    orchestrator.failures()
                );
                panic!("unrecoverable lifecycle fault: {e}");
            }
        }
        std::thread::sleep(period);
    }
}
