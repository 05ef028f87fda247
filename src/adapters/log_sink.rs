//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing lifecycle events to the ESP-IDF
//! logger (UART / USB-CDC in production).

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started(state) => {
                info!("START | initial_state={}", state.name());
            }
            AppEvent::RequestRaised { gpio } => {
                info!("REQUEST | update requested via GPIO {}", gpio);
            }
            AppEvent::StateChanged { from, to } => {
                info!("STATE | {} -> {}", from.name(), to.name());
            }
            AppEvent::PeripheralsQuiesced => {
                info!("PERIPH | quiesced");
            }
            AppEvent::UpdateFailed { category } => {
                warn!("UPDATE | failed ({})", category);
            }
            AppEvent::PeripheralsRestored => {
                info!("PERIPH | restored");
            }
            AppEvent::RebootPending => {
                info!("UPDATE | image staged, restarting");
            }
            AppEvent::BootValidated { mark, confirmed } => {
                info!("BOOT | mark={} confirmed={}", mark, confirmed);
            }
        }
    }
}
