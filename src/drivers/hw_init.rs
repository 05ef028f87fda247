//! GPIO adapter for the button and output lines.
//!
//! Configures pin direction, pull mode and interrupt type with raw
//! ESP-IDF sys calls, and registers the button ISR that feeds
//! [`EDGE_QUEUE`](crate::events::EDGE_QUEUE).  Host builds get a
//! simulation with the same surface so the bootstrap path stays
//! compilable and testable.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;
use embedded_hal::digital::PinState;
use log::info;

use crate::app::ports::{GpioPort, LineLevel};
use crate::config::PinConfig;
#[cfg(target_os = "espidf")]
use crate::config::{EdgePolarity, PullMode};
use crate::error::HwError;

/// The two lifecycle GPIO lines.  Cheap to clone; every clone drives the
/// same physical pins.
#[derive(Debug, Clone)]
pub struct EspGpio {
    pins: PinConfig,
    #[cfg(not(target_os = "espidf"))]
    sim: SimLines,
}

#[cfg(not(target_os = "espidf"))]
#[derive(Debug, Clone, Copy)]
struct SimLines {
    output: PinState,
    button: PinState,
    irq_enabled: bool,
    handler_attached: bool,
}

impl EspGpio {
    pub fn new(pins: PinConfig) -> Self {
        Self {
            pins,
            #[cfg(not(target_os = "espidf"))]
            sim: SimLines {
                output: PinState::from(pins.idle_level_high),
                button: PinState::Low,
                irq_enabled: false,
                handler_attached: false,
            },
        }
    }

    /// Configure both lines and arm the button interrupt.  Called once
    /// from `main` before the tasks start.
    pub fn init(&mut self) -> Result<(), HwError> {
        self.configure()?;
        self.attach_edge_interrupt()?;
        info!(
            "hw_init: button GPIO {} ({:?}, pull {:?}), output GPIO {}",
            self.pins.button_gpio, self.pins.polarity, self.pins.pull, self.pins.output_gpio
        );
        Ok(())
    }
}

// ── Platform ──────────────────────────────────────────────────

/// Map an `esp_err_t` to `Ok` on `ESP_OK` (0), else to the given error.
#[cfg_attr(not(target_os = "espidf"), allow(dead_code))]
fn esp_check(ret: i32, err: fn(i32) -> HwError) -> Result<(), HwError> {
    if ret == 0 { Ok(()) } else { Err(err(ret)) }
}

#[cfg(target_os = "espidf")]
fn intr_type(polarity: EdgePolarity) -> gpio_int_type_t {
    match polarity {
        EdgePolarity::Rising => gpio_int_type_t_GPIO_INTR_POSEDGE,
        EdgePolarity::Falling => gpio_int_type_t_GPIO_INTR_NEGEDGE,
        EdgePolarity::Both => gpio_int_type_t_GPIO_INTR_ANYEDGE,
    }
}

#[cfg(target_os = "espidf")]
fn pulls(pull: PullMode) -> (gpio_pullup_t, gpio_pulldown_t) {
    match pull {
        PullMode::Up => (
            gpio_pullup_t_GPIO_PULLUP_ENABLE,
            gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        ),
        PullMode::Down => (
            gpio_pullup_t_GPIO_PULLUP_DISABLE,
            gpio_pulldown_t_GPIO_PULLDOWN_ENABLE,
        ),
        PullMode::Floating => (
            gpio_pullup_t_GPIO_PULLUP_DISABLE,
            gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        ),
    }
}

/// Button edge ISR.  `arg` carries the pin number.  Queue push only.
#[cfg(target_os = "espidf")]
unsafe extern "C" fn button_gpio_isr(arg: *mut core::ffi::c_void) {
    crate::events::push_edge(arg as usize as i32);
}

#[cfg(target_os = "espidf")]
impl GpioPort for EspGpio {
    fn set_output(&mut self, level: PinState) {
        // SAFETY: output pin configured in `configure`; level register write.
        unsafe { gpio_set_level(self.pins.output_gpio, u32::from(level == PinState::High)) };
    }

    fn configure(&mut self) -> Result<(), HwError> {
        let (pull_up_en, pull_down_en) = pulls(self.pins.pull);
        let btn_cfg = gpio_config_t {
            pin_bit_mask: 1u64 << self.pins.button_gpio,
            mode: gpio_mode_t_GPIO_MODE_INPUT,
            pull_up_en,
            pull_down_en,
            intr_type: intr_type(self.pins.polarity),
            ..Default::default()
        };
        // SAFETY: gpio_config copies the struct; pin range checked by
        // `SystemConfig::validate`.
        esp_check(unsafe { gpio_config(&btn_cfg) }, HwError::GpioConfigFailed)?;

        let out_cfg = gpio_config_t {
            pin_bit_mask: 1u64 << self.pins.output_gpio,
            mode: gpio_mode_t_GPIO_MODE_OUTPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
            ..Default::default()
        };
        // SAFETY: as above.
        esp_check(unsafe { gpio_config(&out_cfg) }, HwError::GpioConfigFailed)
    }

    fn attach_edge_interrupt(&mut self) -> Result<(), HwError> {
        // SAFETY: the ISR service install is idempotent (INVALID_STATE means
        // already installed).  The handler is a static fn that only pushes
        // to the lock-free edge queue.
        unsafe {
            let ret = gpio_install_isr_service(0);
            if ret != ESP_ERR_INVALID_STATE as i32 {
                esp_check(ret, HwError::IsrInstallFailed)?;
            }
            let pin = self.pins.button_gpio;
            esp_check(
                gpio_isr_handler_add(
                    pin,
                    Some(button_gpio_isr),
                    pin as usize as *mut core::ffi::c_void,
                ),
                HwError::IsrHandlerFailed,
            )?;
            esp_check(
                gpio_set_intr_type(pin, intr_type(self.pins.polarity)),
                HwError::GpioConfigFailed,
            )?;
            esp_check(gpio_intr_enable(pin), HwError::IsrHandlerFailed)
        }
    }

    fn detach_edge_interrupt(&mut self) {
        // SAFETY: removing an absent handler is a no-op in ESP-IDF.
        unsafe { gpio_isr_handler_remove(self.pins.button_gpio) };
    }

    fn disable_edge_interrupt(&mut self) {
        // SAFETY: interrupt-type register write on a configured input.
        unsafe {
            gpio_set_intr_type(self.pins.button_gpio, gpio_int_type_t_GPIO_INTR_DISABLE);
        }
    }
}

#[cfg(target_os = "espidf")]
impl LineLevel for EspGpio {
    fn button_level(&mut self) -> PinState {
        // SAFETY: read-only register access on a configured input.
        PinState::from(unsafe { gpio_get_level(self.pins.button_gpio) } != 0)
    }
}

// ── Simulation ────────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
impl EspGpio {
    /// Simulation: set the level the button line reads back.
    pub fn sim_set_button(&mut self, level: PinState) {
        self.sim.button = level;
    }

    pub fn sim_output(&self) -> PinState {
        self.sim.output
    }

    pub fn sim_armed(&self) -> bool {
        self.sim.irq_enabled && self.sim.handler_attached
    }
}

#[cfg(not(target_os = "espidf"))]
impl GpioPort for EspGpio {
    fn set_output(&mut self, level: PinState) {
        self.sim.output = level;
    }

    fn configure(&mut self) -> Result<(), HwError> {
        self.sim.irq_enabled = true;
        Ok(())
    }

    fn attach_edge_interrupt(&mut self) -> Result<(), HwError> {
        self.sim.handler_attached = true;
        Ok(())
    }

    fn detach_edge_interrupt(&mut self) {
        self.sim.handler_attached = false;
    }

    fn disable_edge_interrupt(&mut self) {
        self.sim.irq_enabled = false;
    }
}

#[cfg(not(target_os = "espidf"))]
impl LineLevel for EspGpio {
    fn button_level(&mut self) -> PinState {
        self.sim.button
    }
}
