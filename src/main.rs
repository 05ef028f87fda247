//! OTA lifecycle firmware: main entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Adapters (outer ring)                    │
//! │                                                              │
//! │  EspGpio          EspFetcher     EspImageMark   NvsAdapter   │
//! │  (GPIO + ISR)     (https OTA)    (valid mark)   (overlay)    │
//! │  WifiAdapter      LogEventSink                               │
//! │                                                              │
//! │  ─────────────── Port Trait Boundary ──────────────────      │
//! │                                                              │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │  RequestMonitor · LifecycleOrchestrator · boot check   │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! │                                                              │
//! │  Tasks on APP_CPU: toggle (1) · monitor (1) · lifecycle (5)  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::{Context, Result};
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use log::{info, warn};

use ota_lifecycle::adapters::log_sink::LogEventSink;
use ota_lifecycle::adapters::nvs::NvsAdapter;
use ota_lifecycle::adapters::ota::EspImageMark;
use ota_lifecycle::adapters::wifi::{build_credentials, WifiAdapter};
use ota_lifecycle::app::ports::ConnectivityPort;
use ota_lifecycle::boot;
use ota_lifecycle::config::SystemConfig;
use ota_lifecycle::drivers::hw_init::EspGpio;
use ota_lifecycle::error::Error;
use ota_lifecycle::tasks;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  OTA lifecycle v{}                ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. NVS + configuration ────────────────────────────────
    let nvs = NvsAdapter::new()?;
    let config = nvs.effective_config(SystemConfig::from_build_env());
    config
        .validate()
        .map_err(Error::from)
        .context("invalid system configuration")?;
    if config.fetch.validate().is_err() {
        warn!("No usable firmware URL configured; update requests will fail");
    }

    // ── 3. Network ────────────────────────────────────────────
    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs_partition = EspDefaultNvsPartition::take()?;

    let (ssid, pass) = build_credentials()?;
    let mut wifi = WifiAdapter::new(peripherals.modem, sysloop, nvs_partition, ssid, pass)?;
    wifi.connect()?;

    // ── 4. Confirm the running image ──────────────────────────
    let mut sink = LogEventSink::new();
    let mark = boot::validate_running_image(&mut EspImageMark::new(), &mut sink)
        .map_err(Error::from)
        .context("boot validation failed")?;
    info!("Boot: running image {}", mark);

    // ── 5. GPIO lines + edge interrupt ────────────────────────
    let mut gpio = EspGpio::new(config.pins);
    gpio.init().map_err(Error::from)?;

    // ── 6. Tasks ──────────────────────────────────────────────
    let handles = tasks::spawn_all(&config, gpio)?;
    info!("All tasks started; main thread parking");

    // The tasks never return; joining keeps `main` (and its stack) alive
    // only as long as the orchestrator, whose faults end in a panic reset.
    handles
        .orchestrator
        .join()
        .map_err(|_| anyhow::anyhow!("lifecycle task terminated"))?;
    Ok(())
}
