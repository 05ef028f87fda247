//! WiFi station-mode adapter.
//!
//! Implements [`ConnectivityPort`]: one blocking connect during boot,
//! before any lifecycle task starts.  Nothing consumes network state
//! afterwards; the fetch collaborator simply assumes it.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `BlockingWifi<EspWifi>` in STA mode,
//!   WPA2-PSK threshold, PMF capable, power save off after association.
//! - **all other targets**: simulation for host-side tests.

#[cfg(not(target_os = "espidf"))]
use log::info;

use crate::app::ports::ConnectivityError;
#[cfg(not(target_os = "espidf"))]
use crate::app::ports::ConnectivityPort;

// ───────────────────────────────────────────────────────────────
// Credentials
// ───────────────────────────────────────────────────────────────

/// Credentials captured at build time (`OTA_WIFI_SSID`, `OTA_WIFI_PASS`).
pub fn build_credentials() -> Result<(&'static str, &'static str), ConnectivityError> {
    let ssid = option_env!("OTA_WIFI_SSID").ok_or(ConnectivityError::NoCredentials)?;
    let pass = option_env!("OTA_WIFI_PASS").unwrap_or("");
    validate_ssid(ssid)?;
    validate_password(pass)?;
    Ok((ssid, pass))
}

fn validate_ssid(ssid: &str) -> Result<(), ConnectivityError> {
    if ssid.is_empty() || ssid.len() > 32 || !ssid.bytes().all(|b| (0x20..=0x7E).contains(&b)) {
        return Err(ConnectivityError::InvalidSsid);
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), ConnectivityError> {
    if !password.is_empty() && !(8..=64).contains(&password.len()) {
        return Err(ConnectivityError::InvalidPassword);
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// ESP-IDF
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
mod platform {
    use esp_idf_hal::modem::Modem;
    use esp_idf_svc::eventloop::EspSystemEventLoop;
    use esp_idf_svc::nvs::EspDefaultNvsPartition;
    use esp_idf_svc::wifi::{
        AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi, PmfConfiguration,
    };
    use log::{info, warn};

    use super::{validate_password, validate_ssid};
    use crate::app::ports::{ConnectivityError, ConnectivityPort};

    pub struct WifiAdapter {
        wifi: BlockingWifi<EspWifi<'static>>,
        ssid: heapless::String<32>,
    }

    impl WifiAdapter {
        pub fn new(
            modem: Modem,
            sysloop: EspSystemEventLoop,
            nvs: EspDefaultNvsPartition,
            ssid: &str,
            password: &str,
        ) -> Result<Self, ConnectivityError> {
            validate_ssid(ssid)?;
            validate_password(password)?;

            let esp_wifi = EspWifi::new(modem, sysloop.clone(), Some(nvs))
                .map_err(|e| ConnectivityError::DriverInit(e.code()))?;
            let mut wifi = BlockingWifi::wrap(esp_wifi, sysloop)
                .map_err(|e| ConnectivityError::DriverInit(e.code()))?;

            let cfg = Configuration::Client(ClientConfiguration {
                ssid: ssid.try_into().map_err(|_| ConnectivityError::InvalidSsid)?,
                password: password
                    .try_into()
                    .map_err(|_| ConnectivityError::InvalidPassword)?,
                auth_method: if password.is_empty() {
                    AuthMethod::None
                } else {
                    AuthMethod::WPA2Personal
                },
                pmf_cfg: PmfConfiguration::Capable { required: false },
                ..Default::default()
            });
            wifi.set_configuration(&cfg)
                .map_err(|e| ConnectivityError::DriverInit(e.code()))?;

            Ok(Self {
                wifi,
                ssid: ssid.try_into().map_err(|_| ConnectivityError::InvalidSsid)?,
            })
        }
    }

    impl ConnectivityPort for WifiAdapter {
        fn connect(&mut self) -> Result<(), ConnectivityError> {
            info!("WiFi: connecting to '{}'", self.ssid);
            self.wifi.start().map_err(|_| ConnectivityError::ConnectionFailed)?;
            self.wifi.connect().map_err(|_| ConnectivityError::ConnectionFailed)?;
            self.wifi
                .wait_netif_up()
                .map_err(|_| ConnectivityError::ConnectionFailed)?;

            // SAFETY: WiFi driver started above.
            let ret = unsafe {
                esp_idf_svc::sys::esp_wifi_set_ps(esp_idf_svc::sys::wifi_ps_type_t_WIFI_PS_NONE)
            };
            if ret != esp_idf_svc::sys::ESP_OK as i32 {
                warn!("WiFi: failed to disable power save (rc={})", ret);
            }
            info!("WiFi: connected, power save off");
            Ok(())
        }

        fn is_connected(&self) -> bool {
            self.wifi.is_connected().unwrap_or(false)
        }
    }
}

#[cfg(target_os = "espidf")]
pub use platform::WifiAdapter;

// ───────────────────────────────────────────────────────────────
// Simulation
// ───────────────────────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
pub struct WifiAdapter {
    ssid: heapless::String<32>,
    connected: bool,
}

#[cfg(not(target_os = "espidf"))]
impl WifiAdapter {
    pub fn new(ssid: &str, password: &str) -> Result<Self, ConnectivityError> {
        validate_ssid(ssid)?;
        validate_password(password)?;
        Ok(Self {
            ssid: ssid.try_into().map_err(|_| ConnectivityError::InvalidSsid)?,
            connected: false,
        })
    }
}

#[cfg(not(target_os = "espidf"))]
impl ConnectivityPort for WifiAdapter {
    fn connect(&mut self) -> Result<(), ConnectivityError> {
        self.connected = true;
        info!("WiFi(sim): connected to '{}'", self.ssid);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}
