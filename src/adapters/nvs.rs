//! NVS (Non-Volatile Storage) bootstrap and config overlay.
//!
//! The Wi-Fi driver needs an initialised NVS partition, so this runs
//! first in `main`.  The same partition may hold a JSON
//! [`SystemConfig`] overlay (namespace `ota`, key `cfg`) that replaces
//! the build-time defaults.

use log::info;
#[cfg(target_os = "espidf")]
use log::warn;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

use crate::config::SystemConfig;
use crate::error::{ConfigError, Error};

#[cfg(target_os = "espidf")]
const CONFIG_NAMESPACE: &[u8] = b"ota\0";
#[cfg(target_os = "espidf")]
const CONFIG_KEY: &[u8] = b"cfg\0";

/// Largest overlay blob accepted.
const MAX_BLOB_SIZE: usize = 1024;

pub struct NvsAdapter {
    #[cfg(not(target_os = "espidf"))]
    overlay: Option<Vec<u8>>,
}

impl NvsAdapter {
    /// Initialise NVS flash.  On a full or version-mismatched partition it
    /// is erased and initialised again.
    pub fn new() -> Result<Self, Error> {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: called once from main before any other NVS user.
            let ret = unsafe { nvs_flash_init() };
            if ret == ESP_ERR_NVS_NO_FREE_PAGES as i32
                || ret == ESP_ERR_NVS_NEW_VERSION_FOUND as i32
            {
                warn!("NVS: erasing and re-initialising flash partition");
                // SAFETY: as above.
                if unsafe { nvs_flash_erase() } != ESP_OK as i32 {
                    return Err(Error::Init("NVS erase failed"));
                }
                // SAFETY: as above.
                if unsafe { nvs_flash_init() } != ESP_OK as i32 {
                    return Err(Error::Init("NVS init after erase failed"));
                }
            } else if ret != ESP_OK as i32 {
                return Err(Error::Init("NVS init failed"));
            }
            info!("NvsAdapter: ESP-IDF NVS initialised");
        }

        #[cfg(not(target_os = "espidf"))]
        info!("NvsAdapter: simulation backend");

        Ok(Self {
            #[cfg(not(target_os = "espidf"))]
            overlay: None,
        })
    }

    /// Read and parse the stored overlay.  `Ok(None)` when none is stored.
    pub fn load_overlay(&self) -> Result<Option<SystemConfig>, ConfigError> {
        let Some(bytes) = self.read_blob()? else {
            return Ok(None);
        };
        let cfg = SystemConfig::from_json(&bytes)?;
        info!("NvsAdapter: config overlay loaded ({} bytes)", bytes.len());
        Ok(Some(cfg))
    }

    /// The configuration the device should run with: the overlay if one
    /// is stored and readable, otherwise `defaults`.
    pub fn effective_config(&self, defaults: SystemConfig) -> SystemConfig {
        match self.load_overlay() {
            Ok(Some(cfg)) => cfg,
            Ok(None) => defaults,
            Err(e) => {
                log::warn!("NvsAdapter: overlay ignored ({})", e);
                defaults
            }
        }
    }

    #[cfg(target_os = "espidf")]
    fn read_blob(&self) -> Result<Option<Vec<u8>>, ConfigError> {
        let mut handle: nvs_handle_t = 0;
        // SAFETY: namespace is a 'static null-terminated string.
        let ret = unsafe {
            nvs_open(
                CONFIG_NAMESPACE.as_ptr().cast(),
                nvs_open_mode_t_NVS_READONLY,
                &mut handle,
            )
        };
        if ret == ESP_ERR_NVS_NOT_FOUND as i32 {
            return Ok(None);
        }
        if ret != ESP_OK as i32 {
            return Err(ConfigError::Corrupted);
        }

        let result = (|| {
            let mut size: usize = 0;
            // SAFETY: size query with a null buffer.
            let ret = unsafe {
                nvs_get_blob(handle, CONFIG_KEY.as_ptr().cast(), core::ptr::null_mut(), &mut size)
            };
            if ret == ESP_ERR_NVS_NOT_FOUND as i32 {
                return Ok(None);
            }
            if ret != ESP_OK as i32 || size == 0 || size > MAX_BLOB_SIZE {
                return Err(ConfigError::Corrupted);
            }
            let mut buf = vec![0u8; size];
            // SAFETY: buf is exactly `size` bytes long.
            let ret = unsafe {
                nvs_get_blob(handle, CONFIG_KEY.as_ptr().cast(), buf.as_mut_ptr().cast(), &mut size)
            };
            if ret != ESP_OK as i32 {
                return Err(ConfigError::Corrupted);
            }
            buf.truncate(size);
            Ok(Some(buf))
        })();

        // SAFETY: handle opened above.
        unsafe { nvs_close(handle) };
        result
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_blob(&self) -> Result<Option<Vec<u8>>, ConfigError> {
        match &self.overlay {
            Some(b) if b.len() > MAX_BLOB_SIZE => Err(ConfigError::Corrupted),
            other => Ok(other.clone()),
        }
    }

    /// Simulation: store an overlay blob.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_store_overlay(&mut self, bytes: &[u8]) {
        self.overlay = Some(bytes.to_vec());
    }
}
