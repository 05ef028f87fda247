//! Platform OTA adapters.
//!
//! - [`EspFetcher`]: [`FirmwareFetcher`] over `esp_https_ota` (download,
//!   write to the inactive slot, select it for next boot).
//! - [`EspImageMark`]: [`ValidationMarkPort`] over the running
//!   partition's OTA image state.
//! - [`restart`]: soft reset into the staged image.
//!
//! Host builds get deterministic simulations of both ports.

#[cfg(target_os = "espidf")]
use log::debug;
use log::{info, warn};

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

use crate::app::ports::{FirmwareFetcher, ImageMark, ValidationMarkPort};
use crate::config::FetchConfig;
use crate::error::{FetchError, MarkError};

// ── Error classification ──────────────────────────────────────
//
// ESP-IDF error code ranges reported by `esp_https_ota`.

const ERR_INVALID_ARG: i32 = 0x102;
const ERR_INVALID_SIZE: i32 = 0x104;
const ERR_TIMEOUT: i32 = 0x107;
const ERR_OTA_BASE: i32 = 0x1500;
const ERR_OTA_VALIDATE_FAILED: i32 = ERR_OTA_BASE + 3;
const ERR_FLASH_BASE: i32 = 0x6000;
const ERR_HTTP_BASE: i32 = 0x7000;
const ERR_HTTP_CONNECT: i32 = ERR_HTTP_BASE + 2;
const ERR_HTTP_EAGAIN: i32 = ERR_HTTP_BASE + 7;
const ERR_TLS_BASE: i32 = 0x8000;

/// Map an `esp_https_ota` return code to a [`FetchError`].
pub fn classify_ota_error(code: i32) -> FetchError {
    match code {
        ERR_INVALID_ARG => FetchError::InvalidConfig,
        ERR_TIMEOUT | ERR_HTTP_EAGAIN => FetchError::Timeout,
        ERR_INVALID_SIZE | ERR_OTA_VALIDATE_FAILED => FetchError::ImageInvalid,
        c if (ERR_OTA_BASE..ERR_OTA_BASE + 0x100).contains(&c) => FetchError::FlashWrite,
        c if (ERR_FLASH_BASE..ERR_FLASH_BASE + 0x100).contains(&c) => FetchError::FlashWrite,
        ERR_HTTP_CONNECT => FetchError::Connection,
        c if (ERR_HTTP_BASE..ERR_HTTP_BASE + 0x100).contains(&c) => FetchError::Connection,
        c if (ERR_TLS_BASE..ERR_TLS_BASE + 0x100).contains(&c) => FetchError::Tls,
        other => FetchError::Platform(other),
    }
}

// ── HTTP client events ────────────────────────────────────────

/// `esp_http_client_event_id_t` names, in enum order.
const HTTP_EVENT_NAMES: [&str; 8] = [
    "error",
    "connected",
    "headers-sent",
    "header",
    "data",
    "finish",
    "disconnected",
    "redirect",
];

pub fn http_event_name(id: u32) -> Option<&'static str> {
    HTTP_EVENT_NAMES.get(id as usize).copied()
}

/// Debug trace of the download, one line per client event.
#[cfg(target_os = "espidf")]
unsafe extern "C" fn http_event_handler(evt: *mut esp_http_client_event_t) -> esp_err_t {
    // SAFETY: the client passes a valid event for the duration of the call.
    let Some(evt) = (unsafe { evt.as_ref() }) else {
        return ESP_OK as esp_err_t;
    };
    let id = evt.event_id as u32;
    match http_event_name(id) {
        Some("header") if !evt.header_key.is_null() && !evt.header_value.is_null() => {
            // SAFETY: non-null header strings are NUL-terminated by the client.
            let (key, value) = unsafe {
                (
                    core::ffi::CStr::from_ptr(evt.header_key),
                    core::ffi::CStr::from_ptr(evt.header_value),
                )
            };
            debug!(
                "OTA http: header {}={}",
                key.to_string_lossy(),
                value.to_string_lossy()
            );
        }
        Some("data") => debug!("OTA http: data len={}", evt.data_len),
        Some(name) => debug!("OTA http: {}", name),
        None => debug!("OTA http: event {}", id),
    }
    ESP_OK as esp_err_t
}

// ───────────────────────────────────────────────────────────────
// Fetcher
// ───────────────────────────────────────────────────────────────

/// Fetch-and-flash over HTTPS.
#[derive(Default)]
pub struct EspFetcher {
    armed: Option<Armed>,
}

/// A validated fetch record with C-string copies of its pointers.
struct Armed {
    config: FetchConfig,
    #[cfg(target_os = "espidf")]
    url: std::ffi::CString,
}

impl EspFetcher {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FirmwareFetcher for EspFetcher {
    fn init(&mut self, config: &FetchConfig) -> Result<(), FetchError> {
        self.armed = None;
        let url = config.validate().map_err(|_| FetchError::InvalidConfig)?;
        self.armed = Some(Armed {
            config: config.clone(),
            #[cfg(target_os = "espidf")]
            url: std::ffi::CString::new(url).map_err(|_| FetchError::InvalidConfig)?,
        });
        info!(
            "OTA: fetcher ready (url={}, keep_alive={}, skip_cn={})",
            url, config.keep_alive, config.skip_cn_check
        );
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn fetch_and_flash(&mut self) -> Result<(), FetchError> {
        let armed = self.armed.as_ref().ok_or(FetchError::NotInitialized)?;
        let cfg = &armed.config;

        let pem = option_env!("OTA_CA_CERT_PEM")
            .filter(|_| !cfg.use_cert_bundle)
            .map(std::ffi::CString::new)
            .transpose()
            .map_err(|_| FetchError::InvalidConfig)?;

        let http = esp_http_client_config_t {
            url: armed.url.as_ptr(),
            keep_alive_enable: cfg.keep_alive,
            skip_cert_common_name_check: cfg.skip_cn_check,
            timeout_ms: cfg.timeout_ms as i32,
            buffer_size: cfg.rx_buffer_size as i32,
            buffer_size_tx: cfg.tx_buffer_size as i32,
            crt_bundle_attach: if cfg.use_cert_bundle {
                Some(esp_crt_bundle_attach)
            } else {
                None
            },
            cert_pem: pem.as_ref().map_or(core::ptr::null(), |p| p.as_ptr()),
            event_handler: Some(http_event_handler),
            ..Default::default()
        };
        let ota = esp_https_ota_config_t {
            http_config: &http,
            ..Default::default()
        };

        info!("OTA: fetching {}", armed.url.to_string_lossy());
        // SAFETY: `http`, `ota`, the URL and the PEM all outlive this
        // blocking call.
        let ret = unsafe { esp_https_ota(&ota) };
        if ret == ESP_OK as i32 {
            info!("OTA: image written and selected for next boot");
            Ok(())
        } else {
            let err = classify_ota_error(ret);
            warn!("OTA: esp_https_ota failed (rc=0x{:x}): {}", ret, err);
            Err(err)
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn fetch_and_flash(&mut self) -> Result<(), FetchError> {
        let armed = self.armed.as_ref().ok_or(FetchError::NotInitialized)?;
        warn!(
            "OTA(sim): no network, fetch of {:?} fails",
            armed.config.url.as_deref()
        );
        Err(FetchError::Connection)
    }
}

// ───────────────────────────────────────────────────────────────
// Validation mark
// ───────────────────────────────────────────────────────────────

pub struct EspImageMark {
    #[cfg(not(target_os = "espidf"))]
    sim: ImageMark,
}

impl EspImageMark {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            sim: ImageMark::Undefined,
        }
    }

    /// Simulation: start from `mark`.
    #[cfg(not(target_os = "espidf"))]
    pub fn with_sim_mark(mark: ImageMark) -> Self {
        Self { sim: mark }
    }
}

impl Default for EspImageMark {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(target_os = "espidf")]
fn running_partition() -> Result<*const esp_partition_t, MarkError> {
    // SAFETY: returns a pointer into the static partition table or null.
    let part = unsafe { esp_ota_get_running_partition() };
    if part.is_null() {
        Err(MarkError::NoRunningPartition)
    } else {
        Ok(part)
    }
}

#[cfg(target_os = "espidf")]
impl ValidationMarkPort for EspImageMark {
    fn read_mark(&mut self) -> Result<ImageMark, MarkError> {
        let part = running_partition()?;
        let mut state: esp_ota_img_states_t = 0;
        // SAFETY: `part` is a valid partition pointer, `state` a local.
        let ret = unsafe { esp_ota_get_state_partition(part, &mut state) };
        if ret == ESP_ERR_NOT_SUPPORTED as i32 || ret == ESP_ERR_NOT_FOUND as i32 {
            // Factory image or no otadata: no mark.
            return Ok(ImageMark::Undefined);
        }
        if ret != ESP_OK as i32 {
            return Err(MarkError::ReadFailed(ret));
        }
        #[allow(non_upper_case_globals)]
        let mark = match state {
            esp_ota_img_states_t_ESP_OTA_IMG_PENDING_VERIFY => ImageMark::PendingVerify,
            esp_ota_img_states_t_ESP_OTA_IMG_VALID => ImageMark::Confirmed,
            _ => ImageMark::Undefined,
        };
        Ok(mark)
    }

    fn confirm_and_cancel_rollback(&mut self) -> Result<(), MarkError> {
        esp_ota::mark_app_valid().map_err(|e| {
            warn!("OTA: mark_app_valid failed: {:?}", e);
            MarkError::ConfirmFailed(ESP_FAIL)
        })
    }

    fn bootloader_sha256(&mut self) -> Option<[u8; 32]> {
        // The bootloader is not in the partition table; describe its flash
        // region by hand.
        let region = esp_partition_t {
            address: ESP_BOOTLOADER_OFFSET,
            size: ESP_PARTITION_TABLE_OFFSET,
            type_: esp_partition_type_t_ESP_PARTITION_TYPE_APP,
            ..Default::default()
        };
        let mut digest = [0u8; 32];
        // SAFETY: `region` and `digest` are locals that outlive the call.
        let ret = unsafe { esp_partition_get_sha256(&region, digest.as_mut_ptr()) };
        (ret == ESP_OK as i32).then_some(digest)
    }

    fn running_image_sha256(&mut self) -> Option<[u8; 32]> {
        let part = running_partition().ok()?;
        let mut digest = [0u8; 32];
        // SAFETY: digest is 32 bytes as the API requires.
        let ret = unsafe { esp_partition_get_sha256(part, digest.as_mut_ptr()) };
        (ret == ESP_OK as i32).then_some(digest)
    }
}

#[cfg(not(target_os = "espidf"))]
impl ValidationMarkPort for EspImageMark {
    fn read_mark(&mut self) -> Result<ImageMark, MarkError> {
        Ok(self.sim)
    }

    fn confirm_and_cancel_rollback(&mut self) -> Result<(), MarkError> {
        info!("OTA(sim): image marked valid");
        self.sim = ImageMark::Confirmed;
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// Restart
// ───────────────────────────────────────────────────────────────

/// Soft-reset into the newly selected image.
#[cfg(target_os = "espidf")]
pub fn restart() -> ! {
    info!("OTA: rebooting into new firmware");
    esp_ota::restart();
}

#[cfg(not(target_os = "espidf"))]
pub fn restart() -> ! {
    panic!("OTA restart (simulation, no real hardware reset)");
}
