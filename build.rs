fn main() {
    // Build-time configuration surface (see `config::SystemConfig::from_build_env`).
    for var in [
        "OTA_FIRMWARE_URL",
        "OTA_BUTTON_GPIO",
        "OTA_OUTPUT_GPIO",
        "OTA_BUTTON_POLARITY",
        "OTA_BUTTON_PULL",
        "OTA_TOGGLE_PERIOD_MS",
        "OTA_CA_CERT_PEM",
        "OTA_WIFI_SSID",
        "OTA_WIFI_PASS",
    ] {
        println!("cargo:rerun-if-env-changed={var}");
    }

    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
