//! Hexagonal adapters: concrete implementations of the port traits.
//!
//! | Adapter        | Port(s)                                   |
//! |----------------|-------------------------------------------|
//! | `ota`          | `FirmwareFetcher`, `ValidationMarkPort`   |
//! | `wifi`         | `ConnectivityPort`                        |
//! | `log_sink`     | `EventSink`                               |
//! | `nvs`          | boot-time NVS init and config overlay     |

pub mod log_sink;
pub mod nvs;
pub mod ota;
pub mod wifi;
