//! Time source behind `async_io_mini::Timer`.
//!
//! The timer runs on embassy-time, which resolves `_embassy_time_now` and
//! `_embassy_time_schedule_wake` at link time. Ticks are microseconds
//! (embassy-time's default 1 MHz tick rate).
//!
//! On device the clock is `esp_timer`; on host it is a process-wide
//! [`Instant`](std::time::Instant) epoch. Wake-ups are delivered from a
//! short-lived thread on both targets, never from interrupt context.

use core::task::Waker;
use core::time::Duration;

#[cfg(target_os = "espidf")]
fn now_us() -> u64 {
    // SAFETY: esp_timer is started by the IDF before app_main.
    unsafe { esp_idf_svc::sys::esp_timer_get_time() as u64 }
}

#[cfg(not(target_os = "espidf"))]
fn now_us() -> u64 {
    use std::sync::OnceLock;
    use std::time::Instant;

    static EPOCH: OnceLock<Instant> = OnceLock::new();
    EPOCH.get_or_init(Instant::now).elapsed().as_micros() as u64
}

#[unsafe(no_mangle)]
pub fn _embassy_time_now() -> u64 {
    now_us()
}

#[unsafe(no_mangle)]
pub fn _embassy_time_schedule_wake(at: u64, waker: &Waker) {
    let waker = waker.clone();
    std::thread::spawn(move || {
        let now = now_us();
        if at > now {
            std::thread::sleep(Duration::from_micros(at - now));
        }
        waker.wake();
    });
}
