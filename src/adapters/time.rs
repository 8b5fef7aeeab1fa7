//! Monotonic time for the supervisor.
//!
//! - **`target_os = "espidf"`** wraps `esp_timer_get_time()` (microsecond,
//!   monotonic since boot).
//! - **`not(target_os = "espidf")`** uses the `embassy-time` std driver.
//!
//! The poll timer works on wrapping `u32` milliseconds, so that is what
//! [`uptime_ms`] returns.

/// Milliseconds since boot, wrapping at `u32::MAX` (~49 days).
#[cfg(target_os = "espidf")]
pub fn uptime_ms() -> u32 {
    // SAFETY: esp_timer_get_time has no preconditions once the IDF is up.
    ((unsafe { esp_idf_svc::sys::esp_timer_get_time() }) / 1000) as u32
}

/// Milliseconds since boot, wrapping at `u32::MAX` (~49 days).
#[cfg(not(target_os = "espidf"))]
pub fn uptime_ms() -> u32 {
    embassy_time::Instant::now().as_millis() as u32
}
