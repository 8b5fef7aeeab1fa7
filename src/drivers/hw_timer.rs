//! Hardware tick source using ESP-IDF's esp_timer API.
//!
//! A periodic esp_timer samples the poll timer every millisecond and lets
//! [`PollTimer::service`] decide whether a `TimerTick` is due.  The
//! deadline bookkeeping stays in `PollTimer`, so the hardware timer never
//! needs reprogramming when the dispatcher rearms.
//!
//! Timer callbacks execute in the ESP timer task context (not ISR);
//! `service()` only touches atomics and the critical-section queue.
//!
//! On simulation targets the async [`run_tick_source`](crate::timer::run_tick_source)
//! task does this job instead.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

#[cfg(target_os = "espidf")]
use crate::events::SYSTEM_EVENTS;
#[cfg(target_os = "espidf")]
use crate::timer::POLL_TIMER;

/// Sampling period of the hardware timer.
#[cfg(target_os = "espidf")]
const SAMPLE_PERIOD_US: u64 = 1_000;

#[cfg(target_os = "espidf")]
static mut TICK_TIMER: esp_timer_handle_t = core::ptr::null_mut();

#[cfg(target_os = "espidf")]
unsafe extern "C" fn tick_cb(_arg: *mut core::ffi::c_void) {
    POLL_TIMER.service(crate::adapters::time::uptime_ms(), &SYSTEM_EVENTS);
}

/// Start the hardware tick source.  `POLL_TIMER` must already be armed.
#[cfg(target_os = "espidf")]
pub fn start_tick_source() {
    // SAFETY: TICK_TIMER is written here once at boot from the main task
    // before the callback can fire.  The callback only reads atomics.
    unsafe {
        let args = esp_timer_create_args_t {
            callback: Some(tick_cb),
            arg: core::ptr::null_mut(),
            dispatch_method: esp_timer_dispatch_t_ESP_TIMER_TASK,
            name: b"poll\0".as_ptr() as *const _,
            skip_unhandled_events: true,
        };
        let ret = esp_timer_create(&args, &raw mut TICK_TIMER);
        if ret != ESP_OK {
            log::error!("hw_timer: create failed (rc={}), no poll ticks", ret);
            return;
        }
        let ret = esp_timer_start_periodic(TICK_TIMER, SAMPLE_PERIOD_US);
        if ret != ESP_OK {
            log::error!("hw_timer: start failed (rc={})", ret);
            return;
        }
    }
    info!("hw_timer: poll tick source started");
}

#[cfg(not(target_os = "espidf"))]
pub fn start_tick_source() {
    log::info!("hw_timer(sim): ticks driven by the async tick-source task");
}

/// Stop the hardware tick source.
#[cfg(target_os = "espidf")]
pub fn stop_tick_source() {
    // SAFETY: TICK_TIMER is a valid handle if start succeeded; the null
    // check covers the failure path.
    unsafe {
        let t = TICK_TIMER;
        if !t.is_null() {
            esp_timer_stop(t);
        }
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn stop_tick_source() {}
