//! Rearmable poll timer.
//!
//! The timer is shared between two contexts:
//!
//! - the **tick source** (hardware timer callback on the device, an
//!   `embassy-time` task on the host) calls [`PollTimer::service`], which
//!   posts a single [`Event::TimerTick`] once the deadline has passed;
//! - the **dispatcher** calls [`PollTimer::rearm`] when it takes that tick.
//!
//! ```text
//!   deadline ──▶ service() ──▶ TimerTick ──▶ dispatcher
//!      ▲            (pending = true)              │
//!      └──────── rearm(): deadline += period ◀────┘
//!                (pending = false)
//! ```
//!
//! Rearm advances the deadline from the *previous deadline*, never from
//! "now", so slow poll rounds do not shift the schedule.  While a tick is
//! pending no further tick is posted, so the dispatcher can never be asked
//! to poll twice for one period.
//!
//! Time is in milliseconds as a wrapping `u32` (no 64-bit atomics on the
//! Xtensa cores); deadlines are compared with wrapping arithmetic.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::events::{Event, EventQueue};

/// Poll timer state.  All fields are atomics so the tick source may run in
/// interrupt context.
pub struct PollTimer {
    period_ms: AtomicU32,
    deadline_ms: AtomicU32,
    pending: AtomicBool,
    armed: AtomicBool,
}

impl PollTimer {
    pub const fn new(period_ms: u32) -> Self {
        Self {
            period_ms: AtomicU32::new(period_ms),
            deadline_ms: AtomicU32::new(0),
            pending: AtomicBool::new(false),
            armed: AtomicBool::new(false),
        }
    }

    /// Arm the timer: the first tick is due one period after `now_ms`.
    pub fn start(&self, now_ms: u32, period_ms: u32) {
        self.period_ms.store(period_ms, Ordering::Relaxed);
        self.deadline_ms
            .store(now_ms.wrapping_add(period_ms), Ordering::Relaxed);
        self.pending.store(false, Ordering::Relaxed);
        self.armed.store(true, Ordering::Release);
    }

    /// Tick-source entry point.  Posts a `TimerTick` if the deadline has
    /// passed and no tick is outstanding.  Returns `true` if a tick was
    /// posted.  Safe from ISR context.
    pub fn service(&self, now_ms: u32, queue: &EventQueue) -> bool {
        if !self.armed.load(Ordering::Acquire) || !self.expired(now_ms) {
            return false;
        }
        self.claim_and_post(now_ms, queue)
    }

    /// Second half of [`service`](Self::service), once the deadline looked
    /// expired.  A rearm on another core may have moved the deadline since,
    /// so it is checked again after `pending` is claimed.
    fn claim_and_post(&self, now_ms: u32, queue: &EventQueue) -> bool {
        if self.pending.swap(true, Ordering::AcqRel) {
            return false;
        }
        if !self.expired(now_ms) {
            self.pending.store(false, Ordering::Release);
            return false;
        }
        if queue.post(Event::TimerTick).is_err() {
            // Retry on the next service call.
            self.pending.store(false, Ordering::Release);
            return false;
        }
        true
    }

    /// A tick has been posted and not yet rearmed.
    pub fn is_due(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Whether the current deadline has passed at `now_ms`.
    pub fn expired(&self, now_ms: u32) -> bool {
        let deadline = self.deadline_ms.load(Ordering::Acquire);
        now_ms.wrapping_sub(deadline) as i32 >= 0
    }

    /// Advance the deadline by exactly one period and allow the next tick.
    pub fn rearm(&self) {
        let period = self.period_ms.load(Ordering::Relaxed);
        self.deadline_ms.fetch_add(period, Ordering::AcqRel);
        self.pending.store(false, Ordering::Release);
    }

    pub fn deadline_ms(&self) -> u32 {
        self.deadline_ms.load(Ordering::Acquire)
    }

    pub fn period_ms(&self) -> u32 {
        self.period_ms.load(Ordering::Relaxed)
    }

    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::Acquire)
    }
}

/// Timer used by the firmware binary, reachable from the timer callback.
pub static POLL_TIMER: PollTimer = PollTimer::new(crate::config::DEFAULT_POLL_INTERVAL_MS);

/// Host tick source: sleeps until each deadline and services the timer.
///
/// On the device the same job is done by the `esp_timer` callback in
/// [`drivers::hw_timer`](crate::drivers::hw_timer).
#[cfg(not(target_os = "espidf"))]
pub async fn run_tick_source(timer: &PollTimer, queue: &EventQueue) {
    use embassy_time::{Duration, Instant, Timer};

    loop {
        let deadline = timer.deadline_ms();
        let now = Instant::now().as_millis() as u32;
        let wait = deadline.wrapping_sub(now);
        if (wait as i32) > 0 {
            Timer::after(Duration::from_millis(u64::from(wait))).await;
        }
        if !timer.service(Instant::now().as_millis() as u32, queue) {
            // Previous tick not taken yet; check again shortly.
            Timer::after(Duration::from_millis(1)).await;
        }
    }
}
