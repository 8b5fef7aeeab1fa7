//! Port traits: the boundary between the supervisor and its collaborators.
//!
//! ```text
//!   Collaborator ──▶ Port trait ──▶ SystemProcess (dispatcher)
//! ```
//!
//! Battery monitoring, HMI (button/LED) handling, supervisor diagnostics
//! and peripheral shutdown live outside this crate.  The dispatcher only
//! knows them through these narrow contracts.
//!
//! ## Contract
//!
//! - Every call runs on the dispatcher task and **must return promptly**.
//!   A blocking collaborator stalls the whole loop; nothing here can
//!   preempt it.
//! - Collaborators may raise or lower status flags through the
//!   `&mut StatusRegistry` they are handed; that is the only way they
//!   influence the dispatcher.

use crate::events::Event;
use crate::status::StatusRegistry;

// ───────────────────────────────────────────────────────────────
// Battery
// ───────────────────────────────────────────────────────────────

/// Battery monitor.
pub trait BatteryPort {
    /// One-time setup, called before the first poll.
    fn init(&mut self);

    /// Periodic update.  May set the low-voltage / high-current flags.
    fn poll(&mut self, status: &mut StatusRegistry<'_>);
}

// ───────────────────────────────────────────────────────────────
// HMI
// ───────────────────────────────────────────────────────────────

/// Human-machine interface: buttons and status lights.
pub trait HmiPort {
    /// One-time setup, called after the battery monitor is initialised.
    fn init(&mut self);

    /// Periodic update.  Typically debounces the power button and sets or
    /// clears [`StatusFlag::PowerButtonPressed`](crate::status::StatusFlag).
    fn poll(&mut self, status: &mut StatusRegistry<'_>);

    /// Sees every event before the dispatcher acts on it, whatever its kind.
    fn handle_event(&mut self, event: &Event, status: &StatusRegistry<'_>);
}

// ───────────────────────────────────────────────────────────────
// Supervisor
// ───────────────────────────────────────────────────────────────

/// System health supervisor (e.g. shutdown on critical battery).
pub trait SupervisorPort {
    fn poll(&mut self, status: &mut StatusRegistry<'_>);
}

// ───────────────────────────────────────────────────────────────
// Peripherals
// ───────────────────────────────────────────────────────────────

/// Global "stop everything" action for motors, lights and sensors a user
/// program may have left running.
pub trait PeripheralPort {
    fn stop_all(&mut self);
}
