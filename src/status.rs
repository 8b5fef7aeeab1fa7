//! Device status registry.
//!
//! A single `u32` bitset of boolean conditions, owned by the dispatcher
//! task.  Every real transition posts a [`StatusChanged`](Event::StatusChanged)
//! event so handlers observe it on a later dispatcher cycle.  Repeated
//! `set`/`clear` of a flag already in that state is a silent no-op.
//!
//! Collaborators running on the dispatcher task (battery monitor, HMI,
//! supervisor) receive `&mut StatusRegistry` in their poll calls; nothing
//! else writes to it, so no locking is needed.

use core::fmt;

use heapless::Vec;
use log::{debug, warn};

use crate::events::{Event, EventQueue};

/// Boolean device conditions.  Each variant is one bit of the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StatusFlag {
    /// Battery voltage is low; the user should be warned.
    BatteryLowVoltageWarning = 0,
    /// Battery voltage is critically low; the hub should shut down.
    BatteryLowVoltageShutdown = 1,
    /// Battery current draw is too high.
    BatteryHighCurrent = 2,
    /// Bluetooth is advertising and waiting for a connection.
    BleAdvertising = 3,
    /// Bluetooth signal strength is low.
    BleLowSignal = 4,
    /// The power button is currently held down.
    PowerButtonPressed = 5,
    /// A user program is prepared and running.
    UserProgramRunning = 6,
    /// The hub is shutting down.
    Shutdown = 7,
}

impl StatusFlag {
    pub const COUNT: usize = 8;

    pub const ALL: [StatusFlag; Self::COUNT] = [
        Self::BatteryLowVoltageWarning,
        Self::BatteryLowVoltageShutdown,
        Self::BatteryHighCurrent,
        Self::BleAdvertising,
        Self::BleLowSignal,
        Self::PowerButtonPressed,
        Self::UserProgramRunning,
        Self::Shutdown,
    ];

    /// Bit position mask for this flag.
    pub const fn mask(self) -> u32 {
        1 << (self as u8)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::BatteryLowVoltageWarning => "battery-low-warning",
            Self::BatteryLowVoltageShutdown => "battery-low-shutdown",
            Self::BatteryHighCurrent => "battery-high-current",
            Self::BleAdvertising => "ble-advertising",
            Self::BleLowSignal => "ble-low-signal",
            Self::PowerButtonPressed => "power-button",
            Self::UserProgramRunning => "program-running",
            Self::Shutdown => "shutdown",
        }
    }
}

impl fmt::Display for StatusFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The status bitset plus the queue it notifies.
pub struct StatusRegistry<'q> {
    bits: u32,
    notify: &'q EventQueue,
    /// Transitions whose notification could not be queued.
    lost_notifications: u32,
}

impl<'q> StatusRegistry<'q> {
    /// Empty registry (all flags clear) that posts changes to `notify`.
    pub fn new(notify: &'q EventQueue) -> Self {
        Self {
            bits: 0,
            notify,
            lost_notifications: 0,
        }
    }

    /// Set `flag`.  Posts a notification only on a clear → set transition.
    pub fn set(&mut self, flag: StatusFlag) {
        if self.bits & flag.mask() != 0 {
            return;
        }
        self.bits |= flag.mask();
        debug!("status set: {}", flag);
        self.raise(Event::status_set(flag));
    }

    /// Clear `flag`.  Posts a notification only on a set → clear transition.
    pub fn clear(&mut self, flag: StatusFlag) {
        if self.bits & flag.mask() == 0 {
            return;
        }
        self.bits &= !flag.mask();
        debug!("status cleared: {}", flag);
        self.raise(Event::status_cleared(flag));
    }

    /// Whether `flag` is currently set.
    pub fn query(&self, flag: StatusFlag) -> bool {
        self.bits & flag.mask() != 0
    }

    /// Raw bitset snapshot.
    pub fn bits(&self) -> u32 {
        self.bits
    }

    /// Flags currently set, in declaration order.
    pub fn active(&self) -> Vec<StatusFlag, { StatusFlag::COUNT }> {
        StatusFlag::ALL
            .iter()
            .copied()
            .filter(|f| self.query(*f))
            .collect()
    }

    /// Number of transitions whose event was dropped on a full queue.
    pub fn lost_notifications(&self) -> u32 {
        self.lost_notifications
    }

    // The bit change always sticks; only the notification can be lost.
    fn raise(&mut self, event: Event) {
        if let Err(e) = self.notify.post(event) {
            self.lost_notifications = self.lost_notifications.saturating_add(1);
            warn!("status notification lost: {}", e);
        }
    }
}

impl fmt::Display for StatusRegistry<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let active = self.active();
        if active.is_empty() {
            return f.write_str("[]");
        }
        f.write_str("[")?;
        for (i, flag) in active.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{flag}")?;
        }
        f.write_str("]")
    }
}
