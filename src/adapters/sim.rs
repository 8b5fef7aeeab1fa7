//! Simulated collaborators for host builds and tests.
//!
//! The "hardware" is a pair of atomics that a console thread (or a test)
//! writes: [`SIM_BUTTON`] for the power button and [`SIM_BATTERY_MV`] for
//! the battery voltage.  The adapters read them on each poll exactly the
//! way real drivers would sample a GPIO or an ADC.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use log::{info, warn};

use crate::app::ports::{BatteryPort, HmiPort, PeripheralPort, SupervisorPort};
use crate::events::Event;
use crate::status::{StatusFlag, StatusRegistry};

/// Raw power-button level (true = pressed).
pub static SIM_BUTTON: AtomicBool = AtomicBool::new(false);

/// Battery voltage in millivolts.
pub static SIM_BATTERY_MV: AtomicU32 = AtomicU32::new(NOMINAL_BATTERY_MV);

pub const NOMINAL_BATTERY_MV: u32 = 7200;
const LOW_WARNING_MV: u32 = 6800;
const LOW_SHUTDOWN_MV: u32 = 6000;

/// Consecutive identical samples before a button level is accepted.
const BUTTON_DEBOUNCE_POLLS: u8 = 2;

/// Poll rounds the button must be held before the hub shuts down.
pub const SHUTDOWN_HOLD_POLLS: u32 = 40;

// ── Battery ───────────────────────────────────────────────────

/// Threshold monitor over [`SIM_BATTERY_MV`].
#[derive(Debug, Default)]
pub struct SimBattery {
    last_mv: u32,
}

impl SimBattery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_mv(&self) -> u32 {
        self.last_mv
    }
}

impl BatteryPort for SimBattery {
    fn init(&mut self) {
        self.last_mv = SIM_BATTERY_MV.load(Ordering::Relaxed);
        info!("battery(sim): {} mV at boot", self.last_mv);
    }

    fn poll(&mut self, status: &mut StatusRegistry<'_>) {
        let mv = SIM_BATTERY_MV.load(Ordering::Relaxed);
        self.last_mv = mv;

        if mv < LOW_WARNING_MV {
            status.set(StatusFlag::BatteryLowVoltageWarning);
        } else {
            status.clear(StatusFlag::BatteryLowVoltageWarning);
        }
        // Shutdown level latches; the hub is going down anyway.
        if mv < LOW_SHUTDOWN_MV {
            status.set(StatusFlag::BatteryLowVoltageShutdown);
        }
    }
}

// ── HMI ───────────────────────────────────────────────────────

/// What the status light is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LightState {
    #[default]
    Off,
    Idle,
    Running,
    Warning,
}

/// Debounced power button plus a status light derived from the registry.
#[derive(Debug, Default)]
pub struct SimHmi {
    last_raw: bool,
    stable_polls: u8,
    light: LightState,
    events_seen: u64,
}

impl SimHmi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn light(&self) -> LightState {
        self.light
    }

    pub fn events_seen(&self) -> u64 {
        self.events_seen
    }

    fn light_for(status: &StatusRegistry<'_>) -> LightState {
        if status.query(StatusFlag::Shutdown) {
            LightState::Off
        } else if status.query(StatusFlag::BatteryLowVoltageWarning) {
            LightState::Warning
        } else if status.query(StatusFlag::UserProgramRunning) {
            LightState::Running
        } else {
            LightState::Idle
        }
    }
}

impl HmiPort for SimHmi {
    fn init(&mut self) {
        self.light = LightState::Idle;
        info!("hmi(sim): ready");
    }

    fn poll(&mut self, status: &mut StatusRegistry<'_>) {
        let raw = SIM_BUTTON.load(Ordering::Relaxed);
        if raw != self.last_raw {
            self.last_raw = raw;
            self.stable_polls = 1;
            return;
        }
        if self.stable_polls < BUTTON_DEBOUNCE_POLLS {
            self.stable_polls += 1;
            if self.stable_polls < BUTTON_DEBOUNCE_POLLS {
                return;
            }
        }
        if raw {
            status.set(StatusFlag::PowerButtonPressed);
        } else {
            status.clear(StatusFlag::PowerButtonPressed);
        }
    }

    fn handle_event(&mut self, _event: &Event, status: &StatusRegistry<'_>) {
        self.events_seen = self.events_seen.wrapping_add(1);
        let light = Self::light_for(status);
        if light != self.light {
            info!("hmi(sim): light {:?} -> {:?}", self.light, light);
            self.light = light;
        }
    }
}

// ── Supervisor ────────────────────────────────────────────────

/// Requests shutdown on critical battery or a long power-button hold.
#[derive(Debug, Default)]
pub struct SimSupervisor {
    held_polls: u32,
}

impl SimSupervisor {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SupervisorPort for SimSupervisor {
    fn poll(&mut self, status: &mut StatusRegistry<'_>) {
        if status.query(StatusFlag::PowerButtonPressed) {
            self.held_polls = self.held_polls.saturating_add(1);
        } else {
            self.held_polls = 0;
        }

        if status.query(StatusFlag::Shutdown) {
            return;
        }
        if status.query(StatusFlag::BatteryLowVoltageShutdown) {
            warn!("supervisor(sim): battery critical, shutting down");
            status.set(StatusFlag::Shutdown);
        } else if self.held_polls >= SHUTDOWN_HOLD_POLLS {
            info!("supervisor(sim): power button held, shutting down");
            status.set(StatusFlag::Shutdown);
        }
    }
}

// ── Peripherals ───────────────────────────────────────────────

/// Logs stop-all requests.
#[derive(Debug, Default)]
pub struct SimPeripherals {
    stop_count: u32,
}

impl SimPeripherals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop_count(&self) -> u32 {
        self.stop_count
    }
}

impl PeripheralPort for SimPeripherals {
    fn stop_all(&mut self) {
        self.stop_count = self.stop_count.saturating_add(1);
        info!("peripherals(sim): all motors and lights stopped");
    }
}
