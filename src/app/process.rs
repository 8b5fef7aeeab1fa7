//! The system process, the hub's supervisory event loop.
//!
//! [`SystemProcess`] owns every piece of process-wide state (status
//! registry, user program lifecycle, collaborators) and is driven by a
//! single task.  Each cycle:
//!
//! 1. wait for the next [`Event`] (the only suspension point);
//! 2. forward it to the HMI, whatever its kind;
//! 3. dispatch it:
//!
//! ```text
//!   TimerTick (due)              ─▶ rearm timer ─▶ battery ─▶ HMI ─▶ supervisor
//!   StatusChanged(power button)  ─▶ request_stop()   (only if a stop hook exists)
//!   Command(START)               ─▶ reserved
//!   Command(STOP)                ─▶ request_stop()
//!   anything else                ─▶ ignored
//! ```
//!
//! Handling runs to completion with no yielding, so collaborators must be
//! quick.  Nothing here returns an error or panics on bad input.

use log::{debug, info, trace};

use crate::config::SystemConfig;
use crate::error::LifecycleError;
use crate::events::{Event, EventQueue, StatusChange};
use crate::status::{StatusFlag, StatusRegistry};
use crate::timer::PollTimer;

use super::commands::{self, CommandOutcome};
use super::lifecycle::{ProgramCallbacks, ProgramLifecycle};
use super::poller::PeriodicPoller;
use super::ports::{BatteryPort, HmiPort, PeripheralPort, SupervisorPort};

/// The collaborators the process drives.
pub struct SystemPorts<B, H, S, P> {
    pub battery: B,
    pub hmi: H,
    pub supervisor: S,
    pub peripherals: P,
}

/// Dispatcher context: everything the event loop reads or writes.
pub struct SystemProcess<'a, B, H, S, P> {
    config: SystemConfig,
    queue: &'a EventQueue,
    timer: &'a PollTimer,
    status: StatusRegistry<'a>,
    program: ProgramLifecycle,
    poller: PeriodicPoller,
    ports: SystemPorts<B, H, S, P>,
    cycles: u64,
}

impl<'a, B, H, S, P> SystemProcess<'a, B, H, S, P>
where
    B: BatteryPort,
    H: HmiPort,
    S: SupervisorPort,
    P: PeripheralPort,
{
    /// Build the process.  Does **not** touch the collaborators or the
    /// timer; call [`start`](Self::start) next.
    pub fn new(
        config: SystemConfig,
        queue: &'a EventQueue,
        timer: &'a PollTimer,
        ports: SystemPorts<B, H, S, P>,
    ) -> Self {
        Self {
            config,
            queue,
            timer,
            status: StatusRegistry::new(queue),
            program: ProgramLifecycle::new(),
            poller: PeriodicPoller::new(),
            ports,
            cycles: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Initialise battery then HMI, and arm the poll timer.
    pub fn start(&mut self, now_ms: u32) {
        self.ports.battery.init();
        self.ports.hmi.init();
        self.timer.start(now_ms, self.config.poll_interval_ms);
        info!(
            "system process started (poll every {} ms)",
            self.config.poll_interval_ms
        );
    }

    /// Wait for events forever.
    pub async fn run(&mut self) {
        loop {
            self.step().await;
        }
    }

    /// Wait for one event and handle it.
    pub async fn step(&mut self) {
        let event = self.queue.receive().await;
        self.handle_event(event);
    }

    /// Handle every event currently queued, including any raised while
    /// handling.  Returns the number handled.
    pub fn process_pending(&mut self) -> usize {
        let mut handled = 0;
        while let Some(event) = self.queue.try_receive() {
            self.handle_event(event);
            handled += 1;
        }
        handled
    }

    /// One dispatcher cycle for an already-received event.
    pub fn handle_event(&mut self, event: Event) {
        self.cycles = self.cycles.wrapping_add(1);
        trace!("event #{}: {:?}", self.cycles, event);

        self.ports.hmi.handle_event(&event, &self.status);

        match event {
            Event::TimerTick if self.timer.is_due() => {
                self.timer.rearm();
                self.poller.poll_round(
                    &mut self.ports.battery,
                    &mut self.ports.hmi,
                    &mut self.ports.supervisor,
                    &mut self.status,
                );
            }
            Event::TimerTick => {
                debug!("stray timer tick ignored");
            }
            Event::StatusChanged(StatusChange {
                flag: StatusFlag::PowerButtonPressed,
                set: true,
            }) if self.program.has_stop_callback() => {
                info!("power button pressed, stopping user program");
                self.program.request_stop();
            }
            Event::StatusChanged(_) => {}
            Event::Command(raw) => {
                if let CommandOutcome::StopRequested(false) =
                    commands::process(raw, &mut self.program)
                {
                    debug!("stop command with no program to stop");
                }
            }
        }
    }

    // ── Program loader entry points ───────────────────────────

    pub fn prepare_user_program(
        &mut self,
        callbacks: ProgramCallbacks,
    ) -> Result<(), LifecycleError> {
        self.program.prepare(callbacks, &mut self.status)
    }

    pub fn unprepare_user_program(&mut self) {
        self.program
            .unprepare(&mut self.status, &mut self.ports.peripherals);
    }

    /// Forward a stdin byte from the transport to the running program.
    pub fn dispatch_stdin(&mut self, byte: u8) -> bool {
        self.program.dispatch_stdin(byte)
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn status(&self) -> &StatusRegistry<'a> {
        &self.status
    }

    /// Mutable registry access for code running on the dispatcher task.
    pub fn status_mut(&mut self) -> &mut StatusRegistry<'a> {
        &mut self.status
    }

    pub fn program(&self) -> &ProgramLifecycle {
        &self.program
    }

    pub fn is_program_running(&self) -> bool {
        self.status.query(StatusFlag::UserProgramRunning)
    }

    /// Events handled since boot.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Poll rounds completed since boot.
    pub fn poll_rounds(&self) -> u64 {
        self.poller.rounds()
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    pub fn ports(&self) -> &SystemPorts<B, H, S, P> {
        &self.ports
    }

    pub fn ports_mut(&mut self) -> &mut SystemPorts<B, H, S, P> {
        &mut self.ports
    }
}
