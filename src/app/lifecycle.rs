//! User program lifecycle.
//!
//! A user program announces itself with [`ProgramLifecycle::prepare`],
//! handing over an optional stop callback and an optional stdin callback.
//! The supervisor uses the stop callback to interrupt the program (power
//! button, host stop command) and forwards raw stdin bytes to the stdin
//! callback.  [`ProgramLifecycle::unprepare`] tears everything down.
//!
//! ```text
//!   Idle ──prepare(cb)──▶ Prepared ──unprepare()──▶ Idle
//!                            │  ▲
//!                 request_stop / dispatch_stdin
//! ```

use log::{info, warn};

use crate::error::LifecycleError;
use crate::status::{StatusFlag, StatusRegistry};

use super::ports::PeripheralPort;

/// Called to ask the running program to stop.
pub type StopCallback = Box<dyn FnMut()>;

/// Called with each stdin byte; returns `true` if the program consumed it.
pub type StdinCallback = Box<dyn FnMut(u8) -> bool>;

/// Hooks a user program installs for the duration of one run.
#[derive(Default)]
pub struct ProgramCallbacks {
    pub stop: Option<StopCallback>,
    pub stdin: Option<StdinCallback>,
}

impl ProgramCallbacks {
    /// No hooks at all; a valid program that cannot be interrupted.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_stop(mut self, stop: impl FnMut() + 'static) -> Self {
        self.stop = Some(Box::new(stop));
        self
    }

    pub fn with_stdin(mut self, stdin: impl FnMut(u8) -> bool + 'static) -> Self {
        self.stdin = Some(Box::new(stdin));
        self
    }
}

impl core::fmt::Debug for ProgramCallbacks {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ProgramCallbacks")
            .field("stop", &self.stop.is_some())
            .field("stdin", &self.stdin.is_some())
            .finish()
    }
}

/// Owns the callbacks of the current user program, if any.
#[derive(Debug, Default)]
pub struct ProgramLifecycle {
    /// `Some` between `prepare` and `unprepare`.
    callbacks: Option<ProgramCallbacks>,
    stop_requests: u32,
}

impl ProgramLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `callbacks` and mark the program as running.
    ///
    /// Rejected if a program is already prepared; the installed callbacks
    /// are left untouched in that case.
    pub fn prepare(
        &mut self,
        callbacks: ProgramCallbacks,
        status: &mut StatusRegistry<'_>,
    ) -> Result<(), LifecycleError> {
        if self.callbacks.is_some() {
            warn!("prepare rejected: a user program is already prepared");
            return Err(LifecycleError::AlreadyPrepared);
        }
        info!("user program prepared ({:?})", callbacks);
        self.callbacks = Some(callbacks);
        status.set(StatusFlag::UserProgramRunning);
        Ok(())
    }

    /// Mark the program stopped, halt all peripherals and drop the callbacks.
    /// Harmless when nothing is prepared.
    pub fn unprepare(
        &mut self,
        status: &mut StatusRegistry<'_>,
        peripherals: &mut impl PeripheralPort,
    ) {
        status.clear(StatusFlag::UserProgramRunning);
        peripherals.stop_all();
        if self.callbacks.take().is_some() {
            info!("user program unprepared");
        }
    }

    /// Ask the running program to stop.  Returns `true` if a stop callback
    /// was installed and invoked.
    pub fn request_stop(&mut self) -> bool {
        match self.callbacks.as_mut().and_then(|cb| cb.stop.as_mut()) {
            Some(stop) => {
                self.stop_requests = self.stop_requests.saturating_add(1);
                info!("requesting user program stop");
                stop();
                true
            }
            None => false,
        }
    }

    /// Forward one stdin byte.  Returns the callback's verdict, or `false`
    /// if no stdin callback is installed.
    pub fn dispatch_stdin(&mut self, byte: u8) -> bool {
        match self.callbacks.as_mut().and_then(|cb| cb.stdin.as_mut()) {
            Some(stdin) => stdin(byte),
            None => false,
        }
    }

    pub fn is_prepared(&self) -> bool {
        self.callbacks.is_some()
    }

    pub fn has_stop_callback(&self) -> bool {
        self.callbacks.as_ref().is_some_and(|cb| cb.stop.is_some())
    }

    /// Stop callbacks invoked since boot.
    pub fn stop_requests(&self) -> u32 {
        self.stop_requests
    }
}
