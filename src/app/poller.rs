//! Periodic poller.
//!
//! One round = battery, then HMI, then supervisor.  The dispatcher calls
//! [`PeriodicPoller::poll_round`] only from a due timer tick, after the
//! timer has been rearmed, so there is at most one round per period.

use log::trace;

use crate::status::StatusRegistry;

use super::ports::{BatteryPort, HmiPort, SupervisorPort};

#[derive(Debug, Default)]
pub struct PeriodicPoller {
    rounds: u64,
}

impl PeriodicPoller {
    pub fn new() -> Self {
        Self::default()
    }

    /// Poll each collaborator exactly once, in fixed order.
    pub fn poll_round(
        &mut self,
        battery: &mut impl BatteryPort,
        hmi: &mut impl HmiPort,
        supervisor: &mut impl SupervisorPort,
        status: &mut StatusRegistry<'_>,
    ) {
        self.rounds = self.rounds.wrapping_add(1);
        trace!("poll round {}", self.rounds);
        battery.poll(status);
        hmi.poll(status);
        supervisor.poll(status);
    }

    /// Poll rounds completed since boot.
    pub fn rounds(&self) -> u64 {
        self.rounds
    }
}
