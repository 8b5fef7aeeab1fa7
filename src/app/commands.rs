//! Inbound host commands.
//!
//! The transport hands the supervisor a raw `u32` opcode.  Only two
//! values are defined; anything else is dropped quietly so that a newer
//! host can talk to an older hub (and vice versa) without faulting it.

use log::debug;

use super::lifecycle::ProgramLifecycle;

/// Commands the host can send to the hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum CommandOpcode {
    /// Reserved: program start is driven by the loader, not the supervisor.
    StartUserProgram = 0,
    /// Ask the running user program to stop.
    StopUserProgram = 1,
}

impl CommandOpcode {
    /// Decode a raw opcode.  `None` for values outside the enumeration.
    pub const fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(Self::StartUserProgram),
            1 => Some(Self::StopUserProgram),
            _ => None,
        }
    }
}

impl From<CommandOpcode> for u32 {
    fn from(op: CommandOpcode) -> Self {
        op as u32
    }
}

/// What the command processor did with an opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Recognised, nothing to do.
    Reserved,
    /// A stop was requested; `true` if a stop callback actually ran.
    StopRequested(bool),
    /// Unknown opcode, ignored.
    Ignored,
}

/// Apply a raw opcode to the program lifecycle.
pub fn process(raw: u32, program: &mut ProgramLifecycle) -> CommandOutcome {
    match CommandOpcode::from_raw(raw) {
        Some(CommandOpcode::StartUserProgram) => CommandOutcome::Reserved,
        Some(CommandOpcode::StopUserProgram) => {
            CommandOutcome::StopRequested(program.request_stop())
        }
        None => {
            debug!("ignoring unknown command opcode {}", raw);
            CommandOutcome::Ignored
        }
    }
}
