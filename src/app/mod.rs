//! Supervisor core: event dispatch and program lifecycle, zero I/O.
//!
//! All interaction with batteries, buttons, lights and motors happens
//! through the **port traits** in [`ports`], keeping this layer testable
//! on the host without real peripherals.

pub mod commands;
pub mod lifecycle;
pub mod poller;
pub mod ports;
pub mod process;
