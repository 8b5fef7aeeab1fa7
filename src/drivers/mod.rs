//! Device drivers.

pub mod hw_timer;
