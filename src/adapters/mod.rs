//! Concrete implementations of the supervisor's port traits.
//!
//! | Adapter        | Implements         | Connects to                   |
//! |----------------|--------------------|-------------------------------|
//! | `sim`          | BatteryPort        | Simulated battery gauge       |
//! |                | HmiPort            | Simulated button + status LED |
//! |                | SupervisorPort     | Shutdown policy               |
//! |                | PeripheralPort     | Log output                    |
//! | `console_log`  | `log::Log`         | stderr (host builds)          |
//! | `time`         | uptime queries     | embassy-time / esp_timer      |

#[cfg(not(target_os = "espidf"))]
pub mod console_log;
pub mod sim;
pub mod time;
