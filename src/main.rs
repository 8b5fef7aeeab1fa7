//! Hub supervisor firmware entry point.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │  Producers                                                     │
//! │  tick source (esp_timer / embassy-time)   host console/transport│
//! │        │                                         │             │
//! │        ▼                                         ▼             │
//! │  ┌───────────────────── SYSTEM_EVENTS ──────────────────────┐  │
//! │  └───────────────────────────┬──────────────────────────────┘  │
//! │                              ▼                                 │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │  SystemProcess (single task, run-to-completion)        │    │
//! │  │  StatusRegistry · ProgramLifecycle · PeriodicPoller    │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │        │ ports: battery · HMI · supervisor · peripherals       │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! On the host the collaborators are the `adapters::sim` stand-ins and a
//! console thread plays the part of the button, battery and host link:
//!
//! | Input          | Effect                                   |
//! |----------------|------------------------------------------|
//! | `start`        | load and prepare the demo user program   |
//! | `end`          | demo program exits (unprepare)           |
//! | `stop`         | host STOP_USER_PROGRAM command           |
//! | `cmd <n>`      | raw command opcode `n`                   |
//! | `press`        | hold the power button                    |
//! | `release`      | release the power button                 |
//! | `battery <mv>` | set the simulated battery voltage        |
//! | `send <text>`  | feed `text` to the program's stdin       |
//!
//! Set `HUBSYS_CONFIG` to a JSON file to override the default
//! [`SystemConfig`] on the host.
#![deny(unused_must_use)]

use core::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;
use edge_executor::LocalExecutor;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::{info, warn};

use hubsys::adapters::sim::{SimBattery, SimHmi, SimPeripherals, SimSupervisor};
use hubsys::adapters::time::uptime_ms;
use hubsys::app::lifecycle::ProgramCallbacks;
use hubsys::app::ports::{BatteryPort, HmiPort, PeripheralPort, SupervisorPort};
use hubsys::app::process::{SystemPorts, SystemProcess};
use hubsys::config::SystemConfig;
use hubsys::drivers::hw_timer;
use hubsys::events::SYSTEM_EVENTS;
use hubsys::status::StatusFlag;
use hubsys::timer::POLL_TIMER;

// ── Program loader ────────────────────────────────────────────
//
// Requests from the console to the loader, which runs on the dispatcher
// task between events.

enum LoaderRequest {
    Start,
    Stdin(u8),
    Finish,
}

static LOADER: Channel<CriticalSectionRawMutex, LoaderRequest, 16> = Channel::new();

/// Set by the demo program's stop callback; the program "exits" on the
/// next loader pass.
static DEMO_STOP: AtomicBool = AtomicBool::new(false);

fn demo_program() -> ProgramCallbacks {
    ProgramCallbacks::none()
        .with_stop(|| {
            info!("demo program: stop requested");
            DEMO_STOP.store(true, Ordering::Release);
        })
        .with_stdin(|b| {
            info!("demo program: stdin {:?}", b as char);
            true
        })
}

fn service_loader<B, H, S, P>(process: &mut SystemProcess<'_, B, H, S, P>)
where
    B: BatteryPort,
    H: HmiPort,
    S: SupervisorPort,
    P: PeripheralPort,
{
    while let Ok(req) = LOADER.try_receive() {
        match req {
            LoaderRequest::Start => {
                DEMO_STOP.store(false, Ordering::Release);
                if let Err(e) = process.prepare_user_program(demo_program()) {
                    warn!("loader: {}", e);
                }
            }
            LoaderRequest::Stdin(b) => {
                if !process.dispatch_stdin(b) {
                    warn!("loader: stdin byte dropped, no program listening");
                }
            }
            LoaderRequest::Finish => process.unprepare_user_program(),
        }
    }

    if DEMO_STOP.swap(false, Ordering::AcqRel) {
        process.unprepare_user_program();
    }
}

// ── Configuration ─────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
const CONFIG_ENV: &str = "HUBSYS_CONFIG";

#[cfg(not(target_os = "espidf"))]
fn load_config() -> Result<SystemConfig> {
    use anyhow::Context;

    let Some(path) = std::env::var_os(CONFIG_ENV) else {
        return Ok(SystemConfig::default());
    };
    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("reading {}", path.to_string_lossy()))?;
    SystemConfig::from_json(&text)
        .map_err(hubsys::error::Error::from)
        .with_context(|| format!("loading {}", path.to_string_lossy()))
}

#[cfg(target_os = "espidf")]
fn load_config() -> Result<SystemConfig> {
    let config = load_config()?;
    Ok(config)
}

// ── Host console ──────────────────────────────────────────────

/// Hand a request to the loader, waiting for room.  The dispatcher drains
/// the channel after every event, so this never waits longer than a tick.
#[cfg(not(target_os = "espidf"))]
fn submit(req: LoaderRequest) {
    futures_lite::future::block_on(LOADER.send(req));
}

#[cfg(not(target_os = "espidf"))]
fn spawn_console() -> std::io::Result<()> {
    use hubsys::adapters::sim::{SIM_BATTERY_MV, SIM_BUTTON};
    use hubsys::app::commands::CommandOpcode;

    std::thread::Builder::new()
        .name("console".into())
        .spawn(|| {
            for line in std::io::stdin().lines() {
                let Ok(line) = line else { break };
                let mut words = line.trim().splitn(2, ' ');
                let verb = words.next().unwrap_or_default();
                let arg = words.next().unwrap_or_default();

                match verb {
                    "start" => submit(LoaderRequest::Start),
                    "end" => submit(LoaderRequest::Finish),
                    "stop" => {
                        SYSTEM_EVENTS.post_command(CommandOpcode::StopUserProgram.into());
                    }
                    "cmd" => match arg.parse::<u32>() {
                        Ok(op) => {
                            SYSTEM_EVENTS.post_command(op);
                        }
                        Err(_) => warn!("console: bad opcode {:?}", arg),
                    },
                    "press" => SIM_BUTTON.store(true, Ordering::Relaxed),
                    "release" => SIM_BUTTON.store(false, Ordering::Relaxed),
                    "battery" => match arg.parse::<u32>() {
                        Ok(mv) => SIM_BATTERY_MV.store(mv, Ordering::Relaxed),
                        Err(_) => warn!("console: bad voltage {:?}", arg),
                    },
                    "send" => {
                        for b in arg.bytes() {
                            submit(LoaderRequest::Stdin(b));
                        }
                    }
                    "" => {}
                    other => warn!("console: unknown input {:?}", other),
                }
            }
        })?;
    Ok(())
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    let config = load_config()?;

    // ── 1. Logging ────────────────────────────────────────────
    #[cfg(target_os = "espidf")]
    {
        esp_idf_svc::sys::link_patches();
        esp_idf_logger::init()?;
        log::set_max_level(config.log_level.into());
    }
    #[cfg(not(target_os = "espidf"))]
    hubsys::adapters::console_log::init(config.log_level.into())?;

    info!("hubsys v{} starting", env!("CARGO_PKG_VERSION"));

    // ── 2. System process ─────────────────────────────────────
    // The device runs the sim stand-ins too until real battery/HMI drivers exist.
    let ports = SystemPorts {
        battery: SimBattery::new(),
        hmi: SimHmi::new(),
        supervisor: SimSupervisor::new(),
        peripherals: SimPeripherals::new(),
    };
    let mut process = SystemProcess::new(config, &SYSTEM_EVENTS, &POLL_TIMER, ports);
    process.start(uptime_ms());

    // ── 3. Producers ──────────────────────────────────────────
    hw_timer::start_tick_source();
    #[cfg(not(target_os = "espidf"))]
    spawn_console()?;

    let ex: LocalExecutor<'_, 4> = LocalExecutor::new();
    #[cfg(not(target_os = "espidf"))]
    ex.spawn(hubsys::timer::run_tick_source(&POLL_TIMER, &SYSTEM_EVENTS))
        .detach();

    // ── 4. Event loop ─────────────────────────────────────────
    info!("system ready, entering event loop");
    futures_lite::future::block_on(ex.run(async {
        loop {
            process.step().await;
            service_loader(&mut process);
            if process.status().query(StatusFlag::Shutdown) {
                break;
            }
        }
    }));

    // ── 5. Shutdown ───────────────────────────────────────────
    if process.is_program_running() {
        process.unprepare_user_program();
    }
    hw_timer::stop_tick_source();
    info!(
        "shutdown: {} events, {} poll rounds, {} dropped",
        process.cycles(),
        process.poll_rounds(),
        SYSTEM_EVENTS.dropped()
    );
    Ok(())
}
