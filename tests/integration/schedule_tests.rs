//! Poll schedule against a simulated clock.
//!
//! The battery mock advances the shared clock by its poll cost, standing
//! in for a slow collaborator.  The tick source is modelled by calling
//! `service` at the clock's current time after each dispatch.

use hubsys::app::process::SystemProcess;
use hubsys::config::SystemConfig;
use hubsys::events::EventQueue;
use hubsys::timer::PollTimer;

use crate::mock_hw::{HwCall, mock_ports, mock_ports_with_cost};

const PERIOD: u32 = 50;

#[test]
fn poll_taking_a_full_period_does_not_delay_next_tick() {
    let q = EventQueue::new();
    let t = PollTimer::new(PERIOD);
    let (ports, hw) = mock_ports_with_cost(PERIOD);
    let mut p = SystemProcess::new(SystemConfig::default(), &q, &t, ports);
    p.start(hw.clock.now());

    hw.clock.set(PERIOD);
    assert!(t.service(hw.clock.now(), &q));

    for round in 1..=20u32 {
        p.process_pending();
        // The round ended exactly on the next deadline; the tick goes out now.
        assert_eq!(hw.clock.now(), (round + 1) * PERIOD);
        assert_eq!(t.deadline_ms(), (round + 1) * PERIOD);
        assert!(t.service(hw.clock.now(), &q), "tick late in round {}", round);
    }
    assert_eq!(p.poll_rounds(), 20);
}

#[test]
fn deadlines_stay_on_grid_when_polls_overrun() {
    let q = EventQueue::new();
    let t = PollTimer::new(PERIOD);
    let (ports, hw) = mock_ports_with_cost(PERIOD + 20);
    let mut p = SystemProcess::new(SystemConfig::default(), &q, &t, ports);
    p.start(0);
    hw.clock.set(PERIOD);

    for _ in 0..10 {
        assert!(t.service(hw.clock.now(), &q));
        p.process_pending();
        assert_eq!(t.deadline_ms() % PERIOD, 0);
    }
    // Ten rounds, ten deadlines: the schedule catches up rather than sliding.
    assert_eq!(t.deadline_ms(), 11 * PERIOD);
}

#[test]
fn fast_polls_wait_for_deadline() {
    let q = EventQueue::new();
    let t = PollTimer::new(PERIOD);
    let (ports, hw) = mock_ports();
    let mut p = SystemProcess::new(SystemConfig::default(), &q, &t, ports);
    p.start(0);

    hw.clock.set(PERIOD);
    assert!(t.service(hw.clock.now(), &q));
    p.process_pending();

    hw.clock.advance(PERIOD - 1);
    assert!(!t.service(hw.clock.now(), &q));
    hw.clock.advance(1);
    assert!(t.service(hw.clock.now(), &q));
    p.process_pending();
    assert_eq!(hw.log.count(&HwCall::SupervisorPoll), 2);
}

#[test]
fn configured_interval_drives_the_timer() {
    let q = EventQueue::new();
    let t = PollTimer::new(PERIOD);
    let (ports, _hw) = mock_ports();
    let config = SystemConfig {
        poll_interval_ms: 20,
        ..SystemConfig::default()
    };
    let mut p = SystemProcess::new(config, &q, &t, ports);
    p.start(1_000);

    assert_eq!(t.period_ms(), 20);
    assert!(!t.service(1_019, &q));
    assert!(t.service(1_020, &q));
    p.process_pending();
    assert_eq!(t.deadline_ms(), 1_040);
}
