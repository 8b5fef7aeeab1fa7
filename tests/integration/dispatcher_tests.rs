//! Event dispatch through [`SystemProcess`] against mock collaborators.

use std::time::Duration;

use hubsys::app::commands::CommandOpcode;
use hubsys::app::lifecycle::ProgramCallbacks;
use hubsys::app::process::SystemProcess;
use hubsys::config::SystemConfig;
use hubsys::error::QueueError;
use hubsys::events::{EVENT_QUEUE_CAP, Event, EventQueue};
use hubsys::status::StatusFlag;
use hubsys::timer::PollTimer;

use crate::mock_hw::{HwCall, mock_ports, recording_stop};

const PERIOD: u32 = 50;

// ── Polling ───────────────────────────────────────────────────

#[test]
fn due_tick_polls_battery_hmi_supervisor_in_order() {
    let q = EventQueue::new();
    let t = PollTimer::new(PERIOD);
    let (ports, hw) = mock_ports();
    let mut p = SystemProcess::new(SystemConfig::default(), &q, &t, ports);
    p.start(0);
    assert_eq!(hw.log.calls(), vec![HwCall::BatteryInit, HwCall::HmiInit]);
    hw.log.clear();

    assert!(t.service(PERIOD, &q));
    p.process_pending();

    assert_eq!(
        hw.log.calls(),
        vec![
            HwCall::HmiEvent(Event::TimerTick),
            HwCall::BatteryPoll,
            HwCall::HmiPoll,
            HwCall::SupervisorPoll,
        ]
    );
}

#[test]
fn one_poll_round_per_period() {
    let q = EventQueue::new();
    let t = PollTimer::new(PERIOD);
    let (ports, hw) = mock_ports();
    let mut p = SystemProcess::new(SystemConfig::default(), &q, &t, ports);
    p.start(0);

    for now in (PERIOD..=10 * PERIOD).step_by(10) {
        t.service(now, &q);
        p.process_pending();
    }
    assert_eq!(hw.log.count(&HwCall::BatteryPoll), 10);
    assert_eq!(p.poll_rounds(), 10);
}

#[test]
fn stray_tick_is_ignored() {
    let q = EventQueue::new();
    let t = PollTimer::new(PERIOD);
    let (ports, hw) = mock_ports();
    let mut p = SystemProcess::new(SystemConfig::default(), &q, &t, ports);
    p.start(0);
    hw.log.clear();

    q.post(Event::TimerTick).unwrap();
    p.process_pending();

    assert_eq!(hw.log.calls(), vec![HwCall::HmiEvent(Event::TimerTick)]);
    assert_eq!(t.deadline_ms(), PERIOD);
}

// ── HMI forwarding ────────────────────────────────────────────

#[test]
fn hmi_sees_event_before_stop_is_routed() {
    let q = EventQueue::new();
    let t = PollTimer::new(PERIOD);
    let (ports, hw) = mock_ports();
    let mut p = SystemProcess::new(SystemConfig::default(), &q, &t, ports);
    p.prepare_user_program(ProgramCallbacks::none().with_stop(recording_stop(&hw.log)))
        .unwrap();
    p.process_pending();
    hw.log.clear();

    q.post_command(CommandOpcode::StopUserProgram.into());
    p.process_pending();

    assert_eq!(
        hw.log.calls(),
        vec![
            HwCall::HmiEvent(Event::Command(1)),
            HwCall::ProgramStop,
        ]
    );
}

#[test]
fn hmi_sees_status_notifications() {
    let q = EventQueue::new();
    let t = PollTimer::new(PERIOD);
    let (ports, hw) = mock_ports();
    let mut p = SystemProcess::new(SystemConfig::default(), &q, &t, ports);

    p.status_mut().set(StatusFlag::BleAdvertising);
    p.status_mut().clear(StatusFlag::BleAdvertising);
    p.process_pending();

    assert_eq!(
        hw.log.hmi_events(),
        vec![
            Event::status_set(StatusFlag::BleAdvertising),
            Event::status_cleared(StatusFlag::BleAdvertising),
        ]
    );
}

// ── Stop routing ──────────────────────────────────────────────

#[test]
fn power_button_from_hmi_poll_stops_program_once() {
    let q = EventQueue::new();
    let t = PollTimer::new(PERIOD);
    let (ports, hw) = mock_ports();
    let mut p = SystemProcess::new(SystemConfig::default(), &q, &t, ports);
    p.start(0);
    p.prepare_user_program(ProgramCallbacks::none().with_stop(recording_stop(&hw.log)))
        .unwrap();

    hw.hmi_script.set(StatusFlag::PowerButtonPressed);
    t.service(PERIOD, &q);
    p.process_pending();
    assert_eq!(hw.log.count(&HwCall::ProgramStop), 1);

    // Held across further rounds: no new transition, no new stop.
    for n in 2..5 {
        t.service(n * PERIOD, &q);
        p.process_pending();
    }
    assert_eq!(hw.log.count(&HwCall::ProgramStop), 1);

    // Release, then press again.
    hw.hmi_script.clear(StatusFlag::PowerButtonPressed);
    t.service(5 * PERIOD, &q);
    p.process_pending();
    hw.hmi_script.set(StatusFlag::PowerButtonPressed);
    t.service(6 * PERIOD, &q);
    p.process_pending();
    assert_eq!(hw.log.count(&HwCall::ProgramStop), 2);
}

#[test]
fn each_qualifying_event_invokes_stop_exactly_once() {
    let q = EventQueue::new();
    let t = PollTimer::new(PERIOD);
    let (ports, hw) = mock_ports();
    let mut p = SystemProcess::new(SystemConfig::default(), &q, &t, ports);
    p.prepare_user_program(ProgramCallbacks::none().with_stop(recording_stop(&hw.log)))
        .unwrap();
    p.process_pending();

    for _ in 0..3 {
        q.post(Event::status_set(StatusFlag::PowerButtonPressed)).unwrap();
    }
    p.process_pending();
    assert_eq!(hw.log.count(&HwCall::ProgramStop), 3);
    assert_eq!(p.program().stop_requests(), 3);
}

#[test]
fn power_button_without_stop_callback_is_harmless() {
    let q = EventQueue::new();
    let t = PollTimer::new(PERIOD);
    let (ports, hw) = mock_ports();
    let mut p = SystemProcess::new(SystemConfig::default(), &q, &t, ports);
    p.prepare_user_program(ProgramCallbacks::none()).unwrap();
    p.process_pending();

    q.post(Event::status_set(StatusFlag::PowerButtonPressed)).unwrap();
    p.process_pending();
    assert_eq!(hw.log.count(&HwCall::ProgramStop), 0);
    assert_eq!(p.program().stop_requests(), 0);
}

#[test]
fn unrelated_status_changes_do_not_stop_program() {
    let q = EventQueue::new();
    let t = PollTimer::new(PERIOD);
    let (ports, hw) = mock_ports();
    let mut p = SystemProcess::new(SystemConfig::default(), &q, &t, ports);
    p.prepare_user_program(ProgramCallbacks::none().with_stop(recording_stop(&hw.log)))
        .unwrap();

    for flag in StatusFlag::ALL {
        if flag != StatusFlag::PowerButtonPressed {
            p.status_mut().set(flag);
        }
    }
    p.process_pending();
    assert_eq!(hw.log.count(&HwCall::ProgramStop), 0);
}

// ── Commands ──────────────────────────────────────────────────

#[test]
fn stop_command_without_program_changes_nothing() {
    let q = EventQueue::new();
    let t = PollTimer::new(PERIOD);
    let (ports, hw) = mock_ports();
    let mut p = SystemProcess::new(SystemConfig::default(), &q, &t, ports);
    p.status_mut().set(StatusFlag::BatteryHighCurrent);
    p.process_pending();
    let before = p.status().bits();
    hw.log.clear();

    q.post_command(CommandOpcode::StopUserProgram.into());
    assert_eq!(p.process_pending(), 1);

    assert_eq!(p.status().bits(), before);
    assert_eq!(hw.log.calls(), vec![HwCall::HmiEvent(Event::Command(1))]);
    assert!(q.is_empty());
}

#[test]
fn start_command_is_reserved() {
    let q = EventQueue::new();
    let t = PollTimer::new(PERIOD);
    let (ports, hw) = mock_ports();
    let mut p = SystemProcess::new(SystemConfig::default(), &q, &t, ports);
    p.prepare_user_program(ProgramCallbacks::none().with_stop(recording_stop(&hw.log)))
        .unwrap();
    p.process_pending();
    let before = p.status().bits();

    q.post_command(CommandOpcode::StartUserProgram.into());
    p.process_pending();
    assert_eq!(p.status().bits(), before);
    assert_eq!(hw.log.count(&HwCall::ProgramStop), 0);
}

#[test]
fn unknown_opcode_is_ignored_and_next_event_still_handled() {
    let q = EventQueue::new();
    let t = PollTimer::new(PERIOD);
    let (ports, hw) = mock_ports();
    let mut p = SystemProcess::new(SystemConfig::default(), &q, &t, ports);
    p.start(0);
    p.prepare_user_program(ProgramCallbacks::none().with_stop(recording_stop(&hw.log)))
        .unwrap();
    p.process_pending();
    let before = p.status().bits();

    q.post_command(0xDEAD_BEEF);
    q.post_command(CommandOpcode::StopUserProgram.into());
    p.process_pending();

    assert_eq!(p.status().bits(), before);
    assert_eq!(hw.log.count(&HwCall::ProgramStop), 1);
}

// ── Queue overflow ────────────────────────────────────────────

#[test]
fn full_queue_drops_and_counts() {
    let q = EventQueue::new();
    let t = PollTimer::new(PERIOD);
    let (ports, _hw) = mock_ports();
    let mut p = SystemProcess::new(SystemConfig::default(), &q, &t, ports);

    for _ in 0..EVENT_QUEUE_CAP {
        assert!(q.post_command(7));
    }
    assert!(matches!(q.post(Event::Command(8)), Err(QueueError::Full(Event::Command(8)))));
    assert!(!q.post_command(9));
    assert_eq!(q.dropped(), 2);

    // The flag still changes even though its notification is lost.
    p.status_mut().set(StatusFlag::BleLowSignal);
    assert!(p.status().query(StatusFlag::BleLowSignal));
    assert_eq!(p.status().lost_notifications(), 1);

    assert_eq!(p.process_pending(), EVENT_QUEUE_CAP);
    assert!(q.is_empty());
}

// ── Suspension ────────────────────────────────────────────────

#[test]
fn step_waits_for_an_event_from_another_thread() {
    let q = EventQueue::new();
    let t = PollTimer::new(PERIOD);
    let (ports, hw) = mock_ports();
    let mut p = SystemProcess::new(SystemConfig::default(), &q, &t, ports);
    p.prepare_user_program(ProgramCallbacks::none().with_stop(recording_stop(&hw.log)))
        .unwrap();
    p.process_pending();
    hw.log.clear();

    std::thread::scope(|s| {
        s.spawn(|| {
            std::thread::sleep(Duration::from_millis(20));
            assert!(q.post_command(CommandOpcode::StopUserProgram.into()));
        });
        futures_lite::future::block_on(p.step());
    });

    assert_eq!(
        hw.log.calls(),
        vec![HwCall::HmiEvent(Event::Command(1)), HwCall::ProgramStop]
    );
    assert_eq!(p.cycles(), 2);
}
