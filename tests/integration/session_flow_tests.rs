//! End-to-end scan cycles through `TapService` against mock hardware.
//!
//! Default policy throughout: 2 s notices, 10 s presence budget polled
//! every second, 5 s sessions ticked every second, calibration 90.0.
//! The fake clock pours 90 pulses/s while the valve is open, which is
//! 1.0 L/min on the reference sensor.

use tapgate::app::events::{AppEvent, CycleOutcome};
use tapgate::app::ports::ClockPort;
use tapgate::app::service::TapService;
use tapgate::config::{TapConfig, VolumeScope};
use tapgate::display::Screen;
use tapgate::error::ReaderError;
use tapgate::fsm::StateId;
use tapgate::sensors::flow::PulseCounter;

use crate::mock_hw::{
    CARD_A, CARD_B, ECHO_FAR, FakeClock, MockHardware, RecordingDisplay, RecordingSink,
};

const PULSES_PER_SEC: u32 = 90;
/// 5 s at 1.0 L/min.
const SESSION_LITERS: f32 = 5.0 / 60.0;

struct Rig<'a> {
    app: TapService<'a>,
    hw: MockHardware,
    clock: FakeClock<'a>,
    display: RecordingDisplay,
    sink: RecordingSink,
}

impl<'a> Rig<'a> {
    fn new(pulses: &'a PulseCounter, config: TapConfig) -> Self {
        let hw = MockHardware::new();
        let clock = FakeClock::new(pulses, hw.valve_flag(), PULSES_PER_SEC);
        let mut display = RecordingDisplay::default();
        let mut sink = RecordingSink::default();
        let mut app = TapService::new(config, pulses);
        app.start(&mut display, &mut sink);
        Self {
            app,
            hw,
            clock,
            display,
            sink,
        }
    }

    fn cycle(&mut self) -> CycleOutcome {
        self.app
            .run_cycle(&mut self.hw, &mut self.display, &mut self.clock, &mut self.sink)
    }

    /// Enroll `CARD_A` and clear the recorders.
    fn enrolled(pulses: &'a PulseCounter, config: TapConfig) -> Self {
        let mut rig = Self::new(pulses, config);
        rig.hw.present(CARD_A);
        assert_eq!(rig.cycle(), CycleOutcome::Enrolled);
        rig.display.screens.clear();
        rig.sink.events.clear();
        rig
    }
}

fn assert_liters(actual: f32, expected: f32) {
    assert!(
        (actual - expected).abs() < 1e-4,
        "expected {expected} L, got {actual} L"
    );
}

// ── Enrollment and verification ───────────────────────────────

#[test]
fn first_card_enrolls_without_opening_valve() {
    let pulses = PulseCounter::new();
    let mut rig = Rig::new(&pulses, TapConfig::default());
    rig.hw.present(CARD_A);

    assert_eq!(rig.cycle(), CycleOutcome::Enrolled);
    assert!(rig.app.is_enrolled());
    assert!(rig.hw.valve_writes.is_empty());
    assert_eq!(rig.hw.probe_calls, 0);
    assert!(rig.display.has(&Screen::enrolled()));
    assert_eq!(rig.display.last(), Some(&Screen::scan_prompt()));
    assert_eq!(rig.clock.now_ms(), 2_000);
}

#[test]
fn granted_card_dispenses_for_the_session_duration() {
    let pulses = PulseCounter::new();
    let mut rig = Rig::enrolled(&pulses, TapConfig::default());
    rig.hw.present(CARD_A);
    rig.hw.hand_on_poll(3);

    let outcome = rig.cycle();

    let CycleOutcome::Dispensed { liters } = outcome else {
        panic!("expected a dispense, got {outcome:?}");
    };
    assert_liters(liters, SESSION_LITERS);
    assert_eq!(rig.hw.valve_writes, vec![true, false]);
    assert!(!rig.hw.valve_is_open());
    assert_eq!(rig.app.state(), StateId::Idle);

    let (reported, duration_ms) = rig.sink.session_completed().unwrap();
    assert_liters(reported, SESSION_LITERS);
    assert_eq!(duration_ms, 5_000);
    assert_eq!(
        rig.sink
            .count(|e| matches!(e, AppEvent::PresenceConfirmed { waited_ms: 3_000 })),
        1
    );
    assert_eq!(
        rig.sink.count(|e| matches!(e, AppEvent::FlowSample { .. })),
        5
    );

    assert!(rig.display.has(&Screen::access_granted()));
    assert!(rig.display.has(&Screen::flow_rate(1.0 / 60.0)));
    assert!(rig.display.has(&Screen::total(liters)));
    assert_eq!(rig.display.last(), Some(&Screen::scan_prompt()));
    assert_eq!(rig.app.stats().sessions_completed, 1);
}

#[test]
fn hand_on_seventh_poll_is_detected_after_seven_seconds() {
    let pulses = PulseCounter::new();
    let mut rig = Rig::enrolled(&pulses, TapConfig::default());
    rig.hw.present(CARD_A);
    rig.hw.hand_on_poll(7);

    assert!(matches!(rig.cycle(), CycleOutcome::Dispensed { .. }));
    assert_eq!(rig.hw.probe_calls, 7);
    assert_eq!(
        rig.sink
            .count(|e| matches!(e, AppEvent::PresenceConfirmed { waited_ms: 7_000 })),
        1
    );
}

#[test]
fn wrong_card_is_denied_and_valve_stays_closed() {
    let pulses = PulseCounter::new();
    let mut rig = Rig::enrolled(&pulses, TapConfig::default());
    rig.hw.present(CARD_B);

    assert_eq!(rig.cycle(), CycleOutcome::Denied);
    assert!(rig.hw.valve_writes.is_empty());
    assert_eq!(rig.hw.probe_calls, 0);
    assert!(rig.display.has(&Screen::access_denied()));
    assert_eq!(rig.app.stats().denials, 1);

    // The reference is unchanged.
    rig.hw.present(CARD_A);
    rig.hw.hand_on_poll(1);
    assert!(matches!(rig.cycle(), CycleOutcome::Dispensed { .. }));
}

// ── Presence timeout ──────────────────────────────────────────

#[test]
fn no_hand_times_out_without_opening_valve() {
    let pulses = PulseCounter::new();
    let mut rig = Rig::enrolled(&pulses, TapConfig::default());
    rig.hw.present(CARD_A);
    rig.hw.echoes.extend([ECHO_FAR; 10]);
    let start = rig.clock.now_ms();

    assert_eq!(rig.cycle(), CycleOutcome::PresenceTimeout);
    assert!(rig.hw.valve_writes.is_empty());
    assert_eq!(rig.hw.probe_calls, 10);
    assert_eq!(rig.clock.now_ms() - start, 2_000 + 10_000);
    assert_eq!(rig.app.state(), StateId::Idle);
    assert_eq!(rig.app.stats().presence_timeouts, 1);

    let countdown: Vec<Screen> = (1..=10).rev().map(Screen::place_hand).collect();
    let shown: Vec<Screen> = rig
        .display
        .screens
        .iter()
        .filter(|s| s.top.as_str() == "Place your hand")
        .cloned()
        .collect();
    assert_eq!(shown, countdown);
    assert_eq!(rig.display.last(), Some(&Screen::scan_prompt()));
}

// ── Valve discipline ──────────────────────────────────────────

#[test]
fn every_session_opens_the_valve_exactly_once() {
    let pulses = PulseCounter::new();
    let mut rig = Rig::enrolled(&pulses, TapConfig::default());

    for _ in 0..3 {
        rig.hw.present(CARD_A);
        rig.hw.hand_on_poll(2);
        assert!(matches!(rig.cycle(), CycleOutcome::Dispensed { .. }));
    }

    assert_eq!(rig.hw.opens(), 3);
    assert_eq!(
        rig.hw.valve_writes,
        vec![true, false, true, false, true, false]
    );
}

#[test]
fn valve_is_closed_after_every_outcome() {
    let pulses = PulseCounter::new();
    let mut rig = Rig::new(&pulses, TapConfig::default());

    rig.hw.present(CARD_A);
    rig.hw.present(CARD_B);
    rig.hw.reader_fault(ReaderError::Communication);
    rig.hw.present(CARD_A); // timeout, no echoes scripted
    rig.hw.present(CARD_A);

    for _ in 0..5 {
        if rig.hw.cards.len() == 1 {
            rig.hw.hand_on_poll(1);
        }
        rig.cycle();
        assert!(!rig.hw.valve_is_open());
        assert!(!rig.app.valve_commanded_open());
        assert_eq!(rig.app.state(), StateId::Idle);
    }
    assert_eq!(rig.hw.opens(), 1);
}

#[test]
fn failed_close_is_retried_within_the_tick() {
    let pulses = PulseCounter::new();
    let mut rig = Rig::enrolled(&pulses, TapConfig::default());
    rig.hw.present(CARD_A);
    rig.hw.hand_on_poll(1);
    rig.hw.failing_closes = 2;

    assert!(matches!(rig.cycle(), CycleOutcome::Dispensed { .. }));
    assert!(!rig.hw.valve_is_open());
    assert_eq!(
        rig.sink
            .count(|e| matches!(e, AppEvent::ValveFault { open: false, .. })),
        2
    );
}

#[test]
fn stuck_close_is_re_driven_on_the_next_cycle() {
    let pulses = PulseCounter::new();
    let mut rig = Rig::enrolled(&pulses, TapConfig::default());
    rig.hw.present(CARD_A);
    rig.hw.hand_on_poll(1);
    rig.hw.failing_closes = 4;

    assert!(matches!(rig.cycle(), CycleOutcome::Dispensed { .. }));
    assert!(rig.hw.valve_is_open(), "all three attempts failed");

    assert_eq!(rig.cycle(), CycleOutcome::NoCard);
    assert!(!rig.hw.valve_is_open());
    assert_eq!(rig.hw.valve_writes, vec![true, false]);
}

#[test]
fn valve_that_will_not_open_abandons_the_session() {
    let pulses = PulseCounter::new();
    let mut rig = Rig::enrolled(&pulses, TapConfig::default());
    rig.hw.present(CARD_A);
    rig.hw.hand_on_poll(1);
    rig.hw.failing_opens = u32::MAX;

    assert_eq!(rig.cycle(), CycleOutcome::ValveFault);
    assert_eq!(rig.hw.valve_attempts, 1, "one open attempt, no retries");
    assert!(rig.hw.valve_writes.is_empty());
    assert_eq!(rig.app.state(), StateId::Idle);
    assert!(!rig.app.valve_commanded_open());

    let stats = rig.app.stats();
    assert_eq!(stats.valve_faults, 1);
    assert_eq!(stats.sessions_completed, 0);
    assert_eq!(
        rig.sink
            .count(|e| matches!(e, AppEvent::ValveFault { open: true, .. })),
        1
    );
    assert!(rig.sink.session_completed().is_none());
    assert_eq!(
        rig.sink.count(|e| matches!(e, AppEvent::FlowSample { .. })),
        0
    );
    assert!(rig.display.has(&Screen::valve_fault()));
    assert_eq!(rig.display.last(), Some(&Screen::scan_prompt()));

    // Nothing is re-driven afterwards.
    assert_eq!(rig.cycle(), CycleOutcome::NoCard);
    assert_eq!(rig.hw.valve_attempts, 1);
}

#[test]
fn next_grant_after_a_failed_open_runs_a_full_session() {
    let pulses = PulseCounter::new();
    let mut rig = Rig::enrolled(&pulses, TapConfig::default());
    rig.hw.failing_opens = 1;

    rig.hw.present(CARD_A);
    rig.hw.hand_on_poll(1);
    assert_eq!(rig.cycle(), CycleOutcome::ValveFault);

    rig.hw.present(CARD_A);
    rig.hw.hand_on_poll(1);
    let CycleOutcome::Dispensed { liters } = rig.cycle() else {
        panic!("expected a dispense");
    };
    assert_liters(liters, SESSION_LITERS);
    assert_eq!(rig.sink.session_completed().map(|(_, ms)| ms), Some(5_000));
    assert_eq!(rig.hw.valve_writes, vec![true, false]);
    assert_eq!(rig.app.stats().sessions_completed, 1);
}

// ── Reader faults ─────────────────────────────────────────────

#[test]
fn reader_fault_is_reported_and_scanning_continues() {
    let pulses = PulseCounter::new();
    let mut rig = Rig::new(&pulses, TapConfig::default());
    rig.hw.reader_fault(ReaderError::Communication);
    rig.hw.reader_fault(ReaderError::MalformedUid { len: 7 });
    rig.hw.present(CARD_A);

    assert_eq!(
        rig.cycle(),
        CycleOutcome::ReaderFault(ReaderError::Communication)
    );
    assert_eq!(
        rig.cycle(),
        CycleOutcome::ReaderFault(ReaderError::MalformedUid { len: 7 })
    );
    assert!(!rig.app.is_enrolled(), "a bad read never enrolls");
    assert_eq!(rig.cycle(), CycleOutcome::Enrolled);

    assert_eq!(rig.app.stats().reader_faults, 2);
    assert!(rig.display.has(&Screen::reader_fault()));
}

#[test]
fn idle_cycle_with_no_card_does_nothing() {
    let pulses = PulseCounter::new();
    let mut rig = Rig::new(&pulses, TapConfig::default());
    rig.sink.events.clear();

    assert_eq!(rig.cycle(), CycleOutcome::NoCard);
    assert_eq!(rig.clock.now_ms(), 0);
    assert_eq!(rig.clock.waits, 0);
    assert!(rig.sink.events.is_empty());
}

// ── Volume reporting ──────────────────────────────────────────

#[test]
fn session_scope_reports_each_session_alone() {
    let pulses = PulseCounter::new();
    let mut rig = Rig::enrolled(&pulses, TapConfig::default());

    for _ in 0..2 {
        rig.hw.present(CARD_A);
        rig.hw.hand_on_poll(1);
        let CycleOutcome::Dispensed { liters } = rig.cycle() else {
            panic!("expected a dispense");
        };
        assert_liters(liters, SESSION_LITERS);
    }
    assert!((rig.app.stats().lifetime_liters - 2.0 * SESSION_LITERS).abs() < 1e-4);
}

#[test]
fn lifetime_scope_reports_running_total() {
    let pulses = PulseCounter::new();
    let config = TapConfig {
        volume_scope: VolumeScope::Lifetime,
        ..TapConfig::default()
    };
    let mut rig = Rig::enrolled(&pulses, config);

    let mut reported = Vec::new();
    for _ in 0..2 {
        rig.hw.present(CARD_A);
        rig.hw.hand_on_poll(1);
        if let CycleOutcome::Dispensed { liters } = rig.cycle() {
            reported.push(liters);
        }
    }
    assert_eq!(reported.len(), 2);
    assert_liters(reported[0], SESSION_LITERS);
    assert_liters(reported[1], 2.0 * SESSION_LITERS);
}

#[test]
fn pulses_arriving_as_the_valve_opens_are_metered() {
    static RUSH: PulseCounter = PulseCounter::new();
    let mut rig = Rig::enrolled(&RUSH, TapConfig::default());
    for _ in 0..500 {
        RUSH.increment();
    }
    rig.hw.open_burst = Some((&RUSH, 90));
    rig.hw.present(CARD_A);
    rig.hw.hand_on_poll(1);

    let CycleOutcome::Dispensed { liters } = rig.cycle() else {
        panic!("expected a dispense");
    };
    // 90 extra pulses is one more second at 1.0 L/min; the 500 stray are dropped.
    assert_liters(liters, SESSION_LITERS + 1.0 / 60.0);
}

#[test]
fn stray_pulses_before_the_session_are_discarded() {
    let pulses = PulseCounter::new();
    let mut rig = Rig::enrolled(&pulses, TapConfig::default());
    for _ in 0..500 {
        pulses.increment();
    }
    rig.hw.present(CARD_A);
    rig.hw.hand_on_poll(1);

    let CycleOutcome::Dispensed { liters } = rig.cycle() else {
        panic!("expected a dispense");
    };
    assert_liters(liters, SESSION_LITERS);
}
