//! Application service, the hexagonal core.
//!
//! [`TapService`] owns the credential gate, the session FSM, the presence
//! gate and the flow meter.  All I/O flows through port traits injected
//! at call sites, so the whole grant → presence → dispense cycle runs
//! against mock adapters and a fake clock in tests.
//!
//! ```text
//!  CredentialReader ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!  DistanceProbe    ──▶ │          TapService          │ ──▶ DisplaySink
//!  ClockPort        ◀─▶ │  Gate · FSM · Presence · Flow│
//!  ValveActuator    ◀── └──────────────────────────────┘
//! ```

use log::{info, warn};

use crate::config::TapConfig;
use crate::credential::{Credential, CredentialGate, Verdict};
use crate::display::Screen;
use crate::fsm::context::FsmContext;
use crate::fsm::states::build_state_table;
use crate::fsm::{Fsm, StateId};
use crate::sensors::flow::{FlowMeter, PulseCounter};
use crate::sensors::presence::PresenceGate;
use crate::timing::{Deadline, wait_ms};

use super::events::{AppEvent, CycleOutcome, TapStats};
use super::ports::{ClockPort, CredentialReader, DisplaySink, DistanceProbe, EventSink, ValveActuator};

/// Attempts made to drive the valve closed before giving up for this tick.
const VALVE_CLOSE_ATTEMPTS: u8 = 3;

// ───────────────────────────────────────────────────────────────
// TapService
// ───────────────────────────────────────────────────────────────

pub struct TapService<'a> {
    fsm: Fsm,
    ctx: FsmContext,
    gate: CredentialGate,
    presence: PresenceGate,
    meter: FlowMeter<'a>,
    /// Valve position last written successfully to the actuator.
    valve_applied: bool,
    stats: TapStats,
}

impl<'a> TapService<'a> {
    /// Construct the service.  `pulses` is the tally fed by the flow
    /// sensor input.
    ///
    /// Does **not** start the FSM; call [`start`](Self::start) next.
    pub fn new(config: TapConfig, pulses: &'a PulseCounter) -> Self {
        let presence = PresenceGate::new(&config);
        let meter = FlowMeter::new(pulses, &config);
        let ctx = FsmContext::new(config);
        let fsm = Fsm::new(build_state_table(), StateId::Idle);

        Self {
            fsm,
            ctx,
            gate: CredentialGate::new(),
            presence,
            meter,
            valve_applied: false,
            stats: TapStats::default(),
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Start the FSM in Idle and show the scan prompt.
    pub fn start(&mut self, display: &mut impl DisplaySink, sink: &mut impl EventSink) {
        self.fsm.start(&mut self.ctx);
        display.show(&Screen::scan_prompt());
        sink.emit(&AppEvent::Started(self.fsm.current_state()));
        info!("TapService started in {:?}", self.fsm.current_state());
    }

    // ── Scan cycle ────────────────────────────────────────────

    /// Poll the reader once and, if a card is presented, run it to a
    /// terminal outcome.  Always returns with the FSM in Idle, the valve
    /// closed and the scan prompt on screen.
    pub fn run_cycle(
        &mut self,
        hw: &mut (impl CredentialReader + DistanceProbe + ValveActuator),
        display: &mut impl DisplaySink,
        clock: &mut impl ClockPort,
        sink: &mut impl EventSink,
    ) -> CycleOutcome {
        // Re-drive a close that failed on an earlier cycle.
        self.apply_valve(hw, sink);

        let token = match hw.poll_new_token() {
            Ok(Some(token)) => token,
            Ok(None) => return CycleOutcome::NoCard,
            Err(e) => {
                warn!("Reader fault: {}", e);
                self.stats.reader_faults += 1;
                sink.emit(&AppEvent::ReaderFault(e));
                self.notice(&Screen::reader_fault(), display, clock);
                return CycleOutcome::ReaderFault(e);
            }
        };

        match self.gate.observe(token) {
            Verdict::Learned => {
                self.stats.enrollments += 1;
                sink.emit(&AppEvent::CredentialEnrolled(token));
                self.notice(&Screen::enrolled(), display, clock);
                CycleOutcome::Enrolled
            }
            Verdict::Denied => {
                self.stats.denials += 1;
                sink.emit(&AppEvent::AccessDenied(token));
                self.notice(&Screen::access_denied(), display, clock);
                CycleOutcome::Denied
            }
            Verdict::Granted => self.authorized_session(token, hw, display, clock, sink),
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> StateId {
        self.fsm.current_state()
    }

    pub fn stats(&self) -> TapStats {
        self.stats
    }

    pub fn is_enrolled(&self) -> bool {
        self.gate.is_enrolled()
    }

    /// Last commanded valve position.
    pub fn valve_commanded_open(&self) -> bool {
        self.ctx.commands.valve_open
    }

    // ── Internal ──────────────────────────────────────────────

    fn authorized_session(
        &mut self,
        token: Credential,
        hw: &mut (impl DistanceProbe + ValveActuator),
        display: &mut impl DisplaySink,
        clock: &mut impl ClockPort,
        sink: &mut impl EventSink,
    ) -> CycleOutcome {
        self.stats.grants += 1;
        sink.emit(&AppEvent::AccessGranted(token));
        display.show(&Screen::access_granted());
        wait_ms(clock, u64::from(self.ctx.config.notice_ms));

        self.ctx.inputs.verdict = Some(Verdict::Granted);
        self.step(hw, &*clock, sink);

        // ── Presence gate ─────────────────────────────────────
        let wait_started = clock.now_ms();
        let present = self.presence.await_presence(
            hw,
            clock,
            self.ctx.config.presence_wait_secs,
            self.ctx.config.presence_poll_secs,
            |remaining| display.show(&Screen::place_hand(remaining)),
        );

        if present {
            // Re-arm before the open so no real flow is counted as stray.
            self.meter.begin_session(clock.now_ms());
        }
        self.ctx.inputs.presence = Some(present);
        self.step(hw, &*clock, sink);

        if !present {
            self.stats.presence_timeouts += 1;
            sink.emit(&AppEvent::PresenceTimeout);
            display.show(&Screen::scan_prompt());
            return CycleOutcome::PresenceTimeout;
        }
        sink.emit(&AppEvent::PresenceConfirmed {
            waited_ms: clock.now_ms().saturating_sub(wait_started),
        });

        if !self.valve_applied {
            return self.abandon_session(display, clock, sink);
        }

        // ── Dispensing ────────────────────────────────────────
        let start_ms = self.ctx.session.start_ms;
        let tick_ms = u64::from(self.ctx.config.dispense_tick_ms.max(1));
        let mut next_tick = start_ms;

        while self.fsm.current_state() == StateId::Dispensing {
            let deadline = Deadline::after(next_tick, tick_ms);
            clock.wait_until(deadline);
            next_tick = deadline.at_ms();

            if let Some(flow) = self.meter.sample(clock.now_ms()) {
                display.show(&Screen::flow_rate(flow.instant_rate_lps));
                sink.emit(&AppEvent::FlowSample {
                    rate_lps: flow.instant_rate_lps,
                    total_liters: flow.total_volume_liters,
                });
            }
            self.step(hw, &*clock, sink);
        }

        // ── Report ────────────────────────────────────────────
        let liters = self.meter.total_liters();
        let duration_ms = clock.now_ms().saturating_sub(start_ms);
        self.stats.sessions_completed += 1;
        self.stats.lifetime_liters = self.meter.lifetime_liters();
        sink.emit(&AppEvent::SessionCompleted {
            liters,
            lifetime_liters: self.stats.lifetime_liters,
            duration_ms,
        });
        info!("Session complete: {:.3} L in {} ms", liters, duration_ms);

        display.show(&Screen::total(liters));
        wait_ms(clock, u64::from(self.ctx.config.total_display_ms));
        display.show(&Screen::scan_prompt());

        CycleOutcome::Dispensed { liters }
    }

    /// The open write failed.  Return to Idle with the valve commanded
    /// closed; the session is not counted.
    fn abandon_session(
        &mut self,
        display: &mut impl DisplaySink,
        clock: &mut impl ClockPort,
        sink: &mut impl EventSink,
    ) -> CycleOutcome {
        let prev = self.fsm.current_state();
        self.ctx.now_ms = clock.now_ms();
        self.fsm.force_transition(StateId::Idle, &mut self.ctx);
        sink.emit(&AppEvent::StateChanged {
            from: prev,
            to: self.fsm.current_state(),
        });

        self.stats.valve_faults += 1;
        warn!("Session abandoned: valve did not open");
        self.notice(&Screen::valve_fault(), display, clock);
        CycleOutcome::ValveFault
    }

    /// Run one FSM tick at the current time and apply its valve command.
    fn step(
        &mut self,
        valve: &mut impl ValveActuator,
        clock: &impl ClockPort,
        sink: &mut impl EventSink,
    ) {
        let prev = self.fsm.current_state();
        self.ctx.now_ms = clock.now_ms();
        self.fsm.tick(&mut self.ctx);
        self.apply_valve(valve, sink);

        let next = self.fsm.current_state();
        if next != prev {
            sink.emit(&AppEvent::StateChanged { from: prev, to: next });
        }
    }

    /// Write the commanded valve position if it differs from the last one
    /// applied.  Opening is attempted once; closing is retried.
    fn apply_valve(&mut self, valve: &mut impl ValveActuator, sink: &mut impl EventSink) {
        let want = self.ctx.commands.valve_open;
        if want == self.valve_applied {
            return;
        }

        let attempts = if want { 1 } else { VALVE_CLOSE_ATTEMPTS };
        for attempt in 1..=attempts {
            match valve.set_open(want) {
                Ok(()) => {
                    self.valve_applied = want;
                    info!("Valve {}", if want { "opened" } else { "closed" });
                    return;
                }
                Err(e) => {
                    warn!("Valve set_open({}) failed (attempt {}): {}", want, attempt, e);
                    sink.emit(&AppEvent::ValveFault { open: want, error: e });
                }
            }
        }
    }

    /// Show a notice, hold it, then return to the scan prompt.
    fn notice(&self, screen: &Screen, display: &mut impl DisplaySink, clock: &mut impl ClockPort) {
        display.show(screen);
        wait_ms(clock, u64::from(self.ctx.config.notice_ms));
        display.show(&Screen::scan_prompt());
    }
}
