//! Owned simulation instance.
//!
//! A `CycleEngine` holds one `CycleState` together with its seeded noise
//! source, performance history and alert journal. All mutation goes through
//! the operator actions and `step`; readers get shared references or a
//! copyable `CycleReading`.
//!
//! Every action is atomic: the candidate state is built and stepped on the
//! side and only committed when the whole update succeeds.

use crate::alert_journal::{AlertEvent, AlertJournal};
use crate::alerts::{self, AlarmLevel};
use crate::command::{Component, OperatorCommand};
use crate::config::{CycleConfig, Fidelity};
use crate::cycle_model;
use crate::error::EngineError;
use crate::history::{PerformanceHistory, PerformancePoint};
use crate::motor_model;
use crate::setpoint::{Setpoint, SetpointKind};
use crate::state::CycleState;
use crate::sync::CycleReading;
use crate::timebase::TimeBase;
use log::{debug, trace, warn};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::time::Duration;

/// Result of one committed step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub tick: u64,
    pub alert_events: Vec<AlertEvent>,
}

#[derive(Debug, Clone)]
pub struct CycleEngine {
    config: CycleConfig,
    state: CycleState,
    rng: ChaCha8Rng,
    history: PerformanceHistory,
    journal: AlertJournal,
    timebase: TimeBase,
    tick: u64,
    accumulated: Duration,
    domain_faults: u64,
}

impl CycleEngine {
    /// Starts from the process-start defaults matching `config.fidelity`.
    pub fn new(config: CycleConfig) -> Self {
        let state = match config.fidelity {
            Fidelity::Detailed => CycleState::refrigeration_defaults(),
            Fidelity::Simple => CycleState::motor_defaults(),
        };
        Self::with_state(config, state)
    }

    pub fn with_state(config: CycleConfig, state: CycleState) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            history: PerformanceHistory::new(config.history_capacity),
            journal: AlertJournal::new(config.journal_capacity, config.journal_dedupe_ms),
            timebase: TimeBase::new(),
            tick: 0,
            accumulated: Duration::ZERO,
            domain_faults: 0,
            state,
            config,
        }
    }

    pub fn refrigeration() -> Self {
        Self::new(CycleConfig::refrigeration())
    }

    pub fn motor() -> Self {
        Self::new(CycleConfig::motor())
    }

    pub fn config(&self) -> &CycleConfig {
        &self.config
    }

    pub fn state(&self) -> &CycleState {
        &self.state
    }

    pub fn history(&self) -> &PerformanceHistory {
        &self.history
    }

    pub fn journal(&self) -> &AlertJournal {
        &self.journal
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn domain_faults(&self) -> u64 {
        self.domain_faults
    }

    pub fn alarm_level(&self) -> AlarmLevel {
        AlarmLevel::of(&self.state.alerts, &self.state.motor.alerts)
    }

    /// Whether the periodic clock should step this engine right now.
    pub fn wants_tick(&self) -> bool {
        self.state.is_running || self.config.settle_while_stopped
    }

    pub fn snapshot(&self) -> CycleReading {
        let s = &self.state;
        CycleReading {
            timestamp_us: self.timebase.unix_us(),
            tick: self.tick,
            is_running: s.is_running,
            defrost_mode: s.defrost_mode,
            compressor_rpm: s.compressor_rpm,
            system_temperature_c: s.system_temperature_c,
            target_temperature_c: s.target_temperature_c,
            ambient_temperature_c: s.ambient_temperature_c,
            compressor_pressure_bar: s.compressor_pressure_bar,
            condenser_pressure_bar: s.condenser_pressure_bar,
            evaporator_pressure_bar: s.evaporator_pressure_bar,
            refrigerant_flow: s.refrigerant_flow,
            power_consumption_w: s.power_consumption_w,
            cop: s.cop,
            superheat_c: s.superheat_c,
            subcooling_c: s.subcooling_c,
            motor_temperature_c: s.motor.temperature_c,
            motor_efficiency_pct: s.motor.efficiency_pct,
            vibration_level: s.motor.vibration_level,
            alarm_level: self.alarm_level(),
            active_alerts: alerts::active_count(&s.alerts, &s.motor.alerts) as u32,
            domain_faults: self.domain_faults,
            ..CycleReading::default()
        }
    }

    /// Runs one tick from the current state.
    pub fn step(&mut self) -> Result<StepOutcome, EngineError> {
        let base = self.state.clone();
        self.step_from(base)
    }

    /// Host-driven clock: accumulates `dt` and steps at most once per call
    /// when a full period has elapsed. Surplus time is dropped.
    pub fn advance(&mut self, dt: Duration) -> Result<Option<StepOutcome>, EngineError> {
        if !self.wants_tick() {
            self.accumulated = Duration::ZERO;
            return Ok(None);
        }
        self.accumulated += dt;
        if self.accumulated < self.config.tick_period() {
            return Ok(None);
        }
        self.accumulated = Duration::ZERO;
        self.step().map(Some)
    }

    /// Flips run state. Starting applies the fidelity's start rpm and, on
    /// detailed engines, re-runs the step. Stopping forces rpm to zero.
    pub fn toggle_running(&mut self) -> Result<(), EngineError> {
        let mut candidate = self.state.clone();
        candidate.is_running = !candidate.is_running;
        if candidate.is_running {
            candidate.compressor_rpm = self.config.fidelity.start_rpm();
            self.commit_action(candidate)
        } else {
            candidate.compressor_rpm = 0.0;
            self.state = candidate;
            Ok(())
        }
    }

    pub fn set_target_temperature(&mut self, celsius: f64) -> Result<(), EngineError> {
        let value = self.validated(SetpointKind::TargetTemperature, celsius)?;
        let mut candidate = self.state.clone();
        candidate.target_temperature_c = value;
        self.commit_action(candidate)
    }

    pub fn set_defrost_mode(&mut self, enabled: bool) -> Result<(), EngineError> {
        let mut candidate = self.state.clone();
        candidate.defrost_mode = enabled;
        self.commit_action(candidate)
    }

    /// Stored as given even while stopped, so a stopped engine may carry a
    /// non-zero rpm until the next start overwrites it. The "rpm is zero
    /// exactly when stopped" invariant holds only across start and stop.
    pub fn set_compressor_rpm(&mut self, rpm: f64) -> Result<(), EngineError> {
        let value = self.validated(SetpointKind::CompressorRpm, rpm)?;
        let mut candidate = self.state.clone();
        candidate.compressor_rpm = value;
        self.commit_action(candidate)
    }

    pub fn set_refrigerant_charge(&mut self, pct: f64) -> Result<(), EngineError> {
        self.state.refrigerant_charge_pct = self.validated(SetpointKind::Percent, pct)?;
        Ok(())
    }

    pub fn set_expansion_valve_opening(&mut self, pct: f64) -> Result<(), EngineError> {
        self.state.expansion_valve_opening_pct = self.validated(SetpointKind::Percent, pct)?;
        Ok(())
    }

    pub fn set_ambient_temperature(&mut self, celsius: f64) -> Result<(), EngineError> {
        self.state.ambient_temperature_c =
            self.validated(SetpointKind::AmbientTemperature, celsius)?;
        Ok(())
    }

    pub fn set_efficiency(&mut self, component: Component, pct: f64) -> Result<(), EngineError> {
        let value = self.validated(SetpointKind::Percent, pct)?;
        let slot = match component {
            Component::Compressor => &mut self.state.compressor_efficiency_pct,
            Component::Condenser => &mut self.state.condenser_efficiency_pct,
            Component::Evaporator => &mut self.state.evaporator_efficiency_pct,
        };
        *slot = value;
        Ok(())
    }

    pub fn set_motor_balance(&mut self, balance: f64) -> Result<(), EngineError> {
        self.state.motor.balance = self.validated(SetpointKind::Fraction, balance)?;
        Ok(())
    }

    pub fn set_friction_coefficient(&mut self, mu: f64) -> Result<(), EngineError> {
        self.state.motor.friction_coefficient = self.validated(SetpointKind::Fraction, mu)?;
        Ok(())
    }

    /// Dispatches an operator command to the matching action.
    pub fn apply(&mut self, command: OperatorCommand) -> Result<(), EngineError> {
        debug!("applying operator command: {command}");
        match command {
            OperatorCommand::Start if !self.state.is_running => self.toggle_running(),
            OperatorCommand::Stop if self.state.is_running => self.toggle_running(),
            OperatorCommand::Start | OperatorCommand::Stop => Ok(()),
            OperatorCommand::Toggle => self.toggle_running(),
            OperatorCommand::SetTargetTemperature(v) => self.set_target_temperature(v),
            OperatorCommand::SetCompressorRpm(v) => self.set_compressor_rpm(v),
            OperatorCommand::SetDefrostMode(on) => self.set_defrost_mode(on),
            OperatorCommand::SetRefrigerantCharge(v) => self.set_refrigerant_charge(v),
            OperatorCommand::SetExpansionValveOpening(v) => self.set_expansion_valve_opening(v),
            OperatorCommand::SetAmbientTemperature(v) => self.set_ambient_temperature(v),
            OperatorCommand::SetEfficiency(component, v) => self.set_efficiency(component, v),
            OperatorCommand::SetMotorBalance(v) => self.set_motor_balance(v),
            OperatorCommand::SetFrictionCoefficient(v) => self.set_friction_coefficient(v),
        }
    }

    fn validated(&self, kind: SetpointKind, value: f64) -> Result<f64, EngineError> {
        let setpoint = Setpoint::new(kind, value)
            .validate(&self.config.input_limits, self.config.input_policy)?;
        Ok(setpoint.value())
    }

    fn commit_action(&mut self, candidate: CycleState) -> Result<(), EngineError> {
        if self.config.fidelity.steps_on_action() {
            self.step_from(candidate)?;
        } else {
            self.state = candidate;
        }
        Ok(())
    }

    fn step_from(&mut self, base: CycleState) -> Result<StepOutcome, EngineError> {
        let mut rng = self.rng.clone();
        let result = match self.config.fidelity {
            Fidelity::Detailed => cycle_model::advance(&base, &self.config),
            Fidelity::Simple => motor_model::advance(&base, &self.config, &mut rng),
        };

        let next = match result {
            Ok(next) => next,
            Err(err) => {
                self.domain_faults += 1;
                warn!("step {} rejected, state retained: {err}", self.tick + 1);
                return Err(err.into());
            }
        };

        self.rng = rng;
        self.state = next;
        self.tick += 1;

        let timestamp_ms = self.timebase.unix_ms();
        self.history
            .push(PerformancePoint::capture(&self.state, self.tick, timestamp_ms));
        let alert_events = self.journal.observe(
            &self.state.alerts,
            &self.state.motor.alerts,
            self.tick,
            timestamp_ms,
        );

        trace!(
            "tick {} committed: rpm={} T={:.3}",
            self.tick,
            self.state.compressor_rpm,
            self.state.system_temperature_c
        );
        Ok(StepOutcome {
            tick: self.tick,
            alert_events,
        })
    }
}

impl Default for CycleEngine {
    fn default() -> Self {
        Self::refrigeration()
    }
}
