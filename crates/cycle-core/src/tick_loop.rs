use crate::command::OperatorCommand;
use crate::engine::{CycleEngine, StepOutcome};
use crate::error::EngineError;
use crate::sync::StateExchange;
use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Longest the loop waits before re-checking the stop flag.
const POLL_SLICE: Duration = Duration::from_millis(50);

#[derive(Clone, Default, Debug)]
pub struct TickStats {
    pub ticks_executed: u64,
    pub ticks_skipped: u64,
    pub domain_faults: u64,
    pub commands_applied: u64,
    pub rejected_commands: u64,
    pub max_jitter_us: u64,
}

/// Hooks for whoever records what the driver does. All methods default to no-ops.
pub trait TickObserver {
    fn command_applied(&mut self, _instance: &str, _command: &OperatorCommand) {}
    fn command_rejected(
        &mut self,
        _instance: &str,
        _command: &OperatorCommand,
        _error: &EngineError,
    ) {
    }
    fn stepped(&mut self, _instance: &str, _outcome: &StepOutcome) {}
    fn step_failed(&mut self, _instance: &str, _error: &EngineError) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl TickObserver for NoopObserver {}

/// Owns one engine: applies operator commands as they arrive and steps the
/// engine once per period. Late periods are skipped, never replayed.
pub struct TickDriver<O: TickObserver = NoopObserver> {
    instance: String,
    engine: CycleEngine,
    commands: Receiver<OperatorCommand>,
    exchange: Arc<StateExchange>,
    observer: O,
    stats: TickStats,
}

impl TickDriver<NoopObserver> {
    pub fn new(
        instance: impl Into<String>,
        engine: CycleEngine,
        commands: Receiver<OperatorCommand>,
        exchange: Arc<StateExchange>,
    ) -> Self {
        Self::with_observer(instance, engine, commands, exchange, NoopObserver)
    }
}

impl<O: TickObserver> TickDriver<O> {
    pub fn with_observer(
        instance: impl Into<String>,
        engine: CycleEngine,
        commands: Receiver<OperatorCommand>,
        exchange: Arc<StateExchange>,
        observer: O,
    ) -> Self {
        let driver = Self {
            instance: instance.into(),
            engine,
            commands,
            exchange,
            observer,
            stats: TickStats::default(),
        };
        driver.publish();
        driver
    }

    pub fn run(&mut self, stop: &AtomicBool) {
        let period = self.engine.config().tick_period();
        let mut next_tick = Instant::now() + period;
        let mut inbox_open = true;
        info!(
            "tick driver '{}' running every {} ms",
            self.instance,
            period.as_millis()
        );

        while !stop.load(Ordering::Relaxed) {
            let now = Instant::now();
            if now < next_tick {
                let wait = (next_tick - now).min(POLL_SLICE);
                if inbox_open {
                    match self.commands.recv_timeout(wait) {
                        Ok(command) => self.handle_command(command),
                        Err(RecvTimeoutError::Timeout) => {}
                        Err(RecvTimeoutError::Disconnected) => {
                            debug!("command channel of '{}' closed", self.instance);
                            inbox_open = false;
                        }
                    }
                } else {
                    std::thread::sleep(wait);
                }
                continue;
            }

            let lateness = now.duration_since(next_tick);
            let missed = (lateness.as_nanos() / period.as_nanos()) as u32;
            if missed > 0 {
                self.stats.ticks_skipped += u64::from(missed);
                debug!("'{}' skipped {missed} late tick(s)", self.instance);
            }
            next_tick += period * (missed + 1);
            self.stats.max_jitter_us = self
                .stats
                .max_jitter_us
                .max((lateness.as_nanos() % period.as_nanos() / 1_000) as u64);

            self.tick();
        }

        info!(
            "tick driver '{}' stopped after {} ticks",
            self.instance, self.stats.ticks_executed
        );
    }

    /// One clock period: steps when the engine wants it, then publishes.
    pub fn tick(&mut self) {
        if !self.engine.wants_tick() {
            return;
        }
        match self.engine.step() {
            Ok(outcome) => {
                self.stats.ticks_executed += 1;
                self.observer.stepped(&self.instance, &outcome);
            }
            Err(err) => {
                self.stats.domain_faults += 1;
                warn!("'{}' tick failed: {err}", self.instance);
                self.observer.step_failed(&self.instance, &err);
            }
        }
        self.publish();
    }

    /// Applies every queued command without waiting.
    pub fn drain_commands(&mut self) {
        while let Ok(command) = self.commands.try_recv() {
            self.handle_command(command);
        }
    }

    pub fn handle_command(&mut self, command: OperatorCommand) {
        let tick_before = self.engine.tick();
        match self.engine.apply(command) {
            Ok(()) => {
                self.stats.commands_applied += 1;
                self.observer.command_applied(&self.instance, &command);
                // Detailed engines step inside the action.
                if self.engine.tick() != tick_before {
                    self.stats.ticks_executed += 1;
                }
            }
            Err(err) => {
                match err {
                    EngineError::Domain(_) => self.stats.domain_faults += 1,
                    EngineError::Input(_) => self.stats.rejected_commands += 1,
                }
                warn!("'{}' rejected `{command}`: {err}", self.instance);
                self.observer.command_rejected(&self.instance, &command, &err);
            }
        }
        self.publish();
    }

    fn publish(&self) {
        let mut reading = self.engine.snapshot();
        reading.ticks_skipped = self.stats.ticks_skipped;
        reading.domain_faults = self.stats.domain_faults;
        reading.rejected_commands = self.stats.rejected_commands;
        self.exchange.publish(reading);
    }

    pub fn instance(&self) -> &str {
        &self.instance
    }

    pub fn engine(&self) -> &CycleEngine {
        &self.engine
    }

    pub fn stats(&self) -> &TickStats {
        &self.stats
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }
}
