use crate::alerts::AlarmLevel;
use std::sync::{PoisonError, RwLock};

/// Copyable summary of one engine, published after every committed change.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CycleReading {
    pub timestamp_us: u64,
    pub tick: u64,
    pub is_running: bool,
    pub defrost_mode: bool,
    pub compressor_rpm: f64,
    pub system_temperature_c: f64,
    pub target_temperature_c: f64,
    pub ambient_temperature_c: f64,
    pub compressor_pressure_bar: f64,
    pub condenser_pressure_bar: f64,
    pub evaporator_pressure_bar: f64,
    pub refrigerant_flow: f64,
    pub power_consumption_w: f64,
    pub cop: f64,
    pub superheat_c: f64,
    pub subcooling_c: f64,
    pub motor_temperature_c: f64,
    pub motor_efficiency_pct: f64,
    pub vibration_level: f64,
    pub alarm_level: AlarmLevel,
    pub active_alerts: u32,
    pub ticks_skipped: u64,
    pub domain_faults: u64,
    pub rejected_commands: u64,
}

/// Single-writer, many-reader hand-off of the latest reading.
///
/// The lock is held for exactly one copy of a `CycleReading`; a half-written
/// reading is never visible.
pub struct StateExchange {
    reading: RwLock<CycleReading>,
}

impl StateExchange {
    pub fn new() -> Self {
        Self {
            reading: RwLock::new(CycleReading::default()),
        }
    }

    /// Called by the tick driver.
    pub fn publish(&self, reading: CycleReading) {
        *self.reading.write().unwrap_or_else(PoisonError::into_inner) = reading;
    }

    /// Called by telemetry and the console.
    pub fn latest(&self) -> CycleReading {
        *self.reading.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// `None` until the first publish.
    pub fn latest_published(&self) -> Option<CycleReading> {
        let reading = self.latest();
        (reading.timestamp_us != 0).then_some(reading)
    }
}

impl Default for StateExchange {
    fn default() -> Self {
        Self::new()
    }
}
