use crate::state::{CycleState, RefrigerantState};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

pub const DEFAULT_HISTORY_CAPACITY: usize = 20;

/// One charted sample, taken after a committed tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformancePoint {
    pub tick: u64,
    pub timestamp_ms: u64,
    pub compressor_rpm: f64,
    pub system_temperature_c: f64,
    pub target_temperature_c: f64,
    pub compressor_pressure_bar: f64,
    pub condenser_pressure_bar: f64,
    pub evaporator_pressure_bar: f64,
    pub power_consumption_w: f64,
    pub cop: f64,
    pub superheat_c: f64,
    pub subcooling_c: f64,
    pub motor_temperature_c: f64,
    pub motor_efficiency_pct: f64,
    pub refrigerant_state: RefrigerantState,
}

impl PerformancePoint {
    pub fn capture(state: &CycleState, tick: u64, timestamp_ms: u64) -> Self {
        Self {
            tick,
            timestamp_ms,
            compressor_rpm: state.compressor_rpm,
            system_temperature_c: state.system_temperature_c,
            target_temperature_c: state.target_temperature_c,
            compressor_pressure_bar: state.compressor_pressure_bar,
            condenser_pressure_bar: state.condenser_pressure_bar,
            evaporator_pressure_bar: state.evaporator_pressure_bar,
            power_consumption_w: state.power_consumption_w,
            cop: state.cop,
            superheat_c: state.superheat_c,
            subcooling_c: state.subcooling_c,
            motor_temperature_c: state.motor.temperature_c,
            motor_efficiency_pct: state.motor.efficiency_pct,
            refrigerant_state: state.refrigerant_state,
        }
    }
}

/// Append-only window over the most recent samples, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceHistory {
    points: VecDeque<PerformancePoint>,
    capacity: usize,
}

impl PerformanceHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            points: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends `point`, returning the evicted oldest sample when full.
    pub fn push(&mut self, point: PerformancePoint) -> Option<PerformancePoint> {
        let evicted = if self.points.len() == self.capacity {
            self.points.pop_front()
        } else {
            None
        };
        self.points.push_back(point);
        evicted
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn latest(&self) -> Option<&PerformancePoint> {
        self.points.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PerformancePoint> {
        self.points.iter()
    }

    pub fn to_vec(&self) -> Vec<PerformancePoint> {
        self.points.iter().copied().collect()
    }
}

impl Default for PerformanceHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}
