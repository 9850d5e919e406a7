//! Detailed refrigeration-cycle step.
//!
//! Pressures, flow, power, COP, superheat and subcooling are all derived from
//! compressor speed, valve opening, refrigerant charge and component
//! efficiencies; the system temperature then relaxes toward its target at a
//! rate set by the resulting cooling capacity.

use crate::alerts::AlertInputs;
use crate::config::CycleConfig;
use crate::error::{ensure_finite, ensure_nonzero, DomainError};
use crate::state::{CycleState, RefrigerantState};

/// Pressure every side of the circuit settles to at rest.
pub const EQUILIBRIUM_PRESSURE_BAR: f64 = 10.0;
/// Fraction of the remaining gap closed per stopped tick.
pub const EQUALIZATION_RATE: f64 = 0.1;
/// Per-tick warm-up while defrosting.
pub const DEFROST_RATE_C: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pressures {
    pub evaporator_bar: f64,
    pub condenser_bar: f64,
    pub compressor_bar: f64,
}

/// Operating point derived from the drivers of one running tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OperatingPoint {
    pub pressures: Pressures,
    pub refrigerant_flow: f64,
    pub power_consumption_w: f64,
    pub cooling_capacity_w: f64,
    pub cop: f64,
    pub superheat_c: f64,
    pub subcooling_c: f64,
}

pub fn pressures(state: &CycleState) -> Pressures {
    let rpm_factor = state.rpm_factor();
    let charge_factor = state.refrigerant_charge_pct / 100.0;
    let valve_factor = state.expansion_valve_opening_pct / 100.0;

    let evaporator = 4.0 + valve_factor * 2.0 - rpm_factor * 1.5;
    let condenser = 12.0 + rpm_factor * 8.0 - valve_factor * 2.0;
    let compressor =
        evaporator + (condenser - evaporator) * (state.compressor_efficiency_pct / 100.0);

    Pressures {
        evaporator_bar: evaporator * charge_factor,
        condenser_bar: condenser * charge_factor,
        compressor_bar: compressor * charge_factor,
    }
}

pub fn operating_point(state: &CycleState) -> Result<OperatingPoint, DomainError> {
    let rpm_factor = state.rpm_factor();
    let charge_factor = state.refrigerant_charge_pct / 100.0;
    let pressures = pressures(state);
    ensure_finite(pressures.evaporator_bar, "evaporator pressure")?;
    ensure_finite(pressures.condenser_bar, "condenser pressure")?;
    ensure_finite(pressures.compressor_bar, "compressor pressure")?;

    let pressure_diff = pressures.condenser_bar - pressures.evaporator_bar;
    let refrigerant_flow = rpm_factor * 100.0 * charge_factor * (pressure_diff / 10.0);

    let efficiency = ensure_nonzero(state.compressor_efficiency_pct, "compressor efficiency")?;
    let base_power = 200.0 + rpm_factor * 800.0;
    let power_consumption_w = base_power * (pressure_diff / 10.0) * (100.0 / efficiency);

    let cooling_capacity_w = refrigerant_flow * state.evaporator_efficiency_pct / 100.0 * 10.0;
    let cop = if power_consumption_w > 0.0 {
        cooling_capacity_w / power_consumption_w
    } else {
        0.0
    };

    let closed_valve = 100.0 - state.expansion_valve_opening_pct;
    let superheat_c = 5.0 + closed_valve / 20.0 - rpm_factor * 2.0;
    let subcooling_c = 3.0 + rpm_factor * 2.0 - closed_valve / 20.0;

    Ok(OperatingPoint {
        pressures,
        refrigerant_flow: ensure_finite(refrigerant_flow, "refrigerant flow")?,
        power_consumption_w: ensure_finite(power_consumption_w, "power consumption")?,
        cooling_capacity_w: ensure_finite(cooling_capacity_w, "cooling capacity")?,
        cop: ensure_finite(cop, "cop")?,
        superheat_c: ensure_finite(superheat_c, "superheat")?,
        subcooling_c: ensure_finite(subcooling_c, "subcooling")?,
    })
}

/// Next system temperature given the capacity delivered this tick.
pub fn next_temperature(
    state: &CycleState,
    cooling_capacity_w: f64,
    defrost_ceiling_c: Option<f64>,
) -> f64 {
    let temperature = state.system_temperature_c;
    if state.defrost_mode {
        let warmed = temperature + DEFROST_RATE_C;
        return match defrost_ceiling_c {
            // Never pull an already warmer system down to the ceiling.
            Some(ceiling) => warmed.min(ceiling.max(temperature)),
            None => warmed,
        };
    }
    if state.compressor_rpm <= 0.0 {
        return temperature;
    }
    let cooling_power = cooling_capacity_w / 1000.0 * 0.1;
    let ambient_effect = (state.ambient_temperature_c - temperature) * 0.01;
    temperature - (temperature - state.target_temperature_c) * cooling_power + ambient_effect
}

/// Functional update: one detailed tick from `prev`.
pub fn advance(prev: &CycleState, config: &CycleConfig) -> Result<CycleState, DomainError> {
    let mut next = prev.clone();

    if !prev.is_running {
        let relax = |p: f64| p + (EQUILIBRIUM_PRESSURE_BAR - p) * EQUALIZATION_RATE;
        next.compressor_pressure_bar = relax(prev.compressor_pressure_bar);
        next.condenser_pressure_bar = relax(prev.condenser_pressure_bar);
        next.evaporator_pressure_bar = relax(prev.evaporator_pressure_bar);
        next.refrigerant_flow = 0.0;
        next.power_consumption_w = 0.0;
        next.cop = 0.0;
        ensure_finite(next.condenser_pressure_bar, "condenser pressure")?;
        return Ok(next);
    }

    let point = operating_point(prev)?;
    let temperature = ensure_finite(
        next_temperature(prev, point.cooling_capacity_w, config.defrost_ceiling_c),
        "system temperature",
    )?;

    // Temperature alerts are judged on the temperature the tick started from.
    let alerts = config.thresholds.evaluate(&AlertInputs {
        condenser_pressure_bar: point.pressures.condenser_bar,
        evaporator_pressure_bar: point.pressures.evaporator_bar,
        system_temperature_c: prev.system_temperature_c,
        target_temperature_c: prev.target_temperature_c,
        superheat_c: point.superheat_c,
        subcooling_c: point.subcooling_c,
        power_consumption_w: point.power_consumption_w,
        refrigerant_charge_pct: prev.refrigerant_charge_pct,
    });

    next.compressor_pressure_bar = point.pressures.compressor_bar;
    next.condenser_pressure_bar = point.pressures.condenser_bar;
    next.evaporator_pressure_bar = point.pressures.evaporator_bar;
    next.refrigerant_flow = point.refrigerant_flow;
    next.power_consumption_w = point.power_consumption_w;
    next.cop = point.cop;
    next.superheat_c = point.superheat_c;
    next.subcooling_c = point.subcooling_c;
    next.refrigerant_state = RefrigerantState::standard_cycle();
    next.system_temperature_c = temperature;
    next.alerts = alerts;

    Ok(next)
}
