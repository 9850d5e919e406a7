//! Simple motor-bench step.
//!
//! Pressures are read off independent noisy curves instead of the coupled
//! cycle; the system temperature drifts toward target with a capped
//! proportional correction. The noise source is injected so runs replay.

use crate::config::CycleConfig;
use crate::error::{ensure_finite, DomainError};
use crate::kinematics::{self, MachineElement};
use crate::state::CycleState;
use rand::Rng;

/// Ceiling the defrost warm-up never crosses on the bench.
pub const BENCH_DEFROST_CEILING_C: f64 = 5.0;
pub const BENCH_DEFROST_RATE_C: f64 = 0.5;
/// Largest correction applied in one tick.
pub const MAX_CORRECTION_C: f64 = 0.5;

/// Piston growth is measured against this temperature.
const EXPANSION_REFERENCE_C: f64 = 60.0;

fn symmetric<R: Rng + ?Sized>(rng: &mut R, half_width: f64) -> f64 {
    rng.gen_range(-half_width..half_width)
}

fn upward<R: Rng + ?Sized>(rng: &mut R, width: f64) -> f64 {
    rng.gen_range(0.0..width)
}

/// Share of full load the motor carries, from temperature error and speed.
pub fn motor_load(state: &CycleState) -> f64 {
    if !state.is_running || state.compressor_rpm == 0.0 {
        return 0.0;
    }
    let temp_diff = (state.system_temperature_c - state.target_temperature_c).abs();
    let based_on_temp = (temp_diff / 15.0).min(1.0);
    let based_on_rpm = state.compressor_rpm / 3000.0;
    (based_on_temp * 0.7 + based_on_rpm * 0.3).min(1.0)
}

fn next_temperature<R: Rng + ?Sized>(state: &CycleState, rng: &mut R) -> f64 {
    let temperature = state.system_temperature_c;
    if state.defrost_mode {
        return BENCH_DEFROST_CEILING_C.min(temperature + BENCH_DEFROST_RATE_C);
    }
    if state.compressor_rpm <= 0.0 {
        return temperature;
    }
    let diff = temperature - state.target_temperature_c;
    let correction = -(diff.abs() * 0.1).min(MAX_CORRECTION_C) * sign(diff);
    temperature + correction + symmetric(rng, 0.2)
}

/// Functional update: one bench tick from `prev`.
pub fn advance<R: Rng + ?Sized>(
    prev: &CycleState,
    config: &CycleConfig,
    rng: &mut R,
) -> Result<CycleState, DomainError> {
    let mut next = prev.clone();
    let rpm_factor = prev.rpm_factor();

    next.system_temperature_c =
        ensure_finite(next_temperature(prev, rng), "system temperature")?;

    next.compressor_pressure_bar = ensure_finite(
        12.5 + rpm_factor * 5.0 + symmetric(rng, 0.25),
        "compressor pressure",
    )?;
    next.condenser_pressure_bar = ensure_finite(
        18.2 + rpm_factor * 4.0 + symmetric(rng, 0.3),
        "condenser pressure",
    )?;
    next.evaporator_pressure_bar = ensure_finite(
        4.8 - rpm_factor * 2.0 + symmetric(rng, 0.2),
        "evaporator pressure",
    )?;

    if prev.is_running && prev.compressor_rpm > 0.0 {
        next.motor.temperature_c = 35.0 + rpm_factor * 50.0 + upward(rng, 5.0);
        next.power_consumption_w = 200.0 + rpm_factor * 1200.0 + upward(rng, 50.0);
        next.motor.efficiency_pct =
            95.0 - (prev.compressor_rpm / 6000.0) * 10.0 + upward(rng, 2.0);
    }

    let motor = &mut next.motor;
    motor.load = motor_load(prev);
    motor.vibration_level =
        kinematics::vibration(prev.compressor_rpm, motor.balance, motor.load).amplitude;
    motor.thermal_expansion = kinematics::thermal_expansion(
        1.0,
        motor.temperature_c,
        EXPANSION_REFERENCE_C,
        MachineElement::Piston.properties().thermal_expansion,
    ) - 1.0;
    ensure_finite(motor.vibration_level, "vibration level")?;
    ensure_finite(motor.thermal_expansion, "thermal expansion")?;

    motor.alerts = config.thresholds.evaluate_motor(
        motor.temperature_c,
        next.power_consumption_w,
        prev.compressor_rpm,
    );
    next.alerts.high_temperature = prev.system_temperature_c
        > prev.target_temperature_c + config.thresholds.max_temperature_deviation_c;

    Ok(next)
}

fn sign(value: f64) -> f64 {
    if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        0.0
    }
}
