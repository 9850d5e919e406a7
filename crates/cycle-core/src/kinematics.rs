//! Closed-form mechanics of the hermetic compressor.
//!
//! Every function here is pure: no state, no clock, no randomness. The
//! renderer calls them per frame and the engine calls them per tick, so the
//! numeric forms must stay exactly as written.

use crate::error::{ensure_nonzero, DomainError};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// kg/m³ at sea level.
pub const AIR_DENSITY: f64 = 1.225;

/// Reference temperature for the cylinder-pressure temperature factor, in kelvin.
const REFERENCE_KELVIN: f64 = 293.15;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vibration {
    pub amplitude: f64,
    pub frequency: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComponentProperties {
    /// kg
    pub mass: f64,
    /// kg·m²
    pub moment_of_inertia: f64,
    pub friction: f64,
    pub elasticity: f64,
    /// 1/K
    pub thermal_expansion: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MachineElement {
    Rotor,
    Piston,
    Crankshaft,
    Flywheel,
    Fan,
    Gearbox,
}

impl MachineElement {
    pub const ALL: [MachineElement; 6] = [
        MachineElement::Rotor,
        MachineElement::Piston,
        MachineElement::Crankshaft,
        MachineElement::Flywheel,
        MachineElement::Fan,
        MachineElement::Gearbox,
    ];

    pub fn properties(self) -> ComponentProperties {
        match self {
            MachineElement::Rotor => ComponentProperties {
                mass: 5.0,
                moment_of_inertia: 0.12,
                friction: 0.02,
                elasticity: 0.3,
                thermal_expansion: 1.2e-5,
            },
            MachineElement::Piston => ComponentProperties {
                mass: 0.8,
                moment_of_inertia: 0.005,
                friction: 0.15,
                elasticity: 0.2,
                thermal_expansion: 2.3e-5,
            },
            MachineElement::Crankshaft => ComponentProperties {
                mass: 3.2,
                moment_of_inertia: 0.08,
                friction: 0.03,
                elasticity: 0.25,
                thermal_expansion: 1.1e-5,
            },
            MachineElement::Flywheel => ComponentProperties {
                mass: 8.5,
                moment_of_inertia: 0.42,
                friction: 0.01,
                elasticity: 0.1,
                thermal_expansion: 1.0e-5,
            },
            MachineElement::Fan => ComponentProperties {
                mass: 0.6,
                moment_of_inertia: 0.03,
                friction: 0.05,
                elasticity: 0.4,
                thermal_expansion: 2.5e-5,
            },
            MachineElement::Gearbox => ComponentProperties {
                mass: 4.5,
                moment_of_inertia: 0.15,
                friction: 0.04,
                elasticity: 0.2,
                thermal_expansion: 1.3e-5,
            },
        }
    }
}

pub fn rpm_to_rad_s(rpm: f64) -> f64 {
    rpm * 2.0 * PI / 60.0
}

/// Slider-crank piston offset from top dead centre (0 at θ = 0, negative below).
pub fn piston_position(
    crank_angle: f64,
    crank_radius: f64,
    rod_length: f64,
) -> Result<f64, DomainError> {
    let lateral = crank_angle.sin() * crank_radius;
    let radicand = rod_length.powi(2) - lateral.powi(2);
    if radicand < 0.0 {
        return Err(DomainError::NegativeRadicand {
            what: "piston_position",
            value: radicand,
        });
    }
    Ok(crank_angle.cos() * crank_radius + radicand.sqrt() - (rod_length + crank_radius))
}

pub fn piston_acceleration(
    crank_angle: f64,
    angular_velocity: f64,
    crank_radius: f64,
    rod_length: f64,
) -> Result<f64, DomainError> {
    let ratio = crank_radius / ensure_nonzero(rod_length, "piston_acceleration rod length")?;
    Ok(crank_radius
        * angular_velocity.powi(2)
        * (crank_angle.cos() + ratio * (2.0 * crank_angle).cos()))
}

/// Connecting-rod inclination from the cylinder axis.
pub fn connecting_rod_angle(
    crank_angle: f64,
    crank_radius: f64,
    rod_length: f64,
) -> Result<f64, DomainError> {
    let ratio =
        crank_radius * crank_angle.sin() / ensure_nonzero(rod_length, "connecting_rod_angle")?;
    if ratio.abs() > 1.0 {
        return Err(DomainError::InvalidGeometry {
            crank_radius,
            rod_length,
        });
    }
    Ok(ratio.asin())
}

pub fn torque(rpm: f64, load: f64, temperature: f64, cylinder_pressure: f64) -> f64 {
    let temperature_factor = 1.0 - (temperature - 60.0) / 200.0;
    let base_torque = cylinder_pressure * load / 10.0;
    base_torque * temperature_factor * (1.0 - (rpm / 6000.0) * 0.2)
}

/// `balance` is 0..1, 1 being perfectly balanced.
pub fn vibration(rpm: f64, balance: f64, load: f64) -> Vibration {
    let base_amplitude = (1.0 - balance) * 0.01;
    let load_factor = 1.0 + load * 0.5;
    let rpm_factor = (rpm / 3000.0).powi(2);

    Vibration {
        amplitude: base_amplitude * load_factor * rpm_factor,
        frequency: rpm / 60.0,
    }
}

/// Linear expansion; shrinks below `initial_size` when colder than the reference.
pub fn thermal_expansion(
    initial_size: f64,
    temperature: f64,
    reference_temperature: f64,
    coefficient: f64,
) -> f64 {
    initial_size * (1.0 + coefficient * (temperature - reference_temperature))
}

pub fn friction_resistance(velocity: f64, friction_coefficient: f64, normal_force: f64) -> f64 {
    friction_coefficient * normal_force * sign(velocity)
}

/// Seconds needed to spin from `initial_rpm` to `target_rpm` under constant torque.
pub fn acceleration_time(
    initial_rpm: f64,
    target_rpm: f64,
    moment_of_inertia: f64,
    torque: f64,
) -> Result<f64, DomainError> {
    let torque = ensure_nonzero(torque, "acceleration_time torque")?;
    let initial_omega = rpm_to_rad_s(initial_rpm);
    let target_omega = rpm_to_rad_s(target_rpm);
    Ok(moment_of_inertia * (target_omega - initial_omega) / torque)
}

/// Motor efficiency in percent, peaking around 60-80 °C, 2000 rpm and 75 % load.
pub fn efficiency(rpm: f64, temperature: f64, load: f64) -> f64 {
    let mut efficiency = 90.0;

    if temperature < 60.0 {
        efficiency -= (60.0 - temperature) * 0.3;
    } else if temperature > 80.0 {
        efficiency -= (temperature - 80.0) * 0.5;
    }

    let rpm_factor = 1.0 - (rpm - 2000.0).abs() / 2000.0;
    efficiency *= 0.8 + rpm_factor * 0.2;

    let load_factor = 1.0 - (load - 0.75).abs() / 0.75;
    efficiency *= 0.9 + load_factor * 0.1;

    efficiency.clamp(50.0, 98.0)
}

/// Cylinder pressure in atmospheres. `piston_position` is normalised so that
/// -1 is bottom dead centre and 1 is top dead centre.
pub fn cylinder_pressure(
    piston_position: f64,
    temperature: f64,
    compression_ratio: f64,
) -> Result<f64, DomainError> {
    let normalized_position = (piston_position + 1.0) / 2.0;
    let relative_volume = 1.0 + (compression_ratio - 1.0) * (1.0 - normalized_position);
    let relative_volume = ensure_nonzero(relative_volume, "cylinder_pressure volume")?;

    let base_pressure = 1.0;
    let pressure = base_pressure * compression_ratio / relative_volume;
    let temperature_factor = (temperature + 273.15) / REFERENCE_KELVIN;

    Ok(pressure * temperature_factor)
}

/// Aerodynamic drag torque on a rotor tip of the given radius.
pub fn air_resistance_torque(angular_velocity: f64, radius: f64, drag_coefficient: f64) -> f64 {
    let tangential_velocity = angular_velocity * radius;
    let drag_force = 0.5 * AIR_DENSITY * tangential_velocity.powi(2) * drag_coefficient;
    drag_force * radius
}

/// Fourier conduction.
pub fn heat_transfer(
    temperature_difference: f64,
    thermal_conductivity: f64,
    contact_area: f64,
    distance: f64,
) -> Result<f64, DomainError> {
    let distance = ensure_nonzero(distance, "heat_transfer distance")?;
    Ok(thermal_conductivity * contact_area * temperature_difference / distance)
}

// f64::signum maps ±0 to ±1; friction at rest must be zero.
fn sign(value: f64) -> f64 {
    if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        value
    }
}
