//! Crank-train animation driver.
//!
//! Feeds a renderer with per-frame kinematics. It only reads the rpm and
//! temperature it is handed and never touches a `CycleState`, so it may be
//! advanced any number of times between simulation ticks.

use crate::error::DomainError;
use crate::kinematics::{self, MachineElement, Vibration};
use std::f64::consts::TAU;

/// Interval of one inertia ramp step.
pub const RAMP_INTERVAL_S: f64 = 0.05;
const ACCELERATION_GAIN: f64 = 0.05;
const DECELERATION_GAIN: f64 = 0.1;
const SNAP_RPM: f64 = 5.0;
const GROWTH_REFERENCE_C: f64 = 25.0;
/// Cylinder wall grows slower than the piston.
const CYLINDER_EXPANSION_RATIO: f64 = 0.8;
const MAX_RAMP_STEPS_PER_FRAME: u32 = 200;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrankGeometry {
    pub crank_radius: f64,
    pub rod_length: f64,
    pub compression_ratio: f64,
    pub balance: f64,
    pub load: f64,
}

impl Default for CrankGeometry {
    fn default() -> Self {
        Self {
            crank_radius: 0.15,
            rod_length: 0.3,
            compression_ratio: 8.5,
            balance: 0.9,
            load: 0.5,
        }
    }
}

impl CrankGeometry {
    pub fn validate(self) -> Result<Self, DomainError> {
        let lengths_ok = self.crank_radius > 0.0
            && self.rod_length > 0.0
            && self.crank_radius <= self.rod_length;
        if lengths_ok {
            Ok(self)
        } else {
            Err(DomainError::InvalidGeometry {
                crank_radius: self.crank_radius,
                rod_length: self.rod_length,
            })
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ThermalGrowth {
    pub piston: f64,
    pub rotor: f64,
    pub cylinder: f64,
}

impl ThermalGrowth {
    pub fn at(temperature_c: f64) -> Self {
        let growth = |coefficient: f64| {
            kinematics::thermal_expansion(1.0, temperature_c, GROWTH_REFERENCE_C, coefficient) - 1.0
        };
        let piston = MachineElement::Piston.properties().thermal_expansion;
        Self {
            piston: growth(piston),
            rotor: growth(MachineElement::Rotor.properties().thermal_expansion),
            cylinder: growth(piston * CYLINDER_EXPANSION_RATIO),
        }
    }
}

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameSample {
    pub elapsed_s: f64,
    pub shaft_rpm: f64,
    pub crank_angle: f64,
    pub piston_position: f64,
    pub rod_angle: f64,
    pub piston_acceleration: f64,
    /// Atmospheres.
    pub cylinder_pressure: f64,
    pub vibration: Vibration,
    pub housing_offset: (f64, f64),
    pub thermal_growth: ThermalGrowth,
}

#[derive(Debug, Clone)]
pub struct CrankTrain {
    geometry: CrankGeometry,
    commanded_rpm: f64,
    shaft_rpm: f64,
    crank_angle: f64,
    elapsed_s: f64,
    ramp_accumulator_s: f64,
}

impl CrankTrain {
    pub fn new(geometry: CrankGeometry) -> Result<Self, DomainError> {
        Ok(Self {
            geometry: geometry.validate()?,
            commanded_rpm: 0.0,
            shaft_rpm: 0.0,
            crank_angle: 0.0,
            elapsed_s: 0.0,
            ramp_accumulator_s: 0.0,
        })
    }

    pub fn geometry(&self) -> &CrankGeometry {
        &self.geometry
    }

    pub fn shaft_rpm(&self) -> f64 {
        self.shaft_rpm
    }

    pub fn crank_angle(&self) -> f64 {
        self.crank_angle
    }

    /// Sets the rpm the shaft lags toward.
    pub fn command(&mut self, rpm: f64) {
        if rpm.is_finite() {
            self.commanded_rpm = rpm.max(0.0);
        }
    }

    /// One inertia step toward the commanded rpm.
    pub fn ramp_toward(&mut self) {
        let gap = self.commanded_rpm - self.shaft_rpm;
        if gap.abs() < SNAP_RPM {
            self.shaft_rpm = self.commanded_rpm;
            return;
        }
        let gain = if gap > 0.0 {
            ACCELERATION_GAIN
        } else {
            DECELERATION_GAIN
        };
        self.shaft_rpm += gap * gain;
    }

    /// Advances the animation by `dt` seconds at the given motor temperature.
    pub fn advance(&mut self, dt: f64, temperature_c: f64) -> Result<FrameSample, DomainError> {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        self.elapsed_s += dt;

        self.ramp_accumulator_s += dt;
        let mut steps = 0;
        while self.ramp_accumulator_s >= RAMP_INTERVAL_S && steps < MAX_RAMP_STEPS_PER_FRAME {
            self.ramp_toward();
            self.ramp_accumulator_s -= RAMP_INTERVAL_S;
            steps += 1;
        }
        if steps == MAX_RAMP_STEPS_PER_FRAME {
            self.ramp_accumulator_s = 0.0;
        }

        let omega = kinematics::rpm_to_rad_s(self.shaft_rpm);
        if self.shaft_rpm > 0.0 {
            self.crank_angle = (self.crank_angle + omega * dt).rem_euclid(TAU);
        }

        self.sample(omega, temperature_c)
    }

    fn sample(&self, omega: f64, temperature_c: f64) -> Result<FrameSample, DomainError> {
        let g = &self.geometry;
        let theta = self.crank_angle;
        let piston_position = kinematics::piston_position(theta, g.crank_radius, g.rod_length)?;
        // Map 0 (top) .. -2r (bottom) onto 1 .. -1.
        let normalized = 1.0 + piston_position / g.crank_radius;
        let vibration = kinematics::vibration(self.shaft_rpm, g.balance, g.load);
        let t = self.elapsed_s;

        Ok(FrameSample {
            elapsed_s: t,
            shaft_rpm: self.shaft_rpm,
            crank_angle: theta,
            piston_position,
            rod_angle: kinematics::connecting_rod_angle(theta, g.crank_radius, g.rod_length)?,
            piston_acceleration: kinematics::piston_acceleration(
                theta,
                omega,
                g.crank_radius,
                g.rod_length,
            )?,
            cylinder_pressure: kinematics::cylinder_pressure(
                normalized,
                temperature_c,
                g.compression_ratio,
            )?,
            housing_offset: (
                (t * vibration.frequency * 2.0).sin() * vibration.amplitude * 0.05,
                (t * vibration.frequency * 1.7).sin() * vibration.amplitude * 0.04,
            ),
            vibration,
            thermal_growth: ThermalGrowth::at(temperature_c),
        })
    }
}
