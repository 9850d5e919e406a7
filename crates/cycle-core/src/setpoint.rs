use serde::{Deserialize, Serialize};
use std::marker::PhantomData;
use thiserror::Error;

#[derive(Debug, Clone, Copy)]
pub struct Unvalidated;

#[derive(Debug, Clone, Copy)]
pub struct Validated;

/// Which operator input a value is destined for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetpointKind {
    CompressorRpm,
    TargetTemperature,
    AmbientTemperature,
    /// Any 0..100 % quantity: charge, valve opening, component efficiencies.
    Percent,
    /// Any 0..1 fraction: motor load, balance, friction.
    Fraction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputPolicy {
    /// Finite values reach the formulas untouched.
    #[default]
    PassThrough,
    /// Finite values are clamped into `InputLimits`.
    Clamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputLimits {
    pub compressor_rpm: Range,
    pub target_temperature_c: Range,
    pub ambient_temperature_c: Range,
    pub percent: Range,
    pub fraction: Range,
}

impl Default for InputLimits {
    fn default() -> Self {
        Self {
            compressor_rpm: Range::new(0.0, 3000.0),
            target_temperature_c: Range::new(-20.0, 10.0),
            ambient_temperature_c: Range::new(-20.0, 50.0),
            percent: Range::new(0.0, 100.0),
            fraction: Range::new(0.0, 1.0),
        }
    }
}

impl InputLimits {
    pub fn range(&self, kind: SetpointKind) -> Range {
        match kind {
            SetpointKind::CompressorRpm => self.compressor_rpm,
            SetpointKind::TargetTemperature => self.target_temperature_c,
            SetpointKind::AmbientTemperature => self.ambient_temperature_c,
            SetpointKind::Percent => self.percent,
            SetpointKind::Fraction => self.fraction,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum InputViolation {
    #[error("non-finite {kind:?} setpoint: {requested}")]
    NonFinite { kind: SetpointKind, requested: f64 },

    #[error("unknown operator command: {input}")]
    UnknownCommand { input: String },
}

#[derive(Debug, Clone, Copy)]
pub struct Setpoint<State = Unvalidated> {
    kind: SetpointKind,
    value: f64,
    _state: PhantomData<State>,
}

impl Setpoint<Unvalidated> {
    pub fn new(kind: SetpointKind, value: f64) -> Self {
        Self {
            kind,
            value,
            _state: PhantomData,
        }
    }

    /// Non-finite values are always rejected since NaN would survive every
    /// later tick. Finite values pass through or are clamped per `policy`.
    pub fn validate(
        self,
        limits: &InputLimits,
        policy: InputPolicy,
    ) -> Result<Setpoint<Validated>, InputViolation> {
        if !self.value.is_finite() {
            return Err(InputViolation::NonFinite {
                kind: self.kind,
                requested: self.value,
            });
        }

        let value = match policy {
            InputPolicy::PassThrough => self.value,
            InputPolicy::Clamp => limits.range(self.kind).clamp(self.value),
        };

        Ok(Setpoint {
            kind: self.kind,
            value,
            _state: PhantomData,
        })
    }
}

impl Setpoint<Validated> {
    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn kind(&self) -> SetpointKind {
        self.kind
    }
}
