use crate::alerts::AlertThresholds;
use crate::history::DEFAULT_HISTORY_CAPACITY;
use crate::setpoint::{InputLimits, InputPolicy};
use serde::{de, Deserialize, Deserializer, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fidelity {
    /// Coupled pressure/flow/power/temperature refrigeration model.
    Detailed,
    /// Loose motor-bench model with independent noisy pressures.
    Simple,
}

impl Fidelity {
    /// Rpm applied when the operator starts the machine.
    pub fn start_rpm(self) -> f64 {
        match self {
            Fidelity::Detailed => 1500.0,
            Fidelity::Simple => 1200.0,
        }
    }

    /// Whether operator actions re-run the step immediately.
    pub fn steps_on_action(self) -> bool {
        matches!(self, Fidelity::Detailed)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CycleConfig {
    pub fidelity: Fidelity,
    pub seed: u64,
    pub tick_period_ms: u64,
    pub history_capacity: usize,
    pub input_policy: InputPolicy,
    pub input_limits: InputLimits,
    /// Upper bound of the defrost warm-up ramp; `None` lets it grow unbounded.
    pub defrost_ceiling_c: Option<f64>,
    /// Keep ticking while stopped so pressures visibly equalise.
    pub settle_while_stopped: bool,
    pub thresholds: AlertThresholds,
    pub journal_capacity: usize,
    pub journal_dedupe_ms: u64,
}

impl CycleConfig {
    pub fn refrigeration() -> Self {
        Self::default()
    }

    pub fn motor() -> Self {
        Self {
            fidelity: Fidelity::Simple,
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms.max(1))
    }
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            fidelity: Fidelity::Detailed,
            seed: 0x5eed_c01d,
            tick_period_ms: 1000,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            input_policy: InputPolicy::PassThrough,
            input_limits: InputLimits::default(),
            defrost_ceiling_c: Some(10.0),
            settle_while_stopped: false,
            thresholds: AlertThresholds::default(),
            journal_capacity: 10,
            journal_dedupe_ms: 10_000,
        }
    }
}

/// Both simulated instances, as loaded from a JSON file.
///
/// Fields missing from a slot take that slot's own defaults: a `motor` block
/// without `fidelity` stays on the simple motor-bench model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub refrigeration: CycleConfig,
    #[serde(deserialize_with = "motor_slot")]
    pub motor: CycleConfig,
}

fn motor_slot<'de, D>(deserializer: D) -> Result<CycleConfig, D::Error>
where
    D: Deserializer<'de>,
{
    let mut raw = serde_json::Value::deserialize(deserializer)?;
    let slot = raw
        .as_object_mut()
        .ok_or_else(|| <D::Error as de::Error>::custom("motor config must be an object"))?;
    let simple =
        serde_json::to_value(Fidelity::Simple).map_err(<D::Error as de::Error>::custom)?;
    slot.entry("fidelity").or_insert(simple);
    serde_json::from_value(raw).map_err(de::Error::custom)
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            refrigeration: CycleConfig::refrigeration(),
            motor: CycleConfig::motor(),
        }
    }
}

impl SimulationConfig {
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_fills_defaults() {
        let cfg = SimulationConfig::from_json(
            r#"{ "refrigeration": { "seed": 7, "input_policy": "clamp", "defrost_ceiling_c": null } }"#,
        )
        .unwrap();
        assert_eq!(cfg.refrigeration.seed, 7);
        assert_eq!(cfg.refrigeration.input_policy, InputPolicy::Clamp);
        assert_eq!(cfg.refrigeration.defrost_ceiling_c, None);
        assert_eq!(cfg.refrigeration.fidelity, Fidelity::Detailed);
        assert_eq!(cfg.motor.fidelity, Fidelity::Simple);
        assert_eq!(cfg.motor.history_capacity, 20);
    }

    #[test]
    fn partial_motor_block_keeps_simple_fidelity() {
        let cfg = SimulationConfig::from_json(r#"{ "motor": { "seed": 3 } }"#).unwrap();
        assert_eq!(cfg.motor.fidelity, Fidelity::Simple);
        assert_eq!(cfg.motor.seed, 3);
        assert_eq!(cfg.motor, CycleConfig::motor().with_seed(3));
        assert_eq!(cfg.refrigeration, CycleConfig::refrigeration());
    }

    #[test]
    fn motor_block_may_opt_into_detailed() {
        let cfg =
            SimulationConfig::from_json(r#"{ "motor": { "fidelity": "detailed" } }"#).unwrap();
        assert_eq!(cfg.motor.fidelity, Fidelity::Detailed);
    }

    #[test]
    fn motor_block_must_be_an_object() {
        assert!(SimulationConfig::from_json(r#"{ "motor": 5 }"#).is_err());
    }

    #[test]
    fn fidelity_profiles() {
        assert_eq!(Fidelity::Detailed.start_rpm(), 1500.0);
        assert_eq!(Fidelity::Simple.start_rpm(), 1200.0);
        assert!(Fidelity::Detailed.steps_on_action());
        assert!(!Fidelity::Simple.steps_on_action());
    }
}
