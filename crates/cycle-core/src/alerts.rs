use crate::state::{Alerts, MotorAlerts};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertThresholds {
    pub max_condenser_pressure_bar: f64,
    pub min_evaporator_pressure_bar: f64,
    /// Allowed overshoot of the system temperature above target.
    pub max_temperature_deviation_c: f64,
    pub freeze_temperature_c: f64,
    pub max_superheat_c: f64,
    pub min_superheat_c: f64,
    pub max_subcooling_c: f64,
    pub min_subcooling_c: f64,
    pub max_power_w: f64,
    pub min_refrigerant_charge_pct: f64,

    pub motor_warning_temp_c: f64,
    pub motor_critical_temp_c: f64,
    pub motor_max_power_w: f64,
    pub motor_max_rpm: f64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            max_condenser_pressure_bar: 18.0,
            min_evaporator_pressure_bar: 2.0,
            max_temperature_deviation_c: 10.0,
            freeze_temperature_c: -5.0,
            max_superheat_c: 10.0,
            min_superheat_c: 2.0,
            max_subcooling_c: 8.0,
            min_subcooling_c: 1.0,
            max_power_w: 1200.0,
            min_refrigerant_charge_pct: 70.0,
            motor_warning_temp_c: 70.0,
            motor_critical_temp_c: 80.0,
            motor_max_power_w: 1400.0,
            motor_max_rpm: 2800.0,
        }
    }
}

/// Values the cycle alerts are judged on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlertInputs {
    pub condenser_pressure_bar: f64,
    pub evaporator_pressure_bar: f64,
    pub system_temperature_c: f64,
    pub target_temperature_c: f64,
    pub superheat_c: f64,
    pub subcooling_c: f64,
    pub power_consumption_w: f64,
    pub refrigerant_charge_pct: f64,
}

impl AlertThresholds {
    pub fn evaluate(&self, inputs: &AlertInputs) -> Alerts {
        Alerts {
            high_pressure: inputs.condenser_pressure_bar > self.max_condenser_pressure_bar,
            low_pressure: inputs.evaporator_pressure_bar < self.min_evaporator_pressure_bar,
            high_temperature: inputs.system_temperature_c
                > inputs.target_temperature_c + self.max_temperature_deviation_c,
            frozen_evaporator: inputs.system_temperature_c < self.freeze_temperature_c,
            high_superheat: inputs.superheat_c > self.max_superheat_c,
            low_superheat: inputs.superheat_c < self.min_superheat_c,
            high_subcooling: inputs.subcooling_c > self.max_subcooling_c,
            low_subcooling: inputs.subcooling_c < self.min_subcooling_c,
            compressor_overload: inputs.power_consumption_w > self.max_power_w,
            low_refrigerant: inputs.refrigerant_charge_pct < self.min_refrigerant_charge_pct,
        }
    }

    pub fn evaluate_motor(&self, temperature_c: f64, power_w: f64, rpm: f64) -> MotorAlerts {
        MotorAlerts {
            overheat_warning: temperature_c > self.motor_warning_temp_c
                && temperature_c <= self.motor_critical_temp_c,
            overheat_critical: temperature_c > self.motor_critical_temp_c,
            high_power: power_w > self.motor_max_power_w,
            high_rpm: rpm > self.motor_max_rpm,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    HighPressure,
    LowPressure,
    HighTemperature,
    LowRefrigerant,
    HighSuperheat,
    LowSuperheat,
    HighSubcooling,
    LowSubcooling,
    CompressorOverload,
    FrozenEvaporator,
    MotorOverheatWarning,
    MotorOverheatCritical,
    MotorHighPower,
    MotorHighRpm,
}

impl AlertKind {
    pub fn is_critical(self) -> bool {
        matches!(
            self,
            AlertKind::CompressorOverload
                | AlertKind::HighPressure
                | AlertKind::FrozenEvaporator
                | AlertKind::MotorOverheatCritical
        )
    }
}

/// Every flag of both alert sets, paired with its kind.
pub fn flags(alerts: &Alerts, motor: &MotorAlerts) -> [(AlertKind, bool); 14] {
    [
        (AlertKind::HighPressure, alerts.high_pressure),
        (AlertKind::LowPressure, alerts.low_pressure),
        (AlertKind::HighTemperature, alerts.high_temperature),
        (AlertKind::LowRefrigerant, alerts.low_refrigerant),
        (AlertKind::HighSuperheat, alerts.high_superheat),
        (AlertKind::LowSuperheat, alerts.low_superheat),
        (AlertKind::HighSubcooling, alerts.high_subcooling),
        (AlertKind::LowSubcooling, alerts.low_subcooling),
        (AlertKind::CompressorOverload, alerts.compressor_overload),
        (AlertKind::FrozenEvaporator, alerts.frozen_evaporator),
        (AlertKind::MotorOverheatWarning, motor.overheat_warning),
        (AlertKind::MotorOverheatCritical, motor.overheat_critical),
        (AlertKind::MotorHighPower, motor.high_power),
        (AlertKind::MotorHighRpm, motor.high_rpm),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlarmLevel {
    #[default]
    Normal,
    Warning,
    Critical,
}

impl AlarmLevel {
    pub fn of(alerts: &Alerts, motor: &MotorAlerts) -> Self {
        flags(alerts, motor)
            .iter()
            .filter(|(_, active)| *active)
            .map(|(kind, _)| {
                if kind.is_critical() {
                    AlarmLevel::Critical
                } else {
                    AlarmLevel::Warning
                }
            })
            .max()
            .unwrap_or(AlarmLevel::Normal)
    }

    pub fn as_gauge(self) -> f64 {
        match self {
            AlarmLevel::Normal => 0.0,
            AlarmLevel::Warning => 1.0,
            AlarmLevel::Critical => 2.0,
        }
    }
}

pub fn active_count(alerts: &Alerts, motor: &MotorAlerts) -> usize {
    flags(alerts, motor).iter().filter(|(_, active)| *active).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nominal() -> AlertInputs {
        AlertInputs {
            condenser_pressure_bar: 15.0,
            evaporator_pressure_bar: 4.25,
            system_temperature_c: 5.0,
            target_temperature_c: 5.0,
            superheat_c: 6.5,
            subcooling_c: 1.5,
            power_consumption_w: 760.0,
            refrigerant_charge_pct: 100.0,
        }
    }

    #[test]
    fn nominal_point_raises_nothing() {
        let alerts = AlertThresholds::default().evaluate(&nominal());
        assert_eq!(alerts, Alerts::default());
    }

    #[test]
    fn condenser_pressure_threshold_is_strict() {
        let thresholds = AlertThresholds::default();
        let mut inputs = nominal();
        inputs.condenser_pressure_bar = 19.0;
        assert!(thresholds.evaluate(&inputs).high_pressure);
        inputs.condenser_pressure_bar = 17.0;
        assert!(!thresholds.evaluate(&inputs).high_pressure);
        inputs.condenser_pressure_bar = 18.0;
        assert!(!thresholds.evaluate(&inputs).high_pressure);
    }

    #[test]
    fn temperature_alerts_follow_target() {
        let thresholds = AlertThresholds::default();
        let mut inputs = nominal();
        inputs.system_temperature_c = 15.5;
        assert!(thresholds.evaluate(&inputs).high_temperature);
        inputs.system_temperature_c = -6.0;
        let alerts = thresholds.evaluate(&inputs);
        assert!(alerts.frozen_evaporator);
        assert!(!alerts.high_temperature);
    }

    #[test]
    fn low_charge_and_overload() {
        let mut inputs = nominal();
        inputs.refrigerant_charge_pct = 60.0;
        inputs.power_consumption_w = 1300.0;
        let alerts = AlertThresholds::default().evaluate(&inputs);
        assert!(alerts.low_refrigerant);
        assert!(alerts.compressor_overload);
    }

    #[test]
    fn motor_overheat_bands_are_exclusive() {
        let thresholds = AlertThresholds::default();
        let warm = thresholds.evaluate_motor(75.0, 500.0, 1200.0);
        assert!(warm.overheat_warning && !warm.overheat_critical);
        let hot = thresholds.evaluate_motor(85.0, 1500.0, 2900.0);
        assert!(!hot.overheat_warning && hot.overheat_critical);
        assert!(hot.high_power && hot.high_rpm);
    }

    #[test]
    fn alarm_level_picks_worst_flag() {
        let mut alerts = Alerts::default();
        let motor = MotorAlerts::default();
        assert_eq!(AlarmLevel::of(&alerts, &motor), AlarmLevel::Normal);
        alerts.low_superheat = true;
        assert_eq!(AlarmLevel::of(&alerts, &motor), AlarmLevel::Warning);
        alerts.high_pressure = true;
        assert_eq!(AlarmLevel::of(&alerts, &motor), AlarmLevel::Critical);
        assert_eq!(active_count(&alerts, &motor), 2);
    }
}
