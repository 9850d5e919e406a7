use serde::{Deserialize, Serialize};
use std::fmt;

/// Phase of the refrigerant at one boundary point of the cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefrigerantPhase {
    SuperheatedVapor,
    HighPressureSuperheatedVapor,
    SubcooledLiquid,
    LiquidVaporMixture,
}

impl fmt::Display for RefrigerantPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RefrigerantPhase::SuperheatedVapor => "superheated vapor",
            RefrigerantPhase::HighPressureSuperheatedVapor => "high-pressure superheated vapor",
            RefrigerantPhase::SubcooledLiquid => "subcooled liquid",
            RefrigerantPhase::LiquidVaporMixture => "liquid-vapor mixture",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefrigerantState {
    pub compressor_inlet: RefrigerantPhase,
    pub compressor_outlet: RefrigerantPhase,
    pub condenser_inlet: RefrigerantPhase,
    pub condenser_outlet: RefrigerantPhase,
    pub expansion_valve_inlet: RefrigerantPhase,
    pub expansion_valve_outlet: RefrigerantPhase,
    pub evaporator_inlet: RefrigerantPhase,
    pub evaporator_outlet: RefrigerantPhase,
}

impl RefrigerantState {
    /// Phases of a vapour-compression cycle at its design operating point.
    pub const fn standard_cycle() -> Self {
        use RefrigerantPhase::*;
        Self {
            compressor_inlet: SuperheatedVapor,
            compressor_outlet: HighPressureSuperheatedVapor,
            condenser_inlet: HighPressureSuperheatedVapor,
            condenser_outlet: SubcooledLiquid,
            expansion_valve_inlet: SubcooledLiquid,
            expansion_valve_outlet: LiquidVaporMixture,
            evaporator_inlet: LiquidVaporMixture,
            evaporator_outlet: SuperheatedVapor,
        }
    }
}

impl Default for RefrigerantState {
    fn default() -> Self {
        Self::standard_cycle()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Alerts {
    pub high_pressure: bool,
    pub low_pressure: bool,
    pub high_temperature: bool,
    pub low_refrigerant: bool,
    pub high_superheat: bool,
    pub low_superheat: bool,
    pub high_subcooling: bool,
    pub low_subcooling: bool,
    pub compressor_overload: bool,
    pub frozen_evaporator: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MotorAlerts {
    pub overheat_warning: bool,
    pub overheat_critical: bool,
    pub high_power: bool,
    pub high_rpm: bool,
}

/// Drive-motor side of the compressor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotorReadings {
    pub temperature_c: f64,
    pub efficiency_pct: f64,
    /// 0..1
    pub load: f64,
    /// 0..1, 1 being perfectly balanced.
    pub balance: f64,
    pub vibration_level: f64,
    /// Relative piston growth versus the 60 °C reference.
    pub thermal_expansion: f64,
    pub friction_coefficient: f64,
    pub alerts: MotorAlerts,
}

impl Default for MotorReadings {
    fn default() -> Self {
        Self {
            temperature_c: 45.0,
            efficiency_pct: 92.0,
            load: 0.5,
            balance: 0.9,
            vibration_level: 0.1,
            thermal_expansion: 0.0,
            friction_coefficient: 0.02,
            alerts: MotorAlerts::default(),
        }
    }
}

/// Full operating state of one simulated refrigeration cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleState {
    pub is_running: bool,
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

    pub refrigerant_type: String,
    pub refrigerant_charge_pct: f64,
    pub expansion_valve_opening_pct: f64,
    pub compressor_efficiency_pct: f64,
    pub condenser_efficiency_pct: f64,
    pub evaporator_efficiency_pct: f64,

    pub refrigerant_state: RefrigerantState,
    pub alerts: Alerts,
    pub defrost_mode: bool,
    pub motor: MotorReadings,
}

impl CycleState {
    /// Process-start defaults of the refrigeration cycle: stopped, at ambient.
    pub fn refrigeration_defaults() -> Self {
        Self {
            is_running: false,
            compressor_rpm: 0.0,
            system_temperature_c: 25.0,
            target_temperature_c: 5.0,
            ambient_temperature_c: 25.0,
            compressor_pressure_bar: 10.0,
            condenser_pressure_bar: 15.0,
            evaporator_pressure_bar: 4.0,
            refrigerant_flow: 0.0,
            power_consumption_w: 0.0,
            cop: 3.0,
            superheat_c: 5.0,
            subcooling_c: 3.0,
            refrigerant_type: "R-134a".to_string(),
            refrigerant_charge_pct: 100.0,
            expansion_valve_opening_pct: 50.0,
            compressor_efficiency_pct: 85.0,
            condenser_efficiency_pct: 90.0,
            evaporator_efficiency_pct: 90.0,
            refrigerant_state: RefrigerantState::standard_cycle(),
            alerts: Alerts::default(),
            defrost_mode: false,
            motor: MotorReadings::default(),
        }
    }

    /// Process-start defaults of the stand-alone motor bench.
    pub fn motor_defaults() -> Self {
        Self {
            system_temperature_c: 5.0,
            target_temperature_c: 2.0,
            compressor_pressure_bar: 12.5,
            condenser_pressure_bar: 18.2,
            evaporator_pressure_bar: 4.8,
            power_consumption_w: 750.0,
            ..Self::refrigeration_defaults()
        }
    }

    pub fn rpm_factor(&self) -> f64 {
        self.compressor_rpm / 3000.0
    }
}

impl Default for CycleState {
    fn default() -> Self {
        Self::refrigeration_defaults()
    }
}
