use serde::{Deserialize, Serialize};
use std::fmt;

/// Heat-exchange component whose efficiency can be adjusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Component {
    Compressor,
    Condenser,
    Evaporator,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Component::Compressor => "compressor",
            Component::Condenser => "condenser",
            Component::Evaporator => "evaporator",
        };
        f.write_str(name)
    }
}

/// Everything an operator may ask of an engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", content = "value", rename_all = "snake_case")]
pub enum OperatorCommand {
    Start,
    Stop,
    Toggle,
    SetTargetTemperature(f64),
    SetCompressorRpm(f64),
    SetDefrostMode(bool),
    SetRefrigerantCharge(f64),
    SetExpansionValveOpening(f64),
    SetAmbientTemperature(f64),
    SetEfficiency(Component, f64),
    SetMotorBalance(f64),
    SetFrictionCoefficient(f64),
}

impl OperatorCommand {
    /// Whether the command re-runs the step on detailed engines.
    pub fn is_setpoint(&self) -> bool {
        matches!(
            self,
            OperatorCommand::Start
                | OperatorCommand::Stop
                | OperatorCommand::Toggle
                | OperatorCommand::SetTargetTemperature(_)
                | OperatorCommand::SetCompressorRpm(_)
                | OperatorCommand::SetDefrostMode(_)
        )
    }
}

impl fmt::Display for OperatorCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperatorCommand::Start => write!(f, "start"),
            OperatorCommand::Stop => write!(f, "stop"),
            OperatorCommand::Toggle => write!(f, "toggle"),
            OperatorCommand::SetTargetTemperature(v) => write!(f, "target {v}"),
            OperatorCommand::SetCompressorRpm(v) => write!(f, "rpm {v}"),
            OperatorCommand::SetDefrostMode(on) => {
                write!(f, "defrost {}", if *on { "on" } else { "off" })
            }
            OperatorCommand::SetRefrigerantCharge(v) => write!(f, "charge {v}"),
            OperatorCommand::SetExpansionValveOpening(v) => write!(f, "valve {v}"),
            OperatorCommand::SetAmbientTemperature(v) => write!(f, "ambient {v}"),
            OperatorCommand::SetEfficiency(component, v) => {
                write!(f, "efficiency {component} {v}")
            }
            OperatorCommand::SetMotorBalance(v) => write!(f, "balance {v}"),
            OperatorCommand::SetFrictionCoefficient(v) => write!(f, "friction {v}"),
        }
    }
}
