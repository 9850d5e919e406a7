//! Line-oriented operator console.
//!
//! Each line is one command, optionally prefixed with `motor` to address the
//! motor bench instead of the refrigeration cycle:
//!
//! ```text
//! start | stop | toggle
//! target <c> | rpm <n> | defrost on|off
//! charge <pct> | valve <pct> | ambient <c>
//! efficiency compressor|condenser|evaporator <pct>
//! balance <v> | friction <mu>
//! status | help | quit
//! ```

use cycle_core::{Component, CycleReading, InputViolation, OperatorCommand};
use std::fmt::Write as _;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Refrigeration,
    Motor,
}

impl Target {
    pub fn instance(self) -> &'static str {
        match self {
            Target::Refrigeration => "refrigeration",
            Target::Motor => "motor",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    Engine {
        target: Target,
        command: OperatorCommand,
    },
    Status,
    Help,
    Quit,
}

pub const HELP: &str = "\
commands (prefix with `motor` for the motor bench):
  start | stop | toggle
  target <c> | rpm <n> | defrost on|off
  charge <pct> | valve <pct> | ambient <c>
  efficiency compressor|condenser|evaporator <pct>
  balance <v> | friction <mu>
  status | help | quit";

pub fn parse(line: &str) -> Result<ConsoleCommand, InputViolation> {
    let unknown = || InputViolation::UnknownCommand {
        input: line.trim().to_string(),
    };

    let mut words = line.split_whitespace().peekable();
    let target = if words.peek() == Some(&"motor") {
        words.next();
        Target::Motor
    } else {
        Target::Refrigeration
    };
    let args: Vec<&str> = words.collect();

    let number = |raw: &str| raw.parse::<f64>().map_err(|_| unknown());

    let command = match args.as_slice() {
        ["status"] if target == Target::Refrigeration => return Ok(ConsoleCommand::Status),
        ["help"] if target == Target::Refrigeration => return Ok(ConsoleCommand::Help),
        ["quit"] | ["exit"] if target == Target::Refrigeration => {
            return Ok(ConsoleCommand::Quit)
        }
        ["start"] => OperatorCommand::Start,
        ["stop"] => OperatorCommand::Stop,
        ["toggle"] => OperatorCommand::Toggle,
        ["target", v] => OperatorCommand::SetTargetTemperature(number(*v)?),
        ["rpm", v] => OperatorCommand::SetCompressorRpm(number(*v)?),
        ["defrost", "on"] => OperatorCommand::SetDefrostMode(true),
        ["defrost", "off"] => OperatorCommand::SetDefrostMode(false),
        ["charge", v] => OperatorCommand::SetRefrigerantCharge(number(*v)?),
        ["valve", v] => OperatorCommand::SetExpansionValveOpening(number(*v)?),
        ["ambient", v] => OperatorCommand::SetAmbientTemperature(number(*v)?),
        ["efficiency", component, v] => {
            let component = match *component {
                "compressor" => Component::Compressor,
                "condenser" => Component::Condenser,
                "evaporator" => Component::Evaporator,
                _ => return Err(unknown()),
            };
            OperatorCommand::SetEfficiency(component, number(*v)?)
        }
        ["balance", v] => OperatorCommand::SetMotorBalance(number(*v)?),
        ["friction", v] => OperatorCommand::SetFrictionCoefficient(number(*v)?),
        _ => return Err(unknown()),
    };

    Ok(ConsoleCommand::Engine { target, command })
}

/// One status line per instance, as printed by the `status` command.
pub fn status_line(instance: &str, reading: Option<&CycleReading>) -> String {
    let Some(r) = reading else {
        return format!("{instance}: no reading yet");
    };
    let mut line = format!(
        "{instance}: tick={} {} rpm={:.0} T={:.2}C target={:.1}C P(comp/cond/evap)={:.2}/{:.2}/{:.2}bar",
        r.tick,
        if r.is_running { "running" } else { "stopped" },
        r.compressor_rpm,
        r.system_temperature_c,
        r.target_temperature_c,
        r.compressor_pressure_bar,
        r.condenser_pressure_bar,
        r.evaporator_pressure_bar,
    );
    let _ = write!(
        line,
        " power={:.0}W cop={:.2} motor={:.1}C alarm={:?} alerts={}",
        r.power_consumption_w, r.cop, r.motor_temperature_c, r.alarm_level, r.active_alerts
    );
    if r.defrost_mode {
        line.push_str(" defrost");
    }
    line
}
