use crate::sync::CycleReading;

/// A published process value: its short key, exported metric name and the
/// accessor that reads it from a `CycleReading`.
#[derive(Debug, Clone, Copy)]
pub struct Tag {
    pub key: &'static str,
    pub metric: &'static str,
    pub help: &'static str,
    pub read: fn(&CycleReading) -> f64,
}

pub const COMPRESSOR_RPM: Tag = Tag {
    key: "compressor_rpm",
    metric: "cycle_compressor_rpm",
    help: "Compressor drive speed in RPM",
    read: |r| r.compressor_rpm,
};

pub const SYSTEM_TEMP_C: Tag = Tag {
    key: "system_temp_c",
    metric: "cycle_system_temperature_celsius",
    help: "Cooled space temperature in Celsius",
    read: |r| r.system_temperature_c,
};

pub const TARGET_TEMP_C: Tag = Tag {
    key: "target_temp_c",
    metric: "cycle_target_temperature_celsius",
    help: "Operator target temperature in Celsius",
    read: |r| r.target_temperature_c,
};

pub const AMBIENT_TEMP_C: Tag = Tag {
    key: "ambient_temp_c",
    metric: "cycle_ambient_temperature_celsius",
    help: "Ambient temperature in Celsius",
    read: |r| r.ambient_temperature_c,
};

pub const COMPRESSOR_PRESSURE_BAR: Tag = Tag {
    key: "compressor_pressure_bar",
    metric: "cycle_compressor_pressure_bar",
    help: "Compressor discharge pressure in bar",
    read: |r| r.compressor_pressure_bar,
};

pub const CONDENSER_PRESSURE_BAR: Tag = Tag {
    key: "condenser_pressure_bar",
    metric: "cycle_condenser_pressure_bar",
    help: "Condenser pressure in bar",
    read: |r| r.condenser_pressure_bar,
};

pub const EVAPORATOR_PRESSURE_BAR: Tag = Tag {
    key: "evaporator_pressure_bar",
    metric: "cycle_evaporator_pressure_bar",
    help: "Evaporator pressure in bar",
    read: |r| r.evaporator_pressure_bar,
};

pub const REFRIGERANT_FLOW: Tag = Tag {
    key: "refrigerant_flow",
    metric: "cycle_refrigerant_flow",
    help: "Relative refrigerant mass flow",
    read: |r| r.refrigerant_flow,
};

pub const POWER_W: Tag = Tag {
    key: "power_w",
    metric: "cycle_power_consumption_watts",
    help: "Compressor electrical power in watts",
    read: |r| r.power_consumption_w,
};

pub const COP: Tag = Tag {
    key: "cop",
    metric: "cycle_cop",
    help: "Coefficient of performance",
    read: |r| r.cop,
};

pub const SUPERHEAT_C: Tag = Tag {
    key: "superheat_c",
    metric: "cycle_superheat_celsius",
    help: "Evaporator outlet superheat in Celsius",
    read: |r| r.superheat_c,
};

pub const SUBCOOLING_C: Tag = Tag {
    key: "subcooling_c",
    metric: "cycle_subcooling_celsius",
    help: "Condenser outlet subcooling in Celsius",
    read: |r| r.subcooling_c,
};

pub const MOTOR_TEMP_C: Tag = Tag {
    key: "motor_temp_c",
    metric: "cycle_motor_temperature_celsius",
    help: "Drive motor temperature in Celsius",
    read: |r| r.motor_temperature_c,
};

pub const ALARM_LEVEL: Tag = Tag {
    key: "alarm_level",
    metric: "cycle_alarm_level",
    help: "Aggregate alarm level (0=normal,1=warning,2=critical)",
    read: |r| r.alarm_level.as_gauge(),
};

pub const ACTIVE_ALERTS: Tag = Tag {
    key: "active_alerts",
    metric: "cycle_active_alerts",
    help: "Number of alert flags currently set",
    read: |r| f64::from(r.active_alerts),
};

pub const RUNNING: Tag = Tag {
    key: "running",
    metric: "cycle_running",
    help: "Run state (1=running, 0=stopped)",
    read: |r| if r.is_running { 1.0 } else { 0.0 },
};

/// Every tag exported as a gauge.
pub const READING_TAGS: &[Tag] = &[
    COMPRESSOR_RPM,
    SYSTEM_TEMP_C,
    TARGET_TEMP_C,
    AMBIENT_TEMP_C,
    COMPRESSOR_PRESSURE_BAR,
    CONDENSER_PRESSURE_BAR,
    EVAPORATOR_PRESSURE_BAR,
    REFRIGERANT_FLOW,
    POWER_W,
    COP,
    SUPERHEAT_C,
    SUBCOOLING_C,
    MOTOR_TEMP_C,
    ALARM_LEVEL,
    ACTIVE_ALERTS,
    RUNNING,
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::AlarmLevel;
    use std::collections::HashSet;

    #[test]
    fn keys_and_metrics_are_unique() {
        let keys: HashSet<_> = READING_TAGS.iter().map(|t| t.key).collect();
        let metrics: HashSet<_> = READING_TAGS.iter().map(|t| t.metric).collect();
        assert_eq!(keys.len(), READING_TAGS.len());
        assert_eq!(metrics.len(), READING_TAGS.len());
        assert!(READING_TAGS.iter().all(|t| t.metric.starts_with("cycle_")));
    }

    #[test]
    fn accessors_read_the_right_field() {
        let reading = CycleReading {
            is_running: true,
            condenser_pressure_bar: 19.0,
            alarm_level: AlarmLevel::Critical,
            ..CycleReading::default()
        };
        assert_eq!((CONDENSER_PRESSURE_BAR.read)(&reading), 19.0);
        assert_eq!((RUNNING.read)(&reading), 1.0);
        assert_eq!((ALARM_LEVEL.read)(&reading), 2.0);
    }
}
