use cycle_core::{
    AlarmLevel, Component, CrankGeometry, CrankTrain, CycleConfig, CycleEngine, OperatorCommand,
};
use std::time::Duration;

#[test]
fn start_from_defaults_cools_toward_target() {
    let mut engine = CycleEngine::refrigeration();
    assert!(!engine.state().is_running);
    assert_eq!(engine.state().compressor_rpm, 0.0);

    engine.toggle_running().expect("start");
    assert!(engine.state().is_running);
    assert_eq!(engine.state().compressor_rpm, 1500.0);

    engine.step().expect("step");
    let s = engine.state();
    assert!(s.evaporator_pressure_bar < s.compressor_pressure_bar);
    assert!(s.compressor_pressure_bar <= s.condenser_pressure_bar);
    assert!((s.system_temperature_c - 5.0).abs() < 20.0);
}

#[test]
fn an_hour_of_running_stays_finite_and_converges() {
    let mut engine = CycleEngine::refrigeration();
    engine.toggle_running().unwrap();
    let mut previous_gap = (engine.state().system_temperature_c - 5.0).abs();
    for _ in 0..3600 {
        engine.step().unwrap();
        let gap = (engine.state().system_temperature_c - 5.0).abs();
        assert!(gap.is_finite());
        assert!(gap <= previous_gap + 1e-9);
        previous_gap = gap;
    }
    assert_eq!(engine.history().len(), 20);
    assert_eq!(engine.history().latest().map(|p| p.tick), Some(engine.tick()));
}

#[test]
fn shutdown_equalises_pressures() {
    let config = CycleConfig {
        settle_while_stopped: true,
        ..CycleConfig::default()
    };
    let mut engine = CycleEngine::new(config);
    engine.apply(OperatorCommand::Start).unwrap();
    engine.apply(OperatorCommand::Stop).unwrap();
    for _ in 0..300 {
        engine.advance(Duration::from_secs(1)).unwrap();
    }
    let s = engine.state();
    for p in [
        s.compressor_pressure_bar,
        s.condenser_pressure_bar,
        s.evaporator_pressure_bar,
    ] {
        assert!((p - 10.0).abs() < 1e-6, "pressure {p}");
    }
    assert_eq!(s.power_consumption_w, 0.0);
    assert_eq!(s.cop, 0.0);
}

#[test]
fn overdriven_compressor_raises_critical_alarm_once() {
    let mut engine = CycleEngine::refrigeration();
    engine.apply(OperatorCommand::Start).unwrap();
    engine.apply(OperatorCommand::SetCompressorRpm(3000.0)).unwrap();
    for _ in 0..5 {
        engine.step().unwrap();
    }
    assert_eq!(engine.alarm_level(), AlarmLevel::Critical);
    let high_pressure_raises = engine
        .journal()
        .events()
        .filter(|e| e.raised && e.kind == cycle_core::AlertKind::HighPressure)
        .count();
    assert_eq!(high_pressure_raises, 1);
}

#[test]
fn defrost_warms_to_the_ceiling_and_stops() {
    let mut engine = CycleEngine::refrigeration();
    engine.apply(OperatorCommand::Start).unwrap();
    for _ in 0..600 {
        engine.step().unwrap();
    }
    assert!(engine.state().system_temperature_c < 10.0);

    engine.apply(OperatorCommand::SetDefrostMode(true)).unwrap();
    for _ in 0..200 {
        engine.step().unwrap();
    }
    assert_eq!(engine.state().system_temperature_c, 10.0);
}

#[test]
fn broken_compressor_never_poisons_state() {
    let mut engine = CycleEngine::refrigeration();
    engine.apply(OperatorCommand::Start).unwrap();
    engine
        .apply(OperatorCommand::SetEfficiency(Component::Compressor, 0.0))
        .unwrap();
    let before = engine.state().clone();
    for _ in 0..3 {
        assert!(engine.step().is_err());
    }
    assert_eq!(engine.state(), &before);
    assert_eq!(engine.domain_faults(), 3);

    engine
        .apply(OperatorCommand::SetEfficiency(Component::Compressor, 85.0))
        .unwrap();
    engine.step().unwrap();
    assert!(engine.state().cop > 0.0);
}

#[test]
fn motor_bench_drives_the_crank_train() {
    let mut engine = CycleEngine::new(CycleConfig::motor().with_seed(7));
    let mut train = CrankTrain::new(CrankGeometry::default()).unwrap();
    engine.apply(OperatorCommand::Toggle).unwrap();

    for _ in 0..10 {
        engine.step().unwrap();
        train.command(engine.state().compressor_rpm);
        for _ in 0..60 {
            let frame = train
                .advance(1.0 / 60.0, engine.state().motor.temperature_c)
                .unwrap();
            assert!(frame.cylinder_pressure.is_finite());
        }
    }
    assert!(train.shaft_rpm() > 1100.0);
    assert!(engine.state().motor.temperature_c > 35.0);
}
