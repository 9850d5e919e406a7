#[cfg(test)]
mod proptest_cycle {
    use crate::config::CycleConfig;
    use crate::cycle_model;
    use crate::history::{PerformanceHistory, PerformancePoint};
    use crate::kinematics::*;
    use crate::setpoint::*;
    use crate::state::CycleState;
    use proptest::prelude::*;
    use std::f64::consts::TAU;

    fn running_state(rpm: f64, charge: f64, valve: f64, efficiency: f64) -> CycleState {
        CycleState {
            is_running: true,
            compressor_rpm: rpm,
            refrigerant_charge_pct: charge,
            expansion_valve_opening_pct: valve,
            compressor_efficiency_pct: efficiency,
            ..CycleState::refrigeration_defaults()
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(2000))]

        // Property: top dead centre is the zero reference
        #[test]
        fn piston_at_tdc_is_zero(
            rod_length in 0.01f64..10.0,
            ratio in 0.0f64..=1.0,
        ) {
            let crank_radius = rod_length * ratio;
            let position = piston_position(0.0, crank_radius, rod_length).unwrap();
            prop_assert!(position.abs() < 1e-9, "position={}", position);
        }

        // Property: piston motion repeats every revolution
        #[test]
        fn piston_is_periodic(
            angle in -20.0f64..20.0,
            rod_length in 0.1f64..5.0,
            ratio in 0.0f64..=1.0,
            turns in -3i32..=3,
        ) {
            let crank_radius = rod_length * ratio;
            let a = piston_position(angle, crank_radius, rod_length).unwrap();
            let shifted = angle + f64::from(turns) * TAU;
            let b = piston_position(shifted, crank_radius, rod_length).unwrap();
            prop_assert!((a - b).abs() < 1e-6, "a={} b={}", a, b);
        }

        // Property: piston never leaves its stroke
        #[test]
        fn piston_stays_within_stroke(
            angle in 0.0f64..TAU,
            rod_length in 0.1f64..5.0,
            ratio in 0.0f64..=1.0,
        ) {
            let crank_radius = rod_length * ratio;
            let position = piston_position(angle, crank_radius, rod_length).unwrap();
            prop_assert!(position <= 1e-6);
            prop_assert!(position >= -2.0 * crank_radius - 1e-6);
        }

        // Property: a crank longer than the rod is reported, not NaN
        #[test]
        fn oversized_crank_is_a_domain_error(
            rod_length in 0.1f64..1.0,
            excess in 1.01f64..4.0,
        ) {
            let crank_radius = rod_length * excess;
            let result = piston_position(std::f64::consts::FRAC_PI_2, crank_radius, rod_length);
            let is_negative_radicand =
                matches!(result, Err(crate::error::DomainError::NegativeRadicand { .. }));
            prop_assert!(is_negative_radicand);
        }

        // Property: vibration grows with speed
        #[test]
        fn vibration_is_monotonic_in_rpm(
            rpm1 in 0.0f64..6000.0,
            delta in 0.0f64..6000.0,
            balance in 0.0f64..=1.0,
            load in 0.0f64..=1.0,
        ) {
            let rpm2 = rpm1 + delta;
            let low = vibration(rpm1, balance, load).amplitude;
            let high = vibration(rpm2, balance, load).amplitude;
            prop_assert!(high >= low, "low={} high={}", low, high);
        }

        // Property: no expansion at the reference temperature
        #[test]
        fn thermal_expansion_identity(
            size in -100.0f64..100.0,
            reference in -50.0f64..200.0,
            coefficient in 0.0f64..1e-3,
        ) {
            prop_assert_eq!(thermal_expansion(size, reference, reference, coefficient), size);
        }

        // Property: motor efficiency stays in its band
        #[test]
        fn efficiency_is_bounded(
            rpm in 0.0f64..=6000.0,
            temperature in 0.0f64..=150.0,
            load in 0.0f64..=1.0,
        ) {
            let e = efficiency(rpm, temperature, load);
            prop_assert!((50.0..=98.0).contains(&e), "efficiency={}", e);
        }

        // Property: stopped pressures converge monotonically on equilibrium
        #[test]
        fn shutdown_relaxes_toward_equilibrium(
            compressor in 0.0f64..30.0,
            condenser in 0.0f64..30.0,
            evaporator in 0.0f64..30.0,
        ) {
            let config = CycleConfig::default();
            let mut state = CycleState {
                compressor_pressure_bar: compressor,
                condenser_pressure_bar: condenser,
                evaporator_pressure_bar: evaporator,
                ..CycleState::refrigeration_defaults()
            };
            let gap = |s: &CycleState| {
                [
                    (s.compressor_pressure_bar - 10.0).abs(),
                    (s.condenser_pressure_bar - 10.0).abs(),
                    (s.evaporator_pressure_bar - 10.0).abs(),
                ]
            };
            for _ in 0..400 {
                let before = gap(&state);
                state = cycle_model::advance(&state, &config).unwrap();
                let after = gap(&state);
                for (b, a) in before.iter().zip(after.iter()) {
                    prop_assert!(a <= b);
                }
            }
            prop_assert!(gap(&state).iter().all(|g| *g < 1e-9));
        }

        // Property: COP is never negative and is zero without power
        #[test]
        fn cop_is_non_negative(
            rpm in 0.0f64..=3000.0,
            charge in 0.0f64..=100.0,
            valve in 0.0f64..=100.0,
            efficiency in 1.0f64..=100.0,
        ) {
            let state = running_state(rpm, charge, valve, efficiency);
            let point = cycle_model::operating_point(&state).unwrap();
            prop_assert!(point.cop >= 0.0);
            if point.power_consumption_w == 0.0 {
                prop_assert_eq!(point.cop, 0.0);
            }
        }

        // Property: running pressures keep evaporator < compressor <= condenser
        #[test]
        fn running_pressures_are_ordered(
            rpm in 0.0f64..=3000.0,
            charge in 1.0f64..=100.0,
            valve in 0.0f64..=100.0,
            efficiency in 1.0f64..99.0,
        ) {
            let state = running_state(rpm, charge, valve, efficiency);
            let next = cycle_model::advance(&state, &CycleConfig::default()).unwrap();
            prop_assert!(next.evaporator_pressure_bar < next.compressor_pressure_bar);
            prop_assert!(next.compressor_pressure_bar <= next.condenser_pressure_bar);
        }

        // Property: history keeps only the newest points, in order
        #[test]
        fn history_is_bounded(count in 0u64..100, capacity in 1usize..40) {
            let mut history = PerformanceHistory::new(capacity);
            let state = CycleState::default();
            for tick in 1..=count {
                history.push(PerformancePoint::capture(&state, tick, tick));
            }
            let expected = (count as usize).min(capacity);
            prop_assert_eq!(history.len(), expected);
            let ticks: Vec<u64> = history.iter().map(|p| p.tick).collect();
            let first = count + 1 - expected as u64;
            prop_assert_eq!(ticks, (first..=count).collect::<Vec<_>>());
        }

        // Property: finite input passes through untouched by default
        #[test]
        fn pass_through_preserves_value(value in -1e6f64..1e6) {
            let limits = InputLimits::default();
            let validated = Setpoint::new(SetpointKind::TargetTemperature, value)
                .validate(&limits, InputPolicy::PassThrough)
                .unwrap();
            prop_assert_eq!(validated.value(), value);
        }

        // Property: clamped input always lands inside its range
        #[test]
        fn clamp_stays_in_range(value in -1e6f64..1e6) {
            let limits = InputLimits::default();
            let validated = Setpoint::new(SetpointKind::CompressorRpm, value)
                .validate(&limits, InputPolicy::Clamp)
                .unwrap();
            prop_assert!((0.0..=3000.0).contains(&validated.value()));
        }
    }

    // Property: non-finite values are rejected under every policy
    #[test]
    fn non_finite_always_rejected() {
        let limits = InputLimits::default();
        for policy in [InputPolicy::PassThrough, InputPolicy::Clamp] {
            for value in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
                let result = Setpoint::new(SetpointKind::Percent, value).validate(&limits, policy);
                assert!(matches!(result, Err(InputViolation::NonFinite { .. })));
            }
        }
    }
}
