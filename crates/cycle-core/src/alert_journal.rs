use crate::alerts::{self, AlarmLevel, AlertKind};
use crate::state::{Alerts, MotorAlerts};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub tick: u64,
    pub timestamp_ms: u64,
    pub kind: AlertKind,
    /// `true` on the rising edge, `false` when the flag clears.
    pub raised: bool,
}

/// Edge-triggered record of alert transitions, newest first.
#[derive(Debug, Clone)]
pub struct AlertJournal {
    events: VecDeque<AlertEvent>,
    capacity: usize,
    dedupe_window_ms: u64,
    previous: [(AlertKind, bool); 14],
    level: AlarmLevel,
}

impl AlertJournal {
    pub fn new(capacity: usize, dedupe_window_ms: u64) -> Self {
        Self {
            events: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
            dedupe_window_ms,
            previous: alerts::flags(&Alerts::default(), &MotorAlerts::default()),
            level: AlarmLevel::Normal,
        }
    }

    pub fn level(&self) -> AlarmLevel {
        self.level
    }

    pub fn events(&self) -> impl Iterator<Item = &AlertEvent> {
        self.events.iter()
    }

    /// Compares against the last observed flags and records every edge.
    /// Returns the events that were actually recorded.
    pub fn observe(
        &mut self,
        alerts: &Alerts,
        motor: &MotorAlerts,
        tick: u64,
        timestamp_ms: u64,
    ) -> Vec<AlertEvent> {
        let current = alerts::flags(alerts, motor);
        let previous = self.previous;
        let mut recorded = Vec::new();

        for ((kind, was), (_, is)) in previous.iter().zip(current.iter()) {
            if was == is {
                continue;
            }
            let event = AlertEvent {
                tick,
                timestamp_ms,
                kind: *kind,
                raised: *is,
            };
            if event.raised && self.recently_raised(*kind, timestamp_ms) {
                continue;
            }
            self.record(event);
            recorded.push(event);
        }

        self.previous = current;
        self.level = AlarmLevel::of(alerts, motor);
        recorded
    }

    fn recently_raised(&self, kind: AlertKind, timestamp_ms: u64) -> bool {
        self.events.iter().any(|e| {
            e.kind == kind
                && e.raised
                && timestamp_ms.saturating_sub(e.timestamp_ms) < self.dedupe_window_ms
        })
    }

    fn record(&mut self, event: AlertEvent) {
        self.events.push_front(event);
        self.events.truncate(self.capacity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_rising_and_falling_edges() {
        let mut journal = AlertJournal::new(10, 10_000);
        let motor = MotorAlerts::default();
        let mut alerts = Alerts::default();

        alerts.high_pressure = true;
        let raised = journal.observe(&alerts, &motor, 1, 1_000);
        assert_eq!(raised.len(), 1);
        assert!(raised[0].raised);
        assert_eq!(journal.level(), AlarmLevel::Critical);

        // Steady state records nothing.
        assert!(journal.observe(&alerts, &motor, 2, 2_000).is_empty());

        alerts.high_pressure = false;
        let cleared = journal.observe(&alerts, &motor, 3, 3_000);
        assert_eq!(cleared.len(), 1);
        assert!(!cleared[0].raised);
        assert_eq!(journal.level(), AlarmLevel::Normal);
        assert_eq!(journal.events().next().map(|e| e.tick), Some(3));
    }

    #[test]
    fn suppresses_repeat_raise_inside_window() {
        let mut journal = AlertJournal::new(10, 10_000);
        let motor = MotorAlerts::default();
        let on = Alerts {
            low_superheat: true,
            ..Alerts::default()
        };
        let off = Alerts::default();

        journal.observe(&on, &motor, 1, 0);
        journal.observe(&off, &motor, 2, 1_000);
        let again = journal.observe(&on, &motor, 3, 2_000);
        assert!(again.is_empty());

        journal.observe(&off, &motor, 4, 3_000);
        let later = journal.observe(&on, &motor, 5, 20_000);
        assert_eq!(later.len(), 1);
    }

    #[test]
    fn capacity_keeps_newest() {
        let mut journal = AlertJournal::new(2, 0);
        let motor = MotorAlerts::default();
        let on = Alerts {
            low_pressure: true,
            ..Alerts::default()
        };
        for tick in 0..4u64 {
            let alerts = if tick % 2 == 0 { on } else { Alerts::default() };
            journal.observe(&alerts, &motor, tick, tick * 100);
        }
        let ticks: Vec<u64> = journal.events().map(|e| e.tick).collect();
        assert_eq!(ticks, vec![3, 2]);
    }

    #[test]
    fn records_every_edge_of_one_observation() {
        let mut journal = AlertJournal::new(10, 10_000);
        let alerts = Alerts {
            high_pressure: true,
            compressor_overload: true,
            ..Alerts::default()
        };
        let motor = MotorAlerts {
            high_rpm: true,
            ..MotorAlerts::default()
        };

        let raised = journal.observe(&alerts, &motor, 1, 500);
        assert_eq!(raised.len(), 3);
        assert!(raised.iter().all(|e| e.raised && e.tick == 1));
        assert_eq!(journal.events().count(), 3);

        let cleared = journal.observe(&Alerts::default(), &MotorAlerts::default(), 2, 600);
        assert_eq!(cleared.len(), 3);
        assert!(cleared.iter().all(|e| !e.raised));
        assert_eq!(journal.events().count(), 6);
        assert_eq!(journal.level(), AlarmLevel::Normal);
    }
}
