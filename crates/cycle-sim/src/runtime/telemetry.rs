use cycle_core::{StateExchange, TimeBase};
use cycle_io::metrics::{init_metrics, record_reading, serve_metrics, READING_AGE_MS};
use cycle_io::CounterCursor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::info;

const UPDATE_INTERVAL: Duration = Duration::from_millis(200);

pub fn init() {
    init_metrics();
}

pub fn start_metrics_server(addr: &Option<String>) -> Option<thread::JoinHandle<()>> {
    addr.as_ref().map(|addr| {
        info!(addr = %addr, "Starting metrics server");
        serve_metrics(addr.clone())
    })
}

/// Samples every instance's latest reading into the Prometheus registry.
pub fn start_metrics_updater(
    instances: Vec<(String, Arc<StateExchange>)>,
    timebase: TimeBase,
    stop: Arc<AtomicBool>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let mut cursors = vec![CounterCursor::default(); instances.len()];
        while !stop.load(Ordering::Relaxed) {
            for ((name, exchange), cursor) in instances.iter().zip(cursors.iter_mut()) {
                let Some(reading) = exchange.latest_published() else {
                    continue;
                };
                record_reading(name, &reading);
                cursor.advance(name, &reading);
                let age_us = timebase.unix_us().saturating_sub(reading.timestamp_us);
                READING_AGE_MS.observe(age_us as f64 / 1_000.0);
            }
            thread::sleep(UPDATE_INTERVAL);
        }
    })
}
