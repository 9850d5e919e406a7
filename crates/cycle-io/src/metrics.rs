//! Prometheus metrics for the cycle simulator.
//!
//! Process gauges are generated from `cycle_core::tags::READING_TAGS` and
//! labelled by engine instance, so the refrigeration cycle and the motor
//! bench share one set of series.

use cycle_core::tags::{self, Tag};
use cycle_core::CycleReading;
use prometheus::{
    Encoder, GaugeVec, Histogram, HistogramOpts, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::LazyLock;
use std::thread;
use tiny_http::{Response, Server};

/// Global metrics registry
pub static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

const INSTANCE_LABEL: &str = "instance";

// ============================================================================
// Tick Loop Metrics
// ============================================================================

/// Ticks stepped per instance
pub static TICKS_EXECUTED: LazyLock<IntCounterVec> = LazyLock::new(|| {
    let counter = IntCounterVec::new(
        Opts::new("cycle_ticks_executed_total", "Simulation ticks executed"),
        &[INSTANCE_LABEL],
    )
    .unwrap();
    REGISTRY.register(Box::new(counter.clone())).unwrap();
    counter
});

/// Ticks dropped because the loop ran late
pub static TICKS_SKIPPED: LazyLock<IntCounterVec> = LazyLock::new(|| {
    let counter = IntCounterVec::new(
        Opts::new(
            "cycle_ticks_skipped_total",
            "Simulation ticks skipped due to timing overruns",
        ),
        &[INSTANCE_LABEL],
    )
    .unwrap();
    REGISTRY.register(Box::new(counter.clone())).unwrap();
    counter
});

/// Steps rejected because a formula left its domain
pub static DOMAIN_FAULTS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    let counter = IntCounterVec::new(
        Opts::new(
            "cycle_domain_faults_total",
            "Steps rejected with a domain error (state retained)",
        ),
        &[INSTANCE_LABEL],
    )
    .unwrap();
    REGISTRY.register(Box::new(counter.clone())).unwrap();
    counter
});

/// Operator commands rejected at validation
pub static REJECTED_COMMANDS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    let counter = IntCounterVec::new(
        Opts::new(
            "cycle_rejected_commands_total",
            "Operator commands rejected by input validation",
        ),
        &[INSTANCE_LABEL],
    )
    .unwrap();
    REGISTRY.register(Box::new(counter.clone())).unwrap();
    counter
});

/// Wall-clock age of the latest published reading when sampled
pub static READING_AGE_MS: LazyLock<Histogram> = LazyLock::new(|| {
    let histogram = Histogram::with_opts(
        HistogramOpts::new(
            "cycle_reading_age_milliseconds",
            "Age of the latest published reading when sampled",
        )
        .buckets(vec![
            10.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2000.0, 5000.0,
        ]),
    )
    .unwrap();
    REGISTRY.register(Box::new(histogram.clone())).unwrap();
    histogram
});

// ============================================================================
// Process State Metrics
// ============================================================================

/// One gauge family per published tag, same order as `READING_TAGS`.
pub static READING_GAUGES: LazyLock<Vec<(Tag, GaugeVec)>> = LazyLock::new(|| {
    tags::READING_TAGS
        .iter()
        .map(|tag| {
            let gauge = GaugeVec::new(Opts::new(tag.metric, tag.help), &[INSTANCE_LABEL]).unwrap();
            REGISTRY.register(Box::new(gauge.clone())).unwrap();
            (*tag, gauge)
        })
        .collect()
});

static READINGS_RECORDED: AtomicBool = AtomicBool::new(false);

/// Copies every tagged value of `reading` into its gauge.
pub fn record_reading(instance: &str, reading: &CycleReading) {
    for (tag, gauge) in READING_GAUGES.iter() {
        gauge.with_label_values(&[instance]).set((tag.read)(reading));
    }
    READINGS_RECORDED.store(true, Ordering::Relaxed);
}

/// Tracks cumulative counters published in readings and forwards deltas.
#[derive(Debug, Default, Clone)]
pub struct CounterCursor {
    ticks: u64,
    skipped: u64,
    faults: u64,
    rejected: u64,
}

impl CounterCursor {
    pub fn advance(&mut self, instance: &str, reading: &CycleReading) {
        forward(&TICKS_EXECUTED, instance, &mut self.ticks, reading.tick);
        forward(&TICKS_SKIPPED, instance, &mut self.skipped, reading.ticks_skipped);
        forward(&DOMAIN_FAULTS, instance, &mut self.faults, reading.domain_faults);
        forward(&REJECTED_COMMANDS, instance, &mut self.rejected, reading.rejected_commands);
    }
}

fn forward(counter: &IntCounterVec, instance: &str, last: &mut u64, current: u64) {
    if current > *last {
        counter
            .with_label_values(&[instance])
            .inc_by(current - *last);
        *last = current;
    }
}

/// Text exposition of everything registered.
pub fn render() -> Result<Vec<u8>, prometheus::Error> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&REGISTRY.gather(), &mut buffer)?;
    Ok(buffer)
}

// ============================================================================
// Metrics HTTP Server
// ============================================================================

/// Start the metrics HTTP server on the given address.
/// Returns a join handle for the server thread.
pub fn serve_metrics(bind_addr: String) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let server = match Server::http(&bind_addr) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!("Failed to start metrics server on {}: {}", bind_addr, e);
                return;
            }
        };

        tracing::info!("Metrics server listening on http://{}/metrics", bind_addr);

        for request in server.incoming_requests() {
            let path = request.url();

            match path {
                "/metrics" => {
                    let buffer = match render() {
                        Ok(buffer) => buffer,
                        Err(e) => {
                            tracing::warn!("Failed to encode metrics: {}", e);
                            let _ = request.respond(
                                Response::from_string("Internal Server Error")
                                    .with_status_code(500),
                            );
                            continue;
                        }
                    };

                    let response = Response::from_data(buffer).with_header(
                        tiny_http::Header::from_bytes(
                            &b"Content-Type"[..],
                            &b"text/plain; version=0.0.4"[..],
                        )
                        .unwrap(),
                    );
                    let _ = request.respond(response);
                }
                "/health" => {
                    let _ = request.respond(Response::from_string("OK"));
                }
                "/ready" => {
                    // Ready once any instance has published a reading
                    if READINGS_RECORDED.load(Ordering::Relaxed) {
                        let _ = request.respond(Response::from_string("Ready"));
                    } else {
                        let _ = request
                            .respond(Response::from_string("Not Ready").with_status_code(503));
                    }
                }
                _ => {
                    let _ =
                        request.respond(Response::from_string("Not Found").with_status_code(404));
                }
            }
        }
    })
}

/// Initialize all metrics (forces lazy initialization)
pub fn init_metrics() {
    LazyLock::force(&TICKS_EXECUTED);
    LazyLock::force(&TICKS_SKIPPED);
    LazyLock::force(&DOMAIN_FAULTS);
    LazyLock::force(&REJECTED_COMMANDS);
    LazyLock::force(&READING_AGE_MS);
    LazyLock::force(&READING_GAUGES);
}
