pub mod metrics;

pub use metrics::{init_metrics, record_reading, serve_metrics, CounterCursor};
