//! Audit journal of operator and simulation events.
//!
//! Every start/stop, applied or rejected operator command, domain fault and
//! alert transition is appended as one JSON line.

use cycle_core::tick_loop::TickObserver;
use cycle_core::{EngineError, OperatorCommand, StepOutcome, TimeBase};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::warn;

/// Types of events that are logged in the audit trail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    /// Simulator startup
    SystemStart,
    /// Simulator shutdown
    SystemShutdown,
    /// Operator command accepted by an engine
    CommandApplied,
    /// Operator command refused (bad input or failed step)
    CommandRejected,
    /// Scheduled tick refused with a domain error
    DomainFault,
    /// Alert flag went from clear to set
    AlertRaised,
    /// Alert flag went from set to clear
    AlertCleared,
}

/// A single audit log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Monotonic timestamp in microseconds
    pub timestamp_us: u64,
    /// Wall-clock Unix timestamp in microseconds
    pub unix_us: u64,
    /// Type of event being logged
    pub event_type: AuditEventType,
    /// Additional event-specific details
    pub details: serde_json::Value,
}

/// Thread-safe audit logger that writes to a JSONL file
pub struct AuditLogger {
    writer: Mutex<BufWriter<File>>,
}

impl AuditLogger {
    /// Create a new audit logger writing to the specified path.
    /// The file is opened in append mode to preserve existing logs.
    pub fn new(path: &Path) -> std::io::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            writer: Mutex::new(BufWriter::with_capacity(8192, file)),
        })
    }

    /// Log an audit entry. This is thread-safe and can be called from any thread.
    pub fn log(&self, entry: AuditEntry) -> std::io::Result<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| std::io::Error::other("audit writer poisoned"))?;
        serde_json::to_writer(&mut *writer, &entry)?;
        writer.write_all(b"\n")?;
        writer.flush()
    }

    /// Convenience method to log with just event type and details
    pub fn log_event(
        &self,
        timestamp_us: u64,
        unix_us: u64,
        event_type: AuditEventType,
        details: serde_json::Value,
    ) -> std::io::Result<()> {
        self.log(AuditEntry {
            timestamp_us,
            unix_us,
            event_type,
            details,
        })
    }
}

/// Tick observer that forwards driver activity into an optional audit log.
#[derive(Clone)]
pub struct AuditTrail {
    logger: Option<Arc<AuditLogger>>,
    timebase: TimeBase,
}

impl AuditTrail {
    pub fn new(logger: Option<Arc<AuditLogger>>, timebase: TimeBase) -> Self {
        Self { logger, timebase }
    }

    pub fn record(&self, event_type: AuditEventType, details: serde_json::Value) {
        let Some(logger) = &self.logger else {
            return;
        };
        if let Err(e) = logger.log_event(
            self.timebase.now_us(),
            self.timebase.unix_us(),
            event_type,
            details,
        ) {
            warn!(error = %e, "Failed to write audit entry");
        }
    }
}

impl TickObserver for AuditTrail {
    fn command_applied(&mut self, instance: &str, command: &OperatorCommand) {
        self.record(
            AuditEventType::CommandApplied,
            serde_json::json!({ "instance": instance, "command": command }),
        );
    }

    fn command_rejected(&mut self, instance: &str, command: &OperatorCommand, error: &EngineError) {
        self.record(
            AuditEventType::CommandRejected,
            serde_json::json!({
                "instance": instance,
                "command": command,
                "error": error.to_string(),
            }),
        );
    }

    fn stepped(&mut self, instance: &str, outcome: &StepOutcome) {
        for event in &outcome.alert_events {
            let event_type = if event.raised {
                AuditEventType::AlertRaised
            } else {
                AuditEventType::AlertCleared
            };
            self.record(
                event_type,
                serde_json::json!({
                    "instance": instance,
                    "tick": event.tick,
                    "alert": event.kind,
                    "critical": event.kind.is_critical(),
                }),
            );
        }
    }

    fn step_failed(&mut self, instance: &str, error: &EngineError) {
        self.record(
            AuditEventType::DomainFault,
            serde_json::json!({ "instance": instance, "error": error.to_string() }),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cycle_core::{AlertEvent, AlertKind, DomainError};
    use std::io::Read;
    use tempfile::tempdir;

    fn read_lines(path: &Path) -> Vec<AuditEntry> {
        let mut content = String::new();
        File::open(path)
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        content
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_audit_logger_writes_jsonl() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");

        let logger = AuditLogger::new(&path).unwrap();

        logger
            .log_event(
                1000,
                1704067200000000,
                AuditEventType::SystemStart,
                serde_json::json!({"version": "0.1.0"}),
            )
            .unwrap();

        logger
            .log_event(
                2000,
                1704067201000000,
                AuditEventType::CommandApplied,
                serde_json::json!({"instance": "refrigeration", "command": "toggle"}),
            )
            .unwrap();

        let entries = read_lines(&path);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].timestamp_us, 1000);
        assert_eq!(entries[1].event_type, AuditEventType::CommandApplied);
    }

    #[test]
    fn trail_records_observer_callbacks() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("audit.jsonl");
        let logger = Arc::new(AuditLogger::new(&path).unwrap());
        let mut trail = AuditTrail::new(Some(logger), TimeBase::new());

        trail.command_applied("refrigeration", &OperatorCommand::SetTargetTemperature(2.0));
        trail.command_rejected(
            "motor",
            &OperatorCommand::SetCompressorRpm(f64::NAN),
            &EngineError::Domain(DomainError::DivisionByZero { what: "test" }),
        );
        trail.stepped(
            "refrigeration",
            &StepOutcome {
                tick: 4,
                alert_events: vec![AlertEvent {
                    tick: 4,
                    timestamp_ms: 0,
                    kind: AlertKind::HighPressure,
                    raised: true,
                }],
            },
        );
        trail.step_failed(
            "refrigeration",
            &EngineError::Domain(DomainError::DivisionByZero { what: "test" }),
        );

        let entries = read_lines(&path);
        let kinds: Vec<_> = entries.iter().map(|e| e.event_type.clone()).collect();
        assert_eq!(
            kinds,
            vec![
                AuditEventType::CommandApplied,
                AuditEventType::CommandRejected,
                AuditEventType::AlertRaised,
                AuditEventType::DomainFault,
            ]
        );
        assert_eq!(entries[0].details["command"]["value"], 2.0);
        assert_eq!(entries[2].details["critical"], true);
    }

    #[test]
    fn trail_without_logger_is_silent() {
        let mut trail = AuditTrail::new(None, TimeBase::new());
        trail.command_applied("refrigeration", &OperatorCommand::Toggle);
    }
}
