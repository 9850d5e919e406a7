use serde_json::Value;
use std::io::Write;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

fn sim() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_cycle-sim"));
    cmd.stdout(Stdio::null()).stderr(Stdio::null());
    cmd
}

fn audit_entries(path: &Path) -> Vec<Value> {
    std::fs::read_to_string(path)
        .expect("audit log written")
        .lines()
        .map(|line| serde_json::from_str(line).expect("audit line is JSON"))
        .collect()
}

fn events_of<'a>(entries: &'a [Value], event_type: &str) -> Vec<&'a Value> {
    entries
        .iter()
        .filter(|e| e["event_type"] == event_type)
        .collect()
}

fn wait_with_deadline(child: &mut Child, limit: Duration) -> std::process::ExitStatus {
    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait().expect("poll child") {
            return status;
        }
        if start.elapsed() > limit {
            let _ = child.kill();
            panic!("simulator did not exit within {limit:?}");
        }
        thread::sleep(Duration::from_millis(50));
    }
}

#[test]
fn timed_run_writes_audit_trail() {
    let dir = tempfile::tempdir().unwrap();
    let audit = dir.path().join("audit").join("run.jsonl");
    let logs = dir.path().join("logs");
    std::fs::create_dir_all(&logs).unwrap();

    let status = sim()
        .args([
            "--run-seconds",
            "2",
            "--no-console",
            "--autostart",
            "--json-logs",
            "--tick-ms",
            "100",
            "--seed",
            "42",
        ])
        .arg("--audit-log")
        .arg(&audit)
        .arg("--log-dir")
        .arg(&logs)
        .status()
        .expect("spawn simulator");
    assert!(status.success());
    assert_eq!(std::fs::read_dir(&logs).expect("log dir created").count(), 1);

    let entries = audit_entries(&audit);
    assert_eq!(entries.first().unwrap()["event_type"], "system_start");
    assert_eq!(entries.first().unwrap()["details"]["motor_seed"], 43);
    assert_eq!(entries.last().unwrap()["event_type"], "system_shutdown");

    let applied = events_of(&entries, "command_applied");
    assert_eq!(applied.len(), 2);
    assert!(applied
        .iter()
        .all(|e| e["details"]["command"]["command"] == "start"));

    let shutdown = &entries.last().unwrap()["details"];
    let refrigeration_ticks = shutdown["refrigeration"]["ticks_executed"]
        .as_u64()
        .unwrap();
    assert!(refrigeration_ticks >= 5, "ticks {refrigeration_ticks}");
    assert_eq!(shutdown["refrigeration"]["domain_faults"], 0);
    assert!(shutdown["motor"].is_object());
}

#[test]
fn console_commands_are_routed_and_quit_stops() {
    let dir = tempfile::tempdir().unwrap();
    let audit = dir.path().join("console.jsonl");

    let mut child = sim()
        .args(["--run-seconds", "20", "--no-motor", "--tick-ms", "100"])
        .arg("--audit-log")
        .arg(&audit)
        .stdin(Stdio::piped())
        .spawn()
        .expect("spawn simulator");

    {
        let stdin = child.stdin.as_mut().unwrap();
        stdin
            .write_all(b"target 2\nrpm fast\nmotor rpm 900\ntarget NaN\n")
            .unwrap();
        stdin.flush().unwrap();
    }
    thread::sleep(Duration::from_millis(500));
    child.stdin.as_mut().unwrap().write_all(b"quit\n").unwrap();

    let status = wait_with_deadline(&mut child, Duration::from_secs(10));
    assert!(status.success());

    let entries = audit_entries(&audit);
    let applied = events_of(&entries, "command_applied");
    assert_eq!(applied.len(), 1);
    assert_eq!(
        applied[0]["details"]["command"]["command"],
        "set_target_temperature"
    );
    assert_eq!(applied[0]["details"]["command"]["value"], 2.0);

    let rejected = events_of(&entries, "command_rejected");
    assert_eq!(rejected.len(), 1);
    assert_eq!(rejected[0]["details"]["instance"], "refrigeration");

    let shutdown = &entries.last().unwrap()["details"];
    assert_eq!(shutdown["refrigeration"]["rejected_commands"], 1);
    assert!(shutdown.get("motor").is_none());
}

#[test]
fn unreadable_config_fails_fast() {
    let status = sim()
        .args(["--no-console", "--run-seconds", "5"])
        .args(["--config", "/nonexistent/cycle-sim.json"])
        .status()
        .expect("spawn simulator");
    assert!(!status.success());
}
