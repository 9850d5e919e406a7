use crate::infra::audit::{AuditEventType, AuditLogger, AuditTrail};
use crate::runtime::config::RuntimeConfig;
use crate::runtime::console::{self, ConsoleCommand, Target};
use crate::runtime::logging::init_tracing;
use crate::runtime::telemetry;
use cycle_core::{
    CycleConfig, CycleEngine, OperatorCommand, StateExchange, TickDriver, TickStats, TimeBase,
};
use std::io::BufRead;
use std::path::Path;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

const SUPERVISOR_POLL: Duration = Duration::from_millis(100);

/// One running engine: its command inbox, its published readings and the
/// thread that drives it.
struct Instance {
    name: &'static str,
    commands: Sender<OperatorCommand>,
    exchange: Arc<StateExchange>,
    handle: thread::JoinHandle<TickStats>,
}

/// Handles the console thread needs to reach every instance.
struct Routes {
    refrigeration: (Sender<OperatorCommand>, Arc<StateExchange>),
    motor: Option<(Sender<OperatorCommand>, Arc<StateExchange>)>,
}

pub fn run_from_args() -> ExitCode {
    run(RuntimeConfig::from_env())
}

pub fn run(config: RuntimeConfig) -> ExitCode {
    let _log_guard = init_tracing(config.json_logs, config.log_dir.as_deref());

    let simulation = match config.simulation() {
        Ok(simulation) => simulation,
        Err(e) => {
            error!(error = %e, "Failed to load simulation config");
            return ExitCode::FAILURE;
        }
    };

    telemetry::init();
    let metrics_enabled = config.metrics_addr.is_some();
    let _metrics_handle = telemetry::start_metrics_server(&config.metrics_addr);

    let timebase = TimeBase::new();
    let audit_logger = match init_audit_logger(config.audit_log.as_deref()) {
        Ok(logger) => logger,
        Err(e) => {
            error!(error = %e, "Audit logging requested but failed to initialize");
            return ExitCode::FAILURE;
        }
    };
    let trail = AuditTrail::new(audit_logger, timebase);

    trail.record(
        AuditEventType::SystemStart,
        serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "motor_enabled": !config.no_motor,
            "metrics_enabled": metrics_enabled,
            "refrigeration_seed": simulation.refrigeration.seed,
            "motor_seed": simulation.motor.seed,
        }),
    );

    let stop = Arc::new(AtomicBool::new(false));

    let mut instances = vec![spawn_instance(
        "refrigeration",
        simulation.refrigeration,
        trail.clone(),
        Arc::clone(&stop),
    )];
    if config.no_motor {
        info!("Motor bench disabled");
    } else {
        instances.push(spawn_instance(
            "motor",
            simulation.motor,
            trail.clone(),
            Arc::clone(&stop),
        ));
    }

    let _metrics_updater = metrics_enabled.then(|| {
        telemetry::start_metrics_updater(
            instances
                .iter()
                .map(|i| (i.name.to_string(), Arc::clone(&i.exchange)))
                .collect(),
            timebase,
            Arc::clone(&stop),
        )
    });

    if config.autostart {
        for instance in &instances {
            if instance.commands.send(OperatorCommand::Start).is_err() {
                warn!(instance = instance.name, "Autostart dropped: driver already gone");
            }
        }
    }

    if config.no_console {
        info!("Console disabled");
    } else {
        let routes = Routes {
            refrigeration: (
                instances[0].commands.clone(),
                Arc::clone(&instances[0].exchange),
            ),
            motor: instances
                .get(1)
                .map(|i| (i.commands.clone(), Arc::clone(&i.exchange))),
        };
        spawn_console(routes, Arc::clone(&stop));
    }

    info!("Cycle simulator running. Type `help` for console commands.");

    let deadline = config.run_seconds.map(|seconds| {
        info!(seconds, "Running for limited duration");
        Instant::now() + Duration::from_secs(seconds)
    });
    while !stop.load(Ordering::Relaxed) {
        if deadline.is_some_and(|d| Instant::now() >= d) {
            stop.store(true, Ordering::Relaxed);
            break;
        }
        thread::sleep(SUPERVISOR_POLL);
    }

    let mut summary = serde_json::Map::new();
    let mut exit = ExitCode::SUCCESS;
    for instance in instances {
        let name = instance.name;
        drop(instance.commands);
        match instance.handle.join() {
            Ok(stats) => {
                info!(
                    instance = name,
                    ticks_executed = stats.ticks_executed,
                    ticks_skipped = stats.ticks_skipped,
                    domain_faults = stats.domain_faults,
                    commands_applied = stats.commands_applied,
                    rejected_commands = stats.rejected_commands,
                    max_jitter_us = stats.max_jitter_us,
                    "Run complete"
                );
                summary.insert(
                    name.to_string(),
                    serde_json::json!({
                        "ticks_executed": stats.ticks_executed,
                        "ticks_skipped": stats.ticks_skipped,
                        "domain_faults": stats.domain_faults,
                        "rejected_commands": stats.rejected_commands,
                    }),
                );
            }
            Err(_) => {
                error!(instance = name, "Tick driver panicked");
                exit = ExitCode::FAILURE;
            }
        }
    }

    trail.record(
        AuditEventType::SystemShutdown,
        serde_json::Value::Object(summary),
    );
    exit
}

fn spawn_instance(
    name: &'static str,
    config: CycleConfig,
    trail: AuditTrail,
    stop: Arc<AtomicBool>,
) -> Instance {
    let (commands, inbox) = mpsc::channel();
    let exchange = Arc::new(StateExchange::new());
    let exchange_driver = Arc::clone(&exchange);

    info!(
        instance = name,
        fidelity = ?config.fidelity,
        tick_ms = config.tick_period_ms,
        seed = config.seed,
        input_policy = ?config.input_policy,
        "Starting tick driver"
    );

    let handle = thread::spawn(move || {
        let engine = CycleEngine::new(config);
        let mut driver = TickDriver::with_observer(name, engine, inbox, exchange_driver, trail);
        driver.run(&stop);
        driver.stats().clone()
    });

    Instance {
        name,
        commands,
        exchange,
        handle,
    }
}

/// Reads operator lines from stdin. The thread is detached: it blocks on
/// stdin and ends with the process.
fn spawn_console(routes: Routes, stop: Arc<AtomicBool>) {
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    warn!(error = %e, "Console read failed");
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            match console::parse(&line) {
                Ok(ConsoleCommand::Engine { target, command }) => {
                    let sender = match target {
                        Target::Refrigeration => Some(&routes.refrigeration.0),
                        Target::Motor => routes.motor.as_ref().map(|(tx, _)| tx),
                    };
                    match sender {
                        Some(tx) if tx.send(command).is_ok() => {}
                        Some(_) => warn!(instance = target.instance(), "Driver has stopped"),
                        None => println!("motor bench is disabled"),
                    }
                }
                Ok(ConsoleCommand::Status) => {
                    let (_, exchange) = &routes.refrigeration;
                    println!(
                        "{}",
                        console::status_line("refrigeration", exchange.latest_published().as_ref())
                    );
                    if let Some((_, exchange)) = &routes.motor {
                        println!(
                            "{}",
                            console::status_line("motor", exchange.latest_published().as_ref())
                        );
                    }
                }
                Ok(ConsoleCommand::Help) => println!("{}", console::HELP),
                Ok(ConsoleCommand::Quit) => {
                    info!("Quit requested from console");
                    stop.store(true, Ordering::Relaxed);
                    break;
                }
                Err(e) => println!("{e} (type `help`)"),
            }
        }
    });
}

fn init_audit_logger(path: Option<&Path>) -> std::io::Result<Option<Arc<AuditLogger>>> {
    let Some(path) = path else {
        return Ok(None);
    };
    let logger = AuditLogger::new(path)?;
    info!(path = %path.display(), "Audit logging enabled");
    Ok(Some(Arc::new(logger)))
}
