use clap::Parser;
use cycle_core::{CycleConfig, InputPolicy, SimulationConfig};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Hermetic refrigeration compressor simulator
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "cycle-sim", version)]
#[command(about = "Hermetic refrigeration compressor simulator")]
pub struct RuntimeConfig {
    /// Run for a fixed duration then exit
    #[arg(long)]
    pub run_seconds: Option<u64>,

    /// JSON file with `refrigeration` and `motor` engine settings
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Noise seed (the motor bench uses seed + 1)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Tick period in milliseconds for both engines
    #[arg(long)]
    pub tick_ms: Option<u64>,

    /// Clamp operator input into documented ranges instead of passing it through
    #[arg(long, default_value_t = false)]
    pub clamp_inputs: bool,

    /// Keep stepping while stopped so pressures visibly equalise
    #[arg(long, default_value_t = false)]
    pub settle_while_stopped: bool,

    /// Do not run the motor bench instance
    #[arg(long, default_value_t = false)]
    pub no_motor: bool,

    /// Do not read operator commands from stdin
    #[arg(long, default_value_t = false)]
    pub no_console: bool,

    /// Start the compressor(s) immediately
    #[arg(long, default_value_t = false)]
    pub autostart: bool,

    /// Output logs in JSON format (for log aggregation)
    #[arg(long, default_value_t = false)]
    pub json_logs: bool,

    /// Also write daily-rolling log files into this directory
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// Enable Prometheus metrics server on address (e.g. 0.0.0.0:9090)
    #[arg(long)]
    pub metrics_addr: Option<String>,

    /// Enable audit logging to the specified JSONL file
    #[arg(long)]
    pub audit_log: Option<PathBuf>,
}

impl RuntimeConfig {
    pub fn from_env() -> Self {
        Self::parse()
    }

    /// File settings (or defaults) with command-line overrides applied.
    pub fn simulation(&self) -> Result<SimulationConfig, ConfigError> {
        let mut sim = match &self.config {
            Some(path) => load_file(path)?,
            None => SimulationConfig::default(),
        };
        self.apply_overrides(&mut sim.refrigeration, 0);
        self.apply_overrides(&mut sim.motor, 1);
        Ok(sim)
    }

    fn apply_overrides(&self, cfg: &mut CycleConfig, seed_offset: u64) {
        if let Some(seed) = self.seed {
            cfg.seed = seed.wrapping_add(seed_offset);
        }
        if let Some(ms) = self.tick_ms {
            cfg.tick_period_ms = ms;
        }
        if self.clamp_inputs {
            cfg.input_policy = InputPolicy::Clamp;
        }
        if self.settle_while_stopped {
            cfg.settle_while_stopped = true;
        }
    }
}

fn load_file(path: &PathBuf) -> Result<SimulationConfig, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.clone(),
        source,
    })?;
    SimulationConfig::from_json(&raw).map_err(|source| ConfigError::Parse {
        path: path.clone(),
        source,
    })
}
