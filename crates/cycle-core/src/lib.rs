pub mod alert_journal;
pub mod alerts;
pub mod command;
pub mod config;
pub mod cycle_model;
mod cycle_proptest;
pub mod drivetrain;
pub mod engine;
pub mod error;
pub mod history;
pub mod kinematics;
pub mod motor_model;
pub mod setpoint;
pub mod state;
pub mod sync;
pub mod tags;
pub mod tick_loop;
pub mod timebase;

pub use alert_journal::{AlertEvent, AlertJournal};
pub use alerts::{AlarmLevel, AlertKind, AlertThresholds};
pub use command::{Component, OperatorCommand};
pub use config::{CycleConfig, Fidelity, SimulationConfig};
pub use drivetrain::{CrankGeometry, CrankTrain, FrameSample};
pub use engine::{CycleEngine, StepOutcome};
pub use error::{DomainError, EngineError};
pub use history::{PerformanceHistory, PerformancePoint};
pub use setpoint::{InputLimits, InputPolicy, InputViolation, Setpoint, Unvalidated, Validated};
pub use state::{CycleState, RefrigerantState};
pub use sync::{CycleReading, StateExchange};
pub use tick_loop::{NoopObserver, TickDriver, TickObserver, TickStats};
pub use timebase::TimeBase;
