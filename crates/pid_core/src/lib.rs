//! Simulation core for the PID tuning trainer: controller, plant models,
//! disturbances, scoring and the tick loop that ties them together.

pub mod advice;
pub mod command;
pub mod config;
pub mod controls;
pub mod difficulty;
pub mod disturbance;
pub mod error;
pub mod feed;
pub mod history;
pub mod metrics;
pub mod pid;
pub mod plant;
pub mod scoring;
pub mod simulation;
pub mod snapshot;

pub use advice::{AdviceLevel, GainAdvice, GainTerm};
pub use command::{Command, EventSchedule, ScheduledEvent};
pub use config::{load_config, SimulationConfig};
pub use controls::{Joystick, Push, RawControl};
pub use difficulty::{Difficulty, DifficultyProfile};
pub use disturbance::{Disturbance, DisturbanceGenerator};
pub use error::{ConfigError, SimError};
pub use feed::LiveFeed;
pub use history::{History, HistorySample, HISTORY_CAPACITY};
pub use metrics::{RunSummary, TickRecord, TickRecorder};
pub use pid::{Gains, PidController, PidOutput};
pub use plant::{Dynamics, PlantKind, PlantState, STEP_SCALE};
pub use scoring::{Grade, PerformanceScorer, Scores};
pub use simulation::{SessionStats, Simulation, TickResult};
pub use snapshot::{ConfigSnapshot, PerformanceSnapshot};
