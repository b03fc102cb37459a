use thiserror::Error;

use crate::plant::PlantKind;

/// Rejections raised by the simulation command interface.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    #[error("{what} must be a finite number")]
    NonFinite { what: &'static str },

    #[error("{got} controls cannot drive the active {active} plant")]
    ControlMismatch { active: PlantKind, got: PlantKind },

    #[error("unknown difficulty `{0}` (expected easy, medium, hard or expert)")]
    UnknownDifficulty(String),

    #[error("unknown plant `{0}` (expected car, drone, temperature or pendulum)")]
    UnknownPlant(String),

    #[error("duration_secs must be positive when nothing can stop the run")]
    OpenEndedRun,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read `{path}`: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error("snapshot encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}
