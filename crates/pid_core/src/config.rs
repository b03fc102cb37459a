use std::fs;
use std::time::Duration;

use serde::Deserialize;

use crate::command::ScheduledEvent;
use crate::difficulty::Difficulty;
use crate::error::ConfigError;
use crate::pid::Gains;
use crate::plant::{PlantKind, STEP_SCALE};

/// One simulation run, as read from a TOML experiment file.
#[derive(Debug, Deserialize, Clone)]
pub struct SimulationConfig {
    pub experiment_name: String,
    #[serde(default)]
    pub plant: PlantKind,
    #[serde(default)]
    pub difficulty: Difficulty,
    pub duration_secs: u64,
    #[serde(default = "default_tick_rate")]
    pub tick_rate_hz: u32,
    #[serde(default = "default_kp")]
    pub kp: f64,
    #[serde(default = "default_ki")]
    pub ki: f64,
    #[serde(default = "default_kd")]
    pub kd: f64,
    /// Falls back to the plant's initial setpoint.
    #[serde(default)]
    pub setpoint: Option<f64>,
    /// Fixed noise seed; omit for OS entropy.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Euler step scale; tuned for 60 Hz, rescale when changing the tick rate.
    #[serde(default = "default_step_scale")]
    pub step_scale: f64,
    #[serde(default)]
    pub enable_logging: bool,
    #[serde(default)]
    pub events: Vec<ScheduledEvent>,
}

fn default_tick_rate() -> u32 {
    60
}

fn default_kp() -> f64 {
    Gains::default().kp
}

fn default_ki() -> f64 {
    Gains::default().ki
}

fn default_kd() -> f64 {
    Gains::default().kd
}

fn default_step_scale() -> f64 {
    STEP_SCALE
}

pub fn load_config(path: &str) -> Result<SimulationConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_string(),
        source,
    })?;
    SimulationConfig::from_toml_str(&content)
}

impl SimulationConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: SimulationConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults for `plant`: default gains, its initial setpoint, 60 Hz.
    pub fn for_plant(plant: PlantKind, difficulty: Difficulty, duration_secs: u64) -> Self {
        let gains = Gains::default();
        Self {
            experiment_name: format!("{plant}-{difficulty}"),
            plant,
            difficulty,
            duration_secs,
            tick_rate_hz: default_tick_rate(),
            kp: gains.kp,
            ki: gains.ki,
            kd: gains.kd,
            setpoint: None,
            seed: None,
            step_scale: STEP_SCALE,
            enable_logging: false,
            events: Vec::new(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_rate_hz == 0 {
            return Err(ConfigError::Invalid("tick_rate_hz must be positive".into()));
        }
        if !(self.step_scale.is_finite() && self.step_scale > 0.0) {
            return Err(ConfigError::Invalid(
                "step_scale must be a positive number".into(),
            ));
        }
        if !self.gains().is_finite() {
            return Err(ConfigError::Invalid("gains must be finite".into()));
        }
        if self.setpoint.is_some_and(|s| !s.is_finite()) {
            return Err(ConfigError::Invalid("setpoint must be finite".into()));
        }
        if let Some(bad) = self
            .events
            .iter()
            .find(|e| !(e.at_secs.is_finite() && e.at_secs >= 0.0))
        {
            return Err(ConfigError::Invalid(format!(
                "event time {} must be a non-negative number",
                bad.at_secs
            )));
        }
        Ok(())
    }

    pub fn gains(&self) -> Gains {
        Gains::new(self.kp, self.ki, self.kd)
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.tick_rate_hz.max(1) as f64)
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_secs)
    }
}
