use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::difficulty::Difficulty;
use crate::error::{ConfigError, SimError};
use crate::pid::Gains;
use crate::plant::PlantKind;
use crate::scoring::Grade;
use crate::simulation::Simulation;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSnapshot {
    pub stability: f64,
    pub speed: f64,
    pub accuracy: f64,
    pub grade: Grade,
}

/// Plain, serialisable view of the tunable settings and current scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    pub setpoint: f64,
    pub difficulty: Difficulty,
    pub system: PlantKind,
    pub performance: PerformanceSnapshot,
}

impl ConfigSnapshot {
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn gains(&self) -> Gains {
        Gains::new(self.kp, self.ki, self.kd)
    }
}

impl Simulation {
    pub fn snapshot(&self) -> ConfigSnapshot {
        let gains = self.gains();
        let scores = self.scores();
        ConfigSnapshot {
            kp: gains.kp,
            ki: gains.ki,
            kd: gains.kd,
            setpoint: self.setpoint(),
            difficulty: self.difficulty(),
            system: self.plant(),
            performance: PerformanceSnapshot {
                stability: scores.stability,
                speed: scores.speed,
                accuracy: scores.accuracy,
                grade: scores.grade,
            },
        }
    }

    /// Re-applies saved settings. Switching to the saved plant resets the run,
    /// so the saved performance figures are informational only.
    pub fn restore(&mut self, snapshot: &ConfigSnapshot, now: Instant) -> Result<(), SimError> {
        let gains = snapshot.gains();
        if !gains.is_finite() {
            return Err(SimError::NonFinite { what: "gain" });
        }
        if !snapshot.setpoint.is_finite() {
            return Err(SimError::NonFinite { what: "setpoint" });
        }

        self.set_active_plant(snapshot.system, now);
        self.set_difficulty(snapshot.difficulty);
        self.set_gains(gains, now)?;
        self.set_setpoint(snapshot.setpoint, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_survives_json_and_restores() {
        let t0 = Instant::now();
        let mut sim = Simulation::with_seed(PlantKind::Temperature, Some(3), t0);
        sim.set_difficulty(Difficulty::Medium);
        sim.set_gains(Gains::new(0.8, 0.1, 0.05), t0).unwrap();
        sim.set_setpoint(30.0, t0).unwrap();

        let json = sim.snapshot().to_json().unwrap();
        assert!(json.contains("\"system\": \"temperature\""));
        assert!(json.contains("\"grade\": \"F\""));

        let snap = ConfigSnapshot::from_json(&json).unwrap();
        let mut other = Simulation::with_seed(PlantKind::Car, Some(3), t0);
        other.restore(&snap, t0).unwrap();

        assert_eq!(other.plant(), PlantKind::Temperature);
        assert_eq!(other.difficulty(), Difficulty::Medium);
        assert_eq!(other.gains(), Gains::new(0.8, 0.1, 0.05));
        assert_eq!(other.setpoint(), 30.0);
    }

    #[test]
    fn non_finite_snapshot_changes_nothing() {
        let t0 = Instant::now();
        let mut sim = Simulation::with_seed(PlantKind::Drone, Some(3), t0);
        sim.set_gains(Gains::new(2.0, 0.25, 0.12), t0).unwrap();
        sim.set_setpoint(70.0, t0).unwrap();

        let mut bad_gain = sim.snapshot();
        bad_gain.system = PlantKind::Car;
        bad_gain.kd = f64::NAN;
        let mut bad_setpoint = bad_gain.clone();
        bad_setpoint.kd = 0.1;
        bad_setpoint.setpoint = f64::NAN;

        assert_eq!(
            sim.restore(&bad_gain, t0),
            Err(SimError::NonFinite { what: "gain" })
        );
        assert_eq!(
            sim.restore(&bad_setpoint, t0),
            Err(SimError::NonFinite { what: "setpoint" })
        );

        assert_eq!(sim.plant(), PlantKind::Drone);
        assert_eq!(sim.gains(), Gains::new(2.0, 0.25, 0.12));
        assert_eq!(sim.setpoint(), 70.0);
        assert_eq!(sim.stats().plant_switches, 0);
    }
}
