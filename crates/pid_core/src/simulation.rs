//! The fixed-rate loop coupling controller, plant, disturbance and scoring.

use std::time::Instant;

use serde::Serialize;
use tracing::{info, warn};

use crate::command::Command;
use crate::config::SimulationConfig;
use crate::controls::RawControl;
use crate::difficulty::{Difficulty, DifficultyProfile};
use crate::disturbance::{Disturbance, DisturbanceGenerator};
use crate::error::SimError;
use crate::history::{History, HistorySample};
use crate::pid::{Gains, PidController, PidOutput};
use crate::plant::{PlantKind, PlantState, STEP_SCALE};
use crate::scoring::{Grade, PerformanceScorer, Scores};

/// Outcome of one tick, handed to presentation and recorders.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TickResult {
    pub tick: u64,
    /// Milliseconds since the simulation epoch.
    pub time_ms: f64,
    pub plant: PlantKind,
    pub setpoint: f64,
    pub manual_input: f64,
    pub pid: PidOutput,
    pub disturbance: Disturbance,
    pub state: PlantState,
    pub scores: Scores,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SessionStats {
    pub ticks: u64,
    pub plant_switches: u64,
    pub resets: u64,
    pub best_grade: Option<Grade>,
}

/// Owns all mutable simulation state. Single-threaded by construction: every
/// mutation goes through `&mut self`, so ticks and commands never overlap.
pub struct Simulation {
    pid: PidController,
    plant: PlantKind,
    state: PlantState,
    setpoint: f64,
    difficulty: Difficulty,
    profile: DifficultyProfile,
    controls: RawControl,
    disturbance: DisturbanceGenerator,
    scorer: PerformanceScorer,
    scores: Scores,
    history: History,
    paused: bool,
    step_scale: f64,
    epoch: Instant,
    score_epoch: Instant,
    stats: SessionStats,
}

impl Simulation {
    /// Default gains on the easy preset, seeded from OS entropy.
    pub fn new(plant: PlantKind, now: Instant) -> Self {
        Self::with_seed(plant, None, now)
    }

    pub fn with_seed(plant: PlantKind, seed: Option<u64>, now: Instant) -> Self {
        let scorer = PerformanceScorer::new();
        let scores = scorer.scores();
        let difficulty = Difficulty::default();
        Self {
            pid: PidController::with_gains(Gains::default(), now),
            plant,
            state: PlantState::initial(plant),
            setpoint: plant.initial_setpoint(),
            difficulty,
            profile: difficulty.profile(),
            controls: RawControl::neutral(plant),
            disturbance: DisturbanceGenerator::new(seed),
            scorer,
            scores,
            history: History::default(),
            paused: false,
            step_scale: STEP_SCALE,
            epoch: now,
            score_epoch: now,
            stats: SessionStats::default(),
        }
    }

    pub fn from_config(config: &SimulationConfig, now: Instant) -> Result<Self, SimError> {
        let mut sim = Self::with_seed(config.plant, config.seed, now);
        sim.step_scale = config.step_scale;
        sim.set_difficulty(config.difficulty);
        sim.set_gains(config.gains(), now)?;
        if let Some(setpoint) = config.setpoint {
            sim.set_setpoint(setpoint, now)?;
        }
        Ok(sim)
    }

    /// Advances one frame. Paused simulations return `None` and mutate nothing.
    pub fn tick(&mut self, now: Instant) -> Option<TickResult> {
        if self.paused {
            return None;
        }

        let pid = self.pid.update_at(self.setpoint, self.state.value, now);
        let manual_input = self.controls.manual_input();

        let time_ms = now.saturating_duration_since(self.epoch).as_secs_f64() * 1000.0;
        let disturbance = self.disturbance.sample(time_ms, &self.profile, self.plant);

        self.state = self.plant.step(
            self.state,
            pid.output,
            manual_input,
            disturbance,
            self.step_scale,
        );

        self.history.push(HistorySample {
            time_ms,
            setpoint: self.setpoint,
            value: self.state.value,
            output: pid.output,
            manual_input,
        });

        let since_reset = now.saturating_duration_since(self.score_epoch).as_secs_f64();
        self.scores = self.scorer.update(pid.error, self.setpoint, since_reset);

        self.stats.ticks += 1;
        self.stats.best_grade = self.stats.best_grade.max(Some(self.scores.grade));

        Some(TickResult {
            tick: self.stats.ticks,
            time_ms,
            plant: self.plant,
            setpoint: self.setpoint,
            manual_input,
            pid,
            disturbance,
            state: self.state,
            scores: self.scores,
        })
    }

    pub fn apply(&mut self, command: Command, now: Instant) -> Result<(), SimError> {
        let result = match command {
            Command::SetGains { kp, ki, kd } => self.set_gains(Gains::new(kp, ki, kd), now),
            Command::ApplyRecommendedGains => self.set_gains(self.plant.recommended_gains(), now),
            Command::SetSetpoint { value } => self.set_setpoint(value, now),
            Command::SetDifficulty { level } => {
                self.set_difficulty(level);
                Ok(())
            }
            Command::SetActivePlant { plant } => {
                self.set_active_plant(plant, now);
                Ok(())
            }
            Command::SetManual { control } => self.set_manual(control),
            Command::Pause => {
                self.pause();
                Ok(())
            }
            Command::Resume => {
                self.resume();
                Ok(())
            }
            Command::TogglePause => {
                self.toggle_pause();
                Ok(())
            }
            Command::Reset => {
                self.reset(now);
                Ok(())
            }
        };

        if let Err(err) = &result {
            warn!(%err, "command rejected");
        }
        result
    }

    /// Replaces the gains and restarts the controller to avoid a kick.
    pub fn set_gains(&mut self, gains: Gains, now: Instant) -> Result<(), SimError> {
        if !gains.is_finite() {
            return Err(SimError::NonFinite { what: "gain" });
        }
        self.pid.set_parameters(gains.kp, gains.ki, gains.kd);
        self.pid.reset_at(now);
        Ok(())
    }

    pub fn set_setpoint(&mut self, setpoint: f64, now: Instant) -> Result<(), SimError> {
        if !setpoint.is_finite() {
            return Err(SimError::NonFinite { what: "setpoint" });
        }
        self.setpoint = setpoint;
        // a jump in setpoint would otherwise spike the derivative
        self.pid.reset_at(now);
        Ok(())
    }

    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.difficulty = difficulty;
        self.profile = difficulty.profile();
        info!(%difficulty, xp_multiplier = self.profile.xp_multiplier, "difficulty changed");
    }

    /// Overrides the preset profile, e.g. a calm one for lab runs.
    pub fn set_custom_profile(&mut self, profile: DifficultyProfile) {
        self.profile = profile;
    }

    pub fn set_active_plant(&mut self, plant: PlantKind, now: Instant) {
        self.plant = plant;
        self.controls = RawControl::neutral(plant);
        self.stats.plant_switches += 1;
        self.restart(now);
        info!(%plant, setpoint = self.setpoint, "switched plant");
    }

    pub fn set_manual(&mut self, control: RawControl) -> Result<(), SimError> {
        if control.plant() != self.plant {
            return Err(SimError::ControlMismatch {
                active: self.plant,
                got: control.plant(),
            });
        }
        self.controls = control.sanitized();
        Ok(())
    }

    pub fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            info!("simulation paused");
        }
    }

    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            info!("simulation resumed");
        }
    }

    pub fn toggle_pause(&mut self) {
        if self.paused {
            self.resume();
        } else {
            self.pause();
        }
    }

    /// Returns the active plant to its initial value and setpoint.
    pub fn reset(&mut self, now: Instant) {
        self.stats.resets += 1;
        self.restart(now);
        info!(plant = %self.plant, "simulation reset");
    }

    fn restart(&mut self, now: Instant) {
        self.pid.reset_at(now);
        self.history.clear();
        self.state = PlantState::initial(self.plant);
        self.setpoint = self.plant.initial_setpoint();
        self.scorer.reset();
        self.scores = self.scorer.scores();
        self.score_epoch = now;
    }

    pub fn plant(&self) -> PlantKind {
        self.plant
    }

    pub fn state(&self) -> PlantState {
        self.state
    }

    pub fn value(&self) -> f64 {
        self.state.value
    }

    pub fn setpoint(&self) -> f64 {
        self.setpoint
    }

    pub fn gains(&self) -> Gains {
        self.pid.gains()
    }

    pub fn controller(&self) -> &PidController {
        &self.pid
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn profile(&self) -> DifficultyProfile {
        self.profile
    }

    pub fn controls(&self) -> RawControl {
        self.controls
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn scores(&self) -> Scores {
        self.scores
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn step_scale(&self) -> f64 {
        self.step_scale
    }
}
