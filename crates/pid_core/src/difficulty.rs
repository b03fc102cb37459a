use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SimError;

/// Named difficulty presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
    Expert,
}

/// Scaling applied to noise, periodic disturbance and rewards.
///
/// `delay` is carried for front ends; the dynamics do not read it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyProfile {
    pub noise: f64,
    pub disturbance: f64,
    pub delay: f64,
    pub xp_multiplier: f64,
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Easy,
        Difficulty::Medium,
        Difficulty::Hard,
        Difficulty::Expert,
    ];

    pub const fn profile(self) -> DifficultyProfile {
        match self {
            Difficulty::Easy => DifficultyProfile {
                noise: 0.1,
                disturbance: 0.5,
                delay: 0.0,
                xp_multiplier: 1.0,
            },
            Difficulty::Medium => DifficultyProfile {
                noise: 0.3,
                disturbance: 1.0,
                delay: 0.1,
                xp_multiplier: 1.5,
            },
            Difficulty::Hard => DifficultyProfile {
                noise: 0.5,
                disturbance: 1.5,
                delay: 0.2,
                xp_multiplier: 2.0,
            },
            Difficulty::Expert => DifficultyProfile {
                noise: 0.8,
                disturbance: 2.0,
                delay: 0.3,
                xp_multiplier: 3.0,
            },
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
            Difficulty::Expert => "expert",
        }
    }
}

impl DifficultyProfile {
    /// No noise and no periodic disturbance. Handy for deterministic runs.
    pub const CALM: DifficultyProfile = DifficultyProfile {
        noise: 0.0,
        disturbance: 0.0,
        delay: 0.0,
        xp_multiplier: 1.0,
    };
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            "expert" => Ok(Difficulty::Expert),
            other => Err(SimError::UnknownDifficulty(other.to_string())),
        }
    }
}
