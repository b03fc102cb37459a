use serde::{Deserialize, Serialize};

use crate::controls::RawControl;
use crate::difficulty::Difficulty;
use crate::plant::PlantKind;

/// Everything a front end may ask of a running simulation.
///
/// Drivers queue these and apply them between ticks, never during one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Command {
    SetGains { kp: f64, ki: f64, kd: f64 },
    ApplyRecommendedGains,
    SetSetpoint { value: f64 },
    SetDifficulty { level: Difficulty },
    SetActivePlant { plant: PlantKind },
    SetManual { control: RawControl },
    Pause,
    Resume,
    TogglePause,
    Reset,
}

/// A command fired once the run has been going for `at_secs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledEvent {
    pub at_secs: f64,
    pub command: Command,
}

/// Hands out scheduled events in time order.
#[derive(Debug, Clone, Default)]
pub struct EventSchedule {
    events: Vec<ScheduledEvent>,
    next: usize,
}

impl EventSchedule {
    pub fn new(mut events: Vec<ScheduledEvent>) -> Self {
        events.sort_by(|a, b| a.at_secs.total_cmp(&b.at_secs));
        Self { events, next: 0 }
    }

    /// Events due at or before `elapsed_secs` that have not fired yet.
    pub fn due(&mut self, elapsed_secs: f64) -> &[ScheduledEvent] {
        let start = self.next;
        while self
            .events
            .get(self.next)
            .is_some_and(|e| e.at_secs <= elapsed_secs)
        {
            self.next += 1;
        }
        &self.events[start..self.next]
    }

    pub fn remaining(&self) -> usize {
        self.events.len() - self.next
    }
}
