//! Plant dynamics for the four simulated systems.
//!
//! Every model takes one forward-Euler step of `(driving - restoring + noise) * scale`
//! and clamps the result to its physical range. The scale is a fixed constant,
//! tuned for roughly 60 steps per second; it is *not* derived from elapsed time.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::disturbance::Disturbance;
use crate::error::SimError;
use crate::pid::Gains;

/// Integration scale applied to every plant step.
pub const STEP_SCALE: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlantKind {
    #[default]
    Car,
    Drone,
    Temperature,
    Pendulum,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlantState {
    /// Speed (km/h), altitude (m), temperature (°C) or angle (degrees).
    pub value: f64,
    /// Combined input seen by the actuator on the last step.
    pub drive: f64,
    /// Set when the last step had to be clamped to the plant range.
    pub at_limit: bool,
}

impl PlantState {
    pub fn initial(kind: PlantKind) -> Self {
        Self {
            value: kind.initial_value(),
            drive: 0.0,
            at_limit: false,
        }
    }
}

/// Per-plant physics.
pub trait Dynamics: Send + Sync {
    fn kind(&self) -> PlantKind;

    /// Total input reaching the actuator.
    fn drive(&self, controller_output: f64, manual_input: f64, periodic: f64) -> f64 {
        controller_output + manual_input + periodic
    }

    /// Driving minus restoring term, before noise and scaling.
    fn rate(&self, value: f64, drive: f64, periodic: f64) -> f64;

    fn step(
        &self,
        state: PlantState,
        controller_output: f64,
        manual_input: f64,
        disturbance: Disturbance,
        scale: f64,
    ) -> PlantState {
        let drive = self.drive(controller_output, manual_input, disturbance.periodic);
        let rate = self.rate(state.value, drive, disturbance.periodic);
        let raw = state.value + (rate + disturbance.noise) * scale;

        let (lo, hi) = self.kind().range();
        if raw.is_nan() {
            return PlantState {
                value: state.value.clamp(lo, hi),
                drive,
                at_limit: false,
            };
        }

        PlantState {
            value: raw.clamp(lo, hi),
            drive,
            at_limit: raw < lo || raw > hi,
        }
    }
}

/// Cruise control: acceleration against linear drag.
pub struct CarCruise;

/// Altitude hold: thrust against constant gravity.
pub struct DroneAltitude;

/// Room heater: heating only, cooling toward a drifting ambient.
pub struct RoomTemperature;

/// Inverted pendulum angle in degrees.
pub struct InvertedPendulum;

const AMBIENT_C: f64 = 20.0;

impl Dynamics for CarCruise {
    fn kind(&self) -> PlantKind {
        PlantKind::Car
    }

    fn rate(&self, value: f64, drive: f64, _periodic: f64) -> f64 {
        let acceleration = drive * 0.08;
        let drag = value * 0.025;
        acceleration - drag
    }
}

impl Dynamics for DroneAltitude {
    fn kind(&self) -> PlantKind {
        PlantKind::Drone
    }

    fn rate(&self, _value: f64, drive: f64, _periodic: f64) -> f64 {
        let thrust = drive * 0.03;
        let gravity = -9.8 * 0.008;
        thrust + gravity
    }
}

impl Dynamics for RoomTemperature {
    fn kind(&self) -> PlantKind {
        PlantKind::Temperature
    }

    // The heater cannot cool, and the disturbance moves the ambient instead.
    fn drive(&self, controller_output: f64, manual_input: f64, _periodic: f64) -> f64 {
        (controller_output + manual_input).max(0.0)
    }

    fn rate(&self, value: f64, drive: f64, periodic: f64) -> f64 {
        let heating = drive * 0.015;
        let cooling = (value - (AMBIENT_C + periodic)) * 0.012;
        heating - cooling
    }
}

impl Dynamics for InvertedPendulum {
    fn kind(&self) -> PlantKind {
        PlantKind::Pendulum
    }

    fn rate(&self, value: f64, drive: f64, _periodic: f64) -> f64 {
        let force = drive * 0.08;
        let gravity = value.to_radians().sin() * 3.0;
        let damping = value * 0.08;
        force - gravity - damping
    }
}

impl PlantKind {
    pub const ALL: [PlantKind; 4] = [
        PlantKind::Car,
        PlantKind::Drone,
        PlantKind::Temperature,
        PlantKind::Pendulum,
    ];

    pub fn dynamics(self) -> &'static dyn Dynamics {
        match self {
            PlantKind::Car => &CarCruise,
            PlantKind::Drone => &DroneAltitude,
            PlantKind::Temperature => &RoomTemperature,
            PlantKind::Pendulum => &InvertedPendulum,
        }
    }

    pub fn step(
        self,
        state: PlantState,
        controller_output: f64,
        manual_input: f64,
        disturbance: Disturbance,
        scale: f64,
    ) -> PlantState {
        self.dynamics()
            .step(state, controller_output, manual_input, disturbance, scale)
    }

    /// Closed physical range of the controlled value.
    pub const fn range(self) -> (f64, f64) {
        match self {
            PlantKind::Car => (0.0, 150.0),
            PlantKind::Drone => (0.0, 100.0),
            PlantKind::Temperature => (0.0, 100.0),
            PlantKind::Pendulum => (-75.0, 75.0),
        }
    }

    pub const fn initial_value(self) -> f64 {
        match self {
            PlantKind::Car => 30.0,
            PlantKind::Drone => 50.0,
            PlantKind::Temperature => 20.0,
            PlantKind::Pendulum => 0.0,
        }
    }

    pub const fn initial_setpoint(self) -> f64 {
        match self {
            PlantKind::Car => 60.0,
            PlantKind::Drone => 50.0,
            PlantKind::Temperature => 25.0,
            PlantKind::Pendulum => 0.0,
        }
    }

    /// Angular frequency (per millisecond) of the periodic disturbance.
    pub const fn disturbance_frequency(self) -> f64 {
        match self {
            PlantKind::Car => 0.001,
            PlantKind::Drone => 0.002,
            PlantKind::Temperature => 0.0005,
            PlantKind::Pendulum => 0.003,
        }
    }

    /// Gains that settle each plant quickly on the easy preset.
    pub const fn recommended_gains(self) -> Gains {
        match self {
            PlantKind::Car => Gains::new(1.2, 0.15, 0.08),
            PlantKind::Drone => Gains::new(2.0, 0.25, 0.12),
            PlantKind::Temperature => Gains::new(0.8, 0.1, 0.05),
            PlantKind::Pendulum => Gains::new(3.5, 0.05, 0.4),
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            PlantKind::Car => "Car Cruise Control",
            PlantKind::Drone => "Drone Altitude Control",
            PlantKind::Temperature => "Temperature Control System",
            PlantKind::Pendulum => "Inverted Pendulum",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            PlantKind::Car => "km/h",
            PlantKind::Drone => "m",
            PlantKind::Temperature => "°C",
            PlantKind::Pendulum => "°",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PlantKind::Car => "car",
            PlantKind::Drone => "drone",
            PlantKind::Temperature => "temperature",
            PlantKind::Pendulum => "pendulum",
        }
    }
}

impl fmt::Display for PlantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlantKind {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "car" => Ok(PlantKind::Car),
            "drone" => Ok(PlantKind::Drone),
            "temperature" => Ok(PlantKind::Temperature),
            "pendulum" => Ok(PlantKind::Pendulum),
            other => Err(SimError::UnknownPlant(other.to_string())),
        }
    }
}
