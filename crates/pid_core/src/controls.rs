use serde::{Deserialize, Serialize};

use crate::plant::PlantKind;

/// Magnitude of a pendulum push button.
pub const PUSH_FORCE: f64 = 15.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Push {
    Left,
    #[default]
    Neutral,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Joystick {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
}

/// Raw control-surface state, one shape per plant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "plant", rename_all = "lowercase")]
pub enum RawControl {
    Car {
        #[serde(default)]
        gas: bool,
        #[serde(default)]
        brake: bool,
    },
    Drone {
        #[serde(default = "mid_throttle")]
        throttle: f64,
        #[serde(default)]
        joystick: Joystick,
    },
    Temperature {
        #[serde(default)]
        heater: f64,
    },
    Pendulum {
        #[serde(default)]
        push: Push,
    },
}

fn mid_throttle() -> f64 {
    50.0
}

impl Push {
    pub fn force(self) -> f64 {
        match self {
            Push::Left => -PUSH_FORCE,
            Push::Neutral => 0.0,
            Push::Right => PUSH_FORCE,
        }
    }
}

impl RawControl {
    /// Controls at rest: pedals up, throttle centred, heater off.
    pub fn neutral(kind: PlantKind) -> Self {
        match kind {
            PlantKind::Car => RawControl::Car {
                gas: false,
                brake: false,
            },
            PlantKind::Drone => RawControl::Drone {
                throttle: mid_throttle(),
                joystick: Joystick::default(),
            },
            PlantKind::Temperature => RawControl::Temperature { heater: 0.0 },
            PlantKind::Pendulum => RawControl::Pendulum {
                push: Push::Neutral,
            },
        }
    }

    pub fn plant(&self) -> PlantKind {
        match self {
            RawControl::Car { .. } => PlantKind::Car,
            RawControl::Drone { .. } => PlantKind::Drone,
            RawControl::Temperature { .. } => PlantKind::Temperature,
            RawControl::Pendulum { .. } => PlantKind::Pendulum,
        }
    }

    /// Clamps slider and stick positions into their travel. Non-finite
    /// positions fall back to the resting value.
    pub fn sanitized(self) -> Self {
        fn travel(v: f64, lo: f64, hi: f64, rest: f64) -> f64 {
            if v.is_finite() {
                v.clamp(lo, hi)
            } else {
                rest
            }
        }

        match self {
            RawControl::Drone { throttle, joystick } => RawControl::Drone {
                throttle: travel(throttle, 0.0, 100.0, mid_throttle()),
                joystick: Joystick {
                    x: travel(joystick.x, -1.0, 1.0, 0.0),
                    y: travel(joystick.y, -1.0, 1.0, 0.0),
                },
            },
            RawControl::Temperature { heater } => RawControl::Temperature {
                heater: travel(heater, 0.0, 100.0, 0.0),
            },
            other => other,
        }
    }

    /// Scalar added alongside the controller output.
    ///
    /// The drone joystick is carried for front ends but does not move altitude.
    pub fn manual_input(&self) -> f64 {
        match *self {
            RawControl::Car { gas, brake } => {
                let mut input = 0.0;
                if gas {
                    input += 60.0;
                }
                if brake {
                    input -= 40.0;
                }
                input
            }
            RawControl::Drone { throttle, .. } => (throttle - 50.0) * 1.5,
            RawControl::Temperature { heater } => heater * 0.8,
            RawControl::Pendulum { push } => push.force(),
        }
    }
}
