use std::time::Instant;

use serde::{Deserialize, Serialize};

/// Integral accumulator bound, in error-seconds.
pub const INTEGRAL_LIMIT: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Gains {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
}

impl Gains {
    pub const fn new(kp: f64, ki: f64, kd: f64) -> Self {
        Self { kp, ki, kd }
    }

    pub fn is_finite(&self) -> bool {
        self.kp.is_finite() && self.ki.is_finite() && self.kd.is_finite()
    }
}

impl Default for Gains {
    fn default() -> Self {
        Self::new(1.0, 0.1, 0.05)
    }
}

/// One controller evaluation, with the individual terms kept for display.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct PidOutput {
    pub output: f64,
    pub p_term: f64,
    pub i_term: f64,
    pub d_term: f64,
    pub error: f64,
}

/// Wall-clock driven PID controller.
///
/// The time step is measured between consecutive calls, so two updates within
/// the same instant contribute nothing to the integral and a zero derivative.
#[derive(Debug, Clone)]
pub struct PidController {
    gains: Gains,
    integral: f64,
    prev_error: f64,
    last_update: Instant,
}

impl PidController {
    pub fn new(kp: f64, ki: f64, kd: f64) -> Self {
        Self::with_gains(Gains::new(kp, ki, kd), Instant::now())
    }

    pub fn with_gains(gains: Gains, now: Instant) -> Self {
        Self {
            gains,
            integral: 0.0,
            prev_error: 0.0,
            last_update: now,
        }
    }

    pub fn update(&mut self, setpoint: f64, current_value: f64) -> PidOutput {
        self.update_at(setpoint, current_value, Instant::now())
    }

    pub fn update_at(&mut self, setpoint: f64, current_value: f64, now: Instant) -> PidOutput {
        // Saturates to zero if `now` precedes the last stamp.
        let dt = now.saturating_duration_since(self.last_update).as_secs_f64();
        let error = setpoint - current_value;

        let p_term = self.gains.kp * error;

        // Integral with anti-windup
        self.integral += error * dt;
        self.integral = self.integral.clamp(-INTEGRAL_LIMIT, INTEGRAL_LIMIT);
        let i_term = self.gains.ki * self.integral;

        let derivative = if dt > 0.0 {
            (error - self.prev_error) / dt
        } else {
            0.0
        };
        let d_term = self.gains.kd * derivative;

        self.prev_error = error;
        self.last_update = now;

        PidOutput {
            output: p_term + i_term + d_term,
            p_term,
            i_term,
            d_term,
            error,
        }
    }

    /// Replaces the gains only. Accumulated state is left alone.
    pub fn set_parameters(&mut self, kp: f64, ki: f64, kd: f64) {
        self.gains = Gains::new(kp, ki, kd);
    }

    pub fn reset(&mut self) {
        self.reset_at(Instant::now());
    }

    pub fn reset_at(&mut self, now: Instant) {
        self.integral = 0.0;
        self.prev_error = 0.0;
        self.last_update = now;
    }

    pub fn gains(&self) -> Gains {
        self.gains
    }

    pub fn integral(&self) -> f64 {
        self.integral
    }

    pub fn previous_error(&self) -> f64 {
        self.prev_error
    }

    pub fn last_update(&self) -> Instant {
        self.last_update
    }
}

impl Default for PidController {
    fn default() -> Self {
        Self::with_gains(Gains::default(), Instant::now())
    }
}
