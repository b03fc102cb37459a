//! Rule-of-thumb tuning hints for each PID gain.

use std::fmt;

use serde::Serialize;

use crate::pid::Gains;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AdviceLevel {
    Good,
    Warning,
    Bad,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GainTerm {
    Kp,
    Ki,
    Kd,
}

impl fmt::Display for GainTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GainTerm::Kp => "Kp",
            GainTerm::Ki => "Ki",
            GainTerm::Kd => "Kd",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GainAdvice {
    pub term: GainTerm,
    pub value: f64,
    pub level: AdviceLevel,
    pub message: &'static str,
}

impl GainAdvice {
    /// Classifies one gain. Threshold values themselves count as good.
    pub fn for_term(term: GainTerm, value: f64) -> Self {
        let (level, message) = match term {
            GainTerm::Kp if value < 0.5 => (
                AdviceLevel::Warning,
                "Low Kp: slow response, may leave steady-state error",
            ),
            GainTerm::Kp if value > 3.0 => {
                (AdviceLevel::Warning, "High Kp: fast response but may oscillate")
            }
            GainTerm::Kp => (AdviceLevel::Good, "Good Kp range: balanced response"),

            GainTerm::Ki if value < 0.01 => {
                (AdviceLevel::Warning, "Low Ki: steady-state error may persist")
            }
            GainTerm::Ki if value > 1.0 => (AdviceLevel::Bad, "High Ki: risks integral windup"),
            GainTerm::Ki => (
                AdviceLevel::Good,
                "Good Ki range: eliminates steady-state error",
            ),

            GainTerm::Kd if value > 0.5 => {
                (AdviceLevel::Warning, "High Kd: very sensitive to noise")
            }
            GainTerm::Kd if value < 0.01 => {
                (AdviceLevel::Warning, "Low Kd: more overshoot possible")
            }
            GainTerm::Kd => (AdviceLevel::Good, "Good Kd range: reduces overshoot"),
        };

        Self {
            term,
            value,
            level,
            message,
        }
    }
}

impl fmt::Display for GainAdvice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.level {
            AdviceLevel::Good => "ok",
            AdviceLevel::Warning => "warn",
            AdviceLevel::Bad => "bad",
        };
        write!(f, "[{tag:>4}] {}={:.3}  {}", self.term, self.value, self.message)
    }
}

impl Gains {
    /// One hint per term, in Kp, Ki, Kd order.
    pub fn feedback(&self) -> [GainAdvice; 3] {
        [
            GainAdvice::for_term(GainTerm::Kp, self.kp),
            GainAdvice::for_term(GainTerm::Ki, self.ki),
            GainAdvice::for_term(GainTerm::Kd, self.kd),
        ]
    }
}
