use std::fmt;

use serde::{Deserialize, Serialize};

/// Weight kept from the previous smoothed score on every update.
pub const SMOOTHING: f64 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grade {
    F,
    D,
    C,
    B,
    A,
}

impl Grade {
    pub fn from_score(overall: f64) -> Self {
        if overall >= 90.0 {
            Grade::A
        } else if overall >= 80.0 {
            Grade::B
        } else if overall >= 70.0 {
            Grade::C
        } else if overall >= 60.0 {
            Grade::D
        } else {
            Grade::F
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Scores {
    pub stability: f64,
    pub speed: f64,
    pub accuracy: f64,
    pub grade: Grade,
}

impl Scores {
    pub fn overall(&self) -> f64 {
        (self.stability + self.speed + self.accuracy) / 3.0
    }
}

/// Exponentially smoothed stability, speed and accuracy scores.
#[derive(Debug, Clone, Default)]
pub struct PerformanceScorer {
    stability: f64,
    speed: f64,
    accuracy: f64,
}

impl PerformanceScorer {
    pub fn new() -> Self {
        Self::default()
    }

    /// `elapsed_secs` is measured from the last scorer reset.
    pub fn update(&mut self, error: f64, setpoint: f64, elapsed_secs: f64) -> Scores {
        let error_pct = error.abs() / setpoint.abs().max(1.0) * 100.0;

        let stability = (100.0 - error_pct * 2.0).max(0.0);
        let speed = (100.0 - (elapsed_secs * 2.0).min(50.0)).max(0.0);
        let accuracy = (100.0 - error_pct).max(0.0);

        self.stability = smooth(self.stability, stability);
        self.speed = smooth(self.speed, speed);
        self.accuracy = smooth(self.accuracy, accuracy);

        self.scores()
    }

    pub fn scores(&self) -> Scores {
        let overall = (self.stability + self.speed + self.accuracy) / 3.0;
        Scores {
            stability: self.stability,
            speed: self.speed,
            accuracy: self.accuracy,
            grade: Grade::from_score(overall),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

fn smooth(previous: f64, instant: f64) -> f64 {
    (previous * SMOOTHING + instant * (1.0 - SMOOTHING)).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grade_boundaries() {
        assert_eq!(Grade::from_score(89.9), Grade::B);
        assert_eq!(Grade::from_score(90.0), Grade::A);
        assert_eq!(Grade::from_score(79.99), Grade::C);
        assert_eq!(Grade::from_score(70.0), Grade::C);
        assert_eq!(Grade::from_score(60.0), Grade::D);
        assert_eq!(Grade::from_score(59.9), Grade::F);
        assert_eq!(Grade::from_score(0.0), Grade::F);
    }

    #[test]
    fn grade_is_monotonic() {
        let mut last = Grade::F;
        for i in 0..=1000 {
            let g = Grade::from_score(i as f64 / 10.0);
            assert!(g >= last);
            last = g;
        }
        assert_eq!(last, Grade::A);
    }

    #[test]
    fn first_update_moves_ten_percent() {
        let mut scorer = PerformanceScorer::new();
        let s = scorer.update(0.0, 50.0, 0.0);
        assert!((s.stability - 10.0).abs() < 1e-12);
        assert!((s.speed - 10.0).abs() < 1e-12);
        assert!((s.accuracy - 10.0).abs() < 1e-12);
        assert_eq!(s.grade, Grade::F);
    }

    #[test]
    fn zero_setpoint_floors_denominator() {
        let mut scorer = PerformanceScorer::new();
        // |error| = 0.5 against setpoint 0 -> 50 %
        let s = scorer.update(0.5, 0.0, 0.0);
        assert!((s.accuracy - 5.0).abs() < 1e-12);
        assert_eq!(s.stability, 0.0);
    }

    #[test]
    fn speed_credit_floors_at_fifty() {
        let mut scorer = PerformanceScorer::new();
        let mut s = scorer.scores();
        for _ in 0..500 {
            s = scorer.update(0.0, 10.0, 3_600.0);
        }
        assert!((s.speed - 50.0).abs() < 1e-6);
        assert!((s.stability - 100.0).abs() < 1e-6);
    }

    #[test]
    fn scores_stay_in_bounds() {
        let mut scorer = PerformanceScorer::new();
        let errors = [0.0, 1.0, 1e3, 1e9, 0.01, 250.0];
        for (i, e) in errors.iter().cycle().take(300).enumerate() {
            let s = scorer.update(*e, 60.0, i as f64 * 0.5);
            for v in [s.stability, s.speed, s.accuracy] {
                assert!((0.0..=100.0).contains(&v));
            }
        }
    }

    #[test]
    fn reset_zeroes_scores() {
        let mut scorer = PerformanceScorer::new();
        scorer.update(0.0, 10.0, 0.0);
        scorer.reset();
        let s = scorer.scores();
        assert_eq!(s.overall(), 0.0);
        assert_eq!(s.grade, Grade::F);
    }
}
