use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::difficulty::DifficultyProfile;
use crate::plant::PlantKind;

/// Additive terms injected into one plant step.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Disturbance {
    pub noise: f64,
    pub periodic: f64,
}

/// Periodic disturbance as a pure function of session time.
///
/// `elapsed_ms` is milliseconds since the simulation epoch; the per-plant
/// frequencies are expressed per millisecond.
pub fn periodic(elapsed_ms: f64, profile: &DifficultyProfile, plant: PlantKind) -> f64 {
    (elapsed_ms * plant.disturbance_frequency()).sin() * profile.disturbance
}

pub struct DisturbanceGenerator {
    rng: StdRng,
}

impl DisturbanceGenerator {
    /// Seeded generators replay the same noise sequence.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }

    pub fn sample(
        &mut self,
        elapsed_ms: f64,
        profile: &DifficultyProfile,
        plant: PlantKind,
    ) -> Disturbance {
        let uniform: f64 = self.rng.gen();
        Disturbance {
            noise: (uniform - 0.5) * profile.noise,
            periodic: periodic(elapsed_ms, profile, plant),
        }
    }
}

impl Default for DisturbanceGenerator {
    fn default() -> Self {
        Self::new(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::difficulty::Difficulty;

    #[test]
    fn noise_is_bounded_by_profile() {
        let profile = Difficulty::Expert.profile();
        let mut gen = DisturbanceGenerator::new(Some(7));
        for i in 0..1_000 {
            let d = gen.sample(i as f64 * 16.0, &profile, PlantKind::Car);
            assert!(d.noise.abs() <= profile.noise / 2.0);
            assert!(d.periodic.abs() <= profile.disturbance);
        }
    }

    #[test]
    fn same_seed_same_sequence() {
        let profile = Difficulty::Medium.profile();
        let mut a = DisturbanceGenerator::new(Some(42));
        let mut b = DisturbanceGenerator::new(Some(42));
        for i in 0..50 {
            let t = i as f64 * 16.0;
            assert_eq!(
                a.sample(t, &profile, PlantKind::Drone),
                b.sample(t, &profile, PlantKind::Drone)
            );
        }
    }

    #[test]
    fn periodic_term_uses_plant_frequency() {
        let profile = Difficulty::Easy.profile();
        // quarter period of the car disturbance: sin(pi/2) = 1
        let t = std::f64::consts::FRAC_PI_2 / 0.001;
        let v = periodic(t, &profile, PlantKind::Car);
        assert!((v - profile.disturbance).abs() < 1e-9);
        assert_eq!(periodic(0.0, &profile, PlantKind::Pendulum), 0.0);
    }

    #[test]
    fn calm_profile_is_silent() {
        let mut gen = DisturbanceGenerator::new(Some(1));
        let d = gen.sample(1234.0, &DifficultyProfile::CALM, PlantKind::Temperature);
        assert_eq!(d.noise, 0.0);
        assert_eq!(d.periodic, 0.0);
    }
}
