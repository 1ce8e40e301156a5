//! Parametric resource-usage model
//!
//! Memory and CPU figures are produced by a parametric model
//! (`base + per_actor * count + noise`), not sampled from any OS facility.
//! The noise term is a pluggable strategy so tests can pin exact figures.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Strategy for the noise term of the resource model.
pub trait NoiseGenerator: Send {
    /// One sample in `[-amplitude, amplitude]`.
    fn sample(&mut self, amplitude: f64) -> f64;
}

/// Seeded uniform noise.
pub struct SeededNoise {
    rng: StdRng,
}

impl SeededNoise {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl NoiseGenerator for SeededNoise {
    fn sample(&mut self, amplitude: f64) -> f64 {
        if amplitude <= 0.0 {
            return 0.0;
        }
        self.rng.gen_range(-amplitude..=amplitude)
    }
}

/// Zero noise, for tests that assert exact model output.
pub struct NoNoise;

impl NoiseGenerator for NoNoise {
    fn sample(&mut self, _amplitude: f64) -> f64 {
        0.0
    }
}

/// Linear resource curves as a function of active actor count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceModel {
    pub base_memory_mb: f64,
    pub memory_per_actor_mb: f64,
    pub memory_noise_mb: f64,
    pub base_cpu_percent: f64,
    pub cpu_per_actor_percent: f64,
    pub cpu_noise_percent: f64,
}

impl Default for ResourceModel {
    fn default() -> Self {
        Self {
            base_memory_mb: 120.0,
            memory_per_actor_mb: 2.5,
            memory_noise_mb: 8.0,
            base_cpu_percent: 5.0,
            cpu_per_actor_percent: 0.9,
            cpu_noise_percent: 4.0,
        }
    }
}

impl ResourceModel {
    /// Simulated memory usage for the given actor count, in MB.
    pub fn memory_mb(&self, actors: usize, noise: &mut dyn NoiseGenerator) -> f64 {
        let value = self.base_memory_mb
            + self.memory_per_actor_mb * actors as f64
            + noise.sample(self.memory_noise_mb);
        value.max(0.0)
    }

    /// Simulated CPU usage for the given actor count, clamped to 0..=100.
    pub fn cpu_percent(&self, actors: usize, noise: &mut dyn NoiseGenerator) -> f64 {
        let value = self.base_cpu_percent
            + self.cpu_per_actor_percent * actors as f64
            + noise.sample(self.cpu_noise_percent);
        value.clamp(0.0, 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_without_noise_is_linear() {
        let model = ResourceModel::default();
        let mut noise = NoNoise;
        let m0 = model.memory_mb(0, &mut noise);
        let m10 = model.memory_mb(10, &mut noise);
        assert_eq!(m0, 120.0);
        assert_eq!(m10, 120.0 + 25.0);
    }

    #[test]
    fn test_cpu_clamped_to_hundred() {
        let model = ResourceModel::default();
        let mut noise = NoNoise;
        assert_eq!(model.cpu_percent(10_000, &mut noise), 100.0);
    }

    #[test]
    fn test_seeded_noise_is_reproducible() {
        let mut a = SeededNoise::new(3);
        let mut b = SeededNoise::new(3);
        for _ in 0..10 {
            assert_eq!(a.sample(5.0), b.sample(5.0));
        }
    }

    #[test]
    fn test_noise_bounded_by_amplitude() {
        let mut noise = SeededNoise::new(9);
        for _ in 0..100 {
            let s = noise.sample(2.0);
            assert!((-2.0..=2.0).contains(&s));
        }
    }
}
