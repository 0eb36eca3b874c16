//! Standard normal draws via the Box-Muller transform.
//!
//! Each transform yields two independent normals; the second is cached and
//! returned by the next call so no uniform pair is wasted.

use rand::Rng;
use std::f64::consts::TAU;

#[derive(Debug, Default, Clone)]
pub struct GaussianSampler {
    spare: Option<f64>,
}

impl GaussianSampler {
    pub fn new() -> Self {
        Self::default()
    }

    /// One N(0, 1) draw.
    pub fn sample<R: Rng + ?Sized>(&mut self, rng: &mut R) -> f64 {
        if let Some(z) = self.spare.take() {
            return z;
        }
        // u1 in (0, 1] keeps ln finite.
        let u1 = 1.0 - rng.gen::<f64>();
        let u2 = rng.gen::<f64>();
        let radius = (-2.0 * u1.ln()).sqrt();
        let (sin, cos) = (TAU * u2).sin_cos();
        self.spare = Some(radius * sin);
        radius * cos
    }

    /// One N(mean, std_dev²) draw.
    pub fn sample_scaled<R: Rng + ?Sized>(&mut self, rng: &mut R, mean: f64, std_dev: f64) -> f64 {
        mean + std_dev * self.sample(rng)
    }
}
