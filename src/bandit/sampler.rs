//! Posterior sampling from Beta beliefs.
//!
//! Beta(a, b) is drawn as `X / (X + Y)` with `X ~ Gamma(a)` and `Y ~ Gamma(b)`.
//! Gamma draws use Marsaglia-Tsang with Box-Muller normals. The generator is
//! always passed in by the caller, so a seeded `ChaCha8Rng` replays the same
//! draws.

use rand::Rng;

use crate::bandit::types::BeliefState;

/// Numerical floor for uniforms fed into `ln`.
const EPSILON: f64 = 1e-10;

/// Bound on Marsaglia-Tsang rejection rounds.
const MAX_GAMMA_ITERATIONS: usize = 1000;

/// Bound on the shape < 1 boost recursion.
const MAX_GAMMA_RECURSION: usize = 10;

#[derive(Debug, Clone, Copy, Default)]
pub struct PosteriorSampler;

impl PosteriorSampler {
    /// One draw from the belief's Beta distribution, in [0, 1].
    pub fn sample<R: Rng + ?Sized>(&self, state: &BeliefState, rng: &mut R) -> f64 {
        let x = sample_gamma(rng, state.alpha(), 0);
        let y = sample_gamma(rng, state.beta(), 0);

        let sum = x + y;
        if sum > 0.0 && sum.is_finite() {
            (x / sum).clamp(0.0, 1.0)
        } else {
            state.mean()
        }
    }
}

fn sample_gamma<R: Rng + ?Sized>(rng: &mut R, shape: f64, depth: usize) -> f64 {
    if shape <= 0.0 {
        return 0.0;
    }
    if depth >= MAX_GAMMA_RECURSION {
        return shape;
    }

    if shape < 1.0 {
        let u: f64 = rng.gen::<f64>().max(EPSILON);
        return sample_gamma(rng, shape + 1.0, depth + 1) * u.powf(1.0 / shape);
    }

    let d = shape - 1.0 / 3.0;
    let c = 1.0 / (9.0 * d).sqrt();

    for _ in 0..MAX_GAMMA_ITERATIONS {
        let x = sample_normal(rng);
        let v_term = 1.0 + c * x;
        if v_term <= 0.0 {
            continue;
        }

        let v = v_term.powi(3);
        let u: f64 = rng.gen();
        let x2 = x * x;

        if u < 1.0 - 0.0331 * x2 * x2 {
            return d * v;
        }
        if u.max(EPSILON).ln() < 0.5 * x2 + d * (1.0 - v + v.ln()) {
            return d * v;
        }
    }

    // Rejection budget exhausted: fall back to the mean.
    shape
}

fn sample_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    let u1: f64 = rng.gen::<f64>().max(EPSILON);
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}
