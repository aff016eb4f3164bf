//! Particle swarm optimisation on a bounded interval.
//!
//! Each particle carries a position, a velocity and its personal best. The
//! velocity update is
//!
//! $v \leftarrow \omega v + \phi_p r_p (p - x) + \phi_g r_g (g - x)$
//!
//! with $r_p, r_g \sim U(0, 1)$, and positions are clamped to the bounds after
//! every move. The search stops at the iteration cap, or as soon as an
//! improvement of the global best moves it by no more than `min_step`.
//! The objective value itself never stops the search.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::{AbortHandle, FrequencyOptimizer, SearchOutcome, Termination};
use crate::error::DesignError;

/// Swarm configuration. Bounds, population size, iteration cap and minimum
/// step are always supplied by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwarmConfig {
    /// Lower frequency bound (Hz).
    pub lower_hz: f64,
    /// Upper frequency bound (Hz).
    pub upper_hz: f64,
    /// Number of particles.
    pub swarm_size: usize,
    /// Maximum number of iterations after the initial population.
    pub max_iterations: usize,
    /// Minimum movement of the global best (Hz) before the search stops.
    pub min_step: f64,
    /// Velocity inertia ω.
    #[serde(default = "default_coefficient")]
    pub inertia: f64,
    /// Attraction to the particle's own best, φp.
    #[serde(default = "default_coefficient")]
    pub cognitive: f64,
    /// Attraction to the swarm's best, φg.
    #[serde(default = "default_coefficient")]
    pub social: f64,
    /// Seed for a reproducible search; `None` draws from OS entropy.
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_coefficient() -> f64 {
    0.5
}

impl SwarmConfig {
    pub fn new(
        lower_hz: f64,
        upper_hz: f64,
        swarm_size: usize,
        max_iterations: usize,
        min_step: f64,
    ) -> Self {
        Self {
            lower_hz,
            upper_hz,
            swarm_size,
            max_iterations,
            min_step,
            inertia: default_coefficient(),
            cognitive: default_coefficient(),
            social: default_coefficient(),
            seed: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<(), DesignError> {
        if !(self.lower_hz.is_finite() && self.upper_hz.is_finite()) {
            return Err(DesignError::config("frequency bounds must be finite"));
        }
        if self.lower_hz <= 0.0 {
            return Err(DesignError::config(format!(
                "lower frequency bound must be positive, got {}",
                self.lower_hz
            )));
        }
        if self.lower_hz >= self.upper_hz {
            return Err(DesignError::config(format!(
                "lower bound {} Hz must be below upper bound {} Hz",
                self.lower_hz, self.upper_hz
            )));
        }
        if self.swarm_size == 0 {
            return Err(DesignError::config("swarm size must be positive"));
        }
        if self.max_iterations == 0 {
            return Err(DesignError::config("maximum iterations must be positive"));
        }
        if !(self.min_step.is_finite() && self.min_step >= 0.0) {
            return Err(DesignError::config(format!(
                "minimum step must be finite and non-negative, got {}",
                self.min_step
            )));
        }
        for (label, value) in [
            ("inertia", self.inertia),
            ("cognitive coefficient", self.cognitive),
            ("social coefficient", self.social),
        ] {
            if !value.is_finite() {
                return Err(DesignError::config(format!("{} must be finite", label)));
            }
        }
        Ok(())
    }
}

/// Particle swarm minimiser.
pub struct ParticleSwarm {
    config: SwarmConfig,
}

impl ParticleSwarm {
    /// Validate `config` and build the optimiser.
    pub fn new(config: SwarmConfig) -> Result<Self, DesignError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SwarmConfig {
        &self.config
    }

    fn rng(&self) -> StdRng {
        match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

/// Index of the first minimum.
fn argmin(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v < values[best] {
            best = i;
        }
    }
    best
}

impl FrequencyOptimizer for ParticleSwarm {
    fn minimize(
        &self,
        objective: &mut dyn FnMut(f64) -> Result<f64, DesignError>,
        abort: &AbortHandle,
    ) -> Result<SearchOutcome, DesignError> {
        let cfg = &self.config;
        let (lower, upper) = (cfg.lower_hz, cfg.upper_hz);
        let span = upper - lower;
        let n = cfg.swarm_size;
        let mut rng = self.rng();

        let mut position: Vec<f64> = (0..n).map(|_| rng.gen_range(lower..=upper)).collect();
        let mut velocity: Vec<f64> = (0..n).map(|_| rng.gen_range(-span..=span)).collect();

        let mut personal_best = position.clone();
        let mut personal_value = Vec::with_capacity(n);
        for &x in &position {
            personal_value.push(objective(x)?);
        }
        let mut evaluations = n;

        let first = argmin(&personal_value);
        let mut global_best = personal_best[first];
        let mut global_value = personal_value[first];
        let mut best_history = vec![global_value];

        for iteration in 1..=cfg.max_iterations {
            if abort.is_aborted() {
                log::warn!("swarm search aborted before iteration {}", iteration);
                return Err(DesignError::Aborted { iteration });
            }

            for i in 0..n {
                let r_p: f64 = rng.gen();
                let r_g: f64 = rng.gen();
                velocity[i] = cfg.inertia * velocity[i]
                    + cfg.cognitive * r_p * (personal_best[i] - position[i])
                    + cfg.social * r_g * (global_best - position[i]);
                position[i] = (position[i] + velocity[i]).clamp(lower, upper);

                let value = objective(position[i])?;
                evaluations += 1;
                if value < personal_value[i] {
                    personal_best[i] = position[i];
                    personal_value[i] = value;
                }
            }

            let leader = argmin(&personal_value);
            if personal_value[leader] < global_value {
                let step = (personal_best[leader] - global_best).abs();
                global_best = personal_best[leader];
                global_value = personal_value[leader];

                if step <= cfg.min_step {
                    best_history.push(global_value);
                    log::info!(
                        "swarm converged after {} iterations: best {:.3} Hz moved {:.3e} Hz",
                        iteration,
                        global_best,
                        step
                    );
                    return Ok(SearchOutcome {
                        best_frequency_hz: global_best,
                        best_value: global_value,
                        iterations: iteration,
                        evaluations,
                        termination: Termination::MinStep,
                        best_history,
                    });
                }
            }
            best_history.push(global_value);

            log::debug!(
                "iteration {}/{}: best {:.3} Hz -> {:.6}",
                iteration,
                cfg.max_iterations,
                global_best,
                global_value
            );
        }

        log::info!(
            "swarm reached the iteration cap ({}): best {:.3} Hz",
            cfg.max_iterations,
            global_best
        );
        Ok(SearchOutcome {
            best_frequency_hz: global_best,
            best_value: global_value,
            iterations: cfg.max_iterations,
            evaluations,
            termination: Termination::MaxIterations,
            best_history,
        })
    }

    fn evaluation_budget(&self) -> usize {
        self.config.swarm_size * (self.config.max_iterations + 1)
    }

    fn method_name(&self) -> &str {
        "Particle Swarm Optimisation"
    }
}
