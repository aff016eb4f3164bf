//! Bounded one-dimensional global search over the switching frequency.
//!
//! The [`FrequencyOptimizer`] trait defines the interface the run driver
//! uses. The particle swarm ([`swarm::ParticleSwarm`]) is the only
//! implementation.

pub mod swarm;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::DesignError;

pub use swarm::{ParticleSwarm, SwarmConfig};

/// Why a search stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// The iteration cap was reached.
    MaxIterations,
    /// The best position moved by no more than the minimum step.
    MinStep,
}

/// Best point found by a search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchOutcome {
    /// Best frequency (Hz), always within the configured bounds.
    pub best_frequency_hz: f64,
    /// Objective value at `best_frequency_hz`.
    pub best_value: f64,
    /// Completed iterations, not counting the initial population.
    pub iterations: usize,
    /// Total objective evaluations.
    pub evaluations: usize,
    pub termination: Termination,
    /// Global best value after the initial population and each iteration.
    pub best_history: Vec<f64>,
}

/// Cooperative cancellation flag, checked at iteration boundaries.
#[derive(Debug, Clone, Default)]
pub struct AbortHandle {
    flag: Arc<AtomicBool>,
}

impl AbortHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request that the search stop before its next iteration.
    pub fn abort(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_aborted(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// A single-variable, bound-constrained minimiser.
pub trait FrequencyOptimizer {
    /// Minimise `objective` over the optimiser's frequency bounds.
    ///
    /// Objective errors are propagated unchanged and stop the search. An
    /// abort request yields [`DesignError::Aborted`].
    fn minimize(
        &self,
        objective: &mut dyn FnMut(f64) -> Result<f64, DesignError>,
        abort: &AbortHandle,
    ) -> Result<SearchOutcome, DesignError>;

    /// Upper bound on objective evaluations for one search.
    fn evaluation_budget(&self) -> usize;

    /// Human-readable name of the method.
    fn method_name(&self) -> &str;
}
