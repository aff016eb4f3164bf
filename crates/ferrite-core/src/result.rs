//! The immutable record produced at the end of a successful run.

use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, CatalogRecord};
use crate::coil;
use crate::devices::{RectifierDevice, SwitchDevice};
use crate::error::{ensure_finite, DesignError};
use crate::objective::{
    CoilLossPolicy, DeviceChoice, EfficiencyBasis, EvaluationRecord, EvaluationState, ObjectiveConfig,
};
use crate::optimizer::{SearchOutcome, Termination};
use crate::types::{CoilPair, SystemParameters};

/// The device chosen from one catalogue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedDevice {
    /// Position in the catalogue.
    pub index: usize,
    pub name: String,
    pub price: f64,
    /// Total loss over all units at the frequency it was selected (W).
    pub loss_w: f64,
    /// Price/performance score that selected it.
    pub score: f64,
    /// Frequency at which it first achieved that score (Hz).
    pub selected_at_hz: f64,
}

impl SelectedDevice {
    fn from_choice<T: CatalogRecord>(
        catalog: &Catalog<T>,
        choice: Option<&DeviceChoice>,
    ) -> Result<Self, DesignError> {
        let choice = choice.ok_or_else(|| {
            DesignError::config(format!("no {} was evaluated during the run", T::KIND))
        })?;
        let record = catalog.get(choice.index).ok_or_else(|| {
            DesignError::config(format!(
                "{} index {} is outside the catalog ({} entries)",
                T::KIND,
                choice.index,
                catalog.len()
            ))
        })?;
        Ok(Self {
            index: choice.index,
            name: record.name().to_string(),
            price: record.price(),
            loss_w: choice.loss,
            score: choice.score,
            selected_at_hz: choice.frequency_hz,
        })
    }
}

/// Snapshot of an optimisation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    /// Best switching frequency found by the optimiser (Hz).
    pub best_frequency_hz: f64,
    /// Objective value at the best frequency.
    pub best_objective: f64,
    pub switch: SelectedDevice,
    pub rectifier: SelectedDevice,
    /// Reported coil loss (W); see `coil_loss_policy`.
    pub coil_loss_w: f64,
    pub coil_loss_policy: CoilLossPolicy,
    pub coils: CoilPair,
    /// Power pushed through the link at the operating point (W).
    pub transferred_power_w: f64,
    /// $(P - P_{coil}) / (P + x_{switch} + x_{rect}) \times 100$, where $x$ is
    /// each device's score or loss according to `efficiency_basis`.
    pub system_efficiency_pct: f64,
    pub efficiency_basis: EfficiencyBasis,
    pub iterations: usize,
    pub evaluations: usize,
    pub termination: Termination,
    /// Every evaluation of the run, in order.
    #[serde(skip)]
    pub trace: Vec<EvaluationRecord>,
}

impl OptimizationResult {
    /// Assemble the result from the optimiser's best point and the
    /// objective's best-so-far state.
    pub fn assemble(
        outcome: &SearchOutcome,
        state: EvaluationState,
        system: &SystemParameters,
        coils: CoilPair,
        switches: &Catalog<SwitchDevice>,
        rectifiers: &Catalog<RectifierDevice>,
        objective: &ObjectiveConfig,
    ) -> Result<Self, DesignError> {
        let policy = objective.coil_loss_policy;
        let basis = objective.efficiency_basis;
        let switch = SelectedDevice::from_choice(switches, state.best_switch())?;
        let rectifier = SelectedDevice::from_choice(rectifiers, state.best_rectifier())?;

        let coil_loss_w = match policy {
            CoilLossPolicy::MostRecent => state
                .last_coil_loss()
                .ok_or_else(|| DesignError::config("no coil loss was recorded during the run"))?,
            CoilLossPolicy::AtBestFrequency => {
                coil::loss(system, outcome.best_frequency_hz, &coils)?
            }
        };

        let power = system.transferred_power();
        let device_terms = match basis {
            EfficiencyBasis::Score => switch.score + rectifier.score,
            EfficiencyBasis::Loss => switch.loss_w + rectifier.loss_w,
        };
        let denominator = power + device_terms;
        if denominator <= 0.0 {
            return Err(DesignError::numeric(format!(
                "system efficiency undefined: transferred power plus device {:?} is {}",
                basis, denominator
            )));
        }
        let system_efficiency_pct = ensure_finite(
            (power - coil_loss_w) / denominator * 100.0,
            "system efficiency",
        )?;

        Ok(Self {
            best_frequency_hz: outcome.best_frequency_hz,
            best_objective: outcome.best_value,
            switch,
            rectifier,
            coil_loss_w,
            coil_loss_policy: policy,
            coils,
            transferred_power_w: power,
            system_efficiency_pct,
            efficiency_basis: basis,
            iterations: outcome.iterations,
            evaluations: outcome.evaluations,
            termination: outcome.termination,
            trace: state.into_trace(),
        })
    }
}
