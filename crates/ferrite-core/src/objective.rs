//! Stateful objective function evaluated by the frequency optimiser.
//!
//! For one candidate frequency, every switch and rectifier in the
//! catalogues is run through its loss model and scored by a weighted blend
//! of loss and normalised price. The objective value is the best switch
//! score plus the best rectifier score plus the coil loss.
//!
//! As a side effect, each evaluation updates the run's [`EvaluationState`]:
//! the best score per device class only ever decreases (strict `<`, so the
//! first choice found wins ties), while the coil loss is overwritten on every
//! call and therefore reflects the most recently evaluated frequency.

use std::fmt::Write;

use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, CatalogRecord};
use crate::coil;
use crate::devices::{DeviceLossModel, LossBreakdown, ModelAssumptions, RectifierDevice, SwitchDevice};
use crate::error::{ensure_finite, DesignError};
use crate::events::EventSink;
use crate::types::{CoilPair, SystemParameters};

const RULE: &str = "----------------------------------------";

/// Which coil loss the final result reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoilLossPolicy {
    /// The coil loss of the last frequency evaluated during the run.
    #[default]
    MostRecent,
    /// The coil loss recomputed at the optimiser's best frequency.
    AtBestFrequency,
}

/// Which per-device figure enters the system efficiency of the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EfficiencyBasis {
    /// The price/performance score that selected each device.
    #[default]
    Score,
    /// The electrical loss of each device in watts.
    Loss,
}

/// Weights and assumptions of the price/performance blend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectiveConfig {
    /// Weight applied to device loss (W).
    pub loss_weight: f64,
    /// Weight applied to the normalised price.
    pub price_weight: f64,
    /// Price is divided by this before weighting.
    pub price_normalization: f64,
    pub assumptions: ModelAssumptions,
    pub coil_loss_policy: CoilLossPolicy,
    pub efficiency_basis: EfficiencyBasis,
}

impl Default for ObjectiveConfig {
    fn default() -> Self {
        Self {
            loss_weight: 0.5,
            price_weight: 0.5,
            price_normalization: 20.0,
            assumptions: ModelAssumptions::default(),
            coil_loss_policy: CoilLossPolicy::default(),
            efficiency_basis: EfficiencyBasis::default(),
        }
    }
}

impl ObjectiveConfig {
    pub fn validate(&self) -> Result<(), DesignError> {
        for (label, value) in [
            ("loss weight", self.loss_weight),
            ("price weight", self.price_weight),
            (
                "rectifier reverse-recovery charge",
                self.assumptions.rectifier_reverse_recovery_charge,
            ),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(DesignError::config(format!(
                    "{} must be finite and non-negative, got {}",
                    label, value
                )));
            }
        }
        if !(self.price_normalization.is_finite() && self.price_normalization > 0.0) {
            return Err(DesignError::config(format!(
                "price normalization must be positive, got {}",
                self.price_normalization
            )));
        }
        Ok(())
    }

    /// Price/performance score of one catalogue entry.
    pub fn score(&self, loss: f64, price: f64) -> f64 {
        self.loss_weight * loss + self.price_weight * (price / self.price_normalization)
    }
}

/// The best entry of one catalogue at one frequency.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeviceChoice {
    /// Position in the catalogue.
    pub index: usize,
    /// Price/performance score.
    pub score: f64,
    /// Total electrical loss over all units (W).
    pub loss: f64,
    /// Frequency at which the choice was made (Hz).
    pub frequency_hz: f64,
}

/// One row of the evaluation trace.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    /// One-based evaluation counter.
    pub evaluation: usize,
    pub frequency_hz: f64,
    pub switch: DeviceChoice,
    pub rectifier: DeviceChoice,
    pub coil_loss: f64,
    pub objective: f64,
}

/// Best-so-far state of one optimisation run.
#[derive(Debug, Clone, Default)]
pub struct EvaluationState {
    best_switch: Option<DeviceChoice>,
    best_rectifier: Option<DeviceChoice>,
    last_coil_loss: Option<f64>,
    trace: Vec<EvaluationRecord>,
}

impl EvaluationState {
    pub fn best_switch(&self) -> Option<&DeviceChoice> {
        self.best_switch.as_ref()
    }

    pub fn best_rectifier(&self) -> Option<&DeviceChoice> {
        self.best_rectifier.as_ref()
    }

    /// Coil loss of the most recent evaluation (W).
    pub fn last_coil_loss(&self) -> Option<f64> {
        self.last_coil_loss
    }

    pub fn evaluations(&self) -> usize {
        self.trace.len()
    }

    pub fn trace(&self) -> &[EvaluationRecord] {
        &self.trace
    }

    pub fn into_trace(self) -> Vec<EvaluationRecord> {
        self.trace
    }

    fn improves(best: &Option<DeviceChoice>, candidate: &DeviceChoice) -> bool {
        best.map_or(true, |b| candidate.score < b.score)
    }
}

/// The objective closure over the system description and both catalogues.
///
/// One instance is owned exclusively by one run.
pub struct ObjectiveFunction<'a> {
    system: &'a SystemParameters,
    switches: &'a Catalog<SwitchDevice>,
    rectifiers: &'a Catalog<RectifierDevice>,
    config: &'a ObjectiveConfig,
    events: &'a dyn EventSink,
    coils: CoilPair,
    state: EvaluationState,
    budget: Option<usize>,
}

impl<'a> ObjectiveFunction<'a> {
    pub fn new(
        system: &'a SystemParameters,
        switches: &'a Catalog<SwitchDevice>,
        rectifiers: &'a Catalog<RectifierDevice>,
        config: &'a ObjectiveConfig,
        events: &'a dyn EventSink,
    ) -> Result<Self, DesignError> {
        system.validate()?;
        config.validate()?;

        Ok(Self {
            system,
            switches,
            rectifiers,
            config,
            events,
            coils: system.coil_pair(),
            state: EvaluationState::default(),
            budget: None,
        })
    }

    /// Set the expected number of evaluations. Progress is reported as the
    /// fraction of this budget used; without a budget no progress is sent.
    pub fn with_budget(mut self, evaluations: usize) -> Self {
        self.budget = Some(evaluations.max(1));
        self
    }

    pub fn coils(&self) -> CoilPair {
        self.coils
    }

    pub fn state(&self) -> &EvaluationState {
        &self.state
    }

    pub fn into_state(self) -> EvaluationState {
        self.state
    }

    /// Evaluate the objective at `frequency_hz` and update the run state.
    pub fn evaluate(&mut self, frequency_hz: f64) -> Result<f64, DesignError> {
        if !(frequency_hz.is_finite() && frequency_hz > 0.0) {
            return Err(DesignError::numeric(format!(
                "objective evaluated at invalid frequency {}",
                frequency_hz
            )));
        }
        let evaluation = self.state.evaluations() + 1;

        self.events.diagnostic(format!(
            "\n====================\nEVALUATION #{}\nFREQUENCY: {:.3} Hz\n====================\n",
            evaluation, frequency_hz
        ));

        self.events
            .diagnostic(format!("\nSWITCH ANALYSIS:\n{}\n", RULE));
        let switch = self.best_entry(self.switches, frequency_hz)?;

        self.events
            .diagnostic(format!("\nRECTIFIER ANALYSIS:\n{}\n", RULE));
        let rectifier = self.best_entry(self.rectifiers, frequency_hz)?;

        let coil_loss = ensure_finite(
            coil::loss(self.system, frequency_hz, &self.coils)?,
            "coil loss",
        )?;
        let objective = ensure_finite(switch.score + rectifier.score + coil_loss, "objective")?;

        let mut summary = String::new();
        let _ = writeln!(summary, "\nCOIL ANALYSIS:\n  Coil loss: {:.3} W", coil_loss);
        let _ = writeln!(summary, "\nFREQUENCY {:.3} Hz SUMMARY:", frequency_hz);
        let _ = writeln!(summary, "  Best switch score:    {:.3}", switch.score);
        let _ = writeln!(summary, "  Best rectifier score: {:.3}", rectifier.score);
        let _ = writeln!(summary, "  Coil loss:            {:.3} W", coil_loss);
        let _ = writeln!(summary, "  Total objective:      {:.3}", objective);

        if EvaluationState::improves(&self.state.best_switch, &switch) {
            self.state.best_switch = Some(switch);
            let name = self.switches.records()[switch.index].name();
            log::debug!("new best switch '{}' (score {:.4}) at {:.1} Hz", name, switch.score, frequency_hz);
            let _ = writeln!(summary, "\n  >>> NEW BEST SWITCH: {}", name);
        }
        if EvaluationState::improves(&self.state.best_rectifier, &rectifier) {
            self.state.best_rectifier = Some(rectifier);
            let name = self.rectifiers.records()[rectifier.index].name();
            log::debug!("new best rectifier '{}' (score {:.4}) at {:.1} Hz", name, rectifier.score, frequency_hz);
            let _ = writeln!(summary, "\n  >>> NEW BEST RECTIFIER: {}", name);
        }
        self.state.last_coil_loss = Some(coil_loss);
        self.state.trace.push(EvaluationRecord {
            evaluation,
            frequency_hz,
            switch,
            rectifier,
            coil_loss,
            objective,
        });

        self.events.diagnostic(summary);
        if let Some(budget) = self.budget {
            self.events
                .progress((evaluation as f64 / budget as f64).min(1.0));
        }

        Ok(objective)
    }

    /// Score every entry of `catalog` and return the first minimum.
    fn best_entry<T: DeviceLossModel>(
        &self,
        catalog: &Catalog<T>,
        frequency_hz: f64,
    ) -> Result<DeviceChoice, DesignError> {
        let mut best: Option<DeviceChoice> = None;

        for (index, device) in catalog.iter().enumerate() {
            let losses = device.losses(self.system, frequency_hz, &self.config.assumptions)?;
            let score = ensure_finite(
                self.config.score(losses.total, device.price()),
                "price/performance score",
            )?;
            self.events
                .diagnostic(describe_device(T::KIND, device.name(), &losses, score));

            let candidate = DeviceChoice {
                index,
                score,
                loss: losses.total,
                frequency_hz,
            };
            if best.map_or(true, |b| candidate.score < b.score) {
                best = Some(candidate);
            }
        }

        best.ok_or_else(|| DesignError::config(format!("{} catalog is empty", T::KIND)))
    }
}

fn describe_device(kind: &str, name: &str, losses: &LossBreakdown, score: f64) -> String {
    let mut block = String::new();
    let _ = writeln!(block, "{}: {}", kind.to_uppercase(), name);
    let _ = writeln!(block, "  Conduction loss:        {:.3} W", losses.conduction);
    let _ = writeln!(block, "  Switching loss:         {:.3} W", losses.switching);
    if let Some(gate) = losses.gate_drive {
        let _ = writeln!(block, "  Gate-drive loss:        {:.3} W", gate);
    }
    let _ = writeln!(block, "  Reverse-recovery loss:  {:.3} W", losses.reverse_recovery);
    let _ = writeln!(block, "  Total loss ({} units):   {:.3} W", losses.units, losses.total);
    let _ = writeln!(block, "  Price/performance:      {:.3}", score);
    let _ = writeln!(block, "{}", RULE);
    block
}
