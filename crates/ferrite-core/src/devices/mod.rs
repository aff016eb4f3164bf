//! Semiconductor loss models.
//!
//! The [`DeviceLossModel`] trait gives the objective function a uniform way
//! to evaluate any catalogue entry at a candidate frequency. Implementations
//! are pure: identical inputs always yield identical outputs, and every term
//! is non-decreasing in frequency when the other inputs are fixed and
//! non-negative.

pub mod rectifier;
pub mod switch;

use serde::{Deserialize, Serialize};

use crate::catalog::CatalogRecord;
use crate::error::{ensure_finite, DesignError};
use crate::types::SystemParameters;

pub use rectifier::RectifierDevice;
pub use switch::SwitchDevice;

/// Modelling assumptions that are not derived from catalogue data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelAssumptions {
    /// Reverse-recovery charge assumed for every rectifier (C). Rectifier
    /// catalogues carry no such column, so this defaults to zero.
    pub rectifier_reverse_recovery_charge: f64,
}

impl Default for ModelAssumptions {
    fn default() -> Self {
        Self {
            rectifier_reverse_recovery_charge: 0.0,
        }
    }
}

/// Per-device loss terms (W, for a single device) and the total over all
/// units of that device in the converter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LossBreakdown {
    pub conduction: f64,
    pub switching: f64,
    /// Gate-drive loss; `None` for devices without a gate.
    pub gate_drive: Option<f64>,
    pub reverse_recovery: f64,
    /// Number of identical devices in the converter.
    pub units: u32,
    /// Sum of the terms above multiplied by `units`.
    pub total: f64,
}

impl LossBreakdown {
    pub(crate) fn new(
        conduction: f64,
        switching: f64,
        gate_drive: Option<f64>,
        reverse_recovery: f64,
        units: u32,
    ) -> Result<Self, DesignError> {
        let per_unit = conduction + switching + gate_drive.unwrap_or(0.0) + reverse_recovery;
        let total = ensure_finite(per_unit * units as f64, "device loss")?;
        Ok(Self {
            conduction,
            switching,
            gate_drive,
            reverse_recovery,
            units,
            total,
        })
    }
}

/// A catalogue entry whose electrical loss can be evaluated at a frequency.
pub trait DeviceLossModel: CatalogRecord {
    /// Evaluate all loss terms at `frequency_hz` for the converter described
    /// by `system`.
    fn losses(
        &self,
        system: &SystemParameters,
        frequency_hz: f64,
        assumptions: &ModelAssumptions,
    ) -> Result<LossBreakdown, DesignError>;
}
