//! Loss model for the receiver's rectifying devices (diodes).
//!
//! Diode catalogues do not list a dynamic resistance or reverse-recovery
//! charge. The dynamic resistance is approximated as $V_F / I_{mean}$ and the
//! reverse-recovery charge is taken from [`ModelAssumptions`].

use serde::{Deserialize, Serialize};

use super::{DeviceLossModel, LossBreakdown, ModelAssumptions};
use crate::catalog::{CatalogRecord, RowReader};
use crate::error::{ensure_finite, DesignError};
use crate::types::SystemParameters;

const PICO: f64 = 1e12;

/// A rectifying device with all parameters in SI units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RectifierDevice {
    pub name: String,
    pub price: f64,
    pub manufacturer: String,
    pub package: String,
    /// Forward voltage drop (V).
    pub forward_voltage: f64,
    /// Junction capacitance (F).
    pub junction_capacitance: f64,
}

impl RectifierDevice {
    /// Approximate dynamic resistance (Ω): $V_F / I_{mean}$.
    pub fn dynamic_resistance(&self, system: &SystemParameters) -> Result<f64, DesignError> {
        let mean = system.operating_point.rectifier_mean_current;
        if mean <= 0.0 {
            return Err(DesignError::numeric(format!(
                "rectifier '{}': dynamic resistance needs a positive mean current, got {}",
                self.name, mean
            )));
        }
        ensure_finite(self.forward_voltage / mean, "rectifier dynamic resistance")
    }

    /// Charge moved through the junction capacitance each cycle (C).
    pub fn switched_charge(&self, system: &SystemParameters) -> f64 {
        system.operating_point.rectifier_voltage * self.junction_capacitance
    }
}

impl CatalogRecord for RectifierDevice {
    const KIND: &'static str = "rectifier";

    const COLUMNS: &'static [&'static str] = &[
        "name",
        "price",
        "manufacturer",
        "package",
        "forward voltage [V]",
        "junction capacitance [pF]",
    ];

    fn from_row(index: usize, cells: &[String]) -> Result<Self, DesignError> {
        let row = RowReader::new(Self::KIND, Self::COLUMNS, index, cells)?;
        Ok(Self {
            name: row.name().to_string(),
            price: row.number(1)?,
            manufacturer: row.text(2),
            package: row.text(3),
            forward_voltage: row.number(4)?,
            junction_capacitance: row.number(5)? / PICO,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn price(&self) -> f64 {
        self.price
    }
}

impl DeviceLossModel for RectifierDevice {
    /// - conduction: $r_d I_{eff}^2 + V_F I_{mean}$
    /// - switching: $Q_c V_D f$ with $Q_c = V_D C_j$
    /// - reverse recovery: $Q_{rr} V_D f / 2$
    fn losses(
        &self,
        system: &SystemParameters,
        frequency_hz: f64,
        assumptions: &ModelAssumptions,
    ) -> Result<LossBreakdown, DesignError> {
        let op = &system.operating_point;
        let r_d = self.dynamic_resistance(system)?;
        let q_c = self.switched_charge(system);
        let q_rr = assumptions.rectifier_reverse_recovery_charge;

        let conduction = r_d * op.rectifier_effective_current.powi(2)
            + self.forward_voltage * op.rectifier_mean_current;
        let switching = q_c * op.rectifier_voltage * frequency_hz;
        let reverse_recovery = q_rr * op.rectifier_voltage * frequency_hz / 2.0;

        LossBreakdown::new(
            conduction,
            switching,
            None,
            reverse_recovery,
            system.rectifier_count,
        )
    }
}
