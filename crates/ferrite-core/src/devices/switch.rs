//! Loss model for the inverter's switch devices (MOSFETs).

use serde::{Deserialize, Serialize};

use super::{DeviceLossModel, LossBreakdown, ModelAssumptions};
use crate::catalog::{CatalogRecord, RowReader};
use crate::error::DesignError;
use crate::types::SystemParameters;

const MILLI: f64 = 1e3;
const NANO: f64 = 1e9;

/// A switch device with all parameters in SI units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitchDevice {
    pub name: String,
    pub price: f64,
    pub manufacturer: String,
    pub package: String,
    /// Drain-source on-resistance (Ω).
    pub on_resistance: f64,
    /// Body-diode reverse voltage (V).
    pub reverse_voltage: f64,
    /// Maximum gate-source drive voltage (V).
    pub max_gate_voltage: f64,
    /// Rise time (s).
    pub rise_time: f64,
    /// Fall time (s).
    pub fall_time: f64,
    /// Total gate charge (C).
    pub gate_charge: f64,
    /// Body-diode reverse-recovery charge (C).
    pub reverse_recovery_charge: f64,
}

impl CatalogRecord for SwitchDevice {
    const KIND: &'static str = "switch";

    const COLUMNS: &'static [&'static str] = &[
        "name",
        "price",
        "manufacturer",
        "package",
        "on-resistance [mOhm]",
        "reverse voltage [V]",
        "max gate voltage [V]",
        "rise time [ns]",
        "fall time [ns]",
        "gate charge [nC]",
        "reverse-recovery charge [nC]",
    ];

    fn from_row(index: usize, cells: &[String]) -> Result<Self, DesignError> {
        let row = RowReader::new(Self::KIND, Self::COLUMNS, index, cells)?;
        Ok(Self {
            name: row.name().to_string(),
            price: row.number(1)?,
            manufacturer: row.text(2),
            package: row.text(3),
            on_resistance: row.number(4)? / MILLI,
            reverse_voltage: row.number(5)?,
            max_gate_voltage: row.number(6)?,
            rise_time: row.number(7)? / NANO,
            fall_time: row.number(8)? / NANO,
            gate_charge: row.number(9)? / NANO,
            reverse_recovery_charge: row.number(10)? / NANO,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn price(&self) -> f64 {
        self.price
    }
}

impl DeviceLossModel for SwitchDevice {
    /// - conduction: $R_{DS(on)} I_{rms}^2$
    /// - switching: $V_{DS} I_{DS} (t_r + t_f) f / 2$
    /// - gate drive: $Q_g V_{GS,max} f$
    /// - reverse recovery: $Q_{rr} V_{SD} f / 2$
    fn losses(
        &self,
        system: &SystemParameters,
        frequency_hz: f64,
        _assumptions: &ModelAssumptions,
    ) -> Result<LossBreakdown, DesignError> {
        let op = &system.operating_point;

        let conduction = self.on_resistance * op.switch_rms_current.powi(2);
        let switching = op.switch_voltage
            * op.switch_current
            * (self.rise_time + self.fall_time)
            * frequency_hz
            / 2.0;
        let gate_drive = self.gate_charge * self.max_gate_voltage * frequency_hz;
        let reverse_recovery =
            self.reverse_recovery_charge * self.reverse_voltage * frequency_hz / 2.0;

        LossBreakdown::new(
            conduction,
            switching,
            Some(gate_drive),
            reverse_recovery,
            system.switch_count,
        )
    }
}
