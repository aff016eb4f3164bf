//! Core types shared across the Ferrite framework.
//!
//! This module defines the physical description of the link: the geometry
//! of each planar coil, the electrical operating point, and the derived
//! inductance/resistance pair used by every objective evaluation.

use serde::{Deserialize, Serialize};

use crate::coil;
use crate::error::DesignError;

/// Geometry of a flat spiral coil.
///
/// All lengths are in millimetres. The inner diameter is derived and must be
/// strictly positive, so construction goes through [`CoilGeometry::new`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CoilGeometry {
    turns: u32,
    wire_diameter_mm: f64,
    wire_spacing_mm: f64,
    outer_diameter_mm: f64,
}

impl CoilGeometry {
    /// Build a coil, rejecting geometries whose windings do not fit inside
    /// the outer diameter.
    pub fn new(
        turns: u32,
        wire_diameter_mm: f64,
        wire_spacing_mm: f64,
        outer_diameter_mm: f64,
    ) -> Result<Self, DesignError> {
        if turns == 0 {
            return Err(DesignError::config("coil must have at least one turn"));
        }
        for (label, value) in [
            ("wire diameter", wire_diameter_mm),
            ("outer diameter", outer_diameter_mm),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(DesignError::config(format!(
                    "coil {} must be positive, got {}",
                    label, value
                )));
            }
        }
        if !(wire_spacing_mm.is_finite() && wire_spacing_mm >= 0.0) {
            return Err(DesignError::config(format!(
                "coil wire spacing must be non-negative, got {}",
                wire_spacing_mm
            )));
        }

        let geometry = Self {
            turns,
            wire_diameter_mm,
            wire_spacing_mm,
            outer_diameter_mm,
        };
        let inner = geometry.inner_diameter_mm();
        if inner <= 0.0 {
            return Err(DesignError::config(format!(
                "coil inner diameter must be positive, got {:.3} mm \
                 ({} turns of {} mm wire at {} mm spacing in {} mm)",
                inner, turns, wire_diameter_mm, wire_spacing_mm, outer_diameter_mm
            )));
        }
        Ok(geometry)
    }

    pub fn turns(&self) -> u32 {
        self.turns
    }

    pub fn wire_diameter_mm(&self) -> f64 {
        self.wire_diameter_mm
    }

    pub fn wire_spacing_mm(&self) -> f64 {
        self.wire_spacing_mm
    }

    pub fn outer_diameter_mm(&self) -> f64 {
        self.outer_diameter_mm
    }

    /// Radial width of the winding (mm): turns × (wire diameter + spacing).
    pub fn winding_width_mm(&self) -> f64 {
        self.turns as f64 * (self.wire_diameter_mm + self.wire_spacing_mm)
    }

    /// Inner diameter (mm): $D_i = D_o - 2 N (d + s)$.
    pub fn inner_diameter_mm(&self) -> f64 {
        self.outer_diameter_mm - 2.0 * self.winding_width_mm()
    }

    /// Mean of the inner and outer diameters (mm).
    pub fn mean_diameter_mm(&self) -> f64 {
        0.5 * (self.outer_diameter_mm + self.inner_diameter_mm())
    }

    /// Total conductor length in metres: $\pi N \bar{D}$.
    pub fn wire_length_m(&self) -> f64 {
        std::f64::consts::PI * self.turns as f64 * self.mean_diameter_mm() / 1000.0
    }
}

/// Currents and voltages at the converter's operating point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OperatingPoint {
    /// RMS current through each switch (A).
    pub switch_rms_current: f64,
    /// Drain-source voltage blocked by each switch (V). Also the link
    /// voltage used for the transferred power.
    pub switch_voltage: f64,
    /// Drain current at the switching instant (A).
    pub switch_current: f64,
    /// Current in the transmitting coil (A).
    pub coil_current: f64,
    /// Effective (RMS) current through each rectifier (A).
    pub rectifier_effective_current: f64,
    /// Mean current through each rectifier (A).
    pub rectifier_mean_current: f64,
    /// Voltage across each rectifier when blocking (V).
    pub rectifier_voltage: f64,
}

/// The full electrical description of the link handed to the optimiser.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemParameters {
    /// Magnetic coupling coefficient $k \in (0, 1]$.
    pub coupling: f64,
    /// Equivalent load resistance seen by the receiving coil (Ω).
    pub load_resistance: f64,
    /// Number of switch devices in the inverter.
    pub switch_count: u32,
    /// Number of rectifying devices in the receiver.
    pub rectifier_count: u32,
    pub operating_point: OperatingPoint,
    pub tx_coil: CoilGeometry,
    pub rx_coil: CoilGeometry,
    /// Conductor resistance of the transmitting coil (Ω/m).
    pub tx_resistance_per_m: f64,
    /// Conductor resistance of the receiving coil (Ω/m).
    pub rx_resistance_per_m: f64,
}

impl SystemParameters {
    /// Check the ranges the loss models rely on.
    pub fn validate(&self) -> Result<(), DesignError> {
        if !(self.coupling > 0.0 && self.coupling <= 1.0) {
            return Err(DesignError::config(format!(
                "coupling coefficient must lie in (0, 1], got {}",
                self.coupling
            )));
        }
        if !(self.load_resistance.is_finite() && self.load_resistance > 0.0) {
            return Err(DesignError::config(format!(
                "equivalent load resistance must be positive, got {}",
                self.load_resistance
            )));
        }
        if self.switch_count == 0 || self.rectifier_count == 0 {
            return Err(DesignError::config(
                "switch and rectifier counts must be positive",
            ));
        }

        let op = &self.operating_point;
        let quantities = [
            ("switch RMS current", op.switch_rms_current),
            ("switch voltage", op.switch_voltage),
            ("switch current", op.switch_current),
            ("coil current", op.coil_current),
            ("rectifier effective current", op.rectifier_effective_current),
            ("rectifier mean current", op.rectifier_mean_current),
            ("rectifier voltage", op.rectifier_voltage),
            ("TX resistance per metre", self.tx_resistance_per_m),
            ("RX resistance per metre", self.rx_resistance_per_m),
        ];
        for (label, value) in quantities {
            if !(value.is_finite() && value >= 0.0) {
                return Err(DesignError::config(format!(
                    "{} must be finite and non-negative, got {}",
                    label, value
                )));
            }
        }
        Ok(())
    }

    /// Power pushed through the link at the operating point (W).
    pub fn transferred_power(&self) -> f64 {
        self.operating_point.switch_voltage * self.operating_point.coil_current
    }

    /// Derive inductance and resistance for both coils.
    pub fn coil_pair(&self) -> CoilPair {
        CoilPair {
            tx_inductance: coil::inductance(&self.tx_coil),
            rx_inductance: coil::inductance(&self.rx_coil),
            tx_resistance: coil::resistance(&self.tx_coil, self.tx_resistance_per_m),
            rx_resistance: coil::resistance(&self.rx_coil, self.rx_resistance_per_m),
        }
    }
}

/// Frequency-independent electrical properties of the two coils.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoilPair {
    /// Transmitting coil inductance (H).
    pub tx_inductance: f64,
    /// Receiving coil inductance (H).
    pub rx_inductance: f64,
    /// Transmitting coil resistance (Ω).
    pub tx_resistance: f64,
    /// Receiving coil resistance (Ω).
    pub rx_resistance: f64,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// A 100 W class link with two identical 10-turn coils.
    pub fn reference_system() -> SystemParameters {
        let coil = CoilGeometry::new(10, 1.0, 0.5, 100.0).unwrap();
        SystemParameters {
            coupling: 0.2,
            load_resistance: 10.0,
            switch_count: 4,
            rectifier_count: 4,
            operating_point: OperatingPoint {
                switch_rms_current: 3.0,
                switch_voltage: 48.0,
                switch_current: 4.0,
                coil_current: 2.0,
                rectifier_effective_current: 2.5,
                rectifier_mean_current: 1.5,
                rectifier_voltage: 24.0,
            },
            tx_coil: coil,
            rx_coil: coil,
            tx_resistance_per_m: 0.02,
            rx_resistance_per_m: 0.02,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::reference_system;
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_inner_diameter() {
        let coil = CoilGeometry::new(10, 1.0, 0.5, 100.0).unwrap();
        assert_relative_eq!(coil.inner_diameter_mm(), 70.0, epsilon = 1e-12);
        assert_relative_eq!(coil.mean_diameter_mm(), 85.0, epsilon = 1e-12);
    }

    #[test]
    fn test_inner_diameter_grows_as_turns_drop() {
        let mut previous = f64::NEG_INFINITY;
        for turns in (1..=30).rev() {
            let coil = CoilGeometry::new(turns, 1.0, 0.5, 100.0).unwrap();
            assert!(coil.inner_diameter_mm() > previous);
            previous = coil.inner_diameter_mm();
        }
    }

    #[test]
    fn test_wire_length_proportional_to_turns_at_fixed_mean_diameter() {
        for turns in 1..=30 {
            let coil = CoilGeometry::new(turns, 1.0, 0.5, 100.0).unwrap();
            let per_turn = coil.wire_length_m() / turns as f64;
            let circumference = std::f64::consts::PI * coil.mean_diameter_mm() / 1000.0;
            assert_relative_eq!(per_turn, circumference, max_relative = 1e-12);
        }
    }

    #[test]
    fn test_overfull_coil_rejected() {
        // 40 turns × 1.5 mm × 2 = 120 mm > 100 mm
        let err = CoilGeometry::new(40, 1.0, 0.5, 100.0).unwrap_err();
        assert!(matches!(err, DesignError::Configuration(_)));
        // Exactly filled: inner diameter of zero is still invalid.
        assert!(CoilGeometry::new(50, 0.5, 0.5, 100.0).is_err());
    }

    #[test]
    fn test_zero_turns_rejected() {
        assert!(CoilGeometry::new(0, 1.0, 0.5, 100.0).is_err());
    }

    #[test]
    fn test_system_validation() {
        let mut system = reference_system();
        assert!(system.validate().is_ok());

        system.coupling = 1.5;
        assert!(system.validate().is_err());
        system.coupling = 0.0;
        assert!(system.validate().is_err());
        system.coupling = 1.0;
        assert!(system.validate().is_ok());

        system.switch_count = 0;
        assert!(system.validate().is_err());
        system.switch_count = 2;

        system.operating_point.coil_current = f64::NAN;
        assert!(system.validate().is_err());
    }

    #[test]
    fn test_transferred_power() {
        let system = reference_system();
        assert_relative_eq!(system.transferred_power(), 96.0);
    }
}
