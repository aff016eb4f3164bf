//! Analytic model of the coupled coil pair.
//!
//! Inductance follows Wheeler's approximation for flat spiral coils; the
//! link efficiency is the standard two-port expression for a series-tuned,
//! resistively loaded secondary.
//!
//! # Reference
//! H. A. Wheeler, "Simple Inductance Formulas for Radio Coils",
//! *Proc. IRE* **16**, 1398 (1928).

use std::f64::consts::PI;

use crate::error::{ensure_finite, DesignError};
use crate::types::{CoilGeometry, CoilPair, SystemParameters};

const MM_PER_INCH: f64 = 25.4;
const MICROHENRY: f64 = 1e-6;

/// Self-inductance of a flat spiral coil (H).
///
/// $L = \frac{\bar{r}^2 N^2}{8 \bar{r} + 11 w}$ µH, with the mean radius
/// $\bar{r} = (D_i + w)/2$ and winding width $w = N (d + s)$, both in inches.
pub fn inductance(geometry: &CoilGeometry) -> f64 {
    let inner_in = geometry.inner_diameter_mm() / MM_PER_INCH;
    let width_in = geometry.winding_width_mm() / MM_PER_INCH;
    let mean_radius = (inner_in + width_in) / 2.0;
    let n = geometry.turns() as f64;

    mean_radius.powi(2) * n.powi(2) / (8.0 * mean_radius + 11.0 * width_in) * MICROHENRY
}

/// DC resistance of the coil conductor (Ω).
pub fn resistance(geometry: &CoilGeometry, resistance_per_m: f64) -> f64 {
    geometry.wire_length_m() * resistance_per_m
}

/// Power transfer efficiency of the coil pair at `frequency_hz`.
///
/// $\eta = \frac{R_L L_1 L_2 (\omega k)^2}
///   {(R_2 + R_L)\left[R_1 (R_2 + R_L) + (\omega k)^2 L_1 L_2\right]}$
///
/// Returns a [`DesignError::Numeric`] when the denominator vanishes or the
/// result leaves $[0, 1]$.
pub fn efficiency(
    system: &SystemParameters,
    frequency_hz: f64,
    coils: &CoilPair,
) -> Result<f64, DesignError> {
    let k = system.coupling;
    let r_load = system.load_resistance;
    let cross = (2.0 * PI * frequency_hz * k).powi(2) * coils.tx_inductance * coils.rx_inductance;

    let numerator = r_load * cross;
    let secondary = coils.rx_resistance + r_load;
    let denominator = secondary * (coils.tx_resistance * secondary + cross);

    if !(denominator.is_finite() && denominator > 0.0) {
        return Err(DesignError::numeric(format!(
            "coupling efficiency denominator is {} at {:.3} Hz",
            denominator, frequency_hz
        )));
    }

    let eta = ensure_finite(numerator / denominator, "coupling efficiency")?;
    if !(0.0..=1.0).contains(&eta) {
        return Err(DesignError::numeric(format!(
            "coupling efficiency {} outside [0, 1] at {:.3} Hz",
            eta, frequency_hz
        )));
    }
    Ok(eta)
}

/// Power dissipated in the coil pair (W): $(1 - \eta) P$.
pub fn loss(
    system: &SystemParameters,
    frequency_hz: f64,
    coils: &CoilPair,
) -> Result<f64, DesignError> {
    let eta = efficiency(system, frequency_hz, coils)?;
    Ok(system.transferred_power() * (1.0 - eta))
}
