//! TOML configuration deserialisation for optimisation jobs.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use ferrite_core::objective::ObjectiveConfig;
use ferrite_core::optimizer::SwarmConfig;

/// Top-level job configuration.
#[derive(Debug, Deserialize)]
pub struct JobConfig {
    pub system: SystemConfig,
    pub optimizer: SwarmConfig,
    #[serde(default)]
    pub objective: ObjectiveConfig,
    pub catalogs: CatalogsConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Link description and operating point.
#[derive(Debug, Deserialize)]
pub struct SystemConfig {
    /// Magnetic coupling coefficient k.
    pub coupling: f64,
    /// Equivalent load resistance in Ω.
    pub load_resistance: f64,
    /// Switches in the inverter (default: 4, full bridge).
    #[serde(default = "default_bridge_count")]
    pub switch_count: u32,
    /// Rectifying devices in the receiver (default: 4, full bridge).
    #[serde(default = "default_bridge_count")]
    pub rectifier_count: u32,
    pub switch_rms_current: f64,
    pub switch_voltage: f64,
    pub switch_current: f64,
    pub coil_current: f64,
    pub rectifier_effective_current: f64,
    pub rectifier_mean_current: f64,
    pub rectifier_voltage: f64,
    pub tx_coil: CoilConfig,
    pub rx_coil: CoilConfig,
}

fn default_bridge_count() -> u32 {
    4
}

/// One flat spiral coil. Lengths in mm.
#[derive(Debug, Deserialize)]
pub struct CoilConfig {
    pub turns: u32,
    pub wire_diameter_mm: f64,
    #[serde(default)]
    pub wire_spacing_mm: f64,
    pub outer_diameter_mm: f64,
    /// Conductor resistance in Ω/m.
    pub resistance_per_m: f64,
}

/// Catalogue files. Relative paths are resolved against the job file.
#[derive(Debug, Deserialize)]
pub struct CatalogsConfig {
    pub switches: PathBuf,
    pub rectifiers: PathBuf,
}

impl CatalogsConfig {
    pub fn switches_path(&self, base: &Path) -> PathBuf {
        base.join(&self.switches)
    }

    pub fn rectifiers_path(&self, base: &Path) -> PathBuf {
        base.join(&self.rectifiers)
    }
}

/// Output configuration.
#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    /// Output directory (default: "./output").
    #[serde(default = "default_output_dir")]
    pub directory: String,
    /// Write the result as `result.json` (default: true).
    #[serde(default = "default_true")]
    pub save_result: bool,
    /// Write every evaluation to `evaluations.csv` (default: true).
    #[serde(default = "default_true")]
    pub save_evaluations: bool,
    /// Write the full diagnostic transcript to `diagnostics.log` (default: false).
    #[serde(default)]
    pub save_diagnostics: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_dir(),
            save_result: true,
            save_evaluations: true,
            save_diagnostics: false,
        }
    }
}

fn default_output_dir() -> String {
    "./output".into()
}
fn default_true() -> bool {
    true
}

/// Load and parse a TOML job configuration file.
pub fn load_config(path: &Path) -> anyhow::Result<JobConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading job file {}", path.display()))?;
    let config: JobConfig = toml::from_str(&content)
        .with_context(|| format!("parsing job file {}", path.display()))?;
    Ok(config)
}

/// Directory that relative paths in the job file are resolved against.
pub fn job_dir(path: &Path) -> PathBuf {
    path.parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}
