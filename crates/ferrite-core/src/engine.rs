//! Run driver: validates inputs, drives the swarm over the objective and
//! assembles the result.
//!
//! A run either returns a complete [`OptimizationResult`] or an error. On
//! error a [`RunEvent::Failed`] is emitted on the same channel as the normal
//! diagnostics before returning, and no partial result is produced.

use std::fmt::Write;

use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, CatalogRecord};
use crate::devices::{RectifierDevice, SwitchDevice};
use crate::error::DesignError;
use crate::events::{EventSink, RunEvent};
use crate::objective::{EvaluationRecord, ObjectiveConfig, ObjectiveFunction};
use crate::optimizer::{AbortHandle, FrequencyOptimizer, ParticleSwarm, SwarmConfig};
use crate::result::OptimizationResult;
use crate::types::SystemParameters;

/// Everything that configures a run besides the physical inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub swarm: SwarmConfig,
    #[serde(default)]
    pub objective: ObjectiveConfig,
}

/// Run a full optimisation.
pub fn optimize(
    system: &SystemParameters,
    switches: &Catalog<SwitchDevice>,
    rectifiers: &Catalog<RectifierDevice>,
    config: &RunConfig,
    events: &dyn EventSink,
    abort: &AbortHandle,
) -> Result<OptimizationResult, DesignError> {
    match run(system, switches, rectifiers, config, events, abort) {
        Ok(result) => {
            events.diagnostic(final_summary(&result));
            events.progress(1.0);
            Ok(result)
        }
        Err(err) => {
            log::error!("optimisation failed: {}", err);
            events.emit(RunEvent::Failed(format!(
                "\n!!!!!!!!!!!!!!!!!!!!\nOPTIMIZATION FAILED\n!!!!!!!!!!!!!!!!!!!!\n{}\n",
                err
            )));
            Err(err)
        }
    }
}

fn run(
    system: &SystemParameters,
    switches: &Catalog<SwitchDevice>,
    rectifiers: &Catalog<RectifierDevice>,
    config: &RunConfig,
    events: &dyn EventSink,
    abort: &AbortHandle,
) -> Result<OptimizationResult, DesignError> {
    let swarm = ParticleSwarm::new(config.swarm.clone())?;
    let mut objective = ObjectiveFunction::new(system, switches, rectifiers, &config.objective, events)?
        .with_budget(swarm.evaluation_budget());

    let cfg = swarm.config();
    log::info!(
        "{}: {} switches x {} rectifiers over {:.0}-{:.0} Hz",
        swarm.method_name(),
        switches.len(),
        rectifiers.len(),
        cfg.lower_hz,
        cfg.upper_hz
    );
    let mut header = String::new();
    let _ = writeln!(header, "{} Parameters:", swarm.method_name());
    let _ = writeln!(header, "  Frequency Range: {} - {} Hz", cfg.lower_hz, cfg.upper_hz);
    let _ = writeln!(header, "  Swarm Size: {}", cfg.swarm_size);
    let _ = writeln!(header, "  Max Iterations: {}", cfg.max_iterations);
    let _ = writeln!(header, "  Min Step: {}", cfg.min_step);
    if let Some(seed) = cfg.seed {
        let _ = writeln!(header, "  Seed: {}", seed);
    }
    events.diagnostic(header);
    events.progress(0.0);

    let outcome = swarm.minimize(&mut |f: f64| objective.evaluate(f), abort)?;

    let coils = objective.coils();
    OptimizationResult::assemble(
        &outcome,
        objective.into_state(),
        system,
        coils,
        switches,
        rectifiers,
        &config.objective,
    )
}

/// Evaluate the objective once at a fixed frequency, with full diagnostics.
pub fn evaluate_at(
    system: &SystemParameters,
    switches: &Catalog<SwitchDevice>,
    rectifiers: &Catalog<RectifierDevice>,
    config: &ObjectiveConfig,
    frequency_hz: f64,
    events: &dyn EventSink,
) -> Result<EvaluationRecord, DesignError> {
    let mut objective = ObjectiveFunction::new(system, switches, rectifiers, config, events)?;
    objective.evaluate(frequency_hz)?;
    objective
        .into_state()
        .into_trace()
        .pop()
        .ok_or_else(|| DesignError::numeric("evaluation produced no record"))
}

fn final_summary(result: &OptimizationResult) -> String {
    let mut text = String::new();
    let _ = writeln!(text, "\n====================\nOptimization Completed!\n====================");
    let _ = writeln!(text, "Best Frequency: {:.3} Hz", result.best_frequency_hz);
    let _ = writeln!(text, "Best Total Objective: {:.3}", result.best_objective);
    let _ = writeln!(
        text,
        "Best {}: {} ({:.3} W)",
        SwitchDevice::KIND,
        result.switch.name,
        result.switch.loss_w
    );
    let _ = writeln!(
        text,
        "Best {}: {} ({:.3} W)",
        RectifierDevice::KIND,
        result.rectifier.name,
        result.rectifier.loss_w
    );
    let _ = writeln!(text, "Coil Loss: {:.3} W", result.coil_loss_w);
    let _ = writeln!(text, "System Efficiency: {:.2} %", result.system_efficiency_pct);
    let _ = writeln!(
        text,
        "Evaluations: {} ({} iterations, stopped on {:?})",
        result.evaluations, result.iterations, result.termination
    );
    text
}
