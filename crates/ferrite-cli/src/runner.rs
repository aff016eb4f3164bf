//! Job runner: builds the link and catalogues, drives the optimiser on a
//! worker thread and writes the outputs.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};

use ferrite_catalog::{load_rectifier_catalog, load_switch_catalog};
use ferrite_core::catalog::Catalog;
use ferrite_core::devices::{RectifierDevice, SwitchDevice};
use ferrite_core::engine::{optimize, RunConfig};
use ferrite_core::events::RunEvent;
use ferrite_core::objective::EvaluationRecord;
use ferrite_core::optimizer::AbortHandle;
use ferrite_core::result::OptimizationResult;
use ferrite_core::types::{CoilGeometry, OperatingPoint, SystemParameters};

use crate::config::{CoilConfig, JobConfig, SystemConfig};

/// Everything a run needs, validated.
pub struct JobInputs {
    pub system: SystemParameters,
    pub switches: Catalog<SwitchDevice>,
    pub rectifiers: Catalog<RectifierDevice>,
    pub run: RunConfig,
}

/// Build validated core inputs from a parsed job. Catalogue paths are
/// resolved against `base`.
pub fn prepare(job: &JobConfig, base: &Path) -> Result<JobInputs> {
    let system = build_system(&job.system)?;

    let switch_path = job.catalogs.switches_path(base);
    let switches = load_switch_catalog(&switch_path)
        .with_context(|| format!("loading switch catalog {}", switch_path.display()))?;
    let rectifier_path = job.catalogs.rectifiers_path(base);
    let rectifiers = load_rectifier_catalog(&rectifier_path)
        .with_context(|| format!("loading rectifier catalog {}", rectifier_path.display()))?;

    let run = RunConfig {
        swarm: job.optimizer.clone(),
        objective: job.objective.clone(),
    };
    run.swarm.validate().context("invalid [optimizer] section")?;
    run.objective.validate().context("invalid [objective] section")?;

    println!(
        "  Catalogs: {} switches, {} rectifiers",
        switches.len(),
        rectifiers.len()
    );
    Ok(JobInputs {
        system,
        switches,
        rectifiers,
        run,
    })
}

fn build_coil(coil: &CoilConfig, label: &str) -> Result<CoilGeometry> {
    CoilGeometry::new(
        coil.turns,
        coil.wire_diameter_mm,
        coil.wire_spacing_mm,
        coil.outer_diameter_mm,
    )
    .with_context(|| format!("invalid [system.{}] section", label))
}

/// Map the `[system]` section onto validated core parameters.
pub fn build_system(cfg: &SystemConfig) -> Result<SystemParameters> {
    let system = SystemParameters {
        coupling: cfg.coupling,
        load_resistance: cfg.load_resistance,
        switch_count: cfg.switch_count,
        rectifier_count: cfg.rectifier_count,
        operating_point: OperatingPoint {
            switch_rms_current: cfg.switch_rms_current,
            switch_voltage: cfg.switch_voltage,
            switch_current: cfg.switch_current,
            coil_current: cfg.coil_current,
            rectifier_effective_current: cfg.rectifier_effective_current,
            rectifier_mean_current: cfg.rectifier_mean_current,
            rectifier_voltage: cfg.rectifier_voltage,
        },
        tx_coil: build_coil(&cfg.tx_coil, "tx_coil")?,
        rx_coil: build_coil(&cfg.rx_coil, "rx_coil")?,
        tx_resistance_per_m: cfg.tx_coil.resistance_per_m,
        rx_resistance_per_m: cfg.rx_coil.resistance_per_m,
    };
    system.validate().context("invalid [system] section")?;
    Ok(system)
}

/// Run the optimiser on a worker thread while this thread drains the event
/// channel. Diagnostics go to `diagnostics` when given, otherwise to the
/// `trace` log level. When `time_limit` elapses the search is aborted at its
/// next iteration boundary and no result is returned.
pub fn run_optimization(
    inputs: &JobInputs,
    mut diagnostics: Option<&mut dyn Write>,
    time_limit: Option<Duration>,
) -> Result<OptimizationResult> {
    let (tx, rx) = mpsc::channel::<RunEvent>();
    let abort = AbortHandle::new();
    let mut deadline = time_limit.map(|limit| Instant::now() + limit);

    std::thread::scope(|scope| {
        let worker = scope.spawn(|| {
            let sink = tx;
            optimize(
                &inputs.system,
                &inputs.switches,
                &inputs.rectifiers,
                &inputs.run,
                &sink,
                &abort,
            )
        });

        let mut next_report = 0.0;
        let mut write_error = None;
        loop {
            let event = match deadline {
                Some(at) => match rx.recv_timeout(at.saturating_duration_since(Instant::now())) {
                    Ok(event) => event,
                    Err(RecvTimeoutError::Timeout) => {
                        log::warn!("time limit reached, aborting the search");
                        abort.abort();
                        deadline = None;
                        continue;
                    }
                    Err(RecvTimeoutError::Disconnected) => break,
                },
                None => match rx.recv() {
                    Ok(event) => event,
                    Err(_) => break,
                },
            };

            match event {
                RunEvent::Progress(p) => {
                    if p >= next_report {
                        println!("  [{:>3.0}%]", p * 100.0);
                        next_report = (p * 10.0).floor() / 10.0 + 0.1;
                    }
                }
                RunEvent::Diagnostic(text) => match diagnostics.as_mut() {
                    Some(out) => write_diagnostic(&mut **out, &text, &mut write_error),
                    None => log::trace!("{}", text.trim_end()),
                },
                RunEvent::Failed(text) => {
                    eprintln!("{}", text.trim());
                    if let Some(out) = diagnostics.as_mut() {
                        write_diagnostic(&mut **out, &text, &mut write_error);
                    }
                }
            }
        }

        let outcome = worker
            .join()
            .map_err(|_| anyhow!("optimisation thread panicked"))?;
        if let Some(e) = write_error {
            log::warn!("diagnostics output incomplete: {}", e);
        }
        outcome.context("optimisation failed")
    })
}

/// Write one block unless an earlier write already failed.
fn write_diagnostic(out: &mut dyn Write, text: &str, write_error: &mut Option<std::io::Error>) {
    if write_error.is_none() {
        if let Err(e) = out.write_all(text.as_bytes()) {
            *write_error = Some(e);
        }
    }
}

/// Open a buffered diagnostics file, creating its directory.
pub fn create_diagnostics_file(path: &Path) -> Result<BufWriter<File>> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = File::create(path)
        .with_context(|| format!("creating diagnostics file {}", path.display()))?;
    Ok(BufWriter::new(file))
}

/// Print the human-readable summary to stdout.
pub fn print_summary(result: &OptimizationResult) {
    println!();
    println!("Best frequency:     {:.3} kHz", result.best_frequency_hz / 1e3);
    println!("Total objective:    {:.4}", result.best_objective);
    println!(
        "Switch:             {} ({:.3} W, price {:.2})",
        result.switch.name, result.switch.loss_w, result.switch.price
    );
    println!(
        "Rectifier:          {} ({:.3} W, price {:.2})",
        result.rectifier.name, result.rectifier.loss_w, result.rectifier.price
    );
    println!(
        "TX coil:            {:.3} Ω, {:.3} µH",
        result.coils.tx_resistance,
        result.coils.tx_inductance * 1e6
    );
    println!(
        "RX coil:            {:.3} Ω, {:.3} µH",
        result.coils.rx_resistance,
        result.coils.rx_inductance * 1e6
    );
    println!("Coil loss:          {:.3} W", result.coil_loss_w);
    println!("System efficiency:  {:.2} %", result.system_efficiency_pct);
    println!(
        "Search:             {} evaluations, {} iterations ({:?})",
        result.evaluations, result.iterations, result.termination
    );
}

/// Write the result to a JSON file.
pub fn write_result_json(result: &OptimizationResult, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(result)
        .map_err(|e| anyhow!("JSON serialisation error: {}", e))?;
    std::fs::write(path, json)?;

    println!("Result written to: {}", path.display());
    Ok(())
}

/// Write the evaluation trace to a CSV file with a metadata header.
pub fn write_evaluations_csv(
    trace: &[EvaluationRecord],
    path: &Path,
    inputs: &JobInputs,
) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut file = BufWriter::new(File::create(path)?);
    write_evaluations(&mut file, trace, inputs)?;
    file.flush()?;

    println!("Evaluations written to: {}", path.display());
    Ok(())
}

fn write_evaluations(
    out: &mut dyn Write,
    trace: &[EvaluationRecord],
    inputs: &JobInputs,
) -> Result<()> {
    let swarm = &inputs.run.swarm;
    writeln!(out, "# Ferrite frequency optimisation: evaluation trace")?;
    writeln!(out, "# Version: {}", env!("CARGO_PKG_VERSION"))?;
    writeln!(
        out,
        "# bounds: {} - {} Hz, swarm_size: {}, max_iterations: {}",
        swarm.lower_hz, swarm.upper_hz, swarm.swarm_size, swarm.max_iterations
    )?;
    writeln!(
        out,
        "# catalogs: {} switches, {} rectifiers",
        inputs.switches.len(),
        inputs.rectifiers.len()
    )?;
    writeln!(out, "#")?;
    writeln!(
        out,
        "evaluation,frequency_hz,switch,switch_score,switch_loss_w,rectifier,rectifier_score,rectifier_loss_w,coil_loss_w,objective"
    )?;

    for record in trace {
        let switch = &inputs.switches.records()[record.switch.index];
        let rectifier = &inputs.rectifiers.records()[record.rectifier.index];
        writeln!(
            out,
            "{},{:.3},{},{:.6e},{:.6e},{},{:.6e},{:.6e},{:.6e},{:.6e}",
            record.evaluation,
            record.frequency_hz,
            csv_field(&switch.name),
            record.switch.score,
            record.switch.loss,
            csv_field(&rectifier.name),
            record.rectifier.score,
            record.rectifier.loss,
            record.coil_loss,
            record.objective,
        )?;
    }
    Ok(())
}

fn csv_field(text: &str) -> String {
    if text.contains(',') || text.contains('"') {
        format!("\"{}\"", text.replace('"', "\"\""))
    } else {
        text.to_string()
    }
}
