//! Ferrite command-line interface.
//!
//! Optimise a wireless power link from TOML job files:
//! ```sh
//! ferrite run job.toml
//! ferrite run job.toml --time-limit 60
//! ferrite validate job.toml
//! ferrite evaluate job.toml --frequency 85000
//! ferrite catalog switches.csv --kind switch
//! ```

mod config;
mod runner;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};

use ferrite_catalog::{load_rectifier_catalog, load_switch_catalog};
use ferrite_core::catalog::{Catalog, CatalogRecord};
use ferrite_core::devices::{RectifierDevice, SwitchDevice};
use ferrite_core::engine::evaluate_at;
use ferrite_core::events::CollectingSink;

#[derive(Parser)]
#[command(name = "ferrite")]
#[command(about = "Ferrite: switching frequency and device selection for wireless power links")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an optimisation from a TOML job file.
    Run {
        /// Path to the job configuration file.
        config: PathBuf,
        /// Output directory (overrides config file setting).
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Abort the search after this many seconds.
        #[arg(long, value_name = "SECONDS")]
        time_limit: Option<u64>,
    },
    /// Validate a job file and its catalogs without optimising.
    Validate {
        /// Path to the job configuration file.
        config: PathBuf,
    },
    /// Evaluate the objective once at a fixed frequency and print the
    /// full diagnostics.
    Evaluate {
        /// Path to the job configuration file.
        config: PathBuf,
        /// Switching frequency in Hz.
        #[arg(short, long)]
        frequency: f64,
    },
    /// List the validated entries of a catalog file.
    Catalog {
        /// Path to the CSV catalog.
        file: PathBuf,
        /// Catalog schema.
        #[arg(short, long, value_enum)]
        kind: CatalogKind,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum CatalogKind {
    Switch,
    Rectifier,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config, output, time_limit } => {
            println!("Ferrite Frequency Optimiser");
            println!("===========================");
            let job = config::load_config(&config)?;
            println!("Configuration: {}", config.display());
            let inputs = runner::prepare(&job, &config::job_dir(&config))?;

            let out_dir = output.unwrap_or_else(|| PathBuf::from(&job.output.directory));

            let mut diagnostics = if job.output.save_diagnostics {
                Some(runner::create_diagnostics_file(&out_dir.join("diagnostics.log"))?)
            } else {
                None
            };
            let result = runner::run_optimization(
                &inputs,
                diagnostics.as_mut().map(|w| w as &mut dyn Write),
                time_limit.map(Duration::from_secs),
            )?;
            if let Some(mut file) = diagnostics {
                file.flush().context("writing diagnostics.log")?;
                println!("Diagnostics written to: {}", out_dir.join("diagnostics.log").display());
            }

            runner::print_summary(&result);
            println!();

            if job.output.save_result {
                runner::write_result_json(&result, &out_dir.join("result.json"))?;
            }
            if job.output.save_evaluations {
                runner::write_evaluations_csv(&result.trace, &out_dir.join("evaluations.csv"), &inputs)?;
            }

            println!("Optimisation complete.");
            Ok(())
        }
        Commands::Validate { config } => {
            let job = config::load_config(&config)?;
            runner::prepare(&job, &config::job_dir(&config))?;
            println!("Configuration is valid: {}", config.display());
            Ok(())
        }
        Commands::Evaluate { config, frequency } => {
            let job = config::load_config(&config)?;
            let inputs = runner::prepare(&job, &config::job_dir(&config))?;
            let sink = CollectingSink::new();
            let record = evaluate_at(
                &inputs.system,
                &inputs.switches,
                &inputs.rectifiers,
                &inputs.run.objective,
                frequency,
                &sink,
            )
            .with_context(|| format!("evaluating at {} Hz", frequency))?;

            print!("{}", sink.transcript());
            println!();
            println!(
                "Best switch:    {}",
                inputs.switches.records()[record.switch.index].name
            );
            println!(
                "Best rectifier: {}",
                inputs.rectifiers.records()[record.rectifier.index].name
            );
            println!("Objective:      {:.4}", record.objective);
            Ok(())
        }
        Commands::Catalog { file, kind } => {
            match kind {
                CatalogKind::Switch => {
                    let catalog = load_switch_catalog(&file)
                        .with_context(|| format!("loading {}", file.display()))?;
                    list_catalog(&catalog, &file, |d: &SwitchDevice| {
                        format!(
                            "Rds(on) {:>7.2} mΩ  Qg {:>6.1} nC  tr/tf {:>5.1}/{:<5.1} ns  Qrr {:>6.1} nC",
                            d.on_resistance * 1e3,
                            d.gate_charge * 1e9,
                            d.rise_time * 1e9,
                            d.fall_time * 1e9,
                            d.reverse_recovery_charge * 1e9
                        )
                    });
                }
                CatalogKind::Rectifier => {
                    let catalog = load_rectifier_catalog(&file)
                        .with_context(|| format!("loading {}", file.display()))?;
                    list_catalog(&catalog, &file, |d: &RectifierDevice| {
                        format!(
                            "Vf {:>5.2} V  Cd {:>7.1} pF",
                            d.forward_voltage,
                            d.junction_capacitance * 1e12
                        )
                    });
                }
            }
            Ok(())
        }
    }
}

fn list_catalog<T: CatalogRecord>(catalog: &Catalog<T>, path: &Path, describe: impl Fn(&T) -> String) {
    println!("{} catalog: {} ({} entries)", T::KIND, path.display(), catalog.len());
    println!();
    for (i, device) in catalog.iter().enumerate() {
        println!(
            "  {:>3}  {:<20} {:>8.2}  {}",
            i,
            device.name(),
            device.price(),
            describe(device)
        );
    }
}
