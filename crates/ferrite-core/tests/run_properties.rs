//! End-to-end properties of an optimisation run.
//!
//! - Single-entry catalogues: objective equals the independently computed
//!   blend of device losses plus coil loss.
//! - Best-so-far scores never increase within a run.
//! - Seeded runs are reproducible and stay within the frequency bounds.
//! - Fatal errors surface before any iteration and leave no result.

use approx::assert_relative_eq;

use ferrite_core::catalog::Catalog;
use ferrite_core::coil;
use ferrite_core::devices::{DeviceLossModel, ModelAssumptions, RectifierDevice, SwitchDevice};
use ferrite_core::engine::{evaluate_at, optimize, RunConfig};
use ferrite_core::events::{CollectingSink, NullSink, RunEvent};
use ferrite_core::objective::{CoilLossPolicy, EfficiencyBasis, ObjectiveConfig, ObjectiveFunction};
use ferrite_core::optimizer::{AbortHandle, SwarmConfig, Termination};
use ferrite_core::result::OptimizationResult;
use ferrite_core::types::{CoilGeometry, OperatingPoint, SystemParameters};
use ferrite_core::DesignError;

// ─────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────

fn system() -> SystemParameters {
    SystemParameters {
        coupling: 0.15,
        load_resistance: 8.0,
        switch_count: 4,
        rectifier_count: 4,
        operating_point: OperatingPoint {
            switch_rms_current: 3.5,
            switch_voltage: 48.0,
            switch_current: 5.0,
            coil_current: 2.5,
            rectifier_effective_current: 2.8,
            rectifier_mean_current: 1.8,
            rectifier_voltage: 36.0,
        },
        tx_coil: CoilGeometry::new(12, 1.2, 0.4, 120.0).unwrap(),
        rx_coil: CoilGeometry::new(8, 1.0, 0.5, 80.0).unwrap(),
        tx_resistance_per_m: 0.015,
        rx_resistance_per_m: 0.02,
    }
}

fn row(cells: &[&str]) -> Vec<String> {
    cells.iter().map(|c| c.to_string()).collect()
}

fn switches() -> Catalog<SwitchDevice> {
    Catalog::from_rows(vec![
        row(&["IRFB4110", "3.10", "Infineon", "TO-220", "3.7", "1.3", "20", "67", "88", "150", "110"]),
        row(&["BSC070N10", "1.45", "Infineon", "TDSON-8", "7.0", "1.0", "20", "9", "7", "36", "60"]),
        row(&["EPC2045", "2.20", "EPC", "BGA", "7.0", "0.0", "6", "2", "2", "5.2", "0"]),
        row(&["IRF540N", "0.95", "Vishay", "TO-220", "44", "1.3", "20", "35", "35", "71", "170"]),
    ])
    .unwrap()
}

fn rectifiers() -> Catalog<RectifierDevice> {
    Catalog::from_rows(vec![
        row(&["SS34", "0.20", "Vishay", "SMA", "0.50", "300"]),
        row(&["STPS5H100", "0.85", "ST", "SMC", "0.61", "120"]),
        row(&["C3D02060", "1.90", "Wolfspeed", "TO-220", "1.50", "11"]),
    ])
    .unwrap()
}

fn run_config(seed: u64) -> RunConfig {
    RunConfig {
        swarm: SwarmConfig::new(20e3, 300e3, 12, 30, 1e-3).with_seed(seed),
        objective: ObjectiveConfig::default(),
    }
}

// ─────────────────────────────────────────────────────────────
// Objective function
// ─────────────────────────────────────────────────────────────

#[test]
fn single_entry_objective_matches_independent_computation() {
    let system = system();
    let switches = Catalog::new(vec![switches().records()[1].clone()]).unwrap();
    let rectifiers = Catalog::new(vec![rectifiers().records()[0].clone()]).unwrap();
    let config = ObjectiveConfig::default();
    let sink = NullSink;
    let mut objective = ObjectiveFunction::new(&system, &switches, &rectifiers, &config, &sink).unwrap();

    let a = ModelAssumptions::default();
    for &f in &[25e3, 85e3, 150e3, 290e3] {
        let sw = &switches.records()[0];
        let rc = &rectifiers.records()[0];
        let sw_loss = sw.losses(&system, f, &a).unwrap().total;
        let rc_loss = rc.losses(&system, f, &a).unwrap().total;
        let coil_loss = coil::loss(&system, f, &system.coil_pair()).unwrap();
        let expected = (0.5 * sw_loss + 0.5 * sw.price / 20.0)
            + (0.5 * rc_loss + 0.5 * rc.price / 20.0)
            + coil_loss;

        assert_relative_eq!(objective.evaluate(f).unwrap(), expected, max_relative = 1e-12);
    }
}

#[test]
fn pure_conduction_loss_is_exact() {
    let mut system = system();
    system.switch_count = 1;
    system.operating_point.switch_rms_current = 2.0;
    let switches: Catalog<SwitchDevice> =
        Catalog::from_rows(vec![row(&["R10", "0", "", "", "10", "0", "0", "0", "0", "0", "0"])]).unwrap();

    let losses = switches.records()[0]
        .losses(&system, 123e3, &ModelAssumptions::default())
        .unwrap();
    assert_eq!(losses.conduction, 0.04);
    assert_eq!(losses.total, 0.04);
}

#[test]
fn best_so_far_scores_never_increase() {
    let system = system();
    let (switches, rectifiers) = (switches(), rectifiers());
    let config = ObjectiveConfig::default();
    let sink = NullSink;
    let mut objective = ObjectiveFunction::new(&system, &switches, &rectifiers, &config, &sink).unwrap();

    let mut last_switch = f64::INFINITY;
    let mut last_rectifier = f64::INFINITY;
    // Sweep up and down so per-frequency minima both rise and fall.
    let sweep = (0..40).map(|i| 20e3 + (i as f64 * 37e3) % 280e3);
    for f in sweep {
        objective.evaluate(f).unwrap();
        let state = objective.state();
        let s = state.best_switch().unwrap().score;
        let r = state.best_rectifier().unwrap().score;
        assert!(s <= last_switch);
        assert!(r <= last_rectifier);
        last_switch = s;
        last_rectifier = r;
    }
}

#[test]
fn evaluate_at_reports_one_record() {
    let system = system();
    let sink = CollectingSink::new();
    let record = evaluate_at(&system, &switches(), &rectifiers(), &ObjectiveConfig::default(), 100e3, &sink)
        .unwrap();
    assert_eq!(record.evaluation, 1);
    assert_eq!(record.frequency_hz, 100e3);
    assert_relative_eq!(
        record.objective,
        record.switch.score + record.rectifier.score + record.coil_loss,
        max_relative = 1e-12
    );
    assert!(sink.transcript().contains("SWITCH: EPC2045"));
}

// ─────────────────────────────────────────────────────────────
// Full runs
// ─────────────────────────────────────────────────────────────

#[test]
fn seeded_runs_are_reproducible() {
    let system = system();
    let (switches, rectifiers) = (switches(), rectifiers());

    let first = optimize(&system, &switches, &rectifiers, &run_config(42), &NullSink, &AbortHandle::new()).unwrap();
    let second = optimize(&system, &switches, &rectifiers, &run_config(42), &NullSink, &AbortHandle::new()).unwrap();

    assert_eq!(first.best_frequency_hz, second.best_frequency_hz);
    assert_eq!(first.best_objective, second.best_objective);
    assert_eq!(first.switch, second.switch);
    assert_eq!(first.rectifier, second.rectifier);
    assert_eq!(first.trace, second.trace);
}

#[test]
fn best_frequency_within_bounds() {
    let system = system();
    let (switches, rectifiers) = (switches(), rectifiers());
    for seed in 0..8 {
        let config = run_config(seed);
        let result = optimize(&system, &switches, &rectifiers, &config, &NullSink, &AbortHandle::new()).unwrap();
        assert!(result.best_frequency_hz >= config.swarm.lower_hz);
        assert!(result.best_frequency_hz <= config.swarm.upper_hz);
        for record in &result.trace {
            assert!(record.frequency_hz >= config.swarm.lower_hz);
            assert!(record.frequency_hz <= config.swarm.upper_hz);
        }
    }
}

#[test]
fn result_assembly_follows_state() {
    let system = system();
    let (switches, rectifiers) = (switches(), rectifiers());
    let result = optimize(&system, &switches, &rectifiers, &run_config(11), &NullSink, &AbortHandle::new()).unwrap();

    // Coil loss is the last evaluated frequency's, by default.
    let last = result.trace.last().unwrap();
    assert_eq!(result.coil_loss_policy, CoilLossPolicy::MostRecent);
    assert_eq!(result.coil_loss_w, last.coil_loss);

    // The selected devices carry the run-wide minimum score.
    let min_switch = result.trace.iter().map(|r| r.switch.score).fold(f64::INFINITY, f64::min);
    let min_rect = result.trace.iter().map(|r| r.rectifier.score).fold(f64::INFINITY, f64::min);
    assert_eq!(result.switch.score, min_switch);
    assert_eq!(result.rectifier.score, min_rect);
    assert_eq!(result.switch.name, switches.records()[result.switch.index].name);

    // Efficiency is built from the selecting scores, by default.
    let p = system.transferred_power();
    let expected = (p - result.coil_loss_w) / (p + result.switch.score + result.rectifier.score) * 100.0;
    assert_eq!(result.efficiency_basis, EfficiencyBasis::Score);
    assert_relative_eq!(result.system_efficiency_pct, expected, max_relative = 1e-12);
    assert_eq!(result.evaluations, result.trace.len());
    assert!(matches!(result.termination, Termination::MaxIterations | Termination::MinStep));
}

#[test]
fn coil_loss_at_best_frequency_policy() {
    let system = system();
    let (switches, rectifiers) = (switches(), rectifiers());
    let mut config = run_config(5);
    config.objective.coil_loss_policy = CoilLossPolicy::AtBestFrequency;

    let result = optimize(&system, &switches, &rectifiers, &config, &NullSink, &AbortHandle::new()).unwrap();
    let expected = coil::loss(&system, result.best_frequency_hz, &system.coil_pair()).unwrap();
    assert_relative_eq!(result.coil_loss_w, expected, max_relative = 1e-12);
}

#[test]
fn efficiency_from_device_losses() {
    let system = system();
    let switches = Catalog::new(vec![switches().records()[3].clone()]).unwrap();
    let rectifiers = Catalog::new(vec![rectifiers().records()[0].clone()]).unwrap();

    let by_score = optimize(&system, &switches, &rectifiers, &run_config(1), &NullSink, &AbortHandle::new()).unwrap();
    let mut config = run_config(1);
    config.objective.efficiency_basis = EfficiencyBasis::Loss;
    let by_loss = optimize(&system, &switches, &rectifiers, &config, &NullSink, &AbortHandle::new()).unwrap();

    // Same seed, same search: only the efficiency figure differs.
    assert_eq!(by_score.best_frequency_hz, by_loss.best_frequency_hz);
    assert_eq!(by_loss.efficiency_basis, EfficiencyBasis::Loss);

    let p = system.transferred_power();
    let expected = (p - by_loss.coil_loss_w) / (p + by_loss.switch.loss_w + by_loss.rectifier.loss_w) * 100.0;
    assert_relative_eq!(by_loss.system_efficiency_pct, expected, max_relative = 1e-12);

    // IRF540N loses more watts than its score, so the physical figure is lower.
    assert!(by_loss.switch.loss_w > by_loss.switch.score);
    assert!(by_loss.system_efficiency_pct < by_score.system_efficiency_pct);
}

#[test]
fn progress_is_monotonic_and_completes() {
    let system = system();
    let sink = CollectingSink::new();
    optimize(&system, &switches(), &rectifiers(), &run_config(3), &sink, &AbortHandle::new()).unwrap();

    let progress = sink.progress_values();
    assert_eq!(progress.first(), Some(&0.0));
    assert_eq!(progress.last(), Some(&1.0));
    for pair in progress.windows(2) {
        assert!(pair[1] >= pair[0]);
    }
    assert!(progress.iter().all(|p| (0.0..=1.0).contains(p)));
    assert!(sink.transcript().contains("Optimization Completed!"));
}

#[test]
fn result_json_round_trip() {
    let system = system();
    let result = optimize(&system, &switches(), &rectifiers(), &run_config(9), &NullSink, &AbortHandle::new()).unwrap();

    let json = serde_json::to_string(&result).unwrap();
    let parsed: OptimizationResult = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed.best_frequency_hz, result.best_frequency_hz);
    assert_eq!(parsed.switch, result.switch);
    assert_eq!(parsed.rectifier, result.rectifier);
    assert_eq!(parsed.system_efficiency_pct, result.system_efficiency_pct);
    assert_eq!(parsed.coils, result.coils);
    assert_eq!(parsed.termination, result.termination);
    assert!(parsed.trace.is_empty());
    assert!(json.contains("\"termination\":"));
}

// ─────────────────────────────────────────────────────────────
// Failures
// ─────────────────────────────────────────────────────────────

#[test]
fn empty_catalog_rejected_before_search() {
    let err = Catalog::<SwitchDevice>::new(Vec::new()).unwrap_err();
    assert!(matches!(err, DesignError::Configuration(_)));
}

#[test]
fn invalid_bounds_fail_without_evaluations() {
    let system = system();
    let sink = CollectingSink::new();
    let mut config = run_config(1);
    config.swarm.lower_hz = 300e3;
    config.swarm.upper_hz = 20e3;

    let err = optimize(&system, &switches(), &rectifiers(), &config, &sink, &AbortHandle::new()).unwrap_err();
    assert!(matches!(err, DesignError::Configuration(_)));
    let events = sink.drain();
    assert!(events.iter().all(|e| !matches!(e, RunEvent::Progress(_))));
    assert!(matches!(events.last(), Some(RunEvent::Failed(_))));
}

#[test]
fn numeric_error_halts_run_and_reports_failure() {
    let mut system = system();
    system.operating_point.rectifier_mean_current = 0.0;
    let sink = CollectingSink::new();

    let err = optimize(&system, &switches(), &rectifiers(), &run_config(1), &sink, &AbortHandle::new()).unwrap_err();
    assert!(matches!(err, DesignError::Numeric(_)));
    let transcript = sink.transcript();
    assert!(transcript.contains("OPTIMIZATION FAILED"));
    assert!(!transcript.contains("Optimization Completed!"));
}

#[test]
fn abort_yields_no_result() {
    let system = system();
    let abort = AbortHandle::new();
    abort.abort();
    let sink = CollectingSink::new();

    let err = optimize(&system, &switches(), &rectifiers(), &run_config(1), &sink, &abort).unwrap_err();
    assert_eq!(err, DesignError::Aborted { iteration: 1 });
    assert!(matches!(sink.drain().last(), Some(RunEvent::Failed(_))));
}
