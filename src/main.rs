//! Pump scheduling simulator entry point: CLI wiring and config-driven runs.

use std::path::Path;
use std::process;

use pump_sched::config::ScenarioConfig;
use pump_sched::io::export::export_csv;
use pump_sched::model::DemandCurve;
use pump_sched::sim::kpi::TraceReport;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Parsed CLI arguments.
struct CliArgs {
    scenario_path: Option<String>,
    preset: Option<String>,
    samples_override: Option<usize>,
    demand_override: Option<DemandCurve>,
    trace_out: Option<String>,
    #[cfg(feature = "api")]
    serve: bool,
    #[cfg(feature = "api")]
    port: u16,
}

fn print_help() {
    eprintln!("pump-sched: single-pump, single-tank scheduling simulator");
    eprintln!();
    eprintln!("Usage: pump-sched [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --scenario <path>        Load scenario from TOML config file");
    eprintln!(
        "  --preset <name>          Use a built-in preset ({})",
        ScenarioConfig::PRESETS.join(", ")
    );
    eprintln!("  --samples <n>            Override the number of time samples");
    eprintln!("  --demand <max|min>       Override the consumption envelope");
    eprintln!("  --trace-out <path>       Export the simulation trace to CSV");
    #[cfg(feature = "api")]
    {
        eprintln!("  --serve                  Start REST API server after simulation");
        eprintln!("  --port <u16>             API server port (default: 3000)");
    }
    eprintln!("  --help                   Show this help message");
    eprintln!();
    eprintln!("If no --scenario or --preset is given, the reference preset is used.");
    eprintln!("Log verbosity follows RUST_LOG (default: info).");
}

/// Returns the value following flag `args[*i]`, exiting if it is missing.
fn flag_value<'a>(args: &'a [String], i: &mut usize, what: &str) -> &'a str {
    let flag = &args[*i];
    *i += 1;
    match args.get(*i) {
        Some(v) => v.as_str(),
        None => {
            eprintln!("error: {flag} requires {what}");
            process::exit(1);
        }
    }
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        scenario_path: None,
        preset: None,
        samples_override: None,
        demand_override: None,
        trace_out: None,
        #[cfg(feature = "api")]
        serve: false,
        #[cfg(feature = "api")]
        port: 3000,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--scenario" => {
                cli.scenario_path = Some(flag_value(&args, &mut i, "a path argument").to_string());
            }
            "--preset" => {
                cli.preset = Some(flag_value(&args, &mut i, "a name argument").to_string());
            }
            "--samples" => {
                let v = flag_value(&args, &mut i, "a count argument");
                if let Ok(n) = v.parse::<usize>() {
                    cli.samples_override = Some(n);
                } else {
                    eprintln!("error: --samples value \"{v}\" is not a valid count");
                    process::exit(1);
                }
            }
            "--demand" => {
                let v = flag_value(&args, &mut i, "max or min");
                match v.parse::<DemandCurve>() {
                    Ok(curve) => cli.demand_override = Some(curve),
                    Err(e) => {
                        eprintln!("error: --demand {e}");
                        process::exit(1);
                    }
                }
            }
            "--trace-out" => {
                cli.trace_out = Some(flag_value(&args, &mut i, "a path argument").to_string());
            }
            #[cfg(feature = "api")]
            "--serve" => {
                cli.serve = true;
            }
            #[cfg(feature = "api")]
            "--port" => {
                let v = flag_value(&args, &mut i, "a u16 argument");
                if let Ok(p) = v.parse::<u16>() {
                    cli.port = p;
                } else {
                    eprintln!("error: --port value \"{v}\" is not a valid u16");
                    process::exit(1);
                }
            }
            other => {
                eprintln!("error: unknown argument \"{other}\"");
                print_help();
                process::exit(1);
            }
        }
        i += 1;
    }

    cli
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let cli = parse_args();
    init_tracing();

    // Load config: --scenario takes priority, then --preset, then reference default
    let mut scenario = if let Some(ref path) = cli.scenario_path {
        match ScenarioConfig::from_toml_file(Path::new(path)) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else if let Some(ref name) = cli.preset {
        match ScenarioConfig::from_preset(name) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else {
        ScenarioConfig::reference()
    };

    if let Some(samples) = cli.samples_override {
        scenario.simulation.samples = samples;
    }
    if let Some(curve) = cli.demand_override {
        scenario.simulation.demand = curve;
    }

    let errors = scenario.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    let model = scenario.to_model();
    let (problem, schedule) = match (scenario.problem(&model), scenario.schedule()) {
        (Ok(p), Ok(s)) => (p, s),
        (Err(e), _) | (_, Err(e)) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    };
    let x = schedule.to_decision_vector();

    info!(
        cycles = schedule.cycles(),
        samples = problem.grid().len(),
        demand = %problem.curve(),
        limits = %problem.limits(),
        "simulating schedule"
    );
    let trace = match problem.simulate(&x) {
        Ok(trace) => trace,
        Err(e) => {
            error!(error = %e, "simulation failed");
            eprintln!("error: {e}");
            process::exit(1);
        }
    };
    let report = TraceReport::from_trace(&trace, problem.grid(), model.tank());

    println!("Schedule: {schedule}");
    println!();

    // Print the sample closest to every full hour
    let grid = problem.grid();
    for hour in 0..=24 {
        let k = ((f64::from(hour) / grid.step_h()).round() as usize).min(grid.len() - 1);
        if let Some(sample) = trace.sample(grid, k) {
            println!("{sample}");
        }
    }

    println!("\n{report}");

    match problem.evaluate(&x) {
        Ok(eval) => println!("Evaluation ({} limits): {eval}", problem.limits()),
        Err(e) => eprintln!("error: {e}"),
    }

    if let Some(ref path) = cli.trace_out {
        if let Err(e) = export_csv(&trace, grid, Path::new(path)) {
            eprintln!("error: failed to write CSV: {e}");
            process::exit(1);
        }
        info!(path = %path, rows = trace.len(), "trace written");
    }

    #[cfg(feature = "api")]
    if cli.serve {
        use std::net::SocketAddr;
        use std::sync::Arc;

        let state = Arc::new(pump_sched::api::AppState {
            model: model.clone(),
            default_samples: scenario.simulation.samples,
        });
        let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
        let rt = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
            eprintln!("error: failed to create tokio runtime: {e}");
            process::exit(1);
        });
        if let Err(e) = rt.block_on(pump_sched::api::serve(state, addr)) {
            eprintln!("error: API server failed on {addr}: {e}");
            process::exit(1);
        }
    }
}
