use std::fs;
use std::process::Command;

#[derive(Debug)]
struct Report {
    total_cost: f64,
    absolute_violations: u64,
}

#[test]
fn presets_run_via_cli_and_produce_distinct_costs() {
    let reference = run_and_parse_report(&["--preset", "reference"]);
    let six_cycle = run_and_parse_report(&["--preset", "six_cycle"]);
    let robust = run_and_parse_report(&["--preset", "robust_max"]);

    assert_eq!(reference.absolute_violations, 0);
    assert_eq!(robust.absolute_violations, 0);
    assert!(
        (reference.total_cost - 137.9).abs() < 0.5,
        "reference cost {:.3}",
        reference.total_cost
    );
    assert!(
        (six_cycle.total_cost - reference.total_cost).abs() > 1.0,
        "expected six_cycle and reference costs to differ: {six_cycle:?} vs {reference:?}"
    );
    assert!(robust.total_cost < reference.total_cost);
}

#[test]
fn demand_override_changes_the_run() {
    let high = run_stdout(&["--samples", "2401", "--demand", "max"]);
    let low = run_stdout(&["--samples", "2401", "--demand", "min"]);
    assert_ne!(high, low);
}

#[test]
fn scenario_file_and_trace_export() {
    let dir = std::env::temp_dir().join(format!("pump-sched-cli-{}", std::process::id()));
    fs::create_dir_all(&dir).expect("temp dir should be creatable");
    let scenario = dir.join("scenario.toml");
    let trace = dir.join("trace.csv");
    fs::write(
        &scenario,
        "[simulation]\nsamples = 481\n\n[schedule]\non_times = [2.0]\ndurations = [4.0]\n",
    )
    .expect("scenario should be writable");

    let scenario_arg = scenario.to_string_lossy().into_owned();
    let trace_arg = trace.to_string_lossy().into_owned();
    run_stdout(&["--scenario", &scenario_arg, "--trace-out", &trace_arg]);

    let csv = fs::read_to_string(&trace).expect("trace should be written");
    let mut lines = csv.lines();
    assert_eq!(
        lines.next(),
        Some("sample,time_h,flow_m3h,level_m,power_kw,energy_kwh,cost")
    );
    assert_eq!(lines.count(), 481);
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn invalid_config_exits_with_error() {
    let output = Command::new(env!("CARGO_BIN_EXE_pump-sched"))
        .args(["--samples", "1"])
        .output()
        .expect("pump-sched process should run");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("simulation.samples"), "stderr={stderr}");
}

#[test]
fn unknown_preset_exits_with_error() {
    let output = Command::new(env!("CARGO_BIN_EXE_pump-sched"))
        .args(["--preset", "nonexistent"])
        .output()
        .expect("pump-sched process should run");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown preset"));
}

fn run_stdout(args: &[&str]) -> String {
    let output = Command::new(env!("CARGO_BIN_EXE_pump-sched"))
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .expect("pump-sched process should run");

    assert!(
        output.status.success(),
        "run failed for {args:?}: stderr={} ",
        String::from_utf8_lossy(&output.stderr)
    );

    String::from_utf8(output.stdout).expect("stdout should be valid UTF-8")
}

fn run_and_parse_report(args: &[&str]) -> Report {
    let stdout = run_stdout(args);
    Report {
        total_cost: parse_metric(&stdout, "Total cost:"),
        absolute_violations: parse_absolute_violations(&stdout),
    }
}

fn parse_metric(stdout: &str, label: &str) -> f64 {
    let line = stdout
        .lines()
        .find(|line| line.trim_start().starts_with(label))
        .unwrap_or_else(|| panic!("missing report line `{label}` in output: {stdout}"));

    let raw = line
        .split_once(':')
        .map(|(_, right)| right.trim())
        .unwrap_or_else(|| panic!("invalid report format for line `{line}`"));

    raw.parse::<f64>()
        .unwrap_or_else(|_| panic!("failed parsing `{raw}` from report line `{line}`"))
}

fn parse_absolute_violations(stdout: &str) -> u64 {
    let line = stdout
        .lines()
        .find(|line| line.starts_with("Level violations:"))
        .unwrap_or_else(|| panic!("missing violations line in output: {stdout}"));

    // "Level violations:      <n> operational, <m> absolute"
    line.split(',')
        .nth(1)
        .and_then(|part| part.split_whitespace().next())
        .and_then(|n| n.parse().ok())
        .unwrap_or_else(|| panic!("invalid violations line `{line}`"))
}
