use std::env;
use std::process::ExitCode;

use loan_tape_core_rs::{
    ApplicationRecord, Orchestrator, ReferenceArchetypeModel, RngManager, SimulationConfig,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn print_usage() {
    eprintln!("loan-sim <command>");
    eprintln!("commands:");
    eprintln!("  run <config.json> <applications.json>");
    eprintln!("    funds the approved applications and simulates the configured window");
    eprintln!("  demo <applications> [seed] [config.json]");
    eprintln!("    synthesizes an application pool and runs it");
    eprintln!("the run summary is printed to stdout as JSON; logs go to stderr (RUST_LOG)");
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn parse_u64(value: Option<&String>, label: &str) -> Result<u64, String> {
    let raw = value.ok_or_else(|| format!("missing {}", label))?;
    raw.parse::<u64>()
        .map_err(|_| format!("invalid {}: {}", label, raw))
}

fn load_config(path: Option<&String>) -> Result<SimulationConfig, String> {
    match path {
        Some(path) => SimulationConfig::from_path(path).map_err(|err| err.to_string()),
        None => Ok(SimulationConfig::default()),
    }
}

fn load_applications(path: &str) -> Result<Vec<ApplicationRecord>, String> {
    let json = std::fs::read_to_string(path)
        .map_err(|err| format!("failed to read applications {path}: {err}"))?;
    serde_json::from_str(&json).map_err(|err| format!("invalid applications {path}: {err}"))
}

/// Applicant pool with plausible underwriting spreads
///
/// Uses its own generator so the simulation seed alone decides the panel
/// for a given pool.
fn synthesize_applications(count: u64, seed: u64) -> Vec<ApplicationRecord> {
    let mut rng = RngManager::new(seed ^ 0x5EED_A991);
    (0..count)
        .map(|i| {
            let fico = rng.range_inclusive(560, 820) as u16;
            let approved = fico >= 600 && rng.next_f64() < 0.85;
            ApplicationRecord {
                application_id: format!("APP-{:06}", i + 1),
                decision_status: if approved { "APPROVED" } else { "DECLINED" }.to_string(),
                annual_income: Some(rng.range_inclusive(25_000, 180_000) as f64),
                fico_score: Some(fico),
                debt_to_income: Some(0.05 + rng.next_f64() * 0.5),
            }
        })
        .collect()
}

fn simulate(config: SimulationConfig, applications: &[ApplicationRecord]) -> Result<(), String> {
    let model = ReferenceArchetypeModel::new();
    let output = Orchestrator::from_applications(config, applications, &model)
        .and_then(Orchestrator::run)
        .map_err(|err| err.to_string())?;

    info!(
        snapshots = output.snapshots.len(),
        payments = output.payments.len(),
        events = output.event_log.len(),
        "panel materialized"
    );

    let summary = serde_json::to_string_pretty(&output.summary).map_err(|err| err.to_string())?;
    println!("{}", summary);
    Ok(())
}

fn run_command(args: &[String]) -> Result<(), String> {
    let config_path = args.get(2).ok_or_else(|| "missing config path".to_string())?;
    let applications_path = args
        .get(3)
        .ok_or_else(|| "missing applications path".to_string())?;

    let config = load_config(Some(config_path))?;
    let applications = load_applications(applications_path)?;
    simulate(config, &applications)
}

fn demo_command(args: &[String]) -> Result<(), String> {
    let count = parse_u64(args.get(2), "application count")?;
    let mut config = load_config(args.get(4))?;
    if args.get(3).is_some() {
        config.seed = parse_u64(args.get(3), "seed")?;
    }

    let applications = synthesize_applications(count, config.seed);
    simulate(config, &applications)
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    init_tracing();

    let result = match args.get(1).map(String::as_str) {
        Some("run") => run_command(&args),
        Some("demo") => demo_command(&args),
        _ => {
            print_usage();
            return ExitCode::from(2);
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}
