//! Lane Select Simulator CLI
//!
//! Run closed-loop lane selection scenarios.

use clap::Parser;
use laneselect_core::LaneSelectConfig;
use laneselect_sim::scenarios::ScenarioId;
use laneselect_sim::{ScenarioResult, ScenarioRunner, SimError};
use tracing::{error, info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Lane Select closed-loop simulation CLI
#[derive(Parser, Debug)]
#[command(name = "laneselect-sim")]
#[command(about = "Run closed-loop lane selection scenarios", long_about = None)]
struct Args {
    /// Master seed for determinism (0 = random from time)
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Scenario to run (single_lane, change_prepared, lane_change, pose_jump,
    /// lost_neighbor, curved_left_change, lane_array_swap, all)
    #[arg(short = 'S', long, default_value = "all")]
    scenario: String,

    /// Pose rate in Hz
    #[arg(short, long, default_value = "10")]
    tick_rate: u32,

    /// Maximum simulation duration in seconds
    #[arg(short, long, default_value = "20")]
    duration: f64,

    /// Pose noise standard deviation in meters
    #[arg(long, default_value = "0.05")]
    pose_noise: f64,

    /// Lane select configuration (JSON)
    #[arg(short, long)]
    config: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Log filter directives (e.g. "laneselect_core=debug"), overrides --verbose
    #[arg(long)]
    log_filter: Option<String>,

    /// JSON output for CI parsing
    #[arg(long)]
    json: bool,

    /// Export frames of a single scenario to a JSON file
    #[arg(long)]
    export: Option<String>,
}

fn load_config(path: Option<&str>) -> Result<LaneSelectConfig, SimError> {
    match path {
        Some(path) => {
            let json = std::fs::read_to_string(path)?;
            Ok(LaneSelectConfig::from_json_str(&json)?)
        }
        None => Ok(LaneSelectConfig::default()),
    }
}

fn init_logging(args: &Args) {
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let builder = FmtSubscriber::builder().with_max_level(level);

    let result = match &args.log_filter {
        Some(filter) => tracing::subscriber::set_global_default(
            builder.with_env_filter(EnvFilter::new(filter)).finish(),
        ),
        None => tracing::subscriber::set_global_default(builder.finish()),
    };
    if let Err(e) = result {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

fn report(result: &ScenarioResult) {
    if result.passed {
        info!("✓ {} (seed={}) PASSED", result.scenario.name(), result.seed);
    } else {
        error!(
            "✗ {} (seed={}) FAILED: {}",
            result.scenario.name(),
            result.seed,
            result.failure_reason.as_deref().unwrap_or("unknown")
        );
    }
}

fn main() {
    let args = Args::parse();
    init_logging(&args);

    if !args.json {
        info!("Lane Select Simulator v0.1.0");
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    }

    let config = match load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    };

    // Parse scenarios
    let scenarios: Vec<ScenarioId> = if args.scenario == "all" {
        ScenarioId::all()
    } else {
        match args.scenario.parse() {
            Ok(scenario) => vec![scenario],
            Err(e) => {
                eprintln!("Error: {}", e);
                let names: Vec<_> = ScenarioId::all().iter().map(|s| s.name()).collect();
                eprintln!("Available scenarios: {}, all", names.join(", "));
                std::process::exit(1);
            }
        }
    };

    // Determine seed
    let seed = if args.seed == 0 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(42)
    } else {
        args.seed
    };

    let runner = ScenarioRunner::new(seed)
        .with_tick_rate(args.tick_rate)
        .with_duration(args.duration)
        .with_pose_noise(args.pose_noise)
        .with_config(config);

    // Handle --export mode
    if let Some(export_path) = &args.export {
        if scenarios.len() > 1 {
            eprintln!("Error: --export only supports a single scenario, not 'all'");
            std::process::exit(1);
        }

        let (result, export) = runner.run_with_export(scenarios[0]);
        report(&result);

        match export.write_to_file(export_path) {
            Ok(()) => info!("Exported {} frames to {}", export.frames.len(), export_path),
            Err(e) => error!("Failed to write export: {:?}", e),
        }

        if !result.passed {
            std::process::exit(1);
        }
        return;
    }

    let results: Vec<ScenarioResult> = scenarios
        .iter()
        .map(|scenario| {
            let result = runner.run(*scenario);
            if !args.json {
                report(&result);
            }
            result
        })
        .collect();

    let total = results.len();
    let failed = results.iter().filter(|r| !r.passed).count();

    if args.json {
        let summary = serde_json::json!({
            "total": total,
            "passed": total - failed,
            "failed": failed,
            "results": results.iter().map(|r| {
                serde_json::json!({
                    "scenario": r.scenario.name(),
                    "seed": r.seed,
                    "passed": r.passed,
                    "ticks": r.total_ticks,
                    "time_secs": r.final_time_secs,
                    "failure_reason": r.failure_reason,
                    "metrics": r.metrics,
                })
            }).collect::<Vec<_>>(),
        });
        match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{}", json),
            Err(e) => error!("Failed to serialize summary: {}", e),
        }
    } else {
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        if failed == 0 {
            info!("✅ All {} scenario runs passed!", total);
        } else {
            error!("❌ {}/{} scenario runs failed!", failed, total);
        }
    }

    // Exit with proper code for CI
    if failed > 0 {
        std::process::exit(1);
    }
}
