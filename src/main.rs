//! AMR fleet CLI: generate scenarios, drive one run to completion, or stand up the
//! optimizer/dispatcher services that back a live fleet.

use std::process::exit;

use amr_config::{validate_settings, DispatcherSettings, OptimizerSettings, ScenarioSettings};
use amr_core::RunId;
use amr_dispatcher::{Dispatcher, DispatcherConfig};
use amr_entities::RunMode;
use amr_sim::{RunnerParams, SimConfig, SimulationRunner};
use amr_transport::{EventBus, InProcessEventBus};
use clap::{Parser, Subcommand};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "amr-fleet")]
#[command(author = "Waremax Team")]
#[command(version = "0.1.0")]
#[command(about = "AMR fleet simulation and dispatch")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a scenario, run the engine end to end with a dispatcher attached, and
    /// print the resulting metrics
    Run {
        /// Fleet scale: mini, small, demo, large
        #[arg(long)]
        scale: Option<String>,

        /// Random seed
        #[arg(long)]
        seed: Option<u64>,

        /// Dispatch mode: baseline, ga
        #[arg(long)]
        mode: Option<String>,

        /// Path to a scenario settings file (YAML or JSON); env vars still apply on
        /// top of its defaults
        #[arg(long)]
        config: Option<String>,

        /// Optimizer RPC URL the dispatcher calls for GA replans
        #[arg(long)]
        optimizer_url: Option<String>,

        /// Print metrics as JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Load settings from env/file and validate them without running anything
    Validate {
        /// Path to a scenario settings file (YAML or JSON)
        #[arg(long)]
        config: Option<String>,
    },
    /// Generate a scenario and print it with its content hash, without simulating
    Generate {
        #[arg(long)]
        scale: Option<String>,

        #[arg(long)]
        seed: Option<u64>,
    },
    /// Run the GA optimizer RPC server (`/optimize`, `/health`)
    OptimizeServe {
        #[arg(long)]
        port: Option<u16>,
    },
    /// Run the dispatcher worker loop against the in-process event bus
    DispatchServe {
        #[arg(long)]
        battery_threshold: Option<f64>,

        #[arg(long)]
        optimizer_url: Option<String>,
    },
}

fn load_scenario_settings(config: &Option<String>) -> ScenarioSettings {
    let base = match config {
        Some(path) => match ScenarioSettings::from_file(path) {
            Ok(settings) => settings,
            Err(err) => {
                eprintln!("error: failed to load scenario config {path}: {err}");
                exit(1);
            }
        },
        None => ScenarioSettings::from_env(),
    };
    base
}

fn sim_config(scenario: &ScenarioSettings, pace_ticks: bool) -> SimConfig {
    SimConfig {
        tick_hz: scenario.sim_tick_hz,
        service_time_s: scenario.service_time_s,
        max_sim_seconds: scenario.max_sim_seconds,
        emit_position_updates: true,
        charge_rate: scenario.charge_rate,
        charge_resume_threshold: scenario.charge_resume_threshold,
        pace_ticks,
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { scale, seed, mode, config, optimizer_url, json } => {
            run_command(scale, seed, mode, config, optimizer_url, json).await
        }
        Commands::Validate { config } => validate_command(config),
        Commands::Generate { scale, seed } => generate_command(scale, seed),
        Commands::OptimizeServe { port } => optimize_serve_command(port).await,
        Commands::DispatchServe { battery_threshold, optimizer_url } => {
            dispatch_serve_command(battery_threshold, optimizer_url).await
        }
    }
}

async fn run_command(
    scale: Option<String>,
    seed: Option<u64>,
    mode: Option<String>,
    config: Option<String>,
    optimizer_url: Option<String>,
    json: bool,
) {
    let mut scenario = load_scenario_settings(&config);
    if let Some(scale) = scale {
        scenario.scale = scale;
    }
    if let Some(seed) = seed {
        scenario.seed = seed;
    }
    if let Some(mode) = mode {
        scenario.mode = mode;
    }

    let mut dispatcher_settings = DispatcherSettings::from_env();
    if let Some(url) = optimizer_url {
        dispatcher_settings.optimizer_url = url;
    }
    let optimizer_settings = OptimizerSettings::from_env();

    if let Err(errors) = validate_settings(&scenario, &dispatcher_settings, &optimizer_settings) {
        for error in &errors {
            eprintln!("error: {error}");
        }
        exit(1);
    }

    let run_mode = match RunMode::from_wire_str(&scenario.mode) {
        Some(mode) => mode,
        None => {
            eprintln!("error: unknown mode '{}', expected 'baseline' or 'ga'", scenario.mode);
            exit(1);
        }
    };

    let bus: std::sync::Arc<dyn EventBus> = std::sync::Arc::new(InProcessEventBus::default());

    let dispatcher_config = DispatcherConfig {
        battery_threshold: dispatcher_settings.battery_threshold,
        ga_replan_interval_s: dispatcher_settings.ga_replan_interval_s,
        optimizer_url: dispatcher_settings.optimizer_url.clone(),
        ga_params: optimizer_settings.to_ga_params(),
        default_mode: run_mode,
        default_seed: scenario.seed,
        default_scale: scenario.scale.clone(),
    };
    let dispatcher = Dispatcher::new(bus.clone(), dispatcher_config);
    tokio::spawn(dispatcher.run());
    // Give the dispatcher's subscribe() a chance to register before the runner
    // publishes run.started; broadcast channels don't replay to late subscribers.
    tokio::task::yield_now().await;

    let run_id = RunId::from(format!("run-{}", scenario.seed));
    let runner = SimulationRunner::new(
        RunnerParams {
            run_id,
            mode: run_mode,
            seed: scenario.seed,
            scale: scenario.scale.clone(),
            world_size: scenario.world_size,
            speed_min: scenario.robot_speed_min,
            speed_max: scenario.robot_speed_max,
            robots_override: scenario.robots_override,
            jobs_override: scenario.jobs_override,
        },
        sim_config(&scenario, false),
        bus,
    );

    match runner.run().await {
        Ok(metrics) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&metrics).expect("metrics are always serializable"));
            } else {
                println!("on_time_rate:        {:.2}%", metrics.on_time_rate);
                println!("total_distance:      {:.3}", metrics.total_distance);
                println!("avg_completion_time: {:.3}", metrics.avg_completion_time);
                println!("max_lateness:        {:.3}", metrics.max_lateness);
                println!("completed_jobs:      {}", metrics.completed_jobs);
                println!("failed_jobs:         {}", metrics.failed_jobs);
                println!("total_jobs:          {}", metrics.total_jobs);
            }
        }
        Err(err) => {
            eprintln!("error: run failed: {err}");
            exit(1);
        }
    }
}

fn validate_command(config: Option<String>) {
    let scenario = load_scenario_settings(&config);
    let dispatcher = DispatcherSettings::from_env();
    let optimizer = OptimizerSettings::from_env();

    match validate_settings(&scenario, &dispatcher, &optimizer) {
        Ok(warnings) => {
            for warning in &warnings {
                eprintln!("warning: {warning}");
            }
            println!("settings are valid");
        }
        Err(errors) => {
            for error in &errors {
                eprintln!("error: {error}");
            }
            exit(1);
        }
    }
}

fn generate_command(scale: Option<String>, seed: Option<u64>) {
    let mut scenario = ScenarioSettings::from_env();
    if let Some(scale) = scale {
        scenario.scale = scale;
    }
    if let Some(seed) = seed {
        scenario.seed = seed;
    }

    let result = amr_scenario::generate(&amr_scenario::GenerateParams {
        seed: scenario.seed,
        scale: scenario.scale.clone(),
        world_size: scenario.world_size,
        speed_min: scenario.robot_speed_min,
        speed_max: scenario.robot_speed_max,
        robots_override: scenario.robots_override,
        jobs_override: scenario.jobs_override,
    });

    match result {
        Ok(scenario_out) => {
            let value = serde_json::json!({
                "scenario_hash": scenario_out.scenario_hash,
                "robots": scenario_out.robots,
                "jobs": scenario_out.jobs,
            });
            println!("{}", serde_json::to_string_pretty(&value).expect("scenario is always serializable"));
        }
        Err(err) => {
            eprintln!("error: failed to generate scenario: {err}");
            exit(1);
        }
    }
}

async fn optimize_serve_command(port: Option<u16>) {
    let mut settings = OptimizerSettings::from_env();
    if let Some(port) = port {
        settings.port = port;
    }
    let params = settings.to_ga_params();

    if let Err(err) = amr_optimizer::run_server(settings.port, params).await {
        eprintln!("error: optimizer service failed: {err}");
        exit(1);
    }
}

async fn dispatch_serve_command(battery_threshold: Option<f64>, optimizer_url: Option<String>) {
    let mut dispatcher_settings = DispatcherSettings::from_env();
    if let Some(threshold) = battery_threshold {
        dispatcher_settings.battery_threshold = threshold;
    }
    if let Some(url) = optimizer_url {
        dispatcher_settings.optimizer_url = url;
    }
    let optimizer_settings = OptimizerSettings::from_env();
    let scenario_settings = ScenarioSettings::from_env();

    let bus: std::sync::Arc<dyn EventBus> = std::sync::Arc::new(InProcessEventBus::default());
    let default_mode = RunMode::from_wire_str(&scenario_settings.mode).unwrap_or(RunMode::Baseline);

    let config = DispatcherConfig {
        battery_threshold: dispatcher_settings.battery_threshold,
        ga_replan_interval_s: dispatcher_settings.ga_replan_interval_s,
        optimizer_url: dispatcher_settings.optimizer_url,
        ga_params: optimizer_settings.to_ga_params(),
        default_mode,
        default_seed: scenario_settings.seed,
        default_scale: scenario_settings.scale,
    };

    println!("dispatcher worker listening on the in-process event bus");
    Dispatcher::new(bus, config).run().await;
}
