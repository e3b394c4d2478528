//! Launcher binary for the agent playground simulation.
//!
//! This is the main entry point that wires together configuration, the
//! engine, world features, the initial population and the metrics
//! observer, then runs the simulation to completion.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `playground-config.yaml` (or defaults) and
//!    apply environment overrides
//! 2. Initialize structured logging (tracing)
//! 3. Build the engine
//! 4. Scatter obstacles and resource nodes from the world seed
//! 5. Spawn the configured population
//! 6. Register the metrics observer and a Ctrl-C handler
//! 7. Run the simulation loop
//! 8. Print a JSON run summary to stdout

mod error;
mod metrics;
mod spawner;

use std::path::Path;

use playground_core::config::{CONFIG_FILE_NAME, LogFormat, LoggingConfig};
use playground_core::{Engine, RunOutcome, SimulationConfig, StatusReport, runner};
use playground_types::CallbackPhase;
use playground_world::{WorldStats, scatter_features};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::AppError;
use crate::metrics::{MetricsObserver, MetricsSummary};
use crate::spawner::SpawnReport;

/// Everything printed at the end of a run.
#[derive(Debug, Serialize)]
struct RunSummary {
    outcome: RunOutcome,
    engine: StatusReport,
    population: SpawnReport,
    world: WorldStats,
    metrics: MetricsSummary,
}

/// Application entry point.
///
/// # Errors
///
/// Returns an error if any initialization step or the simulation itself fails.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load configuration.
    let config = load_config()?;

    // 2. Initialize structured logging.
    init_logging(&config.logging);
    info!(
        seed = config.engine.seed,
        max_steps = config.engine.max_steps,
        time_step = config.engine.time_step,
        width = config.world.width,
        height = config.world.height,
        "playground-engine starting"
    );

    // 3. Build the engine.
    let population = config.population;
    let layout = config.world.layout;
    let log_every = config.logging.log_every;
    let seed = config.engine.seed;
    let mut engine = Engine::new(config).map_err(AppError::from)?;

    // 4. Scatter world features.
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    scatter_features(engine.world_mut(), &layout, &mut rng).map_err(AppError::from)?;

    // 5. Spawn the initial population.
    let spawned = spawner::spawn_population(&mut engine, &population, &mut rng)?;

    // 6. Register observers and controls.
    let observer = MetricsObserver::new(log_every);
    let metrics = observer.summary();
    engine.register_observer(CallbackPhase::TickEnd, Box::new(observer));

    let control = engine.control();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping after the current tick");
            control.request_stop();
        }
    });

    // 7. Run the simulation.
    let outcome = runner::run_simulation(&mut engine).await.map_err(AppError::from)?;
    info!(
        end_reason = ?outcome.end_reason,
        ticks_run = outcome.ticks_run,
        agents_alive = outcome.agents_alive,
        "playground-engine shutdown complete"
    );

    // 8. Print the summary.
    let metrics = metrics
        .lock()
        .map(|summary| summary.clone())
        .unwrap_or_else(|poisoned| poisoned.into_inner().clone());
    let summary = RunSummary {
        outcome,
        engine: engine.status_report(),
        population: spawned,
        world: engine.world_stats(),
        metrics,
    };
    println!("{}", serde_json::to_string_pretty(&summary).map_err(AppError::from)?);

    Ok(())
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level.
fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    match config.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

/// Load `playground-config.yaml` from the working directory, or defaults.
///
/// Environment overrides apply either way.
fn load_config() -> Result<SimulationConfig, AppError> {
    let config_path = Path::new(CONFIG_FILE_NAME);
    if config_path.exists() {
        Ok(SimulationConfig::from_file(config_path)?)
    } else {
        let mut config = SimulationConfig::default();
        config.apply_env_overrides()?;
        Ok(config)
    }
}
