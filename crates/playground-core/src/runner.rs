//! Async simulation loop with operator controls.
//!
//! [`run_simulation`] drives an [`Engine`] on a tokio task:
//!
//! - **Real-time pacing**: with `engine.real_time` set, sleeps one
//!   `time_step` between ticks.
//! - **Pause/resume**: waits on the operator handle while paused instead of
//!   returning.
//! - **Clean stop**: a stop request ends the loop with
//!   [`EndReason::Cancelled`].
//!
//! The engine's synchronous [`Engine::run`] is the unpaced equivalent.

use std::time::Duration;

use playground_types::{EndReason, EngineStatus};
use tracing::{info, warn};

use crate::engine::{Engine, EngineError, RunOutcome};

/// Errors that can occur during an async run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// An engine operation failed.
    #[error("engine error: {source}")]
    Engine {
        /// The underlying engine error.
        #[from]
        source: EngineError,
    },
}

/// Run the engine until the step limit, extinction or a stop request.
///
/// # Errors
///
/// Returns [`RunnerError`] if the engine cannot start or a tick fails.
pub async fn run_simulation(engine: &mut Engine) -> Result<RunOutcome, RunnerError> {
    let operator = engine.control();
    let real_time = engine.config().engine.real_time;
    let pace = Duration::try_from_secs_f64(engine.config().engine.time_step).unwrap_or(Duration::ZERO);
    let mut ticks_run: u64 = 0;

    info!(
        run_id = %engine.run_id(),
        max_steps = operator.max_steps(),
        real_time,
        "Simulation starting"
    );

    loop {
        // --- Check stop request (before tick) ---
        if operator.is_stop_requested() {
            info!(tick = engine.tick(), "Operator stop requested");
            engine.cancel();
            return Ok(outcome(engine, EndReason::Cancelled, ticks_run));
        }

        // --- Execute tick ---
        // A pause is only observed by `step`, so it cannot arrive between a
        // check here and the tick.
        let tick_before = engine.tick();
        match engine.step() {
            Ok(_) => {}
            Err(EngineError::NotRunnable {
                status: EngineStatus::Paused,
            }) => {
                info!(tick = engine.tick(), "Simulation paused, waiting for resume...");
                operator.wait_if_paused().await;
                continue;
            }
            Err(err) => return Err(err.into()),
        }
        if engine.tick() != tick_before {
            ticks_run = ticks_run.saturating_add(1);
        }

        if let Some(reason) = engine.end_reason() {
            info!(tick = engine.tick(), reason = ?reason, ticks_run, "Simulation ended");
            return Ok(outcome(engine, reason, ticks_run));
        }
        if engine.status() != EngineStatus::Running {
            warn!(status = ?engine.status(), "Engine left the running state unexpectedly");
        }

        // --- Pace ---
        if real_time {
            tokio::time::sleep(pace).await;
        }
    }
}

fn outcome(engine: &Engine, end_reason: EndReason, ticks_run: u64) -> RunOutcome {
    RunOutcome {
        end_reason,
        ticks_run,
        final_tick: engine.tick(),
        agents_alive: engine.agent_count(),
    }
}
