//! Operator control state shared between the engine and its controllers.
//!
//! An [`OperatorState`] is held in an [`Arc`] by the engine and handed out
//! through [`Engine::control`]. Another task or thread can pause, resume or
//! stop the run through it without holding a reference to the engine. The
//! flags are atomics, read between ticks only, so a request never
//! interrupts a tick half way through.
//!
//! [`Arc`]: std::sync::Arc
//! [`Engine::control`]: crate::engine::Engine::control

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::Notify;

/// Shared pause/stop flags and run bounds.
#[derive(Debug)]
pub struct OperatorState {
    /// Whether the run is paused.
    paused: AtomicBool,

    /// Wakes a paused runner on resume or stop.
    resume_notify: Notify,

    /// Whether a stop has been requested.
    stop_requested: AtomicBool,

    /// Wall-clock time the state was created or last reset.
    started_at: DateTime<Utc>,

    /// Tick budget (0 = unlimited).
    max_steps: u64,
}

impl OperatorState {
    /// Create control state for a run of at most `max_steps` ticks.
    pub fn new(max_steps: u64) -> Self {
        Self {
            paused: AtomicBool::new(false),
            resume_notify: Notify::new(),
            stop_requested: AtomicBool::new(false),
            started_at: Utc::now(),
            max_steps,
        }
    }

    // -----------------------------------------------------------------------
    // Pause / Resume
    // -----------------------------------------------------------------------

    /// Check whether the run is paused.
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    /// Pause the run. Ticks stop after the current one finishes.
    pub fn pause(&self) {
        self.paused.store(true, Ordering::Release);
    }

    /// Resume the run and wake a waiting runner.
    pub fn resume(&self) {
        self.paused.store(false, Ordering::Release);
        self.resume_notify.notify_one();
    }

    /// Wait until the run is no longer paused or a stop is requested.
    ///
    /// Returns immediately if not paused.
    pub async fn wait_if_paused(&self) {
        while self.is_paused() && !self.is_stop_requested() {
            self.resume_notify.notified().await;
        }
    }

    // -----------------------------------------------------------------------
    // Stop
    // -----------------------------------------------------------------------

    /// Request a clean stop. Also wakes a paused runner so it can exit.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
        self.resume_notify.notify_one();
    }

    /// Check whether a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    /// Clear both flags, as for a fresh run.
    pub fn clear(&self) {
        self.paused.store(false, Ordering::Release);
        self.stop_requested.store(false, Ordering::Release);
    }

    // -----------------------------------------------------------------------
    // Boundaries
    // -----------------------------------------------------------------------

    /// Check whether `ticks_run` has used up the tick budget.
    ///
    /// Always `false` when `max_steps` is 0.
    pub const fn step_limit_reached(&self, ticks_run: u64) -> bool {
        self.max_steps > 0 && ticks_run >= self.max_steps
    }

    /// The configured tick budget.
    pub const fn max_steps(&self) -> u64 {
        self.max_steps
    }

    /// Wall-clock start time.
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Whole seconds since start.
    pub fn elapsed_seconds(&self) -> u64 {
        let elapsed = Utc::now().signed_duration_since(self.started_at).num_seconds();
        u64::try_from(elapsed.max(0)).unwrap_or(u64::MAX)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn initial_state_is_not_paused() {
        let state = OperatorState::new(0);
        assert!(!state.is_paused());
        assert!(!state.is_stop_requested());
    }

    #[test]
    fn pause_and_resume() {
        let state = OperatorState::new(0);
        state.pause();
        assert!(state.is_paused());
        state.resume();
        assert!(!state.is_paused());
    }

    #[test]
    fn clear_resets_flags() {
        let state = OperatorState::new(0);
        state.pause();
        state.request_stop();
        state.clear();
        assert!(!state.is_paused());
        assert!(!state.is_stop_requested());
    }

    #[test]
    fn zero_budget_is_unlimited() {
        let state = OperatorState::new(0);
        assert!(!state.step_limit_reached(u64::MAX));
    }

    #[test]
    fn budget_is_reached_at_max_steps() {
        let state = OperatorState::new(5);
        assert!(!state.step_limit_reached(4));
        assert!(state.step_limit_reached(5));
    }

    #[tokio::test]
    async fn stop_wakes_paused_waiter() {
        let state = Arc::new(OperatorState::new(0));
        state.pause();
        let waiter = {
            let state = Arc::clone(&state);
            tokio::spawn(async move { state.wait_if_paused().await })
        };
        tokio::task::yield_now().await;
        state.request_stop();
        assert!(waiter.await.is_ok());
    }
}
