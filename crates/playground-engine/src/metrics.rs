//! Tick observer that aggregates run metrics.
//!
//! After each tick the observer folds the tick's events and the live
//! population into a shared [`MetricsSummary`] and logs a progress line every
//! `log_every` ticks. The summary sits behind an `Arc<Mutex<_>>` so `main`
//! can read it after the engine has finished with the observer.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use playground_core::{ObserverError, TickObserver, TickView};
use playground_events::count_by_kind;
use playground_types::EventKind;
use serde::Serialize;
use tracing::info;

/// Aggregates collected over a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricsSummary {
    /// Ticks observed.
    pub ticks: u64,
    /// Live agents after the last observed tick.
    pub agents_alive: usize,
    /// Largest live population seen.
    pub peak_agents: usize,
    /// Mean energy of live agents after the last observed tick.
    pub mean_energy: f64,
    /// Events seen per kind.
    pub events_by_kind: BTreeMap<EventKind, u64>,
}

impl MetricsSummary {
    /// Fold one tick into the summary.
    pub fn record(&mut self, view: &TickView<'_>) {
        self.ticks = self.ticks.saturating_add(1);
        self.agents_alive = view.agents.len();
        self.peak_agents = self.peak_agents.max(view.agents.len());
        self.mean_energy = mean_energy(view);
        for (kind, count) in count_by_kind(view.events) {
            let slot = self.events_by_kind.entry(kind).or_insert(0);
            *slot = slot.saturating_add(count);
        }
    }

    /// Events seen of one kind.
    pub fn count(&self, kind: EventKind) -> u64 {
        self.events_by_kind.get(&kind).copied().unwrap_or(0)
    }
}

#[allow(clippy::cast_precision_loss)]
fn mean_energy(view: &TickView<'_>) -> f64 {
    if view.agents.is_empty() {
        return 0.0;
    }
    let total: f64 = view.agents.values().map(|a| a.energy).sum();
    total / view.agents.len() as f64
}

/// Observer registered at `TickEnd` by the launcher.
#[derive(Debug)]
pub struct MetricsObserver {
    summary: Arc<Mutex<MetricsSummary>>,
    log_every: u64,
}

impl MetricsObserver {
    /// Create an observer logging every `log_every` ticks (0 disables).
    pub fn new(log_every: u64) -> Self {
        Self {
            summary: Arc::new(Mutex::new(MetricsSummary::default())),
            log_every,
        }
    }

    /// Shared handle to the running summary.
    pub fn summary(&self) -> Arc<Mutex<MetricsSummary>> {
        Arc::clone(&self.summary)
    }
}

impl TickObserver for MetricsObserver {
    fn on_tick(&mut self, view: &TickView<'_>) -> Result<(), ObserverError> {
        let mut summary = self
            .summary
            .lock()
            .map_err(|err| ObserverError::new(format!("metrics lock poisoned: {err}")))?;
        summary.record(view);

        if summary.ticks.checked_rem(self.log_every) == Some(0) {
            info!(
                tick = view.tick,
                agents_alive = summary.agents_alive,
                mean_energy = summary.mean_energy,
                collisions = summary.count(EventKind::Collision),
                consumed = summary.count(EventKind::ResourceConsumed),
                deaths = summary.count(EventKind::Death),
                "Metrics"
            );
        }
        Ok(())
    }
}
