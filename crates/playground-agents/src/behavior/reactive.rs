//! Stimulus-response policy for reactive agents.
//!
//! Any neighbor inside the threat range (`base + sensitivity * 10`) triggers
//! a flee burst directly away from the crowd, weighted toward the closest
//! neighbors, at `flee_thrust * (1 + reaction_speed)` and a fixed declared
//! cost. With nothing near, the agent drifts slowly in a random direction,
//! more slowly the more alert it still is.

use core::f64::consts::TAU;

use playground_types::{Action, ActionIntent, Observation, Vec2};
use rand::Rng;

use crate::config::{KindProfile, ReactiveTuning};
use crate::memory::{MemoryEvent, MemoryRing};

/// Alert gained per tick with a threat in range.
const ALERT_GAIN: f64 = 0.5;

/// Distances below this are treated as this for flee weighting.
const MIN_WEIGHT_DISTANCE: f64 = 0.1;

/// Policy state of one reactive agent.
#[derive(Debug, Clone, PartialEq)]
pub struct ReactiveState {
    /// Tuning copied from configuration at spawn.
    tuning: ReactiveTuning,
    /// Arousal in `[0, 1]`; rises on threats, decays when calm.
    alert: f64,
}

impl ReactiveState {
    /// New, calm state.
    pub const fn new(tuning: ReactiveTuning) -> Self {
        Self { tuning, alert: 0.0 }
    }

    /// Current alert level.
    pub const fn alert(&self) -> f64 {
        self.alert
    }

    /// Flee from neighbors in range, otherwise drift.
    pub(crate) fn decide<R: Rng + ?Sized>(
        &mut self,
        obs: &Observation,
        _profile: &KindProfile,
        memory: &mut MemoryRing,
        rng: &mut R,
    ) -> Action {
        let range = self.tuning.threat_range();
        let threats: Vec<_> = obs.neighbors.iter().filter(|n| n.distance <= range).collect();

        let nearest = threats
            .iter()
            .min_by(|a, b| a.distance.total_cmp(&b.distance).then(a.id.cmp(&b.id)));

        if let Some(nearest) = nearest {
            self.alert = (self.alert + ALERT_GAIN).min(1.0);
            memory.record(obs.tick, MemoryEvent::ThreatSeen { agent: nearest.id });

            let away = threats
                .iter()
                .map(|n| -n.offset.normalize_or_zero() / n.distance.max(MIN_WEIGHT_DISTANCE))
                .fold(Vec2::ZERO, |acc, v| acc + v)
                .normalize_or_zero();
            let direction = if away == Vec2::ZERO {
                Vec2::from_angle(rng.random_range(0.0..TAU))
            } else {
                away
            };
            let magnitude = self.tuning.flee_thrust * (1.0 + self.tuning.reaction_speed);
            return Action::moving(direction * magnitude, ActionIntent::Flee).with_cost(self.tuning.flee_cost);
        }

        self.alert = (self.alert - self.tuning.alert_decay).max(0.0);
        let drift = self.tuning.drift_thrust * (1.0 - self.alert);
        if drift <= 0.0 {
            return Action::idle();
        }
        let heading = rng.random_range(0.0..TAU);
        Action::moving(Vec2::from_angle(heading) * drift, ActionIntent::Wander)
    }
}
