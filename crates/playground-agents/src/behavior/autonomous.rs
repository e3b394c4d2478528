//! Utility-based policy for autonomous agents.
//!
//! Each tick the agent scores up to three candidates and takes the best:
//!
//! - **Hold**: no thrust. Always available; wins ties.
//! - **Seek**: head for food when energy is low, otherwise for the current
//!   waypoint. A hungry agent with food in view always prefers it to
//!   holding.
//! - **Evade**: move away from neighbors that are inside the threat radius
//!   *and* closing in. Stationary or receding neighbors are not threats.
//!
//! When the waypoint is reached (or there is none) a new one is chosen: the
//! centroid of a crowd when more than [`CROWD`] neighbors are in view,
//! otherwise a random point in the world. A hungry agent without food in
//! view picks no waypoint and conserves energy instead.
//!
//! Scores combine energy conservation, goal progress and safety using
//! [`UtilityWeights`]. Every `adapt_interval` ticks the mean recorded energy
//! change is compared with the cost of cruising for one tick. Spending more
//! than that shifts weight toward conservation, spending less (holding,
//! eating) shifts it toward goals, and anything close to cruising relaxes
//! the weights back toward their configured values.

use playground_types::{Action, ActionIntent, NeighborView, Observation, ResourceId, Vec2};
use rand::Rng;
use tracing::debug;

use crate::config::{AutonomousTuning, KindProfile, UtilityWeights};
use crate::memory::{MemoryEvent, MemoryRing};
use crate::vitals;

/// Cost proxy for any moving candidate, in `[0, 1]`.
const MOVE_EFFORT: f64 = 0.5;

/// No weight is shifted below this floor during adaptation.
const MIN_WEIGHT: f64 = 0.05;

/// Neighbors in view above which the agent heads for the crowd.
const CROWD: usize = 3;

/// Policy state of one autonomous agent.
#[derive(Debug, Clone, PartialEq)]
pub struct AutonomousState {
    /// Tuning copied from configuration at spawn.
    tuning: AutonomousTuning,
    /// Current (adapted) weights.
    weights: UtilityWeights,
    /// Optional waypoint in absolute coordinates.
    goal: Option<Vec2>,
    /// Resource currently foraged for.
    target_resource: Option<ResourceId>,
}

/// A scored candidate action.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    utility: f64,
    action: Action,
}

impl AutonomousState {
    /// New state with the configured starting weights.
    pub fn new(tuning: AutonomousTuning, goal: Option<Vec2>) -> Self {
        Self {
            weights: normalized(tuning.weights),
            tuning,
            goal,
            target_resource: None,
        }
    }

    /// The current waypoint.
    pub const fn goal(&self) -> Option<Vec2> {
        self.goal
    }

    /// Replace the waypoint.
    pub const fn set_goal(&mut self, goal: Option<Vec2>) {
        self.goal = goal;
    }

    /// The current utility weights.
    pub const fn weights(&self) -> UtilityWeights {
        self.weights
    }

    /// Score the candidates and return the best action.
    pub(crate) fn decide<R: Rng + ?Sized>(
        &mut self,
        obs: &Observation,
        profile: &KindProfile,
        memory: &mut MemoryRing,
        rng: &mut R,
    ) -> Action {
        let own = obs.own;

        if let Some(goal) = self.goal
            && own.position.distance(goal) <= self.tuning.goal_tolerance
        {
            memory.record(obs.tick, MemoryEvent::GoalReached { target: goal });
            self.goal = None;
        }

        if self.tuning.adapt_interval > 0
            && obs.tick > 0
            && obs.tick.checked_rem(self.tuning.adapt_interval) == Some(0)
        {
            self.adapt(obs, profile, memory);
        }

        if self.goal.is_none()
            && let Some(waypoint) = self.choose_waypoint(obs, rng)
        {
            memory.record(obs.tick, MemoryEvent::GoalSet { target: waypoint });
            self.goal = Some(waypoint);
        }

        let threats: Vec<&NeighborView> = obs
            .neighbors
            .iter()
            .filter(|n| n.distance < self.tuning.threat_radius && n.closing_speed(own.velocity) > 0.0)
            .collect();
        let threat_level = threats
            .iter()
            .map(|n| 1.0 - n.distance / self.tuning.threat_radius)
            .fold(0.0, f64::max);
        let safety = 1.0 - threat_level;
        let w = self.weights;
        let cruise = profile.max_thrust * self.tuning.cruise_fraction;

        let mut best = Candidate {
            utility: w.energy.mul_add(1.0, w.threat * safety),
            action: Action::idle(),
        };

        if let Some(seek) = self.seek_candidate(obs, cruise, safety, memory) {
            best = pick(best, seek);
        }

        if let Some(nearest) = threats.first() {
            let away = threats
                .iter()
                .map(|n| -n.offset.normalize_or_zero() * (1.0 - n.distance / self.tuning.threat_radius))
                .fold(Vec2::ZERO, |acc, v| acc + v)
                .normalize_or_zero();
            // Coincident threats give no direction; sidestep instead.
            let away = if away == Vec2::ZERO {
                let side = nearest.offset.perp().normalize_or_zero();
                if side == Vec2::ZERO { Vec2::X } else { side }
            } else {
                away
            };
            let evade = Candidate {
                utility: w.energy.mul_add(1.0 - MOVE_EFFORT, w.threat * (1.0 + threat_level)),
                action: Action::moving(away * cruise, ActionIntent::Flee),
            };
            if evade.utility > best.utility {
                memory.record(obs.tick, MemoryEvent::ThreatSeen { agent: nearest.id });
            }
            best = pick(best, evade);
        }

        best.action
    }

    /// Whether energy is below the foraging threshold.
    fn hungry(&self, obs: &Observation) -> bool {
        obs.own.energy_fraction() < self.tuning.low_energy_fraction
    }

    /// Pick the next waypoint, or `None` to conserve energy.
    fn choose_waypoint<R: Rng + ?Sized>(&self, obs: &Observation, rng: &mut R) -> Option<Vec2> {
        if self.hungry(obs) {
            return None;
        }
        let own = obs.own.position;
        if obs.neighbors.len() > CROWD {
            let sum = obs.neighbors.iter().fold(Vec2::ZERO, |acc, n| acc + n.offset);
            let count = u32::try_from(obs.neighbors.len()).unwrap_or(u32::MAX);
            let centroid = own + sum / f64::from(count);
            if centroid.distance(own) > self.tuning.goal_tolerance {
                return Some(centroid);
            }
        }
        let margin = self.tuning.goal_tolerance.max(0.0);
        Some(Vec2::new(
            random_within(rng, obs.world_width, margin),
            random_within(rng, obs.world_height, margin),
        ))
    }

    /// Build the seek candidate: food when hungry, otherwise the waypoint.
    fn seek_candidate(&mut self, obs: &Observation, cruise: f64, safety: f64, memory: &mut MemoryRing) -> Option<Candidate> {
        let own = obs.own;
        let w = self.weights;
        let low = self.tuning.low_energy_fraction;

        let food = if self.hungry(obs) { obs.nearest_resource() } else { None };

        if let Some(resource) = food {
            if self.target_resource != Some(resource.id) {
                self.target_resource = Some(resource.id);
                memory.record(
                    obs.tick,
                    MemoryEvent::GoalSet {
                        target: own.position + resource.offset,
                    },
                );
            }
            // Positive whenever the agent is hungry.
            let hunger = if low > 0.0 {
                (1.0 - own.energy_fraction() / low).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let inside = resource.offset.length() <= resource.radius;
            let thrust = if inside {
                Vec2::ZERO
            } else {
                resource.offset.normalize_or_zero() * cruise
            };
            // Eating repays the effort of getting there, so food outscores
            // holding for any weights.
            return Some(Candidate {
                utility: w.energy.mul_add(1.0 + hunger, w.goal.mul_add(1.0 + hunger, w.threat * safety)),
                action: Action::moving(thrust, ActionIntent::Forage).consuming(resource.id),
            });
        }
        self.target_resource = None;

        let goal = self.goal?;
        let direction = (goal - own.position).normalize_or_zero();
        Some(Candidate {
            utility: w.energy.mul_add(1.0 - MOVE_EFFORT, w.goal.mul_add(1.0, w.threat * safety)),
            action: Action::moving(direction * cruise, ActionIntent::Seek),
        })
    }

    /// Compare recent energy change with the cost of cruising and shift the
    /// weights accordingly.
    fn adapt(&mut self, obs: &Observation, profile: &KindProfile, memory: &MemoryRing) {
        let since = obs.tick.saturating_sub(self.tuning.adapt_interval);
        let Some(mean_delta) = memory.mean_energy_delta(since) else {
            return;
        };
        let dt = obs.time_step;
        let cruise_move = vitals::movement_cost(profile, profile.max_thrust * self.tuning.cruise_fraction, dt);
        let baseline = -(cruise_move + vitals::idle_cost(profile, dt));
        let band = cruise_move * 0.5;
        let relative = mean_delta - baseline;

        let step = self.tuning.adapt_step;
        let mut w = self.weights;
        if relative < -band {
            w.energy += step;
            w.goal = (w.goal - step).max(MIN_WEIGHT);
        } else if relative > band {
            w.goal += step;
            w.energy = (w.energy - step).max(MIN_WEIGHT);
        } else {
            let target = normalized(self.tuning.weights);
            w.energy += (target.energy - w.energy).clamp(-step, step);
            w.goal += (target.goal - w.goal).clamp(-step, step);
            w.threat += (target.threat - w.threat).clamp(-step, step);
        }
        self.weights = normalized(w);
        debug!(
            tick = obs.tick,
            mean_delta,
            baseline,
            energy = self.weights.energy,
            goal = self.weights.goal,
            threat = self.weights.threat,
            "Autonomous weights adapted"
        );
    }
}

/// Uniform coordinate in `[margin, extent - margin]`, or the middle when the
/// extent is narrower than both margins.
fn random_within<R: Rng + ?Sized>(rng: &mut R, extent: f64, margin: f64) -> f64 {
    let low = margin.min(extent * 0.5);
    let high = extent - low;
    if high > low { rng.random_range(low..=high) } else { extent * 0.5 }
}

/// Keep the strictly better candidate; ties keep the incumbent.
fn pick(current: Candidate, challenger: Candidate) -> Candidate {
    if challenger.utility > current.utility {
        challenger
    } else {
        current
    }
}

/// Scale weights to sum to one, falling back to defaults when degenerate.
fn normalized(weights: UtilityWeights) -> UtilityWeights {
    let parts = [weights.energy, weights.goal, weights.threat];
    if parts.iter().any(|v| !v.is_finite() || *v < 0.0) {
        return UtilityWeights::default();
    }
    let total: f64 = parts.iter().sum();
    if total <= 0.0 {
        return UtilityWeights::default();
    }
    UtilityWeights {
        energy: weights.energy / total,
        goal: weights.goal / total,
        threat: weights.threat / total,
    }
}
