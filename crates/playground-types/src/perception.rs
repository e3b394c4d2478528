//! The observation handed to each agent's behavior before it decides.
//!
//! Observations are built from the pre-tick snapshot of the world, so every
//! agent sees the same state regardless of evaluation order. All positions
//! of other entities are relative to the observing agent.

use serde::{Deserialize, Serialize};

use crate::Vec2;
use crate::enums::AgentKind;
use crate::environment::Weather;
use crate::ids::{AgentId, ObstacleId, ResourceId};

/// The observing agent's own state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SelfState {
    /// Agent identifier.
    pub id: AgentId,
    /// Behavior kind.
    pub kind: AgentKind,
    /// Absolute position.
    pub position: Vec2,
    /// Current velocity.
    pub velocity: Vec2,
    /// Current energy.
    pub energy: f64,
    /// Energy cap for this kind.
    pub max_energy: f64,
    /// Ticks survived.
    pub age: u64,
}

impl SelfState {
    /// Energy as a fraction of the cap, `[0, 1]`.
    pub fn energy_fraction(&self) -> f64 {
        if self.max_energy > 0.0 {
            (self.energy / self.max_energy).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

/// Another agent within perception range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NeighborView {
    /// Neighbor identifier.
    pub id: AgentId,
    /// Neighbor kind.
    pub kind: AgentKind,
    /// Position relative to the observer.
    pub offset: Vec2,
    /// Neighbor velocity (absolute).
    pub velocity: Vec2,
    /// Distance from the observer.
    pub distance: f64,
}

impl NeighborView {
    /// Rate at which this neighbor closes the distance to an observer moving
    /// at `own_velocity`. Positive means approaching.
    pub fn closing_speed(&self, own_velocity: Vec2) -> f64 {
        if self.distance <= f64::EPSILON {
            return 0.0;
        }
        let relative_velocity = self.velocity - own_velocity;
        -self.offset.dot(relative_velocity) / self.distance
    }
}

/// An obstacle within perception range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObstacleView {
    /// Obstacle identifier.
    pub id: ObstacleId,
    /// Center relative to the observer.
    pub offset: Vec2,
    /// Obstacle radius.
    pub radius: f64,
}

/// A resource node within perception range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResourceView {
    /// Resource identifier.
    pub id: ResourceId,
    /// Center relative to the observer.
    pub offset: Vec2,
    /// Patch radius.
    pub radius: f64,
    /// Energy currently available.
    pub available: f64,
}

/// Everything a behavior may look at when choosing an action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Tick being decided.
    pub tick: u64,
    /// Seconds of simulated time per tick.
    pub time_step: f64,
    /// The observer.
    pub own: SelfState,
    /// Neighbors within perception range, ascending by id.
    pub neighbors: Vec<NeighborView>,
    /// Obstacles within perception range, ascending by id.
    pub obstacles: Vec<ObstacleView>,
    /// Resource nodes within perception range, ascending by id.
    pub resources: Vec<ResourceView>,
    /// Current weather.
    pub weather: Weather,
    /// World width.
    pub world_width: f64,
    /// World height.
    pub world_height: f64,
}

impl Observation {
    /// Whether every numeric field of the observer is finite.
    pub fn is_well_formed(&self) -> bool {
        self.own.position.is_finite()
            && self.own.velocity.is_finite()
            && self.own.energy.is_finite()
            && self.time_step.is_finite()
            && self.time_step > 0.0
    }

    /// The nearest non-depleted resource, ties broken by lower id.
    pub fn nearest_resource(&self) -> Option<&ResourceView> {
        self.resources
            .iter()
            .filter(|r| r.available > 0.0)
            .min_by(|a, b| a.offset.length().total_cmp(&b.offset.length()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn neighbor(offset: Vec2, velocity: Vec2) -> NeighborView {
        NeighborView {
            id: AgentId(2),
            kind: AgentKind::Wanderer,
            offset,
            velocity,
            distance: offset.length(),
        }
    }

    #[test]
    fn neighbor_moving_toward_observer_is_closing() {
        let n = neighbor(Vec2::new(5.0, 0.0), Vec2::new(-1.0, 0.0));
        assert!(n.closing_speed(Vec2::ZERO) > 0.0);
    }

    #[test]
    fn neighbor_moving_away_is_not_closing() {
        let n = neighbor(Vec2::new(5.0, 0.0), Vec2::new(1.0, 0.0));
        assert!(n.closing_speed(Vec2::ZERO) < 0.0);
    }

    #[test]
    fn stationary_pair_has_zero_closing_speed() {
        let n = neighbor(Vec2::new(0.0, 3.0), Vec2::ZERO);
        assert!(n.closing_speed(Vec2::ZERO).abs() < 1e-12);
    }
}
