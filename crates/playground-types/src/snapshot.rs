//! Read-only, by-value views of simulation state for external consumers.

use serde::{Deserialize, Serialize};

use crate::Vec2;
use crate::enums::AgentKind;
use crate::environment::{Obstacle, ResourceNode, Weather};
use crate::ids::AgentId;

/// Copy of one agent's externally visible state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    /// Agent identifier.
    pub id: AgentId,
    /// Behavior kind.
    pub kind: AgentKind,
    /// Position.
    pub position: Vec2,
    /// Velocity.
    pub velocity: Vec2,
    /// Current energy.
    pub energy: f64,
    /// Energy cap.
    pub max_energy: f64,
    /// Ticks survived.
    pub age: u64,
    /// Number of entries in the agent's memory ring.
    pub memories: usize,
}

/// Copy of the environment at a tick boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    /// Next tick to run.
    pub tick: u64,
    /// Simulated seconds elapsed.
    pub elapsed: f64,
    /// World width.
    pub width: f64,
    /// World height.
    pub height: f64,
    /// Current weather.
    pub weather: Weather,
    /// All obstacles, ascending by id.
    pub obstacles: Vec<Obstacle>,
    /// All resource nodes, ascending by id.
    pub resources: Vec<ResourceNode>,
}
