//! Simulation events: the record of what happened during a tick.
//!
//! Events are published to the bus in causal order and drained once per
//! tick. The [`EventKind`] of an event is derived from its payload so the
//! two can never disagree.

use serde::{Deserialize, Serialize};

use crate::Vec2;
use crate::enums::{AgentKind, EventKind, Wall};
use crate::ids::{AgentId, ObstacleId, ResourceId};

/// A single simulation event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Tick during which the event occurred.
    pub tick: u64,
    /// Position of the event within its tick's batch, assigned on publish.
    pub sequence: u64,
    /// Agents involved, lowest id first for pairwise events.
    pub agents: Vec<AgentId>,
    /// Kind-specific payload.
    pub details: EventDetails,
}

impl Event {
    /// Create an event. The sequence number is assigned by the bus.
    pub const fn new(tick: u64, agents: Vec<AgentId>, details: EventDetails) -> Self {
        Self {
            tick,
            sequence: 0,
            agents,
            details,
        }
    }

    /// Return the discriminant of this event.
    pub const fn kind(&self) -> EventKind {
        self.details.kind()
    }

    /// Whether `agent` takes part in this event.
    pub fn involves(&self, agent: AgentId) -> bool {
        self.agents.contains(&agent)
    }
}

/// What the other party of a collision was.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "id")]
pub enum CollisionTarget {
    /// Another agent (the second entry of [`Event::agents`]).
    Agent(AgentId),
    /// A static obstacle.
    Obstacle(ObstacleId),
}

/// Kind-specific event payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum EventDetails {
    /// An agent was added to the simulation.
    Spawn {
        /// Behavior kind of the new agent.
        agent_kind: AgentKind,
        /// Position after clamping into the world.
        position: Vec2,
        /// Starting energy.
        energy: f64,
    },
    /// An agent's energy reached zero.
    Death {
        /// Position at time of death.
        position: Vec2,
        /// Age in ticks.
        age: u64,
    },
    /// An overlap was detected and resolved.
    Collision {
        /// The other party.
        target: CollisionTarget,
        /// Penetration depth before separation.
        overlap: f64,
    },
    /// Energy moved from a resource node into an agent.
    ResourceConsumed {
        /// The node that was drawn from.
        resource: ResourceId,
        /// Energy transferred.
        amount: f64,
        /// Energy left in the node afterwards.
        remaining: f64,
    },
    /// An agent crossed one or more walls and was reflected back inside.
    BoundaryBounce {
        /// Walls that were hit, in ascending order.
        walls: Vec<Wall>,
        /// Position after clamping.
        position: Vec2,
        /// Velocity after reflection.
        velocity: Vec2,
    },
    /// A behavior returned an error or a malformed action.
    BehaviorFault {
        /// Human-readable cause.
        reason: String,
    },
}

impl EventDetails {
    /// Return the discriminant of this payload.
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::Spawn { .. } => EventKind::Spawn,
            Self::Death { .. } => EventKind::Death,
            Self::Collision { .. } => EventKind::Collision,
            Self::ResourceConsumed { .. } => EventKind::ResourceConsumed,
            Self::BoundaryBounce { .. } => EventKind::BoundaryBounce,
            Self::BehaviorFault { .. } => EventKind::BehaviorFault,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn kind_follows_payload() {
        let event = Event::new(
            3,
            vec![AgentId(1)],
            EventDetails::Death {
                position: Vec2::new(1.0, 2.0),
                age: 40,
            },
        );
        assert_eq!(event.kind(), EventKind::Death);
        assert!(event.involves(AgentId(1)));
        assert!(!event.involves(AgentId(2)));
    }

    #[test]
    fn payload_is_tagged_in_json() {
        let event = Event::new(
            0,
            vec![AgentId(1), AgentId(2)],
            EventDetails::Collision {
                target: CollisionTarget::Agent(AgentId(2)),
                overlap: 0.5,
            },
        );
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["details"]["kind"], "collision");
        assert_eq!(json["details"]["target"]["type"], "agent");
        assert_eq!(json["details"]["target"]["id"], 2);
    }
}
