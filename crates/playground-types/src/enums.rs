//! Enumeration types shared across the playground crates.

use serde::{Deserialize, Serialize};

/// The closed set of agent behavior kinds.
///
/// Each kind carries its own energy cap, perception radius and decision
/// policy. Dispatch is a `match` over this enum; there is no open
/// extension point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    /// Goal-driven agent choosing between candidate actions by utility.
    Autonomous,
    /// Stimulus-response agent that flees nearby neighbors.
    Reactive,
    /// Random walker with a bounded turn rate.
    Wanderer,
}

impl AgentKind {
    /// All kinds, in declaration order.
    pub const ALL: [Self; 3] = [Self::Autonomous, Self::Reactive, Self::Wanderer];

    /// Stable lowercase name used in logs and summaries.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Autonomous => "autonomous",
            Self::Reactive => "reactive",
            Self::Wanderer => "wanderer",
        }
    }
}

impl core::fmt::Display for AgentKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Discriminant of an [`Event`](crate::Event).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// An agent entered the simulation.
    Spawn,
    /// An agent ran out of energy and was removed.
    Death,
    /// Two agents, or an agent and an obstacle, overlapped and were separated.
    Collision,
    /// An agent drew energy from a resource node.
    ResourceConsumed,
    /// An agent hit the world boundary and was reflected.
    BoundaryBounce,
    /// An agent's behavior failed; its action was replaced by a no-op.
    BehaviorFault,
}

impl EventKind {
    /// Stable lowercase name used in logs and summaries.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Spawn => "spawn",
            Self::Death => "death",
            Self::Collision => "collision",
            Self::ResourceConsumed => "resource_consumed",
            Self::BoundaryBounce => "boundary_bounce",
            Self::BehaviorFault => "behavior_fault",
        }
    }
}

impl core::fmt::Display for EventKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of the simulation engine.
///
/// ```text
/// Idle -> Running -> Paused -> Running -> Completed
///                  \-> Failed (unrecoverable invariant violation)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineStatus {
    /// Created but no tick has run yet.
    Idle,
    /// Ticks are being executed.
    Running,
    /// Suspended by an operator; resumable.
    Paused,
    /// Stopped normally (step limit, extinction or cancellation).
    Completed,
    /// Stopped after an unrecoverable error.
    Failed,
}

impl EngineStatus {
    /// Whether the engine can never run another tick.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Point in the tick at which a registered callback fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallbackPhase {
    /// Before perception, with the world in its pre-tick state.
    TickStart,
    /// After events have been drained and the clock has advanced.
    TickEnd,
}

/// Reason a run stopped without failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// The configured `max_steps` was reached.
    StepLimit,
    /// Every agent has died.
    Extinction,
    /// An operator requested a stop.
    Cancelled,
    /// An operator paused the engine; the run may be continued later.
    Paused,
}

/// What an agent intended to do this tick, recorded in memory and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionIntent {
    /// Stay put.
    Hold,
    /// Move toward a waypoint.
    Seek,
    /// Move toward a resource and try to consume it.
    Forage,
    /// Move away from nearby agents.
    Flee,
    /// Random exploration.
    Wander,
}

/// One side of the rectangular world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Wall {
    /// `x = 0`.
    Left,
    /// `x = width`.
    Right,
    /// `y = 0`.
    Bottom,
    /// `y = height`.
    Top,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(EngineStatus::Completed.is_terminal());
        assert!(EngineStatus::Failed.is_terminal());
        assert!(!EngineStatus::Paused.is_terminal());
        assert!(!EngineStatus::Idle.is_terminal());
    }

    #[test]
    fn kind_names_are_stable() {
        assert_eq!(AgentKind::Reactive.to_string(), "reactive");
        assert_eq!(EventKind::BoundaryBounce.to_string(), "boundary_bounce");
    }
}
