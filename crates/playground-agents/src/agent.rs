//! Agent records and spawning.
//!
//! An [`Agent`] owns its physical state, energy, age, bounded memory and
//! policy state. The engine keeps agents in an id-ordered map and hands out
//! [`AgentSnapshot`] copies to anything outside the tick.

use playground_types::{AgentId, AgentKind, AgentSnapshot, SelfState, Vec2};

use crate::behavior::Behavior;
use crate::config::{AgentsConfig, KindProfile};
use crate::error::AgentError;
use crate::memory::MemoryRing;

/// A request to add an agent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentSpawn {
    /// Behavior kind.
    pub kind: AgentKind,
    /// Starting position.
    pub position: Vec2,
    /// Starting velocity.
    pub velocity: Vec2,
    /// Starting energy; `None` means the kind's cap.
    pub energy: Option<f64>,
    /// Initial waypoint for autonomous agents.
    pub goal: Option<Vec2>,
}

impl AgentSpawn {
    /// Stationary agent at full energy.
    pub const fn new(kind: AgentKind, position: Vec2) -> Self {
        Self {
            kind,
            position,
            velocity: Vec2::ZERO,
            energy: None,
            goal: None,
        }
    }

    /// Set the starting velocity.
    #[must_use]
    pub const fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    /// Set the starting energy.
    #[must_use]
    pub const fn with_energy(mut self, energy: f64) -> Self {
        self.energy = Some(energy);
        self
    }

    /// Set an initial waypoint.
    #[must_use]
    pub const fn with_goal(mut self, goal: Vec2) -> Self {
        self.goal = Some(goal);
        self
    }
}

/// A live agent.
#[derive(Debug, Clone)]
pub struct Agent {
    /// Unique identifier, never reused within a run.
    pub id: AgentId,
    /// Behavior kind.
    pub kind: AgentKind,
    /// Position inside the world bounds.
    pub position: Vec2,
    /// Velocity in world units per second.
    pub velocity: Vec2,
    /// Energy in `[0, max_energy]`.
    pub energy: f64,
    /// Energy cap for this kind.
    pub max_energy: f64,
    /// Ticks survived.
    pub age: u64,
    /// Recent experiences.
    pub memory: MemoryRing,
    /// Policy state.
    pub behavior: Behavior,
}

impl Agent {
    /// Build an agent from a spawn request.
    ///
    /// Starting energy above the kind's cap is clamped to the cap.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::InvalidSpawn`] if the position, velocity or
    /// energy is non-finite, or the energy is negative.
    pub fn new(id: AgentId, spawn: &AgentSpawn, config: &AgentsConfig) -> Result<Self, AgentError> {
        if !spawn.position.is_finite() || !spawn.velocity.is_finite() {
            return Err(AgentError::InvalidSpawn {
                reason: format!("non-finite position {} or velocity {}", spawn.position, spawn.velocity),
            });
        }
        if let Some(goal) = spawn.goal
            && !goal.is_finite()
        {
            return Err(AgentError::InvalidSpawn {
                reason: format!("non-finite goal {goal}"),
            });
        }

        let profile = config.profile(spawn.kind);
        let energy = spawn.energy.unwrap_or(profile.max_energy);
        if !energy.is_finite() || energy < 0.0 {
            return Err(AgentError::InvalidSpawn {
                reason: format!("energy must be finite and non-negative, got {energy}"),
            });
        }

        Ok(Self {
            id,
            kind: spawn.kind,
            position: spawn.position,
            velocity: spawn.velocity,
            energy: energy.min(profile.max_energy),
            max_energy: profile.max_energy,
            age: 0,
            memory: MemoryRing::new(config.memory_capacity),
            behavior: Behavior::for_kind(spawn.kind, id, config, spawn.goal, spawn.velocity),
        })
    }

    /// Whether the agent still has energy.
    pub fn is_alive(&self) -> bool {
        self.energy > 0.0
    }

    /// The kind's profile.
    pub const fn profile<'a>(&self, config: &'a AgentsConfig) -> &'a KindProfile {
        config.profile(self.kind)
    }

    /// Advance the age counter by one tick.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::AgeOverflow`] if the counter is saturated.
    pub fn grow_older(&mut self) -> Result<(), AgentError> {
        self.age = self
            .age
            .checked_add(1)
            .ok_or(AgentError::AgeOverflow { agent: self.id })?;
        Ok(())
    }

    /// The agent's own state as its behavior sees it.
    pub const fn self_state(&self) -> SelfState {
        SelfState {
            id: self.id,
            kind: self.kind,
            position: self.position,
            velocity: self.velocity,
            energy: self.energy,
            max_energy: self.max_energy,
            age: self.age,
        }
    }

    /// By-value copy for external consumers.
    pub fn snapshot(&self) -> AgentSnapshot {
        AgentSnapshot {
            id: self.id,
            kind: self.kind,
            position: self.position,
            velocity: self.velocity,
            energy: self.energy,
            max_energy: self.max_energy,
            age: self.age,
            memories: self.memory.len(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn spawns_at_kind_cap() {
        let config = AgentsConfig::default();
        let agent = Agent::new(
            AgentId(1),
            &AgentSpawn::new(AgentKind::Reactive, Vec2::new(5.0, 5.0)),
            &config,
        )
        .unwrap();
        assert!((agent.energy - 80.0).abs() < f64::EPSILON);
        assert!((agent.max_energy - 80.0).abs() < f64::EPSILON);
        assert_eq!(agent.behavior.kind(), AgentKind::Reactive);
        assert_eq!(agent.memory.capacity(), config.memory_capacity);
    }

    #[test]
    fn excess_energy_is_clamped() {
        let spawn = AgentSpawn::new(AgentKind::Wanderer, Vec2::ZERO).with_energy(500.0);
        let agent = Agent::new(AgentId(1), &spawn, &AgentsConfig::default()).unwrap();
        assert!((agent.energy - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_negative_energy() {
        let spawn = AgentSpawn::new(AgentKind::Wanderer, Vec2::ZERO).with_energy(-1.0);
        let err = Agent::new(AgentId(1), &spawn, &AgentsConfig::default());
        assert!(matches!(err, Err(AgentError::InvalidSpawn { .. })));
    }

    #[test]
    fn rejects_non_finite_position() {
        let spawn = AgentSpawn::new(AgentKind::Autonomous, Vec2::new(f64::INFINITY, 0.0));
        let err = Agent::new(AgentId(1), &spawn, &AgentsConfig::default());
        assert!(matches!(err, Err(AgentError::InvalidSpawn { .. })));
    }

    #[test]
    fn age_saturation_is_an_error() {
        let mut agent = Agent::new(
            AgentId(1),
            &AgentSpawn::new(AgentKind::Wanderer, Vec2::ZERO),
            &AgentsConfig::default(),
        )
        .unwrap();
        agent.age = u64::MAX;
        assert!(matches!(agent.grow_older(), Err(AgentError::AgeOverflow { .. })));
    }

    #[test]
    fn snapshot_counts_memories() {
        let mut agent = Agent::new(
            AgentId(4),
            &AgentSpawn::new(AgentKind::Wanderer, Vec2::new(1.0, 2.0)),
            &AgentsConfig::default(),
        )
        .unwrap();
        agent.memory.record(0, crate::memory::MemoryEvent::CollidedWithObstacle);
        let snap = agent.snapshot();
        assert_eq!(snap.id, AgentId(4));
        assert_eq!(snap.memories, 1);
        assert_eq!(snap.position, Vec2::new(1.0, 2.0));
    }
}
