//! Behavior dispatch over the closed set of agent kinds.
//!
//! A [`Behavior`] holds the per-agent policy state for one of the three
//! kinds. [`Behavior::decide`] is the only entry point: it checks the
//! observation, runs the kind's policy, and caps the requested thrust at
//! the kind's limit.
//!
//! Behaviors receive a private RNG stream per agent and per tick, and may
//! only touch their own state and memory. That makes decisions independent
//! of evaluation order.

pub mod autonomous;
pub mod reactive;
pub mod wanderer;

use playground_types::{Action, AgentId, AgentKind, Observation, Vec2};
use rand::Rng;

use crate::config::{AgentsConfig, KindProfile};
use crate::error::BehaviorError;
use crate::memory::MemoryRing;

pub use autonomous::AutonomousState;
pub use reactive::ReactiveState;
pub use wanderer::WandererState;

/// Per-agent policy state.
#[derive(Debug, Clone, PartialEq)]
pub enum Behavior {
    /// Utility-driven goal seeker.
    Autonomous(AutonomousState),
    /// Flees anything inside its threat range.
    Reactive(ReactiveState),
    /// Bounded-turn random walker.
    Wanderer(WandererState),
}

impl Behavior {
    /// Fresh policy state for a new agent.
    ///
    /// `goal` is only used by autonomous agents. `velocity` seeds a
    /// wanderer's heading; a stationary wanderer gets a heading derived from
    /// its id.
    pub fn for_kind(kind: AgentKind, id: AgentId, config: &AgentsConfig, goal: Option<Vec2>, velocity: Vec2) -> Self {
        match kind {
            AgentKind::Autonomous => Self::Autonomous(AutonomousState::new(config.autonomous_tuning, goal)),
            AgentKind::Reactive => Self::Reactive(ReactiveState::new(config.reactive_tuning)),
            AgentKind::Wanderer => Self::Wanderer(WandererState::new(config.wanderer_tuning, id, velocity)),
        }
    }

    /// The kind this state belongs to.
    pub const fn kind(&self) -> AgentKind {
        match self {
            Self::Autonomous(_) => AgentKind::Autonomous,
            Self::Reactive(_) => AgentKind::Reactive,
            Self::Wanderer(_) => AgentKind::Wanderer,
        }
    }

    /// Choose this tick's action.
    ///
    /// # Errors
    ///
    /// Returns [`BehaviorError::MalformedObservation`] if the observation has
    /// non-finite values, or [`BehaviorError::MalformedAction`] if the policy
    /// produced an action that cannot be applied.
    pub fn decide<R: Rng + ?Sized>(
        &mut self,
        observation: &Observation,
        profile: &KindProfile,
        memory: &mut MemoryRing,
        rng: &mut R,
    ) -> Result<Action, BehaviorError> {
        if !observation.is_well_formed() {
            return Err(BehaviorError::MalformedObservation {
                reason: format!("agent {} observed non-finite state", observation.own.id),
            });
        }

        let mut action = match self {
            Self::Autonomous(state) => state.decide(observation, profile, memory, rng),
            Self::Reactive(state) => state.decide(observation, profile, memory, rng),
            Self::Wanderer(state) => state.decide(observation, profile, rng),
        };

        if !action.is_well_formed() {
            return Err(BehaviorError::MalformedAction {
                reason: format!(
                    "thrust {} with declared cost {}",
                    action.thrust, action.energy_cost
                ),
            });
        }
        action.thrust = action.thrust.clamp_length_max(profile.max_thrust);
        Ok(action)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use playground_types::{SelfState, Weather};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    pub(crate) fn observation(kind: AgentKind, position: Vec2) -> Observation {
        Observation {
            tick: 1,
            time_step: 0.1,
            own: SelfState {
                id: AgentId(1),
                kind,
                position,
                velocity: Vec2::ZERO,
                energy: 50.0,
                max_energy: 100.0,
                age: 0,
            },
            neighbors: Vec::new(),
            obstacles: Vec::new(),
            resources: Vec::new(),
            weather: Weather::default(),
            world_width: 100.0,
            world_height: 100.0,
        }
    }

    #[test]
    fn kind_matches_constructor() {
        let config = AgentsConfig::default();
        for kind in AgentKind::ALL {
            let behavior = Behavior::for_kind(kind, AgentId(1), &config, None, Vec2::ZERO);
            assert_eq!(behavior.kind(), kind);
        }
    }

    #[test]
    fn non_finite_observation_is_a_fault() {
        let config = AgentsConfig::default();
        let mut behavior = Behavior::for_kind(AgentKind::Wanderer, AgentId(1), &config, None, Vec2::ZERO);
        let obs = observation(AgentKind::Wanderer, Vec2::new(f64::NAN, 3.0));
        let mut memory = MemoryRing::new(4);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let result = behavior.decide(&obs, &config.wanderer, &mut memory, &mut rng);
        assert!(matches!(result, Err(BehaviorError::MalformedObservation { .. })));
    }

    #[test]
    fn thrust_is_capped_per_kind() {
        let config = AgentsConfig::default();
        let profile = KindProfile {
            max_thrust: 0.25,
            ..config.wanderer
        };
        let mut behavior = Behavior::for_kind(AgentKind::Wanderer, AgentId(1), &config, None, Vec2::X);
        let obs = observation(AgentKind::Wanderer, Vec2::new(50.0, 50.0));
        let mut memory = MemoryRing::new(4);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..20 {
            let action = behavior.decide(&obs, &profile, &mut memory, &mut rng).unwrap();
            assert!(action.thrust.length() <= 0.25 + 1e-12);
        }
    }
}
