//! Tick pipeline: one fixed step of the simulation.
//!
//! Each tick runs these phases in order:
//!
//! 1. **Observe** -- build every agent's [`Observation`] from the state at
//!    the start of the tick.
//!
//! 2. **Decide** -- collect one action per agent. Faults become no-ops and
//!    `BehaviorFault` events.
//!
//! 3. **Physics** -- integrate, bounce, push out of obstacles, separate
//!    colliding agents and serve consumption (see [`physics`]).
//!
//! 4. **Economics** -- charge each agent for its action, age it, and
//!    remove agents whose energy reached zero with a `Death` event.
//!
//! 5. **Environment** -- drift the weather and regenerate resources.
//!
//! 6. **Verify** -- check that the spatial grid matches agent positions and
//!    that every agent is inside the world with energy in range. A failure
//!    here is fatal.
//!
//! 7. **Remember** -- write this tick's collisions, bounces and meals into
//!    the involved agents' memories.
//!
//! 8. **Drain** -- take the tick's events off the bus and advance the clock.
//!
//! The pipeline is deterministic: the same state, configuration and seed
//! always produce the same events in the same order.
//!
//! [`Observation`]: playground_types::Observation

use std::collections::BTreeMap;

use playground_agents::{Agent, AgentError, MemoryEvent, vitals};
use playground_events::EventBus;
use playground_types::{Action, AgentId, CollisionTarget, Event, EventDetails};
use playground_world::{SpatialError, SpatialGrid, World};
use tracing::{debug, error};

use crate::clock::{ClockError, SimulationClock};
use crate::config::SimulationConfig;
use crate::decision;
use crate::perception::{self, PerceptionContext};
use crate::physics::{self, PhysicsError, PhysicsStep};

/// Errors that can occur during tick execution.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    /// A clock operation failed.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },

    /// The physics phase failed.
    #[error("physics error: {source}")]
    Physics {
        /// The underlying physics error.
        #[from]
        source: PhysicsError,
    },

    /// An agent state update failed.
    #[error("agent error: {source}")]
    Agent {
        /// The underlying agent error.
        #[from]
        source: AgentError,
    },

    /// Removing a dead agent from the grid failed.
    #[error("spatial index error: {source}")]
    Spatial {
        /// The underlying grid error.
        #[from]
        source: SpatialError,
    },

    /// State no longer satisfies a simulation invariant.
    #[error("invariant violated: {reason}")]
    InvariantViolation {
        /// What was found.
        reason: String,
    },
}

/// Summary of a single tick's execution.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    /// The tick that was executed.
    pub tick: u64,
    /// Everything that happened, in causal order.
    pub events: Vec<Event>,
    /// Agents that died this tick, ascending.
    pub deaths: Vec<AgentId>,
    /// Agents whose behavior faulted this tick, ascending.
    pub faults: Vec<AgentId>,
    /// Live agents after the tick.
    pub agents_alive: usize,
}

/// The mutable simulation state passed through the tick pipeline.
#[derive(Debug)]
pub struct SimulationState {
    /// Tick counter.
    pub clock: SimulationClock,
    /// Environment.
    pub world: World,
    /// Spatial index over live agents.
    pub grid: SpatialGrid,
    /// Live agents by id.
    pub agents: BTreeMap<AgentId, Agent>,
    /// Events raised since the last drain.
    pub bus: EventBus,
    /// Validated configuration.
    pub config: SimulationConfig,
}

impl SimulationState {
    /// Check the grid against agent positions, and every agent against the
    /// world bounds and its energy range.
    ///
    /// # Errors
    ///
    /// Returns [`TickError::InvariantViolation`] describing the first
    /// problem found.
    pub fn verify(&self) -> Result<(), TickError> {
        self.grid
            .verify(self.agents.values().map(|a| (a.id, a.position)))
            .map_err(|err| TickError::InvariantViolation {
                reason: err.to_string(),
            })?;

        for agent in self.agents.values() {
            if !self.world.contains(agent.position) {
                return Err(TickError::InvariantViolation {
                    reason: format!("agent {} at {} is outside the world", agent.id, agent.position),
                });
            }
            if !agent.energy.is_finite() || agent.energy < 0.0 || agent.energy > agent.max_energy {
                return Err(TickError::InvariantViolation {
                    reason: format!(
                        "agent {} energy {} outside [0, {}]",
                        agent.id, agent.energy, agent.max_energy
                    ),
                });
            }
        }
        Ok(())
    }
}

/// Execute one complete tick.
///
/// # Errors
///
/// Returns [`TickError`] if a phase fails or an invariant is violated. The
/// state should be considered unusable afterwards.
pub fn run_tick(state: &mut SimulationState) -> Result<TickReport, TickError> {
    let tick = state.clock.tick();
    let dt = state.clock.time_step();

    // --- Observe ---
    let observations = perception::observe_all(&PerceptionContext {
        tick,
        time_step: dt,
        world: &state.world,
        grid: &state.grid,
        agents: &state.agents,
        config: &state.config.agents,
    });

    // --- Decide ---
    let decisions = decision::decide_all(
        &mut state.agents,
        &observations,
        &state.config.agents,
        state.config.engine.seed,
        state.config.engine.run_parallel,
    );
    for (agent, reason) in &decisions.faults {
        state.bus.publish(Event::new(
            tick,
            vec![*agent],
            EventDetails::BehaviorFault { reason: reason.clone() },
        ));
    }

    let energy_before: BTreeMap<AgentId, f64> = state.agents.values().map(|a| (a.id, a.energy)).collect();

    // --- Physics ---
    let step = PhysicsStep {
        tick,
        time_step: dt,
        physics: &state.config.physics,
        agents: &state.config.agents,
        collisions: state.config.engine.enable_physics,
    };
    let events = physics::resolve(
        &step,
        &mut state.agents,
        &decisions.actions,
        &mut state.world,
        &mut state.grid,
    )?;
    state.bus.publish_all(events);

    // --- Economics ---
    let deaths = settle_energy(state, tick, &decisions.actions, &energy_before)?;

    // --- Environment ---
    let weather = state.world.drift_weather(tick);
    if state.config.world.resource_regeneration {
        state.world.regenerate_resources(dt);
    }

    // --- Verify ---
    if let Err(err) = state.verify() {
        error!(tick, error = %err, "Tick invariant check failed");
        return Err(err);
    }

    // --- Remember ---
    remember_events(&mut state.agents, state.bus.pending(), tick);

    // --- Drain ---
    let events = state.bus.drain();
    state.clock.advance()?;

    debug!(
        tick,
        agents = state.agents.len(),
        events = events.len(),
        deaths = deaths.len(),
        temperature = weather.temperature,
        "Tick complete"
    );

    Ok(TickReport {
        tick,
        events,
        deaths,
        faults: decisions.faults.into_iter().map(|(id, _)| id).collect(),
        agents_alive: state.agents.len(),
    })
}

/// Charge every agent for its action, age it, and remove the dead.
///
/// Returns the ids of agents that died, ascending.
fn settle_energy(
    state: &mut SimulationState,
    tick: u64,
    actions: &BTreeMap<AgentId, Action>,
    energy_before: &BTreeMap<AgentId, f64>,
) -> Result<Vec<AgentId>, TickError> {
    let dt = state.clock.time_step();
    let consume_cost = state.config.agents.consume_cost;
    let idle = Action::idle();
    let mut dead = Vec::new();

    for agent in state.agents.values_mut() {
        let action = actions.get(&agent.id).unwrap_or(&idle);
        let profile = state.config.agents.profile(agent.kind);
        let cost = vitals::tick_cost(profile, action, dt, consume_cost);
        let depleted = vitals::spend(agent, cost)?;
        agent.grow_older()?;

        let before = energy_before.get(&agent.id).copied().unwrap_or(agent.energy);
        agent.memory.record(tick, MemoryEvent::Acted { intent: action.intent });
        agent.memory.record(
            tick,
            MemoryEvent::Outcome {
                energy_delta: agent.energy - before,
            },
        );

        if depleted {
            dead.push(agent.id);
        }
    }

    for id in &dead {
        let Some(agent) = state.agents.remove(id) else {
            continue;
        };
        state.grid.remove(*id)?;
        debug!(tick, agent_id = %id, age = agent.age, "Agent died");
        state.bus.publish(Event::new(
            tick,
            vec![*id],
            EventDetails::Death {
                position: agent.position,
                age: agent.age,
            },
        ));
    }
    Ok(dead)
}

/// Record this tick's physical interactions in the memories of the live
/// agents involved.
fn remember_events(agents: &mut BTreeMap<AgentId, Agent>, events: &[Event], tick: u64) {
    for event in events {
        match &event.details {
            EventDetails::Collision {
                target: CollisionTarget::Agent(other),
                ..
            } => {
                let low = event.agents.first().copied();
                if let Some(low) = low {
                    record(agents, low, tick, MemoryEvent::CollidedWithAgent { other: *other });
                    record(agents, *other, tick, MemoryEvent::CollidedWithAgent { other: low });
                }
            }
            EventDetails::Collision {
                target: CollisionTarget::Obstacle(_),
                ..
            } => {
                for id in &event.agents {
                    record(agents, *id, tick, MemoryEvent::CollidedWithObstacle);
                }
            }
            EventDetails::BoundaryBounce { walls, .. } => {
                for id in &event.agents {
                    record(agents, *id, tick, MemoryEvent::Bounced { walls: walls.clone() });
                }
            }
            EventDetails::ResourceConsumed { resource, amount, .. } => {
                for id in &event.agents {
                    record(
                        agents,
                        *id,
                        tick,
                        MemoryEvent::Consumed {
                            resource: *resource,
                            amount: *amount,
                        },
                    );
                }
            }
            EventDetails::Spawn { .. } | EventDetails::Death { .. } | EventDetails::BehaviorFault { .. } => {}
        }
    }
}

fn record(agents: &mut BTreeMap<AgentId, Agent>, id: AgentId, tick: u64, event: MemoryEvent) {
    if let Some(agent) = agents.get_mut(&id) {
        agent.memory.record(tick, event);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use playground_agents::AgentSpawn;
    use playground_types::{AgentKind, EventKind, Vec2};
    use playground_world::WeatherSystem;

    use super::*;

    fn state(config: SimulationConfig, spawns: &[AgentSpawn]) -> SimulationState {
        let world = World::new(
            config.world.width,
            config.world.height,
            config.world.cell_size,
            WeatherSystem::new(config.engine.seed, config.weather),
        )
        .unwrap();
        let mut grid = SpatialGrid::new(config.world.cell_size).unwrap();
        let mut agents = BTreeMap::new();
        let mut id = AgentId::FIRST;
        for spawn in spawns {
            let agent = Agent::new(id, spawn, &config.agents).unwrap();
            grid.insert(id, agent.position).unwrap();
            agents.insert(id, agent);
            id = id.next().unwrap();
        }
        SimulationState {
            clock: SimulationClock::new(config.engine.time_step).unwrap(),
            world,
            grid,
            agents,
            bus: EventBus::new(),
            config,
        }
    }

    fn small_config() -> SimulationConfig {
        let mut config = SimulationConfig::default();
        config.world.width = 100.0;
        config.world.height = 100.0;
        config.world.cell_size = 10.0;
        config
    }

    #[test]
    fn tick_advances_clock_and_ages_agents() {
        let mut s = state(small_config(), &[AgentSpawn::new(AgentKind::Wanderer, Vec2::new(50.0, 50.0))]);
        let report = run_tick(&mut s).unwrap();
        assert_eq!(report.tick, 0);
        assert_eq!(s.clock.tick(), 1);
        assert_eq!(s.agents[&AgentId(1)].age, 1);
        assert_eq!(report.agents_alive, 1);
        assert!(s.bus.is_empty());
    }

    #[test]
    fn starving_agent_dies_and_leaves_grid() {
        let spawn = AgentSpawn::new(AgentKind::Autonomous, Vec2::new(50.0, 50.0)).with_energy(0.001);
        let mut s = state(small_config(), &[spawn]);
        let report = run_tick(&mut s).unwrap();
        assert_eq!(report.deaths, vec![AgentId(1)]);
        assert!(s.agents.is_empty());
        assert!(s.grid.is_empty());
        let death = report.events.iter().find(|e| e.kind() == EventKind::Death).unwrap();
        assert_eq!(death.agents, vec![AgentId(1)]);
        assert_eq!(report.events.last().map(Event::kind), Some(EventKind::Death));
    }

    #[test]
    fn idle_cost_is_charged_every_tick() {
        let mut config = small_config();
        config.weather.enabled = false;
        let mut s = state(config, &[AgentSpawn::new(AgentKind::Reactive, Vec2::new(50.0, 50.0))]);
        let before = s.agents[&AgentId(1)].energy;
        run_tick(&mut s).unwrap();
        let after = s.agents[&AgentId(1)].energy;
        // At least idle_rate * dt = 0.08 * 0.1.
        assert!(before - after >= 0.008 - 1e-12);
    }

    #[test]
    fn overlapping_spawns_collide_once_and_remember_it() {
        let spawns = [
            AgentSpawn::new(AgentKind::Wanderer, Vec2::new(50.0, 50.0)),
            AgentSpawn::new(AgentKind::Wanderer, Vec2::new(50.0, 50.0)),
        ];
        let mut config = small_config();
        config.agents.wanderer_tuning.min_thrust = 0.0;
        config.agents.wanderer_tuning.curiosity = 0.0;
        let mut s = state(config, &spawns);
        let report = run_tick(&mut s).unwrap();
        let collisions: Vec<&Event> = report
            .events
            .iter()
            .filter(|e| e.kind() == EventKind::Collision)
            .collect();
        assert_eq!(collisions.len(), 1);
        assert_eq!(collisions.first().map(|e| e.agents.clone()), Some(vec![AgentId(1), AgentId(2)]));
        for id in [AgentId(1), AgentId(2)] {
            assert!(s.agents[&id]
                .memory
                .iter()
                .any(|m| matches!(m.event, MemoryEvent::CollidedWithAgent { .. })));
        }
        for (index, event) in report.events.iter().enumerate() {
            assert_eq!(event.sequence, u64::try_from(index).unwrap());
        }
    }

    #[test]
    fn corrupted_grid_is_an_invariant_violation() {
        let mut s = state(small_config(), &[AgentSpawn::new(AgentKind::Wanderer, Vec2::new(50.0, 50.0))]);
        s.grid.insert(AgentId(99), Vec2::new(1.0, 1.0)).unwrap();
        assert!(matches!(run_tick(&mut s), Err(TickError::InvariantViolation { .. })));
    }
}
