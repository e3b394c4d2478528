//! Population spawner for seeding the engine with its initial agents.
//!
//! Agents are created kind by kind (autonomous, reactive, then wanderers)
//! at random positions clear of obstacles, with a random heading and a
//! speed of up to half the kind's limit. Autonomous agents also get a
//! random first waypoint. All randomness comes from the caller's RNG, so a
//! seeded RNG gives the same population every run.

use std::collections::BTreeMap;
use std::f64::consts::TAU;

use playground_agents::AgentSpawn;
use playground_core::config::PopulationConfig;
use playground_core::{Engine, EngineError};
use playground_types::{AgentKind, Vec2};
use rand::Rng;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::AppError;

/// Spawn order.
const KINDS: [AgentKind; 3] = [AgentKind::Autonomous, AgentKind::Reactive, AgentKind::Wanderer];

/// What the spawner managed to create.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SpawnReport {
    /// Agents created per kind.
    pub spawned: BTreeMap<AgentKind, u32>,
    /// Requested agents that did not fit under `max_agents`.
    pub rejected: u32,
}

impl SpawnReport {
    /// Agents created in total.
    pub fn total(&self) -> u32 {
        self.spawned.values().fold(0_u32, |sum, n| sum.saturating_add(*n))
    }
}

/// Requested count for one kind.
const fn requested(population: &PopulationConfig, kind: AgentKind) -> u32 {
    match kind {
        AgentKind::Autonomous => population.autonomous,
        AgentKind::Reactive => population.reactive,
        AgentKind::Wanderer => population.wanderer,
    }
}

/// Add the configured population to `engine`.
///
/// Stops at the engine's capacity and counts the remainder as rejected.
///
/// # Errors
///
/// Returns [`AppError::Spawner`] if the engine is not accepting agents, or
/// [`AppError::Engine`] for any other registry failure.
pub fn spawn_population<R: Rng + ?Sized>(
    engine: &mut Engine,
    population: &PopulationConfig,
    rng: &mut R,
) -> Result<SpawnReport, AppError> {
    let margin = engine.config().physics.collision_radius;
    let agents_config = engine.config().agents;
    let mut report = SpawnReport::default();

    for kind in KINDS {
        let wanted = requested(population, kind);
        let max_speed = agents_config.profile(kind).max_speed;
        let mut created: u32 = 0;

        for _ in 0..wanted {
            let position = engine.world_mut().random_valid_position(rng, margin);
            let heading = rng.random_range(0.0..TAU);
            let speed = rng.random_range(0.0..=max_speed * 0.5);
            let mut spawn = AgentSpawn::new(kind, position).with_velocity(Vec2::from_angle(heading) * speed);
            if kind == AgentKind::Autonomous {
                spawn = spawn.with_goal(engine.world_mut().random_valid_position(rng, margin));
            }

            match engine.add_agent(spawn) {
                Ok(_) => created = created.saturating_add(1),
                Err(EngineError::CapacityExceeded { max_agents }) => {
                    let remaining = population.total().saturating_sub(report.total()).saturating_sub(created);
                    warn!(max_agents, remaining, "Population exceeds capacity, spawning stopped");
                    report.spawned.insert(kind, created);
                    report.rejected = remaining;
                    return Ok(report);
                }
                Err(EngineError::NotRunnable { status }) => {
                    return Err(AppError::Spawner {
                        message: format!("engine is {status:?} and does not accept agents"),
                    });
                }
                Err(err) => return Err(err.into()),
            }
        }
        report.spawned.insert(kind, created);
    }

    info!(
        autonomous = report.spawned.get(&AgentKind::Autonomous).copied().unwrap_or(0),
        reactive = report.spawned.get(&AgentKind::Reactive).copied().unwrap_or(0),
        wanderer = report.spawned.get(&AgentKind::Wanderer).copied().unwrap_or(0),
        "Population spawned"
    );
    Ok(report)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use playground_core::SimulationConfig;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    fn engine(max_agents: usize) -> Engine {
        let mut config = SimulationConfig::default();
        config.engine.max_agents = max_agents;
        Engine::new(config).unwrap()
    }

    #[test]
    fn default_population_is_spawned_in_kind_order() {
        let mut engine = engine(1000);
        let population = PopulationConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let report = spawn_population(&mut engine, &population, &mut rng).unwrap();
        assert_eq!(report.total(), population.total());
        assert_eq!(report.rejected, 0);
        assert_eq!(engine.agent_count(), 50);

        let agents = engine.agents();
        assert_eq!(agents.first().map(|a| a.kind), Some(AgentKind::Autonomous));
        assert_eq!(agents.last().map(|a| a.kind), Some(AgentKind::Wanderer));
        engine.verify().unwrap();
    }

    #[test]
    fn capacity_limits_population() {
        let mut engine = engine(10);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let report = spawn_population(&mut engine, &PopulationConfig::default(), &mut rng).unwrap();
        assert_eq!(report.total(), 10);
        assert_eq!(report.rejected, 40);
        assert_eq!(engine.agent_count(), 10);
    }

    #[test]
    fn seeded_rng_gives_same_population() {
        let spawn = || {
            let mut engine = engine(1000);
            let mut rng = ChaCha8Rng::seed_from_u64(9);
            spawn_population(&mut engine, &PopulationConfig::default(), &mut rng).unwrap();
            engine.agents()
        };
        assert_eq!(spawn(), spawn());
    }
}
