//! Observation assembly for the observe phase of the tick.
//!
//! Every agent's observation is built from the state at the start of the
//! tick, before any agent has decided or moved. Neighbor lists come from the
//! spatial grid and are filtered by exact distance, so an agent sees exactly
//! the other agents within its kind's perception radius. Obstacles and
//! resource nodes are included when their edge is within that radius.
//!
//! All lists are sorted by id.

use std::collections::BTreeMap;

use playground_agents::{Agent, AgentsConfig};
use playground_types::{AgentId, NeighborView, ObstacleView, Observation, ResourceView};
use playground_world::{SpatialGrid, World};

/// Shared, read-only inputs for building observations in one tick.
#[derive(Debug, Clone, Copy)]
pub struct PerceptionContext<'a> {
    /// Tick being decided.
    pub tick: u64,
    /// Seconds per tick.
    pub time_step: f64,
    /// Environment at the start of the tick.
    pub world: &'a World,
    /// Spatial index at the start of the tick.
    pub grid: &'a SpatialGrid,
    /// All live agents at the start of the tick.
    pub agents: &'a BTreeMap<AgentId, Agent>,
    /// Per-kind perception radii.
    pub config: &'a AgentsConfig,
}

/// Build one agent's observation.
pub fn observe(ctx: &PerceptionContext<'_>, agent: &Agent) -> Observation {
    let radius = agent.profile(ctx.config).perception_radius;
    let origin = agent.position;

    let neighbors = ctx
        .grid
        .query_radius(origin, radius, Some(agent.id))
        .into_iter()
        .filter_map(|id| ctx.agents.get(&id))
        .map(|other| {
            let offset = other.position - origin;
            NeighborView {
                id: other.id,
                kind: other.kind,
                offset,
                velocity: other.velocity,
                distance: offset.length(),
            }
        })
        .collect();

    let obstacles = ctx
        .world
        .obstacles_near(origin, radius)
        .map(|o| ObstacleView {
            id: o.id,
            offset: o.position - origin,
            radius: o.radius,
        })
        .collect();

    let resources = ctx
        .world
        .resources_near(origin, radius)
        .map(|r| ResourceView {
            id: r.id,
            offset: r.position - origin,
            radius: r.radius,
            available: r.energy,
        })
        .collect();

    Observation {
        tick: ctx.tick,
        time_step: ctx.time_step,
        own: agent.self_state(),
        neighbors,
        obstacles,
        resources,
        weather: ctx.world.weather(),
        world_width: ctx.world.width(),
        world_height: ctx.world.height(),
    }
}

/// Build observations for every live agent, keyed by id.
pub fn observe_all(ctx: &PerceptionContext<'_>) -> BTreeMap<AgentId, Observation> {
    ctx.agents
        .values()
        .map(|agent| (agent.id, observe(ctx, agent)))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use playground_agents::AgentSpawn;
    use playground_types::{AgentKind, Vec2};
    use playground_world::{WeatherParams, WeatherSystem};

    use super::*;

    fn fixture(positions: &[(u64, AgentKind, Vec2)]) -> (World, SpatialGrid, BTreeMap<AgentId, Agent>) {
        let world = World::new(100.0, 100.0, 10.0, WeatherSystem::new(1, WeatherParams::default())).unwrap();
        let mut grid = SpatialGrid::new(10.0).unwrap();
        let config = AgentsConfig::default();
        let mut agents = BTreeMap::new();
        for (id, kind, position) in positions {
            let agent = Agent::new(AgentId(*id), &AgentSpawn::new(*kind, *position), &config).unwrap();
            grid.insert(agent.id, agent.position).unwrap();
            agents.insert(agent.id, agent);
        }
        (world, grid, agents)
    }

    #[test]
    fn sees_neighbors_within_own_radius_only() {
        // Wanderer radius is 20, reactive radius is 50.
        let (world, grid, agents) = fixture(&[
            (1, AgentKind::Wanderer, Vec2::new(50.0, 50.0)),
            (2, AgentKind::Reactive, Vec2::new(80.0, 50.0)),
            (3, AgentKind::Autonomous, Vec2::new(60.0, 50.0)),
        ]);
        let config = AgentsConfig::default();
        let ctx = PerceptionContext {
            tick: 3,
            time_step: 0.1,
            world: &world,
            grid: &grid,
            agents: &agents,
            config: &config,
        };
        let all = observe_all(&ctx);

        let wanderer: Vec<AgentId> = all[&AgentId(1)].neighbors.iter().map(|n| n.id).collect();
        assert_eq!(wanderer, vec![AgentId(3)]);

        let reactive: Vec<AgentId> = all[&AgentId(2)].neighbors.iter().map(|n| n.id).collect();
        assert_eq!(reactive, vec![AgentId(1), AgentId(3)]);
    }

    #[test]
    fn offsets_are_relative() {
        let (world, grid, agents) = fixture(&[
            (1, AgentKind::Reactive, Vec2::new(10.0, 10.0)),
            (2, AgentKind::Reactive, Vec2::new(13.0, 14.0)),
        ]);
        let config = AgentsConfig::default();
        let ctx = PerceptionContext {
            tick: 0,
            time_step: 0.1,
            world: &world,
            grid: &grid,
            agents: &agents,
            config: &config,
        };
        let obs = observe(&ctx, &agents[&AgentId(1)]);
        let n = obs.neighbors.first().unwrap();
        assert_eq!(n.offset, Vec2::new(3.0, 4.0));
        assert!((n.distance - 5.0).abs() < 1e-12);
        assert_eq!(obs.own.id, AgentId(1));
        assert!(obs.is_well_formed());
    }

    #[test]
    fn features_in_range_are_listed() {
        let (mut world, grid, agents) = fixture(&[(1, AgentKind::Wanderer, Vec2::new(50.0, 50.0))]);
        world.add_obstacle(Vec2::new(65.0, 50.0), 3.0, 1.0).unwrap();
        world.add_obstacle(Vec2::new(95.0, 95.0), 3.0, 1.0).unwrap();
        let near = world.add_resource(Vec2::new(50.0, 70.0), 5.0, 10.0, 10.0, 0.1).unwrap();
        let config = AgentsConfig::default();
        let ctx = PerceptionContext {
            tick: 0,
            time_step: 0.1,
            world: &world,
            grid: &grid,
            agents: &agents,
            config: &config,
        };
        let obs = observe(&ctx, &agents[&AgentId(1)]);
        assert_eq!(obs.obstacles.len(), 1);
        assert_eq!(obs.resources.first().map(|r| r.id), Some(near));
        assert!((obs.resources[0].available - 10.0).abs() < f64::EPSILON);
    }
}
