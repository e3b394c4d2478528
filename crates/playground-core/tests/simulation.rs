//! End-to-end properties of the tick pipeline.
//!
//! Each test drives a full [`Engine`] through public operations only:
//! determinism under a fixed seed, spatial index consistency, boundary
//! containment, energy accounting, neighbor completeness, and the reference
//! scenarios for an idle agent, a colliding pair and a wall bounce.

#![allow(clippy::unwrap_used)]

use playground_agents::AgentSpawn;
use playground_core::{Engine, SimulationConfig};
use playground_types::{AgentId, AgentKind, EndReason, Event, EventDetails, EventKind, Vec2, Wall};
use playground_world::{SpatialGrid, scatter_features};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Below the autonomous foraging threshold: with no food in view the agent
/// picks no waypoint and holds still.
const HOLDING_ENERGY: f64 = 20.0;

const KINDS: [AgentKind; 3] = [AgentKind::Autonomous, AgentKind::Reactive, AgentKind::Wanderer];

fn small_world() -> SimulationConfig {
    let mut config = SimulationConfig::default();
    config.world.width = 200.0;
    config.world.height = 200.0;
    config.world.cell_size = 20.0;
    config.engine.max_steps = 0;
    config.engine.stop_on_extinction = false;
    config
}

/// An engine with scattered features and `count` agents of mixed kinds at
/// random valid positions, all drawn from `seed`.
fn populated(config: SimulationConfig, count: usize, seed: u64) -> Engine {
    let layout = config.world.layout;
    let mut engine = Engine::new(config).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    scatter_features(engine.world_mut(), &layout, &mut rng).unwrap();
    for (i, kind) in KINDS.iter().cycle().take(count).enumerate() {
        let position = engine.world_mut().random_valid_position(&mut rng, 2.0);
        let velocity = Vec2::new(rng.random_range(-3.0..=3.0), rng.random_range(-3.0..=3.0));
        let spawn = AgentSpawn::new(*kind, position).with_velocity(velocity);
        let id = engine.add_agent(spawn).unwrap();
        assert_eq!(id, AgentId(u64::try_from(i).unwrap().checked_add(1).unwrap()));
    }
    engine
}

fn run_ticks(engine: &mut Engine, ticks: u32) -> Vec<Vec<Event>> {
    (0..ticks).map(|_| engine.step().unwrap()).collect()
}

#[test]
fn same_seed_same_history() {
    let mut a = populated(small_world(), 40, 7);
    let mut b = populated(small_world(), 40, 7);
    assert_eq!(run_ticks(&mut a, 60), run_ticks(&mut b, 60));
    assert_eq!(a.agents(), b.agents());
    assert_eq!(a.world(), b.world());
}

#[test]
fn different_seed_diverges() {
    let mut config = small_world();
    let mut a = populated(config.clone(), 20, 7);
    config.engine.seed = 8;
    let mut b = populated(config, 20, 7);
    run_ticks(&mut a, 30);
    run_ticks(&mut b, 30);
    assert_ne!(a.agents(), b.agents());
}

#[test]
fn parallel_decide_matches_sequential() {
    let mut config = small_world();
    let mut sequential = populated(config.clone(), 30, 11);
    config.engine.run_parallel = true;
    let mut parallel = populated(config, 30, 11);
    assert_eq!(run_ticks(&mut sequential, 40), run_ticks(&mut parallel, 40));
}

#[test]
fn grid_and_bounds_hold_every_tick() {
    let mut engine = populated(small_world(), 60, 3);
    for _ in 0..100 {
        engine.step().unwrap();
        engine.verify().unwrap();
        for agent in engine.agents() {
            assert!((0.0..=200.0).contains(&agent.position.x), "{agent:?}");
            assert!((0.0..=200.0).contains(&agent.position.y), "{agent:?}");
            assert!(agent.energy >= 0.0 && agent.energy <= agent.max_energy);
        }
        assert_eq!(engine.grid_stats().agents, engine.agent_count());
    }
}

#[test]
fn energy_never_rises_without_resources() {
    let mut config = small_world();
    config.world.layout.resource_ratio = 0.0;
    let mut engine = populated(config, 30, 5);
    let mut last: Vec<(AgentId, f64)> = engine.agents().iter().map(|a| (a.id, a.energy)).collect();
    for _ in 0..50 {
        let events = engine.step().unwrap();
        assert!(events.iter().all(|e| e.kind() != EventKind::ResourceConsumed));
        for agent in engine.agents() {
            if let Some((_, before)) = last.iter().find(|(id, _)| *id == agent.id) {
                assert!(agent.energy <= *before, "agent {} gained energy", agent.id);
            }
        }
        last = engine.agents().iter().map(|a| (a.id, a.energy)).collect();
    }
}

#[test]
fn total_energy_never_rises_without_regeneration() {
    let mut config = small_world();
    config.world.resource_regeneration = false;
    let mut engine = populated(config, 30, 5);
    let mut rng = ChaCha8Rng::seed_from_u64(17);
    for _ in 0..4 {
        let position = engine.world_mut().random_valid_position(&mut rng, 2.0);
        engine.world_mut().add_resource(position, 20.0, 40.0, 40.0, 0.5).unwrap();
        let forager = AgentSpawn::new(AgentKind::Autonomous, position).with_energy(HOLDING_ENERGY);
        engine.add_agent(forager).unwrap();
    }

    let total = |engine: &Engine| {
        let agents: f64 = engine.agents().iter().map(|a| a.energy).sum();
        agents + engine.world_stats().resource_energy
    };
    let mut last = total(&engine);
    let mut consumed = 0_usize;
    for _ in 0..80 {
        let events = engine.step().unwrap();
        let eaten = events.iter().filter(|e| e.kind() == EventKind::ResourceConsumed).count();
        consumed = consumed.saturating_add(eaten);
        let now = total(&engine);
        assert!(now <= last + 1e-9, "total energy rose from {last} to {now}");
        last = now;
    }
    assert!(consumed > 0, "no agent ate");
}

#[test]
fn dead_agents_leave_and_are_reported_last() {
    let mut config = small_world();
    config.world.layout.resource_ratio = 0.0;
    let mut engine = Engine::new(config).unwrap();
    for i in 0..5_u32 {
        let spawn = AgentSpawn::new(AgentKind::Reactive, Vec2::new(20.0 + 30.0 * f64::from(i), 100.0))
            .with_energy(0.001 * f64::from(i.checked_add(1).unwrap()));
        engine.add_agent(spawn).unwrap();
    }
    let events = engine.step().unwrap();
    let deaths: Vec<AgentId> = events
        .iter()
        .filter(|e| e.kind() == EventKind::Death)
        .flat_map(|e| e.agents.clone())
        .collect();
    assert_eq!(deaths, (1..=5).map(AgentId).collect::<Vec<_>>());
    assert_eq!(events.last().map(Event::kind), Some(EventKind::Death));
    assert_eq!(engine.agent_count(), 0);
    assert_eq!(engine.grid_stats().agents, 0);
}

#[test]
fn extinction_completes_when_configured() {
    let mut config = small_world();
    config.engine.stop_on_extinction = true;
    let mut engine = Engine::new(config).unwrap();
    engine
        .add_agent(AgentSpawn::new(AgentKind::Wanderer, Vec2::new(100.0, 100.0)).with_energy(0.0001))
        .unwrap();
    let outcome = engine.run().unwrap();
    assert_eq!(outcome.end_reason, EndReason::Extinction);
}

#[test]
fn grid_query_matches_brute_force() {
    let mut rng = ChaCha8Rng::seed_from_u64(17);
    let mut grid = SpatialGrid::new(15.0).unwrap();
    let mut points = Vec::new();
    for raw in 1..=300 {
        let p = Vec2::new(rng.random_range(0.0..=300.0), rng.random_range(0.0..=300.0));
        grid.insert(AgentId(raw), p).unwrap();
        points.push((AgentId(raw), p));
    }
    for _ in 0..50 {
        let center = Vec2::new(rng.random_range(0.0..=300.0), rng.random_range(0.0..=300.0));
        let radius = rng.random_range(0.0..=60.0);
        let expected: Vec<AgentId> = points
            .iter()
            .filter(|(_, p)| p.distance_squared(center) <= radius * radius)
            .map(|(id, _)| *id)
            .collect();
        assert_eq!(grid.query_radius(center, radius, None), expected);
    }
}

#[test]
fn idle_agent_stays_put_and_pays_idle_cost() {
    let mut config = SimulationConfig::default();
    config.world.width = 100.0;
    config.world.height = 100.0;
    config.world.cell_size = 10.0;
    config.engine.time_step = 0.1;
    let idle_rate = config.agents.autonomous.idle_rate;
    let mut engine = Engine::new(config).unwrap();
    let id = engine
        .add_agent(AgentSpawn::new(AgentKind::Autonomous, Vec2::new(50.0, 50.0)).with_energy(HOLDING_ENERGY))
        .unwrap();
    let start = engine.agent(id).unwrap().energy;

    run_ticks(&mut engine, 10);

    let agent = engine.agent(id).unwrap();
    assert!(agent.position.distance(Vec2::new(50.0, 50.0)) < 1e-9);
    let expected = 10.0 * idle_rate * 0.1;
    assert!((start - agent.energy - expected).abs() < 1e-9);
}

#[test]
fn close_pair_collides_once_and_separates() {
    let mut config = SimulationConfig::default();
    config.world.width = 100.0;
    config.world.height = 100.0;
    config.world.cell_size = 10.0;
    config.physics.collision_radius = 2.0;
    let mut engine = Engine::new(config).unwrap();
    let a = engine
        .add_agent(AgentSpawn::new(AgentKind::Autonomous, Vec2::new(50.0, 50.0)).with_energy(HOLDING_ENERGY))
        .unwrap();
    let b = engine
        .add_agent(AgentSpawn::new(AgentKind::Autonomous, Vec2::new(51.0, 50.0)).with_energy(HOLDING_ENERGY))
        .unwrap();

    let events = engine.step().unwrap();

    let collisions: Vec<&Event> = events.iter().filter(|e| e.kind() == EventKind::Collision).collect();
    assert_eq!(collisions.len(), 1);
    assert_eq!(collisions.first().map(|e| e.agents.clone()), Some(vec![a, b]));
    let pa = engine.agent(a).unwrap().position;
    let pb = engine.agent(b).unwrap().position;
    assert!(pa.distance(pb) >= 2.0 - 1e-9);
}

#[test]
fn wall_hit_reflects_and_clamps() {
    let mut config = SimulationConfig::default();
    config.world.width = 100.0;
    config.world.height = 100.0;
    config.world.cell_size = 10.0;
    config.engine.time_step = 1.0;
    let mut engine = Engine::new(config).unwrap();
    let id = engine
        .add_agent(
            AgentSpawn::new(AgentKind::Autonomous, Vec2::new(0.5, 50.0))
                .with_velocity(Vec2::new(-5.0, 0.0))
                .with_energy(HOLDING_ENERGY),
        )
        .unwrap();

    let events = engine.step().unwrap();

    let bounces: Vec<&Event> = events
        .iter()
        .filter(|e| e.kind() == EventKind::BoundaryBounce)
        .collect();
    assert_eq!(bounces.len(), 1);
    assert!(matches!(
        bounces.first().map(|e| &e.details),
        Some(EventDetails::BoundaryBounce { walls, .. }) if walls.as_slice() == [Wall::Left]
    ));
    let agent = engine.agent(id).unwrap();
    assert!(agent.position.x.abs() < f64::EPSILON);
    assert!(agent.velocity.x > 0.0);
}

#[test]
fn step_limit_counts_every_tick() {
    let mut config = small_world();
    config.engine.max_steps = 25;
    let mut engine = populated(config, 10, 2);
    let outcome = engine.run().unwrap();
    assert_eq!(outcome.end_reason, EndReason::StepLimit);
    assert_eq!(outcome.final_tick, 25);
    assert!((engine.elapsed_time() - 2.5).abs() < 1e-9);
}
