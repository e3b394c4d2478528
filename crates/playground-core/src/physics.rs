//! Physics resolver: turns a tick's actions into motion.
//!
//! # Order of operations
//!
//! 1. For each agent, ascending by id: integrate thrust (and wind), cap the
//!    speed, reflect off the world edges, settle clear of obstacles, and
//!    file the new position in the spatial grid.
//! 2. Find every pair of agents closer than `collision_radius` and resolve
//!    the pairs in ascending `(low_id, high_id)` order. Each pair is
//!    re-checked against current positions before it is separated, since
//!    an earlier pair may already have moved it apart. Separated agents are
//!    settled against obstacles again, ascending by id.
//! 3. Serve consumption requests, ascending by agent id.
//!
//! Settling alternates obstacle push-out with clamping to the world. An
//! agent that cannot be placed clear of every obstacle inside the world
//! (an obstacle flush against a wall) goes back to where it was before the
//! move and stops, so no agent ever ends a tick inside an obstacle.
//!
//! Events are returned in that order: bounces and obstacle contacts first,
//! then agent collisions and any obstacle contacts they caused, then
//! consumption.

use std::collections::{BTreeMap, BTreeSet};

use playground_agents::{Agent, AgentsConfig, vitals};
use playground_types::{
    Action, AgentId, CollisionTarget, Event, EventDetails, ObstacleId, Vec2, Wall,
};
use playground_world::{SpatialError, SpatialGrid, World, WorldError};
use tracing::debug;

use crate::config::PhysicsConfig;

/// Push-out and clamp rounds tried before an agent is sent back.
const SETTLE_ROUNDS: usize = 4;

/// Depth below which an agent resting on a padded surface is not inside.
const SURFACE_TOLERANCE: f64 = 1e-9;

/// Errors that abort the physics phase.
#[derive(Debug, thiserror::Error)]
pub enum PhysicsError {
    /// The spatial grid rejected an update.
    #[error("spatial index update failed: {source}")]
    Spatial {
        /// The underlying grid error.
        #[from]
        source: SpatialError,
    },

    /// A resource operation failed.
    #[error("resource operation failed: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: WorldError,
    },
}

/// Fixed inputs for one physics pass.
#[derive(Debug, Clone, Copy)]
pub struct PhysicsStep<'a> {
    /// Tick being resolved.
    pub tick: u64,
    /// Seconds per tick.
    pub time_step: f64,
    /// Motion constants.
    pub physics: &'a PhysicsConfig,
    /// Per-kind speed limits and the consumption bite.
    pub agents: &'a AgentsConfig,
    /// Whether agent-agent collisions are resolved.
    pub collisions: bool,
}

/// Apply every action and return the resulting events.
///
/// Agents without an entry in `actions` are treated as idle.
///
/// # Errors
///
/// Returns [`PhysicsError`] if the grid and agent map disagree, or a
/// resource lookup fails unexpectedly.
pub fn resolve(
    step: &PhysicsStep<'_>,
    agents: &mut BTreeMap<AgentId, Agent>,
    actions: &BTreeMap<AgentId, Action>,
    world: &mut World,
    grid: &mut SpatialGrid,
) -> Result<Vec<Event>, PhysicsError> {
    let mut events = Vec::new();
    let wind = world.weather().wind() * step.physics.wind_coupling;
    let idle = Action::idle();

    for agent in agents.values_mut() {
        let start = agent.position;
        let action = actions.get(&agent.id).unwrap_or(&idle);
        let max_speed = step.agents.profile(agent.kind).max_speed;
        integrate(agent, action.thrust + wind, max_speed, step.physics.friction, step.time_step);

        let walls = reflect_at_bounds(agent, world.width(), world.height(), step.physics.restitution);
        if !walls.is_empty() {
            events.push(Event::new(
                step.tick,
                vec![agent.id],
                EventDetails::BoundaryBounce {
                    walls,
                    position: agent.position,
                    velocity: agent.velocity,
                },
            ));
        }

        let contacts = settle(agent, world, step.physics, start);
        events.extend(obstacle_events(step.tick, agent.id, contacts));
        grid.relocate(agent.id, agent.position)?;
    }

    if step.collisions {
        events.extend(resolve_agent_collisions(step, agents, world, grid)?);
    }
    events.extend(consume_resources(step, agents, actions, world)?);
    Ok(events)
}

/// Semi-implicit Euler step: `v' = v * friction + accel * dt`, capped at
/// `max_speed`, then `p' = p + v' * dt`.
pub fn integrate(agent: &mut Agent, accel: Vec2, max_speed: f64, friction: f64, dt: f64) {
    let velocity = (agent.velocity * friction + accel * dt).clamp_length_max(max_speed);
    agent.velocity = velocity;
    agent.position += velocity * dt;
}

/// Clamp an agent back inside `[0, width] x [0, height]`, reflecting the
/// velocity component normal to each wall crossed.
///
/// Returns the walls hit, in [`Wall`] order.
pub fn reflect_at_bounds(agent: &mut Agent, width: f64, height: f64, restitution: f64) -> Vec<Wall> {
    let mut walls = Vec::new();
    let Vec2 { mut x, mut y } = agent.position;
    let mut velocity = agent.velocity;

    if x < 0.0 {
        x = 0.0;
        velocity.x = velocity.x.abs() * restitution;
        walls.push(Wall::Left);
    } else if x > width {
        x = width;
        velocity.x = -velocity.x.abs() * restitution;
        walls.push(Wall::Right);
    }
    if y < 0.0 {
        y = 0.0;
        velocity.y = velocity.y.abs() * restitution;
        walls.push(Wall::Bottom);
    } else if y > height {
        y = height;
        velocity.y = -velocity.y.abs() * restitution;
        walls.push(Wall::Top);
    }

    agent.position = Vec2::new(x, y);
    agent.velocity = velocity;
    walls
}

/// Move an agent out of every obstacle it has entered.
///
/// The agent is placed on the padded surface along the line from the
/// obstacle center; the inbound velocity component is cancelled and then
/// reflected by `hardness * restitution`. Returns `(obstacle, overlap)` for
/// each contact, ascending by obstacle id.
pub fn push_out_of_obstacles(agent: &mut Agent, world: &World, physics: &PhysicsConfig) -> Vec<(ObstacleId, f64)> {
    let padding = physics.obstacle_padding;
    let mut contacts = Vec::new();

    for obstacle in world.obstacles_near(agent.position, padding) {
        let reach = obstacle.radius + padding;
        let delta = agent.position - obstacle.position;
        let distance = delta.length();
        if distance >= reach - SURFACE_TOLERANCE {
            continue;
        }

        let normal = if distance > f64::EPSILON {
            delta / distance
        } else {
            // Dead center: back out the way the agent came.
            let back = (-agent.velocity).normalize_or_zero();
            if back == Vec2::ZERO { Vec2::X } else { back }
        };

        agent.position = obstacle.position + normal * reach;
        let inbound = agent.velocity.dot(normal);
        if inbound < 0.0 {
            agent.velocity -= normal * inbound * (1.0 + obstacle.hardness * physics.restitution);
        }
        contacts.push((obstacle.id, reach - distance));
    }
    contacts
}

/// Whether `position` is inside the padded reach of any obstacle.
pub fn inside_obstacle(position: Vec2, world: &World, padding: f64) -> bool {
    world
        .obstacles_near(position, padding)
        .any(|o| position.distance(o.position) < o.radius + padding - SURFACE_TOLERANCE)
}

/// Place an agent inside the world and clear of every obstacle.
///
/// Push-out and clamping alternate for up to [`SETTLE_ROUNDS`] rounds. If
/// the agent is still inside an obstacle after that, it returns to
/// `fallback` (clamped) with zero velocity. Returns the first contact with
/// each obstacle, ascending by obstacle id.
pub fn settle(agent: &mut Agent, world: &World, physics: &PhysicsConfig, fallback: Vec2) -> Vec<(ObstacleId, f64)> {
    let mut contacts = BTreeMap::new();
    for _ in 0..SETTLE_ROUNDS {
        for (obstacle, overlap) in push_out_of_obstacles(agent, world, physics) {
            contacts.entry(obstacle).or_insert(overlap);
        }
        agent.position = world.clamp(agent.position);
        if !inside_obstacle(agent.position, world, physics.obstacle_padding) {
            return contacts.into_iter().collect();
        }
    }
    debug!(agent_id = %agent.id, "No clear position near obstacles, move undone");
    agent.position = world.clamp(fallback);
    agent.velocity = Vec2::ZERO;
    contacts.into_iter().collect()
}

fn obstacle_events(tick: u64, agent: AgentId, contacts: Vec<(ObstacleId, f64)>) -> impl Iterator<Item = Event> {
    contacts.into_iter().map(move |(obstacle, overlap)| {
        Event::new(
            tick,
            vec![agent],
            EventDetails::Collision {
                target: CollisionTarget::Obstacle(obstacle),
                overlap,
            },
        )
    })
}

/// Position and velocity of both parties after separating one pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Lower-id agent's new position.
    pub low_position: Vec2,
    /// Lower-id agent's new velocity.
    pub low_velocity: Vec2,
    /// Higher-id agent's new position.
    pub high_position: Vec2,
    /// Higher-id agent's new velocity.
    pub high_velocity: Vec2,
    /// Penetration depth before separation.
    pub overlap: f64,
}

/// Separate two equal-mass bodies closer than `radius`.
///
/// Each is pushed half the overlap along the line between them, leaving
/// them exactly `radius` apart. If they are approaching, their normal
/// velocity components are exchanged, scaled by `restitution`. Coincident
/// bodies are separated along +x (the higher id moves right). Returns
/// `None` if they do not overlap.
pub fn separate(
    (low_position, low_velocity): (Vec2, Vec2),
    (high_position, high_velocity): (Vec2, Vec2),
    radius: f64,
    restitution: f64,
) -> Option<Contact> {
    let delta = high_position - low_position;
    let distance = delta.length();
    if distance >= radius {
        return None;
    }

    let normal = if distance > f64::EPSILON { delta / distance } else { Vec2::X };
    let overlap = radius - distance;
    let push = normal * (overlap * 0.5);

    let closing = (high_velocity - low_velocity).dot(normal);
    let impulse = if closing < 0.0 {
        normal * (-(1.0 + restitution) * closing * 0.5)
    } else {
        Vec2::ZERO
    };

    Some(Contact {
        low_position: low_position - push,
        low_velocity: low_velocity - impulse,
        high_position: high_position + push,
        high_velocity: high_velocity + impulse,
        overlap,
    })
}

/// Every pair of agents closer than `radius`, as `(low_id, high_id)`.
pub fn overlapping_pairs(
    agents: &BTreeMap<AgentId, Agent>,
    grid: &SpatialGrid,
    radius: f64,
) -> BTreeSet<(AgentId, AgentId)> {
    let mut pairs = BTreeSet::new();
    if radius <= 0.0 {
        return pairs;
    }
    for agent in agents.values() {
        for other in grid.query_radius(agent.position, radius, Some(agent.id)) {
            if let Some(neighbor) = agents.get(&other)
                && agent.position.distance(neighbor.position) < radius
            {
                pairs.insert((agent.id.min(other), agent.id.max(other)));
            }
        }
    }
    pairs
}

fn resolve_agent_collisions(
    step: &PhysicsStep<'_>,
    agents: &mut BTreeMap<AgentId, Agent>,
    world: &World,
    grid: &mut SpatialGrid,
) -> Result<Vec<Event>, PhysicsError> {
    let radius = step.physics.collision_radius;
    let pairs = overlapping_pairs(agents, grid, radius);
    let mut events = Vec::new();
    // Position of each separated agent before its first separation.
    let mut moved: BTreeMap<AgentId, Vec2> = BTreeMap::new();

    for (low, high) in pairs {
        let (Some(a), Some(b)) = (agents.get(&low), agents.get(&high)) else {
            continue;
        };
        let Some(contact) = separate(
            (a.position, a.velocity),
            (b.position, b.velocity),
            radius,
            step.physics.restitution,
        ) else {
            continue;
        };

        moved.entry(low).or_insert(a.position);
        moved.entry(high).or_insert(b.position);
        if let Some(a) = agents.get_mut(&low) {
            a.position = world.clamp(contact.low_position);
            a.velocity = contact.low_velocity;
        }
        if let Some(b) = agents.get_mut(&high) {
            b.position = world.clamp(contact.high_position);
            b.velocity = contact.high_velocity;
        }

        events.push(Event::new(
            step.tick,
            vec![low, high],
            EventDetails::Collision {
                target: CollisionTarget::Agent(high),
                overlap: contact.overlap,
            },
        ));
    }

    for (id, before) in moved {
        if let Some(agent) = agents.get_mut(&id) {
            let contacts = settle(agent, world, step.physics, before);
            events.extend(obstacle_events(step.tick, id, contacts));
            grid.relocate(id, agent.position)?;
        }
    }
    Ok(events)
}

fn consume_resources(
    step: &PhysicsStep<'_>,
    agents: &mut BTreeMap<AgentId, Agent>,
    actions: &BTreeMap<AgentId, Action>,
    world: &mut World,
) -> Result<Vec<Event>, PhysicsError> {
    let mut events = Vec::new();
    let reach = step.physics.pickup_radius;

    for (id, action) in actions {
        let Some(resource) = action.consume else {
            continue;
        };
        let Some(agent) = agents.get_mut(id) else {
            continue;
        };
        let Some((center, radius, available)) = world.resource(resource).map(|n| (n.position, n.radius, n.energy))
        else {
            debug!(tick = step.tick, agent_id = %id, %resource, "Consume target does not exist");
            continue;
        };
        if agent.position.distance(center) > radius + reach {
            continue;
        }

        let amount = step.agents.bite.min(available).min(vitals::headroom(agent));
        if amount <= 0.0 {
            continue;
        }
        let taken = match world.harvest(resource, amount) {
            Ok(taken) => taken,
            Err(WorldError::ResourceExhausted(_)) => continue,
            Err(err) => return Err(err.into()),
        };
        let accepted = vitals::absorb(agent, taken);
        let remaining = world.resource(resource).map_or(0.0, |n| n.energy);

        events.push(Event::new(
            step.tick,
            vec![*id],
            EventDetails::ResourceConsumed {
                resource,
                amount: accepted,
                remaining,
            },
        ));
    }
    Ok(events)
}
