//! The bounded rectangular world: extent, static obstacles, resource nodes
//! and weather.
//!
//! The world never changes size after construction. Obstacles are static;
//! resource nodes change only through [`World::harvest`] during a tick and
//! [`World::regenerate_resources`] between ticks. Agents are not stored
//! here; their positions are indexed separately by the spatial grid.

use std::collections::BTreeMap;

use playground_types::{
    Obstacle, ObstacleId, ResourceId, ResourceNode, Vec2, Weather, WorldSnapshot,
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::environment::WeatherSystem;
use crate::error::WorldError;
use crate::resource;

/// Attempts made by [`World::random_valid_position`] before falling back to
/// the world center.
pub const PLACEMENT_ATTEMPTS: u32 = 100;

/// Aggregate environment figures for monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldStats {
    /// Number of obstacles.
    pub obstacles: usize,
    /// Number of resource nodes.
    pub resources: usize,
    /// Energy currently held by all nodes.
    pub resource_energy: f64,
    /// Combined node capacity.
    pub resource_capacity: f64,
}

/// The simulation environment.
#[derive(Debug, Clone)]
pub struct World {
    /// Extent along x.
    width: f64,
    /// Extent along y.
    height: f64,
    /// Spatial grid cell edge length, validated against the extent.
    cell_size: f64,
    /// Static obstacles by id.
    obstacles: BTreeMap<ObstacleId, Obstacle>,
    /// Resource nodes by id.
    resources: BTreeMap<ResourceId, ResourceNode>,
    /// Weather state and drift rules.
    weather: WeatherSystem,
    /// Next obstacle id to hand out.
    next_obstacle: ObstacleId,
    /// Next resource id to hand out.
    next_resource: ResourceId,
}

impl World {
    /// Create an empty world.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidBounds`] or [`WorldError::InvalidCellSize`]
    /// when [`validate_extent`] rejects the dimensions.
    pub fn new(width: f64, height: f64, cell_size: f64, weather: WeatherSystem) -> Result<Self, WorldError> {
        validate_extent(width, height, cell_size)?;
        Ok(Self {
            width,
            height,
            cell_size,
            obstacles: BTreeMap::new(),
            resources: BTreeMap::new(),
            weather,
            next_obstacle: ObstacleId::FIRST,
            next_resource: ResourceId::FIRST,
        })
    }

    /// Extent along x.
    pub const fn width(&self) -> f64 {
        self.width
    }

    /// Extent along y.
    pub const fn height(&self) -> f64 {
        self.height
    }

    /// Spatial grid cell size this world was validated with.
    pub const fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// The world center.
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width * 0.5, self.height * 0.5)
    }

    /// Total area.
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Whether `position` lies inside `[0, width] x [0, height]`.
    pub fn contains(&self, position: Vec2) -> bool {
        position.is_finite()
            && (0.0..=self.width).contains(&position.x)
            && (0.0..=self.height).contains(&position.y)
    }

    /// Clamp `position` into the world.
    pub fn clamp(&self, position: Vec2) -> Vec2 {
        position.clamp(Vec2::ZERO, Vec2::new(self.width, self.height))
    }

    /// Current weather.
    pub const fn weather(&self) -> Weather {
        self.weather.current()
    }

    /// The weather system.
    pub const fn weather_system(&self) -> &WeatherSystem {
        &self.weather
    }

    /// Advance the weather for `tick`.
    pub fn drift_weather(&mut self, tick: u64) -> Weather {
        self.weather.drift(tick)
    }

    // -----------------------------------------------------------------------
    // Features
    // -----------------------------------------------------------------------

    /// Place a static obstacle.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidFeature`] if the center lies outside the
    /// world or the radius is not positive, or [`WorldError::IdOverflow`].
    pub fn add_obstacle(&mut self, position: Vec2, radius: f64, hardness: f64) -> Result<ObstacleId, WorldError> {
        self.check_feature(position, radius)?;
        let id = self.next_obstacle;
        self.next_obstacle = id.next().ok_or(WorldError::IdOverflow)?;
        self.obstacles.insert(
            id,
            Obstacle {
                id,
                position,
                radius,
                hardness: if hardness.is_finite() { hardness.clamp(0.0, 1.0) } else { 1.0 },
            },
        );
        debug!(obstacle_id = %id, x = position.x, y = position.y, radius, "Obstacle placed");
        Ok(id)
    }

    /// Place a resource node holding `energy` (capped at `capacity`).
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidFeature`] for a center outside the world,
    /// a non-positive radius or negative amounts, or [`WorldError::IdOverflow`].
    pub fn add_resource(
        &mut self,
        position: Vec2,
        radius: f64,
        energy: f64,
        capacity: f64,
        regen_rate: f64,
    ) -> Result<ResourceId, WorldError> {
        self.check_feature(position, radius)?;
        let amounts_valid = [energy, capacity, regen_rate]
            .iter()
            .all(|value| value.is_finite() && *value >= 0.0);
        if !amounts_valid {
            return Err(WorldError::InvalidFeature {
                reason: format!(
                    "resource amounts must be finite and non-negative (energy {energy}, capacity {capacity}, regen {regen_rate})"
                ),
            });
        }
        let id = self.next_resource;
        self.next_resource = id.next().ok_or(WorldError::IdOverflow)?;
        self.resources.insert(
            id,
            ResourceNode {
                id,
                position,
                radius,
                energy: energy.min(capacity),
                capacity,
                regen_rate,
            },
        );
        debug!(resource_id = %id, x = position.x, y = position.y, radius, energy, "Resource placed");
        Ok(id)
    }

    /// Look up an obstacle.
    pub fn obstacle(&self, id: ObstacleId) -> Option<&Obstacle> {
        self.obstacles.get(&id)
    }

    /// Look up a resource node.
    pub fn resource(&self, id: ResourceId) -> Option<&ResourceNode> {
        self.resources.get(&id)
    }

    /// All obstacles, ascending by id.
    pub fn obstacles(&self) -> impl Iterator<Item = &Obstacle> {
        self.obstacles.values()
    }

    /// All resource nodes, ascending by id.
    pub fn resources(&self) -> impl Iterator<Item = &ResourceNode> {
        self.resources.values()
    }

    /// Obstacles whose surface is within `range` of `position`.
    pub fn obstacles_near(&self, position: Vec2, range: f64) -> impl Iterator<Item = &Obstacle> {
        self.obstacles
            .values()
            .filter(move |o| o.position.distance(position) - o.radius <= range)
    }

    /// Resource nodes whose edge is within `range` of `position`.
    pub fn resources_near(&self, position: Vec2, range: f64) -> impl Iterator<Item = &ResourceNode> {
        self.resources
            .values()
            .filter(move |r| r.position.distance(position) - r.radius <= range)
    }

    /// Take up to `requested` energy from a node.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::ResourceNotFound`] or
    /// [`WorldError::ResourceExhausted`].
    pub fn harvest(&mut self, id: ResourceId, requested: f64) -> Result<f64, WorldError> {
        let node = self
            .resources
            .get_mut(&id)
            .ok_or(WorldError::ResourceNotFound(id))?;
        resource::harvest(node, requested)
    }

    /// Regenerate every node by `dt` seconds; returns the total energy added.
    pub fn regenerate_resources(&mut self, dt: f64) -> f64 {
        self.resources
            .values_mut()
            .map(|node| resource::regenerate(node, dt))
            .sum()
    }

    // -----------------------------------------------------------------------
    // Placement
    // -----------------------------------------------------------------------

    /// Whether an agent could stand at `position`: inside the world and at
    /// least `margin` away from every obstacle surface.
    pub fn is_position_valid(&self, position: Vec2, margin: f64) -> bool {
        self.contains(position)
            && self
                .obstacles
                .values()
                .all(|o| o.position.distance(position) >= o.radius + margin)
    }

    /// Sample a valid position, falling back to the world center after
    /// [`PLACEMENT_ATTEMPTS`] misses.
    pub fn random_valid_position<R: Rng + ?Sized>(&self, rng: &mut R, margin: f64) -> Vec2 {
        for _ in 0..PLACEMENT_ATTEMPTS {
            let candidate = Vec2::new(
                rng.random_range(0.0..=self.width),
                rng.random_range(0.0..=self.height),
            );
            if self.is_position_valid(candidate, margin) {
                return candidate;
            }
        }
        self.center()
    }

    // -----------------------------------------------------------------------
    // Views
    // -----------------------------------------------------------------------

    /// By-value copy of the environment.
    pub fn snapshot(&self, tick: u64, elapsed: f64) -> WorldSnapshot {
        WorldSnapshot {
            tick,
            elapsed,
            width: self.width,
            height: self.height,
            weather: self.weather.current(),
            obstacles: self.obstacles.values().copied().collect(),
            resources: self.resources.values().copied().collect(),
        }
    }

    /// Aggregate figures.
    pub fn stats(&self) -> WorldStats {
        WorldStats {
            obstacles: self.obstacles.len(),
            resources: self.resources.len(),
            resource_energy: self.resources.values().map(|r| r.energy).sum(),
            resource_capacity: self.resources.values().map(|r| r.capacity).sum(),
        }
    }

    /// Shared validation for feature placement.
    fn check_feature(&self, position: Vec2, radius: f64) -> Result<(), WorldError> {
        if !self.contains(position) {
            return Err(WorldError::InvalidFeature {
                reason: format!("center {position} lies outside the world"),
            });
        }
        if !radius.is_finite() || radius <= 0.0 {
            return Err(WorldError::InvalidFeature {
                reason: format!("radius {radius} must be positive"),
            });
        }
        Ok(())
    }
}

/// Validate world dimensions against the grid cell size.
///
/// Width and height must be positive and finite, and the cell size must
/// satisfy `0 < cell_size <= min(width, height) / 2`.
///
/// # Errors
///
/// Returns [`WorldError::InvalidBounds`] or [`WorldError::InvalidCellSize`].
pub fn validate_extent(width: f64, height: f64, cell_size: f64) -> Result<(), WorldError> {
    let dims_valid = width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0;
    if !dims_valid {
        return Err(WorldError::InvalidBounds { width, height });
    }
    let cell_valid = cell_size.is_finite() && cell_size > 0.0 && cell_size <= width.min(height) * 0.5;
    if !cell_valid {
        return Err(WorldError::InvalidCellSize {
            cell_size,
            width,
            height,
        });
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::environment::WeatherParams;

    fn world() -> World {
        World::new(100.0, 80.0, 10.0, WeatherSystem::new(1, WeatherParams::default())).unwrap()
    }

    #[test]
    fn rejects_bad_extent() {
        assert!(validate_extent(0.0, 10.0, 1.0).is_err());
        assert!(validate_extent(10.0, f64::INFINITY, 1.0).is_err());
        assert!(validate_extent(100.0, 80.0, 41.0).is_err());
        assert!(validate_extent(100.0, 80.0, 40.0).is_ok());
        assert!(validate_extent(100.0, 80.0, 0.0).is_err());
    }

    #[test]
    fn clamp_pulls_points_inside() {
        let w = world();
        assert_eq!(w.clamp(Vec2::new(-3.0, 90.0)), Vec2::new(0.0, 80.0));
        assert!(w.contains(Vec2::new(100.0, 0.0)));
        assert!(!w.contains(Vec2::new(100.1, 0.0)));
    }

    #[test]
    fn ids_are_sequential() {
        let mut w = world();
        let a = w.add_obstacle(Vec2::new(10.0, 10.0), 2.0, 1.0).unwrap();
        let b = w.add_obstacle(Vec2::new(20.0, 10.0), 2.0, 1.0).unwrap();
        assert_eq!(a, ObstacleId(1));
        assert_eq!(b, ObstacleId(2));
    }

    #[test]
    fn features_outside_are_rejected() {
        let mut w = world();
        assert!(w.add_obstacle(Vec2::new(-1.0, 10.0), 2.0, 1.0).is_err());
        assert!(w.add_resource(Vec2::new(5.0, 5.0), 0.0, 1.0, 1.0, 0.0).is_err());
        assert!(w.add_resource(Vec2::new(5.0, 5.0), 3.0, -1.0, 1.0, 0.0).is_err());
    }

    #[test]
    fn position_inside_obstacle_is_invalid() {
        let mut w = world();
        w.add_obstacle(Vec2::new(50.0, 40.0), 5.0, 1.0).unwrap();
        assert!(!w.is_position_valid(Vec2::new(52.0, 40.0), 0.0));
        assert!(!w.is_position_valid(Vec2::new(56.0, 40.0), 2.0));
        assert!(w.is_position_valid(Vec2::new(60.0, 40.0), 2.0));
    }

    #[test]
    fn random_position_avoids_obstacles() {
        let mut w = world();
        w.add_obstacle(Vec2::new(50.0, 40.0), 30.0, 1.0).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for _ in 0..50 {
            let p = w.random_valid_position(&mut rng, 1.0);
            assert!(w.is_position_valid(p, 1.0) || p == w.center());
        }
    }

    #[test]
    fn near_queries_measure_to_surface() {
        let mut w = world();
        w.add_obstacle(Vec2::new(50.0, 40.0), 5.0, 1.0).unwrap();
        w.add_resource(Vec2::new(10.0, 10.0), 4.0, 10.0, 20.0, 0.1).unwrap();
        assert_eq!(w.obstacles_near(Vec2::new(60.0, 40.0), 5.0).count(), 1);
        assert_eq!(w.obstacles_near(Vec2::new(60.0, 40.0), 4.9).count(), 0);
        assert_eq!(w.resources_near(Vec2::new(10.0, 20.0), 6.0).count(), 1);
    }

    #[test]
    fn harvest_and_regenerate() {
        let mut w = world();
        let id = w.add_resource(Vec2::new(10.0, 10.0), 4.0, 10.0, 20.0, 1.0).unwrap();
        let taken = w.harvest(id, 4.0).unwrap();
        assert!((taken - 4.0).abs() < f64::EPSILON);
        let added = w.regenerate_resources(2.0);
        assert!((added - 2.0).abs() < 1e-12);
        assert!((w.resource(id).unwrap().energy - 8.0).abs() < 1e-12);
        assert!(matches!(
            w.harvest(ResourceId(99), 1.0),
            Err(WorldError::ResourceNotFound(ResourceId(99)))
        ));
    }

    #[test]
    fn snapshot_copies_features() {
        let mut w = world();
        w.add_obstacle(Vec2::new(50.0, 40.0), 5.0, 0.8).unwrap();
        let snap = w.snapshot(3, 0.3);
        assert_eq!(snap.tick, 3);
        assert_eq!(snap.obstacles.len(), 1);
        assert!(snap.resources.is_empty());
        assert_eq!(w.stats().obstacles, 1);
    }
}
